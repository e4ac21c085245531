//! Growable bit sets backed by a `SmallVec` of machine words.
//!
//! These are used for edge sets: ring perception does its GF(2) elimination with them, and the
//! fingerprint generator uses them to tell apart atom environments that cover the same bonds.

use itertools::{EitherOrBoth::*, Itertools};
use num_traits::*;
use smallvec::SmallVec;
use std::fmt::{self, Binary, Debug, Formatter};
use std::hash::{Hash, Hasher};
use std::ops::*;

#[derive(Default, Clone)]
pub struct BitSet<T, const N: usize>(SmallVec<T, N>);
impl<T: PrimInt, const N: usize> BitSet<T, N> {
    /// Number of bits held in each word.
    #[inline(always)]
    fn word_bits() -> usize {
        T::zero().count_zeros() as usize
    }

    pub const fn new() -> Self {
        Self(SmallVec::new())
    }
    /// Create a set with room for `cap` bits, all unset.
    pub fn with_capacity(cap: usize) -> Self {
        let len = cap.div_ceil(Self::word_bits());
        Self(SmallVec::from_elem(T::zero(), len))
    }

    pub fn as_slice(&self) -> &[T] {
        self.0.as_slice()
    }
    /// Words up to and including the last non-zero one.
    fn trimmed(&self) -> &[T] {
        let zero = T::zero();
        let end = self.0.iter().rposition(|&w| w != zero).map_or(0, |i| i + 1);
        &self.0[..end]
    }

    pub fn get(&self, idx: usize) -> bool {
        let bits = Self::word_bits();
        self.0
            .get(idx / bits)
            .is_some_and(|&w| w & (T::one() << (idx % bits)) != T::zero())
    }
    pub fn set(&mut self, idx: usize, bit: bool) {
        let bits = Self::word_bits();
        let si = idx / bits;
        let sb = idx % bits;
        if si >= self.0.len() {
            if !bit {
                return;
            }
            self.0.resize(si + 1, T::zero());
        }
        let word = self.0[si];
        self.0[si] = if bit {
            word | (T::one() << sb)
        } else {
            word & !(T::one() << sb)
        };
    }
    pub fn clear(&mut self) {
        self.0.iter_mut().for_each(|w| *w = T::zero());
    }

    pub fn is_empty(&self) -> bool {
        self.trimmed().is_empty()
    }
    pub fn count_ones(&self) -> usize {
        self.0.iter().map(|i| i.count_ones() as usize).sum()
    }
    /// Index of the lowest set bit.
    pub fn first_one(&self) -> Option<usize> {
        let bits = Self::word_bits();
        self.0
            .iter()
            .position(|&w| w != T::zero())
            .map(|i| i * bits + self.0[i].trailing_zeros() as usize)
    }
    /// Iterate over the indices of the set bits, in increasing order.
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        let bits = Self::word_bits();
        self.0.iter().enumerate().flat_map(move |(i, &w)| {
            (0..bits).filter(move |&b| w & (T::one() << b) != T::zero()).map(move |b| i * bits + b)
        })
    }
    /// Check if every bit set here is also set in `other`.
    pub fn is_subset(&self, other: &Self) -> bool {
        let zero = T::zero();
        self.0.iter().zip_longest(&other.0).all(|e| match e {
            Left(&l) => l == zero,
            Right(_) => true,
            Both(&l, &r) => l & !r == zero,
        })
    }
}

impl<T: PrimInt, const N: usize> FromIterator<usize> for BitSet<T, N> {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut out = Self::new();
        for i in iter {
            out.set(i, true);
        }
        out
    }
}

// equality and hashing ignore trailing zero words, so sets built with different capacities compare
// by contents
impl<T: PrimInt, const N: usize> PartialEq for BitSet<T, N> {
    fn eq(&self, other: &Self) -> bool {
        self.trimmed() == other.trimmed()
    }
}
impl<T: PrimInt, const N: usize> Eq for BitSet<T, N> {}
impl<T: PrimInt + Hash, const N: usize> Hash for BitSet<T, N> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trimmed().hash(state);
    }
}

impl<T: PrimInt + Binary, const N: usize> Debug for BitSet<T, N> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut l = f.debug_list();
        for i in &self.0 {
            l.entry(&format_args!("{i:0>0$b}", Self::word_bits()));
        }
        l.finish()
    }
}

impl<T: PrimInt, const N: usize> BitAndAssign<&Self> for BitSet<T, N> {
    fn bitand_assign(&mut self, rhs: &Self) {
        self.0.truncate(rhs.0.len());
        self.0
            .iter_mut()
            .zip(&rhs.0)
            .for_each(|(l, r)| *l = *l & *r);
    }
}

impl<T: PrimInt, const N: usize> BitOrAssign<&Self> for BitSet<T, N> {
    fn bitor_assign(&mut self, rhs: &Self) {
        let mut iter = rhs.0.iter();
        self.0
            .iter_mut()
            .zip(iter.by_ref())
            .for_each(|(l, r)| *l = *l | *r);
        self.0.extend(iter.copied());
    }
}

impl<T: PrimInt, const N: usize> BitXorAssign<&Self> for BitSet<T, N> {
    fn bitxor_assign(&mut self, rhs: &Self) {
        let mut iter = rhs.0.iter();
        self.0
            .iter_mut()
            .zip(iter.by_ref())
            .for_each(|(l, r)| *l = *l ^ *r);
        self.0.extend(iter.copied());
    }
}

/// Derive the by-value and by-reference operators from the `*Assign<&Self>` impls above.
macro_rules! derived_ops {
    ($($op:ident::$fn:ident => $assign:ident::$assign_fn:ident),* $(,)?) => {$(
        impl<T: PrimInt, const N: usize> $assign for BitSet<T, N> {
            fn $assign_fn(&mut self, rhs: Self) {
                $assign::$assign_fn(self, &rhs);
            }
        }
        impl<T: PrimInt, const N: usize> $op<&Self> for BitSet<T, N> {
            type Output = Self;

            fn $fn(mut self, rhs: &Self) -> Self {
                $assign::$assign_fn(&mut self, rhs);
                self
            }
        }
        impl<T: PrimInt, const N: usize> $op for &BitSet<T, N> {
            type Output = BitSet<T, N>;

            fn $fn(self, rhs: Self) -> BitSet<T, N> {
                let mut out = self.clone();
                $assign::$assign_fn(&mut out, rhs);
                out
            }
        }
    )*};
}

derived_ops! {
    BitAnd::bitand => BitAndAssign::bitand_assign,
    BitOr::bitor => BitOrAssign::bitor_assign,
    BitXor::bitxor => BitXorAssign::bitxor_assign,
}
