use crate::utils::bitset::BitSet;
use rand::prelude::*;

const BITS: usize = std::mem::size_of::<usize>() * 8;

fn make_set(bits: impl IntoIterator<Item = usize>) -> BitSet<usize, 2> {
    let mut out = BitSet::<usize, 2>::new();
    for bit in bits {
        out.set(bit, true);
    }
    out
}

#[test]
fn bits() {
    let mut rng = StdRng::seed_from_u64(42);
    let mut indices = Vec::<u16>::new();
    let mut set = BitSet::<usize, 2>::new();
    for _ in 0..100 {
        let count = rng.gen_range(100..1000);
        indices.resize(count, 0);
        rng.fill(&mut indices[..]);
        indices.sort();
        indices.dedup();

        set.clear();
        for &i in &indices {
            set.set(i as _, true);
        }

        assert_eq!(set.count_ones(), indices.len());
        assert_eq!(set.first_one(), indices.first().map(|&i| i as usize));
        assert!(set.ones().eq(indices.iter().map(|&i| i as usize)));

        for i in 0..(indices.len() * BITS).min(u16::MAX as usize) {
            let contained = indices.binary_search(&(i as _)).is_ok();
            assert_eq!(set.get(i), contained);
        }
    }
}

#[test]
fn first_one() {
    assert_eq!(make_set([]).first_one(), None);
    let mut set = make_set([65]);
    assert_eq!(set.first_one(), Some(65));
    set.set(65, false);
    assert_eq!(set.first_one(), None);
    assert!(set.is_empty());
    assert_eq!(make_set([3, 1, 2]).first_one(), Some(1));
    assert_eq!(make_set([128, 64]).first_one(), Some(64));
}

#[test]
fn ops() {
    let a = make_set([0, 64, 96, 128]);
    let b = make_set([1, 64, 128, 200]);
    assert_eq!(&a & &b, make_set([64, 128]));
    assert_eq!(&a | &b, make_set([0, 1, 64, 96, 128, 200]));
    assert_eq!(&a ^ &b, make_set([0, 1, 96, 200]));

    let mut c = a.clone();
    c ^= &a;
    assert!(c.is_empty());
    c |= b.clone();
    assert_eq!(c, b);
}

#[test]
fn equality_ignores_capacity() {
    let mut big = BitSet::<usize, 2>::with_capacity(1000);
    big.set(3, true);
    assert_eq!(big, make_set([3]));
    assert_eq!(make_set([]), BitSet::with_capacity(300));
    assert_eq!(make_set([1, 2]).as_slice().len(), 1);
}

#[test]
fn subset() {
    let small = make_set([1, 70]);
    let large = make_set([1, 2, 70, 300]);
    assert!(small.is_subset(&large));
    assert!(!large.is_subset(&small));
    assert!(make_set([]).is_subset(&small));
    assert!(!make_set([500]).is_subset(&large));
    assert!(BitSet::<usize, 2>::with_capacity(1000).is_subset(&make_set([])));
}

#[test]
fn collect() {
    let set = [5, 1, 190].into_iter().collect::<BitSet<u8, 4>>();
    assert_eq!(set.ones().collect::<Vec<_>>(), [1, 5, 190]);
    assert_eq!(set.as_slice().len(), 24);
}
