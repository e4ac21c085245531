//! Circular (Morgan) fingerprints.
//!
//! Every atom starts with an identifier hashed from its own properties. Each round folds in the
//! identifiers of its neighbors, so after `r` rounds an identifier describes the environment within
//! `r` bonds of the atom. Environments that cover the same set of bonds as one seen before are
//! redundant and dropped. Every remaining identifier sets one bit in a fixed-length vector.

use crate::molecule::Molecule;
use crate::utils::bitset::BitSet;
use ahash::AHashSet;
use bitvec::prelude::*;
use std::fmt::{self, Display, Formatter};
use tracing::*;

/// Bonds covered by an atom's environment
type BondSet = BitSet<usize, 2>;

/// Boost-style hash combination on 32 bits, so identifiers are the same on every platform.
#[inline]
pub fn hash_combine(seed: u32, value: u32) -> u32 {
    seed ^ value
        .wrapping_add(0x9e3779b9)
        .wrapping_add(seed << 6)
        .wrapping_add(seed >> 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FingerprintConfig {
    /// Number of rounds, or how many bonds out from each atom the environments reach
    pub radius: u32,
    /// Length of the bit vector
    pub n_bits: usize,
    /// Include ring membership in the initial atom identifiers
    pub ring_membership: bool,
}
impl FingerprintConfig {
    pub const fn new() -> Self {
        Self {
            radius: 2,
            n_bits: 2048,
            ring_membership: true,
        }
    }
    pub const fn with_radius(mut self, radius: u32) -> Self {
        self.radius = radius;
        self
    }
    pub const fn with_bits(mut self, n_bits: usize) -> Self {
        self.n_bits = n_bits;
        self
    }
    pub const fn with_ring_membership(mut self, ring_membership: bool) -> Self {
        self.ring_membership = ring_membership;
        self
    }
}
impl Default for FingerprintConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A fixed-length bit vector.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    bits: BitVec<u8>,
}
impl Fingerprint {
    /// An empty fingerprint of the given length.
    pub fn new(n_bits: usize) -> Self {
        Self {
            bits: BitVec::repeat(false, n_bits),
        }
    }
    pub fn len(&self) -> usize {
        self.bits.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }
    pub fn count_ones(&self) -> usize {
        self.bits.count_ones()
    }
    pub fn get(&self, idx: usize) -> bool {
        self.bits.get(idx).is_some_and(|b| *b)
    }
    pub fn as_bitslice(&self) -> &BitSlice<u8> {
        &self.bits
    }
    /// The raw bytes, least significant bit first.
    pub fn as_raw_slice(&self) -> &[u8] {
        self.bits.as_raw_slice()
    }
    pub fn ones(&self) -> impl Iterator<Item = usize> + '_ {
        self.bits.iter_ones()
    }

    /// Tanimoto similarity, the number of shared bits over the number of bits set in either.
    ///
    /// Returns `None` if the lengths differ. Two empty fingerprints are identical.
    pub fn tanimoto(&self, other: &Self) -> Option<f32> {
        if self.len() != other.len() {
            return None;
        }
        let both = (self.bits.clone() & other.bits.as_bitslice()).count_ones();
        let either = (self.bits.clone() | other.bits.as_bitslice()).count_ones();
        Some(if either == 0 {
            1.0
        } else {
            both as f32 / either as f32
        })
    }

    /// Check if every bit set in `other` is set in `self`. A molecule's fingerprint contains the
    /// fingerprint of each of its substructures, so this is a quick negative screen.
    pub fn contains(&self, other: &Self) -> bool {
        self.len() == other.len() && (other.bits.clone() & self.bits.as_bitslice()) == other.bits
    }
}
impl Display for Fingerprint {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        for bit in self.bits.iter() {
            f.write_str(if *bit { "1" } else { "0" })?;
        }
        Ok(())
    }
}

fn initial_ids(mol: &Molecule, cfg: FingerprintConfig) -> Vec<u32> {
    mol.atoms()
        .map(|(n, atom)| {
            let h = atom.hydrogens() as u32;
            let ring = cfg.ring_membership && atom.in_ring();
            [
                atom.protons as u32,
                mol.degree(n) as u32 + h,
                h,
                atom.charge as i32 as u32,
                atom.isotope as u32,
                ring as u32,
            ]
            .into_iter()
            .fold(0, hash_combine)
        })
        .collect()
}

/// Compute the Morgan fingerprint of a molecule.
#[instrument(level = "debug", skip_all, fields(atoms = mol.atom_count(), radius = cfg.radius, n_bits = cfg.n_bits))]
pub fn morgan_fingerprint(mol: &Molecule, cfg: FingerprintConfig) -> Fingerprint {
    let mut fp = Fingerprint::new(cfg.n_bits);
    if cfg.n_bits == 0 || mol.is_empty() {
        return fp;
    }
    let n = mol.atom_count();
    let mut ids = initial_ids(mol, cfg);
    for &id in &ids {
        fp.bits.set(id as usize % cfg.n_bits, true);
    }
    let mut bond_sets = vec![BondSet::new(); n];
    let mut seen = AHashSet::<BondSet>::new();
    // isolated atoms never grow an environment past their own
    let mut dead = mol.atoms().map(|(a, _)| mol.degree(a) == 0).collect::<Vec<_>>();
    let mut pairs = Vec::new();
    for layer in 1..=cfg.radius {
        // once every environment is a duplicate, later rounds can't add bits
        if dead.iter().all(|&d| d) {
            trace!(layer, "every environment has stopped growing");
            break;
        }
        let mut next_ids = Vec::with_capacity(n);
        let mut next_sets = Vec::with_capacity(n);
        for (atom, _) in mol.atoms() {
            pairs.clear();
            pairs.extend(
                mol.bonds_of(atom)
                    .map(|(nbr, _, bond)| (bond.code(), ids[nbr.index()])),
            );
            pairs.sort_unstable();
            let mut id = hash_combine(layer - 1, ids[atom.index()]);
            for &(code, nbr) in &pairs {
                id = hash_combine(id, code);
                id = hash_combine(id, nbr);
            }
            let mut set = bond_sets[atom.index()].clone();
            for (nbr, edge, _) in mol.bonds_of(atom) {
                set.set(edge.index(), true);
                set |= &bond_sets[nbr.index()];
            }
            next_ids.push(id);
            next_sets.push(set);
        }
        let mut entries = (0..n).filter(|&a| !dead[a]).collect::<Vec<_>>();
        entries.sort_unstable_by_key(|&a| (next_ids[a], a));
        let mut added = 0usize;
        for a in entries {
            if seen.contains(&next_sets[a]) {
                dead[a] = true;
            } else {
                seen.insert(next_sets[a].clone());
                fp.bits.set(next_ids[a] as usize % cfg.n_bits, true);
                added += 1;
            }
        }
        trace!(layer, added, "finished round");
        ids = next_ids;
        bond_sets = next_sets;
    }
    debug!(bits = fp.count_ones(), "computed fingerprint");
    fp
}
