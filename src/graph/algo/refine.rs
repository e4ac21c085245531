//! Canonical atom ranking by iterative partition refinement.
//!
//! Atoms start out partitioned by a local invariant, and each class is split by the sorted ranks of
//! its neighbors until nothing changes. Classes that are still tied after that are symmetric (or
//! look symmetric to refinement), so one of them is broken by trying every candidate in it and
//! keeping the one that gives the smallest trace.
//!
//! Stereo takes part too: once refinement settles, chiral atoms and double bonds that still have
//! distinct groups are labelled relative to their neighbors' ranks, and the labels split classes
//! further.

use crate::molecule::Molecule;
use crate::stereo::StereoCenters;
use petgraph::prelude::*;
use tracing::*;

/// Degree, atomic number, isotope, charge, aromaticity, hydrogens
type Invariant = (usize, u8, u16, i8, bool, u8);

/// An atom's ranked view of its neighborhood
type Trace = Vec<(usize, Invariant, u8, Vec<(usize, u32)>)>;

fn invariant(mol: &Molecule, atom: NodeIndex) -> Invariant {
    let a = mol[atom];
    (
        mol.degree(atom),
        a.protons,
        a.isotope,
        a.charge,
        a.is_aromatic(),
        a.hydrogens(),
    )
}

/// Rank atoms by their keys. Each atom's rank is the sorted position of the first atom with an equal
/// key, so ties share a rank and ranks stay comparable across refinements.
fn rank_by<K: Ord>(keys: &[K]) -> Vec<usize> {
    let mut order = (0..keys.len()).collect::<Vec<_>>();
    order.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
    let mut ranks = vec![0; keys.len()];
    let mut start = 0;
    for (pos, &i) in order.iter().enumerate() {
        if pos > 0 && keys[order[pos - 1]] != keys[i] {
            start = pos;
        }
        ranks[i] = start;
    }
    ranks
}

fn class_count(ranks: &[usize]) -> usize {
    let mut seen = vec![false; ranks.len()];
    let mut count = 0;
    for &r in ranks {
        if !seen[r] {
            seen[r] = true;
            count += 1;
        }
    }
    count
}

fn neighbor_key(mol: &Molecule, ranks: &[usize], atom: NodeIndex) -> Vec<(usize, u32)> {
    let mut key = mol
        .bonds_of(atom)
        .map(|(n, _, bond)| (ranks[n.index()], bond.code()))
        .collect::<Vec<_>>();
    key.sort_unstable();
    key
}

/// Split classes by their neighbors' ranks until the number of classes stops growing.
fn refine(mol: &Molecule, mut ranks: Vec<usize>) -> Vec<usize> {
    let mut classes = class_count(&ranks);
    loop {
        let keys = mol
            .graph()
            .node_indices()
            .map(|n| (ranks[n.index()], neighbor_key(mol, &ranks, n)))
            .collect::<Vec<_>>();
        ranks = rank_by(&keys);
        let count = class_count(&ranks);
        if count == classes {
            return ranks;
        }
        classes = count;
    }
}

/// Refine, then split by stereo labels, until the stereo labels stop splitting anything.
fn refine_with_stereo(mol: &Molecule, ranks: Vec<usize>) -> (Vec<usize>, StereoCenters, Vec<u8>) {
    let mut ranks = refine(mol, ranks);
    loop {
        let centers = StereoCenters::find(mol, &ranks);
        let labels = centers.labels(mol, &ranks);
        let keys = ranks
            .iter()
            .zip(&labels)
            .map(|(&r, &l)| (r, l))
            .collect::<Vec<_>>();
        let split = refine(mol, rank_by(&keys));
        if class_count(&split) == class_count(&ranks) {
            return (ranks, centers, labels);
        }
        trace!(classes = class_count(&split), "stereo split classes");
        ranks = split;
    }
}

fn trace_of(mol: &Molecule, invariants: &[Invariant], labels: &[u8], ranks: &[usize]) -> Trace {
    let mut trace = mol
        .graph()
        .node_indices()
        .map(|n| {
            (
                ranks[n.index()],
                invariants[n.index()],
                labels[n.index()],
                neighbor_key(mol, ranks, n),
            )
        })
        .collect::<Trace>();
    trace.sort_unstable();
    trace
}

/// Compute a total order over the atoms of a molecule that only depends on its structure.
///
/// The returned vector maps each atom index to its rank. Two isomorphic molecules with the same
/// atom and bond typing, and the same configuration at each stereocenter, get the same ranks on
/// corresponding atoms, up to automorphism.
pub fn canonical_ranks(mol: &Molecule) -> Vec<usize> {
    canonical_ranks_with_stereo(mol).0
}

/// Like [`canonical_ranks`], but also returns the stereo elements that survive symmetry.
#[instrument(level = "debug", skip_all, fields(atoms = mol.atom_count()))]
pub fn canonical_ranks_with_stereo(mol: &Molecule) -> (Vec<usize>, StereoCenters) {
    let n = mol.atom_count();
    if n == 0 {
        return (Vec::new(), StereoCenters::default());
    }
    let invariants = mol
        .graph()
        .node_indices()
        .map(|a| invariant(mol, a))
        .collect::<Vec<_>>();
    let (mut ranks, centers, labels) = refine_with_stereo(mol, rank_by(&invariants));
    let mut sizes = vec![0usize; n];
    loop {
        sizes.fill(0);
        for &r in &ranks {
            sizes[r] += 1;
        }
        let Some(tied) = sizes.iter().position(|&s| s > 1) else {
            break;
        };
        trace!(class = tied, size = sizes[tied], "breaking tie");
        let mut best: Option<(Trace, Vec<usize>)> = None;
        for cand in (0..n).filter(|&i| ranks[i] == tied) {
            let keys = ranks
                .iter()
                .enumerate()
                .map(|(i, &r)| (r, r == tied && i != cand))
                .collect::<Vec<_>>();
            let split = refine(mol, rank_by(&keys));
            let trace = trace_of(mol, &invariants, &labels, &split);
            if best.as_ref().map_or(true, |(t, _)| trace < *t) {
                best = Some((trace, split));
            }
        }
        match best {
            Some((_, split)) => ranks = split,
            None => break,
        }
    }
    debug!("computed canonical ranks");
    (ranks, centers)
}
