//! Aromaticity perception for rings written with alternating bonds.
//!
//! Each SSSR ring is checked on its own: every atom has to be able to take part in a pi system, and
//! the ring's pi electron count has to satisfy Hückel's rule. Rings that fail on their own are
//! retried as the outer envelope of a pair of fused rings, which picks up systems like azulene.
//! Atoms and bonds that were already aromatic in the input stay that way, but only after
//! [`check_written`] has confirmed that they can be kekulized and that the Kekulé structure holds an
//! aromatic ring.

use crate::atom_info;
use crate::core::*;
use crate::graph::algo::sssr::{EdgeSet, RingInfo};
use crate::graph::other_end;
use crate::molecule::StructureError;
use petgraph::prelude::*;
use smallvec::SmallVec;
use tracing::*;

/// Elements that can be sp2 hybridized in a ring: B, C, N, O, P, S, As, Se, Te
const SP2_CAPABLE: [u8; 9] = [5, 6, 7, 8, 15, 16, 33, 34, 52];

/// A candidate cycle, either one SSSR ring or the envelope of two.
struct Cycle {
    atoms: SmallVec<NodeIndex, 12>,
    bonds: EdgeSet,
}

#[instrument(level = "debug", skip_all)]
pub(crate) fn perceive(graph: &mut MoleculeGraph, rings: &RingInfo) {
    for bonds in find_aromatic(graph, rings) {
        for e in bonds.ones().map(EdgeIndex::new) {
            let Some((x, y)) = graph.edge_endpoints(e) else {
                continue;
            };
            graph[e] = Bond::Aromatic;
            graph[x].data.set_aromatic(true);
            graph[y].data.set_aromatic(true);
        }
    }
}

/// Bond sets of the rings that are aromatic, decided against the input bonds.
fn find_aromatic(graph: &MoleculeGraph, rings: &RingInfo) -> Vec<EdgeSet> {
    let mut found = Vec::new();
    let mut failed = Vec::new();
    for (i, ring) in rings.rings().iter().enumerate() {
        if ring.atoms.iter().all(|&a| graph[a].is_aromatic()) {
            continue;
        }
        let cycle = Cycle {
            atoms: ring.atoms.iter().copied().collect(),
            bonds: ring.edge_set().clone(),
        };
        if is_aromatic(graph, rings, &cycle) {
            trace!(ring = i, size = ring.len(), "ring is aromatic");
            found.push(cycle.bonds);
        } else {
            failed.push(i);
        }
    }
    for (n, &i) in failed.iter().enumerate() {
        for &j in &failed[(n + 1)..] {
            let (a, b) = (&rings.rings()[i], &rings.rings()[j]);
            if (a.edge_set() & b.edge_set()).is_empty() {
                continue;
            }
            let Some(cycle) = envelope(graph, a.edge_set() ^ b.edge_set()) else {
                continue;
            };
            if is_aromatic(graph, rings, &cycle) {
                trace!(first = i, second = j, "fused envelope is aromatic");
                found.push(a.edge_set() | b.edge_set());
            }
        }
    }
    found
}

/// Check that the aromatic bonds of the input describe real aromatic systems.
///
/// Atoms that still have a free valence after their bonds and hydrogens have to pair up along
/// aromatic bonds to form a Kekulé structure, and each system of aromatic bonds has to contain at
/// least one ring that is aromatic in that structure. This rejects things like `c1cccc1`, which
/// can't be kekulized, and `c1ccc1`, which can but has four pi electrons.
#[instrument(level = "debug", skip_all)]
pub(crate) fn check_written(graph: &MoleculeGraph, rings: &RingInfo) -> Result<(), StructureError> {
    let (system, count) = aromatic_systems(graph);
    if count == 0 {
        return Ok(());
    }
    let doubles = kekulize(graph, &system, count)?;
    let mut kekule = graph.clone();
    for e in kekule.edge_indices() {
        if kekule[e] == Bond::Aromatic {
            kekule[e] = if doubles[e.index()] {
                Bond::Double
            } else {
                Bond::Single
            };
        }
    }
    for atom in kekule.node_weights_mut() {
        atom.data.set_aromatic(false);
    }
    let mut confirmed = vec![false; count];
    for bonds in find_aromatic(&kekule, rings) {
        for e in bonds.ones().map(EdgeIndex::new) {
            if graph[e] != Bond::Aromatic {
                continue;
            }
            if let Some(s) = graph.edge_endpoints(e).and_then(|(x, _)| system[x.index()]) {
                confirmed[s] = true;
            }
        }
    }
    match confirmed.iter().position(|&c| !c) {
        Some(s) => {
            let atom = system.iter().position(|&x| x == Some(s)).unwrap_or(0);
            debug!(atom, "aromatic system has no aromatic ring");
            Err(StructureError::NotAromatic(atom))
        }
        None => Ok(()),
    }
}

/// Label atoms with the connected system of aromatic bonds they belong to.
fn aromatic_systems(graph: &MoleculeGraph) -> (Vec<Option<usize>>, usize) {
    let mut system = vec![None; graph.node_count()];
    let mut count = 0;
    let mut stack = Vec::new();
    for start in graph.node_indices() {
        if system[start.index()].is_some()
            || !graph.edges(start).any(|e| *e.weight() == Bond::Aromatic)
        {
            continue;
        }
        system[start.index()] = Some(count);
        stack.push(start);
        while let Some(atom) = stack.pop() {
            for e in graph.edges(atom) {
                let next = other_end(&e, atom);
                if *e.weight() == Bond::Aromatic && system[next.index()].is_none() {
                    system[next.index()] = Some(count);
                    stack.push(next);
                }
            }
        }
        count += 1;
    }
    (system, count)
}

/// Pick the aromatic bonds that become double in a Kekulé structure, as a mask over edges.
fn kekulize(
    graph: &MoleculeGraph,
    system: &[Option<usize>],
    count: usize,
) -> Result<Vec<bool>, StructureError> {
    let needy = graph
        .node_indices()
        .map(|a| system[a.index()].is_some() && needs_double(graph, a))
        .collect::<Vec<_>>();
    let mut mate = vec![None; graph.node_count()];
    for s in 0..count {
        let atoms = graph
            .node_indices()
            .filter(|a| needy[a.index()] && system[a.index()] == Some(s))
            .collect::<Vec<_>>();
        let Some(&first) = atoms.first() else {
            continue;
        };
        if atoms.len() % 2 == 1 || !pair_up(graph, &atoms, &needy, &mut mate) {
            debug!(atom = first.index(), needy = atoms.len(), "can't kekulize");
            return Err(StructureError::Unkekulizable(first.index()));
        }
    }
    let mut doubles = vec![false; graph.edge_count()];
    for e in mate.into_iter().flatten() {
        doubles[e.index()] = true;
    }
    Ok(doubles)
}

/// Whether an aromatic atom has exactly one valence left over once its aromatic bonds are counted
/// as single. Charged atoms use the valences of their isoelectronic element.
fn needs_double(graph: &MoleculeGraph, atom: NodeIndex) -> bool {
    let a = graph[atom];
    if !a.is_aromatic() {
        return false;
    }
    let used = graph
        .edges(atom)
        .map(|e| match *e.weight() {
            Bond::Aromatic => 1,
            b => b.bond_count() as u32,
        })
        .sum::<u32>()
        + a.hydrogens() as u32;
    let effective = a.protons as i16 - a.charge as i16;
    let Some(info) = u8::try_from(effective)
        .ok()
        .filter(|&p| p > 0)
        .and_then(atom_info::element)
    else {
        return false;
    };
    info.valences
        .iter()
        .map(|&v| v as u32)
        .find(|&v| v >= used)
        .is_some_and(|v| v - used == 1)
}

/// Find a perfect matching of `atoms` over aromatic bonds, taking the atom with the fewest free
/// partners first. `mate` holds the chosen bond for each matched atom.
fn pair_up(
    graph: &MoleculeGraph,
    atoms: &[NodeIndex],
    needy: &[bool],
    mate: &mut [Option<EdgeIndex>],
) -> bool {
    let mut best: Option<(NodeIndex, usize)> = None;
    for &atom in atoms {
        if mate[atom.index()].is_some() {
            continue;
        }
        let free = partners(graph, atom, needy, mate).count();
        if free == 0 {
            return false;
        }
        if best.map_or(true, |(_, f)| free < f) {
            best = Some((atom, free));
        }
    }
    let Some((atom, _)) = best else {
        return true;
    };
    let options = partners(graph, atom, needy, mate).collect::<SmallVec<(NodeIndex, EdgeIndex), 4>>();
    for (other, e) in options {
        mate[atom.index()] = Some(e);
        mate[other.index()] = Some(e);
        if pair_up(graph, atoms, needy, mate) {
            return true;
        }
        mate[atom.index()] = None;
        mate[other.index()] = None;
    }
    false
}

fn partners<'a>(
    graph: &'a MoleculeGraph,
    atom: NodeIndex,
    needy: &'a [bool],
    mate: &'a [Option<EdgeIndex>],
) -> impl Iterator<Item = (NodeIndex, EdgeIndex)> + 'a {
    graph
        .edges(atom)
        .filter(|e| *e.weight() == Bond::Aromatic)
        .map(move |e| (other_end(&e, atom), e.id()))
        .filter(move |(other, _)| needy[other.index()] && mate[other.index()].is_none())
}

/// Build a cycle from an edge set, if every atom it touches has exactly two of its edges.
fn envelope(graph: &MoleculeGraph, bonds: EdgeSet) -> Option<Cycle> {
    let mut atoms = SmallVec::<NodeIndex, 12>::new();
    let mut counts = SmallVec::<u8, 12>::new();
    for e in bonds.ones() {
        let (x, y) = graph.edge_endpoints(EdgeIndex::new(e))?;
        for n in [x, y] {
            match atoms.iter().position(|&a| a == n) {
                Some(i) => counts[i] += 1,
                None => {
                    atoms.push(n);
                    counts.push(1);
                }
            }
        }
    }
    counts
        .iter()
        .all(|&c| c == 2)
        .then_some(Cycle { atoms, bonds })
}

fn is_aromatic(graph: &MoleculeGraph, rings: &RingInfo, cycle: &Cycle) -> bool {
    let mut total = 0u32;
    for &atom in &cycle.atoms {
        match pi_electrons(graph, rings, atom) {
            Some(e) => total += e as u32,
            None => return false,
        }
    }
    total % 4 == 2
}

/// How many electrons an atom gives to a ring's pi system, or `None` if it can't be part of one.
fn pi_electrons(graph: &MoleculeGraph, rings: &RingInfo, atom: NodeIndex) -> Option<u8> {
    let a = graph[atom];
    if !SP2_CAPABLE.contains(&a.protons) {
        return None;
    }
    let mut ring_double = false;
    let mut exo_double = None;
    for e in graph.edges(atom) {
        match *e.weight() {
            Bond::Triple | Bond::Quad => return None,
            Bond::Double if rings.is_ring_bond(e.id()) => ring_double = true,
            Bond::Double => exo_double = Some(graph[other_end(&e, atom)].protons),
            _ => {}
        }
    }
    if ring_double {
        return Some(1);
    }
    if let Some(partner) = exo_double {
        // a carbonyl-like carbon has an empty p orbital in the ring
        return (a.protons == 6 && matches!(partner, 7 | 8 | 16)).then_some(0);
    }
    let total_degree = graph.neighbors(atom).count() + a.hydrogens() as usize;
    match (a.protons, a.charge) {
        (6, -1) => Some(2),
        (6, 1) | (5, 0) => Some(0),
        (6, 0) if a.is_aromatic() => Some(1),
        (7 | 15 | 33, 0) if total_degree <= 3 => {
            // pyridine-type atoms written aromatic keep their lone pair out of the ring
            if a.is_aromatic() && total_degree == 2 {
                Some(1)
            } else {
                Some(2)
            }
        }
        (7 | 15 | 33, 1) if a.is_aromatic() => Some(1),
        (7 | 15 | 33, -1) if total_degree <= 2 => Some(2),
        (8 | 16 | 34 | 52, 0) => Some(2),
        _ => None,
    }
}
