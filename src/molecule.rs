//! Building and querying molecules.
//!
//! A [`MoleculeBuilder`] is a plain mutable graph. [`MoleculeBuilder::build`] validates it, folds
//! plain hydrogen atoms into their neighbors, fills in implicit hydrogens, and perceives rings and
//! aromaticity, producing an immutable [`Molecule`] that carries its [`RingInfo`]. To change a
//! molecule, turn it back into a builder and build it again.

use crate::aromaticity;
use crate::atom_info::{self, ATOM_DATA};
use crate::core::*;
use crate::graph::algo::RingInfo;
use crate::graph::other_end;
use crate::stereo::{reference_slots, reorder, Slots};
use petgraph::prelude::*;
use petgraph::visit::IntoNodeReferences;
use std::ops::Index;
use thiserror::Error;
use tracing::*;

/// A molecule graph failed validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StructureError {
    #[error("atom {index} is out of range for a molecule with {count} atoms")]
    AtomOutOfRange { index: usize, count: usize },
    #[error("atom {0} can't be bonded to itself")]
    SelfBond(usize),
    #[error("atoms {0} and {1} are already bonded")]
    DuplicateBond(usize, usize),
    #[error("a non-bond can't be added between atoms {0} and {1}")]
    NonBond(usize, usize),
    #[error("atom {atom} ({element}, charge {charge:+}) has valence {valence}, more than the maximum of {max}")]
    Valence {
        atom: usize,
        element: &'static str,
        charge: i8,
        valence: u8,
        max: u8,
    },
    #[error("atom {0} is marked aromatic but isn't in a ring")]
    AromaticOutsideRing(usize),
    #[error("the aromatic system containing atom {0} has no valid Kekulé structure")]
    Unkekulizable(usize),
    #[error("the aromatic system containing atom {0} doesn't contain an aromatic ring")]
    NotAromatic(usize),
    #[error(transparent)]
    TooManyHydrogens(#[from] TooManyHydrogens),
}

/// Mutable molecule graph, without any derived properties.
#[derive(Debug, Clone, Default)]
pub struct MoleculeBuilder {
    graph: MoleculeGraph,
}
impl MoleculeBuilder {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn with_capacity(atoms: usize, bonds: usize) -> Self {
        Self {
            graph: MoleculeGraph::with_capacity(atoms, bonds),
        }
    }

    pub fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        self.graph.add_node(atom)
    }
    /// Bond two existing atoms. Fails on out-of-range atoms, self-loops, and duplicate bonds.
    pub fn add_bond(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        bond: Bond,
    ) -> Result<EdgeIndex, StructureError> {
        let count = self.graph.node_count();
        for idx in [a, b] {
            if idx.index() >= count {
                return Err(StructureError::AtomOutOfRange {
                    index: idx.index(),
                    count,
                });
            }
        }
        if a == b {
            return Err(StructureError::SelfBond(a.index()));
        }
        if bond == Bond::Non {
            return Err(StructureError::NonBond(a.index(), b.index()));
        }
        if self.graph.contains_edge(a, b) {
            return Err(StructureError::DuplicateBond(a.index(), b.index()));
        }
        Ok(self.graph.add_edge(a, b, bond))
    }

    pub fn atom(&self, idx: NodeIndex) -> Option<&Atom> {
        self.graph.node_weight(idx)
    }
    pub fn atom_mut(&mut self, idx: NodeIndex) -> Option<&mut Atom> {
        self.graph.node_weight_mut(idx)
    }
    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<Bond> {
        self.graph.find_edge(a, b).map(|e| self.graph[e])
    }
    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }
    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }
    pub fn graph(&self) -> &MoleculeGraph {
        &self.graph
    }

    /// Validate the graph and compute everything derived from it.
    #[instrument(level = "debug", skip_all, fields(atoms = self.graph.node_count()))]
    pub fn build(self) -> Result<Molecule, StructureError> {
        let mut graph = fold_hydrogens(self.graph)?;
        let rings = RingInfo::perceive(&graph);
        demote_chain_aromatics(&mut graph, &rings)?;
        fill_hydrogens(&mut graph)?;
        check_valences(&graph)?;
        aromaticity::check_written(&graph, &rings)?;
        aromaticity::perceive(&mut graph, &rings);
        for n in graph.node_indices() {
            let ring = rings.is_ring_atom(n);
            graph[n].data.set_ring(ring);
        }
        Ok(Molecule { graph, rings })
    }
}

/// The heavy atom a hydrogen atom can be folded into: the hydrogen has to be neutral, without an
/// isotope or hydrogens of its own, and singly bonded to one atom that isn't hydrogen.
fn fold_target(graph: &MoleculeGraph, atom: NodeIndex) -> Option<NodeIndex> {
    let a = graph[atom];
    if a.protons != 1 || a.charge != 0 || a.isotope != 0 || a.hydrogens() != 0 {
        return None;
    }
    let mut edges = graph.edges(atom);
    let edge = edges.next()?;
    if edges.next().is_some() || !edge.weight().is_single() {
        return None;
    }
    let heavy = other_end(&edge, atom);
    (graph[heavy].protons != 1).then_some(heavy)
}

/// Turn explicit hydrogen atoms into hydrogen counts on their neighbors. Atoms keep their relative
/// order, and chirality is carried over with the hydrogen taking the implicit slot.
#[instrument(level = "debug", skip_all)]
fn fold_hydrogens(mut graph: MoleculeGraph) -> Result<MoleculeGraph, StructureError> {
    let targets = graph
        .node_indices()
        .map(|n| fold_target(&graph, n))
        .collect::<Vec<_>>();
    let folded = targets.iter().flatten().count();
    if folded == 0 {
        return Ok(graph);
    }
    let mut per_atom = vec![0u8; graph.node_count()];
    for heavy in targets.iter().flatten() {
        per_atom[heavy.index()] = per_atom[heavy.index()].saturating_add(1);
    }
    for (h, heavy) in targets.iter().enumerate() {
        let Some(heavy) = *heavy else {
            continue;
        };
        let chirality = graph[heavy].data.chirality();
        if chirality.is_chiral() {
            let slots = reference_slots(&graph, heavy);
            let hydrogen = Some(NodeIndex::new(h));
            let pos = slots.iter().position(|&s| s == hydrogen);
            // moving the hydrogen to the front takes `pos` swaps
            let oriented = match pos {
                Some(pos) if per_atom[heavy.index()] == 1 && slots[0].is_some() => {
                    if pos % 2 == 1 {
                        chirality.inverted()
                    } else {
                        chirality
                    }
                }
                _ => Chirality::None,
            };
            graph[heavy].data.set_chirality(oriented);
        }
    }
    for heavy in graph.node_indices() {
        let count = per_atom[heavy.index()];
        if count > 0 && !graph[heavy].data.implicit() {
            graph[heavy].add_hydrogens(count)?;
        }
    }
    let mut out = MoleculeGraph::with_capacity(graph.node_count() - folded, graph.edge_count() - folded);
    let mut map = vec![NodeIndex::end(); graph.node_count()];
    for n in graph.node_indices() {
        if targets[n.index()].is_none() {
            map[n.index()] = out.add_node(graph[n]);
        }
    }
    for e in graph.edge_references() {
        let (s, t) = (map[e.source().index()], map[e.target().index()]);
        if s != NodeIndex::end() && t != NodeIndex::end() {
            out.add_edge(s, t, *e.weight());
        }
    }
    trace!(count = folded, "folded explicit hydrogens");
    Ok(out)
}

/// Aromatic bonds only make sense in rings. Chain bonds between aromatic atoms (like the one
/// joining the rings of biphenyl) become single, and aromatic atoms must be in a ring.
fn demote_chain_aromatics(graph: &mut MoleculeGraph, rings: &RingInfo) -> Result<(), StructureError> {
    for e in graph.edge_indices() {
        if graph[e] == Bond::Aromatic && !rings.is_ring_bond(e) {
            trace!(bond = e.index(), "demoting non-ring aromatic bond");
            graph[e] = Bond::Single;
        }
    }
    for n in graph.node_indices() {
        if graph[n].is_aromatic() && !rings.is_ring_atom(n) {
            return Err(StructureError::AromaticOutsideRing(n.index()));
        }
    }
    Ok(())
}

#[instrument(level = "debug", skip_all)]
fn fill_hydrogens(graph: &mut MoleculeGraph) -> Result<(), StructureError> {
    for n in graph.node_indices() {
        if !graph[n].data.implicit() {
            continue;
        }
        let h = implicit_hydrogens(graph, n);
        if h > 0 {
            trace!(atom = n.index(), count = h, "adding implicit hydrogens");
        }
        graph[n].set_hydrogens(h)?;
    }
    Ok(())
}

/// The number of hydrogens a bare SMILES atom would get, given the bonds it has.
///
/// Only organic-subset elements get hydrogens. Aliphatic atoms are filled up to the smallest
/// default valence that covers their bonds. Aromatic atoms count each aromatic bond as one and
/// leave one more valence for the ring's pi system, and only look at their lowest valence.
pub fn implicit_hydrogens(graph: &MoleculeGraph, atom: NodeIndex) -> u8 {
    let a = graph[atom];
    if !atom_info::is_organic(a.protons) || a.charge != 0 {
        return 0;
    }
    let valences = ATOM_DATA[a.protons as usize].valences;
    if a.is_aromatic() {
        let mut used = 0u32;
        let mut aromatic = false;
        for e in graph.edges(atom) {
            if *e.weight() == Bond::Aromatic {
                used += 1;
                aromatic = true;
            } else {
                used += e.weight().bond_count() as u32;
            }
        }
        if aromatic {
            used += 1;
        }
        let default = valences.first().copied().unwrap_or(0) as u32;
        default.saturating_sub(used).min(MAX_HYDROGENS as u32) as u8
    } else {
        let used = graph
            .edges(atom)
            .map(|e| e.weight().bond_count())
            .sum::<f32>()
            .ceil() as u32;
        valences
            .iter()
            .map(|&v| v as u32)
            .find(|&v| v >= used)
            .map_or(0, |v| (v - used).min(MAX_HYDROGENS as u32) as u8)
    }
}

/// Total valence used by an atom: bond orders plus hydrogens. Aromatic bonds count as one, since the
/// extra half is shared around the ring.
pub fn explicit_valence(graph: &MoleculeGraph, atom: NodeIndex) -> u32 {
    let a = graph[atom];
    let bonds: u32 = graph
        .edges(atom)
        .map(|e| match *e.weight() {
            Bond::Aromatic if a.is_aromatic() => 1,
            Bond::Aromatic => 2,
            b => b.bond_count() as u32,
        })
        .sum();
    bonds + a.hydrogens() as u32
}

/// Charged atoms are checked against their isoelectronic neutral element, so `[N+]` has the valences
/// of carbon and `[O-]` has the valences of fluorine.
#[instrument(level = "debug", skip_all)]
fn check_valences(graph: &MoleculeGraph) -> Result<(), StructureError> {
    for (n, a) in graph.node_references() {
        if a.is_wildcard() {
            continue;
        }
        let effective = a.protons as i16 - a.charge as i16;
        let Some(max) = u8::try_from(effective)
            .ok()
            .filter(|&p| p > 0)
            .and_then(atom_info::element)
            .and_then(|e| e.max_valence())
        else {
            continue;
        };
        let valence = explicit_valence(graph, n);
        if valence > max as u32 {
            return Err(StructureError::Valence {
                atom: n.index(),
                element: a.symbol(),
                charge: a.charge,
                valence: valence.min(u8::MAX as u32) as u8,
                max,
            });
        }
    }
    Ok(())
}

/// A validated molecule with its rings perceived.
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    graph: MoleculeGraph,
    rings: RingInfo,
}
impl Molecule {
    pub fn graph(&self) -> &MoleculeGraph {
        &self.graph
    }
    pub fn rings(&self) -> &RingInfo {
        &self.rings
    }
    /// Go back to a mutable graph. Derived properties will be recomputed on the next build.
    pub fn into_builder(self) -> MoleculeBuilder {
        MoleculeBuilder { graph: self.graph }
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }
    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }
    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }
    pub fn atoms(&self) -> impl Iterator<Item = (NodeIndex, &Atom)> + '_ {
        self.graph.node_references()
    }
    pub fn neighbors(&self, atom: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(atom)
    }
    /// Neighbors along with the bond to each.
    pub fn bonds_of(&self, atom: NodeIndex) -> impl Iterator<Item = (NodeIndex, EdgeIndex, Bond)> + '_ {
        self.graph
            .edges(atom)
            .map(move |e| (other_end(&e, atom), e.id(), *e.weight()))
    }
    pub fn bond_between(&self, a: NodeIndex, b: NodeIndex) -> Option<(EdgeIndex, Bond)> {
        self.graph.find_edge(a, b).map(|e| (e, self.graph[e]))
    }
    /// Number of heavy (explicit) neighbors.
    pub fn degree(&self, atom: NodeIndex) -> usize {
        self.graph.neighbors(atom).count()
    }
    /// Neighbors plus hydrogens.
    pub fn total_degree(&self, atom: NodeIndex) -> usize {
        self.degree(atom) + self.graph[atom].hydrogens() as usize
    }
    /// Number of ring bonds on this atom.
    pub fn ring_bond_count(&self, atom: NodeIndex) -> usize {
        self.graph
            .edges(atom)
            .filter(|e| self.rings.is_ring_bond(e.id()))
            .count()
    }

    /// Average molecular weight, counting implicit and explicit hydrogens.
    pub fn mass(&self) -> f32 {
        let h = ATOM_DATA[1].mass;
        self.graph
            .node_weights()
            .map(|a| a.mass() + h * a.hydrogens() as f32)
            .sum()
    }

    /// Renumber atoms, putting old atom `i` at index `order[i]`. Bonds are also added in reverse.
    ///
    /// The result is the same molecule, which makes this useful for checking that things don't
    /// depend on atom order.
    pub fn permute_atoms(&self, order: &[usize]) -> Result<Molecule, StructureError> {
        let count = self.graph.node_count();
        let mut inverse = vec![usize::MAX; count];
        for (old, &new) in order.iter().enumerate() {
            if new >= count {
                return Err(StructureError::AtomOutOfRange { index: new, count });
            }
            inverse[new] = old;
        }
        let mut builder = MoleculeBuilder::with_capacity(count, self.graph.edge_count());
        for (new, &old) in inverse.iter().enumerate() {
            // `order` isn't a permutation, so nothing lands here
            if old == usize::MAX {
                return Err(StructureError::AtomOutOfRange { index: new, count });
            }
            let old = NodeIndex::new(old);
            let mut atom = self.graph[old];
            atom.data.set_implicit(false);
            let chirality = atom.data.chirality();
            if chirality.is_chiral() {
                let mapped = reference_slots(&self.graph, old)
                    .into_iter()
                    .map(|s| s.map(|n| NodeIndex::new(order[n.index()])))
                    .collect::<Slots>();
                let mut sorted = mapped.clone();
                sorted.sort_unstable();
                atom.data
                    .set_chirality(reorder(chirality, &mapped, &sorted).unwrap_or_default());
            }
            builder.add_atom(atom);
        }
        for e in self.graph.edge_references().collect::<Vec<_>>().into_iter().rev() {
            builder.add_bond(
                NodeIndex::new(order[e.source().index()]),
                NodeIndex::new(order[e.target().index()]),
                *e.weight(),
            )?;
        }
        builder.build()
    }
}
impl Index<NodeIndex> for Molecule {
    type Output = Atom;

    fn index(&self, index: NodeIndex) -> &Atom {
        &self.graph[index]
    }
}
impl Index<EdgeIndex> for Molecule {
    type Output = Bond;

    fn index(&self, index: EdgeIndex) -> &Bond {
        &self.graph[index]
    }
}
