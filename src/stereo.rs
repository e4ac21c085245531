//! Tetrahedral and double bond stereo.
//!
//! An atom's [`Chirality`] is stored relative to its reference order: the implicit hydrogen or lone
//! pair first if it has one, then its bonded neighbors by ascending index. Parsers and writers
//! re-express it against the order atoms are written in.
//!
//! Double bond geometry lives on the single bonds around the double bond. `Up` on an edge means the
//! edge's target sits above its source, `Down` that it sits below.

use crate::core::*;
use crate::graph::other_end;
use crate::molecule::Molecule;
use petgraph::prelude::*;
use smallvec::SmallVec;

/// A neighbor around a stereocenter. `None` is the implicit hydrogen or lone pair.
pub type Slot = Option<NodeIndex>;
pub type Slots = SmallVec<Slot, 4>;

/// Elements that can hold a lone pair as their fourth group: P, S, As, Se
const LONE_PAIR_CENTERS: [u8; 4] = [15, 16, 33, 34];

/// Double bonds in rings smaller than this can only be cis.
const MIN_STEREO_RING: usize = 8;

/// Whether an atom has an implicit slot: a single hydrogen, or a lone pair on a three-coordinate
/// center.
pub fn has_implicit_slot(graph: &MoleculeGraph, atom: NodeIndex) -> bool {
    let a = graph[atom];
    match a.hydrogens() {
        1 => true,
        0 => graph.neighbors(atom).count() == 3 && LONE_PAIR_CENTERS.contains(&a.protons),
        _ => false,
    }
}

/// The order an atom's chirality is stored against.
pub fn reference_slots(graph: &MoleculeGraph, atom: NodeIndex) -> Slots {
    let mut neighbors = graph.neighbors(atom).collect::<SmallVec<NodeIndex, 4>>();
    neighbors.sort_unstable();
    let mut out = Slots::new();
    if has_implicit_slot(graph, atom) {
        out.push(None);
    }
    out.extend(neighbors.into_iter().map(Some));
    out
}

/// Whether `to` is an odd permutation of `from`, or `None` if they don't hold the same slots.
pub fn is_odd_permutation(from: &[Slot], to: &[Slot]) -> Option<bool> {
    if from.len() != to.len() {
        return None;
    }
    let perm = to
        .iter()
        .map(|s| from.iter().position(|f| f == s))
        .collect::<Option<SmallVec<usize, 4>>>()?;
    let mut inversions = 0;
    for i in 0..perm.len() {
        for j in (i + 1)..perm.len() {
            match perm[i].cmp(&perm[j]) {
                std::cmp::Ordering::Greater => inversions += 1,
                std::cmp::Ordering::Equal => return None,
                std::cmp::Ordering::Less => {}
            }
        }
    }
    Some(inversions % 2 == 1)
}

/// Re-express chirality given against the order `from` as chirality against `to`.
pub fn reorder(chirality: Chirality, from: &[Slot], to: &[Slot]) -> Option<Chirality> {
    let odd = is_odd_permutation(from, to)?;
    Some(if odd { chirality.inverted() } else { chirality })
}

/// Whether the other end of a directional bond sits above `atom`. `None` for undirected bonds.
pub fn is_above(graph: &MoleculeGraph, atom: NodeIndex, edge: EdgeIndex) -> Option<bool> {
    let (source, _) = graph.edge_endpoints(edge)?;
    let up = match graph[edge] {
        Bond::Up => true,
        Bond::Down => false,
        _ => return None,
    };
    Some(up == (source == atom))
}

/// The geometry of a double bond: a directional neighbor on each end, and whether they're on the
/// same side.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DoubleBondConfig {
    pub left: NodeIndex,
    pub right: NodeIndex,
    pub cis: bool,
}
impl DoubleBondConfig {
    /// Read the geometry of the double bond between `a` and `b`, if both ends have a directional bond.
    pub fn of(graph: &MoleculeGraph, a: NodeIndex, b: NodeIndex) -> Option<Self> {
        let side = |x: NodeIndex, y: NodeIndex| {
            graph.edges(x).find_map(|e| {
                let other = other_end(&e, x);
                if other == y {
                    return None;
                }
                Some((other, is_above(graph, x, e.id())?))
            })
        };
        let (left, left_up) = side(a, b)?;
        let (right, right_up) = side(b, a)?;
        Some(Self {
            left,
            right,
            cis: left_up == right_up,
        })
    }
    /// Whether `x` on the left end and `y` on the right end are cis. Each end has at most two
    /// substituents, so any other neighbor is on the opposite side from the stored one.
    pub fn cis_between(self, x: NodeIndex, y: NodeIndex) -> bool {
        self.cis ^ (x != self.left) ^ (y != self.right)
    }
}

/// Stereo elements that don't vanish under symmetry: chiral atoms whose four groups all differ,
/// and double bonds outside small rings with distinct groups on each end and a geometry given for
/// both ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StereoCenters {
    pub atoms: Vec<bool>,
    pub bonds: Vec<bool>,
}
impl StereoCenters {
    /// Find the stereo elements, given a symmetry class for each atom.
    pub fn find(mol: &Molecule, classes: &[usize]) -> Self {
        let graph = mol.graph();
        let atoms = graph
            .node_indices()
            .map(|n| is_stereo_atom(graph, classes, n))
            .collect();
        let bonds = graph
            .edge_indices()
            .map(|e| is_stereo_bond(mol, classes, e))
            .collect();
        Self { atoms, bonds }
    }
    pub fn is_empty(&self) -> bool {
        !self.atoms.iter().chain(&self.bonds).any(|&s| s)
    }

    /// A label for each atom describing its stereo relative to the ranks of its neighbors.
    ///
    /// Ranks must order the neighbors of every stereo element strictly, which holds for any
    /// refinement of the classes the centers were found with.
    pub fn labels(&self, mol: &Molecule, ranks: &[usize]) -> Vec<u8> {
        let graph = mol.graph();
        let mut labels = vec![0u8; graph.node_count()];
        for n in graph.node_indices().filter(|n| self.atoms[n.index()]) {
            let reference = reference_slots(graph, n);
            let mut ranked = reference.clone();
            ranked.sort_by_key(|s| s.map(|a| ranks[a.index()] + 1));
            labels[n.index()] = match reorder(graph[n].data.chirality(), &reference, &ranked) {
                Some(Chirality::Ccw) => 1,
                Some(Chirality::Cw) => 2,
                _ => 0,
            };
        }
        for e in graph.edge_indices().filter(|e| self.bonds[e.index()]) {
            let Some((a, b)) = graph.edge_endpoints(e) else {
                continue;
            };
            let Some(config) = DoubleBondConfig::of(graph, a, b) else {
                continue;
            };
            let highest = |x: NodeIndex, y: NodeIndex| {
                graph
                    .neighbors(x)
                    .filter(|&n| n != y)
                    .max_by_key(|n| ranks[n.index()])
            };
            let (Some(x), Some(y)) = (highest(a, b), highest(b, a)) else {
                continue;
            };
            let label = if config.cis_between(x, y) { 3 } else { 6 };
            labels[a.index()] += label;
            labels[b.index()] += label;
        }
        labels
    }
}

fn is_stereo_atom(graph: &MoleculeGraph, classes: &[usize], atom: NodeIndex) -> bool {
    if !graph[atom].data.chirality().is_chiral() {
        return false;
    }
    let slots = reference_slots(graph, atom);
    if slots.len() != 4 {
        return false;
    }
    let mut seen = SmallVec::<usize, 4>::new();
    for a in slots.iter().flatten() {
        let class = classes[a.index()];
        if seen.contains(&class) {
            return false;
        }
        seen.push(class);
    }
    true
}

fn is_stereo_bond(mol: &Molecule, classes: &[usize], edge: EdgeIndex) -> bool {
    let graph = mol.graph();
    if graph[edge] != Bond::Double {
        return false;
    }
    if mol
        .rings()
        .rings()
        .iter()
        .any(|r| r.contains_bond(edge) && r.len() < MIN_STEREO_RING)
    {
        return false;
    }
    let Some((a, b)) = graph.edge_endpoints(edge) else {
        return false;
    };
    let distinct_sides = [(a, b), (b, a)].into_iter().all(|(x, y)| {
        let others = graph
            .neighbors(x)
            .filter(|&n| n != y)
            .collect::<SmallVec<NodeIndex, 2>>();
        match others[..] {
            [_] => graph[x].hydrogens() <= 1,
            [p, q] => classes[p.index()] != classes[q.index()],
            _ => false,
        }
    });
    distinct_sides && DoubleBondConfig::of(graph, a, b).is_some()
}
