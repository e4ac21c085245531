//! Smallest set of smallest rings.
//!
//! Candidate cycles come from shortest-path trees rooted at every ring atom (Horton's method). They're
//! sorted by size and kept greedily while they're linearly independent over GF(2), using edge bit
//! sets as vectors, until there are as many rings as the cyclomatic number of the graph.

use crate::core::MoleculeGraph;
use crate::graph::other_end;
use crate::utils::bitset::BitSet;
use ahash::AHashMap;
use petgraph::algo::connected_components;
use petgraph::prelude::*;
use std::collections::VecDeque;
use tracing::*;

pub type EdgeSet = BitSet<usize, 2>;

/// A single ring of the SSSR.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ring {
    /// Atoms in walking order around the ring, starting from the lowest index.
    pub atoms: Vec<NodeIndex>,
    /// Bonds in the same order, `bonds[i]` joining `atoms[i]` and `atoms[i + 1]`.
    pub bonds: Vec<EdgeIndex>,
    pub(crate) edge_set: EdgeSet,
}
impl Ring {
    pub fn len(&self) -> usize {
        self.atoms.len()
    }
    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }
    pub fn contains_atom(&self, atom: NodeIndex) -> bool {
        self.atoms.contains(&atom)
    }
    pub fn contains_bond(&self, bond: EdgeIndex) -> bool {
        self.edge_set.get(bond.index())
    }
    /// The bonds of this ring as a set of edge indices.
    pub fn edge_set(&self) -> &EdgeSet {
        &self.edge_set
    }
}

/// Ring membership for a molecule, computed once when it's built.
#[derive(Debug, Clone, Default)]
pub struct RingInfo {
    rings: Vec<Ring>,
    /// Number of SSSR rings each atom is in.
    atom_rings: Vec<u8>,
    ring_bonds: EdgeSet,
}
impl RingInfo {
    /// Find the SSSR of a graph.
    #[instrument(level = "debug", skip_all, fields(atoms = graph.node_count(), bonds = graph.edge_count()))]
    pub fn perceive(graph: &MoleculeGraph) -> Self {
        let mut out = Self {
            rings: Vec::new(),
            atom_rings: vec![0; graph.node_count()],
            ring_bonds: EdgeSet::new(),
        };
        let expected = expected_ring_count(graph);
        if expected == 0 {
            return out;
        }
        let core = cyclic_core(graph);
        let mut candidates = horton_candidates(graph, &core);
        candidates.sort_by(|a, b| {
            a.count_ones()
                .cmp(&b.count_ones())
                .then_with(|| a.as_slice().cmp(b.as_slice()))
        });
        candidates.dedup();
        trace!(count = candidates.len(), expected, "collected candidate cycles");

        // reduced basis vectors, keyed by their lowest set bit
        let mut basis = AHashMap::<usize, EdgeSet>::new();
        for cand in candidates {
            if out.rings.len() >= expected {
                break;
            }
            let mut reduced = cand.clone();
            let independent = loop {
                let Some(pivot) = reduced.first_one() else {
                    break false;
                };
                match basis.get(&pivot) {
                    Some(v) => reduced ^= v,
                    None => {
                        basis.insert(pivot, reduced);
                        break true;
                    }
                }
            };
            if independent {
                if let Some(ring) = walk_ring(graph, cand) {
                    out.rings.push(ring);
                }
            }
        }
        if out.rings.len() < expected {
            warn!(found = out.rings.len(), expected, "SSSR is missing rings");
        }
        for ring in &out.rings {
            for &a in &ring.atoms {
                out.atom_rings[a.index()] = out.atom_rings[a.index()].saturating_add(1);
            }
            out.ring_bonds |= &ring.edge_set;
        }
        debug!(rings = out.rings.len(), "perceived rings");
        out
    }

    pub fn rings(&self) -> &[Ring] {
        &self.rings
    }
    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }
    pub fn is_ring_atom(&self, atom: NodeIndex) -> bool {
        self.atom_ring_count(atom) > 0
    }
    pub fn is_ring_bond(&self, bond: EdgeIndex) -> bool {
        self.ring_bonds.get(bond.index())
    }
    /// How many SSSR rings contain this atom.
    pub fn atom_ring_count(&self, atom: NodeIndex) -> usize {
        self.atom_rings.get(atom.index()).map_or(0, |&n| n as usize)
    }
    /// Check if this atom is in an SSSR ring with exactly `size` atoms.
    pub fn in_ring_of_size(&self, atom: NodeIndex, size: usize) -> bool {
        self.atom_rings(atom).any(|r| r.len() == size)
    }
    pub fn smallest_ring_size(&self, atom: NodeIndex) -> Option<usize> {
        self.atom_rings(atom).map(Ring::len).min()
    }
    pub fn atom_rings(&self, atom: NodeIndex) -> impl Iterator<Item = &Ring> + '_ {
        self.rings.iter().filter(move |r| r.contains_atom(atom))
    }
    /// All bonds that are in some ring.
    pub fn ring_bonds(&self) -> &EdgeSet {
        &self.ring_bonds
    }
}

/// The cyclomatic number, `E - V + C`.
pub fn expected_ring_count(graph: &MoleculeGraph) -> usize {
    (graph.edge_count() + connected_components(graph)).saturating_sub(graph.node_count())
}

/// Strip atoms of degree one until none are left. Whatever survives is in a ring or between rings.
fn cyclic_core(graph: &MoleculeGraph) -> Vec<bool> {
    let mut degree = graph
        .node_indices()
        .map(|n| graph.neighbors(n).count())
        .collect::<Vec<_>>();
    let mut alive = vec![true; graph.node_count()];
    let mut queue = graph
        .node_indices()
        .filter(|n| degree[n.index()] < 2)
        .collect::<Vec<_>>();
    while let Some(n) = queue.pop() {
        if !alive[n.index()] {
            continue;
        }
        alive[n.index()] = false;
        for m in graph.neighbors(n) {
            if alive[m.index()] {
                degree[m.index()] -= 1;
                if degree[m.index()] == 1 {
                    queue.push(m);
                }
            }
        }
    }
    alive
}

/// For every core atom, build a BFS tree and close each non-tree edge into a cycle through the root.
fn horton_candidates(graph: &MoleculeGraph, core: &[bool]) -> Vec<EdgeSet> {
    let n = graph.node_count();
    let mut out = Vec::new();
    let mut parent: Vec<Option<(NodeIndex, EdgeIndex)>> = vec![None; n];
    let mut dist = vec![usize::MAX; n];
    let mut queue = VecDeque::new();
    let mut seen_on_path = vec![usize::MAX; n];
    for root in graph.node_indices().filter(|r| core[r.index()]) {
        parent.fill(None);
        dist.fill(usize::MAX);
        dist[root.index()] = 0;
        queue.push_back(root);
        while let Some(x) = queue.pop_front() {
            for e in graph.edges(x) {
                let y = other_end(&e, x);
                if core[y.index()] && dist[y.index()] == usize::MAX {
                    dist[y.index()] = dist[x.index()] + 1;
                    parent[y.index()] = Some((x, e.id()));
                    queue.push_back(y);
                }
            }
        }
        for e in graph.edge_references() {
            let (x, y) = (e.source(), e.target());
            if !core[x.index()] || !core[y.index()] {
                continue;
            }
            if dist[x.index()] == usize::MAX || dist[y.index()] == usize::MAX {
                continue;
            }
            let is_tree = |a: NodeIndex, b: NodeIndex| parent[a.index()].is_some_and(|(p, _)| p == b);
            if is_tree(x, y) || is_tree(y, x) {
                continue;
            }
            // the two paths back to the root must only meet at the root
            let stamp = e.id().index() + root.index() * graph.edge_count();
            let mut cur = x;
            while let Some((p, _)) = parent[cur.index()] {
                seen_on_path[cur.index()] = stamp;
                cur = p;
            }
            let mut disjoint = true;
            cur = y;
            while let Some((p, _)) = parent[cur.index()] {
                if seen_on_path[cur.index()] == stamp {
                    disjoint = false;
                    break;
                }
                cur = p;
            }
            if !disjoint {
                continue;
            }
            let mut set = EdgeSet::with_capacity(graph.edge_count());
            set.set(e.id().index(), true);
            for start in [x, y] {
                let mut cur = start;
                while let Some((p, edge)) = parent[cur.index()] {
                    set.set(edge.index(), true);
                    cur = p;
                }
            }
            out.push(set);
        }
    }
    out
}

/// Turn a cycle's edge set into a `Ring`, walking around it from its lowest atom.
fn walk_ring(graph: &MoleculeGraph, edge_set: EdgeSet) -> Option<Ring> {
    let edges = edge_set
        .ones()
        .map(EdgeIndex::new)
        .collect::<Vec<_>>();
    let start = edges
        .iter()
        .filter_map(|&e| graph.edge_endpoints(e))
        .flat_map(|(a, b)| [a, b])
        .min()?;
    let mut atoms = Vec::with_capacity(edges.len());
    let mut bonds = Vec::with_capacity(edges.len());
    let mut cur = start;
    let mut prev_edge = None;
    loop {
        atoms.push(cur);
        let next = graph
            .edges(cur)
            .filter(|e| Some(e.id()) != prev_edge && edge_set.get(e.id().index()))
            .min_by_key(|e| other_end(e, cur))?;
        bonds.push(next.id());
        prev_edge = Some(next.id());
        cur = other_end(&next, cur);
        if cur == start {
            break;
        }
        if atoms.len() > edges.len() {
            return None;
        }
    }
    (bonds.len() == edges.len()).then_some(Ring {
        atoms,
        bonds,
        edge_set,
    })
}
