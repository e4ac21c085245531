use crate::atom_info;
use crate::core::*;
use crate::graph::algo::canonical_ranks_with_stereo;
use crate::graph::other_end;
use crate::molecule::{implicit_hydrogens, Molecule};
use crate::stereo::{has_implicit_slot, reference_slots, reorder, DoubleBondConfig, Slots, StereoCenters};
use petgraph::prelude::*;
use smallvec::SmallVec;
use std::fmt::Write;
use tracing::*;

/// `mark` is the direction chosen for a single bond next to a stereo double bond, `true` for `/`.
fn bond2str(
    graph: &MoleculeGraph,
    a: NodeIndex,
    b: NodeIndex,
    bond: Bond,
    mark: Option<bool>,
) -> &'static str {
    match (bond, mark) {
        (_, Some(true)) => "/",
        (_, Some(false)) => "\\",
        (bond, None) => plain_bond(graph, a, b, bond),
    }
}

fn plain_bond(graph: &MoleculeGraph, a: NodeIndex, b: NodeIndex, bond: Bond) -> &'static str {
    match bond {
        Bond::Double => "=",
        Bond::Triple => "#",
        Bond::Quad => "$",
        // a bare bond between aromatic atoms would be read back as aromatic
        Bond::Single | Bond::Up | Bond::Down
            if graph[a].is_aromatic() && graph[b].is_aromatic() =>
        {
            "-"
        }
        _ => "",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SmilesConfig {
    pub isotopes: bool,
    pub canon: bool,
}
impl SmilesConfig {
    /// Default config, gives canonical output
    pub const fn new() -> Self {
        Self {
            isotopes: true,
            canon: true,
        }
    }
    /// Keep the input atom order, better for serialization.
    pub const fn fast_roundtrip() -> Self {
        Self {
            isotopes: true,
            canon: false,
        }
    }
    pub const fn with_isotopes(mut self, isotopes: bool) -> Self {
        self.isotopes = isotopes;
        self
    }
}
impl Default for SmilesConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Spanning forest of the molecule, with the ring closures that didn't make it into the tree.
struct Spanning {
    children: Vec<Vec<(NodeIndex, EdgeIndex)>>,
    /// Closures that start at an atom, to be closed by a descendant
    opens: Vec<Vec<EdgeIndex>>,
    /// Closures back to an ancestor
    closes: Vec<Vec<EdgeIndex>>,
    visited: Vec<bool>,
    edge_done: Vec<bool>,
    /// Atoms in the order they're written
    preorder: Vec<NodeIndex>,
    /// The atom each bond's symbol is written after: the parent for tree bonds, the closing atom
    /// for ring closures
    from: Vec<NodeIndex>,
}
impl Spanning {
    fn new(graph: &MoleculeGraph) -> Self {
        let n = graph.node_count();
        Self {
            children: vec![Vec::new(); n],
            opens: vec![Vec::new(); n],
            closes: vec![Vec::new(); n],
            visited: vec![false; n],
            edge_done: vec![false; graph.edge_count()],
            preorder: Vec::with_capacity(n),
            from: vec![NodeIndex::end(); graph.edge_count()],
        }
    }

    /// Depth-first walk from `root`, visiting neighbors in rank order.
    fn walk(&mut self, graph: &MoleculeGraph, ranks: &[usize], root: NodeIndex) {
        let sorted = |node: NodeIndex| {
            let mut nbrs = graph
                .edges(node)
                .map(|e| (other_end(&e, node), e.id()))
                .collect::<Vec<_>>();
            nbrs.sort_unstable_by_key(|&(n, _)| ranks[n.index()]);
            nbrs
        };
        self.visited[root.index()] = true;
        self.preorder.push(root);
        let mut stack = vec![(root, sorted(root), 0usize)];
        while let Some(top) = stack.last_mut() {
            let node = top.0;
            let step = top.1.get(top.2).copied();
            top.2 += 1;
            let Some((next, edge)) = step else {
                stack.pop();
                continue;
            };
            if self.edge_done[edge.index()] {
                continue;
            }
            self.edge_done[edge.index()] = true;
            self.from[edge.index()] = node;
            if self.visited[next.index()] {
                self.opens[next.index()].push(edge);
                self.closes[node.index()].push(edge);
            } else {
                self.visited[next.index()] = true;
                self.preorder.push(next);
                self.children[node.index()].push((next, edge));
                stack.push((next, sorted(next), 0));
            }
        }
    }

    /// Neighbors in the order they're written around `node`, the way chirality is read back.
    fn output_slots(&self, graph: &MoleculeGraph, node: NodeIndex, parent: Option<NodeIndex>) -> Slots {
        let mut out = Slots::new();
        out.extend(parent.map(Some));
        if has_implicit_slot(graph, node) {
            out.push(None);
        }
        for &e in self.closes[node.index()].iter().chain(&self.opens[node.index()]) {
            if let Some((a, b)) = graph.edge_endpoints(e) {
                out.push(Some(if a == node { b } else { a }));
            }
        }
        out.extend(self.children[node.index()].iter().map(|&(c, _)| Some(c)));
        out
    }

    /// Whether the other end of a marked bond is above `atom` as written.
    fn is_above(&self, marks: &[Option<bool>], atom: NodeIndex, edge: EdgeIndex) -> Option<bool> {
        marks[edge.index()].map(|m| m == (self.from[edge.index()] == atom))
    }

    /// Mark a bond so that its other end is above `atom` as written, or below.
    fn set_above(&self, marks: &mut [Option<bool>], atom: NodeIndex, edge: EdgeIndex, above: bool) {
        marks[edge.index()] = Some(above == (self.from[edge.index()] == atom));
    }

    /// Pick `/` and `\` for the single bonds around each stereo double bond, going in writing
    /// order and reusing marks already placed by an earlier double bond.
    fn bond_marks(&self, graph: &MoleculeGraph, stereo: &StereoCenters) -> Vec<Option<bool>> {
        let mut marks = vec![None; graph.edge_count()];
        let mut position = vec![0usize; graph.node_count()];
        for (i, &n) in self.preorder.iter().enumerate() {
            position[n.index()] = i;
        }
        let mut doubles = graph
            .edge_indices()
            .filter(|e| stereo.bonds[e.index()])
            .filter_map(|e| graph.edge_endpoints(e))
            .map(|(a, b)| {
                if position[a.index()] <= position[b.index()] {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .collect::<Vec<_>>();
        doubles.sort_unstable_by_key(|&(a, b)| (position[a.index()], position[b.index()]));
        for (a, b) in doubles {
            let Some(config) = DoubleBondConfig::of(graph, a, b) else {
                continue;
            };
            let pick = |marks: &[Option<bool>], x: NodeIndex, y: NodeIndex| {
                let mut others = graph
                    .edges(x)
                    .map(|e| (other_end(&e, x), e.id()))
                    .filter(|&(n, _)| n != y)
                    .collect::<SmallVec<(NodeIndex, EdgeIndex), 2>>();
                others.sort_unstable_by_key(|&(n, _)| position[n.index()]);
                others
                    .iter()
                    .find(|(_, e)| marks[e.index()].is_some())
                    .or(others.first())
                    .copied()
            };
            let (Some((x, ex)), Some((y, ey))) = (pick(&marks, a, b), pick(&marks, b, a)) else {
                continue;
            };
            let cis = config.cis_between(x, y);
            let (up_x, up_y) = match (self.is_above(&marks, a, ex), self.is_above(&marks, b, ey)) {
                (Some(up_x), Some(up_y)) => {
                    if (up_x == up_y) != cis {
                        debug!(a = a.index(), b = b.index(), "bond directions conflict");
                    }
                    continue;
                }
                (Some(up_x), None) => (up_x, up_x == cis),
                (None, Some(up_y)) => (up_y == cis, up_y),
                (None, None) => {
                    // the first mark in a chain is always '/'
                    marks[ex.index()] = Some(true);
                    let up_x = self.is_above(&marks, a, ex).unwrap_or(true);
                    (up_x, up_x == cis)
                }
            };
            self.set_above(&mut marks, a, ex, up_x);
            self.set_above(&mut marks, b, ey, up_y);
        }
        marks
    }
}

enum Frame {
    Atom(NodeIndex, Option<EdgeIndex>),
    Open,
    Close,
}

pub(crate) fn write_ring_digit(out: &mut String, digit: usize) {
    let _ = match digit {
        0..=9 => write!(out, "{digit}"),
        10..=99 => write!(out, "%{digit}"),
        _ => write!(out, "%({digit})"),
    };
}

fn write_atom(
    out: &mut String,
    graph: &MoleculeGraph,
    node: NodeIndex,
    chirality: Chirality,
    cfg: SmilesConfig,
) {
    let atom = graph[node];
    let isotope = if cfg.isotopes { atom.isotope } else { 0 };
    let plain = atom.charge == 0 && isotope == 0 && !chirality.is_chiral();
    let push_symbol = |out: &mut String| {
        if atom.is_aromatic() {
            out.extend(atom.symbol().chars().map(|c| c.to_ascii_lowercase()));
        } else {
            out.push_str(atom.symbol());
        }
    };
    if plain && atom.is_wildcard() && atom.hydrogens() == 0 {
        out.push('*');
        return;
    }
    if plain
        && atom_info::is_organic(atom.protons)
        && atom.hydrogens() == implicit_hydrogens(graph, node)
    {
        push_symbol(out);
        return;
    }
    out.push('[');
    if isotope > 0 {
        let _ = write!(out, "{isotope}");
    }
    push_symbol(out);
    match chirality {
        Chirality::None => {}
        Chirality::Ccw => out.push('@'),
        Chirality::Cw => out.push_str("@@"),
    }
    match atom.hydrogens() {
        0 => {}
        1 => out.push('H'),
        h => {
            let _ = write!(out, "H{h}");
        }
    }
    match atom.charge {
        0 => {}
        1 => out.push('+'),
        -1 => out.push('-'),
        n => {
            let _ = write!(out, "{n:+}");
        }
    }
    out.push(']');
}

/// Write a molecule as SMILES.
///
/// With `cfg.canon`, atoms are ordered by [`canonical_ranks`](crate::graph::algo::canonical_ranks),
/// so isomorphic molecules give the same string. Chirality and double bond geometry are written for
/// the stereo elements that don't vanish under symmetry, re-expressed for the output order.
#[instrument(level = "debug", skip_all, fields(atoms = mol.atom_count()))]
pub fn generate_smiles(mol: &Molecule, cfg: SmilesConfig) -> String {
    if mol.is_empty() {
        return String::new();
    }
    let graph = mol.graph();
    let (canon, stereo) = canonical_ranks_with_stereo(mol);
    let ranks = if cfg.canon {
        canon
    } else {
        (0..graph.node_count()).collect()
    };
    let mut order = graph.node_indices().collect::<Vec<_>>();
    order.sort_unstable_by_key(|n| ranks[n.index()]);

    let mut span = Spanning::new(graph);
    let mut roots = Vec::new();
    for root in order {
        if !span.visited[root.index()] {
            span.walk(graph, &ranks, root);
            roots.push(root);
        }
    }
    let marks = span.bond_marks(graph, &stereo);

    let mut out = String::with_capacity(graph.node_count() * 2);
    let mut digits_used = Vec::<bool>::new();
    let mut edge_digit = vec![0usize; graph.edge_count()];
    let mut closing = Vec::new();
    let mut stack = Vec::new();
    for root in roots {
        if !out.is_empty() {
            out.push('.');
        }
        stack.push(Frame::Atom(root, None));
        while let Some(frame) = stack.pop() {
            let (node, edge) = match frame {
                Frame::Open => {
                    out.push('(');
                    continue;
                }
                Frame::Close => {
                    out.push(')');
                    continue;
                }
                Frame::Atom(node, edge) => (node, edge),
            };
            let mut parent = None;
            if let Some(e) = edge {
                if let Some((a, b)) = graph.edge_endpoints(e) {
                    out.push_str(bond2str(graph, a, b, graph[e], marks[e.index()]));
                    parent = Some(if a == node { b } else { a });
                }
            }
            let chirality = if stereo.atoms[node.index()] {
                let written = span.output_slots(graph, node, parent);
                let stored = graph[node].data.chirality();
                reorder(stored, &reference_slots(graph, node), &written).unwrap_or_default()
            } else {
                Chirality::None
            };
            write_atom(&mut out, graph, node, chirality, cfg);

            // closing digits stay taken until this atom's openings are assigned, so the same
            // number is never closed and reopened on one atom
            closing.clear();
            for &e in &span.closes[node.index()] {
                let d = edge_digit[e.index()];
                if let Some((a, b)) = graph.edge_endpoints(e) {
                    out.push_str(bond2str(graph, a, b, graph[e], marks[e.index()]));
                }
                write_ring_digit(&mut out, d);
                closing.push(d);
            }
            for &e in &span.opens[node.index()] {
                let d = match digits_used.iter().skip(1).position(|&u| !u) {
                    Some(i) => i + 1,
                    None => digits_used.len().max(1),
                };
                if digits_used.len() <= d {
                    digits_used.resize(d + 1, false);
                }
                digits_used[d] = true;
                edge_digit[e.index()] = d;
                trace!(digit = d, atom = node.index(), "opening ring closure");
                write_ring_digit(&mut out, d);
            }
            for &d in &closing {
                digits_used[d] = false;
            }

            let children = &span.children[node.index()];
            if let Some((&(last, last_edge), rest)) = children.split_last() {
                stack.push(Frame::Atom(last, Some(last_edge)));
                for &(child, child_edge) in rest.iter().rev() {
                    stack.push(Frame::Close);
                    stack.push(Frame::Atom(child, Some(child_edge)));
                    stack.push(Frame::Open);
                }
            }
        }
    }
    out
}
