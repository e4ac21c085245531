//! Query graphs for substructure search.
//!
//! A [`QueryMolecule`] has the same shape as a molecule graph, but its atoms and bonds are
//! predicates over a target molecule. They're usually parsed from SMARTS, but any molecule can be
//! turned into an exact query.

use crate::core::*;
use crate::graph::algo::substruct::{SearchBudget, SubstructMatcher};
use crate::molecule::Molecule;
use petgraph::prelude::*;
use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

/// A predicate on an atom of a target molecule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AtomQuery {
    /// Matches anything, `*`
    True,
    /// An element, optionally restricted to aromatic or aliphatic atoms
    Element { protons: u8, aromatic: Option<bool> },
    /// `#n`
    AtomicNum(u8),
    /// `a`
    Aromatic,
    /// `A`
    Aliphatic,
    /// Mass number, with 0 for an unspecified isotope
    Isotope(u16),
    Charge(i8),
    /// `Hn`, counting all hydrogens
    TotalH(u8),
    /// `Dn`, heavy neighbors
    Degree(u8),
    /// `Xn`, neighbors including hydrogens
    Connectivity(u8),
    /// `R` alone: in any ring
    InRing,
    /// `Rn`, the number of SSSR rings the atom is in
    RingCount(u8),
    /// `rn`, in an SSSR ring of this size
    RingSize(u8),
    /// `xn`, ring bonds on the atom
    RingBonds(u8),
    /// `$(...)`, matches if the nested query matches with its first atom here
    Recursive(Box<QueryMolecule>),
    Not(Box<AtomQuery>),
    And(Vec<AtomQuery>),
    Or(Vec<AtomQuery>),
}
impl AtomQuery {
    pub fn matches(&self, mol: &Molecule, atom: NodeIndex) -> bool {
        let a = mol[atom];
        match self {
            Self::True => true,
            Self::Element { protons, aromatic } => {
                a.protons == *protons && aromatic.map_or(true, |ar| ar == a.is_aromatic())
            }
            Self::AtomicNum(p) => a.protons == *p,
            Self::Aromatic => a.is_aromatic(),
            Self::Aliphatic => !a.is_aromatic(),
            Self::Isotope(i) => a.isotope == *i,
            Self::Charge(c) => a.charge == *c,
            Self::TotalH(h) => a.hydrogens() == *h,
            Self::Degree(d) => mol.degree(atom) == *d as usize,
            Self::Connectivity(x) => mol.total_degree(atom) == *x as usize,
            Self::InRing => mol.rings().is_ring_atom(atom),
            Self::RingCount(n) => mol.rings().atom_ring_count(atom) == *n as usize,
            Self::RingSize(n) => mol.rings().in_ring_of_size(atom, *n as usize),
            Self::RingBonds(n) => mol.ring_bond_count(atom) == *n as usize,
            Self::Recursive(q) => SubstructMatcher::rooted(mol, q, atom, SearchBudget::unlimited())
                .next()
                .is_some_and(|m| m.is_ok()),
            Self::Not(q) => !q.matches(mol, atom),
            Self::And(qs) => qs.iter().all(|q| q.matches(mol, atom)),
            Self::Or(qs) => qs.iter().any(|q| q.matches(mol, atom)),
        }
    }

    /// The smallest number of heavy neighbors a matching atom could have, if the query says.
    pub fn min_degree(&self) -> usize {
        match self {
            Self::Degree(d) => *d as usize,
            Self::Recursive(q) => q
                .graph
                .node_indices()
                .next()
                .map_or(0, |root| q.graph.neighbors(root).count()),
            Self::And(qs) => qs.iter().map(Self::min_degree).max().unwrap_or(0),
            Self::Or(qs) => qs.iter().map(Self::min_degree).min().unwrap_or(0),
            _ => 0,
        }
    }
}
impl Display for AtomQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("*"),
            Self::Element { protons, aromatic } => {
                let sym = crate::atom_info::ATOM_DATA
                    .get(*protons as usize)
                    .map_or("*", |e| e.sym);
                match aromatic {
                    Some(true) => write!(f, "{}", sym.to_ascii_lowercase()),
                    Some(false) => f.write_str(sym),
                    None => write!(f, "#{protons}"),
                }
            }
            Self::AtomicNum(p) => write!(f, "#{p}"),
            Self::Aromatic => f.write_str("a"),
            Self::Aliphatic => f.write_str("A"),
            Self::Isotope(i) => write!(f, "{i}"),
            Self::Charge(c) => write!(f, "{c:+}"),
            Self::TotalH(h) => write!(f, "H{h}"),
            Self::Degree(d) => write!(f, "D{d}"),
            Self::Connectivity(x) => write!(f, "X{x}"),
            Self::InRing => f.write_str("R"),
            Self::RingCount(n) => write!(f, "R{n}"),
            Self::RingSize(n) => write!(f, "r{n}"),
            Self::RingBonds(n) => write!(f, "x{n}"),
            Self::Recursive(q) => write!(f, "$({q})"),
            Self::Not(q) => write!(f, "!{q}"),
            Self::And(qs) => write_joined(f, qs, "&"),
            Self::Or(qs) => write_joined(f, qs, ","),
        }
    }
}

fn write_joined<T: Display>(f: &mut Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (n, q) in items.iter().enumerate() {
        if n > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{q}")?;
    }
    Ok(())
}

/// A predicate on a bond of a target molecule.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BondQuery {
    /// `~`
    True,
    /// `-`, `/` and `\`, which all match any single bond
    Single,
    Double,
    Triple,
    Quad,
    Aromatic,
    /// `@`
    Ring,
    /// An unwritten bond
    SingleOrAromatic,
    Not(Box<BondQuery>),
    And(Vec<BondQuery>),
    Or(Vec<BondQuery>),
}
impl BondQuery {
    pub fn matches(&self, mol: &Molecule, bond: EdgeIndex) -> bool {
        let b = mol[bond];
        match self {
            Self::True => true,
            Self::Single => b.is_single(),
            Self::Double => b == Bond::Double,
            Self::Triple => b == Bond::Triple,
            Self::Quad => b == Bond::Quad,
            Self::Aromatic => b == Bond::Aromatic,
            Self::Ring => mol.rings().is_ring_bond(bond),
            Self::SingleOrAromatic => b.is_single() || b == Bond::Aromatic,
            Self::Not(q) => !q.matches(mol, bond),
            Self::And(qs) => qs.iter().all(|q| q.matches(mol, bond)),
            Self::Or(qs) => qs.iter().any(|q| q.matches(mol, bond)),
        }
    }

    /// The query that matches exactly this kind of bond.
    pub fn exact(bond: Bond) -> Self {
        match bond {
            Bond::Double => Self::Double,
            Bond::Triple => Self::Triple,
            Bond::Quad => Self::Quad,
            Bond::Aromatic => Self::Aromatic,
            _ => Self::Single,
        }
    }
}
impl Display for BondQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::True => f.write_str("~"),
            Self::Single => f.write_str("-"),
            Self::Double => f.write_str("="),
            Self::Triple => f.write_str("#"),
            Self::Quad => f.write_str("$"),
            Self::Aromatic => f.write_str(":"),
            Self::Ring => f.write_str("@"),
            Self::SingleOrAromatic => Ok(()),
            Self::Not(q) => write!(f, "!{q}"),
            Self::And(qs) => write_joined(f, qs, "&"),
            Self::Or(qs) => write_joined(f, qs, ","),
        }
    }
}

pub type QueryGraph = UnGraph<AtomQuery, BondQuery>;

/// A graph of atom and bond predicates to search for.
///
/// Two queries are equal when they have the same atoms and bonds at the same indices.
#[derive(Debug, Clone, Default)]
pub struct QueryMolecule {
    pub graph: QueryGraph,
}
impl PartialEq for QueryMolecule {
    fn eq(&self, other: &Self) -> bool {
        let edges = |q: &Self| {
            q.graph
                .edge_references()
                .map(|e| (e.source(), e.target(), e.weight().clone()))
                .collect::<Vec<_>>()
        };
        self.graph.node_weights().eq(other.graph.node_weights()) && edges(self) == edges(other)
    }
}
impl Eq for QueryMolecule {}
impl Hash for QueryMolecule {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.graph.node_count().hash(state);
        for atom in self.graph.node_weights() {
            atom.hash(state);
        }
        for e in self.graph.edge_references() {
            (e.source(), e.target(), e.weight()).hash(state);
        }
    }
}
impl Display for QueryMolecule {
    /// Write the query back as SMARTS, with every atom in brackets.
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let graph = &self.graph;
        let mut layout = QueryLayout {
            children: vec![Vec::new(); graph.node_count()],
            rings: vec![Vec::new(); graph.node_count()],
            visited: vec![false; graph.node_count()],
            edge_done: vec![false; graph.edge_count()],
            digits: 0,
        };
        let mut roots = Vec::new();
        for n in graph.node_indices() {
            if !layout.visited[n.index()] {
                layout.walk(graph, n);
                roots.push(n);
            }
        }
        for (i, &root) in roots.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            layout.write(f, graph, root)?;
        }
        Ok(())
    }
}

/// Spanning forest of a query, for writing it out.
struct QueryLayout {
    children: Vec<Vec<(NodeIndex, EdgeIndex)>>,
    /// Ring digits on each atom, with the bond to write before the digit
    rings: Vec<Vec<(usize, Option<EdgeIndex>)>>,
    visited: Vec<bool>,
    edge_done: Vec<bool>,
    digits: usize,
}
impl QueryLayout {
    fn walk(&mut self, graph: &QueryGraph, node: NodeIndex) {
        self.visited[node.index()] = true;
        for e in graph.edges(node) {
            if self.edge_done[e.id().index()] {
                continue;
            }
            self.edge_done[e.id().index()] = true;
            let next = if e.source() == node { e.target() } else { e.source() };
            if self.visited[next.index()] {
                self.digits += 1;
                self.rings[next.index()].push((self.digits, Some(e.id())));
                self.rings[node.index()].push((self.digits, None));
            } else {
                self.children[node.index()].push((next, e.id()));
                self.walk(graph, next);
            }
        }
    }

    fn write(&self, f: &mut Formatter<'_>, graph: &QueryGraph, node: NodeIndex) -> fmt::Result {
        write!(f, "[{}]", graph[node])?;
        for &(digit, bond) in &self.rings[node.index()] {
            if let Some(e) = bond {
                write!(f, "{}", graph[e])?;
            }
            match digit {
                0..=9 => write!(f, "{digit}")?,
                10..=99 => write!(f, "%{digit}")?,
                _ => write!(f, "%({digit})")?,
            }
        }
        let children = &self.children[node.index()];
        for (i, &(child, e)) in children.iter().enumerate() {
            let branch = i + 1 < children.len();
            if branch {
                f.write_str("(")?;
            }
            write!(f, "{}", graph[e])?;
            self.write(f, graph, child)?;
            if branch {
                f.write_str(")")?;
            }
        }
        Ok(())
    }
}
impl QueryMolecule {
    pub fn new(graph: QueryGraph) -> Self {
        Self { graph }
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
}
impl From<&Molecule> for QueryMolecule {
    /// Match atoms by element, aromaticity, charge, and isotope, and bonds by their exact type.
    /// Hydrogen counts aren't checked, so substituted atoms still match.
    fn from(mol: &Molecule) -> Self {
        let graph = mol.graph().map(
            |_, atom| {
                let mut parts = vec![AtomQuery::Element {
                    protons: atom.protons,
                    aromatic: Some(atom.is_aromatic()),
                }];
                if atom.is_wildcard() {
                    parts[0] = AtomQuery::True;
                }
                parts.push(AtomQuery::Charge(atom.charge));
                if atom.isotope != 0 {
                    parts.push(AtomQuery::Isotope(atom.isotope));
                }
                AtomQuery::And(parts)
            },
            |_, &bond| BondQuery::exact(bond),
        );
        Self { graph }
    }
}
