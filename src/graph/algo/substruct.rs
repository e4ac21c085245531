//! Substructure search: find the atoms of a query inside a target molecule.
//!
//! This is a backtracking subgraph monomorphism search in the style of VF2, with an explicit stack
//! of frames instead of recursion so it can stop partway through and resume. Query atoms are
//! matched in a fixed order where each atom (other than the first of each component) is next to one
//! that's already been matched, so candidates come from the neighbors of that atom's image.

use crate::graph::other_end;
use crate::molecule::Molecule;
use crate::query::QueryMolecule;
use petgraph::prelude::*;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::*;

/// Limits on how much work a search can do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchBudget {
    /// Maximum number of candidate pairs to try
    pub max_steps: Option<u64>,
    /// Wall-clock time to give up at, checked every 256 steps
    pub deadline: Option<Instant>,
}
impl SearchBudget {
    pub const fn unlimited() -> Self {
        Self {
            max_steps: None,
            deadline: None,
        }
    }
    pub const fn with_max_steps(mut self, steps: u64) -> Self {
        self.max_steps = Some(steps);
        self
    }
    pub const fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }
    /// Give up after `timeout` from now. A timeout too large to represent means no deadline.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.deadline = Instant::now().checked_add(timeout);
        self
    }
}

/// A search ran out of its budget before it could decide whether there's a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("substructure search gave up after {steps} steps")]
pub struct SearchBudgetExceeded {
    pub steps: u64,
}

/// A correspondence from a query to a target.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Match {
    /// `(query atom, target atom)`, in query order
    pub atoms: Vec<(NodeIndex, NodeIndex)>,
    /// `(query bond, target bond)`, in query order
    pub bonds: Vec<(EdgeIndex, EdgeIndex)>,
}
impl Match {
    /// The target atom a query atom was matched to.
    pub fn target_atom(&self, query: NodeIndex) -> Option<NodeIndex> {
        self.atoms.get(query.index()).map(|p| p.1)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Frame {
    /// Start matching the next query atom
    Outer,
    /// Try the `cand`th candidate for the query atom at `depth`
    Inner { depth: usize, cand: usize },
    /// Undo the mapping at `depth`, then move on to the next candidate
    Unwind { depth: usize, cand: usize },
}

/// Order to match query atoms in, and the already-matched neighbor for each one.
#[derive(Debug, Clone)]
struct Plan {
    order: Vec<NodeIndex>,
    parent: Vec<Option<NodeIndex>>,
}
impl Plan {
    /// Start at `start`, or the highest-degree atom, then keep taking the atom with the most
    /// neighbors that are already in the order. Ties go to the higher degree, then the lower index.
    fn new(query: &QueryMolecule, start: Option<NodeIndex>) -> Self {
        let graph = &query.graph;
        let n = graph.node_count();
        let degree = graph
            .node_indices()
            .map(|a| graph.neighbors(a).count())
            .collect::<Vec<_>>();
        let mut position = vec![usize::MAX; n];
        let mut ordered_nbrs = vec![0usize; n];
        let mut order = Vec::with_capacity(n);
        let mut parent = Vec::with_capacity(n);
        while order.len() < n {
            let first = start.filter(|_| order.is_empty());
            let Some(next) = first.or_else(|| {
                graph
                    .node_indices()
                    .filter(|a| position[a.index()] == usize::MAX)
                    .max_by(|&a, &b| {
                        (ordered_nbrs[a.index()], degree[a.index()])
                            .cmp(&(ordered_nbrs[b.index()], degree[b.index()]))
                            .then(b.cmp(&a))
                    })
            }) else {
                break;
            };
            let p = graph
                .neighbors(next)
                .filter(|m| position[m.index()] != usize::MAX)
                .min_by_key(|m| position[m.index()]);
            position[next.index()] = order.len();
            order.push(next);
            parent.push(p);
            for m in graph.neighbors(next) {
                ordered_nbrs[m.index()] += 1;
            }
        }
        Self { order, parent }
    }
}

/// Iterator over the matches of a query in a target.
///
/// Each item is either a match or the error for running out of budget, after which the iterator is
/// done.
#[derive(Debug, Clone)]
pub struct SubstructMatcher<'a> {
    target: &'a Molecule,
    query: &'a QueryMolecule,
    budget: SearchBudget,
    plan: Plan,
    /// Target atom the first query atom has to land on
    root: Option<NodeIndex>,
    /// Query atom to target atom
    core: Vec<Option<NodeIndex>>,
    used: Vec<bool>,
    mapped: usize,
    candidates: Vec<Vec<NodeIndex>>,
    stack: Vec<Frame>,
    steps: u64,
}
impl<'a> SubstructMatcher<'a> {
    #[instrument(level = "debug", skip_all, fields(query = query.atom_count(), target = target.atom_count()))]
    pub fn new(target: &'a Molecule, query: &'a QueryMolecule, budget: SearchBudget) -> Self {
        Self::with_root(target, query, None, budget)
    }

    /// Only find matches that put the query's first atom on `root`.
    pub fn rooted(
        target: &'a Molecule,
        query: &'a QueryMolecule,
        root: NodeIndex,
        budget: SearchBudget,
    ) -> Self {
        Self::with_root(target, query, Some(root), budget)
    }

    fn with_root(
        target: &'a Molecule,
        query: &'a QueryMolecule,
        root: Option<NodeIndex>,
        budget: SearchBudget,
    ) -> Self {
        let start = root.and_then(|_| query.graph.node_indices().next());
        let plan = Plan::new(query, start);
        let mut out = Self {
            target,
            query,
            budget,
            root,
            core: vec![None; query.atom_count()],
            used: vec![false; target.atom_count()],
            mapped: 0,
            candidates: vec![Vec::new(); plan.order.len()],
            plan,
            stack: Vec::new(),
            steps: 0,
        };
        if out.possible() {
            out.stack.push(Frame::Outer);
        }
        out
    }

    /// Number of candidate pairs tried so far.
    pub fn steps(&self) -> u64 {
        self.steps
    }

    /// Cheap checks that rule out a match without searching.
    fn possible(&self) -> bool {
        let (query, target) = (self.query, self.target);
        if query.is_empty() {
            debug!("empty query");
            return false;
        }
        if query.atom_count() > target.atom_count() || query.bond_count() > target.bond_count() {
            debug!("query is larger than the target");
            return false;
        }
        if let Some(root) = self.root {
            return root.index() < target.atom_count();
        }
        for q in query.graph.node_indices() {
            let pred = &query.graph[q];
            if !target.graph().node_indices().any(|t| pred.matches(target, t)) {
                debug!(atom = q.index(), query = %pred, "no target atom matches query atom");
                return false;
            }
        }
        true
    }

    fn fill_candidates(&mut self, depth: usize) {
        let mut cands = std::mem::take(&mut self.candidates[depth]);
        cands.clear();
        match self.plan.parent[depth].and_then(|p| self.core[p.index()]) {
            Some(image) => cands.extend(self.target.neighbors(image)),
            None => match self.root {
                Some(root) if depth == 0 => cands.push(root),
                _ => cands.extend(self.target.graph().node_indices()),
            },
        }
        self.candidates[depth] = cands;
    }

    #[instrument(level = "trace", skip(self))]
    fn is_feasible(&self, depth: usize, t: NodeIndex) -> bool {
        if self.used[t.index()] {
            return false;
        }
        let q = self.plan.order[depth];
        let qgraph = &self.query.graph;
        let pred = &qgraph[q];
        if self.target.degree(t) < qgraph.neighbors(q).count().max(pred.min_degree()) {
            return false;
        }
        if !pred.matches(self.target, t) {
            return false;
        }
        for e in qgraph.edges(q) {
            let Some(tn) = self.core[other_end(&e, q).index()] else {
                continue;
            };
            let Some((te, _)) = self.target.bond_between(t, tn) else {
                return false;
            };
            if !e.weight().matches(self.target, te) {
                return false;
            }
        }
        true
    }

    fn push_state(&mut self, depth: usize, t: NodeIndex) {
        let q = self.plan.order[depth];
        self.core[q.index()] = Some(t);
        self.used[t.index()] = true;
        self.mapped += 1;
    }
    fn pop_state(&mut self, depth: usize) {
        let q = self.plan.order[depth];
        if let Some(t) = self.core[q.index()].take() {
            self.used[t.index()] = false;
        }
        self.mapped -= 1;
    }

    fn current_match(&self) -> Match {
        let atoms = self
            .query
            .graph
            .node_indices()
            .filter_map(|q| self.core[q.index()].map(|t| (q, t)))
            .collect();
        let bonds = self
            .query
            .graph
            .edge_references()
            .filter_map(|e| {
                let a = self.core[e.source().index()]?;
                let b = self.core[e.target().index()]?;
                self.target.bond_between(a, b).map(|(te, _)| (e.id(), te))
            })
            .collect();
        Match { atoms, bonds }
    }

    /// Count a step, and check if that went over the budget.
    fn step(&mut self) -> Result<(), SearchBudgetExceeded> {
        self.steps += 1;
        let over_steps = self.budget.max_steps.is_some_and(|m| self.steps > m);
        let over_time = self.steps % 256 == 0
            && self.budget.deadline.is_some_and(|d| Instant::now() >= d);
        if over_steps || over_time {
            warn!(steps = self.steps, "substructure search ran out of budget");
            self.stack.clear();
            Err(SearchBudgetExceeded { steps: self.steps })
        } else {
            Ok(())
        }
    }
}
impl Iterator for SubstructMatcher<'_> {
    type Item = Result<Match, SearchBudgetExceeded>;

    #[instrument(level = "trace", skip_all, name = "substruct_next")]
    fn next(&mut self) -> Option<Self::Item> {
        while let Some(frame) = self.stack.pop() {
            match frame {
                Frame::Outer => {
                    let depth = self.mapped;
                    self.fill_candidates(depth);
                    self.stack.push(Frame::Inner { depth, cand: 0 });
                }
                Frame::Unwind { depth, cand } => {
                    self.pop_state(depth);
                    self.stack.push(Frame::Inner {
                        depth,
                        cand: cand + 1,
                    });
                }
                Frame::Inner { depth, cand } => {
                    let Some(&t) = self.candidates[depth].get(cand) else {
                        continue;
                    };
                    if let Err(err) = self.step() {
                        return Some(Err(err));
                    }
                    if !self.is_feasible(depth, t) {
                        self.stack.push(Frame::Inner {
                            depth,
                            cand: cand + 1,
                        });
                        continue;
                    }
                    self.push_state(depth, t);
                    self.stack.push(Frame::Unwind { depth, cand });
                    if self.mapped == self.plan.order.len() {
                        debug!(steps = self.steps, "found a match");
                        return Some(Ok(self.current_match()));
                    }
                    self.stack.push(Frame::Outer);
                }
            }
        }
        None
    }
}

/// Find the first match of `query` in `target`.
///
/// `Ok(None)` means there's definitely no match, while an error means the search gave up first.
pub fn substruct_match(
    target: &Molecule,
    query: &QueryMolecule,
    budget: SearchBudget,
) -> Result<Option<Match>, SearchBudgetExceeded> {
    SubstructMatcher::new(target, query, budget).next().transpose()
}

/// Check if `query` is in `target`, with no limit on the search.
pub fn has_substruct(target: &Molecule, query: &QueryMolecule) -> bool {
    matches!(
        substruct_match(target, query, SearchBudget::unlimited()),
        Ok(Some(_))
    )
}
