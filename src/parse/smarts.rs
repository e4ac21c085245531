//! A SMARTS subset, parsed into a [`QueryMolecule`].
//!
//! The graph syntax is the same as SMILES. Atoms outside of brackets are organic-subset symbols,
//! `*`, `a`, or `A`. Bracket atoms and bonds are expressions over primitives, where `!` binds
//! tightest, then `&` (or plain adjacency), then `,`, then `;`. A `$(...)` primitive holds a whole
//! nested query that has to match starting from the atom. Chirality is read but doesn't constrain
//! matches.

use super::smiles::{bracket_element, organic_atom};
use super::ErrorCategory;
use crate::atom_info;
use crate::query::*;
use crate::utils::echar::*;
use ahash::AHashMap;
use atoi::FromRadix10Checked;
use petgraph::prelude::*;
use thiserror::Error;
use tracing::*;
use SmartsErrorKind::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SmartsErrorKind {
    #[error("{0} is not a recognized element")]
    UnknownElement(EChar),
    #[error("{0} isn't supported in queries")]
    Unsupported(EChar),
    #[error("loop {0} was not closed by the end of the query")]
    UnclosedLoop(usize),
    #[error("expected a ring number")]
    ExpectedRingNumber,
    #[error("expected an atom, found {}", MaybeByte(*.0))]
    ExpectedAtom(Option<u8>),
    #[error("expected an atom primitive, found {}", MaybeByte(*.0))]
    ExpectedPrimitive(Option<u8>),
    #[error("expected a closing bracket")]
    ExpectedClosingBracket,
    #[error("expected a closing parenthesis")]
    ExpectedClosingParen,
    #[error("unmatched closing parenthesis")]
    UnmatchedParen,
    #[error("bonds in loop don't match")]
    LoopBondMismatch,
    #[error("duplicate bonds between atoms")]
    DuplicateBond,
    #[error("a ring closure can't bond an atom to itself")]
    SelfBond,
    #[error("number is out of range")]
    InvalidNumber,
}
impl SmartsErrorKind {
    pub fn category(self) -> ErrorCategory {
        match self {
            Unsupported(_) => ErrorCategory::Unsupported,
            UnknownElement(_) | UnclosedLoop(_) | DuplicateBond | SelfBond => {
                ErrorCategory::Semantic
            }
            _ => ErrorCategory::Syntax,
        }
    }
}

/// Something went wrong trying to parse a SMARTS string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("an error occured at {} in the SMARTS string: {kind}", IdxPrint(*.index))]
pub struct SmartsError {
    pub index: usize,
    pub kind: SmartsErrorKind,
}
impl SmartsError {
    pub const fn new(index: usize, kind: SmartsErrorKind) -> Self {
        Self { index, kind }
    }
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}

/// A query string couldn't be turned into a query.
pub type InvalidQueryError = SmartsError;

/// What came before an atom in a chain
#[derive(Debug, Clone, PartialEq)]
enum BondTok {
    Implicit,
    Dot,
    Explicit(BondQuery),
}

fn is_bond_start(c: u8) -> bool {
    matches!(
        c,
        b'-' | b'=' | b'#' | b'$' | b':' | b'~' | b'@' | b'/' | b'\\' | b'!'
    )
}

/// Collapse a list of operands, so a single operand isn't wrapped.
fn collapse<T>(mut parts: Vec<T>, wrap: impl FnOnce(Vec<T>) -> T) -> T {
    if parts.len() == 1 {
        parts.remove(0)
    } else {
        wrap(parts)
    }
}

#[derive(Debug, Clone)]
/// Parser for a SMARTS string
pub struct SmartsParser<'a> {
    pub input: &'a [u8],
    index: usize,
    rings: AHashMap<usize, (NodeIndex, Option<BondQuery>, usize)>,
    graph: QueryGraph,
}
impl<'a> SmartsParser<'a> {
    /// Create a new parser. Like SMILES, surrounding whitespace is trimmed and anything after
    /// interior whitespace is ignored.
    pub fn new<I: AsRef<[u8]> + ?Sized>(input: &'a I) -> Self {
        let input = input.as_ref().trim_ascii_start();
        let end = input
            .iter()
            .position(u8::is_ascii_whitespace)
            .unwrap_or(input.len());
        Self {
            input: &input[..end],
            index: 0,
            rings: Default::default(),
            graph: QueryGraph::default(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.input.get(self.index).copied()
    }
    fn err(&self, kind: SmartsErrorKind) -> SmartsError {
        SmartsError::new(self.index, kind)
    }
    fn unsupported(&self, len: usize) -> SmartsError {
        let end = (self.index + len).min(self.input.len());
        self.err(Unsupported(EChar::from_slice(&self.input[self.index..end])))
    }

    /// Parse an optional number, advancing past it.
    fn number<T: FromRadix10Checked>(&mut self) -> Result<Option<T>, SmartsError> {
        let (num, used) = T::from_radix_10_checked(&self.input[self.index..]);
        if used == 0 {
            return Ok(None);
        }
        let num = num.ok_or(self.err(InvalidNumber))?;
        self.index += used;
        Ok(Some(num))
    }

    fn add_bond(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        bond: BondQuery,
        index: usize,
    ) -> Result<(), SmartsError> {
        if a == b {
            return Err(SmartsError::new(index, SelfBond));
        }
        if self.graph.contains_edge(a, b) {
            return Err(SmartsError::new(index, DuplicateBond));
        }
        self.graph.add_edge(a, b, bond);
        Ok(())
    }

    fn link(&mut self, a: NodeIndex, b: NodeIndex, tok: BondTok, index: usize) -> Result<(), SmartsError> {
        match tok {
            BondTok::Dot => Ok(()),
            BondTok::Implicit => self.add_bond(a, b, BondQuery::SingleOrAromatic, index),
            BondTok::Explicit(q) => self.add_bond(a, b, q, index),
        }
    }

    #[instrument(level = "debug", skip(self), fields(self.input, self.index))]
    fn parse_chain(&mut self, nested: bool) -> Result<Option<(NodeIndex, BondTok)>, SmartsError> {
        if self.index >= self.input.len() {
            return Ok(None);
        }
        let first_bond = if nested {
            self.get_bond()?
        } else {
            BondTok::Implicit
        };
        let first_atom = self
            .get_atom()?
            .ok_or(self.err(ExpectedAtom(self.peek())))?;
        let mut last_atom = first_atom;
        while self.index < self.input.len() {
            let bond = self.handle_loops(last_atom)?;
            let dangling = bond != BondTok::Implicit;
            match self.peek() {
                Some(b'(') => {
                    if dangling {
                        Err(self.err(ExpectedAtom(Some(b'('))))?;
                    }
                    self.index += 1;
                    let start = self.index;
                    let (atom, bond) = self
                        .parse_chain(true)?
                        .ok_or(self.err(ExpectedClosingParen))?;
                    self.link(last_atom, atom, bond, start)?;
                }
                Some(b')') if nested => {
                    if dangling {
                        Err(self.err(ExpectedAtom(Some(b')'))))?;
                    }
                    self.index += 1;
                    return Ok(Some((first_atom, first_bond)));
                }
                Some(b')') => Err(self.err(UnmatchedParen))?,
                Some(c) => {
                    let start = self.index;
                    let atom = self.get_atom()?.ok_or(self.err(ExpectedAtom(Some(c))))?;
                    self.link(last_atom, atom, bond, start)?;
                    last_atom = atom;
                }
                None => {
                    if dangling {
                        Err(self.err(ExpectedAtom(None)))?
                    } else {
                        break;
                    }
                }
            }
        }
        if nested {
            Err(self.err(ExpectedClosingParen))
        } else {
            Ok(Some((first_atom, first_bond)))
        }
    }

    #[instrument(level = "trace", skip_all, fields(self.input, self.index))]
    fn get_atom(&mut self) -> Result<Option<NodeIndex>, SmartsError> {
        let input = self.input;
        let rest = &input[self.index..];
        let query = if let Some((protons, aromatic, len)) = organic_atom(rest) {
            self.index += len;
            AtomQuery::Element {
                protons,
                aromatic: Some(aromatic),
            }
        } else {
            match rest.first() {
                Some(b'*') => {
                    self.index += 1;
                    AtomQuery::True
                }
                Some(b'a') => {
                    self.index += 1;
                    AtomQuery::Aromatic
                }
                Some(b'A') => {
                    self.index += 1;
                    AtomQuery::Aliphatic
                }
                Some(b'[') => {
                    self.index += 1;
                    let start = self.index;
                    let query = self.atom_low(start)?;
                    if self.peek() != Some(b']') {
                        return Err(self.err(ExpectedClosingBracket));
                    }
                    self.index += 1;
                    query
                }
                _ => return Ok(None),
            }
        };
        trace!(%query, "parsed atom");
        Ok(Some(self.graph.add_node(query)))
    }

    fn atom_low(&mut self, start: usize) -> Result<AtomQuery, SmartsError> {
        let mut parts = vec![self.atom_or(start)?];
        while self.peek() == Some(b';') {
            self.index += 1;
            parts.push(self.atom_or(start)?);
        }
        Ok(collapse(parts, AtomQuery::And))
    }
    fn atom_or(&mut self, start: usize) -> Result<AtomQuery, SmartsError> {
        let mut parts = vec![self.atom_and(start)?];
        while self.peek() == Some(b',') {
            self.index += 1;
            parts.push(self.atom_and(start)?);
        }
        Ok(collapse(parts, AtomQuery::Or))
    }
    fn atom_and(&mut self, start: usize) -> Result<AtomQuery, SmartsError> {
        let mut parts = Vec::new();
        loop {
            parts.push(self.atom_not(start)?);
            match self.peek() {
                Some(b'&') => self.index += 1,
                Some(b']' | b';' | b',') | None => break,
                Some(_) => {}
            }
        }
        Ok(collapse(parts, AtomQuery::And))
    }
    fn atom_not(&mut self, start: usize) -> Result<AtomQuery, SmartsError> {
        if self.peek() == Some(b'!') {
            self.index += 1;
            Ok(AtomQuery::Not(Box::new(self.atom_not(start)?)))
        } else {
            self.atom_primitive(start)
        }
    }

    /// Parse one atom primitive. `start` is where the bracket's contents begin, which decides
    /// whether `H` is a hydrogen atom or a hydrogen count.
    fn atom_primitive(&mut self, start: usize) -> Result<AtomQuery, SmartsError> {
        let input = self.input;
        let rest = &input[self.index..];
        let Some(&c) = rest.first() else {
            return Err(self.err(ExpectedPrimitive(None)));
        };
        match c {
            b'0'..=b'9' => {
                let iso = self.number::<u16>()?.unwrap_or(0);
                return Ok(AtomQuery::Isotope(iso));
            }
            b'*' => {
                self.index += 1;
                return Ok(AtomQuery::True);
            }
            b'#' => {
                self.index += 1;
                let p = self
                    .number::<u8>()?
                    .ok_or(self.err(ExpectedPrimitive(self.peek())))?;
                return Ok(AtomQuery::AtomicNum(p));
            }
            b'+' | b'-' => {
                self.index += 1;
                let mag = match self.number::<i8>()? {
                    Some(n) => n,
                    None => {
                        let count = self.input[self.index..]
                            .iter()
                            .take_while(|&&x| x == c)
                            .count();
                        self.index += count;
                        i8::try_from(count + 1).map_err(|_| self.err(InvalidNumber))?
                    }
                };
                return Ok(AtomQuery::Charge(if c == b'-' { -mag } else { mag }));
            }
            b':' => {
                // atom class, which doesn't constrain anything
                self.index += 1;
                self.number::<u32>()?
                    .ok_or(self.err(ExpectedPrimitive(self.peek())))?;
                return Ok(AtomQuery::True);
            }
            b'$' => return self.recursive(),
            b'@' => {
                // chirality, which doesn't constrain anything
                self.index += 1;
                if self.peek() == Some(b'@') {
                    self.index += 1;
                }
                if self.peek() == Some(b'?') {
                    self.index += 1;
                }
                return Ok(AtomQuery::True);
            }
            b'^' => return Err(self.unsupported(1)),
            _ => {}
        }
        // two-letter elements win over single-letter primitives
        if let [u, l, ..] = rest {
            if u.is_ascii_uppercase() && l.is_ascii_lowercase() {
                if let Some(p) = atom_info::find_symbol(&[*u, *l]) {
                    self.index += 2;
                    return Ok(AtomQuery::Element {
                        protons: p,
                        aromatic: atom_info::can_be_aromatic(p).then_some(false),
                    });
                }
            }
        }
        let leading_isotope = self.input[start..self.index].iter().all(u8::is_ascii_digit);
        match c {
            b'H' if leading_isotope
                && matches!(rest.get(1), Some(b']' | b'+' | b'-' | b':') | None) =>
            {
                self.index += 1;
                return Ok(AtomQuery::Element {
                    protons: 1,
                    aromatic: None,
                });
            }
            b'H' | b'D' | b'X' => {
                self.index += 1;
                let n = self.number::<u8>()?.unwrap_or(1);
                return Ok(match c {
                    b'H' => AtomQuery::TotalH(n),
                    b'D' => AtomQuery::Degree(n),
                    _ => AtomQuery::Connectivity(n),
                });
            }
            b'R' => {
                self.index += 1;
                return Ok(match self.number::<u8>()? {
                    Some(n) => AtomQuery::RingCount(n),
                    None => AtomQuery::InRing,
                });
            }
            b'r' => {
                self.index += 1;
                return Ok(match self.number::<u8>()? {
                    Some(n) => AtomQuery::RingSize(n),
                    None => AtomQuery::InRing,
                });
            }
            b'x' => {
                self.index += 1;
                return Ok(match self.number::<u8>()? {
                    Some(n) => AtomQuery::RingBonds(n),
                    None => AtomQuery::Not(Box::new(AtomQuery::RingBonds(0))),
                });
            }
            b'v' | b'h' => return Err(self.unsupported(1)),
            _ => {}
        }
        // aromatic two-letter symbols before `a`, so `as` is arsenic
        if let Some((p, aromatic, len)) = bracket_element(rest).filter(|e| e.0 != 0) {
            self.index += len;
            return Ok(AtomQuery::Element {
                protons: p,
                aromatic: if aromatic {
                    Some(true)
                } else {
                    atom_info::can_be_aromatic(p).then_some(false)
                },
            });
        }
        match c {
            b'a' => {
                self.index += 1;
                Ok(AtomQuery::Aromatic)
            }
            b'A' => {
                self.index += 1;
                Ok(AtomQuery::Aliphatic)
            }
            c if c.is_ascii_alphabetic() => {
                let len = rest.iter().take_while(|x| x.is_ascii_alphabetic()).count();
                Err(self.err(UnknownElement(EChar::from_slice(&rest[..len]))))
            }
            c => Err(self.err(ExpectedPrimitive(Some(c)))),
        }
    }

    /// Parse `$(...)`, running a separate parser over what's inside the parentheses.
    fn recursive(&mut self) -> Result<AtomQuery, SmartsError> {
        if self.input.get(self.index + 1) != Some(&b'(') {
            return Err(self.err(ExpectedPrimitive(Some(b'$'))));
        }
        let open = self.index + 2;
        let mut depth = 1usize;
        let mut close = None;
        for (i, &c) in self.input[open..].iter().enumerate() {
            match c {
                b'(' => depth += 1,
                b')' => {
                    depth -= 1;
                    if depth == 0 {
                        close = Some(open + i);
                        break;
                    }
                }
                _ => {}
            }
        }
        let close = close.ok_or(SmartsError::new(self.input.len(), ExpectedClosingParen))?;
        let _span = debug_span!("recursive query", start = open).entered();
        let query = SmartsParser::new(&self.input[open..close])
            .parse()
            .map_err(|err| SmartsError::new(err.index.saturating_add(open), err.kind))?;
        if query.is_empty() {
            return Err(SmartsError::new(close, ExpectedAtom(Some(b')'))));
        }
        self.index = close + 1;
        Ok(AtomQuery::Recursive(Box::new(query)))
    }

    /// Parse a bond expression, if there is one.
    fn get_bond(&mut self) -> Result<BondTok, SmartsError> {
        match self.peek() {
            Some(b'.') => {
                self.index += 1;
                Ok(BondTok::Dot)
            }
            Some(c) if is_bond_start(c) => Ok(BondTok::Explicit(self.bond_low()?)),
            _ => Ok(BondTok::Implicit),
        }
    }
    fn bond_low(&mut self) -> Result<BondQuery, SmartsError> {
        let mut parts = vec![self.bond_or()?];
        while self.peek() == Some(b';') {
            self.index += 1;
            parts.push(self.bond_or()?);
        }
        Ok(collapse(parts, BondQuery::And))
    }
    fn bond_or(&mut self) -> Result<BondQuery, SmartsError> {
        let mut parts = vec![self.bond_and()?];
        while self.peek() == Some(b',') {
            self.index += 1;
            parts.push(self.bond_and()?);
        }
        Ok(collapse(parts, BondQuery::Or))
    }
    fn bond_and(&mut self) -> Result<BondQuery, SmartsError> {
        let mut parts = vec![self.bond_not()?];
        loop {
            match self.peek() {
                Some(b'&') => self.index += 1,
                Some(c) if is_bond_start(c) => {}
                _ => break,
            }
            parts.push(self.bond_not()?);
        }
        Ok(collapse(parts, BondQuery::And))
    }
    fn bond_not(&mut self) -> Result<BondQuery, SmartsError> {
        let q = match self.peek() {
            Some(b'!') => {
                self.index += 1;
                return Ok(BondQuery::Not(Box::new(self.bond_not()?)));
            }
            Some(b'-' | b'/' | b'\\') => BondQuery::Single,
            Some(b'=') => BondQuery::Double,
            Some(b'#') => BondQuery::Triple,
            Some(b'$') => BondQuery::Quad,
            Some(b':') => BondQuery::Aromatic,
            Some(b'~') => BondQuery::True,
            Some(b'@') => BondQuery::Ring,
            c => return Err(self.err(ExpectedPrimitive(c))),
        };
        self.index += 1;
        Ok(q)
    }

    /// The number after a `%`: two digits, or any number of them in parentheses.
    fn ring_number(&mut self) -> Result<usize, SmartsError> {
        let digits = &self.input[self.index..];
        if digits.first() == Some(&b'(') {
            self.index += 1;
            let num = self.number::<usize>()?.ok_or(self.err(ExpectedRingNumber))?;
            if self.peek() != Some(b')') {
                return Err(self.err(ExpectedRingNumber));
            }
            self.index += 1;
            Ok(num)
        } else if digits.len() >= 2 && digits[..2].iter().all(u8::is_ascii_digit) {
            self.index += 2;
            Ok(((digits[0] - b'0') * 10 + (digits[1] - b'0')) as usize)
        } else {
            Err(self.err(ExpectedRingNumber))
        }
    }

    /// Handle ring closures after an atom, returning the bond that comes before the next atom.
    #[instrument(level = "debug", skip_all, fields(self.input, self.index))]
    fn handle_loops(&mut self, last_atom: NodeIndex) -> Result<BondTok, SmartsError> {
        loop {
            let bond_idx = self.index;
            let bond = self.get_bond()?;
            let num_idx = self.index;
            let num = match self.peek() {
                Some(c @ b'0'..=b'9') => {
                    self.index += 1;
                    (c - b'0') as usize
                }
                Some(b'%') => {
                    self.index += 1;
                    self.ring_number()?
                }
                _ => return Ok(bond),
            };
            let bond = match bond {
                BondTok::Dot => return Err(SmartsError::new(bond_idx, ExpectedRingNumber)),
                BondTok::Implicit => None,
                BondTok::Explicit(q) => Some(q),
            };
            use std::collections::hash_map::Entry;
            match self.rings.entry(num) {
                Entry::Occupied(e) => {
                    let (other, old, _) = e.remove();
                    let q = match (bond, old) {
                        (Some(a), Some(b)) if a != b => {
                            return Err(SmartsError::new(bond_idx, LoopBondMismatch))
                        }
                        (Some(q), _) | (None, Some(q)) => q,
                        (None, None) => BondQuery::SingleOrAromatic,
                    };
                    trace!(ring = num, "closing ring");
                    self.add_bond(last_atom, other, q, num_idx)?;
                }
                Entry::Vacant(e) => {
                    trace!(ring = num, "opening ring");
                    e.insert((last_atom, bond, num_idx));
                }
            }
        }
    }

    /// Parse the query, consuming self.
    #[instrument(level = "debug", skip_all)]
    pub fn parse(mut self) -> Result<QueryMolecule, SmartsError> {
        self.parse_chain(false)?;
        if let Some((&id, &(_, _, idx))) = self.rings.iter().min_by_key(|r| r.1 .2) {
            return Err(SmartsError::new(idx, UnclosedLoop(id)));
        }
        debug!(
            atoms = self.graph.node_count(),
            bonds = self.graph.edge_count(),
            "parsed SMARTS"
        );
        Ok(QueryMolecule::new(self.graph))
    }
}
