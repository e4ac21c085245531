use super::ErrorCategory;
use crate::atom_info;
use crate::core::{TooManyHydrogens, *};
use crate::molecule::*;
use crate::stereo::{has_implicit_slot, reference_slots, reorder, Slots};
use crate::utils::echar::*;
use ahash::AHashMap;
use atoi::FromRadix10Checked;
use petgraph::prelude::*;
use thiserror::Error;
use tracing::*;
use SmilesErrorKind::*;

#[macro_export]
macro_rules! smiles {
    ($smiles:literal) => {
        $crate::parse::smiles::SmilesParser::new($smiles)
            .parse()
            .expect(concat!("Failed to parse SMILES ", $smiles))
    };
}

/// Inner enum for `SmilesError`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SmilesErrorKind {
    #[error(transparent)]
    TooManyHydrogens(#[from] TooManyHydrogens),
    #[error(transparent)]
    Structure(#[from] StructureError),
    #[error("{0} is not a recognized element")]
    UnknownElement(EChar),
    #[error("loop {0} was not closed by the end of the formula")]
    UnclosedLoop(usize),
    #[error("expected a ring number")]
    ExpectedRingNumber,
    #[error("expected an atom, found {}", MaybeByte(*.0))]
    ExpectedAtom(Option<u8>),
    #[error("expected a closing bracket")]
    ExpectedClosingBracket,
    #[error("expected a closing parenthesis")]
    ExpectedClosingParen,
    #[error("unmatched closing parenthesis")]
    UnmatchedParen,
    #[error("bonds in loop don't match: {0} vs {1}")]
    LoopBondMismatch(Bond, Bond),
    #[error("duplicate bonds between atoms")]
    DuplicateBond,
    #[error("a ring closure can't bond an atom to itself")]
    SelfBond,
    #[error("isotope is out of range")]
    InvalidIsotope,
    #[error("charge is out of range")]
    InvalidCharge,
}
impl SmilesErrorKind {
    pub fn category(self) -> ErrorCategory {
        match self {
            Self::TooManyHydrogens(_) | Structure(_) | UnknownElement(_) | UnclosedLoop(_)
            | DuplicateBond | SelfBond => ErrorCategory::Semantic,
            _ => ErrorCategory::Syntax,
        }
    }
}

/// Something went wrong trying to parse a SMILES string
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("an error occured at {} in the SMILES string: {kind}", IdxPrint(*.index))]
pub struct SmilesError {
    pub index: usize,
    pub kind: SmilesErrorKind,
}
impl SmilesError {
    /// Convenience method
    pub const fn new(index: usize, kind: SmilesErrorKind) -> Self {
        Self { index, kind }
    }
    pub fn category(&self) -> ErrorCategory {
        self.kind.category()
    }
}
impl From<StructureError> for SmilesError {
    fn from(value: StructureError) -> Self {
        Self::new(usize::MAX, value.into())
    }
}

/// Organic-subset atom at the start of `input`: atomic number, aromaticity, and length.
pub(crate) fn organic_atom(input: &[u8]) -> Option<(u8, bool, usize)> {
    Some(match input {
        [b'B', b'r', ..] => (35, false, 2),
        [b'C', b'l', ..] => (17, false, 2),
        [b'B', ..] => (5, false, 1),
        [b'C', ..] => (6, false, 1),
        [b'N', ..] => (7, false, 1),
        [b'O', ..] => (8, false, 1),
        [b'F', ..] => (9, false, 1),
        [b'P', ..] => (15, false, 1),
        [b'S', ..] => (16, false, 1),
        [b'I', ..] => (53, false, 1),
        [b'b', ..] => (5, true, 1),
        [b'c', ..] => (6, true, 1),
        [b'n', ..] => (7, true, 1),
        [b'o', ..] => (8, true, 1),
        [b'p', ..] => (15, true, 1),
        [b's', ..] => (16, true, 1),
        _ => return None,
    })
}

/// Element symbol at the start of a bracket atom: atomic number, aromaticity, and length.
///
/// Uppercase symbols take a second, lowercase letter if that makes a real element. Lowercase symbols
/// are aromatic.
pub(crate) fn bracket_element(input: &[u8]) -> Option<(u8, bool, usize)> {
    match input {
        [b'*', ..] => Some((0, false, 1)),
        [b's', b'e', ..] => Some((34, true, 2)),
        [b'a', b's', ..] => Some((33, true, 2)),
        [b't', b'e', ..] => Some((52, true, 2)),
        [c @ (b'b' | b'c' | b'n' | b'o' | b'p' | b's'), ..] => {
            atom_info::find_symbol(&[c.to_ascii_uppercase()]).map(|p| (p, true, 1))
        }
        [c, l, ..] if c.is_ascii_uppercase() && l.is_ascii_lowercase() => {
            match atom_info::find_symbol(&[*c, *l]) {
                Some(p) => Some((p, false, 2)),
                None => atom_info::find_symbol(&[*c]).map(|p| (p, false, 1)),
            }
        }
        [c, ..] if c.is_ascii_uppercase() => atom_info::find_symbol(&[*c]).map(|p| (p, false, 1)),
        _ => None,
    }
}

/// A ring bond that's been opened but not closed yet
#[derive(Debug, Clone, Copy)]
struct OpenRing {
    atom: NodeIndex,
    /// Bond written before the digit
    bond: Option<Bond>,
    /// Where the digit was
    index: usize,
    /// Position of the bond in the atom's written neighbor order
    slot: usize,
}

#[derive(Debug, Clone)]
/// Parser for a SMILES string
pub struct SmilesParser<'a> {
    // use byte slice because SMILES shouldn't have non-ASCII data
    pub input: &'a [u8],
    index: usize,
    rings: AHashMap<usize, OpenRing>,
    builder: MoleculeBuilder,
    /// Each atom's neighbors in the order they were written. Ring bonds hold their place as `None`
    /// until they're closed.
    written: Vec<Slots>,
    /// Whether an atom's first written neighbor is the atom before it in the string
    has_from: Vec<bool>,
    pub validate: bool,
}
impl<'a> SmilesParser<'a> {
    /// Create a new parser from an input string.
    ///
    /// Surrounding whitespace is ignored, and anything after interior whitespace is treated as a
    /// name and dropped.
    pub fn new<I: AsRef<[u8]> + ?Sized>(input: &'a I) -> Self {
        let input = input.as_ref();
        let input = input.trim_ascii_start();
        let end = input
            .iter()
            .position(u8::is_ascii_whitespace)
            .unwrap_or(input.len());
        Self {
            input: &input[..end],
            index: 0,
            rings: Default::default(),
            builder: MoleculeBuilder::new(),
            written: Vec::new(),
            has_from: Vec::new(),
            validate: cfg!(debug_assertions),
        }
    }

    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }
    pub fn set_validation(&mut self, validate: bool) -> &mut Self {
        self.validate = validate;
        self
    }

    fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        self.written.push(Slots::new());
        self.has_from.push(false);
        self.builder.add_atom(atom)
    }
    /// Record that `to` was written right after `from`, either next in the chain or opening a branch.
    fn link(&mut self, from: NodeIndex, to: NodeIndex) {
        self.written[from.index()].push(Some(to));
        self.written[to.index()].insert(0, Some(from));
        self.has_from[to.index()] = true;
    }

    /// Add a bond from the parser, picking aromatic for implicit bonds between aromatic atoms.
    fn bond_atoms(
        &mut self,
        a: NodeIndex,
        b: NodeIndex,
        bond: Bond,
        explicit: bool,
        index: usize,
    ) -> Result<(), SmilesError> {
        let graph = self.builder.graph();
        let bond = if !explicit && graph[a].is_aromatic() && graph[b].is_aromatic() {
            Bond::Aromatic
        } else {
            bond
        };
        self.builder
            .add_bond(a, b, bond)
            .map(|_| ())
            .map_err(|err| match err {
                StructureError::DuplicateBond(..) => SmilesError::new(index, DuplicateBond),
                StructureError::SelfBond(_) => SmilesError::new(index, SelfBond),
                err => SmilesError::new(index, err.into()),
            })
    }

    /// Parse a "chain". This can really be anything, though, it just returns the first atom in the
    /// group so it can be bonded to something else
    #[instrument(level = "debug", skip(self), fields(self.input, self.index))]
    fn parse_chain(
        &mut self,
        nested: bool,
    ) -> Result<Option<(NodeIndex, Bond, bool)>, SmilesError> {
        if self.index >= self.input.len() {
            return Ok(None);
        }
        let first_bond = if nested {
            self.get_bond()
        } else {
            (Bond::Single, false)
        };

        let first_atom = self.get_atom()?.ok_or(SmilesError::new(
            self.index,
            ExpectedAtom(self.input.get(self.index).copied()),
        ))?;
        let mut last_atom = first_atom;
        while self.index < self.input.len() {
            let (bond, ex) = self.handle_loops(last_atom)?;
            match self.input.get(self.index) {
                Some(&b'(') => {
                    if ex {
                        Err(SmilesError::new(self.index, ExpectedAtom(Some(b'('))))?;
                    }
                    self.index += 1;
                    let start_idx = self.index;
                    let (atom, bond, ex) = self.parse_chain(true)?.ok_or(SmilesError::new(
                        self.index,
                        ExpectedClosingParen,
                    ))?;
                    if bond != Bond::Non {
                        self.bond_atoms(last_atom, atom, bond, ex, start_idx)?;
                        self.link(last_atom, atom);
                    }
                }
                Some(&b')') if nested => {
                    if ex {
                        Err(SmilesError::new(self.index, ExpectedAtom(Some(b')'))))?;
                    }
                    self.index += 1;
                    return Ok(Some((first_atom, first_bond.0, first_bond.1)));
                }
                Some(&b')') => Err(SmilesError::new(self.index, UnmatchedParen))?,
                Some(_) => {
                    let start_idx = self.index;
                    if let Some(atom) = self.get_atom()? {
                        if bond != Bond::Non {
                            self.bond_atoms(last_atom, atom, bond, ex, start_idx)?;
                            self.link(last_atom, atom);
                        }
                        last_atom = atom;
                    } else {
                        Err(SmilesError::new(
                            self.index,
                            ExpectedAtom(self.input.get(self.index).copied()),
                        ))?
                    }
                }
                None => {
                    if ex {
                        Err(SmilesError::new(self.index, ExpectedAtom(None)))?
                    } else {
                        break;
                    }
                }
            }
        }
        if nested {
            Err(SmilesError::new(self.index, ExpectedClosingParen))
        } else {
            Ok(Some((first_atom, first_bond.0, first_bond.1)))
        }
    }

    /// Parse an atom, either from the organic subset or in brackets. Returns `None` if the next
    /// byte can't start an atom.
    #[instrument(level = "trace", skip_all, fields(self.input, self.index))]
    fn get_atom(&mut self) -> Result<Option<NodeIndex>, SmilesError> {
        let input = self.input;
        let rest = &input[self.index.min(input.len())..];
        if let Some((protons, aromatic, len)) = organic_atom(rest) {
            self.index += len;
            let atom = if aromatic {
                Atom::new_aromatic(protons)
            } else {
                Atom::new(protons)
            };
            return Ok(Some(self.add_atom(atom)));
        }
        match rest.first() {
            Some(&b'*') => {
                self.index += 1;
                Ok(Some(self.add_atom(Atom::wildcard())))
            }
            Some(&b'[') => self.get_bracket_atom().map(Some),
            _ => Ok(None),
        }
    }

    /// Parse `[isotope? symbol chirality? hcount? charge? class?]`
    fn get_bracket_atom(&mut self) -> Result<NodeIndex, SmilesError> {
        let _span = trace_span!("parsing element block", index = self.index).entered();
        self.index += 1;
        let start = self.index;
        let (isotope, used) = u16::from_radix_10_checked(&self.input[self.index..]);
        self.index += used;
        let isotope = match (isotope, used) {
            (_, 0) => 0,
            (Some(i), _) => i,
            (None, _) => Err(SmilesError::new(start, InvalidIsotope))?,
        };
        let input = self.input;
        let rest = &input[self.index..];
        let (protons, aromatic, len) = bracket_element(rest).ok_or_else(|| {
            if rest.first().is_some_and(u8::is_ascii_alphabetic) {
                let len = rest.iter().take_while(|c| c.is_ascii_alphabetic()).count();
                SmilesError::new(self.index, UnknownElement(EChar::from_slice(&rest[..len])))
            } else {
                SmilesError::new(self.index, ExpectedAtom(rest.first().copied()))
            }
        })?;
        if aromatic && !atom_info::can_be_aromatic(protons) {
            Err(SmilesError::new(
                self.index,
                UnknownElement(EChar::from_slice(&rest[..len])),
            ))?;
        }
        if event_enabled!(Level::TRACE) {
            trace!(protons, aromatic, isotope, "found an element");
        }
        self.index += len;
        let mut atom = Atom::new_explicit(protons, 0)
            .map_err(|err| SmilesError::new(start, err.into()))?
            .with_isotope(isotope);
        atom.data.set_aromatic(aromatic);

        if self.input.get(self.index) == Some(&b'@') {
            trace!("handling chirality");
            self.index += 1;
            if self.input.get(self.index) == Some(&b'@') {
                self.index += 1;
                atom.data.set_chirality(Chirality::Cw);
            } else {
                atom.data.set_chirality(Chirality::Ccw);
            }
        }
        if self.input.get(self.index) == Some(&b'H') {
            self.index += 1;
            let (h, used) = u8::from_radix_10_checked(&self.input[self.index..]);
            self.index += used;
            let h = match (h, used) {
                (_, 0) => 1,
                (Some(h), _) => h,
                (None, _) => u8::MAX,
            };
            trace!(count = h, "adding explicit hydrogens");
            atom.set_hydrogens(h)
                .map_err(|err| SmilesError::new(self.index, err.into()))?;
        }
        match self.input.get(self.index).copied() {
            Some(sign @ (b'+' | b'-')) => {
                let sign_idx = self.index;
                self.index += 1;
                let (charge, used) = i8::from_radix_10_checked(&self.input[self.index..]);
                let charge = if used == 0 {
                    let count = self.input[self.index..]
                        .iter()
                        .take_while(|&&c| c == sign)
                        .count();
                    self.index += count;
                    i8::try_from(count + 1).ok()
                } else {
                    self.index += used;
                    charge
                };
                let charge = charge.ok_or(SmilesError::new(sign_idx, InvalidCharge))?;
                trace!(charge, "adding charge");
                atom.charge = if sign == b'-' { -charge } else { charge };
            }
            _ => {}
        }
        if self.input.get(self.index) == Some(&b':') {
            // atom class, which we don't keep
            self.index += 1;
            let used = self.input[self.index..]
                .iter()
                .take_while(|c| c.is_ascii_digit())
                .count();
            if used == 0 {
                Err(SmilesError::new(
                    self.index,
                    ExpectedAtom(self.input.get(self.index).copied()),
                ))?;
            }
            self.index += used;
        }
        if self.input.get(self.index) == Some(&b']') {
            self.index += 1;
            Ok(self.add_atom(atom))
        } else {
            Err(SmilesError::new(self.index, ExpectedClosingBracket))
        }
    }

    /// Handle loops. Since this needs to know which bond to use, it also parses a bond.
    #[instrument(level = "debug", skip_all, fields(self.input, self.index))]
    fn handle_loops(&mut self, last_atom: NodeIndex) -> Result<(Bond, bool), SmilesError> {
        loop {
            let bond_idx = self.index;
            let prev_bond = self.get_bond();
            if self.index >= self.input.len() {
                return Ok(prev_bond);
            }
            let c = self.input[self.index];
            let num_idx = self.index;
            let num = if c.is_ascii_digit() {
                self.index += 1;
                (c - b'0') as usize
            } else if c == b'%' {
                self.index += 1;
                self.ring_number()?
            } else {
                return Ok(prev_bond);
            };
            if prev_bond.0 == Bond::Non && prev_bond.1 {
                return Err(SmilesError::new(bond_idx, ExpectedAtom(Some(b'.'))));
            }
            use std::collections::hash_map::Entry;
            match self.rings.entry(num) {
                Entry::Occupied(e) => {
                    let open = e.remove();
                    // the bond is stored from the closing atom, so a direction written at the
                    // opening digit points the other way
                    let (bond, ex) = match (prev_bond, open.bond) {
                        (bond, None) => bond,
                        ((_, false), Some(Bond::Up)) => (Bond::Down, true),
                        ((_, false), Some(Bond::Down)) => (Bond::Up, true),
                        ((_, false), Some(bond)) => (bond, true),
                        ((b1, true), Some(b2)) => {
                            if b1.undirected() == b2.undirected() {
                                (b1, true)
                            } else {
                                return Err(SmilesError::new(bond_idx, LoopBondMismatch(b1, b2)));
                            }
                        }
                    };
                    trace!(ring = num, "closing ring");
                    self.bond_atoms(last_atom, open.atom, bond, ex, num_idx)?;
                    self.written[open.atom.index()][open.slot] = Some(last_atom);
                    self.written[last_atom.index()].push(Some(open.atom));
                }
                Entry::Vacant(e) => {
                    trace!(ring = num, "opening ring");
                    let slot = self.written[last_atom.index()].len();
                    self.written[last_atom.index()].push(None);
                    e.insert(OpenRing {
                        atom: last_atom,
                        bond: prev_bond.1.then_some(prev_bond.0),
                        index: num_idx,
                        slot,
                    });
                }
            }
        }
    }

    /// Parse the number after a `%`: either two digits, or any number of them in parentheses.
    fn ring_number(&mut self) -> Result<usize, SmilesError> {
        let digits = &self.input[self.index..];
        if digits.first() == Some(&b'(') {
            let (num, used) = usize::from_radix_10_checked(&digits[1..]);
            match (num, digits.get(used + 1)) {
                (Some(num), Some(&b')')) if used > 0 => {
                    self.index += used + 2;
                    Ok(num)
                }
                _ => Err(SmilesError::new(self.index + 1, ExpectedRingNumber)),
            }
        } else if digits.len() >= 2 && digits[..2].iter().all(u8::is_ascii_digit) {
            self.index += 2;
            Ok(((digits[0] - b'0') * 10 + (digits[1] - b'0')) as usize)
        } else {
            Err(SmilesError::new(self.index, ExpectedRingNumber))
        }
    }

    /// Parse a single bond
    #[instrument(level = "trace", skip_all, fields(self.input, self.index))]
    fn get_bond(&mut self) -> (Bond, bool) {
        let (bond, incr) = match self.input.get(self.index) {
            Some(&b'.') => (Bond::Non, true),
            Some(&b'-') => (Bond::Single, true),
            Some(&b'=') => (Bond::Double, true),
            Some(&b'#') => (Bond::Triple, true),
            Some(&b'$') => (Bond::Quad, true),
            Some(&b':') => (Bond::Aromatic, true),
            Some(&b'/') => (Bond::Up, true),
            Some(&b'\\') => (Bond::Down, true),
            _ => (Bond::Single, false),
        };
        if incr {
            self.index += 1;
        }
        (bond, incr)
    }

    /// Perform some checks on the molecule. Panics on failure (which should be impossible).
    #[instrument(level = "trace", skip_all, fields(self.input, self.index))]
    fn validate(mol: &Molecule) {
        for (id, atom) in mol.atoms() {
            assert_eq!(
                atom.in_ring(),
                mol.rings().is_ring_atom(id),
                "ring flag is out of sync for atom {}",
                id.index()
            );
            if atom.is_aromatic() {
                assert!(atom.in_ring(), "aromatic atom {} isn't in a ring", id.index());
            }
        }
        for &edge in mol.graph().edge_weights() {
            assert_ne!(edge, Bond::Non);
        }
    }

    /// Re-express chirality from the written neighbor order to the reference order. The implicit
    /// hydrogen or lone pair comes right after the atom before, or first if there isn't one.
    fn orient_chirality(&mut self) {
        let graph = self.builder.graph();
        let oriented = graph
            .node_indices()
            .filter(|&n| graph[n].data.chirality().is_chiral())
            .map(|n| {
                let mut written = Slots::new();
                let mut rest = self.written[n.index()].iter().copied();
                if self.has_from[n.index()] {
                    written.extend(rest.next());
                }
                if has_implicit_slot(graph, n) {
                    written.push(None);
                }
                written.extend(rest);
                let chirality = graph[n].data.chirality();
                let oriented = reorder(chirality, &written, &reference_slots(graph, n));
                if oriented.is_none() {
                    debug!(atom = n.index(), "dropping chirality on an atom with too few neighbors");
                }
                (n, oriented.unwrap_or_default())
            })
            .collect::<Vec<_>>();
        for (n, chirality) in oriented {
            if let Some(atom) = self.builder.atom_mut(n) {
                atom.data.set_chirality(chirality);
            }
        }
    }

    /// Parse the molecule, consuming self. This is taken by value to avoid cleanup.
    #[instrument(level = "debug", skip_all)]
    pub fn parse(mut self) -> Result<Molecule, SmilesError> {
        self.parse_chain(false)?;
        if let Some((&id, open)) = self.rings.iter().min_by_key(|r| r.1.index) {
            return Err(SmilesError::new(open.index, UnclosedLoop(id)));
        }
        self.orient_chirality();
        let mol = self.builder.build()?;
        if self.validate {
            Self::validate(&mol);
        }
        debug!(atoms = mol.atom_count(), bonds = mol.bond_count(), "parsed SMILES");
        Ok(mol)
    }
}
