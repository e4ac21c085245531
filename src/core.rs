//! Atoms and bonds, the node and edge weights of a molecule graph.

use crate::atom_info::ATOM_DATA;
use c_enum::*;
use modular_bitfield::prelude::*;
use petgraph::prelude::*;
use std::fmt::{self, Display, Formatter};
use thiserror::Error;

const PROTON_MASS: f32 = 1.00727647;
const NEUTRON_MASS: f32 = 1.008665;
const ELECTRON_MASS: f32 = 0.00054858;

/// Hydrogen counts are stored in four bits.
pub const MAX_HYDROGENS: u8 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[error("too many hydrogens: attempted to set {0}, the max is 15")]
pub struct TooManyHydrogens(pub usize);

/// Tetrahedral chirality. Looking from the first neighbor of the atom's reference order (see
/// [`crate::stereo`]), the remaining ones go counterclockwise for `Ccw` and clockwise for `Cw`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, BitfieldSpecifier)]
#[bits = 2]
pub enum Chirality {
    #[default]
    None,
    /// `@`
    Ccw,
    /// `@@`
    Cw,
}
impl Chirality {
    pub fn is_chiral(self) -> bool {
        self != Self::None
    }
    /// The opposite handedness, as after swapping two neighbors.
    pub fn inverted(self) -> Self {
        match self {
            Self::None => Self::None,
            Self::Ccw => Self::Cw,
            Self::Cw => Self::Ccw,
        }
    }
}

/// Bit-packed per-atom flags
#[bitfield]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AtomData {
    pub hydrogen: B4,
    pub aromatic: bool,
    /// Set by ring perception when the atom is in at least one ring.
    pub ring: bool,
    /// Hydrogens should be filled in from the default valence when the molecule is built.
    pub implicit: bool,
    pub chirality: Chirality,
    #[skip]
    __: B7,
}

/// An atom in the molecule graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct Atom {
    pub protons: u8,
    pub charge: i8,
    /// Mass number, 0 for the natural abundance mixture.
    pub isotope: u16,
    pub data: AtomData,
}
impl Atom {
    /// An uncharged atom whose hydrogens will be implied from its valence, like a bare SMILES atom.
    pub fn new(protons: u8) -> Self {
        Self {
            protons,
            charge: 0,
            isotope: 0,
            data: AtomData::new().with_implicit(true),
        }
    }
    /// Like `new`, but aromatic.
    pub fn new_aromatic(protons: u8) -> Self {
        let mut out = Self::new(protons);
        out.data.set_aromatic(true);
        out
    }
    /// An atom with exactly the given hydrogen count, like a bracket atom.
    pub fn new_explicit(protons: u8, hydrogens: u8) -> Result<Self, TooManyHydrogens> {
        let mut out = Self {
            protons,
            charge: 0,
            isotope: 0,
            data: AtomData::new(),
        };
        out.set_hydrogens(hydrogens)?;
        Ok(out)
    }
    /// The wildcard atom `*`.
    pub fn wildcard() -> Self {
        Self {
            protons: 0,
            charge: 0,
            isotope: 0,
            data: AtomData::new(),
        }
    }
    pub fn with_charge(mut self, charge: i8) -> Self {
        self.charge = charge;
        self
    }
    pub fn with_isotope(mut self, isotope: u16) -> Self {
        self.isotope = isotope;
        self
    }

    #[inline(always)]
    pub fn hydrogens(self) -> u8 {
        self.data.hydrogen()
    }
    #[inline(always)]
    pub fn is_aromatic(self) -> bool {
        self.data.aromatic()
    }
    #[inline(always)]
    pub fn in_ring(self) -> bool {
        self.data.ring()
    }
    #[inline(always)]
    pub fn is_wildcard(self) -> bool {
        self.protons == 0
    }

    pub fn set_hydrogens(&mut self, h: u8) -> Result<(), TooManyHydrogens> {
        if h <= MAX_HYDROGENS {
            self.data.set_hydrogen(h);
            Ok(())
        } else {
            Err(TooManyHydrogens(h as _))
        }
    }
    pub fn add_hydrogens(&mut self, h: u8) -> Result<(), TooManyHydrogens> {
        self.set_hydrogens(self.data.hydrogen().saturating_add(h))
    }

    /// The element symbol, with the periodic table's capitalization.
    pub fn symbol(self) -> &'static str {
        ATOM_DATA
            .get(self.protons as usize)
            .map_or("*", |e| e.sym)
    }

    /// Mass of this atom on its own, without its hydrogens.
    pub fn mass(self) -> f32 {
        let base = if self.isotope == 0 {
            ATOM_DATA.get(self.protons as usize).map_or(0.0, |e| e.mass)
        } else {
            PROTON_MASS * self.protons as f32
                + NEUTRON_MASS * (self.isotope as f32 - self.protons as f32)
        };
        base - ELECTRON_MASS * self.charge as f32
    }
}
impl Display for Atom {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            let name = ATOM_DATA
                .get(self.protons as usize)
                .map_or("unknown", |e| e.name);
            f.write_str(name)?;
            if self.isotope != 0 {
                write!(f, "-{}", self.isotope)?;
            }
        } else {
            use fmtastic::*;
            if self.isotope != 0 {
                write!(f, "{}", Superscript(self.isotope))?;
            }
            f.write_str(self.symbol())?;
            match self.hydrogens() {
                0 => {}
                1 => f.write_str("H")?,
                h => write!(f, "H{}", Subscript(h))?,
            }
            match self.charge {
                0 => {}
                1 => f.write_str("⁺")?,
                -1 => f.write_str("⁻")?,
                _ => write!(f, "{:+}", Superscript(self.charge))?,
            }
        }
        Ok(())
    }
}

c_enum! {
    /// A bond between atoms in the molecule graph
    #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
    pub enum Bond: u8 {
        /// Non-bond, shouldn't appear in final graph
        Non,
        Single,
        Double,
        Triple,
        Quad,
        Aromatic,
        /// Single bond written as `/`
        Up,
        /// Single bond written as `\`
        Down,
    }
}
impl Bond {
    /// Bond order, with aromatic bonds counting as one and a half.
    pub fn bond_count(self) -> f32 {
        match self {
            Self::Single | Self::Up | Self::Down => 1f32,
            Self::Double => 2f32,
            Self::Triple => 3f32,
            Self::Quad => 4f32,
            Self::Aromatic => 1.5f32,
            _ => 0f32,
        }
    }
    /// Integer code used by the fingerprint and canonical ranking invariants.
    pub fn code(self) -> u32 {
        match self {
            Self::Single | Self::Up | Self::Down => 1,
            Self::Double => 2,
            Self::Triple => 3,
            Self::Quad => 4,
            Self::Aromatic => 12,
            _ => 0,
        }
    }
    /// Single bond, possibly with a direction.
    pub fn is_single(self) -> bool {
        matches!(self, Self::Single | Self::Up | Self::Down)
    }
    /// Direction-free version of this bond.
    pub fn undirected(self) -> Self {
        if self.is_single() {
            Self::Single
        } else {
            self
        }
    }
    pub fn as_static_str(self) -> &'static str {
        match self {
            Self::Non => "non",
            Self::Single => "single",
            Self::Double => "double",
            Self::Triple => "triple",
            Self::Quad => "quad",
            Self::Aromatic => "aromatic",
            Self::Up => "up",
            Self::Down => "down",
            _ => "invalid",
        }
    }
}
impl Display for Bond {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_static_str())
    }
}

/// A molecule graph is an undirected graph between atoms, connected with bonds
pub type MoleculeGraph = UnGraph<Atom, Bond>;
