//! Core cheminformatics: SMILES parsing and writing, canonical ordering, Morgan fingerprints, and
//! substructure search over SMARTS queries.

pub mod api;
mod aromaticity;
#[rustfmt::skip]
pub mod atom_info;
pub mod core;
pub mod disp;
pub mod fingerprint;
pub mod graph;
pub mod molecule;
pub mod parse;
pub mod query;
pub mod stereo;
pub mod utils;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::api::{parse, parse_query, Mol, QueryMol};
    pub use crate::core::{Atom, Bond, Chirality, MoleculeGraph};
    pub use crate::disp::{generate_smiles, SmilesConfig};
    pub use crate::fingerprint::{morgan_fingerprint, Fingerprint, FingerprintConfig};
    pub use crate::graph::algo::{
        canonical_ranks, has_substruct, substruct_match, Match, SearchBudget,
        SearchBudgetExceeded, SubstructMatcher,
    };
    pub use crate::molecule::{Molecule, MoleculeBuilder, StructureError};
    pub use crate::parse::{ErrorCategory, SmartsError, SmartsParser, SmilesError, SmilesParser};
    pub use crate::query::{AtomQuery, BondQuery, QueryMolecule};
}
