//! A small, infallible surface over the library.
//!
//! [`parse`] and [`parse_query`] always return a value. Invalid input gives an object whose
//! [`Mol::is_valid`] is false, and whose outputs are empty.

use crate::disp::smiles::{generate_smiles, SmilesConfig};
use crate::fingerprint::{morgan_fingerprint, FingerprintConfig};
use crate::graph::algo::substruct::*;
use crate::molecule::Molecule;
use crate::parse::smarts::{InvalidQueryError, SmartsParser};
use crate::parse::smiles::{SmilesError, SmilesParser};
use crate::query::QueryMolecule;

/// A parsed molecule, or the reason it couldn't be parsed.
#[derive(Debug, Clone)]
pub struct Mol {
    inner: Result<Molecule, SmilesError>,
}
impl Mol {
    pub fn is_valid(&self) -> bool {
        self.inner.is_ok()
    }
    pub fn error(&self) -> Option<&SmilesError> {
        self.inner.as_ref().err()
    }
    pub fn molecule(&self) -> Option<&Molecule> {
        self.inner.as_ref().ok()
    }

    /// Canonical SMILES, or an empty string for an invalid molecule.
    pub fn smiles(&self) -> String {
        self.molecule()
            .map(|m| generate_smiles(m, SmilesConfig::new()))
            .unwrap_or_default()
    }

    /// Morgan fingerprint with radius 2 and 2048 bits, as a string of `0` and `1`.
    pub fn morgan_fp(&self) -> String {
        let cfg = FingerprintConfig::new();
        self.morgan_fp_with(cfg.radius, cfg.n_bits)
    }
    pub fn morgan_fp_with(&self, radius: u32, len: usize) -> String {
        let cfg = FingerprintConfig::new().with_radius(radius).with_bits(len);
        self.molecule()
            .map(|m| morgan_fingerprint(m, cfg).to_string())
            .unwrap_or_default()
    }

    /// Check if the query is in this molecule. Invalid molecules and queries never match.
    pub fn substruct_match(&self, query: &QueryMol) -> bool {
        matches!(
            self.substruct_match_with(query, SearchBudget::unlimited()),
            Ok(Some(_))
        )
    }
    pub fn substruct_match_with(
        &self,
        query: &QueryMol,
        budget: SearchBudget,
    ) -> Result<Option<Match>, SearchBudgetExceeded> {
        match (self.molecule(), query.query()) {
            (Some(mol), Some(query)) => substruct_match(mol, query, budget),
            _ => Ok(None),
        }
    }
}

/// A parsed query, or the reason it couldn't be parsed.
#[derive(Debug, Clone)]
pub struct QueryMol {
    inner: Result<QueryMolecule, InvalidQueryError>,
}
impl QueryMol {
    pub fn is_valid(&self) -> bool {
        self.inner.is_ok()
    }
    pub fn error(&self) -> Option<&InvalidQueryError> {
        self.inner.as_ref().err()
    }
    pub fn query(&self) -> Option<&QueryMolecule> {
        self.inner.as_ref().ok()
    }
}

pub fn parse(text: &str) -> Mol {
    Mol {
        inner: SmilesParser::new(text).parse(),
    }
}

pub fn parse_query(text: &str) -> QueryMol {
    QueryMol {
        inner: SmartsParser::new(text).parse(),
    }
}

/// Version of this library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
