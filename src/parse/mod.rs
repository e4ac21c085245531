//! Parsers for line notations: SMILES for molecules and SMARTS for queries.

pub mod smarts;
pub mod smiles;

pub use smarts::{SmartsError, SmartsErrorKind, SmartsParser};
pub use smiles::{SmilesError, SmilesErrorKind, SmilesParser};

/// Broad class of a parse failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The string isn't well-formed.
    Syntax,
    /// The string is well-formed, but doesn't describe a valid structure.
    Semantic,
    /// The string uses a feature that isn't implemented.
    Unsupported,
}
