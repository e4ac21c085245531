//! Text output for molecules.

pub mod smiles;

pub use smiles::{generate_smiles, SmilesConfig};
