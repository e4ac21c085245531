
mod aromaticity;
mod fingerprint;
mod query;
mod smiles;
mod utils;
