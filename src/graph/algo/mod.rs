pub mod refine;
pub mod sssr;
pub mod substruct;

pub use refine::{canonical_ranks, canonical_ranks_with_stereo};
pub use sssr::{Ring, RingInfo};
pub use substruct::*;
