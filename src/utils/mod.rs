pub mod bitset;
pub mod echar;
