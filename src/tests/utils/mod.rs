mod bitset;
mod echar;
