pub mod bit_tables;
pub mod bitset;

pub use bitset::Bitset;
