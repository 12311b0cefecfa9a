//! Core primitives
//!
//! - **Bit operations** (`bit_ops`): popcount, bit and bit-pair reversal,
//!   interleaving and footprint masks over every integer width
//! - **Nucleotide codecs** (`seq_coding`): IUPAC, ncbi2na, ncbi4na,
//!   quality-weighted and color-space encodings
//! - **Packed windows** (`packed_window`): 2-bit keys and 4-bit windows

pub mod bit_ops;
pub mod packed_window;
pub mod seq_coding;
