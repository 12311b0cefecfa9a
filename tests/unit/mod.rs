//! Unit test infrastructure for seedfar
//!
//! Tests are organized by module:
//! - `core/` - bit operations, codecs and packed windows
//! - `seed/` - word hash, query hash and reference scanning
//! - `cli/` - argument parsing and read loading

pub mod cli;
pub mod core;
pub mod helpers;
pub mod seed;
