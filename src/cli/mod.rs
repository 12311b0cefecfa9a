//! Command-line driver: load reads, build the query hash, scan references.

pub mod args;
pub mod run;

pub use args::SearchArgs;
pub use run::run;
