pub mod hash_params;

pub use hash_params::{ConfigError, HashParams, IndelPolicy, StrandMask};
