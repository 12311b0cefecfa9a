//! Seed hashing and reference scanning
//!
//! - **Permutations** (`permutator`): mismatch/ambiguity expansion tables
//! - **Postings** (`hash_atom`, `word_hash`): bucketed word hash
//! - **Queries** (`query`, `query_hash`): query arena and hash construction
//! - **Scanning** (`range_map`, `scanner`): reference segmentation and probing

pub mod hash_atom;
pub mod permutator;
pub mod query;
pub mod query_hash;
pub mod range_map;
pub mod scanner;
pub mod word_hash;

pub use hash_atom::{HashAtom, IndelState, Strand};
pub use permutator::PermutationTable;
pub use query::{Query, QueryArena, QueryId, QueryRecord, RejectFlags, RejectReason};
pub use query_hash::{BuildStats, QueryHash, QueryHashBuilder};
pub use range_map::{RangeClass, RangeSegment};
pub use scanner::{
    BaseSubstitution, MatchCollector, MatchList, NoSubstitution, RefBounds, ReferenceBuffer, ScanStats, SeedMatch,
    SequenceScanner,
};
pub use word_hash::{WordHashBuilder, WordHashIndex};
