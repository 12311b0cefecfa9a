//! Test utilities shared by the unit tests
//!
//! - Query arenas and frozen hashes from IUPAC strings
//! - Scanning a reference into a position set
//! - Deterministic pseudo-random sequences

use rustc_hash::FxHashSet;
use seedfar::config::HashParams;
use seedfar::seed::{
    MatchList, Query, QueryArena, QueryHash, QueryHashBuilder, ReferenceBuffer, SeedMatch, SequenceScanner,
};

/// Build a frozen hash over IUPAC queries, returning the arena as well.
pub fn hash_queries(params: HashParams, queries: &[&[u8]]) -> (QueryHash, QueryArena) {
    let mut arena = QueryArena::new();
    for (i, q) in queries.iter().enumerate() {
        arena.push(Query::from_iupac(format!("q{}", i), q));
    }
    let mut builder = QueryHashBuilder::new(params).expect("valid parameters");
    builder.add_arena(&mut arena);
    (builder.finalize(), arena)
}

/// Every hit of `hash` on `reference`.
pub fn scan_matches(hash: &QueryHash, reference: &[u8]) -> Vec<SeedMatch> {
    let mut list = MatchList::default();
    SequenceScanner::new(hash).scan(&ReferenceBuffer::new("ref", reference), &mut list);
    list.matches
}

/// Distinct reported query-start positions.
pub fn scan_positions(hash: &QueryHash, reference: &[u8]) -> FxHashSet<i64> {
    scan_matches(hash, reference).iter().map(|m| m.position).collect()
}

/// Deterministic pseudo-random ACGT text.
pub fn random_bases(n: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    (0..n)
        .map(|_| {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            b"ACGT"[((state >> 33) % 4) as usize]
        })
        .collect()
}
