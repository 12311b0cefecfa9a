//! Query records and the arena that owns them.
//!
//! Postings refer to queries through [`QueryId`], an index into a
//! caller-owned [`QueryArena`]. The hash never owns a query.

use std::fmt;

use crate::core::seq_coding::{Coding, SeqSlice};

/// Handle of a query inside its arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct QueryId(pub u32);

impl QueryId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

/// Why a query (or one of its windows) was left out of the hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RejectReason {
    TooShort,
    LowQuality,
    LowComplexity,
}

impl RejectReason {
    pub const ALL: [RejectReason; 3] = [
        RejectReason::TooShort,
        RejectReason::LowQuality,
        RejectReason::LowComplexity,
    ];

    fn bit(self) -> u8 {
        match self {
            RejectReason::TooShort => 0x01,
            RejectReason::LowQuality => 0x02,
            RejectReason::LowComplexity => 0x04,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RejectReason::TooShort => "too-short",
            RejectReason::LowQuality => "low-quality",
            RejectReason::LowComplexity => "low-complexity",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Set of rejection reasons recorded on a query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RejectFlags(u8);

impl RejectFlags {
    pub fn insert(&mut self, reason: RejectReason) {
        self.0 |= reason.bit();
    }

    pub fn contains(self, reason: RejectReason) -> bool {
        self.0 & reason.bit() != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn iter(self) -> impl Iterator<Item = RejectReason> {
        RejectReason::ALL.into_iter().filter(move |r| self.contains(*r))
    }
}

/// What the query hash builder needs from a query.
pub trait QueryRecord {
    /// Number of components: 1, or 2 for paired reads.
    fn components(&self) -> usize;

    fn component(&self, index: usize) -> SeqSlice<'_>;

    /// Record that a window of this query was not hashed.
    fn mark_rejected(&mut self, reason: RejectReason);
}

/// A single or paired read held in one encoding.
#[derive(Debug, Clone)]
pub struct Query {
    pub name: String,
    coding: Coding,
    mates: Vec<Vec<u8>>,
    rejected: RejectFlags,
}

impl Query {
    pub fn new(name: impl Into<String>, coding: Coding, data: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            coding,
            mates: vec![data],
            rejected: RejectFlags::default(),
        }
    }

    pub fn paired(name: impl Into<String>, coding: Coding, first: Vec<u8>, second: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            coding,
            mates: vec![first, second],
            rejected: RejectFlags::default(),
        }
    }

    /// IUPAC text query.
    pub fn from_iupac(name: impl Into<String>, bases: &[u8]) -> Self {
        Self::new(name, Coding::Iupac, bases.to_vec())
    }

    pub fn coding(&self) -> Coding {
        self.coding
    }

    pub fn rejected(&self) -> RejectFlags {
        self.rejected
    }

    /// Length in bases of component `index`.
    pub fn len(&self, index: usize) -> usize {
        self.coding.base_len(self.mates[index].len())
    }
}

impl QueryRecord for Query {
    fn components(&self) -> usize {
        self.mates.len()
    }

    fn component(&self, index: usize) -> SeqSlice<'_> {
        SeqSlice::new(self.coding, &self.mates[index])
    }

    fn mark_rejected(&mut self, reason: RejectReason) {
        self.rejected.insert(reason);
    }
}

/// Owner of every query of a batch.
#[derive(Debug, Default)]
pub struct QueryArena<Q = Query> {
    queries: Vec<Q>,
}

impl<Q> QueryArena<Q> {
    pub fn new() -> Self {
        Self { queries: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            queries: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, query: Q) -> QueryId {
        assert!(self.queries.len() < u32::MAX as usize, "query arena is full");
        let id = QueryId(self.queries.len() as u32);
        self.queries.push(query);
        id
    }

    pub fn get(&self, id: QueryId) -> Option<&Q> {
        self.queries.get(id.index())
    }

    pub fn get_mut(&mut self, id: QueryId) -> Option<&mut Q> {
        self.queries.get_mut(id.index())
    }

    pub fn len(&self) -> usize {
        self.queries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (QueryId, &Q)> {
        self.queries.iter().enumerate().map(|(i, q)| (QueryId(i as u32), q))
    }

    pub fn ids(&self) -> impl Iterator<Item = QueryId> {
        (0..self.queries.len() as u32).map(QueryId)
    }

    pub fn clear(&mut self) {
        self.queries.clear();
    }
}

impl<Q> std::ops::Index<QueryId> for QueryArena<Q> {
    type Output = Q;

    fn index(&self, id: QueryId) -> &Q {
        &self.queries[id.index()]
    }
}

impl<Q> std::ops::IndexMut<QueryId> for QueryArena<Q> {
    fn index_mut(&mut self, id: QueryId) -> &mut Q {
        &mut self.queries[id.index()]
    }
}
