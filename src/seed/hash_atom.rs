//! Posting entries stored in the word hash.
//!
//! Layout of `flags` (low to high):
//!
//! | bits | field                               |
//! |------|-------------------------------------|
//! | 0    | strand (1 = reverse)                |
//! | 1    | pair mate (component 0/1)           |
//! | 2    | word id (split-word half 0/1)       |
//! | 3-5  | mismatches                          |
//! | 6-7  | indel state                         |
//! | 8-9  | indel length in bases               |

use std::cmp::Ordering;
use std::fmt;

use super::query::QueryId;

pub const FLAG_STRAND: u16 = 1 << 0;
pub const FLAG_PAIRMATE: u16 = 1 << 1;
pub const FLAG_WORD: u16 = 1 << 2;
const MISMATCH_SHIFT: u16 = 3;
const MISMATCH_MASK: u16 = 0x7;
const INDEL_SHIFT: u16 = 6;
const INDEL_MASK: u16 = 0x3;
const INDEL_LEN_SHIFT: u16 = 8;
const INDEL_LEN_MASK: u16 = 0x3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Strand {
    Forward,
    Reverse,
}

impl Strand {
    pub fn symbol(self) -> char {
        match self {
            Strand::Forward => '+',
            Strand::Reverse => '-',
        }
    }
}

/// How the hashed window relates to the query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IndelState {
    None,
    /// Query bases were removed: the query carries extra bases.
    Insertion,
    /// Any-base positions were added: the query lacks bases.
    Deletion,
    Invalid,
}

impl IndelState {
    fn bits(self) -> u16 {
        match self {
            IndelState::None => 0,
            IndelState::Insertion => 1,
            IndelState::Deletion => 2,
            IndelState::Invalid => 3,
        }
    }

    fn from_bits(bits: u16) -> Self {
        match bits & INDEL_MASK {
            0 => IndelState::None,
            1 => IndelState::Insertion,
            2 => IndelState::Deletion,
            _ => IndelState::Invalid,
        }
    }
}

/// One (query, offset, strand, distance) occurrence of a key.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct HashAtom {
    subkey: u16,
    offset: u16,
    query: QueryId,
    flags: u16,
}

impl HashAtom {
    pub fn new(query: QueryId, offset: u16, strand: Strand) -> Self {
        let flags = if strand == Strand::Reverse { FLAG_STRAND } else { 0 };
        Self {
            subkey: 0,
            offset,
            query,
            flags,
        }
    }

    pub fn with_pairmate(mut self, mate: u8) -> Self {
        self.set_bit(FLAG_PAIRMATE, mate != 0);
        self
    }

    pub fn with_word(mut self, word: u8) -> Self {
        self.set_bit(FLAG_WORD, word != 0);
        self
    }

    pub fn with_mismatches(mut self, mismatches: u32) -> Self {
        debug_assert!(mismatches as u16 <= MISMATCH_MASK);
        self.flags &= !(MISMATCH_MASK << MISMATCH_SHIFT);
        self.flags |= (mismatches.min(MISMATCH_MASK as u32) as u16) << MISMATCH_SHIFT;
        self
    }

    pub fn with_indel(mut self, state: IndelState, len: u32) -> Self {
        self.flags &= !((INDEL_MASK << INDEL_SHIFT) | (INDEL_LEN_MASK << INDEL_LEN_SHIFT));
        self.flags |= state.bits() << INDEL_SHIFT;
        self.flags |= (len.min(INDEL_LEN_MASK as u32) as u16) << INDEL_LEN_SHIFT;
        self
    }

    pub(crate) fn with_subkey(mut self, subkey: u16) -> Self {
        self.subkey = subkey;
        self
    }

    #[inline]
    fn set_bit(&mut self, bit: u16, on: bool) {
        if on {
            self.flags |= bit;
        } else {
            self.flags &= !bit;
        }
    }

    #[inline]
    pub fn subkey(&self) -> u16 {
        self.subkey
    }

    #[inline]
    pub fn query(&self) -> QueryId {
        self.query
    }

    /// Window start inside the query component (forward coordinates).
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset as usize
    }

    #[inline]
    pub fn flags(&self) -> u16 {
        self.flags
    }

    #[inline]
    pub fn strand(&self) -> Strand {
        if self.flags & FLAG_STRAND != 0 {
            Strand::Reverse
        } else {
            Strand::Forward
        }
    }

    #[inline]
    pub fn pairmate(&self) -> u8 {
        (self.flags & FLAG_PAIRMATE != 0) as u8
    }

    #[inline]
    pub fn word(&self) -> u8 {
        (self.flags & FLAG_WORD != 0) as u8
    }

    #[inline]
    pub fn mismatches(&self) -> u32 {
        ((self.flags >> MISMATCH_SHIFT) & MISMATCH_MASK) as u32
    }

    #[inline]
    pub fn indel(&self) -> IndelState {
        IndelState::from_bits(self.flags >> INDEL_SHIFT)
    }

    #[inline]
    pub fn indel_len(&self) -> u32 {
        ((self.flags >> INDEL_LEN_SHIFT) & INDEL_LEN_MASK) as u32
    }

    /// Substitutions plus indel bases.
    #[inline]
    pub fn distance(&self) -> u32 {
        self.mismatches() + self.indel_len()
    }

    /// Query bases covered by a window of `window_size` reference bases.
    pub fn query_span(&self, window_size: usize) -> usize {
        match self.indel() {
            IndelState::Insertion => window_size + self.indel_len() as usize,
            IndelState::Deletion => window_size.saturating_sub(self.indel_len() as usize),
            IndelState::None | IndelState::Invalid => window_size,
        }
    }

    /// Flag bits that identify an occurrence regardless of mismatches.
    ///
    /// Indel state and length are part of the identity: they change the
    /// query span and with it the reverse-strand anchor.
    #[inline]
    pub(crate) fn identity_flags(&self) -> u16 {
        self.flags
            & (FLAG_STRAND
                | FLAG_PAIRMATE
                | FLAG_WORD
                | (INDEL_MASK << INDEL_SHIFT)
                | (INDEL_LEN_MASK << INDEL_LEN_SHIFT))
    }

    /// Order used inside a bucket: subkey first, then occurrence, then distance.
    pub(crate) fn bucket_order(&self, other: &Self) -> Ordering {
        (self.subkey, self.query, self.pairmate(), self.offset, self.identity_flags(), self.distance())
            .cmp(&(other.subkey, other.query, other.pairmate(), other.offset, other.identity_flags(), other.distance()))
    }

    /// Same key and occurrence, possibly different distance.
    pub(crate) fn same_occurrence(&self, other: &Self) -> bool {
        self.subkey == other.subkey
            && self.query == other.query
            && self.offset == other.offset
            && self.identity_flags() == other.identity_flags()
    }
}

impl fmt::Debug for HashAtom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashAtom")
            .field("subkey", &format_args!("{:#06x}", self.subkey))
            .field("query", &self.query)
            .field("mate", &self.pairmate())
            .field("offset", &self.offset)
            .field("strand", &self.strand())
            .field("word", &self.word())
            .field("mismatches", &self.mismatches())
            .field("indel", &self.indel())
            .field("indel_len", &self.indel_len())
            .finish()
    }
}
