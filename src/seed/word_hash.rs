//! Bucketed word hash.
//!
//! Keys are split into a bucket index (`key & index_mask`) and a 16-bit subkey
//! (`key >> index_bits`). [`WordHashBuilder`] collects postings in insertion
//! order; [`WordHashBuilder::finalize`] lays them out as a packed
//! offsets + atoms table (one offsets slot per bucket plus a sentinel) with
//! every bucket sorted by subkey. Only the frozen [`WordHashIndex`] can be
//! queried.

use std::cmp::Ordering;

use tracing::debug;

use super::hash_atom::{HashAtom, Strand, FLAG_WORD};
use super::query::QueryId;
use crate::core::packed_window::Key2;

/// Postings collected before the table is frozen.
#[derive(Debug, Clone)]
pub struct WordHashBuilder {
    index_bits: u32,
    pending: Vec<(u32, HashAtom)>,
}

impl WordHashBuilder {
    pub fn new(index_bits: u32) -> Self {
        assert!(index_bits > 0 && index_bits < 32, "index bits {} out of range", index_bits);
        Self {
            index_bits,
            pending: Vec::new(),
        }
    }

    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    #[inline]
    fn index_mask(&self) -> Key2 {
        (1 << self.index_bits) - 1
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn reserve(&mut self, additional: usize) {
        self.pending.reserve(additional);
    }

    /// Store `atom` under `key`. The subkey is taken from the key's high bits.
    #[inline]
    pub fn insert(&mut self, key: Key2, atom: HashAtom) {
        let bucket = (key & self.index_mask()) as u32;
        let subkey = (key >> self.index_bits) as u16;
        debug_assert_eq!((key >> self.index_bits) >> 16, 0, "subkey overflow for key {:#x}", key);
        self.pending.push((bucket, atom.with_subkey(subkey)));
    }

    /// Sort every bucket and freeze the table.
    ///
    /// Postings of the same occurrence (query, mate, offset, strand, word,
    /// indel) under the same key collapse to the one with the fewest mismatches.
    pub fn finalize(self) -> WordHashIndex {
        let buckets = 1usize << self.index_bits;
        let mut offsets = vec![0u32; buckets + 1];
        for &(bucket, _) in &self.pending {
            offsets[bucket as usize + 1] += 1;
        }
        for i in 0..buckets {
            offsets[i + 1] += offsets[i];
        }

        let placeholder = HashAtom::new(QueryId(0), 0, Strand::Forward);
        let mut atoms = vec![placeholder; self.pending.len()];
        let mut write_pos: Vec<u32> = offsets[..buckets].to_vec();
        for &(bucket, atom) in &self.pending {
            let slot = &mut write_pos[bucket as usize];
            atoms[*slot as usize] = atom;
            *slot += 1;
        }
        let inserted = atoms.len();

        // sort each bucket, then compact duplicates in place
        let mut write = 0usize;
        let mut start = 0usize;
        for b in 0..buckets {
            let end = offsets[b + 1] as usize;
            atoms[start..end].sort_unstable_by(|a, b| a.bucket_order(b));
            offsets[b] = write as u32;
            let bucket_start = write;
            for read in start..end {
                let atom = atoms[read];
                if write > bucket_start && atoms[write - 1].same_occurrence(&atom) {
                    continue;
                }
                atoms[write] = atom;
                write += 1;
            }
            start = end;
        }
        offsets[buckets] = write as u32;
        atoms.truncate(write);
        atoms.shrink_to_fit();

        let index = WordHashIndex {
            index_bits: self.index_bits,
            offsets,
            atoms,
        };
        debug!(
            index_bits = index.index_bits,
            inserted,
            stored = index.len(),
            non_empty_buckets = index.non_empty_buckets(),
            longest_bucket = index.longest_bucket(),
            "word hash finalized"
        );
        index
    }
}

/// Scratch lists reused by [`WordHashIndex::lookup_split`].
#[derive(Debug, Default)]
pub struct SplitScratch {
    first: Vec<HashAtom>,
    second: Vec<HashAtom>,
}

/// Frozen, read-only word hash.
#[derive(Debug, Clone)]
pub struct WordHashIndex {
    index_bits: u32,
    offsets: Vec<u32>,
    atoms: Vec<HashAtom>,
}

impl WordHashIndex {
    pub fn index_bits(&self) -> u32 {
        self.index_bits
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    pub fn atoms(&self) -> &[HashAtom] {
        &self.atoms
    }

    pub fn non_empty_buckets(&self) -> usize {
        self.offsets.windows(2).filter(|w| w[0] != w[1]).count()
    }

    pub fn longest_bucket(&self) -> usize {
        self.offsets
            .windows(2)
            .map(|w| (w[1] - w[0]) as usize)
            .max()
            .unwrap_or(0)
    }

    #[inline]
    fn bucket(&self, key: Key2) -> &[HashAtom] {
        let idx = (key & ((1 << self.index_bits) - 1)) as usize;
        &self.atoms[self.offsets[idx] as usize..self.offsets[idx + 1] as usize]
    }

    /// Run of postings stored under exactly `key`.
    #[inline]
    pub fn postings(&self, key: Key2) -> &[HashAtom] {
        let subkey = (key >> self.index_bits) as u16;
        let bucket = self.bucket(key);
        let lo = bucket.partition_point(|a| a.subkey() < subkey);
        let hi = lo + bucket[lo..].partition_point(|a| a.subkey() == subkey);
        &bucket[lo..hi]
    }

    /// Call `f` for every posting of `key`. Returns the number of calls.
    #[inline]
    pub fn lookup<F>(&self, key: Key2, mut f: F) -> usize
    where
        F: FnMut(&HashAtom),
    {
        let run = self.postings(key);
        run.iter().for_each(&mut f);
        run.len()
    }

    /// Like [`lookup`](Self::lookup) but only for postings whose
    /// `flags & mask == flags`.
    pub fn lookup_filtered<F>(&self, key: Key2, mask: u16, flags: u16, mut f: F) -> usize
    where
        F: FnMut(&HashAtom),
    {
        let mut calls = 0;
        for atom in self.postings(key) {
            if atom.flags() & mask == flags {
                f(atom);
                calls += 1;
            }
        }
        calls
    }

    /// Probe both halves of a split window and call `f(first, second)` for
    /// every occurrence found under both: same query, mate, offset, strand
    /// and indel variant.
    pub fn lookup_split<F>(&self, key0: Key2, key1: Key2, scratch: &mut SplitScratch, mut f: F) -> usize
    where
        F: FnMut(&HashAtom, &HashAtom),
    {
        scratch.first.clear();
        scratch.second.clear();
        self.lookup_filtered(key0, FLAG_WORD, 0, |a| scratch.first.push(*a));
        if scratch.first.is_empty() {
            return 0;
        }
        self.lookup_filtered(key1, FLAG_WORD, FLAG_WORD, |a| scratch.second.push(*a));
        if scratch.second.is_empty() {
            return 0;
        }
        scratch.first.sort_unstable_by(co_order);
        scratch.second.sort_unstable_by(co_order);

        let (mut i, mut j, mut calls) = (0, 0, 0);
        while i < scratch.first.len() && j < scratch.second.len() {
            let (a, b) = (&scratch.first[i], &scratch.second[j]);
            match co_order(a, b) {
                Ordering::Less => i += 1,
                Ordering::Greater => j += 1,
                Ordering::Equal => {
                    f(a, b);
                    calls += 1;
                    i += 1;
                    j += 1;
                }
            }
        }
        calls
    }

    /// Drop every posting and return an empty builder of the same shape.
    pub fn clear(self) -> WordHashBuilder {
        WordHashBuilder::new(self.index_bits)
    }
}

/// Halves of one occurrence: everything but the word bit and the mismatches.
fn co_order(a: &HashAtom, b: &HashAtom) -> Ordering {
    let half = |x: &HashAtom| (x.query(), x.pairmate(), x.offset(), x.identity_flags() & !FLAG_WORD);
    half(a).cmp(&half(b))
}
