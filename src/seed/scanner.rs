//! Reference scanning against a frozen [`QueryHash`].
//!
//! The reference is converted to ncbi4na (after the optional substitution
//! hook), segmented by [`build_range_map`], and every window start on the
//! stride grid is probed:
//!
//! - `Direct`: the exact 2-bit key and the triplet complexity score slide one
//!   base at a time.
//! - `Iterate`: the 4-bit window slides one base at a time and every
//!   unambiguous key it admits is probed.
//! - `Skip`: nothing.
//!
//! Hits go to a [`MatchCollector`] with the reference coordinate of the first
//! base of the (strand oriented) query.

use rustc_hash::FxHashMap;
use tracing::debug;

use super::hash_atom::{HashAtom, IndelState, Strand};
use super::query::QueryId;
use super::query_hash::QueryHash;
use super::range_map::{build_range_map, RangeClass, RangeMapParams, RangeSegment};
use super::word_hash::SplitScratch;
use crate::core::packed_window::{
    drop_positions2, drop_positions4, key_mask2, pack_ncbi2na, pack_ncbi4na, push_base2, push_base4,
    unpack_ncbi2na, Key2,
};
use crate::core::seq_coding::{iupac_to_ncbi4na, ncbi4na_to_ncbi2na};
use crate::utils::complexity::{triplet_id, ComplexityFilter};

/// A contiguous stretch of reference bases (IUPAC text).
#[derive(Debug, Clone, Copy)]
pub struct ReferenceBuffer<'a> {
    pub name: &'a str,
    pub bases: &'a [u8],
    /// Absolute coordinate of `bases[0]`.
    pub offset: u64,
}

impl<'a> ReferenceBuffer<'a> {
    pub fn new(name: &'a str, bases: &'a [u8]) -> Self {
        Self { name, bases, offset: 0 }
    }

    pub fn with_offset(mut self, offset: u64) -> Self {
        self.offset = offset;
        self
    }

    pub fn bounds(&self) -> RefBounds {
        RefBounds {
            start: self.offset,
            end: self.offset + self.bases.len() as u64,
        }
    }
}

/// Absolute coordinates `start..end` of the buffer that produced a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefBounds {
    pub start: u64,
    pub end: u64,
}

/// Rewrites reference bases before scanning (known variants, masking).
pub trait BaseSubstitution {
    /// New ncbi4na code for the base at absolute `position`.
    fn substitute(&self, position: u64, code: u8) -> u8;
}

/// Leaves every base unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSubstitution;

impl BaseSubstitution for NoSubstitution {
    #[inline]
    fn substitute(&self, _position: u64, code: u8) -> u8 {
        code
    }
}

/// Known alternative alleles: the stored ncbi4na bits are added to the
/// reference base at that position.
impl BaseSubstitution for FxHashMap<u64, u8> {
    #[inline]
    fn substitute(&self, position: u64, code: u8) -> u8 {
        self.get(&position).map_or(code, |alt| code | (alt & 0x0F))
    }
}

/// Receiver of every candidate hit.
pub trait MatchCollector {
    fn collect(&mut self, atom: &HashAtom, bounds: RefBounds, position: i64);
}

impl<F> MatchCollector for F
where
    F: FnMut(&HashAtom, RefBounds, i64),
{
    #[inline]
    fn collect(&mut self, atom: &HashAtom, bounds: RefBounds, position: i64) {
        self(atom, bounds, position)
    }
}

/// A candidate hit, detached from the hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SeedMatch {
    pub query: QueryId,
    pub mate: u8,
    pub strand: Strand,
    /// Reference coordinate of the first query base.
    pub position: i64,
    /// Window offset inside the query component.
    pub offset: usize,
    pub mismatches: u32,
    pub indel: IndelState,
    pub indel_len: u32,
}

impl SeedMatch {
    pub fn from_atom(atom: &HashAtom, position: i64) -> Self {
        Self {
            query: atom.query(),
            mate: atom.pairmate(),
            strand: atom.strand(),
            position,
            offset: atom.offset(),
            mismatches: atom.mismatches(),
            indel: atom.indel(),
            indel_len: atom.indel_len(),
        }
    }
}

/// Collector that keeps every hit.
#[derive(Debug, Clone, Default)]
pub struct MatchList {
    pub matches: Vec<SeedMatch>,
}

impl MatchCollector for MatchList {
    fn collect(&mut self, atom: &HashAtom, _bounds: RefBounds, position: i64) {
        self.matches.push(SeedMatch::from_atom(atom, position));
    }
}

/// Per-buffer (or accumulated) scan counters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub buffers: usize,
    pub bases: usize,
    pub direct: usize,
    pub iterate: usize,
    pub skipped: usize,
    pub low_complexity: usize,
    pub probes: usize,
    pub hits: usize,
}

impl ScanStats {
    pub fn merge(&mut self, other: &ScanStats) {
        self.buffers += other.buffers;
        self.bases += other.bases;
        self.direct += other.direct;
        self.iterate += other.iterate;
        self.skipped += other.skipped;
        self.low_complexity += other.low_complexity;
        self.probes += other.probes;
        self.hits += other.hits;
    }
}

/// Streams reference buffers through a frozen query hash.
#[derive(Debug)]
pub struct SequenceScanner<'h> {
    hash: &'h QueryHash,
    min_block: usize,
    scratch: SplitScratch,
    stats: ScanStats,
}

impl<'h> SequenceScanner<'h> {
    pub fn new(hash: &'h QueryHash) -> Self {
        Self {
            hash,
            min_block: hash.params().window_size,
            scratch: SplitScratch::default(),
            stats: ScanStats::default(),
        }
    }

    /// Shortest direct run worth re-priming the exact key for.
    pub fn with_min_block(mut self, min_block: usize) -> Self {
        self.min_block = min_block.max(1);
        self
    }

    /// Totals over every buffer scanned so far.
    pub fn stats(&self) -> &ScanStats {
        &self.stats
    }

    pub fn scan<C: MatchCollector>(&mut self, reference: &ReferenceBuffer<'_>, collector: &mut C) -> ScanStats {
        self.scan_with(reference, &NoSubstitution, collector)
    }

    /// Scan one buffer, applying `substitution` to every base first.
    pub fn scan_with<S, C>(&mut self, reference: &ReferenceBuffer<'_>, substitution: &S, collector: &mut C) -> ScanStats
    where
        S: BaseSubstitution + ?Sized,
        C: MatchCollector,
    {
        let hash = self.hash;
        let params = hash.params();
        let codes: Vec<u8> = reference
            .bases
            .iter()
            .enumerate()
            .map(|(i, &b)| substitution.substitute(reference.offset + i as u64, iupac_to_ncbi4na(b)))
            .collect();
        let map = build_range_map(
            &codes,
            &RangeMapParams {
                window: params.window_size,
                skip: hash.skip_offsets(),
                max_ambiguities: params.max_ambiguities,
                max_alternatives: params.max_alternatives,
                min_block: self.min_block,
            },
        );

        let mut stats = ScanStats {
            buffers: 1,
            bases: codes.len(),
            ..ScanStats::default()
        };
        let mut probe = Probe {
            hash,
            scratch: &mut self.scratch,
            stats: &mut stats,
            bounds: reference.bounds(),
            collector,
        };
        for segment in &map {
            match segment.class {
                RangeClass::Skip => probe.stats.skipped += segment.len(),
                RangeClass::Direct => scan_direct(&codes, segment, &mut probe),
                RangeClass::Iterate => scan_iterate(&codes, segment, &mut probe),
            }
        }

        debug!(
            reference = reference.name,
            bases = stats.bases,
            segments = map.len(),
            direct = stats.direct,
            iterate = stats.iterate,
            skipped = stats.skipped,
            probes = stats.probes,
            hits = stats.hits,
            "reference scanned"
        );
        self.stats.merge(&stats);
        stats
    }
}

/// Everything needed to probe one key and report its hits.
struct Probe<'a, 'h, C> {
    hash: &'h QueryHash,
    scratch: &'a mut SplitScratch,
    stats: &'a mut ScanStats,
    bounds: RefBounds,
    collector: &'a mut C,
}

impl<C: MatchCollector> Probe<'_, '_, C> {
    /// Probe a hashed key (skip positions already removed) for the
    /// reference window starting at local position `pos`.
    fn key(&mut self, key: Key2, pos: usize) {
        let hash = self.hash;
        let params = hash.params();
        let window_pos = self.bounds.start as i64 + pos as i64;
        self.stats.probes += 1;
        let stats = &mut *self.stats;
        let collector = &mut *self.collector;
        let bounds = self.bounds;
        if params.split_words() {
            let hl = params.hashed_len();
            let wl = params.word_len();
            let key0 = key >> (2 * (hl - wl));
            let key1 = key & key_mask2(wl);
            stats.hits += hash.index().lookup_split(key0, key1, self.scratch, |first, _| {
                collector.collect(first, bounds, hash.anchor(first, window_pos));
            });
        } else {
            stats.hits += hash.index().lookup(key, |atom| {
                collector.collect(atom, bounds, hash.anchor(atom, window_pos));
            });
        }
    }
}

/// Exact 2-bit scan of a run without ambiguous hashed bases.
///
/// The complexity filter slides with the key when every window base is
/// hashed; with skip positions it is scored on the hashed bases alone, the
/// same sequence the query side screens.
fn scan_direct<C: MatchCollector>(codes: &[u8], segment: &RangeSegment, probe: &mut Probe<'_, '_, C>) {
    let hash = probe.hash;
    let params = hash.params();
    let w = params.window_size;
    let hl = params.hashed_len();
    let stride = params.stride;
    let skip = hash.skip_offsets();
    let max_complexity = params.max_complexity;
    let sliding = skip.is_empty() && max_complexity.is_some();

    let first: Vec<u8> = codes[segment.start..segment.start + w]
        .iter()
        .map(|&c| ncbi4na_to_ncbi2na(c))
        .collect();
    let mut key = pack_ncbi2na(&first);
    let mut filter = ComplexityFilter::from_codes(&first);

    for pos in segment.start..segment.end {
        if pos > segment.start {
            let incoming = ncbi4na_to_ncbi2na(codes[pos + w - 1]);
            key = push_base2(key, incoming, w);
            if sliding && w >= 3 {
                let out = &codes[pos - 1..pos + 2];
                filter.remove(triplet_id(
                    ncbi4na_to_ncbi2na(out[0]),
                    ncbi4na_to_ncbi2na(out[1]),
                    ncbi4na_to_ncbi2na(out[2]),
                ));
                let inc = &codes[pos + w - 3..pos + w];
                filter.add(triplet_id(
                    ncbi4na_to_ncbi2na(inc[0]),
                    ncbi4na_to_ncbi2na(inc[1]),
                    ncbi4na_to_ncbi2na(inc[2]),
                ));
            }
        }
        probe.stats.direct += 1;
        if pos % stride != 0 {
            continue;
        }
        let hashed = drop_positions2(key, w, skip);
        let passes = if max_complexity.is_none() {
            true
        } else if sliding {
            filter.passes(max_complexity)
        } else {
            ComplexityFilter::from_codes(&unpack_ncbi2na(hashed, hl)).passes(max_complexity)
        };
        if !passes {
            probe.stats.low_complexity += 1;
            continue;
        }
        probe.key(hashed, pos);
    }
}

fn scan_iterate<C: MatchCollector>(codes: &[u8], segment: &RangeSegment, probe: &mut Probe<'_, '_, C>) {
    let hash = probe.hash;
    let params = hash.params();
    let w = params.window_size;
    let stride = params.stride;
    let hl = params.hashed_len();
    let skip = hash.skip_offsets();
    let table = hash.permutations();

    let mut window = pack_ncbi4na(&codes[segment.start..segment.start + w]);
    for pos in segment.start..segment.end {
        if pos > segment.start {
            window = push_base4(window, codes[pos + w - 1], w);
        }
        probe.stats.iterate += 1;
        if pos % stride != 0 {
            continue;
        }
        let hashed = drop_positions4(window, w, skip);
        table.for_each_key(hashed, hl, 0, &mut |key, _| probe.key(key, pos));
    }
}
