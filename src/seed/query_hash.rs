//! Query hash construction.
//!
//! Every query component contributes a few windows (slots at
//! `window_start + k * window_size`, each repeated for `stride` consecutive
//! starts). A window is converted to ncbi4na, screened for length, ambiguity
//! and complexity, expanded into insertion/deletion variants, oriented per
//! strand, optionally bisulfite-converted, and finally every unambiguous key
//! within the mismatch budget is inserted into the word hash.
//!
//! Lifecycle: [`QueryHashBuilder`] (empty or collecting) →
//! [`QueryHashBuilder::finalize`] → [`QueryHash`] (read-only) →
//! [`QueryHash::clear`] → empty builder.

use std::sync::Arc;

use tracing::{debug, info, trace};

use super::hash_atom::{HashAtom, IndelState, Strand};
use super::permutator::PermutationTable;
use super::query::{QueryArena, QueryId, QueryRecord, RejectReason};
use super::word_hash::{WordHashBuilder, WordHashIndex};
use crate::config::hash_params::{ConfigError, HashParams, IndelPolicy};
use crate::core::packed_window::{
    alternative_count, count_ambiguous, drop_positions4, pack_ncbi4na, reverse_complement4, sub_window4,
    unpack_ncbi2na, window4_to_key2, Window4,
};
use crate::core::seq_coding::{Coding, NCBI4NA_A, NCBI4NA_ANY, NCBI4NA_C, NCBI4NA_G, NCBI4NA_T};
use crate::utils::complexity::ComplexityFilter;

/// Upper bound on the per-window reservation, whatever the budgets.
const MAX_RESERVE_PER_WINDOW: usize = 1 << 12;

/// Counters collected while hashing queries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub queries: usize,
    pub components: usize,
    pub windows: usize,
    pub variants: usize,
    pub not_enumerable: usize,
    pub too_short: usize,
    pub low_quality: usize,
    pub low_complexity: usize,
    pub entries: usize,
}

impl BuildStats {
    pub fn rejected(&self) -> usize {
        self.too_short + self.low_quality + self.low_complexity
    }

    fn count_rejection(&mut self, reason: RejectReason) {
        match reason {
            RejectReason::TooShort => self.too_short += 1,
            RejectReason::LowQuality => self.low_quality += 1,
            RejectReason::LowComplexity => self.low_complexity += 1,
        }
    }
}

/// One W-base window derived from the query, ready for enumeration.
#[derive(Debug, Clone, Copy)]
struct WindowVariant {
    window: Window4,
    indel: IndelState,
    indel_len: u32,
    budget: u32,
}

/// Posting fields shared by every key of one window.
#[derive(Debug, Clone, Copy)]
struct Origin {
    query: QueryId,
    mate: u8,
    offset: u16,
}

/// Number of distinct keys within `mismatches` substitutions of a
/// `bases`-long unambiguous word.
pub fn neighbourhood_size(bases: usize, mismatches: u32) -> usize {
    let mut total = 0usize;
    let mut choose = 1usize;
    let mut power = 1usize;
    for k in 0..=mismatches.min(bases as u32) as usize {
        if k > 0 {
            choose = choose.saturating_mul(bases - k + 1) / k;
            power = power.saturating_mul(3);
        }
        total = total.saturating_add(choose.saturating_mul(power));
    }
    total
}

/// Mutable query hash: accepts queries until finalized.
#[derive(Debug)]
pub struct QueryHashBuilder {
    params: HashParams,
    skip_offsets: Vec<usize>,
    table: Arc<PermutationTable>,
    words: WordHashBuilder,
    lengths: Vec<[u32; 2]>,
    stats: BuildStats,
}

impl QueryHashBuilder {
    pub fn new(params: HashParams) -> Result<Self, ConfigError> {
        params.validate()?;
        let table = PermutationTable::shared(params.max_mismatches, params.max_alternatives);
        let words = WordHashBuilder::new(params.resolved_index_bits());
        Ok(Self {
            skip_offsets: params.skip_offsets(),
            params,
            table,
            words,
            lengths: Vec::new(),
            stats: BuildStats::default(),
        })
    }

    /// Change the table shape. Only allowed before the first insert.
    pub fn reconfigure(&mut self, params: HashParams) -> Result<(), ConfigError> {
        if !self.is_empty() {
            return Err(ConfigError::TableNotEmpty);
        }
        *self = Self::new(params)?;
        Ok(())
    }

    pub fn params(&self) -> &HashParams {
        &self.params
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty() && self.stats.queries == 0
    }

    /// Postings inserted so far (duplicates included).
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Estimated postings produced by one hashed window.
    pub fn entries_per_window(&self) -> usize {
        let p = &self.params;
        let w = p.window_size;
        let words = if p.split_words() { 2 } else { 1 };
        let per_word = |indel_bases: u32| {
            p.mismatch_budget(indel_bases)
                .map_or(0, |budget| neighbourhood_size(p.word_len(), budget))
        };
        let mut total = per_word(0);
        for k in 1..=p.max_insertions {
            total = total.saturating_add(self.indel_positions(w - 1).len().saturating_mul(per_word(k)));
        }
        for k in 1..=p.max_deletions {
            let interior = w.saturating_sub(k as usize + 1);
            // each inserted N expands to four keys
            let expansion = 4usize.pow(k);
            total = total.saturating_add(
                self.indel_positions(interior)
                    .len()
                    .saturating_mul(per_word(k))
                    .saturating_mul(expansion),
            );
        }
        let conversions = if p.bisulfite { 2 } else { 1 };
        total
            .saturating_mul(words)
            .saturating_mul(p.strands.count())
            .saturating_mul(conversions)
    }

    fn indel_positions(&self, interior_max: usize) -> Vec<usize> {
        match self.params.indel_policy {
            IndelPolicy::Anywhere => (1..=interior_max).collect(),
            IndelPolicy::Fixed(p) if p >= 1 && p <= interior_max => vec![p],
            IndelPolicy::Fixed(_) => Vec::new(),
        }
    }

    /// Length in bases of a hashed query component.
    pub fn component_len(&self, id: QueryId, mate: u8) -> usize {
        self.lengths.get(id.index()).map_or(0, |l| l[mate as usize & 1] as usize)
    }

    /// Hash every window of every query in the arena.
    pub fn add_arena<Q: QueryRecord>(&mut self, arena: &mut QueryArena<Q>) -> usize {
        let ids: Vec<QueryId> = arena.ids().collect();
        ids.into_iter().map(|id| self.add_query(id, &mut arena[id])).sum()
    }

    /// Hash the windows of one query. Windows that fail the length,
    /// ambiguity or complexity screens are reported through
    /// [`QueryRecord::mark_rejected`] and skipped.
    ///
    /// Returns the number of postings inserted.
    pub fn add_query<Q: QueryRecord + ?Sized>(&mut self, id: QueryId, query: &mut Q) -> usize {
        let before = self.words.len();
        self.stats.queries += 1;
        if self.lengths.len() <= id.index() {
            self.lengths.resize(id.index() + 1, [0, 0]);
        }
        for mate in 0..query.components().min(2) {
            let slice = query.component(mate);
            let coding = slice.coding;
            let codes = slice.to_ncbi4na(self.params.quality_threshold);
            self.lengths[id.index()][mate] = codes.len().min(u32::MAX as usize) as u32;
            self.stats.components += 1;

            let starts = self.window_starts(&codes, coding);
            if starts.is_empty() {
                self.reject(id, query, RejectReason::TooShort);
                continue;
            }
            self.words
                .reserve(starts.len() * self.entries_per_window().min(MAX_RESERVE_PER_WINDOW));
            for pos in starts {
                let origin = Origin {
                    query: id,
                    mate: mate as u8,
                    offset: pos as u16,
                };
                if let Err(reason) = self.add_window(&codes, coding, pos, origin) {
                    self.reject(id, query, reason);
                }
            }
        }
        let added = self.words.len() - before;
        self.stats.entries += added;
        added
    }

    fn reject<Q: QueryRecord + ?Sized>(&mut self, id: QueryId, query: &mut Q, reason: RejectReason) {
        trace!(query = %id, %reason, "window rejected");
        self.stats.count_rejection(reason);
        query.mark_rejected(reason);
    }

    /// Window starts of one component, after start optimisation.
    fn window_starts(&self, codes: &[u8], coding: Coding) -> Vec<usize> {
        let p = &self.params;
        let w = p.window_size;
        let len = codes.len().min(u16::MAX as usize + w);
        let mut starts = Vec::new();
        let mut slot = 0usize;
        loop {
            if p.window_count != 0 && slot >= p.window_count {
                break;
            }
            let base = p.window_start + slot * w;
            if base + w > len || base > u16::MAX as usize {
                break;
            }
            if p.stride == 1 {
                let best = if p.optimize_window_start {
                    self.optimal_start(codes, base, coding.optimizable_offset())
                } else {
                    base
                };
                starts.push(best);
            } else {
                starts.extend(
                    (base..base + p.stride).take_while(|&s| s + w <= len && s <= u16::MAX as usize),
                );
            }
            slot += 1;
        }
        starts
    }

    /// Shift `base` forward by at most `max_shift` to the window with the
    /// fewest ambiguous bases, then the fewest alternatives.
    fn optimal_start(&self, codes: &[u8], base: usize, max_shift: usize) -> usize {
        let w = self.params.window_size;
        (base..=base + max_shift)
            .take_while(|&s| s + w <= codes.len() && s <= u16::MAX as usize)
            .min_by_key(|&s| {
                let window = pack_ncbi4na(&codes[s..s + w]);
                (count_ambiguous(window, w), alternative_count(window, w))
            })
            .unwrap_or(base)
    }

    /// Screen one window and hash all its variants.
    fn add_window(&mut self, codes: &[u8], coding: Coding, pos: usize, origin: Origin) -> Result<(), RejectReason> {
        let p = &self.params;
        let w = p.window_size;
        let window = pack_ncbi4na(&codes[pos..pos + w]);
        let hashed = drop_positions4(window, w, &self.skip_offsets);
        let hl = p.hashed_len();

        if count_ambiguous(hashed, hl) > p.max_ambiguities || alternative_count(hashed, hl) > p.max_alternatives {
            return Err(RejectReason::LowQuality);
        }
        if p.max_complexity.is_some() {
            let representative = unpack_ncbi2na(window4_to_key2(hashed, hl), hl);
            if !ComplexityFilter::from_codes(&representative).passes(p.max_complexity) {
                return Err(RejectReason::LowComplexity);
            }
        }

        self.stats.windows += 1;
        let variants = self.variants(codes, pos);
        let mut enumerated = 0usize;
        for variant in &variants {
            self.stats.variants += 1;
            if self.hash_variant(variant, coding, origin) {
                enumerated += 1;
            } else {
                self.stats.not_enumerable += 1;
            }
        }
        if enumerated == 0 {
            return Err(RejectReason::LowQuality);
        }
        Ok(())
    }

    /// The plain window plus every insertion and deletion variant at `pos`.
    fn variants(&self, codes: &[u8], pos: usize) -> Vec<WindowVariant> {
        let p = &self.params;
        let w = p.window_size;
        let mut out = Vec::new();
        if let Some(budget) = p.mismatch_budget(0) {
            out.push(WindowVariant {
                window: pack_ncbi4na(&codes[pos..pos + w]),
                indel: IndelState::None,
                indel_len: 0,
                budget,
            });
        }

        // query carries k extra bases: drop them from a longer span
        for k in 1..=p.max_insertions as usize {
            let Some(budget) = p.mismatch_budget(k as u32) else { continue };
            if pos + w + k > codes.len() {
                break;
            }
            let span = &codes[pos..pos + w + k];
            for at in self.indel_positions(w - 1) {
                let window = span[..at]
                    .iter()
                    .chain(&span[at + k..])
                    .fold(0 as Window4, |acc, &c| (acc << 4) | c as Window4);
                out.push(WindowVariant {
                    window,
                    indel: IndelState::Insertion,
                    indel_len: k as u32,
                    budget,
                });
            }
        }

        // query lacks k bases: pad a shorter span with any-base codes
        for k in 1..=p.max_deletions as usize {
            let Some(budget) = p.mismatch_budget(k as u32) else { continue };
            if w < k + 2 {
                break;
            }
            let span = &codes[pos..pos + w - k];
            for at in self.indel_positions(w - k - 1) {
                let window = span[..at]
                    .iter()
                    .chain(std::iter::repeat(&NCBI4NA_ANY).take(k))
                    .chain(&span[at..])
                    .fold(0 as Window4, |acc, &c| (acc << 4) | c as Window4);
                out.push(WindowVariant {
                    window,
                    indel: IndelState::Deletion,
                    indel_len: k as u32,
                    budget,
                });
            }
        }
        out
    }

    /// Insert every key of one variant on each requested strand.
    /// Returns `false` when no conversion of the variant could be enumerated.
    fn hash_variant(&mut self, variant: &WindowVariant, coding: Coding, origin: Origin) -> bool {
        let w = self.params.window_size;
        let strands = self.params.strands;
        let mut any = false;
        for strand in [Strand::Forward, Strand::Reverse] {
            let oriented = match strand {
                Strand::Forward if strands.forward() => variant.window,
                Strand::Reverse if strands.reverse() => reverse_complement4(variant.window, w),
                _ => continue,
            };
            let atom = HashAtom::new(origin.query, origin.offset, strand)
                .with_pairmate(origin.mate)
                .with_indel(variant.indel, variant.indel_len);
            if self.params.bisulfite {
                let tc = bisulfite_t_to_c(oriented, w);
                any |= self.hash_window(tc, atom, variant.budget);
                if coding != Coding::Colorspace {
                    let ag = bisulfite_a_to_g(oriented, w);
                    if ag != tc {
                        any |= self.hash_window(ag, atom, variant.budget);
                    }
                }
            } else {
                any |= self.hash_window(oriented, atom, variant.budget);
            }
        }
        any
    }

    /// Drop skip positions and enumerate the keys of one oriented window.
    fn hash_window(&mut self, window: Window4, atom: HashAtom, budget: u32) -> bool {
        let hl = self.params.hashed_len();
        let hashed = drop_positions4(window, self.params.window_size, &self.skip_offsets);
        let table = &self.table;
        let words = &mut self.words;
        if !self.params.split_words() {
            return table.for_each_key(hashed, hl, budget, &mut |key, mismatches| {
                words.insert(key, atom.with_word(0).with_mismatches(mismatches));
            });
        }
        let wl = self.params.word_len();
        let halves = [sub_window4(hashed, hl, 0, wl), sub_window4(hashed, hl, hl - wl, wl)];
        let mut ok = true;
        for (word, half) in halves.into_iter().enumerate() {
            ok &= table.for_each_key(half, wl, budget, &mut |key, mismatches| {
                words.insert(key, atom.with_word(word as u8).with_mismatches(mismatches));
            });
        }
        ok
    }

    /// Sort the postings and freeze the hash.
    pub fn finalize(self) -> QueryHash {
        let index = self.words.finalize();
        let s = &self.stats;
        info!(
            queries = s.queries,
            windows = s.windows,
            variants = s.variants,
            rejected = s.rejected(),
            too_short = s.too_short,
            low_quality = s.low_quality,
            low_complexity = s.low_complexity,
            postings = index.len(),
            "query hash ready"
        );
        if s.not_enumerable > 0 {
            debug!(not_enumerable = s.not_enumerable, "variants exceeded the alternative limit");
        }
        QueryHash {
            params: self.params,
            skip_offsets: self.skip_offsets,
            table: self.table,
            index,
            lengths: self.lengths,
            stats: self.stats,
        }
    }
}

/// Read-only query hash shared by scanners.
#[derive(Debug)]
pub struct QueryHash {
    params: HashParams,
    skip_offsets: Vec<usize>,
    table: Arc<PermutationTable>,
    index: WordHashIndex,
    lengths: Vec<[u32; 2]>,
    stats: BuildStats,
}

impl QueryHash {
    pub fn params(&self) -> &HashParams {
        &self.params
    }

    /// 0-based window positions left out of the key.
    pub fn skip_offsets(&self) -> &[usize] {
        &self.skip_offsets
    }

    pub fn permutations(&self) -> &PermutationTable {
        &self.table
    }

    pub fn index(&self) -> &WordHashIndex {
        &self.index
    }

    pub fn stats(&self) -> &BuildStats {
        &self.stats
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn component_len(&self, id: QueryId, mate: u8) -> usize {
        self.lengths.get(id.index()).map_or(0, |l| l[mate as usize & 1] as usize)
    }

    /// Reference coordinate of the first query base (strand oriented) for a
    /// window hit whose reference window starts at `window_pos`.
    pub fn anchor(&self, atom: &HashAtom, window_pos: i64) -> i64 {
        match atom.strand() {
            Strand::Forward => window_pos - atom.offset() as i64,
            Strand::Reverse => {
                let qlen = self.component_len(atom.query(), atom.pairmate()) as i64;
                let span = atom.query_span(self.params.window_size) as i64;
                window_pos - (qlen - atom.offset() as i64 - span)
            }
        }
    }

    /// Drop every posting and return an empty builder with the same parameters.
    pub fn clear(self) -> QueryHashBuilder {
        QueryHashBuilder {
            words: self.index.clear(),
            skip_offsets: self.skip_offsets,
            params: self.params,
            table: self.table,
            lengths: Vec::new(),
            stats: BuildStats::default(),
        }
    }
}

/// Bases that may read as T also read as C (C→T conversion on the reference).
fn bisulfite_t_to_c(window: Window4, len: usize) -> Window4 {
    convert_nibbles(window, len, NCBI4NA_T, NCBI4NA_C)
}

/// Bases that may read as A also read as G.
fn bisulfite_a_to_g(window: Window4, len: usize) -> Window4 {
    convert_nibbles(window, len, NCBI4NA_A, NCBI4NA_G)
}

fn convert_nibbles(window: Window4, len: usize, from: u8, add: u8) -> Window4 {
    (0..len).fold(0, |acc, i| {
        let code = ((window >> (4 * (len - 1 - i))) & 0x0F) as u8;
        let code = if code & from != 0 { code | add } else { code };
        (acc << 4) | code as Window4
    })
}
