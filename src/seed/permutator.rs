//! Mismatch/ambiguity permutation tables.
//!
//! For every ncbi4na pattern of 1 to 4 bases the table lists the unambiguous
//! ncbi2na codes of the same length that differ from it in at most
//! `max_mismatches` bases, sorted by mismatch count. Longer windows are split
//! into 4-base quadrants whose lists are combined recursively; because each
//! list is sorted, a branch stops at the first entry that would exceed the
//! remaining budget.
//!
//! Storage mirrors a direct-address lookup: one offsets array per base count
//! (`16^bases + 1` entries) into a flat entry array.

use std::sync::{Arc, Mutex, OnceLock, Weak};

use rustc_hash::FxHashMap;

use crate::core::packed_window::{sub_window4, Key2, Window4, MAX_WINDOW_BASES};
use crate::core::seq_coding::NCBI4NA_CARDINALITY;

/// Bases covered by one table lookup.
pub const QUADRANT_BASES: usize = 4;
const MAX_QUADRANTS: usize = MAX_WINDOW_BASES / QUADRANT_BASES;

/// One unambiguous code compatible with a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PermEntry {
    /// ncbi2na code, first base most significant.
    pub code: u8,
    pub mismatches: u8,
}

#[derive(Debug, Default)]
struct Level {
    offsets: Vec<u32>,
    entries: Vec<PermEntry>,
    alternatives: Vec<u16>,
}

#[derive(Debug)]
pub struct PermutationTable {
    max_mismatches: u32,
    max_alternatives: u64,
    levels: [Level; QUADRANT_BASES],
}

#[inline]
fn nibble_mismatch(nibble: u8, code: u8) -> u32 {
    ((nibble >> code) & 1 == 0) as u32
}

fn enumerate_codes(
    value: usize,
    bases: usize,
    i: usize,
    code: u8,
    mismatches: u32,
    limit: u32,
    out: &mut Vec<PermEntry>,
) {
    if i == bases {
        out.push(PermEntry {
            code,
            mismatches: mismatches as u8,
        });
        return;
    }
    let nibble = ((value >> (4 * (bases - 1 - i))) & 0x0F) as u8;
    for c in 0..4u8 {
        let m = mismatches + nibble_mismatch(nibble, c);
        if m <= limit {
            enumerate_codes(value, bases, i + 1, (code << 2) | c, m, limit, out);
        }
    }
}

fn pattern_alternatives(value: usize, bases: usize) -> u16 {
    (0..bases).fold(1u16, |acc, i| {
        let nibble = (value >> (4 * i)) & 0x0F;
        acc * NCBI4NA_CARDINALITY[nibble].max(1) as u16
    })
}

impl PermutationTable {
    pub fn new(max_mismatches: u32, max_alternatives: u64) -> Self {
        let mut levels: [Level; QUADRANT_BASES] = Default::default();
        let mut scratch = Vec::with_capacity(256);
        for (idx, level) in levels.iter_mut().enumerate() {
            let bases = idx + 1;
            let values = 1usize << (4 * bases);
            let limit = max_mismatches.min(bases as u32);
            level.offsets.reserve(values + 1);
            level.alternatives.reserve(values);
            for value in 0..values {
                let alternatives = pattern_alternatives(value, bases);
                level.alternatives.push(alternatives);
                level.offsets.push(level.entries.len() as u32);
                if alternatives as u64 > max_alternatives {
                    continue;
                }
                scratch.clear();
                enumerate_codes(value, bases, 0, 0, 0, limit, &mut scratch);
                scratch.sort_by_key(|e| (e.mismatches, e.code));
                level.entries.extend_from_slice(&scratch);
            }
            level.offsets.push(level.entries.len() as u32);
        }
        Self {
            max_mismatches,
            max_alternatives,
            levels,
        }
    }

    /// Process-wide table for a parameter pair, built on first use.
    ///
    /// The cache holds weak references: a table lives as long as some
    /// builder or frozen hash uses it, and parameter pairs nobody holds any
    /// more are pruned on the next call.
    pub fn shared(max_mismatches: u32, max_alternatives: u64) -> Arc<PermutationTable> {
        static TABLES: OnceLock<Mutex<FxHashMap<(u32, u64), Weak<PermutationTable>>>> = OnceLock::new();
        let tables = TABLES.get_or_init(|| Mutex::new(FxHashMap::default()));
        let mut guard = tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.retain(|_, table| table.strong_count() > 0);
        let key = (max_mismatches, max_alternatives);
        if let Some(table) = guard.get(&key).and_then(Weak::upgrade) {
            return table;
        }
        let table = Arc::new(PermutationTable::new(max_mismatches, max_alternatives));
        guard.insert(key, Arc::downgrade(&table));
        table
    }

    pub fn max_mismatches(&self) -> u32 {
        self.max_mismatches
    }

    pub fn max_alternatives(&self) -> u64 {
        self.max_alternatives
    }

    /// Compatible codes of a 1..=4 base pattern, ascending by mismatches.
    /// Empty when the pattern has more alternatives than the table allows.
    #[inline]
    pub fn entries_for(&self, value: Window4, bases: usize) -> &[PermEntry] {
        let level = &self.levels[bases - 1];
        let v = value as usize;
        &level.entries[level.offsets[v] as usize..level.offsets[v + 1] as usize]
    }

    #[inline]
    pub fn pattern_alternatives(&self, value: Window4, bases: usize) -> u64 {
        self.levels[bases - 1].alternatives[value as usize] as u64
    }

    #[inline]
    pub fn is_enumerated(&self, value: Window4, bases: usize) -> bool {
        self.pattern_alternatives(value, bases) <= self.max_alternatives
    }

    fn quadrants(window: Window4, len: usize) -> ([(Window4, usize); MAX_QUADRANTS], usize) {
        let mut quads = [(0, 0); MAX_QUADRANTS];
        let mut count = 0;
        let mut start = 0;
        while start < len {
            let bases = QUADRANT_BASES.min(len - start);
            quads[count] = (sub_window4(window, len, start, bases), bases);
            count += 1;
            start += bases;
        }
        (quads, count)
    }

    /// Alternatives of a whole window (saturating product over quadrants).
    pub fn alternatives(&self, window: Window4, len: usize) -> u64 {
        let (quads, count) = Self::quadrants(window, len);
        quads[..count]
            .iter()
            .fold(1u64, |acc, &(v, b)| acc.saturating_mul(self.pattern_alternatives(v, b)))
    }

    /// Call `f(key, mismatches)` for every unambiguous key within `budget`
    /// mismatches of `window`.
    ///
    /// Returns `false` without calling `f` when a quadrant exceeds the
    /// alternative limit and was never enumerated.
    pub fn for_each_key<F>(&self, window: Window4, len: usize, budget: u32, f: &mut F) -> bool
    where
        F: FnMut(Key2, u32),
    {
        debug_assert!(len > 0 && len <= MAX_WINDOW_BASES);
        let (quads, count) = Self::quadrants(window, len);
        if quads[..count].iter().any(|&(v, b)| !self.is_enumerated(v, b)) {
            return false;
        }
        let budget = budget.min(self.max_mismatches);
        self.combine(&quads[..count], 0, 0, budget, f);
        true
    }

    fn combine<F>(&self, quads: &[(Window4, usize)], key: Key2, mismatches: u32, budget: u32, f: &mut F)
    where
        F: FnMut(Key2, u32),
    {
        let Some((&(value, bases), rest)) = quads.split_first() else {
            f(key, mismatches);
            return;
        };
        for entry in self.entries_for(value, bases) {
            let total = mismatches + entry.mismatches as u32;
            if total > budget {
                break;
            }
            let next = (key << (2 * bases)) | entry.code as Key2;
            self.combine(rest, next, total, budget, f);
        }
    }
}
