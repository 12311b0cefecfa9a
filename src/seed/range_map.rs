//! Classification of reference window starts by ambiguity load.
//!
//! Position `p` stands for the window `[p, p + window)`. Windows without
//! ambiguous bases are scanned directly, windows within the ambiguity and
//! alternative limits are enumerated, the rest are skipped. Skip positions
//! never reach the key and are left out of the counts.

use crate::core::seq_coding::NCBI4NA_CARDINALITY;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeClass {
    Skip,
    Direct,
    Iterate,
}

/// Window starts `start..end` sharing one class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeSegment {
    pub start: usize,
    pub end: usize,
    pub class: RangeClass,
}

impl RangeSegment {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end == self.start
    }
}

/// Live per-cardinality base counts of the current window.
#[derive(Debug, Clone, Copy, Default)]
struct AmbiguityCounts {
    empty: u32,
    two: u32,
    three: u32,
    four: u32,
}

impl AmbiguityCounts {
    #[inline]
    fn slot(&mut self, code: u8) -> Option<&mut u32> {
        match NCBI4NA_CARDINALITY[(code & 0x0F) as usize] {
            0 => Some(&mut self.empty),
            2 => Some(&mut self.two),
            3 => Some(&mut self.three),
            4 => Some(&mut self.four),
            _ => None,
        }
    }

    #[inline]
    fn add(&mut self, code: u8) {
        if let Some(c) = self.slot(code) {
            *c += 1;
        }
    }

    #[inline]
    fn remove(&mut self, code: u8) {
        if let Some(c) = self.slot(code) {
            *c -= 1;
        }
    }

    #[inline]
    fn ambiguous(&self) -> usize {
        (self.empty + self.two + self.three + self.four) as usize
    }

    #[inline]
    fn alternatives(&self) -> u64 {
        2u64.saturating_pow(self.two)
            .saturating_mul(3u64.saturating_pow(self.three))
            .saturating_mul(4u64.saturating_pow(self.four))
    }

    fn classify(&self, max_ambiguities: usize, max_alternatives: u64) -> RangeClass {
        let ambiguous = self.ambiguous();
        if ambiguous == 0 {
            RangeClass::Direct
        } else if ambiguous <= max_ambiguities && self.alternatives() <= max_alternatives {
            RangeClass::Iterate
        } else {
            RangeClass::Skip
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RangeMapParams<'a> {
    pub window: usize,
    /// Window offsets excluded from hashing (0-based, ascending).
    pub skip: &'a [usize],
    pub max_ambiguities: usize,
    pub max_alternatives: u64,
    /// Direct runs shorter than this next to an iterate run are enumerated instead.
    pub min_block: usize,
}

/// Segment the window starts of `codes` (ncbi4na).
pub fn build_range_map(codes: &[u8], params: &RangeMapParams<'_>) -> Vec<RangeSegment> {
    let w = params.window;
    if w == 0 || codes.len() < w {
        return Vec::new();
    }
    let positions = codes.len() - w + 1;
    let runs = hashed_runs(w, params.skip);
    let mut counts = AmbiguityCounts::default();
    for &(a, b) in &runs {
        codes[a..b].iter().for_each(|&c| counts.add(c));
    }

    let mut segments: Vec<RangeSegment> = Vec::new();
    for p in 0..positions {
        if p > 0 {
            for &(a, b) in &runs {
                counts.remove(codes[p - 1 + a]);
                counts.add(codes[p - 1 + b]);
            }
        }
        let class = counts.classify(params.max_ambiguities, params.max_alternatives);
        match segments.last_mut() {
            Some(last) if last.class == class => last.end = p + 1,
            _ => segments.push(RangeSegment {
                start: p,
                end: p + 1,
                class,
            }),
        }
    }

    absorb_short_direct(&mut segments, params.min_block);
    merge_neighbours(segments)
}

/// Maximal runs `[a, b)` of window offsets that contribute to the key.
fn hashed_runs(window: usize, skip: &[usize]) -> Vec<(usize, usize)> {
    let mut runs = Vec::with_capacity(skip.len() + 1);
    let mut start = 0;
    for &s in skip.iter().filter(|&&s| s < window) {
        if s > start {
            runs.push((start, s));
        }
        start = s + 1;
    }
    if start < window {
        runs.push((start, window));
    }
    runs
}

fn absorb_short_direct(segments: &mut [RangeSegment], min_block: usize) {
    for i in 0..segments.len() {
        if segments[i].class != RangeClass::Direct || segments[i].len() >= min_block {
            continue;
        }
        let touches_iterate = (i > 0 && segments[i - 1].class == RangeClass::Iterate)
            || segments.get(i + 1).is_some_and(|s| s.class == RangeClass::Iterate);
        if touches_iterate {
            segments[i].class = RangeClass::Iterate;
        }
    }
}

fn merge_neighbours(segments: Vec<RangeSegment>) -> Vec<RangeSegment> {
    let mut merged: Vec<RangeSegment> = Vec::with_capacity(segments.len());
    for seg in segments {
        match merged.last_mut() {
            Some(last) if last.class == seg.class && last.end == seg.start => last.end = seg.end,
            _ => merged.push(seg),
        }
    }
    merged
}
