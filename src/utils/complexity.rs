//! Running low-complexity score over overlapping base triplets.
//!
//! Same triplet bookkeeping as symmetric DUST: a window of `L` bases holds
//! `L - 2` overlapping triplets, each encoded in 6 bits (ncbi2na), and the
//! score is `sum(c * (c - 1) / 2)` over the 64 triplet counts. Adding or
//! removing one triplet changes the score by the old count (add) or the new
//! count (remove), so the score follows a sliding window in O(1).

/// Number of distinct triplets (4^3).
pub const TRIPLET_COUNT: usize = 64;

#[inline]
pub fn triplet_id(b0: u8, b1: u8, b2: u8) -> u8 {
    ((b0 & 3) << 4) | ((b1 & 3) << 2) | (b2 & 3)
}

/// Next triplet after appending one ncbi2na base.
#[inline]
pub fn shift_triplet(prev: u8, base: u8) -> u8 {
    ((prev << 2) & 0x3F) | (base & 3)
}

#[derive(Debug, Clone)]
pub struct ComplexityFilter {
    counts: [u16; TRIPLET_COUNT],
    triplets: usize,
    score: u32,
}

impl Default for ComplexityFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ComplexityFilter {
    pub fn new() -> Self {
        Self {
            counts: [0; TRIPLET_COUNT],
            triplets: 0,
            score: 0,
        }
    }

    /// Filter holding every triplet of a run of ncbi2na codes.
    pub fn from_codes(codes: &[u8]) -> Self {
        let mut filter = Self::new();
        for w in codes.windows(3) {
            filter.add(triplet_id(w[0], w[1], w[2]));
        }
        filter
    }

    #[inline]
    pub fn add(&mut self, triplet: u8) {
        let idx = (triplet & 0x3F) as usize;
        self.score += self.counts[idx] as u32;
        self.counts[idx] += 1;
        self.triplets += 1;
    }

    #[inline]
    pub fn remove(&mut self, triplet: u8) {
        let idx = (triplet & 0x3F) as usize;
        debug_assert!(self.counts[idx] > 0, "removing absent triplet {}", idx);
        self.counts[idx] -= 1;
        self.score -= self.counts[idx] as u32;
        self.triplets -= 1;
    }

    /// Window length in bases.
    #[inline]
    pub fn window_len(&self) -> usize {
        if self.triplets == 0 {
            0
        } else {
            self.triplets + 2
        }
    }

    /// Current score; zero until the window spans more than three bases.
    #[inline]
    pub fn score(&self) -> u32 {
        if self.window_len() > 3 {
            self.score
        } else {
            0
        }
    }

    /// `true` when the score stays within `max_score` (or no limit is set).
    #[inline]
    pub fn passes(&self, max_score: Option<u32>) -> bool {
        max_score.map_or(true, |max| self.score() <= max)
    }

    pub fn clear(&mut self) {
        self.counts = [0; TRIPLET_COUNT];
        self.triplets = 0;
        self.score = 0;
    }
}
