//! Hashing parameters shared by the query hash builder and the scanner.

use thiserror::Error;

use crate::core::packed_window::MAX_WINDOW_BASES;

/// Largest substitution budget the posting entry can record.
pub const MAX_MISMATCHES: u32 = 7;
/// Largest number of consecutive inserted or deleted bases per window.
pub const MAX_INDEL_BASES: u32 = 2;
/// Widest bucket index (2^28 offsets).
pub const MAX_INDEX_BITS: u32 = 28;
pub const DEFAULT_INDEX_BITS: u32 = 22;
/// Width of the subkey stored in every posting entry.
pub const SUBKEY_BITS: u32 = 16;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("window size {size} is out of range 1..={max}")]
    InvalidWindowSize { size: usize, max: usize },
    #[error("skip position {position} is outside the window of {window} bases or not ascending")]
    InvalidSkipPosition { position: usize, window: usize },
    #[error("skip positions cannot be combined with stride {stride}")]
    SkipWithStride { stride: usize },
    #[error("word size {word} does not fit a hashed window of {hashed} bases (need word <= hashed <= 2 * word)")]
    InvalidWordSize { word: usize, hashed: usize },
    #[error("index bits {bits} exceed the key width of {key_bits} bits (limit {max})")]
    IndexBitsTooWide { bits: u32, key_bits: u32, max: u32 },
    #[error("index bits {bits} leave {residual} subkey bits for a {key_bits}-bit key; at most 16 fit")]
    SubkeyTooWide { bits: u32, key_bits: u32, residual: u32 },
    #[error("stride must be at least 1")]
    InvalidStride,
    #[error("{requested} mismatches requested; at most {max} are supported")]
    TooManyMismatches { requested: u32, max: u32 },
    #[error("{requested} indel bases requested; at most {max} are supported")]
    TooManyIndels { requested: u32, max: u32 },
    #[error("fixed indel position {position} is not inside the window of {window} bases")]
    InvalidIndelPosition { position: usize, window: usize },
    #[error("max alternatives must be at least 1")]
    InvalidAlternatives,
    #[error("hash table shape cannot change after entries were added")]
    TableNotEmpty,
}

/// Strands hashed for every query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrandMask {
    Forward,
    Reverse,
    #[default]
    Both,
}

impl StrandMask {
    pub fn forward(self) -> bool {
        matches!(self, StrandMask::Forward | StrandMask::Both)
    }

    pub fn reverse(self) -> bool {
        matches!(self, StrandMask::Reverse | StrandMask::Both)
    }

    pub fn count(self) -> usize {
        self.forward() as usize + self.reverse() as usize
    }
}

impl std::str::FromStr for StrandMask {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "forward" | "plus" | "+" | "1" => Ok(StrandMask::Forward),
            "reverse" | "minus" | "-" | "2" => Ok(StrandMask::Reverse),
            "both" | "3" => Ok(StrandMask::Both),
            _ => Err(format!("Unknown strand mask: {}. Use 'forward', 'reverse' or 'both'", s)),
        }
    }
}

/// Where indel variants are synthesised inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IndelPolicy {
    /// Every interior position.
    #[default]
    Anywhere,
    /// A single position (0-based base index inside the window).
    Fixed(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct HashParams {
    /// Bases spanned by one query window, skip positions included.
    pub window_size: usize,
    /// Bases per hashed word; `None` hashes the whole window as one word.
    pub word_size: Option<usize>,
    /// Consecutive windows hashed per window slot; the scanner probes every `stride` positions.
    pub stride: usize,
    /// Offset of the first window inside each query component.
    pub window_start: usize,
    /// Window slots per component, 0 = as many as fit.
    pub window_count: usize,
    /// Bucket index width; `None` derives it from the word size.
    pub index_bits: Option<u32>,
    pub strands: StrandMask,
    pub max_mismatches: u32,
    pub max_insertions: u32,
    pub max_deletions: u32,
    /// Mismatches plus indel bases; `None` = no combined limit.
    pub max_distance: Option<u32>,
    pub indel_policy: IndelPolicy,
    /// Ambiguous bases tolerated in a window.
    pub max_ambiguities: usize,
    /// Unambiguous sequences a window may expand to.
    pub max_alternatives: u64,
    /// Highest triplet complexity score admitted; `None` disables the filter.
    pub max_complexity: Option<u32>,
    pub bisulfite: bool,
    /// 1-based window positions left out of the key.
    pub skip_positions: Vec<usize>,
    /// Score threshold for the quality-weighted encodings.
    pub quality_threshold: u8,
    /// Let the window start shift by the codec's optimizable offset.
    pub optimize_window_start: bool,
}

impl Default for HashParams {
    fn default() -> Self {
        Self {
            window_size: 12,
            word_size: None,
            stride: 1,
            window_start: 0,
            window_count: 1,
            index_bits: None,
            strands: StrandMask::Both,
            max_mismatches: 1,
            max_insertions: 0,
            max_deletions: 0,
            max_distance: None,
            indel_policy: IndelPolicy::Anywhere,
            max_ambiguities: 4,
            max_alternatives: 256,
            max_complexity: None,
            bisulfite: false,
            skip_positions: Vec::new(),
            quality_threshold: 10,
            optimize_window_start: false,
        }
    }
}

impl HashParams {
    pub fn with_window(mut self, window_size: usize) -> Self {
        self.window_size = window_size;
        self
    }

    pub fn with_word(mut self, word_size: usize) -> Self {
        self.word_size = Some(word_size);
        self
    }

    pub fn with_mismatches(mut self, max_mismatches: u32) -> Self {
        self.max_mismatches = max_mismatches;
        self
    }

    pub fn with_indels(mut self, max_insertions: u32, max_deletions: u32) -> Self {
        self.max_insertions = max_insertions;
        self.max_deletions = max_deletions;
        self
    }

    pub fn with_strands(mut self, strands: StrandMask) -> Self {
        self.strands = strands;
        self
    }

    pub fn with_index_bits(mut self, bits: u32) -> Self {
        self.index_bits = Some(bits);
        self
    }

    /// Bases that contribute to the key.
    pub fn hashed_len(&self) -> usize {
        self.window_size.saturating_sub(self.skip_positions.len())
    }

    /// Bases per hashed word.
    pub fn word_len(&self) -> usize {
        self.word_size.unwrap_or_else(|| self.hashed_len())
    }

    /// Window split into two overlapping words.
    pub fn split_words(&self) -> bool {
        self.word_len() < self.hashed_len()
    }

    pub fn key_bits(&self) -> u32 {
        2 * self.word_len() as u32
    }

    pub fn resolved_index_bits(&self) -> u32 {
        self.index_bits.unwrap_or_else(|| {
            let key_bits = self.key_bits();
            key_bits.min(key_bits.saturating_sub(SUBKEY_BITS).max(DEFAULT_INDEX_BITS))
        })
    }

    /// Skip positions as sorted 0-based offsets.
    pub fn skip_offsets(&self) -> Vec<usize> {
        self.skip_positions.iter().map(|p| p - 1).collect()
    }

    pub fn indels_enabled(&self) -> bool {
        self.max_insertions > 0 || self.max_deletions > 0
    }

    /// Substitution budget left after `indel_bases` were spent, `None` when
    /// the combined distance is already exceeded.
    pub fn mismatch_budget(&self, indel_bases: u32) -> Option<u32> {
        match self.max_distance {
            Some(d) if indel_bases > d => None,
            Some(d) => Some(self.max_mismatches.min(d - indel_bases)),
            None => Some(self.max_mismatches),
        }
    }

    /// Check the parameter set for contradictions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_size == 0 || self.window_size > MAX_WINDOW_BASES {
            return Err(ConfigError::InvalidWindowSize {
                size: self.window_size,
                max: MAX_WINDOW_BASES,
            });
        }
        let mut prev = 0usize;
        for &p in &self.skip_positions {
            if p == 0 || p > self.window_size || p <= prev {
                return Err(ConfigError::InvalidSkipPosition {
                    position: p,
                    window: self.window_size,
                });
            }
            prev = p;
        }
        if self.stride == 0 {
            return Err(ConfigError::InvalidStride);
        }
        if !self.skip_positions.is_empty() && self.stride > 1 {
            return Err(ConfigError::SkipWithStride { stride: self.stride });
        }

        let hashed = self.hashed_len();
        let word = self.word_len();
        if hashed == 0 || word == 0 || word > hashed || 2 * word < hashed {
            return Err(ConfigError::InvalidWordSize { word, hashed });
        }

        let key_bits = self.key_bits();
        let bits = self.resolved_index_bits();
        if bits == 0 || bits > key_bits || bits > MAX_INDEX_BITS {
            return Err(ConfigError::IndexBitsTooWide {
                bits,
                key_bits,
                max: MAX_INDEX_BITS,
            });
        }
        if key_bits - bits > SUBKEY_BITS {
            return Err(ConfigError::SubkeyTooWide {
                bits,
                key_bits,
                residual: key_bits - bits,
            });
        }

        if self.max_mismatches > MAX_MISMATCHES {
            return Err(ConfigError::TooManyMismatches {
                requested: self.max_mismatches,
                max: MAX_MISMATCHES,
            });
        }
        let indels = self.max_insertions.max(self.max_deletions);
        if indels > MAX_INDEL_BASES {
            return Err(ConfigError::TooManyIndels {
                requested: indels,
                max: MAX_INDEL_BASES,
            });
        }
        if let IndelPolicy::Fixed(position) = self.indel_policy {
            if position == 0 || position >= self.window_size {
                return Err(ConfigError::InvalidIndelPosition {
                    position,
                    window: self.window_size,
                });
            }
        }
        if self.max_alternatives == 0 {
            return Err(ConfigError::InvalidAlternatives);
        }
        Ok(())
    }
}
