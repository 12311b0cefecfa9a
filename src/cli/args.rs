use clap::Args;
use std::path::PathBuf;

use crate::config::hash_params::{ConfigError, HashParams, IndelPolicy, StrandMask};

#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Reads to hash (FASTA or FASTQ; FASTQ qualities are used)
    #[arg(short, long)]
    pub query: PathBuf,
    /// Second mates of paired reads, in the same order as --query
    #[arg(long)]
    pub mate: Option<PathBuf>,
    /// Reference sequences (FASTA)
    #[arg(short, long)]
    pub reference: PathBuf,
    #[arg(short, long)]
    pub out: Option<PathBuf>,
    #[arg(short, long, default_value_t = 12)]
    pub window_size: usize,
    /// Split each window into two words of this size
    #[arg(long)]
    pub word_size: Option<usize>,
    #[arg(long, default_value_t = 1)]
    pub stride: usize,
    #[arg(long, default_value_t = 0)]
    pub window_start: usize,
    /// Windows per read component (0 = all that fit)
    #[arg(long, default_value_t = 1)]
    pub window_count: usize,
    #[arg(long)]
    pub index_bits: Option<u32>,
    /// forward, reverse or both
    #[arg(long, default_value = "both")]
    pub strand: StrandMask,
    #[arg(short, long, default_value_t = 1)]
    pub mismatches: u32,
    #[arg(long, default_value_t = 0)]
    pub insertions: u32,
    #[arg(long, default_value_t = 0)]
    pub deletions: u32,
    /// Limit on mismatches plus indel bases
    #[arg(long)]
    pub max_distance: Option<u32>,
    /// Only synthesise indels at this window position
    #[arg(long)]
    pub indel_position: Option<usize>,
    #[arg(long, default_value_t = 4)]
    pub max_ambiguities: usize,
    #[arg(long, default_value_t = 256)]
    pub max_alternatives: u64,
    /// Triplet complexity score above which windows are ignored
    #[arg(long)]
    pub max_complexity: Option<u32>,
    #[arg(long, default_value_t = false)]
    pub bisulfite: bool,
    /// 1-based window positions excluded from hashing (comma separated)
    #[arg(long, value_delimiter = ',')]
    pub skip_positions: Vec<usize>,
    /// Phred score a FASTQ base must exceed to count as called
    #[arg(long, default_value_t = 10)]
    pub quality_threshold: u8,
    #[arg(long, default_value_t = false)]
    pub optimize_window_start: bool,
    /// Shortest exact run scanned without enumeration (default: window size)
    #[arg(long)]
    pub min_block: Option<usize>,
    #[arg(short = 'n', long, default_value_t = 0)]
    pub num_threads: usize,
    #[arg(long, short = 'v', default_value_t = false)]
    pub verbose: bool,
}

impl SearchArgs {
    /// Hashing parameters described by the arguments, validated.
    pub fn hash_params(&self) -> Result<HashParams, ConfigError> {
        let params = HashParams {
            window_size: self.window_size,
            word_size: self.word_size,
            stride: self.stride,
            window_start: self.window_start,
            window_count: self.window_count,
            index_bits: self.index_bits,
            strands: self.strand,
            max_mismatches: self.mismatches,
            max_insertions: self.insertions,
            max_deletions: self.deletions,
            max_distance: self.max_distance,
            indel_policy: self.indel_position.map_or(IndelPolicy::Anywhere, IndelPolicy::Fixed),
            max_ambiguities: self.max_ambiguities,
            max_alternatives: self.max_alternatives,
            max_complexity: self.max_complexity,
            bisulfite: self.bisulfite,
            skip_positions: self.skip_positions.clone(),
            quality_threshold: self.quality_threshold,
            optimize_window_start: self.optimize_window_start,
        };
        params.validate()?;
        Ok(params)
    }
}
