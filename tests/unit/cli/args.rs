//! Unit tests for cli/args.rs

use clap::{Args, Command, FromArgMatches};
use seedfar::cli::SearchArgs;
use seedfar::config::{ConfigError, IndelPolicy, StrandMask};
use std::path::PathBuf;

fn parse_args(args: &[&str]) -> SearchArgs {
    let mut all_args = vec!["seedfar".to_string(), "search".to_string()];
    all_args.extend(args.iter().map(|s| s.to_string()));

    let cmd = Command::new("seedfar").subcommand(SearchArgs::augment_args(Command::new("search")));

    let matches = cmd.get_matches_from(all_args);
    let sub_matches = matches.subcommand_matches("search").unwrap();

    SearchArgs::from_arg_matches(sub_matches).unwrap()
}

#[test]
fn test_default_values() {
    let args = parse_args(&["-q", "reads.fq", "-r", "genome.fa"]);

    assert_eq!(args.query, PathBuf::from("reads.fq"));
    assert_eq!(args.reference, PathBuf::from("genome.fa"));
    assert_eq!(args.mate, None);
    assert_eq!(args.out, None);
    assert_eq!(args.window_size, 12);
    assert_eq!(args.word_size, None);
    assert_eq!(args.stride, 1);
    assert_eq!(args.window_count, 1);
    assert_eq!(args.strand, StrandMask::Both);
    assert_eq!(args.mismatches, 1);
    assert_eq!(args.insertions, 0);
    assert_eq!(args.deletions, 0);
    assert_eq!(args.max_ambiguities, 4);
    assert_eq!(args.max_alternatives, 256);
    assert_eq!(args.quality_threshold, 10);
    assert_eq!(args.num_threads, 0);
    assert!(!args.bisulfite);
    assert!(!args.verbose);
    assert!(args.skip_positions.is_empty());
}

#[test]
fn test_strand_names() {
    let args = parse_args(&["-q", "r.fa", "-r", "g.fa", "--strand", "reverse"]);
    assert_eq!(args.strand, StrandMask::Reverse);
    let args = parse_args(&["-q", "r.fa", "-r", "g.fa", "--strand", "plus"]);
    assert_eq!(args.strand, StrandMask::Forward);
}

#[test]
fn test_skip_positions_comma_list() {
    let args = parse_args(&["-q", "r.fa", "-r", "g.fa", "--skip-positions", "3,7"]);
    assert_eq!(args.skip_positions, vec![3, 7]);
    let params = args.hash_params().unwrap();
    assert_eq!(params.skip_offsets(), vec![2, 6]);
    assert_eq!(params.hashed_len(), 10);
}

#[test]
fn test_hash_params_carry_options() {
    let args = parse_args(&[
        "-q", "r.fa", "-r", "g.fa", "-w", "16", "--word-size", "10", "-m", "2", "--insertions", "1",
        "--indel-position", "5", "--bisulfite",
    ]);
    let params = args.hash_params().unwrap();
    assert_eq!(params.window_size, 16);
    assert_eq!(params.word_len(), 10);
    assert!(params.split_words());
    assert_eq!(params.max_mismatches, 2);
    assert_eq!(params.max_insertions, 1);
    assert_eq!(params.indel_policy, IndelPolicy::Fixed(5));
    assert!(params.bisulfite);
}

#[test]
fn test_invalid_window_rejected() {
    let args = parse_args(&["-q", "r.fa", "-r", "g.fa", "-w", "40"]);
    assert!(matches!(args.hash_params(), Err(ConfigError::InvalidWindowSize { size: 40, .. })));
}

#[test]
fn test_skip_with_stride_rejected() {
    let args = parse_args(&["-q", "r.fa", "-r", "g.fa", "--stride", "2", "--skip-positions", "4"]);
    assert_eq!(args.hash_params(), Err(ConfigError::SkipWithStride { stride: 2 }));
}

#[test]
fn test_custom_num_threads() {
    let args = parse_args(&["-q", "r.fa", "-r", "g.fa", "-n", "4"]);
    assert_eq!(args.num_threads, 4);
}
