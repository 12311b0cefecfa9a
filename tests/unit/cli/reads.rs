//! Unit tests for read loading in cli/run.rs

use seedfar::cli::run::{load_queries, read_reads};
use seedfar::core::seq_coding::Coding;
use std::fs;
use std::path::PathBuf;

fn write_temp(name: &str, contents: &str) -> PathBuf {
    let path = std::env::temp_dir().join(format!("seedfar-{}-{}", std::process::id(), name));
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn test_fasta_reads_are_iupac() {
    let path = write_temp("plain.fa", ">r1 first read\nACGTN\n>r2\nGGCC\n");
    let reads = read_reads(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(reads.len(), 2);
    assert_eq!(reads[0].id, "r1");
    assert_eq!(reads[0].coding, Coding::Iupac);
    assert_eq!(reads[0].data, b"ACGTN");
}

#[test]
fn test_fastq_reads_interleave_phred() {
    let path = write_temp("plain.fq", "@r1\nAC\n+\nI#\n");
    let reads = read_reads(&path).unwrap();
    fs::remove_file(&path).ok();

    assert_eq!(reads.len(), 1);
    assert_eq!(reads[0].coding, Coding::Ncbiqna);
    assert_eq!(reads[0].data, vec![b'A', 40, b'C', 2]);
}

#[test]
fn test_paired_reads_need_equal_counts() {
    let first = write_temp("pair1.fa", ">a\nACGT\n>b\nTTGG\n");
    let second = write_temp("pair2.fa", ">a\nGGGG\n");
    let result = load_queries(&first, Some(&second));
    fs::remove_file(&first).ok();
    fs::remove_file(&second).ok();
    assert!(result.is_err());
}

#[test]
fn test_paired_reads_loaded_as_two_components() {
    let first = write_temp("mates1.fa", ">a\nACGTAC\n");
    let second = write_temp("mates2.fa", ">a\nGGGTTT\n");
    let arena = load_queries(&first, Some(&second)).unwrap();
    fs::remove_file(&first).ok();
    fs::remove_file(&second).ok();

    assert_eq!(arena.len(), 1);
    let (_, query) = arena.iter().next().unwrap();
    assert_eq!(query.name, "a");
    assert_eq!(query.len(0), 6);
    assert_eq!(query.len(1), 6);
}
