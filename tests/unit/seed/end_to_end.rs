//! Query hashing followed by reference scanning

use crate::unit::helpers::{hash_queries, random_bases, scan_matches, scan_positions};
use seedfar::config::{HashParams, StrandMask};
use seedfar::core::seq_coding::iupac_complement;
use seedfar::seed::{MatchList, Query, QueryArena, QueryHashBuilder, ReferenceBuffer, SequenceScanner, Strand};

fn reverse_complement(bases: &[u8]) -> Vec<u8> {
    bases.iter().rev().map(|&b| iupac_complement(b)).collect()
}

#[test]
fn test_exact_query_found_at_every_occurrence() {
    let (hash, _) = hash_queries(HashParams::default().with_window(4).with_mismatches(0), &[b"ACGT"]);
    let got = scan_positions(&hash, b"ACGTACGTACGT");
    assert_eq!(got, [0, 4, 8].into_iter().collect());
}

#[test]
fn test_absent_query_not_found() {
    let (hash, _) = hash_queries(HashParams::default().with_window(4).with_mismatches(0), &[b"TTTT"]);
    assert!(scan_positions(&hash, b"ACGTACGTACGT").is_empty());
}

#[test]
fn test_last_base_mismatch_tolerated() {
    let (hash, _) = hash_queries(HashParams::default().with_window(4).with_mismatches(1), &[b"ACGA"]);
    let got = scan_positions(&hash, b"ACGTACGTACGT");
    assert_eq!(got, [0, 4, 8].into_iter().collect());
    assert!(scan_matches(&hash, b"ACGTACGTACGT")
        .iter()
        .filter(|m| m.strand == Strand::Forward)
        .all(|m| m.mismatches == 1));
}

#[test]
fn test_planted_reads_on_both_strands() {
    let reference = random_bases(2000, 7);
    let forward = reference[500..520].to_vec();
    let reverse = reverse_complement(&reference[1200..1220]);
    let params = HashParams::default().with_window(12).with_mismatches(0);
    let (hash, arena) = hash_queries(params, &[&forward, &reverse]);
    let ids: Vec<_> = arena.ids().collect();

    let matches = scan_matches(&hash, &reference);
    assert!(matches
        .iter()
        .any(|m| m.query == ids[0] && m.strand == Strand::Forward && m.position == 500));
    assert!(matches
        .iter()
        .any(|m| m.query == ids[1] && m.strand == Strand::Reverse && m.position == 1200));
}

#[test]
fn test_planted_read_with_substitution() {
    let reference = random_bases(1500, 11);
    let mut read = reference[300..324].to_vec();
    read[5] = if read[5] == b'A' { b'C' } else { b'A' };
    let params = HashParams::default()
        .with_window(12)
        .with_mismatches(1)
        .with_strands(StrandMask::Forward);
    let (hash, _) = hash_queries(params, &[&read]);

    let hit = scan_matches(&hash, &reference)
        .into_iter()
        .find(|m| m.position == 300)
        .expect("read should seed at its origin");
    assert_eq!(hit.mismatches, 1);
    assert_eq!(hit.offset, 0);
}

#[test]
fn test_every_window_of_a_read_anchors_to_its_start() {
    let reference = random_bases(1000, 3);
    let read = reference[100..148].to_vec();
    let params = HashParams {
        window_count: 0,
        ..HashParams::default()
            .with_window(12)
            .with_mismatches(0)
            .with_strands(StrandMask::Forward)
    };
    let (hash, _) = hash_queries(params, &[&read]);
    let matches = scan_matches(&hash, &reference);
    let offsets: Vec<usize> = matches.iter().filter(|m| m.position == 100).map(|m| m.offset).collect();
    for expected in [0, 12, 24, 36] {
        assert!(offsets.contains(&expected), "offset {} missing from {:?}", expected, offsets);
    }
}

#[test]
fn test_paired_mates_report_their_component() {
    let reference = random_bases(1000, 5);
    let mut arena = QueryArena::new();
    let id = arena.push(Query::paired(
        "pair",
        seedfar::core::seq_coding::Coding::Iupac,
        reference[50..70].to_vec(),
        reference[600..620].to_vec(),
    ));
    let params = HashParams::default()
        .with_window(12)
        .with_mismatches(0)
        .with_strands(StrandMask::Forward);
    let mut builder = QueryHashBuilder::new(params).unwrap();
    builder.add_arena(&mut arena);
    let hash = builder.finalize();

    let mut list = MatchList::default();
    SequenceScanner::new(&hash).scan(&ReferenceBuffer::new("ref", &reference), &mut list);
    assert!(list.matches.iter().any(|m| m.query == id && m.mate == 0 && m.position == 50));
    assert!(list.matches.iter().any(|m| m.query == id && m.mate == 1 && m.position == 600));
}

#[test]
fn test_cleared_hash_accepts_a_new_batch() {
    let params = HashParams::default().with_window(4).with_mismatches(0);
    let (hash, _) = hash_queries(params, &[b"ACGT"]);
    let mut builder = hash.clear();
    assert!(builder.is_empty());

    let mut arena = QueryArena::new();
    arena.push(Query::from_iupac("next", b"GATC"));
    builder.add_arena(&mut arena);
    let hash = builder.finalize();
    assert!(scan_positions(&hash, b"ACGTACGT").is_empty());
    assert_eq!(scan_positions(&hash, b"TTGATCTT"), [2].into_iter().collect());
}
