//! Bisulfite, quality-weighted and color-space reads seen from the scanner

use crate::unit::helpers::{hash_queries, random_bases, scan_positions};
use seedfar::config::{HashParams, StrandMask};
use seedfar::core::seq_coding::{iupac_to_colorspace, Coding};
use seedfar::seed::{MatchList, Query, QueryArena, QueryHash, QueryHashBuilder, ReferenceBuffer, SequenceScanner};

fn exact_forward(window: usize) -> HashParams {
    HashParams::default()
        .with_window(window)
        .with_mismatches(0)
        .with_strands(StrandMask::Forward)
}

fn hash_one(params: HashParams, query: Query) -> (QueryHash, Query) {
    let mut arena = QueryArena::new();
    let id = arena.push(query);
    let mut builder = QueryHashBuilder::new(params).unwrap();
    builder.add_arena(&mut arena);
    let hash = builder.finalize();
    let query = arena[id].clone();
    (hash, query)
}

#[test]
fn test_converted_read_found_in_bisulfite_mode() {
    // every C of the reference window reads as T
    let reference = b"TTTACGCAGGAGCAGTTT";
    let read = b"ATGTAGGAGTAG";

    let (plain, _) = hash_queries(exact_forward(12), &[read]);
    assert!(!scan_positions(&plain, reference).contains(&3));

    let params = HashParams {
        bisulfite: true,
        ..exact_forward(12)
    };
    let (converted, _) = hash_queries(params, &[read]);
    assert!(scan_positions(&converted, reference).contains(&3));
}

#[test]
fn test_low_quality_base_matches_any_reference_base() {
    let reference = b"GGACGTTGCAAGCTGG";
    // the last base disagrees with the reference but is barely called
    let data: Vec<u8> = b"ACGTTGCAAGCG"
        .iter()
        .enumerate()
        .flat_map(|(i, &b)| [b, if i == 11 { 2 } else { 35 }])
        .collect();
    let (hash, query) = hash_one(exact_forward(12), Query::new("fq", Coding::Ncbiqna, data.clone()));
    assert!(query.rejected().is_empty());
    assert_eq!(scan_positions(&hash, reference), [2].into_iter().collect());

    let confident: Vec<u8> = data
        .chunks(2)
        .flat_map(|pair| [pair[0], 35])
        .collect();
    let (hash, _) = hash_one(exact_forward(12), Query::new("fq", Coding::Ncbiqna, confident));
    assert!(scan_positions(&hash, reference).is_empty());
}

#[test]
fn test_channel_scores_read_found() {
    let reference = b"TTGATTACATT";
    // the third base is called as G or T
    let mut scores = Vec::new();
    for &b in b"GAKTACA" {
        let channel = |c: u8| match c {
            b'A' => [40, 0, 0, 0, 0],
            b'C' => [0, 40, 0, 0, 0],
            b'G' => [0, 0, 40, 0, 0],
            b'T' => [0, 0, 0, 40, 0],
            _ => [0, 0, 20, 20, 0],
        };
        scores.extend_from_slice(&channel(b));
    }
    let (hash, _) = hash_one(exact_forward(7), Query::new("pna", Coding::Ncbipna, scores));
    assert_eq!(scan_positions(&hash, reference), [2].into_iter().collect());
}

#[test]
fn test_colorspace_read_found() {
    let reference = random_bases(600, 31);
    let read = iupac_to_colorspace(b'T', &reference[200..224]);
    let (hash, query) = hash_one(exact_forward(12), Query::new("cs", Coding::Colorspace, read));
    assert_eq!(query.len(0), 24);

    let mut list = MatchList::default();
    SequenceScanner::new(&hash).scan(&ReferenceBuffer::new("ref", &reference), &mut list);
    assert!(list.matches.iter().any(|m| m.position == 200 && m.mismatches == 0));
}
