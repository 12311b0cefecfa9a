//! Insertion and deletion variants seen from the scanner

use crate::unit::helpers::{hash_queries, random_bases, scan_matches};
use seedfar::config::{HashParams, StrandMask};
use seedfar::seed::IndelState;

fn forward_params(insertions: u32, deletions: u32) -> HashParams {
    HashParams::default()
        .with_window(12)
        .with_mismatches(0)
        .with_indels(insertions, deletions)
        .with_strands(StrandMask::Forward)
}

#[test]
fn test_read_with_extra_base_seeds_as_insertion() {
    let reference = random_bases(800, 21);
    let mut read = reference[200..206].to_vec();
    read.push(if reference[206] == b'G' { b'T' } else { b'G' });
    read.extend_from_slice(&reference[206..219]);

    let (hash, _) = hash_queries(forward_params(1, 0), &[&read]);
    let hits = scan_matches(&hash, &reference);
    let hit = hits
        .iter()
        .find(|m| m.indel == IndelState::Insertion && m.position == 200)
        .expect("insertion variant should seed");
    assert_eq!(hit.indel_len, 1);
    assert_eq!(hit.mismatches, 0);
}

#[test]
fn test_read_missing_a_base_seeds_as_deletion() {
    let reference = random_bases(800, 22);
    let mut read = reference[400..406].to_vec();
    read.extend_from_slice(&reference[407..421]);

    let (hash, _) = hash_queries(forward_params(0, 1), &[&read]);
    let hits = scan_matches(&hash, &reference);
    assert!(hits
        .iter()
        .any(|m| m.indel == IndelState::Deletion && m.indel_len == 1 && m.position == 400));
}

#[test]
fn test_indels_disabled_by_default() {
    let reference = random_bases(800, 23);
    let mut read = reference[100..106].to_vec();
    read.extend_from_slice(&reference[107..121]);

    let (hash, _) = hash_queries(forward_params(0, 0), &[&read]);
    assert!(scan_matches(&hash, &reference)
        .iter()
        .all(|m| m.indel == IndelState::None));
}
