//! Unit tests for seed/word_hash.rs through the public API

use seedfar::seed::hash_atom::{FLAG_PAIRMATE, FLAG_STRAND};
use seedfar::seed::word_hash::SplitScratch;
use seedfar::seed::{HashAtom, IndelState, QueryId, Strand, WordHashBuilder};

fn atom(q: u32, off: u16, strand: Strand) -> HashAtom {
    HashAtom::new(QueryId(q), off, strand)
}

#[test]
fn test_postings_exact_key_only() {
    let mut builder = WordHashBuilder::new(10);
    builder.insert(0xABCDE, atom(0, 0, Strand::Forward));
    builder.insert(0xABCDF, atom(1, 0, Strand::Forward));
    builder.insert(0x1BCDE, atom(2, 0, Strand::Forward));
    let index = builder.finalize();

    let run = index.postings(0xABCDE);
    assert_eq!(run.len(), 1);
    assert_eq!(run[0].query(), QueryId(0));
    assert!(index.postings(0x2BCDE).is_empty());
    assert_eq!(index.len(), 3);
}

#[test]
fn test_identity_flags_keep_occurrences_apart() {
    let mut builder = WordHashBuilder::new(8);
    let key = 0x77;
    builder.insert(key, atom(4, 2, Strand::Forward));
    builder.insert(key, atom(4, 2, Strand::Reverse));
    builder.insert(key, atom(4, 2, Strand::Forward).with_pairmate(1));
    builder.insert(key, atom(4, 2, Strand::Forward).with_indel(IndelState::Insertion, 1));
    let index = builder.finalize();
    let run = index.postings(key);
    assert_eq!(run.len(), 4);
    assert_eq!(run.iter().filter(|a| a.indel() == IndelState::Insertion).count(), 1);

    let mut mates = 0;
    index.lookup_filtered(key, FLAG_PAIRMATE | FLAG_STRAND, FLAG_PAIRMATE, |a| {
        assert_eq!(a.pairmate(), 1);
        mates += 1;
    });
    assert_eq!(mates, 1);
}

#[test]
fn test_bucket_statistics() {
    let mut builder = WordHashBuilder::new(4);
    for q in 0..6u32 {
        builder.insert(0x10 | (q as u64) << 8, atom(q, 0, Strand::Forward));
    }
    builder.insert(0x03, atom(9, 0, Strand::Forward));
    let index = builder.finalize();
    assert_eq!(index.non_empty_buckets(), 2);
    assert_eq!(index.longest_bucket(), 6);
}

#[test]
fn test_split_lookup_needs_matching_offsets() {
    let mut builder = WordHashBuilder::new(6);
    builder.insert(0xA1, atom(1, 12, Strand::Reverse).with_word(0));
    builder.insert(0xB2, atom(1, 12, Strand::Reverse).with_word(1));
    builder.insert(0xB2, atom(1, 12, Strand::Forward).with_word(1));
    let index = builder.finalize();

    let mut scratch = SplitScratch::default();
    let mut found = Vec::new();
    let calls = index.lookup_split(0xA1, 0xB2, &mut scratch, |a, _| found.push((a.offset(), a.strand())));
    assert_eq!(calls, 1);
    assert_eq!(found, vec![(12, Strand::Reverse)]);
    // halves given in the wrong order never pair
    assert_eq!(index.lookup_split(0xB2, 0xA1, &mut scratch, |_, _| {}), 0);
}

#[test]
fn test_rebuild_after_clear() {
    let mut builder = WordHashBuilder::new(6);
    builder.insert(0x55, atom(0, 0, Strand::Forward));
    let mut builder = builder.finalize().clear();
    builder.insert(0x66, atom(1, 0, Strand::Forward));
    let index = builder.finalize();
    assert!(index.postings(0x55).is_empty());
    assert_eq!(index.postings(0x66).len(), 1);
}
