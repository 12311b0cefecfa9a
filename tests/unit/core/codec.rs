//! Unit tests for core/seq_coding.rs and core/packed_window.rs

use seedfar::core::packed_window::{
    count_mismatches, pack_ncbi2na, pack_ncbi4na, push_base2, reverse_complement2, reverse_complement4,
    unpack_ncbi4na,
};
use seedfar::core::seq_coding::{
    iupac_to_ncbi2na, iupac_to_ncbi4na, ncbi4na_to_iupac, Coding, SeqSlice, NCBI4NA_ANY,
};

fn codes4(s: &[u8]) -> Vec<u8> {
    s.iter().map(|&b| iupac_to_ncbi4na(b)).collect()
}

fn codes2(s: &[u8]) -> Vec<u8> {
    s.iter().map(|&b| iupac_to_ncbi2na(b).unwrap()).collect()
}

#[test]
fn test_lowercase_and_unknown_bases() {
    assert_eq!(iupac_to_ncbi4na(b'a'), iupac_to_ncbi4na(b'A'));
    assert_eq!(iupac_to_ncbi4na(b'*'), NCBI4NA_ANY);
    assert_eq!(iupac_to_ncbi2na(b'N'), None);
}

#[test]
fn test_window_text_round_trip() {
    let text = b"ACGTRYKMN";
    let window = pack_ncbi4na(&codes4(text));
    let back: Vec<u8> = unpack_ncbi4na(window, text.len())
        .into_iter()
        .map(ncbi4na_to_iupac)
        .collect();
    assert_eq!(back, text);
}

#[test]
fn test_rolling_key_equals_packed_key() {
    let text = b"GATTACAGATTACA";
    let w = 6;
    let codes = codes2(text);
    let mut key = 0u64;
    for (i, &c) in codes.iter().enumerate() {
        key = push_base2(key, c, w);
        if i + 1 >= w {
            assert_eq!(key, pack_ncbi2na(&codes[i + 1 - w..=i]));
        }
    }
}

#[test]
fn test_reverse_complement_agrees_between_widths() {
    let text = b"AACGTTGCA";
    let rc4 = reverse_complement4(pack_ncbi4na(&codes4(text)), text.len());
    let rc2 = reverse_complement2(pack_ncbi2na(&codes2(text)), text.len());
    assert_eq!(rc4, pack_ncbi4na(&codes4(b"TGCAACGTT")));
    assert_eq!(rc2, pack_ncbi2na(&codes2(b"TGCAACGTT")));
}

#[test]
fn test_ambiguous_window_mismatches() {
    // R covers A and G
    let window = pack_ncbi4na(&codes4(b"ACRT"));
    assert_eq!(count_mismatches(window, pack_ncbi2na(&codes2(b"ACAT")), 4), 0);
    assert_eq!(count_mismatches(window, pack_ncbi2na(&codes2(b"ACGT")), 4), 0);
    assert_eq!(count_mismatches(window, pack_ncbi2na(&codes2(b"TCCT")), 4), 2);
}

#[test]
fn test_fastq_slice_decodes_low_quality_as_any() {
    let data = [b'A', 30, b'C', 2, b'G', 40];
    let slice = SeqSlice::new(Coding::Ncbiqna, &data);
    assert_eq!(slice.len(), 3);
    let codes = slice.to_ncbi4na(10);
    assert_eq!(codes, vec![iupac_to_ncbi4na(b'A'), NCBI4NA_ANY, iupac_to_ncbi4na(b'G')]);
}
