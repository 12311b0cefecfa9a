//! Packed seed windows
//!
//! A window holds up to [`MAX_WINDOW_BASES`] bases with the first base in the
//! most significant position:
//!
//! - [`Window4`]: ncbi4na, 4 bits per base (`u128`)
//! - [`Key2`]: ncbi2na, 2 bits per base (`u64`)
//!
//! Bits above `width * length` are always zero.

use super::bit_ops::BitWord;
use super::seq_coding::{ncbi2na_to_ncbi4na, ncbi4na_to_ncbi2na, NCBI4NA_CARDINALITY};

pub type Window4 = u128;
pub type Key2 = u64;

pub const MAX_WINDOW_BASES: usize = 32;

const NIBBLE_LSB: u128 = 0x1111_1111_1111_1111_1111_1111_1111_1111;

#[inline]
pub fn window_mask4(len: usize) -> Window4 {
    Window4::word_footprint(4 * len as u32)
}

#[inline]
pub fn key_mask2(len: usize) -> Key2 {
    Key2::word_footprint(2 * len as u32)
}

/// Pack 4-bit codes, first code most significant.
pub fn pack_ncbi4na(codes: &[u8]) -> Window4 {
    debug_assert!(codes.len() <= MAX_WINDOW_BASES);
    codes
        .iter()
        .fold(0, |acc, &c| (acc << 4) | (c & 0x0F) as Window4)
}

/// Pack 2-bit codes, first code most significant.
pub fn pack_ncbi2na(codes: &[u8]) -> Key2 {
    debug_assert!(codes.len() <= MAX_WINDOW_BASES);
    codes.iter().fold(0, |acc, &c| (acc << 2) | (c & 3) as Key2)
}

pub fn unpack_ncbi4na(window: Window4, len: usize) -> Vec<u8> {
    (0..len).map(|i| base4_at(window, len, i)).collect()
}

pub fn unpack_ncbi2na(key: Key2, len: usize) -> Vec<u8> {
    (0..len).map(|i| base2_at(key, len, i)).collect()
}

/// 4-bit code of base `i` (0 = first) in a window of `len` bases.
#[inline]
pub fn base4_at(window: Window4, len: usize, i: usize) -> u8 {
    ((window >> (4 * (len - 1 - i))) & 0x0F) as u8
}

#[inline]
pub fn base2_at(key: Key2, len: usize, i: usize) -> u8 {
    ((key >> (2 * (len - 1 - i))) & 3) as u8
}

/// Slide one base into a window of `len` bases, dropping the oldest.
#[inline]
pub fn push_base4(window: Window4, code: u8, len: usize) -> Window4 {
    ((window << 4) | (code & 0x0F) as Window4) & window_mask4(len)
}

#[inline]
pub fn push_base2(key: Key2, code: u8, len: usize) -> Key2 {
    ((key << 2) | (code & 3) as Key2) & key_mask2(len)
}

/// Reverse complement of a 4-bit window: mirroring all bits reverses base
/// order and swaps A/T and C/G inside each one-hot nibble.
#[inline]
pub fn reverse_complement4(window: Window4, len: usize) -> Window4 {
    if len == 0 {
        return 0;
    }
    BitWord::reverse_bits(window) >> (128 - 4 * len as u32)
}

#[inline]
pub fn reverse_complement2(key: Key2, len: usize) -> Key2 {
    if len == 0 {
        return 0;
    }
    (!key).reverse_bit_pairs() >> (64 - 2 * len as u32)
}

/// One-hot 4-bit window of an unambiguous key.
pub fn key2_to_window4(key: Key2, len: usize) -> Window4 {
    (0..len).fold(0, |acc, i| (acc << 4) | ncbi2na_to_ncbi4na(base2_at(key, len, i)) as Window4)
}

/// Representative unambiguous key of a window (lowest set bit per base).
pub fn window4_to_key2(window: Window4, len: usize) -> Key2 {
    (0..len).fold(0, |acc, i| (acc << 2) | ncbi4na_to_ncbi2na(base4_at(window, len, i)) as Key2)
}

/// Bases of `window` incompatible with the unambiguous `key`.
pub fn count_mismatches(window: Window4, key: Key2, len: usize) -> u32 {
    let hits = window & key2_to_window4(key, len);
    // fold every nibble onto its low bit
    let folded = (hits | (hits >> 1) | (hits >> 2) | (hits >> 3)) & NIBBLE_LSB & window_mask4(len);
    len as u32 - folded.population_count()
}

/// Number of bases that are not exactly one nucleotide.
pub fn count_ambiguous(window: Window4, len: usize) -> usize {
    (0..len)
        .filter(|&i| NCBI4NA_CARDINALITY[base4_at(window, len, i) as usize] != 1)
        .count()
}

/// Distinct unambiguous sequences consistent with `window`, saturating.
/// An empty (gap) base counts as one forced-mismatch position.
pub fn alternative_count(window: Window4, len: usize) -> u64 {
    (0..len).fold(1u64, |acc, i| {
        let card = NCBI4NA_CARDINALITY[base4_at(window, len, i) as usize].max(1) as u64;
        acc.saturating_mul(card)
    })
}

/// Remove the bases at `positions` (0-based, ascending) from a window.
pub fn drop_positions4(window: Window4, len: usize, positions: &[usize]) -> Window4 {
    if positions.is_empty() {
        return window;
    }
    (0..len)
        .filter(|i| !positions.contains(i))
        .fold(0, |acc, i| (acc << 4) | base4_at(window, len, i) as Window4)
}

pub fn drop_positions2(key: Key2, len: usize, positions: &[usize]) -> Key2 {
    if positions.is_empty() {
        return key;
    }
    (0..len)
        .filter(|i| !positions.contains(i))
        .fold(0, |acc, i| (acc << 2) | base2_at(key, len, i) as Key2)
}

/// Extract `count` bases starting at base `start` of a `len`-base window.
#[inline]
pub fn sub_window4(window: Window4, len: usize, start: usize, count: usize) -> Window4 {
    (window >> (4 * (len - start - count))) & window_mask4(count)
}
