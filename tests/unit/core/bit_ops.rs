//! Unit tests for core/bit_ops.rs

use seedfar::core::bit_ops::BitWord;

#[test]
fn test_table_reverse_matches_std() {
    for v in [0u64, 1, 0xDEAD_BEEF, u64::MAX, 0x0123_4567_89AB_CDEF] {
        assert_eq!(BitWord::reverse_bits(v), v.reverse_bits());
        assert_eq!(BitWord::population_count(v), v.count_ones());
    }
}

#[test]
fn test_pair_reversal_on_u128() {
    // 32 bases, 2 bits each: first base ends up last
    let v: u128 = 0b11 << 126;
    assert_eq!(BitWord::reverse_bit_pairs(v), 0b11);
    let w: u128 = 0b01 << 126;
    assert_eq!(BitWord::reverse_bit_pairs(w), 0b01);
}

#[test]
fn test_interleave_u32() {
    let even: u32 = 0xFFFF;
    let odd: u32 = 0;
    assert_eq!(<u32 as BitWord>::interleave_bits(even, odd), 0x5555_5555);
    assert_eq!(<u32 as BitWord>::interleave_bits(odd, even), 0xAAAA_AAAA);
    assert_eq!(<u32 as BitWord>::duplicate_bits(0xFF), 0xFFFF);
}

#[test]
fn test_word_footprint_widths() {
    assert_eq!(<u16 as BitWord>::word_footprint(0), 0);
    assert_eq!(<u16 as BitWord>::word_footprint(5), 0b11111);
    assert_eq!(<u128 as BitWord>::word_footprint(128), u128::MAX);
}
