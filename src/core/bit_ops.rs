//! Width-generic bit manipulation
//!
//! Every operation is driven by 256-entry byte tables computed at compile time
//! and composed byte by byte for wider words, so the same code serves `u8`
//! through `u128`. The nucleotide codecs rely on two identities:
//!
//! - reversing all bits of a 4-bit-per-base (ncbi4na) packed word reverses the
//!   base order *and* complements every one-hot base (A=0001 <-> T=1000,
//!   C=0010 <-> G=0100);
//! - reversing bit pairs of a 2-bit-per-base (ncbi2na) word and then inverting
//!   it yields the reverse complement (A=00 <-> T=11, C=01 <-> G=10).

use std::fmt::Debug;
use std::ops::{BitAnd, BitOr, BitXor, Not, Shl, Shr};

const fn build_popcount_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut v = i;
        let mut count = 0u8;
        while v != 0 {
            count += (v & 1) as u8;
            v >>= 1;
        }
        table[i] = count;
        i += 1;
    }
    table
}

const fn build_reverse_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut out = 0u8;
        let mut bit = 0;
        while bit < 8 {
            if (i >> bit) & 1 == 1 {
                out |= 1 << (7 - bit);
            }
            bit += 1;
        }
        table[i] = out;
        i += 1;
    }
    table
}

const fn build_pair_reverse_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let mut out = 0u8;
        let mut pair = 0;
        while pair < 4 {
            let bits = ((i >> (2 * pair)) & 3) as u8;
            out |= bits << (2 * (3 - pair));
            pair += 1;
        }
        table[i] = out;
        i += 1;
    }
    table
}

/// `SPREAD_TABLE[b]` moves bit `i` of `b` to bit `2i` of a 16-bit value.
const fn build_spread_table() -> [u16; 256] {
    let mut table = [0u16; 256];
    let mut i = 0;
    while i < 256 {
        let mut out = 0u16;
        let mut bit = 0;
        while bit < 8 {
            if (i >> bit) & 1 == 1 {
                out |= 1 << (2 * bit);
            }
            bit += 1;
        }
        table[i] = out;
        i += 1;
    }
    table
}

pub const POPCOUNT_TABLE: [u8; 256] = build_popcount_table();
pub const REVERSE_BITS_TABLE: [u8; 256] = build_reverse_table();
pub const REVERSE_PAIRS_TABLE: [u8; 256] = build_pair_reverse_table();
const SPREAD_TABLE: [u16; 256] = build_spread_table();

/// Unsigned machine word usable as packed base storage.
pub trait BitWord:
    Copy
    + Eq
    + Debug
    + Not<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    const BITS: u32;
    const ZERO: Self;
    const ONES: Self;

    /// Number of set bits.
    fn population_count(self) -> u32;

    /// Mirror the word: bit `i` moves to bit `BITS - 1 - i`.
    fn reverse_bits(self) -> Self;

    /// Mirror the word in units of two bits, keeping the order inside each pair.
    fn reverse_bit_pairs(self) -> Self;

    /// Spread the low `BITS / 2` bits so that bit `i` lands on bit `2i`.
    fn spread_bits(self) -> Self;

    /// Duplicate every low-half bit: bit `i` sets bits `2i` and `2i + 1`.
    #[inline]
    fn duplicate_bits(self) -> Self {
        let spread = self.spread_bits();
        spread | (spread << 1)
    }

    /// Interleave two low halves: bit `i` of `even` goes to `2i`, of `odd` to `2i + 1`.
    #[inline]
    fn interleave_bits(even: Self, odd: Self) -> Self {
        even.spread_bits() | (odd.spread_bits() << 1)
    }

    /// Mask with exactly `width` low bits set.
    ///
    /// # Panics
    /// Panics if `width > BITS`.
    #[inline]
    fn word_footprint(width: u32) -> Self {
        assert!(width <= Self::BITS, "footprint width {} exceeds {} bits", width, Self::BITS);
        if width == Self::BITS {
            Self::ONES
        } else {
            !(Self::ONES << width)
        }
    }
}

macro_rules! impl_bit_word {
    ($($t:ty),*) => {$(
        impl BitWord for $t {
            const BITS: u32 = <$t>::BITS;
            const ZERO: Self = 0;
            const ONES: Self = <$t>::MAX;

            #[inline]
            fn population_count(self) -> u32 {
                self.to_le_bytes()
                    .iter()
                    .map(|&b| POPCOUNT_TABLE[b as usize] as u32)
                    .sum()
            }

            #[inline]
            fn reverse_bits(self) -> Self {
                let mut bytes = self.to_le_bytes();
                bytes.reverse();
                for b in bytes.iter_mut() {
                    *b = REVERSE_BITS_TABLE[*b as usize];
                }
                <$t>::from_le_bytes(bytes)
            }

            #[inline]
            fn reverse_bit_pairs(self) -> Self {
                let mut bytes = self.to_le_bytes();
                bytes.reverse();
                for b in bytes.iter_mut() {
                    *b = REVERSE_PAIRS_TABLE[*b as usize];
                }
                <$t>::from_le_bytes(bytes)
            }

            #[inline]
            fn spread_bits(self) -> Self {
                let src = self.to_le_bytes();
                let mut out = [0u8; std::mem::size_of::<$t>()];
                if out.len() == 1 {
                    out[0] = SPREAD_TABLE[(src[0] & 0x0F) as usize] as u8;
                } else {
                    for k in 0..out.len() / 2 {
                        let spread = SPREAD_TABLE[src[k] as usize];
                        out[2 * k] = spread as u8;
                        out[2 * k + 1] = (spread >> 8) as u8;
                    }
                }
                <$t>::from_le_bytes(out)
            }
        }
    )*};
}

impl_bit_word!(u8, u16, u32, u64, u128);
