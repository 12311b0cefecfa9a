//! Nucleotide codecs
//!
//! Conversions between the base encodings a query may arrive in and the
//! 4-bit ambiguity mask (ncbi4na) the hashing code works on.
//!
//! # ncbi2na
//! - A = 0b00, C = 0b01, G = 0b10, T/U = 0b11
//!
//! # ncbi4na
//! One bit per possible base, so ambiguity letters are unions:
//!
//! | Code | IUPAC | Code | IUPAC |
//! |------|-------|------|-------|
//! | 0x0  | -     | 0x8  | T     |
//! | 0x1  | A     | 0x9  | W     |
//! | 0x2  | C     | 0xA  | Y     |
//! | 0x3  | M     | 0xB  | H     |
//! | 0x4  | G     | 0xC  | K     |
//! | 0x5  | R     | 0xD  | D     |
//! | 0x6  | S     | 0xE  | B     |
//! | 0x7  | V     | 0xF  | N     |
//!
//! Unrecognised input always maps to 0xF (any base) so scanning stays total.
//!
//! # Quality-weighted encodings
//! - `ncbipna`: five score bytes per base, channels A, C, G, T, N.
//! - `ncbiqna`: two bytes per base, the called IUPAC letter and its phred score.
//!
//! Both reduce to ncbi4na through a score threshold: a channel strictly above
//! the threshold contributes its bit, and a base with no such channel is N.
//!
//! # Color-space
//! A primer base (IUPAC letter) followed by one colour per base, `'0'..='3'`
//! or raw `0..=3`, where `colour = prev XOR next` over ncbi2na. `'.'` (or 4)
//! is an unknown colour.

use super::bit_ops::{POPCOUNT_TABLE, REVERSE_BITS_TABLE};

pub const NCBI4NA_GAP: u8 = 0x0;
pub const NCBI4NA_A: u8 = 0x1;
pub const NCBI4NA_C: u8 = 0x2;
pub const NCBI4NA_G: u8 = 0x4;
pub const NCBI4NA_T: u8 = 0x8;
pub const NCBI4NA_ANY: u8 = 0xF;

/// Bytes per base of the `ncbipna` encoding.
pub const NCBIPNA_BYTES: usize = 5;
/// Bytes per base of the `ncbiqna` encoding.
pub const NCBIQNA_BYTES: usize = 2;

pub const NCBI4NA_TO_IUPACNA: [u8; 16] = *b"-ACMGRSVTWYHKDBN";

const fn build_iupac_table() -> [u8; 256] {
    let mut table = [NCBI4NA_ANY; 256];
    let mut code = 1;
    while code < 16 {
        let letter = NCBI4NA_TO_IUPACNA[code];
        table[letter as usize] = code as u8;
        table[letter.to_ascii_lowercase() as usize] = code as u8;
        code += 1;
    }
    table[b'U' as usize] = NCBI4NA_T;
    table[b'u' as usize] = NCBI4NA_T;
    table
}

pub const IUPACNA_TO_NCBI4NA: [u8; 256] = build_iupac_table();

const fn build_ncbi4na_complement() -> [u8; 16] {
    let mut table = [0u8; 16];
    let mut code = 0;
    while code < 16 {
        table[code] = REVERSE_BITS_TABLE[code] >> 4;
        code += 1;
    }
    table
}

/// Complement of a 4-bit code: the nibble mirrored (A <-> T, C <-> G).
pub const NCBI4NA_COMPLEMENT: [u8; 16] = build_ncbi4na_complement();

const fn build_cardinality() -> [u8; 16] {
    let mut table = [0u8; 16];
    let mut code = 0;
    while code < 16 {
        table[code] = POPCOUNT_TABLE[code];
        code += 1;
    }
    table
}

/// Number of bases a 4-bit code stands for.
pub const NCBI4NA_CARDINALITY: [u8; 16] = build_cardinality();

const NCBI2NA_TO_IUPACNA: [u8; 4] = *b"ACGT";

#[inline]
pub fn iupac_to_ncbi4na(base: u8) -> u8 {
    IUPACNA_TO_NCBI4NA[base as usize]
}

#[inline]
pub fn ncbi4na_to_iupac(code: u8) -> u8 {
    NCBI4NA_TO_IUPACNA[(code & 0x0F) as usize]
}

/// Deterministic unambiguous representative: the lowest set bit (0 maps to A).
#[inline]
pub fn ncbi4na_to_ncbi2na(code: u8) -> u8 {
    let code = code & 0x0F;
    if code == 0 {
        0
    } else {
        code.trailing_zeros() as u8
    }
}

#[inline]
pub fn ncbi2na_to_ncbi4na(code: u8) -> u8 {
    1 << (code & 3)
}

#[inline]
pub fn ncbi2na_to_iupac(code: u8) -> u8 {
    NCBI2NA_TO_IUPACNA[(code & 3) as usize]
}

/// ncbi2na code of an unambiguous IUPAC letter.
#[inline]
pub fn iupac_to_ncbi2na(base: u8) -> Option<u8> {
    let code = iupac_to_ncbi4na(base);
    if NCBI4NA_CARDINALITY[code as usize] == 1 {
        Some(ncbi4na_to_ncbi2na(code))
    } else {
        None
    }
}

#[inline]
pub fn is_ambiguous(code: u8) -> bool {
    NCBI4NA_CARDINALITY[(code & 0x0F) as usize] != 1
}

#[inline]
pub fn ncbi2na_complement(code: u8) -> u8 {
    (code & 3) ^ 3
}

#[inline]
pub fn ncbi4na_complement(code: u8) -> u8 {
    NCBI4NA_COMPLEMENT[(code & 0x0F) as usize]
}

/// Complement of an IUPAC letter; the result is uppercase.
#[inline]
pub fn iupac_complement(base: u8) -> u8 {
    ncbi4na_to_iupac(ncbi4na_complement(iupac_to_ncbi4na(base)))
}

/// Reduce one `ncbipna` base (A, C, G, T, N scores) to a 4-bit code.
pub fn ncbipna_to_ncbi4na(scores: &[u8], threshold: u8) -> u8 {
    let mut code = 0u8;
    for (channel, &score) in scores.iter().take(4).enumerate() {
        if score > threshold {
            code |= 1 << channel;
        }
    }
    if code == 0 {
        NCBI4NA_ANY
    } else {
        code
    }
}

/// Swap the A/T and C/G channels of one `ncbipna` base.
#[inline]
pub fn ncbipna_complement(scores: [u8; NCBIPNA_BYTES]) -> [u8; NCBIPNA_BYTES] {
    [scores[3], scores[2], scores[1], scores[0], scores[4]]
}

/// Reduce one `ncbiqna` base (IUPAC letter, phred) to a 4-bit code.
#[inline]
pub fn ncbiqna_to_ncbi4na(base_qual: &[u8], threshold: u8) -> u8 {
    if base_qual[1] > threshold {
        iupac_to_ncbi4na(base_qual[0])
    } else {
        NCBI4NA_ANY
    }
}

#[inline]
pub fn ncbiqna_complement(base_qual: [u8; NCBIQNA_BYTES]) -> [u8; NCBIQNA_BYTES] {
    [iupac_complement(base_qual[0]), base_qual[1]]
}

/// ncbi2na colour value, `None` for an unknown colour.
#[inline]
pub fn color_code(color: u8) -> Option<u8> {
    match color {
        b'0'..=b'3' => Some(color - b'0'),
        0..=3 => Some(color),
        _ => None,
    }
}

/// Decode a color-space read into 4-bit codes, one per colour.
///
/// An ambiguous primer or an unknown colour makes the affected base and all
/// following bases N, since the absolute base can no longer be recovered.
pub fn colorspace_to_ncbi4na(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len().saturating_sub(1));
    let Some((&primer, colors)) = data.split_first() else {
        return out;
    };
    let mut prev = iupac_to_ncbi2na(primer);
    for &color in colors {
        prev = match (prev, color_code(color)) {
            (Some(base), Some(c)) => Some(base ^ c),
            _ => None,
        };
        out.push(prev.map_or(NCBI4NA_ANY, ncbi2na_to_ncbi4na));
    }
    out
}

/// Encode unambiguous IUPAC bases as color-space with the given primer.
///
/// Ambiguous bases produce the unknown colour `'.'`.
pub fn iupac_to_colorspace(primer: u8, bases: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(bases.len() + 1);
    out.push(primer.to_ascii_uppercase());
    let mut prev = iupac_to_ncbi2na(primer);
    for &b in bases {
        let cur = iupac_to_ncbi2na(b);
        out.push(match (prev, cur) {
            (Some(p), Some(c)) => b'0' + (p ^ c),
            _ => b'.',
        });
        prev = cur;
    }
    out
}

/// Supported query encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Coding {
    /// IUPAC text, one byte per base.
    Iupac,
    /// One ncbi2na code (0..=3) per byte.
    Ncbi2na,
    /// One ncbi4na code (0..=15) per byte.
    Ncbi4na,
    /// Five channel scores per base.
    Ncbipna,
    /// Called base and phred score per base.
    Ncbiqna,
    /// Primer base followed by one colour per base.
    Colorspace,
}

impl Coding {
    pub fn bytes_per_base(self) -> usize {
        match self {
            Coding::Ncbipna => NCBIPNA_BYTES,
            Coding::Ncbiqna => NCBIQNA_BYTES,
            _ => 1,
        }
    }

    /// Number of bases encoded by `data_len` bytes.
    pub fn base_len(self, data_len: usize) -> usize {
        match self {
            Coding::Colorspace => data_len.saturating_sub(1),
            _ => data_len / self.bytes_per_base(),
        }
    }

    /// How far a window start may move to dodge ambiguous bases.
    pub fn optimizable_offset(self) -> usize {
        match self {
            Coding::Ncbipna | Coding::Ncbiqna => 4,
            Coding::Iupac | Coding::Ncbi4na => 2,
            Coding::Ncbi2na | Coding::Colorspace => 0,
        }
    }
}

/// A borrowed sequence in one of the supported encodings.
#[derive(Debug, Clone, Copy)]
pub struct SeqSlice<'a> {
    pub coding: Coding,
    pub data: &'a [u8],
}

impl<'a> SeqSlice<'a> {
    pub fn new(coding: Coding, data: &'a [u8]) -> Self {
        Self { coding, data }
    }

    /// Length in bases.
    #[inline]
    pub fn len(&self) -> usize {
        self.coding.base_len(self.data.len())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert every base to a 4-bit code.
    ///
    /// `threshold` only applies to the quality-weighted encodings.
    pub fn to_ncbi4na(&self, threshold: u8) -> Vec<u8> {
        match self.coding {
            Coding::Iupac => self.data.iter().map(|&b| iupac_to_ncbi4na(b)).collect(),
            Coding::Ncbi2na => self.data.iter().map(|&c| ncbi2na_to_ncbi4na(c)).collect(),
            Coding::Ncbi4na => self.data.iter().map(|&c| c & 0x0F).collect(),
            Coding::Ncbipna => self
                .data
                .chunks_exact(NCBIPNA_BYTES)
                .map(|s| ncbipna_to_ncbi4na(s, threshold))
                .collect(),
            Coding::Ncbiqna => self
                .data
                .chunks_exact(NCBIQNA_BYTES)
                .map(|s| ncbiqna_to_ncbi4na(s, threshold))
                .collect(),
            Coding::Colorspace => colorspace_to_ncbi4na(self.data),
        }
    }

    /// Complement every base in place of the same encoding.
    pub fn complement(&self) -> Vec<u8> {
        match self.coding {
            Coding::Iupac => self.data.iter().map(|&b| iupac_complement(b)).collect(),
            Coding::Ncbi2na => self.data.iter().map(|&c| ncbi2na_complement(c)).collect(),
            Coding::Ncbi4na => self.data.iter().map(|&c| ncbi4na_complement(c)).collect(),
            Coding::Ncbipna => self
                .data
                .chunks_exact(NCBIPNA_BYTES)
                .flat_map(|s| ncbipna_complement([s[0], s[1], s[2], s[3], s[4]]))
                .collect(),
            Coding::Ncbiqna => self
                .data
                .chunks_exact(NCBIQNA_BYTES)
                .flat_map(|s| ncbiqna_complement([s[0], s[1]]))
                .collect(),
            Coding::Colorspace => {
                let mut out = self.data.to_vec();
                if let Some(primer) = out.first_mut() {
                    *primer = iupac_complement(*primer);
                }
                out
            }
        }
    }

    /// Reverse complement in the same encoding.
    ///
    /// For color-space the colours are reversed and the new primer is the
    /// complement of the last decoded base, which makes the operation an
    /// involution for reads without unknown colours.
    pub fn reverse_complement(&self) -> Vec<u8> {
        match self.coding {
            Coding::Iupac | Coding::Ncbi2na | Coding::Ncbi4na => {
                let mut out = self.complement();
                out.reverse();
                out
            }
            Coding::Ncbipna | Coding::Ncbiqna => {
                let width = self.coding.bytes_per_base();
                let complemented = self.complement();
                complemented
                    .chunks_exact(width)
                    .rev()
                    .flat_map(|c| c.iter().copied())
                    .collect()
            }
            Coding::Colorspace => {
                if self.data.is_empty() {
                    return Vec::new();
                }
                let last = colorspace_to_ncbi4na(self.data)
                    .last()
                    .copied()
                    .unwrap_or_else(|| iupac_to_ncbi4na(self.data[0]));
                let mut out = Vec::with_capacity(self.data.len());
                out.push(ncbi4na_to_iupac(ncbi4na_complement(last)));
                out.extend(self.data[1..].iter().rev().copied());
                out
            }
        }
    }
}
