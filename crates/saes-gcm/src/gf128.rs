//! GF(2^128) element storage and the bit-reflection between GCM byte order
//! and the carry-less multiplier convention.

use core::ops::{BitXor, BitXorAssign};

use saes_core::bitmanip::grev64;
use saes_core::{load_dwords, store_dwords, Block};

/// A 128-bit field element held as two little-endian 64-bit words of its
/// 16-byte string. The same bytes viewed as four 32-bit words feed the 32-bit
/// kernels; the layout carries no meaning beyond that.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Gf128(pub [u64; 2]);

impl Gf128 {
    /// The all-zero element.
    pub const ZERO: Self = Self([0, 0]);

    /// Loads sixteen bytes.
    pub fn from_bytes(bytes: &Block) -> Self {
        Self(load_dwords(bytes))
    }

    /// Stores as sixteen bytes.
    pub fn to_bytes(self) -> Block {
        store_dwords(&self.0)
    }

    /// Four little-endian 32-bit words, lowest first.
    pub fn to_words(self) -> [u32; 4] {
        let [lo, hi] = self.0;
        [lo as u32, (lo >> 32) as u32, hi as u32, (hi >> 32) as u32]
    }

    /// Inverse of [`Gf128::to_words`].
    pub fn from_words(words: [u32; 4]) -> Self {
        let [w0, w1, w2, w3] = words.map(u64::from);
        Self([w0 | (w1 << 32), w2 | (w3 << 32)])
    }

    /// Reverses the bits within every byte, mapping between GCM's natural
    /// order and the reflected order the multipliers work in. An involution,
    /// independent of whether it is applied per 32- or 64-bit word.
    pub fn reflect(self) -> Self {
        Self(self.0.map(|d| grev64(d, 7)))
    }
}

impl BitXor for Gf128 {
    type Output = Self;

    fn bitxor(self, rhs: Self) -> Self {
        Self([self.0[0] ^ rhs.0[0], self.0[1] ^ rhs.0[1]])
    }
}

impl BitXorAssign for Gf128 {
    fn bitxor_assign(&mut self, rhs: Self) {
        *self = *self ^ rhs;
    }
}

impl From<Block> for Gf128 {
    fn from(value: Block) -> Self {
        Self::from_bytes(&value)
    }
}
