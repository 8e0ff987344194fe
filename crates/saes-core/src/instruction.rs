//! The single-byte cipher instruction: byte select, S-box, optional diffusion,
//! rotate, and XOR into an accumulator.
//!
//! Every AES and SM4 round function in this crate is a fixed sequence of
//! [`saes32`] calls. The 7-bit function code is laid out as
//!
//! ```text
//!   6   4 3   2 1   0
//!  +-----+-----+-----+
//!  | fn  | rot | sel |
//!  +-----+-----+-----+
//! ```
//!
//! where `sel` picks the source byte, `rot` the output rotation in bytes and
//! `fn` one of the [`CipherFn`] transforms.

use crate::error::{Error, Result};
use crate::gf256::{inv_mix_column, mix_column};
use crate::sbox::{inv_sbox, sbox, sm4_sbox};

/// Substitution and diffusion pair applied to the selected byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum CipherFn {
    /// AES S-box followed by one MixColumns column.
    AesFwdMix = 0,
    /// AES S-box only (final round, key schedule).
    AesFwd = 1,
    /// AES inverse S-box followed by one InvMixColumns column.
    AesInvMix = 2,
    /// AES inverse S-box only (final decryption round).
    AesInv = 3,
    /// SM4 S-box followed by the round linear transform `L`.
    Sm4Enc = 4,
    /// SM4 S-box followed by the key schedule transform `L'`.
    Sm4Key = 5,
}

impl CipherFn {
    /// All defined functions, indexed by their code.
    pub const ALL: [CipherFn; 6] = [
        CipherFn::AesFwdMix,
        CipherFn::AesFwd,
        CipherFn::AesInvMix,
        CipherFn::AesInv,
        CipherFn::Sm4Enc,
        CipherFn::Sm4Key,
    ];

    /// Decodes a 3-bit function field.
    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.get(usize::from(code)).copied()
    }

    /// Applies substitution and diffusion to one byte, producing the
    /// unrotated 32-bit contribution.
    #[inline]
    pub fn expand(self, byte: u8) -> u32 {
        match self {
            CipherFn::AesFwdMix => mix_column(sbox(byte)),
            CipherFn::AesFwd => u32::from(sbox(byte)),
            CipherFn::AesInvMix => inv_mix_column(inv_sbox(byte)),
            CipherFn::AesInv => u32::from(inv_sbox(byte)),
            CipherFn::Sm4Enc => sm4_linear(sm4_sbox(byte)),
            CipherFn::Sm4Key => sm4_key_linear(sm4_sbox(byte)),
        }
    }
}

/// SM4 `L(B) = B ^ (B <<< 2) ^ (B <<< 10) ^ (B <<< 18) ^ (B <<< 24)` for a
/// byte in the most significant (first in memory) position, returned as a
/// little-endian packed word.
#[inline]
fn sm4_linear(byte: u8) -> u32 {
    let b = u32::from(byte) << 24;
    (b ^ b.rotate_left(2) ^ b.rotate_left(10) ^ b.rotate_left(18) ^ b.rotate_left(24)).swap_bytes()
}

/// SM4 key schedule `L'(B) = B ^ (B <<< 13) ^ (B <<< 23)`, little-endian packed.
#[inline]
fn sm4_key_linear(byte: u8) -> u32 {
    let b = u32::from(byte) << 24;
    (b ^ b.rotate_left(13) ^ b.rotate_left(23)).swap_bytes()
}

/// A decoded 7-bit function code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FnCode {
    cipher: CipherFn,
    select: u8,
    rotate: u8,
}

impl FnCode {
    /// Builds a code; only the low two bits of `select` and `rotate` are used.
    pub const fn new(cipher: CipherFn, select: u8, rotate: u8) -> Self {
        Self {
            cipher,
            select: select & 3,
            rotate: rotate & 3,
        }
    }

    /// Code whose output rotation equals its byte select, the pattern used by
    /// every round function.
    pub const fn diagonal(cipher: CipherFn, byte: u8) -> Self {
        Self::new(cipher, byte, byte)
    }

    /// Decodes a raw 7-bit code, rejecting unused function values.
    pub fn from_bits(bits: u8) -> Result<Self> {
        if bits & 0x80 != 0 {
            return Err(Error::InvalidFnCode { bits });
        }
        let cipher = CipherFn::from_code(bits >> 4).ok_or(Error::InvalidFnCode { bits })?;
        Ok(Self::new(cipher, bits, bits >> 2))
    }

    /// Encodes back to the 7-bit representation.
    pub const fn bits(self) -> u8 {
        ((self.cipher as u8) << 4) | (self.rotate << 2) | self.select
    }

    /// Cipher function field.
    pub const fn cipher(self) -> CipherFn {
        self.cipher
    }

    /// Byte select field (0..=3).
    pub const fn select(self) -> u8 {
        self.select
    }

    /// Output rotation field in bytes (0..=3).
    pub const fn rotate(self) -> u8 {
        self.rotate
    }
}

/// Executes the instruction: substitutes byte `select` of `a`, expands it per
/// the cipher function, rotates left by `8 * rotate` bits and XORs into `b`.
#[inline]
pub fn saes32(a: u32, b: u32, code: FnCode) -> u32 {
    let byte = (a >> (8 * u32::from(code.select))) as u8;
    code.cipher
        .expand(byte)
        .rotate_left(8 * u32::from(code.rotate))
        ^ b
}

/// Applies [`saes32`] to all four bytes of `a` with diagonal codes, XORing
/// the results into `b`.
#[inline]
pub fn saes32_x4(a: u32, b: u32, cipher: CipherFn) -> u32 {
    (0..4).fold(b, |acc, byte| saes32(a, acc, FnCode::diagonal(cipher, byte)))
}
