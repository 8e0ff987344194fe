//! SM4 block cipher (GB/T 32907-2016) on the cipher instruction.

use core::fmt;

use crate::block::{load_words, store_words, Block};
use crate::error::{Error, Result};
use crate::instruction::{saes32_x4, CipherFn};

/// Number of SM4 rounds and round-key words.
pub const SM4_ROUNDS: usize = 32;

/// System parameter `FK`, as little-endian words.
const FK: [u32; 4] = [0xc6ba_b1a3, 0x5033_aa56, 0x9791_7d67, 0xdc22_70b2];

/// Round constants `CK`: bytes `7 * i mod 256` read as little-endian words.
const CK: [u32; SM4_ROUNDS] = {
    let mut ck = [0u32; SM4_ROUNDS];
    let mut i = 0;
    while i < SM4_ROUNDS {
        let b = (4 * i * 7) as u32;
        ck[i] = (b & 0xff)
            | (((b + 7) & 0xff) << 8)
            | (((b + 14) & 0xff) << 16)
            | (((b + 21) & 0xff) << 24);
        i += 1;
    }
    ck
};

/// SM4 key of 16 bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct Sm4Key(pub [u8; 16]);

impl From<[u8; 16]> for Sm4Key {
    fn from(value: [u8; 16]) -> Self {
        Self(value)
    }
}

impl Sm4Key {
    /// Copies a key from a 16-byte slice.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let key: [u8; 16] = bytes
            .try_into()
            .map_err(|_| Error::PreconditionViolation {
                what: "SM4 key",
                expected: 16,
                actual: bytes.len(),
            })?;
        Ok(Self(key))
    }
}

impl fmt::Debug for Sm4Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sm4Key(..)")
    }
}

/// 32 SM4 round keys in the order a block operation consumes them.
#[derive(Clone, PartialEq, Eq)]
pub struct Sm4RoundKeys(pub [u32; SM4_ROUNDS]);

impl Sm4RoundKeys {
    /// The same keys consumed in the opposite order.
    pub fn reversed(&self) -> Self {
        let mut rk = self.0;
        rk.reverse();
        Self(rk)
    }
}

impl fmt::Debug for Sm4RoundKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Sm4RoundKeys(..)")
    }
}

/// Shared four-branch round structure: each round replaces one branch with
/// `x[i] ^ T(x[i+1] ^ x[i+2] ^ x[i+3] ^ k)`.
#[inline]
fn rounds(x: &mut [u32; 4], keys: impl IntoIterator<Item = u32>, cipher: CipherFn) {
    for (i, k) in keys.into_iter().enumerate() {
        let t = k ^ x[(i + 1) % 4] ^ x[(i + 2) % 4] ^ x[(i + 3) % 4];
        x[i % 4] = saes32_x4(t, x[i % 4], cipher);
    }
}

/// Expands a key into encryption round keys.
pub fn sm4_enc_key(key: &Sm4Key) -> Sm4RoundKeys {
    let mut x = load_words(&key.0);
    for (w, fk) in x.iter_mut().zip(FK) {
        *w ^= fk;
    }
    let mut rk = [0u32; SM4_ROUNDS];
    for (i, ck) in CK.iter().enumerate() {
        let t = ck ^ x[(i + 1) % 4] ^ x[(i + 2) % 4] ^ x[(i + 3) % 4];
        x[i % 4] = saes32_x4(t, x[i % 4], CipherFn::Sm4Key);
        rk[i] = x[i % 4];
    }
    Sm4RoundKeys(rk)
}

/// Expands a key into decryption round keys (the encryption keys reversed).
pub fn sm4_dec_key(key: &Sm4Key) -> Sm4RoundKeys {
    sm4_enc_key(key).reversed()
}

/// Encrypts or decrypts one block, depending on the round-key order.
pub fn sm4_block(input: &Block, rk: &Sm4RoundKeys) -> Block {
    let mut x = load_words(input);
    rounds(&mut x, rk.0, CipherFn::Sm4Enc);
    x.reverse();
    store_words(&x)
}
