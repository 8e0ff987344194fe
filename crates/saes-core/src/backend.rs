//! Interchangeable AES engines behind one trait.
//!
//! All three engines produce and consume the same [`RoundKeys`] layout, so a
//! schedule expanded by one may drive blocks through another.

use crate::block::Block;
use crate::key::{AesKey, RoundKeys};
use crate::{cipher, reference, saes64};

/// A complete AES implementation: key expansion in both directions plus
/// single-block encryption and decryption.
pub trait AesBackend {
    /// Short lowercase identifier used in logs and on the command line.
    fn name(&self) -> &'static str;

    /// Expands an encryption schedule.
    fn expand_enc_key(&self, key: &AesKey) -> RoundKeys;

    /// Expands a decryption schedule for the equivalent inverse cipher.
    fn expand_dec_key(&self, key: &AesKey) -> RoundKeys;

    /// Encrypts one block with an encryption schedule.
    fn encrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block;

    /// Decrypts one block with a decryption schedule.
    fn decrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block;
}

impl<T: AesBackend + ?Sized> AesBackend for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn expand_enc_key(&self, key: &AesKey) -> RoundKeys {
        (**self).expand_enc_key(key)
    }

    fn expand_dec_key(&self, key: &AesKey) -> RoundKeys {
        (**self).expand_dec_key(key)
    }

    fn encrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block {
        (**self).encrypt_block(rk, block)
    }

    fn decrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block {
        (**self).decrypt_block(rk, block)
    }
}

impl<T: AesBackend + ?Sized> AesBackend for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn expand_enc_key(&self, key: &AesKey) -> RoundKeys {
        (**self).expand_enc_key(key)
    }

    fn expand_dec_key(&self, key: &AesKey) -> RoundKeys {
        (**self).expand_dec_key(key)
    }

    fn encrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block {
        (**self).encrypt_block(rk, block)
    }

    fn decrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block {
        (**self).decrypt_block(rk, block)
    }
}

/// 32-bit single-sbox instruction engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Saes32;

/// 64-bit paired-column instruction engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Saes64;

/// Byte-oriented textbook engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Reference;

impl AesBackend for Saes32 {
    fn name(&self) -> &'static str {
        "saes32"
    }

    fn expand_enc_key(&self, key: &AesKey) -> RoundKeys {
        log::trace!("saes32: expanding {}-bit encryption key", key.size().bits());
        cipher::aes_enc_key(key)
    }

    fn expand_dec_key(&self, key: &AesKey) -> RoundKeys {
        log::trace!("saes32: expanding {}-bit decryption key", key.size().bits());
        cipher::aes_dec_key(key)
    }

    fn encrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block {
        cipher::aes_enc_block(block, rk)
    }

    fn decrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block {
        cipher::aes_dec_block(block, rk)
    }
}

impl AesBackend for Saes64 {
    fn name(&self) -> &'static str {
        "saes64"
    }

    fn expand_enc_key(&self, key: &AesKey) -> RoundKeys {
        log::trace!("saes64: expanding {}-bit encryption key", key.size().bits());
        saes64::enc_key(key)
    }

    fn expand_dec_key(&self, key: &AesKey) -> RoundKeys {
        log::trace!("saes64: expanding {}-bit decryption key", key.size().bits());
        saes64::dec_key(key)
    }

    fn encrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block {
        saes64::encrypt_block(block, rk)
    }

    fn decrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block {
        saes64::decrypt_block(block, rk)
    }
}

impl AesBackend for Reference {
    fn name(&self) -> &'static str {
        "reference"
    }

    fn expand_enc_key(&self, key: &AesKey) -> RoundKeys {
        reference::expand_key(key)
    }

    fn expand_dec_key(&self, key: &AesKey) -> RoundKeys {
        reference::expand_dec_key(key)
    }

    fn encrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block {
        reference::encrypt_block(block, rk)
    }

    fn decrypt_block(&self, rk: &RoundKeys, block: &Block) -> Block {
        reference::decrypt_block(block, rk)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key::KeySize;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn engines() -> [&'static dyn AesBackend; 3] {
        [&Saes32, &Saes64, &Reference]
    }

    #[test]
    fn names_are_distinct() {
        let names = engines().map(|e| e.name());
        assert_eq!(names, ["saes32", "saes64", "reference"]);
    }

    #[test]
    fn schedules_are_interchangeable() {
        let mut rng = ChaCha20Rng::from_seed([40u8; 32]);
        for size in KeySize::ALL {
            for _ in 0..25 {
                let mut bytes = vec![0u8; size.key_bytes()];
                rng.fill_bytes(&mut bytes);
                let key = AesKey::from_slice(&bytes).expect("valid key");
                let mut block = [0u8; 16];
                rng.fill_bytes(&mut block);

                let enc = Reference.expand_enc_key(&key);
                let dec = Reference.expand_dec_key(&key);
                let expected = Reference.encrypt_block(&enc, &block);
                for engine in engines() {
                    assert_eq!(engine.expand_enc_key(&key), enc, "{}", engine.name());
                    assert_eq!(engine.expand_dec_key(&key), dec, "{}", engine.name());
                    let ct = engine.encrypt_block(&enc, &block);
                    assert_eq!(ct, expected, "{}", engine.name());
                    assert_eq!(engine.decrypt_block(&dec, &ct), block, "{}", engine.name());
                }
            }
        }
    }
}
