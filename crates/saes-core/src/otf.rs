//! On-the-fly AES key schedules.
//!
//! [`KeyStream`] yields schedule words from the raw key in order; [`ReverseKeyStream`]
//! runs the expansion backwards from the final `Nk` words, which is all a
//! decryptor needs to regenerate every round key without storing a schedule.

use crate::block::{load_words, store_words, Block};
use crate::cipher::{add_round_key, dec_round, enc_round, schedule_tweak};
use crate::error::{ensure_len, Result};
use crate::gf256::inv_mix_word;
use crate::instruction::CipherFn;
use crate::key::{AesKey, KeySize, RoundKeys};

/// Forward key expansion with an `Nk`-word sliding window.
#[derive(Clone, Debug)]
pub struct KeyStream {
    size: KeySize,
    window: [u32; 8],
    index: usize,
}

impl KeyStream {
    /// Starts the expansion at word 0.
    pub fn new(key: &AesKey) -> Self {
        Self {
            size: key.size(),
            window: key.words(),
            index: 0,
        }
    }

    fn next_word(&mut self) -> u32 {
        let nk = self.size.key_words();
        let i = self.index;
        self.index += 1;
        if i < nk {
            return self.window[i];
        }
        let prev = self.window[(i - 1) % nk];
        let word = self.window[i % nk] ^ schedule_tweak(self.size, i, prev);
        self.window[i % nk] = word;
        word
    }

    fn take_round_key(&mut self) -> [u32; 4] {
        core::array::from_fn(|_| self.next_word())
    }

    /// Next round key as four words, or `None` once all `Nr + 1` keys are out.
    pub fn next_round_key(&mut self) -> Option<[u32; 4]> {
        (self.index + 4 <= self.size.schedule_words()).then(|| self.take_round_key())
    }
}

impl Iterator for KeyStream {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        (self.index < self.size.schedule_words()).then(|| self.next_word())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.size.schedule_words().saturating_sub(self.index);
        (left, Some(left))
    }
}

impl ExactSizeIterator for KeyStream {}

/// Backward key expansion: yields words `4*Nr+3` down to `0`.
#[derive(Clone, Debug)]
pub struct ReverseKeyStream {
    size: KeySize,
    window: [u32; 8],
    remaining: usize,
}

impl ReverseKeyStream {
    /// Starts from the last `Nk` words of an encryption schedule.
    pub fn new(size: KeySize, final_words: &[u32]) -> Result<Self> {
        let nk = size.key_words();
        ensure_len("final key words", nk, final_words.len())?;
        let total = size.schedule_words();
        let mut window = [0u32; 8];
        for (offset, &word) in final_words.iter().enumerate() {
            window[(total - nk + offset) % nk] = word;
        }
        Ok(Self {
            size,
            window,
            remaining: total,
        })
    }

    fn next_word(&mut self) -> u32 {
        let nk = self.size.key_words();
        self.remaining -= 1;
        let j = self.remaining;
        if j >= self.size.schedule_words() - nk {
            return self.window[j % nk];
        }
        // w[j] = w[j + nk] ^ tweak(w[j + nk - 1]); w[j + nk] sits in slot j % nk.
        let prev = self.window[(j + nk - 1) % nk];
        let word = self.window[j % nk] ^ schedule_tweak(self.size, j + nk, prev);
        self.window[j % nk] = word;
        word
    }

    fn take_round_key(&mut self) -> [u32; 4] {
        let [w3, w2, w1, w0]: [u32; 4] = core::array::from_fn(|_| self.next_word());
        [w0, w1, w2, w3]
    }

    /// Previous round key as four words in natural order, or `None` once
    /// round key 0 has been produced.
    pub fn next_round_key(&mut self) -> Option<[u32; 4]> {
        (self.remaining >= 4).then(|| self.take_round_key())
    }
}

impl Iterator for ReverseKeyStream {
    type Item = u32;

    fn next(&mut self) -> Option<u32> {
        (self.remaining > 0).then(|| self.next_word())
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl ExactSizeIterator for ReverseKeyStream {}

/// Builds the decryption schedule from the final `Nk` encryption words alone,
/// applying InvMixColumns by direct field arithmetic.
pub fn dec_key_from_final(size: KeySize, final_words: &[u32]) -> Result<RoundKeys> {
    let mut words: Vec<u32> = ReverseKeyStream::new(size, final_words)?.collect();
    words.reverse();
    let len = words.len();
    for word in &mut words[4..len - 4] {
        *word = inv_mix_word(*word);
    }
    RoundKeys::from_words(size, &words)
}

/// Encrypts a block, generating round keys as the rounds consume them.
pub fn encrypt_block_otf(key: &AesKey, pt: &Block) -> Block {
    let nr = key.size().rounds();
    let mut keys = KeyStream::new(key);
    let mut state = load_words(pt);
    add_round_key(&mut state, keys.take_round_key());
    for round in 1..=nr {
        let cipher = if round < nr {
            CipherFn::AesFwdMix
        } else {
            CipherFn::AesFwd
        };
        state = enc_round(&state, keys.take_round_key(), cipher);
    }
    store_words(&state)
}

/// Decrypts a block given only the final `Nk` words of the encryption
/// schedule, walking the key expansion backwards.
pub fn decrypt_block_otf(size: KeySize, final_words: &[u32], ct: &Block) -> Result<Block> {
    let nr = size.rounds();
    let mut keys = ReverseKeyStream::new(size, final_words)?;
    let mut state = load_words(ct);
    add_round_key(&mut state, keys.take_round_key());
    for round in (0..nr).rev() {
        let key = keys.take_round_key();
        state = if round > 0 {
            dec_round(&state, key.map(inv_mix_word), CipherFn::AesInvMix)
        } else {
            dec_round(&state, key, CipherFn::AesInv)
        };
    }
    Ok(store_words(&state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{aes_dec_block, aes_dec_key, aes_enc_block, aes_enc_key};
    use crate::error::Error;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    fn random_key(rng: &mut ChaCha20Rng, size: KeySize) -> AesKey {
        let mut bytes = vec![0u8; size.key_bytes()];
        rng.fill_bytes(&mut bytes);
        AesKey::from_slice(&bytes).expect("valid key")
    }

    #[test]
    fn forward_stream_equals_stored_schedule() {
        let mut rng = ChaCha20Rng::from_seed([31u8; 32]);
        for size in KeySize::ALL {
            let key = random_key(&mut rng, size);
            let streamed: Vec<u32> = KeyStream::new(&key).collect();
            assert_eq!(streamed, aes_enc_key(&key).words());
            assert_eq!(KeyStream::new(&key).len(), size.schedule_words());
        }
    }

    #[test]
    fn reverse_stream_recovers_whole_schedule() {
        let mut rng = ChaCha20Rng::from_seed([32u8; 32]);
        for size in KeySize::ALL {
            for _ in 0..20 {
                let enc = aes_enc_key(&random_key(&mut rng, size));
                let mut backwards: Vec<u32> =
                    ReverseKeyStream::new(size, enc.final_words()).expect("nk words").collect();
                backwards.reverse();
                assert_eq!(backwards, enc.words());
            }
        }
    }

    #[test]
    fn inverse_schedules_agree() {
        // Encrypt-then-invert-middle-rounds versus the backward schedule.
        let mut rng = ChaCha20Rng::from_seed([33u8; 32]);
        for size in KeySize::ALL {
            for _ in 0..50 {
                let key = random_key(&mut rng, size);
                let enc = aes_enc_key(&key);
                let direct = dec_key_from_final(size, enc.final_words()).expect("nk words");
                assert_eq!(direct, aes_dec_key(&key));
            }
        }
    }

    #[test]
    fn otf_block_operations_match_stored_schedules() {
        let mut rng = ChaCha20Rng::from_seed([34u8; 32]);
        for size in KeySize::ALL {
            for _ in 0..20 {
                let key = random_key(&mut rng, size);
                let enc = aes_enc_key(&key);
                let mut block = [0u8; 16];
                rng.fill_bytes(&mut block);
                let ct = aes_enc_block(&block, &enc);
                assert_eq!(encrypt_block_otf(&key, &block), ct);
                let pt = decrypt_block_otf(size, enc.final_words(), &ct).expect("nk words");
                assert_eq!(pt, block);
                assert_eq!(aes_dec_block(&ct, &aes_dec_key(&key)), pt);
            }
        }
    }

    #[test]
    fn round_key_streams_stop_after_last_round() {
        let mut rng = ChaCha20Rng::from_seed([35u8; 32]);
        for size in KeySize::ALL {
            let key = random_key(&mut rng, size);
            let enc = aes_enc_key(&key);

            let mut forward = KeyStream::new(&key);
            for round in 0..=size.rounds() {
                assert_eq!(forward.next_round_key(), Some(enc.get(round)));
            }
            assert_eq!(forward.next_round_key(), None);
            assert_eq!(forward.next_round_key(), None);
            assert_eq!(forward.next(), None);

            let mut backward = ReverseKeyStream::new(size, enc.final_words()).expect("nk words");
            for round in (0..=size.rounds()).rev() {
                assert_eq!(backward.next_round_key(), Some(enc.get(round)));
            }
            assert_eq!(backward.next_round_key(), None);
            assert_eq!(backward.next_round_key(), None);
            assert_eq!(backward.next(), None);
        }
    }

    #[test]
    fn reverse_stream_rejects_wrong_word_count() {
        let err = ReverseKeyStream::new(KeySize::Aes256, &[0u32; 4]).unwrap_err();
        assert!(matches!(
            err,
            Error::PreconditionViolation {
                expected: 8,
                actual: 4,
                ..
            }
        ));
    }
}
