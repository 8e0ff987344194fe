//! Byte-state FIPS-197 AES, independent of the cipher instruction.
//!
//! Serves as the oracle the instruction-based engines are checked against.
//! Decryption uses the equivalent inverse cipher so that it consumes the same
//! decryption schedule layout as the other engines.

use crate::block::{load_words, store_words, xor_in_place, Block};
use crate::gf256::{inv_mix_word, mix_word};
use crate::key::{AesKey, RoundKeys};
use crate::sbox::{inv_sbox, sbox, RCON};

/// Applies SubBytes to the state in place.
#[inline]
pub fn sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = sbox(*byte);
    }
}

/// Applies the inverse SubBytes transformation.
#[inline]
pub fn inv_sub_bytes(state: &mut Block) {
    for byte in state.iter_mut() {
        *byte = inv_sbox(*byte);
    }
}

/// ShiftRows: row `r` (bytes `r, r+4, r+8, r+12`) rotates left by `r`.
#[inline]
pub fn shift_rows(state: &mut Block) {
    let src = *state;
    for (i, byte) in state.iter_mut().enumerate() {
        *byte = src[(i + 4 * (i % 4)) % 16];
    }
}

/// Inverse ShiftRows.
#[inline]
pub fn inv_shift_rows(state: &mut Block) {
    let src = *state;
    for (i, byte) in state.iter_mut().enumerate() {
        *byte = src[(i + 16 - 4 * (i % 4)) % 16];
    }
}

/// MixColumns over all four columns.
#[inline]
pub fn mix_columns(state: &mut Block) {
    let words = load_words(state).map(mix_word);
    *state = store_words(&words);
}

/// Inverse MixColumns over all four columns.
#[inline]
pub fn inv_mix_columns(state: &mut Block) {
    let words = load_words(state).map(inv_mix_word);
    *state = store_words(&words);
}

fn round_key(rk: &RoundKeys, round: usize) -> Block {
    store_words(&rk.get(round))
}

fn sub_word_be(word: u32) -> u32 {
    u32::from_be_bytes(word.to_be_bytes().map(sbox))
}

/// Textbook key expansion on big-endian words, repacked little-endian.
pub fn expand_key(key: &AesKey) -> RoundKeys {
    let size = key.size();
    let nk = size.key_words();
    let mut rk = RoundKeys::zeroed(size);
    let w = rk.words_mut();
    for (word, chunk) in w.iter_mut().zip(key.as_bytes().chunks_exact(4)) {
        *word = u32::from_be_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
    }
    for i in nk..w.len() {
        let mut temp = w[i - 1];
        if i % nk == 0 {
            temp = sub_word_be(temp.rotate_left(8)) ^ (u32::from(RCON[i / nk - 1]) << 24);
        } else if nk > 6 && i % nk == 4 {
            temp = sub_word_be(temp);
        }
        w[i] = w[i - nk] ^ temp;
    }
    for word in w.iter_mut() {
        *word = word.swap_bytes();
    }
    rk
}

/// Decryption schedule: InvMixColumns applied to round keys `1..Nr`.
pub fn expand_dec_key(key: &AesKey) -> RoundKeys {
    let mut rk = expand_key(key);
    for round in 1..rk.rounds() {
        let mut block = round_key(&rk, round);
        inv_mix_columns(&mut block);
        rk.words_mut()[4 * round..4 * round + 4].copy_from_slice(&load_words(&block));
    }
    rk
}

/// Encrypts a single block.
pub fn encrypt_block(block: &Block, rk: &RoundKeys) -> Block {
    let nr = rk.rounds();
    let mut state = *block;
    xor_in_place(&mut state, &round_key(rk, 0));
    for round in 1..=nr {
        sub_bytes(&mut state);
        shift_rows(&mut state);
        if round != nr {
            mix_columns(&mut state);
        }
        xor_in_place(&mut state, &round_key(rk, round));
    }
    state
}

/// Decrypts a single block with a schedule from [`expand_dec_key`].
pub fn decrypt_block(block: &Block, rk: &RoundKeys) -> Block {
    let nr = rk.rounds();
    let mut state = *block;
    xor_in_place(&mut state, &round_key(rk, nr));
    for round in (0..nr).rev() {
        inv_sub_bytes(&mut state);
        inv_shift_rows(&mut state);
        if round != 0 {
            inv_mix_columns(&mut state);
        }
        xor_in_place(&mut state, &round_key(rk, round));
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cipher::{aes_dec_key, aes_enc_key};
    use crate::key::KeySize;
    use rand::RngCore;

    #[test]
    fn shift_rows_matches_fixed_permutation() {
        let mut state: Block = core::array::from_fn(|i| i as u8);
        shift_rows(&mut state);
        assert_eq!(
            state,
            [0, 5, 10, 15, 4, 9, 14, 3, 8, 13, 2, 7, 12, 1, 6, 11]
        );
        inv_shift_rows(&mut state);
        assert_eq!(state, core::array::from_fn(|i| i as u8));
    }

    #[test]
    fn fips_197_appendix_c1() {
        let key = AesKey::from(core::array::from_fn::<u8, 16, _>(|i| i as u8));
        let plain: Block = core::array::from_fn(|i| (i as u8) * 0x11);
        let ct = encrypt_block(&plain, &expand_key(&key));
        assert_eq!(
            ct,
            [
                0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4,
                0xc5, 0x5a
            ]
        );
        assert_eq!(decrypt_block(&ct, &expand_dec_key(&key)), plain);
    }

    #[test]
    fn schedules_match_instruction_engine() {
        let mut rng = rand::thread_rng();
        for size in KeySize::ALL {
            for _ in 0..20 {
                let mut bytes = vec![0u8; size.key_bytes()];
                rng.fill_bytes(&mut bytes);
                let key = AesKey::from_slice(&bytes).expect("valid key");
                assert_eq!(expand_key(&key), aes_enc_key(&key));
                assert_eq!(expand_dec_key(&key), aes_dec_key(&key));
            }
        }
    }
}
