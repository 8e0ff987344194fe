//! AES key schedules and block encryption/decryption built from [`saes32`].

use crate::block::{load_words, store_words, Block};
use crate::instruction::{saes32, saes32_x4, CipherFn, FnCode};
use crate::key::{AesKey, KeySize, RoundKeys};
use crate::sbox::RCON;

/// `SubWord(RotWord(word))` for a little-endian packed word, with the
/// rotation folded into the rotate field of each call.
pub(crate) fn sub_rot_word(word: u32) -> u32 {
    [(1, 0), (2, 1), (3, 2), (0, 3)]
        .iter()
        .fold(0, |acc, &(select, rotate)| {
            saes32(word, acc, FnCode::new(CipherFn::AesFwd, select, rotate))
        })
}

/// `SubWord(word)`.
pub(crate) fn sub_word(word: u32) -> u32 {
    saes32_x4(word, 0, CipherFn::AesFwd)
}

/// The non-linear term XORed into schedule word `i`, given word `i - 1`.
pub(crate) fn schedule_tweak(size: KeySize, i: usize, prev: u32) -> u32 {
    let nk = size.key_words();
    if i % nk == 0 {
        sub_rot_word(prev) ^ u32::from(RCON[i / nk - 1])
    } else if nk == 8 && i % nk == 4 {
        sub_word(prev)
    } else {
        prev
    }
}

/// InvMixColumns of one round-key word, computed as forward substitution
/// followed by the inverse-with-diffusion function.
pub(crate) fn inv_mix_key_word(word: u32) -> u32 {
    saes32_x4(sub_word(word), 0, CipherFn::AesInvMix)
}

/// Expands an AES key of any size into its encryption schedule.
pub fn aes_enc_key(key: &AesKey) -> RoundKeys {
    let size = key.size();
    let nk = size.key_words();
    let mut rk = RoundKeys::zeroed(size);
    let w = rk.words_mut();
    w[..nk].copy_from_slice(&key.words()[..nk]);
    for i in nk..w.len() {
        w[i] = w[i - nk] ^ schedule_tweak(size, i, w[i - 1]);
    }
    rk
}

/// Converts an encryption schedule into the equivalent-inverse-cipher
/// decryption schedule by applying InvMixColumns to the middle rounds.
pub fn dec_key_from_enc(enc: &RoundKeys) -> RoundKeys {
    let mut rk = enc.clone();
    let w = rk.words_mut();
    let len = w.len();
    for word in &mut w[4..len - 4] {
        *word = inv_mix_key_word(*word);
    }
    rk
}

/// Expands an AES key of any size into its decryption schedule.
pub fn aes_dec_key(key: &AesKey) -> RoundKeys {
    dec_key_from_enc(&aes_enc_key(key))
}

/// AES-128 encryption schedule (44 words).
pub fn aes128_enc_key(key: &[u8; 16]) -> RoundKeys {
    aes_enc_key(&AesKey::Aes128(*key))
}

/// AES-192 encryption schedule (52 words).
pub fn aes192_enc_key(key: &[u8; 24]) -> RoundKeys {
    aes_enc_key(&AesKey::Aes192(*key))
}

/// AES-256 encryption schedule (60 words).
pub fn aes256_enc_key(key: &[u8; 32]) -> RoundKeys {
    aes_enc_key(&AesKey::Aes256(*key))
}

/// AES-128 decryption schedule.
pub fn aes128_dec_key(key: &[u8; 16]) -> RoundKeys {
    aes_dec_key(&AesKey::Aes128(*key))
}

/// AES-192 decryption schedule.
pub fn aes192_dec_key(key: &[u8; 24]) -> RoundKeys {
    aes_dec_key(&AesKey::Aes192(*key))
}

/// AES-256 decryption schedule.
pub fn aes256_dec_key(key: &[u8; 32]) -> RoundKeys {
    aes_dec_key(&AesKey::Aes256(*key))
}

/// One encryption round: output word `i` gathers byte `j` from state word
/// `i + j`, which realizes ShiftRows.
#[inline]
pub(crate) fn enc_round(state: &[u32; 4], key: [u32; 4], cipher: CipherFn) -> [u32; 4] {
    core::array::from_fn(|i| {
        (0..4).fold(key[i], |acc, j| {
            saes32(state[(i + j) % 4], acc, FnCode::diagonal(cipher, j as u8))
        })
    })
}

/// One decryption round: byte `j` comes from state word `i - j`.
#[inline]
pub(crate) fn dec_round(state: &[u32; 4], key: [u32; 4], cipher: CipherFn) -> [u32; 4] {
    core::array::from_fn(|i| {
        (0..4).fold(key[i], |acc, j| {
            saes32(state[(i + 4 - j) % 4], acc, FnCode::diagonal(cipher, j as u8))
        })
    })
}

#[inline]
pub(crate) fn add_round_key(state: &mut [u32; 4], key: [u32; 4]) {
    for (s, k) in state.iter_mut().zip(key) {
        *s ^= k;
    }
}

/// Encrypts one block with an encryption schedule.
pub fn aes_enc_block(pt: &Block, rk: &RoundKeys) -> Block {
    let nr = rk.rounds();
    let mut state = load_words(pt);
    add_round_key(&mut state, rk.get(0));
    for round in 1..nr {
        state = enc_round(&state, rk.get(round), CipherFn::AesFwdMix);
    }
    state = enc_round(&state, rk.get(nr), CipherFn::AesFwd);
    store_words(&state)
}

/// Decrypts one block with a decryption schedule from [`aes_dec_key`].
pub fn aes_dec_block(ct: &Block, rk: &RoundKeys) -> Block {
    let nr = rk.rounds();
    let mut state = load_words(ct);
    add_round_key(&mut state, rk.get(nr));
    for round in (1..nr).rev() {
        state = dec_round(&state, rk.get(round), CipherFn::AesInvMix);
    }
    state = dec_round(&state, rk.get(0), CipherFn::AesInv);
    store_words(&state)
}
