//! Software model of a single-sbox cipher instruction and the block ciphers
//! built from it.
//!
//! The crate provides:
//! - The `saes32` instruction: one S-box lookup, an optional linear layer and a
//!   rotate, selected by a packed function code.
//! - AES-128/192/256 key schedules and block operations on that instruction, a
//!   64-bit paired-column variant and a byte-oriented reference engine.
//! - On-the-fly key schedules that run forwards from the key or backwards from
//!   the final round key.
//! - SM4 key schedule and block operation on the same instruction.
//! - The bit-manipulation primitives (`grev`, `shfl`, `clmul`, ...) that the
//!   GHASH kernels are written against.
//!
//! Table lookups are plain array indexing; nothing here is side-channel hardened.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod backend;
pub mod bitmanip;
mod block;
mod cipher;
mod error;
pub mod gf256;
mod instruction;
mod key;
pub mod otf;
pub mod reference;
pub mod saes64;
pub mod sbox;
mod sm4;

pub use crate::backend::{AesBackend, Reference, Saes32, Saes64};
pub use crate::block::{
    load_dwords, load_words, store_dwords, store_words, xor_in_place, Block, BLOCK_BYTES,
};
pub use crate::cipher::{
    aes128_dec_key, aes128_enc_key, aes192_dec_key, aes192_enc_key, aes256_dec_key,
    aes256_enc_key, aes_dec_block, aes_dec_key, aes_enc_block, aes_enc_key, dec_key_from_enc,
};
pub use crate::error::{ensure_len, Error, Result};
pub use crate::instruction::{saes32, saes32_x4, CipherFn, FnCode};
pub use crate::key::{AesKey, KeySize, RoundKeys, MAX_SCHEDULE_WORDS};
pub use crate::sm4::{sm4_block, sm4_dec_key, sm4_enc_key, Sm4Key, Sm4RoundKeys, SM4_ROUNDS};
