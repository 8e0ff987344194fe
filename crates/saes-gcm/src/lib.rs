//! GHASH multipliers and AES-GCM on top of the `saes-core` cipher engines.
//!
//! This crate provides:
//! - [`Gf128`], the 128-bit field element shared by every multiplier.
//! - Interchangeable GHASH kernels (32-bit compact, 32-bit Karatsuba, 64-bit
//!   schoolbook/Karatsuba, each with shift or multiply reduction, plus a
//!   bit-serial reference) behind [`GhashBackend`].
//! - [`AesGcm`] for AES-128/192/256 with a 96-bit IV and no associated data,
//!   and the byte-slice entry points [`aes_gcm_encrypt`] and
//!   [`aes_gcm_decrypt_verify`].
//!
//! Nonce uniqueness per key is the caller's responsibility.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod gcm;
mod gf128;
mod ghash;

pub use crate::gcm::{
    aes_gcm_decrypt_verify, aes_gcm_encrypt, AesGcm, IV_BYTES, MAX_BLOCKS, TAG_BYTES,
};
pub use crate::gf128::Gf128;
pub use crate::ghash::{
    Ghash, Ghash32Compact, Ghash32Karatsuba, Ghash64, GhashBackend, GhashBitSerial, Product,
    Reduction,
};
