//! AES-GCM with a 96-bit IV and no associated data.
//!
//! Ciphertext is the plaintext length plus a trailing 16-byte tag. The tag is
//! computed over the ciphertext in both directions and compared in constant
//! time; on mismatch no plaintext is released.

use saes_core::{
    AesBackend, AesKey, Block, Error, KeySize, Result, RoundKeys, Saes32, BLOCK_BYTES,
};
use subtle::ConstantTimeEq;
use zeroize::Zeroize;

use crate::ghash::{Ghash, Ghash64, GhashBackend};

/// IV length in bytes.
pub const IV_BYTES: usize = 12;

/// Authentication tag length in bytes.
pub const TAG_BYTES: usize = 16;

/// Largest message, in 16-byte blocks, a single IV may cover: `2^32 - 2`.
pub const MAX_BLOCKS: usize = u32::MAX as usize - 1;

/// Keyed AES-GCM context over a chosen cipher engine and GHASH multiplier.
pub struct AesGcm<B = Saes32, G = Ghash64> {
    cipher: B,
    ghash: G,
    rk: RoundKeys,
    h: Block,
}

impl AesGcm {
    /// Keys a context with the default engines.
    pub fn new(key: &AesKey) -> Self {
        Self::with_backends(key, Saes32, Ghash64::default())
    }
}

impl<B: AesBackend, G: GhashBackend> AesGcm<B, G> {
    /// Keys a context: expands the schedule and derives `H = AES_K(0^128)`.
    pub fn with_backends(key: &AesKey, cipher: B, ghash: G) -> Self {
        let rk = cipher.expand_enc_key(key);
        let h = cipher.encrypt_block(&rk, &[0u8; BLOCK_BYTES]);
        log::debug!(
            "AES-{}-GCM keyed (cipher={}, ghash={})",
            key.size().bits(),
            cipher.name(),
            ghash.name()
        );
        Self {
            cipher,
            ghash,
            rk,
            h,
        }
    }

    /// Parameter set of the key.
    pub fn key_size(&self) -> KeySize {
        self.rk.size()
    }

    /// Encrypts `pt`, returning ciphertext followed by the tag.
    pub fn encrypt(&self, iv: &[u8; IV_BYTES], pt: &[u8]) -> Result<Vec<u8>> {
        let mut out = vec![0u8; pt.len() + TAG_BYTES];
        self.encrypt_into(iv, pt, &mut out)?;
        Ok(out)
    }

    /// Encrypts into `out`, which must be exactly `pt.len() + 16` bytes.
    pub fn encrypt_into(&self, iv: &[u8; IV_BYTES], pt: &[u8], out: &mut [u8]) -> Result<()> {
        check_blocks(pt.len())?;
        saes_core::ensure_len("GCM output buffer", pt.len() + TAG_BYTES, out.len())?;
        log::trace!("GCM seal: {} bytes", pt.len());

        let j0 = initial_counter(iv);
        let (body, tag_out) = out.split_at_mut(pt.len());
        self.apply_keystream(&j0, pt, body);
        let tag = self.tag(&j0, body);
        tag_out.copy_from_slice(&tag);
        Ok(())
    }

    /// Verifies and decrypts `ct_tag`. Fails with
    /// [`Error::AuthenticationFailed`] without returning any plaintext.
    pub fn decrypt(&self, iv: &[u8; IV_BYTES], ct_tag: &[u8]) -> Result<Vec<u8>> {
        let len = ct_tag
            .len()
            .checked_sub(TAG_BYTES)
            .ok_or(Error::InvalidInputLength {
                min: TAG_BYTES,
                actual: ct_tag.len(),
            })?;
        let mut out = vec![0u8; len];
        self.decrypt_into(iv, ct_tag, &mut out)?;
        Ok(out)
    }

    /// Verifies and decrypts into `out`, which must be exactly
    /// `ct_tag.len() - 16` bytes. On tag mismatch `out` is zeroed.
    pub fn decrypt_into(&self, iv: &[u8; IV_BYTES], ct_tag: &[u8], out: &mut [u8]) -> Result<()> {
        if ct_tag.len() < TAG_BYTES {
            return Err(Error::InvalidInputLength {
                min: TAG_BYTES,
                actual: ct_tag.len(),
            });
        }
        let (ct, received) = ct_tag.split_at(ct_tag.len() - TAG_BYTES);
        check_blocks(ct.len())?;
        saes_core::ensure_len("GCM output buffer", ct.len(), out.len())?;
        log::trace!("GCM open: {} bytes", ct.len());

        let j0 = initial_counter(iv);
        let mut expected = self.tag(&j0, ct);
        let matches = bool::from(expected[..].ct_eq(received));
        expected.zeroize();
        if !matches {
            out.zeroize();
            log::warn!("GCM open: tag mismatch");
            return Err(Error::AuthenticationFailed);
        }
        self.apply_keystream(&j0, ct, out);
        Ok(())
    }

    /// CTR mode starting at `inc32(j0)`.
    fn apply_keystream(&self, j0: &Block, input: &[u8], output: &mut [u8]) {
        let mut counter = *j0;
        for (src, dst) in input.chunks(BLOCK_BYTES).zip(output.chunks_mut(BLOCK_BYTES)) {
            inc32(&mut counter);
            let mut keystream = self.cipher.encrypt_block(&self.rk, &counter);
            for ((d, s), k) in dst.iter_mut().zip(src).zip(keystream) {
                *d = s ^ k;
            }
            keystream.zeroize();
        }
    }

    /// `GHASH_H(C || len) ^ AES_K(J0)`.
    fn tag(&self, j0: &Block, ct: &[u8]) -> Block {
        let mut ghash = Ghash::new(&self.ghash, &self.h);
        ghash.update_padded(ct);
        ghash.update_lengths(8 * ct.len() as u64);
        let mut tag = ghash.finalize();
        let mask = self.cipher.encrypt_block(&self.rk, j0);
        for (t, m) in tag.iter_mut().zip(mask) {
            *t ^= m;
        }
        tag
    }
}

impl<B, G> AesGcm<B, G> {
    fn wipe(&mut self) {
        self.rk.zeroize();
        self.h.zeroize();
    }
}

impl<B, G> Drop for AesGcm<B, G> {
    fn drop(&mut self) {
        self.wipe();
    }
}

/// `J0 = IV || 0^31 || 1`.
fn initial_counter(iv: &[u8; IV_BYTES]) -> Block {
    let mut j0 = [0u8; BLOCK_BYTES];
    j0[..IV_BYTES].copy_from_slice(iv);
    j0[BLOCK_BYTES - 1] = 1;
    j0
}

/// Increments the big-endian counter in the last four bytes, wrapping mod 2^32.
fn inc32(block: &mut Block) {
    let ctr = u32::from_be_bytes([block[12], block[13], block[14], block[15]]);
    block[12..].copy_from_slice(&ctr.wrapping_add(1).to_be_bytes());
}

fn check_blocks(len: usize) -> Result<()> {
    let blocks = len.div_ceil(BLOCK_BYTES);
    if blocks > MAX_BLOCKS {
        return Err(Error::PreconditionViolation {
            what: "GCM message blocks",
            expected: MAX_BLOCKS,
            actual: blocks,
        });
    }
    Ok(())
}

fn iv_array(iv: &[u8]) -> Result<[u8; IV_BYTES]> {
    iv.try_into().map_err(|_| Error::PreconditionViolation {
        what: "GCM IV",
        expected: IV_BYTES,
        actual: iv.len(),
    })
}

/// Byte-slice AES-GCM encryption with the default engines.
///
/// `key` is 16, 24 or 32 bytes, `iv` is 12 bytes and `out` must hold exactly
/// `pt.len() + 16` bytes.
pub fn aes_gcm_encrypt(out: &mut [u8], pt: &[u8], key: &[u8], iv: &[u8]) -> Result<()> {
    let iv = iv_array(iv)?;
    let mut key = AesKey::from_slice(key)?;
    let sealed = AesGcm::new(&key).encrypt_into(&iv, pt, out);
    key.zeroize();
    sealed
}

/// Byte-slice AES-GCM verification and decryption with the default engines.
///
/// `out` must hold exactly `ct_tag.len() - 16` bytes and is zeroed when the
/// tag does not verify.
pub fn aes_gcm_decrypt_verify(out: &mut [u8], ct_tag: &[u8], key: &[u8], iv: &[u8]) -> Result<()> {
    let iv = iv_array(iv)?;
    let mut key = AesKey::from_slice(key)?;
    let opened = AesGcm::new(&key).decrypt_into(&iv, ct_tag, out);
    key.zeroize();
    opened
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ghash::{Ghash32Compact, Ghash32Karatsuba, GhashBitSerial, Product, Reduction};
    use rand::{Rng, RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;
    use saes_core::{Reference, Saes64};

    struct Vector {
        key: &'static str,
        iv: &'static str,
        pt: &'static str,
        ct_tag: &'static str,
    }

    const VECTORS: [Vector; 5] = [
        Vector {
            key: "7FDDB57453C241D03EFBED3AC44E371C",
            iv: "EE283A3FC75575E33EFD4887",
            pt: "D5DE42B461646C255C87BD2962D3B9A2",
            ct_tag: "2CCDA4A5415CB91E135C2A0F78C9B2FDB36D1DF9B9D5E596F83E8B7F52971CB3",
        },
        Vector {
            key: "165C4AA5D78EE15F297D5D2EAE39EAAC3480FC50A6D9A98E",
            iv: "0E321E714C4A262350FC50FC",
            pt: "5AFA41EFE94C0193FC9FE62FD6CFACC8868725AB4965A5C9132D74179F0AEE72",
            ct_tag: "5AB8AC904E7D4A627EE327B4629B686319936ABC709E8C0FB6817CB16D0C4F76\
                     62BFEA782D6A05CD04030C433639B969",
        },
        Vector {
            key: "1FDED32D5999DE4A76E0F8082108823AEF60417E1896CF4218A2FA90F632EC8A",
            iv: "1F3AFA4711E9474F32E70462",
            pt: "06B2C75853DF9AEB17BEFD33CEA81C630B0FC53667FF45199C629C8E15DCE41E\
                 530AA792F796B8138EEAB2E86C7B7BEE1D40B0",
            ct_tag: "91FBD061DDC5A7FCC9513FCDFDC9C3A7C5D4D64CEDF6A9C24AB8A77C36EEFBF1\
                     C5DC00BC50121B96456C8CD8B6FF1F8B3E480F30096D340F3D5C42D82A6F475D\
                     EF23EB",
        },
        Vector {
            key: "00000000000000000000000000000000",
            iv: "000000000000000000000000",
            pt: "",
            ct_tag: "58E2FCCEFA7E3061367F1D57A4E7455A",
        },
        Vector {
            key: "00000000000000000000000000000000",
            iv: "000000000000000000000000",
            pt: "00000000000000000000000000000000",
            ct_tag: "0388DACE60B6A392F328C2B971B2FE78AB6E47D42CEC13BDF53A67B21257BDDF",
        },
    ];

    fn iv_of(v: &Vector) -> [u8; IV_BYTES] {
        iv_array(&hex::decode(v.iv).expect("hex")).expect("12 bytes")
    }

    fn key_of(v: &Vector) -> AesKey {
        AesKey::from_slice(&hex::decode(v.key).expect("hex")).expect("valid key")
    }

    fn ghash_variants() -> Vec<Box<dyn GhashBackend>> {
        let mut out: Vec<Box<dyn GhashBackend>> = vec![Box::new(GhashBitSerial)];
        for reduction in [Reduction::Shift, Reduction::Multiply] {
            out.push(Box::new(Ghash32Compact { reduction }));
            out.push(Box::new(Ghash32Karatsuba { reduction }));
            for product in [Product::Schoolbook, Product::Karatsuba] {
                out.push(Box::new(Ghash64 { product, reduction }));
            }
        }
        out
    }

    #[test]
    fn known_answer_vectors() {
        for v in &VECTORS {
            let gcm = AesGcm::new(&key_of(v));
            let pt = hex::decode(v.pt).expect("hex");
            let ct_tag = gcm.encrypt(&iv_of(v), &pt).expect("seal");
            assert_eq!(hex::encode_upper(&ct_tag), v.ct_tag);
            assert_eq!(gcm.decrypt(&iv_of(v), &ct_tag).expect("open"), pt);
        }
    }

    #[test]
    fn byte_slice_entry_points() {
        let v = &VECTORS[0];
        let key = hex::decode(v.key).expect("hex");
        let iv = hex::decode(v.iv).expect("hex");
        let pt = hex::decode(v.pt).expect("hex");
        let mut ct_tag = vec![0u8; pt.len() + TAG_BYTES];
        aes_gcm_encrypt(&mut ct_tag, &pt, &key, &iv).expect("seal");
        assert_eq!(hex::encode_upper(&ct_tag), v.ct_tag);
        let mut out = vec![0u8; pt.len()];
        aes_gcm_decrypt_verify(&mut out, &ct_tag, &key, &iv).expect("open");
        assert_eq!(out, pt);
    }

    #[test]
    fn every_engine_combination_agrees() {
        let v = &VECTORS[2];
        let key = key_of(v);
        let pt = hex::decode(v.pt).expect("hex");
        let engines: [&dyn AesBackend; 3] = [&Saes32, &Saes64, &Reference];
        for cipher in engines {
            for ghash in ghash_variants() {
                let gcm = AesGcm::with_backends(&key, cipher, &ghash);
                let ct_tag = gcm.encrypt(&iv_of(v), &pt).expect("seal");
                assert_eq!(
                    hex::encode_upper(&ct_tag),
                    v.ct_tag,
                    "{}/{}",
                    cipher.name(),
                    ghash.name()
                );
            }
        }
    }

    #[test]
    fn every_single_bit_flip_is_rejected() {
        let v = &VECTORS[2];
        let gcm = AesGcm::new(&key_of(v));
        let ct_tag = hex::decode(v.ct_tag).expect("hex");
        for bit in 0..8 * ct_tag.len() {
            let mut tampered = ct_tag.clone();
            tampered[bit / 8] ^= 1 << (bit % 8);
            assert_eq!(
                gcm.decrypt(&iv_of(v), &tampered),
                Err(Error::AuthenticationFailed),
                "bit {bit}"
            );
        }
    }

    #[test]
    fn failed_open_zeroes_output() {
        let v = &VECTORS[0];
        let gcm = AesGcm::new(&key_of(v));
        let mut ct_tag = hex::decode(v.ct_tag).expect("hex");
        ct_tag[0] ^= 0x80;
        let mut out = vec![0xaau8; ct_tag.len() - TAG_BYTES];
        assert_eq!(
            gcm.decrypt_into(&iv_of(v), &ct_tag, &mut out),
            Err(Error::AuthenticationFailed)
        );
        assert!(out.iter().all(|&b| b == 0));
    }

    #[test]
    fn wipe_clears_round_keys_and_hash_key() {
        let v = &VECTORS[2];
        let mut gcm = AesGcm::new(&key_of(v));
        assert!(gcm.rk.words().iter().any(|&w| w != 0));
        assert_ne!(gcm.h, [0u8; BLOCK_BYTES]);
        gcm.wipe();
        assert!(gcm.rk.words().iter().all(|&w| w == 0));
        assert_eq!(gcm.h, [0u8; BLOCK_BYTES]);
        assert_eq!(gcm.key_size(), KeySize::Aes256);
    }

    #[test]
    fn wrong_iv_is_rejected() {
        let v = &VECTORS[1];
        let gcm = AesGcm::new(&key_of(v));
        let ct_tag = hex::decode(v.ct_tag).expect("hex");
        let mut iv = iv_of(v);
        iv[11] ^= 1;
        assert_eq!(gcm.decrypt(&iv, &ct_tag), Err(Error::AuthenticationFailed));
    }

    #[test]
    fn input_shorter_than_tag() {
        let gcm = AesGcm::new(&AesKey::from([0u8; 16]));
        for len in 0..TAG_BYTES {
            assert_eq!(
                gcm.decrypt(&[0u8; IV_BYTES], &vec![0u8; len]),
                Err(Error::InvalidInputLength {
                    min: TAG_BYTES,
                    actual: len
                })
            );
        }
    }

    #[test]
    fn slice_arguments_are_validated() {
        let mut out = [0u8; 16];
        assert_eq!(
            aes_gcm_encrypt(&mut out, &[], &[0u8; 15], &[0u8; 12]),
            Err(Error::InvalidKeyLength { actual: 15 })
        );
        assert!(matches!(
            aes_gcm_encrypt(&mut out, &[], &[0u8; 16], &[0u8; 16]),
            Err(Error::PreconditionViolation {
                expected: IV_BYTES,
                actual: 16,
                ..
            })
        ));
        assert!(matches!(
            aes_gcm_encrypt(&mut out, &[0u8; 1], &[0u8; 16], &[0u8; 12]),
            Err(Error::PreconditionViolation {
                expected: 17,
                actual: 16,
                ..
            })
        ));
        let mut short = [0u8; 3];
        assert!(matches!(
            aes_gcm_decrypt_verify(&mut short, &[0u8; 20], &[0u8; 16], &[0u8; 12]),
            Err(Error::PreconditionViolation {
                expected: 4,
                actual: 3,
                ..
            })
        ));
    }

    #[test]
    fn counter_wraps_within_low_word() {
        let mut block = [0xffu8; 16];
        inc32(&mut block);
        assert_eq!(&block[..12], &[0xffu8; 12]);
        assert_eq!(&block[12..], &[0u8; 4]);

        let mut block = initial_counter(&[7u8; IV_BYTES]);
        inc32(&mut block);
        assert_eq!(&block[12..], &[0, 0, 0, 2]);
    }

    #[test]
    #[cfg(target_pointer_width = "64")]
    fn block_limit() {
        assert!(check_blocks(16 * MAX_BLOCKS).is_ok());
        assert!(check_blocks(16 * MAX_BLOCKS + 1).is_err());
    }

    #[test]
    fn random_round_trips_all_lengths() {
        let mut rng = ChaCha20Rng::from_seed([60u8; 32]);
        for size in KeySize::ALL {
            let mut key = vec![0u8; size.key_bytes()];
            rng.fill_bytes(&mut key);
            let gcm = AesGcm::new(&AesKey::from_slice(&key).expect("valid key"));
            assert_eq!(gcm.key_size(), size);
            for len in 0..70 {
                let mut iv = [0u8; IV_BYTES];
                rng.fill_bytes(&mut iv);
                let pt: Vec<u8> = (0..len).map(|_| rng.gen()).collect();
                let ct_tag = gcm.encrypt(&iv, &pt).expect("seal");
                assert_eq!(ct_tag.len(), len + TAG_BYTES);
                assert_eq!(gcm.decrypt(&iv, &ct_tag).expect("open"), pt);
            }
        }
    }
}
