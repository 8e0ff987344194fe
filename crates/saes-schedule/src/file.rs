//! Schedule file representation and serialization helpers.

use serde::{Deserialize, Serialize};
use serde_big_array::BigArray;

use saes_core::{
    aes_dec_block, aes_dec_key, aes_enc_block, aes_enc_key, ensure_len, sm4_block, sm4_dec_key,
    sm4_enc_key, AesKey, Block, Error, KeySize, Result, RoundKeys, Sm4Key, Sm4RoundKeys,
    BLOCK_BYTES, MAX_SCHEDULE_WORDS, SM4_ROUNDS,
};

/// Current on-disk format version.
pub const FORMAT_VERSION: u32 = 1;

/// Cipher a schedule belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CipherId {
    /// AES with a 128-bit key.
    Aes128,
    /// AES with a 192-bit key.
    Aes192,
    /// AES with a 256-bit key.
    Aes256,
    /// SM4.
    Sm4,
}

impl CipherId {
    /// AES parameter set, or `None` for SM4.
    pub fn key_size(self) -> Option<KeySize> {
        match self {
            CipherId::Aes128 => Some(KeySize::Aes128),
            CipherId::Aes192 => Some(KeySize::Aes192),
            CipherId::Aes256 => Some(KeySize::Aes256),
            CipherId::Sm4 => None,
        }
    }

    /// Round count.
    pub fn rounds(self) -> usize {
        self.key_size().map_or(SM4_ROUNDS, KeySize::rounds)
    }

    /// Number of meaningful schedule words.
    pub fn words(self) -> usize {
        self.key_size().map_or(SM4_ROUNDS, KeySize::schedule_words)
    }

    /// Raw key length in bytes.
    pub fn key_bytes(self) -> usize {
        self.key_size().map_or(16, KeySize::key_bytes)
    }
}

impl From<KeySize> for CipherId {
    fn from(size: KeySize) -> Self {
        match size {
            KeySize::Aes128 => CipherId::Aes128,
            KeySize::Aes192 => CipherId::Aes192,
            KeySize::Aes256 => CipherId::Aes256,
        }
    }
}

/// Whether a schedule encrypts or decrypts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Encryption schedule.
    Encrypt,
    /// Decryption schedule.
    Decrypt,
}

/// Static parameters describing a stored schedule.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleParams {
    /// Cipher the schedule was expanded for.
    pub cipher: CipherId,
    /// Direction the schedule runs in.
    pub direction: Direction,
    /// Number of rounds (10/12/14 for AES, 32 for SM4).
    pub rounds: usize,
    /// Meaningful entries at the front of `words`.
    pub words: usize,
    /// Version tag for future compatibility changes.
    pub version: u32,
}

impl ScheduleParams {
    /// Parameters for a fresh schedule of the given cipher and direction.
    pub fn new(cipher: CipherId, direction: Direction) -> Self {
        Self {
            cipher,
            direction,
            rounds: cipher.rounds(),
            words: cipher.words(),
            version: FORMAT_VERSION,
        }
    }
}

/// An expanded key padded to the largest schedule size.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleFile {
    /// Static parameters.
    pub params: ScheduleParams,
    /// Round-key words; entries past `params.words` are zero.
    #[serde(with = "BigArray")]
    pub words: [u32; MAX_SCHEDULE_WORDS],
}

impl core::fmt::Debug for ScheduleFile {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ScheduleFile")
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

impl ScheduleFile {
    /// Expands a raw key for `cipher` in the given direction.
    pub fn generate(cipher: CipherId, key: &[u8], direction: Direction) -> Result<Self> {
        log::debug!("expanding {cipher:?} {direction:?} schedule");
        match cipher.key_size() {
            Some(size) => {
                let key = AesKey::from_slice(key)?;
                ensure_len("AES key", size.key_bytes(), key.as_bytes().len())?;
                let rk = match direction {
                    Direction::Encrypt => aes_enc_key(&key),
                    Direction::Decrypt => aes_dec_key(&key),
                };
                Ok(Self::from_aes(&rk, direction))
            }
            None => {
                let key = Sm4Key::from_slice(key)?;
                let rk = match direction {
                    Direction::Encrypt => sm4_enc_key(&key),
                    Direction::Decrypt => sm4_dec_key(&key),
                };
                Ok(Self::from_sm4(&rk, direction))
            }
        }
    }

    /// Wraps an AES schedule.
    pub fn from_aes(rk: &RoundKeys, direction: Direction) -> Self {
        Self::from_words(
            ScheduleParams::new(rk.size().into(), direction),
            rk.words(),
        )
    }

    /// Wraps an SM4 schedule.
    pub fn from_sm4(rk: &Sm4RoundKeys, direction: Direction) -> Self {
        Self::from_words(ScheduleParams::new(CipherId::Sm4, direction), &rk.0)
    }

    fn from_words(params: ScheduleParams, words: &[u32]) -> Self {
        let mut padded = [0u32; MAX_SCHEDULE_WORDS];
        padded[..words.len()].copy_from_slice(words);
        Self {
            params,
            words: padded,
        }
    }

    /// Checks `params` against the cipher and the padding against zero.
    pub fn validate(&self) -> Result<()> {
        let p = &self.params;
        ensure_len("schedule version", FORMAT_VERSION as usize, p.version as usize)?;
        ensure_len("schedule rounds", p.cipher.rounds(), p.rounds)?;
        ensure_len("schedule words", p.cipher.words(), p.words)?;
        let stray = self.words[p.words..].iter().filter(|&&w| w != 0).count();
        ensure_len("nonzero schedule padding words", 0, stray)
    }

    /// Validates and unpacks into a schedule ready for block operations.
    pub fn load(&self) -> Result<KeyedSchedule> {
        self.validate()?;
        let words = &self.words[..self.params.words];
        let keyed = match self.params.cipher.key_size() {
            Some(size) => KeyedSchedule::Aes {
                rk: RoundKeys::from_words(size, words)?,
                direction: self.params.direction,
            },
            None => {
                let mut rk = [0u32; SM4_ROUNDS];
                rk.copy_from_slice(words);
                KeyedSchedule::Sm4(Sm4RoundKeys(rk))
            }
        };
        Ok(keyed)
    }

    /// Serializes the schedule with `bincode`.
    pub fn to_bytes(&self) -> core::result::Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserializes a schedule with `bincode`. Call [`ScheduleFile::validate`]
    /// or [`ScheduleFile::load`] before trusting its contents.
    pub fn from_bytes(bytes: &[u8]) -> core::result::Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// A validated schedule bound to its block operation.
#[derive(Clone, Debug)]
pub enum KeyedSchedule {
    /// AES schedule and the direction it runs in.
    Aes {
        /// Round keys.
        rk: RoundKeys,
        /// Encrypt or decrypt.
        direction: Direction,
    },
    /// SM4 round keys; direction is implied by their order.
    Sm4(Sm4RoundKeys),
}

impl KeyedSchedule {
    /// Runs one block through the schedule.
    pub fn apply(&self, block: &Block) -> Block {
        match self {
            KeyedSchedule::Aes {
                rk,
                direction: Direction::Encrypt,
            } => aes_enc_block(block, rk),
            KeyedSchedule::Aes {
                rk,
                direction: Direction::Decrypt,
            } => aes_dec_block(block, rk),
            KeyedSchedule::Sm4(rk) => sm4_block(block, rk),
        }
    }

    /// Runs every 16-byte block of `data` through the schedule in place.
    pub fn apply_ecb(&self, data: &mut [u8]) -> Result<()> {
        if data.len() % BLOCK_BYTES != 0 {
            return Err(Error::PreconditionViolation {
                what: "ECB input length rounded to blocks",
                expected: data.len().next_multiple_of(BLOCK_BYTES),
                actual: data.len(),
            });
        }
        for chunk in data.chunks_exact_mut(BLOCK_BYTES) {
            let mut block = [0u8; BLOCK_BYTES];
            block.copy_from_slice(chunk);
            chunk.copy_from_slice(&self.apply(&block));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    const ALL: [CipherId; 4] = [
        CipherId::Aes128,
        CipherId::Aes192,
        CipherId::Aes256,
        CipherId::Sm4,
    ];

    fn random_key(rng: &mut ChaCha20Rng, cipher: CipherId) -> Vec<u8> {
        let mut key = vec![0u8; cipher.key_bytes()];
        rng.fill_bytes(&mut key);
        key
    }

    #[test]
    fn serialize_roundtrip() {
        let mut rng = ChaCha20Rng::from_seed([70u8; 32]);
        for cipher in ALL {
            let key = random_key(&mut rng, cipher);
            let file = ScheduleFile::generate(cipher, &key, Direction::Decrypt).expect("expand");
            let bytes = file.to_bytes().expect("serialize");
            let decoded = ScheduleFile::from_bytes(&bytes).expect("deserialize");
            assert_eq!(decoded, file);
            assert_eq!(decoded.params.rounds, cipher.rounds());
            assert!(decoded.validate().is_ok());
        }
    }

    #[test]
    fn encrypt_and_decrypt_files_invert_each_other() {
        let mut rng = ChaCha20Rng::from_seed([71u8; 32]);
        for cipher in ALL {
            let key = random_key(&mut rng, cipher);
            let enc = ScheduleFile::generate(cipher, &key, Direction::Encrypt)
                .and_then(|f| f.load())
                .expect("enc schedule");
            let dec = ScheduleFile::generate(cipher, &key, Direction::Decrypt)
                .and_then(|f| f.load())
                .expect("dec schedule");
            let mut data = vec![0u8; 64];
            rng.fill_bytes(&mut data);
            let original = data.clone();
            enc.apply_ecb(&mut data).expect("whole blocks");
            assert_ne!(data, original);
            dec.apply_ecb(&mut data).expect("whole blocks");
            assert_eq!(data, original);
        }
    }

    #[test]
    fn aes_file_matches_known_answer() {
        let key: Vec<u8> = (0u8..16).collect();
        let file = ScheduleFile::generate(CipherId::Aes128, &key, Direction::Encrypt)
            .expect("expand");
        let pt: Block = core::array::from_fn(|i| (i as u8) * 0x11);
        let ct = file.load().expect("valid").apply(&pt);
        assert_eq!(
            ct,
            [
                0x69, 0xc4, 0xe0, 0xd8, 0x6a, 0x7b, 0x04, 0x30, 0xd8, 0xcd, 0xb7, 0x80, 0x70, 0xb4,
                0xc5, 0x5a
            ]
        );
    }

    #[test]
    fn tampered_params_are_rejected() {
        let file = ScheduleFile::generate(CipherId::Aes192, &[1u8; 24], Direction::Encrypt)
            .expect("expand");

        let mut bad = file.clone();
        bad.params.rounds = 10;
        assert!(matches!(
            bad.load(),
            Err(Error::PreconditionViolation {
                what: "schedule rounds",
                ..
            })
        ));

        let mut bad = file.clone();
        bad.params.version = 2;
        assert!(bad.validate().is_err());

        let mut bad = file.clone();
        bad.words[MAX_SCHEDULE_WORDS - 1] = 1;
        assert!(matches!(
            bad.validate(),
            Err(Error::PreconditionViolation {
                actual: 1,
                ..
            })
        ));

        let mut bad = file;
        bad.params.cipher = CipherId::Sm4;
        assert!(bad.load().is_err());
    }

    #[test]
    fn wrong_key_length_for_cipher() {
        assert_eq!(
            ScheduleFile::generate(CipherId::Aes256, &[0u8; 16], Direction::Encrypt),
            Err(Error::PreconditionViolation {
                what: "AES key",
                expected: 32,
                actual: 16
            })
        );
        assert!(ScheduleFile::generate(CipherId::Sm4, &[0u8; 32], Direction::Encrypt).is_err());
    }

    #[test]
    fn partial_block_input_is_rejected() {
        let keyed = ScheduleFile::generate(CipherId::Sm4, &[0u8; 16], Direction::Encrypt)
            .and_then(|f| f.load())
            .expect("valid");
        let mut data = vec![0u8; 17];
        assert!(matches!(
            keyed.apply_ecb(&mut data),
            Err(Error::PreconditionViolation {
                expected: 32,
                actual: 17,
                ..
            })
        ));
    }
}
