//! Key and round-key types for AES-128/192/256.

use core::fmt;

use zeroize::Zeroize;

use crate::error::{ensure_len, Error, Result};

/// Largest AES schedule (AES-256): 4 * (14 + 1) words.
pub const MAX_SCHEDULE_WORDS: usize = 60;

/// AES parameter set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeySize {
    /// 128-bit key, 10 rounds.
    Aes128,
    /// 192-bit key, 12 rounds.
    Aes192,
    /// 256-bit key, 14 rounds.
    Aes256,
}

impl KeySize {
    /// All parameter sets, smallest first.
    pub const ALL: [KeySize; 3] = [KeySize::Aes128, KeySize::Aes192, KeySize::Aes256];

    /// Key length in bytes.
    pub const fn key_bytes(self) -> usize {
        4 * self.key_words()
    }

    /// Key length in 32-bit words (`Nk`).
    pub const fn key_words(self) -> usize {
        match self {
            KeySize::Aes128 => 4,
            KeySize::Aes192 => 6,
            KeySize::Aes256 => 8,
        }
    }

    /// Number of rounds (`Nr`).
    pub const fn rounds(self) -> usize {
        self.key_words() + 6
    }

    /// Round-key words in a full schedule: `4 * (Nr + 1)`.
    pub const fn schedule_words(self) -> usize {
        4 * (self.rounds() + 1)
    }

    /// Key length in bits.
    pub const fn bits(self) -> usize {
        8 * self.key_bytes()
    }

    /// Picks the parameter set for a raw key length.
    pub fn from_key_len(len: usize) -> Result<Self> {
        match len {
            16 => Ok(KeySize::Aes128),
            24 => Ok(KeySize::Aes192),
            32 => Ok(KeySize::Aes256),
            actual => Err(Error::InvalidKeyLength { actual }),
        }
    }
}

/// AES cipher key of any supported size.
#[derive(Clone, PartialEq, Eq)]
pub enum AesKey {
    /// AES-128 key.
    Aes128([u8; 16]),
    /// AES-192 key.
    Aes192([u8; 24]),
    /// AES-256 key.
    Aes256([u8; 32]),
}

impl AesKey {
    /// Copies a key from a slice of 16, 24 or 32 bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let key = match KeySize::from_key_len(bytes.len())? {
            KeySize::Aes128 => AesKey::Aes128(copy_array(bytes)),
            KeySize::Aes192 => AesKey::Aes192(copy_array(bytes)),
            KeySize::Aes256 => AesKey::Aes256(copy_array(bytes)),
        };
        Ok(key)
    }

    /// Parameter set implied by the key length.
    pub fn size(&self) -> KeySize {
        match self {
            AesKey::Aes128(_) => KeySize::Aes128,
            AesKey::Aes192(_) => KeySize::Aes192,
            AesKey::Aes256(_) => KeySize::Aes256,
        }
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            AesKey::Aes128(k) => k,
            AesKey::Aes192(k) => k,
            AesKey::Aes256(k) => k,
        }
    }

    /// Key as little-endian words; only the first `Nk` entries are meaningful.
    pub(crate) fn words(&self) -> [u32; 8] {
        let mut words = [0u32; 8];
        for (word, chunk) in words.iter_mut().zip(self.as_bytes().chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        words
    }
}

impl Zeroize for AesKey {
    fn zeroize(&mut self) {
        match self {
            AesKey::Aes128(k) => k.zeroize(),
            AesKey::Aes192(k) => k.zeroize(),
            AesKey::Aes256(k) => k.zeroize(),
        }
    }
}

fn copy_array<const N: usize>(bytes: &[u8]) -> [u8; N] {
    let mut out = [0u8; N];
    out.copy_from_slice(bytes);
    out
}

impl From<[u8; 16]> for AesKey {
    fn from(value: [u8; 16]) -> Self {
        AesKey::Aes128(value)
    }
}

impl From<[u8; 24]> for AesKey {
    fn from(value: [u8; 24]) -> Self {
        AesKey::Aes192(value)
    }
}

impl From<[u8; 32]> for AesKey {
    fn from(value: [u8; 32]) -> Self {
        AesKey::Aes256(value)
    }
}

impl fmt::Debug for AesKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AesKey({}-bit, ..)", self.size().bits())
    }
}

/// Expanded AES round keys as little-endian words.
///
/// Encryption and decryption schedules share this type; a decryption schedule
/// has InvMixColumns applied to every round except the first and the last.
#[derive(Clone, PartialEq, Eq)]
pub struct RoundKeys {
    size: KeySize,
    words: [u32; MAX_SCHEDULE_WORDS],
}

/// Clears every schedule word; the parameter set is kept.
impl Zeroize for RoundKeys {
    fn zeroize(&mut self) {
        self.words.zeroize();
    }
}

impl RoundKeys {
    pub(crate) fn zeroed(size: KeySize) -> Self {
        Self {
            size,
            words: [0u32; MAX_SCHEDULE_WORDS],
        }
    }

    /// Wraps externally supplied words, checking the count against `size`.
    pub fn from_words(size: KeySize, words: &[u32]) -> Result<Self> {
        ensure_len("round-key words", size.schedule_words(), words.len())?;
        let mut rk = Self::zeroed(size);
        rk.words[..words.len()].copy_from_slice(words);
        Ok(rk)
    }

    /// Parameter set of this schedule.
    #[inline]
    pub fn size(&self) -> KeySize {
        self.size
    }

    /// Number of rounds.
    #[inline]
    pub fn rounds(&self) -> usize {
        self.size.rounds()
    }

    /// All `4 * (Nr + 1)` words.
    #[inline]
    pub fn words(&self) -> &[u32] {
        &self.words[..self.size.schedule_words()]
    }

    pub(crate) fn words_mut(&mut self) -> &mut [u32] {
        let len = self.size.schedule_words();
        &mut self.words[..len]
    }

    /// Round key `round` (0..=Nr) as four words.
    #[inline]
    pub fn get(&self, round: usize) -> [u32; 4] {
        let base = 4 * round;
        [
            self.words[base],
            self.words[base + 1],
            self.words[base + 2],
            self.words[base + 3],
        ]
    }

    /// The last `Nk` words of an encryption schedule, from which the whole
    /// schedule can be regenerated backwards.
    pub fn final_words(&self) -> &[u32] {
        let total = self.size.schedule_words();
        &self.words[total - self.size.key_words()..total]
    }
}

impl fmt::Debug for RoundKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundKeys")
            .field("size", &self.size)
            .field("words", &self.size.schedule_words())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeroize_clears_key_material() {
        let mut key = AesKey::from([0xa5u8; 24]);
        key.zeroize();
        assert_eq!(key.as_bytes(), &[0u8; 24]);
        assert_eq!(key.size(), KeySize::Aes192);

        let words: Vec<u32> = (1..=52).collect();
        let mut rk = RoundKeys::from_words(KeySize::Aes192, &words).expect("52 words");
        rk.zeroize();
        assert!(rk.words().iter().all(|&w| w == 0));
        assert_eq!(rk.size(), KeySize::Aes192);
    }

    #[test]
    fn parameter_sets() {
        let table: Vec<_> = KeySize::ALL
            .iter()
            .map(|s| (s.key_bytes(), s.rounds(), s.schedule_words()))
            .collect();
        assert_eq!(table, vec![(16, 10, 44), (24, 12, 52), (32, 14, 60)]);
    }

    #[test]
    fn from_slice_picks_size() {
        for size in KeySize::ALL {
            let bytes: Vec<u8> = (0..size.key_bytes() as u8).collect();
            let key = AesKey::from_slice(&bytes).expect("valid length");
            assert_eq!(key.size(), size);
            assert_eq!(key.as_bytes(), &bytes[..]);
        }
        assert_eq!(
            AesKey::from_slice(&[0u8; 20]),
            Err(Error::InvalidKeyLength { actual: 20 })
        );
    }

    #[test]
    fn key_words_are_little_endian() {
        let key = AesKey::from([
            0x00, 0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08, 0x09, 0x0a, 0x0b, 0x0c, 0x0d,
            0x0e, 0x0f,
        ]);
        assert_eq!(&key.words()[..4], &[0x0302_0100, 0x0706_0504, 0x0b0a_0908, 0x0f0e_0d0c]);
    }

    #[test]
    fn from_words_checks_count() {
        let words = vec![7u32; 52];
        let rk = RoundKeys::from_words(KeySize::Aes192, &words).expect("52 words");
        assert_eq!(rk.words(), &words[..]);
        assert_eq!(rk.get(12), [7, 7, 7, 7]);
        assert_eq!(rk.final_words().len(), 6);
        assert!(matches!(
            RoundKeys::from_words(KeySize::Aes128, &words),
            Err(Error::PreconditionViolation { expected: 44, actual: 52, .. })
        ));
    }

    #[test]
    fn debug_hides_key_material() {
        let key = AesKey::from([0x41u8; 32]);
        assert_eq!(format!("{key:?}"), "AesKey(256-bit, ..)");
    }
}
