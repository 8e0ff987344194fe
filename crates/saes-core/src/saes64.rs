//! 64-bit half-round AES instructions and the engine built on them.
//!
//! The state is held as two little-endian 64-bit halves. Each instruction
//! reads both halves and produces one output half, so a round costs two
//! instructions.

use crate::block::{load_dwords, store_dwords, Block};
use crate::gf256::{inv_mix_column, mix_column};
use crate::key::{AesKey, RoundKeys};
use crate::sbox::{inv_sbox, sbox, RCON};

#[inline]
fn byte_at(x: u64, shift: u32) -> u8 {
    (x >> shift) as u8
}

fn columns(x: u32, column: fn(u8) -> u32) -> u32 {
    x.to_le_bytes()
        .iter()
        .enumerate()
        .fold(0, |acc, (i, &b)| acc ^ column(b).rotate_left(8 * i as u32))
}

fn each_half(x: u64, f: impl Fn(u32) -> u32) -> u64 {
    u64::from(f(x as u32)) | (u64::from(f((x >> 32) as u32)) << 32)
}

/// Half of ShiftRows and SubBytes (final round).
pub fn encs(rs1: u64, rs2: u64) -> u64 {
    u64::from_le_bytes([
        sbox(byte_at(rs1, 0)),
        sbox(byte_at(rs1, 40)),
        sbox(byte_at(rs2, 16)),
        sbox(byte_at(rs2, 56)),
        sbox(byte_at(rs1, 32)),
        sbox(byte_at(rs2, 8)),
        sbox(byte_at(rs2, 48)),
        sbox(byte_at(rs1, 24)),
    ])
}

/// Half of ShiftRows, SubBytes and MixColumns (middle rounds).
pub fn encsm(rs1: u64, rs2: u64) -> u64 {
    each_half(encs(rs1, rs2), |x| columns(x, mix_column))
}

/// Half of inverse ShiftRows and inverse SubBytes (final round).
pub fn decs(rs1: u64, rs2: u64) -> u64 {
    u64::from_le_bytes([
        inv_sbox(byte_at(rs1, 0)),
        inv_sbox(byte_at(rs2, 40)),
        inv_sbox(byte_at(rs2, 16)),
        inv_sbox(byte_at(rs1, 56)),
        inv_sbox(byte_at(rs1, 32)),
        inv_sbox(byte_at(rs1, 8)),
        inv_sbox(byte_at(rs2, 48)),
        inv_sbox(byte_at(rs2, 24)),
    ])
}

/// Half of inverse ShiftRows, inverse SubBytes and InvMixColumns.
pub fn decsm(rs1: u64, rs2: u64) -> u64 {
    imix(decs(rs1, rs2))
}

/// InvMixColumns on both columns of a half; used for decryption schedules.
pub fn imix(rs1: u64) -> u64 {
    each_half(rs1, |x| columns(x, inv_mix_column))
}

/// Key schedule step 1: SubWord of the high word, with RotWord and the round
/// constant when `round < 10`, duplicated into both halves.
pub fn ks1(rs1: u64, round: u8) -> u64 {
    let mut t = (rs1 >> 32) as u32;
    let mut rc = 0;
    if round < 10 {
        t = t.rotate_right(8);
        rc = u32::from(RCON[usize::from(round)]);
    }
    let t = u32::from_le_bytes(t.to_le_bytes().map(sbox)) ^ rc;
    u64::from(t) | (u64::from(t) << 32)
}

/// Key schedule step 2: XOR-chains the high word of `rs1` through `rs2`.
pub fn ks2(rs1: u64, rs2: u64) -> u64 {
    let t = ((rs1 >> 32) as u32) ^ (rs2 as u32);
    u64::from(t) ^ (u64::from(t) << 32) ^ (rs2 & 0xffff_ffff_0000_0000)
}

/// Round-key halves viewed as 64-bit pairs.
fn dword(rk: &RoundKeys, i: usize) -> u64 {
    let w = rk.words();
    u64::from(w[2 * i]) | (u64::from(w[2 * i + 1]) << 32)
}

fn write_dwords(rk: &mut RoundKeys, dwords: impl IntoIterator<Item = u64>) {
    for (pair, d) in rk.words_mut().chunks_exact_mut(2).zip(dwords) {
        pair[0] = d as u32;
        pair[1] = (d >> 32) as u32;
    }
}

/// Key register file producing round-key halves in order, one `Nk`-word
/// step of `ks1`/`ks2` at a time.
struct KeyHalves {
    regs: [u64; 4],
    len: usize,
    pos: usize,
    step: u8,
}

impl KeyHalves {
    fn new(key: &AesKey) -> Self {
        let mut regs = [0u64; 4];
        for (d, chunk) in regs.iter_mut().zip(key.as_bytes().chunks_exact(8)) {
            let mut bytes = [0u8; 8];
            bytes.copy_from_slice(chunk);
            *d = u64::from_le_bytes(bytes);
        }
        Self {
            regs,
            len: key.size().key_words() / 2,
            pos: 0,
            step: 0,
        }
    }

    fn advance(&mut self) {
        let k = &mut self.regs;
        match self.len {
            2 => {
                let ks = ks1(k[1], self.step);
                k[0] = ks2(ks, k[0]);
                k[1] = ks2(k[0], k[1]);
            }
            3 => {
                let ks = ks1(k[2], self.step);
                k[0] = ks2(ks, k[0]);
                k[1] = ks2(k[0], k[1]);
                k[2] = ks2(k[1], k[2]);
            }
            _ => {
                let ks = ks1(k[3], self.step);
                k[0] = ks2(ks, k[0]);
                k[1] = ks2(k[0], k[1]);
                let ks = ks1(k[1], 10);
                k[2] = ks2(ks, k[2]);
                k[3] = ks2(k[2], k[3]);
            }
        }
        self.step = self.step.wrapping_add(1);
        self.pos = 0;
    }

    fn next_half(&mut self) -> u64 {
        if self.pos == self.len {
            self.advance();
        }
        let d = self.regs[self.pos];
        self.pos += 1;
        d
    }

    fn next_pair(&mut self) -> (u64, u64) {
        let lo = self.next_half();
        (lo, self.next_half())
    }
}

/// Encryption schedule from `ks1`/`ks2`.
pub fn enc_key(key: &AesKey) -> RoundKeys {
    let size = key.size();
    let mut halves = KeyHalves::new(key);
    let mut rk = RoundKeys::zeroed(size);
    write_dwords(
        &mut rk,
        (0..size.schedule_words() / 2).map(|_| halves.next_half()),
    );
    rk
}

/// Decryption schedule: `imix` over the middle round keys.
pub fn dec_key(key: &AesKey) -> RoundKeys {
    let mut rk = enc_key(key);
    let total = rk.words().len() / 2;
    let mixed: Vec<u64> = (0..total)
        .map(|i| {
            let d = dword(&rk, i);
            if (2..total - 2).contains(&i) {
                imix(d)
            } else {
                d
            }
        })
        .collect();
    write_dwords(&mut rk, mixed);
    rk
}

/// Encrypts one block with an encryption schedule.
pub fn encrypt_block(pt: &Block, rk: &RoundKeys) -> Block {
    let nr = rk.rounds();
    let [mut t0, mut t1] = load_dwords(pt);
    t0 ^= dword(rk, 0);
    t1 ^= dword(rk, 1);
    for round in 1..nr {
        (t0, t1) = (
            encsm(t0, t1) ^ dword(rk, 2 * round),
            encsm(t1, t0) ^ dword(rk, 2 * round + 1),
        );
    }
    (t0, t1) = (
        encs(t0, t1) ^ dword(rk, 2 * nr),
        encs(t1, t0) ^ dword(rk, 2 * nr + 1),
    );
    store_dwords(&[t0, t1])
}

/// Decrypts one block with a schedule from [`dec_key`].
pub fn decrypt_block(ct: &Block, rk: &RoundKeys) -> Block {
    let nr = rk.rounds();
    let [mut s0, mut s1] = load_dwords(ct);
    for round in (1..nr).rev() {
        s0 ^= dword(rk, 2 * round + 2);
        s1 ^= dword(rk, 2 * round + 3);
        (s0, s1) = (decsm(s0, s1), decsm(s1, s0));
    }
    s0 ^= dword(rk, 2);
    s1 ^= dword(rk, 3);
    (s0, s1) = (decs(s0, s1) ^ dword(rk, 0), decs(s1, s0) ^ dword(rk, 1));
    store_dwords(&[s0, s1])
}

/// Encrypts without a stored schedule, advancing the key registers with
/// `ks1`/`ks2` as the rounds consume them.
pub fn encrypt_block_otf(key: &AesKey, pt: &Block) -> Block {
    let nr = key.size().rounds();
    let mut halves = KeyHalves::new(key);
    let [mut t0, mut t1] = load_dwords(pt);
    let (k0, k1) = halves.next_pair();
    t0 ^= k0;
    t1 ^= k1;
    for round in 1..=nr {
        let (k0, k1) = halves.next_pair();
        (t0, t1) = if round < nr {
            (encsm(t0, t1) ^ k0, encsm(t1, t0) ^ k1)
        } else {
            (encs(t0, t1) ^ k0, encs(t1, t0) ^ k1)
        };
    }
    store_dwords(&[t0, t1])
}
