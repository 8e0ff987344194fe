//! Bit-manipulation primitives: rotate, generalized reverse and shuffle, carry-less multiply.
//!
//! Shift and control operands are masked to the word width, mirroring the
//! register-operand behaviour of the corresponding RISC-V Bitmanip instructions.

/// Rotate right (32-bit).
#[inline]
pub fn ror32(x: u32, n: u32) -> u32 {
    x.rotate_right(n & 31)
}

/// Rotate right (64-bit).
#[inline]
pub fn ror64(x: u64, n: u32) -> u64 {
    x.rotate_right(n & 63)
}

/// AND with complement: `x & !y`.
#[inline]
pub fn andn32(x: u32, y: u32) -> u32 {
    x & !y
}

/// AND with complement: `x & !y`.
#[inline]
pub fn andn64(x: u64, y: u64) -> u64 {
    x & !y
}

const GREV32_STAGES: [(u32, u32); 5] = [
    (0x5555_5555, 1),
    (0x3333_3333, 2),
    (0x0f0f_0f0f, 4),
    (0x00ff_00ff, 8),
    (0x0000_ffff, 16),
];

const GREV64_STAGES: [(u64, u32); 6] = [
    (0x5555_5555_5555_5555, 1),
    (0x3333_3333_3333_3333, 2),
    (0x0f0f_0f0f_0f0f_0f0f, 4),
    (0x00ff_00ff_00ff_00ff, 8),
    (0x0000_ffff_0000_ffff, 16),
    (0x0000_0000_ffff_ffff, 32),
];

/// Generalized bit reverse (32-bit). Each set bit `k` of `n` swaps adjacent
/// groups of `2^k` bits; `grev32(x, 7)` reverses the bits of every byte,
/// `grev32(x, 24)` swaps bytes and `grev32(x, 31)` reverses the word.
pub fn grev32(x: u32, n: u32) -> u32 {
    let mut x = x;
    for (stage, &(mask, shift)) in GREV32_STAGES.iter().enumerate() {
        if n & (1 << stage) != 0 {
            x = ((x & mask) << shift) | ((x >> shift) & mask);
        }
    }
    x
}

/// Generalized bit reverse (64-bit).
pub fn grev64(x: u64, n: u32) -> u64 {
    let mut x = x;
    for (stage, &(mask, shift)) in GREV64_STAGES.iter().enumerate() {
        if n & (1 << stage) != 0 {
            x = ((x & mask) << shift) | ((x >> shift) & mask);
        }
    }
    x
}

#[inline]
fn shuffle32_stage(src: u32, ml: u32, mr: u32, n: u32) -> u32 {
    let mut x = src & !(ml | mr);
    x |= ((src << n) & ml) | ((src >> n) & mr);
    x
}

#[inline]
fn shuffle64_stage(src: u64, ml: u64, mr: u64, n: u32) -> u64 {
    let mut x = src & !(ml | mr);
    x |= ((src << n) & ml) | ((src >> n) & mr);
    x
}

const SHFL32_STAGES: [(u32, u32, u32); 4] = [
    (0x4444_4444, 0x2222_2222, 1),
    (0x3030_3030, 0x0c0c_0c0c, 2),
    (0x0f00_0f00, 0x00f0_00f0, 4),
    (0x00ff_0000, 0x0000_ff00, 8),
];

const SHFL64_STAGES: [(u64, u64, u32); 5] = [
    (0x4444_4444_4444_4444, 0x2222_2222_2222_2222, 1),
    (0x3030_3030_3030_3030, 0x0c0c_0c0c_0c0c_0c0c, 2),
    (0x0f00_0f00_0f00_0f00, 0x00f0_00f0_00f0_00f0, 4),
    (0x00ff_0000_00ff_0000, 0x0000_ff00_0000_ff00, 8),
    (0x0000_ffff_0000_0000, 0x0000_0000_ffff_0000, 16),
];

/// Generalized shuffle (32-bit); stages run from the widest to the narrowest.
pub fn shfl32(x: u32, n: u32) -> u32 {
    let n = n & 15;
    SHFL32_STAGES
        .iter()
        .enumerate()
        .rev()
        .filter(|(stage, _)| n & (1 << stage) != 0)
        .fold(x, |acc, (_, &(ml, mr, shift))| shuffle32_stage(acc, ml, mr, shift))
}

/// Generalized unshuffle (32-bit), the inverse of [`shfl32`].
pub fn unshfl32(x: u32, n: u32) -> u32 {
    let n = n & 15;
    SHFL32_STAGES
        .iter()
        .enumerate()
        .filter(|(stage, _)| n & (1 << stage) != 0)
        .fold(x, |acc, (_, &(ml, mr, shift))| shuffle32_stage(acc, ml, mr, shift))
}

/// Generalized shuffle (64-bit).
pub fn shfl64(x: u64, n: u32) -> u64 {
    let n = n & 31;
    SHFL64_STAGES
        .iter()
        .enumerate()
        .rev()
        .filter(|(stage, _)| n & (1 << stage) != 0)
        .fold(x, |acc, (_, &(ml, mr, shift))| shuffle64_stage(acc, ml, mr, shift))
}

/// Generalized unshuffle (64-bit), the inverse of [`shfl64`].
pub fn unshfl64(x: u64, n: u32) -> u64 {
    let n = n & 31;
    SHFL64_STAGES
        .iter()
        .enumerate()
        .filter(|(stage, _)| n & (1 << stage) != 0)
        .fold(x, |acc, (_, &(ml, mr, shift))| shuffle64_stage(acc, ml, mr, shift))
}

/// Carry-less multiply, low half (32-bit).
pub fn clmul32(a: u32, b: u32) -> u32 {
    (0..32u32)
        .filter(|i| (b >> i) & 1 != 0)
        .fold(0, |x, i| x ^ (a << i))
}

/// Carry-less multiply, high half (32-bit).
pub fn clmulh32(a: u32, b: u32) -> u32 {
    (1..32u32)
        .filter(|i| (b >> i) & 1 != 0)
        .fold(0, |x, i| x ^ (a >> (32 - i)))
}

/// Carry-less multiply, reversed: bits `62..31` of the full product (32-bit).
pub fn clmulr32(a: u32, b: u32) -> u32 {
    (0..32u32)
        .filter(|i| (b >> i) & 1 != 0)
        .fold(0, |x, i| x ^ (a >> (31 - i)))
}

/// Carry-less multiply, low half (64-bit).
pub fn clmul64(a: u64, b: u64) -> u64 {
    (0..64u32)
        .filter(|i| (b >> i) & 1 != 0)
        .fold(0, |x, i| x ^ (a << i))
}

/// Carry-less multiply, high half (64-bit).
pub fn clmulh64(a: u64, b: u64) -> u64 {
    (1..64u32)
        .filter(|i| (b >> i) & 1 != 0)
        .fold(0, |x, i| x ^ (a >> (64 - i)))
}

/// Carry-less multiply, reversed: bits `126..63` of the full product (64-bit).
pub fn clmulr64(a: u64, b: u64) -> u64 {
    (0..64u32)
        .filter(|i| (b >> i) & 1 != 0)
        .fold(0, |x, i| x ^ (a >> (63 - i)))
}
