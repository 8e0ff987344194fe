//! GHASH multipliers over GF(2^128) modulo `x^128 + x^7 + x^2 + x + 1`.
//!
//! Every [`GhashBackend`] computes one Horner step `z <- (z ^ rev(x)) * h`
//! where `z` and `h` are already bit-reflected and `x` is a block in GCM's
//! natural byte order. The kernels differ only in word size, in how the
//! 256-bit carry-less product is formed and in how it is reduced; they are
//! required to agree on every input.

use saes_core::bitmanip::{clmul32, clmul64, clmulh32, clmulh64};
use saes_core::Block;
use zeroize::Zeroize;

use crate::gf128::Gf128;

/// Low byte of the reduction polynomial in reflected form.
const POLY: u64 = 0x87;

/// How the high half of the double-width product is folded back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Reduction {
    /// Shift-and-XOR cascade for `x^7 + x^2 + x + 1`.
    #[default]
    Shift,
    /// Carry-less multiplication by the constant `0x87`.
    Multiply,
}

impl Reduction {
    /// Splits `w * 0x87` into the parts that land one word up and in place.
    #[inline]
    fn fold32(self, w: u32) -> (u32, u32) {
        match self {
            Self::Shift => (
                (w >> 31) ^ (w >> 30) ^ (w >> 25),
                w ^ (w << 1) ^ (w << 2) ^ (w << 7),
            ),
            Self::Multiply => (clmulh32(w, POLY as u32), clmul32(w, POLY as u32)),
        }
    }

    #[inline]
    fn fold64(self, w: u64) -> (u64, u64) {
        match self {
            Self::Shift => (
                (w >> 63) ^ (w >> 62) ^ (w >> 57),
                w ^ (w << 1) ^ (w << 2) ^ (w << 7),
            ),
            Self::Multiply => (clmulh64(w, POLY), clmul64(w, POLY)),
        }
    }
}

/// How the 128x128-bit carry-less product is formed from 64-bit halves.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Product {
    /// Four half multiplications.
    Schoolbook,
    /// Three half multiplications plus recombination.
    #[default]
    Karatsuba,
}

/// One GHASH multiplication step.
pub trait GhashBackend {
    /// Short identifier for logs and the command line.
    fn name(&self) -> &'static str;

    /// Returns `(z ^ x.reflect()) * h` in the reflected domain.
    fn mul(&self, z: Gf128, x: Gf128, h: Gf128) -> Gf128;
}

impl<T: GhashBackend + ?Sized> GhashBackend for &T {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn mul(&self, z: Gf128, x: Gf128, h: Gf128) -> Gf128 {
        (**self).mul(z, x, h)
    }
}

impl<T: GhashBackend + ?Sized> GhashBackend for Box<T> {
    fn name(&self) -> &'static str {
        (**self).name()
    }

    fn mul(&self, z: Gf128, x: Gf128, h: Gf128) -> Gf128 {
        (**self).mul(z, x, h)
    }
}

/// 32-bit digit-serial multiplier: Horner over the words of `h`, highest
/// first, reducing one word after every digit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ghash32Compact {
    /// Reduction strategy.
    pub reduction: Reduction,
}

/// 32-bit two-level Karatsuba multiplier (nine half-multiply pairs).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ghash32Karatsuba {
    /// Reduction strategy.
    pub reduction: Reduction,
}

/// 64-bit multiplier.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Ghash64 {
    /// Product strategy.
    pub product: Product,
    /// Reduction strategy.
    pub reduction: Reduction,
}

/// Bit-at-a-time multiplier on the natural representation (SP 800-38D
/// Algorithm 1). Slow; kept as the reference the others are tested against.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GhashBitSerial;

impl GhashBackend for Ghash32Compact {
    fn name(&self) -> &'static str {
        match self.reduction {
            Reduction::Shift => "compact32",
            Reduction::Multiply => "compact32-mul",
        }
    }

    fn mul(&self, z: Gf128, x: Gf128, h: Gf128) -> Gf128 {
        let [x0, x1, x2, x3] = (x.reflect() ^ z).to_words();
        let [mut z0, mut z1, mut z2, mut z3] = [0u32; 4];
        for &y in h.to_words().iter().rev() {
            let z4 = z3 ^ clmulh32(x3, y);
            z3 = z2 ^ clmul32(x3, y) ^ clmulh32(x2, y);
            z2 = z1 ^ clmul32(x2, y) ^ clmulh32(x1, y);
            z1 = z0 ^ clmul32(x1, y) ^ clmulh32(x0, y);
            z0 = clmul32(x0, y);
            let (hi, lo) = self.reduction.fold32(z4);
            z1 ^= hi;
            z0 ^= lo;
        }
        Gf128::from_words([z0, z1, z2, z3])
    }
}

/// 64x64-bit Karatsuba on 32-bit halves; returns the product low word first.
#[inline]
fn karatsuba32(a0: u32, a1: u32, b0: u32, b1: u32) -> [u32; 4] {
    let p3 = clmulh32(a1, b1);
    let mut p2 = clmul32(a1, b1);
    let mut p1 = clmulh32(a0, b0);
    let p0 = clmul32(a0, b0);
    let (ta, tb) = (a0 ^ a1, b0 ^ b1);
    let mid_hi = clmulh32(ta, tb) ^ p1 ^ p3;
    let mid_lo = clmul32(ta, tb) ^ p0 ^ p2;
    p2 ^= mid_hi;
    p1 ^= mid_lo;
    [p0, p1, p2, p3]
}

impl GhashBackend for Ghash32Karatsuba {
    fn name(&self) -> &'static str {
        match self.reduction {
            Reduction::Shift => "karatsuba32",
            Reduction::Multiply => "karatsuba32-mul",
        }
    }

    fn mul(&self, z: Gf128, x: Gf128, h: Gf128) -> Gf128 {
        let [x0, x1, x2, x3] = (x.reflect() ^ z).to_words();
        let [y0, y1, y2, y3] = h.to_words();

        let high = karatsuba32(x2, x3, y2, y3);
        let low = karatsuba32(x0, x1, y0, y1);
        let mut mid = karatsuba32(x0 ^ x2, x1 ^ x3, y0 ^ y2, y1 ^ y3);
        for ((m, l), h) in mid.iter_mut().zip(low).zip(high) {
            *m ^= l ^ h;
        }

        let mut zz = [0u32; 8];
        zz[..4].copy_from_slice(&low);
        zz[4..].copy_from_slice(&high);
        for (k, m) in mid.into_iter().enumerate() {
            zz[k + 2] ^= m;
        }

        for k in (4..8).rev() {
            let (hi, lo) = self.reduction.fold32(zz[k]);
            zz[k - 3] ^= hi;
            zz[k - 4] ^= lo;
        }
        Gf128::from_words([zz[0], zz[1], zz[2], zz[3]])
    }
}

impl GhashBackend for Ghash64 {
    fn name(&self) -> &'static str {
        match (self.product, self.reduction) {
            (Product::Schoolbook, Reduction::Shift) => "schoolbook64",
            (Product::Schoolbook, Reduction::Multiply) => "schoolbook64-mul",
            (Product::Karatsuba, Reduction::Shift) => "karatsuba64",
            (Product::Karatsuba, Reduction::Multiply) => "karatsuba64-mul",
        }
    }

    fn mul(&self, z: Gf128, x: Gf128, h: Gf128) -> Gf128 {
        let [x0, x1] = (x.reflect() ^ z).0;
        let [y0, y1] = h.0;

        let z3 = clmulh64(x1, y1);
        let mut z2 = clmul64(x1, y1);
        let (mut z1, mut z0);
        match self.product {
            Product::Schoolbook => {
                z1 = clmul64(x0, y1) ^ clmul64(x1, y0) ^ clmulh64(x0, y0);
                z2 ^= clmulh64(x0, y1) ^ clmulh64(x1, y0);
                z0 = clmul64(x0, y0);
            }
            Product::Karatsuba => {
                z1 = clmulh64(x0, y0);
                z0 = clmul64(x0, y0);
                let (ta, tb) = (x0 ^ x1, y0 ^ y1);
                let mid_hi = clmulh64(ta, tb) ^ z1 ^ z3;
                let mid_lo = clmul64(ta, tb) ^ z0 ^ z2;
                z2 ^= mid_hi;
                z1 ^= mid_lo;
            }
        }

        let (hi, lo) = self.reduction.fold64(z3);
        z2 ^= hi;
        z1 ^= lo;
        let (hi, lo) = self.reduction.fold64(z2);
        z1 ^= hi;
        z0 ^= lo;
        Gf128([z0, z1])
    }
}

/// Multiplies two elements in GCM's natural bit order.
fn mul_natural(x: u128, y: u128) -> u128 {
    const R: u128 = 0xe1 << 120;
    let mut z = 0u128;
    let mut v = y;
    for i in (0..128).rev() {
        if (x >> i) & 1 == 1 {
            z ^= v;
        }
        v = if v & 1 == 1 { (v >> 1) ^ R } else { v >> 1 };
    }
    z
}

fn to_natural(x: Gf128) -> u128 {
    u128::from_be_bytes(x.to_bytes())
}

fn from_natural(x: u128) -> Gf128 {
    Gf128::from_bytes(&x.to_be_bytes())
}

impl GhashBackend for GhashBitSerial {
    fn name(&self) -> &'static str {
        "bitserial"
    }

    fn mul(&self, z: Gf128, x: Gf128, h: Gf128) -> Gf128 {
        let acc = to_natural(z.reflect()) ^ to_natural(x);
        from_natural(mul_natural(acc, to_natural(h.reflect()))).reflect()
    }
}

/// Running GHASH over a sequence of 16-byte blocks under one subkey.
pub struct Ghash<G> {
    backend: G,
    h: Gf128,
    z: Gf128,
}

impl<G: GhashBackend> Ghash<G> {
    /// Starts an accumulator for subkey `h = AES_K(0)` given in natural order.
    pub fn new(backend: G, h: &Block) -> Self {
        Self {
            backend,
            h: Gf128::from_bytes(h).reflect(),
            z: Gf128::ZERO,
        }
    }

    /// Absorbs one full block.
    pub fn update(&mut self, block: &Block) {
        self.z = self.backend.mul(self.z, Gf128::from_bytes(block), self.h);
    }

    /// Absorbs `data` as consecutive blocks, zero-padding the last one.
    pub fn update_padded(&mut self, data: &[u8]) {
        for chunk in data.chunks(16) {
            let mut block = [0u8; 16];
            block[..chunk.len()].copy_from_slice(chunk);
            self.update(&block);
        }
    }

    /// Absorbs the closing length block: 64 zero bits (no associated data)
    /// followed by the big-endian bit length of the text.
    pub fn update_lengths(&mut self, text_bits: u64) {
        let mut block = [0u8; 16];
        block[8..].copy_from_slice(&text_bits.to_be_bytes());
        self.update(&block);
    }

    /// The hash value in natural byte order.
    pub fn finalize(self) -> Block {
        self.z.reflect().to_bytes()
    }
}

impl<G> Drop for Ghash<G> {
    fn drop(&mut self) {
        self.h.0.zeroize();
        self.z.0.zeroize();
    }
}
