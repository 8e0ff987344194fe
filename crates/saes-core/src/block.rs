//! Block representation and little-endian word packing.

/// Cipher block of 16 bytes.
pub type Block = [u8; 16];

/// Block size in bytes.
pub const BLOCK_BYTES: usize = 16;

/// XORs two blocks, writing the result into `dst`.
#[inline]
pub fn xor_in_place(dst: &mut Block, rhs: &Block) {
    for (d, r) in dst.iter_mut().zip(rhs.iter()) {
        *d ^= *r;
    }
}

/// Splits a block into four little-endian words `w0..w3`.
#[inline]
pub fn load_words(block: &Block) -> [u32; 4] {
    core::array::from_fn(|i| {
        u32::from_le_bytes([
            block[4 * i],
            block[4 * i + 1],
            block[4 * i + 2],
            block[4 * i + 3],
        ])
    })
}

/// Packs four words back into a block, little-endian.
#[inline]
pub fn store_words(words: &[u32; 4]) -> Block {
    let mut block = [0u8; 16];
    for (chunk, word) in block.chunks_exact_mut(4).zip(words.iter()) {
        chunk.copy_from_slice(&word.to_le_bytes());
    }
    block
}

/// Splits a block into two little-endian 64-bit halves.
#[inline]
pub fn load_dwords(block: &Block) -> [u64; 2] {
    let [w0, w1, w2, w3] = load_words(block);
    [
        u64::from(w0) | (u64::from(w1) << 32),
        u64::from(w2) | (u64::from(w3) << 32),
    ]
}

/// Packs two 64-bit halves back into a block, little-endian.
#[inline]
pub fn store_dwords(dwords: &[u64; 2]) -> Block {
    let mut block = [0u8; 16];
    block[..8].copy_from_slice(&dwords[0].to_le_bytes());
    block[8..].copy_from_slice(&dwords[1].to_le_bytes());
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: Block = [
        0x00, 0x11, 0x22, 0x33, 0x44, 0x55, 0x66, 0x77, 0x88, 0x99, 0xaa, 0xbb, 0xcc, 0xdd, 0xee,
        0xff,
    ];

    #[test]
    fn words_are_little_endian() {
        let words = load_words(&SAMPLE);
        assert_eq!(words, [0x3322_1100, 0x7766_5544, 0xbbaa_9988, 0xffee_ddcc]);
        assert_eq!(store_words(&words), SAMPLE);
    }

    #[test]
    fn dwords_are_little_endian_and_agree_with_words() {
        let dwords = load_dwords(&SAMPLE);
        assert_eq!(dwords, [0x7766_5544_3322_1100, 0xffee_ddcc_bbaa_9988]);
        assert_eq!(store_dwords(&dwords), SAMPLE);
    }

    #[test]
    fn xor_in_place_is_involution() {
        let mut block = SAMPLE;
        let mask = [0x5a; 16];
        xor_in_place(&mut block, &mask);
        assert_ne!(block, SAMPLE);
        xor_in_place(&mut block, &mask);
        assert_eq!(block, SAMPLE);
    }
}
