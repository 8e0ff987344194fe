//! GF(2^8) arithmetic over the AES polynomial x^8 + x^4 + x^3 + x + 1.

/// Multiplies by `x` (0x02).
#[inline]
pub const fn xtime(byte: u8) -> u8 {
    let shifted = byte << 1;
    if byte & 0x80 != 0 {
        shifted ^ 0x1b
    } else {
        shifted
    }
}

/// Full multiplication of two field elements.
pub fn gmul(mut a: u8, mut b: u8) -> u8 {
    let mut product = 0u8;
    while b != 0 {
        if b & 1 != 0 {
            product ^= a;
        }
        a = xtime(a);
        b >>= 1;
    }
    product
}

/// One column of the MixColumns matrix scaled by `x`, packed little-endian:
/// bytes `{02, 01, 01, 03} * x`.
#[inline]
pub fn mix_column(x: u8) -> u32 {
    let x2 = xtime(x);
    u32::from_le_bytes([x2, x, x, x ^ x2])
}

/// One column of the InvMixColumns matrix scaled by `x`, packed little-endian:
/// bytes `{0e, 09, 0d, 0b} * x`.
#[inline]
pub fn inv_mix_column(x: u8) -> u32 {
    let x2 = xtime(x);
    let x4 = xtime(x2);
    let x8 = xtime(x4);
    u32::from_le_bytes([x2 ^ x4 ^ x8, x ^ x8, x ^ x4 ^ x8, x ^ x2 ^ x8])
}

/// InvMixColumns of one little-endian packed column, computed byte-wise.
pub fn inv_mix_word(word: u32) -> u32 {
    let [a0, a1, a2, a3] = word.to_le_bytes();
    u32::from_le_bytes([
        gmul(a0, 0x0e) ^ gmul(a1, 0x0b) ^ gmul(a2, 0x0d) ^ gmul(a3, 0x09),
        gmul(a0, 0x09) ^ gmul(a1, 0x0e) ^ gmul(a2, 0x0b) ^ gmul(a3, 0x0d),
        gmul(a0, 0x0d) ^ gmul(a1, 0x09) ^ gmul(a2, 0x0e) ^ gmul(a3, 0x0b),
        gmul(a0, 0x0b) ^ gmul(a1, 0x0d) ^ gmul(a2, 0x09) ^ gmul(a3, 0x0e),
    ])
}

/// MixColumns of one little-endian packed column.
pub fn mix_word(word: u32) -> u32 {
    let [a0, a1, a2, a3] = word.to_le_bytes();
    u32::from_le_bytes([
        xtime(a0) ^ (xtime(a1) ^ a1) ^ a2 ^ a3,
        a0 ^ xtime(a1) ^ (xtime(a2) ^ a2) ^ a3,
        a0 ^ a1 ^ xtime(a2) ^ (xtime(a3) ^ a3),
        (xtime(a0) ^ a0) ^ a1 ^ a2 ^ xtime(a3),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gmul_matches_fips_example() {
        // FIPS-197 section 4.2: {57} * {83} = {c1}, {57} * {13} = {fe}.
        assert_eq!(gmul(0x57, 0x83), 0xc1);
        assert_eq!(gmul(0x57, 0x13), 0xfe);
        assert_eq!(xtime(0x57), 0xae);
        assert_eq!(xtime(0xae), 0x47);
    }

    #[test]
    fn packed_columns_sum_to_mix_word() {
        let word = 0xdb13_5345u32.swap_bytes();
        let [a0, a1, a2, a3] = word.to_le_bytes();
        let by_columns = mix_column(a0)
            ^ mix_column(a1).rotate_left(8)
            ^ mix_column(a2).rotate_left(16)
            ^ mix_column(a3).rotate_left(24);
        assert_eq!(by_columns, mix_word(word));
        // Classic MixColumns test column: db 13 53 45 -> 8e 4d a1 bc.
        assert_eq!(mix_word(word).to_le_bytes(), [0x8e, 0x4d, 0xa1, 0xbc]);
    }

    #[test]
    fn inv_mix_word_inverts_mix_word() {
        for seed in 0..512u32 {
            let word = seed.wrapping_mul(0x9e37_79b9) ^ (seed << 7);
            assert_eq!(inv_mix_word(mix_word(word)), word);
            let [a0, a1, a2, a3] = word.to_le_bytes();
            let by_columns = inv_mix_column(a0)
                ^ inv_mix_column(a1).rotate_left(8)
                ^ inv_mix_column(a2).rotate_left(16)
                ^ inv_mix_column(a3).rotate_left(24);
            assert_eq!(by_columns, inv_mix_word(word));
        }
    }
}
