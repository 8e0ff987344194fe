//! Hex helpers for keys, IVs and known-answer reporting.

/// Uppercase hex.
pub fn encode(data: &[u8]) -> String {
    hex::encode_upper(data)
}

/// Decodes hex in either case, ignoring whitespace anywhere in the input.
pub fn decode(text: &str) -> Result<Vec<u8>, hex::FromHexError> {
    hex::decode(normalize(text))
}

/// Strips whitespace and uppercases.
pub fn normalize(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Compares `data` against a reference hex string and prints a
/// `[PASS]`/`[FAIL]` line. Returns whether they matched.
pub fn check_hex(label: &str, data: &[u8], reference: &str) -> bool {
    let actual = encode(data);
    let ok = actual == normalize(reference);
    if ok {
        println!("[PASS] {label} {actual}");
    } else {
        println!("[FAIL] {label} {actual}");
        println!("       {label} {} (expected)", normalize(reference));
    }
    ok
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha20Rng;

    #[test]
    fn decode_tolerates_case_and_whitespace() {
        assert_eq!(
            decode("de AD\n be\tEF").expect("hex"),
            vec![0xde, 0xad, 0xbe, 0xef]
        );
        assert!(decode("abc").is_err());
        assert!(decode("zz").is_err());
    }

    #[test]
    fn encode_of_decode_is_normalized_input() {
        const DIGITS: &[u8] = b"0123456789abcdefABCDEF";
        let mut rng = ChaCha20Rng::from_seed([80u8; 32]);
        for _ in 0..200 {
            let len = 2 * rng.gen_range(0..24);
            let text: String = (0..len)
                .map(|_| char::from(DIGITS[rng.gen_range(0..DIGITS.len())]))
                .collect();
            let bytes = decode(&text).expect("valid hex");
            assert_eq!(encode(&bytes), normalize(&text));
        }
    }

    #[test]
    fn check_hex_reports_match() {
        assert!(check_hex("match", &[0x0a, 0xbc], "0A bc"));
        assert!(!check_hex("mismatch", &[0x0a, 0xbc], "0abd"));
    }
}
