//! Known-answer battery: FIPS-197 and SP 800-38A for AES, GB/T 32907 for
//! SM4, SP 800-38D style vectors for AES-GCM, plus tamper checks.

use anyhow::{Context, Result};
use saes_core::{otf, sm4_block, sm4_dec_key, sm4_enc_key, AesBackend, AesKey, Error, Sm4Key};
use saes_gcm::{AesGcm, GhashBackend, IV_BYTES};

use crate::hexfmt::{check_hex, decode, encode};

/// `(label, key, plaintext, ciphertext)`
const AES_VECTORS: [(&str, &str, &str, &str); 6] = [
    (
        "FIPS-197 C.1 AES-128",
        "000102030405060708090A0B0C0D0E0F",
        "00112233445566778899AABBCCDDEEFF",
        "69C4E0D86A7B0430D8CDB78070B4C55A",
    ),
    (
        "FIPS-197 C.2 AES-192",
        "000102030405060708090A0B0C0D0E0F1011121314151617",
        "00112233445566778899AABBCCDDEEFF",
        "DDA97CA4864CDFE06EAF70A0EC0D7191",
    ),
    (
        "FIPS-197 C.3 AES-256",
        "000102030405060708090A0B0C0D0E0F101112131415161718191A1B1C1D1E1F",
        "00112233445566778899AABBCCDDEEFF",
        "8EA2B7CA516745BFEAFC49904B496089",
    ),
    (
        "SP800-38A F.1.1 AES-128",
        "2B7E151628AED2A6ABF7158809CF4F3C",
        "6BC1BEE22E409F96E93D7E117393172A",
        "3AD77BB40D7A3660A89ECAF32466EF97",
    ),
    (
        "SP800-38A F.1.3 AES-192",
        "8E73B0F7DA0E6452C810F32B809079E562F8EAD2522C6B7B",
        "6BC1BEE22E409F96E93D7E117393172A",
        "BD334F1D6E45F25FF712A214571FA5CC",
    ),
    (
        "SP800-38A F.1.5 AES-256",
        "603DEB1015CA71BE2B73AEF0857D77811F352C073B6108D72D9810A30914DFF4",
        "6BC1BEE22E409F96E93D7E117393172A",
        "F3EED1BDB5D2A03C064B5A7E3DB181F8",
    ),
];

const SM4_VECTORS: [(&str, &str, &str, &str); 4] = [
    (
        "GB/T 32907 SM4",
        "0123456789ABCDEFFEDCBA9876543210",
        "0123456789ABCDEFFEDCBA9876543210",
        "681EDF34D206965E86B3E94F536E4246",
    ),
    (
        "SM4 #2",
        "FEDCBA98765432100123456789ABCDEF",
        "000102030405060708090A0B0C0D0E0F",
        "F766678F13F01ADEAC1B3EA955ADB594",
    ),
    (
        "SM4 #3",
        "EB23ADD6454757555747395B76661C9A",
        "D294D879A1F02C7C5906D6C2D0C54D9F",
        "865DE90D6B6E99273E2D44859D9C16DF",
    ),
    (
        "SM4 #4",
        "F11235535318FA844A3CBE643169F59E",
        "A27EE076E48E6F389710EC7B5E8A3BE5",
        "94CFE3F59E8507FEC41DBE738CCD53E1",
    ),
];

/// `(label, key, iv, plaintext, ciphertext || tag)`
const GCM_VECTORS: [(&str, &str, &str, &str, &str); 4] = [
    (
        "AES-128-GCM",
        "7FDDB57453C241D03EFBED3AC44E371C",
        "EE283A3FC75575E33EFD4887",
        "D5DE42B461646C255C87BD2962D3B9A2",
        "2CCDA4A5415CB91E135C2A0F78C9B2FDB36D1DF9B9D5E596F83E8B7F52971CB3",
    ),
    (
        "AES-192-GCM",
        "165C4AA5D78EE15F297D5D2EAE39EAAC3480FC50A6D9A98E",
        "0E321E714C4A262350FC50FC",
        "5AFA41EFE94C0193FC9FE62FD6CFACC8868725AB4965A5C9132D74179F0AEE72",
        "5AB8AC904E7D4A627EE327B4629B686319936ABC709E8C0FB6817CB16D0C4F76
         62BFEA782D6A05CD04030C433639B969",
    ),
    (
        "AES-256-GCM",
        "1FDED32D5999DE4A76E0F8082108823AEF60417E1896CF4218A2FA90F632EC8A",
        "1F3AFA4711E9474F32E70462",
        "06B2C75853DF9AEB17BEFD33CEA81C630B0FC53667FF45199C629C8E15DCE41E
         530AA792F796B8138EEAB2E86C7B7BEE1D40B0",
        "91FBD061DDC5A7FCC9513FCDFDC9C3A7C5D4D64CEDF6A9C24AB8A77C36EEFBF1
         C5DC00BC50121B96456C8CD8B6FF1F8B3E480F30096D340F3D5C42D82A6F475D
         EF23EB",
    ),
    (
        "AES-128-GCM empty",
        "00000000000000000000000000000000",
        "000000000000000000000000",
        "",
        "58E2FCCEFA7E3061367F1D57A4E7455A",
    ),
];

/// Pass/fail tally.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Report {
    pub passed: usize,
    pub failed: usize,
}

impl Report {
    fn record(&mut self, ok: bool) {
        if ok {
            self.passed += 1;
        } else {
            self.failed += 1;
        }
    }
}

fn block(text: &str) -> Result<[u8; 16]> {
    let bytes = decode(text).context("decode vector hex")?;
    bytes
        .as_slice()
        .try_into()
        .with_context(|| format!("vector block must be 16 bytes, got {}", bytes.len()))
}

fn run_aes(cipher: &dyn AesBackend, report: &mut Report) -> Result<()> {
    for (label, key, pt, ct) in AES_VECTORS {
        let key = AesKey::from_slice(&decode(key).context("decode key hex")?)?;
        let pt = block(pt)?;
        let enc = cipher.expand_enc_key(&key);
        let dec = cipher.expand_dec_key(&key);
        let out = cipher.encrypt_block(&enc, &pt);
        report.record(check_hex(&format!("{label} enc"), &out, ct));
        let back = cipher.decrypt_block(&dec, &out);
        report.record(check_hex(&format!("{label} dec"), &back, &encode(&pt)));

        let streamed = otf::encrypt_block_otf(&key, &pt);
        report.record(check_hex(&format!("{label} otf enc"), &streamed, ct));
        let back = otf::decrypt_block_otf(key.size(), enc.final_words(), &streamed)?;
        report.record(check_hex(&format!("{label} otf dec"), &back, &encode(&pt)));
    }
    Ok(())
}

fn run_sm4(report: &mut Report) -> Result<()> {
    for (label, key, pt, ct) in SM4_VECTORS {
        let key = Sm4Key::from_slice(&decode(key).context("decode key hex")?)?;
        let out = sm4_block(&block(pt)?, &sm4_enc_key(&key));
        report.record(check_hex(&format!("{label} enc"), &out, ct));
        let back = sm4_block(&out, &sm4_dec_key(&key));
        report.record(check_hex(&format!("{label} dec"), &back, pt));
    }
    Ok(())
}

fn run_gcm(cipher: &dyn AesBackend, ghash: &dyn GhashBackend, report: &mut Report) -> Result<()> {
    for (label, key, iv, pt, ct_tag) in GCM_VECTORS {
        let key = AesKey::from_slice(&decode(key).context("decode key hex")?)?;
        let iv_bytes = decode(iv).context("decode iv hex")?;
        let iv: [u8; IV_BYTES] = iv_bytes
            .as_slice()
            .try_into()
            .context("vector IV must be 12 bytes")?;
        let pt = decode(pt).context("decode plaintext hex")?;

        let gcm = AesGcm::with_backends(&key, cipher, ghash);
        let sealed = gcm.encrypt(&iv, &pt)?;
        report.record(check_hex(&format!("{label} seal"), &sealed, ct_tag));

        let opened = gcm.decrypt(&iv, &sealed);
        let ok = opened.as_deref() == Ok(pt.as_slice());
        println!("[{}] {label} open", if ok { "PASS" } else { "FAIL" });
        report.record(ok);

        // Flip the lowest bit of the first byte and of the last tag byte.
        let mut rejected = true;
        for index in [0, sealed.len() - 1] {
            let mut tampered = sealed.clone();
            tampered[index] ^= 1;
            rejected &= gcm.decrypt(&iv, &tampered) == Err(Error::AuthenticationFailed);
        }
        println!("[{}] {label} tamper", if rejected { "PASS" } else { "FAIL" });
        report.record(rejected);
    }
    Ok(())
}

/// Runs the whole battery with the chosen engines.
pub fn run(cipher: &dyn AesBackend, ghash: &dyn GhashBackend) -> Result<Report> {
    log::info!("self test: cipher={}, ghash={}", cipher.name(), ghash.name());
    let mut report = Report::default();
    run_aes(cipher, &mut report)?;
    run_sm4(&mut report)?;
    run_gcm(cipher, ghash, &mut report)?;
    Ok(report)
}
