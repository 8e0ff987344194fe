//! Command-line interface for the single-sbox AES, SM4 and AES-GCM models.

#![forbid(unsafe_code)]

mod hexfmt;
mod selftest;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use rand::{CryptoRng, Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha20Rng;
use saes_core::{
    sm4_block, sm4_dec_key, sm4_enc_key, AesBackend, AesKey, KeySize, Reference, Saes32, Saes64,
    Sm4Key,
};
use saes_gcm::{
    AesGcm, Ghash32Compact, Ghash32Karatsuba, Ghash64, GhashBackend, GhashBitSerial, Product,
    Reduction, IV_BYTES,
};
use saes_schedule::{CipherId, Direction, ScheduleFile};

/// Single-sbox cipher instruction CLI.
#[derive(Parser)]
#[command(
    name = "saes",
    version,
    author,
    about = "AES, SM4 and AES-GCM on a single-sbox cipher instruction model"
)]
struct Cli {
    /// Raise log verbosity (-v info, -vv debug, -vvv trace). `RUST_LOG` wins when set.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the known-answer battery and report pass/fail per vector.
    Selftest {
        /// AES engine.
        #[arg(long, value_enum, default_value_t = BackendArg::Saes32)]
        backend: BackendArg,
        /// GHASH multiplier.
        #[arg(long, value_enum, default_value_t = GhashArg::Karatsuba64)]
        ghash: GhashArg,
    },
    /// Expand a key and write the schedule to a file.
    Keygen {
        /// Cipher to expand the key for.
        #[arg(long, value_enum)]
        cipher: CipherArg,
        /// Raw key as hex.
        #[arg(long, value_name = "HEX")]
        key_hex: String,
        /// Write a decryption schedule instead of an encryption one.
        #[arg(long, default_value_t = false)]
        decrypt: bool,
        /// Output path for the serialized schedule.
        #[arg(long, value_name = "FILE")]
        out: PathBuf,
    },
    /// Run 16-byte blocks from a file through a stored schedule.
    Ecb {
        /// Path to a schedule written by `keygen`.
        #[arg(long, value_name = "FILE")]
        schedule: PathBuf,
        /// Input file (must be a multiple of 16 bytes).
        #[arg(long, value_name = "FILE")]
        input: PathBuf,
        /// Output path.
        #[arg(long, value_name = "FILE")]
        output: PathBuf,
    },
    /// AES-GCM encrypt a file; the output carries a trailing 16-byte tag.
    Seal {
        #[command(flatten)]
        gcm: GcmArgs,
    },
    /// AES-GCM verify and decrypt a file; nothing is written on tag mismatch.
    Open {
        #[command(flatten)]
        gcm: GcmArgs,
    },
    /// Round-trip random data through every engine.
    Demo {
        /// Optional RNG seed for reproducibility.
        #[arg(long)]
        seed: Option<u64>,
    },
}

#[derive(clap::Args)]
struct GcmArgs {
    /// AES key (16, 24 or 32 bytes) as hex.
    #[arg(long, value_name = "HEX")]
    key_hex: String,
    /// 96-bit IV as hex.
    #[arg(long, value_name = "HEX")]
    iv_hex: String,
    /// Input file.
    #[arg(long, value_name = "FILE")]
    input: PathBuf,
    /// Output file.
    #[arg(long, value_name = "FILE")]
    output: PathBuf,
    /// AES engine.
    #[arg(long, value_enum, default_value_t = BackendArg::Saes32)]
    backend: BackendArg,
    /// GHASH multiplier.
    #[arg(long, value_enum, default_value_t = GhashArg::Karatsuba64)]
    ghash: GhashArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BackendArg {
    Saes32,
    Saes64,
    Reference,
}

impl BackendArg {
    const ALL: [BackendArg; 3] = [BackendArg::Saes32, BackendArg::Saes64, BackendArg::Reference];

    fn engine(self) -> &'static dyn AesBackend {
        match self {
            BackendArg::Saes32 => &Saes32,
            BackendArg::Saes64 => &Saes64,
            BackendArg::Reference => &Reference,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum GhashArg {
    #[value(name = "compact32")]
    Compact32,
    #[value(name = "compact32-mul")]
    Compact32Mul,
    #[value(name = "karatsuba32")]
    Karatsuba32,
    #[value(name = "karatsuba32-mul")]
    Karatsuba32Mul,
    #[value(name = "schoolbook64")]
    Schoolbook64,
    #[value(name = "schoolbook64-mul")]
    Schoolbook64Mul,
    #[value(name = "karatsuba64")]
    Karatsuba64,
    #[value(name = "karatsuba64-mul")]
    Karatsuba64Mul,
    #[value(name = "bitserial")]
    Bitserial,
}

impl GhashArg {
    fn multiplier(self) -> Box<dyn GhashBackend> {
        use Reduction::{Multiply, Shift};
        let wide = |product, reduction| Box::new(Ghash64 { product, reduction });
        match self {
            GhashArg::Compact32 => Box::new(Ghash32Compact { reduction: Shift }),
            GhashArg::Compact32Mul => Box::new(Ghash32Compact { reduction: Multiply }),
            GhashArg::Karatsuba32 => Box::new(Ghash32Karatsuba { reduction: Shift }),
            GhashArg::Karatsuba32Mul => Box::new(Ghash32Karatsuba { reduction: Multiply }),
            GhashArg::Schoolbook64 => wide(Product::Schoolbook, Shift),
            GhashArg::Schoolbook64Mul => wide(Product::Schoolbook, Multiply),
            GhashArg::Karatsuba64 => wide(Product::Karatsuba, Shift),
            GhashArg::Karatsuba64Mul => wide(Product::Karatsuba, Multiply),
            GhashArg::Bitserial => Box::new(GhashBitSerial),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum CipherArg {
    Aes128,
    Aes192,
    Aes256,
    Sm4,
}

impl From<CipherArg> for CipherId {
    fn from(arg: CipherArg) -> Self {
        match arg {
            CipherArg::Aes128 => CipherId::Aes128,
            CipherArg::Aes192 => CipherId::Aes192,
            CipherArg::Aes256 => CipherId::Aes256,
            CipherArg::Sm4 => CipherId::Sm4,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.command {
        Commands::Selftest { backend, ghash } => cmd_selftest(backend, ghash),
        Commands::Keygen {
            cipher,
            key_hex,
            decrypt,
            out,
        } => cmd_keygen(cipher, &key_hex, decrypt, &out),
        Commands::Ecb {
            schedule,
            input,
            output,
        } => cmd_ecb(&schedule, &input, &output),
        Commands::Seal { gcm } => cmd_seal(&gcm),
        Commands::Open { gcm } => cmd_open(&gcm),
        Commands::Demo { seed } => cmd_demo(seed),
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default)).init();
}

fn cmd_selftest(backend: BackendArg, ghash: GhashArg) -> Result<()> {
    let multiplier = ghash.multiplier();
    let report = selftest::run(backend.engine(), multiplier.as_ref())?;
    println!("{} passed, {} failed", report.passed, report.failed);
    if report.failed > 0 {
        bail!("{} known-answer checks failed", report.failed);
    }
    Ok(())
}

fn cmd_keygen(cipher: CipherArg, key_hex: &str, decrypt: bool, out: &Path) -> Result<()> {
    let key = hexfmt::decode(key_hex).context("decode key hex")?;
    let direction = if decrypt {
        Direction::Decrypt
    } else {
        Direction::Encrypt
    };
    let file = ScheduleFile::generate(cipher.into(), &key, direction)
        .with_context(|| format!("expand {cipher:?} key"))?;
    let bytes = file.to_bytes().context("serialize schedule")?;
    fs::write(out, bytes).with_context(|| format!("write {}", out.display()))?;
    Ok(())
}

fn cmd_ecb(schedule_path: &Path, input_path: &Path, output_path: &Path) -> Result<()> {
    let bytes =
        fs::read(schedule_path).with_context(|| format!("read {}", schedule_path.display()))?;
    let file = ScheduleFile::from_bytes(&bytes).context("deserialize schedule")?;
    let keyed = file.load().context("validate schedule")?;
    let mut data =
        fs::read(input_path).with_context(|| format!("read {}", input_path.display()))?;
    keyed
        .apply_ecb(&mut data)
        .with_context(|| format!("process {}", input_path.display()))?;
    fs::write(output_path, data).with_context(|| format!("write {}", output_path.display()))?;
    Ok(())
}

fn parse_key_hex(key_hex: &str) -> Result<AesKey> {
    let bytes = hexfmt::decode(key_hex).context("decode key hex")?;
    AesKey::from_slice(&bytes).context("AES key must be 16, 24 or 32 bytes")
}

fn parse_iv_hex(iv_hex: &str) -> Result<[u8; IV_BYTES]> {
    let bytes = hexfmt::decode(iv_hex).context("decode IV hex")?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| anyhow!("IV must be {IV_BYTES} bytes, got {}", bytes.len()))
}

fn cmd_seal(args: &GcmArgs) -> Result<()> {
    let key = parse_key_hex(&args.key_hex)?;
    let iv = parse_iv_hex(&args.iv_hex)?;
    let gcm = AesGcm::with_backends(&key, args.backend.engine(), args.ghash.multiplier());
    let pt = fs::read(&args.input).with_context(|| format!("read {}", args.input.display()))?;
    let sealed = gcm.encrypt(&iv, &pt).context("seal")?;
    fs::write(&args.output, sealed)
        .with_context(|| format!("write {}", args.output.display()))?;
    Ok(())
}

fn cmd_open(args: &GcmArgs) -> Result<()> {
    let key = parse_key_hex(&args.key_hex)?;
    let iv = parse_iv_hex(&args.iv_hex)?;
    let gcm = AesGcm::with_backends(&key, args.backend.engine(), args.ghash.multiplier());
    let ct = fs::read(&args.input).with_context(|| format!("read {}", args.input.display()))?;
    let pt = gcm
        .decrypt(&iv, &ct)
        .with_context(|| format!("open {}; no output written", args.input.display()))?;
    fs::write(&args.output, pt).with_context(|| format!("write {}", args.output.display()))?;
    Ok(())
}

fn cmd_demo(seed: Option<u64>) -> Result<()> {
    let mut rng = seeded_rng(seed);

    for size in KeySize::ALL {
        let mut key_bytes = vec![0u8; size.key_bytes()];
        rng.fill_bytes(&mut key_bytes);
        let key = AesKey::from_slice(&key_bytes)?;
        let mut iv = [0u8; IV_BYTES];
        rng.fill_bytes(&mut iv);
        let len = rng.gen_range(0..64);
        let mut message = vec![0u8; len];
        rng.fill_bytes(&mut message);

        let sealed = AesGcm::new(&key).encrypt(&iv, &message)?;
        println!("AES-{} key: {}", size.bits(), hexfmt::encode(&key_bytes));
        println!("iv:         {}", hexfmt::encode(&iv));
        println!("plaintext:  {}", hexfmt::encode(&message));
        println!("sealed:     {}", hexfmt::encode(&sealed));

        for backend in BackendArg::ALL {
            for ghash in GhashArg::value_variants() {
                let gcm = AesGcm::with_backends(&key, backend.engine(), ghash.multiplier());
                let opened = gcm
                    .decrypt(&iv, &sealed)
                    .with_context(|| format!("{backend:?}/{ghash:?} open"))?;
                if opened != message {
                    bail!("demo roundtrip failed for {backend:?}/{ghash:?}");
                }
            }
        }
    }

    let mut sm4_key = [0u8; 16];
    let mut block = [0u8; 16];
    rng.fill_bytes(&mut sm4_key);
    rng.fill_bytes(&mut block);
    let sm4_key = Sm4Key::from(sm4_key);
    let ct = sm4_block(&block, &sm4_enc_key(&sm4_key));
    println!("SM4 key:    {}", hexfmt::encode(&sm4_key.0));
    println!("plaintext:  {}", hexfmt::encode(&block));
    println!("ciphertext: {}", hexfmt::encode(&ct));
    if sm4_block(&ct, &sm4_dec_key(&sm4_key)) != block {
        bail!("SM4 demo roundtrip failed");
    }
    println!("demo succeeded");
    Ok(())
}

fn seeded_rng(seed: Option<u64>) -> impl RngCore + CryptoRng {
    let mut seed_bytes = [0u8; 32];
    match seed {
        Some(value) => seed_bytes[..8].copy_from_slice(&value.to_le_bytes()),
        None => rand::rngs::OsRng.fill_bytes(&mut seed_bytes),
    }
    ChaCha20Rng::from_seed(seed_bytes)
}
