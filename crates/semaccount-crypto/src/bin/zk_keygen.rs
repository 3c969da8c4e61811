//! Groth16 key tool for the membership circuit.
//!
//! Usage:
//!   cargo run --bin zk-keygen -- generate --depth 20 --output ./zk-keys
//!   cargo run --bin zk-keygen -- verify --vk ./zk-keys/membership_d20.vk.bin
//!   cargo run --bin zk-keygen -- info --keys-dir ./zk-keys

use ark_bn254::Bn254;
use ark_groth16::VerifyingKey;
use ark_serialize::CanonicalDeserialize;
use clap::{Parser, Subcommand};
use semaccount_crypto::{proving_key_file_name, verifying_key_file_name, MembershipKeys};
use semaccount_types::{DEFAULT_TREE_DEPTH, MAX_TREE_DEPTH, MIN_TREE_DEPTH};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const CIRCUIT_VERSION: &str = "1.0.0";

#[derive(Parser)]
#[command(name = "zk-keygen")]
#[command(about = "Generate Groth16 keys for semaccount membership proofs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate proving and verifying keys for one or more tree depths.
    Generate {
        #[arg(short, long, default_value = "./zk-keys")]
        output: PathBuf,

        /// Tree depth; repeat for several.
        #[arg(short, long, default_values_t = vec![DEFAULT_TREE_DEPTH])]
        depth: Vec<usize>,
    },

    /// Check that a verifying key parses and matches an expected hash.
    Verify {
        #[arg(short, long)]
        vk: PathBuf,

        /// Expected blake3 hash (hex).
        #[arg(short, long)]
        expected_hash: Option<String>,
    },

    /// List keys present in a directory.
    Info {
        #[arg(short, long, default_value = "./zk-keys")]
        keys_dir: PathBuf,
    },
}

fn compute_vk_hash(vk_bytes: &[u8]) -> String {
    hex::encode(blake3::hash(vk_bytes).as_bytes())
}

fn meta_file_name(depth: usize) -> String {
    format!("membership_d{}.meta.json", depth)
}

fn generate_keys(output_dir: &Path, depths: &[usize]) -> Result<(), Box<dyn std::error::Error>> {
    println!("semaccount ZK Key Generator v{}", CIRCUIT_VERSION);
    println!("================================");
    println!();

    fs::create_dir_all(output_dir)?;
    let mut rng = rand::rngs::OsRng;

    for &depth in depths {
        println!("Running circuit-specific setup for depth {}...", depth);
        let keys = MembershipKeys::setup(depth, &mut rng)?;

        let pk_bytes = keys.proving_key_bytes()?;
        let pk_path = output_dir.join(proving_key_file_name(depth));
        fs::write(&pk_path, &pk_bytes)?;
        println!("  Proving key: {} ({} bytes)", pk_path.display(), pk_bytes.len());

        let vk_bytes = keys.verifying_key_bytes()?;
        let vk_path = output_dir.join(verifying_key_file_name(depth));
        fs::write(&vk_path, &vk_bytes)?;
        println!("  Verifying key: {} ({} bytes)", vk_path.display(), vk_bytes.len());

        let vk_hash = compute_vk_hash(&vk_bytes);
        let mut hash_file = fs::File::create(output_dir.join(format!("membership_d{}.vk.hash", depth)))?;
        writeln!(hash_file, "{}", vk_hash)?;
        println!("  VK hash: {}", vk_hash);

        let metadata = serde_json::json!({
            "circuit": "membership",
            "version": CIRCUIT_VERSION,
            "depth": depth,
            "public_inputs": ["root", "nullifier_hash", "signal_hash", "external_nullifier"],
            "vk_hash": vk_hash,
            "pk_size": pk_bytes.len(),
            "vk_size": vk_bytes.len(),
            "generated_at": chrono::Utc::now().to_rfc3339(),
        });
        let meta_file = fs::File::create(output_dir.join(meta_file_name(depth)))?;
        serde_json::to_writer_pretty(meta_file, &metadata)?;
        println!();
    }

    println!("Key generation complete.");
    println!("Copy the *.vk.bin files into the validator's key directory.");
    Ok(())
}

fn verify_key(vk_path: &Path, expected_hash: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    println!("Verifying key: {}", vk_path.display());

    let vk_bytes = fs::read(vk_path)?;
    let actual_hash = compute_vk_hash(&vk_bytes);
    println!("VK hash: {}", actual_hash);
    println!("Size: {} bytes", vk_bytes.len());

    let vk = VerifyingKey::<Bn254>::deserialize_compressed(&vk_bytes[..])?;
    println!("Deserialization: OK ({} public inputs)", vk.gamma_abc_g1.len().saturating_sub(1));

    if let Some(expected) = expected_hash {
        if actual_hash != expected.trim_start_matches("0x") {
            return Err(format!("hash mismatch: expected {}, actual {}", expected, actual_hash).into());
        }
        println!("Hash match: OK");
    }

    Ok(())
}

fn show_info(keys_dir: &Path) -> Result<(), Box<dyn std::error::Error>> {
    println!("Membership keys in {}", keys_dir.display());
    println!();

    let mut found = 0;
    for depth in MIN_TREE_DEPTH..=MAX_TREE_DEPTH {
        let meta_path = keys_dir.join(meta_file_name(depth));
        if !meta_path.exists() {
            continue;
        }
        found += 1;
        let metadata: serde_json::Value = serde_json::from_str(&fs::read_to_string(&meta_path)?)?;
        println!("Depth {}:", depth);
        println!("  Version: {}", metadata["version"]);
        println!("  VK hash: {}", metadata["vk_hash"]);
        println!("  PK size: {} bytes", metadata["pk_size"]);
        println!("  VK size: {} bytes", metadata["vk_size"]);
        println!("  Generated: {}", metadata["generated_at"]);
    }

    if found == 0 {
        println!("No keys found. Run 'zk-keygen generate' first.");
    }
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { output, depth } => generate_keys(&output, &depth)?,
        Commands::Verify { vk, expected_hash } => verify_key(&vk, expected_hash)?,
        Commands::Info { keys_dir } => show_info(&keys_dir)?,
    }

    Ok(())
}
