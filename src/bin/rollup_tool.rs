//! `rollup-tool`: the block-verification/proving/key-generation driver
//! (spec.md §6's "collaborator, listed for completeness" CLI). Grounded on
//! `original_source/circuit/main.cpp`'s `-verify`/`-prove`/`-createkeys`
//! dispatch (here as subcommands, clap's idiomatic rendering of the same
//! three modes) and on the teacher's `userland/src/setup/main.rs` /
//! `client/main.rs` for the "build circuit, then hand it to Groth16" shape.

use std::path::PathBuf;
use std::process::ExitCode;

use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystem};
use clap::{Parser, Subcommand};

use loopring_circuits::circuits::cancel::CancelCircuit;
use loopring_circuits::circuits::deposit::DepositCircuit;
use loopring_circuits::circuits::trade::TradeCircuit;
use loopring_circuits::circuits::withdraw::WithdrawCircuit;
use loopring_circuits::config::BlockType;
use loopring_circuits::error::BlockError;
use loopring_circuits::input::BlockJson;
use loopring_circuits::keys;
use loopring_circuits::primitives::ConstraintF as F;

#[derive(Debug, Parser)]
#[command(name = "rollup-tool", about = "Loopring-style rollup block verifier/prover")]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Base directory the `<type>_<N>_{pk.raw,vk.json}` key pair lives under.
    #[arg(long, global = true, default_value = "keys")]
    keys_dir: PathBuf,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Builds the circuit for `block.json` and checks that its witness
    /// satisfies every emitted constraint, without running Groth16.
    Verify { block: PathBuf },
    /// Verifies the block, then produces a Groth16 proof over it, creating
    /// the key pair first if it doesn't already exist on disk.
    Prove { block: PathBuf, out: PathBuf },
    /// Runs the Groth16 circuit-specific setup for `block.json`'s block type
    /// and element count, writing the key pair to `--keys-dir`.
    Createkeys { block: PathBuf },
}

fn read_block(path: &PathBuf) -> Result<(BlockJson, BlockType, usize), BlockError> {
    let raw = std::fs::read_to_string(path)?;
    let block = BlockJson::parse(&raw)?;
    let block_type = block.block_type_checked()?;
    let n = block.num_elements as usize;
    Ok((block, block_type, n))
}

/// Builds the real circuit from a parsed block and checks its witness
/// satisfies every constraint it emits (spec.md §7, error kind 3). Returns
/// `Ok(false)` rather than an error for an unsatisfied-but-well-formed
/// block, matching the original's "Block is not valid!" (exit 1, no panic).
fn verify_block(block: BlockJson, block_type: BlockType) -> Result<bool, BlockError> {
    let cs = ConstraintSystem::<F>::new_ref();
    match block_type {
        BlockType::Trade => TradeCircuit::from_block(block)?.generate_constraints(cs.clone())?,
        BlockType::Deposit => DepositCircuit::from_block(block)?.generate_constraints(cs.clone())?,
        BlockType::Withdraw => WithdrawCircuit::from_block(block)?.generate_constraints(cs.clone())?,
        BlockType::Cancel => CancelCircuit::from_block(block)?.generate_constraints(cs.clone())?,
    }
    Ok(cs.is_satisfied()?)
}

fn create_keys(keys_dir: &std::path::Path, block_type: BlockType, n: usize) -> Result<(), BlockError> {
    let base_path = keys::key_base_path(keys_dir, block_type, n);
    if keys::keys_exist(&base_path) {
        tracing::info!(path = %base_path.display(), "keys already exist, skipping setup");
        return Ok(());
    }
    tracing::info!(block_type = ?block_type, n, "running circuit-specific setup");
    let (pk, vk) = match block_type {
        BlockType::Trade => TradeCircuit::circuit_setup(n)?,
        BlockType::Deposit => DepositCircuit::circuit_setup(n)?,
        BlockType::Withdraw => WithdrawCircuit::circuit_setup(n)?,
        BlockType::Cancel => CancelCircuit::circuit_setup(n)?,
    };
    keys::write_groth_key_to_file(&pk, &vk, &base_path)
}

fn prove_block(
    keys_dir: &std::path::Path,
    block: BlockJson,
    block_type: BlockType,
    n: usize,
    out: &std::path::Path,
) -> Result<(), BlockError> {
    let base_path = keys::key_base_path(keys_dir, block_type, n);
    if !keys::keys_exist(&base_path) {
        create_keys(keys_dir, block_type, n)?;
    }
    let (pk, _vk) = keys::read_groth_key_from_file(&base_path)?;

    let (proof, public_inputs) = match block_type {
        BlockType::Trade => TradeCircuit::from_block(block)?.generate_groth_proof(&pk)?,
        BlockType::Deposit => DepositCircuit::from_block(block)?.generate_groth_proof(&pk)?,
        BlockType::Withdraw => WithdrawCircuit::from_block(block)?.generate_groth_proof(&pk)?,
        BlockType::Cancel => CancelCircuit::from_block(block)?.generate_groth_proof(&pk)?,
    };

    #[derive(serde::Serialize)]
    struct ProofFile {
        proof: String,
        public_inputs: Vec<String>,
    }
    let mut proof_bytes = Vec::new();
    ark_serialize::CanonicalSerialize::serialize_uncompressed(&proof, &mut proof_bytes)?;
    let public_inputs = public_inputs
        .iter()
        .map(|f| {
            let mut bytes = Vec::new();
            ark_serialize::CanonicalSerialize::serialize_uncompressed(f, &mut bytes)
                .map(|_| bs58::encode(bytes).into_string())
        })
        .collect::<Result<Vec<_>, _>>()?;
    let proof_file = ProofFile {
        proof: bs58::encode(proof_bytes).into_string(),
        public_inputs,
    };
    std::fs::write(out, serde_json::to_vec_pretty(&proof_file).map_err(BlockError::Json)?)?;
    Ok(())
}

fn run() -> Result<bool, BlockError> {
    let cli = Cli::parse();
    match cli.command {
        Command::Verify { block } => {
            let (block, block_type, _n) = read_block(&block)?;
            tracing::info!(?block_type, "verifying block");
            let ok = verify_block(block, block_type)?;
            if ok {
                println!("Block is valid.");
            } else {
                eprintln!("Block is not valid!");
            }
            Ok(ok)
        }
        Command::Prove { block, out } => {
            let (parsed, block_type, n) = read_block(&block)?;
            tracing::info!(?block_type, n, "verifying block before proving");
            if !verify_block(parsed.clone(), block_type)? {
                eprintln!("Block is not valid!");
                return Ok(false);
            }
            println!("Block is valid.");
            prove_block(&cli.keys_dir, parsed, block_type, n, &out)?;
            println!("Proof written to {}", out.display());
            Ok(true)
        }
        Command::Createkeys { block } => {
            let (_block, block_type, n) = read_block(&block)?;
            create_keys(&cli.keys_dir, block_type, n)?;
            println!("Keys written to {}", keys::key_base_path(&cli.keys_dir, block_type, n).display());
            Ok(true)
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    match run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            eprintln!("Block is not valid: {err}");
            ExitCode::FAILURE
        }
    }
}
