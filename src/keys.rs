//! Groth16 key (de)serialization and the `keys/<type>_<N>_{pk.raw,vk.json}`
//! naming convention (spec.md §6). Grounded on the teacher's
//! `userland/src/circuits/utils.rs` (`write_groth_key_to_file` /
//! `read_groth_key_from_file`), generalized from that pair's single
//! hardcoded `/tmp/sanctum` path to one base path per block type and
//! element count, and from bs58-text-for-both to a raw binary proving key
//! (`.raw`) plus a JSON-wrapped verifying key (`.json`) — matching
//! `original_source/circuit/main.cpp`'s own `_pk.raw`/`_vk.json` split.

use std::fs;
use std::path::{Path, PathBuf};

use ark_bw6_761::BW6_761;
use ark_groth16::{ProvingKey, VerifyingKey};
use ark_serialize::{CanonicalDeserialize, CanonicalSerialize};
use serde::{Deserialize, Serialize};

use crate::config::BlockType;
use crate::error::BlockError;

/// `keys/<type>_<N>` with no extension, the shared stem for a block's key pair.
pub fn key_base_path(keys_dir: &Path, block_type: BlockType, num_elements: usize) -> PathBuf {
    let type_name = match block_type {
        BlockType::Trade => "trade",
        BlockType::Deposit => "deposit",
        BlockType::Withdraw => "withdraw",
        BlockType::Cancel => "cancel",
    };
    keys_dir.join(format!("{type_name}_{num_elements}"))
}

#[derive(Serialize, Deserialize)]
struct VerifyingKeyJson {
    /// bs58 encoding of the uncompressed `ark-serialize` bytes, the same
    /// encoding the teacher's `utils.rs` uses for both of its key files.
    vk: String,
}

pub fn write_groth_key_to_file(
    pk: &ProvingKey<BW6_761>,
    vk: &VerifyingKey<BW6_761>,
    base_path: &Path,
) -> Result<(), BlockError> {
    if let Some(parent) = base_path.parent() {
        fs::create_dir_all(parent)?;
    }

    let stem = base_path.file_name().unwrap().to_string_lossy().into_owned();

    let mut pk_bytes = Vec::new();
    pk.serialize_uncompressed(&mut pk_bytes)?;
    fs::write(base_path.with_file_name(format!("{stem}_pk.raw")), pk_bytes)?;

    let mut vk_bytes = Vec::new();
    vk.serialize_uncompressed(&mut vk_bytes)?;
    let vk_json = VerifyingKeyJson {
        vk: bs58::encode(vk_bytes).into_string(),
    };
    let vk_path = base_path.with_file_name(format!("{stem}_vk.json"));
    fs::write(vk_path, serde_json::to_vec_pretty(&vk_json).map_err(BlockError::Json)?)?;

    Ok(())
}

pub fn read_groth_key_from_file(
    base_path: &Path,
) -> Result<(ProvingKey<BW6_761>, VerifyingKey<BW6_761>), BlockError> {
    let stem = base_path.file_name().unwrap().to_string_lossy().into_owned();
    let pk_path = base_path.with_file_name(format!("{stem}_pk.raw"));
    let vk_path = base_path.with_file_name(format!("{stem}_vk.json"));

    let pk_bytes = fs::read(pk_path)?;
    let pk = ProvingKey::<BW6_761>::deserialize_uncompressed(pk_bytes.as_slice())?;

    let vk_json: VerifyingKeyJson =
        serde_json::from_slice(&fs::read(vk_path)?).map_err(BlockError::Json)?;
    let vk_bytes = bs58::decode(vk_json.vk)
        .into_vec()
        .map_err(|e| BlockError::Encoding(format!("malformed base58 verifying key: {e}")))?;
    let vk = VerifyingKey::<BW6_761>::deserialize_uncompressed(vk_bytes.as_slice())?;

    Ok((pk, vk))
}

pub fn keys_exist(base_path: &Path) -> bool {
    let stem = base_path.file_name().unwrap().to_string_lossy().into_owned();
    base_path.with_file_name(format!("{stem}_pk.raw")).exists()
        && base_path.with_file_name(format!("{stem}_vk.json")).exists()
}
