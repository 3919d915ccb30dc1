//! Error types surfaced across the block-shape, JSON and witness layers.
//!
//! Grounded on `examples/Pauli-Group-Hegemon/crypto/src/error.rs`'s
//! `thiserror`-derived enum with manual `From` impls for the lower-level
//! error types it wraps.

use thiserror::Error;

/// Errors a caller can observe while turning a JSON block into a satisfied
/// `ConstraintSystem`. Nothing in this crate panics on malformed input; every
/// fallible entry point returns one of these instead.
#[derive(Debug, Error)]
pub enum BlockError {
    #[error("block shape mismatch: {0}")]
    ShapeMismatch(String),

    #[error("failed to parse block JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("circuit is not satisfied after witness assignment: {0}")]
    Unsatisfied(String),

    #[error("R1CS synthesis failed: {0}")]
    Synthesis(#[from] ark_relations::r1cs::SynthesisError),

    #[error("groth16 proving/verification failed: {0}")]
    Groth16(String),

    #[error("key file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("key (de)serialization failed: {0}")]
    Serialize(#[from] ark_serialize::SerializationError),

    #[error("malformed base58 field element: {0}")]
    Encoding(String),
}
