//! An arithmetic-circuit compiler and witness generator for a Loopring-style
//! zk-rollup: four Groth16 circuits (trade, deposit, withdraw, cancel), each
//! folding a block's operations through a sparse-Merkle account tree one
//! `UpdateAccountGadget`-style touch at a time and exposing a single public
//! input, the SHA-256 digest over every operation's public data.
//!
//! Layered bottom-up, each module only depending on the ones above it in
//! this list:
//! - [`primitives`]: the algebraic hash, embedded-curve signature scheme and
//!   sparse-Merkle authenticate/recompute pair every higher layer is built
//!   from.
//! - [`math`]: field-level comparison, selection, and bounded division
//!   gadgets (`ForceLeq`, `MulDiv`, ...).
//! - [`state`]: the account/balance/trading-history/burn-rate leaf schemas
//!   and their update gadgets.
//! - [`domain`]: order validity, fill-amount and fee-payment calculators.
//! - [`ops`]: one gadget per block operation (ring settlement, deposit,
//!   withdrawal, cancellation), each wiring `state` updates through
//!   `domain` calculators.
//! - [`circuits`]: the four `ConstraintSynthesizer` block circuits plus
//!   their `circuit_setup()`/`generate_groth_proof()`/`verify()` triad.
//! - [`input`]: the JSON parse layer turning a block file into the native
//!   records `circuits` witnesses from.
//! - [`config`]: compile-time tree depths and field bit-widths shared by
//!   every layer above.
//! - [`error`]: the `thiserror`-derived error enum surfaced by every
//!   fallible entry point.
//! - [`keys`]: Groth16 proving/verifying key (de)serialization and the
//!   `keys/<type>_<N>_{pk.raw,vk.json}` naming convention, shared by the
//!   `rollup-tool` binary's `createkeys`/`prove` subcommands.

pub mod circuits;
pub mod config;
pub mod domain;
pub mod error;
pub mod input;
pub mod keys;
pub mod math;
pub mod ops;
pub mod primitives;
pub mod state;
