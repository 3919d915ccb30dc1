//! `CancelGadget`: authenticates an owner-signed cancellation message,
//! leaves the account leaf untouched (an authenticate-old/recompute-new
//! pair with identical before/after) and flips `cancelled` to `1` in the
//! addressed trading-history leaf. Grounded on
//! `examples/original_source/circuit/Circuits/CancelCircuit.h`.

use ark_ed_on_bls12_377::constraints::EdwardsVar;
use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::math::{force_leq::force_leq, signature::{self, SignatureVar}};
use crate::ops::AccountTouch;
use crate::primitives::ConstraintF as F;
use crate::state::trade_history::TradeHistoryStateVar;

pub struct CancelInput {
    /// The account leaf is read, not mutated: `before == after` is the
    /// caller's responsibility to wire identically.
    pub touch: AccountTouch<F>,
    pub trade_history_before: TradeHistoryStateVar<F>,
    pub trade_history_after: TradeHistoryStateVar<F>,
    pub trade_history_address_bits: Vec<Boolean<F>>,
    pub trade_history_proof: crate::primitives::merkle::MerkleProofVar<F>,
    pub trade_history_root_before: FpVar<F>,
    pub generator: EdwardsVar,
    pub owner_pk: EdwardsVar,
    pub sig: SignatureVar,
    pub order_id: FpVar<F>,
}

pub struct CancelOutput {
    pub accounts_root: FpVar<F>,
    pub trade_history_root: FpVar<F>,
}

/// Returns `(accounts_root, trade_history_root)` after enforcing the owner's
/// signature over `(account, orderID)`, `cancelledAfter == 1` and
/// `ForceLeq(cancelledAfter, 1)` (trivially true, kept for fidelity with the
/// original's explicit assertion), and folding the unchanged account leaf.
pub fn cancel(input: CancelInput, accounts_root_before: &FpVar<F>) -> Result<CancelOutput, SynthesisError> {
    let CancelInput {
        touch,
        trade_history_before,
        trade_history_after,
        trade_history_address_bits,
        trade_history_proof,
        trade_history_root_before,
        generator,
        owner_pk,
        sig,
        order_id,
    } = input;

    // The signed message is `(account, orderID)` where `account` is the
    // account's raw tree address, not its leaf hash (confirmed against
    // `CancelGadget::sig_m = flatten({account, orderID, padding})` in the
    // original — `account` there is the same `VariableArrayT` used to
    // authenticate the Merkle path, not a MiMC digest).
    // Binds the signing key to the account leaf's own authenticated
    // `publicKeyX/Y` fields (see `ops::withdrawal::withdraw`'s identical
    // binding): without it, a prover could leave the real account leaf
    // unchanged while cancelling with a key of its own choosing.
    owner_pk.x.enforce_equal(&touch.before.public_key_x)?;
    owner_pk.y.enforce_equal(&touch.before.public_key_y)?;

    let account_address = Boolean::le_bits_to_fp_var(&touch.address_bits)?;
    signature::enforce_valid(generator, owner_pk, &[account_address, order_id], &sig)?;

    let one = FpVar::constant(F::one());
    let cancelled_after_field = crate::math::ternary::select(
        &trade_history_after.cancelled,
        &one,
        &FpVar::constant(F::zero()),
    )?;
    force_leq(&cancelled_after_field, &one)?;
    trade_history_after
        .cancelled
        .enforce_equal(&Boolean::TRUE)?;

    let leaf_before = trade_history_before.leaf()?;
    crate::primitives::merkle::authenticate_gadget(
        &leaf_before,
        &trade_history_address_bits,
        &trade_history_proof,
        &trade_history_root_before,
    )?;
    let leaf_after = trade_history_after.leaf()?;
    let trade_history_root = crate::primitives::merkle::recompute_gadget(
        &leaf_after,
        &trade_history_address_bits,
        &trade_history_proof,
    )?;

    let accounts_root = touch.apply(accounts_root_before)?;

    Ok(CancelOutput {
        accounts_root,
        trade_history_root,
    })
}
