//! `SignatureVerifier`: binds an EdDSA check over the embedded curve to a
//! flattened tuple of message field elements, enforcing the result is valid.
//! Every call site (`OrderGadget`, `RingSettlement`'s miner/wallet
//! signatures, `CancelGadget`) constructs the message tuple itself and hands
//! it here — this module only owns the verify-and-enforce step.

use ark_ed_on_bls12_377::constraints::EdwardsVar;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::primitives::ConstraintF;

pub struct SignatureVar {
    pub r: EdwardsVar,
    pub s_bits: Vec<Boolean<ConstraintF>>,
}

/// Enforces that `sig` is a valid signature by `pk` over `message`, using
/// `generator` as the embedded curve's base point.
pub fn enforce_valid(
    generator: EdwardsVar,
    pk: EdwardsVar,
    message: &[FpVar<ConstraintF>],
    sig: &SignatureVar,
) -> Result<(), SynthesisError> {
    let valid = crate::primitives::eddsa::verify_gadget(
        generator,
        pk,
        message,
        sig.r.clone(),
        &sig.s_bits,
    )?;
    valid.enforce_equal(&Boolean::TRUE)
}
