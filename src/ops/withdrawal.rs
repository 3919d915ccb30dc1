//! `WithdrawGadget`: debits a balance leaf by a public withdrawal amount,
//! requiring the prior balance to cover it, and verifies the account
//! owner's signature authorizing the withdrawal. Grounded on
//! `examples/original_source/circuit/Circuits/WithdrawCircuit.h`.

use ark_ed_on_bls12_377::constraints::EdwardsVar;
use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::math::{force_leq::force_leq, signature::{self, SignatureVar}};
use crate::ops::AccountTouch;
use crate::primitives::ConstraintF as F;

pub struct WithdrawInput {
    pub touch: AccountTouch<F>,
    pub amount: FpVar<F>,
    pub generator: EdwardsVar,
    pub owner_pk: EdwardsVar,
    pub sig: SignatureVar,
    pub nonce: FpVar<F>,
}

/// Returns the new accounts root, after enforcing `after.balance ==
/// before.balance - amount`, `amount <= before.balance`, and a valid
/// owner signature over `(amount, nonce)`.
pub fn withdraw(input: WithdrawInput, accounts_root_before: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
    let leg = input
        .touch
        .balance_leg
        .as_ref()
        .expect("a withdrawal must touch exactly one balance leg");

    force_leq(&input.amount, &leg.before.balance)?;
    let expected = &leg.before.balance - &input.amount;
    expected.enforce_equal(&leg.after.balance)?;

    // Binds the signing key to the account leaf's own authenticated
    // `publicKeyX/Y` fields, matching `AccountGadgets.h`'s
    // `UpdateAccountGadget` wiring the order's own `publicKey` variable
    // directly into the leaf hash rather than taking it on faith: without
    // this, a prover could authenticate the real account leaf unchanged
    // while signing the withdrawal with a key of its own choosing.
    input.owner_pk.x.enforce_equal(&input.touch.before.public_key_x)?;
    input.owner_pk.y.enforce_equal(&input.touch.before.public_key_y)?;

    signature::enforce_valid(
        input.generator,
        input.owner_pk,
        &[input.amount.clone(), input.nonce.clone()],
        &input.sig,
    )?;

    input.touch.apply(accounts_root_before)
}
