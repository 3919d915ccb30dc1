//! `DepositGadget`: credits a balance leaf by a public deposit amount and
//! touches the owning account leaf once. Grounded on
//! `examples/original_source/circuit/Circuits/DepositCircuit.h`.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::config;
use crate::ops::AccountTouch;
use crate::primitives::ConstraintF as F;

pub struct DepositInput {
    pub touch: AccountTouch<F>,
    pub amount: FpVar<F>,
}

/// Returns the new accounts root, after enforcing that the touched balance
/// leg's `after.balance == before.balance + amount` and `amount < 2^96`
/// (spec.md §4.4 "Deposit").
pub fn deposit(input: DepositInput, accounts_root_before: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
    let leg = input
        .touch
        .balance_leg
        .as_ref()
        .expect("a deposit must touch exactly one balance leg");
    crate::primitives::bits::range_check(&input.amount, config::NUM_BITS_AMOUNT)?;
    let expected = &leg.before.balance + &input.amount;
    expected.enforce_equal(&leg.after.balance)?;
    input.touch.apply(accounts_root_before)
}
