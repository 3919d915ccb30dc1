//! L4: per-operation gadgets. Each assembles the L1-L3 gadgets into the
//! complete state transition for one element of a block (one ring
//! settlement, one deposit, one withdrawal, one cancellation), leaving only
//! the public-data accumulation and the outer N-element loop to the L5
//! circuit. Grounded on
//! `examples/original_source/circuit/Circuits/{TradeCircuit.h,
//! DepositCircuit.h,WithdrawCircuit.h,CancelCircuit.h}`.

pub mod ring_settlement;
pub mod deposit;
pub mod withdrawal;
pub mod cancel;

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::primitives::merkle::MerkleProofVar;
use crate::state::account::AccountStateVar;
use crate::state::balance::BalanceStateVar;

/// One leg of a balance-tree update nested inside an account-leaf update:
/// the balance leaf's own sibling path, and its before/after state. `None`
/// when the account touch doesn't change any balance (e.g. a pure
/// nonce/public-key update would, but no operation here needs that).
pub struct BalanceLeg<F: PrimeField> {
    pub address_bits: Vec<Boolean<F>>,
    pub proof: MerkleProofVar<F>,
    pub before: BalanceStateVar<F>,
    pub after: BalanceStateVar<F>,
}

impl<F: PrimeField> BalanceLeg<F> {
    /// Authenticates `before` against `balances_root_before` and returns the
    /// balances-tree root implied by `after` at the same address.
    pub fn apply(&self, balances_root_before: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
        crate::state::balance::update_gadget(
            &self.before,
            &self.after,
            &self.address_bits,
            &self.proof,
            balances_root_before,
        )
    }
}

/// One of the 13-14 `UpdateAccountGadget` calls a ring settlement makes (or
/// the 1-2 an on-ramp/off-ramp/cancel op makes): an account-tree leaf
/// update whose `balances_root` field is itself produced by nesting a
/// [`BalanceLeg`] update, when this touch changes a balance.
pub struct AccountTouch<F: PrimeField> {
    pub address_bits: Vec<Boolean<F>>,
    pub proof: MerkleProofVar<F>,
    pub before: AccountStateVar<F>,
    pub after: AccountStateVar<F>,
    pub balance_leg: Option<BalanceLeg<F>>,
}

impl<F: PrimeField> AccountTouch<F> {
    /// If `balance_leg` is set, constrains `after.balances_root` to be the
    /// root that leg's update implies; then folds the account-leaf update
    /// into `accounts_root_before`, returning the new accounts root.
    pub fn apply(&self, accounts_root_before: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
        if let Some(leg) = &self.balance_leg {
            let implied_root = leg.apply(&self.before.balances_root)?;
            implied_root.enforce_equal(&self.after.balances_root)?;
        }
        crate::state::account::update_gadget(
            &self.before,
            &self.after,
            &self.address_bits,
            &self.proof,
            accounts_root_before,
        )
    }
}

/// Folds a chain of account touches, threading the accounts root through
/// each in turn — the same sequential composition
/// `original_source/circuit/Circuits/TradeCircuit.h` performs for its 13
/// `UpdateAccountGadget` calls per ring.
pub fn chain_account_touches<F: PrimeField>(
    mut root: FpVar<F>,
    touches: &[AccountTouch<F>],
) -> Result<FpVar<F>, SynthesisError> {
    for touch in touches {
        root = touch.apply(&root)?;
    }
    Ok(root)
}
