//! The account leaf: `(publicKeyX, publicKeyY, walletID, nonce,
//! balancesRoot)` hashed with MiMC. Grounded on
//! `examples/original_source/circuit/Gadgets/AccountGadgets.h`'s
//! `AccountState`/`UpdateAccountGadget`. Every `TradeCircuit` ring touches
//! 13 of these (SPEC_FULL.md §3); `DepositCircuit`/`WithdrawCircuit`/
//! `CancelCircuit` touch one or two.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::primitives::merkle::{self, MerkleProofVar};

#[derive(Debug, Clone, Copy)]
pub struct AccountState<F> {
    pub public_key_x: F,
    pub public_key_y: F,
    pub wallet_id: F,
    pub nonce: F,
    pub balances_root: F,
}

impl<F: PrimeField> AccountState<F> {
    pub fn leaf(&self) -> F {
        crate::primitives::mimc::hash(&[
            self.public_key_x,
            self.public_key_y,
            self.wallet_id,
            self.nonce,
            self.balances_root,
        ])
    }
}

pub struct AccountStateVar<F: PrimeField> {
    pub public_key_x: FpVar<F>,
    pub public_key_y: FpVar<F>,
    pub wallet_id: FpVar<F>,
    pub nonce: FpVar<F>,
    pub balances_root: FpVar<F>,
}

impl<F: PrimeField> AccountStateVar<F> {
    pub fn leaf(&self) -> Result<FpVar<F>, SynthesisError> {
        crate::primitives::mimc::hash_gadget(&[
            self.public_key_x.clone(),
            self.public_key_y.clone(),
            self.wallet_id.clone(),
            self.nonce.clone(),
            self.balances_root.clone(),
        ])
    }
}

/// Authenticates `before`, recomputes the leaf for `after` and returns the
/// new accounts-tree root.
pub fn update_gadget<F: PrimeField>(
    before: &AccountStateVar<F>,
    after: &AccountStateVar<F>,
    address_bits: &[Boolean<F>],
    proof: &MerkleProofVar<F>,
    root_before: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let leaf_before = before.leaf()?;
    merkle::authenticate_gadget(&leaf_before, address_bits, proof, root_before)?;
    let leaf_after = after.leaf()?;
    merkle::recompute_gadget(&leaf_after, address_bits, proof)
}

/// Per SPEC_FULL.md §3's REDESIGN FLAG (ii): the operator's own account leaf
/// gets a dedicated schema instead of overloading the wallet/balance slots
/// with sentinel `constant0`/`constant1` values the way
/// `original_source/circuit/Circuits/TradeCircuit.h`'s final `UpdateAccount`
/// call does.
#[derive(Debug, Clone, Copy)]
pub struct OperatorAccountState<F> {
    pub public_key_x: F,
    pub public_key_y: F,
    pub nonce: F,
    pub balances_root: F,
}

impl<F: PrimeField> OperatorAccountState<F> {
    pub fn leaf(&self) -> F {
        crate::primitives::mimc::hash(&[self.public_key_x, self.public_key_y, self.nonce, self.balances_root])
    }
}

pub struct OperatorAccountStateVar<F: PrimeField> {
    pub public_key_x: FpVar<F>,
    pub public_key_y: FpVar<F>,
    pub nonce: FpVar<F>,
    pub balances_root: FpVar<F>,
}

impl<F: PrimeField> OperatorAccountStateVar<F> {
    pub fn leaf(&self) -> Result<FpVar<F>, SynthesisError> {
        crate::primitives::mimc::hash_gadget(&[
            self.public_key_x.clone(),
            self.public_key_y.clone(),
            self.nonce.clone(),
            self.balances_root.clone(),
        ])
    }
}

pub fn update_operator_gadget<F: PrimeField>(
    before: &OperatorAccountStateVar<F>,
    after: &OperatorAccountStateVar<F>,
    address_bits: &[Boolean<F>],
    proof: &MerkleProofVar<F>,
    root_before: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let leaf_before = before.leaf()?;
    merkle::authenticate_gadget(&leaf_before, address_bits, proof, root_before)?;
    let leaf_after = after.leaf()?;
    merkle::recompute_gadget(&leaf_after, address_bits, proof)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;

    #[test]
    fn leaf_changes_with_balances_root() {
        let base = AccountState::<F> {
            public_key_x: F::from(1u64),
            public_key_y: F::from(2u64),
            wallet_id: F::from(3u64),
            nonce: F::from(0u64),
            balances_root: F::from(7u64),
        };
        let bumped = AccountState { balances_root: F::from(8u64), ..base };
        assert_ne!(base.leaf(), bumped.leaf());
        assert_eq!(base.leaf(), base.leaf());
    }

    #[test]
    fn operator_leaf_is_distinct_schema_from_account_leaf() {
        // Same four scalars but an operator leaf omits walletID from the
        // hash input, so it must not collide with an ordinary account leaf
        // that happens to share the other three fields and walletID == 0.
        let account = AccountState::<F> {
            public_key_x: F::from(1u64),
            public_key_y: F::from(2u64),
            wallet_id: F::from(0u64),
            nonce: F::from(3u64),
            balances_root: F::from(4u64),
        };
        let operator = OperatorAccountState::<F> {
            public_key_x: F::from(1u64),
            public_key_y: F::from(2u64),
            nonce: F::from(3u64),
            balances_root: F::from(4u64),
        };
        assert_ne!(account.leaf(), operator.leaf());
    }
}
