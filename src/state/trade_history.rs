//! The trading-history leaf: `(filled, cancelled)` hashed with MiMC, updated
//! in place by every ring settlement and cancellation. Grounded on
//! `examples/original_source/circuit/Gadgets/TradingHistoryGadgets.h`'s
//! `UpdateTradeHistoryGadget`/`CheckFillsGadget`.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::math::ternary;
use crate::primitives::merkle::{self, MerkleProofVar};

/// Native trade-history leaf state.
#[derive(Debug, Clone, Copy)]
pub struct TradeHistoryState<F> {
    pub filled: F,
    pub cancelled: bool,
}

impl<F: PrimeField> TradeHistoryState<F> {
    pub fn leaf(&self) -> F {
        crate::primitives::mimc::hash(&[self.filled, if self.cancelled { F::one() } else { F::zero() }])
    }
}

/// R1CS leaf state.
pub struct TradeHistoryStateVar<F: PrimeField> {
    pub filled: FpVar<F>,
    pub cancelled: Boolean<F>,
}

impl<F: PrimeField> TradeHistoryStateVar<F> {
    pub fn leaf(&self) -> Result<FpVar<F>, SynthesisError> {
        let cancelled_field = ternary::select(
            &self.cancelled,
            &FpVar::constant(F::one()),
            &FpVar::constant(F::zero()),
        )?;
        crate::primitives::mimc::hash_gadget(&[self.filled.clone(), cancelled_field])
    }
}

/// Authenticates `before` at `address` against `root_before`, recomputes the
/// leaf for `after`, and returns the new root — the same shared-proof
/// authenticate-then-recompute pattern `UpdateAccountGadget` uses.
pub fn update_gadget<F: PrimeField>(
    before: &TradeHistoryStateVar<F>,
    after: &TradeHistoryStateVar<F>,
    address_bits: &[Boolean<F>],
    proof: &MerkleProofVar<F>,
    root_before: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let leaf_before = before.leaf()?;
    merkle::authenticate_gadget(&leaf_before, address_bits, proof, root_before)?;
    let leaf_after = after.leaf()?;
    merkle::recompute_gadget(&leaf_after, address_bits, proof)
}

/// `CheckFillsGadget`: `valid = 1 - allOrNone * (fillAmountS < amountS)`.
pub fn check_fills<F: PrimeField>(
    all_or_none: &Boolean<F>,
    fill_amount_s: &FpVar<F>,
    amount_s: &FpVar<F>,
) -> Result<Boolean<F>, SynthesisError> {
    let (underfilled, _) = crate::math::leq::leq(fill_amount_s, amount_s)?;
    let blocked = all_or_none.and(&underfilled)?;
    Ok(blocked.not())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_relations::r1cs::ConstraintSystem;

    fn field(cs: ark_relations::r1cs::ConstraintSystemRef<F>, v: u64) -> FpVar<F> {
        FpVar::new_witness(cs, || Ok(F::from(v))).unwrap()
    }

    #[test]
    fn all_or_none_partial_fill_is_invalid() {
        let cs = ConstraintSystem::<F>::new_ref();
        let all_or_none = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let fill_amount_s = field(cs.clone(), 50);
        let amount_s = field(cs.clone(), 100);
        assert!(!check_fills(&all_or_none, &fill_amount_s, &amount_s).unwrap().value().unwrap());
    }

    #[test]
    fn all_or_none_full_fill_is_valid() {
        let cs = ConstraintSystem::<F>::new_ref();
        let all_or_none = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let fill_amount_s = field(cs.clone(), 100);
        let amount_s = field(cs.clone(), 100);
        assert!(check_fills(&all_or_none, &fill_amount_s, &amount_s).unwrap().value().unwrap());
    }

    #[test]
    fn partial_fill_valid_when_not_all_or_none() {
        let cs = ConstraintSystem::<F>::new_ref();
        let all_or_none = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();
        let fill_amount_s = field(cs.clone(), 50);
        let amount_s = field(cs.clone(), 100);
        assert!(check_fills(&all_or_none, &fill_amount_s, &amount_s).unwrap().value().unwrap());
    }

    #[test]
    fn leaf_hash_is_deterministic_and_order_sensitive() {
        let a = TradeHistoryState::<F> { filled: F::from(10u64), cancelled: false };
        let b = TradeHistoryState::<F> { filled: F::from(10u64), cancelled: true };
        assert_eq!(a.leaf(), a.leaf());
        assert_ne!(a.leaf(), b.leaf());
    }
}
