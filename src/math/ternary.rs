//! `TernaryGadget`: `cond ? true_value : false_value`, for both field and
//! boolean payloads. `examples/original_source/circuit/Gadgets/MathGadgets.h`
//! builds this from a bitness constraint on `cond` plus a single "weighted
//! sum" constraint; `ark-r1cs-std`'s `CondSelectGadget` already provides the
//! single-constraint field version, so this module is a thin, spec-named
//! wrapper rather than a reimplementation.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

/// `cond ? true_value : false_value` over field elements.
pub fn select<F: PrimeField>(
    cond: &Boolean<F>,
    true_value: &FpVar<F>,
    false_value: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    cond.select(true_value, false_value)
}

/// `cond ? true_value : false_value` over booleans.
pub fn select_bool<F: PrimeField>(
    cond: &Boolean<F>,
    true_value: &Boolean<F>,
    false_value: &Boolean<F>,
) -> Result<Boolean<F>, SynthesisError> {
    cond.select(true_value, false_value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn selects_true_branch() {
        let cs = ConstraintSystem::<F>::new_ref();
        let cond = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let t = FpVar::new_witness(cs.clone(), || Ok(F::from(11u64))).unwrap();
        let f = FpVar::new_witness(cs.clone(), || Ok(F::from(22u64))).unwrap();
        assert_eq!(select(&cond, &t, &f).unwrap().value().unwrap(), F::from(11u64));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn selects_false_branch() {
        let cs = ConstraintSystem::<F>::new_ref();
        let cond = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();
        let t = FpVar::new_witness(cs.clone(), || Ok(F::from(11u64))).unwrap();
        let f = FpVar::new_witness(cs.clone(), || Ok(F::from(22u64))).unwrap();
        assert_eq!(select(&cond, &t, &f).unwrap().value().unwrap(), F::from(22u64));
    }
}
