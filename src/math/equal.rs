//! `EqualGadget`: `A == B` expressed as `¬(A<B) ∧ (A<=B)`, matching
//! `MathGadgets.h`'s definition in terms of its own `Leq`/`lt` outputs rather
//! than a fresh equality check — kept here for fidelity even though
//! `ark-r1cs-std`'s `EqGadget::is_eq` would do the same job in one call.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use super::leq::leq;

pub fn equal<F: PrimeField>(a: &FpVar<F>, b: &FpVar<F>) -> Result<Boolean<F>, SynthesisError> {
    let (lt, leq) = leq(a, b)?;
    leq.and(&lt.not())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn equal_values_are_equal() {
        let cs = ConstraintSystem::<F>::new_ref();
        let a = FpVar::new_witness(cs.clone(), || Ok(F::from(42u64))).unwrap();
        let b = FpVar::new_witness(cs.clone(), || Ok(F::from(42u64))).unwrap();
        assert!(equal(&a, &b).unwrap().value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn distinct_values_are_not_equal() {
        let cs = ConstraintSystem::<F>::new_ref();
        let a = FpVar::new_witness(cs.clone(), || Ok(F::from(42u64))).unwrap();
        let b = FpVar::new_witness(cs.clone(), || Ok(F::from(43u64))).unwrap();
        assert!(!equal(&a, &b).unwrap().value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }
}
