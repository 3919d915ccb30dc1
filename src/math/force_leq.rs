//! `ForceLeqGadget`: asserts `A <= B` rather than returning a witness-data
//! boolean, used where the original enforces `filled <= amount` unconditionally
//! (`filledLeqA`/`filledLeqB` in `TradeCircuit.h`) instead of branching on it.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use super::leq::leq;

pub fn force_leq<F: PrimeField>(a: &FpVar<F>, b: &FpVar<F>) -> Result<(), SynthesisError> {
    let (_lt, leq) = leq(a, b)?;
    leq.enforce_equal(&Boolean::TRUE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn satisfied_when_a_leq_b() {
        let cs = ConstraintSystem::<F>::new_ref();
        let a = FpVar::new_witness(cs.clone(), || Ok(F::from(3u64))).unwrap();
        let b = FpVar::new_witness(cs.clone(), || Ok(F::from(5u64))).unwrap();
        force_leq(&a, &b).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn unsatisfied_when_a_greater_than_b() {
        let cs = ConstraintSystem::<F>::new_ref();
        let a = FpVar::new_witness(cs.clone(), || Ok(F::from(9u64))).unwrap();
        let b = FpVar::new_witness(cs.clone(), || Ok(F::from(5u64))).unwrap();
        force_leq(&a, &b).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}
