//! `MinGadget`: `min(A, B) = Ternary(A < B, A, B)`, matching `MathGadgets.h`
//! exactly — built directly on [`super::leq`] and [`super::ternary`].

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::SynthesisError;

use super::{leq::leq, ternary};

pub fn min<F: PrimeField>(a: &FpVar<F>, b: &FpVar<F>) -> Result<FpVar<F>, SynthesisError> {
    let (lt, _leq) = leq(a, b)?;
    ternary::select(&lt, a, b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn picks_smaller_operand_either_order() {
        let cs = ConstraintSystem::<F>::new_ref();
        let a = FpVar::new_witness(cs.clone(), || Ok(F::from(9u64))).unwrap();
        let b = FpVar::new_witness(cs.clone(), || Ok(F::from(4u64))).unwrap();
        assert_eq!(min(&a, &b).unwrap().value().unwrap(), F::from(4u64));
        assert_eq!(min(&b, &a).unwrap().value().unwrap(), F::from(4u64));
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn equal_operands_return_that_value() {
        let cs = ConstraintSystem::<F>::new_ref();
        let a = FpVar::new_witness(cs.clone(), || Ok(F::from(6u64))).unwrap();
        let b = FpVar::new_witness(cs.clone(), || Ok(F::from(6u64))).unwrap();
        assert_eq!(min(&a, &b).unwrap().value().unwrap(), F::from(6u64));
    }
}
