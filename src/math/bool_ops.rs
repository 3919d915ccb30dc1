//! `AndGadget`/`OrGadget`/`NotGadget`: single-constraint boolean connectives.
//! `ark-r1cs-std`'s `Boolean<F>` already allocates with a bitness constraint
//! and implements `&`/`|`/`!` at one constraint each, so these are named
//! pass-throughs kept for call-site readability against
//! `examples/original_source/circuit/Gadgets/MathGadgets.h`'s `AndGadget`/
//! `OrGadget`/`NotGadget`.

use ark_ff::PrimeField;
use ark_r1cs_std::prelude::*;
use ark_relations::r1cs::SynthesisError;

pub fn and<F: PrimeField>(a: &Boolean<F>, b: &Boolean<F>) -> Result<Boolean<F>, SynthesisError> {
    a.and(b)
}

pub fn or<F: PrimeField>(a: &Boolean<F>, b: &Boolean<F>) -> Result<Boolean<F>, SynthesisError> {
    a.or(b)
}

pub fn not<F: PrimeField>(a: &Boolean<F>) -> Boolean<F> {
    a.not()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn truth_table() {
        let cs = ConstraintSystem::<F>::new_ref();
        let t = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let f = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();
        assert!(and(&t, &t).unwrap().value().unwrap());
        assert!(!and(&t, &f).unwrap().value().unwrap());
        assert!(or(&f, &t).unwrap().value().unwrap());
        assert!(!or(&f, &f).unwrap().value().unwrap());
        assert!(!not(&t).value().unwrap());
        assert!(not(&f).value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }
}
