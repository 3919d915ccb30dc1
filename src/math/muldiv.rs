//! `MulDivGadget`: computes `D = floor(A*B/C)` with remainder `rest`,
//! constrained by `A*B == C*D + rest` and `rest < C` (or, when `C == 0`,
//! `D = 0` and `rest = 0`) — `examples/original_source/circuit/Gadgets/
//! MathGadgets.h`'s `MulDivGadget`. The product `A*B` is allowed to exceed
//! the field's amount-range bound, which is why the original tags this
//! gadget as "be very careful" about overflow: every caller here only ever
//! multiplies two `NUM_BITS_AMOUNT`-wide quantities, so `A*B` fits inside
//! the scalar field with room to spare.
//!
//! The division itself is witness-only arithmetic (it has no closed-form
//! algebraic expression); the original computes it on `BigInt`, which this
//! module mirrors with `num-bigint`.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;
use num_bigint::BigUint;

use super::{equal, leq, ternary};

fn to_biguint<F: PrimeField>(x: F) -> BigUint {
    BigUint::from_bytes_le(&x.into_bigint().to_bytes_le())
}

fn from_biguint<F: PrimeField>(x: &BigUint) -> F {
    F::from_le_bytes_mod_order(&x.to_bytes_le())
}

/// Native `(D, rest)` for `A*B = C*D + rest`, `C == 0 => D = rest = 0`.
pub fn muldiv<F: PrimeField>(a: F, b: F, c: F) -> (F, F) {
    let product = to_biguint(a) * to_biguint(b);
    if c.is_zero() {
        return (F::zero(), F::zero());
    }
    let divisor = to_biguint(c);
    let d = &product / &divisor;
    let rest = &product - &d * &divisor;
    (from_biguint(&d), from_biguint(&rest))
}

/// R1CS gadget: allocates `D` and `rest` as witnesses from the out-of-circuit
/// `muldiv` computation, then enforces `A*B == C*D + rest` and
/// `(rest < C) || (C == 0)`.
pub fn muldiv_gadget<F: PrimeField>(
    a: &FpVar<F>,
    b: &FpVar<F>,
    c: &FpVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    let cs = a.cs().or(b.cs()).or(c.cs());
    let witness = match (a.value(), b.value(), c.value()) {
        (Ok(av), Ok(bv), Ok(cv)) => Some(muldiv(av, bv, cv)),
        _ => None,
    };
    let d = FpVar::new_witness(cs.clone(), || {
        witness.map(|(d, _)| d).ok_or(SynthesisError::AssignmentMissing)
    })?;
    let rest = FpVar::new_witness(cs, || {
        witness.map(|(_, rest)| rest).ok_or(SynthesisError::AssignmentMissing)
    })?;

    let product = a * b;
    let reconstructed = c * &d + &rest;
    product.enforce_equal(&reconstructed)?;

    let (rest_lt_c, _) = leq::leq(&rest, c)?;
    let c_is_zero = equal::equal(c, &FpVar::constant(F::zero()))?;
    let ok = rest_lt_c.or(&c_is_zero)?;
    ok.enforce_equal(&Boolean::TRUE)?;

    // When C == 0 the constraints above don't pin D to zero on their own
    // (0*D + rest == 0 is satisfied by any D as long as rest == 0); force it
    // explicitly, matching the original's witness-side special case.
    let zero = FpVar::constant(F::zero());
    let d_if_zero_c = ternary::select(&c_is_zero, &zero, &d)?;
    d_if_zero_c.enforce_equal(&d)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn native_division() {
        let (d, rest) = muldiv(F::from(10u64), F::from(3u64), F::from(4u64));
        assert_eq!(d, F::from(7u64)); // floor(30/4) = 7
        assert_eq!(rest, F::from(2u64));
    }

    #[test]
    fn zero_divisor_yields_zero() {
        let (d, rest) = muldiv(F::from(10u64), F::from(3u64), F::from(0u64));
        assert_eq!(d, F::zero());
        assert_eq!(rest, F::zero());
    }

    #[test]
    fn gadget_matches_native() {
        let cs = ConstraintSystem::<F>::new_ref();
        let a = FpVar::new_witness(cs.clone(), || Ok(F::from(10u64))).unwrap();
        let b = FpVar::new_witness(cs.clone(), || Ok(F::from(3u64))).unwrap();
        let c = FpVar::new_witness(cs.clone(), || Ok(F::from(4u64))).unwrap();
        let d = muldiv_gadget(&a, &b, &c).unwrap();
        assert_eq!(d.value().unwrap(), F::from(7u64));
        assert!(cs.is_satisfied().unwrap());
    }
}
