//! `DualVariable`: a field element allocated together with its fixed-width
//! bit decomposition, the two held consistent by a single packing
//! constraint. Every `dual_variable_gadget<FieldT>` field in
//! `examples/original_source/circuit/Gadgets/OrderGadgets.h` (walletID,
//! orderID, accountS/B/F, amounts, validSince/Until, ...) is one of these;
//! the packed form feeds arithmetic gadgets, the bit form feeds the public-
//! data accumulator and the signature message.

use ark_ff::{BigInteger, PrimeField};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{Namespace, SynthesisError};

#[derive(Clone)]
pub struct DualVariable<F: PrimeField> {
    pub packed: FpVar<F>,
    pub bits: Vec<Boolean<F>>,
}

impl<F: PrimeField> DualVariable<F> {
    /// Allocates a witness of `width` bits (LSB first) and the packed value
    /// they represent, constraining `packed == sum(bits[i] * 2^i)`.
    pub fn new_witness(
        cs: impl Into<Namespace<F>>,
        value: Option<F>,
        width: usize,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let bit_values: Option<Vec<bool>> = value.map(|v| {
            let repr = v.into_bigint();
            (0..width).map(|i| repr.get_bit(i)).collect()
        });
        let mut bits = Vec::with_capacity(width);
        for i in 0..width {
            let bit_value = bit_values.as_ref().map(|bv| bv[i]);
            bits.push(Boolean::new_witness(cs.clone(), || {
                bit_value.ok_or(SynthesisError::AssignmentMissing)
            })?);
        }
        let packed = Boolean::le_bits_to_fp_var(&bits)?;
        Ok(Self { packed, bits })
    }

    pub fn width(&self) -> usize {
        self.bits.len()
    }
}

/// Asserts `value` fits in `width` bits by re-deriving its bit decomposition
/// and constraining the two packings equal. Grounded on
/// `examples/original_source/circuit/Gadgets/AccountGadgets.h`'s
/// `sub-add` transfer gadgets, each range-checking the post-transfer balance
/// into `NUM_BITS_AMOUNT` bits so a debit/credit pair can neither wrap the
/// field nor silently go negative (spec.md §4.4 item 4, §8 "No negative
/// balances").
pub fn range_check<F: PrimeField>(value: &FpVar<F>, width: usize) -> Result<(), SynthesisError> {
    let cs = value.cs();
    let dual = DualVariable::new_witness(cs, value.value().ok(), width)?;
    dual.packed.enforce_equal(value)
}

#[cfg(test)]
mod range_check_tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn in_range_value_satisfies() {
        let cs = ConstraintSystem::<F>::new_ref();
        let v = FpVar::new_witness(cs.clone(), || Ok(F::from(250u64))).unwrap();
        range_check(&v, 8).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn out_of_range_value_fails() {
        let cs = ConstraintSystem::<F>::new_ref();
        let v = FpVar::new_witness(cs.clone(), || Ok(F::from(300u64))).unwrap();
        range_check(&v, 8).unwrap();
        assert!(!cs.is_satisfied().unwrap());
    }
}

/// Allocates the LSB-first address bits used to index a sparse Merkle tree
/// of the given `depth`, the same role `address.bits` plays at every
/// `UpdateAccountGadget`/`UpdateBalanceGadget`/`UpdateTradeHistoryGadget`
/// call site in `original_source`.
pub fn address_bits_witness<F: PrimeField>(
    cs: impl Into<Namespace<F>>,
    address: Option<u64>,
    depth: usize,
) -> Result<Vec<Boolean<F>>, SynthesisError> {
    let ns = cs.into();
    let cs = ns.cs();
    let mut bits = Vec::with_capacity(depth);
    for i in 0..depth {
        let bit_value = address.map(|a| (a >> i) & 1 == 1);
        bits.push(Boolean::new_witness(cs.clone(), || {
            bit_value.ok_or(SynthesisError::AssignmentMissing)
        })?);
    }
    Ok(bits)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn packed_value_round_trips_through_bits() {
        let cs = ConstraintSystem::<F>::new_ref();
        let dual = DualVariable::new_witness(cs.clone(), Some(F::from(0b1011u64)), 8).unwrap();
        assert_eq!(dual.width(), 8);
        assert_eq!(dual.packed.value().unwrap(), F::from(0b1011u64));
        assert!(!dual.bits[0].value().unwrap());
        assert!(dual.bits[1].value().unwrap());
        assert!(dual.bits[3].value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    #[test]
    fn address_bits_are_little_endian() {
        let cs = ConstraintSystem::<F>::new_ref();
        let bits = address_bits_witness::<F>(cs.clone(), Some(0b0101u64), 4).unwrap();
        let values: Vec<bool> = bits.iter().map(|b| b.value().unwrap()).collect();
        assert_eq!(values, vec![true, false, true, false]);
    }
}
