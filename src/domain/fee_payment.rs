//! `FeePaymentCalculator`: splits a fill's fee between the wallet, the
//! matching engine, and a burn sink, honoring the wallet's split percentage
//! and the order's fee-waiving percentage. Grounded on
//! `examples/original_source/circuit/Gadgets/MatchingGadgets.h`'s
//! `FeePaymentCalculator`.

use ark_ff::PrimeField;
use ark_r1cs_std::fields::fp::FpVar;
use ark_relations::r1cs::SynthesisError;

use crate::math::muldiv::muldiv_gadget;

pub struct FeePayment<F: PrimeField> {
    pub wallet_fee_to_pay: FpVar<F>,
    pub matching_fee_to_pay: FpVar<F>,
    pub fee_to_burn: FpVar<F>,
}

/// `fee` is the order's declared `amountF`-denominated fee; `split` is the
/// wallet's split percentage (0-100); `waive` is the order's waive-fee
/// percentage (0-100); `burn_rate` is the token's burn rate (parts per 1000).
pub fn fee_payment<F: PrimeField>(
    fee: &FpVar<F>,
    wallet_split_percentage: &FpVar<F>,
    waive_fee_percentage: &FpVar<F>,
    burn_rate: &FpVar<F>,
) -> Result<FeePayment<F>, SynthesisError> {
    let hundred = FpVar::constant(F::from(100u64));
    let thousand = FpVar::constant(F::from(1000u64));

    let wallet_fee = muldiv_gadget(fee, wallet_split_percentage, &hundred)?;
    let wallet_fee_to_burn = muldiv_gadget(&wallet_fee, burn_rate, &thousand)?;
    let wallet_fee_to_pay = &wallet_fee - &wallet_fee_to_burn;

    let matching_fee = fee - &wallet_fee;
    let matching_fee_after_waiving = muldiv_gadget(&matching_fee, waive_fee_percentage, &hundred)?;
    let matching_fee_to_burn = muldiv_gadget(&matching_fee_after_waiving, burn_rate, &thousand)?;
    let matching_fee_to_pay = &matching_fee_after_waiving - &matching_fee_to_burn;

    let fee_to_burn = &wallet_fee_to_burn + &matching_fee_to_burn;

    Ok(FeePayment {
        wallet_fee_to_pay,
        matching_fee_to_pay,
        fee_to_burn,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_r1cs_std::alloc::AllocVar;
    use ark_r1cs_std::R1CSVar;
    use ark_relations::r1cs::ConstraintSystem;

    #[test]
    fn splits_fee_wallet_matcher_and_burn() {
        // fee=100, wallet gets 50% (50), burn rate 10% (5 burned from each side),
        // no waiving (waive=100% i.e. matcher keeps all of its share).
        let cs = ConstraintSystem::<F>::new_ref();
        let fee = FpVar::new_witness(cs.clone(), || Ok(F::from(100u64))).unwrap();
        let split = FpVar::new_witness(cs.clone(), || Ok(F::from(50u64))).unwrap();
        let waive = FpVar::new_witness(cs.clone(), || Ok(F::from(100u64))).unwrap();
        let burn_rate = FpVar::new_witness(cs.clone(), || Ok(F::from(100u64))).unwrap();

        let out = fee_payment(&fee, &split, &waive, &burn_rate).unwrap();
        assert!(cs.is_satisfied().unwrap());

        // walletFee = 50, walletBurn = 5 => walletFeeToPay = 45
        assert_eq!(out.wallet_fee_to_pay.value().unwrap(), F::from(45u64));
        // matchingFee = 50, matchingAfterWaive = 50, matchingBurn = 5 => 45
        assert_eq!(out.matching_fee_to_pay.value().unwrap(), F::from(45u64));
        // burned = 5 + 5 = 10
        assert_eq!(out.fee_to_burn.value().unwrap(), F::from(10u64));

        let total = &out.wallet_fee_to_pay + &out.matching_fee_to_pay + &out.fee_to_burn;
        assert_eq!(total.value().unwrap(), F::from(100u64));
    }

    #[test]
    fn full_waive_zeroes_matcher_share() {
        let cs = ConstraintSystem::<F>::new_ref();
        let fee = FpVar::new_witness(cs.clone(), || Ok(F::from(100u64))).unwrap();
        let split = FpVar::new_witness(cs.clone(), || Ok(F::from(50u64))).unwrap();
        let waive = FpVar::new_witness(cs.clone(), || Ok(F::from(0u64))).unwrap();
        let burn_rate = FpVar::new_witness(cs.clone(), || Ok(F::from(0u64))).unwrap();

        let out = fee_payment(&fee, &split, &waive, &burn_rate).unwrap();
        assert!(cs.is_satisfied().unwrap());
        assert_eq!(out.wallet_fee_to_pay.value().unwrap(), F::from(50u64));
        assert_eq!(out.matching_fee_to_pay.value().unwrap(), F::zero());
        assert_eq!(out.fee_to_burn.value().unwrap(), F::zero());
    }
}
