//! `MaxFillAmountsGadget`: the spendability cascade that turns an order's
//! declared amounts, its trading-history fill/cancel state, and the maker's
//! actual token balances into the amount that can really be filled this
//! ring. Grounded on
//! `examples/original_source/circuit/Gadgets/MatchingGadgets.h`'s
//! `MaxFillAmountsGadget`, preserving its five-branch precedence exactly.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::math::{equal, leq, min, muldiv, ternary};

pub struct MaxFillAmountsInput<'a, F: PrimeField> {
    pub amount_s: &'a FpVar<F>,
    pub amount_b: &'a FpVar<F>,
    pub amount_f: &'a FpVar<F>,
    pub token_s: &'a FpVar<F>,
    pub token_b: &'a FpVar<F>,
    pub token_f: &'a FpVar<F>,
    pub filled_before: &'a FpVar<F>,
    pub cancelled: &'a Boolean<F>,
    pub balance_s: &'a FpVar<F>,
    pub balance_f: &'a FpVar<F>,
}

pub struct MaxFillAmounts<F: PrimeField> {
    pub fill_amount_s: FpVar<F>,
    pub fill_amount_b: FpVar<F>,
}

pub fn max_fill_amounts<F: PrimeField>(
    input: &MaxFillAmountsInput<F>,
) -> Result<MaxFillAmounts<F>, SynthesisError> {
    let one = FpVar::constant(F::one());
    let cancelled_field = ternary::select(input.cancelled, &one, &FpVar::constant(F::zero()))?;
    let not_cancelled = &one - &cancelled_field;

    let remaining_before_cancelled = input.amount_s - input.filled_before;
    let remaining_s = &remaining_before_cancelled * &not_cancelled;

    let fill_amount_s_1 = min::min(input.balance_s, &remaining_s)?;
    let fill_amount_f = muldiv::muldiv_gadget(input.amount_f, &fill_amount_s_1, input.amount_s)?;

    // tokenS == tokenF && balanceS < fillAmountS_1 + fillAmountF
    let token_s_eq_f = equal::equal(input.token_s, input.token_f)?;
    let sum_s_f = &fill_amount_s_1 + &fill_amount_f;
    let (balance_s_lt_sum, _) = leq::leq(input.balance_s, &sum_s_f)?;
    let eq_case_active = token_s_eq_f.and(&balance_s_lt_sum)?;
    let denom_eq = input.amount_s + input.amount_f;
    let fill_amount_s_eq = muldiv::muldiv_gadget(input.balance_s, input.amount_s, &denom_eq)?;
    let fill_amount_s_2 = ternary::select(&eq_case_active, &fill_amount_s_eq, &fill_amount_s_1)?;

    // tokenS != tokenF && balanceF < fillAmountF
    let token_s_ne_f = token_s_eq_f.not();
    let (balance_f_lt_fill_f, _) = leq::leq(input.balance_f, &fill_amount_f)?;
    let neq_case_active = token_s_ne_f.and(&balance_f_lt_fill_f)?;
    let fill_amount_s_neq = muldiv::muldiv_gadget(input.balance_f, input.amount_s, input.amount_f)?;
    let fill_amount_s_3 = ternary::select(&neq_case_active, &fill_amount_s_neq, &fill_amount_s_2)?;

    // tokenB == tokenF && amountF <= amountB: highest precedence, fall back to fillAmountS_1
    let token_b_eq_f = equal::equal(input.token_b, input.token_f)?;
    let (_, amount_f_leq_b) = leq::leq(input.amount_f, input.amount_b)?;
    let high_precedence = token_b_eq_f.and(&amount_f_leq_b)?;
    let fill_amount_s = ternary::select(&high_precedence, &fill_amount_s_1, &fill_amount_s_3)?;

    let fill_amount_b = muldiv::muldiv_gadget(&fill_amount_s, input.amount_b, input.amount_s)?;

    Ok(MaxFillAmounts {
        fill_amount_s,
        fill_amount_b,
    })
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
    fn fully_spendable_order_fills_completely() {
        let cs = ConstraintSystem::<F>::new_ref();
        let amount_s = field(cs.clone(), 100);
        let amount_b = field(cs.clone(), 100);
        let amount_f = field(cs.clone(), 0);
        let token_s = field(cs.clone(), 1);
        let token_b = field(cs.clone(), 2);
        let token_f = field(cs.clone(), 2);
        let filled_before = field(cs.clone(), 0);
        let cancelled = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();
        let balance_s = field(cs.clone(), 100);
        let balance_f = field(cs.clone(), 0);

        let out = max_fill_amounts(&MaxFillAmountsInput {
            amount_s: &amount_s,
            amount_b: &amount_b,
            amount_f: &amount_f,
            token_s: &token_s,
            token_b: &token_b,
            token_f: &token_f,
            filled_before: &filled_before,
            cancelled: &cancelled,
            balance_s: &balance_s,
            balance_f: &balance_f,
        })
        .unwrap();

        assert!(cs.is_satisfied().unwrap());
        assert_eq!(out.fill_amount_s.value().unwrap(), F::from(100u64));
        assert_eq!(out.fill_amount_b.value().unwrap(), F::from(100u64));
    }

    #[test]
    fn cancelled_order_has_zero_spendability() {
        let cs = ConstraintSystem::<F>::new_ref();
        let amount_s = field(cs.clone(), 100);
        let amount_b = field(cs.clone(), 100);
        let amount_f = field(cs.clone(), 0);
        let token_s = field(cs.clone(), 1);
        let token_b = field(cs.clone(), 2);
        let token_f = field(cs.clone(), 2);
        let filled_before = field(cs.clone(), 0);
        let cancelled = Boolean::new_witness(cs.clone(), || Ok(true)).unwrap();
        let balance_s = field(cs.clone(), 100);
        let balance_f = field(cs.clone(), 0);

        let out = max_fill_amounts(&MaxFillAmountsInput {
            amount_s: &amount_s,
            amount_b: &amount_b,
            amount_f: &amount_f,
            token_s: &token_s,
            token_b: &token_b,
            token_f: &token_f,
            filled_before: &filled_before,
            cancelled: &cancelled,
            balance_s: &balance_s,
            balance_f: &balance_f,
        })
        .unwrap();

        assert!(cs.is_satisfied().unwrap());
        assert_eq!(out.fill_amount_s.value().unwrap(), F::zero());
        assert_eq!(out.fill_amount_b.value().unwrap(), F::zero());
    }

    #[test]
    fn fee_in_sold_token_shrinks_fill_to_cover_fee() {
        // tokenS == tokenF, balanceS insufficient to cover fillS_1 + fee:
        // balanceS = 55, amountS = 100, amountF = 10 => fillS = 55*100/110 = 50.
        let cs = ConstraintSystem::<F>::new_ref();
        let amount_s = field(cs.clone(), 100);
        let amount_b = field(cs.clone(), 100);
        let amount_f = field(cs.clone(), 10);
        let token_s = field(cs.clone(), 1);
        let token_b = field(cs.clone(), 2);
        let token_f = field(cs.clone(), 1);
        let filled_before = field(cs.clone(), 0);
        let cancelled = Boolean::new_witness(cs.clone(), || Ok(false)).unwrap();
        let balance_s = field(cs.clone(), 55);
        let balance_f = field(cs.clone(), 0);

        let out = max_fill_amounts(&MaxFillAmountsInput {
            amount_s: &amount_s,
            amount_b: &amount_b,
            amount_f: &amount_f,
            token_s: &token_s,
            token_b: &token_b,
            token_f: &token_f,
            filled_before: &filled_before,
            cancelled: &cancelled,
            balance_s: &balance_s,
            balance_f: &balance_f,
        })
        .unwrap();

        assert!(cs.is_satisfied().unwrap());
        assert_eq!(out.fill_amount_s.value().unwrap(), F::from(50u64));
    }
}
