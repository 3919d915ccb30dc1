//! `OrderMatchingGadget`: checks that two orders' tokens cross, pivots on
//! whichever side is the limiting one, derives the settlement `margin` and
//! each side's prorated fee, and enforces no price crossing. Grounded on
//! `examples/original_source/circuit/Gadgets/MatchingGadgets.h`'s
//! `OrderMatchingGadget`.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::math::{leq, muldiv, ternary};
use crate::state::trade_history::check_fills;

use super::max_fill::MaxFillAmounts;

pub struct OrderMatchingInput<'a, F: PrimeField> {
    pub max_fill_a: &'a MaxFillAmounts<F>,
    pub max_fill_b: &'a MaxFillAmounts<F>,
    pub amount_s_a: &'a FpVar<F>,
    pub amount_b_a: &'a FpVar<F>,
    pub amount_f_a: &'a FpVar<F>,
    pub amount_s_b: &'a FpVar<F>,
    pub amount_b_b: &'a FpVar<F>,
    pub amount_f_b: &'a FpVar<F>,
    pub all_or_none_a: &'a Boolean<F>,
    pub all_or_none_b: &'a Boolean<F>,
    /// Whether each side's order is within its own validity window
    /// (spec.md §4.3 "Order gadget" `valid`), independent of the pivot.
    pub valid_window_a: &'a Boolean<F>,
    pub valid_window_b: &'a Boolean<F>,
}

pub struct MatchedFill<F: PrimeField> {
    pub fill_s_a: FpVar<F>,
    pub fill_b_a: FpVar<F>,
    pub fill_s_b: FpVar<F>,
    pub fill_b_b: FpVar<F>,
    pub fill_f_a: FpVar<F>,
    pub fill_f_b: FpVar<F>,
    pub margin: FpVar<F>,
    pub valid: Boolean<F>,
}

/// Implements the pivot: whichever side's `MaxFillAmounts` output is the
/// tighter constraint becomes the limiting side, and the other side's fill
/// is derived from it by cross-multiplying against its own declared price
/// ratio — exactly the branch spec.md §4.3 "OrderMatching" describes.
pub fn order_matching<F: PrimeField>(
    input: &OrderMatchingInput<F>,
) -> Result<MatchedFill<F>, SynthesisError> {
    let max_s_a = &input.max_fill_a.fill_amount_s;
    let max_b_a = &input.max_fill_a.fill_amount_b;
    let max_s_b = &input.max_fill_b.fill_amount_s;
    let max_b_b = &input.max_fill_b.fill_amount_b;

    // A is limiting iff maxBA < maxSB.
    let (a_limiting, _) = leq::leq(max_b_a, max_s_b)?;

    // A-limiting branch.
    let fill_s_a_if_a_limits = max_s_a.clone();
    let fill_b_a_if_a_limits = max_b_a.clone();
    let fill_b_b_if_a_limits = max_s_a.clone();
    let fill_s_b_if_a_limits = muldiv::muldiv_gadget(max_s_a, input.amount_s_b, input.amount_b_b)?;

    // B-limiting branch.
    let fill_s_b_if_b_limits = max_s_b.clone();
    let fill_b_b_if_b_limits = max_b_b.clone();
    let fill_b_a_if_b_limits = max_s_b.clone();
    let fill_s_a_if_b_limits = muldiv::muldiv_gadget(max_s_b, input.amount_s_a, input.amount_b_a)?;

    let fill_s_a = ternary::select(&a_limiting, &fill_s_a_if_a_limits, &fill_s_a_if_b_limits)?;
    let fill_b_a = ternary::select(&a_limiting, &fill_b_a_if_a_limits, &fill_b_a_if_b_limits)?;
    let fill_s_b = ternary::select(&a_limiting, &fill_s_b_if_a_limits, &fill_s_b_if_b_limits)?;
    let fill_b_b = ternary::select(&a_limiting, &fill_b_b_if_a_limits, &fill_b_b_if_b_limits)?;

    let margin = &fill_s_a - &fill_b_b;

    let fill_f_a = muldiv::muldiv_gadget(input.amount_f_a, &fill_s_a, input.amount_s_a)?;
    let fill_f_b = muldiv::muldiv_gadget(input.amount_f_b, &fill_s_b, input.amount_s_b)?;

    // No price crossing: fillS_A must NOT be strictly less than fillB_B.
    let (price_crosses, _) = leq::leq(&fill_s_a, &fill_b_b)?;

    // CheckFills operates on the post-pivot, ternary-selected fill amounts
    // (`fillAmountS_A.result()`/`fillAmountS_B.result()` in the original),
    // not the pre-pivot `MaxFillAmounts` output for that side alone —
    // otherwise a fully-spendable all-or-none order on the non-limiting side
    // would pass its own check while still being partially filled by the
    // pivot.
    let fills_valid_a = check_fills(input.all_or_none_a, &fill_s_a, input.amount_s_a)?;
    let fills_valid_b = check_fills(input.all_or_none_b, &fill_s_b, input.amount_s_b)?;

    let valid = price_crosses
        .not()
        .and(&fills_valid_a)?
        .and(&fills_valid_b)?
        .and(input.valid_window_a)?
        .and(input.valid_window_b)?;

    Ok(MatchedFill {
        fill_s_a,
        fill_b_a,
        fill_s_b,
        fill_b_b,
        fill_f_a,
        fill_f_b,
        margin,
        valid,
    })
}

/// `orderA.tokenS == orderB.tokenB && orderA.tokenB == orderB.tokenS`.
pub fn enforce_tokens_cross<F: PrimeField>(
    order_a_token_s: &FpVar<F>,
    order_a_token_b: &FpVar<F>,
    order_b_token_s: &FpVar<F>,
    order_b_token_b: &FpVar<F>,
) -> Result<(), SynthesisError> {
    order_a_token_s.enforce_equal(order_b_token_b)?;
    order_a_token_b.enforce_equal(order_b_token_s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_relations::r1cs::{ConstraintSystem, ConstraintSystemRef};

    fn constant(cs: ConstraintSystemRef<F>, v: u64) -> FpVar<F> {
        FpVar::new_witness(cs, || Ok(F::from(v))).unwrap()
    }

    fn flag(cs: ConstraintSystemRef<F>, v: bool) -> Boolean<F> {
        Boolean::new_witness(cs, || Ok(v)).unwrap()
    }

    #[test]
    fn happy_match_no_fee() {
        let cs = ConstraintSystem::<F>::new_ref();
        let max_fill_a = MaxFillAmounts {
            fill_amount_s: constant(cs.clone(), 100),
            fill_amount_b: constant(cs.clone(), 100),
        };
        let max_fill_b = MaxFillAmounts {
            fill_amount_s: constant(cs.clone(), 100),
            fill_amount_b: constant(cs.clone(), 100),
        };
        let amount_s_a = constant(cs.clone(), 100);
        let amount_b_a = constant(cs.clone(), 100);
        let amount_f_a = constant(cs.clone(), 0);
        let amount_s_b = constant(cs.clone(), 100);
        let amount_b_b = constant(cs.clone(), 100);
        let amount_f_b = constant(cs.clone(), 0);
        let no = flag(cs.clone(), false);
        let yes = flag(cs.clone(), true);

        let matched = order_matching(&OrderMatchingInput {
            max_fill_a: &max_fill_a,
            max_fill_b: &max_fill_b,
            amount_s_a: &amount_s_a,
            amount_b_a: &amount_b_a,
            amount_f_a: &amount_f_a,
            amount_s_b: &amount_s_b,
            amount_b_b: &amount_b_b,
            amount_f_b: &amount_f_b,
            all_or_none_a: &no,
            all_or_none_b: &no,
            valid_window_a: &yes,
            valid_window_b: &yes,
        })
        .unwrap();

        assert_eq!(matched.fill_s_a.value().unwrap(), F::from(100u64));
        assert_eq!(matched.fill_b_b.value().unwrap(), F::from(100u64));
        assert_eq!(matched.margin.value().unwrap(), F::from(0u64));
        assert!(matched.valid.value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    /// `MatchingGadgets.h:373-375,384`: when `maxBA < maxSB`, A is the
    /// limiting side — `fillAmountS_A`/`fillAmountB_A` copy A's own
    /// `MaxFillAmounts` output directly, `fillAmountB_B` copies A's sell
    /// amount directly (B receives everything A sells), and `fillAmountS_B`
    /// is the MulDiv-*derived* cross-rate. Because both of A's fill legs and
    /// B's received leg all trace back to the same `maxSA`, the margin this
    /// branch produces is always zero: there is no leftover for the matcher
    /// to capture when the limiting side's own sell amount is what both
    /// parties settle against.
    #[test]
    fn a_limiting_pivot_has_zero_margin() {
        let cs = ConstraintSystem::<F>::new_ref();
        let max_fill_a = MaxFillAmounts {
            fill_amount_s: constant(cs.clone(), 100),
            fill_amount_b: constant(cs.clone(), 80),
        };
        let max_fill_b = MaxFillAmounts {
            fill_amount_s: constant(cs.clone(), 100),
            fill_amount_b: constant(cs.clone(), 70),
        };
        let amount_s_a = constant(cs.clone(), 100);
        let amount_b_a = constant(cs.clone(), 90);
        let amount_f_a = constant(cs.clone(), 0);
        let amount_s_b = constant(cs.clone(), 100);
        let amount_b_b = constant(cs.clone(), 80);
        let amount_f_b = constant(cs.clone(), 0);
        let no = flag(cs.clone(), false);
        let yes = flag(cs.clone(), true);

        let matched = order_matching(&OrderMatchingInput {
            max_fill_a: &max_fill_a,
            max_fill_b: &max_fill_b,
            amount_s_a: &amount_s_a,
            amount_b_a: &amount_b_a,
            amount_f_a: &amount_f_a,
            amount_s_b: &amount_s_b,
            amount_b_b: &amount_b_b,
            amount_f_b: &amount_f_b,
            all_or_none_a: &no,
            all_or_none_b: &no,
            valid_window_a: &yes,
            valid_window_b: &yes,
        })
        .unwrap();

        // maxBA(80) < maxSB(100): A is the limiting side.
        assert_eq!(matched.fill_s_a.value().unwrap(), F::from(100u64));
        assert_eq!(matched.fill_b_a.value().unwrap(), F::from(80u64));
        assert_eq!(matched.fill_b_b.value().unwrap(), F::from(100u64));
        // fillAmountS_B = (maxSA * orderB.amountS) // orderB.amountB = 100*100/80.
        assert_eq!(matched.fill_s_b.value().unwrap(), F::from(125u64));
        assert_eq!(matched.margin.value().unwrap(), F::from(0u64));
        assert!(matched.valid.value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    /// `MatchingGadgets.h:373-375,384`'s `F` branch (`maxBA >= maxSB`, B
    /// limiting): `fillAmountS_B`/`fillAmountB_B` copy B's own
    /// `MaxFillAmounts` output directly, `fillAmountB_A` copies B's sell
    /// amount directly, and `fillAmountS_A` is the derived cross-rate —
    /// the mirror image of the A-limiting branch, reproducing spec.md §8
    /// scenario 2 (`fillS_A=100, fillB_A=90, fillB_B=80, margin=20`).
    #[test]
    fn b_limiting_margin_to_matcher() {
        let cs = ConstraintSystem::<F>::new_ref();
        let max_fill_a = MaxFillAmounts {
            fill_amount_s: constant(cs.clone(), 100),
            fill_amount_b: constant(cs.clone(), 95),
        };
        let max_fill_b = MaxFillAmounts {
            fill_amount_s: constant(cs.clone(), 90),
            fill_amount_b: constant(cs.clone(), 80),
        };
        let amount_s_a = constant(cs.clone(), 100);
        let amount_b_a = constant(cs.clone(), 90);
        let amount_f_a = constant(cs.clone(), 0);
        let amount_s_b = constant(cs.clone(), 100);
        let amount_b_b = constant(cs.clone(), 80);
        let amount_f_b = constant(cs.clone(), 0);
        let no = flag(cs.clone(), false);
        let yes = flag(cs.clone(), true);

        let matched = order_matching(&OrderMatchingInput {
            max_fill_a: &max_fill_a,
            max_fill_b: &max_fill_b,
            amount_s_a: &amount_s_a,
            amount_b_a: &amount_b_a,
            amount_f_a: &amount_f_a,
            amount_s_b: &amount_s_b,
            amount_b_b: &amount_b_b,
            amount_f_b: &amount_f_b,
            all_or_none_a: &no,
            all_or_none_b: &no,
            valid_window_a: &yes,
            valid_window_b: &yes,
        })
        .unwrap();

        // maxBA(95) >= maxSB(90): B is the limiting side.
        assert_eq!(matched.fill_s_a.value().unwrap(), F::from(100u64));
        assert_eq!(matched.fill_b_a.value().unwrap(), F::from(90u64));
        assert_eq!(matched.fill_b_b.value().unwrap(), F::from(80u64));
        assert_eq!(matched.margin.value().unwrap(), F::from(20u64));
        assert!(matched.valid.value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }

    /// spec.md §8 "All-or-none partial → reject": order A is all-or-none and
    /// *could* fully spend on its own (`MaxFillAmounts.fill_amount_s ==
    /// amountS_A`), but the ring's other side is the limiting one, so the
    /// post-pivot `fillS_A` settles below `amountS_A`. `CheckFills` must see
    /// the post-pivot amount, not the pre-pivot one, or this partial fill
    /// would slip through as valid.
    #[test]
    fn all_or_none_rejected_when_opposite_side_limits() {
        let cs = ConstraintSystem::<F>::new_ref();
        let max_fill_a = MaxFillAmounts {
            fill_amount_s: constant(cs.clone(), 100),
            fill_amount_b: constant(cs.clone(), 200),
        };
        let max_fill_b = MaxFillAmounts {
            fill_amount_s: constant(cs.clone(), 50),
            fill_amount_b: constant(cs.clone(), 40),
        };
        let amount_s_a = constant(cs.clone(), 100);
        let amount_b_a = constant(cs.clone(), 90);
        let amount_f_a = constant(cs.clone(), 0);
        let amount_s_b = constant(cs.clone(), 100);
        let amount_b_b = constant(cs.clone(), 80);
        let amount_f_b = constant(cs.clone(), 0);
        let all_or_none_a = flag(cs.clone(), true);
        let no = flag(cs.clone(), false);
        let yes = flag(cs.clone(), true);

        let matched = order_matching(&OrderMatchingInput {
            max_fill_a: &max_fill_a,
            max_fill_b: &max_fill_b,
            amount_s_a: &amount_s_a,
            amount_b_a: &amount_b_a,
            amount_f_a: &amount_f_a,
            amount_s_b: &amount_s_b,
            amount_b_b: &amount_b_b,
            amount_f_b: &amount_f_b,
            all_or_none_a: &all_or_none_a,
            all_or_none_b: &no,
            valid_window_a: &yes,
            valid_window_b: &yes,
        })
        .unwrap();

        // maxBA(200) >= maxSB(50): B limits the ring, so A's full-spendability
        // on its own side doesn't determine its settled fill.
        // fillAmountS_A = (maxSB * orderA.amountS) // orderA.amountB = 50*100/90 = 55.
        assert_eq!(matched.fill_s_a.value().unwrap(), F::from(55u64));
        assert!(matched.fill_s_a.value().unwrap() != amount_s_a.value().unwrap());
        assert!(!matched.valid.value().unwrap());
        assert!(cs.is_satisfied().unwrap());
    }
}
