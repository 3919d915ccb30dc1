//! `RingSettlementGadget`: matches two orders, computes their fills, splits
//! fees three ways per side, and threads 13 account-leaf updates (plus the
//! operator's own 14th) through the accounts tree. Grounded on
//! `examples/original_source/circuit/Circuits/TradeCircuit.h`'s
//! `RingSettlementGadget`.
//!
//! The 14 account touches, in the original's order, are: `accountS_A`,
//! `accountB_A`, `accountF_A`, `walletF_A`, `minerF_A`, `burnF_A`
//! (A's sell/buy/fee/wallet-fee/matching-fee/burn legs), the same six for
//! B, `accountS_M` (the matcher's margin credit) and `updateAccount_M` (the
//! ring's own miner account paying the operator's flat `fee`). Every one of
//! these 14 deltas is bound to the value this ring actually computed (the
//! fill amounts, the fee split, or the operator fee), not merely left to the
//! prover's choice of a before/after pair that happens to authenticate.
//!
//! The operator's own fee-collection account (SPEC_FULL.md §3's
//! [`crate::state::account::OperatorAccountState`], REDESIGN FLAG ii) is
//! touched once per *block* rather than once per ring — see
//! `circuits::trade::TradeCircuit` — since the original's own
//! `updateAccount_O` is likewise a single block-level call made after the
//! whole ring chain, crediting the running sum of every ring's `fee`
//! (`getOperatorBalance()` threaded ring-to-ring in the original) rather
//! than being touched per ring itself.

use ark_ed_on_bls12_377::constraints::EdwardsVar;
use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use crate::config;
use crate::domain::{
    fee_payment::fee_payment,
    max_fill::{max_fill_amounts, MaxFillAmountsInput},
    order::OrderVar,
    order_matching::{enforce_tokens_cross, order_matching, OrderMatchingInput},
};
use crate::math::signature::{self, SignatureVar};
use crate::ops::AccountTouch;
use crate::primitives::bits::DualVariable;
use crate::primitives::ConstraintF as F;
use crate::state::{burn_rate, trade_history};

/// Per-side inputs not already carried on [`OrderVar`]: the trade-history
/// leaf this order's fill/cancel state lives at, its burn-rate lookup, and
/// the 6 account touches this side contributes.
pub struct RingSide {
    pub order: OrderVar,
    pub maker_pk: EdwardsVar,
    /// The wallet dApp's own key, distinct from the trader's `maker_pk`
    /// (data model §3: each order carries owner/wallet/minerF/minerS keys).
    /// Co-signs the ring message alongside the miner (spec.md §4.4 step 8).
    pub wallet_pk: EdwardsVar,
    pub filled_before: FpVar<F>,
    /// Whether this order's trading-history leaf was already cancelled
    /// before this ring; carried through unchanged into the leaf update
    /// (a ring settlement never flips this bit, only `CancelGadget` does).
    pub cancelled_before: Boolean<F>,
    pub trade_history_address_bits: Vec<Boolean<F>>,
    pub trade_history_proof: crate::primitives::merkle::MerkleProofVar<F>,
    pub trade_history_root_before: FpVar<F>,
    pub burn_rate: FpVar<F>,
    pub burn_rate_token_bits: Vec<Boolean<F>>,
    pub burn_rate_proof: crate::primitives::merkle::MerkleProofVar<F>,
    pub burn_rate_root: FpVar<F>,
    pub touches: [AccountTouch<F>; 6],
}

pub struct RingSettlementInput {
    pub side_a: RingSide,
    pub side_b: RingSide,
    /// The matcher's own margin credit (`accountS_M` in the original).
    pub miner_touch: AccountTouch<F>,
    /// The ring's own miner account, debited by `fee` (`updateAccount_M` in
    /// the original). The running sum of `fee` across a block's rings is
    /// what the operator's own fee-collection leaf is credited with once
    /// per *block* — see `circuits::trade::TradeCircuit`.
    pub miner_fee_touch: AccountTouch<F>,
    /// The operator-paid fee this ring settles with, in the operator's own
    /// fee-collection token (spec.md §4.4 step 4, table row 10).
    pub fee: FpVar<F>,
    pub miner_pk: EdwardsVar,
    pub generator: EdwardsVar,
    pub sig_a: SignatureVar,
    pub sig_b: SignatureVar,
    pub sig_miner: SignatureVar,
    pub sig_wallet_a: SignatureVar,
    pub sig_wallet_b: SignatureVar,
    pub nonce: FpVar<F>,
    /// Block timestamp; each order's validity window is checked against it
    /// (spec.md §8 "Expired order" scenario) and folded into its fill
    /// validity the same way an all-or-none shortfall is.
    pub timestamp: FpVar<F>,
}

pub struct RingSettlementOutput {
    pub accounts_root: FpVar<F>,
    pub trade_history_root_a: FpVar<F>,
    pub trade_history_root_b: FpVar<F>,
    /// The matched fill amounts, exposed so the block circuit can append
    /// them to the public-data accumulator (spec.md §4.4 step 9).
    pub fill_s_a: FpVar<F>,
    pub fill_f_a: FpVar<F>,
    pub fill_s_b: FpVar<F>,
    pub fill_f_b: FpVar<F>,
    /// Passed back through so the block circuit can accumulate it into the
    /// operator's fee-collection credit (spec.md §4.5 point 4).
    pub fee: FpVar<F>,
}

pub fn ring_settlement(
    input: RingSettlementInput,
    accounts_root_before: &FpVar<F>,
) -> Result<RingSettlementOutput, SynthesisError> {
    let RingSettlementInput {
        side_a,
        side_b,
        miner_touch,
        miner_fee_touch,
        fee,
        miner_pk,
        generator,
        sig_a,
        sig_b,
        sig_miner,
        sig_wallet_a,
        sig_wallet_b,
        nonce,
        timestamp,
    } = input;

    enforce_tokens_cross(
        &side_a.order.token_s,
        &side_a.order.token_b,
        &side_b.order.token_s,
        &side_b.order.token_b,
    )?;

    side_a
        .order
        .enforce_signed_by(generator.clone(), side_a.maker_pk.clone(), &sig_a)?;
    side_b
        .order
        .enforce_signed_by(generator.clone(), side_b.maker_pk.clone(), &sig_b)?;

    // the ring message covers both orders' hashes, both sides' waive
    // percentages, both fee recipients and the block nonce (TradeCircuit.h's
    // `ringMessage`), collapsed here to each order's signed message plus the
    // per-side fee metadata. All three parties (miner, walletA, walletB)
    // co-sign this exact same message (spec.md §4.4 step 8 / data model §3).
    let mut ring_message = side_a.order.signed_message();
    ring_message.extend(side_b.order.signed_message());
    ring_message.push(side_a.order.waive_fee_percentage.packed.clone());
    ring_message.push(side_b.order.waive_fee_percentage.packed.clone());
    ring_message.push(side_a.order.miner_f.packed.clone());
    ring_message.push(side_b.order.miner_f.packed.clone());
    ring_message.push(side_a.order.miner_s.packed.clone());
    ring_message.push(nonce.clone());
    signature::enforce_valid(generator.clone(), miner_pk, &ring_message, &sig_miner)?;
    signature::enforce_valid(generator.clone(), side_a.wallet_pk.clone(), &ring_message, &sig_wallet_a)?;
    signature::enforce_valid(generator, side_b.wallet_pk.clone(), &ring_message, &sig_wallet_b)?;

    burn_rate::check_burn_rate(
        &side_a.burn_rate,
        &side_a.burn_rate_token_bits,
        &side_a.burn_rate_proof,
        &side_a.burn_rate_root,
    )?;
    burn_rate::check_burn_rate(
        &side_b.burn_rate,
        &side_b.burn_rate_token_bits,
        &side_b.burn_rate_proof,
        &side_b.burn_rate_root,
    )?;

    let balance_s_a = side_a.touches[0]
        .balance_leg
        .as_ref()
        .expect("accountS_A touch must carry its sell-side balance leg")
        .before
        .balance
        .clone();
    let balance_f_a = side_a.touches[2]
        .balance_leg
        .as_ref()
        .expect("accountF_A touch must carry its fee-side balance leg")
        .before
        .balance
        .clone();
    let fill_a = max_fill_amounts(&MaxFillAmountsInput {
        amount_s: &side_a.order.amount_s.packed,
        amount_b: &side_a.order.amount_b.packed,
        amount_f: &side_a.order.amount_f.packed,
        token_s: &side_a.order.token_s,
        token_b: &side_a.order.token_b,
        token_f: &side_a.order.token_f.packed,
        filled_before: &side_a.filled_before,
        cancelled: &side_a.cancelled_before,
        balance_s: &balance_s_a,
        balance_f: &balance_f_a,
    })?;

    let balance_s_b = side_b.touches[0]
        .balance_leg
        .as_ref()
        .expect("accountS_B touch must carry its sell-side balance leg")
        .before
        .balance
        .clone();
    let balance_f_b = side_b.touches[2]
        .balance_leg
        .as_ref()
        .expect("accountF_B touch must carry its fee-side balance leg")
        .before
        .balance
        .clone();
    let fill_b = max_fill_amounts(&MaxFillAmountsInput {
        amount_s: &side_b.order.amount_s.packed,
        amount_b: &side_b.order.amount_b.packed,
        amount_f: &side_b.order.amount_f.packed,
        token_s: &side_b.order.token_s,
        token_b: &side_b.order.token_b,
        token_f: &side_b.order.token_f.packed,
        filled_before: &side_b.filled_before,
        cancelled: &side_b.cancelled_before,
        balance_s: &balance_s_b,
        balance_f: &balance_f_b,
    })?;

    // CheckFills (spec.md §4.3 "OrderMatching") runs on the post-pivot,
    // ternary-selected fill amounts, so it's computed inside `order_matching`
    // itself rather than from `fill_a`/`fill_b`'s pre-pivot `MaxFillAmounts`
    // output; only the validity-window check (independent of the pivot) is
    // folded in here.
    let valid_window_a = side_a.order.in_validity_window(&timestamp)?;
    let valid_window_b = side_b.order.in_validity_window(&timestamp)?;

    let matched = order_matching(&OrderMatchingInput {
        max_fill_a: &fill_a,
        max_fill_b: &fill_b,
        amount_s_a: &side_a.order.amount_s.packed,
        amount_b_a: &side_a.order.amount_b.packed,
        amount_f_a: &side_a.order.amount_f.packed,
        amount_s_b: &side_b.order.amount_s.packed,
        amount_b_b: &side_b.order.amount_b.packed,
        amount_f_b: &side_b.order.amount_f.packed,
        all_or_none_a: &side_a.order.all_or_none,
        all_or_none_b: &side_b.order.all_or_none,
        valid_window_a: &valid_window_a,
        valid_window_b: &valid_window_b,
    })?;
    // Rather than rejecting the whole block on an invalid ring, every
    // matched fill amount is bound into a declared-width output dual
    // variable multiplied through by `valid` first (spec.md §4.4's tie-break
    // note: `matching.amount * valid = fillX.packed`). An invalid ring (bad
    // signature excepted — those still hard-fail above) becomes a no-op
    // that leaves every balance untouched, rather than an unsatisfiable
    // circuit.
    let valid = matched.valid.clone();
    let fill_s_a = bind_output(&matched.fill_s_a, &valid, config::NUM_BITS_AMOUNT)?;
    let fill_b_a = bind_output(&matched.fill_b_a, &valid, config::NUM_BITS_AMOUNT)?;
    let fill_f_a = bind_output(&matched.fill_f_a, &valid, config::NUM_BITS_AMOUNT)?;
    let fill_s_b = bind_output(&matched.fill_s_b, &valid, config::NUM_BITS_AMOUNT)?;
    let fill_b_b = bind_output(&matched.fill_b_b, &valid, config::NUM_BITS_AMOUNT)?;
    let fill_f_b = bind_output(&matched.fill_f_b, &valid, config::NUM_BITS_AMOUNT)?;
    let margin = bind_output(&matched.margin, &valid, config::NUM_BITS_AMOUNT)?;

    let fee_a = fee_payment(
        &fill_f_a.packed,
        &side_a.order.wallet_split_percentage.packed,
        &side_a.order.waive_fee_percentage.packed,
        &side_a.burn_rate,
    )?;
    let fee_b = fee_payment(
        &fill_f_b.packed,
        &side_b.order.wallet_split_percentage.packed,
        &side_b.order.waive_fee_percentage.packed,
        &side_b.burn_rate,
    )?;

    let trade_history_after_a = trade_history::TradeHistoryStateVar {
        filled: &side_a.filled_before + &fill_s_a.packed,
        cancelled: side_a.cancelled_before.clone(),
    };
    let trade_history_before_a = trade_history::TradeHistoryStateVar {
        filled: side_a.filled_before.clone(),
        cancelled: side_a.cancelled_before.clone(),
    };
    let trade_history_root_a = trade_history::update_gadget(
        &trade_history_before_a,
        &trade_history_after_a,
        &side_a.trade_history_address_bits,
        &side_a.trade_history_proof,
        &side_a.trade_history_root_before,
    )?;

    let trade_history_after_b = trade_history::TradeHistoryStateVar {
        filled: &side_b.filled_before + &fill_s_b.packed,
        cancelled: side_b.cancelled_before.clone(),
    };
    let trade_history_before_b = trade_history::TradeHistoryStateVar {
        filled: side_b.filled_before.clone(),
        cancelled: side_b.cancelled_before.clone(),
    };
    let trade_history_root_b = trade_history::update_gadget(
        &trade_history_before_b,
        &trade_history_after_b,
        &side_b.trade_history_address_bits,
        &side_b.trade_history_proof,
        &side_b.trade_history_root_before,
    )?;

    // The sell-side balance leg's declared `trading_history_root` (what
    // `accountS_X`'s balance leaf actually commits to) must be the root this
    // ring's own trade-history update produces, not an independently chosen
    // value.
    side_a.touches[0]
        .balance_leg
        .as_ref()
        .expect("accountS_A touch must carry its sell-side balance leg")
        .after
        .trading_history_root
        .enforce_equal(&trade_history_root_a)?;
    side_b.touches[0]
        .balance_leg
        .as_ref()
        .expect("accountS_B touch must carry its sell-side balance leg")
        .after
        .trading_history_root
        .enforce_equal(&trade_history_root_b)?;

    // Binds every one of the 12 per-side touches' balance delta to the value
    // this ring actually computed, closing the gap an account touch whose
    // delta is merely "some before/after pair that happens to authenticate"
    // would otherwise leave open (spec.md's "under-constrained gadget"
    // warning). Order matches the module doc's 6-tuple per side: sell, buy,
    // fee, wallet-fee, matching-fee, burn.
    enforce_balance_delta(&side_a.touches[0], &fill_s_a.packed, false)?;
    enforce_balance_delta(&side_a.touches[1], &fill_b_a.packed, true)?;
    enforce_balance_delta(&side_a.touches[2], &fill_f_a.packed, false)?;
    enforce_balance_delta(&side_a.touches[3], &fee_a.wallet_fee_to_pay, true)?;
    enforce_balance_delta(&side_a.touches[4], &fee_a.matching_fee_to_pay, true)?;
    enforce_balance_delta(&side_a.touches[5], &fee_a.fee_to_burn, true)?;

    enforce_balance_delta(&side_b.touches[0], &fill_s_b.packed, false)?;
    enforce_balance_delta(&side_b.touches[1], &fill_b_b.packed, true)?;
    enforce_balance_delta(&side_b.touches[2], &fill_f_b.packed, false)?;
    enforce_balance_delta(&side_b.touches[3], &fee_b.wallet_fee_to_pay, true)?;
    enforce_balance_delta(&side_b.touches[4], &fee_b.matching_fee_to_pay, true)?;
    enforce_balance_delta(&side_b.touches[5], &fee_b.fee_to_burn, true)?;

    // The matcher's own margin credit (spec.md §4.4 step 7: `fillS_A -
    // fillB_B`, already gated into `margin`).
    let miner_leg = miner_touch
        .balance_leg
        .as_ref()
        .expect("the matcher's own touch must carry a balance leg");
    let miner_after = &miner_leg.before.balance + &margin.packed;
    crate::primitives::bits::range_check(&miner_after, config::NUM_BITS_AMOUNT)?;
    miner_after.enforce_equal(&miner_leg.after.balance)?;

    // The ring's own miner account pays the operator-chosen `fee` out of its
    // own balance (spec.md §4.4 step 4, table row 10); the block circuit
    // accumulates `fee` across rings and credits the operator's own
    // fee-collection leaf with the running total once, after the chain.
    enforce_balance_delta(&miner_fee_touch, &fee, false)?;

    // spec.md §4.4 step 7: `ForceLeq(filledAfter, amountS)` for both orders.
    crate::math::force_leq::force_leq(&trade_history_after_a.filled, &side_a.order.amount_s.packed)?;
    crate::math::force_leq::force_leq(&trade_history_after_b.filled, &side_b.order.amount_s.packed)?;

    let mut root = accounts_root_before.clone();
    for touch in side_a.touches.into_iter() {
        root = touch.apply(&root)?;
    }
    for touch in side_b.touches.into_iter() {
        root = touch.apply(&root)?;
    }
    root = miner_touch.apply(&root)?;
    root = miner_fee_touch.apply(&root)?;

    Ok(RingSettlementOutput {
        accounts_root: root,
        trade_history_root_a,
        trade_history_root_b,
        fill_s_a: fill_s_a.packed,
        fill_f_a: fill_f_a.packed,
        fill_s_b: fill_s_b.packed,
        fill_f_b: fill_f_b.packed,
        fee,
    })
}

/// Binds a raw matched amount into a declared-width output dual variable,
/// first multiplying through by `valid` (spec.md §4.4's tie-break note:
/// `matching.amount * valid = fillX.packed`), so an invalid ring's fills
/// collapse to zero rather than rejecting the whole block.
fn bind_output(
    raw: &FpVar<F>,
    valid: &Boolean<F>,
    width: usize,
) -> Result<DualVariable<F>, SynthesisError> {
    let valid_field = crate::math::ternary::select(valid, &FpVar::constant(F::one()), &FpVar::constant(F::zero()))?;
    let gated = raw * &valid_field;
    let cs = gated.cs();
    let native = gated.value().ok();
    let dual = DualVariable::new_witness(cs, native, width)?;
    dual.packed.enforce_equal(&gated)?;
    Ok(dual)
}

/// `touch`'s balance leg moves by exactly `delta`, credited if `credit` else
/// debited. Spec.md §4.4 item 4 requires every such transfer to assert
/// `src - amt >= 0` and `dst + amt < 2^96`: a debit leg's non-negativity is
/// enforced directly (`ForceLeq(delta, before.balance)`), and a credit leg's
/// upper bound falls out of range-checking the resulting balance, which also
/// catches a debit's would-be underflow (a negative integer result wraps to
/// a huge field element, far outside `[0, 2^96)`).
fn enforce_balance_delta(
    touch: &AccountTouch<F>,
    delta: &FpVar<F>,
    credit: bool,
) -> Result<(), SynthesisError> {
    let leg = touch
        .balance_leg
        .as_ref()
        .expect("every ring-settlement account touch carries a balance leg");
    let expected = if credit {
        &leg.before.balance + delta
    } else {
        crate::math::force_leq::force_leq(delta, &leg.before.balance)?;
        &leg.before.balance - delta
    };
    crate::primitives::bits::range_check(&expected, config::NUM_BITS_AMOUNT)?;
    expected.enforce_equal(&leg.after.balance)
}
