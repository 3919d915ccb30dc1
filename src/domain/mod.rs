//! L3: order-book domain gadgets — the order itself, fee splitting, the
//! spendability cascade, and order-to-order matching. Grounded on
//! `examples/original_source/circuit/Gadgets/{OrderGadgets.h,
//! MatchingGadgets.h}`.

pub mod order;
pub mod max_fill;
pub mod order_matching;
pub mod fee_payment;
