//! L2: Merkle leaf schemas and the authenticate-old/recompute-new update
//! gadgets built on top of [`crate::primitives::merkle`]. Grounded on
//! `examples/original_source/circuit/Gadgets/{AccountGadgets.h,
//! TradingHistoryGadgets.h}`.

pub mod trade_history;
pub mod account;
pub mod balance;
pub mod burn_rate;
