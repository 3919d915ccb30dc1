//! Compile-time circuit parameters shared by every gadget and circuit.
//!
//! Mirrors `examples/original_source/circuit/Utils/Constants.h`: Loopring v3
//! fixed its Merkle tree depths and field bit-widths as named constants rather
//! than runtime configuration, since a tree depth baked into the constraint
//! system can never change without a new proving key.

/// Depth of the accounts sparse Merkle tree.
pub const TREE_DEPTH_ACCOUNTS: usize = 24;
/// Depth of each account's balances sparse Merkle tree.
pub const TREE_DEPTH_BALANCES: usize = 12;
/// Depth of each balance's trading-history sparse Merkle tree.
pub const TREE_DEPTH_TRADING_HISTORY: usize = 16;
/// Depth of the token burn-rate sparse Merkle tree.
pub const TREE_DEPTH_TOKENS: usize = 16;

/// Bit width of amount-class fields (`amountS`, `amountB`, `amountF`, `fillX`, `margin`, ...).
/// Chosen so two amounts can be added without wrapping the scalar field (spec.md §7.4).
pub const NUM_BITS_AMOUNT: usize = 96;
pub const NUM_BITS_WALLETID: usize = 16;
pub const NUM_BITS_ORDERID: usize = 4;
pub const NUM_BITS_TIMESTAMP: usize = 32;
pub const NUM_BITS_FEE_PERCENTAGE: usize = 8;
pub const NUM_BITS_WAIVE_PERCENTAGE: usize = 7;
pub const NUM_BITS_BURN_RATE: usize = 16;
/// Bit width of a ring's operator-paid matching fee (`fee` in the block
/// JSON), narrower than `NUM_BITS_AMOUNT` since it is denominated in the
/// operator's own fee-collection token, not an order's traded amount.
pub const NUM_BITS_MATCHING_FEE: usize = 16;
/// Bit width used to expose a public key coordinate in public data (spec.md
/// §6): wide enough for the embedded curve's base field with room to spare,
/// matching the original's 256-bit `dual_variable_gadget` allocation.
pub const NUM_BITS_PUBKEY: usize = 256;

/// Number of `RingSettlement` gadgets chained in a trade block, and analogous
/// per-operation counts for the other block types. Supplied per-block by the
/// JSON input's `numElements` field (spec.md §6); this constant is only the
/// default used by `circuit_setup()` when building a circuit for key generation.
pub const DEFAULT_RING_SETTLEMENTS_PER_BLOCK: usize = 2;
pub const DEFAULT_DEPOSITS_PER_BLOCK: usize = 4;
pub const DEFAULT_WITHDRAWALS_PER_BLOCK: usize = 4;
pub const DEFAULT_CANCELS_PER_BLOCK: usize = 4;

/// The four block types carried in the JSON input's `blockType` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum BlockType {
    Trade = 0,
    Deposit = 1,
    Withdraw = 2,
    Cancel = 3,
}

impl TryFrom<u32> for BlockType {
    type Error = crate::error::BlockError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(BlockType::Trade),
            1 => Ok(BlockType::Deposit),
            2 => Ok(BlockType::Withdraw),
            3 => Ok(BlockType::Cancel),
            other => Err(crate::error::BlockError::ShapeMismatch(format!(
                "blockType must be 0..=3, got {other}"
            ))),
        }
    }
}
