//! The JSON parse layer: turns a block input file (spec.md §6) into
//! strongly-typed native records. Grounded on
//! `examples/original_source/circuit/Data.h`'s `from_json` free functions,
//! which likewise parse every field into a concrete `FieldT` rather than
//! keeping a dynamic JSON tree alive past this boundary (SPEC_FULL.md §9,
//! "dynamic typing of JSON").
//!
//! A missing or mistyped field surfaces as a single
//! [`crate::error::BlockError::Json`] (via `serde_json`'s own error, which
//! already names the offending key) rather than a silent default — nothing
//! downstream of this module ever sees a `serde_json::Value`.

use ark_ed_on_bls12_377::EdwardsAffine;
use num_bigint::BigUint;
use serde::Deserialize;

use crate::config::BlockType;
use crate::error::BlockError;
use crate::primitives::eddsa::{PublicKey, Signature};
use crate::primitives::merkle::MerkleProof;
use crate::primitives::ConstraintF as F;
use ark_ff::PrimeField;

/// A field element that arrives as a decimal string (spec.md §6: "every
/// variable-length integer arrives as a decimal/hex string").
#[derive(Debug, Clone, Copy)]
pub struct DecField(pub F);

/// A field element that arrives as a `0x`-prefixed hex string (Merkle roots,
/// siblings and curve-point coordinates).
#[derive(Debug, Clone, Copy)]
pub struct HexField(pub F);

fn parse_dec(s: &str) -> Result<F, BlockError> {
    let digits: BigUint = s
        .parse()
        .map_err(|_| BlockError::Encoding(format!("not a decimal integer: {s}")))?;
    Ok(F::from_le_bytes_mod_order(&digits.to_bytes_le()))
}

fn parse_hex(s: &str) -> Result<F, BlockError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped)
        .map_err(|e| BlockError::Encoding(format!("not a hex string: {s} ({e})")))?;
    let mut le = bytes;
    le.reverse();
    Ok(F::from_le_bytes_mod_order(&le))
}

impl<'de> Deserialize<'de> for DecField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_dec(&s).map(DecField).map_err(serde::de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for HexField {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_hex(&s).map(HexField).map_err(serde::de::Error::custom)
    }
}

/// `#[serde(default)]` needs a zero, the empty-leaf sentinel every first-time
/// deposit's before-state uses (spec.md §4.4 Deposit: "before-leaf (empty
/// publicKey, empty token, 0 balance)").
impl Default for DecField {
    fn default() -> Self {
        DecField(F::zero())
    }
}

impl Default for HexField {
    fn default() -> Self {
        HexField(F::zero())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SignatureJson {
    #[serde(rename = "sigRx")]
    pub sig_rx: HexField,
    #[serde(rename = "sigRy")]
    pub sig_ry: HexField,
    #[serde(rename = "sigS")]
    pub sig_s: HexField,
}

impl SignatureJson {
    pub fn into_signature(self) -> Result<Signature, BlockError> {
        let r = EdwardsAffine::new_unchecked(self.sig_rx.0, self.sig_ry.0);
        Ok(Signature { r, s: self.sig_s.0 })
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PublicKeyJson {
    #[serde(rename = "publicKeyX")]
    pub x: HexField,
    #[serde(rename = "publicKeyY")]
    pub y: HexField,
}

impl PublicKeyJson {
    pub fn into_point(self) -> PublicKey {
        EdwardsAffine::new_unchecked(self.x.0, self.y.0)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MerkleProofJson {
    pub siblings: Vec<HexField>,
}

impl MerkleProofJson {
    pub fn into_proof(self) -> MerkleProof<F> {
        MerkleProof {
            siblings: self.siblings.into_iter().map(|h| h.0).collect(),
        }
    }
}

/// One `order` object (spec.md §3's `Order` data model).
#[derive(Debug, Clone, Deserialize)]
pub struct OrderJson {
    #[serde(rename = "walletID")]
    pub wallet_id: u32,
    #[serde(rename = "orderID")]
    pub order_id: u32,
    #[serde(rename = "accountS")]
    pub account_s: u64,
    #[serde(rename = "accountB")]
    pub account_b: u64,
    #[serde(rename = "accountF")]
    pub account_f: u64,
    #[serde(rename = "tokenS")]
    pub token_s: u32,
    #[serde(rename = "tokenB")]
    pub token_b: u32,
    #[serde(rename = "tokenF")]
    pub token_f: u32,
    #[serde(rename = "amountS")]
    pub amount_s: DecField,
    #[serde(rename = "amountB")]
    pub amount_b: DecField,
    #[serde(rename = "amountF")]
    pub amount_f: DecField,
    #[serde(rename = "walletF")]
    pub wallet_f: u64,
    #[serde(rename = "minerF")]
    pub miner_f: u64,
    #[serde(rename = "minerS")]
    pub miner_s: u64,
    #[serde(rename = "walletSplitPercentage")]
    pub wallet_split_percentage: u32,
    #[serde(rename = "waiveFeePercentage")]
    pub waive_fee_percentage: u32,
    #[serde(rename = "validSince")]
    pub valid_since: u32,
    #[serde(rename = "validUntil")]
    pub valid_until: u32,
    #[serde(rename = "allOrNone")]
    pub all_or_none: bool,
    #[serde(rename = "ownerPublicKey")]
    pub owner_public_key: PublicKeyJson,
    #[serde(rename = "walletPublicKey")]
    pub wallet_public_key: PublicKeyJson,
    pub signature: SignatureJson,

    // Runtime-only fields (spec.md §3).
    #[serde(rename = "filledBefore")]
    pub filled_before: DecField,
    pub cancelled: bool,
    #[serde(rename = "balanceS")]
    pub balance_s: DecField,
    #[serde(rename = "balanceB")]
    pub balance_b: DecField,
    #[serde(rename = "balanceF")]
    pub balance_f: DecField,

    #[serde(rename = "tradeHistoryAddress")]
    pub trade_history_address: u64,
    #[serde(rename = "tradeHistoryProof")]
    pub trade_history_proof: MerkleProofJson,
    #[serde(rename = "tradeHistoryRootBefore")]
    pub trade_history_root_before: HexField,

    #[serde(rename = "burnRate")]
    pub burn_rate: DecField,
    #[serde(rename = "burnRateProof")]
    pub burn_rate_proof: MerkleProofJson,

    /// The six account-leaf touches this side contributes to the ring
    /// (SPEC_FULL.md §3): sell, buy, fee, wallet-fee, matching-fee, burn.
    #[serde(rename = "accountUpdates")]
    pub account_updates: [AccountUpdateJson; 6],
}

/// One `UpdateAccountGadget` call's before/after state, flattened with its
/// nested balance-leaf touch (SPEC_FULL.md §3's 13/14-touch supplement).
#[derive(Debug, Clone, Deserialize)]
pub struct AccountUpdateJson {
    pub address: u64,
    pub proof: MerkleProofJson,
    #[serde(rename = "publicKeyX")]
    pub public_key_x: HexField,
    #[serde(rename = "publicKeyY")]
    pub public_key_y: HexField,
    #[serde(rename = "walletID")]
    pub wallet_id: u32,
    pub nonce: DecField,
    #[serde(rename = "tokenID")]
    pub token_id: u32,
    #[serde(rename = "balanceProof")]
    pub balance_proof: MerkleProofJson,
    #[serde(rename = "balanceBefore")]
    pub balance_before: DecField,
    #[serde(rename = "balanceAfter")]
    pub balance_after: DecField,
    #[serde(rename = "tradingHistoryRootBefore")]
    pub trading_history_root_before: HexField,
    #[serde(rename = "tradingHistoryRootAfter")]
    pub trading_history_root_after: HexField,
    /// The account leaf's `balancesRoot` field before/after this touch —
    /// the root of the per-account balances tree that authenticates (and,
    /// after the nested balance-leaf update, recomputes to) the touched
    /// `(tokenID, balance)` leaf.
    #[serde(rename = "balancesRootBefore")]
    pub balances_root_before: HexField,
    #[serde(rename = "balancesRootAfter")]
    pub balances_root_after: HexField,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RingSettlementJson {
    #[serde(rename = "orderA")]
    pub order_a: OrderJson,
    #[serde(rename = "orderB")]
    pub order_b: OrderJson,
    #[serde(rename = "minerPublicKey")]
    pub miner_public_key: PublicKeyJson,
    #[serde(rename = "minerAccountID")]
    pub miner_account_id: u64,
    pub fee: DecField,
    pub nonce: DecField,
    #[serde(rename = "sigMiner")]
    pub sig_miner: SignatureJson,
    #[serde(rename = "sigWalletA")]
    pub sig_wallet_a: SignatureJson,
    #[serde(rename = "sigWalletB")]
    pub sig_wallet_b: SignatureJson,
    #[serde(rename = "minerTouch")]
    pub miner_touch: AccountUpdateJson,
    /// The ring's own miner account, debited by `fee` (distinct from
    /// `minerTouch`, which credits the matcher's margin at `orderA.minerS`);
    /// the running sum of these across a block's rings is what the
    /// trade circuit's final operator `UpdateAccount` credits.
    #[serde(rename = "minerFeeTouch")]
    pub miner_fee_touch: AccountUpdateJson,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DepositJson {
    pub address: u64,
    pub proof: MerkleProofJson,
    /// The account leaf's before-state: empty (all zero) for a first-time
    /// deposit that creates the account, or the existing key/wallet/nonce
    /// for a top-up of an already-funded account. Unlike the after-state,
    /// the original leaves this unconstrained (no dual-variable range
    /// check) since it is only ever read, never exposed as public data
    /// (`DepositCircuit.h`'s `publicKeyX_before`/`walletID_before`).
    #[serde(rename = "publicKeyXBefore", default)]
    pub public_key_x_before: HexField,
    #[serde(rename = "publicKeyYBefore", default)]
    pub public_key_y_before: HexField,
    #[serde(rename = "walletIDBefore", default)]
    pub wallet_id_before: u32,
    #[serde(rename = "nonceBefore", default)]
    pub nonce_before: DecField,
    #[serde(rename = "publicKeyX")]
    pub public_key_x: HexField,
    #[serde(rename = "publicKeyY")]
    pub public_key_y: HexField,
    #[serde(rename = "walletID")]
    pub wallet_id: u32,
    pub nonce: DecField,
    #[serde(rename = "tokenID")]
    pub token_id: u32,
    #[serde(rename = "tokenProof")]
    pub token_proof: MerkleProofJson,
    #[serde(rename = "balanceBefore")]
    pub balance_before: DecField,
    /// The balance leaf's nested trading-history root; a deposit never
    /// touches it, so the same value carries into the after-leaf.
    #[serde(rename = "tradingHistoryRoot")]
    pub trading_history_root: HexField,
    #[serde(rename = "balancesRootBefore")]
    pub balances_root_before: HexField,
    #[serde(rename = "balancesRootAfter")]
    pub balances_root_after: HexField,
    pub amount: DecField,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawalJson {
    pub address: u64,
    pub proof: MerkleProofJson,
    #[serde(rename = "publicKey")]
    pub public_key: PublicKeyJson,
    #[serde(rename = "walletID")]
    pub wallet_id: u32,
    pub nonce: DecField,
    #[serde(rename = "tokenID")]
    pub token_id: u32,
    #[serde(rename = "tokenProof")]
    pub token_proof: MerkleProofJson,
    #[serde(rename = "balanceBefore")]
    pub balance_before: DecField,
    #[serde(rename = "tradingHistoryRoot")]
    pub trading_history_root: HexField,
    #[serde(rename = "balancesRootBefore")]
    pub balances_root_before: HexField,
    #[serde(rename = "balancesRootAfter")]
    pub balances_root_after: HexField,
    pub amount: DecField,
    pub signature: SignatureJson,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CancelJson {
    pub address: u64,
    pub proof: MerkleProofJson,
    #[serde(rename = "publicKey")]
    pub public_key: PublicKeyJson,
    #[serde(rename = "walletID")]
    pub wallet_id: u32,
    pub nonce: DecField,
    #[serde(rename = "balancesRoot")]
    pub balances_root: HexField,
    #[serde(rename = "orderID")]
    pub order_id: u32,
    #[serde(rename = "tradeHistoryAddress")]
    pub trade_history_address: u64,
    #[serde(rename = "tradeHistoryProof")]
    pub trade_history_proof: MerkleProofJson,
    #[serde(rename = "tradeHistoryRootBefore")]
    pub trade_history_root_before: HexField,
    #[serde(rename = "filled")]
    pub filled: DecField,
    /// Whether this order was already cancelled before this cancellation
    /// (spec.md §8 "cancel idempotent failure": cancelling a
    /// once-cancelled order still passes `cancelledAfter = 1`, but the
    /// trading-history leaf — and hence the root — doesn't change).
    /// Defaults to `false` for block producers that only ever cancel once.
    #[serde(rename = "cancelledBefore", default)]
    pub cancelled_before: bool,
    pub signature: SignatureJson,
}

/// The five block-universal keys plus the type-specific payload
/// (spec.md §6).
#[derive(Debug, Clone, Deserialize)]
pub struct BlockJson {
    #[serde(rename = "blockType")]
    pub block_type: u32,
    #[serde(rename = "numElements")]
    pub num_elements: u32,
    #[serde(rename = "stateID")]
    pub state_id: u32,
    #[serde(rename = "merkleRootBefore")]
    pub merkle_root_before: HexField,
    #[serde(rename = "merkleRootAfter")]
    pub merkle_root_after: HexField,

    // Trade-only.
    #[serde(rename = "burnRateMerkleRoot", default)]
    pub burn_rate_merkle_root: Option<HexField>,
    #[serde(default)]
    pub timestamp: Option<u32>,
    #[serde(rename = "operatorAccountID", default)]
    pub operator_account_id: Option<u64>,
    #[serde(rename = "operatorPublicKeyX", default)]
    pub operator_public_key_x: Option<HexField>,
    #[serde(rename = "operatorPublicKeyY", default)]
    pub operator_public_key_y: Option<HexField>,
    #[serde(rename = "operatorNonceBefore", default)]
    pub operator_nonce_before: Option<DecField>,
    #[serde(rename = "operatorNonceAfter", default)]
    pub operator_nonce_after: Option<DecField>,
    #[serde(rename = "operatorBalancesRootBefore", default)]
    pub operator_balances_root_before: Option<HexField>,
    #[serde(rename = "operatorBalancesRootAfter", default)]
    pub operator_balances_root_after: Option<HexField>,
    #[serde(rename = "operatorProof", default)]
    pub operator_proof: Option<MerkleProofJson>,
    /// The operator's own fee-collection balance leaf (SPEC_FULL.md §3's
    /// dedicated `OperatorAccountState` schema): the token the block's
    /// ring fees accumulate into, its balances-tree proof, and its
    /// pre-block balance. The leaf's `after.balance` is computed in-circuit
    /// as `before.balance + sum(ring.fee)`, not taken as a separate input.
    #[serde(rename = "operatorTokenID", default)]
    pub operator_token_id: Option<u32>,
    #[serde(rename = "operatorBalanceProof", default)]
    pub operator_balance_proof: Option<MerkleProofJson>,
    #[serde(rename = "operatorBalanceBefore", default)]
    pub operator_balance_before: Option<DecField>,
    #[serde(rename = "operatorTradingHistoryRoot", default)]
    pub operator_trading_history_root: Option<HexField>,
    #[serde(rename = "ringSettlements", default)]
    pub ring_settlements: Vec<RingSettlementJson>,

    // Deposit/Withdraw-only.
    #[serde(default)]
    pub deposits: Vec<DepositJson>,
    #[serde(default)]
    pub withdrawals: Vec<WithdrawalJson>,

    // Cancel-only.
    #[serde(rename = "tradingHistoryMerkleRootBefore", default)]
    pub trading_history_merkle_root_before: Option<HexField>,
    #[serde(rename = "tradingHistoryMerkleRootAfter", default)]
    pub trading_history_merkle_root_after: Option<HexField>,
    #[serde(default)]
    pub cancels: Vec<CancelJson>,
}

impl BlockJson {
    pub fn parse(raw: &str) -> Result<Self, BlockError> {
        serde_json::from_str(raw).map_err(BlockError::Json)
    }

    /// `blockType` as the typed enum, and a shape check that the
    /// type-specific array's length matches `numElements` (spec.md §7,
    /// error kind 2: "shape mismatch").
    pub fn block_type_checked(&self) -> Result<BlockType, BlockError> {
        let block_type = BlockType::try_from(self.block_type)?;
        let n = self.num_elements as usize;
        let actual = match block_type {
            BlockType::Trade => self.ring_settlements.len(),
            BlockType::Deposit => self.deposits.len(),
            BlockType::Withdraw => self.withdrawals.len(),
            BlockType::Cancel => self.cancels.len(),
        };
        if actual != n {
            return Err(BlockError::ShapeMismatch(format!(
                "numElements = {n} but found {actual} elements for block type {block_type:?}"
            )));
        }
        Ok(block_type)
    }
}
