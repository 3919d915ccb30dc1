//! `DepositCircuit`: the L5 block circuit for deposits. Chains N
//! `DepositGadget`s through the accounts tree; each touches exactly one
//! account's balance leaf, crediting it by a publicly known amount, with no
//! signature required (a deposit is the chain contract crediting a token it
//! already received, not an account-owner-authorized action). Grounded on
//! `examples/original_source/circuit/Circuits/DepositCircuit.h`'s
//! `DepositsCircuitGadget`.

use ark_bw6_761::BW6_761;
use ark_ff::PrimeField;
use ark_groth16::{Groth16, Proof, ProvingKey, VerifyingKey};
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::{ConstraintSynthesizer, ConstraintSystemRef, SynthesisError};
use ark_snark::SNARK;
use rand_chacha::rand_core::SeedableRng;
use std::cell::RefCell;
use std::rc::Rc;

use crate::config;
use crate::error::BlockError;
use crate::input::{BlockJson, DepositJson};
use crate::ops::deposit::{deposit, DepositInput};
use crate::ops::{AccountTouch, BalanceLeg};
use crate::primitives::bits::address_bits_witness;
use crate::primitives::merkle::{MerkleProof, MerkleProofVar};
use crate::primitives::public_data::PublicDataAccumulatorVar;
use crate::primitives::ConstraintF as F;
use crate::state::account::AccountStateVar;
use crate::state::balance::BalanceStateVar;

/// The sole Groth16 public input (spec.md §4.5 point 1, generalized to every
/// block type).
#[allow(non_camel_case_types, unused)]
pub enum GrothPublicInput {
    PUBLIC_DATA_HASH = 0,
}

fn merkle_proof_witness(
    cs: ConstraintSystemRef<F>,
    proof: Option<&crate::input::MerkleProofJson>,
    depth: usize,
) -> Result<MerkleProofVar<F>, SynthesisError> {
    let native = proof.map(|p| MerkleProof {
        siblings: p.siblings.iter().map(|h| h.0).collect(),
    });
    MerkleProofVar::new_witness(cs, &native, depth)
}

/// Builds the account touch for one deposit: the before-state key/wallet/
/// nonce are free variables (empty for a first-time deposit, the account's
/// prior values for a top-up), the after-state ones are the range-checked
/// values this deposit credits, and the addressed balance leaf's `balance`
/// field moves by `amount` (its nested trading-history root is untouched).
fn deposit_touch_witness(
    cs: ConstraintSystemRef<F>,
    rec: Option<&DepositJson>,
) -> Result<(AccountTouch<F>, FpVar<F>), SynthesisError> {
    let address_bits = address_bits_witness(
        cs.clone(),
        rec.map(|r| r.address),
        config::TREE_DEPTH_ACCOUNTS,
    )?;
    let proof = merkle_proof_witness(cs.clone(), rec.map(|r| &r.proof), config::TREE_DEPTH_ACCOUNTS)?;

    // Before-state: free variables, unconstrained and never exposed as public
    // data — empty (all zero) for a first-time deposit that creates the
    // account, or the account's prior key/wallet/nonce for a top-up.
    let pk_x_before = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.public_key_x_before.0).ok_or(SynthesisError::AssignmentMissing)
    })?;
    let pk_y_before = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.public_key_y_before.0).ok_or(SynthesisError::AssignmentMissing)
    })?;
    let wallet_id_before = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| F::from(r.wallet_id_before as u64))
            .ok_or(SynthesisError::AssignmentMissing)
    })?;
    let nonce_before = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.nonce_before.0).ok_or(SynthesisError::AssignmentMissing)
    })?;

    // After-state: the range-checked values this deposit credits, exposed as
    // public data below.
    let pk_x = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.public_key_x.0).ok_or(SynthesisError::AssignmentMissing)
    })?;
    let pk_y = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.public_key_y.0).ok_or(SynthesisError::AssignmentMissing)
    })?;
    let wallet_id = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| F::from(r.wallet_id as u64))
            .ok_or(SynthesisError::AssignmentMissing)
    })?;
    let nonce = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.nonce.0).ok_or(SynthesisError::AssignmentMissing)
    })?;

    let balance_address_bits = address_bits_witness(
        cs.clone(),
        rec.map(|r| r.token_id as u64),
        config::TREE_DEPTH_BALANCES,
    )?;
    let balance_proof = merkle_proof_witness(
        cs.clone(),
        rec.map(|r| &r.token_proof),
        config::TREE_DEPTH_BALANCES,
    )?;
    let balance_before_val = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.balance_before.0).ok_or(SynthesisError::AssignmentMissing)
    })?;
    let amount = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.amount.0).ok_or(SynthesisError::AssignmentMissing)
    })?;
    let history_root = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.trading_history_root.0)
            .ok_or(SynthesisError::AssignmentMissing)
    })?;

    let balance_before = BalanceStateVar {
        balance: balance_before_val.clone(),
        trading_history_root: history_root.clone(),
    };
    let balance_after = BalanceStateVar {
        balance: &balance_before_val + &amount,
        trading_history_root: history_root,
    };

    let balance_leg = BalanceLeg {
        address_bits: balance_address_bits,
        proof: balance_proof,
        before: balance_before,
        after: balance_after,
    };

    let balances_root_before = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.balances_root_before.0)
            .ok_or(SynthesisError::AssignmentMissing)
    })?;
    let balances_root_after = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.balances_root_after.0)
            .ok_or(SynthesisError::AssignmentMissing)
    })?;

    let before = AccountStateVar {
        public_key_x: pk_x_before,
        public_key_y: pk_y_before,
        wallet_id: wallet_id_before,
        nonce: nonce_before,
        balances_root: balances_root_before,
    };
    let after = AccountStateVar {
        public_key_x: pk_x,
        public_key_y: pk_y,
        wallet_id,
        nonce,
        balances_root: balances_root_after,
    };

    Ok((
        AccountTouch {
            address_bits,
            proof,
            before,
            after,
            balance_leg: Some(balance_leg),
        },
        amount,
    ))
}

/// A deposit's public-data tuple (spec.md §6): `address, publicKeyX,
/// publicKeyY, walletID, tokenID, amount`, matching the original's
/// `{address, publicKeyX_after.bits, publicKeyY_after.bits,
/// walletID_after.bits, token_after.bits, amount.bits}`.
fn append_deposit_public_data(
    pd: &mut PublicDataAccumulatorVar<F>,
    touch: &AccountTouch<F>,
    amount: &FpVar<F>,
) -> Result<(), SynthesisError> {
    pd.append(&touch.address_bits);
    pd.append(&touch.after.public_key_x.to_bits_le()?[..config::NUM_BITS_PUBKEY]);
    pd.append(&touch.after.public_key_y.to_bits_le()?[..config::NUM_BITS_PUBKEY]);
    pd.append(&touch.after.wallet_id.to_bits_le()?[..config::NUM_BITS_WALLETID]);
    let leg = touch
        .balance_leg
        .as_ref()
        .expect("a deposit touch always carries a balance leg");
    pd.append(&leg.address_bits);
    pd.append(&amount.to_bits_le()?[..config::NUM_BITS_AMOUNT]);
    Ok(())
}

pub struct DepositCircuit {
    pub state_id: Option<u64>,
    pub merkle_root_before: Option<F>,
    pub merkle_root_after: Option<F>,
    pub deposits: Vec<Option<DepositJson>>,
    pub public_input_out: Rc<RefCell<Option<F>>>,
}

impl DepositCircuit {
    /// Builds a circuit from a parsed block; every deposit is `Some`. Assumes
    /// `block.block_type_checked()` has already validated the shape.
    pub fn from_block(block: BlockJson) -> Result<Self, BlockError> {
        Ok(Self {
            state_id: Some(block.state_id as u64),
            merkle_root_before: Some(block.merkle_root_before.0),
            merkle_root_after: Some(block.merkle_root_after.0),
            deposits: block.deposits.into_iter().map(Some).collect(),
            public_input_out: Rc::new(RefCell::new(None)),
        })
    }

    pub fn dummy(num_deposits: usize) -> Self {
        Self {
            state_id: None,
            merkle_root_before: None,
            merkle_root_after: None,
            deposits: vec![None; num_deposits],
            public_input_out: Rc::new(RefCell::new(None)),
        }
    }

    pub fn circuit_setup(
        num_deposits: usize,
    ) -> Result<(ProvingKey<BW6_761>, VerifyingKey<BW6_761>), BlockError> {
        let circuit = Self::dummy(num_deposits);
        let seed = [0u8; 32];
        let mut rng = rand_chacha::ChaCha8Rng::from_seed(seed);
        let (pk, vk) = Groth16::<BW6_761>::circuit_specific_setup(circuit, &mut rng)?;
        Ok((pk, vk))
    }

    pub fn generate_groth_proof(
        self,
        pk: &ProvingKey<BW6_761>,
    ) -> Result<(Proof<BW6_761>, Vec<F>), BlockError> {
        let output_cell = self.public_input_out.clone();
        let seed = [0u8; 32];
        let mut rng = rand_chacha::ChaCha8Rng::from_seed(seed);
        let proof = Groth16::<BW6_761>::prove(pk, self, &mut rng)?;
        let public_data_hash = output_cell.borrow().clone().ok_or_else(|| {
            BlockError::Groth16("public data hash was not computed during witness generation".into())
        })?;
        Ok((proof, vec![public_data_hash]))
    }

    pub fn verify(
        vk: &VerifyingKey<BW6_761>,
        proof: &Proof<BW6_761>,
        public_inputs: &[F],
    ) -> Result<bool, BlockError> {
        Ok(Groth16::<BW6_761>::verify(vk, public_inputs, proof)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::{DecField, HexField, MerkleProofJson};
    use crate::primitives::merkle;
    use crate::state::account::AccountState;
    use crate::state::balance::BalanceState;
    use ark_relations::r1cs::ConstraintSystem;

    /// Address-17 first-time deposit: an empty before-leaf gets a brand-new
    /// public key, wallet and token balance. Exercises the before/after split
    /// a top-up deposit doesn't: without it, the before- and after-account
    /// leaves would be forced identical and an empty slot could never accept
    /// a new owner.
    #[test]
    fn first_time_deposit_creates_a_new_account() {
        let depth_a = config::TREE_DEPTH_ACCOUNTS;
        let depth_b = config::TREE_DEPTH_BALANCES;

        let balance_zero_path = MerkleProof { siblings: vec![F::zero(); depth_b] };
        let empty_balance = BalanceState::<F> { balance: F::zero(), trading_history_root: F::zero() };
        let balances_root_before = merkle::recompute(empty_balance.leaf(), 5, &balance_zero_path);
        let balance_after = BalanceState::<F> { balance: F::from(1000u64), trading_history_root: F::zero() };
        let balances_root_after = merkle::recompute(balance_after.leaf(), 5, &balance_zero_path);

        let account_before = AccountState::<F> {
            public_key_x: F::zero(),
            public_key_y: F::zero(),
            wallet_id: F::zero(),
            nonce: F::zero(),
            balances_root: balances_root_before,
        };
        let account_after = AccountState::<F> {
            public_key_x: F::from(1u64),
            public_key_y: F::from(2u64),
            wallet_id: F::from(3u64),
            nonce: F::zero(),
            balances_root: balances_root_after,
        };

        let account_proof = MerkleProofJson {
            siblings: vec![HexField(F::zero()); depth_a],
        };
        let balance_proof = MerkleProofJson {
            siblings: vec![HexField(F::zero()); depth_b],
        };

        let rec = DepositJson {
            address: 17,
            proof: account_proof,
            public_key_x_before: HexField(account_before.public_key_x),
            public_key_y_before: HexField(account_before.public_key_y),
            wallet_id_before: 0,
            nonce_before: DecField(account_before.nonce),
            public_key_x: HexField(account_after.public_key_x),
            public_key_y: HexField(account_after.public_key_y),
            wallet_id: 3,
            nonce: DecField(account_after.nonce),
            token_id: 5,
            token_proof: balance_proof,
            balance_before: DecField(empty_balance.balance),
            trading_history_root: HexField(empty_balance.trading_history_root),
            balances_root_before: HexField(balances_root_before),
            balances_root_after: HexField(balances_root_after),
            amount: DecField(F::from(1000u64)),
        };

        let all_zero_path = MerkleProof { siblings: vec![F::zero(); depth_a] };
        let merkle_root_before = merkle::recompute(account_before.leaf(), 17, &all_zero_path);
        let merkle_root_after = merkle::recompute(account_after.leaf(), 17, &all_zero_path);

        let cs = ConstraintSystem::<F>::new_ref();
        let circuit = DepositCircuit {
            state_id: Some(1),
            merkle_root_before: Some(merkle_root_before),
            merkle_root_after: Some(merkle_root_after),
            deposits: vec![Some(rec)],
            public_input_out: Rc::new(RefCell::new(None)),
        };

        circuit.generate_constraints(cs.clone()).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }
}

impl ConstraintSynthesizer<F> for DepositCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let merkle_root_before =
            FpVar::new_witness(cs.clone(), || self.merkle_root_before.ok_or(SynthesisError::AssignmentMissing))?;
        let merkle_root_after =
            FpVar::new_witness(cs.clone(), || self.merkle_root_after.ok_or(SynthesisError::AssignmentMissing))?;

        let mut pd = PublicDataAccumulatorVar::<F>::new();

        let mut root = merkle_root_before;
        for rec in &self.deposits {
            let (touch, amount) = deposit_touch_witness(cs.clone(), rec.as_ref())?;
            append_deposit_public_data(&mut pd, &touch, &amount)?;
            root = deposit(DepositInput { touch, amount }, &root)?;
        }

        root.enforce_equal(&merkle_root_after)?;
        let public_data_hash = pd.into_public_input(cs.clone())?;
        *self.public_input_out.borrow_mut() = public_data_hash.value().ok();
        Ok(())
    }
}
