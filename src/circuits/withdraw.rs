//! `WithdrawCircuit`: the L5 block circuit for withdrawals. Chains N
//! `WithdrawalGadget`s through the accounts tree; each debits one account's
//! balance leaf by a publicly known amount under the account owner's
//! signature. Grounded on
//! `examples/original_source/circuit/Circuits/WithdrawCircuit.h`'s
//! `WithdrawalsCircuitGadget`.

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
use crate::input::{BlockJson, WithdrawalJson};
use crate::ops::withdrawal::{withdraw, WithdrawInput};
use crate::ops::{AccountTouch, BalanceLeg};
use crate::primitives::bits::address_bits_witness;
use crate::primitives::merkle::{MerkleProof, MerkleProofVar};
use crate::primitives::public_data::PublicDataAccumulatorVar;
use crate::primitives::ConstraintF as F;
use crate::state::account::AccountStateVar;
use crate::state::balance::BalanceStateVar;

use super::{pubkey_witness, signature_witness};

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

/// Builds the account touch for one withdrawal: public key, wallet ID and
/// nonce pass through unchanged; only the addressed balance leaf's `balance`
/// moves down by `amount`.
fn withdraw_touch_witness(
    cs: ConstraintSystemRef<F>,
    rec: Option<&WithdrawalJson>,
) -> Result<(AccountTouch<F>, FpVar<F>), SynthesisError> {
    let address_bits = address_bits_witness(
        cs.clone(),
        rec.map(|r| r.address),
        config::TREE_DEPTH_ACCOUNTS,
    )?;
    let proof = merkle_proof_witness(cs.clone(), rec.map(|r| &r.proof), config::TREE_DEPTH_ACCOUNTS)?;

    let pk_x = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.public_key.x.0).ok_or(SynthesisError::AssignmentMissing)
    })?;
    let pk_y = FpVar::new_witness(cs.clone(), || {
        rec.map(|r| r.public_key.y.0).ok_or(SynthesisError::AssignmentMissing)
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
        balance: &balance_before_val - &amount,
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
        public_key_x: pk_x.clone(),
        public_key_y: pk_y.clone(),
        wallet_id: wallet_id.clone(),
        nonce: nonce.clone(),
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

/// A withdrawal's public-data tuple (spec.md §6): `address, amount`,
/// matching the original's `{account, amount.bits}`.
fn append_withdraw_public_data(
    pd: &mut PublicDataAccumulatorVar<F>,
    touch: &AccountTouch<F>,
    amount: &FpVar<F>,
) -> Result<(), SynthesisError> {
    pd.append(&touch.address_bits);
    pd.append(&amount.to_bits_le()?[..config::NUM_BITS_AMOUNT]);
    Ok(())
}

pub struct WithdrawCircuit {
    pub state_id: Option<u64>,
    pub merkle_root_before: Option<F>,
    pub merkle_root_after: Option<F>,
    pub withdrawals: Vec<Option<WithdrawalJson>>,
    pub public_input_out: Rc<RefCell<Option<F>>>,
}

impl WithdrawCircuit {
    pub fn from_block(block: BlockJson) -> Result<Self, BlockError> {
        Ok(Self {
            state_id: Some(block.state_id as u64),
            merkle_root_before: Some(block.merkle_root_before.0),
            merkle_root_after: Some(block.merkle_root_after.0),
            withdrawals: block.withdrawals.into_iter().map(Some).collect(),
            public_input_out: Rc::new(RefCell::new(None)),
        })
    }

    pub fn dummy(num_withdrawals: usize) -> Self {
        Self {
            state_id: None,
            merkle_root_before: None,
            merkle_root_after: None,
            withdrawals: vec![None; num_withdrawals],
            public_input_out: Rc::new(RefCell::new(None)),
        }
    }

    pub fn circuit_setup(
        num_withdrawals: usize,
    ) -> Result<(ProvingKey<BW6_761>, VerifyingKey<BW6_761>), BlockError> {
        let circuit = Self::dummy(num_withdrawals);
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

impl ConstraintSynthesizer<F> for WithdrawCircuit {
    fn generate_constraints(self, cs: ConstraintSystemRef<F>) -> Result<(), SynthesisError> {
        let merkle_root_before =
            FpVar::new_witness(cs.clone(), || self.merkle_root_before.ok_or(SynthesisError::AssignmentMissing))?;
        let merkle_root_after =
            FpVar::new_witness(cs.clone(), || self.merkle_root_after.ok_or(SynthesisError::AssignmentMissing))?;

        let generator = crate::primitives::eddsa_generator(cs.clone())?;
        let mut pd = PublicDataAccumulatorVar::<F>::new();

        let mut root = merkle_root_before;
        for rec in &self.withdrawals {
            let (touch, amount) = withdraw_touch_witness(cs.clone(), rec.as_ref())?;
            let owner_pk = pubkey_witness(cs.clone(), rec.as_ref().map(|r| &r.public_key))?;
            let sig = signature_witness(cs.clone(), rec.as_ref().map(|r| &r.signature))?;
            let nonce = FpVar::new_witness(cs.clone(), || {
                rec.as_ref()
                    .map(|r| r.nonce.0)
                    .ok_or(SynthesisError::AssignmentMissing)
            })?;

            append_withdraw_public_data(&mut pd, &touch, &amount)?;
            root = withdraw(
                WithdrawInput {
                    touch,
                    amount,
                    generator: generator.clone(),
                    owner_pk,
                    sig,
                    nonce,
                },
                &root,
            )?;
        }

        root.enforce_equal(&merkle_root_after)?;
        let public_data_hash = pd.into_public_input(cs.clone())?;
        *self.public_input_out.borrow_mut() = public_data_hash.value().ok();
        Ok(())
    }
}
