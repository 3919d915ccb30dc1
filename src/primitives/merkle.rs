//! Sparse Merkle authenticate/recompute, generic over the leaf arity and
//! parameterized by [`super::mimc::hash`]. Grounded on
//! `examples/original_source/circuit/Gadgets/AccountGadgets.h`'s
//! `UpdateAccountGadget`, which bundles exactly this authenticate-old-then-
//! recompute-new pattern using the *same* sibling-path witness for both
//! halves, rather than two independent Merkle proofs.

use ark_ff::PrimeField;
use ark_r1cs_std::{fields::fp::FpVar, prelude::*};
use ark_relations::r1cs::SynthesisError;

use super::mimc;

/// A sparse-Merkle sibling path, native form. `siblings[i]` is the sibling
/// hash at depth `i` (leaf-to-root order).
#[derive(Debug, Clone)]
pub struct MerkleProof<F> {
    pub siblings: Vec<F>,
}

/// Recomputes the root implied by `leaf` at `address`, given `proof`.
/// `address`'s bit `i` (LSB first) selects which child `leaf`/the running
/// node occupies at depth `i`: `0` = node is the left child.
pub fn recompute<F: PrimeField>(leaf: F, address: u64, proof: &MerkleProof<F>) -> F {
    let mut node = leaf;
    for (i, sibling) in proof.siblings.iter().enumerate() {
        let bit = (address >> i) & 1 == 1;
        node = if bit {
            mimc::hash(&[*sibling, node])
        } else {
            mimc::hash(&[node, *sibling])
        };
    }
    node
}

/// Returns `true` iff `leaf` at `address` authenticates against `root` via `proof`.
pub fn authenticate<F: PrimeField>(
    leaf: F,
    address: u64,
    proof: &MerkleProof<F>,
    root: F,
) -> bool {
    recompute(leaf, address, proof) == root
}

/// R1CS sibling path.
#[derive(Clone)]
pub struct MerkleProofVar<F: PrimeField> {
    pub siblings: Vec<FpVar<F>>,
}

impl<F: PrimeField> MerkleProofVar<F> {
    pub fn new_witness(
        cs: impl Into<ark_relations::r1cs::Namespace<F>>,
        proof: &Option<MerkleProof<F>>,
        depth: usize,
    ) -> Result<Self, SynthesisError> {
        let ns = cs.into();
        let cs = ns.cs();
        let mut siblings = Vec::with_capacity(depth);
        for i in 0..depth {
            let value = proof.as_ref().map(|p| p.siblings[i]);
            siblings.push(FpVar::new_witness(cs.clone(), || {
                value.ok_or(SynthesisError::AssignmentMissing)
            })?);
        }
        Ok(Self { siblings })
    }
}

/// R1CS gadget form of [`recompute`]. `address_bits` is LSB-first and must
/// have exactly `proof.siblings.len()` entries.
pub fn recompute_gadget<F: PrimeField>(
    leaf: &FpVar<F>,
    address_bits: &[Boolean<F>],
    proof: &MerkleProofVar<F>,
) -> Result<FpVar<F>, SynthesisError> {
    assert_eq!(address_bits.len(), proof.siblings.len());
    let mut node = leaf.clone();
    for (bit, sibling) in address_bits.iter().zip(proof.siblings.iter()) {
        let left = bit.select(sibling, &node)?;
        let right = bit.select(&node, sibling)?;
        node = mimc::hash_gadget(&[left, right])?;
    }
    Ok(node)
}

/// R1CS gadget form of [`authenticate`]: constrains the recomputed root to
/// equal `root`.
pub fn authenticate_gadget<F: PrimeField>(
    leaf: &FpVar<F>,
    address_bits: &[Boolean<F>],
    proof: &MerkleProofVar<F>,
    root: &FpVar<F>,
) -> Result<(), SynthesisError> {
    let computed = recompute_gadget(leaf, address_bits, proof)?;
    computed.enforce_equal(root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::ConstraintF as F;
    use ark_relations::r1cs::ConstraintSystem;

    fn path_for(leaves: &[F], address: usize) -> MerkleProof<F> {
        // Tiny depth-2 tree over 4 leaves, built by hand for the test.
        let mut level = leaves.to_vec();
        let mut siblings = Vec::new();
        let mut idx = address;
        while level.len() > 1 {
            let sibling_idx = idx ^ 1;
            siblings.push(level[sibling_idx]);
            let mut next = Vec::with_capacity(level.len() / 2);
            for pair in level.chunks(2) {
                next.push(mimc::hash(&[pair[0], pair[1]]));
            }
            level = next;
            idx /= 2;
        }
        MerkleProof { siblings }
    }

    #[test]
    fn authenticate_and_update_roundtrip() {
        let leaves = vec![F::from(1u64), F::from(2u64), F::from(3u64), F::from(4u64)];
        let address = 2usize;
        let proof = path_for(&leaves, address);
        let root = recompute(leaves[address], address as u64, &proof);
        assert!(authenticate(leaves[address], address as u64, &proof, root));

        let new_leaf = F::from(99u64);
        let new_root = recompute(new_leaf, address as u64, &proof);
        assert_ne!(new_root, root);
    }

    #[test]
    fn gadget_matches_native() {
        let leaves = vec![F::from(1u64), F::from(2u64), F::from(3u64), F::from(4u64)];
        let address = 1usize;
        let proof = path_for(&leaves, address);
        let root = recompute(leaves[address], address as u64, &proof);

        let cs = ConstraintSystem::<F>::new_ref();
        let leaf_var = FpVar::new_witness(cs.clone(), || Ok(leaves[address])).unwrap();
        let address_bits = vec![
            Boolean::new_witness(cs.clone(), || Ok(address & 1 == 1)).unwrap(),
            Boolean::new_witness(cs.clone(), || Ok((address >> 1) & 1 == 1)).unwrap(),
        ];
        let proof_var = MerkleProofVar::new_witness(cs.clone(), &Some(proof), 2).unwrap();
        let root_var = FpVar::new_witness(cs.clone(), || Ok(root)).unwrap();
        authenticate_gadget(&leaf_var, &address_bits, &proof_var, &root_var).unwrap();
        assert!(cs.is_satisfied().unwrap());
    }
}
