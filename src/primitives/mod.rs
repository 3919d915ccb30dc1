//! L0 primitives: the algebraic hash, the embedded-curve signature scheme,
//! and the sparse-Merkle authenticate/recompute pair. spec.md §3 treats these
//! as "trusted, supplied by a backend"; since no published arkworks crate
//! implements a Loopring-style MiMC/Jubjub-EdDSA pair, they are implemented
//! here directly on `ark-ff` / `ark-r1cs-std`, the same layer the teacher's
//! own UTXO commitments (`mpc_zexe`) sat on top of.

pub mod mimc;
pub mod merkle;
pub mod eddsa;
pub mod public_data;
pub mod bits;

/// The R1CS scalar field every gadget in this crate is built over: the BW6-761
/// scalar field, matching the teacher's pairing cycle (`ark-bw6-761` outer /
/// `ark-bls12-377` inner) so the embedded `ark-ed-on-bls12-377` twisted-Edwards
/// curve's base field lines up with it exactly.
pub type ConstraintF = ark_bw6_761::Fr;

/// Allocates the embedded curve's base point as an in-circuit constant,
/// the `generator` every `SignatureVerifier` call site needs.
pub fn eddsa_generator(
    cs: ark_relations::r1cs::ConstraintSystemRef<ConstraintF>,
) -> Result<ark_ed_on_bls12_377::constraints::EdwardsVar, ark_relations::r1cs::SynthesisError> {
    use ark_ec::AffineRepr;
    use ark_r1cs_std::alloc::AllocVar;
    ark_ed_on_bls12_377::constraints::EdwardsVar::new_constant(
        cs,
        ark_ed_on_bls12_377::EdwardsAffine::generator(),
    )
}
