//! L1: field-level gadgets used throughout the L2-L4 state and domain
//! gadgets. Grounded on `examples/original_source/circuit/Gadgets/MathGadgets.h`.
//!
//! Comparisons (`Leq`, `Equal`, `Min`) lean on `ark-r1cs-std`'s built-in
//! `CmpGadget` for `FpVar` rather than hand-rolling a bit-decomposition
//! comparator the way the C++ `comparison_gadget` does — the ecosystem
//! already provides this, and MathGadgets.h's own comment that it wraps
//! `libsnark::comparison_gadget<FieldT>` is itself just "use the library
//! primitive for this", which here is `CmpGadget`.

pub mod ternary;
pub mod leq;
pub mod equal;
pub mod bool_ops;
pub mod min;
pub mod muldiv;
pub mod force_leq;
pub mod signature;
