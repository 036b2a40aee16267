//! Build-only crate checking that `ecdsa-precomputed` links without `std`.

#![no_std]

pub use ecdsa_precomputed;
