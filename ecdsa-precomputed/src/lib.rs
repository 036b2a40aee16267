#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/meta/master/logo.svg"
)]
#![forbid(unsafe_code)]
#![warn(
    clippy::mod_module_files,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

//! ## Usage
//!
//! ```
//! use ecdsa_precomputed::{signature::Verifier, PrecomputedVerifyingKey};
//! use p256::{
//!     ecdsa::{signature::Signer, Signature, SigningKey, VerifyingKey},
//!     NistP256,
//! };
//! use rand_core::OsRng;
//!
//! // Signing side: an ordinary `ecdsa` signing key.
//! let signing_key = SigningKey::random(&mut OsRng);
//! let message = b"from the lectern before the bellows-mender";
//! let signature: Signature = signing_key.sign(message);
//!
//! // Verifying side: build the table once, then verify any number of
//! // signatures against it.
//! let verifying_key = VerifyingKey::from(&signing_key);
//! let precomputed = PrecomputedVerifyingKey::<NistP256>::from(verifying_key);
//! assert!(precomputed.verify(message, &signature).is_ok());
//! ```
//!
//! ## `serde` support
//!
//! When the `serde` feature of this crate is enabled, `Serialize` and
//! `Deserialize` are impl'd for [`PrecomputedVerifyingKey`].
//!
//! Only the public key point is serialized, in the same SEC1 form the
//! `elliptic-curve` crate uses for [`PublicKey`]. The multiplication table is
//! rebuilt when a key is deserialized.

#[cfg(feature = "alloc")]
extern crate alloc;
#[cfg(feature = "std")]
extern crate std;

mod mul;
mod verifying;

pub use crate::{mul::NafSize, verifying::PrecomputedVerifyingKey};

pub use ecdsa_core::{
    self as ecdsa,
    signature::{self, Error, Result},
    Signature, VerifyingKey,
};
pub use elliptic_curve::{self, sec1::EncodedPoint, PublicKey};
