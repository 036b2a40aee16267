//! Verifying keys carrying a precomputed table of public key multiples.
//!
//! ## Algorithm
//!
//! ```text
//! V1: parse (r, s), verification failed unless both in [1, n-1]
//! V2: calculate u1 = z * s^-1 mod n and u2 = r * s^-1 mod n,
//!     where z is the leftmost |n| bits of the message digest
//! V3: calculate the point R = [u1]G + [u2]Q, verification failed
//!     if R is the point at infinity
//! V4: verification passes iff R.x mod n == r
//! ```
//!
//! The `[u2]Q` term reuses the table of odd multiples of `Q` computed when
//! the key was built; the `[u1]G` term shares its doublings.

use crate::mul::{double_base_mul_vartime, NafSize, OddMultiplesTable};
use core::fmt;
use ecdsa_core::{
    hazmat::{bits2field, DigestPrimitive},
    signature::{
        digest::{Digest, FixedOutput},
        hazmat::PrehashVerifier,
        DigestVerifier, Error, Result, Verifier,
    },
    Signature, SignatureSize, VerifyingKey,
};
use elliptic_curve::{
    generic_array::ArrayLength,
    group::{Curve as _, Group},
    ops::{Invert, Reduce},
    point::{AffineCoordinates, PointCompression},
    sec1::{EncodedPoint, FromEncodedPoint, ModulusSize, ToEncodedPoint},
    AffinePoint, CurveArithmetic, FieldBytes, FieldBytesSize, PrimeCurve, PublicKey, Scalar,
};

#[cfg(feature = "alloc")]
use alloc::boxed::Box;

#[cfg(feature = "serde")]
use elliptic_curve::generic_array::GenericArray;
#[cfg(feature = "serde")]
use serdect::serde::{de, ser, Deserialize, Serialize};

/// ECDSA public key which carries a precomputed table of its own odd
/// multiples, amortizing table construction across verifications.
///
/// `N` is the number of table entries, which must be a power of two no
/// greater than 64. The default covers odd multiples through `127×Q` and
/// suits keys which verify many signatures; smaller tables trade
/// per-verification speed for build time and size.
///
/// Keys are immutable once built. The table is a pure function of the
/// public key, so two keys built from the same point are identical, and a
/// key may be shared across threads (`PrecomputedVerifyingKey` is `Send +
/// Sync`) and used concurrently without locking.
///
/// ## Usage
///
/// The [`signature`] crate defines the following traits which are the
/// primary API for verifying:
///
/// - [`Verifier`]: verify a message against a provided key and signature
/// - [`DigestVerifier`]: verify a message [`Digest`] against a provided key
///   and signature
/// - [`PrehashVerifier`]: verify the low-level raw output bytes of a message
///   digest
///
/// ## `serde` support
///
/// When the `serde` feature of this crate is enabled, the `Serialize` and
/// `Deserialize` traits are impl'd for this type.
///
/// The serialization is the SEC1 compressed encoding of the public key
/// point alone; tables never leave the process. Deserialization validates
/// the point and rebuilds the table, so a decoded key is indistinguishable
/// from a freshly constructed one.
///
/// [`signature`]: ecdsa_core::signature
#[derive(Clone)]
pub struct PrecomputedVerifyingKey<C, const N: usize = 64>
where
    C: PrimeCurve + CurveArithmetic,
{
    /// Signer's public key.
    public_key: PublicKey<C>,

    /// Odd multiples of the public key point.
    table: OddMultiplesTable<C, N>,
}

impl<C, const N: usize> PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
{
    /// Initialize [`PrecomputedVerifyingKey`] from a [`PublicKey`].
    ///
    /// This is where the table is paid for: one doubling and `N - 1` point
    /// additions. [`PublicKey`] guarantees the point is on the curve and is
    /// not the identity, so this conversion cannot fail.
    pub fn new(public_key: PublicKey<C>) -> Self {
        let table = OddMultiplesTable::new(&C::ProjectivePoint::from(*public_key.as_affine()));

        Self { public_key, table }
    }

    /// Borrow the inner [`AffinePoint`] for this key.
    pub fn as_affine(&self) -> &AffinePoint<C> {
        self.public_key.as_affine()
    }

    /// Get the [`PublicKey`] this key was built from.
    pub fn public_key(&self) -> PublicKey<C> {
        self.public_key
    }
}

impl<C, const N: usize> PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    /// Initialize [`PrecomputedVerifyingKey`] from a SEC1-encoded public key.
    pub fn from_sec1_bytes(bytes: &[u8]) -> Result<Self> {
        let public_key = PublicKey::from_sec1_bytes(bytes).map_err(|_| Error::new())?;
        Ok(Self::new(public_key))
    }

    /// Initialize [`PrecomputedVerifyingKey`] from an affine point.
    ///
    /// Returns an [`Error`] if the given affine point is the additive
    /// identity (a.k.a. point at infinity).
    pub fn from_affine(affine: AffinePoint<C>) -> Result<Self> {
        let public_key = PublicKey::from_affine(affine).map_err(|_| Error::new())?;
        Ok(Self::new(public_key))
    }

    /// Initialize [`PrecomputedVerifyingKey`] from an [`EncodedPoint`].
    pub fn from_encoded_point(public_key: &EncodedPoint<C>) -> Result<Self> {
        Option::from(PublicKey::<C>::from_encoded_point(public_key))
            .map(Self::new)
            .ok_or_else(Error::new)
    }

    /// Initialize [`PrecomputedVerifyingKey`] from a [`VerifyingKey`], which
    /// has already been validated and so cannot fail to convert.
    pub fn from_verifying_key(verifying_key: &VerifyingKey<C>) -> Self {
        Self::new(PublicKey::from(verifying_key))
    }

    /// Serialize this key as a SEC1 [`EncodedPoint`], optionally applying
    /// point compression.
    ///
    /// The encoding carries the public key point only. A key rebuilt from it
    /// recomputes its table from scratch.
    pub fn to_encoded_point(&self, compress: bool) -> EncodedPoint<C> {
        self.public_key.to_encoded_point(compress)
    }
}

impl<C, const N: usize> PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic + PointCompression,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    /// Convert this key into the `Elliptic-Curve-Point-to-Octet-String`
    /// encoding described in SEC 1: Elliptic Curve Cryptography (Version
    /// 2.0) section 2.3.3 (page 10).
    ///
    /// <http://www.secg.org/sec1-v2.pdf>
    #[cfg(feature = "alloc")]
    pub fn to_sec1_bytes(&self) -> Box<[u8]> {
        self.public_key.to_sec1_bytes()
    }
}

impl<C, const N: usize> PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
    FieldBytesSize<C>: NafSize,
    SignatureSize<C>: ArrayLength<u8>,
{
    /// Verify a signature over `z`, a message digest which has already been
    /// truncated to the curve's field size.
    ///
    /// Callers should normally prefer the [`PrehashVerifier`] or
    /// [`Verifier`] impls, which handle digest truncation and computation
    /// respectively.
    pub fn verify_prehashed(&self, z: &FieldBytes<C>, signature: &Signature<C>) -> Result<()> {
        // V1: r and s in [1, n-1] is guaranteed at signature parse time
        let (r, s) = signature.split_scalars();

        // V2: u1 = z * s^-1, u2 = r * s^-1
        let z = Scalar::<C>::reduce_bytes(z);
        let s_inv = *s.invert_vartime();
        let u1 = z * s_inv;
        let u2 = *r * s_inv;

        // V3: R = [u1]G + [u2]Q, sharing doublings between both terms
        let point = double_base_mul_vartime(&u2, &self.table, &u1);
        if point.is_identity().into() {
            return Err(Error::new());
        }

        // V4: accept iff R.x mod n == r
        if *r == Scalar::<C>::reduce_bytes(&point.to_affine().x()) {
            Ok(())
        } else {
            Err(Error::new())
        }
    }
}

//
// `*Verifier` trait impls
//

impl<C, D, const N: usize> DigestVerifier<D, Signature<C>> for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
    D: Digest + FixedOutput<OutputSize = FieldBytesSize<C>>,
    FieldBytesSize<C>: NafSize,
    SignatureSize<C>: ArrayLength<u8>,
{
    fn verify_digest(&self, msg_digest: D, signature: &Signature<C>) -> Result<()> {
        self.verify_prehashed(&msg_digest.finalize_fixed(), signature)
    }
}

impl<C, const N: usize> PrehashVerifier<Signature<C>> for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
    FieldBytesSize<C>: NafSize,
    SignatureSize<C>: ArrayLength<u8>,
{
    fn verify_prehash(&self, prehash: &[u8], signature: &Signature<C>) -> Result<()> {
        let field = bits2field::<C>(prehash)?;
        self.verify_prehashed(&field, signature)
    }
}

impl<C, const N: usize> Verifier<Signature<C>> for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic + DigestPrimitive,
    FieldBytesSize<C>: NafSize,
    SignatureSize<C>: ArrayLength<u8>,
{
    fn verify(&self, msg: &[u8], signature: &Signature<C>) -> Result<()> {
        self.verify_digest(C::Digest::new_with_prefix(msg), signature)
    }
}

//
// Other trait impls
//

impl<C, const N: usize> AsRef<AffinePoint<C>> for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
{
    fn as_ref(&self) -> &AffinePoint<C> {
        self.as_affine()
    }
}

impl<C, const N: usize> fmt::Debug for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PrecomputedVerifyingKey")
            .field(&self.public_key)
            .finish()
    }
}

impl<C, const N: usize> Eq for PrecomputedVerifyingKey<C, N> where C: PrimeCurve + CurveArithmetic {}

impl<C, const N: usize> PartialEq for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
{
    fn eq(&self, other: &Self) -> bool {
        // the table is a pure function of the public key
        self.public_key == other.public_key
    }
}

impl<C, const N: usize> TryFrom<&[u8]> for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    type Error = Error;

    fn try_from(bytes: &[u8]) -> Result<Self> {
        Self::from_sec1_bytes(bytes)
    }
}

impl<C, const N: usize> From<PublicKey<C>> for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
{
    fn from(public_key: PublicKey<C>) -> Self {
        Self::new(public_key)
    }
}

impl<C, const N: usize> From<&PublicKey<C>> for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
{
    fn from(public_key: &PublicKey<C>) -> Self {
        Self::new(*public_key)
    }
}

impl<C, const N: usize> From<PrecomputedVerifyingKey<C, N>> for PublicKey<C>
where
    C: PrimeCurve + CurveArithmetic,
{
    fn from(key: PrecomputedVerifyingKey<C, N>) -> PublicKey<C> {
        key.public_key
    }
}

impl<C, const N: usize> From<&PrecomputedVerifyingKey<C, N>> for PublicKey<C>
where
    C: PrimeCurve + CurveArithmetic,
{
    fn from(key: &PrecomputedVerifyingKey<C, N>) -> PublicKey<C> {
        key.public_key
    }
}

impl<C, const N: usize> From<VerifyingKey<C>> for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    fn from(verifying_key: VerifyingKey<C>) -> Self {
        Self::new(PublicKey::from(verifying_key))
    }
}

impl<C, const N: usize> From<&VerifyingKey<C>> for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    fn from(verifying_key: &VerifyingKey<C>) -> Self {
        Self::new(PublicKey::from(verifying_key))
    }
}

impl<C, const N: usize> From<PrecomputedVerifyingKey<C, N>> for VerifyingKey<C>
where
    C: PrimeCurve + CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    fn from(key: PrecomputedVerifyingKey<C, N>) -> VerifyingKey<C> {
        VerifyingKey::from(key.public_key)
    }
}

impl<C, const N: usize> From<&PrecomputedVerifyingKey<C, N>> for VerifyingKey<C>
where
    C: PrimeCurve + CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    fn from(key: &PrecomputedVerifyingKey<C, N>) -> VerifyingKey<C> {
        VerifyingKey::from(key.public_key)
    }
}

#[cfg(feature = "serde")]
impl<C, const N: usize> Serialize for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    fn serialize<S>(&self, serializer: S) -> core::result::Result<S::Ok, S::Error>
    where
        S: ser::Serializer,
    {
        let encoded = self.to_encoded_point(true);
        serdect::slice::serialize_hex_upper_or_bin(&encoded, serializer)
    }
}

#[cfg(feature = "serde")]
impl<'de, C, const N: usize> Deserialize<'de> for PrecomputedVerifyingKey<C, N>
where
    C: PrimeCurve + CurveArithmetic,
    AffinePoint<C>: FromEncodedPoint<C> + ToEncodedPoint<C>,
    FieldBytesSize<C>: ModulusSize,
{
    fn deserialize<D>(deserializer: D) -> core::result::Result<Self, D::Error>
    where
        D: de::Deserializer<'de>,
    {
        let mut buf =
            GenericArray::<u8, <FieldBytesSize<C> as ModulusSize>::UncompressedPointSize>::default();
        let slice = serdect::slice::deserialize_hex_or_bin(buf.as_mut_slice(), deserializer)?;
        Self::from_sec1_bytes(slice).map_err(de::Error::custom)
    }
}
