//! ECDSA verification tests against precomputed public keys.

use ecdsa_precomputed::{
    signature::{
        hazmat::{PrehashSigner, PrehashVerifier},
        Signer, Verifier,
    },
    PrecomputedVerifyingKey,
};
use elliptic_curve::ops::Reduce;
use hex_literal::hex;
use p256::{
    ecdsa::{Signature, SigningKey},
    FieldBytes, NistP256, NonZeroScalar, U256,
};
use proptest::prelude::*;
use rand_core::OsRng;
use sha2::{Digest, Sha256};

/// Public key from RFC 6979 Appendix A.2.5.
const RFC6979_PUBLIC_KEY: [u8; 65] = hex!(
    "04 60FED4BA255A9D31C961EB74C6356D68C049B8923B61FA6CE669622E60F29FB6
        7903FE1008B8BC99A41AE9E95628BC64F2F1B20C2D7E9F5177A3C294D4462299"
);

/// RFC 6979 Appendix A.2.5 test case signatures over SHA-256.
const RFC6979_VECTORS: &[(&[u8], [u8; 64])] = &[
    (
        b"sample",
        hex!(
            "EFD48B2AACB6A8FD1140DD9CD45E81D69D2C877B56AAF991C34D0EA84EAF3716
             F7CB1C942D657C41D436C7A1B6E29F65F3E900DBB9AFF4064DC4AB2F843ACDA8"
        ),
    ),
    (
        b"test",
        hex!(
            "F1ABB023518351CD71D881567B1EA663ED3EFCF6C5132B354F28D3B0B7D38367
             019F4113742A2B14BD25926B49C649155F267E60D3814B4C0CC84250E46F0083"
        ),
    ),
];

/// P-256 group order `n`.
const ORDER: [u8; 32] = hex!("FFFFFFFF00000000FFFFFFFFFFFFFFFFBCE6FAADA7179E84F3B9CAC2FC632551");

fn rfc6979_key() -> PrecomputedVerifyingKey<NistP256> {
    PrecomputedVerifyingKey::from_sec1_bytes(&RFC6979_PUBLIC_KEY).unwrap()
}

#[test]
fn verifies_rfc6979_signatures() {
    let key = rfc6979_key();

    for (msg, bytes) in RFC6979_VECTORS {
        let signature = Signature::from_slice(bytes).unwrap();
        let digest = Sha256::digest(msg);

        assert!(key.verify_prehash(digest.as_slice(), &signature).is_ok());
        assert!(key.verify(msg, &signature).is_ok());
    }
}

#[test]
fn rejects_signatures_under_the_wrong_message() {
    let key = rfc6979_key();

    let (_, bytes) = RFC6979_VECTORS[0];
    let signature = Signature::from_slice(&bytes).unwrap();

    assert!(key.verify(b"Sample", &signature).is_err());
    assert!(key.verify(b"", &signature).is_err());
}

#[test]
fn verifies_secp256k1_signatures() {
    // Signature produced by the `k256` crate's own signing test vector
    let public_key = hex!(
        "04 779DD197A5DF977ED2CF6CB31D82D43328B790DC6B3B7D4437A427BD5847DFCD
            E94B724A555B6D017BB7607C3E3281DAF5B1699D6EF4124975C9237B917D426F"
    );
    let prehash = hex!("4B688DF40BCEDBE641DDB16FF0A1842D9C67EA1C3BF63F3E0471BAA664531D1A");
    let signature = hex!(
        "241097EFBF8B63BF145C8961DBDF10C310EFBB3B2676BBC0F8B08505C9E2F795
         021006B7838609339E8B415A7F9ACB1B661828131AEF1ECBC7955DFB01F3CA0E"
    );

    let key =
        PrecomputedVerifyingKey::<k256::Secp256k1>::from_sec1_bytes(&public_key).unwrap();
    let signature = k256::ecdsa::Signature::from_slice(&signature).unwrap();

    assert!(key.verify_prehash(&prehash, &signature).is_ok());

    let mut wrong = prehash;
    wrong[0] ^= 1;
    assert!(key.verify_prehash(&wrong, &signature).is_err());
}

#[test]
fn rejects_tampered_signatures_and_wrong_keys() {
    let signing_key = SigningKey::random(&mut OsRng);
    let key = PrecomputedVerifyingKey::<NistP256>::from(signing_key.verifying_key());

    let msg = b"precomputation pays off after the first signature";
    let signature: Signature = signing_key.sign(msg);
    assert!(key.verify(msg, &signature).is_ok());

    // corrupt one byte of `s`; reparsing may also reject it outright
    let mut bytes = signature.to_bytes();
    bytes[40] ^= 0x40;
    if let Ok(tampered) = Signature::from_bytes(&bytes) {
        assert!(key.verify(msg, &tampered).is_err());
    }

    let other_key =
        PrecomputedVerifyingKey::<NistP256>::from(SigningKey::random(&mut OsRng).verifying_key());
    assert!(other_key.verify(msg, &signature).is_err());
}

#[test]
fn out_of_range_signature_scalars_are_unrepresentable() {
    let (_, bytes) = RFC6979_VECTORS[0];
    let r = FieldBytes::from_slice(&bytes[..32]);
    let s = FieldBytes::from_slice(&bytes[32..]);

    // zero scalars
    assert!(Signature::from_scalars(FieldBytes::default(), *s).is_err());
    assert!(Signature::from_scalars(*r, FieldBytes::default()).is_err());

    // scalars not below the group order
    assert!(Signature::from_scalars(FieldBytes::from(ORDER), *s).is_err());
    assert!(Signature::from_scalars(*r, FieldBytes::from(ORDER)).is_err());
}

#[test]
fn all_zero_prehash_fails_cleanly() {
    let key = rfc6979_key();
    let (_, bytes) = RFC6979_VECTORS[0];
    let signature = Signature::from_slice(&bytes).unwrap();

    assert!(key.verify_prehash(&[0u8; 32], &signature).is_err());
}

#[test]
fn prehashes_longer_than_the_field_are_truncated() {
    let signing_key = SigningKey::random(&mut OsRng);
    let key = PrecomputedVerifyingKey::<NistP256>::from(signing_key.verifying_key());

    // e.g. a SHA-384 output fed to a P-256 key
    let prehash = hex!(
        "9A9083505BC92276AEC4BE312696EF7BF3BF603F4BBD381196A029F340585312
         313BCA4A9B5B890EFEE42C77B1EE25FE"
    );

    let signature: Signature = signing_key.sign_prehash(&prehash).unwrap();
    assert!(key.verify_prehash(&prehash, &signature).is_ok());
}

#[test]
fn small_scalar_scenario() {
    // d = 5, z = 42: small enough to follow through the whole pipeline
    let mut d = FieldBytes::default();
    d[31] = 5;
    let signing_key = SigningKey::from_bytes(&d).unwrap();
    let key = PrecomputedVerifyingKey::<NistP256>::from(signing_key.verifying_key());

    let mut z = FieldBytes::default();
    z[31] = 42;
    let signature: Signature = signing_key.sign_prehash(z.as_slice()).unwrap();

    assert!(key.verify_prehash(z.as_slice(), &signature).is_ok());

    z[31] = 43;
    assert!(key.verify_prehash(z.as_slice(), &signature).is_err());
}

#[test]
fn shares_one_key_across_threads() {
    let signing_key = SigningKey::random(&mut OsRng);
    let key = PrecomputedVerifyingKey::<NistP256>::from(signing_key.verifying_key());

    let signed: Vec<(String, Signature)> = (0..16)
        .map(|i| {
            let msg = format!("message {}", i);
            let signature = signing_key.sign(msg.as_bytes());
            (msg, signature)
        })
        .collect();

    std::thread::scope(|scope| {
        for chunk in signed.chunks(4) {
            let key = &key;
            scope.spawn(move || {
                for (msg, signature) in chunk {
                    assert!(key.verify(msg.as_bytes(), signature).is_ok());
                }
            });
        }
    });
}

prop_compose! {
    /// Generate a random `SigningKey`
    fn signing_key()(bytes in any::<[u8; 32]>()) -> SigningKey {
        <NonZeroScalar as Reduce<U256>>::reduce_bytes(&bytes.into()).into()
    }
}

proptest! {
    #[test]
    fn accepts_exactly_what_the_generic_verifier_accepts(
        sk in signing_key(),
        msg in any::<Vec<u8>>(),
    ) {
        let verifying_key = sk.verifying_key();
        let precomputed = PrecomputedVerifyingKey::<NistP256>::from(verifying_key);
        let signature: Signature = sk.sign(&msg);

        prop_assert!(precomputed.verify(&msg, &signature).is_ok());
        prop_assert_eq!(
            precomputed.verify(&msg, &signature).is_ok(),
            verifying_key.verify(&msg, &signature).is_ok()
        );
    }

    #[test]
    fn rejects_signatures_from_other_keys(
        sk1 in signing_key(),
        sk2 in signing_key(),
        msg in any::<Vec<u8>>(),
    ) {
        prop_assume!(sk1.verifying_key() != sk2.verifying_key());

        let signature: Signature = sk1.sign(&msg);
        let precomputed = PrecomputedVerifyingKey::<NistP256>::from(sk2.verifying_key());

        prop_assert!(precomputed.verify(&msg, &signature).is_err());
    }
}
