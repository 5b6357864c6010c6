// Author: dWallet Labs, LTD.
// SPDX-License-Identifier: Apache-2.0

//! Ethereum ECDSA signing and public-key recovery.

#[cfg(feature = "benchmarking")]
pub use benches::benchmark;
use crypto_bigint::{Limb, U256};
use k256::ecdsa::{signature::hazmat::PrehashSigner, Signature as EcdsaSignature};
use tracing::{debug, error, instrument};

use crate::{
    group::secp256k1::{self, GroupElement, Scalar},
    hash::{message_hash, HASH_SIZE},
    key::{PrivateKey, PublicKey},
    signature::{is_in_scalar_range, RecoveryId, Signature, SignatureKind, V_OFFSET},
    Error, Result,
};

/// The chain id of Ethereum mainnet.
pub const MAINNET_CHAIN_ID: u64 = 1;

/// Signs EIP-191 messages and recovers signers' public keys from their signatures.
///
/// A `Signer` holds no secrets; it can be shared freely between threads, and the same instance
/// serves any number of private keys.
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Signer {
    chain_id: u64,
    parameters: secp256k1::PublicParameters,
}

impl Default for Signer {
    fn default() -> Self {
        Self::mainnet()
    }
}

impl Signer {
    /// Instantiates a signer for `chain_id`.
    ///
    /// The chain id is not part of [`SignatureKind::Base`] signatures, and is kept for
    /// chain-specific signature kinds.
    pub fn new(chain_id: u64, parameters: secp256k1::PublicParameters) -> Self {
        Self {
            chain_id,
            parameters,
        }
    }

    pub fn mainnet() -> Self {
        Self::new(MAINNET_CHAIN_ID, secp256k1::PublicParameters::default())
    }

    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    pub fn parameters(&self) -> &secp256k1::PublicParameters {
        &self.parameters
    }

    /// Signs `message` as an EIP-191 personal message.
    #[instrument(level = "debug", skip_all, fields(chain_id = self.chain_id, message_len = message.len()))]
    pub fn sign_message(&self, message: &[u8], key: &PrivateKey) -> Result<Signature> {
        self.sign_hash(&message_hash(message), key, SignatureKind::Base)
    }

    /// Signs an already computed 32-byte digest.
    ///
    /// The nonce is derived deterministically from the key and the digest (RFC 6979 with
    /// HMAC-SHA-256), `s` is normalized to the lower half of the group order, and the recovery id
    /// is found by trial recovery against the signer's own public key.
    #[instrument(level = "debug", skip_all, fields(chain_id = self.chain_id, ?kind))]
    pub fn sign_hash(
        &self,
        hash: &[u8; HASH_SIZE],
        key: &PrivateKey,
        kind: SignatureKind,
    ) -> Result<Signature> {
        let signature: EcdsaSignature = key
            .signing_key()
            .sign_prehash(hash)
            .map_err(|_| Error::SigningFailed)?;

        let (r, s) = signature.split_bytes();
        let r = U256::from_be_slice(&r);
        let s = U256::from_be_slice(&s);

        if r == U256::ZERO || s == U256::ZERO {
            error!("the ECDSA signer produced a zero signature component");
            return Err(Error::ZeroSignatureComponent);
        }

        // A no-op for k256, which already emits low-s signatures.
        let s = self.normalize_s(&s);

        let recovery_id = self.recovery_id(hash, &r, &s, &key.public_key())?;

        match kind {
            SignatureKind::Base => Signature::new(*hash, V_OFFSET + recovery_id.to_byte(), r, s),
        }
    }

    /// Maps `s` to `N - s` when it lies in the upper half of the group order.
    ///
    /// Both `(r, s)` and `(r, N - s)` verify, so only the low form is ever emitted.
    pub fn normalize_s(&self, s: &U256) -> U256 {
        if s > &self.parameters.half_order() {
            self.parameters.order().wrapping_sub(s)
        } else {
            *s
        }
    }

    /// Finds the recovery id under which `(r, s)` recovers to `public_key`.
    ///
    /// Only the ids `0` and `1` are tried: `r + N` is never below the field prime for a nonce
    /// point produced by honest signing, up to negligible probability.
    pub fn recovery_id(
        &self,
        hash: &[u8; HASH_SIZE],
        r: &U256,
        s: &U256,
        public_key: &PublicKey,
    ) -> Result<RecoveryId> {
        for is_y_odd in [false, true] {
            let recovery_id = RecoveryId::new(is_y_odd, false);

            if self.ecrecover(recovery_id, hash, r, s).as_ref() == Some(public_key) {
                return Ok(recovery_id);
            }
        }

        error!("neither recovery id recovers the signer's public key");
        Err(Error::RecoveryIdNotFound)
    }

    /// Recovers the public key that produced `signature`.
    ///
    /// Fails with [`Error::InvalidRecoveryId`] if `v` is not 27 or 28. Returns `Ok(None)` when the
    /// signature does not recover to any public key.
    #[instrument(level = "debug", skip_all, fields(v = signature.v()))]
    pub fn recover(&self, signature: &Signature) -> Result<Option<PublicKey>> {
        let recovery_id = signature.recovery_id()?;

        Ok(self.ecrecover(
            recovery_id,
            signature.message_hash(),
            signature.r(),
            signature.s(),
        ))
    }

    /// Recovers a public key from raw signature components and a raw recovery id in `0..=3`.
    ///
    /// `hash` is used as is, without EIP-191 framing.
    #[instrument(level = "debug", skip_all, fields(rec_id = rec_id))]
    pub fn recover_from_parts(
        &self,
        rec_id: u8,
        hash: &[u8; HASH_SIZE],
        r: &U256,
        s: &U256,
    ) -> Result<Option<PublicKey>> {
        let recovery_id = RecoveryId::from_byte(rec_id)?;

        Ok(self.ecrecover(recovery_id, hash, r, s))
    }

    /// Reconstructs the public key `Q = r^-1 (s R - e G)` from a signature, where `R` is the
    /// nonce point identified by `recovery_id`.
    ///
    /// Every failure here is an expected outcome for malformed or adversarial input, and is
    /// reported as `None`.
    pub fn ecrecover(
        &self,
        recovery_id: RecoveryId,
        hash: &[u8; HASH_SIZE],
        r: &U256,
        s: &U256,
    ) -> Option<PublicKey> {
        if !is_in_scalar_range(r) || !is_in_scalar_range(s) {
            debug!("signature components are out of range");
            return None;
        }

        let x = if recovery_id.is_x_reduced() {
            let (x, carry) = r.adc(&self.parameters.order(), Limb::ZERO);
            if carry != Limb::ZERO {
                debug!("candidate x-coordinate overflows");
                return None;
            }

            x
        } else {
            *r
        };

        if x >= self.parameters.modulus() {
            debug!("candidate x-coordinate is not below the field prime");
            return None;
        }

        let nonce_point = match self.parameters.decompress(&x, recovery_id.is_y_odd()) {
            Ok(nonce_point) => nonce_point,
            Err(err) => {
                debug!(%err, "candidate x-coordinate does not decompress");
                return None;
            }
        };

        if !bool::from(nonce_point.mul_by_order().is_neutral()) {
            debug!("nonce point order does not divide the group order");
            return None;
        }

        let e = Scalar::from(U256::from_be_slice(hash));
        let r_inv = Scalar::from(r).invert()?;
        let u1 = r_inv * (-e);
        let u2 = r_inv * Scalar::from(s);

        let public_key = GroupElement::sum_of_two_multiplies(
            &self.parameters.generator(),
            &u1,
            &nonce_point,
            &u2,
        );

        let public_key = PublicKey::from_group_element(&public_key);
        if public_key.is_none() {
            debug!("recovered the point at infinity");
        }

        public_key
    }
}

#[cfg(test)]
mod tests {
    use crypto_bigint::{Encoding, Random};
    use hex_literal::hex;
    use proptest::prelude::*;
    use rand_core::OsRng;
    use rstest::rstest;

    use super::*;
    use crate::{
        group::secp256k1::{HALF_ORDER, MODULUS, ORDER},
        hash::keccak256,
    };

    fn private_key_of_one() -> PrivateKey {
        let mut raw = [0u8; 32];
        raw[31] = 1;

        PrivateKey::new(&raw).unwrap()
    }

    fn random_private_key() -> PrivateKey {
        loop {
            let raw: [u8; 32] = U256::random(&mut OsRng).to_be_bytes();
            if let Ok(key) = PrivateKey::new(&raw) {
                return key;
            }
        }
    }

    #[rstest]
    #[case::hello(
        b"hello".as_slice(),
        hex!("e5ddc160e4c8f92de507c7db9b982d4f9b7197bfa421864aeadc586bc96b09ae"),
        hex!("0ba0c5b131650ae4994cff1839341d00f3735ef5abc62ac8fe2cf50f65208e2a"),
        27
    )]
    #[case::hi(
        b"hi".as_slice(),
        hex!("16d4518ccdac87baa3b64ac5ba95be55fb588a969541123eef03b8734129e878"),
        hex!("3ebe46b7d7d075288b2c576d5f5c730251f5f4c84ff2c79a65068fb68fdacb86"),
        28
    )]
    #[case::world(
        b"world".as_slice(),
        hex!("89fab68936500025095e081ffcb19d6441dcc374661805492f072aa46bdcc607"),
        hex!("462217d25caaace4a7315e4d0f3fe95c18434f1dec7f6ea13b3ef9f0fee29d33"),
        28
    )]
    fn signs_known_vectors(
        #[case] message: &[u8],
        #[case] r: [u8; 32],
        #[case] s: [u8; 32],
        #[case] v: u8,
    ) {
        let signer = Signer::mainnet();

        let signature = signer.sign_message(message, &private_key_of_one()).unwrap();

        assert_eq!(signature.message_hash(), &message_hash(message));
        assert_eq!(signature.r_bytes(), r);
        assert_eq!(signature.s_bytes(), s);
        assert_eq!(signature.v(), v);
    }

    #[test]
    fn recovers_generator_for_private_key_of_one() {
        let signer = Signer::mainnet();
        let key = private_key_of_one();

        let signature = signer.sign_message(b"hello", &key).unwrap();
        let recovered = signer.recover(&signature).unwrap().unwrap();

        assert_eq!(recovered, key.public_key());
        assert_eq!(
            recovered.as_bytes(),
            &hex!(
                "79be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798"
                "483ada7726a3c4655da4fbfc0e1108a8fd17b448a68554199c47d08ffb10d4b8"
            )
        );
    }

    #[test]
    fn signs_and_recovers_with_other_keys() {
        let signer = Signer::mainnet();
        let key = PrivateKey::new(&[0x11; 32]).unwrap();

        let signature = signer.sign_message(b"Hello", &key).unwrap();

        assert_eq!(
            signature.r_bytes(),
            hex!("1883da2b42577b7689a37c4babbeee275ff5fae5230b66c39ebb95498b3e86a1")
        );
        assert_eq!(
            signature.s_bytes(),
            hex!("1c5a8d13ed7591ec8f1a26b8fc428184093f1b7a8d00fde27fb2ee0e4e50abcd")
        );
        assert_eq!(signature.v(), 27);

        let recovered = signer.recover(&signature).unwrap().unwrap();
        assert_eq!(recovered, key.public_key());
        assert_eq!(
            recovered.address().as_bytes(),
            &hex!("19e7e376e7c213b7e7e7e46cc70a5dd086daff2a")
        );
    }

    #[rstest]
    #[case(
        hex!("13d6965f2a0f9306e96c65d799516d81e7a324ae9ce4f4dbe8acb8bb08bc18a5"),
        hex!("6789b81fd6f24b8b7c3313ffc873c44659b2ba2554efd0074613e9b03fc99c0c"),
        hex!("16ac6804d09d6c64eb2bf61db42907f7c4ee2b7c7c34998c42b7659c2fb33929")
    )]
    #[case(
        hex!("410f3bbc0fc384de5504aeddd523adff920c559e11c6bfc1ba98b5debb9af497"),
        hex!("6a5419f6f20d87cb4ff2589dd9a908003629fb54c0b004e5029c58abf888e200"),
        hex!("bff7e44c2273efdbfc7a3192c5d6d3f2871c6f59b69ad2cfac71e05ba3f89ef9")
    )]
    fn recovers_from_raw_parts(#[case] r: [u8; 32], #[case] s: [u8; 32], #[case] hash: [u8; 32]) {
        let signer = Signer::mainnet();

        let recovered = signer
            .recover_from_parts(0, &hash, &U256::from_be_bytes(r), &U256::from_be_bytes(s))
            .unwrap()
            .unwrap();

        assert_eq!(
            recovered.as_bytes(),
            &hex!(
                "f117f07ef53a4c90e1d6573c62ceeb5caebeb94c68ecd5d4c088f1e2395ed443"
                "8193b2b00c56fa62494f5bfb180c437ff301d8eb6993034bf0d8bc4a0a93bf0d"
            )
        );
    }

    #[test]
    fn exactly_one_recovery_id_recovers_the_signer() {
        let signer = Signer::mainnet();
        let key = random_private_key();

        let signature = signer.sign_message(b"recovery", &key).unwrap();
        let other_v = if signature.v() == 27 { 28 } else { 27 };
        let other = Signature::new(
            *signature.message_hash(),
            other_v,
            *signature.r(),
            *signature.s(),
        )
        .unwrap();

        assert_eq!(signer.recover(&signature).unwrap(), Some(key.public_key()));
        assert_ne!(signer.recover(&other).unwrap(), Some(key.public_key()));
    }

    #[rstest]
    #[case(0)]
    #[case(26)]
    #[case(29)]
    #[case(35)]
    fn recovery_rejects_invalid_v(#[case] v: u8) {
        let signer = Signer::mainnet();
        let signature = signer
            .sign_message(b"hello", &private_key_of_one())
            .unwrap();
        let signature = Signature::new(
            *signature.message_hash(),
            v,
            *signature.r(),
            *signature.s(),
        )
        .unwrap();

        assert!(matches!(
            signer.recover(&signature),
            Err(Error::InvalidRecoveryId(_))
        ));
    }

    #[test]
    fn raw_recovery_rejects_ids_above_three() {
        let signer = Signer::mainnet();

        assert_eq!(
            signer.recover_from_parts(4, &[1; 32], &U256::ONE, &U256::ONE),
            Err(Error::InvalidRecoveryId(4))
        );
    }

    #[rstest]
    #[case(2)]
    #[case(3)]
    fn recovery_misses_when_x_reaches_field_prime(#[case] rec_id: u8) {
        let signer = Signer::mainnet();
        // r + N = Q
        let r = MODULUS.wrapping_sub(&signer.parameters().order());

        assert_eq!(
            signer.recover_from_parts(rec_id, &[1; 32], &r, &U256::ONE),
            Ok(None)
        );
        assert_eq!(
            signer.recover_from_parts(
                rec_id,
                &[1; 32],
                &signer.parameters().order().wrapping_sub(&U256::ONE),
                &U256::ONE
            ),
            Ok(None)
        );
    }

    #[rstest]
    #[case(
        2,
        hex!(
            "871e685bdad5d9bfde585f470926358caeaabdfaea8c8b1342c2e153ca897f22"
            "fe604c7f48de50011ccb3a1dc8aac67fae7803c82783a1fb5038c9d0816e6641"
        )
    )]
    #[case(
        3,
        hex!(
            "807fd3fd4744663fdf3f9e81eb9f5336d95d9955dc741cbc006c713c770852bd"
            "5b5dab7f8d679a7609b7907cdec961451cf56ecc5f748fabf28c1db7a109313a"
        )
    )]
    fn recovery_uses_r_plus_order_for_high_ids(#[case] rec_id: u8, #[case] expected: [u8; 64]) {
        let signer = Signer::mainnet();

        // x = 2 + N is below Q and lies on the curve.
        let recovered = signer
            .recover_from_parts(rec_id, &[1; 32], &U256::from_u8(2), &U256::ONE)
            .unwrap()
            .unwrap();

        assert_eq!(recovered.as_bytes(), &expected);
    }

    #[rstest]
    #[case(5)]
    #[case(7)]
    #[case(9)]
    fn recovery_misses_when_x_has_no_square_root(#[case] r: u64) {
        let signer = Signer::mainnet();

        for v in [27, 28] {
            let signature =
                Signature::new([1; 32], v, U256::from_u64(r), U256::from_u64(12345)).unwrap();

            assert_eq!(signer.recover(&signature), Ok(None));
        }
    }

    #[test]
    fn recovery_misses_for_out_of_range_components() {
        let signer = Signer::mainnet();
        let order = signer.parameters().order();

        assert_eq!(
            signer.recover_from_parts(0, &[1; 32], &U256::ZERO, &U256::ONE),
            Ok(None)
        );
        assert_eq!(
            signer.recover_from_parts(0, &[1; 32], &U256::ONE, &order),
            Ok(None)
        );
    }

    #[test]
    fn hash_signing_uses_digest_verbatim() {
        let signer = Signer::mainnet();
        let key = random_private_key();
        let hash = keccak256(b"a raw transaction payload");

        let signature = signer
            .sign_hash(&hash, &key, SignatureKind::Base)
            .unwrap();

        assert_eq!(signature.message_hash(), &hash);
        assert_eq!(
            signer.recover_from_parts(
                signature.recovery_id().unwrap().to_byte(),
                &hash,
                signature.r(),
                signature.s()
            ),
            Ok(Some(key.public_key()))
        );
    }

    #[test]
    fn recovery_id_search_fails_for_a_foreign_public_key() {
        let signer = Signer::mainnet();
        let key = random_private_key();
        let hash = message_hash(b"hello");

        let signature = signer
            .sign_hash(&hash, &key, SignatureKind::Base)
            .unwrap();
        let foreign_public_key = PrivateKey::new(&[0x22; 32]).unwrap().public_key();

        assert_eq!(
            signer.recovery_id(&hash, signature.r(), signature.s(), &foreign_public_key),
            Err(Error::RecoveryIdNotFound)
        );
    }

    #[rstest]
    #[case::one(U256::ONE, U256::ONE)]
    #[case::half_order(HALF_ORDER, HALF_ORDER)]
    #[case::above_half_order(HALF_ORDER.wrapping_add(&U256::ONE), HALF_ORDER)]
    #[case::order_minus_one(ORDER.wrapping_sub(&U256::ONE), U256::ONE)]
    fn normalizes_s_to_lower_half(#[case] s: U256, #[case] expected: U256) {
        assert_eq!(Signer::mainnet().normalize_s(&s), expected);
    }

    #[test]
    fn high_s_form_recovers_with_flipped_recovery_id() {
        let signer = Signer::mainnet();
        let key = random_private_key();

        let signature = signer.sign_message(b"malleable", &key).unwrap();
        let high_s = ORDER.wrapping_sub(signature.s());
        let flipped_rec_id = signature.recovery_id().unwrap().to_byte() ^ 1;

        assert_eq!(signer.normalize_s(&high_s), *signature.s());
        assert_eq!(
            signer.recover_from_parts(
                flipped_rec_id,
                signature.message_hash(),
                signature.r(),
                &high_s
            ),
            Ok(Some(key.public_key()))
        );
    }

    #[test]
    fn signer_carries_chain_id_and_parameters() {
        let signer = Signer::new(5, secp256k1::PublicParameters::default());

        assert_eq!(signer.chain_id(), 5);
        assert_eq!(Signer::default().chain_id(), MAINNET_CHAIN_ID);
        assert_eq!(signer.parameters(), Signer::mainnet().parameters());
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        #[test]
        fn signatures_round_trip(
            raw in any::<[u8; 32]>(),
            message in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let Ok(key) = PrivateKey::new(&raw) else {
                return Ok(());
            };
            let signer = Signer::mainnet();

            let signature = signer.sign_message(&message, &key).unwrap();

            prop_assert_eq!(signer.recover(&signature).unwrap(), Some(key.public_key()));
        }

        #[test]
        fn signatures_are_low_s(
            raw in any::<[u8; 32]>(),
            message in proptest::collection::vec(any::<u8>(), 0..256),
        ) {
            let Ok(key) = PrivateKey::new(&raw) else {
                return Ok(());
            };
            let signer = Signer::mainnet();

            let signature = signer.sign_message(&message, &key).unwrap();

            prop_assert!(signature.s() <= &signer.parameters().half_order());
            prop_assert!(signature.v() == 27 || signature.v() == 28);
        }

        #[test]
        fn signing_is_deterministic(
            raw in any::<[u8; 32]>(),
            message in proptest::collection::vec(any::<u8>(), 0..64),
        ) {
            let Ok(key) = PrivateKey::new(&raw) else {
                return Ok(());
            };
            let signer = Signer::mainnet();

            prop_assert_eq!(
                signer.sign_message(&message, &key).unwrap(),
                signer.sign_message(&message, &key).unwrap()
            );
        }
    }
}

#[cfg(feature = "benchmarking")]
mod benches {
    use criterion::{black_box, Criterion};

    use super::*;

    pub fn benchmark(c: &mut Criterion) {
        let signer = Signer::mainnet();
        let key = PrivateKey::new(&[0x11; 32]).unwrap();

        let mut g = c.benchmark_group("eth-ecrecover");

        for message_len in [5, 100, 1000] {
            let message = vec![0x61; message_len];

            g.bench_function(format!("sign_message() over {message_len} bytes"), |bench| {
                bench.iter(|| signer.sign_message(black_box(&message), &key))
            });

            let signature = signer.sign_message(&message, &key).unwrap();
            g.bench_function(format!("recover() over {message_len} bytes"), |bench| {
                bench.iter(|| signer.recover(black_box(&signature)))
            });
        }

        g.bench_function("public_key()", |bench| {
            bench.iter(|| black_box(&key).public_key())
        });

        g.finish();
    }
}
