// Author: dWallet Labs, LTD.
// SPDX-License-Identifier: Apache-2.0

use std::fmt;

use crypto_bigint::U256;
use k256::{ecdsa::SigningKey, FieldBytes};
use serde::{de, Deserialize, Deserializer, Serialize};

use crate::{
    group::secp256k1::{group_element::UNCOMPRESSED_COORDINATES_SIZE, GroupElement, Scalar, ORDER},
    hash::keccak256,
    Error, Result,
};

/// The size of a raw private key.
pub const PRIVATE_KEY_SIZE: usize = 32;
/// The size of an Ethereum public key: `x || y` without the SEC1 tag byte.
pub const PUBLIC_KEY_SIZE: usize = UNCOMPRESSED_COORDINATES_SIZE;
/// The size of an Ethereum address.
pub const ADDRESS_SIZE: usize = 20;

/// The SEC1 tag of an uncompressed point.
const UNCOMPRESSED_TAG: u8 = 0x04;

/// A secp256k1 private scalar `d`, with `0 < d < N`.
///
/// The secret is only ever handed out as an owned copy; there is no way to obtain a mutable view
/// of the stored key.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey {
    signing_key: SigningKey,
}

impl PrivateKey {
    /// Instantiates a private key from its 32-byte big-endian encoding.
    ///
    /// Fails with [`Error::InvalidKeyLength`] if `raw` is not exactly 32 bytes long, and with
    /// [`Error::InvalidPrivateKey`] if its value is zero or not below the group order.
    pub fn new(raw: &[u8]) -> Result<Self> {
        let raw: [u8; PRIVATE_KEY_SIZE] = raw
            .try_into()
            .map_err(|_| Error::InvalidKeyLength(raw.len()))?;

        let value = U256::from_be_slice(&raw);
        if value == U256::ZERO || value >= ORDER {
            return Err(Error::InvalidPrivateKey);
        }

        let signing_key =
            SigningKey::from_bytes(&FieldBytes::from(raw)).map_err(|_| Error::InvalidPrivateKey)?;

        Ok(Self { signing_key })
    }

    /// Returns a copy of the 32-byte big-endian encoding of this key.
    pub fn to_bytes(&self) -> [u8; PRIVATE_KEY_SIZE] {
        self.signing_key.to_bytes().into()
    }

    /// Derives the public key `d * G`.
    pub fn public_key(&self) -> PublicKey {
        let point = GroupElement::mul_by_generator(&self.scalar());

        // `d` is nonzero and below the (prime) group order, so `d * G` is never the point at
        // infinity.
        let bytes = point.to_uncompressed_bytes().unwrap_or_else(|| {
            unreachable!("a nonzero scalar multiple of the generator is never the identity")
        });

        PublicKey(bytes)
    }

    pub fn address(&self) -> Address {
        self.public_key().address()
    }

    pub(crate) fn scalar(&self) -> Scalar {
        Scalar::from(**self.signing_key.as_nonzero_scalar())
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl TryFrom<&[u8]> for PrivateKey {
    type Error = Error;

    fn try_from(value: &[u8]) -> Result<Self> {
        Self::new(value)
    }
}

impl fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrivateKey").finish_non_exhaustive()
    }
}

/// An Ethereum public key: the uncompressed point `x || y`, 32 bytes each, big-endian, without
/// the leading `0x04`.
///
/// Deserialization goes through [`PublicKey::from_bytes`], so it only yields points on the curve.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Serialize)]
pub struct PublicKey(#[serde(with = "hex_bytes")] [u8; PUBLIC_KEY_SIZE]);

impl PublicKey {
    /// Parses a 64-byte public key, verifying that it is a point on the curve.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = bytes
            .try_into()
            .map_err(|_| Error::InvalidPublicKeyLength(bytes.len()))?;

        GroupElement::from_uncompressed_bytes(&bytes)?;

        Ok(Self(bytes))
    }

    pub(crate) fn from_group_element(point: &GroupElement) -> Option<Self> {
        point.to_uncompressed_bytes().map(Self)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_SIZE] {
        &self.0
    }

    /// The SEC1 uncompressed encoding, `0x04 || x || y`.
    pub fn to_sec1_bytes(&self) -> [u8; PUBLIC_KEY_SIZE + 1] {
        let mut bytes = [UNCOMPRESSED_TAG; PUBLIC_KEY_SIZE + 1];
        bytes[1..].copy_from_slice(&self.0);

        bytes
    }

    /// The Ethereum address: the last 20 bytes of `keccak256(x || y)`.
    pub fn address(&self) -> Address {
        let hash = keccak256(&self.0);

        let mut address = [0u8; ADDRESS_SIZE];
        address.copy_from_slice(&hash[hash.len() - ADDRESS_SIZE..]);

        Address(address)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let bytes: [u8; PUBLIC_KEY_SIZE] = hex_bytes::deserialize(deserializer)?;

        Self::from_bytes(&bytes).map_err(de::Error::custom)
    }
}

impl AsRef<[u8]> for PublicKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({})", hex::encode(self.0))
    }
}

/// A 20-byte Ethereum account address.
#[derive(PartialEq, Eq, Clone, Copy, Hash, Debug, Serialize, Deserialize)]
pub struct Address([u8; ADDRESS_SIZE]);

impl Address {
    pub fn as_bytes(&self) -> &[u8; ADDRESS_SIZE] {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Serializes fixed-size byte arrays as hex strings, since `serde` only derives arrays of up to
/// 32 elements.
mod hex_bytes {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, const N: usize>(
        bytes: &[u8; N],
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>, const N: usize>(
        deserializer: D,
    ) -> Result<[u8; N], D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let mut bytes = [0u8; N];
        hex::decode_to_slice(encoded, &mut bytes).map_err(D::Error::custom)?;

        Ok(bytes)
    }
}
