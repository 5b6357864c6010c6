// Author: dWallet Labs, LTD.
// SPDX-License-Identifier: Apache-2.0

use crypto_bigint::{Encoding, U256};
use serde::{Deserialize, Serialize};

use crate::{group::secp256k1::ORDER, hash::HASH_SIZE, Error, Result};

/// The offset added to the recovery id to form `v` in the base Ethereum scheme.
pub const V_OFFSET: u8 = 27;

/// Identifies which of the (at most four) curve points sharing the x-coordinate `r mod N` was the
/// signing nonce point.
///
/// Bit 0 is the parity of the point's y-coordinate. Bit 1 is set when its x-coordinate is
/// `r + N` rather than `r`, which only happens when the nonce point's x-coordinate overflowed the
/// group order.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecoveryId(u8);

impl RecoveryId {
    pub const MAX: u8 = 3;

    pub const fn new(is_y_odd: bool, is_x_reduced: bool) -> Self {
        Self(((is_x_reduced as u8) << 1) | (is_y_odd as u8))
    }

    /// Parses a raw recovery id in `0..=3`.
    pub fn from_byte(byte: u8) -> Result<Self> {
        if byte > Self::MAX {
            return Err(Error::InvalidRecoveryId(byte));
        }

        Ok(Self(byte))
    }

    /// Parses an Ethereum `v` value, which is 27 or 28 in the base scheme.
    ///
    /// Fails with [`Error::InvalidRecoveryId`] carrying the rejected `v` as is.
    pub fn from_v(v: u8) -> Result<Self> {
        match v.checked_sub(V_OFFSET) {
            Some(rec_id @ 0..=1) => Ok(Self(rec_id)),
            _ => Err(Error::InvalidRecoveryId(v)),
        }
    }

    pub fn is_y_odd(&self) -> bool {
        self.0 & 1 == 1
    }

    pub fn is_x_reduced(&self) -> bool {
        self.0 & 2 == 2
    }

    pub fn to_byte(self) -> u8 {
        self.0
    }
}

/// The kind of signature to produce, which determines how `v` is encoded.
#[non_exhaustive]
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub enum SignatureKind {
    /// `v = 27 + recovery id`, as used by EIP-191 personal messages and pre-EIP-155 transactions.
    #[default]
    Base,
}

/// An Ethereum ECDSA signature over a 32-byte message hash.
///
/// Deserialization goes through [`Signature::new`], so `r` and `s` are always in range.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "UncheckedSignature")]
pub struct Signature {
    message_hash: [u8; HASH_SIZE],
    v: u8,
    r: U256,
    s: U256,
}

#[derive(Deserialize)]
struct UncheckedSignature {
    message_hash: [u8; HASH_SIZE],
    v: u8,
    r: U256,
    s: U256,
}

impl TryFrom<UncheckedSignature> for Signature {
    type Error = Error;

    fn try_from(value: UncheckedSignature) -> Result<Self> {
        Self::new(value.message_hash, value.v, value.r, value.s)
    }
}

impl Signature {
    /// Instantiates a signature, checking that `r` and `s` lie in `[1, N - 1]`.
    ///
    /// `v` is not validated here: recovery rejects ids that are not 27 or 28.
    pub fn new(message_hash: [u8; HASH_SIZE], v: u8, r: U256, s: U256) -> Result<Self> {
        if !is_in_scalar_range(&r) || !is_in_scalar_range(&s) {
            return Err(Error::InvalidSignatureComponent);
        }

        Ok(Self {
            message_hash,
            v,
            r,
            s,
        })
    }

    /// The 32-byte digest that was signed.
    pub fn message_hash(&self) -> &[u8; HASH_SIZE] {
        &self.message_hash
    }

    pub fn v(&self) -> u8 {
        self.v
    }

    pub fn r(&self) -> &U256 {
        &self.r
    }

    pub fn s(&self) -> &U256 {
        &self.s
    }

    /// `r` as 32 big-endian bytes.
    pub fn r_bytes(&self) -> [u8; 32] {
        self.r.to_be_bytes()
    }

    /// `s` as 32 big-endian bytes.
    pub fn s_bytes(&self) -> [u8; 32] {
        self.s.to_be_bytes()
    }

    /// The recovery id encoded in `v`.
    pub fn recovery_id(&self) -> Result<RecoveryId> {
        RecoveryId::from_v(self.v)
    }

    pub fn kind(&self) -> SignatureKind {
        SignatureKind::Base
    }
}

/// Whether `value` lies in `[1, N - 1]`.
pub(crate) fn is_in_scalar_range(value: &U256) -> bool {
    value != &U256::ZERO && value < &ORDER
}
