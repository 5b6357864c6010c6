// Author: dWallet Labs, LTD.
// SPDX-License-Identifier: Apache-2.0

//! Ethereum-style ECDSA over secp256k1: EIP-191 message signing with deterministic nonces and
//! low-s normalization, and `ecrecover` public-key recovery.

pub mod group;
pub mod hash;
pub mod key;
pub mod sign;
pub mod signature;

pub use key::{Address, PrivateKey, PublicKey};
pub use sign::Signer;
pub use signature::{RecoveryId, Signature, SignatureKind};

/// An error in signing, recovery, or key instantiation.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error("invalid private key length: expected 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("invalid private key: the scalar must be nonzero and below the group order")]
    InvalidPrivateKey,
    #[error("invalid public key length: expected 64 bytes, got {0}")]
    InvalidPublicKeyLength(usize),
    #[error("invalid recovery id or v value {0}")]
    InvalidRecoveryId(u8),
    #[error("invalid signature component: r and s must be nonzero and below the group order")]
    InvalidSignatureComponent,
    #[error("the ECDSA signer produced a zero signature component")]
    ZeroSignatureComponent,
    #[error("cannot find a recovery id that recovers the signer's public key")]
    RecoveryIdNotFound,
    #[error("ECDSA signing failed")]
    SigningFailed,
    #[error("group error")]
    Group(#[from] group::Error),
}

/// The Result of fallible operations of this crate.
pub type Result<T> = std::result::Result<T, Error>;
