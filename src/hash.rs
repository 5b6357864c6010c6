// Author: dWallet Labs, LTD.
// SPDX-License-Identifier: Apache-2.0

//! Keccak-256 and the EIP-191 "personal message" digest.

use sha3::{Digest, Keccak256};

/// The size of a Keccak-256 digest.
pub const HASH_SIZE: usize = 32;

/// The EIP-191 version byte for personal messages.
pub const EIP191_VERSION_BYTE: u8 = 0x19;

/// The header that follows the version byte, before the decimal message length.
pub const EIP191_MESSAGE_HEADER: &[u8] = b"Ethereum Signed Message:\n";

pub fn keccak256(data: &[u8]) -> [u8; HASH_SIZE] {
    Keccak256::digest(data).into()
}

/// Computes the EIP-191 digest of `message`:
/// `keccak256(0x19 || "Ethereum Signed Message:\n" || len(message) || message)`, where the length
/// is written in decimal ASCII.
pub fn message_hash(message: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Keccak256::new();
    hasher.update([EIP191_VERSION_BYTE]);
    hasher.update(EIP191_MESSAGE_HEADER);
    hasher.update(message.len().to_string().as_bytes());
    hasher.update(message);

    hasher.finalize().into()
}
