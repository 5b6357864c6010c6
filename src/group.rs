// Author: dWallet Labs, LTD.
// SPDX-License-Identifier: Apache-2.0

pub mod secp256k1;

/// An error in group element instantiation or decoding.
#[derive(thiserror::Error, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    #[error(
        "invalid point compression: the x-coordinate has no corresponding point on the curve"
    )]
    InvalidPointCompression,
    #[error("invalid group element: the coordinates do not describe a point on the curve")]
    InvalidGroupElement,
    #[error("invalid public parameters: only the secp256k1 domain parameters are supported")]
    InvalidPublicParameters,
}

/// The Result of operations over group elements.
pub type Result<T> = std::result::Result<T, Error>;
