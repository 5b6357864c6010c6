// Author: dWallet Labs, LTD.
// SPDX-License-Identifier: Apache-2.0

use std::ops::{Mul, Neg};

use crypto_bigint::{NonZero, U256};
use k256::elliptic_curve::scalar::FromUintUnchecked;
use subtle::{Choice, ConstantTimeEq};

use crate::group::secp256k1::ORDER;

/// A Scalar of the prime field $\mathbb{Z}_N$, where `N` is the order of the secp256k1 group.
#[derive(PartialEq, Eq, Clone, Copy)]
#[cfg_attr(test, derive(Debug))]
pub struct Scalar(pub(super) k256::Scalar);

impl Scalar {
    pub const ZERO: Self = Self(k256::Scalar::ZERO);

    /// Computes the multiplicative inverse modulo `N`, or `None` for zero.
    pub fn invert(&self) -> Option<Self> {
        Option::from(self.0.invert()).map(Self)
    }

    pub fn is_zero(&self) -> Choice {
        self.0.is_zero()
    }
}

impl ConstantTimeEq for Scalar {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl From<k256::Scalar> for Scalar {
    fn from(value: k256::Scalar) -> Self {
        Self(value)
    }
}

impl From<U256> for Scalar {
    fn from(value: U256) -> Self {
        // A `U256` might be bigger than the group order, so we must first reduce it to get a valid
        // element.
        let order = NonZero::new(ORDER).unwrap();

        Self(k256::Scalar::from_uint_unchecked(value.rem(&order)))
    }
}

impl From<&U256> for Scalar {
    fn from(value: &U256) -> Self {
        Self::from(*value)
    }
}

impl From<Scalar> for U256 {
    fn from(value: Scalar) -> Self {
        value.0.into()
    }
}

impl Neg for Scalar {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0.neg())
    }
}

impl Mul<Self> for Scalar {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        Self(self.0.mul(rhs.0))
    }
}

impl<'r> Mul<&'r Self> for Scalar {
    type Output = Self;

    fn mul(self, rhs: &'r Self) -> Self::Output {
        Self(self.0.mul(&rhs.0))
    }
}
