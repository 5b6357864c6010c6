// Author: dWallet Labs, LTD.
// SPDX-License-Identifier: Apache-2.0

use std::ops::{Add, Mul, Neg};

use crypto_bigint::{Encoding, U256};
use k256::{
    elliptic_curve::{
        ops::{LinearCombination, MulByGenerator},
        sec1::{FromEncodedPoint, ToEncodedPoint},
        Group,
    },
    AffinePoint, EncodedPoint, FieldBytes, ProjectivePoint,
};
use serde::{Deserialize, Serialize};
use subtle::{Choice, ConstantTimeEq};

use crate::group::{secp256k1::scalar::Scalar, Error, Result};

/// The size of an uncompressed point encoding once its leading `0x04` tag is stripped.
pub const UNCOMPRESSED_COORDINATES_SIZE: usize = 64;

/// An element of the secp256k1 prime group.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub struct GroupElement(ProjectivePoint);

/// The value of the secp256k1 group used for serialization.
///
/// This is a `newtype` around `AffinePoint`: deserialization goes through `AffinePoint`'s
/// deserialization, which assures the point is on curve.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Serialize, Deserialize)]
pub struct Value(AffinePoint);

impl From<AffinePoint> for Value {
    fn from(value: AffinePoint) -> Self {
        Self(value)
    }
}

impl ConstantTimeEq for Value {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl GroupElement {
    pub fn new(value: Value) -> Self {
        Self(ProjectivePoint::from(value.0))
    }

    pub fn value(&self) -> Value {
        Value(self.0.to_affine())
    }

    pub fn generator() -> Self {
        Self(ProjectivePoint::GENERATOR)
    }

    /// Returns the additive identity, the point at infinity.
    pub fn neutral() -> Self {
        Self(ProjectivePoint::IDENTITY)
    }

    /// Determines if this point is the point at infinity in constant-time.
    pub fn is_neutral(&self) -> Choice {
        self.0.is_identity()
    }

    /// Constant-time multiplication of the generator.
    pub fn mul_by_generator(scalar: &Scalar) -> Self {
        Self(ProjectivePoint::mul_by_generator(&scalar.0))
    }

    /// Computes `a * k + b * l` as a single interleaved double-scalar multiplication.
    pub fn sum_of_two_multiplies(a: &Self, k: &Scalar, b: &Self, l: &Scalar) -> Self {
        Self(ProjectivePoint::lincomb(&a.0, &k.0, &b.0, &l.0))
    }

    /// Multiplies this point by the group order `N`.
    ///
    /// Scalars are reduced modulo `N`, so `N` itself cannot be represented as a `Scalar`; the
    /// product is instead computed as `(N - 1) * P + P`. The result is the point at infinity
    /// exactly when the order of `P` divides `N`.
    pub fn mul_by_order(&self) -> Self {
        Self(self.0 * (-k256::Scalar::ONE) + self.0)
    }

    /// Instantiates a point from its affine coordinates, verifying it lies on the curve.
    pub fn from_affine_coordinates(x: &U256, y: &U256) -> Result<Self> {
        let encoded_point = EncodedPoint::from_affine_coordinates(
            &FieldBytes::from(x.to_be_bytes()),
            &FieldBytes::from(y.to_be_bytes()),
            false,
        );

        Option::<AffinePoint>::from(AffinePoint::from_encoded_point(&encoded_point))
            .map(|point| Self(ProjectivePoint::from(point)))
            .ok_or(Error::InvalidGroupElement)
    }

    /// Decodes the Ethereum form of a point: `x || y`, 32 bytes each, big-endian, without the
    /// SEC1 tag byte.
    pub fn from_uncompressed_bytes(bytes: &[u8; UNCOMPRESSED_COORDINATES_SIZE]) -> Result<Self> {
        let x = U256::from_be_slice(&bytes[..32]);
        let y = U256::from_be_slice(&bytes[32..]);

        Self::from_affine_coordinates(&x, &y)
    }

    /// Encodes this point as `x || y` without the SEC1 tag byte.
    ///
    /// Returns `None` for the point at infinity, which has no affine coordinates.
    pub fn to_uncompressed_bytes(&self) -> Option<[u8; UNCOMPRESSED_COORDINATES_SIZE]> {
        if bool::from(self.is_neutral()) {
            return None;
        }

        let encoded_point = self.0.to_affine().to_encoded_point(false);
        let tagged = encoded_point.as_bytes();

        let mut bytes = [0u8; UNCOMPRESSED_COORDINATES_SIZE];
        bytes.copy_from_slice(&tagged[1..]);

        Some(bytes)
    }
}

impl ConstantTimeEq for GroupElement {
    fn ct_eq(&self, other: &Self) -> Choice {
        self.0.ct_eq(&other.0)
    }
}

impl Neg for GroupElement {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Self(self.0.neg())
    }
}

impl Add<Self> for GroupElement {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0.add(rhs.0))
    }
}

impl<'r> Add<&'r Self> for GroupElement {
    type Output = Self;

    fn add(self, rhs: &'r Self) -> Self::Output {
        Self(self.0.add(rhs.0))
    }
}

impl Mul<Scalar> for GroupElement {
    type Output = Self;

    fn mul(self, rhs: Scalar) -> Self::Output {
        Self(self.0.mul(rhs.0))
    }
}

impl<'r> Mul<&'r Scalar> for &'r GroupElement {
    type Output = GroupElement;

    fn mul(self, rhs: &'r Scalar) -> Self::Output {
        GroupElement(self.0.mul(rhs.0))
    }
}
