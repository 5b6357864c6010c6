// Author: dWallet Labs, LTD.
// SPDX-License-Identifier: Apache-2.0

pub mod group_element;
pub mod scalar;

use crypto_bigint::{Encoding, U256};
pub use group_element::GroupElement;
use k256::{elliptic_curve::Curve, AffinePoint, FieldBytes, FieldElement, Secp256k1};
use serde::{Deserialize, Serialize};
pub use scalar::Scalar;

use crate::group::{Error, Result};

/// The order `N` of the secp256k1 group
pub const ORDER: U256 = <Secp256k1 as Curve>::ORDER;
/// `floor(N / 2)`, the largest `s` accepted in low-s (non-malleable) form
pub const HALF_ORDER: U256 = ORDER.shr_vartime(1);
/// The modulus `Q` of the secp256k1 base field
pub const MODULUS: U256 =
    U256::from_be_hex("fffffffffffffffffffffffffffffffffffffffffffffffffffffffefffffc2f");

/// Any Weierstrass elliptic curve can be represented as an equation in the following template: $y^2
/// = x^3 + ax + b mod(p)$. For secp256k1 specifically, $a = 0$ and $b = 7$, yielding the equation
/// $y^2 = x^3 + 7 mod(p)$.
pub const CURVE_EQUATION_A: U256 = U256::ZERO;
pub const CURVE_EQUATION_B: U256 =
    U256::from_be_hex("0000000000000000000000000000000000000000000000000000000000000007");

/// The public parameters of the secp256k1 group.
///
/// Constructed once (usually through [`Default`], or deserialized from a configuration document)
/// and shared read-only by every signer and verifier. Deserialization only accepts the secp256k1
/// domain parameters, as the underlying field and scalar arithmetic is fixed to that curve.
#[derive(PartialEq, Eq, Clone, Debug, Serialize, Deserialize)]
#[serde(try_from = "UncheckedPublicParameters")]
pub struct PublicParameters {
    name: String,
    order: U256,
    modulus: U256,
    generator: group_element::Value,
    curve_equation_a: U256,
    curve_equation_b: U256,
}

/// The deserialized form of [`PublicParameters`], before it is checked against secp256k1.
#[derive(Deserialize)]
struct UncheckedPublicParameters {
    name: String,
    order: U256,
    modulus: U256,
    generator: group_element::Value,
    curve_equation_a: U256,
    curve_equation_b: U256,
}

impl TryFrom<UncheckedPublicParameters> for PublicParameters {
    type Error = Error;

    fn try_from(value: UncheckedPublicParameters) -> Result<Self> {
        let parameters = Self {
            name: value.name,
            order: value.order,
            modulus: value.modulus,
            generator: value.generator,
            curve_equation_a: value.curve_equation_a,
            curve_equation_b: value.curve_equation_b,
        };

        let secp256k1 = Self::default();
        if parameters.order != secp256k1.order
            || parameters.modulus != secp256k1.modulus
            || parameters.generator != secp256k1.generator
            || parameters.curve_equation_a != secp256k1.curve_equation_a
            || parameters.curve_equation_b != secp256k1.curve_equation_b
        {
            return Err(Error::InvalidPublicParameters);
        }

        Ok(parameters)
    }
}

impl Default for PublicParameters {
    fn default() -> Self {
        Self {
            name: "Secp256k1".to_string(),
            order: ORDER,
            modulus: MODULUS,
            generator: group_element::Value::from(AffinePoint::GENERATOR),
            curve_equation_a: CURVE_EQUATION_A,
            curve_equation_b: CURVE_EQUATION_B,
        }
    }
}

impl PublicParameters {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The group order `N`.
    pub fn order(&self) -> U256 {
        self.order
    }

    /// `floor(N / 2)`.
    pub fn half_order(&self) -> U256 {
        self.order.shr_vartime(1)
    }

    /// The field prime `Q`.
    pub fn modulus(&self) -> U256 {
        self.modulus
    }

    pub fn generator(&self) -> GroupElement {
        GroupElement::new(self.generator)
    }

    pub fn curve_equation_a(&self) -> U256 {
        self.curve_equation_a
    }

    pub fn curve_equation_b(&self) -> U256 {
        self.curve_equation_b
    }

    /// Decompresses an x-coordinate into the curve point whose y-coordinate has parity
    /// `y_is_odd`.
    ///
    /// Computes $\alpha = x(x^2 + a) + b$ and takes its square root $\beta$ modulo `Q`; the point
    /// is $(x, \beta)$ when the parity of $\beta$ matches, and $(x, Q - \beta)$ otherwise.
    pub fn decompress(&self, x: &U256, y_is_odd: bool) -> Result<GroupElement> {
        let x_element = self
            .field_element(x)
            .ok_or(Error::InvalidPointCompression)?;
        let a = self
            .field_element(&self.curve_equation_a)
            .ok_or(Error::InvalidGroupElement)?;
        let b = self
            .field_element(&self.curve_equation_b)
            .ok_or(Error::InvalidGroupElement)?;

        let alpha = (x_element * (x_element.square() + a) + b).normalize();
        let beta: FieldElement = Option::from(alpha.sqrt()).ok_or(Error::InvalidPointCompression)?;
        let beta = beta.normalize();

        let beta_value = U256::from_be_slice(&beta.to_bytes());
        let y = if bool::from(beta.is_odd()) == y_is_odd {
            beta_value
        } else if beta_value == U256::ZERO {
            // Zero is its own negation, so no odd root exists.
            return Err(Error::InvalidPointCompression);
        } else {
            self.modulus.wrapping_sub(&beta_value)
        };

        GroupElement::from_affine_coordinates(x, &y)
    }

    /// Lifts `value` into the base field, or `None` if it is not below `Q`.
    fn field_element(&self, value: &U256) -> Option<FieldElement> {
        if value >= &self.modulus {
            return None;
        }

        FieldElement::from_bytes(&FieldBytes::from(value.to_be_bytes())).into()
    }
}
