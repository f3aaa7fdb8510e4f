use super::space::{det, inverse, Point, Rational, M2};

use num_traits::{One, Zero};

/// An affine map `F(x) = A x + b` of the plane
///
/// Every element carries one of these from its reference shape onto itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AffineMap {
    a: M2,
    b: Point,
}

impl AffineMap {
    pub fn new(a: M2, b: Point) -> Self {
        Self { a, b }
    }

    pub fn identity() -> Self {
        Self {
            a: M2::new(Rational::one(), Rational::zero(), Rational::zero(), Rational::one()),
            b: Point::new(Rational::zero(), Rational::zero()),
        }
    }

    /// The linear part `A` (the Jacobian of the map)
    pub fn matrix(&self) -> &M2 {
        &self.a
    }

    /// The translation `b`
    pub fn translation(&self) -> &Point {
        &self.b
    }

    pub fn det(&self) -> Rational {
        det(&self.a)
    }

    pub fn apply(&self, x: &Point) -> Point {
        &self.a * x + &self.b
    }

    /// `F^-1(x) = A^-1 x - A^-1 b`
    ///
    /// Panics for a singular linear part
    pub fn inverse(&self) -> Self {
        let a_inv = inverse(&self.a)
            .unwrap_or_else(|| panic!("Cannot invert the singular affine map {:?}!", self));
        let b = -(&a_inv * &self.b);
        Self { a: a_inv, b }
    }

    /// `self ∘ inner`, i.e. `x -> self(inner(x))`
    pub fn compose(&self, inner: &AffineMap) -> Self {
        Self {
            a: &self.a * &inner.a,
            b: &self.a * &inner.b + &self.b,
        }
    }
}
