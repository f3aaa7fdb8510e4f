use super::{Polynomial1D, Polynomial2D, Var};
use crate::math::space::{int, Rational, ReferenceShape};

use num_bigint::BigInt;
use num_traits::{One, Zero};

impl Polynomial1D {
    /// d/dt
    pub fn derivative(&self) -> Self {
        Self::from_terms(
            self.terms()
                .filter(|(d, _)| *d > 0)
                .map(|(d, c)| (d - 1, c * int(d as i64))),
        )
    }

    /// The antiderivative with a zero constant term
    pub fn antiderivative(&self) -> Self {
        Self::from_terms(
            self.terms()
                .map(|(d, c)| (d + 1, c / int(d as i64 + 1))),
        )
    }

    /// Exact definite integral over `[a, b]`
    pub fn integrate(&self, a: &Rational, b: &Rational) -> Rational {
        let anti = self.antiderivative();
        anti.evaluate(b) - anti.evaluate(a)
    }
}

impl Polynomial2D {
    /// Partial derivative with respect to `var`
    pub fn derivative(&self, var: Var) -> Self {
        let v = var.index();
        Self::from_terms(self.terms().filter(|(d, _)| d[v] > 0).map(|(d, c)| {
            let mut lowered = d;
            lowered[v] -= 1;
            (lowered, c * int(d[v] as i64))
        }))
    }

    /// Exact integral over a reference shape
    ///
    /// * Triangle: `x^a y^b` integrates to `a! b! / (a + b + 2)!`
    /// * Square `[-1, 1]^2`: `x^a y^b` integrates to `4 / ((a + 1)(b + 1))` when both `a` and `b` are even, else 0
    pub fn integrate_over_reference(&self, shape: ReferenceShape) -> Rational {
        self.terms()
            .map(|([a, b], c)| c * monomial_reference_integral(a, b, shape))
            .fold(Rational::zero(), |acc, term| acc + term)
    }
}

fn monomial_reference_integral(a: u32, b: u32, shape: ReferenceShape) -> Rational {
    match shape {
        ReferenceShape::Triangle => Rational::new(
            factorial(a) * factorial(b),
            factorial(a + b + 2),
        ),
        ReferenceShape::Square => {
            if a % 2 == 0 && b % 2 == 0 {
                Rational::new(BigInt::from(4), BigInt::from((a + 1) * (b + 1)))
            } else {
                Rational::zero()
            }
        }
    }
}

fn factorial(n: u32) -> BigInt {
    (1..=n).fold(BigInt::one(), |acc, k| acc * BigInt::from(k))
}
