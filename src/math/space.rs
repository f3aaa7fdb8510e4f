use nalgebra::{Matrix2, Vector2};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::str::FromStr;
use thiserror::Error;

/// Exact rational number used for every coordinate, coefficient and matrix entry
pub type Rational = BigRational;

/// A point (or direction) in 2D real space
pub type Point = Vector2<Rational>;

/// 2 by 2 rational matrix. Used to represent linear maps between reference and real space
pub type M2 = Matrix2<Rational>;

/// The two canonical shapes onto which every physical element is mapped
///
/// ```text
///   Triangle            Square
///
///   (0,1)               (-1,1) ------ (1,1)
///     | \                  |             |
///     |   \                |             |
///   (0,0)--(1,0)        (-1,-1) ----- (1,-1)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReferenceShape {
    Triangle,
    Square,
}

impl ReferenceShape {
    pub const ALL: [ReferenceShape; 2] = [ReferenceShape::Triangle, ReferenceShape::Square];

    /// Number of vertices (and sides) of the reference shape
    pub fn num_nodes(&self) -> usize {
        match self {
            Self::Triangle => 3,
            Self::Square => 4,
        }
    }

    pub fn area(&self) -> Rational {
        match self {
            Self::Triangle => frac(1, 2),
            Self::Square => int(4),
        }
    }

    /// Membership test on the closed reference shape for a point in local coordinates
    pub fn contains(&self, local: &Point) -> bool {
        let (x, y) = (&local[0], &local[1]);
        match self {
            Self::Triangle => !x.is_negative() && !y.is_negative() && x + y <= Rational::one(),
            Self::Square => x.abs() <= Rational::one() && y.abs() <= Rational::one(),
        }
    }
}

/// Failure to interpret a string as an exact rational literal such as `-3/2`
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RationalParseError {
    #[error("'{0}' is not a rational literal")]
    Malformed(String),
    #[error("'{0}' has a zero denominator")]
    ZeroDenominator(String),
}

/// Parse a rational literal of the form `[+-]n` or `[+-]n/d`
pub fn parse_rational(literal: &str) -> Result<Rational, RationalParseError> {
    let trimmed = literal.trim();
    let (num, den) = match trimmed.split_once('/') {
        Some((n, d)) => (n, Some(d)),
        None => (trimmed, None),
    };

    let parse_int = |s: &str| {
        if s.is_empty() || s.contains(char::is_whitespace) {
            return Err(RationalParseError::Malformed(trimmed.to_string()));
        }
        BigInt::from_str(s).map_err(|_| RationalParseError::Malformed(trimmed.to_string()))
    };

    let numer = parse_int(num)?;
    let denom = match den {
        Some(d) => parse_int(d)?,
        None => BigInt::one(),
    };

    if denom.is_zero() {
        Err(RationalParseError::ZeroDenominator(trimmed.to_string()))
    } else {
        Ok(Rational::new(numer, denom))
    }
}

pub fn int(n: i64) -> Rational {
    Rational::from_integer(BigInt::from(n))
}

pub fn frac(numer: i64, denom: i64) -> Rational {
    Rational::new(BigInt::from(numer), BigInt::from(denom))
}

pub fn point(x: Rational, y: Rational) -> Point {
    Point::new(x, y)
}

/// Matrix with the two given vectors as its columns
pub fn from_columns(c0: &Point, c1: &Point) -> M2 {
    M2::new(c0[0].clone(), c1[0].clone(), c0[1].clone(), c1[1].clone())
}

pub fn det(m: &M2) -> Rational {
    &m[(0, 0)] * &m[(1, 1)] - &m[(0, 1)] * &m[(1, 0)]
}

/// Exact inverse of a 2 by 2 matrix. Returns `None` for singular matrices
pub fn inverse(m: &M2) -> Option<M2> {
    let d = det(m);
    if d.is_zero() {
        return None;
    }
    Some(M2::new(
        &m[(1, 1)] / &d,
        -(&m[(0, 1)] / &d),
        -(&m[(1, 0)] / &d),
        &m[(0, 0)] / &d,
    ))
}

/// z-component of the 3D cross product of two planar vectors
pub fn cross(a: &Point, b: &Point) -> Rational {
    &a[0] * &b[1] - &a[1] * &b[0]
}

pub fn scale(v: &Point, s: &Rational) -> Point {
    v.map(|c| c * s)
}

pub fn squared_norm(v: &Point) -> Rational {
    &v[0] * &v[0] + &v[1] * &v[1]
}

/// Square root of a non-negative rational.
///
/// Exact when both the numerator and denominator are perfect squares; otherwise the nearest
/// `f64` square root, converted exactly into a rational.
pub fn sqrt(r: &Rational) -> Rational {
    assert!(
        !r.is_negative(),
        "Cannot take the square root of negative rational {}!",
        r
    );

    let (n_root, d_root) = (r.numer().sqrt(), r.denom().sqrt());
    if &n_root * &n_root == *r.numer() && &d_root * &d_root == *r.denom() {
        return Rational::new(n_root, d_root);
    }

    r.to_f64()
        .and_then(|approx| Rational::from_float(approx.sqrt()))
        .unwrap_or_else(|| panic!("Rational {} is not representable as an f64!", r))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rational_literals() {
        assert_eq!(parse_rational("3/2").unwrap(), frac(3, 2));
        assert_eq!(parse_rational("-1/3").unwrap(), frac(-1, 3));
        assert_eq!(parse_rational(" 10 ").unwrap(), int(10));
        assert_eq!(parse_rational("4/2").unwrap(), int(2));
        assert!(matches!(
            parse_rational("1/0"),
            Err(RationalParseError::ZeroDenominator(_))
        ));
        assert!(parse_rational("1.5").is_err());
        assert!(parse_rational("x").is_err());
        assert!(parse_rational("").is_err());
        assert!(parse_rational("1/").is_err());
    }

    #[test]
    fn matrix_inverse_and_determinant() {
        let a = from_columns(&point(int(1), frac(4, 3)), &point(int(-1), int(1)));
        assert_eq!(det(&a), frac(7, 3));

        let a_inv = inverse(&a).unwrap();
        let identity = &a * &a_inv;
        assert_eq!(identity, M2::new(int(1), int(0), int(0), int(1)));

        let singular = M2::new(int(1), int(2), int(2), int(4));
        assert!(inverse(&singular).is_none());
    }

    #[test]
    fn reference_membership() {
        let tri = ReferenceShape::Triangle;
        let sq = ReferenceShape::Square;

        assert!(tri.contains(&point(int(0), int(0))));
        assert!(tri.contains(&point(frac(1, 2), frac(1, 2))));
        assert!(!tri.contains(&point(frac(1, 2), frac(2, 3))));
        assert!(!tri.contains(&point(int(-1), int(0))));

        assert!(sq.contains(&point(int(-1), int(1))));
        assert!(!sq.contains(&point(frac(9, 4), int(0))));
    }

    #[test]
    fn square_roots() {
        assert_eq!(sqrt(&frac(9, 4)), frac(3, 2));
        assert_eq!(sqrt(&int(0)), int(0));

        let approx = sqrt(&int(2)).to_f64().unwrap();
        assert!((approx - std::f64::consts::SQRT_2).abs() < 1e-15);
    }

    #[test]
    #[should_panic]
    fn negative_square_root() {
        sqrt(&int(-1));
    }
}
