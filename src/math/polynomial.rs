/// Differentiation and exact integration over reference shapes
pub mod calculus;
/// Substitution of polynomials (and affine maps) into polynomials
pub mod composition;
/// Parsing of polynomial literals such as `"-1/4t^2+t"` or `"x^2y-3/2"`
pub mod parse;

use super::space::{Point, Rational};

use num_traits::{One, Zero};
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};

/// A variable of a bivariate polynomial
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Var {
    X,
    Y,
}

impl Var {
    pub const ALL: [Var; 2] = [Var::X, Var::Y];

    /// Position of the variable in a degree tuple or a point
    pub fn index(&self) -> usize {
        match self {
            Self::X => 0,
            Self::Y => 1,
        }
    }
}

/// Exact univariate polynomial in the variable `t`
///
/// Terms are stored as `degree => coefficient`; zero coefficients are never stored, so two
/// polynomials are equal exactly when their term maps are equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Polynomial1D {
    terms: BTreeMap<u32, Rational>,
}

/// Exact bivariate polynomial in the variables `x` and `y`
///
/// Terms are stored as `[degree_x, degree_y] => coefficient` with the same canonical form as [Polynomial1D]
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Polynomial2D {
    terms: BTreeMap<[u32; 2], Rational>,
}

impl Polynomial1D {
    pub fn constant(value: Rational) -> Self {
        Self::monomial(value, 0)
    }

    pub fn monomial(coefficient: Rational, degree: u32) -> Self {
        let mut p = Self::default();
        p.add_term(degree, coefficient);
        p
    }

    /// The polynomial `t`
    pub fn t() -> Self {
        Self::monomial(Rational::one(), 1)
    }

    /// The polynomial `a*t + b`
    pub fn linear(a: Rational, b: Rational) -> Self {
        let mut p = Self::constant(b);
        p.add_term(1, a);
        p
    }

    /// Build a polynomial by summing a collection of `(degree, coefficient)` terms
    pub fn from_terms(terms: impl IntoIterator<Item = (u32, Rational)>) -> Self {
        let mut p = Self::default();
        for (degree, coefficient) in terms {
            p.add_term(degree, coefficient);
        }
        p
    }

    /// Iterate over the non-zero terms in ascending degree
    pub fn terms(&self) -> impl Iterator<Item = (u32, &Rational)> + '_ {
        self.terms.iter().map(|(d, c)| (*d, c))
    }

    pub fn coefficient(&self, degree: u32) -> Rational {
        self.terms.get(&degree).cloned().unwrap_or_else(Rational::zero)
    }

    /// Highest degree with a non-zero coefficient (`None` for the zero polynomial)
    pub fn degree(&self) -> Option<u32> {
        self.terms.keys().next_back().copied()
    }

    pub fn evaluate(&self, t: &Rational) -> Rational {
        let mut result = Rational::zero();
        let mut power = Rational::one();
        let mut current_degree = 0;
        for (degree, coefficient) in self.terms.iter() {
            while current_degree < *degree {
                power *= t;
                current_degree += 1;
            }
            result += coefficient * &power;
        }
        result
    }

    pub fn scaled(&self, factor: &Rational) -> Self {
        Self::from_terms(self.terms.iter().map(|(d, c)| (*d, c * factor)))
    }

    pub(crate) fn add_term(&mut self, degree: u32, coefficient: Rational) {
        add_term_to(&mut self.terms, degree, coefficient);
    }

    fn add_assign_ref(&mut self, other: &Self) {
        for (degree, coefficient) in other.terms.iter() {
            self.add_term(*degree, coefficient.clone());
        }
    }

    fn sub_assign_ref(&mut self, other: &Self) {
        for (degree, coefficient) in other.terms.iter() {
            self.add_term(*degree, -coefficient.clone());
        }
    }

    fn product(&self, other: &Self) -> Self {
        let mut p = Self::default();
        for (d0, c0) in self.terms.iter() {
            for (d1, c1) in other.terms.iter() {
                p.add_term(d0 + d1, c0 * c1);
            }
        }
        p
    }
}

impl Polynomial2D {
    pub fn constant(value: Rational) -> Self {
        Self::monomial(value, [0, 0])
    }

    pub fn monomial(coefficient: Rational, degrees: [u32; 2]) -> Self {
        let mut p = Self::default();
        p.add_term(degrees, coefficient);
        p
    }

    /// The polynomial `x`
    pub fn x() -> Self {
        Self::monomial(Rational::one(), [1, 0])
    }

    /// The polynomial `y`
    pub fn y() -> Self {
        Self::monomial(Rational::one(), [0, 1])
    }

    /// The polynomial `a*x + b*y + c`
    pub fn affine(a: Rational, b: Rational, c: Rational) -> Self {
        Self::from_terms([([1, 0], a), ([0, 1], b), ([0, 0], c)])
    }

    /// Build a polynomial by summing a collection of `([degree_x, degree_y], coefficient)` terms
    pub fn from_terms(terms: impl IntoIterator<Item = ([u32; 2], Rational)>) -> Self {
        let mut p = Self::default();
        for (degrees, coefficient) in terms {
            p.add_term(degrees, coefficient);
        }
        p
    }

    /// Iterate over the non-zero terms in ascending `(degree_x, degree_y)` order
    pub fn terms(&self) -> impl Iterator<Item = ([u32; 2], &Rational)> + '_ {
        self.terms.iter().map(|(d, c)| (*d, c))
    }

    pub fn coefficient(&self, degrees: [u32; 2]) -> Rational {
        self.terms.get(&degrees).cloned().unwrap_or_else(Rational::zero)
    }

    /// Highest total degree with a non-zero coefficient (`None` for the zero polynomial)
    pub fn total_degree(&self) -> Option<u32> {
        self.terms.keys().map(|[dx, dy]| dx + dy).max()
    }

    pub fn evaluate(&self, p: &Point) -> Rational {
        self.evaluate_at(&p[0], &p[1])
    }

    pub fn evaluate_at(&self, x: &Rational, y: &Rational) -> Rational {
        let max_dy = self.terms.keys().map(|[_, dy]| *dy).max().unwrap_or(0);
        let y_powers = rational_powers(y, max_dy);

        let mut result = Rational::zero();
        let mut x_power = Rational::one();
        let mut current_dx = 0;
        for ([dx, dy], coefficient) in self.terms.iter() {
            while current_dx < *dx {
                x_power *= x;
                current_dx += 1;
            }
            result += coefficient * &x_power * &y_powers[*dy as usize];
        }
        result
    }

    pub fn scaled(&self, factor: &Rational) -> Self {
        Self::from_terms(self.terms.iter().map(|(d, c)| (*d, c * factor)))
    }

    pub(crate) fn add_term(&mut self, degrees: [u32; 2], coefficient: Rational) {
        add_term_to(&mut self.terms, degrees, coefficient);
    }

    fn add_assign_ref(&mut self, other: &Self) {
        for (degrees, coefficient) in other.terms.iter() {
            self.add_term(*degrees, coefficient.clone());
        }
    }

    fn sub_assign_ref(&mut self, other: &Self) {
        for (degrees, coefficient) in other.terms.iter() {
            self.add_term(*degrees, -coefficient.clone());
        }
    }

    fn product(&self, other: &Self) -> Self {
        let mut p = Self::default();
        for ([x0, y0], c0) in self.terms.iter() {
            for ([x1, y1], c1) in other.terms.iter() {
                p.add_term([x0 + x1, y0 + y1], c0 * c1);
            }
        }
        p
    }
}

// add a term to a canonical term map, dropping it if it cancels to zero
fn add_term_to<K: Ord>(terms: &mut BTreeMap<K, Rational>, key: K, coefficient: Rational) {
    if coefficient.is_zero() {
        return;
    }
    match terms.entry(key) {
        Entry::Vacant(entry) => {
            entry.insert(coefficient);
        }
        Entry::Occupied(mut entry) => {
            *entry.get_mut() += coefficient;
            if entry.get().is_zero() {
                entry.remove();
            }
        }
    }
}

fn rational_powers(base: &Rational, max_degree: u32) -> Vec<Rational> {
    let mut powers = Vec::with_capacity(max_degree as usize + 1);
    powers.push(Rational::one());
    for d in 1..=max_degree as usize {
        let next = &powers[d - 1] * base;
        powers.push(next);
    }
    powers
}

/// The ring operations shared by both polynomial types; used by generic composition routines.
pub(crate) trait PolynomialRing: Clone + Zero + One {
    fn mul_ref(&self, other: &Self) -> Self;
    fn scale_ref(&self, factor: &Rational) -> Self;
    fn add_ref(&mut self, other: &Self);
}

macro_rules! impl_polynomial_ops {
    ($poly:ident) => {
        impl PolynomialRing for $poly {
            fn mul_ref(&self, other: &Self) -> Self {
                self.product(other)
            }

            fn scale_ref(&self, factor: &Rational) -> Self {
                self.scaled(factor)
            }

            fn add_ref(&mut self, other: &Self) {
                self.add_assign_ref(other)
            }
        }

        impl Zero for $poly {
            fn zero() -> Self {
                Self::default()
            }

            fn is_zero(&self) -> bool {
                self.terms.is_empty()
            }
        }

        impl One for $poly {
            fn one() -> Self {
                Self::constant(Rational::one())
            }
        }

        impl From<Rational> for $poly {
            fn from(value: Rational) -> Self {
                Self::constant(value)
            }
        }

        impl From<i64> for $poly {
            fn from(value: i64) -> Self {
                Self::constant(Rational::from_integer(value.into()))
            }
        }

        impl Add for $poly {
            type Output = $poly;
            fn add(mut self, rhs: Self) -> $poly {
                self.add_assign_ref(&rhs);
                self
            }
        }

        impl<'a, 'b> Add<&'b $poly> for &'a $poly {
            type Output = $poly;
            fn add(self, rhs: &'b $poly) -> $poly {
                let mut sum = self.clone();
                sum.add_assign_ref(rhs);
                sum
            }
        }

        impl AddAssign<&$poly> for $poly {
            fn add_assign(&mut self, rhs: &$poly) {
                self.add_assign_ref(rhs);
            }
        }

        impl Sub for $poly {
            type Output = $poly;
            fn sub(mut self, rhs: Self) -> $poly {
                self.sub_assign_ref(&rhs);
                self
            }
        }

        impl<'a, 'b> Sub<&'b $poly> for &'a $poly {
            type Output = $poly;
            fn sub(self, rhs: &'b $poly) -> $poly {
                let mut difference = self.clone();
                difference.sub_assign_ref(rhs);
                difference
            }
        }

        impl SubAssign<&$poly> for $poly {
            fn sub_assign(&mut self, rhs: &$poly) {
                self.sub_assign_ref(rhs);
            }
        }

        impl Mul for $poly {
            type Output = $poly;
            fn mul(self, rhs: Self) -> $poly {
                self.product(&rhs)
            }
        }

        impl<'a, 'b> Mul<&'b $poly> for &'a $poly {
            type Output = $poly;
            fn mul(self, rhs: &'b $poly) -> $poly {
                self.product(rhs)
            }
        }

        impl Mul<Rational> for $poly {
            type Output = $poly;
            fn mul(self, rhs: Rational) -> $poly {
                self.scaled(&rhs)
            }
        }

        impl<'a, 'b> Mul<&'b Rational> for &'a $poly {
            type Output = $poly;
            fn mul(self, rhs: &'b Rational) -> $poly {
                self.scaled(rhs)
            }
        }

        impl Neg for $poly {
            type Output = $poly;
            fn neg(self) -> $poly {
                -&self
            }
        }

        impl<'a> Neg for &'a $poly {
            type Output = $poly;
            fn neg(self) -> $poly {
                $poly {
                    terms: self.terms.iter().map(|(d, c)| (*d, -c.clone())).collect(),
                }
            }
        }
    };
}

impl_polynomial_ops!(Polynomial1D);
impl_polynomial_ops!(Polynomial2D);

// ----------------------------------------------------------------------------------------------------
// Printing
// ----------------------------------------------------------------------------------------------------

fn variable_power(name: char, degree: u32) -> String {
    match degree {
        0 => String::new(),
        1 => name.to_string(),
        _ => format!("{}^{}", name, degree),
    }
}

fn format_term(coefficient: &Rational, variables: &str) -> String {
    if variables.is_empty() {
        coefficient.to_string()
    } else if coefficient.is_one() {
        variables.to_string()
    } else if (-coefficient).is_one() {
        format!("-{}", variables)
    } else {
        format!("{}{}", coefficient, variables)
    }
}

fn join_terms(terms: impl Iterator<Item = String>) -> String {
    let mut out = String::new();
    for term in terms {
        if !out.is_empty() && !term.starts_with('-') {
            out.push('+');
        }
        out.push_str(&term);
    }
    if out.is_empty() {
        out.push('0');
    }
    out
}

impl fmt::Display for Polynomial1D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let terms = self
            .terms
            .iter()
            .rev()
            .map(|(d, c)| format_term(c, &variable_power('t', *d)));
        write!(f, "{}", join_terms(terms))
    }
}

impl fmt::Display for Polynomial2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let mut sorted: Vec<(&[u32; 2], &Rational)> = self.terms.iter().collect();
        sorted.sort_by(|([ax, ay], _), ([bx, by], _)| (bx + by, bx).cmp(&(ax + ay, ax)));

        let terms = sorted.into_iter().map(|([dx, dy], c)| {
            let variables = variable_power('x', *dx) + &variable_power('y', *dy);
            format_term(c, &variables)
        });
        write!(f, "{}", join_terms(terms))
    }
}
