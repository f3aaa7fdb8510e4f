use super::{Polynomial1D, Polynomial2D, PolynomialRing};
use crate::math::affine_map::AffineMap;
use crate::math::space::Rational;

impl Polynomial1D {
    /// `f(g(t))`
    pub fn compose(&self, g: &Polynomial1D) -> Polynomial1D {
        substitute(self.terms().map(|(d, c)| ([d], c)), [g])
    }

    /// `f(g(x, y))`
    pub fn compose_2d(&self, g: &Polynomial2D) -> Polynomial2D {
        substitute(self.terms().map(|(d, c)| ([d], c)), [g])
    }
}

impl Polynomial2D {
    /// `f(g_x(x, y), g_y(x, y))`
    pub fn compose(&self, g_x: &Polynomial2D, g_y: &Polynomial2D) -> Polynomial2D {
        substitute(self.terms(), [g_x, g_y])
    }

    /// Restriction of `f` to the parametric curve `(g_x(t), g_y(t))`
    pub fn compose_1d(&self, g_x: &Polynomial1D, g_y: &Polynomial1D) -> Polynomial1D {
        substitute(self.terms(), [g_x, g_y])
    }

    /// `f(F(x, y))` for an affine map `F(x) = A x + b`
    pub fn compose_affine(&self, map: &AffineMap) -> Polynomial2D {
        let (a, b) = (map.matrix(), map.translation());
        let g_x = Polynomial2D::affine(a[(0, 0)].clone(), a[(0, 1)].clone(), b[0].clone());
        let g_y = Polynomial2D::affine(a[(1, 0)].clone(), a[(1, 1)].clone(), b[1].clone());
        self.compose(&g_x, &g_y)
    }
}

// replace the N variables of a term map with ring elements, reusing the powers of each substitute
fn substitute<'a, R: PolynomialRing, const N: usize>(
    terms: impl Iterator<Item = ([u32; N], &'a Rational)>,
    substitutes: [&R; N],
) -> R {
    let mut powers: [Vec<R>; N] = substitutes.map(|_| vec![R::one()]);
    let mut result = R::zero();

    for (degrees, coefficient) in terms {
        let mut term = R::one().scale_ref(coefficient);
        for (var_idx, degree) in degrees.iter().map(|d| *d as usize).enumerate() {
            let table = &mut powers[var_idx];
            while table.len() <= degree {
                let next = table[table.len() - 1].mul_ref(substitutes[var_idx]);
                table.push(next);
            }
            term = term.mul_ref(&table[degree]);
        }
        result.add_ref(&term);
    }

    result
}
