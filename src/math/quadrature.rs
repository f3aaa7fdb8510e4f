use super::space::{frac, int, point, Point, Rational, ReferenceShape};
use crate::domain::mesh::element::Element;

use log::debug;
use nalgebra::{DMatrix, SymmetricEigen};
use num_traits::Zero;
use rayon::prelude::*;

/// Number of points used by [GaussLegendre1D::default]
pub const DEFAULT_GAUSS_LEGENDRE_POINTS: usize = 100;

/// Number of points per direction used by the default 2D tables
pub const DEFAULT_GAUSS_LEGENDRE_POINTS_2D: usize = 100;

/// Gauss-Legendre points and weights on `[-1, 1]`
///
/// The table is computed in `f64` with the Golub-Welsch algorithm and stored as the exact rational
/// value of each rounded float, so every quadrature sum afterwards is exact rational arithmetic.
#[derive(Clone, Debug)]
pub struct GaussLegendre1D {
    points: Vec<Rational>,
    weights: Vec<Rational>,
}

impl GaussLegendre1D {
    pub fn new(n: usize) -> Self {
        assert!(n > 0, "Gauss-Legendre tables need at least one point!");
        let (points, weights) = gauss_quadrature_points(n);
        debug!("Built {}-point Gauss-Legendre table", n);

        Self {
            points: points.into_iter().map(float_to_rational).collect(),
            weights: weights.into_iter().map(float_to_rational).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Abscissas in ascending order
    pub fn points(&self) -> &[Rational] {
        &self.points
    }

    pub fn weights(&self) -> &[Rational] {
        &self.weights
    }

    /// `(weight, abscissa)` pairs
    pub fn nodes(&self) -> impl Iterator<Item = (&Rational, &Rational)> + '_ {
        self.weights.iter().zip(self.points.iter())
    }

    /// Approximate the integral of `f` over `[a, b]`
    pub fn integrate<F>(&self, f: F, a: &Rational, b: &Rational) -> Rational
    where
        F: Fn(&Rational) -> Rational,
    {
        let half = frac(1, 2);
        let sum = self.nodes().fold(Rational::zero(), |acc, (w, t)| {
            let x = (int(1) - t) * &half * a + (int(1) + t) * &half * b;
            acc + w * f(&x)
        });
        sum * (b - a) * half
    }
}

impl Default for GaussLegendre1D {
    fn default() -> Self {
        Self::new(DEFAULT_GAUSS_LEGENDRE_POINTS)
    }
}

/// A weighted point set over one of the reference shapes
pub trait ReferenceQuadrature: Sync {
    fn shape(&self) -> ReferenceShape;

    /// `(weight, point)` pairs in reference coordinates
    fn nodes(&self) -> &[(Rational, Point)];

    /// Approximate the integral of `f` over the reference shape
    fn integrate_reference<F>(&self, f: F) -> Rational
    where
        F: Fn(&Point) -> Rational + Sync,
    {
        self.nodes()
            .par_iter()
            .map(|(w, x)| w * f(x))
            .reduce(Rational::zero, |a, b| a + b)
    }
}

/// Tensor product Gauss-Legendre table on the reference square `[-1, 1]^2`
#[derive(Clone, Debug)]
pub struct GaussLegendreQuad {
    nodes: Vec<(Rational, Point)>,
}

impl GaussLegendreQuad {
    pub fn new(n: usize) -> Self {
        let table = GaussLegendre1D::new(n);
        let nodes = table
            .nodes()
            .flat_map(|(wi, xi)| {
                table
                    .nodes()
                    .map(move |(wj, xj)| (wi * wj, point(xi.clone(), xj.clone())))
            })
            .collect();
        Self { nodes }
    }
}

impl Default for GaussLegendreQuad {
    fn default() -> Self {
        Self::new(DEFAULT_GAUSS_LEGENDRE_POINTS_2D)
    }
}

impl ReferenceQuadrature for GaussLegendreQuad {
    fn shape(&self) -> ReferenceShape {
        ReferenceShape::Square
    }

    fn nodes(&self) -> &[(Rational, Point)] {
        &self.nodes
    }
}

/// Gauss-Legendre table on the reference triangle, obtained by collapsing the square onto the triangle
///
/// The point `(xi, xj)` of the square is sent to `u = (1 + xi) / 2`, `v = (1 - xi)(1 + xj) / 4` with
/// weight `(1 - xi) wi wj / 8`.
#[derive(Clone, Debug)]
pub struct GaussLegendreTriangle {
    nodes: Vec<(Rational, Point)>,
}

impl GaussLegendreTriangle {
    /// `n * n` points; the points crowd toward the collapsed vertex `(1, 0)`
    pub fn quad_mapped(n: usize) -> Self {
        let table = GaussLegendre1D::new(n);
        let nodes = table
            .nodes()
            .flat_map(|(wi, xi)| table.nodes().map(move |(wj, xj)| collapse(wi, xi, wj, xj)))
            .collect();
        Self { nodes }
    }

    /// Column `i` of the collapsed square uses an `n - i` point table, so columns shrink along with
    /// the width of the triangle
    pub fn crowding_free(n: usize) -> Self {
        let outer = GaussLegendre1D::new(n);
        let nodes = outer
            .nodes()
            .enumerate()
            .flat_map(|(i, (wi, xi))| {
                let inner = GaussLegendre1D::new(n - i);
                inner
                    .nodes()
                    .map(|(wj, xj)| collapse(wi, xi, wj, xj))
                    .collect::<Vec<_>>()
            })
            .collect();
        Self { nodes }
    }
}

impl Default for GaussLegendreTriangle {
    fn default() -> Self {
        Self::quad_mapped(DEFAULT_GAUSS_LEGENDRE_POINTS_2D)
    }
}

impl ReferenceQuadrature for GaussLegendreTriangle {
    fn shape(&self) -> ReferenceShape {
        ReferenceShape::Triangle
    }

    fn nodes(&self) -> &[(Rational, Point)] {
        &self.nodes
    }
}

fn collapse(wi: &Rational, xi: &Rational, wj: &Rational, xj: &Rational) -> (Rational, Point) {
    let u = (int(1) + xi) / int(2);
    let v = (int(1) - xi) * (int(1) + xj) / int(4);
    let w = (int(1) - xi) * wi * wj / int(8);
    (w, point(u, v))
}

/// Approximate the integral of `f` over a physical element
///
/// The integrand is pulled back through the element's reference map and scaled by `det A`.
/// Panics if the table does not match the element's reference shape.
pub fn integrate_over_element<F, Q>(f: F, element: &Element, table: &Q) -> Rational
where
    F: Fn(&Point) -> Rational + Sync,
    Q: ReferenceQuadrature,
{
    assert_eq!(
        element.reference_shape(),
        table.shape(),
        "Quadrature table does not match the element's reference shape!"
    );
    let map = element.reference_map();
    table.integrate_reference(|x| f(&map.apply(x))) * map.det()
}

/// Approximate the integral of `f` over an element after subdividing it around the point `x0`
///
/// Integrands that are singular at `x0` are then only ever sampled away from their singular point.
pub fn integrate_with_singularity<F, Q>(f: F, element: &Element, x0: &Point, table: &Q) -> Rational
where
    F: Fn(&Point) -> Rational + Sync,
    Q: ReferenceQuadrature,
{
    element
        .subdivide(x0)
        .iter()
        .map(|child| integrate_over_element(&f, child, table))
        .fold(Rational::zero(), |acc, part| acc + part)
}

/// Compute the Gauss-Legendre points and weights on `[-1, 1]` (Golub-Welsch)
fn gauss_quadrature_points(n: usize) -> (Vec<f64>, Vec<f64>) {
    let betas: Vec<f64> = (1..n)
        .map(|i| 0.5 / (1.0 - (2.0 * i as f64).powi(-2)).sqrt())
        .collect();

    let jacobi: DMatrix<f64> = DMatrix::from_fn(n, n, |r, c| {
        if r == c + 1 {
            betas[c]
        } else if c == r + 1 {
            betas[r]
        } else {
            0.0
        }
    });

    let eigen_decomp = SymmetricEigen::new(jacobi);

    let mut xw: Vec<(f64, f64)> = eigen_decomp
        .eigenvalues
        .iter()
        .cloned()
        .zip(
            eigen_decomp
                .eigenvectors
                .row(0)
                .iter()
                .map(|v| v.powi(2) * 2.0),
        )
        .collect();

    xw.sort_by(|a, b| a.0.total_cmp(&b.0));
    xw.into_iter().unzip()
}

fn float_to_rational(value: f64) -> Rational {
    Rational::from_float(value)
        .unwrap_or_else(|| panic!("Quadrature value {} is not finite!", value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_traits::ToPrimitive;

    fn as_f64(r: &Rational) -> f64 {
        r.to_f64().unwrap()
    }

    #[test]
    fn table_properties() {
        let table = GaussLegendre1D::new(7);
        assert_eq!(table.len(), 7);
        assert!(table.points().windows(2).all(|w| w[0] < w[1]));

        let weight_sum = table.weights().iter().fold(Rational::zero(), |a, w| a + w);
        assert!((as_f64(&weight_sum) - 2.0).abs() < 1e-13);

        let single = GaussLegendre1D::new(1);
        assert!(as_f64(&single.points()[0]).abs() < 1e-15);
        assert!((as_f64(&single.weights()[0]) - 2.0).abs() < 1e-15);
    }

    #[test]
    fn univariate_integration() {
        let table = GaussLegendre1D::new(14);
        let f1 = |t: &Rational| (int(1) - t) / (int(1) + t * t);
        let expected = (std::f64::consts::PI - 4f64.ln()) / 4.0;
        assert!((as_f64(&table.integrate(f1, &int(0), &int(1))) - expected).abs() < 1e-12);

        let f2 = |t: &Rational| {
            let num = frac(35, 2) * t * t * t * t * t - int(25) * t * t * t + frac(15, 2) * t;
            num / (int(1) + t * t)
        };
        let value = table.integrate(f2, &frac(-2, 7), &frac(3, 4));
        assert!((as_f64(&value) - 0.332078882023690280349671958279953).abs() < 1e-7);
    }

    #[test]
    fn default_table_integrates_polynomials() {
        let table = GaussLegendre1D::default();
        assert_eq!(table.len(), DEFAULT_GAUSS_LEGENDRE_POINTS);
        let value = table.integrate(|t| t * t, &int(-1), &int(1));
        assert!((as_f64(&value) - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn parallelogram_integration() {
        let quad = Element::parallelogram([
            point(int(1), int(1)),
            point(int(2), int(2)),
            point(int(2), int(3)),
            point(int(1), int(2)),
        ]);
        let f = |p: &Point| {
            let mut res = frac(4, 7);
            for _ in 0..14 {
                res *= &p[0];
            }
            res * &p[1] * &p[1] * &p[1] - frac(19, 9) * &p[0]
        };
        let value = integrate_over_element(f, &quad, &GaussLegendreQuad::new(10));
        let expected = 41840537.0 / 2380.0;
        assert!(((as_f64(&value) - expected) / expected).abs() < 1e-10);
    }

    #[test]
    fn triangle_integration() {
        let tri4 = Element::triangle([
            point(int(-4), int(1)),
            point(frac(-5, 2), int(-3)),
            point(int(-1), int(1)),
        ]);
        let f4 = |p: &Point| {
            let a = int(2) * &p[0] + &p[1];
            &a * &a * &a
        };
        let value = integrate_over_element(f4, &tri4, &GaussLegendreTriangle::quad_mapped(10));
        assert!((as_f64(&value) + 1128.0).abs() < 1e-7);

        let tri5 = Element::triangle([
            point(int(-3), int(-2)),
            point(int(5), int(-1)),
            point(int(-2), int(1)),
        ]);
        let f5 = |p: &Point| {
            let a = &p[1] + int(1);
            &p[0] * &p[0] * &a * &a * &a
        };
        let value = integrate_over_element(f5, &tri5, &GaussLegendreTriangle::quad_mapped(10));
        assert!((as_f64(&value) - 4301.0 / 420.0).abs() < 1e-7);
    }

    #[test]
    fn crowding_free_triangle_integration() {
        let table = GaussLegendreTriangle::crowding_free(100);

        // ∫ e^(x + y) over the unit triangle is ∫ s e^s ds on [0, 1]
        let unit = Element::triangle([point(int(0), int(0)), point(int(1), int(0)), point(int(0), int(1))]);
        let exp = |p: &Point| float_to_rational(as_f64(&(&p[0] + &p[1])).exp());
        let value = integrate_over_element(exp, &unit, &table);
        assert!((as_f64(&value) - 1.0).abs() < 1e-8);

        let tri5 = Element::triangle([
            point(int(-3), int(-2)),
            point(int(5), int(-1)),
            point(int(-2), int(1)),
        ]);
        let f5 = |p: &Point| {
            let a = &p[1] + int(1);
            &p[0] * &p[0] * &a * &a * &a
        };
        let value = integrate_over_element(f5, &tri5, &table);
        assert!((as_f64(&value) - 4301.0 / 420.0).abs() < 1e-8);
    }

    #[test]
    fn singular_point_integration() {
        let tri = Element::triangle([point(int(0), int(0)), point(int(1), int(0)), point(int(0), int(1))]);
        let table = GaussLegendreTriangle::quad_mapped(8);

        let whole = integrate_over_element(|p| &p[0] * &p[1], &tri, &table);
        let split = integrate_with_singularity(|p| &p[0] * &p[1], &tri, &point(frac(1, 4), frac(1, 4)), &table);
        assert!((as_f64(&whole) - 1.0 / 24.0).abs() < 1e-12);
        assert!((as_f64(&split) - 1.0 / 24.0).abs() < 1e-12);

        // log(r) is integrable but singular at the origin
        let square = Element::parallelogram([
            point(int(-1), int(-1)),
            point(int(1), int(-1)),
            point(int(1), int(1)),
            point(int(-1), int(1)),
        ]);
        let log_r = |p: &Point| {
            let r2 = as_f64(&(&p[0] * &p[0] + &p[1] * &p[1]));
            if r2 == 0.0 {
                Rational::zero()
            } else {
                float_to_rational(0.5 * r2.ln())
            }
        };
        let value = integrate_with_singularity(log_r, &square, &point(int(0), int(0)), &GaussLegendreQuad::new(12));
        assert!((as_f64(&value) + 1.47211).abs() < 0.01);
    }

    #[test]
    #[should_panic]
    fn mismatched_table() {
        let tri = Element::triangle([point(int(0), int(0)), point(int(1), int(0)), point(int(0), int(1))]);
        integrate_over_element(|_| int(1), &tri, &GaussLegendreQuad::new(2));
    }
}
