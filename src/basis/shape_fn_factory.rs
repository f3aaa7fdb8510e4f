use super::descriptor::ShapeFnDescriptor;
use super::FemContext;
use crate::math::polynomial::{Polynomial1D, Polynomial2D, Var};
use crate::math::space::{frac, int, ReferenceShape};

use log::debug;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Builds and stores the hierarchical shape functions (and their partial derivatives) of both
/// reference shapes
///
/// Shape functions are produced in bulk by [ShapeFnFactory::build]. Afterwards they are read-only
/// and can be shared between threads.
///
/// Square (`[-1, 1]^2`):
/// * nodal: bilinear functions `(1 ± x)(1 ± y) / 4`
/// * side `s`, order `k`: `phi_k` along the side, times the linear blending function of the side
/// * interior `(k, l)`: `phi_k(x) phi_l(y)`
///
/// Triangle (`(0,0), (1,0), (0,1)`):
/// * nodal: `1 - x - y`, `x`, `y`
/// * side `s`, order `k`: `n_s n_{s+1} rho_k(n_{s+1} - n_s)`
/// * interior `(k, l)`: `n_0 n_1 n_2 P_k(2x - 1) P_l(2y - 1)`
///
/// where `P_n` are the Legendre polynomials, `phi_k = (k-1)k/(2k-1) (P_k - P_{k-2})` and
/// `rho_k = -4 P'_{k-1}`.
#[derive(Debug, Clone, Default)]
pub struct ShapeFnFactory {
    triangle: ShapeFnTable,
    square: ShapeFnTable,
}

#[derive(Debug, Clone, Default)]
struct ShapeFnTable {
    order: u32,
    fns: BTreeMap<ShapeFnDescriptor, ShapeFn>,
}

/// A shape function with its `x` and `y` derivatives
#[derive(Debug, Clone)]
struct ShapeFn {
    value: Polynomial2D,
    derivatives: [Polynomial2D; 2],
}

impl ShapeFn {
    fn new(value: Polynomial2D) -> Self {
        let derivatives = [value.derivative(Var::X), value.derivative(Var::Y)];
        Self { value, derivatives }
    }
}

impl ShapeFnFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A factory holding the shape functions needed by every element of the context's Mesh
    pub fn for_context(ctx: &FemContext) -> Self {
        let mut factory = Self::new();
        if ctx.mesh.contains_triangle() {
            factory.build(ReferenceShape::Triangle, ctx.p);
        }
        if ctx.mesh.contains_parallelogram() {
            factory.build(ReferenceShape::Square, ctx.p);
        }
        factory
    }

    /// Build every shape function of a reference shape up to order `p` (for the Product space,
    /// which includes all Trunk functions). Already built functions are kept.
    pub fn build(&mut self, shape: ReferenceShape, p: u32) {
        assert!(p >= 1, "Polynomial order must be at least 1; got {}!", p);
        if p <= self.table(shape).order {
            return;
        }

        let scratch = KernelPolynomials::new(p);
        let table = self.table_mut(shape);

        let missing: Vec<ShapeFnDescriptor> = product_descriptors(shape, p)
            .filter(|desc| !table.fns.contains_key(desc))
            .collect();

        let new_fns: Vec<(ShapeFnDescriptor, ShapeFn)> = missing
            .into_par_iter()
            .map(|desc| {
                let value = match shape {
                    ReferenceShape::Triangle => scratch.triangle_shape_fn(&desc),
                    ReferenceShape::Square => scratch.square_shape_fn(&desc),
                };
                (desc, ShapeFn::new(value))
            })
            .collect();

        debug!(
            "Built {} new shape functions on the reference {:?} (order {} -> {})",
            new_fns.len(),
            shape,
            table.order,
            p
        );

        table.fns.extend(new_fns);
        table.order = p;
    }

    /// Highest order built for a reference shape (0 if nothing was built)
    pub fn order(&self, shape: ReferenceShape) -> u32 {
        self.table(shape).order
    }

    pub fn shape_fn(&self, shape: ReferenceShape, desc: &ShapeFnDescriptor) -> &Polynomial2D {
        &self.entry(shape, desc).value
    }

    pub fn shape_fn_derivative(
        &self,
        shape: ReferenceShape,
        desc: &ShapeFnDescriptor,
        var: Var,
    ) -> &Polynomial2D {
        &self.entry(shape, desc).derivatives[var.index()]
    }

    /// Every built shape function of a reference shape
    pub fn shape_fns(
        &self,
        shape: ReferenceShape,
    ) -> impl Iterator<Item = (&ShapeFnDescriptor, &Polynomial2D)> + '_ {
        self.table(shape).fns.iter().map(|(desc, f)| (desc, &f.value))
    }

    fn entry(&self, shape: ReferenceShape, desc: &ShapeFnDescriptor) -> &ShapeFn {
        self.table(shape).fns.get(desc).unwrap_or_else(|| {
            panic!(
                "Shape function {} on the reference {:?} has not been built (built up to order {})!",
                desc,
                shape,
                self.order(shape)
            )
        })
    }

    fn table(&self, shape: ReferenceShape) -> &ShapeFnTable {
        match shape {
            ReferenceShape::Triangle => &self.triangle,
            ReferenceShape::Square => &self.square,
        }
    }

    fn table_mut(&mut self, shape: ReferenceShape) -> &mut ShapeFnTable {
        match shape {
            ReferenceShape::Triangle => &mut self.triangle,
            ReferenceShape::Square => &mut self.square,
        }
    }
}

// every descriptor of the Product space of order p
fn product_descriptors(shape: ReferenceShape, p: u32) -> impl Iterator<Item = ShapeFnDescriptor> {
    let num_nodes = shape.num_nodes();
    let interior_degrees = match shape {
        ReferenceShape::Triangle => 0..=p.saturating_sub(2),
        ReferenceShape::Square => 2..=p,
    };
    let has_interior = p >= 2;

    let nodal = (0..num_nodes).map(ShapeFnDescriptor::Nodal);
    let sides = (0..num_nodes)
        .flat_map(move |side| (2..=p).map(move |k| ShapeFnDescriptor::Side { side, k }));
    let interior = interior_degrees
        .clone()
        .filter(move |_| has_interior)
        .flat_map(move |k| {
            interior_degrees
                .clone()
                .map(move |l| ShapeFnDescriptor::Interior { k, l })
        });

    nodal.chain(sides).chain(interior)
}

// ----------------------------------------------------------------------------------------------------
// Kernel polynomials
// ----------------------------------------------------------------------------------------------------

/// Intermediate polynomials shared by many shape functions of one bulk build
struct KernelPolynomials {
    /// `phi_k` for `k = 2..=p` (indexed by `k - 2`), composed into `x` and `y`
    phi: Vec<[Polynomial2D; 2]>,
    /// `phi_k(-x)` and `phi_k(-y)` for `k = 2..=p`
    phi_reflected: Vec<[Polynomial2D; 2]>,
    /// `rho_k` for `k = 2..=p`
    rho: Vec<Polynomial1D>,
    /// `P_n(2x - 1)` and `P_n(2y - 1)` for `n = 0..=p-2`
    shifted_legendre: Vec<[Polynomial2D; 2]>,
}

impl KernelPolynomials {
    fn new(p: u32) -> Self {
        let legendre = legendre_polynomials(p);

        let phi_1d: Vec<Polynomial1D> = (2..=p)
            .into_par_iter()
            .map(|k| {
                let k_ = k as i64;
                let c = frac((k_ - 1) * k_, 2 * k_ - 1);
                (&legendre[k as usize] - &legendre[k as usize - 2]) * c
            })
            .collect();

        let [x, y] = [Polynomial2D::x(), Polynomial2D::y()];
        let [neg_x, neg_y] = [-&x, -&y];

        let phi = phi_1d
            .par_iter()
            .map(|phi_k| [phi_k.compose_2d(&x), phi_k.compose_2d(&y)])
            .collect();
        let phi_reflected = phi_1d
            .par_iter()
            .map(|phi_k| [phi_k.compose_2d(&neg_x), phi_k.compose_2d(&neg_y)])
            .collect();

        let rho = (2..=p)
            .into_par_iter()
            .map(|k| legendre[k as usize - 1].derivative() * int(-4))
            .collect();

        let shift_x = Polynomial2D::affine(int(2), int(0), int(-1));
        let shift_y = Polynomial2D::affine(int(0), int(2), int(-1));
        let shifted_legendre = legendre[..(p.saturating_sub(1) as usize)]
            .par_iter()
            .map(|p_n| [p_n.compose_2d(&shift_x), p_n.compose_2d(&shift_y)])
            .collect();

        Self {
            phi,
            phi_reflected,
            rho,
            shifted_legendre,
        }
    }

    fn phi(&self, k: u32, var: Var) -> &Polynomial2D {
        &self.phi[k as usize - 2][var.index()]
    }

    fn phi_reflected(&self, k: u32, var: Var) -> &Polynomial2D {
        &self.phi_reflected[k as usize - 2][var.index()]
    }

    fn rho(&self, k: u32) -> &Polynomial1D {
        &self.rho[k as usize - 2]
    }

    fn shifted_legendre(&self, n: u32, var: Var) -> &Polynomial2D {
        &self.shifted_legendre[n as usize][var.index()]
    }

    fn square_shape_fn(&self, desc: &ShapeFnDescriptor) -> Polynomial2D {
        match *desc {
            ShapeFnDescriptor::Nodal(node) => square_nodal(node),
            ShapeFnDescriptor::Side { side, k } => {
                let half = frac(1, 2);
                match side {
                    0 => {
                        Polynomial2D::affine(int(0), -&half, half.clone())
                            * self.phi(k, Var::X).clone()
                    }
                    1 => {
                        Polynomial2D::affine(half.clone(), int(0), half.clone())
                            * self.phi(k, Var::Y).clone()
                    }
                    2 => {
                        Polynomial2D::affine(int(0), half.clone(), half.clone())
                            * self.phi_reflected(k, Var::X).clone()
                    }
                    3 => {
                        Polynomial2D::affine(-&half, int(0), half.clone())
                            * self.phi_reflected(k, Var::Y).clone()
                    }
                    _ => panic!("A square has no side {}!", side),
                }
            }
            ShapeFnDescriptor::Interior { k, l } => self.phi(k, Var::X) * self.phi(l, Var::Y),
        }
    }

    fn triangle_shape_fn(&self, desc: &ShapeFnDescriptor) -> Polynomial2D {
        match *desc {
            ShapeFnDescriptor::Nodal(node) => triangle_nodal(node),
            ShapeFnDescriptor::Side { side, k } => {
                let n0 = triangle_nodal(side);
                let n1 = triangle_nodal((side + 1) % 3);
                let kernel = self.rho(k).compose_2d(&(&n1 - &n0));
                (n0 * n1) * kernel
            }
            ShapeFnDescriptor::Interior { k, l } => {
                let bubble = triangle_nodal(0) * triangle_nodal(1) * triangle_nodal(2);
                (&bubble * self.shifted_legendre(k, Var::X)) * self.shifted_legendre(l, Var::Y).clone()
            }
        }
    }
}

/// `P_0..=P_p` from the three term recurrence `n P_n = (2n - 1) t P_{n-1} - (n - 1) P_{n-2}`
fn legendre_polynomials(p: u32) -> Vec<Polynomial1D> {
    let mut legendre = vec![Polynomial1D::constant(int(1)), Polynomial1D::t()];
    for n in 2..=(p as i64) {
        let next = (Polynomial1D::t() * legendre[n as usize - 1].clone()) * frac(2 * n - 1, n)
            - legendre[n as usize - 2].clone() * frac(n - 1, n);
        legendre.push(next);
    }
    legendre
}

fn square_nodal(node: usize) -> Polynomial2D {
    let quarter = frac(1, 4);
    let (sx, sy) = match node {
        0 => (-1, -1),
        1 => (1, -1),
        2 => (1, 1),
        3 => (-1, 1),
        _ => panic!("A square has no node {}!", node),
    };
    (Polynomial2D::affine(int(sx), int(0), int(1)) * Polynomial2D::affine(int(0), int(sy), int(1)))
        * quarter
}

fn triangle_nodal(node: usize) -> Polynomial2D {
    match node {
        0 => Polynomial2D::affine(int(-1), int(-1), int(1)),
        1 => Polynomial2D::x(),
        2 => Polynomial2D::y(),
        _ => panic!("A triangle has no node {}!", node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p2(s: &str) -> Polynomial2D {
        s.parse().unwrap()
    }

    fn factory(p: u32) -> ShapeFnFactory {
        let mut f = ShapeFnFactory::new();
        f.build(ReferenceShape::Triangle, p);
        f.build(ReferenceShape::Square, p);
        f
    }

    fn side(side: usize, k: u32) -> ShapeFnDescriptor {
        ShapeFnDescriptor::Side { side, k }
    }

    fn interior(k: u32, l: u32) -> ShapeFnDescriptor {
        ShapeFnDescriptor::Interior { k, l }
    }

    #[test]
    fn legendre() {
        let legendre = legendre_polynomials(4);
        assert_eq!(legendre[2], "3/2t^2-1/2".parse::<Polynomial1D>().unwrap());
        assert_eq!(legendre[3], "5/2t^3-3/2t".parse::<Polynomial1D>().unwrap());
        assert_eq!(legendre[4], "35/8t^4-15/4t^2+3/8".parse::<Polynomial1D>().unwrap());
    }

    #[test]
    fn triangle_nodal_fns() {
        let f = factory(1);
        let tri = ReferenceShape::Triangle;
        assert_eq!(f.shape_fn(tri, &ShapeFnDescriptor::Nodal(0)), &p2("1-x-y"));
        assert_eq!(f.shape_fn(tri, &ShapeFnDescriptor::Nodal(1)), &p2("x"));
        assert_eq!(f.shape_fn(tri, &ShapeFnDescriptor::Nodal(2)), &p2("y"));
    }

    #[test]
    fn triangle_side_fns() {
        let f = factory(4);
        let tri = ReferenceShape::Triangle;
        let expected = [
            (side(0, 2), "4 x^2 + 4 x y - 4 x"),
            (side(0, 3), "24 x^3 + 36 x^2 y - 36 x^2 + 12 x y^2 - 24 x y + 12 x"),
            (
                side(0, 4),
                "120 x^4 + 240 x^3 y - 240 x^3 + 150 x^2 y^2 - 300 x^2 y + 144 x^2 + 30 x y^3 - 90 x y^2 + 84 x y - 24 x",
            ),
            (side(1, 2), "-4xy"),
            (side(1, 3), "12 x^2 y - 12 x y^2"),
            (side(1, 4), "-30 x^3 y + 60 x^2 y^2 - 30 x y^3 + 6 x y"),
            (side(2, 2), "4 x y + 4 y^2 - 4 y"),
            (side(2, 3), "-12 x^2 y - 36 x y^2 + 24 x y - 24 y^3 + 36 y^2 - 12 y"),
        ];
        for (desc, literal) in expected {
            assert_eq!(f.shape_fn(tri, &desc), &p2(literal), "{}", desc);
        }
    }

    #[test]
    fn triangle_interior_fns() {
        let f = factory(5);
        let tri = ReferenceShape::Triangle;
        assert_eq!(f.shape_fn(tri, &interior(0, 0)), &p2("-x^2 y - x y^2 + x y"));
        assert_eq!(
            f.shape_fn(tri, &interior(0, 1)),
            &p2("-2 x^2 y^2 + x^2 y - 2 x y^3 + 3 x y^2 - x y")
        );
        assert_eq!(
            f.shape_fn(tri, &interior(1, 0)),
            &p2("-2 x^3 y - 2 x^2 y^2 + 3 x^2 y + x y^2 - x y")
        );
        assert_eq!(
            f.shape_fn(tri, &interior(2, 3)),
            &p2("-120 x^4 y^4 + 180 x^4 y^3 - 72 x^4 y^2 + 6 x^4 y - 120 x^3 y^5 + 420 x^3 y^4 - 432 x^3 y^3 + 150 x^3 y^2 - 12 x^3 y + 120 x^2 y^5 - 320 x^2 y^4 + 282 x^2 y^3 - 90 x^2 y^2 + 7 x^2 y - 20 x y^5 + 50 x y^4 - 42 x y^3 + 13 x y^2 - x y")
        );
    }

    #[test]
    fn square_nodal_fns() {
        let f = factory(1);
        let quad = ReferenceShape::Square;
        let expected = [
            "1/4xy-1/4x-1/4y+1/4",
            "-1/4xy+1/4x-1/4y+1/4",
            "1/4xy+1/4x+1/4y+1/4",
            "-1/4xy-1/4x+1/4y+1/4",
        ];
        for (node, literal) in expected.iter().enumerate() {
            assert_eq!(f.shape_fn(quad, &ShapeFnDescriptor::Nodal(node)), &p2(literal));
        }
    }

    #[test]
    fn square_side_fns() {
        let f = factory(4);
        let quad = ReferenceShape::Square;
        let expected = [
            (side(0, 2), "-1/2x^2y+1/2x^2+1/2y-1/2"),
            (side(0, 3), "-3/2x^3y+3/2x^3+3/2xy-3/2x"),
            (side(0, 4), "-15/4x^4y+15/4x^4+9/2x^2y-9/2x^2-3/4y+3/4"),
            (side(1, 2), "1/2xy^2-1/2x+1/2y^2-1/2"),
            (side(1, 3), "3/2xy^3-3/2xy+3/2y^3-3/2y"),
            (side(2, 2), "1/2x^2y+1/2x^2-1/2y-1/2"),
            (side(2, 3), "-3/2x^3y-3/2x^3+3/2xy+3/2x"),
            (side(2, 4), "15/4x^4y+15/4x^4-9/2x^2y-9/2x^2+3/4y+3/4"),
            (side(3, 2), "-1/2xy^2+1/2x+1/2y^2-1/2"),
            (side(3, 3), "3/2xy^3-3/2xy-3/2y^3+3/2y"),
            (side(3, 4), "-15/4xy^4+9/2xy^2-3/4x+15/4y^4-9/2y^2+3/4"),
        ];
        for (desc, literal) in expected {
            assert_eq!(f.shape_fn(quad, &desc), &p2(literal), "{}", desc);
        }
    }

    #[test]
    fn square_interior_fns() {
        let f = factory(3);
        let quad = ReferenceShape::Square;
        assert_eq!(f.shape_fn(quad, &interior(2, 2)), &p2("x^2 y^2 - x^2 - y^2 + 1"));
        assert_eq!(f.shape_fn(quad, &interior(2, 3)), &p2("3 x^2 y^3 - 3 x^2 y - 3 y^3 + 3 y"));
        assert_eq!(f.shape_fn(quad, &interior(3, 2)), &p2("3 x^3 y^2 - 3 x^3 - 3 x y^2 + 3 x"));
        assert_eq!(f.shape_fn(quad, &interior(3, 3)), &p2("9 x^3 y^3 - 9 x^3 y - 9 x y^3 + 9 x y"));
    }

    #[test]
    fn derivatives() {
        let f = factory(5);
        let cases = [
            (ReferenceShape::Triangle, ShapeFnDescriptor::Nodal(0)),
            (ReferenceShape::Triangle, side(1, 2)),
            (ReferenceShape::Triangle, interior(2, 3)),
            (ReferenceShape::Square, ShapeFnDescriptor::Nodal(2)),
            (ReferenceShape::Square, side(0, 4)),
            (ReferenceShape::Square, interior(2, 2)),
        ];
        for (shape, desc) in cases {
            for var in Var::ALL {
                assert_eq!(
                    f.shape_fn_derivative(shape, &desc, var),
                    &f.shape_fn(shape, &desc).derivative(var)
                );
            }
        }
    }

    #[test]
    fn incremental_builds() {
        let mut f = ShapeFnFactory::new();
        f.build(ReferenceShape::Square, 2);
        let low_order = f.shape_fn(ReferenceShape::Square, &side(1, 2)).clone();
        assert_eq!(f.shape_fns(ReferenceShape::Square).count(), 4 + 4 + 1);

        f.build(ReferenceShape::Square, 4);
        assert_eq!(f.order(ReferenceShape::Square), 4);
        assert_eq!(f.order(ReferenceShape::Triangle), 0);
        assert_eq!(f.shape_fns(ReferenceShape::Square).count(), 4 + 12 + 9);
        assert_eq!(f.shape_fn(ReferenceShape::Square, &side(1, 2)), &low_order);

        // building a lower order is a no-op
        f.build(ReferenceShape::Square, 3);
        assert_eq!(f.order(ReferenceShape::Square), 4);
    }

    #[test]
    fn nodal_fns_interpolate_vertices() {
        use crate::math::space::point;
        let f = factory(1);
        let vertices = [
            (ReferenceShape::Triangle, vec![(0, 0), (1, 0), (0, 1)]),
            (ReferenceShape::Square, vec![(-1, -1), (1, -1), (1, 1), (-1, 1)]),
        ];
        for (shape, nodes) in vertices {
            for (i, _) in nodes.iter().enumerate() {
                for (j, (x, y)) in nodes.iter().enumerate() {
                    let value = f
                        .shape_fn(shape, &ShapeFnDescriptor::Nodal(i))
                        .evaluate(&point(int(*x), int(*y)));
                    assert_eq!(value, if i == j { int(1) } else { int(0) });
                }
            }
        }
    }

    #[test]
    #[should_panic]
    fn unbuilt_shape_fn() {
        factory(2).shape_fn(ReferenceShape::Triangle, &side(0, 3));
    }
}
