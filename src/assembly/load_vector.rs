use super::super_indices;
use crate::basis::basis_fn_indexer::{oriented, BasisFnIndexer};
use crate::basis::shape_fn_factory::ShapeFnFactory;
use crate::basis::FemContext;
use crate::linalg::zero_vector;
use crate::math::quadrature::GaussLegendre1D;
use crate::math::space::{frac, int, sqrt, squared_norm, Point, Rational};

use log::{debug, info, trace};
use nalgebra::DVector;
use rayon::prelude::*;

/// Assemble the load vector `b_i = b_i(x0)` of a unit point source at `x0`
///
/// Only the basis functions of the element containing `x0` can be non-zero. When `x0` is a node
/// of the Mesh, the result is the indicator vector of that node's nodal function.
pub fn assemble_dirac_load_vector(ctx: &FemContext, x0: &Point, factory: &ShapeFnFactory) -> DVector<Rational> {
    let bfi = BasisFnIndexer::new(ctx);
    let mesh = ctx.mesh;

    let elem_id = mesh.element_containing_point(x0);
    let element = mesh.element(elem_id);
    let shape = element.reference_shape();
    let local_x0 = element.local_coordinates(x0);

    info!(
        "Assembling Dirac load vector at ({}, {}) in element {} ({} DoFs)",
        x0[0],
        x0[1],
        elem_id,
        bfi.num_basis_fns()
    );

    let mut load = zero_vector(bfi.num_basis_fns());
    for lbf in bfi.local_basis_fns(elem_id) {
        let value = factory.shape_fn(shape, &lbf.desc).evaluate(&local_x0);
        load[lbf.global] = oriented(value, lbf.reversed);
    }
    load
}

/// Assemble the load vector `b_i = ∫ g b_i` along a single boundary side
///
/// The side `local_side` of element `elem_id` must lie on the boundary of the Mesh. The line
/// integral is computed with the quadrature `table` over the side's linear parameterization
/// and scaled by half the side length.
pub fn assemble_neumann_load_vector_on_side<G>(
    ctx: &FemContext,
    g: G,
    elem_id: usize,
    local_side: usize,
    factory: &ShapeFnFactory,
    table: &GaussLegendre1D,
) -> DVector<Rational>
where
    G: Fn(&Point) -> Rational,
{
    let bfi = BasisFnIndexer::new(ctx);
    assert!(
        ctx.mesh.is_boundary_side(elem_id, local_side),
        "Side {} of element {} is not on the boundary of the Mesh!",
        local_side,
        elem_id
    );

    let side = ctx.mesh.element(elem_id).side(local_side);
    let half_length = sqrt(&squared_norm(&side.direction())) * frac(1, 2);
    side_load_vector(&bfi, elem_id, local_side, &g, &half_length, factory, table)
}

/// Assemble the Neumann load vector `b_i = ∫ (∇u · n) b_i` over the whole boundary of the Mesh
///
/// `grad_u` is the gradient of the function whose normal derivative is prescribed. On each side
/// the normal is taken with the length of the side, which cancels the length of the
/// parameterization, so every side contributes with a factor of exactly 1/2.
pub fn assemble_neumann_load_vector<G>(
    ctx: &FemContext,
    grad_u: G,
    factory: &ShapeFnFactory,
    table: &GaussLegendre1D,
) -> DVector<Rational>
where
    G: Fn(&Point) -> Point + Sync,
{
    let bfi = BasisFnIndexer::new(ctx);
    let boundary = ctx.mesh.boundary();
    let num_basis_fns = bfi.num_basis_fns();

    info!(
        "Assembling Neumann load vector over {} boundary sides ({} DoFs)",
        boundary.len(),
        num_basis_fns
    );

    let half = frac(1, 2);
    boundary
        .into_par_iter()
        .map(|(elem_id, local_side)| {
            let normal = ctx.mesh.element(elem_id).side(local_side).outward_normal_unscaled();
            let g = |x: &Point| grad_u(x).dot(&normal);
            side_load_vector(&bfi, elem_id, local_side, &g, &half, factory, table)
        })
        .reduce(|| zero_vector(num_basis_fns), |acc, side_load| acc + side_load)
}

// scale * ∫_{-1}^{1} g(r(t)) ψ_i(F^-1(r(t))) dt for every shape function of the element
fn side_load_vector<G>(
    bfi: &BasisFnIndexer,
    elem_id: usize,
    local_side: usize,
    g: &G,
    scale: &Rational,
    factory: &ShapeFnFactory,
    table: &GaussLegendre1D,
) -> DVector<Rational>
where
    G: Fn(&Point) -> Rational,
{
    let element = bfi.mesh().element(elem_id);
    let shape = element.reference_shape();
    let side = element.side(local_side);
    let f_inv = element.reference_map().inverse();

    // g and the reference coordinates only depend on the quadrature point
    let samples: Vec<(Rational, Point)> = table
        .points()
        .iter()
        .map(|t| {
            let x = side.point_at(t);
            (g(&x), f_inv.apply(&x))
        })
        .collect();

    trace!(
        "Boundary side {} of element {}: {} quadrature points",
        local_side,
        elem_id,
        samples.len()
    );

    let mut load = zero_vector(bfi.num_basis_fns());
    for lbf in bfi.local_basis_fns(elem_id) {
        let psi = factory.shape_fn(shape, &lbf.desc);
        let integral = table
            .weights()
            .iter()
            .zip(samples.iter())
            .fold(int(0), |acc, (w, (g_x, local_x))| acc + w * g_x * psi.evaluate(local_x));
        load[lbf.global] = oriented(integral * scale, lbf.reversed);
    }
    load
}

/// Restrict a load vector assembled over `sup` to the basis functions of `sub`
///
/// `sub` must describe the same Mesh and polynomial space at an order no greater than `sup`'s.
pub fn extract_sub_vector(sup: &BasisFnIndexer, sub: &BasisFnIndexer, b: &DVector<Rational>) -> DVector<Rational> {
    assert_eq!(
        b.len(),
        sup.num_basis_fns(),
        "Load vector does not match the DoF layout it is extracted from!"
    );
    let indices = super_indices(sup, sub);
    debug!("Extracting {} of {} load vector entries", indices.len(), b.len());
    DVector::from_iterator(indices.len(), indices.iter().map(|ii| b[*ii].clone()))
}
