use super::basis_fn_indexer::{oriented, BasisFnIndexer};
use super::evaluator::ShapeFnEvaluator;
use super::shape_fn_factory::ShapeFnFactory;
use super::FemContext;
use crate::math::space::{Point, Rational};

use nalgebra::DVector;
use num_traits::Zero;

/// Evaluate the discrete function `sum_i c_i * b_i` at a point of the Mesh
///
/// The point is located in the first element that contains it, so points on shared sides use the
/// lower-indexed element (the basis is continuous, so the value does not depend on the choice).
pub fn evaluate_trial_fn(
    coeffs: &DVector<Rational>,
    ctx: &FemContext,
    x: &Point,
    evaluator: &mut ShapeFnEvaluator,
) -> Rational {
    let bfi = BasisFnIndexer::new(ctx);
    assert_coefficient_count(coeffs, &bfi);

    let elem_id = ctx.mesh.element_containing_point(x);
    let element = ctx.mesh.element(elem_id);
    let shape = element.reference_shape();
    let local_x = element.local_coordinates(x);

    bfi.local_basis_fns(elem_id)
        .iter()
        .filter(|lbf| !coeffs[lbf.global].is_zero())
        .fold(Rational::zero(), |acc, lbf| {
            let value = oriented(evaluator.evaluate(shape, &lbf.desc, &local_x), lbf.reversed);
            acc + &coeffs[lbf.global] * value
        })
}

/// Exact integral of the discrete function `sum_i c_i * b_i` over the Mesh
pub fn integrate_trial_fn(coeffs: &DVector<Rational>, ctx: &FemContext, factory: &ShapeFnFactory) -> Rational {
    let bfi = BasisFnIndexer::new(ctx);
    assert_coefficient_count(coeffs, &bfi);

    ctx.mesh
        .elements()
        .iter()
        .enumerate()
        .fold(Rational::zero(), |acc, (elem_id, element)| {
            let shape = element.reference_shape();
            let det_a = element.reference_map().det();

            let elem_integral = bfi
                .local_basis_fns(elem_id)
                .iter()
                .filter(|lbf| !coeffs[lbf.global].is_zero())
                .fold(Rational::zero(), |elem_acc, lbf| {
                    let integral = factory
                        .shape_fn(shape, &lbf.desc)
                        .integrate_over_reference(shape);
                    elem_acc + &coeffs[lbf.global] * oriented(integral, lbf.reversed)
                });

            acc + det_a * elem_integral
        })
}

/// Shift the discrete function by a constant so that its integral over the Mesh is zero
///
/// The nodal functions sum to one everywhere, so subtracting the mean from every nodal
/// coefficient subtracts the mean from the function.
pub fn normalize_trial_fn(coeffs: &mut DVector<Rational>, ctx: &FemContext, factory: &ShapeFnFactory) {
    let mean = integrate_trial_fn(coeffs, ctx, factory) / ctx.mesh.area();
    for node_id in 0..ctx.mesh.num_nodes() {
        coeffs[node_id] -= &mean;
    }
}

fn assert_coefficient_count(coeffs: &DVector<Rational>, bfi: &BasisFnIndexer) {
    assert_eq!(
        coeffs.len(),
        bfi.num_basis_fns(),
        "Expected one coefficient per basis function ({}); got {}!",
        bfi.num_basis_fns(),
        coeffs.len()
    );
}
