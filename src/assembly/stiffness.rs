use super::super_indices;
use crate::basis::basis_fn_indexer::{BasisFnIndexer, LocalBasisFn};
use crate::basis::shape_fn_factory::ShapeFnFactory;
use crate::basis::shape_fn_indexer::ShapeFnIndexer;
use crate::basis::FemContext;
use crate::linalg::SparseMatrix;
use crate::math::polynomial::Var;
use crate::math::space::{inverse, Rational, ReferenceShape, M2};

use log::{debug, info, trace};
use nalgebra::DMatrix;
use num_traits::{Signed, Zero};
use rayon::prelude::*;
use std::collections::HashMap;

type IntegralKey = (usize, Var, usize, Var);

/// `∫ ∂ψ_i/∂a ∂ψ_j/∂b` over a reference shape for every pair of local shape functions `i <= j`
/// and every pair of variables `(a, b)`
struct ReferenceIntegrals {
    values: HashMap<IntegralKey, Rational>,
}

impl ReferenceIntegrals {
    fn new(shape: ReferenceShape, sfi: &ShapeFnIndexer, factory: &ShapeFnFactory) -> Self {
        let n = sfi.num_shape_fns(shape);
        let keys: Vec<IntegralKey> = (0..n)
            .flat_map(|i| (i..n).map(move |j| (i, j)))
            .flat_map(|(i, j)| {
                Var::ALL
                    .into_iter()
                    .flat_map(move |a| Var::ALL.into_iter().map(move |b| (i, a, j, b)))
            })
            .collect();

        let values: HashMap<IntegralKey, Rational> = keys
            .into_par_iter()
            .map(|key| {
                let (i, a, j, b) = key;
                let d_i = factory.shape_fn_derivative(shape, &sfi.descriptor(shape, i), a);
                let d_j = factory.shape_fn_derivative(shape, &sfi.descriptor(shape, j), b);
                (key, (d_i * d_j).integrate_over_reference(shape))
            })
            .collect();

        debug!(
            "Cached {} reference integrals for {} shape functions on the reference {:?}",
            values.len(),
            n,
            shape
        );

        Self { values }
    }

    fn get(&self, i: usize, a: Var, j: usize, b: Var) -> &Rational {
        &self.values[&(i, a, j, b)]
    }
}

/// Assemble the exact stiffness matrix `K_ij = ∫ ∇b_i · ∇b_j` of the Laplacian over the Mesh
///
/// The shape functions of every reference shape in the Mesh must have been built up to `ctx.p`.
/// The returned matrix is symmetric.
pub fn assemble_stiffness_matrix(ctx: &FemContext, factory: &ShapeFnFactory) -> DMatrix<Rational> {
    let bfi = BasisFnIndexer::new(ctx);
    let sfi = *bfi.shape_fn_indexer();
    let mesh = ctx.mesh;

    info!(
        "Assembling {0}x{0} stiffness matrix (p = {1}, {2} space)",
        bfi.num_basis_fns(),
        ctx.p,
        ctx.space
    );

    let triangle_integrals = mesh
        .contains_triangle()
        .then(|| ReferenceIntegrals::new(ReferenceShape::Triangle, &sfi, factory));
    let square_integrals = mesh
        .contains_parallelogram()
        .then(|| ReferenceIntegrals::new(ReferenceShape::Square, &sfi, factory));

    let mut k = SparseMatrix::new(bfi.num_basis_fns());
    k.par_extend((0..mesh.num_elements()).into_par_iter().map(|elem_id| {
        let integrals = match mesh.element(elem_id).reference_shape() {
            ReferenceShape::Triangle => triangle_integrals.as_ref(),
            ReferenceShape::Square => square_integrals.as_ref(),
        };
        match integrals {
            Some(integrals) => element_matrix(&bfi, elem_id, integrals),
            None => unreachable!("reference integrals are computed for every shape in the Mesh"),
        }
    }));

    k.into()
}

fn element_matrix(bfi: &BasisFnIndexer, elem_id: usize, integrals: &ReferenceIntegrals) -> SparseMatrix {
    let element = bfi.mesh().element(elem_id);
    let a = element.reference_map().matrix().clone();
    let m = inverse_gram(&a);
    let det_a = element.reference_map().det().abs();

    let local_fns = bfi.local_basis_fns(elem_id);
    trace!(
        "Element {}: {} local shape functions, |det A| = {}",
        elem_id,
        local_fns.len(),
        det_a
    );

    let mut elem_matrix = SparseMatrix::new(bfi.num_basis_fns());
    for (pos, lbf_i) in local_fns.iter().enumerate() {
        for lbf_j in &local_fns[pos..] {
            let value = element_integral(lbf_i, lbf_j, &m, integrals) * &det_a;
            elem_matrix.insert([lbf_i.global, lbf_j.global], value);
        }
    }
    elem_matrix
}

// Σ_ab M_ab ∫ ∂ψ_i/∂a ∂ψ_j/∂b with the orientation of both functions applied
fn element_integral(
    lbf_i: &LocalBasisFn,
    lbf_j: &LocalBasisFn,
    m: &M2,
    integrals: &ReferenceIntegrals,
) -> Rational {
    let sum = Var::ALL
        .into_iter()
        .flat_map(|a| Var::ALL.into_iter().map(move |b| (a, b)))
        .fold(Rational::zero(), |acc, (a, b)| {
            acc + &m[(a.index(), b.index())] * integrals.get(lbf_i.local, a, lbf_j.local, b)
        });

    if lbf_i.reversed != lbf_j.reversed {
        -sum
    } else {
        sum
    }
}

// A^-1 A^-T: maps reference gradients onto the real gradient inner product
fn inverse_gram(a: &M2) -> M2 {
    let a_inv = inverse(a).unwrap_or_else(|| panic!("Element map {} is singular!", a));
    &a_inv * a_inv.transpose()
}

/// Restrict a stiffness matrix assembled over `sup` to the basis functions of `sub`
///
/// `sub` must describe the same Mesh and polynomial space at an order no greater than `sup`'s.
/// The result equals the matrix assembled directly over `sub`.
pub fn extract_sub_matrix(
    sup: &BasisFnIndexer,
    sub: &BasisFnIndexer,
    k: &DMatrix<Rational>,
) -> DMatrix<Rational> {
    assert_eq!(
        k.shape(),
        (sup.num_basis_fns(), sup.num_basis_fns()),
        "Stiffness matrix does not match the DoF layout it is extracted from!"
    );
    let indices = super_indices(sup, sub);
    DMatrix::from_fn(indices.len(), indices.len(), |i, j| {
        k[(indices[i], indices[j])].clone()
    })
}
