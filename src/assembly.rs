/// Global stiffness matrix of the Laplacian
pub mod stiffness;
/// Point source and Neumann boundary load vectors
pub mod load_vector;

pub use load_vector::{
    assemble_dirac_load_vector, assemble_neumann_load_vector, assemble_neumann_load_vector_on_side,
    extract_sub_vector,
};
pub use stiffness::{assemble_stiffness_matrix, extract_sub_matrix};

use crate::basis::basis_fn_indexer::BasisFnIndexer;

/// For each basis function of `sub`, the index of the same basis function in `sup`
///
/// Both indexers have to describe the same Mesh and polynomial space, and `sub` must not be of a
/// higher order than `sup`.
fn super_indices(sup: &BasisFnIndexer, sub: &BasisFnIndexer) -> Vec<usize> {
    assert!(
        std::ptr::eq(sup.mesh(), sub.mesh()),
        "Sub-problems can only be extracted over the same Mesh!"
    );
    let (sup_sfi, sub_sfi) = (sup.shape_fn_indexer(), sub.shape_fn_indexer());
    assert!(
        sup_sfi.space() == sub_sfi.space() && sub_sfi.p() <= sup_sfi.p(),
        "Cannot extract a p = {} ({} space) sub-problem from a p = {} ({} space) problem!",
        sub_sfi.p(),
        sub_sfi.space(),
        sup_sfi.p(),
        sup_sfi.space()
    );

    (0..sub.num_basis_fns())
        .map(|i| sup.index(&sub.descriptor(i)))
        .collect()
}
