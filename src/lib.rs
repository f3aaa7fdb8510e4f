/// Exact rational geometry, polynomials, affine maps and quadrature
pub mod math;
/// Meshes of triangles and parallelograms
pub mod domain;
/// Hierarchical shape functions and the global numbering of basis functions
pub mod basis;
/// Exact rational sparse and dense matrix helpers
pub mod linalg;
/// Stiffness matrices and load vectors of the Laplacian
pub mod assembly;

pub use assembly::{
    assemble_dirac_load_vector, assemble_neumann_load_vector, assemble_neumann_load_vector_on_side,
    assemble_stiffness_matrix, extract_sub_matrix, extract_sub_vector,
};
pub use basis::basis_fn_indexer::BasisFnIndexer;
pub use basis::descriptor::{BasisFnDescriptor, ShapeFnDescriptor};
pub use basis::evaluator::ShapeFnEvaluator;
pub use basis::shape_fn_factory::ShapeFnFactory;
pub use basis::shape_fn_indexer::ShapeFnIndexer;
pub use basis::trial_fn::{evaluate_trial_fn, integrate_trial_fn, normalize_trial_fn};
pub use basis::{FemContext, PolySpace};
pub use domain::{Element, Mesh, Side};
pub use math::polynomial::{Polynomial1D, Polynomial2D, Var};
pub use math::quadrature::GaussLegendre1D;
pub use math::space::{Point, Rational, ReferenceShape};
