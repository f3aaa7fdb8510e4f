/// Mesh independent and mesh aware identities of basis functions
pub mod descriptor;
/// Ordering of the shape functions on a single reference shape
pub mod shape_fn_indexer;
/// Construction of the hierarchical shape functions and their derivatives
pub mod shape_fn_factory;
/// Global degree of freedom numbering and orientation of shared sides
pub mod basis_fn_indexer;
/// Cached point evaluation of shape functions
pub mod evaluator;
/// Evaluation, integration and normalization of discrete solutions
pub mod trial_fn;

use crate::domain::mesh::Mesh;

use std::fmt;

/// Which interior mode pairs `(k, l)` are included for a given polynomial order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PolySpace {
    /// The full tensor product of interior modes
    Product,
    /// A triangular cutoff of the tensor product (a strict subset of [PolySpace::Product])
    Trunk,
}

impl fmt::Display for PolySpace {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Product => write!(f, "Product"),
            Self::Trunk => write!(f, "Trunk"),
        }
    }
}

/// A Mesh, polynomial order and polynomial space: everything that determines the DoF layout
///
/// The Mesh is borrowed; any number of contexts can share one Mesh.
#[derive(Debug, Clone, Copy)]
pub struct FemContext<'m> {
    pub mesh: &'m Mesh,
    pub p: u32,
    pub space: PolySpace,
}

impl<'m> FemContext<'m> {
    pub fn new(mesh: &'m Mesh, p: u32, space: PolySpace) -> Self {
        assert!(p >= 1, "Polynomial order must be at least 1; got {}!", p);
        Self { mesh, p, space }
    }

    /// The same Mesh and polynomial space at a different order
    pub fn with_order(&self, p: u32) -> Self {
        Self::new(self.mesh, p, self.space)
    }
}
