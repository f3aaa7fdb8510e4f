/// Sparsely Packed Symmetric Matrix
pub mod sparse_matrix;

pub use sparse_matrix::SparseMatrix;

use crate::math::space::Rational;
use nalgebra::{DMatrix, DVector};
use num_traits::Zero;

/// A vector of exact zeros
pub fn zero_vector(dimension: usize) -> DVector<Rational> {
    DVector::from_element(dimension, Rational::zero())
}

/// A square matrix of exact zeros
pub fn zero_matrix(dimension: usize) -> DMatrix<Rational> {
    DMatrix::from_element(dimension, dimension, Rational::zero())
}

/// Check if a dense matrix equals its transpose
pub fn is_symmetric(m: &DMatrix<Rational>) -> bool {
    m.is_square()
        && (0..m.nrows()).all(|r| ((r + 1)..m.ncols()).all(|c| m[(r, c)] == m[(c, r)]))
}
