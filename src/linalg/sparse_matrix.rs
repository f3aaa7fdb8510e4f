use crate::math::space::Rational;

use nalgebra::DMatrix;
use num_traits::Zero;
use rayon::prelude::*;
use std::collections::BTreeMap;

/// Wrapper around a BTreeMap to store square-symmetric matrices in a sparse data structure
///
/// Only the upper triangle is stored; an entry inserted at `[r, c]` with `r > c` is added to `[c, r]`.
#[derive(Clone, Debug, PartialEq)]
pub struct SparseMatrix {
    /// Size of the square matrix
    pub dimension: usize,
    /// Matrix Entries
    entries: BTreeMap<[usize; 2], Rational>,
}

impl SparseMatrix {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: BTreeMap::new(),
        }
    }

    /// Number of stored entries in the full (mirrored) matrix
    pub fn num_entries(&self) -> usize {
        let num_diag = self.entries.keys().filter(|[i, j]| i == j).count();
        2 * self.entries.len() - num_diag
    }

    /// Add a value into the matrix. Assumes symmetry: row/col order does not matter.
    pub fn insert(&mut self, rc: [usize; 2], value: Rational) {
        let coordinates = self.upper_tri_coordinates(rc);
        if let Some(current_value) = self.entries.get_mut(&coordinates) {
            *current_value += value;
        } else {
            self.entries.insert(coordinates, value);
        }
    }

    /// Insert a group of entries
    pub fn insert_group(&mut self, entry_group: Vec<([usize; 2], Rational)>) {
        for (rc, value) in entry_group {
            self.insert(rc, value);
        }
    }

    /// The value at `[r, c]` (zero where nothing was inserted)
    pub fn get(&self, rc: [usize; 2]) -> Rational {
        self.entries
            .get(&self.upper_tri_coordinates(rc))
            .cloned()
            .unwrap_or_else(Rational::zero)
    }

    fn upper_tri_coordinates(&self, [row_idx, col_idx]: [usize; 2]) -> [usize; 2] {
        assert!(
            row_idx < self.dimension,
            "row_idx ({}) exceeded matrix dimension ({})!",
            row_idx,
            self.dimension
        );
        assert!(
            col_idx < self.dimension,
            "col_idx ({}) exceeded matrix dimension ({})!",
            col_idx,
            self.dimension
        );

        if row_idx <= col_idx {
            [row_idx, col_idx]
        } else {
            [col_idx, row_idx]
        }
    }

    // Remove the entries from the matrix, replacing them with an empty BTreeMap.
    fn take_entries(&mut self) -> BTreeMap<[usize; 2], Rational> {
        std::mem::take(&mut self.entries)
    }

    /// Consume the entries from another sparse matrix leaving it empty.
    pub fn consume_matrix(&mut self, other: &mut Self) {
        assert!(
            self.dimension == other.dimension,
            "Sparse Matrices have different dimensions; cannot consume matrix!"
        );

        for (coordinates, value) in other.take_entries() {
            if let Some(current_value) = self.entries.get_mut(&coordinates) {
                *current_value += value;
            } else {
                self.entries.insert(coordinates, value);
            }
        }
    }

    /// Iterate over the upper triangle of the matrix.
    pub fn iter_upper_tri(&self) -> impl Iterator<Item = ([usize; 2], &Rational)> + '_ {
        self.entries.iter().map(|(coords, value)| (*coords, value))
    }
}

impl ParallelExtend<SparseMatrix> for SparseMatrix {
    fn par_extend<I>(&mut self, sub_matrices: I)
    where
        I: IntoParallelIterator<Item = SparseMatrix>,
    {
        let dimension = self.dimension;
        let mut combined = sub_matrices.into_par_iter().reduce(
            || SparseMatrix::new(dimension),
            |mut acc, mut sub_matrix| {
                acc.consume_matrix(&mut sub_matrix);
                acc
            },
        );
        self.consume_matrix(&mut combined);
    }
}

/// Mirror the upper triangle into a full dense matrix
impl From<SparseMatrix> for DMatrix<Rational> {
    fn from(mut sm: SparseMatrix) -> Self {
        let mut dense = DMatrix::from_element(sm.dimension, sm.dimension, Rational::zero());

        for ([r, c], v) in sm.take_entries() {
            if r != c {
                dense[(c, r)] = v.clone();
            }
            dense[(r, c)] = v;
        }

        dense
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::space::{frac, int};

    #[test]
    fn value_insertion() {
        let mut sm = SparseMatrix::new(10);

        sm.insert([0, 0], int(1));
        sm.insert([0, 0], int(1));
        sm.insert([9, 9], int(10));
        sm.insert([4, 3], frac(1, 4));
        sm.insert([0, 8], frac(1, 8));
        sm.insert([8, 0], frac(1, 8));

        assert_eq!(sm.num_entries(), 6);
        assert_eq!(sm.get([3, 4]), frac(1, 4));
        assert_eq!(sm.get([4, 3]), frac(1, 4));

        let raw_entries = sm.take_entries();

        assert_eq!(raw_entries.get(&[0, 0]), Some(&int(2)));
        assert_eq!(raw_entries.get(&[9, 9]), Some(&int(10)));
        assert_eq!(raw_entries.get(&[3, 4]), Some(&frac(1, 4)));
        assert_eq!(raw_entries.get(&[0, 8]), Some(&frac(1, 4)));

        assert!(raw_entries.get(&[4, 3]).is_none());
        assert!(raw_entries.get(&[8, 0]).is_none());
    }

    #[test]
    fn consume_another_matrix() {
        let mut sm_a = SparseMatrix::new(5);
        let mut sm_b = SparseMatrix::new(5);

        for i in 0..5 {
            sm_a.insert([i, i], int(i as i64 + 1));
            sm_b.insert([i, i], int(5 - i as i64));
        }
        sm_a.insert([0, 4], frac(1, 2));
        sm_a.insert([3, 1], frac(1, 2));
        sm_b.insert([4, 0], frac(-1, 2));
        sm_b.insert([2, 3], frac(-1, 2));

        sm_a.consume_matrix(&mut sm_b);

        assert_eq!(sm_b.num_entries(), 0);

        for i in 0..5 {
            assert_eq!(sm_a.get([i, i]), int(6));
        }
        assert!(sm_a.get([0, 4]).is_zero());
        assert_eq!(sm_a.get([1, 3]), frac(1, 2));
        assert_eq!(sm_a.get([3, 2]), frac(-1, 2));
        assert!(sm_a.get([1, 2]).is_zero());
    }

    #[test]
    fn parallel_extension() {
        let mut sm = SparseMatrix::new(4);
        sm.insert([0, 0], int(1));

        let sub_matrices: Vec<SparseMatrix> = (0..4)
            .map(|i| {
                let mut sub = SparseMatrix::new(4);
                sub.insert([i, i], int(1));
                sub.insert([3, 0], frac(1, 3));
                sub
            })
            .collect();
        sm.par_extend(sub_matrices);

        assert_eq!(sm.get([0, 0]), int(2));
        assert_eq!(sm.get([2, 2]), int(1));
        assert_eq!(sm.get([0, 3]), frac(4, 3));
    }

    #[test]
    fn dense_conversion() {
        let mut sm = SparseMatrix::new(3);
        sm.insert([0, 0], int(2));
        sm.insert([2, 1], frac(-1, 2));
        sm.insert([0, 2], int(3));

        let dense: DMatrix<Rational> = sm.into();
        assert_eq!(dense[(0, 0)], int(2));
        assert_eq!(dense[(1, 2)], frac(-1, 2));
        assert_eq!(dense[(2, 1)], frac(-1, 2));
        assert_eq!(dense[(2, 0)], int(3));
        assert!(dense[(1, 1)].is_zero());
        assert_eq!(dense, dense.transpose());
    }

    #[test]
    #[should_panic]
    fn consume_matrix_of_different_dim() {
        let mut sm_a = SparseMatrix::new(5);
        let mut sm_b = SparseMatrix::new(6);

        sm_a.consume_matrix(&mut sm_b);
    }

    #[test]
    #[should_panic]
    fn out_of_bounds_insertion() {
        let mut sm = SparseMatrix::new(10);
        sm.insert([10, 2], int(1));
    }
}
