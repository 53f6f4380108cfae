//! Row-indexed sparse matrix built from `SparseVector` rows.

use crate::vector::SparseVector;
use fe_core::numeric::{norm, scientific};
use nalgebra::DMatrix;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Sparse matrix assembled incrementally by `(row, col)` contributions.
///
/// The row count only ever grows under `add_value`. The column count is
/// implicit: one past the largest column index ever stored.
///
/// Not internally synchronized: concurrent assembly must be partitioned by
/// row or merged serially by the caller.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SparseMatrix {
    rows: Vec<SparseVector<f64>>,
}

impl SparseMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Matrix with `n_rows` empty rows.
    pub fn with_rows(n_rows: usize) -> Self {
        Self {
            rows: vec![SparseVector::new(); n_rows],
        }
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    /// One past the largest stored column index (0 when nothing is stored).
    pub fn n_columns(&self) -> usize {
        self.rows
            .iter()
            .filter_map(|row| row.max_index())
            .max()
            .map_or(0, |col| col + 1)
    }

    pub fn n_non_zeros(&self) -> usize {
        self.rows.iter().map(SparseVector::len).sum()
    }

    /// # Panics
    ///
    /// Panics if `row >= self.n_rows()`.
    pub fn row(&self, row: usize) -> &SparseVector<f64> {
        assert!(
            row < self.rows.len(),
            "sparse matrix row {} out of bounds (rows={})",
            row,
            self.rows.len()
        );
        &self.rows[row]
    }

    /// Accumulate `value` at `(row, col)`, growing the row storage if needed.
    pub fn add_value(&mut self, row: usize, col: usize, value: f64) {
        if row >= self.rows.len() {
            self.rows.resize_with(row + 1, SparseVector::new);
        }
        self.rows[row].add_value(col, value);
    }

    /// Value stored at storage `position` of `row`.
    pub fn get_value(&self, row: usize, position: usize) -> f64 {
        self.row(row).get_value(position)
    }

    /// Logical column stored at storage `position` of `row`.
    pub fn get_column_index(&self, row: usize, position: usize) -> usize {
        self.row(row).get_index(position)
    }

    /// Value at `(row, col)`; exactly `0.0` when nothing is stored there.
    pub fn find_value(&self, row: usize, col: usize) -> f64 {
        self.rows.get(row).map_or(0.0, |r| r.value_at(col))
    }

    /// Storage position of column `col` within `row`, if stored.
    pub fn find_column_position(&self, row: usize, col: usize) -> Option<usize> {
        self.rows.get(row).and_then(|r| r.find_position(col))
    }

    /// Euclidean norm of the row-sum vector.
    ///
    /// Each row is reduced to the sum of its stored values first; this is a
    /// structural diagnostic and not the Frobenius norm.
    pub fn find_norm(&self) -> f64 {
        let row_sums: Vec<f64> = self
            .rows
            .iter()
            .map(|row| row.iter().map(|item| item.value).sum::<f64>())
            .collect();
        norm(&row_sums)
    }

    /// Sum of the diagonal.
    pub fn find_trace(&self) -> f64 {
        (0..self.rows.len()).map(|i| self.find_value(i, i)).sum()
    }

    pub fn diagonal(&self) -> Vec<f64> {
        (0..self.rows.len()).map(|i| self.find_value(i, i)).collect()
    }

    /// Accumulate `other` into `self` row by row.
    pub fn add_matrix(&mut self, other: &SparseMatrix) {
        if other.rows.len() > self.rows.len() {
            self.rows.resize_with(other.rows.len(), SparseVector::new);
        }
        for (row, other_row) in self.rows.iter_mut().zip(&other.rows) {
            row.add_vector(other_row);
        }
    }

    /// Matrix-vector product `y = A x`.
    ///
    /// `x` is indexed by each item's logical column. Rows are independent and
    /// are evaluated in parallel.
    ///
    /// # Panics
    ///
    /// Panics if `x` is shorter than `self.n_columns()`.
    pub fn mlt(&self, x: &[f64]) -> Vec<f64> {
        let n_columns = self.n_columns();
        assert!(
            x.len() >= n_columns,
            "vector of length {} too short for matrix with {} columns",
            x.len(),
            n_columns
        );
        self.rows
            .par_iter()
            .map(|row| row.iter().map(|item| item.value * x[item.index]).sum::<f64>())
            .collect()
    }

    /// Transposed product `y = Aᵀ x`; `y` has `n_columns()` entries.
    ///
    /// # Panics
    ///
    /// Panics if `x` is shorter than `self.n_rows()`.
    pub fn mlt_transposed(&self, x: &[f64]) -> Vec<f64> {
        assert!(
            x.len() >= self.rows.len(),
            "vector of length {} too short for matrix with {} rows",
            x.len(),
            self.rows.len()
        );
        let mut y = vec![0.0; self.n_columns()];
        for (row, &xi) in self.rows.iter().zip(x) {
            for item in row.iter() {
                y[item.index] += item.value * xi;
            }
        }
        y
    }

    /// Dense copy with `n_rows() x n_columns()` entries.
    pub fn to_dense(&self) -> DMatrix<f64> {
        let mut dense = DMatrix::zeros(self.rows.len(), self.n_columns());
        for (i, row) in self.rows.iter().enumerate() {
            for item in row.iter() {
                dense[(i, item.index)] = item.value;
            }
        }
        dense
    }

    /// Drop every row.
    pub fn clear(&mut self) {
        self.rows.clear();
    }
}

impl fmt::Display for SparseMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n_columns = self.n_columns();
        for row in &self.rows {
            let values: Vec<String> = row
                .get_values(n_columns)
                .iter()
                .map(|v| format!("{:>13}", scientific(*v, 6)))
                .collect();
            writeln!(f, "{}", values.join(" "))?;
        }
        Ok(())
    }
}
