//! fe-sparse: sparse storage used by finite-element assembly.
//!
//! Provides:
//! - `SparseVector<T>`: index-sorted sparse row with accumulate-on-insert
//! - `SparseMatrix`: row-indexed container of `SparseVector<f64>` rows
//!
//! Rows are stored as sorted arrays rather than hash maps so iteration
//! order (printing, serialization, products) is deterministic.
//!
//! # Example
//!
//! ```
//! use fe_sparse::SparseMatrix;
//!
//! let mut a = SparseMatrix::new();
//! a.add_value(0, 0, 1.0);
//! a.add_value(0, 1, 2.0);
//! a.add_value(1, 0, 3.0);
//! a.add_value(1, 1, 4.0);
//!
//! assert_eq!(a.find_trace(), 5.0);
//! assert_eq!(a.find_norm(), 58.0_f64.sqrt());
//! ```

pub mod matrix;
pub mod vector;

pub use matrix::SparseMatrix;
pub use vector::{SparseVector, SparseVectorItem};
