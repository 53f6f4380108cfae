//! Iterative matrix solvers and convergence tracking.
//!
//! This crate provides the per-solver-type configuration consumed by the
//! physics solvers, the `IterationInfo` convergence state machine that drives
//! console and convergence-file reporting, and the iterative linear solvers
//! (stationary and Krylov) that operate on `fe_sparse::SparseMatrix`.

pub mod error;
pub mod iteration;
pub mod linear;
pub mod matrix_config;

pub use error::{SolverError, SolverResult};
pub use iteration::{IterationInfo, IterationInfoValue};
pub use linear::{LinearSolution, solve};
pub use matrix_config::{MatrixSolverConfig, MatrixSolverType};
