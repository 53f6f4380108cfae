//! Error types for solver operations.

use fe_core::CoreError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while configuring or running a matrix solver.
#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Numeric error: {what}")]
    Numeric { what: String },

    #[error("Failed to write convergence file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Core error: {0}")]
    Core(#[from] CoreError),
}

pub type SolverResult<T> = Result<T, SolverError>;
