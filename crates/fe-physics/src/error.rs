//! Error types for physics solvers.

use fe_core::CoreError;
use fe_solver::SolverError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhysicsError {
    #[error("Invalid input: {what}")]
    InvalidInput { what: String },

    #[error("Unsupported problem type: {what}")]
    Unsupported { what: String },

    #[error("{solver} solver failed in {phase}: {message}")]
    Phase {
        solver: String,
        phase: &'static str,
        message: String,
    },

    #[error("Matrix solver error: {0}")]
    Solver(#[from] SolverError),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type PhysicsResult<T> = Result<T, PhysicsError>;
