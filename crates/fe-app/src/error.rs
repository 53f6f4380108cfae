//! Error types for the fe-app service layer.

use std::path::PathBuf;

/// Application error wrapping backend errors with the context the host
/// process reports.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Failed to read model file {path}: {message}")]
    ModelRead { path: PathBuf, message: String },

    #[error("Failed to write model file {path}: {message}")]
    ModelWrite { path: PathBuf, message: String },

    #[error("Failed to read license file {path}: {message}")]
    LicenseFile { path: PathBuf, message: String },

    #[error("License denied for physics area(s): {areas}")]
    LicenseDenied { areas: String },

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Physics error: {0}")]
    Physics(String),

    #[error("Solver error: {0}")]
    Solver(String),
}

/// Result type for fe-app operations.
pub type AppResult<T> = Result<T, AppError>;

impl From<fe_physics::PhysicsError> for AppError {
    fn from(err: fe_physics::PhysicsError) -> Self {
        AppError::Physics(err.to_string())
    }
}

impl From<fe_solver::SolverError> for AppError {
    fn from(err: fe_solver::SolverError) -> Self {
        AppError::Solver(err.to_string())
    }
}

/// Process exit status for a finished run: 0 on success, 1 on any failure.
pub fn exit_code<T>(result: &AppResult<T>) -> u8 {
    match result {
        Ok(_) => 0,
        Err(_) => 1,
    }
}
