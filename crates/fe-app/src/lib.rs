//! Application service layer for fesuite.
//!
//! Hosts the outer solve loop ([`SolverOrchestrator`]) together with the
//! collaborators it needs from the host process: license gating, a
//! cooperative stop flag and progress reporting.

pub mod error;
pub mod license;
pub mod orchestrator;
pub mod progress;
pub mod stop;

pub use error::{AppError, AppResult, exit_code};
pub use license::{
    AreaLicense, LicenseCredentials, LicenseValidator, UnrestrictedLicense, check_license,
};
pub use orchestrator::{RunOptions, RunReport, SolverOrchestrator, clamp_threads};
pub use progress::{RunProgressEvent, RunStage};
pub use stop::StopFlag;
