//! Matrix solver selection and parameterization.

use crate::error::{SolverError, SolverResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

/// Iterative (or direct, for `None`) linear solver kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum MatrixSolverType {
    /// Dense direct factorization; meant for small systems and debugging.
    None,
    Jacobi,
    GaussSeidel,
    Sor,
    Ssor,
    #[default]
    Cg,
    Cgs,
    BiCg,
    BiCgStab,
    Gmres,
    Qmr,
    Chebyshev,
}

impl MatrixSolverType {
    pub const ALL: [MatrixSolverType; 12] = [
        MatrixSolverType::None,
        MatrixSolverType::Jacobi,
        MatrixSolverType::GaussSeidel,
        MatrixSolverType::Sor,
        MatrixSolverType::Ssor,
        MatrixSolverType::Cg,
        MatrixSolverType::Cgs,
        MatrixSolverType::BiCg,
        MatrixSolverType::BiCgStab,
        MatrixSolverType::Gmres,
        MatrixSolverType::Qmr,
        MatrixSolverType::Chebyshev,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MatrixSolverType::None => "none",
            MatrixSolverType::Jacobi => "jacobi",
            MatrixSolverType::GaussSeidel => "gauss-seidel",
            MatrixSolverType::Sor => "sor",
            MatrixSolverType::Ssor => "ssor",
            MatrixSolverType::Cg => "cg",
            MatrixSolverType::Cgs => "cgs",
            MatrixSolverType::BiCg => "bicg",
            MatrixSolverType::BiCgStab => "bicgstab",
            MatrixSolverType::Gmres => "gmres",
            MatrixSolverType::Qmr => "qmr",
            MatrixSolverType::Chebyshev => "chebyshev",
        }
    }

    /// Whether the method only converges reliably for symmetric matrices.
    pub fn requires_symmetric(self) -> bool {
        matches!(self, MatrixSolverType::Cg | MatrixSolverType::Chebyshev)
    }
}

impl fmt::Display for MatrixSolverType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MatrixSolverType {
    type Err = SolverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase().replace('_', "-");
        MatrixSolverType::ALL
            .into_iter()
            .find(|t| t.name() == wanted)
            .ok_or_else(|| SolverError::InvalidInput {
                what: format!("unknown matrix solver type '{}'", s),
            })
    }
}

/// Per-solver-type parameters.
///
/// `output_file_name` is set at run time (it routes this solver's
/// convergence samples to a file) and is never persisted.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatrixSolverConfig {
    pub solver_type: MatrixSolverType,
    /// Iterations per cycle (Krylov dimension for GMRES)
    pub inner_iterations: usize,
    /// Number of cycles (GMRES restarts)
    pub outer_iterations: usize,
    /// Relative residual below which the solve stops
    pub convergence_threshold: f64,
    /// Report every N-th iteration; 0 disables reporting
    #[serde(default)]
    pub output_frequency: usize,
    /// Over-relaxation factor for SOR and SSOR
    #[serde(default = "default_relaxation_factor")]
    pub relaxation_factor: f64,
    #[serde(skip)]
    pub output_file_name: Option<PathBuf>,
}

fn default_relaxation_factor() -> f64 {
    1.2
}

impl MatrixSolverConfig {
    /// Default parameters for `solver_type`.
    pub fn new(solver_type: MatrixSolverType) -> Self {
        let (inner_iterations, outer_iterations) = match solver_type {
            MatrixSolverType::Gmres => (30, 100),
            MatrixSolverType::None => (1, 1),
            _ => (1000, 1),
        };
        Self {
            solver_type,
            inner_iterations,
            outer_iterations,
            convergence_threshold: 1e-8,
            output_frequency: 0,
            relaxation_factor: default_relaxation_factor(),
            output_file_name: None,
        }
    }

    /// Total iteration budget: `inner * outer`, at least one.
    pub fn max_iterations(&self) -> usize {
        self.inner_iterations
            .saturating_mul(self.outer_iterations)
            .max(1)
    }

    pub fn validate(&self) -> SolverResult<()> {
        if !self.convergence_threshold.is_finite() || self.convergence_threshold <= 0.0 {
            return Err(SolverError::InvalidInput {
                what: format!(
                    "{}: convergence threshold must be positive, got {}",
                    self.solver_type, self.convergence_threshold
                ),
            });
        }
        if self.inner_iterations == 0 || self.outer_iterations == 0 {
            return Err(SolverError::InvalidInput {
                what: format!("{}: iteration counts must be at least 1", self.solver_type),
            });
        }
        if !(self.relaxation_factor > 0.0 && self.relaxation_factor < 2.0) {
            return Err(SolverError::InvalidInput {
                what: format!(
                    "{}: relaxation factor must lie in (0, 2), got {}",
                    self.solver_type, self.relaxation_factor
                ),
            });
        }
        Ok(())
    }
}

impl Default for MatrixSolverConfig {
    fn default() -> Self {
        Self::new(MatrixSolverType::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip_through_from_str() {
        for t in MatrixSolverType::ALL {
            assert_eq!(t.name().parse::<MatrixSolverType>().unwrap(), t);
        }
        assert_eq!(
            "Gauss_Seidel".parse::<MatrixSolverType>().unwrap(),
            MatrixSolverType::GaussSeidel
        );
        assert!("lu".parse::<MatrixSolverType>().is_err());
    }

    #[test]
    fn gmres_defaults_to_restarts() {
        let cfg = MatrixSolverConfig::new(MatrixSolverType::Gmres);
        assert_eq!(cfg.inner_iterations, 30);
        assert_eq!(cfg.max_iterations(), 3000);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn validate_rejects_bad_parameters() {
        let mut cfg = MatrixSolverConfig::new(MatrixSolverType::Sor);
        cfg.convergence_threshold = 0.0;
        assert!(cfg.validate().is_err());

        let mut cfg = MatrixSolverConfig::new(MatrixSolverType::Sor);
        cfg.relaxation_factor = 2.0;
        assert!(cfg.validate().is_err());

        let mut cfg = MatrixSolverConfig::new(MatrixSolverType::Jacobi);
        cfg.outer_iterations = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn output_file_name_is_not_persisted() {
        let mut cfg = MatrixSolverConfig::new(MatrixSolverType::BiCgStab);
        cfg.output_file_name = Some(PathBuf::from("conv.dat"));

        let json = serde_json::to_string(&cfg).unwrap();
        assert!(!json.contains("conv.dat"));

        let back: MatrixSolverConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.output_file_name, None);
        assert_eq!(back.solver_type, MatrixSolverType::BiCgStab);
    }
}
