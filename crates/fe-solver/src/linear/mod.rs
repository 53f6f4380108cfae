//! Linear solvers for `A x = b` on sparse matrices.
//!
//! All methods share one reporting path: every iteration updates an
//! `IterationInfo` with the scaled residual `‖b − Ax‖ / ‖b‖`, prints it at
//! the configured frequency and stops on `IterationInfo::has_converged`.
//! Running out of iterations or diverging is not an error; the caller gets
//! the last iterate with `converged = false`. A solution with non-finite
//! entries is rejected.

mod direct;
mod gmres;
mod krylov;
mod stationary;

use crate::error::{SolverError, SolverResult};
use crate::iteration::IterationInfo;
use crate::matrix_config::{MatrixSolverConfig, MatrixSolverType};
use fe_core::numeric::{ensure_finite, norm};
use fe_sparse::SparseMatrix;

/// Result of one linear solve.
#[derive(Clone, Debug)]
pub struct LinearSolution {
    pub x: Vec<f64>,
    /// Iterations performed
    pub iterations: usize,
    /// Final scaled residual
    pub error: f64,
    pub converged: bool,
}

/// Solve `a x = b` starting from `x0` with the method selected by `config`.
pub fn solve(
    a: &SparseMatrix,
    b: &[f64],
    x0: &[f64],
    config: &MatrixSolverConfig,
) -> SolverResult<LinearSolution> {
    config.validate()?;

    let n = b.len();
    if a.n_rows() != n || a.n_columns() > n {
        return Err(SolverError::InvalidInput {
            what: format!(
                "matrix is {}x{} but right-hand side has {} entries",
                a.n_rows(),
                a.n_columns(),
                n
            ),
        });
    }
    if x0.len() != n {
        return Err(SolverError::InvalidInput {
            what: format!("initial guess has {} entries, expected {}", x0.len(), n),
        });
    }

    let mut monitor = Monitor::new(config, scale_of(b));
    let mut x = x0.to_vec();

    if n == 0 {
        return Ok(LinearSolution {
            x,
            iterations: 0,
            error: 0.0,
            converged: true,
        });
    }

    let initial_error = monitor.scaled(&residual(a, b, &x));
    if initial_error < config.convergence_threshold {
        return Ok(LinearSolution {
            x,
            iterations: 0,
            error: initial_error,
            converged: true,
        });
    }

    match config.solver_type {
        MatrixSolverType::None => direct::lu(a, b, &mut x, &mut monitor)?,
        MatrixSolverType::Jacobi => stationary::jacobi(a, b, &mut x, &mut monitor)?,
        MatrixSolverType::GaussSeidel => stationary::sor(a, b, &mut x, 1.0, &mut monitor)?,
        MatrixSolverType::Sor => {
            stationary::sor(a, b, &mut x, config.relaxation_factor, &mut monitor)?
        }
        MatrixSolverType::Ssor => {
            stationary::ssor(a, b, &mut x, config.relaxation_factor, &mut monitor)?
        }
        MatrixSolverType::Cg => krylov::cg(a, b, &mut x, &mut monitor)?,
        MatrixSolverType::Cgs => krylov::cgs(a, b, &mut x, &mut monitor)?,
        MatrixSolverType::BiCg => krylov::bicg(a, b, &mut x, &mut monitor)?,
        MatrixSolverType::BiCgStab => krylov::bicgstab(a, b, &mut x, &mut monitor)?,
        MatrixSolverType::Gmres => gmres::gmres(
            a,
            b,
            &mut x,
            config.inner_iterations,
            config.outer_iterations,
            &mut monitor,
        )?,
        MatrixSolverType::Qmr => krylov::tfqmr(a, b, &mut x, &mut monitor)?,
        MatrixSolverType::Chebyshev => krylov::chebyshev(a, b, &mut x, &mut monitor)?,
    }

    for &value in &x {
        ensure_finite(value, "matrix solution")?;
    }
    // IterationInfo also stops on a non-finite error; that stop is a failure
    let error = monitor.scaled(&residual(a, b, &x));
    let converged =
        error.is_finite() && (error < config.convergence_threshold || monitor.converged());
    if !converged {
        tracing::warn!(
            solver = %config.solver_type,
            iterations = monitor.iterations(),
            error,
            "matrix solver did not converge"
        );
    }

    Ok(LinearSolution {
        x,
        iterations: monitor.iterations(),
        error,
        converged,
    })
}

/// Per-solve iteration bookkeeping shared by all methods.
pub(crate) struct Monitor {
    info: IterationInfo,
    converged: bool,
}

impl Monitor {
    fn new(config: &MatrixSolverConfig, equation_scale: f64) -> Self {
        let mut info = IterationInfo::new(
            config.max_iterations(),
            config.convergence_threshold,
            config.output_frequency,
        );
        info.set_equation_scale(equation_scale);
        info.set_output_file_name(config.output_file_name.clone());
        Self {
            info,
            converged: false,
        }
    }

    fn scaled(&self, r: &[f64]) -> f64 {
        norm(r) / self.info.equation_scale()
    }

    /// Whether another iteration is allowed.
    pub(crate) fn has_budget(&self) -> bool {
        !self.converged && self.info.iteration() < self.info.n_iterations()
    }

    /// Record one iteration with unscaled residual norm `residual_norm`.
    ///
    /// Returns true once the iteration has converged.
    pub(crate) fn step(&mut self, residual_norm: f64) -> SolverResult<bool> {
        self.info.set_iteration(self.info.iteration() + 1);
        self.info.set_error(residual_norm / self.info.equation_scale());
        self.converged = self.info.has_converged();
        self.info.print_iteration()?;
        Ok(self.converged)
    }

    /// Scaled error below which an iterate counts as converged.
    pub(crate) fn tolerance(&self) -> f64 {
        self.info.convergence_value() * self.info.equation_scale()
    }

    pub(crate) fn iterations(&self) -> usize {
        self.info.iteration()
    }

    pub(crate) fn converged(&self) -> bool {
        self.converged
    }
}

fn scale_of(b: &[f64]) -> f64 {
    let scale = norm(b);
    if scale.is_normal() { scale } else { 1.0 }
}

/// `b − A x`
pub(crate) fn residual(a: &SparseMatrix, b: &[f64], x: &[f64]) -> Vec<f64> {
    a.mlt(x).iter().zip(b).map(|(ax, bi)| bi - ax).collect()
}

/// `y += alpha * x`
pub(crate) fn axpy(alpha: f64, x: &[f64], y: &mut [f64]) {
    for (yi, xi) in y.iter_mut().zip(x) {
        *yi += alpha * xi;
    }
}

/// Diagonal of `a`, rejecting zero pivots.
pub(crate) fn nonzero_diagonal(a: &SparseMatrix) -> SolverResult<Vec<f64>> {
    let diagonal = a.diagonal();
    if let Some(row) = diagonal.iter().position(|d| *d == 0.0) {
        return Err(SolverError::InvalidInput {
            what: format!("zero diagonal entry at row {}", row),
        });
    }
    Ok(diagonal)
}
