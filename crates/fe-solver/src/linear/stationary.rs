//! Stationary iterations: Jacobi, Gauss-Seidel/SOR and SSOR.

use super::{Monitor, nonzero_diagonal, residual};
use crate::error::SolverResult;
use fe_core::numeric::norm;
use fe_sparse::SparseMatrix;

pub(crate) fn jacobi(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let diagonal = nonzero_diagonal(a)?;

    while monitor.has_budget() {
        let ax = a.mlt(x);
        for i in 0..x.len() {
            x[i] += (b[i] - ax[i]) / diagonal[i];
        }
        if monitor.step(norm(&residual(a, b, x)))? {
            break;
        }
    }
    Ok(())
}

/// Successive over-relaxation; `omega = 1` is Gauss-Seidel.
pub(crate) fn sor(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    omega: f64,
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let diagonal = nonzero_diagonal(a)?;

    while monitor.has_budget() {
        for i in 0..x.len() {
            relax_row(a, b, x, &diagonal, omega, i);
        }
        if monitor.step(norm(&residual(a, b, x)))? {
            break;
        }
    }
    Ok(())
}

/// Symmetric SOR: one forward and one backward sweep per iteration.
pub(crate) fn ssor(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    omega: f64,
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let diagonal = nonzero_diagonal(a)?;

    while monitor.has_budget() {
        for i in 0..x.len() {
            relax_row(a, b, x, &diagonal, omega, i);
        }
        for i in (0..x.len()).rev() {
            relax_row(a, b, x, &diagonal, omega, i);
        }
        if monitor.step(norm(&residual(a, b, x)))? {
            break;
        }
    }
    Ok(())
}

fn relax_row(a: &SparseMatrix, b: &[f64], x: &mut [f64], diagonal: &[f64], omega: f64, i: usize) {
    let off_diagonal: f64 = a
        .row(i)
        .iter()
        .filter(|item| item.index != i)
        .map(|item| item.value * x[item.index])
        .sum();
    let gauss_seidel = (b[i] - off_diagonal) / diagonal[i];
    x[i] = (1.0 - omega) * x[i] + omega * gauss_seidel;
}
