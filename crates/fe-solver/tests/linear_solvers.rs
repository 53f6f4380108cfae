//! Every matrix solver type against a dense reference solution.

use fe_core::CoreError;
use fe_solver::{MatrixSolverConfig, MatrixSolverType, SolverError, solve};
use fe_sparse::SparseMatrix;
use nalgebra::DVector;

/// Tridiagonal matrix with constant bands.
fn tridiagonal(n: usize, lower: f64, diagonal: f64, upper: f64) -> SparseMatrix {
    let mut a = SparseMatrix::new();
    for i in 0..n {
        a.add_value(i, i, diagonal);
        if i > 0 {
            a.add_value(i, i - 1, lower);
        }
        if i + 1 < n {
            a.add_value(i, i + 1, upper);
        }
    }
    a
}

fn rhs(n: usize) -> Vec<f64> {
    (0..n).map(|i| 1.0 + (i as f64 * 0.7).sin()).collect()
}

fn reference(a: &SparseMatrix, b: &[f64]) -> Vec<f64> {
    let x = a
        .to_dense()
        .lu()
        .solve(&DVector::from_column_slice(b))
        .unwrap();
    x.as_slice().to_vec()
}

fn max_diff(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y).abs())
        .fold(0.0, f64::max)
}

fn check(solver_type: MatrixSolverType, a: &SparseMatrix, b: &[f64]) {
    let mut config = MatrixSolverConfig::new(solver_type);
    config.convergence_threshold = 1e-10;

    let x0 = vec![0.0; b.len()];
    let sol = solve(a, b, &x0, &config).unwrap();
    let expected = reference(a, b);

    assert!(sol.converged, "{} did not converge: {:?}", solver_type, sol);
    assert!(sol.iterations > 0, "{} did no work", solver_type);
    assert!(
        max_diff(&sol.x, &expected) < 1e-7,
        "{} solution off by {}",
        solver_type,
        max_diff(&sol.x, &expected)
    );
}

#[test]
fn all_solvers_handle_spd_system() {
    let a = tridiagonal(20, -1.0, 4.0, -1.0);
    let b = rhs(20);
    for solver_type in MatrixSolverType::ALL {
        check(solver_type, &a, &b);
    }
}

#[test]
fn nonsymmetric_capable_solvers_handle_convection_system() {
    // Upwind-like, diagonally dominant, not symmetric
    let a = tridiagonal(25, -1.5, 4.0, -0.5);
    let b = rhs(25);
    for solver_type in MatrixSolverType::ALL
        .into_iter()
        .filter(|t| !t.requires_symmetric())
    {
        check(solver_type, &a, &b);
    }
}

#[test]
fn gmres_restarts_when_krylov_space_is_small() {
    let a = tridiagonal(40, -1.2, 3.0, -0.8);
    let b = rhs(40);

    let mut config = MatrixSolverConfig::new(MatrixSolverType::Gmres);
    config.inner_iterations = 5;
    config.outer_iterations = 200;
    config.convergence_threshold = 1e-10;

    let sol = solve(&a, &b, &vec![0.0; 40], &config).unwrap();
    assert!(sol.converged);
    assert!(sol.iterations > 5);
    assert!(max_diff(&sol.x, &reference(&a, &b)) < 1e-7);
}

#[test]
fn iteration_limit_is_advisory() {
    let a = tridiagonal(50, -1.0, 2.0, -1.0);
    let b = rhs(50);

    let mut config = MatrixSolverConfig::new(MatrixSolverType::Jacobi);
    config.inner_iterations = 3;
    config.convergence_threshold = 1e-12;

    let sol = solve(&a, &b, &vec![0.0; 50], &config).unwrap();
    assert!(!sol.converged);
    assert_eq!(sol.iterations, 3);
    assert!(sol.error > 1e-12);
}

#[test]
fn warm_start_reduces_iterations() {
    let a = tridiagonal(30, -1.0, 4.0, -1.0);
    let b = rhs(30);
    let mut config = MatrixSolverConfig::new(MatrixSolverType::GaussSeidel);
    config.convergence_threshold = 1e-10;

    let cold = solve(&a, &b, &vec![0.0; 30], &config).unwrap();
    let mut near = reference(&a, &b);
    for v in &mut near {
        *v += 1e-6;
    }
    let warm = solve(&a, &b, &near, &config).unwrap();

    assert!(warm.iterations < cold.iterations);
}

#[test]
fn singular_matrix_fails_direct_solve() {
    let mut a = SparseMatrix::new();
    a.add_value(0, 0, 1.0);
    a.add_value(0, 1, 1.0);
    a.add_value(1, 0, 1.0);
    a.add_value(1, 1, 1.0);

    let config = MatrixSolverConfig::new(MatrixSolverType::None);
    assert!(solve(&a, &[1.0, 2.0], &[0.0, 0.0], &config).is_err());
}

#[test]
fn diverging_solve_is_not_converged() {
    // Jacobi diverges when the diagonal does not dominate
    let mut a = SparseMatrix::new();
    a.add_value(0, 0, 1.0);
    a.add_value(0, 1, 2.0);
    a.add_value(1, 0, 2.0);
    a.add_value(1, 1, 1.0);

    let mut config = MatrixSolverConfig::new(MatrixSolverType::Jacobi);
    config.inner_iterations = 5000;

    let sol = solve(&a, &[1.0, 2.0], &[0.0, 0.0], &config).unwrap();
    assert!(!sol.converged);
    assert!(sol.iterations < 5000);
    assert!(!sol.error.is_finite());
    assert!(sol.x.iter().all(|v| v.is_finite()));
}

#[test]
fn non_finite_solution_is_rejected() {
    let a = tridiagonal(3, -1.0, 2.0, -1.0);
    let config = MatrixSolverConfig::new(MatrixSolverType::Jacobi);

    let result = solve(&a, &rhs(3), &[f64::NAN, 0.0, 0.0], &config);
    assert!(matches!(
        result,
        Err(SolverError::Core(CoreError::NonFinite { .. }))
    ));
}
