//! Krylov subspace methods and Chebyshev iteration.
//!
//! A vanishing inner product (breakdown) ends the iteration early; the
//! caller then judges convergence from the true residual.

use super::{Monitor, axpy, residual};
use crate::error::SolverResult;
use fe_core::numeric::{dot, norm};
use fe_sparse::SparseMatrix;

/// Conjugate gradients (symmetric positive definite matrices).
pub(crate) fn cg(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let mut r = residual(a, b, x);
    let mut p = r.clone();
    let mut rr = dot(&r, &r);

    while monitor.has_budget() {
        let ap = a.mlt(&p);
        let pap = dot(&p, &ap);
        if pap == 0.0 {
            break;
        }
        let alpha = rr / pap;
        axpy(alpha, &p, x);
        axpy(-alpha, &ap, &mut r);

        let rr_new = dot(&r, &r);
        if monitor.step(rr_new.sqrt())? {
            break;
        }

        let beta = rr_new / rr;
        for (pi, ri) in p.iter_mut().zip(&r) {
            *pi = ri + beta * *pi;
        }
        rr = rr_new;
    }
    Ok(())
}

/// Conjugate gradients squared.
pub(crate) fn cgs(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let n = x.len();
    let mut r = residual(a, b, x);
    let r_tilde = r.clone();
    let mut p = vec![0.0; n];
    let mut q = vec![0.0; n];
    let mut u = vec![0.0; n];
    let mut rho_prev = 1.0;
    let mut first = true;

    while monitor.has_budget() {
        let rho = dot(&r_tilde, &r);
        if rho == 0.0 {
            break;
        }
        if first {
            u.copy_from_slice(&r);
            p.copy_from_slice(&u);
            first = false;
        } else {
            let beta = rho / rho_prev;
            for i in 0..n {
                u[i] = r[i] + beta * q[i];
                p[i] = u[i] + beta * (q[i] + beta * p[i]);
            }
        }

        let v = a.mlt(&p);
        let sigma = dot(&r_tilde, &v);
        if sigma == 0.0 {
            break;
        }
        let alpha = rho / sigma;
        for i in 0..n {
            q[i] = u[i] - alpha * v[i];
        }
        let u_plus_q: Vec<f64> = u.iter().zip(&q).map(|(ui, qi)| ui + qi).collect();
        axpy(alpha, &u_plus_q, x);
        let a_uq = a.mlt(&u_plus_q);
        axpy(-alpha, &a_uq, &mut r);

        if monitor.step(norm(&r))? {
            break;
        }
        rho_prev = rho;
    }
    Ok(())
}

/// Biconjugate gradients; needs products with the transpose.
pub(crate) fn bicg(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let mut r = residual(a, b, x);
    let mut r_tilde = r.clone();
    let mut p = r.clone();
    let mut p_tilde = r_tilde.clone();
    let mut rho = dot(&r_tilde, &r);

    while monitor.has_budget() {
        let q = a.mlt(&p);
        let q_tilde = transposed(a, &p_tilde);
        let denominator = dot(&p_tilde, &q);
        if denominator == 0.0 {
            break;
        }
        let alpha = rho / denominator;
        axpy(alpha, &p, x);
        axpy(-alpha, &q, &mut r);
        axpy(-alpha, &q_tilde, &mut r_tilde);

        if monitor.step(norm(&r))? {
            break;
        }

        let rho_new = dot(&r_tilde, &r);
        if rho_new == 0.0 {
            break;
        }
        let beta = rho_new / rho;
        for i in 0..p.len() {
            p[i] = r[i] + beta * p[i];
            p_tilde[i] = r_tilde[i] + beta * p_tilde[i];
        }
        rho = rho_new;
    }
    Ok(())
}

/// Stabilized biconjugate gradients.
pub(crate) fn bicgstab(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let n = x.len();
    let mut r = residual(a, b, x);
    let r_tilde = r.clone();
    let mut p = vec![0.0; n];
    let mut v = vec![0.0; n];
    let (mut rho, mut alpha, mut omega) = (1.0, 1.0, 1.0);

    while monitor.has_budget() {
        let rho_new = dot(&r_tilde, &r);
        if rho_new == 0.0 {
            break;
        }
        let beta = (rho_new / rho) * (alpha / omega);
        for i in 0..n {
            p[i] = r[i] + beta * (p[i] - omega * v[i]);
        }
        v = a.mlt(&p);
        let denominator = dot(&r_tilde, &v);
        if denominator == 0.0 {
            break;
        }
        alpha = rho_new / denominator;

        let s: Vec<f64> = r.iter().zip(&v).map(|(ri, vi)| ri - alpha * vi).collect();
        let s_norm = norm(&s);
        if s_norm < monitor.tolerance() {
            axpy(alpha, &p, x);
            monitor.step(s_norm)?;
            break;
        }

        let t = a.mlt(&s);
        let tt = dot(&t, &t);
        if tt == 0.0 {
            break;
        }
        omega = dot(&t, &s) / tt;
        axpy(alpha, &p, x);
        axpy(omega, &s, x);
        for i in 0..n {
            r[i] = s[i] - omega * t[i];
        }

        if monitor.step(norm(&r))? || omega == 0.0 {
            break;
        }
        rho = rho_new;
    }
    Ok(())
}

/// Transpose-free quasi-minimal residual.
pub(crate) fn tfqmr(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let n = x.len();
    let r = residual(a, b, x);
    let r_tilde = r.clone();
    let mut w = r.clone();
    let mut u = r.clone();
    let mut v = a.mlt(&u);
    let mut au = v.clone();
    let mut d = vec![0.0; n];
    let mut tau = norm(&r);
    let (mut theta, mut eta, mut alpha) = (0.0_f64, 0.0_f64, 0.0_f64);
    let mut rho = dot(&r_tilde, &r);
    let mut m = 0usize;

    while monitor.has_budget() {
        if m % 2 == 0 {
            let sigma = dot(&v, &r_tilde);
            if sigma == 0.0 {
                break;
            }
            alpha = rho / sigma;
        }

        axpy(-alpha, &au, &mut w);
        let weight = theta * theta * eta / alpha;
        for i in 0..n {
            d[i] = u[i] + weight * d[i];
        }
        theta = norm(&w) / tau;
        let c = 1.0 / (1.0 + theta * theta).sqrt();
        tau *= theta * c;
        eta = c * c * alpha;
        axpy(eta, &d, x);

        if monitor.step(norm(&residual(a, b, x)))? || tau == 0.0 {
            break;
        }

        if m % 2 == 0 {
            for i in 0..n {
                u[i] -= alpha * v[i];
            }
            au = a.mlt(&u);
        } else {
            let rho_new = dot(&w, &r_tilde);
            if rho == 0.0 {
                break;
            }
            let beta = rho_new / rho;
            for i in 0..n {
                u[i] = w[i] + beta * u[i];
            }
            let au_new = a.mlt(&u);
            for i in 0..n {
                v[i] = au_new[i] + beta * (au[i] + beta * v[i]);
            }
            au = au_new;
            rho = rho_new;
        }
        m += 1;
    }
    Ok(())
}

/// Chebyshev iteration with Gershgorin eigenvalue bounds.
///
/// Intended for symmetric positive definite matrices. A non-positive lower
/// bound is raised to 1% of the upper bound.
pub(crate) fn chebyshev(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let (mut lambda_min, lambda_max) = gershgorin_bounds(a);
    if lambda_min <= 0.0 {
        lambda_min = 0.01 * lambda_max;
    }
    let d = 0.5 * (lambda_max + lambda_min);
    let c = 0.5 * (lambda_max - lambda_min);

    let mut r = residual(a, b, x);
    let mut p = r.clone();
    let mut alpha = 0.0;
    let mut k = 0usize;

    while monitor.has_budget() {
        if k == 0 {
            p.copy_from_slice(&r);
            alpha = 1.0 / d;
        } else {
            let beta = if k == 1 {
                0.5 * (c * alpha).powi(2)
            } else {
                (0.5 * c * alpha).powi(2)
            };
            alpha = 1.0 / (d - beta / alpha);
            for (pi, ri) in p.iter_mut().zip(&r) {
                *pi = ri + beta * *pi;
            }
        }
        axpy(alpha, &p, x);
        r = residual(a, b, x);
        k += 1;

        if monitor.step(norm(&r))? {
            break;
        }
    }
    Ok(())
}

fn transposed(a: &SparseMatrix, x: &[f64]) -> Vec<f64> {
    let mut y = a.mlt_transposed(x);
    y.resize(x.len(), 0.0);
    y
}

/// `(min, max)` over rows of `a_ii ∓ Σ_{j≠i} |a_ij|`.
fn gershgorin_bounds(a: &SparseMatrix) -> (f64, f64) {
    let mut lower = f64::INFINITY;
    let mut upper = f64::NEG_INFINITY;
    for i in 0..a.n_rows() {
        let row = a.row(i);
        let radius: f64 = row
            .iter()
            .filter(|item| item.index != i)
            .map(|item| item.value.abs())
            .sum();
        let centre = row.value_at(i);
        lower = lower.min(centre - radius);
        upper = upper.max(centre + radius);
    }
    (lower, upper)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gershgorin_of_tridiagonal() {
        let mut a = SparseMatrix::new();
        for i in 0..4 {
            a.add_value(i, i, 4.0);
            if i > 0 {
                a.add_value(i, i - 1, -1.0);
            }
            if i < 3 {
                a.add_value(i, i + 1, -1.0);
            }
        }
        assert_eq!(gershgorin_bounds(&a), (2.0, 6.0));
    }
}
