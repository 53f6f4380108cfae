//! Restarted GMRES with Givens rotations.

use super::{Monitor, axpy, residual};
use crate::error::SolverResult;
use fe_core::numeric::{dot, norm};
use fe_sparse::SparseMatrix;

/// GMRES(`restart`) with at most `cycles` restarts.
pub(crate) fn gmres(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    restart: usize,
    cycles: usize,
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let m = restart.max(1);

    for _ in 0..cycles {
        if !monitor.has_budget() {
            break;
        }
        let r = residual(a, b, x);
        let beta = norm(&r);
        if beta == 0.0 {
            break;
        }

        let mut basis: Vec<Vec<f64>> = Vec::with_capacity(m + 1);
        basis.push(r.iter().map(|ri| ri / beta).collect());
        let mut h = vec![vec![0.0; m]; m + 1];
        let mut cs = vec![0.0; m];
        let mut sn = vec![0.0; m];
        let mut g = vec![0.0; m + 1];
        g[0] = beta;

        let mut k = 0;
        let mut stop = false;
        for j in 0..m {
            if !monitor.has_budget() {
                break;
            }

            // Arnoldi step (modified Gram-Schmidt)
            let mut w = a.mlt(&basis[j]);
            for (i, v) in basis.iter().enumerate() {
                h[i][j] = dot(&w, v);
                axpy(-h[i][j], v, &mut w);
            }
            let h_next = norm(&w);
            h[j + 1][j] = h_next;

            for i in 0..j {
                let temp = cs[i] * h[i][j] + sn[i] * h[i + 1][j];
                h[i + 1][j] = -sn[i] * h[i][j] + cs[i] * h[i + 1][j];
                h[i][j] = temp;
            }

            let denominator = h[j][j].hypot(h[j + 1][j]);
            if denominator == 0.0 {
                stop = true;
                break;
            }
            cs[j] = h[j][j] / denominator;
            sn[j] = h[j + 1][j] / denominator;
            h[j][j] = denominator;
            h[j + 1][j] = 0.0;
            g[j + 1] = -sn[j] * g[j];
            g[j] *= cs[j];
            k = j + 1;

            if monitor.step(g[j + 1].abs())? || h_next == 0.0 {
                stop = true;
                break;
            }
            basis.push(w.iter().map(|wi| wi / h_next).collect());
        }

        // Back substitution on the k x k triangle
        let mut y = vec![0.0; k];
        for i in (0..k).rev() {
            let tail: f64 = (i + 1..k).map(|l| h[i][l] * y[l]).sum();
            y[i] = (g[i] - tail) / h[i][i];
        }
        for (yi, v) in y.iter().zip(&basis) {
            axpy(*yi, v, x);
        }

        if stop {
            break;
        }
    }
    Ok(())
}
