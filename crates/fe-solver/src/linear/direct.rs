//! Dense LU fallback for `MatrixSolverType::None`.

use super::{Monitor, residual};
use crate::error::{SolverError, SolverResult};
use fe_core::numeric::norm;
use fe_sparse::SparseMatrix;
use nalgebra::{DMatrix, DVector};

pub(crate) fn lu(
    a: &SparseMatrix,
    b: &[f64],
    x: &mut [f64],
    monitor: &mut Monitor,
) -> SolverResult<()> {
    let n = b.len();
    let mut dense = DMatrix::zeros(n, n);
    for i in 0..n {
        for item in a.row(i).iter() {
            dense[(i, item.index)] = item.value;
        }
    }

    let solution = dense
        .lu()
        .solve(&DVector::from_column_slice(b))
        .ok_or_else(|| SolverError::Numeric {
            what: "matrix is singular".to_string(),
        })?;
    x.copy_from_slice(solution.as_slice());

    monitor.step(norm(&residual(a, b, x)))?;
    Ok(())
}
