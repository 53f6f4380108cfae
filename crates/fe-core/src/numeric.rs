use crate::{CoreError, CoreResult};

/// Floating point type used throughout system
pub type Real = f64;

/// Square of the machine epsilon; trends below this count as stagnation.
pub const MACHINE_EPSILON_SQUARED: Real = Real::EPSILON * Real::EPSILON;

/// `v` itself when finite.
pub fn ensure_finite(v: Real, what: &'static str) -> CoreResult<Real> {
    if v.is_finite() {
        Ok(v)
    } else {
        Err(CoreError::NonFinite { what, value: v })
    }
}

/// Dot product of two dense vectors of equal length.
pub fn dot(a: &[Real], b: &[Real]) -> Real {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Euclidean norm of a dense vector.
pub fn norm(a: &[Real]) -> Real {
    dot(a, a).sqrt()
}

/// Format a value the way C's `%.{precision}e` does: `1.234560e+02`.
///
/// Rust's `{:e}` omits the exponent sign and padding, which breaks column
/// alignment in convergence logs.
pub fn scientific(value: Real, precision: usize) -> String {
    if !value.is_finite() {
        return if value.is_nan() {
            "NaN".to_string()
        } else if value > 0.0 {
            "inf".to_string()
        } else {
            "-inf".to_string()
        };
    }

    let raw = format!("{:.*e}", precision, value);
    match raw.split_once('e') {
        Some((mantissa, exponent)) => {
            let exp: i32 = exponent.parse().unwrap_or(0);
            let sign = if exp < 0 { '-' } else { '+' };
            format!("{}e{}{:02}", mantissa, sign, exp.abs())
        }
        None => raw,
    }
}
