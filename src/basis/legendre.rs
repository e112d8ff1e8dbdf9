//! Associated Legendre polynomials via the standard three-step recurrence.

use crate::util::{ShError, ShResult};

/// Evaluates the associated Legendre polynomial `P_l^m(x)`.
///
/// Uses the Condon-Shortley phase, so `P(1, 1, x) = -sqrt(1 - x^2)`.
/// Requires `l >= 0`, `0 <= m <= l` and `x` in `[-1, 1]`.
pub fn legendre(l: i32, m: i32, x: f64) -> ShResult<f64> {
    if l < 0 {
        return Err(ShError::InvalidArgument {
            reason: "legendre degree l must be >= 0",
        });
    }
    if m < 0 || m > l {
        return Err(ShError::InvalidArgument {
            reason: "legendre order m must lie in [0, l]",
        });
    }
    if !(-1.0..=1.0).contains(&x) {
        return Err(ShError::InvalidArgument {
            reason: "legendre argument x must lie in [-1, 1]",
        });
    }
    Ok(legendre_unchecked(l, m, x))
}

/// Recurrence body; arguments must already be validated.
pub(crate) fn legendre_unchecked(l: i32, m: i32, x: f64) -> f64 {
    // P_m^m = (-1)^m (2m-1)!! (1-x^2)^(m/2)
    let mut p_mm = 1.0f64;
    if m > 0 {
        let somx2 = ((1.0 - x) * (1.0 + x)).sqrt();
        let mut fact = 1.0f64;
        for _ in 1..=m {
            p_mm *= -fact * somx2;
            fact += 2.0;
        }
    }
    if l == m {
        return p_mm;
    }

    let mut p_mmp1 = x * (2.0 * m as f64 + 1.0) * p_mm;
    if l == m + 1 {
        return p_mmp1;
    }

    let mut p_ll = 0.0f64;
    for ll in (m + 2)..=l {
        let llf = ll as f64;
        let mf = m as f64;
        p_ll = ((2.0 * llf - 1.0) * x * p_mmp1 - (llf + mf - 1.0) * p_mm) / (llf - mf);
        p_mm = p_mmp1;
        p_mmp1 = p_ll;
    }
    p_ll
}
