//! Index bookkeeping and small numeric helpers shared by the SH modules.

use crate::util::{ShError, ShResult};

/// Flat coefficient index of `(l, m)`: `l * (l + 1) + m`.
///
/// Callers must ensure `l >= 0` and `|m| <= l`.
#[inline]
pub fn sh_index(l: i32, m: i32) -> usize {
    debug_assert!(l >= 0 && m.abs() <= l);
    (l * (l + 1) + m) as usize
}

/// Number of coefficients for `num_bands` bands.
#[inline]
pub fn coefficient_count(num_bands: usize) -> usize {
    num_bands * num_bands
}

/// Returns the band count for a coefficient vector length.
///
/// The length must be a non-zero perfect square.
pub fn band_count(len: usize) -> ShResult<usize> {
    if len == 0 {
        return Err(ShError::EmptyInput {
            context: "coefficient vector",
        });
    }
    let mut bands = (len as f64).sqrt().floor() as usize;
    // Correct for sqrt rounding on large inputs.
    while bands * bands > len {
        bands -= 1;
    }
    while (bands + 1) * (bands + 1) <= len {
        bands += 1;
    }
    if bands * bands != len {
        return Err(ShError::InvalidArgument {
            reason: "coefficient count is not a perfect square",
        });
    }
    Ok(bands)
}

/// Validates a band count and returns it as a degree bound.
pub(crate) fn checked_bands(num_bands: usize) -> ShResult<i32> {
    if num_bands == 0 {
        return Err(ShError::InvalidArgument {
            reason: "num_bands must be >= 1",
        });
    }
    // Keeps l * (l + 1) + m inside i32.
    if num_bands > 46_000 {
        return Err(ShError::InvalidArgument {
            reason: "num_bands is too large",
        });
    }
    Ok(num_bands as i32)
}

/// Computes `a! / b!` as a running product.
pub(crate) fn factorial_ratio(a: u32, b: u32) -> f64 {
    if a == b {
        return 1.0;
    }
    let (lo, hi) = if a < b { (a, b) } else { (b, a) };
    let mut prod = 1.0f64;
    for k in (lo + 1)..=hi {
        prod *= k as f64;
    }
    if a < b {
        1.0 / prod
    } else {
        prod
    }
}

/// Kronecker delta as a float.
#[inline]
pub(crate) fn kronecker(a: i32, b: i32) -> f64 {
    if a == b {
        1.0
    } else {
        0.0
    }
}

/// Wraps an angle in radians to `[0, 2pi)`.
pub(crate) fn wrap_two_pi(angle: f64) -> f64 {
    let tau = std::f64::consts::TAU;
    let wrapped = angle.rem_euclid(tau);
    if wrapped >= tau {
        0.0
    } else {
        wrapped
    }
}
