//! Evaluation of truncated SH series.

use crate::basis::{Basis, BasisKind, Hemispherical, Spherical, Zonal};
use crate::sample::Direction;
use crate::util::math::{band_count, sh_index};
use crate::util::{ShError, ShResult};
use crate::value::ShValue;

/// Evaluates `sum coeffs[index(l, m)] * B(l, m, theta, phi)`.
///
/// The coefficient count must be a perfect square; an empty series sums to
/// `V::default()`.
pub fn reconstruct<B: Basis, V: ShValue>(theta: f64, phi: f64, coeffs: &[V]) -> ShResult<V> {
    if !theta.is_finite() || !phi.is_finite() {
        return Err(ShError::InvalidArgument {
            reason: "non-finite reconstruction angles",
        });
    }
    if coeffs.is_empty() {
        return Ok(V::default());
    }
    let bands = band_count(coeffs.len())? as i32;
    let mut out = V::default();
    for l in 0..bands {
        for m in -l..=l {
            let y = B::evaluate(l, m, theta, phi)?;
            out = out + coeffs[sh_index(l, m)].clone() * y;
        }
    }
    Ok(out)
}

/// [`reconstruct`] at a [`Direction`].
pub fn reconstruct_direction<B: Basis, V: ShValue>(dir: &Direction, coeffs: &[V]) -> ShResult<V> {
    reconstruct::<B, V>(dir.theta(), dir.phi(), coeffs)
}

/// [`reconstruct`] with the basis chosen at runtime.
pub fn reconstruct_kind<V: ShValue>(
    kind: BasisKind,
    theta: f64,
    phi: f64,
    coeffs: &[V],
) -> ShResult<V> {
    match kind {
        BasisKind::Spherical => reconstruct::<Spherical, V>(theta, phi, coeffs),
        BasisKind::Zonal => reconstruct::<Zonal, V>(theta, phi, coeffs),
        BasisKind::Hemispherical => reconstruct::<Hemispherical, V>(theta, phi, coeffs),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Rgb;
    use std::f64::consts::PI;

    #[test]
    fn unit_coefficient_reproduces_basis_function() {
        let mut coeffs = vec![0.0f64; 9];
        coeffs[sh_index(2, 1)] = 1.0;
        let (theta, phi) = (0.9, 1.7);
        let value = reconstruct::<Spherical, f64>(theta, phi, &coeffs).unwrap();
        let expected = Spherical::evaluate(2, 1, theta, phi).unwrap();
        assert!((value - expected).abs() < 1e-15);
    }

    #[test]
    fn dc_term_reconstructs_constant() {
        let coeffs = [(4.0 * PI).sqrt(), 0.0, 0.0, 0.0];
        for &(theta, phi) in &[(0.0, 0.0), (1.0, 3.0), (PI, 6.0)] {
            let value = reconstruct::<Spherical, f64>(theta, phi, &coeffs).unwrap();
            assert!((value - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn rejects_non_square_lengths() {
        let err = reconstruct::<Spherical, f64>(0.1, 0.2, &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, ShError::InvalidArgument { .. }));
    }

    #[test]
    fn empty_series_is_zero() {
        assert_eq!(reconstruct::<Spherical, f64>(0.1, 0.2, &[]), Ok(0.0));
        let color = reconstruct_kind::<Rgb>(BasisKind::Hemispherical, 0.3, 1.0, &[]).unwrap();
        assert_eq!(color, Rgb::default());
    }
}
