//! Real spherical harmonic basis functions.
//!
//! Three flavors share the associated Legendre recurrence:
//!
//! - [`Spherical`]: the orthonormal real SH basis over the full sphere.
//! - [`Zonal`]: azimuthally symmetric; every order `m` evaluates the `m = 0`
//!   function of its band.
//! - [`Hemispherical`]: orthonormal over the upper hemisphere, with the
//!   Legendre argument remapped from `[0, 1]` to `[-1, 1]`.
//!
//! Angles follow the physics convention: `theta` in `[0, pi]` is measured
//! from `+z`, `phi` in `[0, 2pi)` from `+x` towards `+y`.

mod legendre;

pub use legendre::legendre;

use crate::util::math::factorial_ratio;
use crate::util::{ShError, ShResult};
use legendre::legendre_unchecked;
use std::f64::consts::{PI, SQRT_2};

/// Normalization constant `K(l, m)` of the full-sphere basis.
///
/// Returns `0` when `(l, m)` is not a valid degree/order pair.
pub fn normalization(l: i32, m: i32) -> f64 {
    norm_with_area(l, m, 4.0 * PI)
}

/// Normalization constant of the hemispherical basis (`2pi` domain).
pub fn hemispherical_normalization(l: i32, m: i32) -> f64 {
    norm_with_area(l, m, 2.0 * PI)
}

fn norm_with_area(l: i32, m: i32, area: f64) -> f64 {
    let am = m.unsigned_abs();
    let lu = l.unsigned_abs();
    if l < 0 || am > lu {
        return 0.0;
    }
    (((2.0 * l as f64 + 1.0) / area) * factorial_ratio(lu - am, lu + am)).sqrt()
}

fn check_degree_order(l: i32, m: i32) -> ShResult<()> {
    if l < 0 {
        return Err(ShError::InvalidArgument {
            reason: "degree l must be >= 0",
        });
    }
    if m.abs() > l {
        return Err(ShError::InvalidArgument {
            reason: "order m must lie in [-l, l]",
        });
    }
    Ok(())
}

/// Azimuthal factor shared by the spherical and hemispherical bases.
#[inline]
fn azimuthal(m: i32, phi: f64) -> f64 {
    match m {
        0 => 1.0,
        m if m > 0 => SQRT_2 * (m as f64 * phi).cos(),
        m => SQRT_2 * (-m as f64 * phi).sin(),
    }
}

/// A family of real basis functions `Y_l^m(theta, phi)`.
pub trait Basis {
    /// Runtime tag of this flavor.
    const KIND: BasisKind;

    /// Evaluates the basis function of degree `l` and order `m`.
    fn evaluate(l: i32, m: i32, theta: f64, phi: f64) -> ShResult<f64>;
}

/// Full-sphere real spherical harmonics.
#[derive(Clone, Copy, Debug, Default)]
pub struct Spherical;

/// Zonal harmonics (rotation-invariant about `z`).
#[derive(Clone, Copy, Debug, Default)]
pub struct Zonal;

/// Hemispherical harmonics over `theta` in `[0, pi/2]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Hemispherical;

impl Basis for Spherical {
    const KIND: BasisKind = BasisKind::Spherical;

    fn evaluate(l: i32, m: i32, theta: f64, phi: f64) -> ShResult<f64> {
        check_degree_order(l, m)?;
        let x = theta.cos();
        let am = m.abs();
        Ok(normalization(l, am) * azimuthal(m, phi) * legendre_unchecked(l, am, x))
    }
}

impl Basis for Zonal {
    const KIND: BasisKind = BasisKind::Zonal;

    fn evaluate(l: i32, m: i32, theta: f64, phi: f64) -> ShResult<f64> {
        check_degree_order(l, m)?;
        Spherical::evaluate(l, 0, theta, phi)
    }
}

impl Basis for Hemispherical {
    const KIND: BasisKind = BasisKind::Hemispherical;

    /// Zero below the horizon, so full-sphere sample sets stay unbiased.
    fn evaluate(l: i32, m: i32, theta: f64, phi: f64) -> ShResult<f64> {
        check_degree_order(l, m)?;
        let x = theta.cos();
        if x < 0.0 {
            return Ok(0.0);
        }
        let remapped = 2.0 * x - 1.0;
        let am = m.abs();
        Ok(hemispherical_normalization(l, am)
            * azimuthal(m, phi)
            * legendre_unchecked(l, am, remapped))
    }
}

/// Runtime selection of a basis flavor.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BasisKind {
    /// [`Spherical`].
    #[default]
    Spherical,
    /// [`Zonal`].
    Zonal,
    /// [`Hemispherical`].
    Hemispherical,
}

impl BasisKind {
    /// Evaluates the selected basis.
    pub fn evaluate(self, l: i32, m: i32, theta: f64, phi: f64) -> ShResult<f64> {
        match self {
            BasisKind::Spherical => <Spherical as Basis>::evaluate(l, m, theta, phi),
            BasisKind::Zonal => <Zonal as Basis>::evaluate(l, m, theta, phi),
            BasisKind::Hemispherical => <Hemispherical as Basis>::evaluate(l, m, theta, phi),
        }
    }

    /// Returns the flavor name.
    pub fn name(self) -> &'static str {
        match self {
            BasisKind::Spherical => "spherical",
            BasisKind::Zonal => "zonal",
            BasisKind::Hemispherical => "hemispherical",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn band_zero_is_constant() {
        let expected = 0.5 / PI.sqrt();
        for &(theta, phi) in &[(0.0, 0.0), (1.0, 2.0), (PI, 5.0)] {
            let y = Spherical::evaluate(0, 0, theta, phi).unwrap();
            assert!((y - expected).abs() < 1e-15);
        }
    }

    #[test]
    fn band_one_matches_cartesian_form() {
        // With the Condon-Shortley phase: Y_1^-1 = -c y, Y_1^0 = c z, Y_1^1 = -c x.
        let c = (3.0 / (4.0 * PI)).sqrt();
        let (theta, phi) = (0.7f64, 2.3f64);
        let (x, y, z) = (
            theta.sin() * phi.cos(),
            theta.sin() * phi.sin(),
            theta.cos(),
        );
        assert!((Spherical::evaluate(1, -1, theta, phi).unwrap() + c * y).abs() < 1e-12);
        assert!((Spherical::evaluate(1, 0, theta, phi).unwrap() - c * z).abs() < 1e-12);
        assert!((Spherical::evaluate(1, 1, theta, phi).unwrap() + c * x).abs() < 1e-12);
    }

    #[test]
    fn zonal_ignores_order() {
        let (theta, phi) = (1.1, 0.4);
        let z0 = Spherical::evaluate(3, 0, theta, phi).unwrap();
        for m in -3..=3 {
            assert_eq!(Zonal::evaluate(3, m, theta, phi).unwrap(), z0);
        }
    }

    #[test]
    fn hemispherical_vanishes_below_horizon() {
        assert_eq!(Hemispherical::evaluate(2, 1, 2.0, 0.3).unwrap(), 0.0);
        let top = Hemispherical::evaluate(0, 0, 0.0, 0.0).unwrap();
        assert!((top - (1.0 / (2.0 * PI)).sqrt()).abs() < 1e-15);
    }

    #[test]
    fn normalization_uses_factorial_ratio() {
        let k11 = normalization(1, 1);
        assert!((k11 - (3.0 / (8.0 * PI)).sqrt()).abs() < 1e-15);
        assert_eq!(normalization(2, -1), normalization(2, 1));
        let ratio = hemispherical_normalization(4, 2) / normalization(4, 2);
        assert!((ratio - SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn rejects_invalid_degree_order() {
        for kind in [BasisKind::Spherical, BasisKind::Zonal, BasisKind::Hemispherical] {
            assert!(matches!(
                kind.evaluate(-1, 0, 0.0, 0.0),
                Err(ShError::InvalidArgument { .. })
            ));
            assert!(matches!(
                kind.evaluate(2, 3, 0.0, 0.0),
                Err(ShError::InvalidArgument { .. })
            ));
        }
    }
}
