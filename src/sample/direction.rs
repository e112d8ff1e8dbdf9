//! Unit directions on the sphere.

use crate::util::math::wrap_two_pi;
use crate::util::{ShError, ShResult};
use nalgebra::Vector3;
use std::f64::consts::{PI, TAU};

/// A unit direction with both its spherical angles and Cartesian vector.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Direction {
    theta: f64,
    phi: f64,
    vec: [f64; 3],
}

impl Direction {
    /// Creates a direction from polar angle `theta` in `[0, pi]` and azimuth `phi`.
    ///
    /// `phi` is wrapped into `[0, 2pi)`.
    pub fn from_spherical(theta: f64, phi: f64) -> ShResult<Self> {
        if !theta.is_finite() || !phi.is_finite() {
            return Err(ShError::InvalidArgument {
                reason: "non-finite spherical angles",
            });
        }
        if !(0.0..=PI).contains(&theta) {
            return Err(ShError::InvalidArgument {
                reason: "theta must lie in [0, pi]",
            });
        }
        Ok(Self::from_angles(theta, wrap_two_pi(phi)))
    }

    /// Creates a direction by normalizing a Cartesian vector.
    pub fn from_vector(v: [f64; 3]) -> ShResult<Self> {
        if v.iter().any(|c| !c.is_finite()) {
            return Err(ShError::InvalidArgument {
                reason: "non-finite direction vector",
            });
        }
        let unit = Vector3::from(v)
            .try_normalize(f64::MIN_POSITIVE)
            .ok_or(ShError::NumericDegeneracy {
                reason: "zero-length direction vector",
            })?;
        let theta = unit.z.clamp(-1.0, 1.0).acos();
        let phi = wrap_two_pi(unit.y.atan2(unit.x));
        Ok(Self {
            theta,
            phi,
            vec: unit.into(),
        })
    }

    /// Maps a point of the unit square to a direction.
    ///
    /// `theta = 2 acos(sqrt(1 - y))` and `phi = 2pi x`; the polar mapping is
    /// algebraically equal to `acos(1 - 2y)`, which is uniform in solid angle.
    pub(crate) fn from_unit_square(x: f64, y: f64) -> Self {
        let theta = 2.0 * (1.0 - y).sqrt().acos();
        let phi = TAU * x;
        Self::from_angles(theta, phi)
    }

    fn from_angles(theta: f64, phi: f64) -> Self {
        let (sin_t, cos_t) = theta.sin_cos();
        let (sin_p, cos_p) = phi.sin_cos();
        Self {
            theta,
            phi,
            vec: [sin_t * cos_p, sin_t * sin_p, cos_t],
        }
    }

    /// Polar angle from `+z`.
    pub fn theta(&self) -> f64 {
        self.theta
    }

    /// Azimuth from `+x` towards `+y`.
    pub fn phi(&self) -> f64 {
        self.phi
    }

    /// Unit vector `(x, y, z)`.
    pub fn vector(&self) -> [f64; 3] {
        self.vec
    }
}

#[cfg(test)]
mod tests {
    use super::Direction;
    use crate::ShError;
    use std::f64::consts::{FRAC_PI_2, PI};

    #[test]
    fn spherical_and_vector_forms_agree() {
        let d = Direction::from_spherical(1.2, 4.0).unwrap();
        let e = Direction::from_vector(d.vector()).unwrap();
        assert!((d.theta() - e.theta()).abs() < 1e-12);
        assert!((d.phi() - e.phi()).abs() < 1e-12);
    }

    #[test]
    fn from_vector_normalizes() {
        let d = Direction::from_vector([0.0, 3.0, 0.0]).unwrap();
        let v = d.vector();
        assert!((v[1] - 1.0).abs() < 1e-15);
        assert!((d.theta() - FRAC_PI_2).abs() < 1e-15);
        assert!((d.phi() - FRAC_PI_2).abs() < 1e-15);
    }

    #[test]
    fn rejects_degenerate_input() {
        assert!(matches!(
            Direction::from_vector([0.0, 0.0, 0.0]),
            Err(ShError::NumericDegeneracy { .. })
        ));
        assert!(matches!(
            Direction::from_spherical(PI + 0.1, 0.0),
            Err(ShError::InvalidArgument { .. })
        ));
        assert!(matches!(
            Direction::from_spherical(f64::NAN, 0.0),
            Err(ShError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn unit_square_mapping_matches_inverse_cdf() {
        for i in 0..=10 {
            let y = i as f64 / 10.0;
            let d = Direction::from_unit_square(0.25, y);
            assert!((d.theta() - (1.0 - 2.0 * y).acos()).abs() < 1e-7);
        }
    }
}
