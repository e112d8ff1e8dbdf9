//! Band recurrence for real SH rotation matrices.
//!
//! Follows Ivanic & Ruedenberg (1996, with the 1998 errata) in the notation
//! of Green's "Spherical Harmonic Lighting: The Gritty Details":
//!
//! `M(l, m, n) = u U(l, m, n) + v V(l, m, n) + w W(l, m, n)`
//!
//! where `U`, `V`, `W` combine entries of band `l - 1` with the band-1 block
//! through the selector `P(i, l, a, b)`.

use super::table::BandBlock;
use crate::util::math::kronecker;
use crate::util::{ShError, ShResult};

/// Scale factors of the three recurrence terms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Factors {
    pub(crate) u: f64,
    pub(crate) v: f64,
    pub(crate) w: f64,
}

/// Closed-form `u, v, w` for entry `(l, m, n)`.
pub(crate) fn uvw(l: i32, m: i32, n: i32) -> ShResult<Factors> {
    let d = kronecker(m, 0);
    let (l, am, m, n) = (l as f64, m.abs() as f64, m as f64, n as f64);
    let div = if n.abs() < l {
        (l + n) * (l - n)
    } else {
        (2.0 * l) * (2.0 * l - 1.0)
    };
    if div == 0.0 {
        return Err(ShError::NumericDegeneracy {
            reason: "zero divisor in rotation recurrence factors",
        });
    }

    let u = ((l + m) * (l - m) / div).sqrt();
    let v = 0.5 * ((1.0 + d) * (l + am - 1.0) * (l + am) / div).sqrt() * (1.0 - 2.0 * d);
    let w_num = (l - am - 1.0) * (l - am);
    let w = if w_num > 0.0 {
        -0.5 * (w_num / div).sqrt() * (1.0 - d)
    } else {
        0.0
    };
    Ok(Factors { u, v, w })
}

/// Recurrence state for building band `l` from band `l - 1`.
pub(crate) struct Recurrence<'a> {
    l: i32,
    prev: &'a BandBlock,
    band1: &'a BandBlock,
}

impl<'a> Recurrence<'a> {
    pub(crate) fn new(l: i32, prev: &'a BandBlock, band1: &'a BandBlock) -> ShResult<Self> {
        if l < 2 || prev.degree() != l - 1 || band1.degree() != 1 {
            return Err(ShError::InvalidArgument {
                reason: "recurrence needs band l-1 and band 1 for l >= 2",
            });
        }
        Ok(Self { l, prev, band1 })
    }

    /// Computes entry `(m, n)` of band `l`, skipping terms whose factor is zero.
    pub(crate) fn entry(&self, m: i32, n: i32) -> ShResult<f64> {
        let Factors { u, v, w } = uvw(self.l, m, n)?;
        let u_term = if u != 0.0 { u * self.u(m, n)? } else { 0.0 };
        let v_term = if v != 0.0 { v * self.v(m, n)? } else { 0.0 };
        let w_term = if w != 0.0 { w * self.w(m, n)? } else { 0.0 };
        Ok(u_term + v_term + w_term)
    }

    /// Entry for a flat row-major index into the `(2l+1)^2` block.
    pub(crate) fn entry_at(&self, idx: usize) -> ShResult<f64> {
        let side = (2 * self.l + 1) as usize;
        let m = (idx / side) as i32 - self.l;
        let n = (idx % side) as i32 - self.l;
        self.entry(m, n)
    }

    fn r(&self, i: i32, j: i32) -> ShResult<f64> {
        self.band1.get(i, j)
    }

    fn p(&self, i: i32, a: i32, b: i32) -> ShResult<f64> {
        let l = self.l;
        let lp = l - 1;
        let ln = -l + 1;
        if b == -l {
            Ok(self.r(i, 1)? * self.prev.get(a, ln)? + self.r(i, -1)? * self.prev.get(a, lp)?)
        } else if b == l {
            Ok(self.r(i, 1)? * self.prev.get(a, lp)? - self.r(i, -1)? * self.prev.get(a, ln)?)
        } else {
            Ok(self.r(i, 0)? * self.prev.get(a, b)?)
        }
    }

    fn u(&self, m: i32, n: i32) -> ShResult<f64> {
        self.p(0, m, n)
    }

    fn v(&self, m: i32, n: i32) -> ShResult<f64> {
        let d1 = kronecker(m.abs(), 1);
        if m == 0 {
            Ok(self.p(1, 1, n)? + self.p(-1, -1, n)?)
        } else if m > 0 {
            Ok(self.p(1, m - 1, n)? * (1.0 + d1).sqrt() - self.p(-1, -m + 1, n)? * (1.0 - d1))
        } else {
            Ok(self.p(1, m + 1, n)? * (1.0 - d1) + self.p(-1, -m - 1, n)? * (1.0 + d1).sqrt())
        }
    }

    fn w(&self, m: i32, n: i32) -> ShResult<f64> {
        if m == 0 {
            return Err(ShError::NumericDegeneracy {
                reason: "W is undefined for m = 0",
            });
        }
        if m > 0 {
            Ok(self.p(1, m + 1, n)? + self.p(-1, -m - 1, n)?)
        } else {
            Ok(self.p(1, m - 1, n)? - self.p(-1, -m + 1, n)?)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity_block(l: i32) -> BandBlock {
        let side = (2 * l + 1) as usize;
        let mut data = vec![0.0; side * side];
        for i in 0..side {
            data[i * side + i] = 1.0;
        }
        BandBlock::new(l, data).unwrap()
    }

    #[test]
    fn w_factor_vanishes_for_zonal_and_edge_orders() {
        for l in 2..8 {
            for n in -l..=l {
                assert_eq!(uvw(l, 0, n).unwrap().w, 0.0);
                assert_eq!(uvw(l, l, n).unwrap().w, 0.0);
                assert_eq!(uvw(l, -l + 1, n).unwrap().w, 0.0);
                assert_eq!(uvw(l, l, n).unwrap().u, 0.0);
            }
        }
    }

    #[test]
    fn v_factor_flips_sign_on_zonal_row() {
        // l = 2, m = n = 0: div = 4, u = 1, v = -0.5 * sqrt(2 * 1 * 2 / 4).
        let f = uvw(2, 0, 0).unwrap();
        assert!((f.u - 1.0).abs() < 1e-15);
        assert!((f.v + 0.5).abs() < 1e-15);
        assert_eq!(f.w, 0.0);
    }

    #[test]
    fn factors_stay_finite_for_large_degrees() {
        // Edge column: div = 2l(2l - 1) exceeds i32 range here.
        let l = 40_000;
        let f = uvw(l, 3, l).unwrap();
        assert!(f.u.is_finite() && f.v.is_finite() && f.w.is_finite());
        assert!((f.u - 0.5).abs() < 1e-4);
        let g = uvw(45_999, -45_998, 0).unwrap();
        assert!(g.u.is_finite() && g.v.is_finite() && g.w.is_finite());
    }

    #[test]
    fn w_helper_refuses_m_zero() {
        let prev = identity_block(1);
        let band1 = identity_block(1);
        let rec = Recurrence::new(2, &prev, &band1).unwrap();
        assert!(matches!(rec.w(0, 0), Err(ShError::NumericDegeneracy { .. })));
    }

    #[test]
    fn identity_band_one_yields_identity_band_two() {
        let prev = identity_block(1);
        let band1 = identity_block(1);
        let rec = Recurrence::new(2, &prev, &band1).unwrap();
        for m in -2..=2 {
            for n in -2..=2 {
                let expected = if m == n { 1.0 } else { 0.0 };
                assert!((rec.entry(m, n).unwrap() - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn rejects_mismatched_bands() {
        let prev = identity_block(2);
        let band1 = identity_block(1);
        assert!(Recurrence::new(2, &prev, &band1).is_err());
    }
}
