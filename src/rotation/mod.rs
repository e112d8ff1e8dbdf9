//! Rotation of SH coefficient vectors.
//!
//! Rotating a band-limited function in 3D is a linear map on its SH
//! coefficients that never mixes bands: `SH(rotate(f)) = R * SH(f)`, with `R`
//! block diagonal and block `l` of side `2l + 1`. [`ShRotation`] builds the
//! blocks band by band (band 0 is the scalar `1`, band 1 is the input
//! rotation permuted to SH `(y, z, x)` order, higher bands follow the
//! recurrence in `recurrence`) and applies them to coefficient vectors.
//!
//! The basis carries the Condon-Shortley phase, so `Y_1^-1` and `Y_1^1` are
//! `-y` and `-x` up to scale. The band-1 block therefore flips the sign of the
//! entries that couple `z` with `x` or `y`; with that, the operator built from
//! `R` maps the coefficients of `f` to those of `d -> f(R^T d)`.

mod recurrence;
mod table;

#[cfg(not(feature = "rayon"))]
use crate::trace::trace_warn;
use crate::trace::{trace_event, trace_span};
use crate::util::math::{checked_bands, coefficient_count};
use crate::util::{ShError, ShResult};
use crate::value::ShValue;
use nalgebra::{Matrix3, Unit, Vector3};
use recurrence::Recurrence;
use table::{BandBlock, BandTable};

/// Storage order of a caller's 3x3 rotation matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MatrixLayout {
    /// `m[row][col]`.
    #[default]
    RowMajor,
    /// `m[col][row]`.
    ColumnMajor,
}

/// A 3x3 rotation as supplied by the caller.
///
/// Keeps the caller's storage next to the validated rotation so band 1 can be
/// read straight from the supplied layout.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rotation3 {
    raw: [[f64; 3]; 3],
    layout: MatrixLayout,
    rot: nalgebra::Rotation3<f64>,
}

/// Allowed deviation of `M * M^T` from the identity.
const ORTHONORMAL_TOL: f64 = 1e-6;

impl Rotation3 {
    /// Wraps a proper rotation matrix stored in `layout` order.
    pub fn new(m: [[f64; 3]; 3], layout: MatrixLayout) -> ShResult<Self> {
        if m.iter().flatten().any(|v| !v.is_finite()) {
            return Err(ShError::InvalidArgument {
                reason: "non-finite rotation matrix entry",
            });
        }
        let stored = Matrix3::from_row_slice(m.as_flattened());
        let matrix = match layout {
            MatrixLayout::RowMajor => stored,
            MatrixLayout::ColumnMajor => stored.transpose(),
        };
        if (matrix * matrix.transpose() - Matrix3::identity()).amax() > ORTHONORMAL_TOL {
            return Err(ShError::InvalidArgument {
                reason: "rotation matrix is not orthonormal",
            });
        }
        if matrix.determinant() <= 0.0 {
            return Err(ShError::InvalidArgument {
                reason: "rotation matrix must have determinant +1",
            });
        }
        Ok(Self {
            raw: m,
            layout,
            rot: nalgebra::Rotation3::from_matrix_unchecked(matrix),
        })
    }

    /// Builds a rotation from nine values in `layout` order.
    pub fn from_slice(values: &[f64], layout: MatrixLayout) -> ShResult<Self> {
        if values.len() != 9 {
            return Err(ShError::DimensionMismatch {
                context: "rotation matrix entries",
                expected: 9,
                got: values.len(),
            });
        }
        let mut m = [[0.0f64; 3]; 3];
        for (row, chunk) in m.iter_mut().zip(values.chunks_exact(3)) {
            row.copy_from_slice(chunk);
        }
        Self::new(m, layout)
    }

    /// The identity rotation.
    pub fn identity() -> Self {
        Self::from_rotation(nalgebra::Rotation3::identity())
    }

    /// Right-handed rotation by `angle` radians about `axis` (row-major).
    pub fn from_axis_angle(axis: [f64; 3], angle: f64) -> ShResult<Self> {
        if axis.iter().any(|v| !v.is_finite()) || !angle.is_finite() {
            return Err(ShError::InvalidArgument {
                reason: "non-finite axis or angle",
            });
        }
        let axis = Unit::try_new(Vector3::from(axis), f64::MIN_POSITIVE).ok_or(
            ShError::NumericDegeneracy {
                reason: "zero-length rotation axis",
            },
        )?;
        Ok(Self::from_rotation(nalgebra::Rotation3::from_axis_angle(
            &axis, angle,
        )))
    }

    /// Wraps an `nalgebra` rotation, stored row-major.
    pub fn from_rotation(rot: nalgebra::Rotation3<f64>) -> Self {
        let m = rot.matrix();
        let mut raw = [[0.0f64; 3]; 3];
        for (i, row) in raw.iter_mut().enumerate() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = m[(i, j)];
            }
        }
        Self {
            raw,
            layout: MatrixLayout::RowMajor,
            rot,
        }
    }

    /// Mathematical entry `R[i][j]` regardless of storage layout.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.rot[(i, j)]
    }

    /// The matrix exactly as supplied.
    pub fn raw(&self) -> &[[f64; 3]; 3] {
        &self.raw
    }

    /// Storage layout of [`Rotation3::raw`].
    pub fn layout(&self) -> MatrixLayout {
        self.layout
    }

    /// The validated rotation.
    pub fn as_rotation(&self) -> &nalgebra::Rotation3<f64> {
        &self.rot
    }

    /// Product `self * rhs` (apply `rhs` first), stored row-major.
    pub fn compose(&self, rhs: &Rotation3) -> Rotation3 {
        Self::from_rotation(self.rot * rhs.rot)
    }

    /// Inverse rotation (the transpose), stored row-major.
    pub fn inverse(&self) -> Rotation3 {
        Self::from_rotation(self.rot.inverse())
    }

    /// Rotates a vector.
    pub fn transform(&self, v: [f64; 3]) -> [f64; 3] {
        self.rot.transform_vector(&Vector3::from(v)).into()
    }
}

/// Band-1 block in SH `(y, z, x)` order, rows `m` and columns `n` in `-1..=1`.
///
/// The nine entries are read from the caller's storage, then the
/// Condon-Shortley signs `(-1, 1, -1)` of `Y_1^m` are applied on both sides.
fn band_one(rot: &Rotation3) -> ShResult<BandBlock> {
    const X: usize = 0;
    const Y: usize = 1;
    const Z: usize = 2;
    const SIGN: [f64; 3] = [-1.0, 1.0, -1.0];
    let r = &rot.raw;
    let mut data = match rot.layout {
        MatrixLayout::RowMajor => vec![
            r[Y][Y], r[Y][Z], r[Y][X], //
            r[Z][Y], r[Z][Z], r[Z][X], //
            r[X][Y], r[X][Z], r[X][X],
        ],
        MatrixLayout::ColumnMajor => vec![
            r[Y][Y], r[Z][Y], r[X][Y], //
            r[Y][Z], r[Z][Z], r[X][Z], //
            r[Y][X], r[Z][X], r[X][X],
        ],
    };
    for (idx, value) in data.iter_mut().enumerate() {
        *value *= SIGN[idx / 3] * SIGN[idx % 3];
    }
    BandBlock::new(1, data)
}

/// Rotation build configuration.
#[derive(Clone, Debug, Default)]
pub struct RotationConfig {
    /// Compute the entries of each band on the rayon pool.
    pub parallel: bool,
}

/// Block-diagonal SH rotation operator.
#[derive(Clone, Debug)]
pub struct ShRotation {
    blocks: Vec<BandBlock>,
    num_bands: usize,
}

impl ShRotation {
    /// Builds the operator for `rot` over `num_bands` bands.
    pub fn new(rot: &Rotation3, num_bands: usize) -> ShResult<Self> {
        Self::with_config(rot, num_bands, &RotationConfig::default())
    }

    /// Builds the operator with an explicit configuration.
    pub fn with_config(rot: &Rotation3, num_bands: usize, cfg: &RotationConfig) -> ShResult<Self> {
        checked_bands(num_bands)?;
        let _span =
            trace_span!("build_rotation", bands = num_bands, parallel = cfg.parallel).entered();

        let mut table = BandTable::new(num_bands);
        table.push(BandBlock::new(0, vec![1.0])?)?;
        if num_bands > 1 {
            table.push(band_one(rot)?)?;
        }
        for k in 2..num_bands {
            table.begin_band(k)?;
            let l = k as i32;
            let data = {
                let rec = Recurrence::new(l, table.band(k - 1)?, table.band(1)?)?;
                compute_band(&rec, (2 * k + 1) * (2 * k + 1), cfg.parallel)?
            };
            table.push(BandBlock::new(l, data)?)?;
            trace_event!("band_built", band = k);
        }

        Ok(Self {
            blocks: table.finish()?,
            num_bands,
        })
    }

    /// Number of bands.
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Side of the full matrix (`num_bands^2`).
    pub fn side(&self) -> usize {
        coefficient_count(self.num_bands)
    }

    /// Row-major block of band `l` (`(2l+1)^2` entries).
    pub fn block(&self, l: usize) -> Option<&[f64]> {
        self.blocks.get(l).map(BandBlock::data)
    }

    /// Entry `M(l, m, n)` in band-local indices.
    pub fn get(&self, l: usize, m: i32, n: i32) -> Option<f64> {
        self.blocks.get(l)?.get(m, n).ok()
    }

    /// Entry of the full `side x side` matrix; zero across band boundaries.
    pub fn entry(&self, row: usize, col: usize) -> Option<f64> {
        let side = self.side();
        if row >= side || col >= side {
            return None;
        }
        let band = band_of(row);
        if band != band_of(col) {
            return Some(0.0);
        }
        let base = band * band;
        let block = &self.blocks[band];
        Some(block.data()[(row - base) * block.side() + (col - base)])
    }

    /// Dense row-major copy of the full matrix.
    pub fn to_dense(&self) -> Vec<f64> {
        let side = self.side();
        let mut dense = vec![0.0f64; side * side];
        for (band, block) in self.blocks.iter().enumerate() {
            let base = band * band;
            let bside = block.side();
            for (i, row) in block.data().chunks_exact(bside).enumerate() {
                let start = (base + i) * side + base;
                dense[start..start + bside].copy_from_slice(row);
            }
        }
        dense
    }

    /// Returns `R * coeffs`.
    pub fn apply<V: ShValue>(&self, coeffs: &[V]) -> ShResult<Vec<V>> {
        self.check_len(coeffs.len())?;
        let mut out = Vec::with_capacity(coeffs.len());
        for (band, block) in self.blocks.iter().enumerate() {
            let base = band * band;
            let slice = &coeffs[base..base + block.side()];
            out.extend(rotate_band(block, slice));
        }
        Ok(out)
    }

    /// Rotates `coeffs` in place.
    pub fn apply_in_place<V: ShValue>(&self, coeffs: &mut [V]) -> ShResult<()> {
        self.check_len(coeffs.len())?;
        for (band, block) in self.blocks.iter().enumerate().skip(1) {
            let base = band * band;
            let slice = &mut coeffs[base..base + block.side()];
            let rotated: Vec<V> = rotate_band(block, &*slice).collect();
            for (dst, src) in slice.iter_mut().zip(rotated) {
                *dst = src;
            }
        }
        Ok(())
    }

    /// Operator of `self` applied after `other` (`self * other`).
    pub fn compose(&self, other: &ShRotation) -> ShResult<ShRotation> {
        if self.num_bands != other.num_bands {
            return Err(ShError::DimensionMismatch {
                context: "rotation band count",
                expected: self.num_bands,
                got: other.num_bands,
            });
        }
        let mut table = BandTable::new(self.num_bands);
        for (band, (a, b)) in self.blocks.iter().zip(&other.blocks).enumerate() {
            if band >= 2 {
                table.begin_band(band)?;
            }
            let side = a.side();
            let mut data = vec![0.0f64; side * side];
            for i in 0..side {
                for j in 0..side {
                    data[i * side + j] = (0..side)
                        .map(|k| a.data()[i * side + k] * b.data()[k * side + j])
                        .sum();
                }
            }
            table.push(BandBlock::new(a.degree(), data)?)?;
        }
        Ok(ShRotation {
            blocks: table.finish()?,
            num_bands: self.num_bands,
        })
    }

    fn check_len(&self, len: usize) -> ShResult<()> {
        let side = self.side();
        if len != side {
            return Err(ShError::DimensionMismatch {
                context: "coefficient vector vs rotation side",
                expected: side,
                got: len,
            });
        }
        Ok(())
    }
}

fn band_of(index: usize) -> usize {
    let mut band = (index as f64).sqrt() as usize;
    while band * band > index {
        band -= 1;
    }
    while (band + 1) * (band + 1) <= index {
        band += 1;
    }
    band
}

fn rotate_band<'a, V: ShValue>(
    block: &'a BandBlock,
    slice: &'a [V],
) -> impl Iterator<Item = V> + 'a {
    block.data().chunks_exact(block.side()).map(move |row| {
        row.iter()
            .zip(slice)
            .fold(V::default(), |acc, (&r, c)| acc + c.clone() * r)
    })
}

#[cfg(feature = "rayon")]
fn compute_band(rec: &Recurrence<'_>, entries: usize, parallel: bool) -> ShResult<Vec<f64>> {
    use rayon::prelude::*;

    if parallel {
        return (0..entries)
            .into_par_iter()
            .map(|idx| rec.entry_at(idx))
            .collect();
    }
    (0..entries).map(|idx| rec.entry_at(idx)).collect()
}

#[cfg(not(feature = "rayon"))]
fn compute_band(rec: &Recurrence<'_>, entries: usize, parallel: bool) -> ShResult<Vec<f64>> {
    if parallel {
        trace_warn!("parallel_unavailable", stage = "build_rotation");
    }
    (0..entries).map(|idx| rec.entry_at(idx)).collect()
}
