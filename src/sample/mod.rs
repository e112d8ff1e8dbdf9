//! Monte-Carlo sample sets with precomputed basis values.
//!
//! A [`SampleSet`] is generated once and reused across projections of
//! different integrands: the basis is evaluated only once per direction and
//! every projection sees the same quadrature, which keeps their integration
//! errors comparable. Values are stored in one flat buffer with
//! `num_bands^2` entries per sample, ordered by `l * (l + 1) + m`.

mod direction;

pub use direction::Direction;

use crate::basis::{Basis, BasisKind, Hemispherical, Spherical, Zonal};
#[cfg(not(feature = "rayon"))]
use crate::trace::trace_warn;
use crate::trace::{trace_event, trace_span};
use crate::util::math::{checked_bands, coefficient_count, sh_index};
use crate::util::{ShError, ShResult};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Seed used when none is configured (the classic Mersenne Twister default).
pub const DEFAULT_SEED: u64 = 5489;

/// Configuration for sample generation.
#[derive(Clone, Debug)]
pub struct SampleConfig {
    /// Number of random directions to draw.
    pub num_samples: usize,
    /// Number of SH bands evaluated per direction.
    pub num_bands: usize,
    /// Seed of the private pseudo-random generator.
    pub seed: u64,
    /// Evaluate basis values in parallel (requires the `rayon` feature).
    pub parallel: bool,
}

impl Default for SampleConfig {
    fn default() -> Self {
        Self {
            num_samples: 10_000,
            num_bands: 4,
            seed: DEFAULT_SEED,
            parallel: false,
        }
    }
}

/// Stream of uniformly distributed directions from a private generator.
pub(crate) struct DirectionStream {
    rng: StdRng,
}

impl DirectionStream {
    pub(crate) fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub(crate) fn next_direction(&mut self) -> Direction {
        let x: f64 = self.rng.random();
        let y: f64 = self.rng.random();
        Direction::from_unit_square(x, y)
    }
}

/// Writes `B(l, m)` for every `(l, m)` below `bands` into `out`.
pub(crate) fn fill_basis_values<B: Basis>(
    dir: &Direction,
    bands: i32,
    out: &mut [f64],
) -> ShResult<()> {
    debug_assert_eq!(out.len(), coefficient_count(bands as usize));
    let (theta, phi) = (dir.theta(), dir.phi());
    for l in 0..bands {
        for m in -l..=l {
            out[sh_index(l, m)] = B::evaluate(l, m, theta, phi)?;
        }
    }
    Ok(())
}

/// Borrowed view of one sample.
#[derive(Clone, Copy, Debug)]
pub struct SampleView<'a> {
    direction: &'a Direction,
    values: &'a [f64],
}

impl<'a> SampleView<'a> {
    /// The sampled direction.
    pub fn direction(&self) -> &'a Direction {
        self.direction
    }

    /// Basis values at this direction, indexed by `l * (l + 1) + m`.
    pub fn basis_values(&self) -> &'a [f64] {
        self.values
    }
}

/// Immutable set of directions with precomputed basis values.
#[derive(Clone, Debug)]
pub struct SampleSet {
    directions: Vec<Direction>,
    values: Vec<f64>,
    num_bands: usize,
    basis: BasisKind,
}

impl SampleSet {
    /// Draws `cfg.num_samples` directions and evaluates basis `B` at each.
    pub fn generate<B: Basis>(cfg: &SampleConfig) -> ShResult<Self> {
        Self::generate_with::<B>(cfg)
    }

    /// Same as [`SampleSet::generate`] with the basis chosen at runtime.
    pub fn generate_kind(kind: BasisKind, cfg: &SampleConfig) -> ShResult<Self> {
        match kind {
            BasisKind::Spherical => Self::generate_with::<Spherical>(cfg),
            BasisKind::Zonal => Self::generate_with::<Zonal>(cfg),
            BasisKind::Hemispherical => Self::generate_with::<Hemispherical>(cfg),
        }
    }

    fn generate_with<B: Basis>(cfg: &SampleConfig) -> ShResult<Self> {
        let bands = checked_bands(cfg.num_bands)?;
        let stride = coefficient_count(cfg.num_bands);
        let total = cfg
            .num_samples
            .checked_mul(stride)
            .ok_or(ShError::InvalidArgument {
                reason: "sample buffer size overflows usize",
            })?;

        let _span = trace_span!(
            "generate_samples",
            basis = B::KIND.name(),
            samples = cfg.num_samples,
            bands = cfg.num_bands
        )
        .entered();

        // The random stream is always drawn sequentially so the set does not
        // depend on how basis evaluation is scheduled.
        let mut stream = DirectionStream::new(cfg.seed);
        let directions: Vec<Direction> = (0..cfg.num_samples)
            .map(|_| stream.next_direction())
            .collect();

        let mut values = vec![0.0f64; total];
        if stride > 0 && !directions.is_empty() {
            fill_all::<B>(&directions, bands, stride, &mut values, cfg.parallel)?;
        }

        trace_event!("samples_generated", count = directions.len(), stride = stride);
        Ok(Self {
            directions,
            values,
            num_bands: cfg.num_bands,
            basis: B::KIND,
        })
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    /// Returns true if the set holds no samples.
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    /// Number of SH bands evaluated per sample.
    pub fn num_bands(&self) -> usize {
        self.num_bands
    }

    /// Number of basis values per sample (`num_bands^2`).
    pub fn coefficient_count(&self) -> usize {
        coefficient_count(self.num_bands)
    }

    /// Basis flavor the values were evaluated with.
    pub fn basis(&self) -> BasisKind {
        self.basis
    }

    /// Returns the sample at `idx`.
    pub fn get(&self, idx: usize) -> Option<SampleView<'_>> {
        let stride = self.coefficient_count();
        let direction = self.directions.get(idx)?;
        let start = idx.checked_mul(stride)?;
        let values = self.values.get(start..start + stride)?;
        Some(SampleView { direction, values })
    }

    /// Iterates over all samples in generation order.
    pub fn iter(&self) -> impl Iterator<Item = SampleView<'_>> + '_ {
        self.directions
            .iter()
            .zip(self.values.chunks_exact(self.coefficient_count()))
            .map(|(direction, values)| SampleView { direction, values })
    }

    /// All sampled directions.
    pub fn directions(&self) -> &[Direction] {
        &self.directions
    }

    /// Flat basis value buffer (`len() * coefficient_count()` entries).
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}

#[cfg(feature = "rayon")]
fn fill_all<B: Basis>(
    directions: &[Direction],
    bands: i32,
    stride: usize,
    values: &mut [f64],
    parallel: bool,
) -> ShResult<()> {
    use rayon::prelude::*;

    if parallel {
        return values
            .par_chunks_mut(stride)
            .zip(directions.par_iter())
            .try_for_each(|(out, dir)| fill_basis_values::<B>(dir, bands, out));
    }
    fill_sequential::<B>(directions, bands, stride, values)
}

#[cfg(not(feature = "rayon"))]
fn fill_all<B: Basis>(
    directions: &[Direction],
    bands: i32,
    stride: usize,
    values: &mut [f64],
    parallel: bool,
) -> ShResult<()> {
    if parallel {
        trace_warn!("parallel_unavailable", stage = "generate_samples");
    }
    fill_sequential::<B>(directions, bands, stride, values)
}

fn fill_sequential<B: Basis>(
    directions: &[Direction],
    bands: i32,
    stride: usize,
    values: &mut [f64],
) -> ShResult<()> {
    for (out, dir) in values.chunks_exact_mut(stride).zip(directions) {
        fill_basis_values::<B>(dir, bands, out)?;
    }
    Ok(())
}
