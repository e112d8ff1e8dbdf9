//! Monte-Carlo projection of functions onto the SH basis.
//!
//! The estimator is `coeff[c] = (4pi / N) * sum_s f(dir_s) * basis_s[c]`.
//! Samples are accumulated in fixed chunks of [`CHUNK_SAMPLES`] and the chunk
//! sums are reduced in chunk order, so the result does not depend on whether
//! the chunks ran sequentially or on the rayon pool.

mod cancel;

pub use cancel::CancelToken;

use crate::basis::Basis;
use crate::sample::{fill_basis_values, Direction, DirectionStream, SampleConfig, SampleSet};
use crate::trace::{trace_event, trace_span, trace_warn};
use crate::util::math::{checked_bands, coefficient_count};
use crate::util::{ShError, ShResult};
use crate::value::ShValue;
use std::f64::consts::PI;

/// Samples per accumulation chunk.
pub const CHUNK_SAMPLES: usize = 1024;

/// A function on the sphere in one of its two calling conventions.
pub enum Integrand<'f, V> {
    /// `f(theta, phi)`.
    Spherical(&'f (dyn Fn(f64, f64) -> V + Sync)),
    /// `f(x, y, z)` on the unit vector.
    Cartesian(&'f (dyn Fn(f64, f64, f64) -> V + Sync)),
}

impl<V> Clone for Integrand<'_, V> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<V> Copy for Integrand<'_, V> {}

impl<V> Integrand<'_, V> {
    /// Evaluates the function at `dir`.
    pub fn eval(&self, dir: &Direction) -> V {
        match self {
            Integrand::Spherical(f) => f(dir.theta(), dir.phi()),
            Integrand::Cartesian(f) => {
                let [x, y, z] = dir.vector();
                f(x, y, z)
            }
        }
    }
}

/// Projection configuration.
#[derive(Clone, Debug, Default)]
pub struct ProjectConfig {
    /// Accumulate chunks on the rayon pool (requires the `rayon` feature).
    pub parallel: bool,
}

/// Projects integrands against a reusable [`SampleSet`].
pub struct Projector<'s> {
    samples: &'s SampleSet,
    cfg: ProjectConfig,
    cancel: Option<CancelToken>,
}

impl<'s> Projector<'s> {
    /// Creates a projector over `samples` with the default configuration.
    pub fn new(samples: &'s SampleSet) -> Self {
        Self {
            samples,
            cfg: ProjectConfig::default(),
            cancel: None,
        }
    }

    /// Overrides the projection configuration.
    pub fn with_config(mut self, cfg: ProjectConfig) -> Self {
        self.cfg = cfg;
        self
    }

    /// Attaches a cancel token polled once per sample.
    pub fn with_cancel(mut self, token: CancelToken) -> Self {
        self.cancel = Some(token);
        self
    }

    /// Returns the sample set used by this projector.
    pub fn samples(&self) -> &'s SampleSet {
        self.samples
    }

    /// Projects `f` and returns `num_bands^2` coefficients.
    pub fn project<V: ShValue>(&self, f: Integrand<'_, V>) -> ShResult<Vec<V>> {
        let samples = self.samples;
        if samples.is_empty() {
            return Err(ShError::EmptyInput {
                context: "sample set",
            });
        }
        let n = samples.len();
        let stride = samples.coefficient_count();
        let _span = trace_span!(
            "project",
            samples = n,
            coefficients = stride,
            parallel = self.cfg.parallel
        )
        .entered();

        let chunks = n.div_ceil(CHUNK_SAMPLES);
        let cancel = self.cancel.as_ref();
        let partials = if self.cfg.parallel {
            accumulate_parallel(f, samples, chunks, cancel)
        } else {
            (0..chunks)
                .map(|chunk| accumulate_chunk(f, samples, chunk, cancel))
                .collect::<ShResult<Vec<_>>>()
        };
        let partials = match partials {
            Ok(p) => p,
            Err(err) => {
                if let ShError::Cancelled { completed } = err {
                    trace_warn!("projection_cancelled", completed = completed);
                }
                return Err(err);
            }
        };

        let weight = 4.0 * PI / n as f64;
        let coeffs = reduce_partials(partials, stride)
            .into_iter()
            .map(|v| v * weight)
            .collect();
        trace_event!("projected", chunks = chunks);
        Ok(coeffs)
    }

    /// Projects a function of `(theta, phi)`.
    pub fn project_spherical<V, F>(&self, f: F) -> ShResult<Vec<V>>
    where
        V: ShValue,
        F: Fn(f64, f64) -> V + Sync,
    {
        self.project(Integrand::Spherical(&f))
    }

    /// Projects a function of the unit vector `(x, y, z)`.
    pub fn project_cartesian<V, F>(&self, f: F) -> ShResult<Vec<V>>
    where
        V: ShValue,
        F: Fn(f64, f64, f64) -> V + Sync,
    {
        self.project(Integrand::Cartesian(&f))
    }
}

/// Projects `f` against `samples` with the default configuration.
pub fn project<V: ShValue>(f: Integrand<'_, V>, samples: &SampleSet) -> ShResult<Vec<V>> {
    Projector::new(samples).project(f)
}

/// Projects `f` while drawing samples on the fly instead of storing them.
///
/// Uses the same random stream and chunked reduction as
/// [`SampleSet::generate`] followed by [`Projector::project`], trading reuse
/// of the quadrature for `O(num_bands^2)` memory.
pub fn project_streaming<B: Basis, V: ShValue>(
    f: Integrand<'_, V>,
    cfg: &SampleConfig,
    cancel: Option<&CancelToken>,
) -> ShResult<Vec<V>> {
    let bands = checked_bands(cfg.num_bands)?;
    if cfg.num_samples == 0 {
        return Err(ShError::EmptyInput {
            context: "sample count",
        });
    }
    let stride = coefficient_count(cfg.num_bands);
    let _span = trace_span!(
        "project_streaming",
        basis = B::KIND.name(),
        samples = cfg.num_samples,
        coefficients = stride
    )
    .entered();

    let mut stream = DirectionStream::new(cfg.seed);
    let mut basis = vec![0.0f64; stride];
    let mut total = vec![V::default(); stride];
    let mut done = 0usize;
    while done < cfg.num_samples {
        let end = (done + CHUNK_SAMPLES).min(cfg.num_samples);
        let mut acc = vec![V::default(); stride];
        for idx in done..end {
            if cancel.is_some_and(CancelToken::is_cancelled) {
                trace_warn!("projection_cancelled", completed = idx);
                return Err(ShError::Cancelled { completed: idx });
            }
            let dir = stream.next_direction();
            fill_basis_values::<B>(&dir, bands, &mut basis)?;
            add_weighted(&mut acc, f.eval(&dir), &basis);
        }
        add_into(&mut total, acc);
        done = end;
    }

    let weight = 4.0 * PI / cfg.num_samples as f64;
    Ok(total.into_iter().map(|v| v * weight).collect())
}

fn accumulate_chunk<V: ShValue>(
    f: Integrand<'_, V>,
    samples: &SampleSet,
    chunk: usize,
    cancel: Option<&CancelToken>,
) -> ShResult<Vec<V>> {
    let stride = samples.coefficient_count();
    let start = chunk * CHUNK_SAMPLES;
    let end = (start + CHUNK_SAMPLES).min(samples.len());
    let directions = &samples.directions()[start..end];
    let values = &samples.values()[start * stride..end * stride];

    let mut acc = vec![V::default(); stride];
    for (offset, (dir, basis)) in directions.iter().zip(values.chunks_exact(stride)).enumerate() {
        if cancel.is_some_and(CancelToken::is_cancelled) {
            return Err(ShError::Cancelled {
                completed: start + offset,
            });
        }
        add_weighted(&mut acc, f.eval(dir), basis);
    }
    Ok(acc)
}

#[cfg(feature = "rayon")]
fn accumulate_parallel<V: ShValue>(
    f: Integrand<'_, V>,
    samples: &SampleSet,
    chunks: usize,
    cancel: Option<&CancelToken>,
) -> ShResult<Vec<Vec<V>>> {
    use rayon::prelude::*;

    (0..chunks)
        .into_par_iter()
        .map(|chunk| accumulate_chunk(f, samples, chunk, cancel))
        .collect()
}

#[cfg(not(feature = "rayon"))]
fn accumulate_parallel<V: ShValue>(
    f: Integrand<'_, V>,
    samples: &SampleSet,
    chunks: usize,
    cancel: Option<&CancelToken>,
) -> ShResult<Vec<Vec<V>>> {
    trace_warn!("parallel_unavailable", stage = "project");
    (0..chunks)
        .map(|chunk| accumulate_chunk(f, samples, chunk, cancel))
        .collect()
}

#[inline]
fn add_weighted<V: ShValue>(acc: &mut [V], value: V, basis: &[f64]) {
    for (slot, &b) in acc.iter_mut().zip(basis) {
        let cur = std::mem::take(slot);
        *slot = cur + value.clone() * b;
    }
}

fn add_into<V: ShValue>(total: &mut [V], partial: Vec<V>) {
    for (slot, p) in total.iter_mut().zip(partial) {
        let cur = std::mem::take(slot);
        *slot = cur + p;
    }
}

fn reduce_partials<V: ShValue>(partials: Vec<Vec<V>>, stride: usize) -> Vec<V> {
    let mut total = vec![V::default(); stride];
    for partial in partials {
        add_into(&mut total, partial);
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::Spherical;
    use crate::value::Rgb;

    fn small_set(num_samples: usize) -> SampleSet {
        SampleSet::generate::<Spherical>(&SampleConfig {
            num_samples,
            num_bands: 2,
            ..SampleConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn constant_projects_onto_band_zero() {
        let set = small_set(10_000);
        let coeffs = Projector::new(&set).project_spherical(|_, _| 1.0).unwrap();
        assert_eq!(coeffs.len(), 4);
        assert!((coeffs[0] - (4.0 * PI).sqrt()).abs() < 1e-9);
        for c in &coeffs[1..] {
            assert!(c.abs() < 0.15, "coefficient {c} should be near zero");
        }
    }

    #[test]
    fn both_conventions_agree() {
        let set = small_set(2_000);
        let projector = Projector::new(&set);
        let a = projector
            .project_spherical(|theta: f64, _phi: f64| theta.cos())
            .unwrap();
        let b = projector.project_cartesian(|_x, _y, z| z).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert!((x - y).abs() < 1e-12);
        }
    }

    #[test]
    fn color_values_project_per_channel() {
        let set = small_set(3_000);
        let projector = Projector::new(&set);
        let rgb = projector
            .project_cartesian(|_x, _y, z| Rgb::new(1.0, z, 2.0))
            .unwrap();
        let red = projector.project_cartesian(|_x, _y, _z| 1.0).unwrap();
        let green = projector.project_cartesian(|_x, _y, z| z).unwrap();
        for i in 0..4 {
            assert!((rgb[i].r - red[i]).abs() < 1e-12);
            assert!((rgb[i].g - green[i]).abs() < 1e-12);
            assert!((rgb[i].b - 2.0 * red[i]).abs() < 1e-12);
        }
    }

    #[test]
    fn empty_set_is_rejected() {
        let set = small_set(0);
        let err = Projector::new(&set).project_spherical(|_, _| 1.0).unwrap_err();
        assert_eq!(
            err,
            ShError::EmptyInput {
                context: "sample set"
            }
        );
    }

    #[test]
    fn cancelled_token_aborts_without_result() {
        let set = small_set(100);
        let token = CancelToken::new();
        token.cancel();
        let err = Projector::new(&set)
            .with_cancel(token)
            .project_spherical(|_, _| 1.0)
            .unwrap_err();
        assert_eq!(err, ShError::Cancelled { completed: 0 });
    }

    #[test]
    fn streaming_matches_stored_samples() {
        let cfg = SampleConfig {
            num_samples: 2_500,
            num_bands: 3,
            seed: 11,
            parallel: false,
        };
        let set = SampleSet::generate::<Spherical>(&cfg).unwrap();
        let f = |x: f64, y: f64, z: f64| x * y + z;
        let stored = Projector::new(&set).project_cartesian(f).unwrap();
        let streamed = project_streaming::<Spherical, f64>(Integrand::Cartesian(&f), &cfg, None)
            .unwrap();
        assert_eq!(stored.len(), streamed.len());
        for (a, b) in stored.iter().zip(&streamed) {
            assert!((a - b).abs() < 1e-12);
        }
    }
}
