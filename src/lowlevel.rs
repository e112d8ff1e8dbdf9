//! Low-level building blocks for custom SH pipelines.
//!
//! These expose the Legendre recurrence, normalization constants and the
//! coefficient index helpers used by the high-level API. Most users should
//! prefer [`SampleSet`](crate::SampleSet), [`Projector`](crate::Projector)
//! and [`ShRotation`](crate::ShRotation).

pub use crate::basis::{hemispherical_normalization, legendre, normalization};
pub use crate::project::CHUNK_SAMPLES;
pub use crate::sample::DEFAULT_SEED;
pub use crate::util::math::{band_count, coefficient_count, sh_index};
