//! sharmonics evaluates, projects, reconstructs and rotates real spherical
//! harmonic (SH) expansions.
//!
//! The usual flow is: generate a [`SampleSet`] once, project any number of
//! integrands with a [`Projector`], then evaluate the coefficients with
//! [`reconstruct`] or rotate them with an [`ShRotation`]. Parallel sampling,
//! projection and rotation construction are available with the `rayon`
//! feature; spans and events are emitted with the `tracing` feature.

pub mod basis;
pub mod lowlevel;
pub mod project;
pub mod reconstruct;
pub mod rotation;
pub mod sample;
mod trace;
pub mod util;
pub mod value;

pub use basis::{Basis, BasisKind, Hemispherical, Spherical, Zonal};
pub use project::{
    project, project_streaming, CancelToken, Integrand, ProjectConfig, Projector,
};
pub use reconstruct::{reconstruct, reconstruct_direction, reconstruct_kind};
pub use rotation::{MatrixLayout, Rotation3, RotationConfig, ShRotation};
pub use sample::{Direction, SampleConfig, SampleSet, SampleView};
pub use util::{ShError, ShResult};
pub use value::{Rgb, ShValue};
