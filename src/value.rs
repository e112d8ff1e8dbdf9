//! Codomain types that can be integrated and reconstructed.

use std::ops::{Add, Mul};

/// A value an integrand may return: closed under `+` and scaling by `f64`.
///
/// Implemented for every type with the required operators, including `f64`
/// and [`Rgb`].
pub trait ShValue: Clone + Default + Send + Add<Output = Self> + Mul<f64, Output = Self> {}

impl<T> ShValue for T where T: Clone + Default + Send + Add<Output = T> + Mul<f64, Output = T> {}

/// Linear RGB triple for color-valued projections.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rgb {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Rgb {
    pub const fn new(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    /// Rec. 709 luminance.
    pub fn luminance(&self) -> f64 {
        0.2126 * self.r + 0.7152 * self.g + 0.0722 * self.b
    }
}

impl Add for Rgb {
    type Output = Rgb;

    fn add(self, rhs: Rgb) -> Rgb {
        Rgb::new(self.r + rhs.r, self.g + rhs.g, self.b + rhs.b)
    }
}

impl Mul<f64> for Rgb {
    type Output = Rgb;

    fn mul(self, rhs: f64) -> Rgb {
        Rgb::new(self.r * rhs, self.g * rhs, self.b * rhs)
    }
}
