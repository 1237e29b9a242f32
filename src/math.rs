//! Mathy related things
//!
//! Angles on the sky are carried as [Arcsec] or [Degree] newtypes and only
//! become pixels through a [PixelScale].

use derive_more::{Add, Display, From, Neg, Sub};
use glam::DVec2;
use serde::{Deserialize, Serialize};
use shrinkwraprs::Shrinkwrap;

/// The base angle type used in the crate
#[derive(
    Debug, Clone, Copy, PartialEq, PartialOrd, Add, Sub, Neg, From, Display, Serialize, Deserialize,
)]
#[display(fmt = "{}°", _0)]
pub struct Degree(f64);
impl Default for Degree {
    fn default() -> Self {
        Self(0.0)
    }
}
impl Degree {
    pub fn new(deg: f64) -> Self {
        Self(deg)
    }
    pub fn degrees(&self) -> f64 {
        self.0
    }
    pub fn radians(&self) -> f64 {
        self.0.to_radians()
    }
}
impl From<Arcsec> for Degree {
    fn from(value: Arcsec) -> Self {
        Self(value.0 / 3600.0)
    }
}

/// Angle on the sky in seconds of arc
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    PartialOrd,
    Add,
    Sub,
    Neg,
    From,
    Display,
    Serialize,
    Deserialize,
)]
#[display(fmt = "{}\"", _0)]
pub struct Arcsec(f64);
impl Arcsec {
    pub fn new(arcsec: f64) -> Self {
        Self(arcsec)
    }
    pub fn from_arcmin(arcmin: f64) -> Self {
        Self(arcmin * 60.0)
    }
    pub fn arcsec(&self) -> f64 {
        self.0
    }
}
impl From<Degree> for Arcsec {
    fn from(value: Degree) -> Self {
        Self(value.0 * 3600.0)
    }
}

/// Pixel Scale
///
/// units: arcsec per pixel
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Shrinkwrap, Serialize, Deserialize)]
pub struct PixelScale(Arcsec);
impl PixelScale {
    /// Detector plate scale of the instrument, 0.117"/pixel
    pub const MOIRCS: Self = Self(Arcsec(0.117));

    pub fn new(arcsec_per_pixel: f64) -> Self {
        Self(Arcsec(arcsec_per_pixel))
    }
    /// Number of pixels spanned by `angle`
    pub fn pixels(&self, angle: impl Into<Arcsec>) -> f64 {
        angle.into().arcsec() / self.arcsec()
    }
}
impl Default for PixelScale {
    fn default() -> Self {
        Self::MOIRCS
    }
}

/// Rotate `point` by `angle` counter-clockwise about `pivot`
pub fn rotate_about(point: DVec2, pivot: DVec2, angle: Degree) -> DVec2 {
    let (sin, cos) = angle.radians().sin_cos();
    let d = point - pivot;
    pivot + DVec2::new(cos * d.x - sin * d.y, sin * d.x + cos * d.y)
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_pixel_scale() {
        let scale = PixelScale::MOIRCS;
        assert_relative_eq!(scale.pixels(Arcsec::new(10.0)), 10.0 / 0.117);
        assert_relative_eq!(
            scale.pixels(Degree::new(0.05)),
            180.0 / 0.117,
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_rotate_about() {
        let p = rotate_about(
            DVec2::new(2.0, 1.0),
            DVec2::new(1.0, 1.0),
            Degree::new(90.0),
        );
        assert_relative_eq!(p.x, 1.0, epsilon = 1e-12);
        assert_relative_eq!(p.y, 2.0, epsilon = 1e-12);
    }
}
