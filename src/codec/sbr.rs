//! Writer for `.sbr` laser cutter files
//!
//! Shapes are converted from detector pixels, relative to a focal-plane centre
//! chosen at save time, into focal-plane millimetres:
//!
//! ```text
//! offset (px) → × conversion, x mirrored → focal → × 1.006 → laser → rotate by mos_rot
//! ```
//!
//! Each slit becomes `B,x1,y1,x2,y2,width` and each hole `C,x1,y1,radius`,
//! preceded by three header comments. Every shape that is not deleted is cut,
//! excluded ones included. Shapes outside the cutter's reach are reported and
//! left out; the rest of the file is still written.

use glam::DVec2;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::io::Write;

use super::common::{MaskWriter, Skipped, WriteReport};
use crate::math::{Degree, PixelScale};
use crate::shape::{Shape, ShapeKind};

/// Empirical scale between focal-plane and laser-cut coordinates
const LASER_CORRECTION: f64 = 1.006;
/// Largest radius the cutter can reach
const MAX_LASER_RADIUS: f64 = 90.0;
/// Largest |x| at which a slit still lands on the detector
const MAX_SLIT_X: f64 = 60.0;

/// Optical constants of the focal-plane conversion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SbrConfig {
    pub pixel_scale: PixelScale,
    pub beta: f64,
    /// Rotation of the mask stage
    pub mos_rot: Degree,
}
impl Default for SbrConfig {
    fn default() -> Self {
        Self {
            pixel_scale: PixelScale::MOIRCS,
            beta: 0.29898169,
            mos_rot: Degree::default(),
        }
    }
}
impl SbrConfig {
    /// Millimetres on the focal plane per detector pixel
    pub fn conversion(&self) -> f64 {
        0.015 / self.beta / 0.1038 * self.pixel_scale.arcsec()
    }

    /// Cut width of a slit of the given length in pixels
    pub fn slit_width(&self, length: f64) -> f64 {
        length * self.pixel_scale.arcsec() / 2.06218 * LASER_CORRECTION * 1.08826 - 0.126902
    }
}

/// End points of one shape in focal-plane and laser coordinates
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaserCut {
    pub focal: [DVec2; 2],
    pub laser: [DVec2; 2],
}

/// `.sbr` writer for one focal-plane centre
#[derive(Debug, Clone)]
pub struct SbrWriter {
    pub config: SbrConfig,
    /// Focal-plane centre in detector pixels
    pub center: DVec2,
    /// File the mask was loaded from, for the header
    pub mdp_name: String,
    pub image_name: String,
}

impl SbrWriter {
    pub fn new(center: DVec2) -> Self {
        Self {
            config: SbrConfig::default(),
            center,
            mdp_name: "UNKNOWN_MDP".to_string(),
            image_name: "UNKNOWN_IMAGE".to_string(),
        }
    }

    pub fn with_config(self, config: SbrConfig) -> Self {
        Self { config, ..self }
    }

    pub fn with_mdp_name(self, mdp_name: impl Into<String>) -> Self {
        Self {
            mdp_name: mdp_name.into(),
            ..self
        }
    }

    pub fn with_image_name(self, image_name: impl Into<String>) -> Self {
        Self {
            image_name: image_name.into(),
            ..self
        }
    }

    /// Convert the x extent of `shape` into focal and laser end points
    pub fn laser_cut(&self, shape: &Shape) -> LaserCut {
        let conversion = self.config.conversion();
        let half = shape.half_extent_x();
        let y_off = shape.y() - self.center.y;
        let focal = [-half, half].map(|dx| {
            let x_off = shape.x() + dx - self.center.x;
            DVec2::new(-x_off * conversion, y_off * conversion)
        });
        let mos_rot = self.config.mos_rot;
        let laser = focal.map(|f| {
            let l = f * LASER_CORRECTION;
            if mos_rot.degrees() != 0.0 {
                let r = l.length();
                let theta = l.y.atan2(l.x) + mos_rot.radians();
                DVec2::new(r * theta.cos(), r * theta.sin())
            } else {
                l
            }
        });
        LaserCut { focal, laser }
    }

    /// Check that the cut is within reach, before rotation
    fn check(&self, shape: &Shape, cut: &LaserCut) -> Result<(), SbrRejection> {
        let [f1, f2] = cut.focal;
        // Both end points share y, so the four corners collapse to the two ends
        let radius = f1.length().max(f2.length());
        if radius > MAX_LASER_RADIUS {
            return Err(SbrRejection::OutOfLaserFov(radius));
        }
        let x = f1.x.abs().max(f2.x.abs());
        if shape.kind.is_slit() && x > MAX_SLIT_X {
            return Err(SbrRejection::OutOfInstrumentFov(x));
        }
        Ok(())
    }

    fn format_line(&self, shape: &Shape, cut: &LaserCut) -> String {
        let [l1, l2] = cut.laser;
        match shape.kind {
            ShapeKind::Slit { length, .. } => format!(
                "B,{:9.4},{:9.4},{:9.4},{:9.4},{:9.4}",
                l1.x,
                l1.y,
                l2.x,
                l2.y,
                self.config.slit_width(length)
            ),
            ShapeKind::Hole { .. } => format!(
                "C,{:9.4},{:9.4},{:9.4}",
                l1.x,
                l1.y,
                ((l2.x - l1.x) / 2.0).abs()
            ),
        }
    }
}

impl MaskWriter for SbrWriter {
    type E = SbrError;

    fn write_to<W: Write>(&self, shapes: &[Shape], mut out: W) -> Result<WriteReport, Self::E> {
        writeln!(out, "# mdp: {}", self.mdp_name)?;
        writeln!(out, "# Image: {}", self.image_name)?;
        writeln!(
            out,
            "# FOV Center: x={:.2}, y={:.2}",
            self.center.x, self.center.y
        )?;

        let mut report = WriteReport::default();
        // Rejections are numbered among the shapes that are not deleted
        let kept = shapes.iter().filter(|s| !s.is_deleted());
        for (index, shape) in kept.enumerate() {
            let cut = self.laser_cut(shape);
            if let Err(rejection) = self.check(shape, &cut) {
                warn!("{} {index} skipped: {rejection}", shape.kind.name());
                report.skipped.push(Skipped {
                    index,
                    reason: rejection.to_string(),
                });
                continue;
            }
            writeln!(out, "{}", self.format_line(shape, &cut))?;
            report.written += 1;
        }
        Ok(report)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SbrRejection {
    #[error("out of laser FOV (radius {0:.2})")]
    OutOfLaserFov(f64),
    #[error("out of MOIRCS FOV (x {0:.2})")]
    OutOfInstrumentFov(f64),
}

#[derive(Error, Debug)]
pub enum SbrError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}
