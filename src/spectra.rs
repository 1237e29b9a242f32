//! Projection of dispersed spectra onto the detector
//!
//! Each detector disperses toward the gap between the two halves, so shapes
//! above the centre line get their blue end below them and shapes below it get
//! the mirrored footprint.

use glam::DVec2;
use thiserror::Error;

use crate::canvas::{Color, Drawable, Style};
use crate::common::DisplayTransform;
use crate::grism::GrismParams;
use crate::shape::Shape;

pub const SPECTRA_BUNDLE_TAG: &str = "spectra_bundle";

/// Rectangle covered by one shape's spectrum, in display pixels
#[derive(Debug, Clone, PartialEq)]
pub struct SpectrumFootprint {
    pub index: usize,
    pub tag: String,
    /// Ends of the spectrum along y, in drawing order
    pub y_range: (f64, f64),
    pub drawable: Drawable,
}

/// Footprints of every active shape
///
/// `split_y` is the FOV centre y already mapped into display pixels.
pub fn project(
    shapes: &[Shape],
    grism: &GrismParams,
    split_y: f64,
    transform: &DisplayTransform,
) -> Result<Vec<SpectrumFootprint>, SpectraError> {
    if grism.dispersion == 0.0 {
        return Err(SpectraError::ZeroDispersion);
    }
    let scale = transform.scale();
    let bottom_length = (grism.wavestart - grism.directwave) / grism.dispersion / scale.y;
    let top_length = (grism.directwave - grism.waveend) / grism.dispersion / scale.y;
    let tilt = grism.tilt();

    let footprints = shapes
        .iter()
        .enumerate()
        .filter(|(_, shape)| shape.is_active())
        .map(|(index, shape)| {
            let center = transform.to_display(shape.position);
            let width = shape.kind.x_size() / scale.x;
            let (y_range, color) = if center.y > split_y {
                ((center.y - top_length, center.y + bottom_length), Color::Red)
            } else {
                ((center.y + top_length, center.y - bottom_length), Color::Green)
            };
            let drawable = Drawable::Rectangle {
                center: DVec2::new(center.x, (y_range.0 + y_range.1) / 2.0),
                half_size: DVec2::new(width / 2.0, (y_range.1 - y_range.0).abs() / 2.0),
                rotation: tilt,
                style: Style::solid(color),
            };
            SpectrumFootprint {
                index,
                tag: format!("spectrum_{}_{index}", shape.kind.name().to_lowercase()),
                y_range,
                drawable,
            }
        })
        .collect();
    Ok(footprints)
}

/// Group footprints into the single object drawn under [SPECTRA_BUNDLE_TAG]
pub fn bundle(footprints: Vec<SpectrumFootprint>) -> Drawable {
    Drawable::Compound(footprints.into_iter().map(|f| f.drawable).collect())
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum SpectraError {
    #[error("Grism dispersion is zero")]
    ZeroDispersion,
}
