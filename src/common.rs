use glam::DVec2;
use serde::{Deserialize, Serialize};

use crate::canvas::Drawable;

/// Host coordinate context mapping stored mask pixels (x, y) to displayed pixels
///
/// Displayed images may be binned and resampled relative to the detector frame
/// the mask file is written in.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DisplayTransform {
    pub bin: [f64; 2],
    pub samplefac: f64,
    pub offset: [f64; 2],
}
impl Default for DisplayTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
impl DisplayTransform {
    pub const IDENTITY: Self = Self {
        bin: [1.0, 1.0],
        samplefac: 1.0,
        offset: [0.0, 0.0],
    };

    pub fn new(bin: [f64; 2], samplefac: f64, offset: [f64; 2]) -> Self {
        Self {
            bin,
            samplefac,
            offset,
        }
    }

    /// Per-axis divisor between mask and display pixels
    pub fn scale(&self) -> DVec2 {
        DVec2::new(self.bin[0], self.bin[1]) * self.samplefac
    }

    pub fn to_display(&self, mask: DVec2) -> DVec2 {
        (mask - DVec2::from(self.offset)) / self.scale()
    }

    pub fn to_mask(&self, display: DVec2) -> DVec2 {
        display * self.scale() + DVec2::from(self.offset)
    }

    /// Map a y coordinate alone, used for the detector split line
    pub fn y_to_display(&self, y: f64) -> f64 {
        (y - self.offset[1]) / self.bin[1] / self.samplefac
    }

    /// Map a drawable built in mask pixels onto the display
    pub fn apply(&self, drawable: &Drawable) -> Drawable {
        let scale = self.scale();
        match drawable {
            Drawable::Circle {
                center,
                radius,
                style,
            } => Drawable::Circle {
                center: self.to_display(*center),
                radius: radius / scale.x,
                style: *style,
            },
            Drawable::Rectangle {
                center,
                half_size,
                rotation,
                style,
            } => Drawable::Rectangle {
                center: self.to_display(*center),
                half_size: *half_size / scale,
                rotation: *rotation,
                style: *style,
            },
            Drawable::Line { from, to, style } => Drawable::Line {
                from: self.to_display(*from),
                to: self.to_display(*to),
                style: *style,
            },
            Drawable::Text {
                at,
                text,
                rotation,
                style,
            } => Drawable::Text {
                at: self.to_display(*at),
                text: text.clone(),
                rotation: *rotation,
                style: *style,
            },
            Drawable::Compound(items) => {
                Drawable::Compound(items.iter().map(|d| self.apply(d)).collect())
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_display_round_trip() {
        let t = DisplayTransform::new([2.0, 2.0], 0.5, [10.0, 20.0]);
        let mask = DVec2::new(1084.0, 1786.0);
        let display = t.to_display(mask);
        assert_relative_eq!(display.x, 1074.0);
        assert_relative_eq!(display.y, 1766.0);
        let back = t.to_mask(display);
        assert_relative_eq!(back.x, mask.x);
        assert_relative_eq!(back.y, mask.y);
        assert_relative_eq!(t.y_to_display(mask.y), display.y);
    }

    #[test]
    fn test_identity() {
        let p = DVec2::new(3.5, -7.25);
        assert_eq!(DisplayTransform::default().to_display(p), p);
    }
}
