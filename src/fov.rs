//! MOIRCS field-of-view overlay and placement checks
//!
//! The overlay follows a single geometric convention:
//!
//! * fixed plate scale of 0.117"/pixel, independent of the displayed image
//! * two 4'×4' detector squares whose centres sit 1.5' above and below the FOV
//!   centre, covering 4'×7' with a 1' overlap strip around the centre line
//! * a 3' radius circle bounding the usable field
//! * a horizontal centre line marking the gap between the two detectors
//!
//! Detector 1 lies at lower y than the centre, detector 2 at higher y.
//! Everything is built in mask pixel coordinates.

use glam::DVec2;
use log::info;

use crate::canvas::{Color, Drawable, Style};
use crate::math::{rotate_about, Arcsec, Degree, PixelScale};

/// Side of one detector square
pub const DETECTOR_SIZE_ARCMIN: f64 = 4.0;
/// Overlap between the two detector squares along y
pub const DETECTOR_OVERLAP_ARCMIN: f64 = 1.0;
/// Radius of the field circle
pub const FIELD_RADIUS_ARCMIN: f64 = 3.0;
/// Default minimum distance of an aperture from the detector gap
pub const GAP_LIMIT_ARCSEC: f64 = 10.0;
/// Slack in pixels for positions computed from the same arcsec limit
const GAP_TOLERANCE: f64 = 1e-9;

pub const FOV_BASE_TAG: &str = "fov_base";
pub const DET1_TAG: &str = "det1_group";
pub const DET2_TAG: &str = "det2_group";

/// Circle, label and centre line plus four edges and a label per detector
const PRIMITIVE_COUNT: usize = 3 + 5 + 5;

/// Pure geometry of the field around a centre, in mask pixels
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FovGeometry {
    pub center: DVec2,
    pub pixel_scale: PixelScale,
}
impl FovGeometry {
    pub fn new(center: DVec2, pixel_scale: PixelScale) -> Self {
        Self {
            center,
            pixel_scale,
        }
    }

    /// Half of the detector width
    pub fn half_width(&self) -> f64 {
        self.pixel_scale
            .pixels(Arcsec::from_arcmin(DETECTOR_SIZE_ARCMIN / 2.0))
    }

    pub fn radius(&self) -> f64 {
        self.pixel_scale
            .pixels(Arcsec::from_arcmin(FIELD_RADIUS_ARCMIN))
    }

    /// Distance along y from the FOV centre to each detector centre
    pub fn detector_offset(&self) -> f64 {
        self.pixel_scale.pixels(Arcsec::from_arcmin(
            (DETECTOR_SIZE_ARCMIN - DETECTOR_OVERLAP_ARCMIN) / 2.0,
        ))
    }

    /// True when x is within the detector width and (x, y) inside the field circle
    pub fn is_within_fov(&self, x: f64, y: f64) -> bool {
        let d = DVec2::new(x, y) - self.center;
        d.x.abs() <= self.half_width() && d.length() <= self.radius()
    }

    /// True when y keeps at least `min_offset` from the detector gap
    pub fn is_within_gap_limit(&self, y: f64, min_offset: Arcsec) -> bool {
        (y - self.center.y).abs() + GAP_TOLERANCE >= self.pixel_scale.pixels(min_offset)
    }
}

/// Positioned overlay template drawn on top of the image
#[derive(Debug, Clone)]
pub struct FovModel {
    geometry: FovGeometry,
    position_angle: Degree,
    flipped: bool,
    base: Drawable,
    det1: Drawable,
    det2: Drawable,
}

impl FovModel {
    pub fn build(center: DVec2, pixel_scale: PixelScale) -> Self {
        let geometry = FovGeometry::new(center, pixel_scale);
        let mut model = Self {
            geometry,
            position_angle: Degree::default(),
            flipped: false,
            base: Drawable::Compound(Vec::new()),
            det1: Drawable::Compound(Vec::new()),
            det2: Drawable::Compound(Vec::new()),
        };
        model.rebuild();
        model
    }

    pub fn geometry(&self) -> &FovGeometry {
        &self.geometry
    }
    pub fn center(&self) -> DVec2 {
        self.geometry.center
    }
    pub fn position_angle(&self) -> Degree {
        self.position_angle
    }

    /// Move every primitive so the overlay is centred on `center`
    pub fn reposition(&mut self, center: DVec2) {
        self.geometry.center = center;
        self.rebuild();
    }

    /// The plate scale is fixed, so this only reports the image size
    pub fn rescale(&mut self, image_width: u32, image_height: u32) {
        info!(
            "Image dimensions: width={image_width}, height={image_height}; using fixed pixel scale {:.3} arcsec/pixel",
            self.geometry.pixel_scale.arcsec()
        );
    }

    pub fn set_position_angle(&mut self, pa: Degree) {
        self.position_angle = pa;
        self.rebuild();
    }

    /// Mirror the overlay in x about its centre
    pub fn set_flip(&mut self, flipped: bool) {
        self.flipped = flipped;
        self.rebuild();
    }

    pub fn primitive_count(&self) -> usize {
        self.base.primitive_count() + self.det1.primitive_count() + self.det2.primitive_count()
    }

    pub fn is_consistent(&self) -> bool {
        self.primitive_count() == PRIMITIVE_COUNT
    }

    /// Overlay groups to show, keyed by canvas tag
    pub fn groups(&self, ch1: bool, ch2: bool) -> Vec<(&'static str, &Drawable)> {
        let mut groups = vec![(FOV_BASE_TAG, &self.base)];
        if ch1 {
            groups.push((DET1_TAG, &self.det1));
        }
        if ch2 {
            groups.push((DET2_TAG, &self.det2));
        }
        groups
    }

    /// Recreate all primitives from the current centre, angle and flip
    pub fn rebuild(&mut self) {
        let g = self.geometry;
        let c = g.center;
        let xr = g.half_width();
        let yr = xr;
        let offset = g.detector_offset();
        let pa = self.position_angle;
        let flipped = self.flipped;

        let place = |p: DVec2| -> DVec2 {
            let p = if flipped {
                DVec2::new(2.0 * c.x - p.x, p.y)
            } else {
                p
            };
            rotate_about(p, c, pa)
        };
        let line = |x1: f64, y1: f64, x2: f64, y2: f64, style: Style| Drawable::Line {
            from: place(DVec2::new(x1, y1)),
            to: place(DVec2::new(x2, y2)),
            style,
        };
        let text = |x: f64, y: f64, text: &str| Drawable::Text {
            at: place(DVec2::new(x, y)),
            text: text.to_string(),
            rotation: pa,
            style: Style::solid(Color::White),
        };
        let solid = Style::solid(Color::Yellow);
        let dashed = Style::dashed(Color::Yellow);

        self.base = Drawable::Compound(vec![
            Drawable::Circle {
                center: c,
                radius: g.radius(),
                style: Style::solid(Color::White),
            },
            text(c.x - xr, c.y + yr + offset, "MOIRCS FOV (4x7 arcmin)"),
            line(c.x - xr, c.y, c.x + xr, c.y, solid),
        ]);

        // Dashed edge on the overlap side of each detector
        let (lo, hi) = (c.y - offset - yr, c.y - offset + yr);
        self.det1 = Drawable::Compound(vec![
            line(c.x - xr, lo, c.x + xr, lo, solid),
            line(c.x - xr, lo, c.x - xr, hi, solid),
            line(c.x + xr, lo, c.x + xr, hi, solid),
            line(c.x - xr, hi, c.x + xr, hi, dashed),
            text(c.x + xr, lo, "Det 1"),
        ]);

        let (lo, hi) = (c.y + offset - yr, c.y + offset + yr);
        self.det2 = Drawable::Compound(vec![
            line(c.x - xr, hi, c.x + xr, hi, solid),
            line(c.x - xr, lo, c.x - xr, hi, solid),
            line(c.x + xr, lo, c.x + xr, hi, solid),
            line(c.x - xr, lo, c.x + xr, lo, dashed),
            text(c.x + xr, hi, "Det 2"),
        ]);
    }
}
