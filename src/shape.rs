//! Slits and holes placed on a mask
//!
//! All sizes are in detector pixels of the mask frame. Size limits are only
//! checked when a shape is edited interactively, legacy mask files may carry
//! shapes outside of them.

use glam::DVec2;
use thiserror::Error;

use crate::math::Degree;

pub const DEFAULT_SLIT_WIDTH: f64 = 100.0;
pub const DEFAULT_SLIT_LENGTH: f64 = 7.0;
pub const DEFAULT_HOLE_DIAMETER: f64 = 30.0;

pub const MIN_SLIT_WIDTH: f64 = 35.0;
pub const MIN_SLIT_LENGTH: f64 = 6.8;
pub const HOLE_DIAMETER_RANGE: std::ops::RangeInclusive<f64> = 20.0..=30.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    /// Rectangular aperture
    Slit {
        width: f64,
        length: f64,
        angle: Degree,
    },
    /// Circular aperture
    Hole { diameter: f64 },
}
impl ShapeKind {
    pub fn default_slit() -> Self {
        ShapeKind::Slit {
            width: DEFAULT_SLIT_WIDTH,
            length: DEFAULT_SLIT_LENGTH,
            angle: Degree::default(),
        }
    }
    pub fn default_hole() -> Self {
        ShapeKind::Hole {
            diameter: DEFAULT_HOLE_DIAMETER,
        }
    }

    /// Letter identifying the kind in mask files
    pub fn code(&self) -> char {
        match self {
            ShapeKind::Slit { .. } => 'B',
            ShapeKind::Hole { .. } => 'C',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ShapeKind::Slit { .. } => "Slit",
            ShapeKind::Hole { .. } => "Hole",
        }
    }

    pub fn is_slit(&self) -> bool {
        matches!(self, ShapeKind::Slit { .. })
    }

    /// Extent along x, slit width or hole diameter
    pub fn x_size(&self) -> f64 {
        match *self {
            ShapeKind::Slit { width, .. } => width,
            ShapeKind::Hole { diameter } => diameter,
        }
    }

    /// Check interactive edit limits
    pub fn check_limits(&self) -> Result<(), SizeError> {
        match *self {
            ShapeKind::Slit { width, .. } if width < MIN_SLIT_WIDTH => {
                Err(SizeError::SlitTooNarrow(width))
            }
            ShapeKind::Slit { length, .. } if length < MIN_SLIT_LENGTH => {
                Err(SizeError::SlitTooShort(length))
            }
            ShapeKind::Hole { diameter } if !HOLE_DIAMETER_RANGE.contains(&diameter) => {
                Err(SizeError::HoleDiameter(diameter))
            }
            _ => Ok(()),
        }
    }
}

/// Visibility of a shape
///
/// Excluded shapes stay selectable and may be included again. Deleted shapes are
/// only kept so that they survive a save as commented-out lines.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ShapeState {
    #[default]
    Active,
    Excluded,
    Deleted,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Shape {
    pub position: DVec2,
    pub kind: ShapeKind,
    pub priority: String,
    pub comment: String,
    pub state: ShapeState,
}
impl Shape {
    pub fn new(position: DVec2, kind: ShapeKind) -> Self {
        let priority = if kind.is_slit() { "1" } else { "0" };
        Self {
            position,
            kind,
            priority: priority.to_string(),
            comment: String::new(),
            state: ShapeState::Active,
        }
    }

    pub fn with_comment(self, comment: impl Into<String>) -> Self {
        Self {
            comment: comment.into(),
            ..self
        }
    }

    pub fn with_priority(self, priority: impl Into<String>) -> Self {
        Self {
            priority: priority.into(),
            ..self
        }
    }

    pub fn x(&self) -> f64 {
        self.position.x
    }
    pub fn y(&self) -> f64 {
        self.position.y
    }

    pub fn is_active(&self) -> bool {
        self.state == ShapeState::Active
    }
    pub fn is_deleted(&self) -> bool {
        self.state == ShapeState::Deleted
    }

    /// Half of the horizontal extent
    pub fn half_extent_x(&self) -> f64 {
        self.kind.x_size() / 2.0
    }

    /// Closed horizontal interval covered by the aperture
    pub fn x_bounds(&self) -> (f64, f64) {
        let half = self.half_extent_x();
        (self.x() - half, self.x() + half)
    }
}

#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SizeError {
    #[error("Width must be at least 35 (got {0})")]
    SlitTooNarrow(f64),
    #[error("Length must be at least 6.8 (got {0})")]
    SlitTooShort(f64),
    #[error("Diameter must be between 20 and 30 (got {0})")]
    HoleDiameter(f64),
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_limits() {
        assert!(ShapeKind::default_slit().check_limits().is_ok());
        assert!(ShapeKind::default_hole().check_limits().is_ok());
        let narrow = ShapeKind::Slit {
            width: 34.9,
            length: 7.0,
            angle: Degree::default(),
        };
        assert_eq!(narrow.check_limits(), Err(SizeError::SlitTooNarrow(34.9)));
        let short = ShapeKind::Slit {
            width: 35.0,
            length: 6.7,
            angle: Degree::default(),
        };
        assert_eq!(short.check_limits(), Err(SizeError::SlitTooShort(6.7)));
        assert!(ShapeKind::Hole { diameter: 20.0 }.check_limits().is_ok());
        assert!(ShapeKind::Hole { diameter: 30.5 }.check_limits().is_err());
    }

    #[test]
    fn test_x_bounds() {
        let slit = Shape::new(DVec2::new(500.0, 10.0), ShapeKind::default_slit());
        assert_eq!(slit.x_bounds(), (450.0, 550.0));
        let hole = Shape::new(DVec2::new(500.0, 10.0), ShapeKind::default_hole());
        assert_eq!(hole.x_bounds(), (485.0, 515.0));
        assert_eq!(hole.priority, "0");
    }
}
