//! Reader and writer for `.mdp` mask design files
//!
//! One shape per line, whitespace separated:
//!
//! ```text
//! x y size1 size2 angle priority type [comment...]
//! ```
//!
//! A `type` starting with `B` is a slit (`size1` width, `size2` length), one
//! starting with `C` a hole (`size1` diameter, `size2` and `angle` ignored).
//! Lines starting with `#` are comments. Shapes that are not active are written
//! back as comment lines, so they vanish on the next load.

use glam::DVec2;
use log::{debug, warn};
use thiserror::Error;

use std::fs::File;
use std::io::{BufRead, BufReader, Write};
use std::path::Path;

use super::common::{MaskWriter, WriteReport};
use crate::math::Degree;
use crate::shape::{Shape, ShapeKind};

const MIN_FIELDS: usize = 7;

/// Read every shape from an `.mdp` file
pub fn read_mdp(path: &Path) -> Result<Vec<Shape>, MdpError> {
    parse_mdp(BufReader::new(File::open(path)?))
}

/// Parse `.mdp` content
///
/// Blank lines, comments and lines with fewer than seven fields are skipped.
/// Lines with unreadable numbers or an unknown type are skipped with a warning.
pub fn parse_mdp<R: BufRead>(reader: R) -> Result<Vec<Shape>, MdpError> {
    let mut shapes = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_line(line) {
            Ok(Some(shape)) => shapes.push(shape),
            Ok(None) => debug!("mdp line {}: fewer than {MIN_FIELDS} fields", lineno + 1),
            Err(e) => warn!("mdp line {}: {e}", lineno + 1),
        }
    }
    Ok(shapes)
}

fn parse_line(line: &str) -> Result<Option<Shape>, LineError> {
    let parts: Vec<&str> = line.split_whitespace().collect();
    if parts.len() < MIN_FIELDS {
        return Ok(None);
    }
    let x = parts[0].parse::<f64>()?;
    let y = parts[1].parse::<f64>()?;
    let size1 = parts[2].parse::<f64>()?;
    let kind = match parts[6].chars().next() {
        Some('B') => ShapeKind::Slit {
            width: size1,
            length: parts[3].parse::<f64>()?,
            angle: Degree::new(parts[4].parse::<f64>()?),
        },
        Some('C') => ShapeKind::Hole { diameter: size1 },
        _ => return Err(LineError::UnknownType(parts[6].to_string())),
    };
    Ok(Some(
        Shape::new(DVec2::new(x, y), kind)
            .with_priority(parts[5])
            .with_comment(parts[MIN_FIELDS..].join(" ")),
    ))
}

/// Render one shape as an `.mdp` line, without the comment prefix
pub fn format_line(shape: &Shape) -> String {
    let priority = if shape.priority.is_empty() {
        if shape.kind.is_slit() {
            "1"
        } else {
            "0"
        }
    } else {
        shape.priority.as_str()
    };
    let (size1, size2, angle) = match shape.kind {
        ShapeKind::Slit {
            width,
            length,
            angle,
        } => (width, length, angle.degrees()),
        ShapeKind::Hole { diameter } => (diameter, diameter, 0.0),
    };
    let line = format!(
        "{:.2} {:.2} {:.0} {:.0} {:.0} {} {}, {}",
        shape.x(),
        shape.y(),
        size1,
        size2,
        angle,
        priority,
        shape.kind.code(),
        shape.comment
    );
    line.trim_end().to_string()
}

/// `.mdp` writer
#[derive(Debug, Default, Clone, Copy)]
pub struct MdpWriter;

impl MaskWriter for MdpWriter {
    type E = MdpError;

    fn write_to<W: Write>(&self, shapes: &[Shape], mut out: W) -> Result<WriteReport, Self::E> {
        for shape in shapes {
            let line = format_line(shape);
            if shape.is_active() {
                writeln!(out, "{line}")?;
            } else {
                writeln!(out, "# {line}")?;
            }
        }
        Ok(WriteReport {
            written: shapes.len(),
            skipped: Vec::new(),
        })
    }
}

#[derive(Error, Debug)]
pub enum MdpError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

#[derive(Error, Debug)]
enum LineError {
    #[error(transparent)]
    ParseFloatError(#[from] std::num::ParseFloatError),
    #[error("Unknown shape type: {0}")]
    UnknownType(String),
}
