//! Primitives and traits for mask writers
//!
//! Provides the [MaskWriter] trait as well as the [WriteReport] type
//! so that every output format reports skipped shapes the same way.

use std::error::Error;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::shape::Shape;

/// Mask Writer Trait
pub trait MaskWriter {
    type E: Error + From<std::io::Error>;

    /// Serialize `shapes` into `out`
    fn write_to<W: Write>(&self, shapes: &[Shape], out: W) -> Result<WriteReport, Self::E>;

    /// Create (or truncate) `path` and write into it
    ///
    /// A failure part way leaves whatever was already written in place.
    fn save(&self, shapes: &[Shape], path: &Path) -> Result<WriteReport, Self::E> {
        let mut out = BufWriter::new(File::create(path)?);
        let report = self.write_to(shapes, &mut out)?;
        out.flush()?;
        Ok(report)
    }
}

/// A shape that a writer refused to emit
#[derive(Debug, Clone, PartialEq)]
pub struct Skipped {
    /// Position of the shape among those the writer considered for output
    pub index: usize,
    pub reason: String,
}

#[derive(Debug, Default, Clone, PartialEq)]
/// Outcome of writing a mask file
pub struct WriteReport {
    /// Data lines written, commented-out shapes included
    pub written: usize,
    pub skipped: Vec<Skipped>,
}
