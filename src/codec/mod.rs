//! Mask description file formats
//!
//! `.mdp` is the native format and round-trips through [mdp]. `.sbr` is the
//! laser cutter input produced by [sbr] and is never read back.

pub mod common;
pub mod mdp;
pub mod sbr;

pub use common::{MaskWriter, WriteReport};
