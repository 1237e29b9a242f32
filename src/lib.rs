//! Slit mask design for MOIRCS in rust

pub mod canvas;
pub mod codec;
pub mod common;
pub mod error;
pub mod fov;
pub mod grism;
pub mod math;
pub mod overlap;
pub mod session;
pub mod settings;
pub mod shape;
pub mod spectra;

pub use error::Error;
pub use session::{MaskSession, Rejection, ShapeEdit};
pub use shape::{Shape, ShapeKind, ShapeState};
