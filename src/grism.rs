//! Grism parameter sets
//!
//! Wavelengths are in Å and dispersion in Å/pixel. The built-in table carries
//! nominal values for each MOIRCS grism; a site table can replace it through
//! [GrismTable::from_json_file].

use serde::{Deserialize, Serialize};
use thiserror::Error;

use std::collections::BTreeMap;
use std::path::Path;

use crate::math::Degree;

/// Names of the editable parameters, in display order
pub const PARAMETER_NAMES: [&str; 9] = [
    "directwave",
    "wavestart",
    "waveend",
    "dispersion",
    "zero_offset",
    "dx1",
    "dx2",
    "tilt1",
    "tilt2",
];

pub const DEFAULT_GRISM: &str = "zJ500";

#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrismParams {
    pub directwave: f64,
    pub wavestart: f64,
    pub waveend: f64,
    pub dispersion: f64,
    pub zero_offset: f64,
    pub dx1: f64,
    pub dx2: f64,
    pub tilt1: f64,
    pub tilt2: f64,
}

impl GrismParams {
    fn nominal(directwave: f64, wavestart: f64, waveend: f64, dispersion: f64) -> Self {
        Self {
            directwave,
            wavestart,
            waveend,
            dispersion,
            ..Default::default()
        }
    }

    pub fn get(&self, key: &str) -> Result<f64, GrismError> {
        Ok(*self.field(key)?)
    }

    pub fn set(&mut self, key: &str, value: f64) -> Result<(), GrismError> {
        *self.field_mut(key)? = value;
        Ok(())
    }

    fn field(&self, key: &str) -> Result<&f64, GrismError> {
        Ok(match key {
            "directwave" => &self.directwave,
            "wavestart" => &self.wavestart,
            "waveend" => &self.waveend,
            "dispersion" => &self.dispersion,
            "zero_offset" => &self.zero_offset,
            "dx1" => &self.dx1,
            "dx2" => &self.dx2,
            "tilt1" => &self.tilt1,
            "tilt2" => &self.tilt2,
            other => return Err(GrismError::UnknownParameter(other.to_string())),
        })
    }

    fn field_mut(&mut self, key: &str) -> Result<&mut f64, GrismError> {
        Ok(match key {
            "directwave" => &mut self.directwave,
            "wavestart" => &mut self.wavestart,
            "waveend" => &mut self.waveend,
            "dispersion" => &mut self.dispersion,
            "zero_offset" => &mut self.zero_offset,
            "dx1" => &mut self.dx1,
            "dx2" => &mut self.dx2,
            "tilt1" => &mut self.tilt1,
            "tilt2" => &mut self.tilt2,
            other => return Err(GrismError::UnknownParameter(other.to_string())),
        })
    }

    /// Mean of the two tilt angles
    pub fn tilt(&self) -> Degree {
        Degree::new((self.tilt1 + self.tilt2) / 2.0)
    }
}

/// Grism parameter sets keyed by grism name
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GrismTable(BTreeMap<String, GrismParams>);

impl Default for GrismTable {
    fn default() -> Self {
        let table = [
            ("zJ500", GrismParams::nominal(12500.0, 9000.0, 17800.0, 5.57)),
            ("HK500", GrismParams::nominal(19000.0, 13000.0, 25000.0, 7.72)),
            ("LS_J", GrismParams::nominal(12500.0, 11500.0, 13800.0, 1.94)),
            ("LS_H", GrismParams::nominal(16500.0, 14700.0, 18000.0, 2.57)),
            ("VB_K", GrismParams::nominal(22000.0, 19500.0, 24000.0, 3.88)),
            ("VPH-Y", GrismParams::nominal(10500.0, 9500.0, 11600.0, 1.97)),
        ];
        Self(
            table
                .into_iter()
                .map(|(name, params)| (name.to_string(), params))
                .collect(),
        )
    }
}

impl GrismTable {
    pub fn get(&self, name: &str) -> Result<GrismParams, GrismError> {
        self.0
            .get(name)
            .copied()
            .ok_or_else(|| GrismError::UnknownGrism(name.to_string()))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn from_json_file(path: &Path) -> Result<Self, GrismError> {
        let json = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&json)?)
    }
}

#[derive(Error, Debug)]
pub enum GrismError {
    #[error("Unknown grism: {0}")]
    UnknownGrism(String),
    #[error("Unknown grism parameter: {0}")]
    UnknownParameter(String),
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error(transparent)]
    JsonError(#[from] serde_json::Error),
}
