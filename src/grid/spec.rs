use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GridError, Result};

/// Cell shape of a grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GridShape {
    Hexagon,
    Square,
}

impl GridShape {
    pub fn label(&self) -> &'static str {
        match self {
            GridShape::Hexagon => "hexagon",
            GridShape::Square => "square",
        }
    }

    /// Vertices per cell boundary.
    pub fn vertex_count(&self) -> usize {
        match self {
            GridShape::Hexagon => 6,
            GridShape::Square => 4,
        }
    }

    /// Distance from a cell center to its farthest vertex, for cell size `s`.
    /// `s` is the edge length for both shapes.
    pub fn circumradius(&self, s: f64) -> f64 {
        match self {
            GridShape::Hexagon => s,
            GridShape::Square => s * std::f64::consts::FRAC_1_SQRT_2,
        }
    }
}

impl fmt::Display for GridShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for GridShape {
    type Err = GridError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "hexagon" | "hex" | "hexagonal" => Ok(GridShape::Hexagon),
            "square" | "sq" => Ok(GridShape::Square),
            other => Err(GridError::invalid_spec(
                "shape",
                format!("must be hexagon or square, got {other:?}"),
            )),
        }
    }
}

/// A validated grid request.
///
/// `extent_km` smaller than `cell_size_km` is accepted and yields the center
/// cell alone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSpec {
    pub shape: GridShape,
    pub center_lat: f64,
    pub center_lon: f64,
    /// Edge length of a cell.
    pub cell_size_km: f64,
    /// Radius around the center that the grid covers.
    pub extent_km: f64,
}

impl GridSpec {
    pub fn new(
        shape: GridShape,
        center_lat: f64,
        center_lon: f64,
        cell_size_km: f64,
        extent_km: f64,
    ) -> Result<Self> {
        let spec = Self {
            shape,
            center_lat,
            center_lon,
            cell_size_km,
            extent_km,
        };
        spec.validate()?;
        Ok(spec)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.cell_size_km.is_finite() && self.cell_size_km > 0.0) {
            return Err(GridError::invalid_spec(
                "cell_size_km",
                format!("must be a positive finite number, got {}", self.cell_size_km),
            ));
        }
        if !(self.extent_km.is_finite() && self.extent_km > 0.0) {
            return Err(GridError::invalid_spec(
                "extent_km",
                format!("must be a positive finite number, got {}", self.extent_km),
            ));
        }
        if !(self.center_lat.is_finite() && (-90.0..=90.0).contains(&self.center_lat)) {
            return Err(GridError::invalid_spec(
                "center_lat",
                format!("must be within [-90, 90], got {}", self.center_lat),
            ));
        }
        if !(self.center_lon.is_finite() && (-180.0..=180.0).contains(&self.center_lon)) {
            return Err(GridError::invalid_spec(
                "center_lon",
                format!("must be within [-180, 180], got {}", self.center_lon),
            ));
        }
        Ok(())
    }
}
