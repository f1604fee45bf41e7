use std::fmt;

use serde::{Deserialize, Serialize};

use crate::grid::spec::GridShape;

/// Stable cell identity derived from grid coordinates.
///
/// The derived ordering is the tie-break order: when a point sits on an edge
/// shared by several cells, the cell with the smallest key owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum CellKey {
    /// Row (north offset) and column (east offset) from the center cell.
    Square { row: i32, col: i32 },
    /// Ring layer around the center hex and position within that ring.
    Hexagon { layer: u32, index: u32 },
}

impl CellKey {
    pub fn shape(&self) -> GridShape {
        match self {
            CellKey::Square { .. } => GridShape::Square,
            CellKey::Hexagon { .. } => GridShape::Hexagon,
        }
    }
}

impl fmt::Display for CellKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellKey::Square { row, col } => write!(f, "sq_{row}_{col}"),
            CellKey::Hexagon { layer, index } => write!(f, "hex_{layer}_{index}"),
        }
    }
}

/// A grid cell. Immutable once generated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub key: CellKey,
    pub center_lat: f64,
    pub center_lon: f64,
    /// Boundary vertices as (lat, lon), counter-clockwise.
    pub boundary: Vec<(f64, f64)>,
    pub size_km: f64,
    /// Center in the grid's local plane (km).
    #[serde(skip)]
    pub center_xy: [f64; 2],
    /// Boundary in the grid's local plane (km), counter-clockwise.
    #[serde(skip)]
    pub plane_boundary: Vec<[f64; 2]>,
}

impl Cell {
    pub fn id(&self) -> String {
        self.key.to_string()
    }

    pub fn shape(&self) -> GridShape {
        self.key.shape()
    }

    /// Ring layer for hexagon cells.
    pub fn layer(&self) -> Option<u32> {
        match self.key {
            CellKey::Hexagon { layer, .. } => Some(layer),
            CellKey::Square { .. } => None,
        }
    }

    /// (grid_i, grid_j) = (column, row) for square cells.
    pub fn grid_ij(&self) -> Option<(i32, i32)> {
        match self.key {
            CellKey::Square { row, col } => Some((col, row)),
            CellKey::Hexagon { .. } => None,
        }
    }

    /// Axis-aligned bounding box of the plane boundary: (min, max).
    pub fn plane_bbox(&self) -> ([f64; 2], [f64; 2]) {
        self.plane_boundary.iter().fold(
            ([f64::INFINITY; 2], [f64::NEG_INFINITY; 2]),
            |(lo, hi), v| {
                (
                    [lo[0].min(v[0]), lo[1].min(v[1])],
                    [hi[0].max(v[0]), hi[1].max(v[1])],
                )
            },
        )
    }
}
