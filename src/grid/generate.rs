//! Cell generation for square and hexagon grids.

use crate::error::{GridError, Result};
use crate::grid::cell::{Cell, CellKey};
use crate::grid::hex::{layers_for_extent, max_layers_for_extent, HexRings};
use crate::grid::projection::LocalProjection;
use crate::grid::spec::{GridShape, GridSpec};

/// Upper bound on cells per grid. Larger requests are rejected up front.
pub const MAX_CELLS: usize = 4_000_000;

/// Slack on the "center within extent" test so cells exactly at the extent
/// survive floating-point error.
const EXTENT_TOLERANCE_KM: f64 = 1e-9;

/// Generate every cell of the grid, sorted by [`CellKey`].
///
/// Square grids keep every cell whose center lies within `extent_km` of the
/// grid center. Hexagon grids add whole rings until a ring's nearest center
/// lies beyond `extent_km`. Both always contain the center cell.
pub fn generate_cells(spec: &GridSpec) -> Result<Vec<Cell>> {
    spec.validate()?;
    let projection = LocalProjection::new(spec.center_lat, spec.center_lon);

    let cells = match spec.shape {
        GridShape::Square => square_cells(spec, &projection)?,
        GridShape::Hexagon => hexagon_cells(spec, &projection)?,
    };

    tracing::debug!(
        "Generated {} {} cells (size {} km, extent {} km)",
        cells.len(),
        spec.shape,
        spec.cell_size_km,
        spec.extent_km
    );
    Ok(cells)
}

fn make_cell(
    key: CellKey,
    center_xy: [f64; 2],
    plane_boundary: Vec<[f64; 2]>,
    size_km: f64,
    projection: &LocalProjection,
) -> Cell {
    let (center_lat, center_lon) = projection.unproject(center_xy[0], center_xy[1]);
    let boundary = plane_boundary
        .iter()
        .map(|v| projection.unproject(v[0], v[1]))
        .collect();
    Cell {
        key,
        center_lat,
        center_lon,
        boundary,
        size_km,
        center_xy,
        plane_boundary,
    }
}

fn square_cells(spec: &GridSpec, projection: &LocalProjection) -> Result<Vec<Cell>> {
    let s = spec.cell_size_km;
    let reach = (spec.extent_km / s).ceil();
    let side = 2.0 * reach + 1.0;
    // The bounding square over-counts the disc by about 4/pi.
    if side * side * std::f64::consts::FRAC_PI_4 > MAX_CELLS as f64 {
        return Err(GridError::invalid_spec(
            "extent_km",
            format!("square grid of {side}x{side} cells exceeds the {MAX_CELLS} cell limit"),
        ));
    }
    let n = reach as i32;

    let mut cells = Vec::new();
    for row in -n..=n {
        for col in -n..=n {
            let cx = col as f64 * s;
            let cy = row as f64 * s;
            if cx.hypot(cy) > spec.extent_km + EXTENT_TOLERANCE_KM {
                continue;
            }
            // Edges from half-integer multiples of s, identical for both
            // cells that share them.
            let (x0, x1) = ((col as f64 - 0.5) * s, (col as f64 + 0.5) * s);
            let (y0, y1) = ((row as f64 - 0.5) * s, (row as f64 + 0.5) * s);
            let boundary = vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]];
            cells.push(make_cell(
                CellKey::Square { row, col },
                [cx, cy],
                boundary,
                s,
                projection,
            ));
        }
    }
    Ok(cells)
}

fn hexagon_cells(spec: &GridSpec, projection: &LocalProjection) -> Result<Vec<Cell>> {
    let s = spec.cell_size_km;
    let upper = max_layers_for_extent(spec.extent_km, s);
    let estimate = 1.0 + 3.0 * upper * (upper + 1.0);
    if estimate > 2.0 * MAX_CELLS as f64 {
        return Err(GridError::invalid_spec(
            "extent_km",
            format!("hexagon grid of about {upper} rings exceeds the {MAX_CELLS} cell limit"),
        ));
    }
    let layers = layers_for_extent(spec.extent_km, s);
    let total = HexRings::total(layers);
    if total > MAX_CELLS {
        return Err(GridError::invalid_spec(
            "extent_km",
            format!("hexagon grid of {layers} rings ({total} cells) exceeds the {MAX_CELLS} cell limit"),
        ));
    }

    let cells = HexRings::new(layers)
        .map(|coord| {
            make_cell(
                CellKey::Hexagon {
                    layer: coord.layer,
                    index: coord.index,
                },
                coord.center(s),
                coord.vertices(s),
                s,
                projection,
            )
        })
        .collect();
    Ok(cells)
}
