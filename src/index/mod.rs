//! Point-to-cell lookup.
//!
//! Two locators satisfy the same contract: [`BruteForceLocator`] tests every
//! cell and serves as the reference, [`KdTreeLocator`] narrows candidates
//! with a KD-tree over cell centers before the exact test. Both resolve
//! points on shared edges to the cell with the smallest [`CellKey`].

pub mod brute_force;
pub mod kd_tree;
pub mod polygon;

pub use brute_force::BruteForceLocator;
pub use kd_tree::KdTreeLocator;

use geo::Polygon;

use crate::error::{GridError, Result};
use crate::grid::{Cell, CellKey};

/// Index over a fixed set of cells answering "which cell owns this point".
///
/// Locators are immutable once built and can be shared across threads.
pub trait CellLocator: Send + Sync + Sized {
    /// Build from cells in the grid's local plane.
    fn build(cells: &[Cell]) -> Result<Self>;

    /// Position (in the slice given to `build`) of the cell containing `xy`,
    /// or `None` if the point lies outside every cell.
    fn locate(&self, xy: [f64; 2]) -> Option<usize>;

    /// Number of indexed cells.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Validate boundaries and build what every locator needs.
pub(crate) fn prepare(cells: &[Cell]) -> Result<(Vec<Polygon<f64>>, Vec<CellKey>)> {
    let mut polygons = Vec::with_capacity(cells.len());
    let mut keys = Vec::with_capacity(cells.len());
    for cell in cells {
        let polygon = polygon::cell_polygon(&cell.plane_boundary).map_err(|reason| {
            GridError::IndexBuildFailure {
                cell: cell.id(),
                reason,
            }
        })?;
        polygons.push(polygon);
        keys.push(cell.key);
    }
    Ok((polygons, keys))
}

/// Among candidate positions whose polygon contains `xy`, pick the one with
/// the smallest key.
pub(crate) fn resolve<I>(
    candidates: I,
    polygons: &[Polygon<f64>],
    keys: &[CellKey],
    xy: [f64; 2],
) -> Option<usize>
where
    I: IntoIterator<Item = usize>,
{
    candidates
        .into_iter()
        .filter(|&i| polygon::contains(&polygons[i], xy))
        .min_by_key(|&i| keys[i])
}
