use geo::Polygon;
use kiddo::KdTree;
use kiddo::SquaredEuclidean;

use crate::error::Result;
use crate::grid::{Cell, CellKey};
use crate::index::{prepare, resolve, CellLocator};

/// Rotation (radians) applied to every coordinate entering the tree.
///
/// Grid centers share x or y values along whole rows and columns, and a
/// kiddo bucket cannot split more than its capacity of items with one equal
/// coordinate. At this angle no two lattice centers share a rotated axis
/// value. Distances, and therefore radius queries, are unaffected.
const AXIS_ROTATION: f64 = 0.5;

/// Slack on the search radius for rounding in the rotation (km).
const SEARCH_MARGIN_KM: f64 = 1e-9;

/// KD-tree over cell centers, refined by an exact polygon test.
///
/// A point inside a cell lies within that cell's circumradius of its
/// center, so a radius query with the largest circumradius returns every
/// cell that can contain the point: a handful of candidates instead of the
/// whole grid.
#[derive(Debug)]
pub struct KdTreeLocator {
    tree: KdTree<f64, 2>,
    polygons: Vec<Polygon<f64>>,
    keys: Vec<CellKey>,
    /// Squared search radius: largest circumradius plus margin.
    search_radius_sq: f64,
    sin: f64,
    cos: f64,
}

impl KdTreeLocator {
    fn rotate(&self, xy: [f64; 2]) -> [f64; 2] {
        rotate(xy, self.sin, self.cos)
    }
}

fn rotate(xy: [f64; 2], sin: f64, cos: f64) -> [f64; 2] {
    [xy[0] * cos - xy[1] * sin, xy[0] * sin + xy[1] * cos]
}

impl CellLocator for KdTreeLocator {
    fn build(cells: &[Cell]) -> Result<Self> {
        let (polygons, keys) = prepare(cells)?;
        let (sin, cos) = AXIS_ROTATION.sin_cos();

        let mut tree: KdTree<f64, 2> = KdTree::with_capacity(cells.len().max(1));
        let mut max_radius: f64 = 0.0;
        for (i, cell) in cells.iter().enumerate() {
            let c = cell.center_xy;
            tree.add(&rotate(c, sin, cos), i as u64);
            for v in &cell.plane_boundary {
                max_radius = max_radius.max((v[0] - c[0]).hypot(v[1] - c[1]));
            }
        }

        let reach = max_radius + SEARCH_MARGIN_KM;
        tracing::debug!(
            "Built KD-tree locator over {} cells (search radius {reach} km)",
            cells.len()
        );

        Ok(Self {
            tree,
            polygons,
            keys,
            search_radius_sq: reach * reach,
            sin,
            cos,
        })
    }

    fn locate(&self, xy: [f64; 2]) -> Option<usize> {
        if self.polygons.is_empty() {
            return None;
        }
        let candidates = self
            .tree
            .within_unsorted::<SquaredEuclidean>(&self.rotate(xy), self.search_radius_sq)
            .into_iter()
            .map(|n| n.item as usize);
        resolve(candidates, &self.polygons, &self.keys, xy)
    }

    fn len(&self) -> usize {
        self.polygons.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::{generate_cells, GridShape, GridSpec};

    #[test]
    fn large_square_grid_builds() {
        // Rows of 201 centers sharing one y value.
        let spec = GridSpec::new(GridShape::Square, 0.0, 0.0, 0.01, 1.0).unwrap();
        let cells = generate_cells(&spec).unwrap();
        let locator = KdTreeLocator::build(&cells).unwrap();
        assert_eq!(locator.len(), cells.len());
        for (i, cell) in cells.iter().enumerate().step_by(97) {
            assert_eq!(locator.locate(cell.center_xy), Some(i));
        }
    }

    #[test]
    fn empty_locator() {
        let locator = KdTreeLocator::build(&[]).unwrap();
        assert!(locator.is_empty());
        assert_eq!(locator.locate([0.0, 0.0]), None);
    }
}
