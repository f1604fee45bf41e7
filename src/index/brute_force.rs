use geo::Polygon;

use crate::error::Result;
use crate::grid::{Cell, CellKey};
use crate::index::{prepare, resolve, CellLocator};

/// Reference locator: tests the point against every cell polygon.
///
/// O(cells) per lookup. Used to cross-check [`super::KdTreeLocator`].
#[derive(Debug, Clone)]
pub struct BruteForceLocator {
    polygons: Vec<Polygon<f64>>,
    keys: Vec<CellKey>,
}

impl CellLocator for BruteForceLocator {
    fn build(cells: &[Cell]) -> Result<Self> {
        let (polygons, keys) = prepare(cells)?;
        Ok(Self { polygons, keys })
    }

    fn locate(&self, xy: [f64; 2]) -> Option<usize> {
        resolve(0..self.polygons.len(), &self.polygons, &self.keys, xy)
    }

    fn len(&self) -> usize {
        self.polygons.len()
    }
}
