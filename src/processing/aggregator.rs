use crate::data::point::SignalPoint;
use crate::error::{GridError, Result};
use crate::grid::Cell;
use crate::processing::statistics::{CellStats, FieldAccumulator};

/// Per-cell running statistics, stored as flat arrays indexed by the cell's
/// position in the generated grid.
///
/// `accumulators` holds `fields.len()` entries per cell, cell-major.
#[derive(Debug, Clone)]
pub struct Aggregator {
    fields: Vec<String>,
    counts: Vec<u64>,
    accumulators: Vec<FieldAccumulator>,
}

impl Aggregator {
    pub fn new(cell_count: usize, fields: &[String]) -> Self {
        Self {
            fields: fields.to_vec(),
            counts: vec![0; cell_count],
            accumulators: vec![FieldAccumulator::default(); cell_count * fields.len()],
        }
    }

    pub fn cell_count(&self) -> usize {
        self.counts.len()
    }

    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Fold one point into cell `cell`.
    ///
    /// The cell's data count rises only if the point carries at least one
    /// finite tracked reading (or no fields are tracked at all, in which case
    /// every point counts). Returns whether the point was counted.
    pub fn accumulate(&mut self, cell: usize, point: &SignalPoint) -> bool {
        let width = self.fields.len();
        let slots = &mut self.accumulators[cell * width..(cell + 1) * width];

        let mut any = width == 0;
        for (slot, name) in slots.iter_mut().zip(&self.fields) {
            if let Some(v) = point.reading(name) {
                any |= slot.push(v);
            }
        }
        if any {
            self.counts[cell] += 1;
        }
        any
    }

    /// Combine another shard's accumulators into this one.
    pub fn merge(&mut self, other: &Aggregator) -> Result<()> {
        if self.fields != other.fields || self.counts.len() != other.counts.len() {
            return Err(GridError::Internal(format!(
                "cannot merge aggregators of shape {}x{:?} and {}x{:?}",
                self.counts.len(),
                self.fields,
                other.counts.len(),
                other.fields
            )));
        }
        for (a, b) in self.counts.iter_mut().zip(&other.counts) {
            *a += b;
        }
        for (a, b) in self.accumulators.iter_mut().zip(&other.accumulators) {
            a.merge(b);
        }
        Ok(())
    }

    /// Convert running sums into final statistics, one entry per cell in
    /// `cells` order. Consumes the aggregator.
    pub fn finalize(self, cells: &[Cell]) -> Result<Vec<CellStats>> {
        if cells.len() != self.counts.len() {
            return Err(GridError::Internal(format!(
                "aggregator has {} cells, grid has {}",
                self.counts.len(),
                cells.len()
            )));
        }
        let width = self.fields.len();
        Ok(cells
            .iter()
            .enumerate()
            .map(|(i, cell)| {
                let slots = &self.accumulators[i * width..(i + 1) * width];
                CellStats {
                    cell_id: cell.id(),
                    key: cell.key,
                    data_count: self.counts[i],
                    fields: self
                        .fields
                        .iter()
                        .zip(slots)
                        .map(|(name, acc)| (name.clone(), acc.finish()))
                        .collect(),
                }
            })
            .collect())
    }
}
