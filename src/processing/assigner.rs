use serde::Serialize;

use crate::data::point::SignalPoint;
use crate::grid::LocalProjection;
use crate::index::CellLocator;
use crate::processing::aggregator::Aggregator;

/// Point counters produced while assigning one shard.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AssignmentCounts {
    pub total: u64,
    /// Points that landed in a cell.
    pub assigned: u64,
    /// Points with invalid coordinates.
    pub rejected: u64,
    /// Valid points outside every cell.
    pub out_of_range: u64,
    /// Assigned points without any tracked reading. Included in `assigned`
    /// but not in any cell's data count.
    pub without_readings: u64,
}

impl AssignmentCounts {
    pub fn merge(&mut self, other: &AssignmentCounts) {
        self.total += other.total;
        self.assigned += other.assigned;
        self.rejected += other.rejected;
        self.out_of_range += other.out_of_range;
        self.without_readings += other.without_readings;
    }
}

/// Assign each point to its cell and fold it straight into `aggregator`.
///
/// Malformed points and points outside the grid are counted, never raised.
pub fn assign<L: CellLocator>(
    points: &[SignalPoint],
    locator: &L,
    projection: &LocalProjection,
    aggregator: &mut Aggregator,
) -> AssignmentCounts {
    let mut counts = AssignmentCounts::default();
    for point in points {
        counts.total += 1;

        if let Err(e) = point.validate() {
            tracing::trace!("Rejected point: {e}");
            counts.rejected += 1;
            continue;
        }

        let (x, y) = projection.project(point.latitude, point.longitude);
        match locator.locate([x, y]) {
            Some(cell) => {
                counts.assigned += 1;
                if !aggregator.accumulate(cell, point) {
                    counts.without_readings += 1;
                }
            }
            None => counts.out_of_range += 1,
        }
    }
    counts
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::point::SIGNAL_4G;
    use crate::grid::{generate_cells, GridShape, GridSpec};
    use crate::index::KdTreeLocator;

    #[test]
    fn counts_each_outcome() {
        let spec = GridSpec::new(GridShape::Square, 39.9042, 116.4074, 0.05, 0.1).unwrap();
        let cells = generate_cells(&spec).unwrap();
        let locator = KdTreeLocator::build(&cells).unwrap();
        let projection = LocalProjection::new(spec.center_lat, spec.center_lon);
        let fields = vec![SIGNAL_4G.to_string()];
        let mut agg = Aggregator::new(cells.len(), &fields);

        let points = vec![
            SignalPoint::new(39.9042, 116.4074).with_field(SIGNAL_4G, -70.0),
            SignalPoint::new(39.9042, 116.4074),
            SignalPoint::new(999.0, 116.4074).with_field(SIGNAL_4G, -70.0),
            SignalPoint::new(f64::NAN, 116.4074),
            SignalPoint::new(40.5, 116.4074).with_field(SIGNAL_4G, -70.0),
        ];
        let counts = assign(&points, &locator, &projection, &mut agg);
        assert_eq!(
            counts,
            AssignmentCounts {
                total: 5,
                assigned: 2,
                rejected: 2,
                out_of_range: 1,
                without_readings: 1,
            }
        );
    }
}
