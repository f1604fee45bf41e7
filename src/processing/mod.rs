pub mod aggregator;
pub mod assigner;
pub mod engine;
pub mod statistics;

pub use aggregator::Aggregator;
pub use assigner::{assign, AssignmentCounts};
pub use engine::{aggregate, GridAggregation, GridAggregationEngine, RunSummary};
pub use statistics::{CellStats, FieldAccumulator, FieldStats, SeriesStats};
