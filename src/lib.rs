//! Spatial binning of geotagged signal samples.
//!
//! Points (latitude, longitude and named readings such as `signal_4g`) are
//! assigned to the cells of a hexagonal or square grid laid out around a
//! center, and each cell gets per-field count, mean, min and max.
//!
//! ```no_run
//! use signal_grid::{aggregate, GridShape, GridSpec, SignalPoint};
//!
//! let spec = GridSpec::new(GridShape::Hexagon, 39.9042, 116.4074, 0.05, 1.0)?;
//! let points = vec![SignalPoint::new(39.9042, 116.4074).with_field("signal_4g", -72.0)];
//! let result = aggregate(&points, &spec, &["signal_4g".to_string()])?;
//! println!("{}", result.summary.report());
//! # Ok::<(), signal_grid::GridError>(())
//! ```

pub mod config;
pub mod data;
pub mod error;
pub mod export;
pub mod grid;
pub mod index;
pub mod processing;

pub use config::RunConfig;
pub use data::SignalPoint;
pub use error::{GridError, Result};
pub use grid::{Cell, CellKey, GridShape, GridSpec};
pub use index::{BruteForceLocator, CellLocator, KdTreeLocator};
pub use processing::{aggregate, CellStats, FieldStats, GridAggregation, GridAggregationEngine, RunSummary};
