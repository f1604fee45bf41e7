//! Output writers: cell table CSV, grid JSON and per-device aggregate rows.

pub mod json;
pub mod persist;
pub mod table;

pub use json::{export_json, to_json};
pub use persist::{records_for, AggregateRecord, AggregateStore};
pub use table::export_cell_table;
