//! Grid specification and cell geometry.

pub mod cell;
pub mod generate;
pub mod hex;
pub mod projection;
pub mod spec;

pub use cell::{Cell, CellKey};
pub use generate::generate_cells;
pub use projection::LocalProjection;
pub use spec::{GridShape, GridSpec};
