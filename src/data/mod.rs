pub mod datetime;
pub mod flight_record;
pub mod loader;
pub mod parser;
pub mod point;
pub mod sample;

pub use point::SignalPoint;
