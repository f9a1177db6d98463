//! Data module - CSV loading and record coercion

mod loader;
mod processor;
mod record;

pub use loader::{DataLoader, LoaderError};
pub use processor::DataProcessor;
pub use record::{parse_full_date, EarthquakeRecord};
