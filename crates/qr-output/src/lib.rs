//! `qr-output` — result writers for the qrouting simulator.
//!
//! | Backend | Files created                        |
//! |---------|--------------------------------------|
//! | CSV     | `series.csv`, `deliveries.csv`       |
//!
//! Deliveries can be streamed while a scenario runs through
//! [`DeliveryLogObserver`], which implements `qr_sim::SimObserver`; series
//! are exported once at the end with [`export_series`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use qr_output::{CsvWriter, DeliveryLogObserver, export_series};
//!
//! let mut log = DeliveryLogObserver::new(CsvWriter::new(Path::new("./output"))?);
//! sim.run_gradual_load(&requests, 10, 10, "gradual_10pk_gap10", &mut log)?;
//! let mut writer = log.into_writer();
//! export_series(sim.metrics(), &mut writer)?;
//! writer.finish()?;
//! ```

pub mod csv;
pub mod error;
pub mod observer;
pub mod row;
pub mod writer;

#[cfg(test)]
mod tests;

pub use csv::CsvWriter;
pub use error::{OutputError, OutputResult};
pub use observer::DeliveryLogObserver;
pub use row::{DeliveryRow, SeriesRow};
pub use writer::{OutputWriter, export_deliveries, export_series};
