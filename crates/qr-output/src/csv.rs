//! CSV output backend.
//!
//! Creates two files in the configured output directory:
//! - `series.csv`
//! - `deliveries.csv`

use std::fs::File;
use std::path::Path;

use csv::Writer;

use crate::writer::OutputWriter;
use crate::{DeliveryRow, OutputResult, SeriesRow};

/// Writes results to two CSV files.
pub struct CsvWriter {
    series:     Writer<File>,
    deliveries: Writer<File>,
    finished:   bool,
}

impl CsvWriter {
    /// Create `dir` if needed, open the two CSV files, and write the header
    /// rows.
    pub fn new(dir: &Path) -> OutputResult<Self> {
        std::fs::create_dir_all(dir)?;

        let mut series = Writer::from_path(dir.join("series.csv"))?;
        series.write_record(["label", "tick", "avg_delivery_time"])?;

        let mut deliveries = Writer::from_path(dir.join("deliveries.csv"))?;
        deliveries.write_record(["packet_id", "origin", "destination", "sent", "received", "hops"])?;

        Ok(Self {
            series,
            deliveries,
            finished: false,
        })
    }
}

impl OutputWriter for CsvWriter {
    fn write_series(&mut self, rows: &[SeriesRow]) -> OutputResult<()> {
        for row in rows {
            self.series.write_record(&[
                row.label.clone(),
                row.tick.to_string(),
                row.avg_delivery_time.to_string(),
            ])?;
        }
        Ok(())
    }

    fn write_deliveries(&mut self, rows: &[DeliveryRow]) -> OutputResult<()> {
        for row in rows {
            self.deliveries.write_record(&[
                row.packet_id.to_string(),
                row.origin.to_string(),
                row.destination.to_string(),
                row.sent.to_string(),
                row.received.to_string(),
                row.hops.to_string(),
            ])?;
        }
        Ok(())
    }

    fn finish(&mut self) -> OutputResult<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.series.flush()?;
        self.deliveries.flush()?;
        Ok(())
    }
}
