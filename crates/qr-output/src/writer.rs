//! The `OutputWriter` trait and bulk export helpers.

use qr_sim::MetricsCollector;

use crate::{DeliveryRow, OutputResult, SeriesRow};

/// Trait implemented by result backends.
pub trait OutputWriter {
    /// Write a batch of series points.
    fn write_series(&mut self, rows: &[SeriesRow]) -> OutputResult<()>;

    /// Write a batch of delivery records.
    fn write_deliveries(&mut self, rows: &[DeliveryRow]) -> OutputResult<()>;

    /// Flush and close all underlying file handles.
    ///
    /// Idempotent — safe to call more than once.
    fn finish(&mut self) -> OutputResult<()>;
}

/// Write every series the collector holds, in the order the labels were
/// first started.  Returns the number of rows written.
pub fn export_series<W: OutputWriter + ?Sized>(
    metrics: &MetricsCollector,
    writer:  &mut W,
) -> OutputResult<usize> {
    let rows: Vec<SeriesRow> = metrics
        .all_series()
        .iter()
        .flat_map(|s| s.samples.iter().map(|p| SeriesRow::new(&s.label, p)))
        .collect();
    writer.write_series(&rows)?;
    Ok(rows.len())
}

/// Write every delivery the collector has registered.  Returns the number of
/// rows written.
pub fn export_deliveries<W: OutputWriter + ?Sized>(
    metrics: &MetricsCollector,
    writer:  &mut W,
) -> OutputResult<usize> {
    let rows: Vec<DeliveryRow> = metrics.delivered().iter().map(DeliveryRow::from).collect();
    writer.write_deliveries(&rows)?;
    Ok(rows.len())
}
