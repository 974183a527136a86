//! `DeliveryLogObserver<W>` — streams deliveries to an `OutputWriter`.

use qr_core::Tick;
use qr_net::Packet;
use qr_sim::SimObserver;

use crate::row::DeliveryRow;
use crate::writer::OutputWriter;
use crate::{OutputError, OutputResult};

/// A [`SimObserver`] that writes one [`DeliveryRow`] per delivered packet.
///
/// Errors from the writer are stored internally because `SimObserver`
/// methods have no return value.  Check with [`take_error`][Self::take_error]
/// once the scenario returns.
pub struct DeliveryLogObserver<W: OutputWriter> {
    writer:     W,
    written:    usize,
    last_error: Option<OutputError>,
}

impl<W: OutputWriter> DeliveryLogObserver<W> {
    pub fn new(writer: W) -> Self {
        Self { writer, written: 0, last_error: None }
    }

    /// Rows written successfully so far.
    pub fn written(&self) -> usize {
        self.written
    }

    /// Take the stored write error, if any.
    pub fn take_error(&mut self) -> Option<OutputError> {
        self.last_error.take()
    }

    pub fn writer_mut(&mut self) -> &mut W {
        &mut self.writer
    }

    /// Unwrap the inner writer (e.g. to append series rows and finish).
    pub fn into_writer(self) -> W {
        self.writer
    }

    fn store_err(&mut self, result: OutputResult<()>) {
        match result {
            Ok(()) => self.written += 1,
            // Keep only the first error.
            Err(e) => {
                if self.last_error.is_none() {
                    self.last_error = Some(e);
                }
            }
        }
    }
}

impl<W: OutputWriter> SimObserver for DeliveryLogObserver<W> {
    fn on_delivered(&mut self, _tick: Tick, packet: &Packet) {
        if let Some(row) = DeliveryRow::from_packet(packet) {
            let result = self.writer.write_deliveries(&[row]);
            self.store_err(result);
        }
    }
}
