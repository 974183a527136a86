//! Delivery registry and average-delivery-time series.
//!
//! The registry is global for the collector's lifetime: starting a new
//! labeled series does not forget earlier deliveries, because the network
//! keeps learning across scenarios and the averages are meant to reflect
//! that.

use std::collections::HashSet;

use qr_core::{NodeId, PacketId, Tick};
use qr_net::Packet;

use crate::SimObserver;

/// The part of a delivered packet the metrics keep.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DeliveryRecord {
    pub packet:      PacketId,
    pub origin:      NodeId,
    pub destination: NodeId,
    /// Send tick of the first hop.
    pub sent:        Tick,
    /// Receive tick of the last hop.
    pub received:    Tick,
    pub hops:        usize,
}

impl DeliveryRecord {
    /// `None` for a packet that never travelled.
    pub fn from_packet(packet: &Packet) -> Option<Self> {
        let first = packet.route().first()?;
        let last = packet.route().last()?;
        Some(Self {
            packet:      packet.id(),
            origin:      packet.origin(),
            destination: packet.destination(),
            sent:        first.sent,
            received:    last.received,
            hops:        packet.route().len(),
        })
    }

    #[inline]
    pub fn delivery_time(&self) -> u64 {
        self.received.since(self.sent)
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Sample {
    pub tick:                  Tick,
    pub average_delivery_time: f64,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Series {
    pub label:   String,
    pub samples: Vec<Sample>,
}

// ── MetricsCollector ──────────────────────────────────────────────────────────

pub struct MetricsCollector {
    sample_every: u64,
    delivered:    Vec<DeliveryRecord>,
    seen:         HashSet<PacketId>,
    /// In the order the labels were first started.
    series:       Vec<Series>,
    active:       Option<usize>,
    total_time:   u64,
}

impl MetricsCollector {
    /// Sample on every tick that is a multiple of `sample_every`.
    pub fn new(sample_every: u64) -> Self {
        Self {
            sample_every,
            delivered:  Vec::new(),
            seen:       HashSet::new(),
            series:     Vec::new(),
            active:     None,
            total_time: 0,
        }
    }

    pub fn sample_every(&self) -> u64 {
        self.sample_every
    }

    /// Make `label` the active series, clearing any samples it already had.
    /// Deliveries are kept.
    pub fn start_series(&mut self, label: &str) {
        let index = match self.series.iter().position(|s| s.label == label) {
            Some(i) => {
                self.series[i].samples.clear();
                i
            }
            None => {
                self.series.push(Series { label: label.to_owned(), samples: Vec::new() });
                self.series.len() - 1
            }
        };
        self.active = Some(index);
    }

    pub fn active_label(&self) -> Option<&str> {
        self.active.map(|i| self.series[i].label.as_str())
    }

    /// Register a delivered packet.  Returns `false` (and changes nothing)
    /// if this packet id was registered before.
    pub fn register_delivery(&mut self, packet: &Packet) -> bool {
        if !self.seen.insert(packet.id()) {
            tracing::warn!(packet = packet.id().0, "delivery registered twice; ignoring");
            return false;
        }
        if let Some(record) = DeliveryRecord::from_packet(packet) {
            self.total_time += record.delivery_time();
            self.delivered.push(record);
        }
        true
    }

    /// Append `(tick, average so far)` to the active series when `tick`
    /// falls on the sampling period.
    pub fn sample(&mut self, tick: Tick) -> Option<Sample> {
        let index = self.active?;
        if !tick.is_multiple_of(self.sample_every) {
            return None;
        }
        let sample = Sample { tick, average_delivery_time: self.average_delivery_time_so_far() };
        self.series[index].samples.push(sample);
        Some(sample)
    }

    /// Ticks from first send to last receive; zero for a packet that never
    /// travelled.
    pub fn delivery_time(packet: &Packet) -> u64 {
        packet.delivery_time().unwrap_or(0)
    }

    /// Mean delivery time over every packet ever delivered, or `0.0` before
    /// the first delivery.
    pub fn average_delivery_time_so_far(&self) -> f64 {
        if self.delivered.is_empty() {
            return 0.0;
        }
        self.total_time as f64 / self.delivered.len() as f64
    }

    pub fn last_point(&self, label: &str) -> Option<Sample> {
        self.series_for(label)?.samples.last().copied()
    }

    pub fn series_for(&self, label: &str) -> Option<&Series> {
        self.series.iter().find(|s| s.label == label)
    }

    pub fn all_series(&self) -> &[Series] {
        &self.series
    }

    pub fn delivered(&self) -> &[DeliveryRecord] {
        &self.delivered
    }

    pub fn delivered_count(&self) -> usize {
        self.seen.len()
    }

    pub fn is_delivered(&self, packet: PacketId) -> bool {
        self.seen.contains(&packet)
    }
}

impl SimObserver for MetricsCollector {
    fn on_delivered(&mut self, _tick: Tick, packet: &Packet) {
        self.register_delivery(packet);
    }
}
