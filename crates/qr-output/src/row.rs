//! Plain data row types written by output backends.

use qr_net::Packet;
use qr_sim::{DeliveryRecord, Sample};

/// One point of an average-delivery-time series.
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesRow {
    pub label:             String,
    pub tick:              u64,
    pub avg_delivery_time: f64,
}

impl SeriesRow {
    pub fn new(label: &str, sample: &Sample) -> Self {
        Self {
            label:             label.to_owned(),
            tick:              sample.tick.0,
            avg_delivery_time: sample.average_delivery_time,
        }
    }
}

/// One delivered packet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryRow {
    pub packet_id:   u64,
    pub origin:      u32,
    pub destination: u32,
    pub sent:        u64,
    pub received:    u64,
    pub hops:        u64,
}

impl From<&DeliveryRecord> for DeliveryRow {
    fn from(r: &DeliveryRecord) -> Self {
        Self {
            packet_id:   r.packet.0,
            origin:      r.origin.0,
            destination: r.destination.0,
            sent:        r.sent.0,
            received:    r.received.0,
            hops:        r.hops as u64,
        }
    }
}

impl DeliveryRow {
    /// `None` for a packet with an empty route.
    pub fn from_packet(packet: &Packet) -> Option<Self> {
        DeliveryRecord::from_packet(packet).as_ref().map(Self::from)
    }
}
