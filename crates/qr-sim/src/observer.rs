//! Structured event hooks for the tick engine.

use qr_core::{PacketId, Tick};
use qr_net::{Decision, Hop, Packet, QUpdate};

use crate::TickReport;

/// Callbacks invoked by [`TickEngine::advance`][crate::TickEngine::advance]
/// for every routing event.
///
/// All methods have default no-op implementations so implementors only need
/// to override what they care about.  The same events are also emitted as
/// `tracing` records; an observer is the way to consume them as data.
///
/// # Example — hop counter
///
/// ```rust,ignore
/// struct HopCounter(usize);
///
/// impl SimObserver for HopCounter {
///     fn on_hop(&mut self, _tick: Tick, _hop: &Hop, _packet: PacketId) {
///         self.0 += 1;
///     }
/// }
/// ```
pub trait SimObserver {
    /// Called at the very start of each tick, before the decide phase.
    fn on_tick_start(&mut self, _tick: Tick) {}

    /// A node chose a next hop for a packet.
    fn on_decision(&mut self, _tick: Tick, _decision: &Decision) {}

    /// A Q-value was rewritten (either rule).
    fn on_q_update(&mut self, _tick: Tick, _update: &QUpdate) {}

    /// A staged send was committed.
    fn on_hop(&mut self, _tick: Tick, _hop: &Hop, _packet: PacketId) {}

    /// A packet reached its destination.  `tick` is the arrival tick.
    fn on_delivered(&mut self, _tick: Tick, _packet: &Packet) {}

    /// Called after the commit phase, before the tick counter advances.
    fn on_tick_end(&mut self, _tick: Tick, _report: &TickReport) {}
}

/// A [`SimObserver`] that does nothing.
pub struct NoopObserver;

impl SimObserver for NoopObserver {}

impl<O: SimObserver + ?Sized> SimObserver for &mut O {
    fn on_tick_start(&mut self, tick: Tick) {
        (**self).on_tick_start(tick)
    }
    fn on_decision(&mut self, tick: Tick, decision: &Decision) {
        (**self).on_decision(tick, decision)
    }
    fn on_q_update(&mut self, tick: Tick, update: &QUpdate) {
        (**self).on_q_update(tick, update)
    }
    fn on_hop(&mut self, tick: Tick, hop: &Hop, packet: PacketId) {
        (**self).on_hop(tick, hop, packet)
    }
    fn on_delivered(&mut self, tick: Tick, packet: &Packet) {
        (**self).on_delivered(tick, packet)
    }
    fn on_tick_end(&mut self, tick: Tick, report: &TickReport) {
        (**self).on_tick_end(tick, report)
    }
}

/// Forward every event to two observers, `A` first.
impl<A: SimObserver, B: SimObserver> SimObserver for (A, B) {
    fn on_tick_start(&mut self, tick: Tick) {
        self.0.on_tick_start(tick);
        self.1.on_tick_start(tick);
    }
    fn on_decision(&mut self, tick: Tick, decision: &Decision) {
        self.0.on_decision(tick, decision);
        self.1.on_decision(tick, decision);
    }
    fn on_q_update(&mut self, tick: Tick, update: &QUpdate) {
        self.0.on_q_update(tick, update);
        self.1.on_q_update(tick, update);
    }
    fn on_hop(&mut self, tick: Tick, hop: &Hop, packet: PacketId) {
        self.0.on_hop(tick, hop, packet);
        self.1.on_hop(tick, hop, packet);
    }
    fn on_delivered(&mut self, tick: Tick, packet: &Packet) {
        self.0.on_delivered(tick, packet);
        self.1.on_delivered(tick, packet);
    }
    fn on_tick_end(&mut self, tick: Tick, report: &TickReport) {
        self.0.on_tick_end(tick, report);
        self.1.on_tick_end(tick, report);
    }
}
