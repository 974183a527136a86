//! The scenario driver: engine + metrics + liveness checks.

use std::collections::HashSet;

use qr_core::{NodeId, PacketId, PacketIdGen, ScenarioConfig, Tick};
use qr_net::{Packet, RequestGenerator, Topology};

use crate::{MetricsCollector, Sample, SimError, SimObserver, SimResult, TickEngine, TickReport};

/// Summary of one completed scenario run.
#[derive(Clone, Debug, PartialEq)]
pub struct ScenarioOutcome {
    pub label:      String,
    pub injected:   usize,
    /// Tick the scenario started on.
    pub started:    Tick,
    /// Tick after the last delivery.
    pub finished:   Tick,
    /// Last sample of the scenario's series, if any was taken.
    pub last_point: Option<Sample>,
}

impl ScenarioOutcome {
    pub fn ticks(&self) -> u64 {
        self.finished.since(self.started)
    }
}

/// A [`TickEngine`] wired to a [`MetricsCollector`].
///
/// Build one with [`SimBuilder`][crate::SimBuilder].  Scenarios run back to
/// back on the same network, so later scenarios start from whatever the
/// Q-tables learned in earlier ones.
///
/// The sim owns the one packet id sequence of the run; every request source
/// draws from it, and an id is accepted by [`inject`][Self::inject] at most
/// once.
pub struct Sim {
    pub(crate) engine:   TickEngine,
    pub(crate) metrics:  MetricsCollector,
    pub(crate) config:   ScenarioConfig,
    pub(crate) ids:      PacketIdGen,
    pub(crate) injected: HashSet<PacketId>,
}

impl Sim {
    pub fn tick(&self) -> Tick {
        self.engine.tick()
    }

    pub fn topology(&self) -> &Topology {
        self.engine.topology()
    }

    pub fn engine(&self) -> &TickEngine {
        &self.engine
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    pub fn metrics_mut(&mut self) -> &mut MetricsCollector {
        &mut self.metrics
    }

    pub fn scenario_config(&self) -> &ScenarioConfig {
        &self.config
    }

    /// The id sequence every packet of this run must come from.
    pub fn packet_ids(&self) -> &PacketIdGen {
        &self.ids
    }

    /// A fresh packet with the next id of this run.
    pub fn new_packet(&self, origin: NodeId, destination: NodeId) -> SimResult<Packet> {
        Ok(Packet::new(&self.ids, origin, destination)?)
    }

    /// Packets injected since the sim was built.
    pub fn injected_count(&self) -> usize {
        self.injected.len()
    }

    /// Inject `packet` at its origin with the current tick as queue entry.
    ///
    /// Fails with [`SimError::DuplicatePacket`] if a packet with the same id
    /// was injected before.
    pub fn inject(&mut self, packet: Packet) -> SimResult<PacketId> {
        let id = packet.id();
        if self.injected.contains(&id) {
            return Err(SimError::DuplicatePacket(id));
        }
        tracing::debug!(
            tick = self.engine.tick().0,
            packet = id.0,
            origin = packet.origin().0,
            destination = packet.destination().0,
            "packet injected"
        );
        self.engine.inject(packet)?;
        self.injected.insert(id);
        Ok(id)
    }

    /// Advance one tick, register deliveries, then sample the active series
    /// at the new tick.
    pub fn step<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<TickReport> {
        let mut fanout = (&mut self.metrics, &mut *observer);
        let report = self.engine.advance(&mut fanout)?;
        self.metrics.sample(self.engine.tick());
        Ok(report)
    }

    /// Step until every packet in `ids` has been delivered.
    ///
    /// Fails with [`SimError::Stalled`] after `max_idle_ticks` consecutive
    /// ticks without a delivery.
    pub fn run_until_delivered<O: SimObserver>(
        &mut self,
        label:    &str,
        ids:      &[PacketId],
        observer: &mut O,
    ) -> SimResult<()> {
        let mut pending: HashSet<PacketId> = ids
            .iter()
            .copied()
            .filter(|&id| !self.metrics.is_delivered(id))
            .collect();
        let mut idle = 0;
        while !pending.is_empty() {
            let report = self.step(observer)?;
            self.settle(label, &report, &mut pending, &mut idle)?;
        }
        Ok(())
    }

    /// Route a single packet to completion under the series `label`.
    pub fn run_single<O: SimObserver>(
        &mut self,
        label:    &str,
        packet:   Packet,
        observer: &mut O,
    ) -> SimResult<ScenarioOutcome> {
        self.metrics.start_series(label);
        let started = self.engine.tick();
        tracing::info!(label, tick = started.0, "scenario started");

        let id = self.inject(packet)?;
        self.run_until_delivered(label, &[id], observer)?;
        Ok(self.finish(label, 1, started))
    }

    /// Inject `total` packets from `requests` (ids drawn from this sim), one whenever the gap counter
    /// is at zero (after which it restarts at `gap`), stepping one tick per
    /// iteration until every injected packet is delivered.
    pub fn run_gradual_load<O: SimObserver>(
        &mut self,
        requests: &RequestGenerator,
        total:    usize,
        gap:      u64,
        label:    &str,
        observer: &mut O,
    ) -> SimResult<ScenarioOutcome> {
        self.metrics.start_series(label);
        let started = self.engine.tick();
        tracing::info!(label, total, gap, tick = started.0, "scenario started");

        let mut pending = HashSet::new();
        let mut injected = 0;
        let mut countdown = 0;
        let mut idle = 0;
        while injected < total || !pending.is_empty() {
            if injected < total {
                if countdown == 0 {
                    let packet = requests.generate(&self.ids);
                    pending.insert(self.inject(packet)?);
                    injected += 1;
                    countdown = gap;
                } else {
                    countdown -= 1;
                }
            }
            let report = self.step(observer)?;
            self.settle(label, &report, &mut pending, &mut idle)?;
        }
        Ok(self.finish(label, injected, started))
    }

    // ── Helpers ───────────────────────────────────────────────────────────

    fn settle(
        &self,
        label:   &str,
        report:  &TickReport,
        pending: &mut HashSet<PacketId>,
        idle:    &mut u64,
    ) -> SimResult<()> {
        let before = pending.len();
        for packet in &report.delivered {
            pending.remove(&packet.id());
        }
        if pending.len() < before || pending.is_empty() {
            *idle = 0;
            return Ok(());
        }
        *idle += 1;
        if *idle >= self.config.max_idle_ticks {
            tracing::warn!(label, idle_ticks = *idle, outstanding = pending.len(), "scenario stalled");
            return Err(SimError::Stalled {
                label:       label.to_owned(),
                idle_ticks:  *idle,
                outstanding: pending.len(),
            });
        }
        Ok(())
    }

    fn finish(&self, label: &str, injected: usize, started: Tick) -> ScenarioOutcome {
        let outcome = ScenarioOutcome {
            label: label.to_owned(),
            injected,
            started,
            finished: self.engine.tick(),
            last_point: self.metrics.last_point(label),
        };
        tracing::info!(
            label,
            injected,
            ticks = outcome.ticks(),
            average = self.metrics.average_delivery_time_so_far(),
            "scenario finished"
        );
        outcome
    }
}
