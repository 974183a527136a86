//! The tick engine: one decide phase and one commit phase per tick.

use qr_core::{NodeId, Tick, UpdateRule};
use qr_net::{Arrival, NetError, Packet, QUpdate, Topology, departure_update};

use crate::{SimObserver, SimResult};

/// What happened during one call to [`TickEngine::advance`].
#[derive(Debug, Default)]
pub struct TickReport {
    pub tick:      Tick,
    /// Packets that received a next-hop decision.
    pub decisions: usize,
    /// Hops committed.
    pub hops:      usize,
    /// Q-values rewritten.
    pub updates:   usize,
    /// Packets that reached their destination, in commit order.
    pub delivered: Vec<Packet>,
}

/// Steps a [`Topology`] through discrete ticks.
///
/// Holds nothing but the topology and the tick counter.  It has no notion
/// of "done": the driver decides when to stop calling [`advance`][Self::advance],
/// and any packets still queued simply resume on the next call.
pub struct TickEngine {
    topology: Topology,
    tick:     Tick,
}

impl TickEngine {
    pub fn new(topology: Topology) -> Self {
        Self::starting_at(topology, Tick::ZERO)
    }

    pub fn starting_at(topology: Topology, tick: Tick) -> Self {
        Self { topology, tick }
    }

    /// The tick the next call to `advance` will run.
    #[inline]
    pub fn tick(&self) -> Tick {
        self.tick
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn topology_mut(&mut self) -> &mut Topology {
        &mut self.topology
    }

    pub fn into_topology(self) -> Topology {
        self.topology
    }

    /// Inject `packet` at its origin, stamped with the current tick.
    pub fn inject(&mut self, packet: Packet) -> SimResult<()> {
        let origin = packet.origin();
        self.topology.enqueue(origin, packet, self.tick)?;
        Ok(())
    }

    /// Run exactly one tick.
    pub fn advance<O: SimObserver>(&mut self, observer: &mut O) -> SimResult<TickReport> {
        let now = self.tick;
        let mut report = TickReport { tick: now, ..TickReport::default() };
        observer.on_tick_start(now);

        self.decide_all(now, observer, &mut report)?;
        self.commit_all(now, observer, &mut report)?;

        observer.on_tick_end(now, &report);
        self.tick = now.next();
        Ok(report)
    }

    /// Run `n` ticks back to back, returning the total number of deliveries.
    pub fn run_ticks<O: SimObserver>(&mut self, n: u64, observer: &mut O) -> SimResult<usize> {
        let mut delivered = 0;
        for _ in 0..n {
            delivered += self.advance(observer)?.delivered.len();
        }
        Ok(delivered)
    }

    // ── Phases ────────────────────────────────────────────────────────────

    /// Staged sends exist only between this phase and `commit_all`: if any
    /// node fails to decide, every send staged so far is rolled back before
    /// the error is returned.
    fn decide_all<O: SimObserver>(
        &mut self,
        now:      Tick,
        observer: &mut O,
        report:   &mut TickReport,
    ) -> SimResult<()> {
        if let Some(id) = self.topology.stranded_node() {
            return Err(NetError::NoNeighbors(id).into());
        }

        let pending = match self.plan_all(now, observer, report) {
            Ok(pending) => pending,
            Err(e) => {
                let dropped = self.topology.unplan_all();
                tracing::warn!(tick = now.0, dropped, error = %e, "decide phase abandoned");
                return Err(e);
            }
        };

        // Barrier: tables change only after every node has decided.
        for update in &pending {
            self.topology.apply_update(update)?;
            tracing::debug!(
                tick = now.0,
                node = update.owner.0,
                via = update.via.0,
                destination = update.destination.0,
                old = update.old,
                new = update.new,
                "Q-value updated"
            );
            observer.on_q_update(now, update);
        }
        report.updates += pending.len();
        Ok(())
    }

    /// Run `plan` on every node in id order, collecting sender-side updates
    /// for the `OnDeparture` rule.
    fn plan_all<O: SimObserver>(
        &mut self,
        now:      Tick,
        observer: &mut O,
        report:   &mut TickReport,
    ) -> SimResult<Vec<QUpdate>> {
        let sender_side = self.topology.config().update_rule == UpdateRule::OnDeparture;
        let mut pending = Vec::new();

        for i in 0..self.topology.node_count() {
            let id = NodeId(i as u32);
            let Some(decision) = self.topology.node_mut(id)?.plan(now)? else {
                continue;
            };
            if sender_side {
                let update = departure_update(
                    self.topology.node(id)?,
                    &decision,
                    &self.topology.view(id)?,
                )?;
                pending.push(update);
            }
            observer.on_decision(now, &decision);
            report.decisions += 1;
        }
        Ok(pending)
    }

    fn commit_all<O: SimObserver>(
        &mut self,
        now:      Tick,
        observer: &mut O,
        report:   &mut TickReport,
    ) -> SimResult<()> {
        for i in 0..self.topology.node_count() {
            let transfers = self.topology.commit_node(NodeId(i as u32), now)?;
            for transfer in transfers {
                observer.on_hop(now, &transfer.hop, transfer.packet);
                report.hops += 1;
                if let Some(update) = &transfer.reception.update {
                    observer.on_q_update(now, update);
                    report.updates += 1;
                }
                if let Arrival::Delivered(packet) = transfer.reception.arrival {
                    observer.on_delivered(transfer.hop.received, &packet);
                    report.delivered.push(packet);
                }
            }
        }
        Ok(())
    }
}
