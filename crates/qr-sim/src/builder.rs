//! Fluent builder for constructing a [`Sim`].

use std::collections::HashSet;

use qr_core::{PacketIdGen, ScenarioConfig, Tick};
use qr_net::Topology;

use crate::{MetricsCollector, Sim, SimError, SimResult, TickEngine};

/// Fluent builder for [`Sim`].
///
/// # Optional inputs (have defaults)
///
/// | Method             | Default                     |
/// |--------------------|-----------------------------|
/// | `.scenario(c)`     | `ScenarioConfig::default()` |
/// | `.start_tick(t)`   | `Tick::ZERO`                |
/// | `.packet_ids(g)`   | `PacketIdGen::new()`        |
///
/// # Example
///
/// ```rust,ignore
/// let topology = Topology::grid(3, 3, RoutingConfig::default())?;
/// let mut sim = SimBuilder::new(topology)
///     .scenario(ScenarioConfig { sample_every: 10, ..Default::default() })
///     .build()?;
/// ```
pub struct SimBuilder {
    topology: Topology,
    scenario: ScenarioConfig,
    start:    Tick,
    ids:      PacketIdGen,
}

impl SimBuilder {
    pub fn new(topology: Topology) -> Self {
        Self {
            topology,
            scenario: ScenarioConfig::default(),
            start:    Tick::ZERO,
            ids:      PacketIdGen::new(),
        }
    }

    pub fn scenario(mut self, scenario: ScenarioConfig) -> Self {
        self.scenario = scenario;
        self
    }

    /// Start the tick counter somewhere other than zero.
    pub fn start_tick(mut self, tick: Tick) -> Self {
        self.start = tick;
        self
    }

    /// Supply the packet id sequence, e.g. to continue numbering from an
    /// earlier run.
    pub fn packet_ids(mut self, ids: PacketIdGen) -> Self {
        self.ids = ids;
        self
    }

    pub fn build(self) -> SimResult<Sim> {
        if self.scenario.sample_every == 0 {
            return Err(SimError::Config("sample_every must be at least 1".into()));
        }
        if self.scenario.max_idle_ticks == 0 {
            return Err(SimError::Config("max_idle_ticks must be at least 1".into()));
        }

        Ok(Sim {
            engine:   TickEngine::starting_at(self.topology, self.start),
            metrics:  MetricsCollector::new(self.scenario.sample_every),
            config:   self.scenario,
            ids:      self.ids,
            injected: HashSet::new(),
        })
    }
}
