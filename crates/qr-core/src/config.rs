//! Run configuration.
//!
//! Typically built in code by the driver, or deserialized from a file with
//! the `serde` feature, and handed to the topology and engine builders.

use crate::{CoreError, CoreResult};

// ── Bootstrap ─────────────────────────────────────────────────────────────────

/// The Q-value assumed before any observation exists for a
/// (destination, neighbor) pair.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Bootstrap {
    /// Tables start empty; every miss reads as `0.0`.
    Zero,
    /// Every (destination, neighbor) pair is seeded with the given value at
    /// construction; misses read as the same value.
    Optimistic(f64),
}

impl Bootstrap {
    /// The value returned on a table miss.
    #[inline]
    pub fn default_value(self) -> f64 {
        match self {
            Bootstrap::Zero => 0.0,
            Bootstrap::Optimistic(v) => v,
        }
    }
}

impl Default for Bootstrap {
    fn default() -> Self {
        Bootstrap::Optimistic(1.0)
    }
}

// ── UpdateRule ────────────────────────────────────────────────────────────────

/// Which Q-learning update runs, and therefore which key shape the tables use.
///
/// The two rules are not interchangeable within one run.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UpdateRule {
    /// The receiving node updates the *sender's* entry for
    /// (destination, receiver) when the packet arrives, using
    /// `q + s + t` with `t` = the receiver's own minimum estimate.
    /// Tables use the local key shape `(destination, neighbor)`.
    #[default]
    OnArrival,
    /// The sending node updates its own entry when it dispatches the packet,
    /// using its queue-wait counter, a one-tick transit, and the chosen
    /// neighbor's minimum estimate read through a `NeighborView`.  Tables use
    /// the triplet key shape `(from, destination, neighbor)`.
    OnDeparture,
}

// ── RoutingConfig ─────────────────────────────────────────────────────────────

/// Parameters of the routing core shared by every node in a run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoutingConfig {
    /// η, the learning rate.  Must lie in (0, 1].
    pub learning_rate: f64,

    /// Table bootstrap policy.
    pub bootstrap: Bootstrap,

    /// Canonical Q-update rule for the run.
    pub update_rule: UpdateRule,

    /// Scores within this distance of the minimum count as ties.
    pub tie_tolerance: f64,

    /// Master seed for tie-break randomness.
    pub seed: u64,
}

impl RoutingConfig {
    /// Check value ranges.  Called by the topology builder before any node
    /// is constructed.
    pub fn validate(&self) -> CoreResult<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate <= 1.0) {
            return Err(CoreError::Config(format!(
                "learning rate must lie in (0, 1], got {}",
                self.learning_rate
            )));
        }
        if !self.tie_tolerance.is_finite() || self.tie_tolerance < 0.0 {
            return Err(CoreError::Config(format!(
                "tie tolerance must be finite and non-negative, got {}",
                self.tie_tolerance
            )));
        }
        let bootstrap = self.bootstrap.default_value();
        if !bootstrap.is_finite() || bootstrap < 0.0 {
            return Err(CoreError::Config(format!(
                "bootstrap value must be finite and non-negative, got {bootstrap}"
            )));
        }
        Ok(())
    }
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.5,
            bootstrap:     Bootstrap::default(),
            update_rule:   UpdateRule::default(),
            tie_tolerance: 1e-6,
            seed:          42,
        }
    }
}

// ── ScenarioConfig ────────────────────────────────────────────────────────────

/// Driver-side settings: sampling periodicity and liveness threshold.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioConfig {
    /// Record a metrics sample on every tick that is a multiple of this.
    pub sample_every: u64,

    /// Abort a scenario after this many consecutive ticks without a delivery
    /// while packets are still outstanding.
    pub max_idle_ticks: u64,
}

impl Default for ScenarioConfig {
    fn default() -> Self {
        Self {
            sample_every:   100,
            max_idle_ticks: 10_000,
        }
    }
}
