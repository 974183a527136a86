//! `qr-sim` — tick engine and scenario driver for the qrouting simulator.
//!
//! # Two-phase tick
//!
//! ```text
//! advance(tick T):
//!   ① Decide  — every node with a queued packet pops its head, picks the
//!               neighbor with the lowest Q-value (random among ties), and
//!               stages a send.  Nodes read only their own queue and table
//!               (plus, for OnDeparture, neighbors' tables through a
//!               read-only view).  Sender-side updates are applied once all
//!               nodes have decided.
//!   ② Commit  — in ascending NodeId order, each staged send becomes a hop
//!               (sent T, received T+1) and is handed to the receiver, which
//!               learns (OnArrival), delivers, or queues it.
//!   ③ T ← T+1
//! ```
//!
//! A packet committed in tick T is queued at its next node with entry tick
//! T+1 and is first considered in tick T+1's decide phase: one hop per tick,
//! never two.
//!
//! # Quick-start
//!
//! ```rust,ignore
//! use qr_core::RoutingConfig;
//! use qr_net::{RequestGenerator, Topology};
//! use qr_sim::{NoopObserver, SimBuilder};
//!
//! let topology = Topology::boyan_littman_6x6(RoutingConfig::default())?;
//! let requests = RequestGenerator::corner_to_corner(topology.node_count())?;
//! let mut sim = SimBuilder::new(topology).build()?;
//! sim.run_gradual_load(&requests, 10, 10, "gradual_10pk_gap10", &mut NoopObserver)?;
//! ```

pub mod builder;
pub mod engine;
pub mod error;
pub mod metrics;
pub mod observer;
pub mod sim;


pub use builder::SimBuilder;
pub use engine::{TickEngine, TickReport};
pub use error::{SimError, SimResult};
pub use metrics::{DeliveryRecord, MetricsCollector, Sample, Series};
pub use observer::{NoopObserver, SimObserver};
pub use sim::{ScenarioOutcome, Sim};
