//! `qr-core` — foundational types for the `qrouting` simulator.
//!
//! This crate is a dependency of every other `qr-*` crate.  It has no `qr-*`
//! dependencies and minimal external ones (only `rand` and `thiserror`, plus
//! optional `serde`).
//!
//! # What lives here
//!
//! | Module     | Contents                                                 |
//! |------------|----------------------------------------------------------|
//! | [`ids`]    | `NodeId`, `PacketId`, `PacketIdGen`                      |
//! | [`time`]   | `Tick`                                                   |
//! | [`rng`]    | `NodeRng` (per-node tie-breaking)                        |
//! | [`config`] | `RoutingConfig`, `Bootstrap`, `UpdateRule`, `ScenarioConfig` |
//! | [`error`]  | `CoreError`, `CoreResult`                                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                     |
//! |---------|------------------------------------------------------------|
//! | `serde` | Adds `Serialize`/`Deserialize` to all public types.        |

pub mod config;
pub mod error;
pub mod ids;
pub mod rng;
pub mod time;


// ── Re-exports ────────────────────────────────────────────────────────────────

pub use config::{Bootstrap, RoutingConfig, ScenarioConfig, UpdateRule};
pub use error::{CoreError, CoreResult};
pub use ids::{NodeId, PacketId, PacketIdGen};
pub use rng::NodeRng;
pub use time::Tick;
