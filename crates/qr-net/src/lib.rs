//! `qr-net` — the decentralized routing core.
//!
//! # Crate layout
//!
//! | Module        | Contents                                                     |
//! |---------------|--------------------------------------------------------------|
//! | [`packet`]    | `Hop`, `Packet`, `RequestGenerator`                          |
//! | [`qtable`]    | `QTable`, `QKey`, `KeyShape`                                 |
//! | [`learning`]  | `QUpdate`, `NeighborView`, the two temporal-difference rules |
//! | [`node`]      | `Node` — queue, Q-table, planned sends; `plan`/`receive`     |
//! | [`topology`]  | `Topology`, `TopologyBuilder`, grid constructors             |
//! | [`error`]     | `NetError`, `NetResult<T>`                                   |
//!
//! # Decentralized state
//!
//! Every node owns its queue and its Q-table outright.  No node holds a
//! pointer to another: neighbors are `NodeId`s resolved through the
//! `Topology`.  The one place a node's table is read by someone else is the
//! [`NeighborView`] handed out for the `OnDeparture` rule, which is
//! read-only and scoped to a single decide phase.
//!
//! # Feature flags
//!
//! | Flag      | Effect                                                     |
//! |-----------|------------------------------------------------------------|
//! | `fx-hash` | FxHash instead of SipHash for Q-table maps.                |
//! | `serde`   | Derives `Serialize`/`Deserialize` on record types.         |

pub mod error;
pub mod learning;
pub mod node;
pub mod packet;
pub mod qtable;
pub mod topology;

#[cfg(test)]
mod tests;

pub use error::{NetError, NetResult};
pub use learning::{NeighborView, QUpdate, departure_update, td_update};
pub use node::{Arrival, Decision, Node, PlannedSend, Reception};
pub use packet::{Hop, Packet, RequestGenerator};
pub use qtable::{KeyShape, QKey, QTable};
pub use topology::{Topology, TopologyBuilder, Transfer};
