//! Routing-core error type.

use thiserror::Error;

use qr_core::{CoreError, NodeId, PacketId};

/// Errors produced by `qr-net`.
///
/// `NoNeighbors` and `SameOriginDestination` are configuration errors: the
/// run must abort.  `SelfLoop`, `SelfNeighborKey`, and `AlreadyDelivered`
/// signal a wiring defect and are never expected in a correct run.
#[derive(Debug, Error)]
pub enum NetError {
    #[error("configuration error: node {0} has no neighbors and cannot route")]
    NoNeighbors(NodeId),

    #[error("configuration error: packet origin and destination are both node {0}")]
    SameOriginDestination(NodeId),

    #[error("invariant violation: node {0} listed as its own neighbor")]
    SelfLoop(NodeId),

    #[error("invariant violation: Q-table of node {owner} keyed with itself as neighbor (destination {destination})")]
    SelfNeighborKey { owner: NodeId, destination: NodeId },

    #[error("invariant violation: packet {0} is already delivered")]
    AlreadyDelivered(PacketId),

    /// A `NeighborView` was asked for a table outside its holder's links.
    #[error("node {node} is not a neighbor of node {holder}")]
    NotNeighbor { holder: NodeId, node: NodeId },

    #[error("node {0} not found in topology")]
    NodeNotFound(NodeId),

    #[error(transparent)]
    Core(#[from] CoreError),
}

pub type NetResult<T> = Result<T, NetError>;
