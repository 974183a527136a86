//! The temporal-difference update and the two rules that drive it.
//!
//! Both rules nudge one stored estimate toward an observed cost:
//!
//! ```text
//! new = old + η · ((q + s + t) − old)
//!
//!   q  ticks the packet waited in the sender's queue
//!   s  ticks spent on the link (always 1 in this model)
//!   t  the next node's best estimate of the remaining time
//! ```
//!
//! - `OnArrival` runs inside [`Node::receive`]: the receiver supplies `t`
//!   from its own table and writes the sender's entry.  `q` and `s` come
//!   from the packet's timestamps.
//! - `OnDeparture` runs after the decide phase: the sender reads `t` from
//!   the chosen neighbor's table through a [`NeighborView`] and writes its
//!   own entry.  `q` is the packet's queue-wait counter and `s` is one tick.
//!   Updates are collected for every node first and applied afterwards, so
//!   no node observes another's same-tick write.

use qr_core::NodeId;

use crate::node::{Decision, Node};
use crate::{NetError, NetResult, QTable};

/// One computed Q-value change, reported to observers and then applied to
/// the table of `owner`.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QUpdate {
    pub owner:       NodeId,
    pub destination: NodeId,
    pub via:         NodeId,
    pub q:           u64,
    pub s:           u64,
    pub t:           f64,
    pub old:         f64,
    pub new:         f64,
}

/// `old + η · ((q + s + t) − old)`.
#[inline]
pub fn td_update(old: f64, learning_rate: f64, q: u64, s: u64, t: f64) -> f64 {
    let observed = q as f64 + s as f64 + t;
    old + learning_rate * (observed - old)
}

// ── NeighborView ──────────────────────────────────────────────────────────────

/// Read-only access to the Q-tables of one node's neighbors.
///
/// A real router could not inspect its neighbor's memory; the `OnDeparture`
/// rule needs to, so the capability is an explicit value handed out by the
/// topology for the duration of one decide phase rather than a shared global.
/// It is scoped to the holder's links: asking for any other node's table
/// fails with [`NetError::NotNeighbor`].
#[derive(Copy, Clone)]
pub struct NeighborView<'a> {
    holder:    NodeId,
    neighbors: &'a [NodeId],
    nodes:     &'a [Node],
}

impl<'a> NeighborView<'a> {
    pub(crate) fn new(holder: &'a Node, nodes: &'a [Node]) -> Self {
        Self { holder: holder.id(), neighbors: holder.neighbors(), nodes }
    }

    /// The node this view was issued to.
    #[inline]
    pub fn holder(&self) -> NodeId {
        self.holder
    }

    pub fn table(&self, node: NodeId) -> NetResult<&'a QTable> {
        if !self.neighbors.contains(&node) {
            return Err(NetError::NotNeighbor { holder: self.holder, node });
        }
        self.nodes
            .get(node.index())
            .map(Node::q_table)
            .ok_or(NetError::NodeNotFound(node))
    }

    /// `node`'s best estimate of the time remaining to `destination`.
    pub fn min_estimate(&self, node: NodeId, destination: NodeId) -> NetResult<f64> {
        Ok(self.table(node)?.min_over_neighbors(destination))
    }
}

/// Compute the sender-side update for a decision taken this tick.
///
/// Reads only: the sender's table for `old` and the chosen neighbor's table
/// for `t`.  The caller applies the result once every node has decided.
pub fn departure_update(
    sender:   &Node,
    decision: &Decision,
    view:     &NeighborView<'_>,
) -> NetResult<QUpdate> {
    if view.holder() != sender.id() {
        return Err(NetError::NotNeighbor { holder: view.holder(), node: sender.id() });
    }
    let q = decision.queue_wait;
    let s = 1;
    let t = view.min_estimate(decision.next, decision.destination)?;
    let old = sender.q_table().get(decision.destination, decision.next);
    let new = td_update(old, sender.learning_rate(), q, s, t);
    Ok(QUpdate {
        owner:       sender.id(),
        destination: decision.destination,
        via:         decision.next,
        q,
        s,
        t,
        old,
        new,
    })
}
