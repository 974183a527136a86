//! Routing requests and the hops they accumulate.

use std::fmt;

use qr_core::{NodeId, PacketId, PacketIdGen, Tick};

use crate::{NetError, NetResult};

// ── Hop ───────────────────────────────────────────────────────────────────────

/// One realized traversal of a link.  Never modified after it is recorded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Hop {
    pub from:     NodeId,
    pub to:       NodeId,
    pub sent:     Tick,
    pub received: Tick,
}

impl Hop {
    /// A hop over one link.  Transit always costs exactly one tick.
    #[inline]
    pub fn single_tick(from: NodeId, to: NodeId, sent: Tick) -> Self {
        Self { from, to, sent, received: sent.next() }
    }
}

// ── Packet ────────────────────────────────────────────────────────────────────

/// A routing request travelling from `origin` to `destination`.
///
/// The route only grows, and `reached_destination` flips to `true` once and
/// stays there.  The three timestamps describe the packet's position
/// relative to the node currently holding it and feed the learning rule:
///
/// - `queue_entry`: tick it joined the current node's queue,
/// - `departure`:   tick it left the previous node,
/// - `arrival`:     tick it reached the current node.
///
/// Only the routing core writes these; once delivered, a packet is read-only.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Packet {
    id:                  PacketId,
    origin:              NodeId,
    destination:         NodeId,
    route:               Vec<Hop>,
    reached_destination: bool,

    pub(crate) queue_entry: Tick,
    pub(crate) departure:   Tick,
    pub(crate) arrival:     Tick,

    /// Decide phases this packet has sat through at its current node while
    /// other packets were serviced ahead of it.  Reset on dispatch.
    pub(crate) queue_wait: u64,
}

impl Packet {
    /// Create a packet with an empty route, drawing its id from `ids`.
    pub fn new(ids: &PacketIdGen, origin: NodeId, destination: NodeId) -> NetResult<Self> {
        if origin == destination {
            return Err(NetError::SameOriginDestination(origin));
        }
        Ok(Self {
            id: ids.next_id(),
            origin,
            destination,
            route: Vec::new(),
            reached_destination: false,
            queue_entry: Tick::ZERO,
            departure:   Tick::ZERO,
            arrival:     Tick::ZERO,
            queue_wait:  0,
        })
    }

    #[inline]
    pub fn id(&self) -> PacketId {
        self.id
    }

    #[inline]
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    #[inline]
    pub fn destination(&self) -> NodeId {
        self.destination
    }

    /// The realized path so far, oldest hop first.
    #[inline]
    pub fn route(&self) -> &[Hop] {
        &self.route
    }

    #[inline]
    pub fn reached_destination(&self) -> bool {
        self.reached_destination
    }

    #[inline]
    pub fn queue_entry(&self) -> Tick {
        self.queue_entry
    }

    #[inline]
    pub fn departure(&self) -> Tick {
        self.departure
    }

    #[inline]
    pub fn arrival(&self) -> Tick {
        self.arrival
    }

    #[inline]
    pub fn queue_wait(&self) -> u64 {
        self.queue_wait
    }

    /// Append a traversed hop.
    pub fn record_hop(&mut self, hop: Hop) -> NetResult<()> {
        if self.reached_destination {
            return Err(NetError::AlreadyDelivered(self.id));
        }
        self.route.push(hop);
        Ok(())
    }

    /// Flag the packet as delivered.  Fails if it already was.
    pub fn mark_delivered(&mut self) -> NetResult<()> {
        if self.reached_destination {
            return Err(NetError::AlreadyDelivered(self.id));
        }
        self.reached_destination = true;
        Ok(())
    }

    /// Ticks from the first send to the last receive, or `None` for a packet
    /// that never left its origin.
    pub fn delivery_time(&self) -> Option<u64> {
        let first = self.route.first()?;
        let last = self.route.last()?;
        Some(last.received.since(first.sent))
    }
}

impl fmt::Display for Packet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Packet(id={}, origin={}, destination={}, reached_destination={}, route_length={})",
            self.id,
            self.origin,
            self.destination,
            self.reached_destination,
            self.route.len()
        )
    }
}

// ── RequestGenerator ──────────────────────────────────────────────────────────

/// Produces routing requests for a fixed (origin, destination) pair.
///
/// Holds no id sequence of its own: every packet draws from the
/// [`PacketIdGen`] passed in, so several generators feeding one simulation
/// never issue the same id twice.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RequestGenerator {
    origin:      NodeId,
    destination: NodeId,
}

impl RequestGenerator {
    pub fn new(origin: NodeId, destination: NodeId) -> NetResult<Self> {
        if origin == destination {
            return Err(NetError::SameOriginDestination(origin));
        }
        Ok(Self { origin, destination })
    }

    /// Requests from node 0 to the last of `node_count` nodes.
    pub fn corner_to_corner(node_count: usize) -> NetResult<Self> {
        let last = node_count
            .checked_sub(1)
            .and_then(|n| NodeId::try_from(n).ok())
            .unwrap_or(NodeId(0));
        Self::new(NodeId(0), last)
    }

    #[inline]
    pub fn origin(&self) -> NodeId {
        self.origin
    }

    #[inline]
    pub fn destination(&self) -> NodeId {
        self.destination
    }

    pub fn generate(&self, ids: &PacketIdGen) -> Packet {
        Packet {
            id:                  ids.next_id(),
            origin:              self.origin,
            destination:         self.destination,
            route:               Vec::new(),
            reached_destination: false,
            queue_entry:         Tick::ZERO,
            departure:           Tick::ZERO,
            arrival:             Tick::ZERO,
            queue_wait:          0,
        }
    }

    /// Generate `n` requests at once.
    pub fn generate_many(&self, ids: &PacketIdGen, n: usize) -> Vec<Packet> {
        (0..n).map(|_| self.generate(ids)).collect()
    }
}
