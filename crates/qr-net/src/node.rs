//! `Node` — the unit of decentralized decision-making.
//!
//! A node sees only its own queue, its own Q-table, and the ids of its
//! neighbors.  Each tick it goes through up to two steps driven by the
//! engine:
//!
//! 1. [`plan`][Node::plan] — pop the head of the queue, score every
//!    neighbor, and stage a send.  Nothing leaves the node yet.
//! 2. [`dispatch`][Node::dispatch] — after *every* node has planned, turn
//!    staged sends into hops.  The topology hands each one to the receiving
//!    node's [`receive`][Node::receive].

use std::collections::VecDeque;
use std::fmt;

use qr_core::{NodeId, NodeRng, PacketId, RoutingConfig, Tick, UpdateRule};

use crate::learning::{QUpdate, td_update};
use crate::{Hop, NetError, NetResult, Packet, QTable};

// ── Phase records ─────────────────────────────────────────────────────────────

/// A packet staged for sending to `next` at the end of the current tick.
#[derive(Debug)]
pub struct PlannedSend {
    pub packet: Packet,
    pub next:   NodeId,
}

/// What a node decided for one packet during the decide phase.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Decision {
    pub node:        NodeId,
    pub packet:      PacketId,
    pub destination: NodeId,
    pub next:        NodeId,
    /// The winning Q-value.
    pub score:       f64,
    /// How many neighbors scored within tolerance of `score`.
    pub tied:        usize,
    /// The packet's queue-wait counter at the moment it was serviced.
    pub queue_wait:  u64,
}

/// Where an arriving packet ended up.
#[derive(Debug)]
pub enum Arrival {
    /// Terminal: the packet reached its destination and is handed back.
    Delivered(Packet),
    /// The packet joined the receiver's queue.
    Queued,
}

/// Result of [`Node::receive`].
#[derive(Debug)]
pub struct Reception {
    pub arrival: Arrival,
    /// The sender-table update performed under the `OnArrival` rule.
    pub update:  Option<QUpdate>,
}

// ── Node ──────────────────────────────────────────────────────────────────────

pub struct Node {
    id:            NodeId,
    neighbors:     Vec<NodeId>,
    queue:         VecDeque<Packet>,
    q_table:       QTable,
    learning_rate: f64,
    update_rule:   UpdateRule,
    tie_tolerance: f64,
    planned:       Vec<PlannedSend>,
    rng:           NodeRng,
}

impl Node {
    /// Create a node with an empty queue and an empty Q-table.
    ///
    /// Call [`initialize_q_table`][Self::initialize_q_table] afterwards for
    /// an optimistic bootstrap; [`TopologyBuilder`][crate::TopologyBuilder]
    /// does this automatically.
    pub fn new(id: NodeId, neighbors: Vec<NodeId>, config: &RoutingConfig) -> NetResult<Self> {
        if neighbors.contains(&id) {
            return Err(NetError::SelfLoop(id));
        }
        Ok(Self {
            id,
            neighbors,
            queue:         VecDeque::new(),
            q_table:       QTable::new(
                id,
                config.update_rule.into(),
                config.bootstrap.default_value(),
            ),
            learning_rate: config.learning_rate,
            update_rule:   config.update_rule,
            tie_tolerance: config.tie_tolerance,
            planned:       Vec::new(),
            rng:           NodeRng::new(config.seed, id),
        })
    }

    /// Seed an estimate of `value` for every (destination, neighbor) pair,
    /// skipping this node as a destination.
    pub fn initialize_q_table<I>(&mut self, all_nodes: I, value: f64) -> NetResult<()>
    where
        I: IntoIterator<Item = NodeId>,
    {
        for destination in all_nodes {
            if destination == self.id {
                continue;
            }
            for &neighbor in &self.neighbors {
                self.q_table.set(destination, neighbor, value)?;
            }
        }
        Ok(())
    }

    // ── Accessors ─────────────────────────────────────────────────────────

    #[inline]
    pub fn id(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn neighbors(&self) -> &[NodeId] {
        &self.neighbors
    }

    #[inline]
    pub fn q_table(&self) -> &QTable {
        &self.q_table
    }

    #[inline]
    pub fn q_table_mut(&mut self) -> &mut QTable {
        &mut self.q_table
    }

    #[inline]
    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// Packets awaiting a routing decision, head first.
    pub fn queue(&self) -> impl Iterator<Item = &Packet> + '_ {
        self.queue.iter()
    }

    #[inline]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Sends staged this tick.  Empty outside the decide→commit window.
    #[inline]
    pub fn planned(&self) -> &[PlannedSend] {
        &self.planned
    }

    // ── Injection ─────────────────────────────────────────────────────────

    /// Put a packet at the back of the queue, stamping its queue entry.
    pub fn enqueue(&mut self, mut packet: Packet, now: Tick) -> NetResult<()> {
        if packet.reached_destination() {
            return Err(NetError::AlreadyDelivered(packet.id()));
        }
        packet.queue_entry = now;
        self.queue.push_back(packet);
        Ok(())
    }

    // ── Decide phase ──────────────────────────────────────────────────────

    /// Service the head of the queue: choose its next hop and stage the send.
    ///
    /// Returns `Ok(None)` when the queue is empty or the head was a stray
    /// delivered packet (discarded).  A node without neighbors that holds a
    /// packet fails with [`NetError::NoNeighbors`] and keeps the packet.
    pub fn plan(&mut self, now: Tick) -> NetResult<Option<Decision>> {
        if self.queue.is_empty() {
            return Ok(None);
        }
        if self.neighbors.is_empty() {
            return Err(NetError::NoNeighbors(self.id));
        }
        let Some(packet) = self.queue.pop_front() else {
            return Ok(None);
        };
        if packet.reached_destination() {
            tracing::warn!(tick = now.0, node = self.id.0, packet = packet.id().0,
                "discarding delivered packet found in queue");
            return Ok(None);
        }

        let packet_id = packet.id();
        let destination = packet.destination();
        let (next, score, tied) = self.select_next(destination)?;
        let queue_wait = packet.queue_wait;

        for waiting in self.queue.iter_mut() {
            waiting.queue_wait += 1;
        }

        tracing::debug!(
            tick = now.0,
            node = self.id.0,
            packet = packet_id.0,
            destination = destination.0,
            next = next.0,
            score,
            tied,
            "next hop chosen"
        );

        self.planned.push(PlannedSend { packet, next });
        Ok(Some(Decision {
            node: self.id,
            packet: packet_id,
            destination,
            next,
            score,
            tied,
            queue_wait,
        }))
    }

    /// Pick the neighbor with the lowest estimate for `destination`; ties
    /// within tolerance are broken uniformly at random.
    fn select_next(&mut self, destination: NodeId) -> NetResult<(NodeId, f64, usize)> {
        let scores: Vec<(NodeId, f64)> = self
            .neighbors
            .iter()
            .map(|&n| (n, self.q_table.get(destination, n)))
            .collect();

        let best = scores
            .iter()
            .map(|&(_, s)| s)
            .reduce(f64::min)
            .ok_or(NetError::NoNeighbors(self.id))?;

        let candidates: Vec<NodeId> = scores
            .iter()
            .filter(|&&(_, s)| s - best <= self.tie_tolerance)
            .map(|&(n, _)| n)
            .collect();

        let next = match candidates.as_slice() {
            [only] => *only,
            _ => *self
                .rng
                .choose(&candidates)
                .ok_or(NetError::NoNeighbors(self.id))?,
        };
        Ok((next, best, candidates.len()))
    }

    // ── Commit phase ──────────────────────────────────────────────────────

    /// Turn every staged send into a hop leaving at `now`.
    ///
    /// The staging list is emptied before any packet is touched, so a
    /// failure part-way through can never cause a double send next tick.
    pub fn dispatch(&mut self, now: Tick) -> NetResult<Vec<(Packet, Hop)>> {
        let planned = std::mem::take(&mut self.planned);
        let mut outgoing = Vec::with_capacity(planned.len());
        for PlannedSend { mut packet, next } in planned {
            let hop = Hop::single_tick(self.id, next, now);
            packet.record_hop(hop)?;
            packet.departure = now;
            packet.queue_wait = 0;
            outgoing.push((packet, hop));
        }
        Ok(outgoing)
    }

    /// Abandon this tick's decisions: staged packets go back to the head of
    /// the queue in their original order and the wait counters `plan` bumped
    /// are rolled back.  Returns how many sends were dropped.
    pub fn unplan(&mut self) -> usize {
        let planned = std::mem::take(&mut self.planned);
        let n = planned.len();
        for waiting in self.queue.iter_mut() {
            waiting.queue_wait = waiting.queue_wait.saturating_sub(n as u64);
        }
        for PlannedSend { packet, .. } in planned.into_iter().rev() {
            self.queue.push_front(packet);
        }
        n
    }

    // ── Arrival ───────────────────────────────────────────────────────────

    /// Accept a packet that just crossed `hop` and arrives at `now`.
    ///
    /// Under the `OnArrival` rule, and when `sender` is given and the packet
    /// has travelled at least one hop, the sender's estimate for
    /// (destination, this node) is moved toward
    /// `wait at sender + transit + this node's best estimate`.
    pub fn receive(
        &mut self,
        mut packet: Packet,
        hop:        Hop,
        now:        Tick,
        sender:     Option<&mut Node>,
    ) -> NetResult<Reception> {
        if packet.reached_destination() {
            return Err(NetError::AlreadyDelivered(packet.id()));
        }
        packet.arrival = now;

        let mut update = None;
        if let Some(sender) = sender {
            if self.update_rule == UpdateRule::OnArrival && !packet.route().is_empty() {
                update = Some(self.learn_into(sender, &packet, now)?);
            }
        }

        if packet.destination() == self.id {
            if packet.route().last() != Some(&hop) {
                packet.record_hop(hop)?;
            }
            packet.mark_delivered()?;
            tracing::info!(
                tick = now.0,
                packet = packet.id().0,
                node = self.id.0,
                hops = packet.route().len(),
                "packet delivered"
            );
            return Ok(Reception { arrival: Arrival::Delivered(packet), update });
        }

        packet.queue_entry = now;
        self.queue.push_back(packet);
        Ok(Reception { arrival: Arrival::Queued, update })
    }

    fn learn_into(&self, sender: &mut Node, packet: &Packet, now: Tick) -> NetResult<QUpdate> {
        debug_assert_ne!(sender.id, self.id);
        let destination = packet.destination();
        let q = packet.departure.since(packet.queue_entry);
        let s = now.since(packet.departure);
        let t = self.q_table.min_over_neighbors(destination);
        let old = sender.q_table.get(destination, self.id);
        let new = td_update(old, sender.learning_rate, q, s, t);
        let update = QUpdate { owner: sender.id, destination, via: self.id, q, s, t, old, new };
        sender.q_table.apply(&update)?;

        tracing::debug!(
            tick = now.0,
            from = sender.id.0,
            to = self.id.0,
            destination = destination.0,
            q, s, t, old, new,
            "Q-value updated"
        );
        Ok(update)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("id", &self.id)
            .field("neighbors", &self.neighbors)
            .field("queue_size", &self.queue.len())
            .field("pending_requests", &self.planned.len())
            .finish()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let neighbors: Vec<u32> = self.neighbors.iter().map(|n| n.0).collect();
        write!(
            f,
            "Node(id={}, neighbors={:?}, queue_size={}, pending_requests={})",
            self.id,
            neighbors,
            self.queue.len(),
            self.planned.len()
        )
    }
}
