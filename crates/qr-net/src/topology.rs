//! Network topology: the node set, its undirected links, and the per-node
//! commit step that moves packets across them.
//!
//! # Construction
//!
//! ```rust,ignore
//! let mut b = TopologyBuilder::new(RoutingConfig::default());
//! let a = b.add_node();
//! let c = b.add_node();
//! b.connect(a, c)?;
//! let topology = b.build()?;
//! ```
//!
//! Node ids are dense (`0..n`) so a `NodeId` indexes the node `Vec`
//! directly.  The link structure is fixed once `build` returns; only queues
//! and Q-tables change while the simulation runs.

use qr_core::{Bootstrap, NodeId, PacketId, RoutingConfig, Tick};

use crate::learning::{NeighborView, QUpdate};
use crate::node::{Node, Reception};
use crate::{Hop, NetError, NetResult, Packet};

/// Holes of the irregular 6×6 grid from Boyan & Littman (1994).
const BOYAN_LITTMAN_HOLES: [u32; 8] = [8, 9, 14, 15, 20, 21, 26, 27];

/// One packet moved across one link during a commit.
#[derive(Debug)]
pub struct Transfer {
    pub hop:       Hop,
    pub packet:    PacketId,
    pub reception: Reception,
}

// ── Topology ──────────────────────────────────────────────────────────────────

pub struct Topology {
    nodes:  Vec<Node>,
    config: RoutingConfig,
}

impl Topology {
    // ── Constructors ──────────────────────────────────────────────────────

    /// A `rows × cols` grid with orthogonal links.  Node `r * cols + c` sits
    /// at row `r`, column `c`.
    pub fn grid(rows: usize, cols: usize, config: RoutingConfig) -> NetResult<Self> {
        grid_builder(rows, cols, config)?.build()
    }

    /// A grid whose `holes` are cut out: they keep their ids but have no
    /// links, and no other node links to them.
    pub fn grid_with_holes(
        rows:   usize,
        cols:   usize,
        holes:  &[NodeId],
        config: RoutingConfig,
    ) -> NetResult<Self> {
        let mut b = grid_builder(rows, cols, config)?;
        for &hole in holes {
            b.isolate(hole)?;
        }
        b.build()
    }

    /// The irregular 6×6 grid used in the Q-routing literature.
    pub fn boyan_littman_6x6(config: RoutingConfig) -> NetResult<Self> {
        let holes = BOYAN_LITTMAN_HOLES.map(NodeId);
        Self::grid_with_holes(6, 6, &holes, config)
    }

    // ── Access ────────────────────────────────────────────────────────────

    pub fn config(&self) -> &RoutingConfig {
        &self.config
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().map(Node::id)
    }

    pub fn node(&self, id: NodeId) -> NetResult<&Node> {
        self.nodes.get(id.index()).ok_or(NetError::NodeNotFound(id))
    }

    pub fn node_mut(&mut self, id: NodeId) -> NetResult<&mut Node> {
        self.nodes.get_mut(id.index()).ok_or(NetError::NodeNotFound(id))
    }

    /// Disjoint mutable borrows of two different nodes.
    pub fn pair_mut(&mut self, a: NodeId, b: NodeId) -> NetResult<(&mut Node, &mut Node)> {
        let (ai, bi) = (a.index(), b.index());
        if ai == bi {
            return Err(NetError::SelfLoop(a));
        }
        if ai >= self.nodes.len() {
            return Err(NetError::NodeNotFound(a));
        }
        if bi >= self.nodes.len() {
            return Err(NetError::NodeNotFound(b));
        }
        if ai < bi {
            let (lo, hi) = self.nodes.split_at_mut(bi);
            Ok((&mut lo[ai], &mut hi[0]))
        } else {
            let (lo, hi) = self.nodes.split_at_mut(ai);
            Ok((&mut hi[0], &mut lo[bi]))
        }
    }

    /// Read-only view over the Q-tables of `holder`'s neighbors.
    pub fn view(&self, holder: NodeId) -> NetResult<NeighborView<'_>> {
        Ok(NeighborView::new(self.node(holder)?, &self.nodes))
    }

    /// Packets still inside the network: queued or staged for sending.
    pub fn in_flight(&self) -> usize {
        self.nodes
            .iter()
            .map(|n| n.queue_len() + n.planned().len())
            .sum()
    }

    /// The lowest-id node that holds packets but has no link to send them
    /// over.  Such a node would fail its decide step.
    pub fn stranded_node(&self) -> Option<NodeId> {
        self.nodes
            .iter()
            .find(|n| n.queue_len() > 0 && n.neighbors().is_empty())
            .map(Node::id)
    }

    // ── Mutation ──────────────────────────────────────────────────────────

    /// Inject a packet into `node`'s queue at tick `now`.
    pub fn enqueue(&mut self, node: NodeId, packet: Packet, now: Tick) -> NetResult<()> {
        self.node_mut(node)?.enqueue(packet, now)
    }

    /// Write a computed update into its owner's table.
    pub fn apply_update(&mut self, update: &QUpdate) -> NetResult<()> {
        self.node_mut(update.owner)?.q_table_mut().apply(update)
    }

    /// Return every staged send to its node's queue.
    pub fn unplan_all(&mut self) -> usize {
        self.nodes.iter_mut().map(Node::unplan).sum()
    }

    /// Execute every send `id` staged this tick.  Each packet leaves at
    /// `now` and is received by the next node one tick later.
    pub fn commit_node(&mut self, id: NodeId, now: Tick) -> NetResult<Vec<Transfer>> {
        let outgoing = self.node_mut(id)?.dispatch(now)?;
        let mut transfers = Vec::with_capacity(outgoing.len());
        for (packet, hop) in outgoing {
            let packet_id = packet.id();
            let (sender, receiver) = self.pair_mut(hop.from, hop.to)?;
            let reception = receiver.receive(packet, hop, hop.received, Some(sender))?;
            tracing::debug!(
                tick = now.0,
                packet = packet_id.0,
                from = hop.from.0,
                to = hop.to.0,
                "hop committed"
            );
            transfers.push(Transfer { hop, packet: packet_id, reception });
        }
        Ok(transfers)
    }
}

fn grid_builder(rows: usize, cols: usize, config: RoutingConfig) -> NetResult<TopologyBuilder> {
    if rows == 0 || cols == 0 {
        return Err(qr_core::CoreError::Config(format!(
            "grid dimensions must be positive, got {rows}x{cols}"
        ))
        .into());
    }
    let mut b = TopologyBuilder::with_nodes(rows * cols, config);
    for i in 0..rows * cols {
        let (row, col) = (i / cols, i % cols);
        let here = NodeId(i as u32);
        if col + 1 < cols {
            b.connect(here, NodeId((i + 1) as u32))?;
        }
        if row + 1 < rows {
            b.connect(here, NodeId((i + cols) as u32))?;
        }
    }
    Ok(b)
}

// ── TopologyBuilder ───────────────────────────────────────────────────────────

/// Incremental topology construction.
///
/// Links are undirected and deduplicated; neighbor order follows the order
/// in which links were added.
pub struct TopologyBuilder {
    adjacency: Vec<Vec<NodeId>>,
    config:    RoutingConfig,
}

impl TopologyBuilder {
    pub fn new(config: RoutingConfig) -> Self {
        Self { adjacency: Vec::new(), config }
    }

    /// A builder pre-populated with `n` unlinked nodes.
    pub fn with_nodes(n: usize, config: RoutingConfig) -> Self {
        Self { adjacency: vec![Vec::new(); n], config }
    }

    pub fn add_node(&mut self) -> NodeId {
        self.adjacency.push(Vec::new());
        NodeId((self.adjacency.len() - 1) as u32)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    /// Link `a` and `b` in both directions.
    pub fn connect(&mut self, a: NodeId, b: NodeId) -> NetResult<()> {
        if a == b {
            return Err(NetError::SelfLoop(a));
        }
        for id in [a, b] {
            if id.index() >= self.adjacency.len() {
                return Err(NetError::NodeNotFound(id));
            }
        }
        if !self.adjacency[a.index()].contains(&b) {
            self.adjacency[a.index()].push(b);
        }
        if !self.adjacency[b.index()].contains(&a) {
            self.adjacency[b.index()].push(a);
        }
        Ok(())
    }

    /// Remove every link touching `node`.
    pub fn isolate(&mut self, node: NodeId) -> NetResult<()> {
        let links = self
            .adjacency
            .get_mut(node.index())
            .ok_or(NetError::NodeNotFound(node))?;
        links.clear();
        for neighbors in &mut self.adjacency {
            neighbors.retain(|&n| n != node);
        }
        Ok(())
    }

    /// Validate the routing config, create every node, and bootstrap the
    /// Q-tables per the configured policy.
    pub fn build(self) -> NetResult<Topology> {
        self.config.validate()?;
        let all: Vec<NodeId> = (0..self.adjacency.len()).map(|i| NodeId(i as u32)).collect();

        let mut nodes = Vec::with_capacity(self.adjacency.len());
        for (&id, neighbors) in all.iter().zip(self.adjacency) {
            let mut node = Node::new(id, neighbors, &self.config)?;
            if let Bootstrap::Optimistic(value) = self.config.bootstrap {
                node.initialize_q_table(all.iter().copied(), value)?;
            }
            nodes.push(node);
        }

        Ok(Topology { nodes, config: self.config })
    }
}
