//! Unit tests for the routing core.

use qr_core::{Bootstrap, NodeId, PacketIdGen, RoutingConfig, Tick, UpdateRule};

use crate::{Hop, Node, Packet};

// ── Helpers ───────────────────────────────────────────────────────────────────

fn zero_config() -> RoutingConfig {
    RoutingConfig { bootstrap: Bootstrap::Zero, ..RoutingConfig::default() }
}

fn packet(ids: &PacketIdGen, origin: u32, destination: u32) -> Packet {
    Packet::new(ids, NodeId(origin), NodeId(destination)).unwrap()
}

// ── QTable ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod qtable_tests {
    use super::*;
    use crate::{KeyShape, NetError, QKey, QTable};

    #[test]
    fn miss_returns_default() {
        let t = QTable::new(NodeId(0), KeyShape::Local, 1.0);
        assert_eq!(t.get(NodeId(5), NodeId(1)), 1.0);
        let z = QTable::new(NodeId(0), KeyShape::Local, 0.0);
        assert_eq!(z.get(NodeId(5), NodeId(1)), 0.0);
    }

    #[test]
    fn set_then_get() {
        let mut t = QTable::new(NodeId(0), KeyShape::Local, 0.0);
        t.set(NodeId(5), NodeId(1), 3.25).unwrap();
        assert_eq!(t.get(NodeId(5), NodeId(1)), 3.25);
        assert_eq!(t.get(NodeId(5), NodeId(2)), 0.0);
        assert_eq!(t.len(), 1);
    }

    #[test]
    fn min_over_neighbors_scoped_to_destination() {
        let mut t = QTable::new(NodeId(0), KeyShape::Local, 0.0);
        t.set(NodeId(5), NodeId(1), 4.0).unwrap();
        t.set(NodeId(5), NodeId(2), 2.5).unwrap();
        t.set(NodeId(6), NodeId(1), 0.5).unwrap();
        assert_eq!(t.min_over_neighbors(NodeId(5)), 2.5);
        assert_eq!(t.min_over_neighbors(NodeId(6)), 0.5);
    }

    #[test]
    fn min_over_neighbors_without_entries_is_default() {
        let t = QTable::new(NodeId(0), KeyShape::Local, 7.0);
        assert_eq!(t.min_over_neighbors(NodeId(3)), 7.0);
    }

    #[test]
    fn owner_is_zero_from_itself() {
        let t = QTable::new(NodeId(4), KeyShape::Local, 1.0);
        assert_eq!(t.min_over_neighbors(NodeId(4)), 0.0);
    }

    #[test]
    fn self_neighbor_key_rejected() {
        let mut t = QTable::new(NodeId(2), KeyShape::Local, 0.0);
        let err = t.set(NodeId(5), NodeId(2), 1.0).unwrap_err();
        assert!(matches!(err, NetError::SelfNeighborKey { owner: NodeId(2), .. }));
    }

    #[test]
    fn non_finite_value_rejected() {
        let mut t = QTable::new(NodeId(0), KeyShape::Local, 0.0);
        assert!(t.set(NodeId(5), NodeId(1), f64::INFINITY).is_err());
        assert!(t.set(NodeId(5), NodeId(1), f64::NAN).is_err());
        assert!(t.is_empty());
    }

    #[test]
    fn key_shapes() {
        let local = QTable::new(NodeId(3), KeyShape::Local, 0.0);
        let triplet = QTable::new(NodeId(3), KeyShape::Triplet, 0.0);
        assert_eq!(
            local.key(NodeId(9), NodeId(4)),
            QKey::Local { destination: NodeId(9), via: NodeId(4) }
        );
        assert_eq!(
            triplet.key(NodeId(9), NodeId(4)),
            QKey::Triplet { from: NodeId(3), destination: NodeId(9), via: NodeId(4) }
        );
        assert_eq!(KeyShape::from(UpdateRule::OnArrival), KeyShape::Local);
        assert_eq!(KeyShape::from(UpdateRule::OnDeparture), KeyShape::Triplet);
    }

    #[test]
    fn display_lists_sorted_entries() {
        let mut t = QTable::new(NodeId(0), KeyShape::Local, 0.0);
        assert_eq!(t.to_string(), "QTable: (empty)");
        t.set(NodeId(9), NodeId(2), 1.5).unwrap();
        t.set(NodeId(3), NodeId(1), 2.0).unwrap();
        let text = t.to_string();
        let first = text.find("   3 |").unwrap();
        let second = text.find("   9 |").unwrap();
        assert!(first < second, "{text}");
        assert!(text.contains("destination | neighbor | value"));
    }
}

// ── Packet ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod packet_tests {
    use super::*;
    use crate::{NetError, RequestGenerator};

    #[test]
    fn new_packet_is_fresh() {
        let ids = PacketIdGen::new();
        let p = packet(&ids, 0, 35);
        assert!(!p.reached_destination());
        assert!(p.route().is_empty());
        assert_eq!(p.delivery_time(), None);
    }

    #[test]
    fn same_origin_and_destination_rejected() {
        let ids = PacketIdGen::new();
        let err = Packet::new(&ids, NodeId(3), NodeId(3)).unwrap_err();
        assert!(matches!(err, NetError::SameOriginDestination(NodeId(3))));
    }

    #[test]
    fn ids_are_strictly_increasing() {
        let ids = PacketIdGen::new();
        let a = packet(&ids, 0, 1);
        let b = packet(&ids, 0, 1);
        let c = packet(&ids, 1, 0);
        assert!(a.id() < b.id() && b.id() < c.id());
    }

    #[test]
    fn delivered_flag_is_set_once() {
        let ids = PacketIdGen::new();
        let mut p = packet(&ids, 0, 1);
        p.mark_delivered().unwrap();
        assert!(p.reached_destination());
        assert!(matches!(p.mark_delivered(), Err(NetError::AlreadyDelivered(_))));
        assert!(p.reached_destination());
    }

    #[test]
    fn delivered_packet_route_is_frozen() {
        let ids = PacketIdGen::new();
        let mut p = packet(&ids, 0, 1);
        p.record_hop(Hop::single_tick(NodeId(0), NodeId(1), Tick(0))).unwrap();
        p.mark_delivered().unwrap();
        assert!(p.record_hop(Hop::single_tick(NodeId(1), NodeId(2), Tick(1))).is_err());
        assert_eq!(p.route().len(), 1);
    }

    #[test]
    fn delivery_time_spans_first_send_to_last_receive() {
        let ids = PacketIdGen::new();
        let mut p = packet(&ids, 0, 2);
        p.record_hop(Hop::single_tick(NodeId(0), NodeId(1), Tick(2))).unwrap();
        p.record_hop(Hop::single_tick(NodeId(1), NodeId(2), Tick(5))).unwrap();
        assert_eq!(p.delivery_time(), Some(4));
    }

    #[test]
    fn generator_corner_to_corner() {
        let ids = PacketIdGen::new();
        let generator = RequestGenerator::corner_to_corner(36).unwrap();
        let batch = generator.generate_many(&ids, 3);
        assert_eq!(batch.len(), 3);
        assert!(batch.iter().all(|p| p.origin() == NodeId(0) && p.destination() == NodeId(35)));
        assert!(batch[0].id() < batch[1].id() && batch[1].id() < batch[2].id());
        assert_eq!(ids.issued(), 3);
    }

    #[test]
    fn generators_sharing_a_sequence_never_reuse_ids() {
        let ids = PacketIdGen::new();
        let forward = RequestGenerator::corner_to_corner(9).unwrap();
        let backward = RequestGenerator::new(NodeId(8), NodeId(0)).unwrap();
        let a = forward.generate(&ids);
        let b = backward.generate(&ids);
        let c = Packet::new(&ids, NodeId(4), NodeId(2)).unwrap();
        assert_ne!(a.id(), b.id());
        assert_ne!(b.id(), c.id());
        assert_eq!(ids.issued(), 3);
    }

    #[test]
    fn timestamps_readable_through_getters() {
        let ids = PacketIdGen::new();
        let p = packet(&ids, 0, 1);
        assert_eq!(
            (p.queue_entry(), p.departure(), p.arrival(), p.queue_wait()),
            (Tick::ZERO, Tick::ZERO, Tick::ZERO, 0)
        );
    }

    #[test]
    fn display() {
        let ids = PacketIdGen::new();
        let p = packet(&ids, 0, 35);
        assert_eq!(
            p.to_string(),
            "Packet(id=1, origin=0, destination=35, reached_destination=false, route_length=0)"
        );
    }
}

// ── Node: decide phase ────────────────────────────────────────────────────────

#[cfg(test)]
mod plan_tests {
    use super::*;
    use crate::NetError;

    #[test]
    fn self_neighbor_rejected() {
        let err = Node::new(NodeId(1), vec![NodeId(0), NodeId(1)], &zero_config()).unwrap_err();
        assert!(matches!(err, NetError::SelfLoop(NodeId(1))));
    }

    #[test]
    fn empty_queue_plans_nothing() {
        let mut node = Node::new(NodeId(0), vec![NodeId(1)], &zero_config()).unwrap();
        assert!(node.plan(Tick(0)).unwrap().is_none());
        assert!(node.planned().is_empty());
    }

    #[test]
    fn zero_neighbor_node_is_a_configuration_error() {
        let ids = PacketIdGen::new();
        let mut node = Node::new(NodeId(0), vec![], &zero_config()).unwrap();
        node.enqueue(packet(&ids, 0, 1), Tick(0)).unwrap();
        let err = node.plan(Tick(0)).unwrap_err();
        assert!(matches!(err, NetError::NoNeighbors(NodeId(0))));
        assert_eq!(node.queue_len(), 1, "packet stays queued on failure");
    }

    #[test]
    fn picks_lowest_estimate() {
        let ids = PacketIdGen::new();
        let mut node = Node::new(NodeId(0), vec![NodeId(1), NodeId(2), NodeId(3)], &zero_config()).unwrap();
        node.q_table_mut().set(NodeId(9), NodeId(1), 5.0).unwrap();
        node.q_table_mut().set(NodeId(9), NodeId(2), 2.0).unwrap();
        node.q_table_mut().set(NodeId(9), NodeId(3), 4.0).unwrap();
        node.enqueue(packet(&ids, 0, 9), Tick(0)).unwrap();

        let decision = node.plan(Tick(0)).unwrap().unwrap();
        assert_eq!(decision.next, NodeId(2));
        assert_eq!(decision.score, 2.0);
        assert_eq!(decision.tied, 1);
        assert_eq!(node.planned().len(), 1);
        assert_eq!(node.queue_len(), 0);
    }

    #[test]
    fn near_equal_scores_count_as_ties() {
        let ids = PacketIdGen::new();
        let mut node = Node::new(NodeId(0), vec![NodeId(1), NodeId(2)], &zero_config()).unwrap();
        node.q_table_mut().set(NodeId(9), NodeId(1), 2.0).unwrap();
        node.q_table_mut().set(NodeId(9), NodeId(2), 2.0 + 1e-9).unwrap();
        node.enqueue(packet(&ids, 0, 9), Tick(0)).unwrap();
        let decision = node.plan(Tick(0)).unwrap().unwrap();
        assert_eq!(decision.tied, 2);
    }

    #[test]
    fn fifo_order_and_queue_wait_accrual() {
        let ids = PacketIdGen::new();
        let mut node = Node::new(NodeId(0), vec![NodeId(1)], &zero_config()).unwrap();
        let first = packet(&ids, 0, 1);
        let first_id = first.id();
        node.enqueue(first, Tick(0)).unwrap();
        node.enqueue(packet(&ids, 0, 1), Tick(0)).unwrap();
        node.enqueue(packet(&ids, 0, 1), Tick(0)).unwrap();

        let decision = node.plan(Tick(0)).unwrap().unwrap();
        assert_eq!(decision.packet, first_id);
        assert_eq!(decision.queue_wait, 0);
        let waits: Vec<u64> = node.queue().map(|p| p.queue_wait).collect();
        assert_eq!(waits, vec![1, 1]);

        node.dispatch(Tick(0)).unwrap();
        let second = node.plan(Tick(1)).unwrap().unwrap();
        assert_eq!(second.queue_wait, 1);
        let waits: Vec<u64> = node.queue().map(|p| p.queue_wait).collect();
        assert_eq!(waits, vec![2]);
    }

    #[test]
    fn unplan_restores_queue_and_wait_counters() {
        let ids = PacketIdGen::new();
        let mut node = Node::new(NodeId(0), vec![NodeId(1)], &zero_config()).unwrap();
        let (first, second) = (packet(&ids, 0, 1), packet(&ids, 0, 1));
        let order = vec![first.id(), second.id()];
        node.enqueue(first, Tick(0)).unwrap();
        node.enqueue(second, Tick(0)).unwrap();

        node.plan(Tick(0)).unwrap().unwrap();
        assert_eq!(node.unplan(), 1);
        assert!(node.planned().is_empty());
        let queued: Vec<_> = node.queue().map(|p| p.id()).collect();
        assert_eq!(queued, order);
        assert!(node.queue().all(|p| p.queue_wait() == 0));
        assert_eq!(node.unplan(), 0);
    }

    #[test]
    fn delivered_packet_cannot_be_enqueued() {
        let ids = PacketIdGen::new();
        let mut node = Node::new(NodeId(0), vec![NodeId(1)], &zero_config()).unwrap();
        let mut p = packet(&ids, 0, 1);
        p.mark_delivered().unwrap();
        assert!(node.enqueue(p, Tick(0)).is_err());
    }

    #[test]
    fn tie_break_is_roughly_uniform() {
        let ids = PacketIdGen::new();
        let mut node = Node::new(NodeId(0), vec![NodeId(1), NodeId(2)], &zero_config()).unwrap();
        let mut counts = [0usize; 2];
        let trials = 4_000;
        for t in 0..trials {
            node.enqueue(packet(&ids, 0, 9), Tick(t)).unwrap();
            let decision = node.plan(Tick(t)).unwrap().unwrap();
            counts[decision.next.index() - 1] += 1;
            node.dispatch(Tick(t)).unwrap();
        }
        // Binomial(4000, 0.5): sd ≈ 32, so ±250 is far outside chance.
        for c in counts {
            assert!((1_750..=2_250).contains(&c), "unbalanced tie-break: {counts:?}");
        }
    }

    #[test]
    fn tie_break_reproducible_with_seed() {
        let run = |seed: u64| -> Vec<NodeId> {
            let ids = PacketIdGen::new();
            let cfg = RoutingConfig { seed, ..zero_config() };
            let mut node = Node::new(NodeId(0), vec![NodeId(1), NodeId(2), NodeId(3)], &cfg).unwrap();
            (0..50)
                .map(|t| {
                    node.enqueue(packet(&ids, 0, 9), Tick(t)).unwrap();
                    let d = node.plan(Tick(t)).unwrap().unwrap();
                    node.dispatch(Tick(t)).unwrap();
                    d.next
                })
                .collect()
        };
        assert_eq!(run(7), run(7));
    }
}

// ── Node: commit + arrival ────────────────────────────────────────────────────

#[cfg(test)]
mod receive_tests {
    use super::*;
    use crate::{Arrival, NetError};

    #[test]
    fn dispatch_builds_one_tick_hops_and_clears_staging() {
        let ids = PacketIdGen::new();
        let mut node = Node::new(NodeId(0), vec![NodeId(1)], &zero_config()).unwrap();
        node.enqueue(packet(&ids, 0, 1), Tick(3)).unwrap();
        node.plan(Tick(4)).unwrap();
        let out = node.dispatch(Tick(4)).unwrap();
        assert!(node.planned().is_empty());
        assert_eq!(out.len(), 1);
        let (p, hop) = &out[0];
        assert_eq!(*hop, Hop { from: NodeId(0), to: NodeId(1), sent: Tick(4), received: Tick(5) });
        assert_eq!(p.route(), &[*hop]);
        assert_eq!(p.departure, Tick(4));
    }

    #[test]
    fn q_value_update_follows_td_rule() {
        // q = 2, s = 1, t = 0, η = 0.5, old = 1.0  →  new = 2.0
        let ids = PacketIdGen::new();
        let cfg = zero_config();
        let mut sender = Node::new(NodeId(0), vec![NodeId(1)], &cfg).unwrap();
        let mut receiver = Node::new(NodeId(1), vec![NodeId(0), NodeId(2)], &cfg).unwrap();
        sender.q_table_mut().set(NodeId(2), NodeId(1), 1.0).unwrap();

        let mut p = packet(&ids, 0, 2);
        p.queue_entry = Tick(3);
        p.departure = Tick(5);
        let hop = Hop::single_tick(NodeId(0), NodeId(1), Tick(5));
        p.record_hop(hop).unwrap();

        let reception = receiver.receive(p, hop, Tick(6), Some(&mut sender)).unwrap();
        let update = reception.update.unwrap();
        assert_eq!((update.q, update.s, update.t), (2, 1, 0.0));
        assert_eq!(update.old, 1.0);
        assert!((update.new - 2.0).abs() < 1e-12);
        assert!((sender.q_table().get(NodeId(2), NodeId(1)) - 2.0).abs() < 1e-12);
        assert!(matches!(reception.arrival, Arrival::Queued));
        assert_eq!(receiver.queue_len(), 1);
        assert_eq!(receiver.queue().next().unwrap().queue_entry, Tick(6));
    }

    #[test]
    fn no_update_without_sender_or_hops() {
        let ids = PacketIdGen::new();
        let cfg = zero_config();
        let mut sender = Node::new(NodeId(0), vec![NodeId(1)], &cfg).unwrap();
        let mut receiver = Node::new(NodeId(1), vec![NodeId(0), NodeId(2)], &cfg).unwrap();
        let hop = Hop::single_tick(NodeId(0), NodeId(1), Tick(0));

        let r = receiver.receive(packet(&ids, 0, 2), hop, Tick(1), None).unwrap();
        assert!(r.update.is_none());
        let r = receiver.receive(packet(&ids, 0, 2), hop, Tick(1), Some(&mut sender)).unwrap();
        assert!(r.update.is_none(), "no recorded hop yet");
        assert!(sender.q_table().is_empty());
    }

    #[test]
    fn departure_rule_skips_arrival_update() {
        let ids = PacketIdGen::new();
        let cfg = RoutingConfig { update_rule: UpdateRule::OnDeparture, ..zero_config() };
        let mut sender = Node::new(NodeId(0), vec![NodeId(1)], &cfg).unwrap();
        let mut receiver = Node::new(NodeId(1), vec![NodeId(0), NodeId(2)], &cfg).unwrap();
        let mut p = packet(&ids, 0, 2);
        let hop = Hop::single_tick(NodeId(0), NodeId(1), Tick(0));
        p.record_hop(hop).unwrap();
        let r = receiver.receive(p, hop, Tick(1), Some(&mut sender)).unwrap();
        assert!(r.update.is_none());
    }

    #[test]
    fn arrival_at_destination_is_terminal() {
        let ids = PacketIdGen::new();
        let cfg = zero_config();
        let mut sender = Node::new(NodeId(0), vec![NodeId(1)], &cfg).unwrap();
        let mut dest = Node::new(NodeId(1), vec![NodeId(0)], &cfg).unwrap();
        let mut p = packet(&ids, 0, 1);
        let hop = Hop::single_tick(NodeId(0), NodeId(1), Tick(0));
        p.record_hop(hop).unwrap();
        p.departure = Tick(0);

        let r = dest.receive(p, hop, Tick(1), Some(&mut sender)).unwrap();
        let Arrival::Delivered(p) = r.arrival else {
            panic!("expected delivery");
        };
        assert!(p.reached_destination());
        assert_eq!(p.route().len(), 1, "terminal hop recorded exactly once");
        assert_eq!(p.arrival, Tick(1));
        assert_eq!(dest.queue_len(), 0);
        // t at the destination is zero: q = 0, s = 1 → 0 + 0.5 * (1 - 0) = 0.5
        assert!((r.update.unwrap().new - 0.5).abs() < 1e-12);
    }

    #[test]
    fn terminal_hop_appended_when_missing() {
        let ids = PacketIdGen::new();
        let mut dest = Node::new(NodeId(1), vec![NodeId(0)], &zero_config()).unwrap();
        let hop = Hop::single_tick(NodeId(0), NodeId(1), Tick(0));
        let r = dest.receive(packet(&ids, 0, 1), hop, Tick(1), None).unwrap();
        let Arrival::Delivered(p) = r.arrival else {
            panic!("expected delivery");
        };
        assert_eq!(p.route(), &[hop]);
    }

    #[test]
    fn delivered_packet_cannot_be_received_again() {
        let ids = PacketIdGen::new();
        let mut node = Node::new(NodeId(1), vec![NodeId(0)], &zero_config()).unwrap();
        let mut p = packet(&ids, 0, 2);
        p.mark_delivered().unwrap();
        let hop = Hop::single_tick(NodeId(0), NodeId(1), Tick(0));
        let err = node.receive(p, hop, Tick(1), None).unwrap_err();
        assert!(matches!(err, NetError::AlreadyDelivered(_)));
    }
}

// ── Learning rules ────────────────────────────────────────────────────────────

#[cfg(test)]
mod learning_tests {
    use super::*;
    use crate::{NetError, Topology, departure_update, td_update};

    #[test]
    fn td_update_formula() {
        assert!((td_update(1.0, 0.5, 2, 1, 0.0) - 2.0).abs() < 1e-12);
        assert!((td_update(4.0, 1.0, 0, 1, 2.0) - 3.0).abs() < 1e-12);
        // Fixed point: observed == old leaves the value unchanged.
        assert!((td_update(3.0, 0.3, 1, 1, 1.0) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn departure_update_reads_neighbor_table() {
        let cfg = RoutingConfig {
            update_rule: UpdateRule::OnDeparture,
            bootstrap:   Bootstrap::Zero,
            ..RoutingConfig::default()
        };
        // Line 0 — 1 — 2.
        let mut topo = Topology::grid(1, 3, cfg).unwrap();
        topo.node_mut(NodeId(1)).unwrap().q_table_mut().set(NodeId(2), NodeId(2), 0.75).unwrap();
        topo.node_mut(NodeId(1)).unwrap().q_table_mut().set(NodeId(2), NodeId(0), 3.0).unwrap();

        let ids = PacketIdGen::new();
        topo.enqueue(NodeId(0), packet(&ids, 0, 2), Tick(0)).unwrap();
        let decision = topo.node_mut(NodeId(0)).unwrap().plan(Tick(0)).unwrap().unwrap();
        let update = departure_update(topo.node(NodeId(0)).unwrap(), &decision, &topo.view(NodeId(0)).unwrap()).unwrap();

        assert_eq!(update.owner, NodeId(0));
        assert_eq!(update.via, NodeId(1));
        assert_eq!((update.q, update.s), (0, 1));
        assert_eq!(update.t, 0.75);
        assert!((update.new - 0.875).abs() < 1e-12); // 0 + 0.5 * (1.75 - 0)
        // Nothing written until the caller applies it.
        assert_eq!(topo.node(NodeId(0)).unwrap().q_table().get(NodeId(2), NodeId(1)), 0.0);
        topo.apply_update(&update).unwrap();
        assert!((topo.node(NodeId(0)).unwrap().q_table().get(NodeId(2), NodeId(1)) - 0.875).abs() < 1e-12);
    }

    #[test]
    fn neighbor_view_is_scoped_to_links() {
        // Line 0 — 1 — 2.
        let topo = Topology::grid(1, 3, RoutingConfig::default()).unwrap();
        let view = topo.view(NodeId(0)).unwrap();
        assert_eq!(view.holder(), NodeId(0));
        assert!(view.table(NodeId(1)).is_ok());
        assert!(matches!(
            view.table(NodeId(2)),
            Err(NetError::NotNeighbor { holder: NodeId(0), node: NodeId(2) })
        ));
        assert!(matches!(view.table(NodeId(0)), Err(NetError::NotNeighbor { .. })));
        assert!(matches!(topo.view(NodeId(9)), Err(NetError::NodeNotFound(NodeId(9)))));
    }

    #[test]
    fn departure_update_rejects_foreign_view() {
        let cfg = RoutingConfig { update_rule: UpdateRule::OnDeparture, ..RoutingConfig::default() };
        let mut topo = Topology::grid(1, 3, cfg).unwrap();
        let ids = PacketIdGen::new();
        topo.enqueue(NodeId(0), packet(&ids, 0, 2), Tick(0)).unwrap();
        let decision = topo.node_mut(NodeId(0)).unwrap().plan(Tick(0)).unwrap().unwrap();
        let err = departure_update(topo.node(NodeId(0)).unwrap(), &decision, &topo.view(NodeId(1)).unwrap())
            .unwrap_err();
        assert!(matches!(err, NetError::NotNeighbor { .. }));
    }
}

// ── Topology ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod topology_tests {
    use super::*;
    use crate::{Arrival, NetError, Topology, TopologyBuilder};

    #[test]
    fn grid_neighbors() {
        let topo = Topology::grid(6, 6, RoutingConfig::default()).unwrap();
        assert_eq!(topo.node_count(), 36);
        assert_eq!(topo.node(NodeId(0)).unwrap().neighbors(), &[NodeId(1), NodeId(6)]);
        let mut centre = topo.node(NodeId(14)).unwrap().neighbors().to_vec();
        centre.sort();
        assert_eq!(centre, vec![NodeId(8), NodeId(13), NodeId(15), NodeId(20)]);
        assert_eq!(topo.node(NodeId(35)).unwrap().neighbors().len(), 2);
    }

    #[test]
    fn links_are_symmetric() {
        let topo = Topology::boyan_littman_6x6(RoutingConfig::default()).unwrap();
        for node in topo.nodes() {
            for &n in node.neighbors() {
                assert!(topo.node(n).unwrap().neighbors().contains(&node.id()));
            }
        }
    }

    #[test]
    fn holes_are_isolated() {
        let topo = Topology::boyan_littman_6x6(RoutingConfig::default()).unwrap();
        for hole in [8, 9, 14, 15, 20, 21, 26, 27] {
            assert!(topo.node(NodeId(hole)).unwrap().neighbors().is_empty());
        }
        let holes = [8, 9, 14, 15, 20, 21, 26, 27];
        assert!(topo.nodes().iter().all(|n| n.neighbors().iter().all(|x| !holes.contains(&x.0))));
        assert_eq!(topo.node(NodeId(7)).unwrap().neighbors(), &[NodeId(1), NodeId(6), NodeId(13)]);
    }

    #[test]
    fn optimistic_bootstrap_seeds_every_pair() {
        let topo = Topology::grid(2, 2, RoutingConfig::default()).unwrap();
        let node = topo.node(NodeId(0)).unwrap();
        // 3 destinations × 2 neighbors.
        assert_eq!(node.q_table().len(), 6);
        assert_eq!(node.q_table().get(NodeId(3), NodeId(1)), 1.0);
        assert!(node.q_table().entries().iter().all(|(k, _)| k.destination() != NodeId(0)));
    }

    #[test]
    fn zero_bootstrap_leaves_tables_empty() {
        let topo = Topology::grid(2, 2, zero_config()).unwrap();
        assert!(topo.nodes().iter().all(|n| n.q_table().is_empty()));
    }

    #[test]
    fn invalid_config_rejected_at_build() {
        let cfg = RoutingConfig { learning_rate: 0.0, ..RoutingConfig::default() };
        assert!(Topology::grid(2, 2, cfg).is_err());
        assert!(Topology::grid(0, 3, RoutingConfig::default()).is_err());
    }

    #[test]
    fn builder_rejects_self_loops_and_unknown_nodes() {
        let mut b = TopologyBuilder::new(RoutingConfig::default());
        let a = b.add_node();
        let c = b.add_node();
        assert!(matches!(b.connect(a, a), Err(NetError::SelfLoop(_))));
        assert!(matches!(b.connect(a, NodeId(9)), Err(NetError::NodeNotFound(NodeId(9)))));
        b.connect(a, c).unwrap();
        b.connect(c, a).unwrap();
        let topo = b.build().unwrap();
        assert_eq!(topo.node(a).unwrap().neighbors(), &[c]);
    }

    #[test]
    fn pair_mut_both_orders() {
        let mut topo = Topology::grid(1, 4, RoutingConfig::default()).unwrap();
        let (x, y) = topo.pair_mut(NodeId(3), NodeId(1)).unwrap();
        assert_eq!((x.id(), y.id()), (NodeId(3), NodeId(1)));
        let (x, y) = topo.pair_mut(NodeId(0), NodeId(2)).unwrap();
        assert_eq!((x.id(), y.id()), (NodeId(0), NodeId(2)));
        assert!(topo.pair_mut(NodeId(2), NodeId(2)).is_err());
        assert!(topo.pair_mut(NodeId(2), NodeId(7)).is_err());
    }

    #[test]
    fn commit_moves_packet_one_hop_and_learns() {
        let mut topo = Topology::grid(1, 3, zero_config()).unwrap();
        let ids = PacketIdGen::new();
        topo.enqueue(NodeId(0), packet(&ids, 0, 2), Tick(0)).unwrap();
        topo.node_mut(NodeId(0)).unwrap().plan(Tick(0)).unwrap();
        let transfers = topo.commit_node(NodeId(0), Tick(0)).unwrap();

        assert_eq!(transfers.len(), 1);
        assert!(matches!(transfers[0].reception.arrival, Arrival::Queued));
        assert_eq!(topo.node(NodeId(1)).unwrap().queue_len(), 1);
        assert!(topo.node(NodeId(0)).unwrap().planned().is_empty());
        // q = 0, s = 1, t = 0 → 0 + 0.5 * 1 = 0.5
        assert_eq!(topo.node(NodeId(0)).unwrap().q_table().get(NodeId(2), NodeId(1)), 0.5);
        assert_eq!(topo.in_flight(), 1);
    }
}
