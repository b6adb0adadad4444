//! Layout pass for nodes placed while offline: once connectivity returns,
//! their hand-placed positions are relaxed against the rest of the map.

use std::collections::{HashMap, HashSet};

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};

use super::store::GraphStore;
use super::types::{NodeId, Position};

/// Percent space is simulated as a square of this many pixels per axis.
const SPACE: f64 = 10.0;
const DT: f32 = 0.016;

#[derive(Clone, Debug, Default)]
struct SimNode {
	id: NodeId,
	movable: bool,
}

/// Runs a force simulation in which only `movable` nodes are free and
/// returns their settled positions (unclamped, percent space).
pub fn relax(store: &GraphStore, movable: &[NodeId]) -> Vec<(NodeId, Position)> {
	let free: HashSet<&NodeId> = movable.iter().collect();
	let mut graph: ForceGraph<SimNode, ()> = ForceGraph::new(SimulationParameters {
		force_charge: 150.0,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	});

	let mut indices = HashMap::new();
	for (i, node) in store.nodes().enumerate() {
		let is_free = free.contains(&node.id);
		// Nudge free nodes so none sits exactly on another one.
		let jitter = if is_free { (i % 7) as f64 * 0.37 } else { 0.0 };
		let idx = graph.add_node(NodeData {
			x: ((node.position.x + jitter) * SPACE) as f32,
			y: ((node.position.y - jitter) * SPACE) as f32,
			mass: 10.0,
			is_anchor: !is_free,
			user_data: SimNode {
				id: node.id.clone(),
				movable: is_free,
			},
		});
		indices.insert(node.id.clone(), idx);
	}
	for edge in store.edges() {
		if let (Some(&src), Some(&tgt)) = (indices.get(&edge.from), indices.get(&edge.to)) {
			graph.add_edge(src, tgt, EdgeData::default());
		}
	}

	for _ in 0..store.config().relax_iterations {
		graph.update(DT);
	}

	let mut out = Vec::with_capacity(movable.len());
	graph.visit_nodes(|node| {
		let data = &node.data.user_data;
		let (x, y) = (node.x() as f64 / SPACE, node.y() as f64 / SPACE);
		if data.movable && x.is_finite() && y.is_finite() {
			out.push((data.id.clone(), Position::new(x, y)));
		}
	});
	out
}

/// Lays out every offline-created node and clears its offline flag. Does
/// nothing while offline. Returns the ids that were synced.
pub fn sync_offline_nodes(store: &mut GraphStore) -> Vec<NodeId> {
	if !store.env().is_online() {
		debug!("sync skipped: offline");
		return Vec::new();
	}
	let pending = store.offline_nodes();
	if pending.is_empty() {
		return pending;
	}
	let settled = relax(store, &pending);
	for id in &pending {
		let position = settled
			.iter()
			.find(|(sid, _)| sid == id)
			.map(|(_, p)| *p)
			.or_else(|| store.node(id).map(|n| n.position));
		if let Some(position) = position {
			if let Err(err) = store.mark_synced(id, position) {
				debug!("sync of {id} skipped: {err}");
			}
		}
	}
	info!("synced {} offline nodes", pending.len());
	pending
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::config::MapConfig;
	use crate::components::mind_map::env::{Environment, ManualClock, SharedConnectivity};

	#[test]
	fn sync_waits_for_connectivity_then_clears_flags() {
		let net = SharedConnectivity::new(false);
		let mut store = GraphStore::new(
			"Root",
			Environment::new(ManualClock::new(0), net.clone()),
			MapConfig::default(),
		);
		let root = NodeId::root();
		let a = store.add_child(&root, "Offline A").unwrap();
		let b = store.add_child(&root, "Offline B").unwrap();
		let root_before = store.root().position;

		assert!(sync_offline_nodes(&mut store).is_empty());
		assert_eq!(store.offline_nodes().len(), 2);

		net.set_online(true);
		assert_eq!(sync_offline_nodes(&mut store), vec![a.clone(), b.clone()]);
		assert!(store.offline_nodes().is_empty());
		for id in [&a, &b] {
			let node = store.node(id).unwrap();
			assert!(node.ai_suggested);
			assert!((5.0..=95.0).contains(&node.position.x));
			assert!((5.0..=95.0).contains(&node.position.y));
		}
		assert_eq!(store.root().position, root_before);
		store.check_invariants().unwrap();
	}

	#[test]
	fn relax_reports_only_movable_nodes() {
		let mut store = GraphStore::new("Root", Environment::default(), MapConfig::default());
		let a = store.add_child(&NodeId::root(), "A").unwrap();
		store.add_child(&NodeId::root(), "B").unwrap();
		let out = relax(&store, &[a.clone()]);
		assert!(out.iter().all(|(id, _)| id == &a));
	}
}
