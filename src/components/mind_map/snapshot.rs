use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::config::MapConfig;
use super::env::Environment;
use super::error::{MapError, MapResult};
use super::store::GraphStore;
use super::types::{Cluster, Edge, EdgeKind, Node};

/// Serializable copy of a whole map.
///
/// `edges` may carry hierarchy edges for readers that want them; on import
/// they must match the node tree exactly and are then discarded, since the
/// tree itself is the source of truth.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MapSnapshot {
	pub nodes: Vec<Node>,
	#[serde(default)]
	pub edges: Vec<Edge>,
	#[serde(default)]
	pub clusters: Vec<Cluster>,
}

impl MapSnapshot {
	/// Captures `store`, hierarchy edges included.
	pub fn capture(store: &GraphStore) -> Self {
		Self {
			nodes: store.nodes().cloned().collect(),
			edges: store.edges(),
			clusters: store.clusters().to_vec(),
		}
	}

	pub fn to_json(&self) -> MapResult<String> {
		Ok(serde_json::to_string_pretty(self)?)
	}

	pub fn from_json(raw: &str) -> MapResult<Self> {
		Ok(serde_json::from_str(raw)?)
	}

	/// Rebuilds a store, validating every tree and link invariant.
	pub fn restore(self, env: Environment, config: MapConfig) -> MapResult<GraphStore> {
		let (hierarchy, links): (Vec<Edge>, Vec<Edge>) =
			self.edges.into_iter().partition(|e| e.kind == EdgeKind::Hierarchy);
		let store = GraphStore::from_parts(self.nodes, links, self.clusters, env, config)?;

		if hierarchy.is_empty() {
			return Ok(store);
		}
		let mut given = HashSet::with_capacity(hierarchy.len());
		for edge in &hierarchy {
			let mirrored = store
				.node(&edge.to)
				.is_some_and(|n| n.parent.as_ref() == Some(&edge.from));
			if !mirrored {
				return Err(MapError::InvalidSnapshot(format!(
					"hierarchy edge {} -> {} has no matching parent link",
					edge.from, edge.to
				)));
			}
			if !given.insert((edge.from.clone(), edge.to.clone())) {
				return Err(MapError::InvalidSnapshot(format!(
					"hierarchy edge {} -> {} listed twice",
					edge.from, edge.to
				)));
			}
		}
		if let Some(missing) = store
			.hierarchy_edges()
			.find(|e| !given.contains(&(e.from.clone(), e.to.clone())))
		{
			return Err(MapError::InvalidSnapshot(format!(
				"hierarchy edge {} -> {} missing",
				missing.from, missing.to
			)));
		}
		Ok(store)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::types::{NodeId, Position};

	fn sample() -> GraphStore {
		let mut store = GraphStore::new("Root", Environment::default(), MapConfig::default());
		let root = NodeId::root();
		let a = store.add_child(&root, "Market research").unwrap();
		let b = store.add_child(&root, "Goals").unwrap();
		store.add_child(&a, "Competitors").unwrap();
		store.connect(&a, &b, EdgeKind::Dependency).unwrap();
		store.add_cluster(Cluster {
			id: "strategy".into(),
			name: "Strategic Planning".into(),
			color: "rgba(59, 130, 246, 0.1)".into(),
			node_ids: vec![root, a],
			position: Position::new(15.0, 10.0),
			visible: true,
		});
		store
	}

	#[test]
	fn json_export_restores_the_same_map() {
		let store = sample();
		let json = MapSnapshot::capture(&store).to_json().unwrap();
		let restored = MapSnapshot::from_json(&json)
			.unwrap()
			.restore(Environment::default(), MapConfig::default())
			.unwrap();
		assert_eq!(MapSnapshot::capture(&restored), MapSnapshot::capture(&store));
		assert_eq!(restored.links().len(), 1);
	}

	#[test]
	fn orphan_hierarchy_edges_are_rejected() {
		let mut snapshot = MapSnapshot::capture(&sample());
		let last = snapshot.nodes.last().unwrap().id.clone();
		snapshot
			.edges
			.push(Edge::new(NodeId::root(), last, EdgeKind::Hierarchy, 1.0));
		let err = snapshot.restore(Environment::default(), MapConfig::default());
		assert!(matches!(err, Err(MapError::InvalidSnapshot(_))));
	}

	#[test]
	fn hierarchy_edges_must_match_the_tree_exactly() {
		let mut snapshot = MapSnapshot::capture(&sample());
		let first = snapshot
			.edges
			.iter()
			.position(|e| e.kind == EdgeKind::Hierarchy)
			.unwrap();
		let duplicate = snapshot.edges[first].clone();
		let dropped = snapshot
			.edges
			.iter()
			.rposition(|e| e.kind == EdgeKind::Hierarchy)
			.unwrap();
		snapshot.edges[dropped] = duplicate;
		let err = snapshot.restore(Environment::default(), MapConfig::default());
		assert!(matches!(err, Err(MapError::InvalidSnapshot(_))));

		let mut partial = MapSnapshot::capture(&sample());
		partial.edges.remove(first);
		let err = partial.restore(Environment::default(), MapConfig::default());
		assert!(matches!(err, Err(MapError::InvalidSnapshot(_))));

		let mut bare = MapSnapshot::capture(&sample());
		bare.edges.retain(|e| e.kind != EdgeKind::Hierarchy);
		assert!(bare.restore(Environment::default(), MapConfig::default()).is_ok());
	}

	#[test]
	fn dangling_links_and_bad_json_are_rejected() {
		let mut snapshot = MapSnapshot::capture(&sample());
		snapshot.edges.push(Edge::new(
			NodeId::root(),
			"ghost".into(),
			EdgeKind::Association,
			0.5,
		));
		assert!(matches!(
			snapshot.restore(Environment::default(), MapConfig::default()),
			Err(MapError::InvalidSnapshot(_))
		));
		assert!(matches!(MapSnapshot::from_json("[]"), Err(MapError::Json(_))));
	}
}
