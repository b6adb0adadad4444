use std::collections::{HashMap, HashSet};

use log::debug;

use super::config::MapConfig;
use super::env::Environment;
use super::error::{MapError, MapResult};
use super::types::{Cluster, ClusterId, ContentBlock, Edge, EdgeKind, Node, NodeId, NodeKind, Position};

/// Strength reported for edges derived from the node tree.
pub const HIERARCHY_STRENGTH: f64 = 1.0;
const LINK_STRENGTH: f64 = 0.7;
const SPLIT_LINK_STRENGTH: f64 = 0.9;
const CHILD_FAN: f64 = 15.0;

/// Owner of every node, link and cluster of a map.
///
/// Nodes live in an arena keyed by id; `order` keeps insertion order so that
/// iteration (and therefore rendering and suggestions) is deterministic.
/// Hierarchy edges are never stored: they are read off the `parent` and
/// `children` fields, which only this type mutates.
pub struct GraphStore {
	nodes: HashMap<NodeId, Node>,
	order: Vec<NodeId>,
	links: Vec<Edge>,
	clusters: Vec<Cluster>,
	env: Environment,
	config: MapConfig,
	revision: u64,
	next_seq: u64,
}

impl GraphStore {
	pub fn new(root_title: impl Into<String>, env: Environment, config: MapConfig) -> Self {
		let mut root = Node::new(NodeId::root(), root_title, Position::new(50.0, 15.0));
		root.kind = NodeKind::Rich;
		root.last_modified = env.now_ms();
		Self {
			order: vec![root.id.clone()],
			nodes: HashMap::from([(root.id.clone(), root)]),
			links: Vec::new(),
			clusters: Vec::new(),
			env,
			config,
			revision: 0,
			next_seq: 0,
		}
	}

	/// Builds a store from already materialized parts, rejecting anything that
	/// breaks the tree or link invariants.
	pub fn from_parts(
		nodes: Vec<Node>,
		links: Vec<Edge>,
		clusters: Vec<Cluster>,
		env: Environment,
		config: MapConfig,
	) -> MapResult<Self> {
		let mut map = HashMap::with_capacity(nodes.len());
		let mut order = Vec::with_capacity(nodes.len());
		for node in nodes {
			if map.contains_key(&node.id) {
				return Err(MapError::InvalidSnapshot(format!("duplicate node id {}", node.id)));
			}
			order.push(node.id.clone());
			map.insert(node.id.clone(), node);
		}
		let store = Self {
			nodes: map,
			order,
			links,
			clusters,
			env,
			config,
			revision: 0,
			next_seq: 0,
		};
		store.check_invariants()?;
		Ok(store)
	}

	pub fn root(&self) -> &Node {
		&self.nodes[&NodeId::root()]
	}

	pub fn node(&self, id: &NodeId) -> Option<&Node> {
		self.nodes.get(id)
	}

	pub fn contains(&self, id: &NodeId) -> bool {
		self.nodes.contains_key(id)
	}

	/// Nodes in insertion order.
	pub fn nodes(&self) -> impl Iterator<Item = &Node> {
		self.order.iter().filter_map(|id| self.nodes.get(id))
	}

	/// Never zero: the root always exists.
	#[allow(clippy::len_without_is_empty)]
	pub fn len(&self) -> usize {
		self.nodes.len()
	}

	/// Stored non-hierarchy links.
	pub fn links(&self) -> &[Edge] {
		&self.links
	}

	/// Hierarchy edges derived from the tree, parents before children.
	pub fn hierarchy_edges(&self) -> impl Iterator<Item = Edge> + '_ {
		self.nodes().flat_map(|node| {
			node.children.iter().map(|child| {
				Edge::new(node.id.clone(), child.clone(), EdgeKind::Hierarchy, HIERARCHY_STRENGTH)
			})
		})
	}

	/// Every edge of the map: derived hierarchy edges followed by links.
	pub fn edges(&self) -> Vec<Edge> {
		self.hierarchy_edges().chain(self.links.iter().cloned()).collect()
	}

	pub fn clusters(&self) -> &[Cluster] {
		&self.clusters
	}

	pub fn cluster(&self, id: &ClusterId) -> Option<&Cluster> {
		self.clusters.iter().find(|c| &c.id == id)
	}

	pub fn config(&self) -> &MapConfig {
		&self.config
	}

	pub fn env(&self) -> &Environment {
		&self.env
	}

	/// Bumped by every successful mutation.
	pub fn revision(&self) -> u64 {
		self.revision
	}

	/// True when any edge, stored or derived, joins `a` and `b`.
	pub fn is_connected(&self, a: &NodeId, b: &NodeId) -> bool {
		self.links.iter().any(|e| e.joins(a, b)) || self.is_parent_of(a, b) || self.is_parent_of(b, a)
	}

	fn is_parent_of(&self, parent: &NodeId, child: &NodeId) -> bool {
		self.nodes
			.get(child)
			.and_then(|n| n.parent.as_ref())
			.is_some_and(|p| p == parent)
	}

	fn get(&self, id: &NodeId) -> MapResult<&Node> {
		self.nodes.get(id).ok_or_else(|| MapError::NodeNotFound(id.clone()))
	}

	fn get_mut(&mut self, id: &NodeId) -> MapResult<&mut Node> {
		self.nodes.get_mut(id).ok_or_else(|| MapError::NodeNotFound(id.clone()))
	}

	fn fresh_id(&mut self, prefix: &str) -> NodeId {
		loop {
			self.next_seq += 1;
			let id = NodeId(format!("{prefix}_{}", self.next_seq));
			if !self.nodes.contains_key(&id) {
				return id;
			}
		}
	}

	fn touch(&mut self, id: &NodeId, now: u64) {
		if let Some(node) = self.nodes.get_mut(id) {
			node.last_modified = now;
		}
	}

	fn bump(&mut self) {
		self.revision += 1;
	}

	fn join_cluster(&mut self, id: &NodeId, cluster: Option<&ClusterId>) {
		let Some(cluster) = cluster else {
			return;
		};
		if let Some(c) = self.clusters.iter_mut().find(|c| &c.id == cluster) {
			if !c.node_ids.contains(id) {
				c.node_ids.push(id.clone());
			}
		}
	}

	fn forget(&mut self, id: &NodeId) {
		self.links.retain(|e| !e.touches(id));
		for cluster in &mut self.clusters {
			cluster.node_ids.retain(|n| n != id);
		}
		self.nodes.remove(id);
		self.order.retain(|n| n != id);
	}

	/// Rewrites `level` below `id` from its parent's level.
	fn relevel(&mut self, id: &NodeId) {
		let mut stack = vec![id.clone()];
		while let Some(current) = stack.pop() {
			let level = self
				.nodes
				.get(&current)
				.and_then(|n| n.parent.as_ref())
				.and_then(|p| self.nodes.get(p))
				.map_or(0, |p| p.level + 1);
			if let Some(node) = self.nodes.get_mut(&current) {
				node.level = level;
				stack.extend(node.children.iter().cloned());
			}
		}
	}

	/// Appends a new child under `parent` and returns its id.
	pub fn add_child(&mut self, parent: &NodeId, title: &str) -> MapResult<NodeId> {
		let title = title.trim();
		if title.is_empty() {
			return Err(MapError::EmptyTitle);
		}
		let p = self.get(parent)?;
		let slot = p.children.len();
		let step = slot.div_ceil(2) as f64 * CHILD_FAN;
		let dx = if slot % 2 == 1 { -step } else { step };
		let position = Position::new(p.position.x + dx, p.position.y + 25.0 + p.level as f64 * 5.0)
			.clamped(self.config.position_margin);
		let (level, cluster) = (p.level + 1, p.cluster.clone());

		let id = self.fresh_id("node");
		let now = self.env.now_ms();
		let online = self.env.is_online();
		let mut node = Node::new(id.clone(), title, position).with_tags(["new"]);
		node.content.push(ContentBlock::text("New idea ready for development."));
		node.level = level;
		node.parent = Some(parent.clone());
		node.cluster = cluster.clone();
		node.last_modified = now;
		node.ai_suggested = online;
		node.offline_created = !online;

		self.get_mut(parent)?.children.push(id.clone());
		self.touch(parent, now);
		self.order.push(id.clone());
		self.nodes.insert(id.clone(), node);
		self.join_cluster(&id, cluster.as_ref());
		self.bump();
		debug!("added {id} under {parent} (online={online})");
		Ok(id)
	}

	/// Replaces `id` with two siblings carrying the halves of its title.
	///
	/// The first half takes over the original's children. Links touching the
	/// original are dropped and the halves are joined by an association.
	pub fn split(&mut self, id: &NodeId) -> MapResult<(NodeId, NodeId)> {
		if id.is_root() {
			return Err(MapError::RootProtected);
		}
		let original = self.get(id)?.clone();
		let words: Vec<&str> = original.title.split_whitespace().collect();
		if words.len() < 2 {
			return Err(MapError::TitleTooShort(original.title.clone()));
		}
		let parent_id = original.parent.clone().ok_or(MapError::RootProtected)?;
		let mid = words.len().div_ceil(2);
		let halves = [words[..mid].join(" "), words[mid..].join(" ")];

		let now = self.env.now_ms();
		let margin = self.config.position_margin;
		let prefix = format!("{id}_split");
		let ids = [self.fresh_id(&prefix), self.fresh_id(&prefix)];
		let mut parts = Vec::with_capacity(2);
		for ((new_id, title), dx) in ids.iter().zip(&halves).zip([-10.0, 10.0]) {
			let mut node = Node::new(
				new_id.clone(),
				title.clone(),
				Position::new(original.position.x + dx, original.position.y + 15.0).clamped(margin),
			);
			node.level = original.level;
			node.parent = Some(parent_id.clone());
			node.tags = original.tags.clone();
			node.cluster = original.cluster.clone();
			node.kind = original.kind;
			node.relevance = 0.8;
			node.ai_suggested = true;
			node.offline_created = original.offline_created;
			node.last_modified = now;
			parts.push(node);
		}
		parts[0].children = original.children.clone();
		parts[0].expanded = original.expanded;

		let parent = self.get_mut(&parent_id)?;
		let slot = parent.children.iter().position(|c| c == id).unwrap_or(parent.children.len());
		parent.children.retain(|c| c != id);
		for (offset, new_id) in ids.iter().enumerate() {
			parent.children.insert(slot + offset, new_id.clone());
		}
		self.touch(&parent_id, now);

		let order_slot = self.order.iter().position(|n| n == id).unwrap_or(self.order.len());
		self.forget(id);
		for (offset, new_id) in ids.iter().enumerate() {
			self.order.insert(order_slot + offset, new_id.clone());
		}
		for node in parts {
			self.nodes.insert(node.id.clone(), node);
		}
		for child in &original.children {
			if let Some(c) = self.nodes.get_mut(child) {
				c.parent = Some(ids[0].clone());
				c.last_modified = now;
			}
		}
		for new_id in &ids {
			self.join_cluster(new_id, original.cluster.as_ref());
		}
		self.links.push(Edge::new(
			ids[0].clone(),
			ids[1].clone(),
			EdgeKind::Association,
			SPLIT_LINK_STRENGTH,
		));
		self.bump();
		debug!("split {id} into {} / {}", ids[0], ids[1]);
		let [first, second] = ids;
		Ok((first, second))
	}

	/// Replaces two or more nodes with one node at their centroid.
	///
	/// The merged node hangs under the parent of the shallowest input and
	/// adopts every child of the inputs that is not itself merged.
	pub fn merge(&mut self, ids: &[NodeId]) -> MapResult<NodeId> {
		let mut unique: Vec<NodeId> = Vec::with_capacity(ids.len());
		for id in ids {
			if !unique.contains(id) {
				unique.push(id.clone());
			}
		}
		if unique.len() < 2 {
			return Err(MapError::NotEnoughNodes(unique.len()));
		}
		if unique.iter().any(NodeId::is_root) {
			return Err(MapError::RootProtected);
		}
		let inputs = unique
			.iter()
			.map(|id| self.get(id).cloned())
			.collect::<MapResult<Vec<_>>>()?;
		let merging: HashSet<&NodeId> = unique.iter().collect();

		let top = inputs
			.iter()
			.min_by_key(|n| n.level)
			.ok_or(MapError::NotEnoughNodes(0))?;
		let parent_id = top.parent.clone().ok_or(MapError::RootProtected)?;
		let parent = self.get(&parent_id)?;
		let slot = parent
			.children
			.iter()
			.take_while(|c| *c != &top.id)
			.filter(|c| !merging.contains(c))
			.count();

		let title = inputs.iter().map(|n| n.title.as_str()).collect::<Vec<_>>().join(" + ");
		let position = Position::centroid(inputs.iter().map(|n| &n.position))
			.unwrap_or(top.position)
			.clamped(self.config.position_margin);
		let children: Vec<NodeId> = inputs
			.iter()
			.flat_map(|n| n.children.iter())
			.filter(|c| !merging.contains(c))
			.cloned()
			.collect();
		let cluster = inputs[0].cluster.clone();
		let now = self.env.now_ms();

		let merged_id = self.fresh_id("merged");
		let mut merged = Node::new(merged_id.clone(), title, position);
		merged.tags = inputs.iter().flat_map(|n| n.tags.iter().cloned()).collect();
		merged.parent = Some(parent_id.clone());
		merged.children = children.clone();
		merged.cluster = cluster.clone();
		merged.kind = NodeKind::Rich;
		merged.relevance = 0.9;
		merged.ai_suggested = true;
		merged.last_modified = now;

		for input in &inputs {
			if let Some(p) = input.parent.as_ref().and_then(|p| self.nodes.get_mut(p)) {
				p.children.retain(|c| c != &input.id);
				p.last_modified = now;
			}
			self.forget(&input.id);
		}
		self.order.push(merged_id.clone());
		self.nodes.insert(merged_id.clone(), merged);
		if let Some(parent) = self.nodes.get_mut(&parent_id) {
			let slot = slot.min(parent.children.len());
			parent.children.insert(slot, merged_id.clone());
			parent.last_modified = now;
		}
		for child in &children {
			if let Some(c) = self.nodes.get_mut(child) {
				c.parent = Some(merged_id.clone());
				c.last_modified = now;
			}
		}
		self.relevel(&merged_id);
		self.join_cluster(&merged_id, cluster.as_ref());
		self.bump();
		debug!("merged {} nodes into {merged_id}", inputs.len());
		Ok(merged_id)
	}

	/// Adds a link unless the pair is already joined by any edge, in either
	/// direction. Returns whether a link was added.
	pub fn connect(&mut self, from: &NodeId, to: &NodeId, kind: EdgeKind) -> MapResult<bool> {
		if from == to {
			return Err(MapError::SelfLink(from.clone()));
		}
		if kind == EdgeKind::Hierarchy {
			return Err(MapError::HierarchyLink);
		}
		self.get(from)?;
		self.get(to)?;
		if self.is_connected(from, to) {
			debug!("{from} and {to} already connected");
			return Ok(false);
		}
		let now = self.env.now_ms();
		self.links
			.push(Edge::new(from.clone(), to.clone(), kind, LINK_STRENGTH).animated());
		self.touch(from, now);
		self.touch(to, now);
		self.bump();
		debug!("connected {from} -> {to} ({})", kind.label());
		Ok(true)
	}

	/// Removes `id` and every edge touching it. Its children are promoted into
	/// its slot under its former parent.
	pub fn delete(&mut self, id: &NodeId) -> MapResult<Node> {
		if id.is_root() {
			return Err(MapError::RootProtected);
		}
		let node = self.get(id)?.clone();
		let parent_id = node.parent.clone().ok_or(MapError::RootProtected)?;
		let now = self.env.now_ms();

		let parent = self.get_mut(&parent_id)?;
		let slot = parent.children.iter().position(|c| c == id).unwrap_or(parent.children.len());
		parent.children.retain(|c| c != id);
		for (offset, child) in node.children.iter().enumerate() {
			parent.children.insert(slot + offset, child.clone());
		}
		parent.last_modified = now;

		self.forget(id);
		for child in &node.children {
			if let Some(c) = self.nodes.get_mut(child) {
				c.parent = Some(parent_id.clone());
				c.last_modified = now;
			}
			self.relevel(child);
		}
		// A promoted child is now a tree neighbour of its new parent.
		self.links
			.retain(|e| !node.children.iter().any(|c| e.joins(&parent_id, c)));
		self.bump();
		debug!("deleted {id}, promoted {} children", node.children.len());
		Ok(node)
	}

	pub fn rename(&mut self, id: &NodeId, title: &str) -> MapResult<()> {
		let title = title.trim();
		if title.is_empty() {
			return Err(MapError::EmptyTitle);
		}
		let now = self.env.now_ms();
		let node = self.get_mut(id)?;
		node.title = title.to_string();
		node.last_modified = now;
		self.bump();
		Ok(())
	}

	/// Flips the expansion flag and returns the new state.
	pub fn toggle_expanded(&mut self, id: &NodeId) -> MapResult<bool> {
		let expanded = !self.get(id)?.expanded;
		self.set_expanded(id, expanded)?;
		Ok(expanded)
	}

	pub fn set_expanded(&mut self, id: &NodeId, expanded: bool) -> MapResult<()> {
		let now = self.env.now_ms();
		let node = self.get_mut(id)?;
		if node.expanded != expanded {
			node.expanded = expanded;
			node.last_modified = now;
			self.bump();
		}
		Ok(())
	}

	/// Moves a node, keeping it inside the canvas margin. Returns the position
	/// actually applied.
	pub fn move_node(&mut self, id: &NodeId, position: Position) -> MapResult<Position> {
		let position = position.clamped(self.config.position_margin);
		let now = self.env.now_ms();
		let node = self.get_mut(id)?;
		node.position = position;
		node.last_modified = now;
		self.bump();
		Ok(position)
	}

	pub fn set_tags<I, S>(&mut self, id: &NodeId, tags: I) -> MapResult<()>
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		let now = self.env.now_ms();
		let node = self.get_mut(id)?;
		node.tags = tags
			.into_iter()
			.map(|t| t.into().trim().to_lowercase())
			.filter(|t| !t.is_empty())
			.collect();
		node.last_modified = now;
		self.bump();
		Ok(())
	}

	/// Registers a cluster overlay; member ids that do not exist are dropped
	/// and live members are tagged with the cluster, leaving any cluster they
	/// were in before.
	pub fn add_cluster(&mut self, mut cluster: Cluster) {
		cluster.node_ids.retain(|id| self.nodes.contains_key(id));
		for other in &mut self.clusters {
			other.node_ids.retain(|id| !cluster.node_ids.contains(id));
		}
		for id in &cluster.node_ids {
			if let Some(node) = self.nodes.get_mut(id) {
				node.cluster = Some(cluster.id.clone());
			}
		}
		self.clusters.retain(|c| c.id != cluster.id);
		self.clusters.push(cluster);
		self.bump();
	}

	/// Returns false when no cluster has that id.
	pub fn set_cluster_visible(&mut self, id: &ClusterId, visible: bool) -> bool {
		let Some(cluster) = self.clusters.iter_mut().find(|c| &c.id == id) else {
			return false;
		};
		cluster.visible = visible;
		self.bump();
		true
	}

	pub fn offline_nodes(&self) -> Vec<NodeId> {
		self.nodes()
			.filter(|n| n.offline_created)
			.map(|n| n.id.clone())
			.collect()
	}

	/// Clears the offline flag of a node once it has been laid out online.
	pub fn mark_synced(&mut self, id: &NodeId, position: Position) -> MapResult<()> {
		let position = position.clamped(self.config.position_margin);
		let now = self.env.now_ms();
		let node = self.get_mut(id)?;
		node.position = position;
		node.offline_created = false;
		node.ai_suggested = true;
		node.last_modified = now;
		self.bump();
		Ok(())
	}

	/// Verifies the tree, link and cluster invariants.
	pub fn check_invariants(&self) -> MapResult<()> {
		let fail = |msg: String| Err(MapError::InvalidSnapshot(msg));
		let Some(root) = self.nodes.get(&NodeId::root()) else {
			return fail("missing root node".into());
		};
		if root.parent.is_some() || root.level != 0 {
			return fail("root must have no parent and level 0".into());
		}
		if self.order.len() != self.nodes.len() {
			return fail("node order out of sync".into());
		}

		for node in self.nodes.values() {
			if let Some(parent_id) = &node.parent {
				let Some(parent) = self.nodes.get(parent_id) else {
					return fail(format!("{} names missing parent {parent_id}", node.id));
				};
				if parent.children.iter().filter(|c| *c == &node.id).count() != 1 {
					return fail(format!("{parent_id} does not list {} exactly once", node.id));
				}
				if node.level != parent.level + 1 {
					return fail(format!("{} has level {}, expected {}", node.id, node.level, parent.level + 1));
				}
			} else if !node.id.is_root() {
				return fail(format!("{} has no parent", node.id));
			}
			for child in &node.children {
				let ok = self
					.nodes
					.get(child)
					.is_some_and(|c| c.parent.as_ref() == Some(&node.id));
				if !ok {
					return fail(format!("{} lists {child} which does not name it as parent", node.id));
				}
			}
		}

		// Every node must hang off the root; with consistent back-references
		// this also rules out cycles.
		let mut seen = HashSet::new();
		let mut stack = vec![&root.id];
		while let Some(id) = stack.pop() {
			if !seen.insert(id) {
				return fail(format!("cycle through {id}"));
			}
			stack.extend(self.nodes[id].children.iter());
		}
		if seen.len() != self.nodes.len() {
			return fail("nodes unreachable from root".into());
		}

		for (i, link) in self.links.iter().enumerate() {
			if link.kind == EdgeKind::Hierarchy {
				return fail(format!("stored hierarchy link {} -> {}", link.from, link.to));
			}
			if link.from == link.to {
				return fail(format!("self link on {}", link.from));
			}
			if !self.nodes.contains_key(&link.from) || !self.nodes.contains_key(&link.to) {
				return fail(format!("dangling link {} -> {}", link.from, link.to));
			}
			if self.is_parent_of(&link.from, &link.to) || self.is_parent_of(&link.to, &link.from) {
				return fail(format!("link {} -> {} duplicates the tree", link.from, link.to));
			}
			if self.links[..i].iter().any(|e| e.joins(&link.from, &link.to)) {
				return fail(format!("duplicate link {} -> {}", link.from, link.to));
			}
		}

		for cluster in &self.clusters {
			if let Some(id) = cluster.node_ids.iter().find(|id| !self.nodes.contains_key(id)) {
				return fail(format!("cluster {} references missing {id}", cluster.id.0));
			}
		}
		Ok(())
	}
}
