use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of the root node. The root is created with every store and can
/// never be deleted, split or merged.
pub const ROOT_ID: &str = "root";

/// Stable identifier of a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

impl NodeId {
	pub fn new(id: impl Into<String>) -> Self {
		Self(id.into())
	}

	pub fn root() -> Self {
		Self(ROOT_ID.into())
	}

	pub fn is_root(&self) -> bool {
		self.0 == ROOT_ID
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for NodeId {
	fn from(value: &str) -> Self {
		Self(value.into())
	}
}

/// Identifier of a cluster overlay.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClusterId(pub String);

impl From<&str> for ClusterId {
	fn from(value: &str) -> Self {
		Self(value.into())
	}
}

/// A point in canvas percent space: `(0, 0)` is the top-left corner and
/// `(100, 100)` the bottom-right one.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f64,
	pub y: f64,
}

impl Position {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	/// Clamps both axes into `[margin, 100 - margin]`.
	pub fn clamped(self, margin: f64) -> Self {
		let (lo, hi) = (margin, 100.0 - margin);
		Self {
			x: self.x.clamp(lo, hi),
			y: self.y.clamp(lo, hi),
		}
	}

	pub fn centroid<'a>(points: impl IntoIterator<Item = &'a Position>) -> Option<Self> {
		let (mut sx, mut sy, mut n) = (0.0, 0.0, 0usize);
		for p in points {
			sx += p.x;
			sy += p.y;
			n += 1;
		}
		(n > 0).then(|| Self::new(sx / n as f64, sy / n as f64))
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ContentBlock {
	Text { content: String },
	Image { src: String, alt: String },
	ArticleThumbnail { src: String, alt: String },
}

impl ContentBlock {
	pub fn text(content: impl Into<String>) -> Self {
		Self::Text {
			content: content.into(),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
	#[default]
	Simple,
	Rich,
}

/// A single idea box of the map.
///
/// `parent` and `children` are only ever changed through the store, which
/// keeps them mirrored: a node lists a child iff that child names it as
/// parent.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
	pub id: NodeId,
	pub title: String,
	pub position: Position,
	pub level: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub parent: Option<NodeId>,
	#[serde(default)]
	pub children: Vec<NodeId>,
	#[serde(default = "default_true")]
	pub expanded: bool,
	#[serde(default)]
	pub tags: BTreeSet<String>,
	#[serde(default)]
	pub last_modified: u64,
	#[serde(default)]
	pub relevance: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub cluster: Option<ClusterId>,
	#[serde(default)]
	pub content: Vec<ContentBlock>,
	#[serde(default)]
	pub kind: NodeKind,
	#[serde(default)]
	pub ai_suggested: bool,
	#[serde(default)]
	pub offline_created: bool,
}

fn default_true() -> bool {
	true
}

impl Node {
	/// A fresh node with one text block carrying its title.
	pub fn new(id: NodeId, title: impl Into<String>, position: Position) -> Self {
		let title = title.into();
		Self {
			id,
			content: vec![ContentBlock::text(title.clone())],
			title,
			position,
			level: 0,
			parent: None,
			children: Vec::new(),
			expanded: true,
			tags: BTreeSet::new(),
			last_modified: 0,
			relevance: 0.5,
			cluster: None,
			kind: NodeKind::Simple,
			ai_suggested: false,
			offline_created: false,
		}
	}

	pub fn with_tags<I, S>(mut self, tags: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		self.tags = tags.into_iter().map(Into::into).collect();
		self
	}

	pub fn has_children(&self) -> bool {
		!self.children.is_empty()
	}

	pub fn word_count(&self) -> usize {
		self.title.split_whitespace().count()
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EdgeKind {
	Hierarchy,
	Association,
	Dependency,
	Similarity,
}

impl EdgeKind {
	pub fn label(self) -> &'static str {
		match self {
			EdgeKind::Hierarchy => "hierarchy",
			EdgeKind::Association => "association",
			EdgeKind::Dependency => "dependency",
			EdgeKind::Similarity => "similarity",
		}
	}
}

/// A typed relation between two nodes.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
	pub from: NodeId,
	pub to: NodeId,
	pub kind: EdgeKind,
	pub strength: f64,
	#[serde(default)]
	pub animated: bool,
}

impl Edge {
	pub fn new(from: NodeId, to: NodeId, kind: EdgeKind, strength: f64) -> Self {
		Self {
			from,
			to,
			kind,
			strength: strength.clamp(0.0, 1.0),
			animated: false,
		}
	}

	pub fn animated(mut self) -> Self {
		self.animated = true;
		self
	}

	pub fn touches(&self, id: &NodeId) -> bool {
		&self.from == id || &self.to == id
	}

	/// True when the edge joins `a` and `b`, in either direction.
	pub fn joins(&self, a: &NodeId, b: &NodeId) -> bool {
		(&self.from == a && &self.to == b) || (&self.from == b && &self.to == a)
	}
}

/// Presentational grouping of nodes; it owns nothing.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
	pub id: ClusterId,
	pub name: String,
	pub color: String,
	#[serde(default)]
	pub node_ids: Vec<NodeId>,
	pub position: Position,
	#[serde(default = "default_true")]
	pub visible: bool,
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn position_clamps_into_margin() {
		let p = Position::new(-4.0, 130.0).clamped(5.0);
		assert_eq!(p, Position::new(5.0, 95.0));
	}

	#[test]
	fn centroid_of_nothing_is_none() {
		assert_eq!(Position::centroid(&[] as &[Position]), None);
		let pts = [Position::new(0.0, 10.0), Position::new(20.0, 30.0)];
		assert_eq!(Position::centroid(&pts), Some(Position::new(10.0, 20.0)));
	}

	#[test]
	fn edge_strength_is_clamped() {
		let e = Edge::new("a".into(), "b".into(), EdgeKind::Association, 1.7);
		assert_eq!(e.strength, 1.0);
		assert!(e.joins(&"b".into(), &"a".into()));
	}

	#[test]
	fn node_json_uses_defaults_for_missing_fields() {
		let node: Node =
			serde_json::from_str(r#"{"id":"n1","title":"Idea","position":{"x":1.0,"y":2.0},"level":1}"#)
				.unwrap();
		assert!(node.expanded);
		assert!(node.children.is_empty());
		assert_eq!(node.kind, NodeKind::Simple);
	}
}
