use thiserror::Error;

use super::types::NodeId;

/// Reasons a map operation was rejected. A rejected operation leaves the
/// store untouched.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MapError {
	#[error("NODE_NOT_FOUND: {0}")]
	NodeNotFound(NodeId),
	#[error("ROOT_PROTECTED: the root node cannot be removed or replaced")]
	RootProtected,
	#[error("EMPTY_TITLE: node titles cannot be blank")]
	EmptyTitle,
	#[error("TITLE_TOO_SHORT: `{0}` has fewer than two words")]
	TitleTooShort(String),
	#[error("NOT_ENOUGH_NODES: merging needs at least two distinct nodes, got {0}")]
	NotEnoughNodes(usize),
	#[error("SELF_LINK: {0} cannot be linked to itself")]
	SelfLink(NodeId),
	#[error("HIERARCHY_LINK: hierarchy edges follow the node tree and cannot be added directly")]
	HierarchyLink,
	#[error("INVALID_SNAPSHOT: {0}")]
	InvalidSnapshot(String),
	#[error("JSON: {0}")]
	Json(String),
}

impl From<serde_json::Error> for MapError {
	fn from(value: serde_json::Error) -> Self {
		Self::Json(value.to_string())
	}
}

pub type MapResult<T> = Result<T, MapError>;
