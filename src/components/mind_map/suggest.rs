use super::store::GraphStore;
use super::types::NodeId;

/// Advisory edit proposed for a node.
#[derive(Clone, Debug, PartialEq)]
pub enum Suggestion {
	/// Link to `target`, which shares `shared_tags` with the subject.
	Connect { target: NodeId, shared_tags: Vec<String> },
	/// The node looks like it holds more than one idea.
	Split { reason: String },
}

impl Suggestion {
	pub fn describe(&self) -> String {
		match self {
			Suggestion::Connect { target, shared_tags } => {
				format!("Connect to {target} (similar tags: {})", shared_tags.join(", "))
			}
			Suggestion::Split { reason } => format!("Split: {reason}"),
		}
	}
}

/// Connection suggestions first, then a split suggestion, capped at the
/// configured limit. Never mutates the store.
pub fn suggest(store: &GraphStore, id: &NodeId) -> Vec<Suggestion> {
	let Some(node) = store.node(id) else {
		return Vec::new();
	};
	let config = store.config();
	let mut out: Vec<Suggestion> = store
		.nodes()
		.filter(|other| &other.id != id && !store.is_connected(id, &other.id))
		.filter_map(|other| {
			let shared: Vec<String> = node.tags.intersection(&other.tags).cloned().collect();
			(!shared.is_empty()).then(|| Suggestion::Connect {
				target: other.id.clone(),
				shared_tags: shared,
			})
		})
		.collect();

	if node.word_count() > config.split_word_threshold || node.content.len() > config.content_block_threshold {
		out.push(Suggestion::Split {
			reason: "This node contains multiple concepts that could be separated".into(),
		});
	}
	out.truncate(config.suggestion_limit);
	out
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::config::MapConfig;
	use crate::components::mind_map::env::Environment;
	use crate::components::mind_map::types::EdgeKind;

	fn store() -> GraphStore {
		GraphStore::new("Root", Environment::default(), MapConfig::default())
	}

	fn shared(s: &[Suggestion]) -> Vec<(String, Vec<String>)> {
		s.iter()
			.filter_map(|s| match s {
				Suggestion::Connect { target, shared_tags } => Some((target.0.clone(), shared_tags.clone())),
				Suggestion::Split { .. } => None,
			})
			.collect()
	}

	#[test]
	fn proposes_unconnected_nodes_sharing_tags() {
		let mut s = store();
		let root = NodeId::root();
		let a = s.add_child(&root, "A").unwrap();
		let b = s.add_child(&root, "B").unwrap();
		let c = s.add_child(&root, "C").unwrap();
		let d = s.add_child(&root, "D").unwrap();
		s.set_tags(&a, ["mobile", "design"]).unwrap();
		s.set_tags(&b, ["design", "mobile", "ux"]).unwrap();
		s.set_tags(&c, ["finance"]).unwrap();
		s.set_tags(&d, ["mobile"]).unwrap();
		s.connect(&a, &d, EdgeKind::Association).unwrap();

		let out = suggest(&s, &a);
		assert_eq!(shared(&out), [(b.0.clone(), vec!["design".to_string(), "mobile".to_string()])]);
		assert!(out[0].describe().contains("design, mobile"));
	}

	#[test]
	fn split_follows_connections_and_limit_applies() {
		let mut s = store();
		let root = NodeId::root();
		let subject = s.add_child(&root, "One two three four five").unwrap();
		s.set_tags(&subject, ["t"]).unwrap();
		for i in 0..2 {
			let other = s.add_child(&root, &format!("Other {i}")).unwrap();
			s.set_tags(&other, ["t"]).unwrap();
		}
		let out = suggest(&s, &subject);
		assert_eq!(out.len(), 3);
		assert!(matches!(out[2], Suggestion::Split { .. }));

		let extra = s.add_child(&root, "Other 2").unwrap();
		s.set_tags(&extra, ["t"]).unwrap();
		let out = suggest(&s, &subject);
		assert_eq!(out.len(), 3);
		assert!(out.iter().all(|s| matches!(s, Suggestion::Connect { .. })));
	}

	#[test]
	fn plain_leaf_gets_nothing_and_store_is_untouched() {
		let mut s = store();
		let a = s.add_child(&NodeId::root(), "Short").unwrap();
		assert!(suggest(&s, &a).is_empty());
		let rev = s.revision();
		assert!(suggest(&s, &"ghost".into()).is_empty());
		assert_eq!(s.revision(), rev);
	}
}
