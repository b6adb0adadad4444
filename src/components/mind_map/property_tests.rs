#![cfg(test)]
use std::collections::BTreeSet;

use proptest::prelude::*;

use crate::components::mind_map::config::MapConfig;
use crate::components::mind_map::env::Environment;
use crate::components::mind_map::store::GraphStore;
use crate::components::mind_map::types::{EdgeKind, NodeId, Position};
use crate::components::mind_map::viewport::{Point, Viewport};

// ---------------------------------------------------------------------------
// Generators
// ---------------------------------------------------------------------------

#[derive(Clone, Debug)]
enum Op {
	AddChild(usize, String),
	Split(usize),
	Merge(usize, usize),
	Connect(usize, usize, EdgeKind),
	Delete(usize),
	Move(usize, f64, f64),
	Toggle(usize),
}

fn edge_kind() -> impl Strategy<Value = EdgeKind> {
	prop_oneof![
		Just(EdgeKind::Association),
		Just(EdgeKind::Dependency),
		Just(EdgeKind::Similarity),
	]
}

fn title() -> impl Strategy<Value = String> {
	proptest::collection::vec("[a-z]{1,8}", 1..6).prop_map(|words| words.join(" "))
}

fn op() -> impl Strategy<Value = Op> {
	prop_oneof![
		3 => (any::<usize>(), title()).prop_map(|(i, t)| Op::AddChild(i, t)),
		1 => any::<usize>().prop_map(Op::Split),
		1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Merge(a, b)),
		2 => (any::<usize>(), any::<usize>(), edge_kind()).prop_map(|(a, b, k)| Op::Connect(a, b, k)),
		1 => any::<usize>().prop_map(Op::Delete),
		1 => (any::<usize>(), -50.0..150.0f64, -50.0..150.0f64).prop_map(|(i, x, y)| Op::Move(i, x, y)),
		1 => any::<usize>().prop_map(Op::Toggle),
	]
}

fn pick(store: &GraphStore, i: usize) -> NodeId {
	let ids: Vec<&NodeId> = store.nodes().map(|n| &n.id).collect();
	ids[i % ids.len()].clone()
}

/// Applies `ops`, ignoring rejected ones.
fn build(ops: &[Op]) -> GraphStore {
	let mut store = GraphStore::new("Root", Environment::default(), MapConfig::default());
	for op in ops {
		let _ = match op {
			Op::AddChild(i, t) => store.add_child(&pick(&store, *i), t).map(|_| ()),
			Op::Split(i) => store.split(&pick(&store, *i)).map(|_| ()),
			Op::Merge(a, b) => {
				let ids = [pick(&store, *a), pick(&store, *b)];
				store.merge(&ids).map(|_| ())
			}
			Op::Connect(a, b, kind) => store.connect(&pick(&store, *a), &pick(&store, *b), *kind).map(|_| ()),
			Op::Delete(i) => store.delete(&pick(&store, *i)).map(|_| ()),
			Op::Move(i, x, y) => store.move_node(&pick(&store, *i), Position::new(*x, *y)).map(|_| ()),
			Op::Toggle(i) => store.toggle_expanded(&pick(&store, *i)).map(|_| ()),
		};
	}
	store
}

#[derive(Clone, Debug)]
enum ViewOp {
	ZoomIn,
	ZoomOut,
	ZoomAt(f64, f64, f64),
	Pan(f64, f64),
	Reset,
}

fn view_op() -> impl Strategy<Value = ViewOp> {
	prop_oneof![
		Just(ViewOp::ZoomIn),
		Just(ViewOp::ZoomOut),
		(0.0..2000.0f64, 0.0..2000.0f64, 0.01..100.0f64).prop_map(|(x, y, f)| ViewOp::ZoomAt(x, y, f)),
		(-500.0..500.0f64, -500.0..500.0f64).prop_map(|(dx, dy)| ViewOp::Pan(dx, dy)),
		Just(ViewOp::Reset),
	]
}

// ---------------------------------------------------------------------------
// Property Tests
// ---------------------------------------------------------------------------

proptest! {
	#[test]
	fn invariants_hold_after_any_edit_sequence(ops in proptest::collection::vec(op(), 0..40)) {
		let store = build(&ops);
		prop_assert!(store.check_invariants().is_ok(), "{:?}", store.check_invariants());
	}

	#[test]
	fn delete_removes_node_edges_and_parent_entry(
		ops in proptest::collection::vec(op(), 1..30),
		target in any::<usize>(),
	) {
		let mut store = build(&ops);
		let candidates: Vec<NodeId> = store.nodes().filter(|n| !n.id.is_root()).map(|n| n.id.clone()).collect();
		prop_assume!(!candidates.is_empty());
		let id = candidates[target % candidates.len()].clone();
		let parent = store.node(&id).and_then(|n| n.parent.clone()).unwrap();

		prop_assert!(store.delete(&id).is_ok());
		prop_assert!(!store.contains(&id));
		prop_assert!(store.edges().iter().all(|e| !e.touches(&id)));
		prop_assert!(!store.node(&parent).unwrap().children.contains(&id));
		prop_assert!(store.check_invariants().is_ok());
	}

	#[test]
	fn split_partitions_words_in_order(words in proptest::collection::vec("[a-z]{1,8}", 2..8)) {
		let mut store = GraphStore::new("Root", Environment::default(), MapConfig::default());
		let title = words.join(" ");
		let id = store.add_child(&NodeId::root(), &title).unwrap();
		let before = store.len();

		let (a, b) = store.split(&id).unwrap();
		let (ta, tb) = (store.node(&a).unwrap().title.clone(), store.node(&b).unwrap().title.clone());
		prop_assert!(!ta.is_empty() && !tb.is_empty());
		prop_assert_eq!(format!("{ta} {tb}"), title);
		prop_assert_eq!(store.len(), before + 1);
		prop_assert!(!store.contains(&id));
		prop_assert!(store.edges().iter().all(|e| !e.touches(&id)));
	}

	#[test]
	fn merge_unions_tags(
		left in proptest::collection::btree_set("[a-e]", 0..4),
		right in proptest::collection::btree_set("[a-e]", 0..4),
	) {
		let mut store = GraphStore::new("Root", Environment::default(), MapConfig::default());
		let a = store.add_child(&NodeId::root(), "Left").unwrap();
		let b = store.add_child(&NodeId::root(), "Right").unwrap();
		store.set_tags(&a, left.iter().cloned()).unwrap();
		store.set_tags(&b, right.iter().cloned()).unwrap();
		let before = store.len();

		let merged = store.merge(&[a, b]).unwrap();
		let expected: BTreeSet<String> = left.union(&right).cloned().collect();
		prop_assert_eq!(&store.node(&merged).unwrap().tags, &expected);
		prop_assert_eq!(store.len(), before - 1);
	}

	#[test]
	fn connect_is_idempotent(
		ops in proptest::collection::vec(op(), 1..30),
		a in any::<usize>(),
		b in any::<usize>(),
		kind in edge_kind(),
	) {
		let mut store = build(&ops);
		let (from, to) = (pick(&store, a), pick(&store, b));
		prop_assume!(from != to);

		prop_assert!(store.connect(&from, &to, kind).is_ok());
		let links = store.links().len();
		prop_assert_eq!(store.connect(&from, &to, kind), Ok(false));
		prop_assert_eq!(store.connect(&to, &from, kind), Ok(false));
		prop_assert_eq!(store.links().len(), links);
	}

	#[test]
	fn zoom_stays_within_bounds(ops in proptest::collection::vec(view_op(), 0..60)) {
		let config = MapConfig::default();
		let mut viewport = Viewport::new(&config);
		for op in ops {
			match op {
				ViewOp::ZoomIn => viewport.zoom_in(),
				ViewOp::ZoomOut => viewport.zoom_out(),
				ViewOp::ZoomAt(x, y, f) => viewport.zoom_at(Point::new(x, y), f),
				ViewOp::Pan(dx, dy) => viewport.pan_by(dx, dy),
				ViewOp::Reset => viewport.reset(),
			}
			prop_assert!(viewport.zoom() >= config.zoom_min);
			prop_assert!(viewport.zoom() <= config.zoom_max);
		}
	}
}
