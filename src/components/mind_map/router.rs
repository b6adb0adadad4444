use std::fmt::Write as _;

use super::store::{GraphStore, HIERARCHY_STRENGTH};
use super::types::{EdgeKind, Node, NodeId, Position};

/// Vertical gap between a node's anchor and the start of its outgoing line.
const PARENT_GAP: f64 = 5.0;
/// Height of the short elbow segment above a lone child.
const ELBOW_GAP: f64 = 5.0;
/// Lines stop this far above the child's anchor.
const CHILD_GAP: f64 = 3.0;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum PathCommand {
	MoveTo(Position),
	LineTo(Position),
	QuadTo { control: Position, to: Position },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PathRole {
	/// Parent to its only visible child.
	Elbow,
	/// Parent down to the bus shared by its children.
	Trunk,
	/// Horizontal line across the children of one parent.
	Bus,
	/// Bus down to one child.
	Drop,
	/// Non-hierarchy link.
	Curve,
}

/// A render-ready line in canvas percent space.
#[derive(Clone, Debug, PartialEq)]
pub struct RoutedPath {
	pub id: String,
	pub role: PathRole,
	pub kind: EdgeKind,
	pub strength: f64,
	pub animated: bool,
	pub from: NodeId,
	pub to: NodeId,
	pub commands: Vec<PathCommand>,
}

impl RoutedPath {
	/// SVG path data with x scaled by `sx` and y by `sy`, e.g. `M 50 20 L 50 32`
	/// at unit scale. Percent coordinates become pixels with `width / 100`.
	pub fn to_svg(&self, sx: f64, sy: f64) -> String {
		let mut out = String::new();
		for cmd in &self.commands {
			if !out.is_empty() {
				out.push(' ');
			}
			let _ = match cmd {
				PathCommand::MoveTo(p) => write!(out, "M {} {}", p.x * sx, p.y * sy),
				PathCommand::LineTo(p) => write!(out, "L {} {}", p.x * sx, p.y * sy),
				PathCommand::QuadTo { control, to } => write!(
					out,
					"Q {} {} {} {}",
					control.x * sx,
					control.y * sy,
					to.x * sx,
					to.y * sy
				),
			};
		}
		out
	}
}

/// Nodes reachable from the root without descending into collapsed nodes,
/// in depth-first child order. Collapsed nodes themselves stay visible.
pub fn visible_nodes(store: &GraphStore) -> Vec<&Node> {
	let mut out = Vec::new();
	let mut stack = vec![store.root()];
	while let Some(node) = stack.pop() {
		out.push(node);
		if node.expanded {
			stack.extend(node.children.iter().rev().filter_map(|c| store.node(c)));
		}
	}
	out
}

fn hierarchy_path(id: String, role: PathRole, from: &NodeId, to: &NodeId, commands: Vec<PathCommand>) -> RoutedPath {
	RoutedPath {
		id,
		role,
		kind: EdgeKind::Hierarchy,
		strength: HIERARCHY_STRENGTH,
		animated: false,
		from: from.clone(),
		to: to.clone(),
		commands,
	}
}

fn route_children(store: &GraphStore, parent: &Node, out: &mut Vec<RoutedPath>) {
	let children: Vec<&Node> = parent.children.iter().filter_map(|c| store.node(c)).collect();
	let p = parent.position;
	match children.as_slice() {
		[] => {}
		[child] => {
			let c = child.position;
			out.push(hierarchy_path(
				format!("{}-{}", parent.id, child.id),
				PathRole::Elbow,
				&parent.id,
				&child.id,
				vec![
					PathCommand::MoveTo(Position::new(p.x, p.y + PARENT_GAP)),
					PathCommand::LineTo(Position::new(p.x, c.y - ELBOW_GAP)),
					PathCommand::LineTo(Position::new(c.x, c.y - ELBOW_GAP)),
					PathCommand::LineTo(Position::new(c.x, c.y - CHILD_GAP)),
				],
			));
		}
		_ => {
			let bus_y = p.y + store.config().bus_offset;
			let leftmost = children
				.iter()
				.min_by(|a, b| a.position.x.total_cmp(&b.position.x))
				.map_or(&parent.id, |n| &n.id);
			let (lo, hi) = children
				.iter()
				.fold((p.x, p.x), |(lo, hi), n| (lo.min(n.position.x), hi.max(n.position.x)));
			out.push(hierarchy_path(
				format!("{}-trunk", parent.id),
				PathRole::Trunk,
				&parent.id,
				leftmost,
				vec![
					PathCommand::MoveTo(Position::new(p.x, p.y + PARENT_GAP)),
					PathCommand::LineTo(Position::new(p.x, bus_y)),
				],
			));
			out.push(hierarchy_path(
				format!("{}-bus", parent.id),
				PathRole::Bus,
				&parent.id,
				leftmost,
				vec![
					PathCommand::MoveTo(Position::new(lo, bus_y)),
					PathCommand::LineTo(Position::new(hi, bus_y)),
				],
			));
			for child in children {
				let c = child.position;
				out.push(hierarchy_path(
					format!("{}-{}-drop", parent.id, child.id),
					PathRole::Drop,
					&parent.id,
					&child.id,
					vec![
						PathCommand::MoveTo(Position::new(c.x, bus_y)),
						PathCommand::LineTo(Position::new(c.x, c.y - CHILD_GAP)),
					],
				));
			}
		}
	}
}

/// Control point of a link curve: the midpoint pushed along the upward
/// normal by `factor * |dx|`.
fn curve_control(from: Position, to: Position, factor: f64) -> Position {
	let mid = Position::new((from.x + to.x) / 2.0, (from.y + to.y) / 2.0);
	let (dx, dy) = (to.x - from.x, to.y - from.y);
	let len = dx.hypot(dy);
	if len < f64::EPSILON {
		return mid;
	}
	let (mut nx, mut ny) = (dy / len, -dx / len);
	if ny > 0.0 {
		(nx, ny) = (-nx, -ny);
	}
	let offset = factor * dx.abs();
	Position::new(mid.x + nx * offset, mid.y + ny * offset)
}

/// Routes every visible edge of the map.
pub fn route(store: &GraphStore) -> Vec<RoutedPath> {
	let visible = visible_nodes(store);
	let mut out = Vec::new();
	for node in &visible {
		if node.expanded {
			route_children(store, node, &mut out);
		}
	}

	let factor = store.config().curve_factor;
	let is_visible = |id: &NodeId| visible.iter().any(|n| &n.id == id);
	for link in store.links() {
		if !is_visible(&link.from) || !is_visible(&link.to) {
			continue;
		}
		let (Some(from), Some(to)) = (store.node(&link.from), store.node(&link.to)) else {
			continue;
		};
		out.push(RoutedPath {
			id: format!("{}-{}-curve", link.from, link.to),
			role: PathRole::Curve,
			kind: link.kind,
			strength: link.strength,
			animated: link.animated,
			from: link.from.clone(),
			to: link.to.clone(),
			commands: vec![
				PathCommand::MoveTo(from.position),
				PathCommand::QuadTo {
					control: curve_control(from.position, to.position, factor),
					to: to.position,
				},
			],
		});
	}
	out
}

/// Routes memoized on the store revision; any mutation (a drag, a collapse,
/// a new link) invalidates them.
#[derive(Debug, Default)]
pub struct RouteCache {
	revision: Option<u64>,
	paths: Vec<RoutedPath>,
}

impl RouteCache {
	pub fn paths(&mut self, store: &GraphStore) -> &[RoutedPath] {
		if self.revision != Some(store.revision()) {
			self.paths = route(store);
			self.revision = Some(store.revision());
		}
		&self.paths
	}
}
