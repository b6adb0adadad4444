use log::{debug, warn};

use super::error::MapResult;
use super::router::visible_nodes;
use super::store::GraphStore;
use super::types::{EdgeKind, NodeId, Position};
use super::viewport::{Point, Viewport};

/// Half extents of a node box in world pixels, shared with the renderer.
pub const NODE_HALF_WIDTH: f64 = 70.0;
pub const NODE_HALF_HEIGHT: f64 = 22.0;

/// Pixel size of the drawing surface; node positions are percentages of it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Canvas {
	pub width: f64,
	pub height: f64,
}

impl Canvas {
	pub fn new(width: f64, height: f64) -> Self {
		Self {
			width: width.max(1.0),
			height: height.max(1.0),
		}
	}

	pub fn to_world(&self, p: Position) -> Point {
		Point::new(p.x / 100.0 * self.width, p.y / 100.0 * self.height)
	}

	pub fn to_percent(&self, p: Point) -> Position {
		Position::new(p.x / self.width * 100.0, p.y / self.height * 100.0)
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
	pub ctrl: bool,
	pub meta: bool,
}

impl Modifiers {
	pub fn multi_select(self) -> bool {
		self.ctrl || self.meta
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
	ZoomIn,
	ZoomOut,
	ResetView,
	Up,
	Down,
	Left,
	Right,
	Escape,
	Delete,
	Other,
}

impl Key {
	/// Maps a DOM `KeyboardEvent.key` value.
	pub fn from_dom(key: &str) -> Self {
		match key {
			"+" | "=" => Key::ZoomIn,
			"-" | "_" => Key::ZoomOut,
			"0" => Key::ResetView,
			"ArrowUp" => Key::Up,
			"ArrowDown" => Key::Down,
			"ArrowLeft" => Key::Left,
			"ArrowRight" => Key::Right,
			"Escape" => Key::Escape,
			"Delete" | "Backspace" => Key::Delete,
			_ => Key::Other,
		}
	}
}

/// Graph operations offered from a node's context menu.
#[derive(Clone, Debug, PartialEq)]
pub enum ContextAction {
	AddChild { parent: NodeId, title: String },
	Split(NodeId),
	MergeSelection,
	Connect { from: NodeId, to: NodeId, kind: EdgeKind },
	Delete(NodeId),
	Rename { id: NodeId, title: String },
	ToggleExpanded(NodeId),
	SetTags { id: NodeId, tags: Vec<String> },
}

/// What an input changed, so the host knows what to refresh.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
	Ignored,
	Viewport,
	Selection,
	Graph,
}

#[derive(Clone, Debug)]
struct Press {
	node: Option<NodeId>,
	start: Point,
	/// World offset from the node centre to the pointer at press time.
	grab: Point,
	moved: bool,
	modifiers: Modifiers,
}

/// Selection, focus and in-flight pointer gesture of one canvas.
#[derive(Clone, Debug, Default)]
pub struct Interaction {
	selection: Vec<NodeId>,
	focused: Option<NodeId>,
	press: Option<Press>,
	click_slop: f64,
}

impl Interaction {
	pub fn new(click_slop: f64) -> Self {
		Self {
			click_slop,
			..Self::default()
		}
	}

	pub fn selection(&self) -> &[NodeId] {
		&self.selection
	}

	pub fn is_selected(&self, id: &NodeId) -> bool {
		self.selection.contains(id)
	}

	pub fn focused(&self) -> Option<&NodeId> {
		self.focused.as_ref()
	}

	pub fn focus(&mut self, id: Option<NodeId>) {
		self.focused = id;
	}

	pub fn dragged_node(&self) -> Option<&NodeId> {
		self.press.as_ref().filter(|p| p.moved).and_then(|p| p.node.as_ref())
	}

	pub fn clear_selection(&mut self) -> Effect {
		if self.selection.is_empty() {
			return Effect::Ignored;
		}
		self.selection.clear();
		Effect::Selection
	}

	pub fn toggle_selected(&mut self, id: &NodeId) {
		if let Some(i) = self.selection.iter().position(|s| s == id) {
			self.selection.remove(i);
		} else {
			self.selection.push(id.clone());
		}
	}

	/// Topmost visible node under a screen point.
	pub fn node_at(&self, store: &GraphStore, viewport: &Viewport, canvas: &Canvas, pointer: Point) -> Option<NodeId> {
		let world = viewport.screen_to_world(pointer);
		visible_nodes(store)
			.into_iter()
			.rev()
			.find(|node| {
				let centre = canvas.to_world(node.position);
				(world.x - centre.x).abs() <= NODE_HALF_WIDTH && (world.y - centre.y).abs() <= NODE_HALF_HEIGHT
			})
			.map(|node| node.id.clone())
	}

	pub fn pointer_down(
		&mut self,
		store: &GraphStore,
		viewport: &mut Viewport,
		canvas: &Canvas,
		pointer: Point,
		modifiers: Modifiers,
	) -> Effect {
		let hit = self.node_at(store, viewport, canvas, pointer);
		let grab = match hit.as_ref().and_then(|id| store.node(id)) {
			Some(node) => {
				let world = viewport.screen_to_world(pointer);
				let centre = canvas.to_world(node.position);
				Point::new(world.x - centre.x, world.y - centre.y)
			}
			None => Point::default(),
		};
		let effect = if hit.is_some() {
			Effect::Ignored
		} else {
			viewport.begin_drag(pointer);
			Effect::Viewport
		};
		self.press = Some(Press {
			node: hit,
			start: pointer,
			grab,
			moved: false,
			modifiers,
		});
		effect
	}

	pub fn pointer_move(
		&mut self,
		store: &mut GraphStore,
		viewport: &mut Viewport,
		canvas: &Canvas,
		pointer: Point,
	) -> Effect {
		let slop = self.click_slop;
		let Some(press) = self.press.as_mut() else {
			return Effect::Ignored;
		};
		if !press.moved && press.start.distance(pointer) < slop {
			return Effect::Ignored;
		}
		press.moved = true;
		match press.node.clone() {
			Some(id) => {
				let world = viewport.screen_to_world(pointer);
				let centre = Point::new(world.x - press.grab.x, world.y - press.grab.y);
				match store.move_node(&id, canvas.to_percent(centre)) {
					Ok(_) => Effect::Graph,
					Err(err) => {
						warn!("drag of {id} dropped: {err}");
						self.press = None;
						Effect::Ignored
					}
				}
			}
			None if viewport.drag_to(pointer) => Effect::Viewport,
			None => Effect::Ignored,
		}
	}

	pub fn pointer_up(&mut self, store: &mut GraphStore, viewport: &mut Viewport) -> Effect {
		viewport.end_drag();
		let Some(press) = self.press.take() else {
			return Effect::Ignored;
		};
		match (press.node, press.moved) {
			(Some(id), false) => self.click(store, &id, press.modifiers),
			(Some(_), true) => Effect::Graph,
			(None, true) => Effect::Viewport,
			(None, false) => {
				if press.modifiers.multi_select() {
					Effect::Ignored
				} else {
					self.focused = None;
					Effect::Selection
				}
			}
		}
	}

	pub fn pointer_leave(&mut self, viewport: &mut Viewport) -> Effect {
		let was_active = self.press.take().is_some() || viewport.is_dragging();
		viewport.end_drag();
		if was_active { Effect::Viewport } else { Effect::Ignored }
	}

	/// A click on a node: with the multi-select modifier it toggles selection
	/// membership, otherwise it focuses the node and toggles its expansion
	/// when it has children.
	pub fn click(&mut self, store: &mut GraphStore, id: &NodeId, modifiers: Modifiers) -> Effect {
		let Some(node) = store.node(id) else {
			return Effect::Ignored;
		};
		if modifiers.multi_select() {
			self.toggle_selected(id);
			return Effect::Selection;
		}
		let has_children = node.has_children();
		self.focused = Some(id.clone());
		if has_children {
			match store.toggle_expanded(id) {
				Ok(expanded) => debug!("{id} expanded={expanded}"),
				Err(err) => warn!("toggle of {id} failed: {err}"),
			}
			Effect::Graph
		} else {
			Effect::Selection
		}
	}

	pub fn wheel(&mut self, viewport: &mut Viewport, pointer: Point, delta_y: f64, step: f64) -> Effect {
		let factor = if delta_y > 0.0 { 1.0 / step } else { step };
		viewport.zoom_at(pointer, factor);
		Effect::Viewport
	}

	pub fn key(&mut self, store: &mut GraphStore, viewport: &mut Viewport, key: Key) -> Effect {
		let pan = store.config().pan_step;
		match key {
			Key::ZoomIn => viewport.zoom_in(),
			Key::ZoomOut => viewport.zoom_out(),
			Key::ResetView => viewport.reset(),
			Key::Up => viewport.pan_by(0.0, pan),
			Key::Down => viewport.pan_by(0.0, -pan),
			Key::Left => viewport.pan_by(pan, 0.0),
			Key::Right => viewport.pan_by(-pan, 0.0),
			Key::Escape => return self.clear_selection(),
			Key::Delete => return self.delete_selection(store),
			Key::Other => return Effect::Ignored,
		}
		Effect::Viewport
	}

	fn delete_selection(&mut self, store: &mut GraphStore) -> Effect {
		let targets: Vec<NodeId> = if self.selection.is_empty() {
			self.focused.iter().cloned().collect()
		} else {
			self.selection.clone()
		};
		let mut changed = false;
		for id in targets.iter().filter(|id| !id.is_root()) {
			changed |= self.report(store.delete(id).map(|_| ()), "delete");
		}
		self.prune(store);
		if changed { Effect::Graph } else { Effect::Ignored }
	}

	/// Runs a context-menu action. Rejected actions are logged and leave the
	/// map as it was.
	pub fn apply(&mut self, store: &mut GraphStore, action: ContextAction) -> Effect {
		let ok = match action {
			ContextAction::AddChild { parent, title } => {
				let result = store.add_child(&parent, &title);
				if let Ok(id) = &result {
					self.focused = Some(id.clone());
				}
				self.report(result.map(|_| ()), "add child")
			}
			ContextAction::Split(id) => {
				let result = store.split(&id);
				if let Ok((first, _)) = &result {
					self.focused = Some(first.clone());
				}
				self.report(result.map(|_| ()), "split")
			}
			ContextAction::MergeSelection => {
				let result = store.merge(&self.selection);
				if let Ok(id) = &result {
					self.selection.clear();
					self.focused = Some(id.clone());
				}
				self.report(result.map(|_| ()), "merge")
			}
			ContextAction::Connect { from, to, kind } => match store.connect(&from, &to, kind) {
				Ok(added) => added,
				Err(err) => {
					warn!("connect rejected: {err}");
					false
				}
			},
			ContextAction::Delete(id) => self.report(store.delete(&id).map(|_| ()), "delete"),
			ContextAction::Rename { id, title } => self.report(store.rename(&id, &title), "rename"),
			ContextAction::ToggleExpanded(id) => {
				self.report(store.toggle_expanded(&id).map(|_| ()), "toggle")
			}
			ContextAction::SetTags { id, tags } => self.report(store.set_tags(&id, tags), "tag"),
		};
		self.prune(store);
		if ok { Effect::Graph } else { Effect::Ignored }
	}

	fn report(&self, result: MapResult<()>, what: &str) -> bool {
		match result {
			Ok(()) => true,
			Err(err) => {
				warn!("{what} rejected: {err}");
				false
			}
		}
	}

	/// Drops selection and focus entries whose node no longer exists.
	fn prune(&mut self, store: &GraphStore) {
		self.selection.retain(|id| store.contains(id));
		if self.focused.as_ref().is_some_and(|id| !store.contains(id)) {
			self.focused = None;
		}
	}
}
