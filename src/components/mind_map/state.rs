use log::{debug, info, warn};

use super::config::MapConfig;
use super::env::{Environment, SharedConnectivity, SystemClock};
use super::interaction::{Canvas, ContextAction, Effect, Interaction, Key, Modifiers};
use super::relax::sync_offline_nodes;
use super::router::{RouteCache, RoutedPath};
use super::snapshot::MapSnapshot;
use super::store::GraphStore;
use super::suggest::{Suggestion, suggest};
use super::types::{Cluster, ClusterId, EdgeKind, NodeId, Position};
use super::viewport::{Point, Viewport};

/// Commands issued by the toolbar and side panel.
#[derive(Clone, Debug, PartialEq)]
pub enum UiCommand {
	ZoomIn,
	ZoomOut,
	ResetView,
	ToggleClusters,
	/// Shows or hides one cluster overlay.
	ToggleCluster(ClusterId),
	/// Groups the selected nodes into a new named cluster.
	GroupSelection(String),
	ClearSelection,
	Sync,
	Export,
	/// Replaces the map with a JSON snapshot when it validates.
	Import(String),
	/// Links the focused node to every selected node.
	ConnectSelection(EdgeKind),
	Context(ContextAction),
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FocusView {
	pub id: NodeId,
	pub title: String,
	pub tags: Vec<String>,
	pub has_children: bool,
	pub expanded: bool,
	pub is_root: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClusterView {
	pub id: ClusterId,
	pub name: String,
	pub members: usize,
	pub visible: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SuggestionView {
	pub label: String,
	pub command: UiCommand,
}

/// Plain-data view of the editor for the reactive side panel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PanelState {
	pub zoom_percent: u32,
	pub node_count: usize,
	pub selection: Vec<(NodeId, String)>,
	pub focused: Option<FocusView>,
	pub suggestions: Vec<SuggestionView>,
	pub online: bool,
	pub offline_nodes: usize,
	pub show_clusters: bool,
	pub clusters: Vec<ClusterView>,
	/// A node or the viewport is being dragged.
	pub dragging: bool,
	pub export: Option<String>,
}

const CLUSTER_COLORS: &[&str] = &[
	"rgba(59, 130, 246, 0.1)",
	"rgba(16, 185, 129, 0.1)",
	"rgba(245, 158, 11, 0.1)",
	"rgba(168, 85, 247, 0.1)",
];

pub struct MindMapState {
	pub store: GraphStore,
	pub viewport: Viewport,
	pub interaction: Interaction,
	pub canvas: Canvas,
	pub routes: RouteCache,
	pub connectivity: SharedConnectivity,
	pub show_clusters: bool,
	pub flow_time: f64,
	export: Option<String>,
}

impl MindMapState {
	/// Restores `seed` into a fresh store; an invalid seed falls back to an
	/// empty map so the canvas still comes up.
	pub fn new(seed: MapSnapshot, config: MapConfig, width: f64, height: f64, online: bool) -> Self {
		let connectivity = SharedConnectivity::new(online);
		let env = Environment::new(SystemClock, connectivity.clone());
		let store = match seed.restore(env.clone(), config.clone()) {
			Ok(store) => store,
			Err(err) => {
				warn!("seed map rejected, starting empty: {err}");
				GraphStore::new("Mind Map", env, config.clone())
			}
		};
		Self {
			viewport: Viewport::new(&config),
			interaction: Interaction::new(config.click_slop),
			canvas: Canvas::new(width, height),
			routes: RouteCache::default(),
			store,
			connectivity,
			show_clusters: true,
			flow_time: 0.0,
			export: None,
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.canvas = Canvas::new(width, height);
	}

	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;
	}

	pub fn paths(&mut self) -> &[RoutedPath] {
		self.routes.paths(&self.store)
	}

	pub fn pointer_down(&mut self, x: f64, y: f64, modifiers: Modifiers) -> Effect {
		self.interaction
			.pointer_down(&self.store, &mut self.viewport, &self.canvas, Point::new(x, y), modifiers)
	}

	pub fn pointer_move(&mut self, x: f64, y: f64) -> Effect {
		self.interaction
			.pointer_move(&mut self.store, &mut self.viewport, &self.canvas, Point::new(x, y))
	}

	pub fn pointer_up(&mut self) -> Effect {
		self.interaction.pointer_up(&mut self.store, &mut self.viewport)
	}

	pub fn pointer_leave(&mut self) -> Effect {
		self.interaction.pointer_leave(&mut self.viewport)
	}

	pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) -> Effect {
		let step = self.store.config().wheel_step;
		self.interaction
			.wheel(&mut self.viewport, Point::new(x, y), delta_y, step)
	}

	pub fn key(&mut self, key: &str) -> Effect {
		self.interaction
			.key(&mut self.store, &mut self.viewport, Key::from_dom(key))
	}

	/// Focuses the node under a right click, if any.
	pub fn context_target(&mut self, x: f64, y: f64) -> Effect {
		let hit = self
			.interaction
			.node_at(&self.store, &self.viewport, &self.canvas, Point::new(x, y));
		match hit {
			Some(id) => {
				self.interaction.focus(Some(id));
				Effect::Selection
			}
			None => Effect::Ignored,
		}
	}

	pub fn set_online(&mut self, online: bool) {
		self.connectivity.set_online(online);
	}

	pub fn run(&mut self, command: UiCommand) -> Effect {
		debug!("ui command {command:?}");
		match command {
			UiCommand::ZoomIn => {
				self.viewport.zoom_in();
				Effect::Viewport
			}
			UiCommand::ZoomOut => {
				self.viewport.zoom_out();
				Effect::Viewport
			}
			UiCommand::ResetView => {
				self.viewport.reset();
				Effect::Viewport
			}
			UiCommand::ToggleClusters => {
				self.show_clusters = !self.show_clusters;
				Effect::Viewport
			}
			UiCommand::ToggleCluster(id) => {
				let Some(visible) = self.store.cluster(&id).map(|c| !c.visible) else {
					warn!("no cluster {}", id.0);
					return Effect::Ignored;
				};
				self.store.set_cluster_visible(&id, visible);
				Effect::Graph
			}
			UiCommand::GroupSelection(name) => self.group_selection(&name),
			UiCommand::ClearSelection => self.interaction.clear_selection(),
			UiCommand::Sync => {
				if sync_offline_nodes(&mut self.store).is_empty() {
					Effect::Ignored
				} else {
					Effect::Graph
				}
			}
			UiCommand::Export => match MapSnapshot::capture(&self.store).to_json() {
				Ok(json) => {
					self.export = Some(json);
					Effect::Selection
				}
				Err(err) => {
					warn!("export failed: {err}");
					Effect::Ignored
				}
			},
			UiCommand::Import(raw) => {
				let env = self.store.env().clone();
				let config = self.store.config().clone();
				match MapSnapshot::from_json(&raw).and_then(|snap| snap.restore(env, config)) {
					Ok(store) => {
						info!("imported map with {} nodes", store.len());
						self.store = store;
						self.interaction = Interaction::new(self.store.config().click_slop);
						self.export = None;
						Effect::Graph
					}
					Err(err) => {
						warn!("import rejected: {err}");
						Effect::Ignored
					}
				}
			}
			UiCommand::ConnectSelection(kind) => {
				let Some(from) = self.interaction.focused().cloned() else {
					return Effect::Ignored;
				};
				let targets: Vec<NodeId> = self.interaction.selection().to_vec();
				let mut effect = Effect::Ignored;
				for to in targets.into_iter().filter(|to| to != &from) {
					let action = ContextAction::Connect {
						from: from.clone(),
						to,
						kind,
					};
					if self.interaction.apply(&mut self.store, action) == Effect::Graph {
						effect = Effect::Graph;
					}
				}
				effect
			}
			UiCommand::Context(action) => self.interaction.apply(&mut self.store, action),
		}
	}

	fn group_selection(&mut self, name: &str) -> Effect {
		let name = name.trim();
		let members: Vec<NodeId> = self.interaction.selection().to_vec();
		if name.is_empty() || members.is_empty() {
			debug!("grouping needs a name and a selection");
			return Effect::Ignored;
		}
		let position = Position::centroid(members.iter().filter_map(|id| self.store.node(id)).map(|n| &n.position))
			.unwrap_or_default();
		let mut n = self.store.clusters().len();
		let id = loop {
			n += 1;
			let candidate = ClusterId(format!("cluster_{n}"));
			if self.store.cluster(&candidate).is_none() {
				break candidate;
			}
		};
		let color = CLUSTER_COLORS[n % CLUSTER_COLORS.len()];
		info!("grouping {} nodes as {name}", members.len());
		self.store.add_cluster(Cluster {
			id,
			name: name.to_string(),
			color: color.to_string(),
			node_ids: members,
			position,
			visible: true,
		});
		self.show_clusters = true;
		Effect::Graph
	}

	fn suggestion_views(&self, id: &NodeId) -> Vec<SuggestionView> {
		suggest(&self.store, id)
			.into_iter()
			.map(|s| {
				let command = match &s {
					Suggestion::Connect { target, .. } => UiCommand::Context(ContextAction::Connect {
						from: id.clone(),
						to: target.clone(),
						kind: EdgeKind::Similarity,
					}),
					Suggestion::Split { .. } => UiCommand::Context(ContextAction::Split(id.clone())),
				};
				let label = match &s {
					Suggestion::Connect { target, shared_tags } => {
						let title = self.store.node(target).map_or(target.as_str(), |n| n.title.as_str());
						format!("Connect to \"{title}\" ({})", shared_tags.join(", "))
					}
					Suggestion::Split { .. } => s.describe(),
				};
				SuggestionView { label, command }
			})
			.collect()
	}

	pub fn panel(&self) -> PanelState {
		let title_of = |id: &NodeId| self.store.node(id).map(|n| n.title.clone()).unwrap_or_default();
		let focused = self
			.interaction
			.focused()
			.and_then(|id| self.store.node(id))
			.map(|n| FocusView {
				id: n.id.clone(),
				title: n.title.clone(),
				tags: n.tags.iter().cloned().collect(),
				has_children: n.has_children(),
				expanded: n.expanded,
				is_root: n.id.is_root(),
			});
		let suggestions = focused
			.as_ref()
			.map(|f| self.suggestion_views(&f.id))
			.unwrap_or_default();
		PanelState {
			zoom_percent: self.viewport.zoom_percent(),
			node_count: self.store.len(),
			selection: self
				.interaction
				.selection()
				.iter()
				.map(|id| (id.clone(), title_of(id)))
				.collect(),
			focused,
			suggestions,
			online: self.store.env().is_online(),
			offline_nodes: self.store.offline_nodes().len(),
			show_clusters: self.show_clusters,
			clusters: self
				.store
				.clusters()
				.iter()
				.map(|c| ClusterView {
					id: c.id.clone(),
					name: c.name.clone(),
					members: c.node_ids.len(),
					visible: c.visible,
				})
				.collect(),
			dragging: self.viewport.is_dragging() || self.interaction.dragged_node().is_some(),
			export: self.export.clone(),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn state() -> MindMapState {
		MindMapState::new(MapSnapshot::default(), MapConfig::default(), 1000.0, 800.0, true)
	}

	#[test]
	fn invalid_seed_falls_back_to_empty_map() {
		let s = state();
		assert_eq!(s.store.len(), 1);
		assert_eq!(s.panel().node_count, 1);
	}

	#[test]
	fn panel_tracks_focus_and_suggestions() {
		let mut s = state();
		let root = NodeId::root();
		s.run(UiCommand::Context(ContextAction::AddChild {
			parent: root.clone(),
			title: "Mobile app".into(),
		}));
		let first = s.interaction.focused().cloned().unwrap();
		s.run(UiCommand::Context(ContextAction::AddChild {
			parent: root,
			title: "Design system".into(),
		}));
		s.interaction.focus(Some(first.clone()));

		let panel = s.panel();
		assert_eq!(panel.focused.as_ref().map(|f| &f.id), Some(&first));
		assert_eq!(panel.suggestions.len(), 1);
		assert!(panel.suggestions[0].label.contains("Design system"));

		let command = panel.suggestions[0].command.clone();
		assert_eq!(s.run(command), Effect::Graph);
		assert!(s.panel().suggestions.is_empty());
	}

	#[test]
	fn connect_selection_links_focus_to_each_selected_node() {
		let mut s = state();
		let root = NodeId::root();
		let ids: Vec<NodeId> = ["A", "B", "C"]
			.iter()
			.map(|t| s.store.add_child(&root, t).unwrap())
			.collect();
		s.interaction.focus(Some(ids[0].clone()));
		s.interaction.toggle_selected(&ids[1]);
		s.interaction.toggle_selected(&ids[2]);
		assert_eq!(s.run(UiCommand::ConnectSelection(EdgeKind::Dependency)), Effect::Graph);
		assert_eq!(s.store.links().len(), 2);
		assert_eq!(s.run(UiCommand::ConnectSelection(EdgeKind::Dependency)), Effect::Ignored);
	}

	#[test]
	fn export_and_view_commands() {
		let mut s = state();
		assert_eq!(s.run(UiCommand::Export), Effect::Selection);
		assert!(s.panel().export.unwrap().contains("\"root\""));
		s.run(UiCommand::ZoomIn);
		assert_eq!(s.panel().zoom_percent, 120);
		s.run(UiCommand::ToggleClusters);
		assert!(!s.panel().show_clusters);
		assert_eq!(s.run(UiCommand::Sync), Effect::Ignored);
	}

	#[test]
	fn import_replaces_the_map_only_when_valid() {
		let mut s = state();
		let id = s.store.add_child(&NodeId::root(), "Keep me").unwrap();
		s.interaction.focus(Some(id));
		s.run(UiCommand::Export);
		let json = s.panel().export.unwrap();

		let mut other = state();
		assert_eq!(other.run(UiCommand::Import("{ not json".into())), Effect::Ignored);
		assert_eq!(other.store.len(), 1);
		assert_eq!(other.run(UiCommand::Import(json)), Effect::Graph);
		assert_eq!(other.store.len(), 2);
		assert!(other.panel().focused.is_none());
	}

	#[test]
	fn grouping_the_selection_adds_a_toggleable_cluster() {
		let mut s = state();
		let root = NodeId::root();
		let a = s.store.add_child(&root, "A").unwrap();
		let b = s.store.add_child(&root, "B").unwrap();
		assert_eq!(s.run(UiCommand::GroupSelection("Plan".into())), Effect::Ignored);

		s.interaction.toggle_selected(&a);
		s.interaction.toggle_selected(&b);
		s.show_clusters = false;
		assert_eq!(s.run(UiCommand::GroupSelection("   ".into())), Effect::Ignored);
		assert_eq!(s.run(UiCommand::GroupSelection(" Plan ".into())), Effect::Graph);

		let panel = s.panel();
		assert!(panel.show_clusters);
		assert_eq!(panel.clusters.len(), 1);
		let view = &panel.clusters[0];
		assert_eq!((view.name.as_str(), view.members, view.visible), ("Plan", 2, true));
		assert_eq!(s.store.node(&a).unwrap().cluster, Some(view.id.clone()));

		assert_eq!(s.run(UiCommand::ToggleCluster(view.id.clone())), Effect::Graph);
		assert!(!s.panel().clusters[0].visible);
		assert_eq!(s.run(UiCommand::ToggleCluster("nope".into())), Effect::Ignored);
		s.store.check_invariants().unwrap();
	}

	#[test]
	fn panel_reports_drags() {
		let mut s = state();
		assert!(!s.panel().dragging);
		s.pointer_down(990.0, 790.0, Modifiers::default());
		assert!(s.panel().dragging);
		s.pointer_up();
		assert!(!s.panel().dragging);
	}

	#[test]
	fn right_click_focuses_the_node_underneath() {
		let mut s = state();
		let root = s.canvas.to_world(s.store.root().position);
		assert_eq!(s.context_target(root.x, root.y), Effect::Selection);
		assert_eq!(s.interaction.focused(), Some(&NodeId::root()));
		assert_eq!(s.context_target(5.0, 790.0), Effect::Ignored);
	}
}
