use leptos::prelude::*;
use log::warn;

use crate::components::mind_map::{
	Cluster, ContentBlock, Edge, EdgeKind, MapConfig, MapSnapshot, MindMapCanvas, Node, NodeId, NodeKind, Position,
};

/// Editor tunables shipped with the page.
const MAP_CONFIG: &str = include_str!("map_config.json");

fn load_config(raw: &str) -> MapConfig {
	MapConfig::from_json(raw).unwrap_or_else(|err| {
		warn!("map config rejected, using defaults: {err}");
		MapConfig::default()
	})
}

struct Seed {
	id: &'static str,
	title: &'static str,
	summary: &'static str,
	at: (f64, f64),
	parent: Option<&'static str>,
	cluster: &'static str,
	tags: [&'static str; 2],
	relevance: f64,
	kind: NodeKind,
}

const SEEDS: &[Seed] = &[
	Seed {
		id: "root",
		title: "AI-Enhanced Mind Map",
		summary: "Comprehensive workspace for ideas, planning, and collaboration with AI-augmented features.",
		at: (50.0, 15.0),
		parent: None,
		cluster: "strategy",
		tags: ["core", "planning"],
		relevance: 0.9,
		kind: NodeKind::Rich,
	},
	Seed {
		id: "strategy",
		title: "Strategy Planning",
		summary: "Collaborative approach to strategic planning with team input, market analysis, and goal setting.",
		at: (20.0, 45.0),
		parent: Some("root"),
		cluster: "strategy",
		tags: ["strategy", "planning"],
		relevance: 0.8,
		kind: NodeKind::Rich,
	},
	Seed {
		id: "documentation",
		title: "Project Documentation",
		summary: "Centralized knowledge base with project specifications, user guides, and technical documentation.",
		at: (50.0, 45.0),
		parent: Some("root"),
		cluster: "documentation",
		tags: ["documentation", "knowledge"],
		relevance: 0.7,
		kind: NodeKind::Rich,
	},
	Seed {
		id: "development",
		title: "Development Workflow",
		summary: "Agile development methodology with continuous integration and user-centered design principles.",
		at: (80.0, 45.0),
		parent: Some("root"),
		cluster: "development",
		tags: ["development", "workflow"],
		relevance: 0.85,
		kind: NodeKind::Rich,
	},
	Seed {
		id: "market-research",
		title: "Market Research",
		summary: "Comprehensive market analysis and competitor research.",
		at: (10.0, 70.0),
		parent: Some("strategy"),
		cluster: "strategy",
		tags: ["research", "market"],
		relevance: 0.6,
		kind: NodeKind::Simple,
	},
	Seed {
		id: "goals",
		title: "Project Goals",
		summary: "Define clear objectives and success metrics for the project.",
		at: (30.0, 70.0),
		parent: Some("strategy"),
		cluster: "strategy",
		tags: ["goals", "objectives"],
		relevance: 0.75,
		kind: NodeKind::Simple,
	},
	Seed {
		id: "mobile-app",
		title: "Mobile Application",
		summary: "Cross-platform mobile solution with intuitive UX.",
		at: (80.0, 75.0),
		parent: Some("development"),
		cluster: "development",
		tags: ["mobile", "development"],
		relevance: 0.9,
		kind: NodeKind::Rich,
	},
];

/// The sample map shown on the home page.
fn seed_map() -> MapSnapshot {
	let mut nodes: Vec<Node> = SEEDS
		.iter()
		.map(|s| {
			let mut node = Node::new(NodeId::new(s.id), s.title, Position::new(s.at.0, s.at.1)).with_tags(s.tags);
			node.content.push(ContentBlock::text(s.summary));
			node.parent = s.parent.map(NodeId::new);
			node.cluster = Some(s.cluster.into());
			node.relevance = s.relevance;
			node.kind = s.kind;
			node
		})
		.collect();
	// Levels and child lists follow from the parent links.
	for (node, seed) in nodes.iter_mut().zip(SEEDS) {
		node.children = SEEDS
			.iter()
			.filter(|s| s.parent == Some(seed.id))
			.map(|s| NodeId::new(s.id))
			.collect();
		let mut cursor = seed.parent;
		while let Some(p) = cursor {
			node.level += 1;
			cursor = SEEDS.iter().find(|s| s.id == p).and_then(|s| s.parent);
		}
	}

	let cluster = |id: &str, name: &str, color: &str, members: &[&str], at: (f64, f64)| Cluster {
		id: id.into(),
		name: name.into(),
		color: color.into(),
		node_ids: members.iter().map(|m| NodeId::new(*m)).collect(),
		position: Position::new(at.0, at.1),
		visible: true,
	};

	MapSnapshot {
		nodes,
		edges: vec![
			Edge::new("market-research".into(), "mobile-app".into(), EdgeKind::Association, 0.6).animated(),
			Edge::new("goals".into(), "development".into(), EdgeKind::Dependency, 0.7),
		],
		clusters: vec![
			cluster(
				"strategy",
				"Strategic Planning",
				"rgba(59, 130, 246, 0.1)",
				&["root", "strategy", "market-research", "goals"],
				(15.0, 10.0),
			),
			cluster(
				"development",
				"Development",
				"rgba(16, 185, 129, 0.1)",
				&["development", "mobile-app"],
				(70.0, 35.0),
			),
			cluster(
				"documentation",
				"Knowledge Base",
				"rgba(245, 158, 11, 0.1)",
				&["documentation"],
				(40.0, 35.0),
			),
		],
	}
}

/// Default Home Page
#[component]
pub fn Home() -> impl IntoView {
	let seed = Signal::derive(seed_map);
	let config = load_config(MAP_CONFIG);

	view! {
		<ErrorBoundary fallback=|errors| {
			view! {
				<h1>"Uh oh! Something went wrong!"</h1>

				<p>"Errors: "</p>
				<ul>
					{move || {
						errors
							.get()
							.into_iter()
							.map(|(_, e)| view! { <li>{e.to_string()}</li> })
							.collect_view()
					}}
				</ul>
			}
		}>

			<div class="fullscreen-map">
				<MindMapCanvas seed=seed config=config fullscreen=true />
				<div class="map-overlay">
					<h1>"Mind Map"</h1>
					<p class="subtitle">
						"Click a node to focus or fold it. Ctrl-click to select. Drag to move. Scroll to zoom."
					</p>
				</div>
			</div>
		</ErrorBoundary>
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::components::mind_map::env::Environment;

	#[test]
	fn shipped_config_loads() {
		let config = load_config(MAP_CONFIG);
		assert_eq!(config, MapConfig::from_json(MAP_CONFIG).unwrap());
		assert!(config.zoom_min > 0.0 && config.zoom_min < config.zoom_max);
	}

	#[test]
	fn broken_config_falls_back_to_defaults() {
		assert_eq!(load_config("{ zoom"), MapConfig::default());
	}

	#[test]
	fn seed_map_is_a_valid_tree() {
		let store = seed_map()
			.restore(Environment::default(), MapConfig::default())
			.unwrap();
		assert_eq!(store.len(), 7);
		assert_eq!(store.hierarchy_edges().count(), 6);
		assert_eq!(store.links().len(), 2);
		assert_eq!(store.node(&"mobile-app".into()).unwrap().level, 2);
		assert_eq!(store.root().children.len(), 3);
	}
}
