use wasm_bindgen::JsValue;
use web_sys::{CanvasRenderingContext2d, Path2d};

use super::interaction::{NODE_HALF_HEIGHT, NODE_HALF_WIDTH};
use super::router::{RoutedPath, visible_nodes};
use super::state::MindMapState;
use super::types::{EdgeKind, Node};
use super::viewport::Point;

const LEVEL_COLORS: &[&str] = &["#667eea", "#22c55e", "#f97316", "#a855f7", "#eab308", "#0ea5e9"];
const TITLE_CHARS: usize = 22;

struct Stroke {
	color: &'static str,
	dash: &'static [f64],
}

fn stroke_for(kind: EdgeKind) -> Stroke {
	match kind {
		EdgeKind::Hierarchy => Stroke {
			color: "#64748b",
			dash: &[],
		},
		EdgeKind::Association => Stroke {
			color: "#3b82f6",
			dash: &[8.0, 4.0],
		},
		EdgeKind::Dependency => Stroke {
			color: "#f59e0b",
			dash: &[12.0, 4.0],
		},
		EdgeKind::Similarity => Stroke {
			color: "#10b981",
			dash: &[4.0, 4.0],
		},
	}
}

fn dash_array(dash: &[f64]) -> js_sys::Array {
	dash.iter().map(|d| JsValue::from_f64(*d)).collect()
}

pub fn render(state: &mut MindMapState, ctx: &CanvasRenderingContext2d) {
	let (width, height) = (state.canvas.width, state.canvas.height);
	ctx.set_fill_style_str("#f8fafc");
	ctx.fill_rect(0.0, 0.0, width, height);
	ctx.save();
	let pan = state.viewport.pan();
	let zoom = state.viewport.zoom();
	let _ = ctx.translate(pan.x, pan.y);
	let _ = ctx.scale(zoom, zoom);
	let labels = if state.show_clusters {
		draw_clusters(state, ctx)
	} else {
		Vec::new()
	};
	let flow = state.flow_time;
	let (sx, sy) = (width / 100.0, height / 100.0);
	for path in state.paths() {
		draw_path(path, ctx, flow, sx, sy);
	}
	draw_nodes(state, ctx);
	ctx.restore();

	// Cluster names keep their size at any zoom.
	ctx.set_fill_style_str("rgba(30, 41, 59, 0.6)");
	ctx.set_font("11px sans-serif");
	ctx.set_text_align("left");
	for (name, anchor) in labels {
		let at = state.viewport.world_to_screen(anchor);
		let _ = ctx.fill_text(&name, at.x + 8.0, at.y + 14.0);
	}
}

/// Fills the visible cluster boxes and returns each name with the box's
/// top-left corner in world space.
fn draw_clusters(state: &MindMapState, ctx: &CanvasRenderingContext2d) -> Vec<(String, Point)> {
	let mut labels = Vec::new();
	for cluster in state.store.clusters().iter().filter(|c| c.visible) {
		let members: Vec<Point> = cluster
			.node_ids
			.iter()
			.filter_map(|id| state.store.node(id))
			.map(|n| state.canvas.to_world(n.position))
			.collect();
		if members.is_empty() {
			continue;
		}
		let pad = 16.0;
		let (mut x0, mut y0, mut x1, mut y1) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
		for p in &members {
			x0 = x0.min(p.x - NODE_HALF_WIDTH - pad);
			y0 = y0.min(p.y - NODE_HALF_HEIGHT - pad - 14.0);
			x1 = x1.max(p.x + NODE_HALF_WIDTH + pad);
			y1 = y1.max(p.y + NODE_HALF_HEIGHT + pad);
		}
		ctx.set_fill_style_str(&cluster.color);
		ctx.fill_rect(x0, y0, x1 - x0, y1 - y0);
		labels.push((cluster.name.clone(), Point::new(x0, y0)));
	}
	labels
}

fn draw_path(path: &RoutedPath, ctx: &CanvasRenderingContext2d, flow: f64, sx: f64, sy: f64) {
	let Ok(shape) = Path2d::new_with_path_string(&path.to_svg(sx, sy)) else {
		log::warn!("could not build path {}", path.id);
		return;
	};
	let stroke = stroke_for(path.kind);
	ctx.set_global_alpha(path.strength.max(0.2));
	ctx.set_stroke_style_str(stroke.color);
	ctx.set_line_width((path.strength * 3.0).max(2.0));
	let _ = ctx.set_line_dash(&dash_array(stroke.dash));
	ctx.set_line_dash_offset(if path.animated { -(flow * 30.0) } else { 0.0 });
	ctx.stroke_with_path(&shape);
	let _ = ctx.set_line_dash(&js_sys::Array::new());
	ctx.set_global_alpha(1.0);
}

fn short_title(title: &str) -> String {
	if title.chars().count() <= TITLE_CHARS {
		return title.to_string();
	}
	let mut out: String = title.chars().take(TITLE_CHARS - 1).collect();
	out.push('…');
	out
}

fn draw_nodes(state: &MindMapState, ctx: &CanvasRenderingContext2d) {
	let focused = state.interaction.focused();
	for node in visible_nodes(&state.store) {
		draw_node(state, node, focused == Some(&node.id), ctx);
	}
}

fn draw_node(state: &MindMapState, node: &Node, focused: bool, ctx: &CanvasRenderingContext2d) {
	let c = state.canvas.to_world(node.position);
	let (x, y, w, h) = (
		c.x - NODE_HALF_WIDTH,
		c.y - NODE_HALF_HEIGHT,
		NODE_HALF_WIDTH * 2.0,
		NODE_HALF_HEIGHT * 2.0,
	);
	let color = LEVEL_COLORS[node.level as usize % LEVEL_COLORS.len()];

	ctx.set_fill_style_str("white");
	ctx.fill_rect(x, y, w, h);
	ctx.set_fill_style_str(color);
	ctx.fill_rect(x, y, 5.0, h);

	if node.offline_created {
		let _ = ctx.set_line_dash(&dash_array(&[4.0, 3.0]));
	}
	let dragged = state.interaction.dragged_node() == Some(&node.id);
	let (border, line) = if dragged {
		("#0ea5e9", 3.0)
	} else if state.interaction.is_selected(&node.id) {
		("#a855f7", 3.0)
	} else if focused {
		("#1e293b", 2.0)
	} else {
		("#cbd5e1", 1.0)
	};
	ctx.set_stroke_style_str(border);
	ctx.set_line_width(line);
	ctx.stroke_rect(x, y, w, h);
	let _ = ctx.set_line_dash(&js_sys::Array::new());

	ctx.set_fill_style_str("#1e293b");
	ctx.set_font(if node.level == 0 { "bold 14px sans-serif" } else { "12px sans-serif" });
	ctx.set_text_align("center");
	let _ = ctx.fill_text(&short_title(&node.title), c.x, c.y + 4.0);

	if node.has_children() {
		ctx.set_fill_style_str("#64748b");
		ctx.set_font("11px sans-serif");
		let marker = if node.expanded { "−" } else { "+" };
		let _ = ctx.fill_text(marker, x + w - 9.0, y + 13.0);
	}
	if node.ai_suggested {
		ctx.set_fill_style_str("#a855f7");
		ctx.begin_path();
		let _ = ctx.arc(x + 12.0, y + 9.0, 3.0, 0.0, std::f64::consts::TAU);
		ctx.fill();
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn long_titles_are_shortened() {
		assert_eq!(short_title("Goals"), "Goals");
		let long = short_title("Comprehensive market analysis and competitor research");
		assert_eq!(long.chars().count(), TITLE_CHARS);
		assert!(long.ends_with('…'));
	}
}
