use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::warn;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, KeyboardEvent, MouseEvent, WheelEvent, Window};

use super::config::MapConfig;
use super::interaction::{self, ContextAction, Modifiers};
use super::render;
use super::snapshot::MapSnapshot;
use super::state::{MindMapState, PanelState, UiCommand};
use super::types::EdgeKind;

type SharedState = Rc<RefCell<Option<MindMapState>>>;

/// Text fields of the side panel.
#[derive(Clone, Copy)]
struct Drafts {
	title: RwSignal<String>,
	tags: RwSignal<String>,
	group: RwSignal<String>,
	import: RwSignal<String>,
}

impl Drafts {
	fn new() -> Self {
		Self {
			title: RwSignal::new(String::new()),
			tags: RwSignal::new(String::new()),
			group: RwSignal::new(String::new()),
			import: RwSignal::new(String::new()),
		}
	}
}

/// Splits a comma separated tag field.
fn parse_tags(raw: &str) -> Vec<String> {
	raw.split(',').map(|t| t.trim().to_string()).filter(|t| !t.is_empty()).collect()
}

/// Runs `f` against the live state and republishes the side panel when
/// anything changed.
#[derive(Clone)]
struct Handle {
	state: SharedState,
	panel: RwSignal<PanelState>,
}

impl Handle {
	fn apply(&self, f: impl FnOnce(&mut MindMapState) -> interaction::Effect) {
		let refreshed = {
			let mut guard = self.state.borrow_mut();
			let Some(s) = guard.as_mut() else {
				return;
			};
			match f(s) {
				interaction::Effect::Ignored => None,
				_ => Some(s.panel()),
			}
		};
		if let Some(panel) = refreshed {
			self.panel.set(panel);
		}
	}
}

fn window_size(window: &Window) -> (f64, f64) {
	(
		window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
		window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
	)
}

fn local_point(canvas_ref: NodeRef<leptos::html::Canvas>, ev: &MouseEvent) -> Option<(f64, f64)> {
	let canvas: HtmlCanvasElement = canvas_ref.get()?.into();
	let rect = canvas.get_bounding_client_rect();
	Some((ev.client_x() as f64 - rect.left(), ev.client_y() as f64 - rect.top()))
}

fn modifiers(ev: &MouseEvent) -> Modifiers {
	Modifiers {
		ctrl: ev.ctrl_key(),
		meta: ev.meta_key(),
	}
}

#[component]
pub fn MindMapCanvas(
	#[prop(into)] seed: Signal<MapSnapshot>,
	#[prop(default = MapConfig::default())] config: MapConfig,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let listeners: Rc<RefCell<Vec<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(Vec::new()));
	let panel = RwSignal::new(PanelState::default());
	let command = RwSignal::new(None::<UiCommand>);
	let drafts = Drafts::new();
	let handle = Handle {
		state,
		panel,
	};

	let (handle_init, animate_init, listeners_init) = (handle.clone(), animate.clone(), listeners.clone());
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			window_size(&window)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let Some(ctx) = canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into::<CanvasRenderingContext2d>().ok())
		else {
			warn!("canvas has no 2d context");
			return;
		};
		let online = window.navigator().on_line();
		let fresh = MindMapState::new(seed.get(), config.clone(), w, h, online);
		panel.set(fresh.panel());
		*handle_init.state.borrow_mut() = Some(fresh);

		if listeners_init.borrow().is_empty() {
			let mut registered = listeners_init.borrow_mut();
			if fullscreen {
				let (handle_resize, canvas_resize) = (handle_init.clone(), canvas.clone());
				let on_resize = Closure::<dyn FnMut()>::new(move || {
					let Some(win) = web_sys::window() else {
						return;
					};
					let (nw, nh) = window_size(&win);
					canvas_resize.set_width(nw as u32);
					canvas_resize.set_height(nh as u32);
					handle_resize.apply(|s| {
						s.resize(nw, nh);
						interaction::Effect::Viewport
					});
				});
				let _ = window.add_event_listener_with_callback("resize", on_resize.as_ref().unchecked_ref());
				registered.push(on_resize);
			}
			for (event, up) in [("online", true), ("offline", false)] {
				let handle_net = handle_init.clone();
				let on_change = Closure::<dyn FnMut()>::new(move || {
					handle_net.apply(|s| {
						s.set_online(up);
						interaction::Effect::Selection
					});
				});
				let _ = window.add_event_listener_with_callback(event, on_change.as_ref().unchecked_ref());
				registered.push(on_change);
			}
		}

		if animate_init.borrow().is_none() {
			let (state_anim, animate_inner) = (handle_init.state.clone(), animate_init.clone());
			*animate_init.borrow_mut() = Some(Closure::new(move || {
				if let Some(ref mut s) = *state_anim.borrow_mut() {
					s.tick(0.016);
					render::render(s, &ctx);
				}
				if let Some(ref cb) = *animate_inner.borrow() {
					if let Some(win) = web_sys::window() {
						let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
					}
				}
			}));
			if let Some(ref cb) = *animate_init.borrow() {
				let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}
	});

	let handle_cmd = handle.clone();
	Effect::new(move |_| {
		let Some(cmd) = command.get() else {
			return;
		};
		command.set(None);
		handle_cmd.apply(|s| s.run(cmd));
	});

	let handle_md = handle.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handle_md.apply(|s| s.pointer_down(x, y, modifiers(&ev)));
		}
	};

	let handle_mm = handle.clone();
	let on_mousemove = move |ev: MouseEvent| {
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handle_mm.apply(|s| match s.pointer_move(x, y) {
				// Panning only moves pixels; the panel has nothing new to show.
				interaction::Effect::Viewport => interaction::Effect::Ignored,
				other => other,
			});
		}
	};

	let handle_mu = handle.clone();
	let on_mouseup = move |_: MouseEvent| handle_mu.apply(|s| s.pointer_up());

	let handle_ml = handle.clone();
	let on_mouseleave = move |_: MouseEvent| handle_ml.apply(|s| s.pointer_leave());

	let handle_wh = handle.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handle_wh.apply(|s| s.wheel(x, y, ev.delta_y()));
		}
	};

	let handle_ctx = handle.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		if let Some((x, y)) = local_point(canvas_ref, &ev) {
			handle_ctx.apply(|s| s.context_target(x, y));
		}
	};

	let handle_kd = handle;
	let on_keydown = move |ev: KeyboardEvent| {
		let key = ev.key();
		let mut handled = false;
		handle_kd.apply(|s| {
			let effect = s.key(&key);
			handled = effect != interaction::Effect::Ignored;
			effect
		});
		if handled {
			ev.prevent_default();
		}
	};

	let send = move |cmd: UiCommand| command.set(Some(cmd));
	let container_style = if fullscreen {
		"position: relative; width: 100vw; height: 100vh; overflow: hidden;"
	} else {
		"position: relative;"
	};

	view! {
		<div class="mind-map" style=container_style>
			<canvas
				node_ref=canvas_ref
				class="mind-map-canvas"
				tabindex="0"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:contextmenu=on_contextmenu
				on:keydown=on_keydown
				style=move || {
					let cursor = if panel.with(|p| p.dragging) { "grabbing" } else { "grab" };
					format!("display: block; cursor: {cursor}; outline: none;")
				}
			/>
			<div class="mind-map-toolbar">
				<button on:click=move |_| send(UiCommand::ZoomOut) title="Zoom out">
					"−"
				</button>
				<span class="zoom-level">{move || format!("{}%", panel.with(|p| p.zoom_percent))}</span>
				<button on:click=move |_| send(UiCommand::ZoomIn) title="Zoom in">
					"+"
				</button>
				<button on:click=move |_| send(UiCommand::ResetView)>"Reset"</button>
				<button on:click=move |_| send(UiCommand::ToggleClusters)>
					{move || if panel.with(|p| p.show_clusters) { "Hide clusters" } else { "Show clusters" }}
				</button>
				<button on:click=move |_| send(UiCommand::Export)>"Export"</button>
				<span class="status">
					{move || {
						panel
							.with(|p| {
								let net = if p.online { "online" } else { "offline" };
								format!("{} nodes, {net}", p.node_count)
							})
					}}
				</span>
				<button
					on:click=move |_| send(UiCommand::Sync)
					disabled=move || panel.with(|p| !p.online || p.offline_nodes == 0)
				>
					{move || format!("Sync ({})", panel.with(|p| p.offline_nodes))}
				</button>
			</div>
			<aside class="mind-map-panel">{move || side_panel(panel.get(), command, drafts)}</aside>
		</div>
	}
}

fn side_panel(
	p: PanelState,
	command: RwSignal<Option<UiCommand>>,
	drafts: Drafts,
) -> impl IntoView {
	let send = move |cmd: UiCommand| command.set(Some(cmd));

	let focus = p.focused.map(|f| {
		let (add_id, rename_id, split_id, delete_id, toggle_id, tag_id) =
			(f.id.clone(), f.id.clone(), f.id.clone(), f.id.clone(), f.id.clone(), f.id.clone());
		let toggle_label = if f.expanded { "Collapse" } else { "Expand" };
		let suggestions = p
			.suggestions
			.into_iter()
			.map(|s| {
				let cmd = s.command;
				view! {
					<li>
						<button on:click=move |_| send(cmd.clone())>{s.label}</button>
					</li>
				}
			})
			.collect_view();
		let link_buttons = [EdgeKind::Association, EdgeKind::Dependency, EdgeKind::Similarity]
			.into_iter()
			.map(|kind| {
				view! {
					<button on:click=move |_| send(UiCommand::ConnectSelection(kind))>{kind.label()}</button>
				}
			})
			.collect_view();

		view! {
			<section class="focused">
				<h2>{f.title}</h2>
				<p class="tags">{f.tags.join(", ")}</p>
				<input
					type="text"
					placeholder="Title"
					prop:value=move || drafts.title.get()
					on:input=move |ev| drafts.title.set(event_target_value(&ev))
				/>
				<div class="actions">
					<button on:click=move |_| {
						let title = drafts.title.get_untracked();
						drafts.title.set(String::new());
						send(UiCommand::Context(ContextAction::AddChild {
							parent: add_id.clone(),
							title,
						}));
					}>"Add child"</button>
					<button on:click=move |_| {
						let title = drafts.title.get_untracked();
						drafts.title.set(String::new());
						send(UiCommand::Context(ContextAction::Rename {
							id: rename_id.clone(),
							title,
						}));
					}>"Rename"</button>
					<button
						disabled=f.is_root
						on:click=move |_| send(UiCommand::Context(ContextAction::Split(split_id.clone())))
					>
						"Split"
					</button>
					<button
						disabled=f.is_root
						on:click=move |_| send(UiCommand::Context(ContextAction::Delete(delete_id.clone())))
					>
						"Delete"
					</button>
					<button
						disabled=!f.has_children
						on:click=move |_| send(UiCommand::Context(ContextAction::ToggleExpanded(toggle_id.clone())))
					>
						{toggle_label}
					</button>
				</div>
				<div class="actions">
					<input
						type="text"
						placeholder="tag, tag"
						prop:value=move || drafts.tags.get()
						on:input=move |ev| drafts.tags.set(event_target_value(&ev))
					/>
					<button on:click=move |_| {
						let tags = parse_tags(&drafts.tags.get_untracked());
						drafts.tags.set(String::new());
						send(UiCommand::Context(ContextAction::SetTags {
							id: tag_id.clone(),
							tags,
						}));
					}>"Set tags"</button>
				</div>
				<p>"Link selection as:"</p>
				<div class="actions">{link_buttons}</div>
				<h3>"Suggestions"</h3>
				<ul class="suggestions">{suggestions}</ul>
			</section>
		}
	});

	let can_merge = p.selection.len() >= 2;
	let can_group = !p.selection.is_empty();
	let selected = p
		.selection
		.into_iter()
		.map(|(id, title)| view! { <li title=id.to_string()>{title}</li> })
		.collect_view();

	let clusters = p
		.clusters
		.into_iter()
		.map(|c| {
			let id = c.id.clone();
			let label = if c.visible { "Hide" } else { "Show" };
			view! {
				<li>
					<span>{format!("{} ({})", c.name, c.members)}</span>
					<button on:click=move |_| send(UiCommand::ToggleCluster(id.clone()))>{label}</button>
				</li>
			}
		})
		.collect_view();

	let export = p.export.map(|json| {
		view! {
			<section class="export">
				<h3>"Snapshot"</h3>
				<textarea readonly=true rows="8" prop:value=json></textarea>
			</section>
		}
	});

	view! {
		{focus}
		<section class="selection">
			<h3>"Selection"</h3>
			<ul>{selected}</ul>
			<button disabled=!can_merge on:click=move |_| send(UiCommand::Context(ContextAction::MergeSelection))>
				"Merge"
			</button>
			<button on:click=move |_| send(UiCommand::ClearSelection)>"Clear"</button>
			<div class="actions">
				<input
					type="text"
					placeholder="Cluster name"
					prop:value=move || drafts.group.get()
					on:input=move |ev| drafts.group.set(event_target_value(&ev))
				/>
				<button
					disabled=!can_group
					on:click=move |_| {
						let name = drafts.group.get_untracked();
						drafts.group.set(String::new());
						send(UiCommand::GroupSelection(name));
					}
				>
					"Group"
				</button>
			</div>
		</section>
		<section class="clusters">
			<h3>"Clusters"</h3>
			<ul>{clusters}</ul>
		</section>
		{export}
		<section class="import">
			<h3>"Import"</h3>
			<textarea
				rows="4"
				prop:value=move || drafts.import.get()
				on:input=move |ev| drafts.import.set(event_target_value(&ev))
			></textarea>
			<button on:click=move |_| send(UiCommand::Import(drafts.import.get_untracked()))>"Load"</button>
		</section>
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn tag_field_splits_on_commas() {
		assert_eq!(parse_tags(" design, ,mobile ,"), ["design", "mobile"]);
		assert!(parse_tags("  ").is_empty());
	}
}
