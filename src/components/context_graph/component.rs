//! Canvas component for the analysis-pipeline context graph.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, WheelEvent, Window};

use super::render;
use super::state::{CLICK_DRAG_TOLERANCE, ContextGraphState};
use super::types::Graph;

fn canvas_size(
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		let window: Window = web_sys::window().unwrap();
		(
			window.inner_width().unwrap().as_f64().unwrap(),
			window.inner_height().unwrap().as_f64().unwrap(),
		)
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
	}
}

/// Interactive rendering of one (possibly stage-filtered) context graph.
///
/// Layout is computed when `data` changes and only then; `selected` carries
/// the selection by node id both ways (clicks write it, rebuilds re-resolve
/// it) so the explanation panel can follow along.
#[component]
pub fn ContextGraphCanvas(
	#[prop(into)] data: Signal<Graph>,
	selected: RwSignal<Option<String>>,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let running = Rc::new(Cell::new(true));
	let state: Rc<RefCell<Option<ContextGraphState>>> = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init, running_init) =
		(state.clone(), animate.clone(), resize_cb.clone(), running.clone());

	// Canvas setup and the animation loop, once the element exists. The
	// loop only animates overlay cosmetics; it never moves nodes.
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		if animate_init.borrow().is_some() {
			return;
		}
		let window: Window = web_sys::window().unwrap();

		let (w, h) = canvas_size(&canvas, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let win: Window = web_sys::window().unwrap();
				let (nw, nh) = (
					win.inner_width().unwrap().as_f64().unwrap(),
					win.inner_height().unwrap().as_f64().unwrap(),
				);
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		let running_anim = running_init.clone();
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			// Stop rescheduling once the component is gone.
			if !running_anim.get() {
				return;
			}
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.tick(0.016);
				render::render(s, &ctx);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	// Rebuild the graph state (and its layout, exactly once) when the data
	// changes. A rebuild replaces the whole state value, so a layout from a
	// superseded graph can never leak into the new render. The prior
	// selection is re-resolved by id and cleared when its node is gone.
	let state_rebuild = state.clone();
	Effect::new(move |_| {
		let graph = data.get();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (w, h) = canvas_size(&canvas, fullscreen, width, height);

		let mut next = ContextGraphState::new(graph, w, h);
		let prior = selected.get_untracked();
		next.resolve_selection(prior.as_deref());
		let survived = next.selected_id().is_some();
		debug!(
			"context graph rebuilt: {} nodes, selection {}",
			next.graph.nodes.len(),
			if survived { "kept" } else { "cleared" }
		);
		*state_rebuild.borrow_mut() = Some(next);
		if prior.is_some() && !survived {
			selected.set(None);
		}
	});

	// Selection changes are a pure overlay: update the highlighted node
	// without touching the computed layout.
	let state_sel = state.clone();
	Effect::new(move |_| {
		let id = selected.get();
		if let Some(ref mut s) = *state_sel.borrow_mut() {
			s.resolve_selection(id.as_deref());
		}
	});

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.press = Some((x, y));
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.node = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.drag.node_start = s.positions[idx];
			} else {
				s.pan.active = true;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if let Some((px, py)) = s.press {
				if ((x - px).powi(2) + (y - py).powi(2)).sqrt() > CLICK_DRAG_TOLERANCE {
					s.press = None;
				}
			}

			// Update hover state when not dragging
			if !s.drag.active {
				let hovered = s.node_at_position(x, y);
				s.hover.edge = if hovered.is_none() {
					s.edge_at_position(x, y)
				} else {
					None
				};
				s.set_hover(hovered, x, y);
			}

			if s.drag.active {
				if let Some(idx) = s.drag.node {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					s.move_node(idx, s.drag.node_start.x + dx, s.drag.node_start.y + dy);
				}
			} else if s.pan.active {
				s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
				s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		let mut clicked = None;
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			if s.press.take().is_some() {
				// A press that never travelled is a click: node selects,
				// background clears.
				let hit = s.node_at_position(x, y);
				s.set_selected(hit);
				clicked = Some(s.selected_id().map(str::to_owned));
			}
			s.drag.active = false;
			s.drag.node = None;
			s.pan.active = false;
		}
		if let Some(id) = clicked {
			selected.set(id);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.press = None;
			s.drag.active = false;
			s.drag.node = None;
			s.pan.active = false;
			s.hover.edge = None;
			s.set_hover(None, 0.0, 0.0);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let rect = canvas.get_bounding_client_rect();
		let (x, y) = (
			ev.client_x() as f64 - rect.left(),
			ev.client_y() as f64 - rect.top(),
		);

		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			let new_k = (s.transform.k * factor).clamp(0.1, 10.0);
			let ratio = new_k / s.transform.k;
			s.transform.x = x - (x - s.transform.x) * ratio;
			s.transform.y = y - (y - s.transform.y) * ratio;
			s.transform.k = new_k;
		}
	};

	on_cleanup(move || running.set(false));

	view! {
		<canvas
			node_ref=canvas_ref
			class="context-graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			on:wheel=on_wheel
			style="display: block; cursor: grab;"
		/>
	}
}
