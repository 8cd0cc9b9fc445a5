//! Canvas render pass. Pure drawing over [`ContextGraphState`]; runs every
//! animation frame but reads positions that were computed once per graph.

use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{ContextGraphState, NODE_RADIUS};

const DRIFT_RING_COLOR: &str = "#e377c2";

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &ContextGraphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str("#1a1a2e");
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
	// Tooltip is anchored at the pointer, in screen space.
	draw_tooltip(state, ctx);
}

fn draw_edges(state: &ContextGraphState, ctx: &CanvasRenderingContext2d) {
	let k = state.transform.k;
	let (line_width, dash, gap, arrow_size) = (1.5 / k, 8.0 / k, 4.0 / k, 8.0 / k);
	let dash_offset = -(state.flow_time * 30.0) % (dash + gap);
	let t = ease_out_cubic(state.hover.highlight_t);

	for (edge_idx, &(n1, n2)) in state.edge_indices().iter().enumerate() {
		let (p1, p2) = (state.positions[n1], state.positions[n2]);
		let (dx, dy) = (p2.x - p1.x, p2.y - p1.y);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			continue;
		}

		let is_highlighted = (state.is_highlighted(n1) && state.is_highlighted(n2))
			|| state.hover.edge == Some(edge_idx);

		// Base values when no highlight active
		// t=0: all edges at base (0.6), t=1: highlighted at 0.9, others at 0.15
		let (edge_alpha, arrow_alpha, width) = if is_highlighted {
			(0.6 + 0.3 * t, 0.8 + 0.1 * t, line_width * (1.0 + 0.3 * t))
		} else {
			(0.6 - 0.45 * t, 0.8 - 0.45 * t, line_width * (1.0 - 0.3 * t))
		};

		ctx.set_stroke_style_str(&format!("rgba(100, 180, 255, {})", edge_alpha));
		ctx.set_line_width(width);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(
			&JsValue::from_f64(dash),
			&JsValue::from_f64(gap),
		));
		ctx.set_line_dash_offset(dash_offset);

		let (ux, uy) = (dx / dist, dy / dist);
		ctx.begin_path();
		ctx.move_to(p1.x + ux * NODE_RADIUS, p1.y + uy * NODE_RADIUS);
		ctx.line_to(
			p2.x - ux * (NODE_RADIUS + arrow_size),
			p2.y - uy * (NODE_RADIUS + arrow_size),
		);
		ctx.stroke();

		let _ = ctx.set_line_dash(&js_sys::Array::new());
		ctx.set_fill_style_str(&format!("rgba(100, 180, 255, {})", arrow_alpha));
		let (tip_x, tip_y) = (p2.x - ux * NODE_RADIUS, p2.y - uy * NODE_RADIUS);
		let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
		let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
		ctx.begin_path();
		ctx.move_to(tip_x, tip_y);
		ctx.line_to(back_x + px, back_y + py);
		ctx.line_to(back_x - px, back_y - py);
		ctx.close_path();
		ctx.fill();
	}
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_nodes(state: &ContextGraphState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);

	for (idx, p) in state.positions.iter().enumerate() {
		if has_highlight && state.is_highlighted(idx) {
			continue;
		}
		let node = &state.graph.nodes[idx];
		let (alpha, radius) = (1.0 - 0.7 * t, NODE_RADIUS * (1.0 - 0.15 * t));

		ctx.set_global_alpha(alpha);
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.risk.color());
		ctx.fill();
		if node.drift.detected {
			draw_drift_ring(ctx, p.x, p.y, radius, k);
		}
		ctx.set_global_alpha(1.0);

		if state.selected_index() == Some(idx) {
			draw_selection_ring(ctx, p.x, p.y, radius, k, 1.0);
		}

		ctx.set_fill_style_str(&format!("rgba(255, 255, 255, {})", alpha * 0.8));
		ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
		let _ = ctx.fill_text(&node.label, p.x + radius + 3.0, p.y + 3.0);
	}

	if !has_highlight {
		return;
	}

	for (idx, p) in state.positions.iter().enumerate() {
		if !state.is_highlighted(idx) {
			continue;
		}
		let node = &state.graph.nodes[idx];
		let is_hovered = state.is_hovered(idx);
		let is_neighbor =
			state.hover.neighbors.contains(&idx) || state.hover.prev_neighbors.contains(&idx);

		let (radius, glow_radius) = if is_hovered {
			(
				NODE_RADIUS * (1.0 + 0.35 * t),
				NODE_RADIUS * (1.8 + 1.2 * t),
			)
		} else if is_neighbor {
			(NODE_RADIUS * (1.0 + 0.2 * t), NODE_RADIUS * (1.4 + 0.6 * t))
		} else {
			(NODE_RADIUS, 0.0)
		};

		if glow_radius > 0.0 && t > 0.01 {
			if let Ok(gradient) = ctx.create_radial_gradient(p.x, p.y, radius * 0.3, p.x, p.y, glow_radius)
			{
				let alpha = if is_hovered { 0.35 * t } else { 0.2 * t };
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", alpha));
				let _ =
					gradient.add_color_stop(0.6, &format!("rgba(200, 220, 255, {})", alpha * 0.3));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(p.x, p.y, glow_radius, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, radius, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.risk.color());
		ctx.fill();
		if node.drift.detected {
			draw_drift_ring(ctx, p.x, p.y, radius, k);
		}

		if state.selected_index() == Some(idx) {
			draw_selection_ring(ctx, p.x, p.y, radius, k, 1.0);
		} else if is_hovered && t > 0.01 {
			draw_selection_ring(ctx, p.x, p.y, radius, k, 0.7 * t);
		}

		ctx.set_fill_style_str("white");
		ctx.set_font(&format!("{}px sans-serif", 10.0 / k.max(0.5)));
		let _ = ctx.fill_text(&node.label, p.x + radius + 3.0, p.y + 3.0);
	}
}

/// Dashed outer ring marking a node whose risk assessment drifted.
fn draw_drift_ring(ctx: &CanvasRenderingContext2d, x: f64, y: f64, radius: f64, k: f64) {
	let _ = ctx.set_line_dash(&js_sys::Array::of2(
		&JsValue::from_f64(3.0 / k),
		&JsValue::from_f64(2.0 / k),
	));
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius + 3.5 / k, 0.0, 2.0 * PI);
	ctx.set_stroke_style_str(DRIFT_RING_COLOR);
	ctx.set_line_width(1.5 / k);
	ctx.stroke();
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_selection_ring(
	ctx: &CanvasRenderingContext2d,
	x: f64,
	y: f64,
	radius: f64,
	k: f64,
	alpha: f64,
) {
	ctx.begin_path();
	let _ = ctx.arc(x, y, radius + 2.0 / k, 0.0, 2.0 * PI);
	ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", alpha));
	ctx.set_line_width(1.5 / k);
	ctx.stroke();
}

fn draw_tooltip(state: &ContextGraphState, ctx: &CanvasRenderingContext2d) {
	let lines: Vec<String> = if let Some(idx) = state.hover.node {
		let node = &state.graph.nodes[idx];
		let mut lines = vec![
			node.label.clone(),
			format!("{} / {}", node.stage.label(), node.risk.label()),
		];
		if node.drift.detected {
			lines.push(match node.drift.magnitude {
				Some(m) => format!("risk drift ({m:.2})"),
				None => "risk drift".into(),
			});
		}
		lines
	} else if let Some(idx) = state.hover.edge {
		let edge = &state.graph.edges[idx];
		let relation = edge.relation.as_deref().unwrap_or("relates to");
		vec![format!("{} {relation} {}", edge.source, edge.target)]
	} else {
		return;
	};

	ctx.set_font("12px sans-serif");
	let width = lines
		.iter()
		.filter_map(|line| ctx.measure_text(line).ok())
		.map(|m| m.width())
		.fold(0.0_f64, f64::max);
	let line_height = 16.0;
	let (pad_x, pad_y) = (8.0, 6.0);
	let box_w = width + pad_x * 2.0;
	let box_h = line_height * lines.len() as f64 + pad_y * 2.0;

	// Offset from the pointer, flipped when it would leave the canvas.
	let mut x = state.hover.pointer_x + 14.0;
	let mut y = state.hover.pointer_y - box_h - 10.0;
	if x + box_w > state.width {
		x = state.hover.pointer_x - box_w - 14.0;
	}
	if y < 0.0 {
		y = state.hover.pointer_y + 14.0;
	}

	ctx.set_fill_style_str("rgba(10, 10, 25, 0.85)");
	ctx.fill_rect(x, y, box_w, box_h);
	ctx.set_stroke_style_str("rgba(100, 180, 255, 0.5)");
	ctx.set_line_width(1.0);
	ctx.stroke_rect(x, y, box_w, box_h);

	ctx.set_fill_style_str("rgba(255, 255, 255, 0.95)");
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x + pad_x, y + pad_y + line_height * (i as f64 + 0.75));
	}
}
