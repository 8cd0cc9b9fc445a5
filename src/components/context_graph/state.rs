//! Canvas-side state: computed layout, view transform, and the pointer
//! interaction model (selection, hover tooltip, drag, pan).
//!
//! Kept free of `web_sys` so the selection and hit-testing logic runs under
//! plain host-target tests. Positions are computed once in [`new`]; the
//! per-frame [`tick`] only advances overlay animation, never the physics.
//!
//! [`new`]: ContextGraphState::new
//! [`tick`]: ContextGraphState::tick

use std::collections::{HashMap, HashSet};

use super::layout::{Point, compute_layout};
use super::types::Graph;

pub const NODE_RADIUS: f64 = 6.0;
pub const HIT_RADIUS: f64 = 12.0;
/// World-space distance within which a pointer counts as over an edge.
pub const EDGE_HIT_DISTANCE: f64 = 5.0;
/// Pointer travel (screen px) past which a press stops being a click.
pub const CLICK_DRAG_TOLERANCE: f64 = 4.0;

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<usize>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start: Point,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Transient pointer-over state. `node`/`edge` clear the moment the pointer
/// leaves the element; the `prev_*` fields only drive the highlight
/// fade-out and never anchor a tooltip.
#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub edge: Option<usize>,
	pub pointer_x: f64,
	pub pointer_y: f64,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
	delay_t: f64,
}

/// Everything the render pass reads, rebuilt wholesale per (trace, stage
/// filter) pair. Replacing the value is what discards a superseded layout.
pub struct ContextGraphState {
	pub graph: Graph,
	pub positions: Vec<Point>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub press: Option<(f64, f64)>,
	pub width: f64,
	pub height: f64,
	pub flow_time: f64,
	selected: Option<usize>,
	edges: Vec<(usize, usize)>,
}

impl ContextGraphState {
	pub fn new(graph: Graph, width: f64, height: f64) -> Self {
		let positions = compute_layout(&graph, width, height);
		let slot: HashMap<&str, usize> = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.as_str(), i))
			.collect();
		let edges = graph
			.edges
			.iter()
			.filter_map(|e| Some((*slot.get(e.source.as_str())?, *slot.get(e.target.as_str())?)))
			.collect();

		Self {
			graph,
			positions,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			press: None,
			width,
			height,
			flow_time: 0.0,
			selected: None,
			edges,
		}
	}

	/// Edge endpoints as node indices, aligned with `graph.edges`.
	pub fn edge_indices(&self) -> &[(usize, usize)] {
		&self.edges
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		for (i, p) in self.positions.iter().enumerate() {
			let (dx, dy) = (p.x - gx, p.y - gy);
			// HIT_RADIUS is in world-space, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(i);
			}
		}
		found
	}

	pub fn edge_at_position(&self, sx: f64, sy: f64) -> Option<usize> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		self.edges.iter().position(|&(a, b)| {
			segment_distance(self.positions[a], self.positions[b], gx, gy) < EDGE_HIT_DISTANCE
		})
	}

	/// Id of the selected node, if one is selected.
	pub fn selected_id(&self) -> Option<&str> {
		self.selected.map(|i| self.graph.nodes[i].id.as_str())
	}

	pub fn selected_index(&self) -> Option<usize> {
		self.selected
	}

	pub fn set_selected(&mut self, node: Option<usize>) {
		self.selected = node.filter(|&i| i < self.graph.nodes.len());
	}

	/// Re-resolve a selection held by id against this graph. Ids that did
	/// not survive the rebuild resolve to no selection.
	pub fn resolve_selection(&mut self, id: Option<&str>) {
		self.selected = id.and_then(|id| self.graph.nodes.iter().position(|n| n.id == id));
	}

	pub fn set_hover(&mut self, node: Option<usize>, sx: f64, sy: f64) {
		self.hover.pointer_x = sx;
		self.hover.pointer_y = sy;
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for &(src, tgt) in &self.edges {
				if src == idx {
					self.hover.neighbors.insert(tgt);
				} else if tgt == idx {
					self.hover.neighbors.insert(src);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: usize) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	/// Advance overlay animation (edge flow, highlight fade). Does not move
	/// nodes.
	pub fn tick(&mut self, dt: f64) {
		self.flow_time += dt;

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn move_node(&mut self, idx: usize, x: f64, y: f64) {
		if let Some(p) = self.positions.get_mut(idx) {
			*p = Point { x, y };
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

fn segment_distance(a: Point, b: Point, px: f64, py: f64) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len_sq = dx * dx + dy * dy;
	let t = if len_sq == 0.0 {
		0.0
	} else {
		(((px - a.x) * dx + (py - a.y) * dy) / len_sq).clamp(0.0, 1.0)
	};
	let (cx, cy) = (a.x + t * dx, a.y + t * dy);
	((px - cx) * (px - cx) + (py - cy) * (py - cy)).sqrt()
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::super::normalize;
	use super::*;

	fn state_from(trace: serde_json::Value) -> ContextGraphState {
		ContextGraphState::new(normalize(&trace), 800.0, 600.0)
	}

	fn screen_of(state: &ContextGraphState, idx: usize) -> (f64, f64) {
		let p = state.positions[idx];
		(
			p.x * state.transform.k + state.transform.x,
			p.y * state.transform.k + state.transform.y,
		)
	}

	#[test]
	fn selection_survives_rebuild_when_id_persists() {
		let mut state = state_from(json!({
			"nodes": [{ "id": "n1" }, { "id": "n2" }],
			"edges": [{ "source": "n1", "target": "n2" }],
		}));
		state.resolve_selection(Some("n1"));
		assert_eq!(state.selected_id(), Some("n1"));

		let kept = state.selected_id().map(str::to_owned);
		let mut rebuilt = state_from(json!({
			"nodes": [{ "id": "n0" }, { "id": "n1" }],
		}));
		rebuilt.resolve_selection(kept.as_deref());
		assert_eq!(rebuilt.selected_id(), Some("n1"));
	}

	#[test]
	fn selection_resets_when_id_vanishes() {
		let mut state = state_from(json!({ "nodes": [{ "id": "n1" }] }));
		state.resolve_selection(Some("n1"));

		let kept = state.selected_id().map(str::to_owned);
		let mut rebuilt = state_from(json!({ "nodes": [{ "id": "other" }] }));
		rebuilt.resolve_selection(kept.as_deref());
		assert_eq!(rebuilt.selected_id(), None);
	}

	#[test]
	fn clicking_any_node_replaces_the_selection() {
		let mut state = state_from(json!({ "nodes": [{ "id": "a" }, { "id": "b" }] }));
		state.set_selected(Some(0));
		state.set_selected(Some(1));
		assert_eq!(state.selected_id(), Some("b"));
		state.set_selected(None);
		assert_eq!(state.selected_id(), None);
	}

	#[test]
	fn out_of_range_selection_is_ignored() {
		let mut state = state_from(json!({ "nodes": [{ "id": "a" }] }));
		state.set_selected(Some(5));
		assert_eq!(state.selected_id(), None);
	}

	#[test]
	fn node_hit_testing_respects_the_view_transform() {
		let mut state = state_from(json!({ "nodes": [{ "id": "a" }, { "id": "b" }] }));
		state.transform.k = 2.0;
		let (sx, sy) = screen_of(&state, 1);
		assert_eq!(state.node_at_position(sx, sy), Some(1));
		assert_eq!(state.node_at_position(sx + 500.0, sy + 500.0), None);
	}

	#[test]
	fn edge_hit_testing_finds_the_midpoint() {
		let mut state = state_from(json!({
			"nodes": [{ "id": "a" }, { "id": "b" }],
			"edges": [{ "source": "a", "target": "b" }],
		}));
		// Pin the endpoints so the midpoint is known.
		state.move_node(0, -50.0, 0.0);
		state.move_node(1, 50.0, 0.0);
		let (sx, sy) = (state.transform.x, state.transform.y);
		assert_eq!(state.edge_at_position(sx, sy), Some(0));
		assert_eq!(state.edge_at_position(sx, sy + 100.0), None);
	}

	#[test]
	fn hover_tracks_neighbors_and_clears_immediately() {
		let mut state = state_from(json!({
			"nodes": [{ "id": "a" }, { "id": "b" }, { "id": "c" }],
			"edges": [
				{ "source": "a", "target": "b" },
				{ "source": "c", "target": "a" },
			],
		}));
		state.set_hover(Some(0), 10.0, 20.0);
		assert_eq!(state.hover.node, Some(0));
		assert_eq!(state.hover.neighbors, HashSet::from([1, 2]));
		assert_eq!((state.hover.pointer_x, state.hover.pointer_y), (10.0, 20.0));

		state.set_hover(None, 11.0, 21.0);
		assert_eq!(state.hover.node, None, "tooltip anchor must clear at once");
		// fade-out bookkeeping may linger
		assert_eq!(state.hover.prev_node, Some(0));
	}

	#[test]
	fn hover_never_touches_selection() {
		let mut state = state_from(json!({ "nodes": [{ "id": "a" }, { "id": "b" }] }));
		state.set_selected(Some(0));
		state.set_hover(Some(1), 0.0, 0.0);
		state.set_hover(None, 0.0, 0.0);
		assert_eq!(state.selected_id(), Some("a"));
	}

	#[test]
	fn tick_leaves_positions_alone() {
		let mut state = state_from(json!({
			"nodes": [{ "id": "a" }, { "id": "b" }],
			"edges": [{ "source": "a", "target": "b" }],
		}));
		let before = state.positions.clone();
		state.set_hover(Some(0), 0.0, 0.0);
		for _ in 0..120 {
			state.tick(0.016);
		}
		assert_eq!(state.positions, before);
	}

	#[test]
	fn empty_graph_builds_an_inert_state() {
		let mut state = state_from(json!({ "nodes": [], "edges": [] }));
		assert!(state.positions.is_empty());
		assert_eq!(state.node_at_position(400.0, 300.0), None);
		assert_eq!(state.edge_at_position(400.0, 300.0), None);
		state.tick(0.016);
		assert_eq!(state.selected_id(), None);
	}

	#[test]
	fn segment_distance_handles_degenerate_segments() {
		let p = Point { x: 3.0, y: 4.0 };
		assert_eq!(segment_distance(p, p, 0.0, 0.0), 5.0);
	}
}
