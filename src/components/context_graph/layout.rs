//! 2-D position computation for the canonical graph.
//!
//! Providers are tried in order: the force-directed simulation first, the
//! deterministic grid as fallback. Positions are in world space centered on
//! the origin; the view transform places them on the canvas. Layout runs
//! once per graph rebuild and is never re-entered by selection or hover
//! changes.

use std::collections::HashMap;
use std::f64::consts::PI;
use std::fmt;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, warn};

use super::types::Graph;

/// World-space coordinates for one node.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

/// Why a layout provider could not place the graph.
#[derive(Debug, PartialEq, Eq)]
pub enum LayoutError {
	EmptyGraph,
	/// The simulation produced a NaN or infinite coordinate for this node
	/// index.
	NonFinite(usize),
}

impl fmt::Display for LayoutError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			LayoutError::EmptyGraph => write!(f, "graph has no nodes"),
			LayoutError::NonFinite(i) => write!(f, "non-finite position for node {i}"),
		}
	}
}

/// One placement strategy. Implementations must terminate on any input.
pub trait LayoutProvider {
	fn name(&self) -> &'static str;
	fn layout(&self, graph: &Graph, width: f64, height: f64) -> Result<Vec<Point>, LayoutError>;
}

/// Radius of the circle nodes are seeded on before relaxation.
const SEED_RADIUS: f64 = 100.0;
/// Fixed iteration cap; the simulation is never run open-ended.
const ITERATIONS: usize = 300;
const TICK_DT: f32 = 0.016;

/// Force-directed placement: attraction along edges, repulsion between all
/// node pairs, relaxed for a bounded number of iterations.
pub struct ForceDirectedLayout;

impl LayoutProvider for ForceDirectedLayout {
	fn name(&self) -> &'static str {
		"force-directed"
	}

	fn layout(&self, graph: &Graph, _width: f64, _height: f64) -> Result<Vec<Point>, LayoutError> {
		if graph.nodes.is_empty() {
			return Err(LayoutError::EmptyGraph);
		}

		let mut sim = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});

		let mut indices = Vec::with_capacity(graph.nodes.len());
		for (i, _) in graph.nodes.iter().enumerate() {
			// Deterministic seeding: evenly spaced on a circle so no two
			// nodes start coincident.
			let angle = (i as f64) * 2.0 * PI / graph.nodes.len() as f64;
			indices.push(sim.add_node(NodeData {
				x: (SEED_RADIUS * angle.cos()) as f32,
				y: (SEED_RADIUS * angle.sin()) as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: i,
			}));
		}

		let slot: HashMap<&str, usize> = graph
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| (n.id.as_str(), i))
			.collect();
		for edge in &graph.edges {
			if let (Some(&s), Some(&t)) = (slot.get(edge.source.as_str()), slot.get(edge.target.as_str()))
			{
				sim.add_edge(indices[s], indices[t], EdgeData::default());
			}
		}

		for _ in 0..ITERATIONS {
			sim.update(TICK_DT);
		}

		let mut points = vec![Point::default(); graph.nodes.len()];
		let mut bad = None;
		sim.visit_nodes(|node| {
			let (x, y) = (node.x() as f64, node.y() as f64);
			if !x.is_finite() || !y.is_finite() {
				bad = Some(node.data.user_data);
			}
			points[node.data.user_data] = Point { x, y };
		});
		if let Some(i) = bad {
			return Err(LayoutError::NonFinite(i));
		}
		Ok(points)
	}
}

/// Deterministic `ceil(sqrt(n))`-column grid, row-major, centered on the
/// origin.
pub struct GridLayout;

impl LayoutProvider for GridLayout {
	fn name(&self) -> &'static str {
		"grid"
	}

	fn layout(&self, graph: &Graph, width: f64, height: f64) -> Result<Vec<Point>, LayoutError> {
		let n = graph.nodes.len();
		if n == 0 {
			return Err(LayoutError::EmptyGraph);
		}
		let cols = (n as f64).sqrt().ceil() as usize;
		let rows = n.div_ceil(cols);
		let cell_w = (width * 0.8) / cols as f64;
		let cell_h = (height * 0.8) / rows as f64;
		Ok((0..n)
			.map(|i| {
				let (col, row) = (i % cols, i / cols);
				Point {
					x: (col as f64 + 0.5 - cols as f64 / 2.0) * cell_w,
					y: (row as f64 + 0.5 - rows as f64 / 2.0) * cell_h,
				}
			})
			.collect())
	}
}

/// Place every node of `graph`, falling through the provider chain.
///
/// An empty graph short-circuits before any provider runs. A provider
/// failure is logged and the next one is tried; if the whole chain fails the
/// nodes are left at the origin rather than aborting the render.
pub fn compute_layout(graph: &Graph, width: f64, height: f64) -> Vec<Point> {
	if graph.nodes.is_empty() {
		return Vec::new();
	}

	const PROVIDERS: [&dyn LayoutProvider; 2] = [&ForceDirectedLayout, &GridLayout];
	for provider in PROVIDERS {
		match provider.layout(graph, width, height) {
			Ok(points) => {
				debug!("{} layout placed {} nodes", provider.name(), points.len());
				return points;
			}
			Err(err) => warn!("{} layout failed: {err}", provider.name()),
		}
	}
	warn!("no layout provider succeeded; rendering without computed positions");
	vec![Point::default(); graph.nodes.len()]
}
