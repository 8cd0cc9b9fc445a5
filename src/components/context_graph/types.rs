//! Canonical graph model produced by trace normalization.

use std::collections::HashSet;

use log::debug;
use serde::Serialize;
use serde_json::Value;

use super::fields;

/// Pipeline phase vocabulary. Source strings outside the vocabulary parse
/// to [`Stage::Analysis`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
	Input,
	Routing,
	Models,
	Alignment,
	Safety,
	Score,
	Analysis,
}

impl Stage {
	/// Every stage, in pipeline order. Drives the stage-filter control.
	pub const ALL: [Stage; 7] = [
		Stage::Input,
		Stage::Routing,
		Stage::Models,
		Stage::Alignment,
		Stage::Safety,
		Stage::Score,
		Stage::Analysis,
	];

	pub fn parse(value: &str) -> Self {
		match value.trim().to_ascii_lowercase().as_str() {
			"input" => Stage::Input,
			"routing" => Stage::Routing,
			"models" => Stage::Models,
			"alignment" => Stage::Alignment,
			"safety" => Stage::Safety,
			"score" => Stage::Score,
			_ => Stage::Analysis,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Stage::Input => "Input",
			Stage::Routing => "Routing",
			Stage::Models => "Models",
			Stage::Alignment => "Alignment",
			Stage::Safety => "Safety",
			Stage::Score => "Score",
			Stage::Analysis => "Analysis",
		}
	}
}

/// Discrete risk vocabulary. Unrecognized source strings parse to
/// [`RiskLevel::Safe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
	Critical,
	High,
	Medium,
	Low,
	Safe,
}

impl RiskLevel {
	pub fn parse(value: &str) -> Self {
		match value.trim().to_ascii_lowercase().as_str() {
			"critical" => RiskLevel::Critical,
			"high" => RiskLevel::High,
			"medium" => RiskLevel::Medium,
			"low" => RiskLevel::Low,
			_ => RiskLevel::Safe,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			RiskLevel::Critical => "Critical",
			RiskLevel::High => "High",
			RiskLevel::Medium => "Medium",
			RiskLevel::Low => "Low",
			RiskLevel::Safe => "Safe",
		}
	}

	/// Badge and node fill color for this level.
	pub fn color(self) -> &'static str {
		match self {
			RiskLevel::Critical => "#d62728",
			RiskLevel::High => "#ff7f0e",
			RiskLevel::Medium => "#bcbd22",
			RiskLevel::Low => "#1f77b4",
			RiskLevel::Safe => "#2ca02c",
		}
	}
}

/// Result of the before/after risk comparison for one node.
///
/// `from`/`to` are retained whenever the source carried a before/after pair
/// so the transition can be shown even when only the magnitude tripped the
/// detection.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Drift {
	pub detected: bool,
	pub magnitude: Option<f64>,
	pub from: Option<RiskLevel>,
	pub to: Option<RiskLevel>,
}

/// One artifact or decision point of an analysis run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Node {
	pub id: String,
	pub label: String,
	pub kind: Option<String>,
	pub stage: Stage,
	pub risk: RiskLevel,
	pub drift: Drift,
	/// Untouched source object, kept for full inspection.
	pub raw: Value,
}

const ENGINE_KEYS: &[&str] = &["engine", "source_engine"];

impl Node {
	/// Source-engine attribution, when the raw payload carries one.
	pub fn engine(&self) -> Option<&str> {
		fields::first_str(&self.raw, ENGINE_KEYS)
	}
}

/// Directed relation between two node ids of the same graph.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Edge {
	pub source: String,
	pub target: String,
	pub relation: Option<String>,
}

/// Normalized node/edge set. Node ids are pairwise-unique and every edge
/// endpoint references a node in `nodes`; both hold for any graph built by
/// [`normalize`](super::normalize) or returned by [`Graph::filter_by_stage`].
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Graph {
	pub nodes: Vec<Node>,
	pub edges: Vec<Edge>,
}

impl Graph {
	pub fn node(&self, id: &str) -> Option<&Node> {
		self.nodes.iter().find(|n| n.id == id)
	}

	pub fn contains(&self, id: &str) -> bool {
		self.node(id).is_some()
	}

	/// Restrict the graph to one pipeline stage. `None` means no filter and
	/// returns the graph unchanged. Edges losing an endpoint are dropped so
	/// the referential invariant keeps holding on the reduced node set.
	pub fn filter_by_stage(&self, stage: Option<Stage>) -> Graph {
		let Some(stage) = stage else {
			return self.clone();
		};

		let nodes: Vec<Node> = self
			.nodes
			.iter()
			.filter(|n| n.stage == stage)
			.cloned()
			.collect();
		let kept: HashSet<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
		let edges: Vec<Edge> = self
			.edges
			.iter()
			.filter(|e| kept.contains(e.source.as_str()) && kept.contains(e.target.as_str()))
			.cloned()
			.collect();

		debug!(
			"stage filter {}: {}/{} nodes, {}/{} edges",
			stage.label(),
			nodes.len(),
			self.nodes.len(),
			edges.len(),
			self.edges.len()
		);
		Graph { nodes, edges }
	}
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	fn node(id: &str, stage: Stage) -> Node {
		Node {
			id: id.into(),
			label: id.into(),
			kind: None,
			stage,
			risk: RiskLevel::Safe,
			drift: Drift::default(),
			raw: json!({}),
		}
	}

	fn edge(source: &str, target: &str) -> Edge {
		Edge {
			source: source.into(),
			target: target.into(),
			relation: None,
		}
	}

	fn sample() -> Graph {
		Graph {
			nodes: vec![
				node("in", Stage::Input),
				node("route", Stage::Routing),
				node("check", Stage::Safety),
				node("check2", Stage::Safety),
			],
			edges: vec![
				edge("in", "route"),
				edge("route", "check"),
				edge("check", "check2"),
			],
		}
	}

	#[test]
	fn no_filter_is_identity() {
		let g = sample();
		assert_eq!(g.filter_by_stage(None), g);
	}

	#[test]
	fn filter_keeps_only_matching_stage() {
		let filtered = sample().filter_by_stage(Some(Stage::Safety));
		let ids: Vec<&str> = filtered.nodes.iter().map(|n| n.id.as_str()).collect();
		assert_eq!(ids, ["check", "check2"]);
	}

	#[test]
	fn filter_drops_edges_losing_an_endpoint() {
		let filtered = sample().filter_by_stage(Some(Stage::Safety));
		assert_eq!(filtered.edges, vec![edge("check", "check2")]);
		for e in &filtered.edges {
			assert!(filtered.contains(&e.source));
			assert!(filtered.contains(&e.target));
		}
	}

	#[test]
	fn filter_is_idempotent() {
		let once = sample().filter_by_stage(Some(Stage::Safety));
		let twice = once.filter_by_stage(Some(Stage::Safety));
		assert_eq!(once, twice);
	}

	#[test]
	fn filter_does_not_mutate_input() {
		let g = sample();
		let before = g.clone();
		let _ = g.filter_by_stage(Some(Stage::Input));
		assert_eq!(g, before);
	}

	#[test]
	fn stage_parse_falls_back_to_analysis() {
		assert_eq!(Stage::parse("safety"), Stage::Safety);
		assert_eq!(Stage::parse("SCORE"), Stage::Score);
		assert_eq!(Stage::parse("preflight"), Stage::Analysis);
	}

	#[test]
	fn risk_parse_falls_back_to_safe() {
		assert_eq!(RiskLevel::parse("Critical"), RiskLevel::Critical);
		assert_eq!(RiskLevel::parse("  high "), RiskLevel::High);
		assert_eq!(RiskLevel::parse("mild"), RiskLevel::Safe);
	}

	#[test]
	fn engine_attribution_reads_fallback_keys() {
		let mut n = node("a", Stage::Input);
		assert_eq!(n.engine(), None);
		n.raw = json!({ "source_engine": "guardrail-v2" });
		assert_eq!(n.engine(), Some("guardrail-v2"));
		n.raw = json!({ "engine": "triage", "source_engine": "guardrail-v2" });
		assert_eq!(n.engine(), Some("triage"));
	}
}
