//! Normalization of a raw analysis-pipeline trace into the canonical graph.
//!
//! The trace is semi-trusted JSON whose schema has drifted over time, so
//! every field goes through the ordered fallback chains in
//! [`fields`](super::fields) and nothing here errors: malformed nodes
//! degrade to defaults and unusable edges are dropped with a warning.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde_json::Value;

use super::classify::classify;
use super::fields::first_str;
use super::types::{Edge, Graph, Node, Stage};

const LABEL_KEYS: &[&str] = &["label", "name"];
const STAGE_KEYS: &[&str] = &["stage", "pipeline_stage", "step", "context_stage"];
const KIND_KEYS: &[&str] = &["type", "kind"];
const RELATION_KEYS: &[&str] = &["relation", "label", "kind"];

/// Build the canonical [`Graph`] from a raw trace object.
///
/// Accepts any JSON value; missing or non-array `nodes`/`edges` members are
/// treated as empty. Node ids come out pairwise-unique (synthesized from the
/// positional index when absent, suffixed when colliding) and every surviving
/// edge references two nodes of the result.
pub fn normalize(raw: &Value) -> Graph {
	let raw_nodes = raw
		.get("nodes")
		.and_then(Value::as_array)
		.map(Vec::as_slice)
		.unwrap_or_default();
	let raw_edges = raw
		.get("edges")
		.and_then(Value::as_array)
		.map(Vec::as_slice)
		.unwrap_or_default();

	let mut nodes = Vec::with_capacity(raw_nodes.len());
	let mut used: HashSet<String> = HashSet::with_capacity(raw_nodes.len());
	// Original id reference -> resolved unique id, for rewriting edge
	// endpoints. On duplicate source ids the first occurrence keeps the
	// reference.
	let mut remap: HashMap<String, String> = HashMap::new();

	for (index, item) in raw_nodes.iter().enumerate() {
		let explicit = first_str(item, &["id"]);
		let base = explicit
			.map(str::to_owned)
			.unwrap_or_else(|| format!("node_{index}"));
		let id = unique_id(base, &used);
		used.insert(id.clone());
		if let Some(original) = explicit {
			remap.entry(original.to_owned()).or_insert_with(|| id.clone());
		}

		let label = first_str(item, LABEL_KEYS).unwrap_or(&id).to_owned();
		let stage = first_str(item, STAGE_KEYS)
			.map(Stage::parse)
			.unwrap_or(Stage::Analysis);
		let kind = first_str(item, KIND_KEYS).map(str::to_owned);
		let (risk, drift) = classify(item);

		nodes.push(Node {
			id,
			label,
			kind,
			stage,
			risk,
			drift,
			raw: item.clone(),
		});
	}

	let mut edges = Vec::with_capacity(raw_edges.len());
	for item in raw_edges {
		let (Some(source), Some(target)) =
			(first_str(item, &["source"]), first_str(item, &["target"]))
		else {
			warn!("dropping edge without source/target: {item}");
			continue;
		};
		let source = remap.get(source).map(String::as_str).unwrap_or(source);
		let target = remap.get(target).map(String::as_str).unwrap_or(target);
		if !used.contains(source) || !used.contains(target) {
			warn!("dropping edge {source} -> {target}: endpoint not in trace");
			continue;
		}
		edges.push(Edge {
			source: source.to_owned(),
			target: target.to_owned(),
			relation: first_str(item, RELATION_KEYS).map(str::to_owned),
		});
	}

	debug!(
		"normalized trace: {} nodes, {} edges ({} raw edges)",
		nodes.len(),
		edges.len(),
		raw_edges.len()
	);
	Graph { nodes, edges }
}

fn unique_id(base: String, used: &HashSet<String>) -> String {
	if !used.contains(&base) {
		return base;
	}
	let mut n = 2;
	loop {
		let candidate = format!("{base}_{n}");
		if !used.contains(&candidate) {
			return candidate;
		}
		n += 1;
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashSet;

	use serde_json::json;

	use super::*;
	use super::super::types::RiskLevel;

	#[test]
	fn empty_trace_yields_empty_graph() {
		let g = normalize(&json!({ "nodes": [], "edges": [] }));
		assert!(g.nodes.is_empty());
		assert!(g.edges.is_empty());
	}

	#[test]
	fn missing_members_are_treated_as_empty() {
		assert_eq!(normalize(&json!({})), Graph::default());
		assert_eq!(normalize(&json!(null)), Graph::default());
		assert_eq!(normalize(&json!({ "nodes": "oops" })), Graph::default());
	}

	#[test]
	fn ids_are_unique_for_duplicate_and_missing_sources() {
		let g = normalize(&json!({
			"nodes": [
				{ "id": "a" },
				{ "id": "a" },
				{},
				{ "id": 7 },
				{ "id": "node_2" },
			],
			"edges": [],
		}));
		let ids: Vec<&str> = g.nodes.iter().map(|n| n.id.as_str()).collect();
		let distinct: HashSet<&&str> = ids.iter().collect();
		assert_eq!(distinct.len(), ids.len(), "ids not pairwise unique: {ids:?}");
		assert_eq!(ids[0], "a");
		assert_eq!(ids[1], "a_2");
		assert_eq!(ids[2], "node_2");
		// a non-string id counts as missing
		assert_eq!(ids[3], "node_3");
		assert_eq!(ids[4], "node_2_2");
	}

	#[test]
	fn edges_referencing_duplicates_attach_to_the_first_occurrence() {
		let g = normalize(&json!({
			"nodes": [{ "id": "a" }, { "id": "a" }, { "id": "b" }],
			"edges": [{ "source": "a", "target": "b" }],
		}));
		assert_eq!(g.edges.len(), 1);
		assert_eq!(g.edges[0].source, "a");
	}

	#[test]
	fn dangling_edge_is_dropped() {
		let g = normalize(&json!({
			"nodes": [{ "id": "a" }],
			"edges": [{ "source": "a", "target": "b" }],
		}));
		assert_eq!(g.nodes.len(), 1);
		assert_eq!(g.nodes[0].id, "a");
		assert!(g.edges.is_empty());
	}

	#[test]
	fn edge_without_endpoints_is_dropped_not_fatal() {
		let g = normalize(&json!({
			"nodes": [{ "id": "a" }, { "id": "b" }],
			"edges": [
				{ "source": "a" },
				{ "target": "b" },
				{},
				{ "source": "a", "target": "b", "relation": "feeds" },
			],
		}));
		assert_eq!(g.edges.len(), 1);
		assert_eq!(g.edges[0].relation.as_deref(), Some("feeds"));
	}

	#[test]
	fn referential_integrity_holds_for_all_surviving_edges() {
		let g = normalize(&json!({
			"nodes": [{ "id": "a" }, {}, { "id": "c" }],
			"edges": [
				{ "source": "a", "target": "c" },
				{ "source": "c", "target": "node_1" },
				{ "source": "ghost", "target": "a" },
			],
		}));
		assert_eq!(g.edges.len(), 2);
		for e in &g.edges {
			assert!(g.contains(&e.source));
			assert!(g.contains(&e.target));
		}
	}

	#[test]
	fn label_falls_back_to_name_then_id() {
		let g = normalize(&json!({
			"nodes": [
				{ "id": "a", "label": "Prompt intake", "name": "ignored" },
				{ "id": "b", "name": "Safety gate" },
				{ "id": "c" },
			],
		}));
		assert_eq!(g.nodes[0].label, "Prompt intake");
		assert_eq!(g.nodes[1].label, "Safety gate");
		assert_eq!(g.nodes[2].label, "c");
	}

	#[test]
	fn stage_chain_and_default() {
		let g = normalize(&json!({
			"nodes": [
				{ "id": "a", "stage": "input" },
				{ "id": "b", "pipeline_stage": "safety" },
				{ "id": "c", "step": "score" },
				{ "id": "d", "context_stage": "routing" },
				{ "id": "e" },
				{ "id": "f", "stage": "warmup" },
			],
		}));
		let stages: Vec<Stage> = g.nodes.iter().map(|n| n.stage).collect();
		assert_eq!(
			stages,
			[
				Stage::Input,
				Stage::Safety,
				Stage::Score,
				Stage::Routing,
				Stage::Analysis,
				Stage::Analysis,
			]
		);
	}

	#[test]
	fn classification_and_raw_payload_are_carried() {
		let raw_node = json!({
			"id": "gate",
			"severity": "High",
			"risk_before": "low",
			"risk_after": "high",
			"drift_score": 0.6,
			"engine": "guardrail-v2",
		});
		let g = normalize(&json!({ "nodes": [raw_node.clone()] }));
		let n = &g.nodes[0];
		assert_eq!(n.risk, RiskLevel::High);
		assert!(n.drift.detected);
		assert_eq!(n.drift.magnitude, Some(0.6));
		assert_eq!(n.raw, raw_node);
	}

	#[test]
	fn input_is_not_mutated() {
		let raw = json!({
			"nodes": [{ "id": "a" }, { "id": "a" }],
			"edges": [{ "source": "a", "target": "missing" }],
		});
		let copy = raw.clone();
		let _ = normalize(&raw);
		assert_eq!(raw, copy);
	}
}
