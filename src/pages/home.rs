use leptos::prelude::*;
use serde_json::{Value, json};

use crate::components::context_graph::{ContextGraphCanvas, Stage, normalize};
use crate::components::explanation_panel::ExplanationPanel;
use crate::components::stage_select::StageSelect;

/// Captured analysis run shown until a live trace feed is wired in.
///
/// Field names deliberately span the trace-schema versions the normalizer
/// accepts (`risk_level`/`risk`/`level`/`severity`, `stage`/`pipeline_stage`/
/// `step`/`context_stage`, ...), including one edge with a missing endpoint.
fn sample_trace() -> Value {
	json!({
		"nodes": [
			{ "id": "prompt", "label": "User prompt", "type": "artifact", "stage": "input" },
			{ "id": "policy_ctx", "name": "Policy context", "type": "artifact", "pipeline_stage": "input" },
			{ "id": "router", "label": "Route selection", "type": "model-call", "stage": "routing", "risk": "low" },
			{ "id": "gen_model", "label": "Generation model", "type": "model-call", "stage": "models", "risk_level": "medium", "engine": "gen-7b" },
			{ "id": "aux_model", "name": "Aux summarizer", "type": "model-call", "step": "models", "level": "low" },
			{
				"id": "align_check",
				"label": "Alignment check",
				"type": "risk-check",
				"stage": "alignment",
				"risk_level": "high",
				"risk_before": "low",
				"risk_after": "high",
				"drift_score": 0.62,
				"engine": "align-probe",
			},
			{
				"id": "safety_gate",
				"label": "Safety gate",
				"type": "risk-check",
				"stage": "safety",
				"severity": "Critical",
				"changed": true,
				"engine": "guardrail-v2",
			},
			{ "id": "toxicity", "name": "Toxicity scan", "type": "risk-check", "context_stage": "safety", "severity": "low" },
			{
				"id": "score",
				"label": "Risk score",
				"type": "aggregation",
				"stage": "score",
				"risk": "high",
				"previous_risk": "medium",
				"current_risk": "high",
			},
			{ "id": "verdict", "label": "Final verdict", "stage": "analysis", "risk_level": "high" },
		],
		"edges": [
			{ "source": "prompt", "target": "router", "relation": "feeds" },
			{ "source": "policy_ctx", "target": "router", "relation": "informs" },
			{ "source": "router", "target": "gen_model", "relation": "dispatches" },
			{ "source": "router", "target": "aux_model", "relation": "dispatches" },
			{ "source": "gen_model", "target": "align_check", "relation": "feeds" },
			{ "source": "gen_model", "target": "safety_gate", "relation": "feeds" },
			{ "source": "aux_model", "target": "toxicity", "relation": "feeds" },
			{ "source": "align_check", "target": "score", "relation": "scores" },
			{ "source": "safety_gate", "target": "score", "relation": "scores" },
			{ "source": "toxicity", "target": "score", "relation": "scores" },
			{ "source": "score", "target": "verdict", "relation": "concludes" },
			// the upstream debug API sometimes references pruned nodes
			{ "source": "verdict", "target": "audit_log", "relation": "records" },
		],
	})
}

/// Dashboard page: stage filter, graph canvas, and the explanation panel.
#[component]
pub fn Home() -> impl IntoView {
	let trace = Signal::derive(move || sample_trace());
	let graph = Memo::new(move |_| normalize(&trace.get()));

	let stage = RwSignal::new(None::<Stage>);
	let filtered = Memo::new(move |_| graph.get().filter_by_stage(stage.get()));

	// Selection is an id re-resolved against every rebuilt graph, never a
	// pointer into a prior graph value. An id that did not survive the
	// rebuild resets to no selection.
	let selected = RwSignal::new(None::<String>);
	Effect::new(move |_| {
		let current = filtered.get();
		if let Some(id) = selected.get_untracked() {
			if !current.contains(&id) {
				selected.set(None);
			}
		}
	});

	let selected_node =
		Memo::new(move |_| selected.get().and_then(|id| filtered.get().node(&id).cloned()));

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

			<div class="dashboard">
				<header class="dashboard-header">
					<h1>"Analysis Pipeline Context Graph"</h1>
					<StageSelect stage=stage />
				</header>
				<main class="dashboard-body">
					<section class="graph-pane">
						<Show
							when=move || !filtered.get().nodes.is_empty()
							fallback=|| {
								view! {
									<div class="empty-state">
										<p>"No trace data for this stage."</p>
									</div>
								}
							}
						>
							<ContextGraphCanvas data=filtered selected=selected />
							<div class="graph-overlay">
								<p class="subtitle">
									"Click a node to inspect it. Scroll to zoom, drag the background to pan."
								</p>
							</div>
						</Show>
					</section>
					<ExplanationPanel node=selected_node />
				</main>
			</div>
		</ErrorBoundary>
	}
}
