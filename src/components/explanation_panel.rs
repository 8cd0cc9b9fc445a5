//! Side panel showing every attribute of the selected node.

use leptos::prelude::*;

use crate::components::context_graph::Node;

/// Render the current selection. A pure function of `node`: no selection
/// shows a placeholder, a selected node shows its derived fields, the drift
/// detail when one was detected, and a collapsible raw-JSON view of the
/// untouched source object.
#[component]
pub fn ExplanationPanel(#[prop(into)] node: Signal<Option<Node>>) -> impl IntoView {
	let show_raw = RwSignal::new(false);

	view! {
		<aside class="explanation-panel">
			{move || match node.get() {
				None => view! {
					<p class="panel-placeholder">
						"Select a node in the graph to inspect its risk assessment."
					</p>
				}
					.into_any(),
				Some(node) => {
					let engine = node.engine().map(str::to_owned);
					let raw_json = serde_json::to_string_pretty(&node.raw).unwrap_or_default();
					let drift = node.drift.clone();
					let transition = match (drift.from, drift.to) {
						(Some(from), Some(to)) => {
							Some(format!("{} \u{2192} {}", from.label(), to.label()))
						}
						_ => None,
					};

					view! {
						<div class="panel-detail">
							<h2>{node.label.clone()}</h2>
							{node.kind.clone().map(|kind| view! { <p class="panel-kind">{kind}</p> })}
							<dl>
								<dt>"Stage"</dt>
								<dd>{node.stage.label()}</dd>
								<dt>"Risk"</dt>
								<dd>
									<span class="risk-badge" style:background-color=node.risk.color()>
										{node.risk.label()}
									</span>
								</dd>
								{engine
									.map(|engine| {
										view! {
											<dt>"Engine"</dt>
											<dd>{engine}</dd>
										}
									})}
							</dl>
							{drift
								.detected
								.then(|| {
									view! {
										<div class="drift-section">
											<h3>"Risk drift"</h3>
											{drift
												.magnitude
												.map(|m| view! { <p>"Magnitude: " {format!("{m:.2}")}</p> })}
											{transition.map(|t| view! { <p>"Transition: " {t}</p> })}
										</div>
									}
								})}
							<button
								class="raw-toggle"
								on:click=move |_| show_raw.update(|v| *v = !*v)
							>
								{move || if show_raw.get() { "Hide raw node" } else { "Show raw node" }}
							</button>
							<Show when=move || show_raw.get()>
								<pre class="raw-json">{raw_json.clone()}</pre>
							</Show>
						</div>
					}
						.into_any()
				}
			}}
		</aside>
	}
}
