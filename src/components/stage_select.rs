//! Stage-filter control: the fixed stage vocabulary plus "all".

use leptos::prelude::*;

use crate::components::context_graph::Stage;

/// Buttons writing the active stage filter (`None` means no filter).
#[component]
pub fn StageSelect(stage: RwSignal<Option<Stage>>) -> impl IntoView {
	view! {
		<div class="stage-select">
			<button
				class:active=move || stage.get().is_none()
				on:click=move |_| stage.set(None)
			>
				"All stages"
			</button>
			{Stage::ALL
				.into_iter()
				.map(|s| {
					view! {
						<button
							class:active=move || stage.get() == Some(s)
							on:click=move |_| stage.set(Some(s))
						>
							{s.label()}
						</button>
					}
				})
				.collect_view()}
		</div>
	}
}
