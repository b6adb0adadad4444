use leptos::prelude::*;
use leptos_meta::Title;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<Title text="Not found" />
		<h1>"Uh oh!" <br /> "This map doesn't exist."</h1>
		<a href="/">"Back to the mind map"</a>
	}
}
