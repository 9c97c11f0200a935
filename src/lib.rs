//! Interactive entity/relation graph panel for an editor webview.
//!
//! The pure core (records, normalization, leveling, fit-to-view, edit state,
//! hover controls and session sequencing) has no browser dependency; the
//! Leptos component in [`components`] binds it to a canvas.

use leptos::prelude::*;
use leptos_meta::*;
use log::{Level, info};

pub mod bridge;
pub mod components;
pub mod config;
pub mod error;
pub mod graph;
pub mod layout;
pub mod session;
pub mod source;

mod pages;

use crate::pages::home::Home;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// The panel app: document metadata plus the visualization page.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		<Title text="Node Visualizer" />

		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Home />
	}
}
