use leptos::prelude::*;
use leptos::task::spawn_local;
use log::{debug, error, info, warn};
use wasm_bindgen::prelude::*;
use web_sys::MessageEvent;

use crate::bridge::{HostBridge, HostMessage, PanelMessage, VsCodeBridge};
use crate::components::force_graph::GraphPanel;
use crate::graph::NetworkData;
use crate::source::{load_config, load_network};

fn alert_host(text: String) {
	if let Err(e) = VsCodeBridge.post(&HostMessage::Alert { text }) {
		warn!("failed to alert host: {e}");
	}
}

/// The visualization page: loads the injected records and reloads them
/// whenever the host asks for a refresh.
#[component]
pub fn Home() -> impl IntoView {
	let config = load_config();
	let graph = RwSignal::new(None::<NetworkData>);

	let reload = {
		let config = config.clone();
		move || {
			let config = config.clone();
			spawn_local(async move {
				match load_network(&config).await {
					Ok(network) => graph.set(Some(network)),
					Err(e) => {
						error!("failed to initialize network: {e}");
						graph.set(None);
						alert_host(format!("Failed to initialize network: {e}"));
					}
				}
			});
		}
	};
	reload();

	let on_message = Closure::<dyn FnMut(MessageEvent)>::new(move |ev: MessageEvent| {
		let Some(json) = js_sys::JSON::stringify(&ev.data()).ok().and_then(|s| s.as_string()) else {
			return;
		};
		match PanelMessage::from_json(&json) {
			Ok(PanelMessage::Refresh) => {
				info!("host requested refresh");
				reload();
			}
			Ok(PanelMessage::Unknown) => debug!("ignoring host message {json}"),
			Err(e) => debug!("ignoring malformed host message: {e}"),
		}
	});
	if let Some(window) = web_sys::window() {
		if let Err(e) = window.add_event_listener_with_callback("message", on_message.as_ref().unchecked_ref()) {
			warn!("failed to listen for host messages: {:?}", e);
		}
	}
	// Lives as long as the page.
	on_message.forget();

	view! {
		<div class="container">
			<header>
				<h1>"MCP Visualization"</h1>
			</header>
			<main class="graph-container">
				<GraphPanel data=graph config=config />
			</main>
		</div>
	}
}
