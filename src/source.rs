//! Reads the records and panel options the host injects into the webview.

use std::time::Duration;

use log::{debug, info, warn};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

use crate::config::PanelConfig;
use crate::error::LoadError;
use crate::graph::records::parse_records;
use crate::graph::{self, NetworkData};

const DATA_GLOBAL: &str = "rawVisData";
const CONFIG_GLOBAL: &str = "visConfig";

fn js_error(e: JsValue) -> LoadError {
	LoadError::Js(format!("{:?}", e))
}

/// Stringified `window[name]`, or `None` when it is unset.
fn read_global(name: &str) -> Result<Option<String>, LoadError> {
	let window = web_sys::window().ok_or_else(|| LoadError::Js("no window".into()))?;
	let value = js_sys::Reflect::get(&window, &JsValue::from_str(name)).map_err(js_error)?;
	if value.is_undefined() || value.is_null() {
		return Ok(None);
	}
	let json = js_sys::JSON::stringify(&value).map_err(js_error)?;
	Ok(json.as_string())
}

async fn sleep(after: Duration) -> Result<(), LoadError> {
	let window = web_sys::window().ok_or_else(|| LoadError::Js("no window".into()))?;
	let timeout = i32::try_from(after.as_millis()).unwrap_or(i32::MAX);
	let promise = js_sys::Promise::new(&mut |resolve, _| {
		if let Err(e) = window.set_timeout_with_callback_and_timeout_and_arguments_0(&resolve, timeout) {
			warn!("failed to schedule load: {:?}", e);
		}
	});
	JsFuture::from(promise).await.map_err(js_error)?;
	Ok(())
}

/// Panel options from `window.visConfig`; defaults when absent or invalid.
pub fn load_config() -> PanelConfig {
	match read_global(CONFIG_GLOBAL) {
		Ok(Some(json)) => PanelConfig::from_json(&json).unwrap_or_else(|e| {
			warn!("ignoring invalid panel config: {e}");
			PanelConfig::default()
		}),
		Ok(None) => PanelConfig::default(),
		Err(e) => {
			warn!("failed to read panel config: {e}");
			PanelConfig::default()
		}
	}
}

/// Wait out the host's injection latency, then parse and normalize
/// `window.rawVisData`.
pub async fn load_network(config: &PanelConfig) -> Result<NetworkData, LoadError> {
	sleep(config.load_latency()).await?;
	let json = read_global(DATA_GLOBAL)?.ok_or(LoadError::MissingData)?;
	debug!("read {} bytes of records", json.len());
	let records = parse_records(&json)?;
	let network = graph::normalize::normalize(&records);
	info!(
		"normalized {} records into {} nodes and {} edges",
		records.len(),
		network.nodes.len(),
		network.edges.len()
	);
	Ok(network)
}
