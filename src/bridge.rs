//! Messages exchanged with the host editor.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;

use crate::error::BridgeError;
use crate::graph::NodeId;

/// Panel → host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum HostMessage {
	/// Show a notification to the user.
	Alert { text: String },
	/// The user applied their edits.
	ApplyChanges { weights: BTreeMap<NodeId, u8> },
}

/// Host → panel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum PanelMessage {
	/// Reload all data and rebuild the graph from scratch.
	Refresh,
	#[serde(other)]
	Unknown,
}

impl PanelMessage {
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}
}

/// Outbound side of the host connection.
pub trait HostBridge {
	fn post(&self, message: &HostMessage) -> Result<(), BridgeError>;
}

#[wasm_bindgen]
extern "C" {
	type VsCodeApi;

	#[wasm_bindgen(catch, js_name = acquireVsCodeApi)]
	fn acquire_vs_code_api() -> Result<VsCodeApi, JsValue>;

	#[wasm_bindgen(method, catch, js_name = postMessage)]
	fn post_message(this: &VsCodeApi, message: &JsValue) -> Result<(), JsValue>;
}

thread_local! {
	// acquireVsCodeApi may only be called once per webview.
	static VSCODE: Option<VsCodeApi> = match acquire_vs_code_api() {
		Ok(api) => Some(api),
		Err(e) => {
			warn!("host api unavailable: {:?}", e);
			None
		}
	};
}

/// Bridge to the editor webview host.
#[derive(Clone, Copy, Debug, Default)]
pub struct VsCodeBridge;

impl HostBridge for VsCodeBridge {
	fn post(&self, message: &HostMessage) -> Result<(), BridgeError> {
		let json = serde_json::to_string(message)?;
		let value = js_sys::JSON::parse(&json).map_err(|e| BridgeError::Js(format!("{:?}", e)))?;
		VSCODE.with(|api| match api {
			Some(api) => api
				.post_message(&value)
				.map_err(|e| BridgeError::Js(format!("{:?}", e))),
			None => Err(BridgeError::Unavailable),
		})
	}
}
