//! Error types for loading, the layout engine and the host bridge.

use crate::graph::NodeId;

/// Failure anywhere in the load → normalize → render pipeline.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
	/// The host did not inject any graph data into the panel.
	#[error("no graph data was provided by the host")]
	MissingData,
	/// The injected data is not a valid record list.
	#[error("graph data is malformed: {0}")]
	Malformed(#[from] serde_json::Error),
	/// A browser call failed.
	#[error("browser call failed: {0}")]
	Js(String),
}

/// Failure of a single call against the rendering surface.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
	/// The node is not (or no longer) part of the layout.
	#[error("node {0} is not part of the layout")]
	UnknownNode(NodeId),
	/// The view transform cannot map canvas points to the screen.
	#[error("view transform is degenerate (scale {0})")]
	DegenerateTransform(f64),
}

/// Failure to deliver a message to the host.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
	/// The message could not be encoded.
	#[error("failed to encode host message: {0}")]
	Encode(#[from] serde_json::Error),
	/// The panel is not running inside a host that accepts messages.
	#[error("host messaging is unavailable")]
	Unavailable,
	/// The host API rejected the message.
	#[error("host rejected message: {0}")]
	Js(String),
}
