//! Panel tunables: timer delays, view fitting and protected labels.

use std::time::Duration;

use serde::Deserialize;

/// Margin and padding used when fitting the graph into the container.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FitOptions {
	/// Fraction of the available area the graph may fill, clamped to `[0.4, 1]`.
	pub margin: f64,
	/// Padding in pixels removed from each side of the container.
	pub padding_px: f64,
}

impl FitOptions {
	/// Fit used after stabilization and on resize.
	pub const MAIN: FitOptions = FitOptions {
		margin: 0.75,
		padding_px: 32.0,
	};
	/// Fit used once isolated nodes have been moved aside.
	pub const ISOLATED: FitOptions = FitOptions {
		margin: 0.8,
		padding_px: 50.0,
	};
}

/// All knobs of the panel. Every field can be overridden by the host through
/// a `window.visConfig` object; missing fields keep their defaults.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PanelConfig {
	/// Simulated latency of the initial data fetch.
	pub load_latency_ms: u32,
	/// Grace period after the pointer leaves a node on the canvas.
	pub blur_release_ms: u32,
	/// Grace period after the pointer leaves the floating controls.
	pub controls_release_ms: u32,
	/// Debounce window for fit-to-view on container resize.
	pub resize_debounce_ms: u32,
	/// Delay before isolated nodes are moved next to the main graph.
	pub settle_delay_ms: u32,
	/// Delay before the first overlay projection.
	pub initial_projection_ms: u32,
	/// Delay before re-fitting the view after isolated nodes moved.
	pub refit_delay_ms: u32,
	/// Fit after stabilization and on resize.
	pub fit: FitOptions,
	/// Fit after isolated nodes moved.
	pub isolated_fit: FitOptions,
	/// Labels that can never be resized or removed.
	pub protected_labels: Vec<String>,
}

impl Default for PanelConfig {
	fn default() -> Self {
		Self {
			load_latency_ms: 100,
			blur_release_ms: 250,
			controls_release_ms: 150,
			resize_debounce_ms: 120,
			settle_delay_ms: 1000,
			initial_projection_ms: 100,
			refit_delay_ms: 100,
			fit: FitOptions::MAIN,
			isolated_fit: FitOptions::ISOLATED,
			protected_labels: vec!["Agent".into()],
		}
	}
}

fn ms(value: u32) -> Duration {
	Duration::from_millis(value as u64)
}

impl PanelConfig {
	/// Parse host overrides; unknown keys are ignored.
	pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(json)
	}

	pub(crate) fn load_latency(&self) -> Duration {
		ms(self.load_latency_ms)
	}

	pub(crate) fn blur_release(&self) -> Duration {
		ms(self.blur_release_ms)
	}

	pub(crate) fn controls_release(&self) -> Duration {
		ms(self.controls_release_ms)
	}

	pub(crate) fn resize_debounce(&self) -> Duration {
		ms(self.resize_debounce_ms)
	}

	pub(crate) fn settle_delay(&self) -> Duration {
		ms(self.settle_delay_ms)
	}

	pub(crate) fn initial_projection(&self) -> Duration {
		ms(self.initial_projection_ms)
	}

	pub(crate) fn refit_delay(&self) -> Duration {
		ms(self.refit_delay_ms)
	}
}
