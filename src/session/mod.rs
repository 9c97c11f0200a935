//! One loaded graph and everything the user did to it.
//!
//! [`GraphSession`] owns the edit state, the overlay controller, the layout
//! engine and the timers, and sequences every event against them: state is
//! mutated first, the engine is updated second, and the overlay is projected
//! last.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, info, warn};

pub mod edit_state;
pub mod overlay;
pub mod timers;

use crate::bridge::{HostBridge, HostMessage};
use crate::config::{FitOptions, PanelConfig};
use crate::error::{BridgeError, EngineError};
use crate::graph::hierarchy::{self, Hierarchy};
use crate::graph::{NetworkData, NodeId};
use crate::layout::{self, EdgeStyle, LayoutEngine, NodeStyle, Physics, Point};
use edit_state::{EditEffect, EditState};
use overlay::{ControlAction, OverlayController, OverlayView};
use timers::{Scheduler, TimerKey};

/// Layout lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
	/// Physics is settling the initial placement.
	Stabilizing,
	/// Physics is off; nodes move only when dragged.
	Settled,
}

pub struct GraphSession<E, S> {
	config: PanelConfig,
	network: NetworkData,
	hierarchy: Hierarchy,
	edits: EditState,
	overlay: OverlayController,
	engine: E,
	timers: S,
	phase: Phase,
	frame_sync: bool,
}

fn log_failure(what: &str, result: Result<(), EngineError>) {
	if let Err(e) = result {
		warn!("failed to {what}: {e}");
	}
}

impl<E: LayoutEngine, S: Scheduler> GraphSession<E, S> {
	/// Place `network` on `engine` and start stabilizing.
	pub fn new(network: NetworkData, mut engine: E, mut timers: S, config: PanelConfig) -> Self {
		let protected: BTreeSet<NodeId> = network
			.nodes
			.iter()
			.filter(|n| n.is_conclusion || config.protected_labels.contains(&n.label))
			.map(|n| n.id)
			.collect();
		let weights: BTreeMap<NodeId, u8> = network.nodes.iter().map(|n| (n.id, n.weight)).collect();

		for node in network.nodes.iter().filter(|n| n.is_conclusion) {
			log_failure("style conclusion", engine.set_node_style(node.id, NodeStyle::Conclusion));
		}

		let ids: Vec<NodeId> = network.nodes.iter().map(|n| n.id).collect();
		let hierarchy = hierarchy::compute_levels(&ids, &network.edges);
		engine.set_positions(&hierarchy::hierarchical_positions(&hierarchy, engine.container_size()));
		engine.set_physics(Physics::Hierarchical);

		timers.schedule(TimerKey::InitialProjection, config.initial_projection());
		if !hierarchy.isolated.is_empty() {
			timers.schedule(TimerKey::PlaceIsolated, config.settle_delay());
		}

		info!(
			"graph loaded: {} nodes, {} edges, {} protected",
			network.nodes.len(),
			network.edges.len(),
			protected.len()
		);

		Self {
			config,
			edits: EditState::new(weights, protected),
			network,
			hierarchy,
			overlay: OverlayController::new(),
			engine,
			timers,
			phase: Phase::Stabilizing,
			frame_sync: true,
		}
	}

	pub fn config(&self) -> &PanelConfig {
		&self.config
	}

	pub fn network(&self) -> &NetworkData {
		&self.network
	}

	pub fn hierarchy(&self) -> &Hierarchy {
		&self.hierarchy
	}

	pub fn edits(&self) -> &EditState {
		&self.edits
	}

	pub fn overlay(&self) -> &OverlayController {
		&self.overlay
	}

	/// Controls currently shown, if any.
	pub fn controls(&self) -> Option<&OverlayView> {
		self.overlay.view()
	}

	pub fn engine(&self) -> &E {
		&self.engine
	}

	pub fn engine_mut(&mut self) -> &mut E {
		&mut self.engine
	}

	pub fn timers_mut(&mut self) -> &mut S {
		&mut self.timers
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	/// Whether the overlay follows every drawn frame.
	pub fn is_frame_synced(&self) -> bool {
		self.frame_sync
	}

	pub fn is_dirty(&self) -> bool {
		self.edits.is_dirty()
	}

	/// Pointer entered a node on the canvas.
	pub fn on_hover_node(&mut self, id: NodeId) {
		self.overlay.hover(id, &mut self.timers);
		self.sync_overlay();
	}

	/// Pointer left a node on the canvas.
	pub fn on_blur_node(&mut self) {
		let after = self.config.blur_release();
		self.overlay.release(&mut self.timers, after);
	}

	/// Pointer moved over the canvas; `node` is whatever lies beneath it.
	pub fn on_pointer_over(&mut self, node: Option<NodeId>) {
		if let Some(id) = node {
			if self.overlay.hold_if(id, &mut self.timers) {
				self.sync_overlay();
			}
		}
	}

	/// Pointer entered the floating controls.
	pub fn on_controls_enter(&mut self) {
		self.overlay.hold(&mut self.timers);
		self.sync_overlay();
	}

	/// Pointer left the floating controls.
	pub fn on_controls_leave(&mut self) {
		let after = self.config.controls_release();
		self.overlay.release(&mut self.timers, after);
	}

	/// A frame was drawn. Ignored once the layout settled.
	pub fn on_after_drawing(&mut self) {
		if self.frame_sync {
			self.sync_overlay();
		}
	}

	/// The user panned, zoomed or dragged. Keeps the controls on their node
	/// once frames are no longer followed.
	pub fn on_view_changed(&mut self) {
		if self.overlay.active_node().is_some() {
			self.sync_overlay();
		}
	}

	/// Physics settled: fit the view, freeze physics and stop following
	/// frames. Returns `false` if the layout had already settled.
	pub fn on_stabilized(&mut self) -> bool {
		if self.phase == Phase::Settled {
			return false;
		}
		self.fit(self.config.fit);
		self.engine.set_physics(Physics::Disabled);
		self.frame_sync = false;
		self.phase = Phase::Settled;
		self.sync_overlay();
		info!("network stabilized, physics disabled, nodes can be dragged freely");
		true
	}

	/// Container changed size; the fit is debounced.
	pub fn on_resize(&mut self) {
		let after = self.config.resize_debounce();
		self.timers.schedule(TimerKey::ResizeFit, after);
	}

	/// A scheduled timer fired.
	pub fn on_timer(&mut self, key: TimerKey) {
		debug!("timer {key:?} fired");
		match key {
			TimerKey::HoverRelease => {
				if self.overlay.release_due() {
					self.sync_overlay();
				}
			}
			TimerKey::InitialProjection => self.sync_overlay(),
			TimerKey::PlaceIsolated => self.place_isolated(),
			TimerKey::RefitIsolated => {
				self.fit(self.config.isolated_fit);
				self.sync_overlay();
			}
			TimerKey::ResizeFit => {
				self.fit(self.config.fit);
				self.sync_overlay();
			}
		}
	}

	/// Click at `point` in container pixels. Returns `true` if it landed on a
	/// control, whether or not that control was enabled.
	pub fn click(&mut self, point: Point) -> bool {
		let Some(button) = self.overlay.view().and_then(|v| v.button_at(point)) else {
			return false;
		};
		if button.enabled {
			let action = button.action;
			self.activate(action);
		}
		true
	}

	/// Run a control action against the active node. Returns `false` when
	/// nothing changed.
	pub fn activate(&mut self, action: ControlAction) -> bool {
		let Some(id) = self.overlay.active_node() else {
			return false;
		};
		let effect = match action {
			ControlAction::Remove => self.edits.remove(id),
			ControlAction::Decrease => self.edits.adjust_weight(id, -1),
			ControlAction::Increase => self.edits.adjust_weight(id, 1),
			ControlAction::Restore => self.edits.restore(id),
		};
		let Some(effect) = effect else {
			return false;
		};
		debug!("{action:?} on node {id}: {effect:?}");
		self.apply_effect(effect);
		self.overlay.invalidate();
		self.sync_overlay();
		true
	}

	/// Send the weights to the host, then make them the new baseline and
	/// bring removed nodes back. Edits stay pending if the host cannot be
	/// reached.
	pub fn apply(&mut self, bridge: &impl HostBridge) -> Result<(), BridgeError> {
		let weights = self.edits.weights().clone();
		info!("applying weights for {} nodes", weights.len());
		bridge.post(&HostMessage::ApplyChanges { weights })?;

		let applied = self.edits.apply();
		for id in &applied.restored {
			self.restore_visuals(*id);
		}
		self.overlay.invalidate();
		self.sync_overlay();
		Ok(())
	}

	fn apply_effect(&mut self, effect: EditEffect) {
		match effect {
			EditEffect::Resized { id, size } => {
				log_failure("resize node", self.engine.set_node_size(id, size));
			}
			EditEffect::Removed { id } => {
				log_failure("style removed node", self.engine.set_node_style(id, NodeStyle::Removed));
				log_failure(
					"mute edges",
					self.engine.set_connected_edge_style(id, EdgeStyle::Muted),
				);
			}
			EditEffect::Restored { id, size } => {
				self.restore_visuals(id);
				log_failure("resize restored node", self.engine.set_node_size(id, size));
			}
		}
	}

	fn restore_visuals(&mut self, id: NodeId) {
		log_failure("restore node style", self.engine.set_node_style(id, NodeStyle::Default));
		log_failure(
			"restore edges",
			self.engine.set_connected_edge_style(id, EdgeStyle::Default),
		);
	}

	fn fit(&mut self, options: FitOptions) {
		let fitted = layout::fit_view(
			self.engine.positions().into_values(),
			self.engine.container_size(),
			options,
		);
		if let Some((center, scale)) = fitted {
			self.engine.move_to(center, scale);
		}
	}

	/// Move isolated nodes into pinned columns beside the connected graph.
	fn place_isolated(&mut self) {
		let positions = self.engine.positions();
		let isolated: Vec<NodeId> = self
			.hierarchy
			.isolated
			.iter()
			.copied()
			.filter(|id| positions.contains_key(id))
			.collect();
		let connected = positions
			.iter()
			.filter(|(id, _)| !self.hierarchy.is_isolated(**id))
			.map(|(_, p)| *p);
		let Some(placements) = hierarchy::isolated_columns(&isolated, connected) else {
			debug!("no isolated nodes to place");
			return;
		};

		self.engine.set_positions(&placements);
		for id in &isolated {
			let conclusion = self.network.node(*id).is_some_and(|n| n.is_conclusion);
			if conclusion || self.edits.is_removed(*id) {
				continue;
			}
			log_failure("style isolated node", self.engine.set_node_style(*id, NodeStyle::Isolated));
		}
		info!("placed {} isolated nodes", isolated.len());
		let after = self.config.refit_delay();
		self.timers.schedule(TimerKey::RefitIsolated, after);
	}

	fn sync_overlay(&mut self) {
		self.overlay.project(&self.engine, &self.network, &self.edits);
		self.overlay.refresh(&self.edits, self.engine.scale());
	}
}
