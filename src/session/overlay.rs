//! Floating per-node controls: which node is active, where its buttons go
//! and which buttons it gets.

use log::{debug, warn};

use super::edit_state::EditState;
use super::timers::{Scheduler, TimerKey};
use crate::graph::scale::{self, MAX_WEIGHT, MIN_WEIGHT};
use crate::graph::{NetworkData, NodeId};
use crate::layout::{LayoutEngine, Point};

/// Space between two buttons.
pub const BUTTON_GAP: f64 = 2.0;
/// Smallest button edge unless the node itself is smaller.
pub const MIN_BUTTON_SIZE: f64 = 18.0;
const MIN_FONT_SIZE: f64 = 11.0;
const SINGLE_BUTTON_BOOST: f64 = 1.08;
const BALANCE_BOOST: f64 = 1.03;

/// Hover state machine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HoverState {
	#[default]
	Idle,
	/// Controls shown for the node.
	Active(NodeId),
	/// Pointer left; controls stay until the release timer fires.
	PendingRelease(NodeId),
}

/// A node projected into container pixels for the current frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ScreenPosition {
	pub id: NodeId,
	pub position: Point,
	pub label: String,
	pub weight: u8,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ControlAction {
	Remove,
	Decrease,
	Increase,
	Restore,
}

impl ControlAction {
	pub fn glyph(self) -> &'static str {
		match self {
			ControlAction::Remove => "×",
			ControlAction::Decrease => "-",
			ControlAction::Increase | ControlAction::Restore => "+",
		}
	}

	/// Accessible description for the node labelled `label`.
	pub fn describe(self, label: &str) -> String {
		match self {
			ControlAction::Remove => format!("Remove {label} from graph"),
			ControlAction::Decrease => format!("Decrease weight of {label}"),
			ControlAction::Increase => format!("Increase weight of {label}"),
			ControlAction::Restore => format!("Restore {label}"),
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn contains(&self, p: Point) -> bool {
		p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
	}

	pub fn center(&self) -> Point {
		Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
	}

	fn translate(&mut self, dx: f64, dy: f64) {
		self.x += dx;
		self.y += dy;
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ControlButton {
	pub action: ControlAction,
	pub enabled: bool,
	pub rect: Rect,
	pub description: String,
}

/// Sizes derived from the node's on-screen diameter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ButtonGeometry {
	pub diameter: f64,
	pub edge_margin: f64,
	pub size: f64,
	pub font_size: f64,
}

/// Distance kept between the buttons and the node's rim.
pub fn edge_margin(diameter: f64) -> f64 {
	if diameter < 24.0 {
		3.0
	} else if diameter < 36.0 {
		4.0
	} else if diameter < 48.0 {
		5.0
	} else {
		6.0
	}
}

/// Button size for a node of `weight` at zoom `scale`. A removed node's lone
/// restore button gets the single-button boost; the weight-1 remove button is
/// sized like one of a pair.
pub fn button_geometry(weight: u8, scale: f64, removed: bool) -> ButtonGeometry {
	let diameter = scale::node_size(Some(weight)) * scale;
	let margin = edge_margin(diameter);
	let per_button = (diameter - margin * 2.0 - BUTTON_GAP) / 2.0;
	let mut size = if removed {
		per_button * SINGLE_BUTTON_BOOST
	} else {
		per_button
	};
	size *= BALANCE_BOOST;
	size = MIN_BUTTON_SIZE.max(size.round());
	let max_allowed = (diameter - margin * 2.0).round();
	if size > max_allowed {
		size = max_allowed;
	}
	ButtonGeometry {
		diameter,
		edge_margin: margin,
		size,
		font_size: MIN_FONT_SIZE.max((size * 0.55).round()),
	}
}

/// Buttons a node gets, each with its enabled flag.
pub fn control_set(weight: u8, removed: bool) -> Vec<(ControlAction, bool)> {
	if removed {
		vec![(ControlAction::Restore, true)]
	} else if weight <= MIN_WEIGHT {
		vec![(ControlAction::Remove, true)]
	} else {
		vec![
			(ControlAction::Decrease, true),
			(ControlAction::Increase, weight < MAX_WEIGHT),
		]
	}
}

/// Controls rendered for the active node, in container pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayView {
	pub node: NodeId,
	pub label: String,
	pub anchor: Point,
	pub geometry: ButtonGeometry,
	pub buttons: Vec<ControlButton>,
	/// Extra hover slack around the buttons.
	pub padding: f64,
}

impl OverlayView {
	fn build(at: &ScreenPosition, removed: bool, scale: f64) -> Self {
		let set = control_set(at.weight, removed);
		let geometry = button_geometry(at.weight, scale, removed);
		let size = geometry.size;
		let total = set.len() as f64 * size + (set.len() as f64 - 1.0).max(0.0) * BUTTON_GAP;
		let left = at.position.x - total / 2.0;
		let top = at.position.y - size / 2.0;
		let buttons = set
			.into_iter()
			.enumerate()
			.map(|(i, (action, enabled))| ControlButton {
				action,
				enabled,
				rect: Rect {
					x: left + i as f64 * (size + BUTTON_GAP),
					y: top,
					width: size,
					height: size,
				},
				description: action.describe(&at.label),
			})
			.collect();
		OverlayView {
			node: at.id,
			label: at.label.clone(),
			anchor: at.position,
			geometry,
			buttons,
			padding: scale::button_dimensions(Some(at.weight)).font_size / 2.0,
		}
	}

	/// Hover area: every button plus padding.
	pub fn area(&self) -> Rect {
		let mut area = self.buttons.iter().fold(None::<Rect>, |acc, b| {
			Some(match acc {
				None => b.rect,
				Some(a) => {
					let x = a.x.min(b.rect.x);
					let y = a.y.min(b.rect.y);
					Rect {
						x,
						y,
						width: (a.x + a.width).max(b.rect.x + b.rect.width) - x,
						height: (a.y + a.height).max(b.rect.y + b.rect.height) - y,
					}
				}
			})
		});
		if let Some(a) = area.as_mut() {
			a.x -= self.padding;
			a.y -= self.padding;
			a.width += self.padding * 2.0;
			a.height += self.padding * 2.0;
		}
		area.unwrap_or_default()
	}

	pub fn contains(&self, p: Point) -> bool {
		self.area().contains(p)
	}

	/// Button under `p`, if any.
	pub fn button_at(&self, p: Point) -> Option<&ControlButton> {
		self.buttons.iter().find(|b| b.rect.contains(p))
	}

	/// Action of the enabled button under `p`.
	pub fn hit(&self, p: Point) -> Option<ControlAction> {
		self.button_at(p).filter(|b| b.enabled).map(|b| b.action)
	}

	fn move_to(&mut self, anchor: Point) {
		let (dx, dy) = (anchor.x - self.anchor.x, anchor.y - self.anchor.y);
		if dx == 0.0 && dy == 0.0 {
			return;
		}
		self.anchor = anchor;
		for button in &mut self.buttons {
			button.rect.translate(dx, dy);
		}
	}
}

/// Active-node tracking plus the projected positions and rendered controls.
#[derive(Clone, Debug, Default)]
pub struct OverlayController {
	state: HoverState,
	positions: Vec<ScreenPosition>,
	view: Option<OverlayView>,
	rendered: Option<NodeId>,
	rebuilds: usize,
}

impl OverlayController {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn state(&self) -> HoverState {
		self.state
	}

	/// Node whose controls are (or stay) visible.
	pub fn active_node(&self) -> Option<NodeId> {
		match self.state {
			HoverState::Idle => None,
			HoverState::Active(id) | HoverState::PendingRelease(id) => Some(id),
		}
	}

	pub fn positions(&self) -> &[ScreenPosition] {
		&self.positions
	}

	pub fn view(&self) -> Option<&OverlayView> {
		self.view.as_ref()
	}

	/// How many times a control set was built.
	pub fn rebuilds(&self) -> usize {
		self.rebuilds
	}

	/// Pointer entered node `id`.
	pub fn hover(&mut self, id: NodeId, timers: &mut impl Scheduler) {
		timers.cancel(TimerKey::HoverRelease);
		self.state = HoverState::Active(id);
	}

	/// Pointer left the node or the controls; release after `after`.
	pub fn release(&mut self, timers: &mut impl Scheduler, after: std::time::Duration) {
		if let Some(id) = self.active_node() {
			self.state = HoverState::PendingRelease(id);
			timers.schedule(TimerKey::HoverRelease, after);
		}
	}

	/// Pointer is back over the active node or its controls.
	pub fn hold(&mut self, timers: &mut impl Scheduler) {
		if let Some(id) = self.active_node() {
			timers.cancel(TimerKey::HoverRelease);
			self.state = HoverState::Active(id);
		}
	}

	/// Pointer moved over `id`; keeps the controls if `id` is the active node.
	pub fn hold_if(&mut self, id: NodeId, timers: &mut impl Scheduler) -> bool {
		if self.active_node() != Some(id) {
			return false;
		}
		self.hold(timers);
		true
	}

	/// Release timer fired. Only a pending release drops the node; anything
	/// else means the timer is stale.
	pub fn release_due(&mut self) -> bool {
		match self.state {
			HoverState::PendingRelease(id) => {
				debug!("released node {id}");
				self.state = HoverState::Idle;
				true
			}
			_ => false,
		}
	}

	/// Rebuild the control set on the next refresh even for the same node.
	pub fn invalidate(&mut self) {
		self.rendered = None;
	}

	/// Forget everything; used when the graph is rebuilt.
	pub fn reset(&mut self) {
		*self = Self::default();
	}

	/// Project every node into container pixels. Nodes the engine cannot
	/// project are skipped for this frame.
	pub fn project<E: LayoutEngine>(&mut self, engine: &E, network: &NetworkData, edits: &EditState) {
		self.positions.clear();
		for (id, pos) in engine.positions() {
			let Some(node) = network.node(id) else {
				continue;
			};
			match engine.canvas_to_dom(pos) {
				Ok(position) => self.positions.push(ScreenPosition {
					id,
					position,
					label: node.label.clone(),
					weight: edits.weight(id),
				}),
				Err(e) => warn!("failed to project node {id}: {e}"),
			}
		}
	}

	/// Bring the rendered controls in line with the active node. The set is
	/// only rebuilt when the active node changed (or after
	/// [`invalidate`](Self::invalidate)); otherwise it just follows the node.
	pub fn refresh(&mut self, edits: &EditState, scale: f64) {
		let Some(id) = self.active_node() else {
			self.clear();
			return;
		};
		if edits.is_protected(id) {
			self.clear();
			return;
		}
		let Some(at) = self.positions.iter().find(|p| p.id == id) else {
			self.clear();
			return;
		};
		if self.rendered == Some(id) {
			if let Some(view) = self.view.as_mut() {
				view.move_to(at.position);
			}
			return;
		}
		let view = OverlayView::build(at, edits.is_removed(id), scale);
		debug!(
			"controls for {} at ({:.1}, {:.1}), weight {}",
			view.label, view.anchor.x, view.anchor.y, at.weight
		);
		self.view = Some(view);
		self.rendered = Some(id);
		self.rebuilds += 1;
	}

	fn clear(&mut self) {
		self.view = None;
		self.rendered = None;
	}
}
