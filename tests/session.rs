use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use node_visualizer::bridge::{HostBridge, HostMessage};
use node_visualizer::config::PanelConfig;
use node_visualizer::error::{BridgeError, EngineError, LoadError};
use node_visualizer::graph::normalize::normalize;
use node_visualizer::graph::records::parse_records;
use node_visualizer::graph::{NetworkData, NodeId};
use node_visualizer::layout::{
	EdgeStyle, LayoutEngine, NodeStyle, Physics, Placement, Point, Size,
};
use node_visualizer::session::overlay::ControlAction;
use node_visualizer::session::timers::{ManualScheduler, TimerKey};
use node_visualizer::session::{GraphSession, Phase};

const RECORDS: &str = r#"[
	{"type": "entity", "name": "Agent", "entityType": "agent", "observations": ["runs things"]},
	{"type": "entity", "name": "Alpha", "entityType": "person", "observations": ["first"]},
	{"type": "entity", "name": "Beta", "entityType": "person", "observations": ["second"]},
	{"type": "entity", "name": "Gamma", "entityType": "person", "observations": []},
	{"type": "entity", "name": "Finding", "entityType": "conclusion", "observations": ["derived"]},
	{"type": "entity", "name": "Loner", "entityType": "person"},
	{"type": "relation", "from": "Agent", "to": "Alpha", "relationType": "knows"},
	{"type": "relation", "from": "Alpha", "to": "Beta", "relationType": "knows"},
	{"type": "relation", "from": "Finding", "to": "Beta", "relationType": "based_on"},
	{"type": "relation", "from": "Finding", "to": "Gamma", "relationType": "supports"},
	{"type": "note", "text": "ignored"}
]"#;

const AGENT: NodeId = NodeId(1);
const ALPHA: NodeId = NodeId(2);
const BETA: NodeId = NodeId(3);
const GAMMA: NodeId = NodeId(4);
const FINDING: NodeId = NodeId(5);
const LONER: NodeId = NodeId(6);

/// In-memory engine with the same view transform as the canvas one.
#[derive(Debug)]
struct FakeEngine {
	positions: BTreeMap<NodeId, Point>,
	pinned: BTreeSet<NodeId>,
	sizes: BTreeMap<NodeId, f64>,
	styles: BTreeMap<NodeId, NodeStyle>,
	edge_styles: BTreeMap<NodeId, EdgeStyle>,
	physics: Option<Physics>,
	center: Point,
	scale: f64,
	moves: Vec<(Point, f64)>,
	size: Size,
}

impl FakeEngine {
	fn new(network: &NetworkData) -> Self {
		Self {
			positions: network.nodes.iter().map(|n| (n.id, Point::default())).collect(),
			pinned: BTreeSet::new(),
			sizes: network.nodes.iter().map(|n| (n.id, n.size)).collect(),
			styles: network.nodes.iter().map(|n| (n.id, NodeStyle::Default)).collect(),
			edge_styles: BTreeMap::new(),
			physics: None,
			center: Point::default(),
			scale: 1.0,
			moves: Vec::new(),
			size: Size::new(800.0, 600.0),
		}
	}

	fn check(&self, id: NodeId) -> Result<(), EngineError> {
		if self.positions.contains_key(&id) {
			Ok(())
		} else {
			Err(EngineError::UnknownNode(id))
		}
	}
}

impl LayoutEngine for FakeEngine {
	fn positions(&self) -> BTreeMap<NodeId, Point> {
		self.positions.clone()
	}

	fn set_positions(&mut self, placements: &BTreeMap<NodeId, Placement>) {
		for (id, placement) in placements {
			if let Some(position) = self.positions.get_mut(id) {
				*position = placement.position;
				if placement.pinned {
					self.pinned.insert(*id);
				}
			}
		}
	}

	fn canvas_to_dom(&self, point: Point) -> Result<Point, EngineError> {
		Ok(Point::new(
			(point.x - self.center.x) * self.scale + self.size.width / 2.0,
			(point.y - self.center.y) * self.scale + self.size.height / 2.0,
		))
	}

	fn scale(&self) -> f64 {
		self.scale
	}

	fn move_to(&mut self, center: Point, scale: f64) {
		self.center = center;
		self.scale = scale;
		self.moves.push((center, scale));
	}

	fn set_physics(&mut self, physics: Physics) {
		self.physics = Some(physics);
	}

	fn set_node_size(&mut self, id: NodeId, size: f64) -> Result<(), EngineError> {
		self.check(id)?;
		self.sizes.insert(id, size);
		Ok(())
	}

	fn set_node_style(&mut self, id: NodeId, style: NodeStyle) -> Result<(), EngineError> {
		self.check(id)?;
		self.styles.insert(id, style);
		Ok(())
	}

	fn set_connected_edge_style(&mut self, id: NodeId, style: EdgeStyle) -> Result<(), EngineError> {
		self.check(id)?;
		self.edge_styles.insert(id, style);
		Ok(())
	}

	fn container_size(&self) -> Size {
		self.size
	}
}

#[derive(Default)]
struct RecordingBridge {
	sent: RefCell<Vec<HostMessage>>,
}

impl HostBridge for RecordingBridge {
	fn post(&self, message: &HostMessage) -> Result<(), BridgeError> {
		self.sent.borrow_mut().push(message.clone());
		Ok(())
	}
}

struct ClosedBridge;

impl HostBridge for ClosedBridge {
	fn post(&self, _: &HostMessage) -> Result<(), BridgeError> {
		Err(BridgeError::Unavailable)
	}
}

type Session = GraphSession<FakeEngine, ManualScheduler>;

fn network() -> NetworkData {
	normalize(&parse_records(RECORDS).expect("records parse"))
}

fn session() -> Session {
	let network = network();
	let engine = FakeEngine::new(&network);
	GraphSession::new(network, engine, ManualScheduler::new(), PanelConfig::default())
}

/// Move the virtual clock and deliver every timer that came due.
fn advance(session: &mut Session, ms: u64) {
	for key in session.timers_mut().advance(Duration::from_millis(ms)) {
		session.on_timer(key);
	}
}

fn controls(session: &Session) -> Vec<ControlAction> {
	session
		.controls()
		.map(|v| v.buttons.iter().map(|b| b.action).collect())
		.unwrap_or_default()
}

fn click_control(session: &mut Session, action: ControlAction) -> bool {
	let center = session
		.controls()
		.and_then(|v| v.buttons.iter().find(|b| b.action == action))
		.map(|b| b.rect.center())
		.expect("control is shown");
	session.click(center)
}

fn assert_close(actual: f64, expected: f64) {
	assert!((actual - expected).abs() < 1e-9, "{actual} != {expected}");
}

#[test]
fn records_normalize_into_directed_network() {
	let network = network();
	assert_eq!(network.nodes.len(), 6);
	let finding = network.node(FINDING).expect("conclusion node");
	assert!(finding.is_conclusion);
	assert_eq!(finding.weight, 3);
	assert_eq!(network.node(ALPHA).map(|n| n.weight), Some(1));

	let edges: Vec<(NodeId, NodeId)> = network.edges.iter().map(|e| (e.from, e.to)).collect();
	// based_on is reversed; the conclusion's own outgoing edge is dropped
	assert_eq!(edges, vec![(AGENT, ALPHA), (ALPHA, BETA), (BETA, FINDING)]);
	assert!(network.edges.iter().all(|e| e.from != FINDING));
}

#[test]
fn malformed_records_are_rejected() {
	assert!(matches!(parse_records("{"), Err(LoadError::Malformed(_))));
	assert!(normalize(&parse_records("[]").expect("empty list")).nodes.is_empty());
}

#[test]
fn construction_places_levels_and_schedules_followups() {
	let session = session();
	let engine = session.engine();
	assert_eq!(engine.physics, Some(Physics::Hierarchical));
	assert_eq!(engine.positions[&AGENT], Point::new(0.0, -180.0));
	assert_eq!(engine.positions[&ALPHA], Point::new(0.0, -60.0));
	assert_eq!(engine.positions[&BETA], Point::new(0.0, 60.0));
	assert_eq!(engine.positions[&FINDING], Point::new(0.0, 180.0));
	assert_eq!(engine.styles[&FINDING], NodeStyle::Conclusion);
	assert!(engine.pinned.contains(&GAMMA) && engine.pinned.contains(&LONER));
	assert_eq!(session.hierarchy().isolated, vec![GAMMA, LONER]);

	assert_eq!(session.phase(), Phase::Stabilizing);
	assert!(session.is_frame_synced());
	assert!(!session.is_dirty());
}

#[test]
fn remove_then_restore_through_controls() {
	let mut session = session();
	session.on_hover_node(ALPHA);
	assert_eq!(controls(&session), vec![ControlAction::Remove]);
	let view = session.controls().expect("controls shown");
	assert_eq!(view.anchor, Point::new(400.0, 240.0));
	assert_eq!(view.buttons[0].description, "Remove Alpha from graph");

	assert!(click_control(&mut session, ControlAction::Remove));
	assert!(session.is_dirty());
	assert!(session.edits().is_removed(ALPHA));
	assert_eq!(session.engine().styles[&ALPHA], NodeStyle::Removed);
	assert_eq!(session.engine().edge_styles[&ALPHA], EdgeStyle::Muted);
	assert_eq!(controls(&session), vec![ControlAction::Restore]);

	session.on_blur_node();
	advance(&mut session, 249);
	assert!(session.controls().is_some(), "release is delayed");
	advance(&mut session, 1);
	assert!(session.controls().is_none());

	session.on_hover_node(ALPHA);
	assert_eq!(controls(&session), vec![ControlAction::Restore]);
	assert!(click_control(&mut session, ControlAction::Restore));
	assert!(!session.edits().is_removed(ALPHA));
	assert_eq!(session.edits().weight(ALPHA), 2);
	assert_eq!(session.engine().sizes[&ALPHA], 18.0);
	assert_eq!(session.engine().styles[&ALPHA], NodeStyle::Default);
	assert_eq!(session.engine().edge_styles[&ALPHA], EdgeStyle::Default);
	assert_eq!(
		controls(&session),
		vec![ControlAction::Decrease, ControlAction::Increase]
	);
}

#[test]
fn weight_buttons_respect_bounds() {
	let mut session = session();
	session.on_hover_node(BETA);
	click_control(&mut session, ControlAction::Remove);
	click_control(&mut session, ControlAction::Restore);
	for _ in 0..3 {
		assert!(click_control(&mut session, ControlAction::Increase));
	}
	assert_eq!(session.edits().weight(BETA), 5);
	assert_eq!(session.engine().sizes[&BETA], 36.0);

	let increase = session
		.controls()
		.and_then(|v| v.buttons.iter().find(|b| b.action == ControlAction::Increase))
		.expect("increase shown");
	assert!(!increase.enabled);
	assert!(click_control(&mut session, ControlAction::Increase), "disabled click is consumed");
	assert_eq!(session.edits().weight(BETA), 5);

	assert!(!session.click(Point::new(5.0, 5.0)), "clicks off the controls fall through");
}

#[test]
fn protected_nodes_get_no_controls() {
	let mut session = session();
	for id in [AGENT, FINDING] {
		session.on_hover_node(id);
		assert!(session.controls().is_none());
		assert!(!session.activate(ControlAction::Increase));
		assert!(!session.activate(ControlAction::Remove));
	}
	assert!(!session.is_dirty());
	assert_eq!(session.edits().weight(FINDING), 3);
}

#[test]
fn moving_between_node_and_controls_keeps_them() {
	let mut session = session();
	session.on_hover_node(ALPHA);
	session.on_blur_node();
	session.on_controls_enter();
	advance(&mut session, 300);
	assert!(session.controls().is_some());

	session.on_controls_leave();
	advance(&mut session, 100);
	session.on_pointer_over(Some(ALPHA));
	advance(&mut session, 300);
	assert!(session.controls().is_some());

	session.on_controls_leave();
	advance(&mut session, 150);
	assert!(session.controls().is_none());
}

#[test]
fn stale_release_timer_is_ignored() {
	let mut session = session();
	session.on_hover_node(ALPHA);
	session.on_timer(TimerKey::HoverRelease);
	assert_eq!(session.overlay().active_node(), Some(ALPHA));
	assert!(session.controls().is_some());

	session.on_blur_node();
	session.on_hover_node(BETA);
	advance(&mut session, 500);
	assert_eq!(session.overlay().active_node(), Some(BETA));
}

#[test]
fn controls_follow_frames_until_stabilized() {
	let mut session = session();
	session.on_hover_node(ALPHA);
	let rebuilds = session.overlay().rebuilds();

	session.engine_mut().positions.insert(ALPHA, Point::new(10.0, -60.0));
	session.on_after_drawing();
	let view = session.controls().expect("controls shown");
	assert_eq!(view.anchor, Point::new(410.0, 240.0));
	assert_eq!(session.overlay().rebuilds(), rebuilds, "moved, not rebuilt");

	assert!(session.on_stabilized());
	let settled = session.controls().expect("controls shown").anchor;
	session.engine_mut().positions.insert(ALPHA, Point::new(90.0, -60.0));
	session.on_after_drawing();
	assert_eq!(session.controls().expect("controls shown").anchor, settled);

	session.on_view_changed();
	assert_ne!(session.controls().expect("controls shown").anchor, settled);
}

#[test]
fn stabilization_fits_once_and_freezes_physics() {
	let mut session = session();
	assert!(session.on_stabilized());
	let engine = session.engine();
	assert_eq!(engine.moves.len(), 1);
	let (center, scale) = engine.moves[0];
	// nodes span x 0..240 (isolated column) and y -180..180
	assert_eq!(center, Point::new(120.0, 0.0));
	assert_close(scale, (536.0 / 360.0) * 0.75);
	assert_eq!(engine.physics, Some(Physics::Disabled));
	assert_eq!(session.phase(), Phase::Settled);
	assert!(!session.is_frame_synced());

	assert!(!session.on_stabilized());
	assert_eq!(session.engine().moves.len(), 1);
}

#[test]
fn resize_fits_once_after_debounce() {
	let mut session = session();
	session.on_resize();
	advance(&mut session, 50);
	session.on_resize();
	advance(&mut session, 50);
	session.on_resize();
	advance(&mut session, 119);
	assert!(session.engine().moves.is_empty());
	advance(&mut session, 1);
	assert_eq!(session.engine().moves.len(), 1);
}

#[test]
fn isolated_nodes_move_beside_graph_then_refit() {
	let mut session = session();
	session.on_hover_node(LONER);
	click_control(&mut session, ControlAction::Remove);

	advance(&mut session, 999);
	assert_eq!(session.engine().positions[&GAMMA], Point::new(240.0, -80.0));
	advance(&mut session, 1);
	let engine = session.engine();
	// connected nodes span x 0..0, y -180..180
	assert_eq!(engine.positions[&GAMMA], Point::new(400.0, -180.0));
	assert_eq!(engine.positions[&LONER], Point::new(400.0, -60.0));
	assert_eq!(engine.styles[&GAMMA], NodeStyle::Isolated);
	assert_eq!(engine.styles[&LONER], NodeStyle::Removed);
	assert!(engine.moves.is_empty());

	advance(&mut session, 100);
	let (center, scale) = session.engine().moves[0];
	assert_eq!(center, Point::new(200.0, 0.0));
	assert_close(scale, (500.0 / 360.0) * 0.8);
}

#[test]
fn apply_sends_weights_and_restores_removed_nodes() {
	let mut session = session();
	session.on_hover_node(ALPHA);
	click_control(&mut session, ControlAction::Remove);
	assert!(session.is_dirty());

	let bridge = RecordingBridge::default();
	session.apply(&bridge).expect("bridge accepts");
	assert!(!session.is_dirty());
	assert!(!session.edits().is_removed(ALPHA));
	assert_eq!(session.engine().styles[&ALPHA], NodeStyle::Default);
	assert_eq!(session.engine().edge_styles[&ALPHA], EdgeStyle::Default);
	assert_eq!(controls(&session), vec![ControlAction::Remove]);

	let sent = bridge.sent.borrow();
	let expected: BTreeMap<NodeId, u8> = BTreeMap::from([
		(AGENT, 1),
		(ALPHA, 1),
		(BETA, 1),
		(GAMMA, 1),
		(FINDING, 3),
		(LONER, 1),
	]);
	assert_eq!(*sent, vec![HostMessage::ApplyChanges { weights: expected }]);
}

#[test]
fn failed_apply_keeps_edits_pending() {
	let mut session = session();
	session.on_hover_node(ALPHA);
	click_control(&mut session, ControlAction::Remove);

	assert!(matches!(session.apply(&ClosedBridge), Err(BridgeError::Unavailable)));
	assert!(session.is_dirty());
	assert!(session.edits().is_removed(ALPHA));
	assert_eq!(session.engine().styles[&ALPHA], NodeStyle::Removed);
	assert_eq!(controls(&session), vec![ControlAction::Restore]);

	let bridge = RecordingBridge::default();
	session.apply(&bridge).expect("bridge accepts");
	assert!(!session.is_dirty());
	assert_eq!(bridge.sent.borrow().len(), 1);
}

#[test]
fn empty_network_is_inert() {
	let network = NetworkData::default();
	let engine = FakeEngine::new(&network);
	let mut session = GraphSession::new(network, engine, ManualScheduler::new(), PanelConfig::default());
	assert!(!session.timers_mut().is_pending(TimerKey::PlaceIsolated));
	assert!(session.on_stabilized());
	assert!(session.engine().moves.is_empty());
	assert!(!session.activate(ControlAction::Remove));
	advance(&mut session, 2000);
	assert!(session.controls().is_none());
}
