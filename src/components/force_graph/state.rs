use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::warn;

use crate::error::EngineError;
use crate::graph::{NetworkData, NodeId};
use crate::layout::{EdgeStyle, LayoutEngine, NodeStyle, Physics, Placement, Point, Size};

/// Extra pick radius around a node, in canvas units.
pub const HIT_SLACK: f64 = 2.0;
const MIN_ZOOM: f64 = 0.1;
const MAX_ZOOM: f64 = 10.0;

/// Largest per-tick movement that still counts as settled.
const SETTLE_DISTANCE: f32 = 0.05;
/// Ticks before settling is considered at all.
const MIN_STABILIZATION_TICKS: u32 = 30;
/// Ticks after which the layout counts as settled regardless.
const MAX_STABILIZATION_TICKS: u32 = 600;
/// Repulsion mass of a node with normalized value 1.
const BASE_MASS: f32 = 10.0;

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: NodeId,
	pub label: String,
	/// Tooltip shown while the pointer rests on the node.
	pub title: String,
	/// Diameter in canvas units.
	pub size: f64,
	pub style: NodeStyle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeInfo {
	pub from: NodeId,
	pub to: NodeId,
	pub style: EdgeStyle,
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node: Option<NodeId>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

/// Hover change detected from pointer movement.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HoverEvent {
	Enter(NodeId),
	Leave,
}

/// [`LayoutEngine`] over a `force_graph` simulation with a pan/zoom view.
pub struct ForceGraphEngine {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub width: f64,
	pub height: f64,
	physics: Physics,
	index: HashMap<NodeId, DefaultNodeIdx>,
	edges: Vec<EdgeInfo>,
	rows: HashMap<NodeId, f32>,
	hovered: Option<NodeId>,
	ticks: u32,
	stabilized: bool,
}

impl ForceGraphEngine {
	pub fn new(data: &NetworkData, width: f64, height: f64) -> Self {
		let mut graph = ForceGraph::new(SimulationParameters {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut index = HashMap::new();
		let mut edges = Vec::new();

		for (i, node) in data.nodes.iter().enumerate() {
			let angle = (i as f64) * 2.0 * PI / data.nodes.len() as f64;
			let (x, y) = ((100.0 * angle.cos()) as f32, (100.0 * angle.sin()) as f32);
			let idx = graph.add_node(NodeData {
				x,
				y,
				mass: BASE_MASS * node.value as f32,
				is_anchor: false,
				user_data: NodeInfo {
					id: node.id,
					label: node.label.clone(),
					title: node.title.clone(),
					size: node.size,
					style: NodeStyle::Default,
				},
			});
			index.insert(node.id, idx);
		}

		for edge in &data.edges {
			if let (Some(&src), Some(&tgt)) = (index.get(&edge.from), index.get(&edge.to)) {
				graph.add_edge(src, tgt, EdgeData::default());
				edges.push(EdgeInfo {
					from: edge.from,
					to: edge.to,
					style: EdgeStyle::Default,
				});
			}
		}

		Self {
			graph,
			index,
			edges,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			width,
			height,
			physics: Physics::Disabled,
			rows: HashMap::new(),
			hovered: None,
			ticks: 0,
			stabilized: false,
		}
	}

	pub fn edges(&self) -> &[EdgeInfo] {
		&self.edges
	}

	pub fn physics(&self) -> Physics {
		self.physics
	}

	pub fn hovered(&self) -> Option<NodeId> {
		self.hovered
	}

	/// Tooltip of the node under the pointer.
	pub fn hovered_title(&self) -> Option<String> {
		let id = self.hovered?;
		let mut title = None;
		self.graph.visit_nodes(|node| {
			if node.data.user_data.id == id {
				title = Some(node.data.user_data.title.clone());
			}
		});
		title
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<NodeId> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			let radius = node.data.user_data.size / 2.0 + HIT_SLACK;
			if (dx * dx + dy * dy).sqrt() < radius {
				found = Some(node.data.user_data.id);
			}
		});
		found
	}

	/// Track the node under the pointer and report enter/leave changes.
	pub fn pointer_moved(&mut self, sx: f64, sy: f64) -> Option<HoverEvent> {
		let under = self.node_at_position(sx, sy);
		self.set_hover(under)
	}

	pub fn pointer_left(&mut self) -> Option<HoverEvent> {
		self.drag.active = false;
		self.drag.node = None;
		self.pan.active = false;
		self.set_hover(None)
	}

	fn set_hover(&mut self, node: Option<NodeId>) -> Option<HoverEvent> {
		if self.hovered == node {
			return None;
		}
		self.hovered = node;
		Some(match node {
			Some(id) => HoverEvent::Enter(id),
			None => HoverEvent::Leave,
		})
	}

	/// Start dragging the node under the pointer, or panning if there is none.
	pub fn press(&mut self, sx: f64, sy: f64) {
		if let Some(id) = self.node_at_position(sx, sy) {
			self.drag.active = true;
			self.drag.node = Some(id);
			self.drag.start_x = sx;
			self.drag.start_y = sy;
			if let Some(&idx) = self.index.get(&id) {
				self.graph.visit_nodes(|node| {
					if node.index() == idx {
						self.drag.node_start_x = node.x();
						self.drag.node_start_y = node.y();
					}
				});
			}
		} else {
			self.pan.active = true;
			self.pan.start_x = sx;
			self.pan.start_y = sy;
			self.pan.transform_start_x = self.transform.x;
			self.pan.transform_start_y = self.transform.y;
		}
	}

	/// Continue a drag or pan. Returns `true` if anything moved.
	pub fn drag_to(&mut self, sx: f64, sy: f64) -> bool {
		if self.drag.active {
			let Some(idx) = self.drag.node.and_then(|id| self.index.get(&id).copied()) else {
				return false;
			};
			let (dx, dy) = (
				(sx - self.drag.start_x) / self.transform.k,
				(sy - self.drag.start_y) / self.transform.k,
			);
			let (nx, ny) = (
				self.drag.node_start_x + dx as f32,
				self.drag.node_start_y + dy as f32,
			);
			self.graph.visit_nodes_mut(|node| {
				if node.index() == idx {
					node.data.x = nx;
					node.data.y = ny;
					node.data.is_anchor = true;
				}
			});
			true
		} else if self.pan.active {
			self.transform.x = self.pan.transform_start_x + (sx - self.pan.start_x);
			self.transform.y = self.pan.transform_start_y + (sy - self.pan.start_y);
			true
		} else {
			false
		}
	}

	pub fn release(&mut self) {
		self.drag.active = false;
		self.drag.node = None;
		self.pan.active = false;
	}

	pub fn is_dragging(&self) -> bool {
		self.drag.active || self.pan.active
	}

	/// Zoom around the pointer, one step per wheel event.
	pub fn zoom_at(&mut self, sx: f64, sy: f64, delta_y: f64) {
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Advance the simulation. Returns `true` exactly once, on the tick the
	/// layout is considered stabilized.
	pub fn tick(&mut self, dt: f32) -> bool {
		if self.physics == Physics::Disabled {
			return false;
		}
		let mut before: HashMap<DefaultNodeIdx, (f32, f32)> = HashMap::new();
		self.graph.visit_nodes(|node| {
			before.insert(node.index(), (node.x(), node.y()));
		});

		self.graph.update(dt);
		if self.physics == Physics::Hierarchical {
			self.graph.visit_nodes_mut(|node| {
				if let Some(&y) = self.rows.get(&node.data.user_data.id) {
					node.data.y = y;
				}
			});
		}

		let mut moved: f32 = 0.0;
		self.graph.visit_nodes(|node| {
			if let Some(&(x, y)) = before.get(&node.index()) {
				moved = moved.max(((node.x() - x).powi(2) + (node.y() - y).powi(2)).sqrt());
			}
		});

		self.ticks += 1;
		if self.stabilized || self.ticks < MIN_STABILIZATION_TICKS {
			return false;
		}
		if moved < SETTLE_DISTANCE || self.ticks >= MAX_STABILIZATION_TICKS {
			self.stabilized = true;
			return true;
		}
		false
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}

	fn lookup(&self, id: NodeId) -> Result<DefaultNodeIdx, EngineError> {
		self.index.get(&id).copied().ok_or(EngineError::UnknownNode(id))
	}
}

impl LayoutEngine for ForceGraphEngine {
	fn positions(&self) -> BTreeMap<NodeId, Point> {
		let mut positions = BTreeMap::new();
		self.graph.visit_nodes(|node| {
			positions.insert(
				node.data.user_data.id,
				Point::new(node.x() as f64, node.y() as f64),
			);
		});
		positions
	}

	fn set_positions(&mut self, placements: &BTreeMap<NodeId, Placement>) {
		self.graph.visit_nodes_mut(|node| {
			let id = node.data.user_data.id;
			if let Some(placement) = placements.get(&id) {
				node.data.x = placement.position.x as f32;
				node.data.y = placement.position.y as f32;
				node.data.is_anchor = placement.pinned;
				if placement.pinned {
					self.rows.remove(&id);
				} else {
					self.rows.insert(id, placement.position.y as f32);
				}
			}
		});
	}

	fn canvas_to_dom(&self, point: Point) -> Result<Point, EngineError> {
		let k = self.transform.k;
		if !(k.is_finite() && k > 0.0) {
			return Err(EngineError::DegenerateTransform(k));
		}
		Ok(Point::new(
			point.x * k + self.transform.x,
			point.y * k + self.transform.y,
		))
	}

	fn scale(&self) -> f64 {
		self.transform.k
	}

	fn move_to(&mut self, center: Point, scale: f64) {
		if !(scale.is_finite() && scale > 0.0) {
			warn!("ignoring view scale {scale}");
			return;
		}
		self.transform.k = scale;
		self.transform.x = self.width / 2.0 - center.x * scale;
		self.transform.y = self.height / 2.0 - center.y * scale;
	}

	fn set_physics(&mut self, physics: Physics) {
		self.physics = physics;
		if physics == Physics::Disabled {
			self.rows.clear();
		}
	}

	fn set_node_size(&mut self, id: NodeId, size: f64) -> Result<(), EngineError> {
		let idx = self.lookup(id)?;
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.user_data.size = size;
			}
		});
		Ok(())
	}

	fn set_node_style(&mut self, id: NodeId, style: NodeStyle) -> Result<(), EngineError> {
		let idx = self.lookup(id)?;
		self.graph.visit_nodes_mut(|node| {
			if node.index() == idx {
				node.data.user_data.style = style;
			}
		});
		Ok(())
	}

	fn set_connected_edge_style(&mut self, id: NodeId, style: EdgeStyle) -> Result<(), EngineError> {
		self.lookup(id)?;
		for edge in self.edges.iter_mut().filter(|e| e.from == id || e.to == id) {
			edge.style = style;
		}
		Ok(())
	}

	fn container_size(&self) -> Size {
		Size::new(self.width, self.height)
	}
}
