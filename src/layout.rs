//! The rendering surface as seen by the session, plus view fitting.

use std::collections::BTreeMap;

use crate::config::FitOptions;
use crate::error::EngineError;
use crate::graph::NodeId;

/// A point in canvas (model) or screen space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

/// Container size in CSS pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub const fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}

/// Where a node goes and whether physics may move it afterwards.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Placement {
	pub position: Point,
	pub pinned: bool,
}

/// Physics mode of the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Physics {
	/// Simulation runs; placed nodes are held on their level row.
	Hierarchical,
	/// Simulation is stopped; nodes only move when dragged.
	Disabled,
}

/// Node palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeStyle {
	#[default]
	Default,
	Conclusion,
	Removed,
	Isolated,
}

/// Edge palette.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum EdgeStyle {
	#[default]
	Default,
	Muted,
}

/// Capabilities the session needs from the rendering surface.
///
/// Mutating calls fail with [`EngineError::UnknownNode`] for ids that are not
/// part of the layout; callers log and carry on.
pub trait LayoutEngine {
	/// Current canvas position of every node.
	fn positions(&self) -> BTreeMap<NodeId, Point>;
	/// Move nodes; unknown ids are ignored.
	fn set_positions(&mut self, placements: &BTreeMap<NodeId, Placement>);
	/// Canvas point → container pixel.
	fn canvas_to_dom(&self, point: Point) -> Result<Point, EngineError>;
	/// Current zoom factor.
	fn scale(&self) -> f64;
	/// Center the view on `center` at zoom `scale`.
	fn move_to(&mut self, center: Point, scale: f64);
	fn set_physics(&mut self, physics: Physics);
	fn set_node_size(&mut self, id: NodeId, size: f64) -> Result<(), EngineError>;
	fn set_node_style(&mut self, id: NodeId, style: NodeStyle) -> Result<(), EngineError>;
	/// Restyle every edge touching `id`.
	fn set_connected_edge_style(&mut self, id: NodeId, style: EdgeStyle) -> Result<(), EngineError>;
	fn container_size(&self) -> Size;
}

/// Axis-aligned bounds of a point set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub left: f64,
	pub right: f64,
	pub top: f64,
	pub bottom: f64,
}

impl Bounds {
	pub fn of(points: impl IntoIterator<Item = Point>) -> Option<Self> {
		points.into_iter().fold(None, |acc, p| {
			Some(match acc {
				None => Bounds {
					left: p.x,
					right: p.x,
					top: p.y,
					bottom: p.y,
				},
				Some(b) => Bounds {
					left: b.left.min(p.x),
					right: b.right.max(p.x),
					top: b.top.min(p.y),
					bottom: b.bottom.max(p.y),
				},
			})
		})
	}

	pub fn center(&self) -> Point {
		Point::new((self.left + self.right) / 2.0, (self.top + self.bottom) / 2.0)
	}
}

/// Center and zoom that fit `positions` into `container`.
///
/// Returns `None` when there is nothing to fit. A degenerate extent (all
/// nodes on one line) counts as one pixel wide.
pub fn fit_view(
	positions: impl IntoIterator<Item = Point>,
	container: Size,
	options: FitOptions,
) -> Option<(Point, f64)> {
	let bounds = Bounds::of(positions)?;
	let width = nonzero(bounds.right - bounds.left);
	let height = nonzero(bounds.bottom - bounds.top);
	let pad = options.padding_px.max(0.0);
	let inner_w = (nonzero(container.width) - 2.0 * pad).max(10.0);
	let inner_h = (nonzero(container.height) - 2.0 * pad).max(10.0);
	let margin = options.margin.clamp(0.4, 1.0);
	let scale = (inner_w / width).min(inner_h / height) * margin;
	Some((bounds.center(), scale))
}

fn nonzero(v: f64) -> f64 {
	if v == 0.0 || !v.is_finite() { 1.0 } else { v }
}
