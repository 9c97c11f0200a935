//! Level assignment and level-based placement.
//!
//! Levels come from a breadth-first walk from every root. The first level a
//! node is discovered at is kept, so a node reachable over paths of different
//! length may sit above its deepest parent. Nodes with both incoming and
//! outgoing edges that no root reaches (cycles) share the middle level. A
//! leaf only reachable from such a cycle gets no level and is left to
//! physics.

use std::collections::{BTreeMap, HashMap, VecDeque};

use log::debug;

use super::{NetworkEdge, NodeId};
use crate::layout::{Bounds, Placement, Point, Size};

const LEVEL_MIN_HEIGHT: f64 = 120.0;
const LEVEL_NODE_SPACING: f64 = 150.0;
const LEVEL_WIDTH_FRACTION: f64 = 0.8;

const ISOLATED_X_FRACTION: f64 = 0.3;
const ISOLATED_SPACING: f64 = 80.0;

const COLUMN_PADDING: f64 = 400.0;
const COLUMN_WIDTH: f64 = 300.0;
const COLUMN_ROW_SPACING: f64 = 120.0;
const COLUMN_MAX_ROWS: usize = 8;

/// How a node is connected.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeRole {
	/// Outgoing edges only.
	Root,
	/// Incoming edges only.
	Leaf,
	/// Both incoming and outgoing edges.
	Connected,
	/// No edges.
	Isolated,
}

/// Result of leveling a graph.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Hierarchy {
	pub levels: BTreeMap<NodeId, usize>,
	/// Nodes per level in input order; index is the level.
	pub by_level: Vec<Vec<NodeId>>,
	pub isolated: Vec<NodeId>,
	pub max_level: usize,
}

impl Hierarchy {
	pub fn level(&self, id: NodeId) -> Option<usize> {
		self.levels.get(&id).copied()
	}

	pub fn is_isolated(&self, id: NodeId) -> bool {
		self.isolated.contains(&id)
	}
}

/// Classify and level `nodes`. Edges with an endpoint outside `nodes` are
/// ignored.
pub fn compute_levels(nodes: &[NodeId], edges: &[NetworkEdge]) -> Hierarchy {
	let mut outgoing: HashMap<NodeId, Vec<NodeId>> = nodes.iter().map(|&n| (n, Vec::new())).collect();
	let mut incoming: HashMap<NodeId, usize> = nodes.iter().map(|&n| (n, 0)).collect();
	for edge in edges {
		if !(outgoing.contains_key(&edge.from) && incoming.contains_key(&edge.to)) {
			continue;
		}
		if let Some(targets) = outgoing.get_mut(&edge.from) {
			targets.push(edge.to);
		}
		if let Some(count) = incoming.get_mut(&edge.to) {
			*count += 1;
		}
	}

	let role = |id: &NodeId| {
		let ins = incoming.get(id).copied().unwrap_or(0);
		let outs = outgoing.get(id).map_or(0, Vec::len);
		match (ins, outs) {
			(0, 0) => NodeRole::Isolated,
			(0, _) => NodeRole::Root,
			(_, 0) => NodeRole::Leaf,
			_ => NodeRole::Connected,
		}
	};

	let mut levels: BTreeMap<NodeId, usize> = BTreeMap::new();
	let mut queue: VecDeque<NodeId> = VecDeque::new();
	let mut isolated = Vec::new();
	for id in nodes {
		match role(id) {
			NodeRole::Root => {
				levels.insert(*id, 0);
				queue.push_back(*id);
			}
			NodeRole::Isolated => isolated.push(*id),
			NodeRole::Leaf | NodeRole::Connected => {}
		}
	}

	let mut max_level = 0;
	while let Some(current) = queue.pop_front() {
		let level = levels[&current];
		for &target in outgoing.get(&current).map(Vec::as_slice).unwrap_or(&[]) {
			if levels.contains_key(&target) {
				continue;
			}
			levels.insert(target, level + 1);
			max_level = max_level.max(level + 1);
			queue.push_back(target);
		}
	}

	let fallback = max_level / 2;
	for id in nodes {
		if !levels.contains_key(id) && role(id) == NodeRole::Connected {
			levels.insert(*id, fallback);
		}
	}

	let mut by_level = vec![Vec::new(); max_level + 1];
	for id in nodes {
		if let Some(&level) = levels.get(id) {
			by_level[level].push(*id);
		}
	}

	debug!(
		"leveled {} nodes: max level {}, {} isolated",
		nodes.len(),
		max_level,
		isolated.len()
	);

	Hierarchy {
		levels,
		by_level,
		isolated,
		max_level,
	}
}

/// Spread every level along a horizontal row, levels stacked top to bottom
/// and centred on the origin. Isolated nodes go into a pinned column to the
/// right.
pub fn hierarchical_positions(hierarchy: &Hierarchy, container: Size) -> BTreeMap<NodeId, Placement> {
	let level_height = LEVEL_MIN_HEIGHT.max(container.height / (hierarchy.max_level as f64 + 2.0));
	let start_y = -(hierarchy.max_level as f64 * level_height) / 2.0;

	let mut placements = BTreeMap::new();
	for (level, ids) in hierarchy.by_level.iter().enumerate() {
		if ids.is_empty() {
			continue;
		}
		let y = start_y + level as f64 * level_height;
		let count = ids.len() as f64;
		let level_width = (container.width * LEVEL_WIDTH_FRACTION).min(count * LEVEL_NODE_SPACING);
		let spacing = level_width / (count - 1.0).max(1.0);
		let start_x = -level_width / 2.0;
		for (i, id) in ids.iter().enumerate() {
			let x = if ids.len() == 1 {
				0.0
			} else {
				start_x + i as f64 * spacing
			};
			placements.insert(
				*id,
				Placement {
					position: Point::new(x, y),
					pinned: false,
				},
			);
		}
	}

	let column_x = container.width * ISOLATED_X_FRACTION;
	let column_top = -(hierarchy.isolated.len() as f64 * ISOLATED_SPACING) / 2.0;
	for (i, id) in hierarchy.isolated.iter().enumerate() {
		placements.insert(
			*id,
			Placement {
				position: Point::new(column_x, column_top + i as f64 * ISOLATED_SPACING),
				pinned: true,
			},
		);
	}
	placements
}

/// Columns of isolated nodes to the right of the connected component's
/// bounding box, top-aligned with it. `None` when there is nothing to place
/// or nothing to align against.
pub fn isolated_columns(
	isolated: &[NodeId],
	connected: impl IntoIterator<Item = Point>,
) -> Option<BTreeMap<NodeId, Placement>> {
	if isolated.is_empty() {
		return None;
	}
	let bounds = Bounds::of(connected)?;
	Some(
		isolated
			.iter()
			.enumerate()
			.map(|(i, id)| {
				let column = (i / COLUMN_MAX_ROWS) as f64;
				let row = (i % COLUMN_MAX_ROWS) as f64;
				let position = Point::new(
					bounds.right + COLUMN_PADDING + column * COLUMN_WIDTH,
					bounds.top + row * COLUMN_ROW_SPACING,
				);
				(
					*id,
					Placement {
						position,
						pinned: true,
					},
				)
			})
			.collect(),
	)
}
