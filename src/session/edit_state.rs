//! Client-side edits: weights, removals and the dirty flag.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::NodeId;
use crate::graph::scale::{self, DEFAULT_WEIGHT};

/// Visual update a state change asks for. The caller applies it after the
/// state has changed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EditEffect {
	Resized { id: NodeId, size: f64 },
	Removed { id: NodeId },
	Restored { id: NodeId, size: f64 },
}

/// Outcome of [`EditState::apply`].
#[derive(Clone, Debug, PartialEq)]
pub struct Applied {
	/// Weights to hand to the host.
	pub weights: BTreeMap<NodeId, u8>,
	/// Nodes that were removed and need their default visuals back.
	pub restored: Vec<NodeId>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct EditState {
	weights: BTreeMap<NodeId, u8>,
	baseline: BTreeMap<NodeId, u8>,
	removed: BTreeSet<NodeId>,
	protected: BTreeSet<NodeId>,
	dirty: bool,
}

impl EditState {
	/// Start from the loaded weights; the baseline is a copy of them.
	pub fn new(weights: BTreeMap<NodeId, u8>, protected: BTreeSet<NodeId>) -> Self {
		Self {
			baseline: weights.clone(),
			weights,
			removed: BTreeSet::new(),
			protected,
			dirty: false,
		}
	}

	pub fn weight(&self, id: NodeId) -> u8 {
		self.weights.get(&id).copied().unwrap_or(DEFAULT_WEIGHT)
	}

	pub fn weights(&self) -> &BTreeMap<NodeId, u8> {
		&self.weights
	}

	pub fn baseline(&self) -> &BTreeMap<NodeId, u8> {
		&self.baseline
	}

	pub fn is_dirty(&self) -> bool {
		self.dirty
	}

	pub fn is_removed(&self, id: NodeId) -> bool {
		self.removed.contains(&id)
	}

	pub fn is_protected(&self, id: NodeId) -> bool {
		self.protected.contains(&id)
	}

	pub fn removed(&self) -> impl Iterator<Item = NodeId> + '_ {
		self.removed.iter().copied()
	}

	fn weights_differ(&self) -> bool {
		self.weights.iter().any(|(id, w)| self.baseline.get(id) != Some(w))
	}

	/// Change a weight by `delta`, clamped to the weight range. Protected
	/// nodes and changes that clamp back to the current weight do nothing.
	pub fn adjust_weight(&mut self, id: NodeId, delta: i32) -> Option<EditEffect> {
		if self.is_protected(id) {
			return None;
		}
		let current = self.weight(id);
		let next = scale::clamp_weight(current as i32 + delta);
		if next == current {
			return None;
		}
		self.weights.insert(id, next);
		self.dirty = self.weights_differ();
		Some(EditEffect::Resized {
			id,
			size: scale::node_size(Some(next)),
		})
	}

	/// Mark a node as removed. The edit always counts as dirty.
	pub fn remove(&mut self, id: NodeId) -> Option<EditEffect> {
		if self.is_protected(id) {
			return None;
		}
		self.removed.insert(id);
		self.dirty = true;
		Some(EditEffect::Removed { id })
	}

	/// Bring a removed node back with a weight of at least the default.
	pub fn restore(&mut self, id: NodeId) -> Option<EditEffect> {
		if !self.removed.remove(&id) {
			return None;
		}
		let weight = self.weight(id).max(DEFAULT_WEIGHT);
		self.weights.insert(id, weight);
		self.dirty = true;
		Some(EditEffect::Restored {
			id,
			size: scale::node_size(Some(weight)),
		})
	}

	/// Make the current weights the new baseline and clear removals.
	pub fn apply(&mut self) -> Applied {
		self.baseline = self.weights.clone();
		let restored = std::mem::take(&mut self.removed).into_iter().collect();
		self.dirty = false;
		Applied {
			weights: self.weights.clone(),
			restored,
		}
	}
}
