//! Pure graph data: raw records, normalization, sizing and leveling.

use std::fmt;

use serde::{Deserialize, Serialize};

pub mod hierarchy;
pub mod normalize;
pub mod records;
pub mod scale;

pub use normalize::{NetworkData, NetworkEdge, NetworkNode};

/// Dense, 1-based node id assigned in entity order on every load.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}
