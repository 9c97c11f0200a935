//! Raw records → weighted nodes and directed edges.

use std::collections::HashMap;

use log::{debug, warn};

use super::NodeId;
use super::records::{RawEntity, RawRecord, RawRelation};
use super::scale;

/// Default weight of ordinary entities.
pub const ENTITY_WEIGHT: u8 = 1;
/// Default weight of conclusion entities.
pub const CONCLUSION_WEIGHT: u8 = 3;

/// Relation type that always points from the evidence to the finding.
const BASED_ON: &str = "based_on";
/// Conclusion-to-conclusion relation types that are drawn reversed.
const REVERSED_BETWEEN_CONCLUSIONS: &[&str] = &["extends", "contrasts", "contrasts_with"];

/// A data source after default weighting.
#[derive(Clone, Debug, PartialEq)]
pub struct Entity {
	pub name: String,
	pub description: String,
	pub weight: u8,
	pub is_conclusion: bool,
}

/// A relation after direction rules were applied.
#[derive(Clone, Debug, PartialEq)]
pub struct Connection {
	pub from: String,
	pub to: String,
	pub relation_type: String,
	pub weight: u8,
	pub from_is_conclusion: bool,
	pub to_is_conclusion: bool,
}

/// Entities and connections in load order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SourceData {
	pub entities: Vec<Entity>,
	pub connections: Vec<Connection>,
}

/// A node as handed to the layout engine.
#[derive(Clone, Debug, PartialEq)]
pub struct NetworkNode {
	pub id: NodeId,
	pub label: String,
	/// Tooltip text.
	pub title: String,
	/// Compressed relative weight in `[sqrt(0.4), 1]`. Scales the node's
	/// repulsion mass; drawing uses `size`.
	pub value: f64,
	/// Diameter in pixels derived from `weight`.
	pub size: f64,
	pub weight: u8,
	pub is_conclusion: bool,
}

/// A directed edge between two loaded nodes.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NetworkEdge {
	pub from: NodeId,
	pub to: NodeId,
	pub value: u8,
}

/// Everything the panel renders for one load.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NetworkData {
	pub nodes: Vec<NetworkNode>,
	pub edges: Vec<NetworkEdge>,
}

impl NetworkData {
	pub fn node(&self, id: NodeId) -> Option<&NetworkNode> {
		self.nodes.iter().find(|n| n.id == id)
	}
}

/// Whether a relation is drawn from `to` to `from`.
pub fn should_reverse(relation_type: &str, from_is_conclusion: bool, to_is_conclusion: bool) -> bool {
	if relation_type == BASED_ON {
		return true;
	}
	from_is_conclusion && to_is_conclusion && REVERSED_BETWEEN_CONCLUSIONS.contains(&relation_type)
}

/// Linear min/max normalization followed by `sqrt(0.6 * x + 0.4)`.
pub fn weight_normalizer(weights: &[u8]) -> impl Fn(u8) -> f64 + use<> {
	let min = weights.iter().copied().min().unwrap_or(0);
	let max = weights.iter().copied().max().unwrap_or(0);
	move |w| {
		if max == min {
			return 1.0;
		}
		let linear = (w as f64 - min as f64) / (max as f64 - min as f64);
		(linear * 0.6 + 0.4).sqrt()
	}
}

fn entity_from(raw: &RawEntity) -> Entity {
	let is_conclusion = raw.is_conclusion();
	Entity {
		name: raw.name.clone(),
		description: raw.observations.join(" "),
		weight: if is_conclusion { CONCLUSION_WEIGHT } else { ENTITY_WEIGHT },
		is_conclusion,
	}
}

fn connection_from(raw: &RawRelation, conclusions: &HashMap<&str, bool>) -> Connection {
	let from_is_conclusion = conclusions.get(raw.from.as_str()).copied().unwrap_or(false);
	let to_is_conclusion = conclusions.get(raw.to.as_str()).copied().unwrap_or(false);
	let reverse = should_reverse(&raw.relation_type, from_is_conclusion, to_is_conclusion);
	if from_is_conclusion && to_is_conclusion {
		debug!(
			"conclusion relation {} --{}--> {} (reverse: {})",
			raw.from, raw.relation_type, raw.to, reverse
		);
	}
	if reverse {
		Connection {
			from: raw.to.clone(),
			to: raw.from.clone(),
			relation_type: raw.relation_type.clone(),
			weight: 1,
			from_is_conclusion: to_is_conclusion,
			to_is_conclusion: from_is_conclusion,
		}
	} else {
		Connection {
			from: raw.from.clone(),
			to: raw.to.clone(),
			relation_type: raw.relation_type.clone(),
			weight: 1,
			from_is_conclusion,
			to_is_conclusion,
		}
	}
}

/// Split records into weighted entities and directed connections.
///
/// Entity names are unique per load: a repeated name is dropped with a
/// warning. Connections whose effective source is a conclusion are dropped so
/// conclusions only ever appear as sinks.
pub fn collect(records: &[RawRecord]) -> SourceData {
	let mut entities: Vec<Entity> = Vec::new();
	let mut conclusions: HashMap<&str, bool> = HashMap::new();
	for record in records {
		let RawRecord::Entity(raw) = record else {
			continue;
		};
		if conclusions.contains_key(raw.name.as_str()) {
			warn!("duplicate entity {:?} skipped", raw.name);
			continue;
		}
		conclusions.insert(raw.name.as_str(), raw.is_conclusion());
		entities.push(entity_from(raw));
	}

	let connections = records
		.iter()
		.filter_map(|record| match record {
			RawRecord::Relation(raw) => Some(connection_from(raw, &conclusions)),
			_ => None,
		})
		.filter(|c| {
			if c.from_is_conclusion {
				debug!("dropped outgoing edge from conclusion: {} -> {}", c.from, c.to);
			}
			!c.from_is_conclusion
		})
		.collect();

	SourceData {
		entities,
		connections,
	}
}

/// Assign ids and sizes and resolve connection endpoints.
pub fn build_network(source: &SourceData) -> NetworkData {
	let weights: Vec<u8> = source.entities.iter().map(|e| e.weight).collect();
	let normalize = weight_normalizer(&weights);

	let nodes: Vec<NetworkNode> = source
		.entities
		.iter()
		.enumerate()
		.map(|(i, e)| {
			let id = NodeId(i as u32 + 1);
			let label = if e.name.is_empty() {
				format!("Node {}", id)
			} else {
				e.name.clone()
			};
			NetworkNode {
				id,
				title: format!("{} (weight: {})", e.description, e.weight),
				label,
				value: normalize(e.weight),
				size: scale::node_size(Some(e.weight)),
				weight: e.weight,
				is_conclusion: e.is_conclusion,
			}
		})
		.collect();

	let name_to_id: HashMap<&str, NodeId> = source
		.entities
		.iter()
		.zip(&nodes)
		.map(|(e, n)| (e.name.as_str(), n.id))
		.collect();

	let edges = source
		.connections
		.iter()
		.filter_map(|c| {
			match (name_to_id.get(c.from.as_str()), name_to_id.get(c.to.as_str())) {
				(Some(&from), Some(&to)) => Some(NetworkEdge {
					from,
					to,
					value: c.weight,
				}),
				_ => {
					warn!("relation {} -> {} references an unknown entity, skipped", c.from, c.to);
					None
				}
			}
		})
		.collect();

	NetworkData { nodes, edges }
}

/// Records straight to renderable network data.
pub fn normalize(records: &[RawRecord]) -> NetworkData {
	build_network(&collect(records))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn entity(name: &str, entity_type: &str) -> RawRecord {
		RawRecord::Entity(RawEntity {
			name: name.into(),
			entity_type: entity_type.into(),
			observations: vec![format!("{name} observed")],
		})
	}

	fn relation(from: &str, to: &str, relation_type: &str) -> RawRecord {
		RawRecord::Relation(RawRelation {
			from: from.into(),
			to: to.into(),
			relation_type: relation_type.into(),
		})
	}

	fn edge_labels(data: &NetworkData) -> Vec<(String, String)> {
		data.edges
			.iter()
			.map(|e| {
				(
					data.node(e.from).map(|n| n.label.clone()).unwrap_or_default(),
					data.node(e.to).map(|n| n.label.clone()).unwrap_or_default(),
				)
			})
			.collect()
	}

	#[test]
	fn normalizer_is_monotonic_and_bounded() {
		let weights = [1, 2, 3, 4, 5, 3, 1];
		let f = weight_normalizer(&weights);
		let mut last = 0.0;
		for w in 1..=5 {
			let v = f(w);
			assert!(v >= 0.4f64.sqrt() - 1e-12 && v <= 1.0 + 1e-12, "{v} out of range");
			assert!(v >= last);
			last = v;
		}
		assert!((f(1) - 0.4f64.sqrt()).abs() < 1e-12);
		assert!((f(5) - 1.0).abs() < 1e-12);
	}

	#[test]
	fn equal_weights_normalize_to_one() {
		let f = weight_normalizer(&[2, 2, 2]);
		assert_eq!(f(2), 1.0);
		assert_eq!(weight_normalizer(&[])(3), 1.0);
	}

	#[test]
	fn direction_rules() {
		assert!(should_reverse("based_on", false, false));
		assert!(should_reverse("based_on", true, true));
		assert!(should_reverse("extends", true, true));
		assert!(should_reverse("contrasts", true, true));
		assert!(should_reverse("contrasts_with", true, true));
		assert!(!should_reverse("leads_to", true, true));
		assert!(!should_reverse("extends", false, true));
		assert!(!should_reverse("calls", false, false));
	}

	#[test]
	fn based_on_swaps_endpoints() {
		let data = normalize(&[
			entity("calc", "function"),
			entity("source.py", "file"),
			relation("calc", "source.py", "based_on"),
		]);
		assert_eq!(edge_labels(&data), vec![("source.py".into(), "calc".into())]);
	}

	#[test]
	fn conclusions_are_sinks_only() {
		let data = normalize(&[
			entity("A", "conclusion"),
			entity("B", "conclusion"),
			entity("f", "file"),
			relation("A", "f", "mentions"),
			relation("A", "B", "leads_to"),
			relation("A", "B", "extends"),
			relation("A", "f", "based_on"),
		]);
		let conclusions: Vec<NodeId> =
			data.nodes.iter().filter(|n| n.is_conclusion).map(|n| n.id).collect();
		assert!(data.edges.iter().all(|e| !conclusions.contains(&e.from)));
		assert_eq!(edge_labels(&data), vec![("f".into(), "A".into())]);
	}

	#[test]
	fn ids_are_dense_in_entity_order() {
		let data = normalize(&[
			relation("x", "y", "calls"),
			entity("x", "file"),
			entity("y", "conclusion"),
			entity("x", "file"),
			entity("", "file"),
		]);
		let ids: Vec<u32> = data.nodes.iter().map(|n| n.id.0).collect();
		assert_eq!(ids, vec![1, 2, 3]);
		assert_eq!(data.nodes[1].weight, CONCLUSION_WEIGHT);
		assert_eq!(data.nodes[1].size, 24.0);
		assert_eq!(data.nodes[0].title, "x observed (weight: 1)");
		assert_eq!(data.nodes[2].label, "Node 3");
	}

	#[test]
	fn unknown_endpoints_are_skipped() {
		let data = normalize(&[
			entity("a", "file"),
			entity("b", "file"),
			relation("a", "ghost", "calls"),
			relation("a", "b", "calls"),
		]);
		assert_eq!(data.edges.len(), 1);
		assert_eq!(data.edges[0].from, NodeId(1));
		assert_eq!(data.edges[0].to, NodeId(2));
	}
}
