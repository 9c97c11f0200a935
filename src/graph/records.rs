//! Tagged records injected by the host as the panel's data source.

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Entity type marking a derived finding.
pub const CONCLUSION_TYPE: &str = "conclusion";

/// One element of the raw record list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawRecord {
	/// A named item that becomes a node.
	Entity(RawEntity),
	/// A typed link between two entities.
	Relation(RawRelation),
	/// Anything else the host sends along; ignored.
	#[serde(other)]
	Unknown,
}

/// Entity record as produced by the knowledge store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawEntity {
	pub name: String,
	#[serde(default)]
	pub entity_type: String,
	#[serde(default)]
	pub observations: Vec<String>,
}

impl RawEntity {
	pub fn is_conclusion(&self) -> bool {
		self.entity_type == CONCLUSION_TYPE
	}
}

/// Relation record as produced by the knowledge store.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawRelation {
	pub from: String,
	pub to: String,
	#[serde(default)]
	pub relation_type: String,
}

/// Parse a JSON array of records.
pub fn parse_records(json: &str) -> Result<Vec<RawRecord>, LoadError> {
	Ok(serde_json::from_str(json)?)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn parses_mixed_records() {
		let records = parse_records(
			r#"[
				{"type": "entity", "name": "source.py", "entityType": "file", "observations": ["a", "b"]},
				{"type": "entity", "name": "Taxes are flat", "entityType": "conclusion"},
				{"type": "relation", "from": "Taxes are flat", "to": "source.py", "relationType": "based_on"},
				{"type": "comment", "text": "ignored"}
			]"#,
		)
		.expect("records parse");

		assert_eq!(records.len(), 4);
		match &records[0] {
			RawRecord::Entity(e) => {
				assert_eq!(e.name, "source.py");
				assert_eq!(e.observations, vec!["a", "b"]);
				assert!(!e.is_conclusion());
			}
			other => panic!("unexpected record {other:?}"),
		}
		match &records[1] {
			RawRecord::Entity(e) => assert!(e.is_conclusion()),
			other => panic!("unexpected record {other:?}"),
		}
		match &records[2] {
			RawRecord::Relation(r) => assert_eq!(r.relation_type, "based_on"),
			other => panic!("unexpected record {other:?}"),
		}
		assert_eq!(records[3], RawRecord::Unknown);
	}

	#[test]
	fn rejects_non_array() {
		assert!(matches!(
			parse_records(r#"{"type": "entity"}"#),
			Err(LoadError::Malformed(_))
		));
	}
}
