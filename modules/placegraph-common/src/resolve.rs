//! Fallback-chain property resolution.
//!
//! Property names drifted across schema revisions (`name` → `place_name` /
//! `unit_name`, `type` → `place_type` / `unit_type`). Every consumer resolves
//! display fields through one shared [`FieldChains`] so the map and the table
//! never disagree about the same entity.

use serde_json::{Map, Value};

use crate::types::{Entity, EntityId};

pub const LATITUDE_KEY: &str = "latitude";
pub const LONGITUDE_KEY: &str = "longitude";

/// Ordered candidate property names per logical field. First usable value wins.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChains {
    pub name: Vec<String>,
    pub place_type: Vec<String>,
    pub type2: Vec<String>,
    pub subject: Vec<String>,
    pub subject2: Vec<String>,
}

impl Default for FieldChains {
    fn default() -> Self {
        Self {
            name: chain(&["name", "place_name", "unit_name"]),
            place_type: chain(&["type", "place_type", "unit_type"]),
            type2: chain(&["type2"]),
            subject: chain(&["subject"]),
            subject2: chain(&["subject2"]),
        }
    }
}

impl FieldChains {
    /// Display name, or `Node <id>` when no candidate matches.
    pub fn resolve_name(&self, entity: &Entity, id: EntityId) -> String {
        resolve_text(&entity.properties, &self.name).unwrap_or_else(|| placeholder_name(id))
    }

    pub fn resolve_type(&self, entity: &Entity) -> Option<String> {
        resolve_text(&entity.properties, &self.place_type)
    }

    pub fn resolve_type2(&self, entity: &Entity) -> Option<String> {
        resolve_text(&entity.properties, &self.type2)
    }

    pub fn resolve_subject(&self, entity: &Entity) -> Option<String> {
        resolve_text(&entity.properties, &self.subject)
    }

    pub fn resolve_subject2(&self, entity: &Entity) -> Option<String> {
        resolve_text(&entity.properties, &self.subject2)
    }
}

pub fn placeholder_name(id: EntityId) -> String {
    format!("Node {id}")
}

/// First candidate holding a non-empty string, a number or a boolean.
pub fn resolve_text(properties: &Map<String, Value>, candidates: &[String]) -> Option<String> {
    candidates
        .iter()
        .filter_map(|key| properties.get(key))
        .find_map(display_text)
}

fn display_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Numeric coordinate property. Strings and non-finite values count as absent.
pub fn coordinate(properties: &Map<String, Value>, key: &str) -> Option<f64> {
    properties
        .get(key)
        .and_then(Value::as_f64)
        .filter(|v| v.is_finite())
}

pub fn latitude(entity: &Entity) -> Option<f64> {
    coordinate(&entity.properties, LATITUDE_KEY)
}

pub fn longitude(entity: &Entity) -> Option<f64> {
    coordinate(&entity.properties, LONGITUDE_KEY)
}

/// Parse a comma-separated override such as `name,place_name,unit_name`.
pub fn parse_chain(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn chain(keys: &[&str]) -> Vec<String> {
    keys.iter().map(|k| k.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn place_name_used_when_name_missing() {
        let entity = Entity::new(4, "Place").with_property("place_name", "X");
        let chains = FieldChains::default();
        assert_eq!(chains.resolve_name(&entity, EntityId(4)), "X");
    }

    #[test]
    fn no_name_candidate_yields_placeholder() {
        let entity = Entity::new(7, "Place").with_property("population", 12);
        let chains = FieldChains::default();
        assert_eq!(chains.resolve_name(&entity, EntityId(7)), "Node 7");
    }

    #[test]
    fn earlier_candidate_wins_over_later() {
        let entity = Entity::new(1, "Unit")
            .with_property("unit_name", "Later")
            .with_property("name", "First");
        assert_eq!(FieldChains::default().resolve_name(&entity, EntityId(1)), "First");
    }

    #[test]
    fn null_and_blank_values_fall_through() {
        let entity = Entity::new(1, "Unit")
            .with_property("name", Value::Null)
            .with_property("place_name", "  ")
            .with_property("unit_name", "Cardiff");
        assert_eq!(FieldChains::default().resolve_name(&entity, EntityId(1)), "Cardiff");
    }

    #[test]
    fn typed_fields_resolve_to_none_without_match() {
        let entity = Entity::new(1, "Place");
        let chains = FieldChains::default();
        assert_eq!(chains.resolve_type(&entity), None);
        assert_eq!(chains.resolve_subject(&entity), None);
        assert_eq!(chains.resolve_subject2(&entity), None);
        assert_eq!(chains.resolve_type2(&entity), None);
    }

    #[test]
    fn type_falls_back_to_unit_type() {
        let entity = Entity::new(1, "Unit").with_property("unit_type", "county");
        assert_eq!(
            FieldChains::default().resolve_type(&entity).as_deref(),
            Some("county")
        );
    }

    #[test]
    fn numbers_render_as_text() {
        let props = json!({"code": 42}).as_object().cloned().unwrap();
        assert_eq!(resolve_text(&props, &chain(&["code"])).as_deref(), Some("42"));
    }

    #[test]
    fn coordinates_must_be_numeric() {
        let entity = Entity::new(1, "Place")
            .with_property("latitude", "51.4")
            .with_property("longitude", -3.1);
        assert_eq!(latitude(&entity), None);
        assert_eq!(longitude(&entity), Some(-3.1));
    }

    #[test]
    fn integer_coordinates_are_accepted() {
        let entity = Entity::new(1, "Place").with_property("latitude", 51);
        assert_eq!(latitude(&entity), Some(51.0));
    }

    #[test]
    fn parse_chain_trims_and_skips_empty() {
        assert_eq!(parse_chain(" name, ,label_en "), chain(&["name", "label_en"]));
        assert!(parse_chain("").is_empty());
    }
}
