use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

// --- Identity ---

/// Database-assigned identity of a graph entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub i64);

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire form of an identity: `{ "low": <int> }`. Extra fields (`high`) are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub low: i64,
}

impl From<EntityId> for Identity {
    fn from(id: EntityId) -> Self {
        Identity { low: id.0 }
    }
}

// --- Boundary rows ---

/// A graph node as it arrives from the gateway.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Entity {
    #[serde(default)]
    pub identity: Option<Identity>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub properties: Map<String, Value>,
}

impl Entity {
    pub fn new(id: i64, label: &str) -> Self {
        Self {
            identity: Some(Identity { low: id }),
            labels: vec![label.to_string()],
            properties: Map::new(),
        }
    }

    pub fn with_property(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.properties.insert(key.to_string(), value.into());
        self
    }

    pub fn id(&self) -> Option<EntityId> {
        self.identity.map(|i| EntityId(i.low))
    }

    /// First label, used as the display type.
    pub fn primary_label(&self) -> Option<&str> {
        self.labels.first().map(String::as_str)
    }
}

/// A typed relationship. Its endpoints are implied by the row it sits in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "type")]
    pub rel_type: String,
}

impl Relationship {
    pub fn new(rel_type: &str) -> Self {
        Self {
            rel_type: rel_type.to_string(),
        }
    }
}

/// One `(n, r, m)` result row. Relationship and end entity are independently optional.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ResultRow {
    #[serde(rename = "n", default)]
    pub start: Option<Entity>,
    #[serde(rename = "r", default)]
    pub relationship: Option<Relationship>,
    #[serde(rename = "m", default)]
    pub end: Option<Entity>,
}

pub const START_ALIAS: &str = "n";
pub const RELATIONSHIP_ALIAS: &str = "r";
pub const END_ALIAS: &str = "m";

impl ResultRow {
    pub fn node(start: Entity) -> Self {
        Self {
            start: Some(start),
            relationship: None,
            end: None,
        }
    }

    pub fn edge(start: Entity, rel_type: &str, end: Entity) -> Self {
        Self {
            start: Some(start),
            relationship: Some(Relationship::new(rel_type)),
            end: Some(end),
        }
    }

    /// Read the `n`/`r`/`m` aliases out of a gateway record. Anything absent,
    /// null or mis-shaped is treated as missing.
    pub fn from_record(record: &Record) -> Self {
        Self {
            start: record.decode(START_ALIAS),
            relationship: record.decode(RELATIONSHIP_ALIAS),
            end: record.decode(END_ALIAS),
        }
    }

    /// Start entity, only when it carries an identity.
    pub fn identified_start(&self) -> Option<(EntityId, &Entity)> {
        let start = self.start.as_ref()?;
        Some((start.id()?, start))
    }

    /// The `(start, relationship, end)` triple when every part is present and
    /// both endpoints carry identities. A row without it is a dangling edge.
    pub fn edge_parts(&self) -> Option<EdgeParts<'_>> {
        match (&self.start, &self.relationship, &self.end) {
            (Some(start), Some(rel), Some(end)) => Some(EdgeParts {
                start_id: start.id()?,
                start,
                relationship: rel,
                end_id: end.id()?,
                end,
            }),
            _ => None,
        }
    }
}

pub struct EdgeParts<'a> {
    pub start_id: EntityId,
    pub start: &'a Entity,
    pub relationship: &'a Relationship,
    pub end_id: EntityId,
    pub end: &'a Entity,
}

/// A single gateway result record: column alias → JSON value.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    columns: Map<String, Value>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn insert(&mut self, column: &str, value: impl Into<Value>) {
        self.columns.insert(column.to_string(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns.get(column).filter(|v| !v.is_null())
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column)?.as_str()
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column)?.as_i64()
    }

    /// String list column. Non-string elements are dropped.
    pub fn get_str_list(&self, column: &str) -> Vec<String> {
        match self.get(column) {
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn decode<T: serde::de::DeserializeOwned>(&self, column: &str) -> Option<T> {
        serde_json::from_value(self.get(column)?.clone()).ok()
    }
}

impl From<Map<String, Value>> for Record {
    fn from(columns: Map<String, Value>) -> Self {
        Self { columns }
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

// --- Geo ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

// --- View models ---

/// One de-duplicated graph node, as consumed by the map renderers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedNode {
    pub id: EntityId,
    pub label: Option<String>,
    pub name: String,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub subject: Option<String>,
    pub subject2: Option<String>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub type2: Option<String>,
}

impl NormalizedNode {
    /// Both coordinates present.
    pub fn position(&self) -> Option<GeoPoint> {
        Some(GeoPoint {
            lat: self.lat?,
            lng: self.lng?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizedEdge {
    pub source: EntityId,
    pub target: EntityId,
    #[serde(rename = "type")]
    pub relation_type: String,
}

/// One outgoing edge inside a table row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EdgeDetail {
    #[serde(rename = "type")]
    pub relation_type: String,
    pub start_name: String,
    pub end_name: String,
    pub end_label: Option<String>,
    pub end_lat: Option<f64>,
    pub end_lng: Option<f64>,
}

/// One table row per distinct start entity.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableRow {
    pub id: EntityId,
    pub name: String,
    pub label: Option<String>,
    pub subject: Option<String>,
    pub subject2: Option<String>,
    #[serde(rename = "type")]
    pub place_type: Option<String>,
    pub type2: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub edges: Vec<EdgeDetail>,
}

impl TableRow {
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn row_decodes_boundary_shape() {
        let rec = record(json!({
            "n": {"identity": {"low": 1, "high": 0}, "labels": ["Place"], "properties": {"name": "A"}},
            "r": {"type": "N", "identity": {"low": 9}},
            "m": {"identity": {"low": 2}, "labels": ["Unit"], "properties": {}}
        }));
        let row = ResultRow::from_record(&rec);

        assert_eq!(row.start.as_ref().and_then(Entity::id), Some(EntityId(1)));
        assert_eq!(row.relationship.as_ref().map(|r| r.rel_type.as_str()), Some("N"));
        assert_eq!(row.end.as_ref().and_then(|e| e.primary_label()), Some("Unit"));
        assert!(row.edge_parts().is_some());
    }

    #[test]
    fn null_and_missing_aliases_are_absent() {
        let rec = record(json!({
            "n": {"identity": {"low": 1}, "labels": ["Place"], "properties": {}},
            "r": null
        }));
        let row = ResultRow::from_record(&rec);
        assert!(row.start.is_some());
        assert!(row.relationship.is_none());
        assert!(row.end.is_none());
        assert!(row.edge_parts().is_none());
    }

    #[test]
    fn misshapen_alias_is_absent() {
        let rec = record(json!({ "n": "not an entity", "r": {"no_type": true} }));
        let row = ResultRow::from_record(&rec);
        assert!(row.start.is_none());
        assert!(row.relationship.is_none());
    }

    #[test]
    fn null_labels_and_properties_default_to_empty() {
        let rec = record(json!({ "n": {"identity": {"low": 3}, "labels": null, "properties": null} }));
        let row = ResultRow::from_record(&rec);
        let start = row.start.unwrap();
        assert!(start.labels.is_empty());
        assert!(start.properties.is_empty());
        assert_eq!(start.primary_label(), None);
    }

    #[test]
    fn edge_parts_require_end_identity() {
        let mut end = Entity::new(2, "Place");
        end.identity = None;
        let row = ResultRow::edge(Entity::new(1, "Place"), "N", end);
        assert!(row.edge_parts().is_none());
        assert!(row.identified_start().is_some());
    }

    #[test]
    fn record_string_list_drops_non_strings() {
        let rec = Record::new().with("name", json!(["a", null, 3, "b"]));
        assert_eq!(rec.get_str_list("name"), vec!["a".to_string(), "b".to_string()]);
        assert!(rec.get_str_list("missing").is_empty());
    }
}
