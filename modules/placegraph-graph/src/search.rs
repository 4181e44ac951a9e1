//! Search catalogue: the parametric searches the explorer offers, rendered to
//! Cypher.
//!
//! Property names come from the shared [`FieldChains`], so a query matches on
//! exactly the fields the views display. User text only ever travels as a
//! parameter; the one value interpolated into Cypher (a relationship type) is
//! validated as an identifier first.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use placegraph_common::{FieldChains, PlaceGraphError, END_ALIAS, RELATIONSHIP_ALIAS, START_ALIAS};

use crate::gateway::GraphQuery;

pub const DEFAULT_SAMPLE_LIMIT: i64 = 100;
pub const PLACE_OPTION_LIMIT: i64 = 1000;
pub const RELATION_OPTION_LIMIT: i64 = 50;

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const ROW_COLUMNS: [&str; 3] = [START_ALIAS, RELATIONSHIP_ALIAS, END_ALIAS];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SearchRequest {
    /// Exact name match, every relationship in either direction.
    WhereIs { place: String },
    /// Name/subject contains `place`, outgoing `relation`, end type contains `place_type`.
    PlaceTypeRelation {
        place: String,
        place_type: String,
        relation: String,
    },
    /// Name contains `place`, any neighbour whose name, type or subject contains `place_type`.
    FindAllInPlace { place: String, place_type: String },
    /// Reset view: a bounded sample of places and units.
    Sample { limit: i64 },
    /// Drill-down from a clicked node name.
    Neighbourhood { name: String },
}

impl SearchRequest {
    pub fn sample() -> Self {
        SearchRequest::Sample {
            limit: DEFAULT_SAMPLE_LIMIT,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            SearchRequest::WhereIs { .. } => "where_is",
            SearchRequest::PlaceTypeRelation { .. } => "place_type_relation",
            SearchRequest::FindAllInPlace { .. } => "find_all_in_place",
            SearchRequest::Sample { .. } => "sample",
            SearchRequest::Neighbourhood { .. } => "neighbourhood",
        }
    }

    /// Validate inputs and render the `(n, r, m)` query.
    pub fn to_query(&self, chains: &FieldChains) -> Result<GraphQuery, PlaceGraphError> {
        let name_n = coalesce(START_ALIAS, &chains.name);
        let query = match self {
            SearchRequest::WhereIs { place } => {
                let place = required("place", place)?;
                GraphQuery::new(format!(
                    "MATCH (n)-[r]-(m)
                     WHERE $place IN {}
                     RETURN n, r, m",
                    property_list(START_ALIAS, &chains.name)
                ))
                .param("place", place)
            }
            SearchRequest::PlaceTypeRelation {
                place,
                place_type,
                relation,
            } => {
                let place = required("place", place)?;
                let place_type = required("place_type", place_type)?;
                let relation = relation_type(relation)?;
                GraphQuery::new(format!(
                    "MATCH (n)
                     WHERE toLower({name_n}) CONTAINS toLower($place)
                        OR toLower({subject_n}) CONTAINS toLower($place)
                     MATCH (n)-[r:{relation}]->(m)
                     WHERE toLower({type_m}) CONTAINS toLower($placeType)
                     RETURN n, r, m",
                    subject_n = coalesce(START_ALIAS, &chains.subject),
                    type_m = coalesce(END_ALIAS, &chains.place_type),
                ))
                .param("place", place)
                .param("placeType", place_type)
            }
            SearchRequest::FindAllInPlace { place, place_type } => {
                let place = required("place", place)?;
                let place_type = required("place_type", place_type)?;
                let end_matches = [
                    &chains.name,
                    &chains.place_type,
                    &chains.type2,
                    &chains.subject,
                    &chains.subject2,
                ]
                .iter()
                .map(|chain| format!("toLower({}) CONTAINS toLower($placeType)", coalesce(END_ALIAS, chain)))
                .collect::<Vec<_>>()
                .join("\n                          OR ");
                GraphQuery::new(format!(
                    "MATCH (n)-[r]-(m)
                     WHERE toLower({name_n}) CONTAINS toLower($place)
                       AND ({end_matches})
                     RETURN n, r, m"
                ))
                .param("place", place)
                .param("placeType", place_type)
            }
            SearchRequest::Sample { limit } => {
                if *limit <= 0 {
                    return Err(PlaceGraphError::Validation(
                        "sample limit must be positive".to_string(),
                    ));
                }
                GraphQuery::new(
                    "MATCH (n)
                     WHERE n:Place OR n:Unit
                     OPTIONAL MATCH (n)-[r]->(m)
                     RETURN n, r, m
                     LIMIT $limit",
                )
                .param("limit", *limit)
            }
            SearchRequest::Neighbourhood { name } => {
                let name = required("name", name)?;
                GraphQuery::new(format!(
                    "MATCH (n)-[r]-(m)
                     WHERE $nodeName IN {}
                     RETURN n, r, m",
                    property_list(START_ALIAS, &chains.name)
                ))
                .param("nodeName", name)
            }
        };
        Ok(query.returns(&ROW_COLUMNS))
    }
}

/// Distinct place/unit names for autocomplete, alphabetical.
pub fn place_options_query(chains: &FieldChains) -> GraphQuery {
    GraphQuery::new(format!(
        "MATCH (n)
         WHERE n:Place OR n:Unit
         RETURN DISTINCT coalesce({}) AS name
         ORDER BY name
         LIMIT $limit",
        properties(START_ALIAS, &chains.name)
    ))
    .param("limit", PLACE_OPTION_LIMIT)
    .returns(&["name"])
}

/// Distinct relationship types for autocomplete, alphabetical.
pub fn relation_options_query() -> GraphQuery {
    GraphQuery::new(
        "MATCH ()-[r]->()
         RETURN DISTINCT type(r) AS relationshipType
         ORDER BY relationshipType
         LIMIT $limit",
    )
    .param("limit", RELATION_OPTION_LIMIT)
    .returns(&["relationshipType"])
}

/// Neighbour names of a named node, grouped by relationship type.
pub fn relationships_query(chains: &FieldChains, name: &str) -> Result<GraphQuery, PlaceGraphError> {
    let name = required("name", name)?;
    Ok(GraphQuery::new(format!(
        "MATCH (n)-[r]-(m)
         WHERE $nodeName IN {}
         WITH type(r) AS relationshipType, collect(coalesce({})) AS names
         RETURN relationshipType, names
         ORDER BY relationshipType",
        property_list(START_ALIAS, &chains.name),
        properties(END_ALIAS, &chains.name),
    ))
    .param("nodeName", name)
    .returns(&["relationshipType", "names"]))
}

/// A relationship type safe to interpolate into a pattern.
pub fn relation_type(raw: &str) -> Result<String, PlaceGraphError> {
    let relation = raw.trim();
    if relation.is_empty() {
        return Err(PlaceGraphError::Validation("relation is required".to_string()));
    }
    if !IDENTIFIER_RE.is_match(relation) {
        return Err(PlaceGraphError::Validation(format!(
            "relation {relation:?} is not a valid relationship type"
        )));
    }
    Ok(relation.to_string())
}

fn required(field: &str, value: &str) -> Result<String, PlaceGraphError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(PlaceGraphError::Validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

fn property(alias: &str, key: &str) -> String {
    format!("{alias}.`{}`", key.replace('`', "``"))
}

fn properties(alias: &str, chain: &[String]) -> String {
    chain
        .iter()
        .map(|key| property(alias, key))
        .collect::<Vec<_>>()
        .join(", ")
}

/// `coalesce(a.x, a.y, '')`: never null, so `toLower(...)` is always defined.
fn coalesce(alias: &str, chain: &[String]) -> String {
    if chain.is_empty() {
        return "''".to_string();
    }
    format!("coalesce({}, '')", properties(alias, chain))
}

fn property_list(alias: &str, chain: &[String]) -> String {
    format!("[{}]", properties(alias, chain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gateway::QueryParam;

    fn text(v: &str) -> Option<QueryParam> {
        Some(QueryParam::Text(v.to_string()))
    }

    #[test]
    fn where_is_matches_any_name_property() {
        let q = SearchRequest::WhereIs {
            place: " Cardiff ".to_string(),
        }
        .to_query(&FieldChains::default())
        .unwrap();

        assert!(q.cypher().contains("$place IN [n.`name`, n.`place_name`, n.`unit_name`]"));
        assert_eq!(q.param_value("place").cloned(), text("Cardiff"));
        assert_eq!(q.columns(), &["n", "r", "m"]);
    }

    #[test]
    fn relation_is_interpolated_after_validation() {
        let q = SearchRequest::PlaceTypeRelation {
            place: "Cardiff".to_string(),
            place_type: "university".to_string(),
            relation: "CONTAINS".to_string(),
        }
        .to_query(&FieldChains::default())
        .unwrap();

        assert!(q.cypher().contains("-[r:CONTAINS]->"));
        assert!(q
            .cypher()
            .contains("coalesce(m.`type`, m.`place_type`, m.`unit_type`, '')"));
        assert_eq!(q.param_value("placeType").cloned(), text("university"));
    }

    #[test]
    fn injected_relation_is_rejected() {
        let err = SearchRequest::PlaceTypeRelation {
            place: "Cardiff".to_string(),
            place_type: "x".to_string(),
            relation: "N]->(m) DETACH DELETE m //".to_string(),
        }
        .to_query(&FieldChains::default())
        .unwrap_err();
        assert!(matches!(err, PlaceGraphError::Validation(_)));
    }

    #[test]
    fn blank_required_fields_are_rejected() {
        let chains = FieldChains::default();
        assert!(SearchRequest::WhereIs { place: "  ".into() }.to_query(&chains).is_err());
        assert!(SearchRequest::FindAllInPlace {
            place: "Cardiff".into(),
            place_type: String::new(),
        }
        .to_query(&chains)
        .is_err());
        assert!(SearchRequest::Neighbourhood { name: String::new() }.to_query(&chains).is_err());
        assert!(SearchRequest::Sample { limit: 0 }.to_query(&chains).is_err());
    }

    #[test]
    fn find_all_checks_every_end_field() {
        let q = SearchRequest::FindAllInPlace {
            place: "Cardiff".into(),
            place_type: "castle".into(),
        }
        .to_query(&FieldChains::default())
        .unwrap();
        for field in ["m.`unit_name`", "m.`unit_type`", "m.`type2`", "m.`subject`", "m.`subject2`"] {
            assert!(q.cypher().contains(field), "missing {field}");
        }
    }

    #[test]
    fn sample_uses_default_limit() {
        let q = SearchRequest::sample().to_query(&FieldChains::default()).unwrap();
        assert_eq!(q.param_value("limit"), Some(&QueryParam::Int(DEFAULT_SAMPLE_LIMIT)));
        assert!(q.cypher().contains("OPTIONAL MATCH (n)-[r]->(m)"));
    }

    #[test]
    fn property_names_are_backtick_escaped() {
        let chains = FieldChains {
            name: vec!["odd`name".to_string()],
            ..FieldChains::default()
        };
        let q = place_options_query(&chains);
        assert!(q.cypher().contains("n.`odd``name`"));
    }

    #[test]
    fn relationships_query_groups_by_type() {
        let q = relationships_query(&FieldChains::default(), "Cardiff").unwrap();
        assert!(q.cypher().contains("collect(coalesce(m.`name`, m.`place_name`, m.`unit_name`))"));
        assert_eq!(q.param_value("nodeName").cloned(), text("Cardiff"));
        assert!(relationships_query(&FieldChains::default(), "").is_err());
    }

    #[test]
    fn relation_options_limit() {
        let q = relation_options_query();
        assert_eq!(q.param_value("limit"), Some(&QueryParam::Int(RELATION_OPTION_LIMIT)));
        assert_eq!(q.columns(), &["relationshipType"]);
    }
}
