use serde::Serialize;
use tracing::warn;

use placegraph_common::{FieldChains, PlaceGraphError};

use crate::gateway::QueryGateway;
use crate::search::relationships_query;

/// Neighbours of a node sharing one relationship type, for the detail panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelationshipGroup {
    pub relationship_type: String,
    pub display_label: String,
    pub names: Vec<String>,
}

/// Human label for compass and containment relationship types.
pub fn direction_label(rel_type: &str) -> &str {
    match rel_type {
        "N" => "North",
        "NE" => "North East",
        "E" => "East",
        "SE" => "South East",
        "S" => "South",
        "SW" => "South West",
        "W" => "West",
        "NW" => "North West",
        "CONTAINS" => "Contains",
        other => other,
    }
}

/// Relationship groups for the node called `name`. A gateway failure yields an
/// empty list; only an invalid name is an error.
pub async fn relationships_of(
    gateway: &dyn QueryGateway,
    chains: &FieldChains,
    name: &str,
) -> Result<Vec<RelationshipGroup>, PlaceGraphError> {
    let query = relationships_query(chains, name)?;
    let records = match gateway.execute(&query).await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, "Relationship lookup failed");
            return Ok(Vec::new());
        }
    };

    Ok(records
        .iter()
        .filter_map(|record| {
            let rel_type = record.get_str("relationshipType")?;
            Some(RelationshipGroup {
                relationship_type: rel_type.to_string(),
                display_label: direction_label(rel_type).to_string(),
                names: record.get_str_list("names"),
            })
        })
        .collect())
}
