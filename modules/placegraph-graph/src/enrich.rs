//! Geometry enrichment: a second pass that fills in coordinates for entities
//! whose location lives on a linked `Geometry` node rather than on the entity.
//!
//! One batched follow-up query per call, keyed by every identity seen in the
//! primary result. A failed or empty follow-up leaves the rows untouched.

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use tracing::{debug, info, warn};

use placegraph_common::resolve::{LATITUDE_KEY, LONGITUDE_KEY};
use placegraph_common::wkt::parse_wkt_location;
use placegraph_common::{Entity, EntityId, GeoPoint, Record, ResultRow};

use crate::gateway::{GraphQuery, QueryGateway};

const GEOMETRY_CYPHER: &str = "MATCH (n)
     WHERE id(n) IN $nodeIds
     OPTIONAL MATCH (n)-[:HAS_MAIN_GEOMETRY]->(g:Geometry)
     RETURN id(n) AS nodeId, g.wkt AS wkt";

/// Stats from one enrichment call.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EnrichStats {
    /// Distinct identities sent in the follow-up query.
    pub requested: u32,
    /// Identities for which a usable geometry came back.
    pub located: u32,
}

/// Populate `latitude`/`longitude` from linked geometry. See [`enrich_with_stats`].
pub async fn enrich_with_geometry(gateway: &dyn QueryGateway, rows: Vec<ResultRow>) -> Vec<ResultRow> {
    enrich_with_stats(gateway, rows).await.0
}

pub async fn enrich_with_stats(
    gateway: &dyn QueryGateway,
    rows: Vec<ResultRow>,
) -> (Vec<ResultRow>, EnrichStats) {
    let ids = collect_identities(&rows);
    let mut stats = EnrichStats {
        requested: ids.len() as u32,
        located: 0,
    };
    if ids.is_empty() {
        return (rows, stats);
    }

    let records = match gateway.execute(&geometry_query(&ids)).await {
        Ok(records) => records,
        Err(e) => {
            warn!(error = %e, ids = ids.len(), "Geometry lookup failed, passing rows through");
            return (rows, stats);
        }
    };

    let lookup = geometry_lookup(&records);
    stats.located = lookup.len() as u32;
    if lookup.is_empty() {
        debug!(ids = ids.len(), "No geometry found for result entities");
        return (rows, stats);
    }

    let rows = rows
        .into_iter()
        .map(|mut row| {
            if let Some(start) = row.start.as_mut() {
                apply_geometry(start, &lookup);
            }
            if let Some(end) = row.end.as_mut() {
                apply_geometry(end, &lookup);
            }
            row
        })
        .collect();

    info!(?stats, "Geometry enrichment complete");
    (rows, stats)
}

pub fn geometry_query(ids: &[EntityId]) -> GraphQuery {
    let ids: Vec<i64> = ids.iter().map(|id| id.0).collect();
    GraphQuery::new(GEOMETRY_CYPHER)
        .param("nodeIds", ids)
        .returns(&["nodeId", "wkt"])
}

/// Distinct start/end identities in first-seen order.
pub fn collect_identities(rows: &[ResultRow]) -> Vec<EntityId> {
    let mut seen = HashSet::new();
    rows.iter()
        .flat_map(|row| [row.start.as_ref(), row.end.as_ref()])
        .flatten()
        .filter_map(Entity::id)
        .filter(|id| seen.insert(*id))
        .collect()
}

/// identity → point. The first parseable geometry per identity wins.
fn geometry_lookup(records: &[Record]) -> HashMap<EntityId, GeoPoint> {
    let mut lookup = HashMap::new();
    for record in records {
        let (Some(id), Some(wkt)) = (record.get_i64("nodeId"), record.get_str("wkt")) else {
            continue;
        };
        match parse_wkt_location(wkt) {
            Some(point) => {
                lookup.entry(EntityId(id)).or_insert(point);
            }
            None => debug!(node_id = id, "Unparseable geometry ignored"),
        }
    }
    lookup
}

fn apply_geometry(entity: &mut Entity, lookup: &HashMap<EntityId, GeoPoint>) {
    let Some(point) = entity.id().and_then(|id| lookup.get(&id)) else {
        return;
    };
    entity
        .properties
        .insert(LATITUDE_KEY.to_string(), Value::from(point.lat));
    entity
        .properties
        .insert(LONGITUDE_KEY.to_string(), Value::from(point.lng));
}
