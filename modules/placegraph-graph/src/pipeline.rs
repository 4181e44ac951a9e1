//! Search pipeline: query, then geometry enrichment, then normalize and aggregate.
//!
//! The normalizer and the aggregator read the same enriched rows independently
//! and may disagree on which identities appear (isolated nodes are map-only).
//! Nothing is kept between searches; [`SearchSession`] only tracks which search
//! is the latest so superseded results can be dropped.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use placegraph_common::{FieldChains, PlaceGraphError, ResultRow};

use crate::aggregate::{TableAggregator, TableView};
use crate::enrich::enrich_with_stats;
use crate::gateway::QueryGateway;
use crate::map_view::MapView;
use crate::normalize::{GraphNormalizer, GraphView};
use crate::relationships::{relationships_of, RelationshipGroup};
use crate::search::{place_options_query, relation_options_query, SearchRequest};

/// How the primary query went. `Failed` is distinct from `Empty` even though
/// both render as an empty result.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SearchOutcome {
    Matched { rows: usize },
    Empty,
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResults {
    pub outcome: SearchOutcome,
    pub graph: GraphView,
    pub table: TableView,
    pub map: MapView,
}

impl SearchResults {
    fn empty(outcome: SearchOutcome) -> Self {
        Self {
            outcome,
            graph: GraphView::default(),
            table: TableView::default(),
            map: MapView::default(),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, SearchOutcome::Failed { .. })
    }
}

pub struct SearchService {
    gateway: Arc<dyn QueryGateway>,
    chains: FieldChains,
}

impl SearchService {
    pub fn new(gateway: Arc<dyn QueryGateway>, chains: FieldChains) -> Self {
        Self { gateway, chains }
    }

    pub fn chains(&self) -> &FieldChains {
        &self.chains
    }

    /// Run one search end to end. Only invalid input is an error; a failed
    /// query comes back as [`SearchOutcome::Failed`].
    pub async fn search(&self, request: &SearchRequest) -> Result<SearchResults, PlaceGraphError> {
        let query = request.to_query(&self.chains)?;

        let records = match self.gateway.execute(&query).await {
            Ok(records) => records,
            Err(e) => {
                warn!(error = %e, kind = request.kind(), "Search query failed");
                return Ok(SearchResults::empty(SearchOutcome::Failed {
                    reason: e.to_string(),
                }));
            }
        };

        let rows: Vec<ResultRow> = records.iter().map(ResultRow::from_record).collect();
        let results = self.build(rows).await;
        info!(
            kind = request.kind(),
            nodes = results.graph.nodes().len(),
            edges = results.graph.edges().len(),
            table_rows = results.table.len(),
            "Search complete"
        );
        Ok(results)
    }

    /// Enrich and fold rows that were already fetched.
    pub async fn build(&self, rows: Vec<ResultRow>) -> SearchResults {
        if rows.is_empty() {
            return SearchResults::empty(SearchOutcome::Empty);
        }

        let row_count = rows.len();
        let (rows, geometry) = enrich_with_stats(self.gateway.as_ref(), rows).await;
        debug!(?geometry, "Rows enriched");

        let graph = GraphNormalizer::new(&self.chains).normalize(&rows);
        let table = TableAggregator::new(&self.chains).aggregate(&rows);
        let map = MapView::from_graph(&graph);

        SearchResults {
            outcome: SearchOutcome::Matched { rows: row_count },
            graph,
            table,
            map,
        }
    }

    /// Autocomplete names. Empty on failure.
    pub async fn place_options(&self) -> Vec<String> {
        match self.gateway.execute(&place_options_query(&self.chains)).await {
            Ok(records) => records
                .iter()
                .filter_map(|r| r.get_str("name"))
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect(),
            Err(e) => {
                warn!(error = %e, "Place autocomplete failed");
                Vec::new()
            }
        }
    }

    /// Autocomplete relationship types. Empty on failure.
    pub async fn relation_options(&self) -> Vec<String> {
        match self.gateway.execute(&relation_options_query()).await {
            Ok(records) => records
                .iter()
                .filter_map(|r| r.get_str("relationshipType"))
                .map(str::to_string)
                .collect(),
            Err(e) => {
                warn!(error = %e, "Relation autocomplete failed");
                Vec::new()
            }
        }
    }

    pub async fn relationships(&self, name: &str) -> Result<Vec<RelationshipGroup>, PlaceGraphError> {
        relationships_of(self.gateway.as_ref(), &self.chains, name).await
    }
}

// --- Stale-result guard ---

/// Identifies one issued search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchTicket {
    generation: u64,
}

impl SearchTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Monotonic generation counter. A result may be applied only while its ticket
/// is still the latest one issued.
#[derive(Debug, Default)]
pub struct SearchSession {
    latest: AtomicU64,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> SearchTicket {
        SearchTicket {
            generation: self.latest.fetch_add(1, Ordering::SeqCst) + 1,
        }
    }

    pub fn is_current(&self, ticket: SearchTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.generation
    }

    pub fn generation(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}

/// One explorer view: a service plus its session. Overlapping searches resolve
/// to the most recently started one.
pub struct Explorer {
    service: SearchService,
    session: SearchSession,
}

impl Explorer {
    pub fn new(service: SearchService) -> Self {
        Self {
            service,
            session: SearchSession::new(),
        }
    }

    pub fn service(&self) -> &SearchService {
        &self.service
    }

    /// `Ok(None)` when a newer search started before this one finished.
    pub async fn search(&self, request: &SearchRequest) -> Result<Option<SearchResults>, PlaceGraphError> {
        let ticket = self.session.begin();
        let results = self.service.search(request).await?;
        if !self.session.is_current(ticket) {
            debug!(
                generation = ticket.generation(),
                latest = self.session.generation(),
                "Discarding superseded search results"
            );
            return Ok(None);
        }
        Ok(Some(results))
    }

    /// Back to the sample view.
    pub async fn reset(&self) -> Result<Option<SearchResults>, PlaceGraphError> {
        self.search(&SearchRequest::sample()).await
    }

    /// Invalidate any search still in flight without starting a new one.
    pub fn supersede(&self) {
        self.session.begin();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_latest_ticket_is_current() {
        let session = SearchSession::new();
        let first = session.begin();
        assert!(session.is_current(first));
        let second = session.begin();
        assert!(!session.is_current(first));
        assert!(session.is_current(second));
        assert_eq!(second.generation(), first.generation() + 1);
    }

    #[test]
    fn failed_outcome_serializes_with_status() {
        let outcome = SearchOutcome::Failed {
            reason: "timeout".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            serde_json::json!({"status": "failed", "reason": "timeout"})
        );
        assert_eq!(
            serde_json::to_value(SearchOutcome::Empty).unwrap(),
            serde_json::json!({"status": "empty"})
        );
    }
}
