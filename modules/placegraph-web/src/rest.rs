use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use placegraph_common::{NormalizedEdge, NormalizedNode, PlaceGraphError};
use placegraph_graph::search::DEFAULT_SAMPLE_LIMIT;
use placegraph_graph::{
    MapView, RelationshipGroup, SearchOutcome, SearchRequest, SearchResults, TableView,
};

use crate::AppState;

// --- Query structs ---

#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    kind: Option<String>,
    place: Option<String>,
    place_type: Option<String>,
    relation: Option<String>,
    name: Option<String>,
    limit: Option<i64>,
}

impl SearchParams {
    /// A missing `kind` is the reset view.
    pub fn into_request(self) -> Result<SearchRequest, PlaceGraphError> {
        let text = |v: Option<String>| v.unwrap_or_default();
        match self.kind.as_deref().unwrap_or("sample") {
            "where_is" => Ok(SearchRequest::WhereIs {
                place: text(self.place),
            }),
            "place_type_relation" => Ok(SearchRequest::PlaceTypeRelation {
                place: text(self.place),
                place_type: text(self.place_type),
                relation: text(self.relation),
            }),
            "find_all_in_place" => Ok(SearchRequest::FindAllInPlace {
                place: text(self.place),
                place_type: text(self.place_type),
            }),
            "sample" => Ok(SearchRequest::Sample {
                limit: self.limit.unwrap_or(DEFAULT_SAMPLE_LIMIT),
            }),
            "neighbourhood" => Ok(SearchRequest::Neighbourhood {
                name: text(self.name),
            }),
            other => Err(PlaceGraphError::Validation(format!(
                "unknown search kind {other:?}"
            ))),
        }
    }
}

// --- Responses ---

#[derive(Serialize)]
pub struct SearchResponse<'a> {
    #[serde(flatten)]
    outcome: &'a SearchOutcome,
    nodes: &'a [NormalizedNode],
    edges: &'a [NormalizedEdge],
    table: &'a TableView,
    map: &'a MapView,
}

impl<'a> From<&'a SearchResults> for SearchResponse<'a> {
    fn from(results: &'a SearchResults) -> Self {
        Self {
            outcome: &results.outcome,
            nodes: results.graph.nodes(),
            edges: results.graph.edges(),
            table: &results.table,
            map: &results.map,
        }
    }
}

pub struct ApiError(PlaceGraphError);

impl From<PlaceGraphError> for ApiError {
    fn from(e: PlaceGraphError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            PlaceGraphError::Validation(_) => StatusCode::BAD_REQUEST,
            _ => {
                warn!(error = %self.0, "Request failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}

// --- Handlers ---

pub async fn api_search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Response, ApiError> {
    let request = params.into_request()?;
    let results = state.service.search(&request).await?;
    Ok(Json(SearchResponse::from(&results)).into_response())
}

pub async fn api_place_options(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.place_options().await)
}

pub async fn api_relation_options(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.relation_options().await)
}

pub async fn api_node_relationships(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> Result<Json<Vec<RelationshipGroup>>, ApiError> {
    Ok(Json(state.service.relationships(&name).await?))
}
