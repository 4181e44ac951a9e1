//! Query gateway: the only place that talks to the database.
//!
//! Callers describe a query as a [`GraphQuery`] (Cypher text, parameters and the
//! aliases it returns) and get back eagerly collected [`Record`]s in the
//! boundary JSON shape: nodes as `{identity: {low}, labels, properties}`,
//! relationships as `{identity: {low}, type, start, end}`, scalars as plain JSON.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use neo4rs::query;
use serde::de::DeserializeOwned;
use serde_json::{json, Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

use placegraph_common::{PlaceGraphError, Record};

use crate::GraphClient;

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Neo4j error: {0}")]
    Driver(#[from] neo4rs::Error),

    #[error("query timed out after {0:?}")]
    Timeout(Duration),

    #[error("query declares no return columns")]
    NoColumns,

    #[error("gateway unavailable: {0}")]
    Unavailable(String),
}

impl From<GatewayError> for PlaceGraphError {
    fn from(e: GatewayError) -> Self {
        PlaceGraphError::Gateway(e.to_string())
    }
}

/// A bound query parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryParam {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    IntList(Vec<i64>),
    TextList(Vec<String>),
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        QueryParam::Text(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        QueryParam::Text(v)
    }
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        QueryParam::Int(v)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        QueryParam::Float(v)
    }
}

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        QueryParam::Bool(v)
    }
}

impl From<Vec<i64>> for QueryParam {
    fn from(v: Vec<i64>) -> Self {
        QueryParam::IntList(v)
    }
}

impl From<Vec<String>> for QueryParam {
    fn from(v: Vec<String>) -> Self {
        QueryParam::TextList(v)
    }
}

/// Cypher text plus its parameters and the aliases of its RETURN clause.
#[derive(Debug, Clone, PartialEq)]
pub struct GraphQuery {
    cypher: String,
    params: Vec<(String, QueryParam)>,
    columns: Vec<String>,
}

impl GraphQuery {
    pub fn new(cypher: impl Into<String>) -> Self {
        Self {
            cypher: cypher.into(),
            params: Vec::new(),
            columns: Vec::new(),
        }
    }

    pub fn param(mut self, key: &str, value: impl Into<QueryParam>) -> Self {
        self.params.push((key.to_string(), value.into()));
        self
    }

    pub fn returns(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn cypher(&self) -> &str {
        &self.cypher
    }

    pub fn params(&self) -> &[(String, QueryParam)] {
        &self.params
    }

    pub fn param_value(&self, key: &str) -> Option<&QueryParam> {
        self.params.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }
}

/// Executes a parametrised graph query and returns every row.
#[async_trait]
pub trait QueryGateway: Send + Sync {
    async fn execute(&self, query: &GraphQuery) -> Result<Vec<Record>, GatewayError>;
}

/// [`QueryGateway`] backed by a Neo4j connection pool.
///
/// Each execution borrows a pooled connection, drains the result stream and
/// releases the connection before returning, whether or not it succeeded.
#[derive(Clone)]
pub struct Neo4jGateway {
    client: GraphClient,
    timeout: Duration,
}

impl Neo4jGateway {
    pub fn new(client: GraphClient, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    async fn fetch(&self, q: &GraphQuery) -> Result<Vec<Record>, GatewayError> {
        let mut stream = self.client.graph.execute(to_bolt_query(q)).await?;
        let mut records = Vec::new();
        while let Some(row) = stream.next().await? {
            records.push(row_to_record(&row, q.columns()));
        }
        Ok(records)
    }
}

#[async_trait]
impl QueryGateway for Neo4jGateway {
    async fn execute(&self, q: &GraphQuery) -> Result<Vec<Record>, GatewayError> {
        if q.columns().is_empty() {
            return Err(GatewayError::NoColumns);
        }

        let started = Instant::now();
        let result = match tokio::time::timeout(self.timeout, self.fetch(q)).await {
            Ok(result) => result,
            Err(_) => Err(GatewayError::Timeout(self.timeout)),
        };

        match &result {
            Ok(records) => debug!(
                rows = records.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Query executed"
            ),
            Err(e) => warn!(error = %e, "Query failed"),
        }
        result
    }
}

fn to_bolt_query(q: &GraphQuery) -> neo4rs::Query {
    q.params()
        .iter()
        .fold(query(q.cypher()), |acc, (key, value)| match value {
            QueryParam::Text(v) => acc.param(key, v.clone()),
            QueryParam::Int(v) => acc.param(key, *v),
            QueryParam::Float(v) => acc.param(key, *v),
            QueryParam::Bool(v) => acc.param(key, *v),
            QueryParam::IntList(v) => acc.param(key, v.clone()),
            QueryParam::TextList(v) => acc.param(key, v.clone()),
        })
}

// --- Row conversion ---

/// Anything that exposes typed property access by key.
trait PropertySource {
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T>;
}

impl PropertySource for neo4rs::Row {
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get::<T>(key).ok()
    }
}

impl PropertySource for neo4rs::Node {
    fn read<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.get::<T>(key).ok()
    }
}

fn row_to_record(row: &neo4rs::Row, columns: &[String]) -> Record {
    let mut record = Record::new();
    for column in columns {
        record.insert(column, column_value(row, column));
    }
    record
}

fn column_value(row: &neo4rs::Row, column: &str) -> Value {
    if let Some(node) = row.read::<neo4rs::Node>(column) {
        return node_json(&node);
    }
    if let Some(rel) = row.read::<neo4rs::Relation>(column) {
        return json!({
            "identity": { "low": rel.id() },
            "type": rel.typ(),
            "start": { "low": rel.start_node_id() },
            "end": { "low": rel.end_node_id() },
        });
    }
    scalar_json(row, column)
}

fn node_json(node: &neo4rs::Node) -> Value {
    let mut properties = Map::new();
    for key in node.keys() {
        properties.insert(key.to_string(), scalar_json(node, key));
    }
    json!({
        "identity": { "low": node.id() },
        "labels": node.labels(),
        "properties": properties,
    })
}

// Integer before float: a float visitor accepts integers, not the reverse.
fn scalar_json(source: &impl PropertySource, key: &str) -> Value {
    if let Some(v) = source.read::<i64>(key) {
        return Value::from(v);
    }
    if let Some(v) = source.read::<f64>(key) {
        return Value::from(v);
    }
    if let Some(v) = source.read::<bool>(key) {
        return Value::from(v);
    }
    if let Some(v) = source.read::<String>(key) {
        return Value::from(v);
    }
    if let Some(v) = source.read::<Vec<String>>(key) {
        return Value::from(v);
    }
    if let Some(v) = source.read::<Vec<f64>>(key) {
        return Value::from(v);
    }
    Value::Null
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_keeps_params_and_columns() {
        let q = GraphQuery::new("MATCH (n) WHERE id(n) IN $ids RETURN n")
            .param("ids", vec![1_i64, 2])
            .param("place", "Cardiff")
            .returns(&["n"]);

        assert_eq!(q.columns(), &["n".to_string()]);
        assert_eq!(q.param_value("ids"), Some(&QueryParam::IntList(vec![1, 2])));
        assert_eq!(
            q.param_value("place"),
            Some(&QueryParam::Text("Cardiff".to_string()))
        );
        assert_eq!(q.param_value("missing"), None);
    }

    #[test]
    fn gateway_error_maps_to_crate_error() {
        let err: PlaceGraphError = GatewayError::Timeout(Duration::from_secs(3)).into();
        assert!(matches!(err, PlaceGraphError::Gateway(msg) if msg.contains("timed out")));
    }
}
