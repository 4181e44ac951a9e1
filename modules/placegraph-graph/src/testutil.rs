//! Test utilities: an in-memory scripted gateway, and (with `test-utils`) a
//! real Neo4j instance via testcontainers.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use placegraph_common::{Record, ResultRow};

use crate::gateway::{GatewayError, GraphQuery, QueryGateway};

/// Gateway that replays queued responses in order and records every query.
/// Once the queue is drained every call returns an empty result.
#[derive(Default)]
pub struct ScriptedGateway {
    responses: Mutex<VecDeque<Result<Vec<Record>, String>>>,
    executed: Mutex<Vec<GraphQuery>>,
}

impl ScriptedGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_records(&self, records: Vec<Record>) {
        self.responses.lock().unwrap().push_back(Ok(records));
    }

    pub fn push_rows(&self, rows: &[ResultRow]) {
        self.push_records(rows_to_records(rows));
    }

    pub fn push_failure(&self, reason: &str) {
        self.responses
            .lock()
            .unwrap()
            .push_back(Err(reason.to_string()));
    }

    pub fn executed(&self) -> Vec<GraphQuery> {
        self.executed.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryGateway for ScriptedGateway {
    async fn execute(&self, query: &GraphQuery) -> Result<Vec<Record>, GatewayError> {
        self.executed.lock().unwrap().push(query.clone());
        match self.responses.lock().unwrap().pop_front() {
            Some(Ok(records)) => Ok(records),
            Some(Err(reason)) => Err(GatewayError::Unavailable(reason)),
            None => Ok(Vec::new()),
        }
    }
}

/// Encode rows in the boundary `{n, r, m}` record shape.
pub fn rows_to_records(rows: &[ResultRow]) -> Vec<Record> {
    rows.iter()
        .map(|row| {
            let value = serde_json::to_value(row).expect("rows serialize");
            serde_json::from_value(value).expect("row is a JSON object")
        })
        .collect()
}

#[cfg(feature = "test-utils")]
pub use containers::neo4j_container;

#[cfg(feature = "test-utils")]
mod containers {
    use testcontainers::{
        core::{ContainerPort, WaitFor},
        runners::AsyncRunner,
        ContainerAsync, GenericImage, ImageExt,
    };

    use crate::GraphClient;

    /// Spin up a Neo4j container and return the container handle + connected GraphClient.
    ///
    /// The container is dropped (and stopped) when `ContainerAsync` goes out of scope,
    /// so callers must hold it alive for the duration of the test.
    pub async fn neo4j_container() -> (ContainerAsync<GenericImage>, GraphClient) {
        let image = GenericImage::new("neo4j", "5.25.1")
            .with_exposed_port(ContainerPort::Tcp(7687))
            .with_wait_for(WaitFor::message_on_stdout("Started."))
            .with_env_var("NEO4J_AUTH", "neo4j/testpassword");

        let container: ContainerAsync<GenericImage> = image
            .start()
            .await
            .expect("Failed to start Neo4j container");

        let host_port = container
            .get_host_port_ipv4(7687)
            .await
            .expect("Failed to get Neo4j host port");

        let uri = format!("bolt://127.0.0.1:{host_port}");
        let client = GraphClient::connect(&uri, "neo4j", "testpassword")
            .await
            .expect("Failed to connect to Neo4j");

        (container, client)
    }
}
