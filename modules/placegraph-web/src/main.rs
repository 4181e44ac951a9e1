use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use placegraph_common::Config;
use placegraph_graph::{GraphClient, Neo4jGateway, SearchService};

mod rest;
mod routes;

// --- App State ---

pub struct AppState {
    pub service: SearchService,
}

// --- Main ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("placegraph=info".parse()?))
        .init();

    let config = Config::from_env()?;

    let client = GraphClient::from_config(&config).await?;
    let gateway = Neo4jGateway::new(client, config.query_timeout);

    let state = Arc::new(AppState {
        service: SearchService::new(Arc::new(gateway), config.field_chains.clone()),
    });

    let app = routes::build_router(state);

    let addr = format!("{}:{}", config.web_host, config.web_port);
    info!("Place graph explorer starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
