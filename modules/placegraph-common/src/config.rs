use std::env;
use std::time::Duration;

use crate::error::PlaceGraphError;
use crate::resolve::{parse_chain, FieldChains};

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    // Neo4j
    pub neo4j_uri: String,
    pub neo4j_user: String,
    pub neo4j_password: String,
    pub neo4j_database: Option<String>,
    pub query_timeout: Duration,

    // Web server
    pub web_host: String,
    pub web_port: u16,

    // Property name fallback chains
    pub field_chains: FieldChains,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, PlaceGraphError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, PlaceGraphError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| PlaceGraphError::Config(format!("{key} environment variable is required")))
        };

        let mut field_chains = FieldChains::default();
        if let Some(raw) = lookup("PLACEGRAPH_NAME_FIELDS") {
            field_chains.name = non_empty_chain("PLACEGRAPH_NAME_FIELDS", &raw)?;
        }
        if let Some(raw) = lookup("PLACEGRAPH_TYPE_FIELDS") {
            field_chains.place_type = non_empty_chain("PLACEGRAPH_TYPE_FIELDS", &raw)?;
        }
        if let Some(raw) = lookup("PLACEGRAPH_SUBJECT_FIELDS") {
            field_chains.subject = non_empty_chain("PLACEGRAPH_SUBJECT_FIELDS", &raw)?;
        }

        Ok(Self {
            neo4j_uri: required("NEO4J_URI")?,
            neo4j_user: required("NEO4J_USER")?,
            neo4j_password: required("NEO4J_PASSWORD")?,
            neo4j_database: lookup("NEO4J_DATABASE").filter(|v| !v.is_empty()),
            query_timeout: Duration::from_secs(parse_or("QUERY_TIMEOUT_SECS", lookup("QUERY_TIMEOUT_SECS"), 30)?),
            web_host: lookup("WEB_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            web_port: parse_or("WEB_PORT", lookup("WEB_PORT"), 3000)?,
            field_chains,
        })
    }
}

fn parse_or<T: std::str::FromStr>(key: &str, raw: Option<String>, default: T) -> Result<T, PlaceGraphError> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse()
            .map_err(|_| PlaceGraphError::Config(format!("{key} must be a number, got {v:?}"))),
    }
}

fn non_empty_chain(key: &str, raw: &str) -> Result<Vec<String>, PlaceGraphError> {
    let chain = parse_chain(raw);
    if chain.is_empty() {
        return Err(PlaceGraphError::Config(format!("{key} must list at least one property")));
    }
    Ok(chain)
}
