pub mod aggregate;
pub mod client;
pub mod enrich;
pub mod gateway;
pub mod map_view;
pub mod normalize;
pub mod pipeline;
pub mod relationships;
pub mod search;
#[cfg(any(test, feature = "test-support"))]
pub mod testutil;

pub use aggregate::{TableAggregator, TableView};
pub use client::GraphClient;
pub use enrich::{enrich_with_geometry, enrich_with_stats, EnrichStats};
pub use gateway::{GatewayError, GraphQuery, Neo4jGateway, QueryGateway, QueryParam};
pub use map_view::MapView;
pub use neo4rs::query;
pub use normalize::{GraphNormalizer, GraphView};
pub use pipeline::{Explorer, SearchOutcome, SearchResults, SearchService, SearchSession, SearchTicket};
pub use relationships::{direction_label, RelationshipGroup};
pub use search::SearchRequest;
