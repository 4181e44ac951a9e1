//! Round trip against a real Neo4j: seed a tiny place graph, search it, and
//! check that linked geometry lands in the views.
//! Run with: cargo test -p placegraph-graph --features test-utils --test neo4j_roundtrip_test
#![cfg(feature = "test-utils")]

use std::sync::Arc;
use std::time::Duration;

use placegraph_common::{FieldChains, GeoPoint};
use placegraph_graph::testutil::neo4j_container;
use placegraph_graph::{query, Neo4jGateway, SearchOutcome, SearchRequest, SearchService};

#[tokio::test]
async fn search_reads_nodes_edges_and_geometry() {
    let (_container, client) = neo4j_container().await;

    client
        .inner()
        .run(query(
            "CREATE (a:Place {name: 'Cardiff', type: 'City'})
             CREATE (b:Unit {unit_name: 'Llandaff', unit_type: 'Parish', latitude: 51.49, longitude: -3.22})
             CREATE (a)-[:CONTAINS]->(b)
             CREATE (a)-[:HAS_MAIN_GEOMETRY]->(:Geometry {wkt: 'POINT (-3.18 51.48)'})",
        ))
        .await
        .expect("seed graph");

    let gateway = Arc::new(Neo4jGateway::new(client, Duration::from_secs(10)));
    let service = SearchService::new(gateway, FieldChains::default());

    let results = service
        .search(&SearchRequest::WhereIs {
            place: "Cardiff".to_string(),
        })
        .await
        .expect("search");

    assert!(matches!(results.outcome, SearchOutcome::Matched { .. }));

    // Cardiff, Llandaff and the unnamed geometry node.
    assert_eq!(results.graph.nodes().len(), 3);
    assert!(results.graph.nodes().iter().any(|n| n.name.starts_with("Node ")));

    let cardiff = results
        .graph
        .nodes()
        .iter()
        .find(|n| n.name == "Cardiff")
        .expect("Cardiff node");
    assert_eq!(cardiff.place_type.as_deref(), Some("City"));
    assert_eq!(cardiff.position(), Some(GeoPoint { lat: 51.48, lng: -3.18 }));

    let llandaff = results
        .graph
        .nodes()
        .iter()
        .find(|n| n.name == "Llandaff")
        .expect("Llandaff node");
    assert_eq!(llandaff.place_type.as_deref(), Some("Parish"));
    assert_eq!(llandaff.position(), Some(GeoPoint { lat: 51.49, lng: -3.22 }));

    let contains = results
        .graph
        .edges()
        .iter()
        .find(|e| e.relation_type == "CONTAINS")
        .expect("CONTAINS edge");
    assert_eq!(contains.source, cardiff.id);
    assert_eq!(contains.target, llandaff.id);

    let row = results.table.row(cardiff.id).expect("Cardiff table row");
    assert!(row.edges.iter().any(|e| e.end_name == "Llandaff"));
}

#[tokio::test]
async fn autocomplete_lists_names_and_relation_types() {
    let (_container, client) = neo4j_container().await;

    client
        .inner()
        .run(query(
            "CREATE (:Place {name: 'Penarth'})-[:N]->(:Place {name: 'Cardiff'})",
        ))
        .await
        .expect("seed graph");

    let gateway = Arc::new(Neo4jGateway::new(client, Duration::from_secs(10)));
    let service = SearchService::new(gateway, FieldChains::default());

    assert_eq!(service.place_options().await, vec!["Cardiff", "Penarth"]);
    assert_eq!(service.relation_options().await, vec!["N"]);
}
