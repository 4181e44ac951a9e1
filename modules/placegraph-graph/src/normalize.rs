//! Graph normalizer: folds `(n, r, m)` rows into de-duplicated nodes and an
//! append-only edge list for the map renderers.
//!
//! Nodes are keyed by identity and kept in first-seen order; the first
//! appearance of an identity fixes its fields. Edges are never merged: two rows
//! describing the same relationship yield two edges.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use placegraph_common::resolve::{latitude, longitude};
use placegraph_common::{Entity, EntityId, FieldChains, NormalizedEdge, NormalizedNode, ResultRow};

/// Normalized nodes and edges for one result set.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphView {
    nodes: Vec<NormalizedNode>,
    #[serde(skip)]
    node_by_id: HashMap<EntityId, usize>,
    edges: Vec<NormalizedEdge>,
}

impl GraphView {
    /// All nodes in first-seen order, including those without coordinates.
    pub fn nodes(&self) -> &[NormalizedNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[NormalizedEdge] {
        &self.edges
    }

    pub fn node(&self, id: EntityId) -> Option<&NormalizedNode> {
        self.node_by_id.get(&id).map(|&i| &self.nodes[i])
    }

    /// Nodes with both coordinates, in first-seen order.
    pub fn plottable_nodes(&self) -> impl Iterator<Item = &NormalizedNode> {
        self.nodes.iter().filter(|n| n.position().is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn register(&mut self, id: EntityId, entity: &Entity, chains: &FieldChains) {
        if self.node_by_id.contains_key(&id) {
            return;
        }
        self.node_by_id.insert(id, self.nodes.len());
        self.nodes.push(NormalizedNode {
            id,
            label: entity.primary_label().map(str::to_string),
            name: chains.resolve_name(entity, id),
            lat: latitude(entity),
            lng: longitude(entity),
            subject: chains.resolve_subject(entity),
            subject2: chains.resolve_subject2(entity),
            place_type: chains.resolve_type(entity),
            type2: chains.resolve_type2(entity),
        });
    }
}

pub struct GraphNormalizer<'a> {
    chains: &'a FieldChains,
}

impl<'a> GraphNormalizer<'a> {
    pub fn new(chains: &'a FieldChains) -> Self {
        Self { chains }
    }

    pub fn normalize(&self, rows: &[ResultRow]) -> GraphView {
        let mut view = GraphView::default();
        let mut skipped = 0u32;

        for row in rows {
            let Some((start_id, start)) = row.identified_start() else {
                skipped += 1;
                continue;
            };
            view.register(start_id, start, self.chains);

            if let Some(edge) = row.edge_parts() {
                view.register(edge.end_id, edge.end, self.chains);
                view.edges.push(NormalizedEdge {
                    source: edge.start_id,
                    target: edge.end_id,
                    relation_type: edge.relationship.rel_type.clone(),
                });
            }
        }

        debug!(
            nodes = view.nodes.len(),
            edges = view.edges.len(),
            skipped,
            "Normalized result rows"
        );
        view
    }
}
