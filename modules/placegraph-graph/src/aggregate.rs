//! Table row aggregation: one row per distinct start entity, each carrying its
//! outgoing edges in encounter order.
//!
//! Unlike the normalizer, a start entity only gets a row once it has a complete
//! `(r, m)` pair; isolated nodes never appear in the table.

use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use placegraph_common::resolve::{latitude, longitude};
use placegraph_common::types::EdgeParts;
use placegraph_common::{EdgeDetail, EntityId, FieldChains, ResultRow, TableRow};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TableView {
    rows: Vec<TableRow>,
    #[serde(skip)]
    row_by_id: HashMap<EntityId, usize>,
}

impl TableView {
    /// Rows in insertion order.
    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn row(&self, id: EntityId) -> Option<&TableRow> {
        self.row_by_id.get(&id).map(|&i| &self.rows[i])
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn into_rows(self) -> Vec<TableRow> {
        self.rows
    }
}

pub struct TableAggregator<'a> {
    chains: &'a FieldChains,
}

impl<'a> TableAggregator<'a> {
    pub fn new(chains: &'a FieldChains) -> Self {
        Self { chains }
    }

    pub fn aggregate(&self, rows: &[ResultRow]) -> TableView {
        let mut table = TableView::default();

        for edge in rows.iter().filter_map(ResultRow::edge_parts) {
            let detail = self.edge_detail(&edge);
            match table.row_by_id.get(&edge.start_id) {
                Some(&i) => table.rows[i].edges.push(detail),
                None => {
                    table.row_by_id.insert(edge.start_id, table.rows.len());
                    table.rows.push(self.table_row(&edge, detail));
                }
            }
        }

        debug!(rows = table.rows.len(), "Aggregated table rows");
        table
    }

    fn table_row(&self, edge: &EdgeParts<'_>, first: EdgeDetail) -> TableRow {
        let start = edge.start;
        TableRow {
            id: edge.start_id,
            name: self.chains.resolve_name(start, edge.start_id),
            label: start.primary_label().map(str::to_string),
            subject: self.chains.resolve_subject(start),
            subject2: self.chains.resolve_subject2(start),
            place_type: self.chains.resolve_type(start),
            type2: self.chains.resolve_type2(start),
            lat: latitude(start),
            lng: longitude(start),
            edges: vec![first],
        }
    }

    fn edge_detail(&self, edge: &EdgeParts<'_>) -> EdgeDetail {
        EdgeDetail {
            relation_type: edge.relationship.rel_type.clone(),
            start_name: self.chains.resolve_name(edge.start, edge.start_id),
            end_name: self.chains.resolve_name(edge.end, edge.end_id),
            end_label: edge.end.primary_label().map(str::to_string),
            end_lat: latitude(edge.end),
            end_lng: longitude(edge.end),
        }
    }
}
