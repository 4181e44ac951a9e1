use serde::Serialize;

use placegraph_common::{EntityId, GeoPoint};

use crate::normalize::GraphView;

/// A plottable node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapMarker {
    pub id: EntityId,
    pub name: String,
    pub label: Option<String>,
    pub position: GeoPoint,
}

/// An edge whose two endpoints are both plottable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPolyline {
    pub source: EntityId,
    pub target: EntityId,
    #[serde(rename = "type")]
    pub relation_type: String,
    pub from: GeoPoint,
    pub to: GeoPoint,
}

/// What both map renderers draw. `center` is the first plottable node; `None`
/// means there is nothing to show on the map.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MapView {
    pub center: Option<GeoPoint>,
    pub markers: Vec<MapMarker>,
    pub polylines: Vec<MapPolyline>,
}

impl MapView {
    pub fn from_graph(graph: &GraphView) -> Self {
        let markers: Vec<MapMarker> = graph
            .plottable_nodes()
            .filter_map(|n| {
                Some(MapMarker {
                    id: n.id,
                    name: n.name.clone(),
                    label: n.label.clone(),
                    position: n.position()?,
                })
            })
            .collect();

        let position_of = |id: EntityId| graph.node(id).and_then(|n| n.position());
        let polylines = graph
            .edges()
            .iter()
            .filter_map(|e| {
                Some(MapPolyline {
                    source: e.source,
                    target: e.target,
                    relation_type: e.relation_type.clone(),
                    from: position_of(e.source)?,
                    to: position_of(e.target)?,
                })
            })
            .collect();

        Self {
            center: markers.first().map(|m| m.position),
            markers,
            polylines,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }
}
