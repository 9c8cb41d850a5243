//! Tests for road module

use chrono::NaiveDate;
use geo::LineString;
use tracerefine::{
    BoundingBox, EdgeGeometryResolver, EdgeId, InMemoryRoadNetwork, RefineError, RoadGraph,
    RoadGraphAdapter, TrajectoryPoint, WayGeometry, WayId,
};

/// An east-west way (100) crossed by a north-south way (200) at (0.001, 0).
const CROSS: &str = r#"{
    "nodes": [
        {"id": 1, "x": 0.0, "y": 0.0},
        {"id": 2, "x": 0.002, "y": 0.0},
        {"id": 3, "x": 0.001, "y": -0.001},
        {"id": 4, "x": 0.001, "y": 0.001},
        {"id": 5, "x": 0.003, "y": 0.003}
    ],
    "edges": [
        {"u": 1, "v": 2, "way_id": 100},
        {"u": 2, "v": 1, "way_id": 100},
        {"u": 3, "v": 4, "key": 0, "way_id": 200},
        {"u": 2, "v": 5, "way_id": 300, "drivable": false}
    ]
}"#;

fn cross() -> RoadGraph {
    RoadGraph::from_json(CROSS).unwrap()
}

#[test]
fn test_from_json() {
    let graph = cross();
    assert_eq!(graph.node_count(), 5);
    assert_eq!(graph.edge_count(), 4);
    assert_eq!(graph.way_of(&EdgeId::new(3, 4, 0)), Some(WayId(200)));
    assert!(!graph.edge(&EdgeId::new(2, 5, 0)).unwrap().drivable);
}

#[test]
fn test_straight_geometry_when_absent() {
    let graph = cross();
    let geometry = graph.edge_geometry(&EdgeId::new(1, 2, 0)).unwrap();
    assert_eq!(geometry, &LineString::from(vec![(0.0, 0.0), (0.002, 0.0)]));
}

#[test]
fn test_explicit_geometry_kept() {
    let json = r#"{
        "nodes": [{"id": 1, "x": 0.0, "y": 0.0}, {"id": 2, "x": 0.002, "y": 0.0}],
        "edges": [
            {"u": 1, "v": 2, "way_id": 7, "geometry": [[0.0, 0.0], [0.001, 0.0005], [0.002, 0.0]]}
        ]
    }"#;
    let graph = RoadGraph::from_json(json).unwrap();
    let geometry = graph.edge_geometry(&EdgeId::new(1, 2, 0)).unwrap();
    assert_eq!(geometry.0.len(), 3);
}

#[test]
fn test_unknown_node_is_adapter_failure() {
    let json = r#"{
        "nodes": [{"id": 1, "x": 0.0, "y": 0.0}],
        "edges": [{"u": 1, "v": 9, "way_id": 1}]
    }"#;
    assert!(matches!(
        RoadGraph::from_json(json),
        Err(RefineError::AdapterFailure(_))
    ));
}

#[test]
fn test_nearest_edge() {
    let graph = cross();
    let near_east_west = graph.nearest_edge(0.0003, 0.0001).unwrap();
    assert_eq!(graph.way_of(&near_east_west), Some(WayId(100)));

    let near_north_south = graph.nearest_edge(0.0011, 0.0008).unwrap();
    assert_eq!(near_north_south, EdgeId::new(3, 4, 0));
}

#[test]
fn test_subgraph_filters_by_bbox_and_drivable() {
    let graph = cross();

    let west = BoundingBox::new(0.0001, -0.0001, 0.0005, 0.0);
    let sub = graph.subgraph(&west, true).unwrap();
    assert_eq!(sub.edge_count(), 2);
    assert!(sub.edges().all(|e| e.way_id == WayId(100)));
    assert_eq!(sub.node_count(), 2);

    let everything = BoundingBox::new(1.0, -1.0, 1.0, -1.0);
    assert_eq!(graph.subgraph(&everything, true).unwrap().edge_count(), 3);
    assert_eq!(graph.subgraph(&everything, false).unwrap().edge_count(), 4);
}

#[test]
fn test_json_round_trip_keeps_graph() {
    let graph = cross();
    let reloaded = RoadGraph::from_json(&graph.to_json().unwrap()).unwrap();
    assert_eq!(reloaded.node_count(), graph.node_count());
    assert_eq!(reloaded.edge_count(), graph.edge_count());
}

#[test]
fn test_duplicate_edge_is_adapter_failure() {
    let json = r#"{
        "nodes": [{"id": 1, "x": 0.0, "y": 0.0}, {"id": 2, "x": 0.001, "y": 0.0}],
        "edges": [
            {"u": 1, "v": 2, "way_id": 1},
            {"u": 1, "v": 2, "way_id": 2}
        ]
    }"#;
    assert!(matches!(
        RoadGraph::from_json(json),
        Err(RefineError::AdapterFailure(_))
    ));

    // Parallel edges with distinct keys are fine.
    let keyed = json.replace(r#""way_id": 2"#, r#""key": 1, "way_id": 2"#);
    assert_eq!(RoadGraph::from_json(&keyed).unwrap().edge_count(), 2);
}

#[test]
fn test_in_memory_adapter_bbox_query() {
    let network = InMemoryRoadNetwork::new(cross());
    let graph = network
        .graph_for_bbox(&BoundingBox::new(0.001, -0.001, 0.002, 0.0))
        .unwrap();
    assert_eq!(graph.edge_count(), 3);

    let far = BoundingBox::new(10.0, 9.0, 10.0, 9.0);
    assert!(matches!(
        network.graph_for_bbox(&far),
        Err(RefineError::AdapterFailure(_))
    ));
}

#[test]
fn test_in_memory_adapter_nearest_edges() {
    let network = InMemoryRoadNetwork::new(cross());
    let edges = network
        .nearest_edges(network.graph(), &[(0.0003, 0.0), (0.001, 0.0007)])
        .unwrap();
    assert_eq!(network.graph().way_of(&edges[0]), Some(WayId(100)));
    assert_eq!(edges[1], EdgeId::new(3, 4, 0));
}

#[test]
fn test_way_union_collapses_reversed_halves() {
    let forward = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
    let backward = LineString::from(vec![(1.0, 0.0), (0.0, 0.0)]);
    let geometry = WayGeometry::union([&forward, &backward]).unwrap();
    assert!(!geometry.is_multi());
    assert_eq!(geometry.components(), &[forward]);
}

#[test]
fn test_way_union_keeps_distinct_pieces() {
    let a = LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]);
    let b = LineString::from(vec![(1.0, 0.0), (2.0, 0.0)]);
    let geometry = WayGeometry::union([&a, &b]).unwrap();
    assert!(geometry.is_multi());
    assert_eq!(geometry.components().len(), 2);

    let nothing: Vec<LineString<f64>> = Vec::new();
    assert!(WayGeometry::union(&nothing).is_none());
}

#[test]
fn test_resolver_maps_points_to_ways() {
    let network = InMemoryRoadNetwork::new(cross());
    let time = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
    let points = vec![
        TrajectoryPoint::new(0.0, 0.0003, time),
        TrajectoryPoint::new(0.0008, 0.001, time),
        TrajectoryPoint::new(0.0, 0.0003, time),
    ];

    let mut resolver = EdgeGeometryResolver::new(network.graph(), &network, &points).unwrap();
    assert_eq!(resolver.ways(), &[WayId(100), WayId(200), WayId(100)]);

    assert!(resolver.geometry_at(0).is_some());
    assert!(resolver.geometry_at(2).is_some());
    assert_eq!(resolver.cached_ways(), 1);
    assert!(resolver.geometry_at(1).is_some());
    assert_eq!(resolver.cached_ways(), 2);
    assert!(resolver.geometry_at(3).is_none());
}
