//! # Road network boundary
//!
//! The refinement stage consumes a road graph through [`RoadGraphAdapter`]:
//! a bounding-box query returning the drivable, unsimplified graph and a
//! nearest-edge lookup. Acquisition from an actual geographic data provider
//! lives outside this crate; any provider that satisfies the trait works.
//!
//! [`InMemoryRoadNetwork`] is a ready-made adapter over a graph loaded from
//! JSON, used by the CLI and the tests.
//!
//! ## Graph JSON
//!
//! ```json
//! {
//!   "nodes": [{"id": 1, "x": 8.54, "y": 47.37}, {"id": 2, "x": 8.55, "y": 47.37}],
//!   "edges": [
//!     {"u": 1, "v": 2, "key": 0, "way_id": 1001, "geometry": [[8.54, 47.37], [8.55, 47.37]]}
//!   ]
//! }
//! ```
//!
//! `geometry` is optional (straight segment between the endpoint nodes when
//! absent), `key` defaults to 0 and `drivable` defaults to `true`.

pub mod geometry;
pub mod index;

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;

use geo::{Coord, LineString};
use log::info;
use serde::{Deserialize, Serialize};

use crate::error::OptionExt;
use crate::{BoundingBox, RefineError, Result};

use index::EdgeIndex;

/// Opaque identifier grouping the edges of one road.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct WayId(pub i64);

impl fmt::Display for WayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "way/{}", self.0)
    }
}

/// Identity of a (multi)graph edge: endpoints plus parallel-edge key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[derive(Serialize, Deserialize)]
pub struct EdgeId {
    pub u: u64,
    pub v: u64,
    pub key: u32,
}

impl EdgeId {
    pub fn new(u: u64, v: u64, key: u32) -> Self {
        Self { u, v, key }
    }
}

/// A graph node with planar coordinates (x = longitude, y = latitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: u64,
    pub x: f64,
    pub y: f64,
}

/// A road edge as supplied by the provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoadEdge {
    pub u: u64,
    pub v: u64,
    #[serde(default)]
    pub key: u32,
    pub way_id: WayId,
    #[serde(default = "default_drivable")]
    pub drivable: bool,
    /// Explicit geometry as `[x, y]` pairs. Absent means a straight segment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geometry: Option<Vec<[f64; 2]>>,
}

fn default_drivable() -> bool {
    true
}

impl RoadEdge {
    /// Edge identity.
    pub fn id(&self) -> EdgeId {
        EdgeId::new(self.u, self.v, self.key)
    }
}

#[derive(Serialize, Deserialize)]
struct GraphData {
    nodes: Vec<Node>,
    edges: Vec<RoadEdge>,
}

/// Read-only road graph with resolved edge geometries and lookup indices.
///
/// Edges keep the order they were supplied in; way lookups return edges in
/// that order.
#[derive(Debug)]
pub struct RoadGraph {
    nodes: HashMap<u64, Node>,
    edges: Vec<RoadEdge>,
    geometries: Vec<LineString<f64>>,
    by_id: HashMap<EdgeId, usize>,
    by_way: HashMap<WayId, Vec<usize>>,
    index: EdgeIndex,
}

impl RoadGraph {
    /// Build a graph from nodes and edges.
    ///
    /// # Errors
    /// [`RefineError::AdapterFailure`] if an edge references an unknown node
    /// or two edges share an identifier.
    pub fn new(nodes: Vec<Node>, edges: Vec<RoadEdge>) -> Result<Self> {
        let nodes: HashMap<u64, Node> = nodes.into_iter().map(|n| (n.id, n)).collect();

        let mut geometries = Vec::with_capacity(edges.len());
        let mut by_id = HashMap::with_capacity(edges.len());
        let mut by_way: HashMap<WayId, Vec<usize>> = HashMap::new();

        for (i, edge) in edges.iter().enumerate() {
            geometries.push(resolve_geometry(&nodes, edge)?);
            if by_id.insert(edge.id(), i).is_some() {
                return Err(RefineError::AdapterFailure(format!(
                    "duplicate edge {:?}",
                    edge.id()
                )));
            }
            by_way.entry(edge.way_id).or_default().push(i);
        }

        let index = EdgeIndex::build(edges.iter().map(RoadEdge::id).zip(geometries.iter()));

        Ok(Self {
            nodes,
            edges,
            geometries,
            by_id,
            by_way,
            index,
        })
    }

    /// Parse a graph from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let data: GraphData = serde_json::from_str(json)?;
        Self::new(data.nodes, data.edges)
    }

    /// Load a graph from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Serialize the graph back to JSON.
    pub fn to_json(&self) -> Result<String> {
        let mut nodes: Vec<Node> = self.nodes.values().copied().collect();
        nodes.sort_by_key(|n| n.id);
        let data = GraphData {
            nodes,
            edges: self.edges.clone(),
        };
        Ok(serde_json::to_string(&data)?)
    }

    pub fn node(&self, id: u64) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// All edges in supply order.
    pub fn edges(&self) -> impl Iterator<Item = &RoadEdge> {
        self.edges.iter()
    }

    pub fn edge(&self, id: &EdgeId) -> Option<&RoadEdge> {
        self.by_id.get(id).map(|&i| &self.edges[i])
    }

    /// Geometry of an edge: explicit if supplied, else the straight segment.
    pub fn edge_geometry(&self, id: &EdgeId) -> Option<&LineString<f64>> {
        self.by_id.get(id).map(|&i| &self.geometries[i])
    }

    /// Way identifier carried by an edge.
    pub fn way_of(&self, id: &EdgeId) -> Option<WayId> {
        self.edge(id).map(|e| e.way_id)
    }

    /// Geometries of every edge carrying `way`, in supply order.
    pub fn way_geometries(&self, way: WayId) -> impl Iterator<Item = &LineString<f64>> {
        self.by_way
            .get(&way)
            .into_iter()
            .flatten()
            .map(|&i| &self.geometries[i])
    }

    /// Edge geometry table keyed by edge identity.
    pub fn edge_geometries(&self) -> HashMap<EdgeId, LineString<f64>> {
        self.edges
            .iter()
            .zip(&self.geometries)
            .map(|(e, g)| (e.id(), g.clone()))
            .collect()
    }

    /// Edge passing closest to `(longitude, latitude)`, planar metric.
    pub fn nearest_edge(&self, longitude: f64, latitude: f64) -> Option<EdgeId> {
        self.index.nearest(longitude, latitude)
    }

    /// Sub-graph of edges whose geometry envelope overlaps `bbox`.
    ///
    /// With `drivable_only`, non-drivable edges are dropped as well. Nodes
    /// referenced by kept edges are kept.
    pub fn subgraph(&self, bbox: &BoundingBox, drivable_only: bool) -> Result<Self> {
        use geo::BoundingRect;

        let edges: Vec<RoadEdge> = self
            .edges
            .iter()
            .zip(&self.geometries)
            .filter(|(e, _)| !drivable_only || e.drivable)
            .filter(|(_, g)| g.bounding_rect().is_some_and(|r| bbox.intersects_rect(&r)))
            .map(|(e, _)| e.clone())
            .collect();

        let referenced: HashSet<u64> = edges.iter().flat_map(|e| [e.u, e.v]).collect();
        let nodes: Vec<Node> = self
            .nodes
            .values()
            .filter(|n| referenced.contains(&n.id))
            .copied()
            .collect();

        Self::new(nodes, edges)
    }
}

fn resolve_geometry(nodes: &HashMap<u64, Node>, edge: &RoadEdge) -> Result<LineString<f64>> {
    if let Some(coords) = &edge.geometry {
        if coords.len() >= 2 {
            return Ok(coords.iter().map(|&[x, y]| Coord { x, y }).collect());
        }
    }
    let u = nodes
        .get(&edge.u)
        .ok_or_adapter_failure(format!("edge references unknown node {}", edge.u))?;
    let v = nodes
        .get(&edge.v)
        .ok_or_adapter_failure(format!("edge references unknown node {}", edge.v))?;
    Ok(LineString::from(vec![(u.x, u.y), (v.x, v.y)]))
}

// ============================================================================
// Adapter boundary
// ============================================================================

/// Capabilities the refiner needs from a road network provider.
pub trait RoadGraphAdapter {
    /// Drivable, unsimplified graph covering `bbox`.
    fn graph_for_bbox(&self, bbox: &BoundingBox) -> Result<RoadGraph>;

    /// Edge nearest to `(longitude, latitude)` in `graph`.
    fn nearest_edge(&self, graph: &RoadGraph, longitude: f64, latitude: f64) -> Result<EdgeId>;

    /// Batch form of [`nearest_edge`](Self::nearest_edge); one edge per
    /// `(longitude, latitude)` input, in input order.
    fn nearest_edges(&self, graph: &RoadGraph, coords: &[(f64, f64)]) -> Result<Vec<EdgeId>> {
        coords
            .iter()
            .map(|&(lon, lat)| self.nearest_edge(graph, lon, lat))
            .collect()
    }
}

/// Adapter answering queries from a preloaded graph.
#[derive(Debug)]
pub struct InMemoryRoadNetwork {
    graph: RoadGraph,
}

impl InMemoryRoadNetwork {
    pub fn new(graph: RoadGraph) -> Self {
        Self { graph }
    }

    /// Load the backing graph from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self::new(RoadGraph::load(path)?))
    }

    /// The full backing graph.
    pub fn graph(&self) -> &RoadGraph {
        &self.graph
    }
}

impl RoadGraphAdapter for InMemoryRoadNetwork {
    fn graph_for_bbox(&self, bbox: &BoundingBox) -> Result<RoadGraph> {
        let graph = self.graph.subgraph(bbox, true)?;
        if graph.is_empty() {
            return Err(RefineError::AdapterFailure(format!(
                "no drivable roads in bbox (N {}, S {}, E {}, W {})",
                bbox.north, bbox.south, bbox.east, bbox.west
            )));
        }
        info!(
            "[RoadNetwork] bbox query returned {} nodes, {} edges",
            graph.node_count(),
            graph.edge_count()
        );
        Ok(graph)
    }

    fn nearest_edge(&self, graph: &RoadGraph, longitude: f64, latitude: f64) -> Result<EdgeId> {
        graph
            .nearest_edge(longitude, latitude)
            .ok_or_adapter_failure(format!("no edge near ({longitude}, {latitude})"))
    }

    #[cfg(feature = "parallel")]
    fn nearest_edges(&self, graph: &RoadGraph, coords: &[(f64, f64)]) -> Result<Vec<EdgeId>> {
        use rayon::prelude::*;

        coords
            .par_iter()
            .map(|&(lon, lat)| self.nearest_edge(graph, lon, lat))
            .collect()
    }
}
