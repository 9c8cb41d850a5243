//! Way geometries and the per-call edge geometry resolver.

use std::collections::HashMap;

use geo::{LineString, MultiLineString};
use log::debug;

use super::{RoadGraph, RoadGraphAdapter, WayId};
use crate::error::OptionExt;
use crate::{Result, TrajectoryPoint};

/// Union of the geometries of every edge sharing a way identifier.
///
/// A road split into several graph edges yields several components;
/// callers must handle both shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum WayGeometry {
    Line(LineString<f64>),
    Multi(MultiLineString<f64>),
}

impl WayGeometry {
    /// Union a set of edge geometries.
    ///
    /// Identical components, including ones traced in the opposite
    /// direction (the two halves of a two-way street), collapse into one.
    /// Returns `None` when nothing is supplied.
    pub fn union<'a>(parts: impl IntoIterator<Item = &'a LineString<f64>>) -> Option<Self> {
        let mut components: Vec<LineString<f64>> = Vec::new();
        for part in parts {
            if part.0.len() < 2 || components.iter().any(|c| same_path(c, part)) {
                continue;
            }
            components.push(part.clone());
        }

        match components.len() {
            0 => None,
            1 => components.pop().map(WayGeometry::Line),
            _ => Some(WayGeometry::Multi(MultiLineString::new(components))),
        }
    }

    /// Component lines in iteration order.
    pub fn components(&self) -> &[LineString<f64>] {
        match self {
            WayGeometry::Line(line) => std::slice::from_ref(line),
            WayGeometry::Multi(multi) => &multi.0,
        }
    }

    pub fn is_multi(&self) -> bool {
        matches!(self, WayGeometry::Multi(_))
    }
}

fn same_path(a: &LineString<f64>, b: &LineString<f64>) -> bool {
    a.0 == b.0 || (a.0.len() == b.0.len() && a.0.iter().eq(b.0.iter().rev()))
}

/// Resolves trajectory points to way identifiers and way geometries.
///
/// Built once per refinement call. Way lookups are keyed by the point's
/// index in the trajectory, and unioned geometries are cached per way for
/// the lifetime of the resolver.
pub struct EdgeGeometryResolver<'g> {
    graph: &'g RoadGraph,
    ways: Vec<WayId>,
    cache: HashMap<WayId, Option<WayGeometry>>,
}

impl<'g> EdgeGeometryResolver<'g> {
    /// Map every point to the way of its nearest edge.
    ///
    /// # Errors
    /// Propagates adapter failures, and reports
    /// [`RefineError::AdapterFailure`](crate::RefineError::AdapterFailure)
    /// when the adapter names an edge the graph does not contain.
    pub fn new<A: RoadGraphAdapter + ?Sized>(
        graph: &'g RoadGraph,
        adapter: &A,
        points: &[TrajectoryPoint],
    ) -> Result<Self> {
        let coords: Vec<(f64, f64)> = points.iter().map(|p| (p.longitude, p.latitude)).collect();
        let edges = adapter.nearest_edges(graph, &coords)?;

        let ways = edges
            .iter()
            .map(|edge| {
                graph
                    .way_of(edge)
                    .ok_or_adapter_failure(format!("nearest edge {edge:?} is not in the graph"))
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            graph,
            ways,
            cache: HashMap::new(),
        })
    }

    /// Way identifier of the point at `index`.
    pub fn way(&self, index: usize) -> Option<WayId> {
        self.ways.get(index).copied()
    }

    /// All resolved way identifiers, index-aligned with the trajectory.
    pub fn ways(&self) -> &[WayId] {
        &self.ways
    }

    /// Unioned geometry of `way`, computed on first use.
    pub fn way_geometry(&mut self, way: WayId) -> Option<&WayGeometry> {
        let graph = self.graph;
        self.cache
            .entry(way)
            .or_insert_with(|| {
                let geometry = WayGeometry::union(graph.way_geometries(way));
                if let Some(g) = &geometry {
                    debug!("[Resolver] {} -> {} component(s)", way, g.components().len());
                }
                geometry
            })
            .as_ref()
    }

    /// Unioned geometry of the way under the point at `index`.
    pub fn geometry_at(&mut self, index: usize) -> Option<&WayGeometry> {
        let way = self.way(index)?;
        self.way_geometry(way)
    }

    /// Number of distinct ways whose geometry has been computed.
    pub fn cached_ways(&self) -> usize {
        self.cache.len()
    }
}

