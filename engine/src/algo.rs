//! Building blocks for the routing algorithms.

use crate::datastr::graph::*;

pub mod contraction;
pub mod dijkstra;
pub mod hub_labels;

/// Simply a source-target pair
#[derive(Debug, Clone, Copy)]
pub struct Query {
    pub from: NodeId,
    pub to: NodeId,
}

/// The outcome of a single point-to-point query, owned by the caller.
#[derive(Debug, Clone)]
pub struct RoutingResult {
    /// The node ids along the route, empty when no route exists.
    pub path: Vec<NodeId>,
    /// The exact shortest distance, `None` when no route exists.
    pub distance: Option<Weight>,
    /// Wall clock time spent answering the query.
    pub time_ms: f64,
}
