//! The frozen label store.
//!
//! Everything the query engine needs, flattened into plain arrays: node
//! coordinates and ranks, the full post-contraction adjacency in CSR form
//! over global edge ids, the flat edge arrays with shortcut parts for
//! unpacking, and the label table in CSR form. Label rows are hub-sorted and
//! the label arrays carry one trailing sentinel entry (`u32::MAX`) so scans
//! may read one slot past a row without bounds juggling.
//!
//! Serialization is one flat file per array inside a directory, via the
//! `Deconstruct`/`Reconstruct` traits.

use super::*;
use crate::datastr::node_order::{NodeOrder, Rank};
use crate::io::*;
use std::io::{Error, ErrorKind, Result};

/// The sentinel terminating the label arrays, `-1` in two's complement.
pub const LABEL_SENTINEL: u32 = u32::MAX;

#[derive(Debug)]
pub struct LabelStore {
    hl_level: Rank,
    latitude: Vec<f32>,
    longitude: Vec<f32>,
    order: NodeOrder,
    // post-contraction adjacency in CSR form, values are global edge ids
    first_out: Vec<EdgeId>,
    edge_ids: Vec<EdgeId>,
    // flat edge arrays shared by originals and shortcuts
    head: Vec<NodeId>,
    weight: Vec<Weight>,
    num_original_edges: usize,
    // (first, second) interleaved per shortcut edge
    shortcut_parts: Vec<EdgeId>,
    // label table in CSR form, hub sorted within each row
    label_first_out: Vec<u32>,
    label_hub: Vec<NodeId>,
    label_edge: Vec<EdgeId>,
    label_dist: Vec<Weight>,
}

/// Borrowed view of one node's label row.
#[derive(Debug, Clone, Copy)]
pub struct StoredLabel<'a> {
    hubs: &'a [NodeId],
    edges: &'a [EdgeId],
    dists: &'a [Weight],
}

impl<'a> StoredLabel<'a> {
    pub fn len(&self) -> usize {
        self.hubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hubs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, Weight)> + 'a {
        self.hubs.iter().copied().zip(self.dists.iter().copied())
    }

    /// Binary search for a hub's slot within the row.
    pub fn find(&self, hub: NodeId) -> Option<usize> {
        self.hubs.binary_search(&hub).ok()
    }

    pub fn hub(&self, index: usize) -> NodeId {
        self.hubs[index]
    }

    pub fn dist(&self, index: usize) -> Weight {
        self.dists[index]
    }

    /// The first edge towards the hub at `index`, `None` for the self entry.
    pub fn first_edge(&self, index: usize) -> Option<EdgeId> {
        if self.edges[index] == LABEL_SENTINEL {
            None
        } else {
            Some(self.edges[index])
        }
    }
}

impl LabelStore {
    /// Freeze the contracted graph, the ranks and the computed labels.
    pub fn new(graph: &DynamicGraph, order: NodeOrder, hl_level: Rank, labels: &[Vec<LabelEntry>]) -> LabelStore {
        let n = graph.num_nodes();
        assert_eq!(order.len(), n);
        assert_eq!(labels.len(), n);

        let mut first_out = Vec::with_capacity(n + 1);
        first_out.push(0);
        let mut edge_ids = Vec::with_capacity(graph.num_edges());
        for node in 0..n as NodeId {
            edge_ids.extend_from_slice(graph.all_neighbors(node));
            first_out.push(edge_ids.len() as EdgeId);
        }

        let head = (0..graph.num_edges() as EdgeId).map(|edge| graph.head(edge)).collect();
        let weight = (0..graph.num_edges() as EdgeId).map(|edge| graph.weight(edge)).collect();
        let mut shortcut_parts = Vec::with_capacity(graph.num_edges() - graph.num_original_edges());
        for edge in graph.num_original_edges() as EdgeId..graph.num_edges() as EdgeId {
            let (first, second) = graph.shortcut_parts(edge).unwrap();
            shortcut_parts.push(first);
            shortcut_parts.push(second);
        }

        let total_entries: usize = labels.iter().map(|label| label.len()).sum();
        let mut label_first_out = Vec::with_capacity(n + 1);
        label_first_out.push(0);
        let mut label_hub = Vec::with_capacity(total_entries + 1);
        let mut label_edge = Vec::with_capacity(total_entries + 1);
        let mut label_dist = Vec::with_capacity(total_entries + 1);
        for label in labels {
            debug_assert!(label.windows(2).all(|pair| pair[0].hub < pair[1].hub));
            for entry in label {
                label_hub.push(entry.hub);
                label_edge.push(entry.first_edge.value().unwrap_or(LABEL_SENTINEL));
                label_dist.push(entry.dist);
            }
            label_first_out.push(label_hub.len() as u32);
        }
        label_hub.push(LABEL_SENTINEL);
        label_edge.push(LABEL_SENTINEL);
        label_dist.push(LABEL_SENTINEL);

        LabelStore {
            hl_level,
            latitude: graph.latitude().to_vec(),
            longitude: graph.longitude().to_vec(),
            order,
            first_out,
            edge_ids,
            head,
            weight,
            num_original_edges: graph.num_original_edges(),
            shortcut_parts,
            label_first_out,
            label_hub,
            label_edge,
            label_dist,
        }
    }

    pub fn num_nodes(&self) -> usize {
        self.latitude.len()
    }

    pub fn num_edges(&self) -> usize {
        self.head.len()
    }

    pub fn hl_level(&self) -> Rank {
        self.hl_level
    }

    pub fn order(&self) -> &NodeOrder {
        &self.order
    }

    pub fn rank(&self, node: NodeId) -> Rank {
        self.order.rank(node)
    }

    pub fn latitude(&self) -> &[f32] {
        &self.latitude
    }

    pub fn longitude(&self) -> &[f32] {
        &self.longitude
    }

    /// Does this node own a stored label?
    pub fn has_label(&self, node: NodeId) -> bool {
        self.order.rank(node) >= self.hl_level
    }

    pub fn label(&self, node: NodeId) -> StoredLabel {
        let range = self.label_first_out[node as usize] as usize..self.label_first_out[node as usize + 1] as usize;
        StoredLabel {
            hubs: &self.label_hub[range.clone()],
            edges: &self.label_edge[range.clone()],
            dists: &self.label_dist[range],
        }
    }

    /// Global edge ids leaving `node`, shortcuts included.
    pub fn edge_ids(&self, node: NodeId) -> &[EdgeId] {
        let range = self.first_out[node as usize] as usize..self.first_out[node as usize + 1] as usize;
        &self.edge_ids[range]
    }

    pub fn head(&self, edge: EdgeId) -> NodeId {
        self.head[edge as usize]
    }

    /// The tail of an edge is the head of its twin.
    pub fn tail(&self, edge: EdgeId) -> NodeId {
        self.head[reverse_edge(edge) as usize]
    }

    pub fn weight(&self, edge: EdgeId) -> Weight {
        self.weight[edge as usize]
    }

    pub fn is_shortcut(&self, edge: EdgeId) -> bool {
        edge as usize >= self.num_original_edges
    }

    pub fn shortcut_parts(&self, edge: EdgeId) -> Option<(EdgeId, EdgeId)> {
        if self.is_shortcut(edge) {
            let index = 2 * (edge as usize - self.num_original_edges);
            Some((self.shortcut_parts[index], self.shortcut_parts[index + 1]))
        } else {
            None
        }
    }
}

impl Graph for LabelStore {
    fn num_nodes(&self) -> usize {
        self.latitude.len()
    }

    fn num_arcs(&self) -> usize {
        self.head.len()
    }
}

impl Deconstruct for LabelStore {
    fn store_each(&self, store: &dyn Fn(&str, &dyn Store) -> Result<()>) -> Result<()> {
        store("hl_level", &&[self.hl_level][..])?;
        store("num_original_edges", &&[self.num_original_edges as u32][..])?;
        store("latitude", &self.latitude)?;
        store("longitude", &self.longitude)?;
        store("ranks", &self.order.ranks())?;
        store("first_out", &self.first_out)?;
        store("edge_ids", &self.edge_ids)?;
        store("head", &self.head)?;
        store("weight", &self.weight)?;
        store("shortcut_parts", &self.shortcut_parts)?;
        store("label_first_out", &self.label_first_out)?;
        store("label_hub", &self.label_hub)?;
        store("label_edge", &self.label_edge)?;
        store("label_dist", &self.label_dist)?;
        Ok(())
    }
}

impl Reconstruct for LabelStore {
    fn reconstruct_with(loader: Loader) -> Result<Self> {
        let single = |name: &str| -> Result<u32> {
            let values: Vec<u32> = loader.load(name)?;
            values
                .first()
                .copied()
                .ok_or_else(|| Error::new(ErrorKind::InvalidData, format!("empty {} file", name)))
        };

        let hl_level = single("hl_level")?;
        let num_original_edges = single("num_original_edges")? as usize;
        let latitude: Vec<f32> = loader.load("latitude")?;
        let longitude: Vec<f32> = loader.load("longitude")?;
        let ranks: Vec<Rank> = loader.load("ranks")?;
        let first_out: Vec<EdgeId> = loader.load("first_out")?;
        let edge_ids: Vec<EdgeId> = loader.load("edge_ids")?;
        let head: Vec<NodeId> = loader.load("head")?;
        let weight: Vec<Weight> = loader.load("weight")?;
        let shortcut_parts: Vec<EdgeId> = loader.load("shortcut_parts")?;
        let label_first_out: Vec<u32> = loader.load("label_first_out")?;
        let label_hub: Vec<NodeId> = loader.load("label_hub")?;
        let label_edge: Vec<EdgeId> = loader.load("label_edge")?;
        let label_dist: Vec<Weight> = loader.load("label_dist")?;

        let n = latitude.len();
        if longitude.len() != n
            || ranks.len() != n
            || first_out.len() != n + 1
            || label_first_out.len() != n + 1
            || label_hub.len() != label_dist.len()
            || label_hub.len() != label_edge.len()
            || label_first_out.last().map(|&total| total as usize + 1) != Some(label_hub.len())
            || head.len() != weight.len()
            || num_original_edges > head.len()
        {
            return Err(Error::new(ErrorKind::InvalidData, "label store arrays are inconsistent"));
        }

        Ok(LabelStore {
            hl_level,
            latitude,
            longitude,
            order: NodeOrder::from_ranks(ranks),
            first_out,
            edge_ids,
            head,
            weight,
            num_original_edges,
            shortcut_parts,
            label_first_out,
            label_hub,
            label_edge,
            label_dist,
        })
    }
}
