//! The mutable adjacency structure driving contraction.
//!
//! Edges live in one flat arena shared by originals and shortcuts. Every
//! undirected input edge and every shortcut is inserted as a twin pair of
//! directed edges with consecutive ids, so `reverse_edge` is a bit flip and
//! queries stay symmetric by construction. Each node carries two edge id
//! lists: `current` holds the edges among not-yet-contracted nodes and
//! shrinks as contraction removes nodes, `all` keeps every edge ever inserted
//! and is what the label search later runs on.

use super::*;

#[derive(Debug, Clone)]
pub struct DynamicGraph {
    // flat edge arena, twin pairs of directed edges
    head: Vec<NodeId>,
    weight: Vec<Weight>,
    // (first, second) per shortcut edge, indexed by edge id minus num_original_edges
    shortcut_parts: Vec<(EdgeId, EdgeId)>,
    num_original_edges: usize,
    // edges among not-yet-contracted nodes, shrinks during contraction
    current: Vec<Vec<EdgeId>>,
    // every edge ever inserted, grows with shortcuts
    all: Vec<Vec<EdgeId>>,
    latitude: Vec<f32>,
    longitude: Vec<f32>,
}

impl DynamicGraph {
    /// Build the graph from node coordinates and undirected weighted edges
    /// over dense node ids.
    pub fn new(latitude: Vec<f32>, longitude: Vec<f32>, edges: &[(NodeId, NodeId, Weight)]) -> DynamicGraph {
        assert_eq!(latitude.len(), longitude.len());
        let n = latitude.len();

        let mut graph = DynamicGraph {
            head: Vec::with_capacity(2 * edges.len()),
            weight: Vec::with_capacity(2 * edges.len()),
            shortcut_parts: Vec::new(),
            num_original_edges: 0,
            current: vec![Vec::new(); n],
            all: vec![Vec::new(); n],
            latitude,
            longitude,
        };

        for &(from, to, weight) in edges {
            assert!((from as usize) < n && (to as usize) < n);
            assert_ne!(from, to, "self loops are not supported");
            graph.push_edge_pair(from, to, weight);
        }
        graph.num_original_edges = graph.head.len();

        graph
    }

    fn push_edge_pair(&mut self, from: NodeId, to: NodeId, weight: Weight) -> EdgeId {
        let id = self.head.len() as EdgeId;
        self.head.push(to);
        self.weight.push(weight);
        self.head.push(from);
        self.weight.push(weight);

        self.current[from as usize].push(id);
        self.all[from as usize].push(id);
        self.current[to as usize].push(id + 1);
        self.all[to as usize].push(id + 1);

        id
    }

    pub fn num_edges(&self) -> usize {
        self.head.len()
    }

    pub fn num_original_edges(&self) -> usize {
        self.num_original_edges
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

    /// The two lower level edges a shortcut replaces, `None` for original edges.
    pub fn shortcut_parts(&self, edge: EdgeId) -> Option<(EdgeId, EdgeId)> {
        if self.is_shortcut(edge) {
            Some(self.shortcut_parts[edge as usize - self.num_original_edges])
        } else {
            None
        }
    }

    /// Edge ids leaving `node` in the active (not-yet-contracted) graph.
    pub fn current_neighbors(&self, node: NodeId) -> &[EdgeId] {
        &self.current[node as usize]
    }

    /// Edge ids leaving `node` in the full graph including shortcuts.
    pub fn all_neighbors(&self, node: NodeId) -> &[EdgeId] {
        &self.all[node as usize]
    }

    pub fn latitude(&self) -> &[f32] {
        &self.latitude
    }

    pub fn longitude(&self) -> &[f32] {
        &self.longitude
    }

    /// The lightest active edge from `from` to `to`, if any.
    pub fn lightest_current_edge(&self, from: NodeId, to: NodeId) -> Option<EdgeId> {
        self.current[from as usize]
            .iter()
            .copied()
            .filter(|&edge| self.head(edge) == to)
            .min_by_key(|&edge| self.weight(edge))
    }

    /// Insert a shortcut twin pair replacing the path `first` then `second`.
    /// Both adjacency sets of both endpoints pick the new edges up.
    /// Returns the id of the `from -> to` direction.
    pub fn add_shortcut(&mut self, from: NodeId, to: NodeId, weight: Weight, first: EdgeId, second: EdgeId) -> EdgeId {
        debug_assert_eq!(self.tail(first), from);
        debug_assert_eq!(self.head(first), self.tail(second));
        debug_assert_eq!(self.head(second), to);
        debug_assert_eq!(self.weight(first) + self.weight(second), weight);

        let id = self.push_edge_pair(from, to, weight);
        self.shortcut_parts.push((first, second));
        self.shortcut_parts.push((reverse_edge(second), reverse_edge(first)));
        id
    }

    /// Remove `node` from the active graph: its edges disappear from the
    /// `current` lists of all neighbors and from its own. The `all` lists are
    /// untouched.
    pub fn remove_node(&mut self, node: NodeId) {
        let edges = std::mem::take(&mut self.current[node as usize]);
        for &edge in &edges {
            let neighbor = self.head(edge) as usize;
            let twin = reverse_edge(edge);
            let position = self.current[neighbor]
                .iter()
                .position(|&other| other == twin)
                .expect("current adjacency out of sync with twin edge");
            self.current[neighbor].swap_remove(position);
        }
    }
}

impl Graph for DynamicGraph {
    fn num_nodes(&self) -> usize {
        self.current.len()
    }

    fn num_arcs(&self) -> usize {
        self.head.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> DynamicGraph {
        DynamicGraph::new(vec![0.0; 3], vec![0.0; 3], &[(0, 1, 2), (1, 2, 3), (2, 0, 7)])
    }

    #[test]
    fn twin_pairs_are_mirrored() {
        let graph = triangle();
        assert_eq!(graph.num_edges(), 6);
        for edge in 0..graph.num_edges() as EdgeId {
            assert_eq!(graph.head(edge), graph.tail(reverse_edge(edge)));
            assert_eq!(graph.weight(edge), graph.weight(reverse_edge(edge)));
        }
    }

    #[test]
    fn remove_node_cleans_neighbor_lists() {
        let mut graph = triangle();
        graph.remove_node(1);

        assert!(graph.current_neighbors(1).is_empty());
        assert!(graph.current_neighbors(0).iter().all(|&e| graph.head(e) != 1));
        assert!(graph.current_neighbors(2).iter().all(|&e| graph.head(e) != 1));
        // the historical adjacency keeps the removed edges
        assert!(graph.all_neighbors(0).iter().any(|&e| graph.head(e) == 1));
    }

    #[test]
    fn shortcut_weight_is_sum_of_parts() {
        let mut graph = triangle();
        let first = graph.lightest_current_edge(0, 1).unwrap();
        let second = graph.lightest_current_edge(1, 2).unwrap();
        let shortcut = graph.add_shortcut(0, 2, 5, first, second);

        assert!(graph.is_shortcut(shortcut));
        assert_eq!(graph.weight(shortcut), 5);
        assert_eq!(graph.shortcut_parts(shortcut), Some((first, second)));
        // the twin unpacks in the opposite direction
        assert_eq!(
            graph.shortcut_parts(reverse_edge(shortcut)),
            Some((reverse_edge(second), reverse_edge(first)))
        );
        assert_eq!(graph.shortcut_parts(first), None);
    }
}
