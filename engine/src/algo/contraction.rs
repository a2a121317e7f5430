//! Contraction hierarchy construction.
//!
//! Nodes are contracted one at a time along a fixed elimination order. For
//! the node at hand we run one bounded dijkstra per active neighbor over the
//! remaining active graph (the node itself still present) and stop as soon as
//! every neighbor is settled. Whenever a neighbor was settled through the
//! two edge chain over the contracted node, that chain gets preserved as a
//! shortcut twin pair, unless an active edge between the endpoints is
//! already at least as light. Afterwards the node leaves the active graph.
//!
//! Contraction is strictly sequential: every step depends on the shortcuts
//! and removals of all previous steps.
//!
//! The reference elimination order is a seeded pseudo-random shuffle, not an
//! importance heuristic. Any other permutation works and merely changes
//! which shortcuts come into existence, not the correctness of answers.

use super::*;
use crate::datastr::{distance_heap::*, node_order::NodeOrder, timestamped_vector::TimestampedVector};
use rand::prelude::*;

/// The reference pseudo-random elimination order.
pub fn random_order(n: usize, seed: u64) -> NodeOrder {
    let mut order: Vec<NodeId> = (0..n as NodeId).collect();
    order.shuffle(&mut StdRng::seed_from_u64(seed));
    NodeOrder::from_node_order(order)
}

pub struct ContractionHierarchyBuilder<'a> {
    graph: &'a mut DynamicGraph,
    queue: DistanceHeap,
    distances: TimestampedVector<Weight>,
    predecessors: Vec<NodeId>,
}

impl<'a> ContractionHierarchyBuilder<'a> {
    pub fn new(graph: &'a mut DynamicGraph) -> ContractionHierarchyBuilder<'a> {
        let n = graph.num_nodes();
        ContractionHierarchyBuilder {
            graph,
            queue: DistanceHeap::new(n),
            distances: TimestampedVector::new(n, INFINITY),
            predecessors: vec![n as NodeId; n],
        }
    }

    /// Contract all nodes in rank order, inserting shortcuts into the graph.
    /// Afterwards the `current` adjacency is empty and the `all` adjacency
    /// holds the finished hierarchy.
    pub fn run(mut self, order: &NodeOrder) {
        assert_eq!(order.len(), self.graph.num_nodes());
        for rank in 0..order.len() {
            self.contract_node(order.node(rank as NodeId));
        }
    }

    fn contract_node(&mut self, node: NodeId) {
        // unique active neighbors, each with the lightest edge from `node` towards it
        let mut neighbors: Vec<(NodeId, EdgeId)> = Vec::new();
        for &edge in self.graph.current_neighbors(node) {
            let neighbor = self.graph.head(edge);
            if let Some(position) = neighbors.iter().position(|&(other, _)| other == neighbor) {
                if self.graph.weight(edge) < self.graph.weight(neighbors[position].1) {
                    neighbors[position].1 = edge;
                }
            } else {
                neighbors.push((neighbor, edge));
            }
        }

        if neighbors.len() >= 2 {
            let targets: Vec<NodeId> = neighbors.iter().map(|&(neighbor, _)| neighbor).collect();

            for &(seed, seed_edge) in &neighbors {
                self.settle_neighborhood(seed, &targets);

                for &(target, target_edge) in &neighbors {
                    if target == seed {
                        continue;
                    }
                    // shortcut needed iff the chain seed -> node -> target won the neighborhood search
                    if self.predecessors[target as usize] != node || self.predecessors[node as usize] != seed {
                        continue;
                    }

                    let dist = self.distances[target as usize];
                    let first = reverse_edge(seed_edge);
                    let second = target_edge;
                    assert_eq!(
                        self.graph.weight(first) + self.graph.weight(second),
                        dist,
                        "contraction settled a neighbor through an inconsistent chain"
                    );

                    let redundant = self
                        .graph
                        .lightest_current_edge(seed, target)
                        .map(|existing| self.graph.weight(existing) <= dist)
                        .unwrap_or(false);
                    if !redundant {
                        self.graph.add_shortcut(seed, target, dist, first, second);
                    }
                }
            }
        }

        self.graph.remove_node(node);
    }

    /// Dijkstra from `seed` over the active graph, stopping once all of
    /// `targets` are settled.
    fn settle_neighborhood(&mut self, seed: NodeId, targets: &[NodeId]) {
        self.queue.clear();
        self.distances.reset();
        self.distances[seed as usize] = 0;
        self.predecessors[seed as usize] = seed;
        self.queue.push(State { distance: 0, node: seed });

        let mut remaining = targets.len();
        while remaining > 0 {
            let State { node, distance } = self
                .queue
                .pop()
                .expect("a neighbor of the contracted node was never settled");

            if targets.contains(&node) {
                remaining -= 1;
            }

            for &edge in self.graph.current_neighbors(node) {
                let next = self.graph.head(edge);
                let next_distance = distance + self.graph.weight(edge);
                if next_distance < self.distances[next as usize] {
                    self.distances[next as usize] = next_distance;
                    self.predecessors[next as usize] = node;
                    let state = State {
                        distance: next_distance,
                        node: next,
                    };
                    if self.queue.contains(next) {
                        self.queue.decrease_key(state);
                    } else {
                        self.queue.push(state);
                    }
                }
            }
        }
    }
}
