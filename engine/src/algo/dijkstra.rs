//! Plain dijkstra over the original edges.
//!
//! Far too slow to serve queries on a real mesh, but exact by construction,
//! which makes it the reference oracle for the hub label engine in tests and
//! benchmarks.

use super::*;
use crate::algo::hub_labels::LabelStore;
use crate::datastr::{distance_heap::*, timestamped_vector::TimestampedVector};

pub struct Server {
    first_out: Vec<EdgeId>,
    head: Vec<NodeId>,
    weight: Vec<Weight>,
    distances: TimestampedVector<Weight>,
    predecessors: Vec<NodeId>,
    queue: DistanceHeap,
    last_query: Option<Query>,
    last_result: Option<Weight>,
}

impl Server {
    /// Build the oracle over the original edges of the graph, shortcuts excluded.
    pub fn new(graph: &DynamicGraph) -> Server {
        let n = graph.num_nodes();
        let links = (0..n as NodeId).map(|node| {
            graph
                .all_neighbors(node)
                .iter()
                .copied()
                .filter(|&edge| !graph.is_shortcut(edge))
                .map(|edge| Link {
                    node: graph.head(edge),
                    weight: graph.weight(edge),
                })
                .collect()
        });
        Self::from_adjacency(links.collect())
    }

    /// Build the oracle from the original edges kept in a label store.
    pub fn from_store(store: &LabelStore) -> Server {
        let n = store.num_nodes();
        let links = (0..n as NodeId).map(|node| {
            store
                .edge_ids(node)
                .iter()
                .copied()
                .filter(|&edge| !store.is_shortcut(edge))
                .map(|edge| Link {
                    node: store.head(edge),
                    weight: store.weight(edge),
                })
                .collect()
        });
        Self::from_adjacency(links.collect())
    }

    fn from_adjacency(links: Vec<Vec<Link>>) -> Server {
        let n = links.len();
        let mut first_out = Vec::with_capacity(n + 1);
        first_out.push(0);
        let mut head = Vec::new();
        let mut weight = Vec::new();
        for neighbors in links {
            for link in &neighbors {
                head.push(link.node);
                weight.push(link.weight);
            }
            first_out.push(head.len() as EdgeId);
        }

        Server {
            first_out,
            head,
            weight,
            distances: TimestampedVector::new(n, INFINITY),
            predecessors: vec![n as NodeId; n],
            queue: DistanceHeap::new(n),
            last_query: None,
            last_result: None,
        }
    }

    pub fn distance(&mut self, from: NodeId, to: NodeId) -> Option<Weight> {
        self.last_query = Some(Query { from, to });
        self.last_result = None;
        self.queue.clear();
        self.distances.reset();

        self.distances[from as usize] = 0;
        self.predecessors[from as usize] = from;
        self.queue.push(State { distance: 0, node: from });

        while let Some(State { node, distance }) = self.queue.pop() {
            if node == to {
                self.last_result = Some(distance);
                return self.last_result;
            }

            let edges = self.first_out[node as usize] as usize..self.first_out[node as usize + 1] as usize;
            for (&next, &edge_weight) in self.head[edges.clone()].iter().zip(self.weight[edges].iter()) {
                let next_distance = distance + edge_weight;
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

        None
    }

    /// The node path of the most recent `distance` call, empty when it found no route.
    pub fn path(&self) -> Vec<NodeId> {
        let query = self.last_query.expect("path requested before any query");
        if self.last_result.is_none() {
            return Vec::new();
        }

        let mut path = vec![query.to];
        while *path.last().unwrap() != query.from {
            path.push(self.predecessors[*path.last().unwrap() as usize]);
        }
        path.reverse();
        path
    }
}
