//! Label construction.
//!
//! One upward label-constrained dijkstra per node over the `all` edge set:
//! an edge is only relaxed towards equal-or-higher ranks. Nodes that already
//! own a finished label sit in a second frontier; popping one merges its
//! stored label instead of searching past it, which is what keeps the search
//! spaces tiny on big meshes.
//!
//! Nodes are processed in descending rank order in fixed-size batches. Each
//! batch runs on a rayon worker pool into fresh per-node slots and is
//! committed after the implicit join, so workers only ever read labels
//! finalized in earlier batches. A label not yet finalized simply counts as
//! absent - the raw search continues past the node, which costs label size,
//! never correctness.

use super::*;
use crate::datastr::{
    distance_heap::*,
    node_order::{NodeOrder, Rank},
    sorted_index_map::SortedIndexMap,
    timestamped_vector::TimestampedVector,
};
use rayon::prelude::*;

/// Nodes per parallel batch.
const BATCH_SIZE: usize = 512;

pub struct HubLabelBuilder<'a> {
    graph: &'a DynamicGraph,
    order: &'a NodeOrder,
    hl_level: Rank,
}

struct SearchScratch {
    raw_queue: DistanceHeap,
    labeled_queue: DistanceHeap,
    distances: TimestampedVector<Weight>,
    // first edge from the search origin towards each reached node,
    // only valid for nodes touched in the current search
    first_edges: Vec<EdgeId>,
    // (distance, first edge) per reached hub, assembled in hub id order
    result: SortedIndexMap<(Weight, EdgeId)>,
}

impl SearchScratch {
    fn new(n: usize) -> SearchScratch {
        SearchScratch {
            raw_queue: DistanceHeap::new(n),
            labeled_queue: DistanceHeap::new(n),
            distances: TimestampedVector::new(n, INFINITY),
            first_edges: vec![0; n],
            result: SortedIndexMap::new(),
        }
    }

    fn reset(&mut self) {
        self.raw_queue.clear();
        self.labeled_queue.clear();
        self.distances.reset();
        self.result.clear();
    }
}

fn insert_min(result: &mut SortedIndexMap<(Weight, EdgeId)>, hub: NodeId, dist: Weight, first_edge: EdgeId) {
    result.insert_or_merge(hub, (dist, first_edge), |old, new| {
        if new.0 < old.0 {
            *old = new;
        }
    });
}

fn label_iter(entries: &[LabelEntry]) -> impl Iterator<Item = (NodeId, Weight)> + '_ {
    entries.iter().map(|entry| (entry.hub, entry.dist))
}

impl<'a> HubLabelBuilder<'a> {
    /// Nodes with a rank below `hl_level` are skipped entirely and handled by
    /// the query engine's fallback search.
    pub fn new(graph: &'a DynamicGraph, order: &'a NodeOrder, hl_level: Rank) -> HubLabelBuilder<'a> {
        assert_eq!(order.len(), graph.num_nodes());
        HubLabelBuilder { graph, order, hl_level }
    }

    /// Compute the pruned label of every node at or above the level
    /// threshold. Slot `v` of the result holds the hub-sorted label of node
    /// `v`, empty for skipped nodes.
    pub fn compute(&self) -> Vec<Vec<LabelEntry>> {
        let n = self.graph.num_nodes();
        let mut labels: Vec<Vec<LabelEntry>> = vec![Vec::new(); n];

        let from_level = (self.hl_level as usize).min(n);
        let by_descending_rank: Vec<NodeId> = self.order.order()[from_level..].iter().rev().copied().collect();

        for batch in by_descending_rank.chunks(BATCH_SIZE) {
            let labels_ref = &labels;
            let computed: Vec<(NodeId, Vec<LabelEntry>)> = batch
                .par_iter()
                .map_init(
                    || SearchScratch::new(n),
                    |scratch, &node| (node, self.label(node, scratch, labels_ref)),
                )
                .collect();

            for (node, label) in computed {
                labels[node as usize] = label;
            }
        }

        labels
    }

    fn label(&self, node: NodeId, scratch: &mut SearchScratch, labels: &[Vec<LabelEntry>]) -> Vec<LabelEntry> {
        scratch.reset();
        scratch.distances[node as usize] = 0;
        scratch.raw_queue.push(State { distance: 0, node });

        loop {
            let take_raw = match (scratch.raw_queue.peek(), scratch.labeled_queue.peek()) {
                (Some(raw), Some(labeled)) => raw <= labeled,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };

            if take_raw {
                let State { node: x, distance } = scratch.raw_queue.pop().unwrap();
                if x != node {
                    insert_min(&mut scratch.result, x, distance, scratch.first_edges[x as usize]);
                }

                for &edge in self.graph.all_neighbors(x) {
                    let y = self.graph.head(edge);
                    if self.order.rank(y) < self.order.rank(x) {
                        continue;
                    }
                    let next_distance = distance + self.graph.weight(edge);
                    if next_distance < scratch.distances[y as usize] {
                        scratch.distances[y as usize] = next_distance;
                        scratch.first_edges[y as usize] = if x == node { edge } else { scratch.first_edges[x as usize] };
                        let state = State {
                            distance: next_distance,
                            node: y,
                        };
                        let queue = if labels[y as usize].is_empty() {
                            &mut scratch.raw_queue
                        } else {
                            &mut scratch.labeled_queue
                        };
                        if queue.contains(y) {
                            queue.decrease_key(state);
                        } else {
                            queue.push(state);
                        }
                    }
                }
            } else {
                // a labeled node: merge its finished label, do not search past it
                let State { node: hub, distance } = scratch.labeled_queue.pop().unwrap();
                let first_edge = scratch.first_edges[hub as usize];
                insert_min(&mut scratch.result, hub, distance, first_edge);
                for entry in &labels[hub as usize] {
                    if entry.hub == hub {
                        continue;
                    }
                    insert_min(&mut scratch.result, entry.hub, distance + entry.dist, first_edge);
                }
            }
        }

        let mut full: Vec<LabelEntry> = scratch
            .result
            .iter()
            .map(|(hub, &(dist, first_edge))| LabelEntry {
                hub,
                dist,
                first_edge: InRangeOption::some(first_edge),
            })
            .collect();

        let position = full
            .binary_search_by_key(&node, |entry| entry.hub)
            .expect_err("upward search reached its own origin");
        full.insert(
            position,
            LabelEntry {
                hub: node,
                dist: 0,
                first_edge: InRangeOption::new(None),
            },
        );

        // redundancy pruning: a hub is dropped when the two sided label
        // intersection routes towards it through some other hub at an equal
        // or smaller distance
        full.iter()
            .copied()
            .filter(|&entry| {
                if entry.hub == node {
                    return true;
                }
                let other = &labels[entry.hub as usize];
                if other.is_empty() {
                    return true;
                }
                match best_common_hub(label_iter(&full), label_iter(other)) {
                    Some((via, _)) => via == entry.hub,
                    None => true,
                }
            })
            .collect()
    }
}
