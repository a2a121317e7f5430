//! The hub label query engine.
//!
//! A query intersects the two endpoint labels for the best common hub, then
//! rebuilds the concrete node path by walking first-edge pointers towards
//! that hub on both sides and unpacking shortcuts with an explicit stack.
//! Endpoints below the label level own no stored label; for those the engine
//! materializes a temporary label on the fly with the same constrained
//! search the builder uses, never persisting it.
//!
//! All scratch state is owned by the server instance and reset at the start
//! of every `route` call, so results never leak between queries. A server
//! must not be shared between threads without external locking; use one
//! instance per thread instead.

use super::store::StoredLabel;
use super::*;
use crate::algo::{Query, RoutingResult};
use crate::datastr::{distance_heap::*, sorted_index_map::SortedIndexMap, timestamped_vector::TimestampedVector};
use crate::report::benchmark::measure;

/// How a temporary label entry learned about its hub.
#[derive(Debug, Clone, Copy, PartialEq)]
enum FirstHop {
    /// The entry is the search origin itself.
    Origin,
    /// Settled by the raw upward search through this predecessor edge.
    Settled(EdgeId),
    /// Merged in from this labeled node's stored label.
    ViaHub(NodeId),
}

type TempLabel = SortedIndexMap<(Weight, FirstHop)>;

pub struct Server {
    store: LabelStore,
    // per-query scratch, reset at the start of every route call
    raw_queue: DistanceHeap,
    labeled_queue: DistanceHeap,
    distances: TimestampedVector<Weight>,
    pred_edges: Vec<EdgeId>,
    forward_label: TempLabel,
    backward_label: TempLabel,
    unpack_stack: Vec<EdgeId>,
}

impl Server {
    pub fn new(store: LabelStore) -> Server {
        let n = store.num_nodes();
        Server {
            store,
            raw_queue: DistanceHeap::new(n),
            labeled_queue: DistanceHeap::new(n),
            distances: TimestampedVector::new(n, INFINITY),
            pred_edges: vec![0; n],
            forward_label: TempLabel::new(),
            backward_label: TempLabel::new(),
            unpack_stack: Vec::new(),
        }
    }

    pub fn store(&self) -> &LabelStore {
        &self.store
    }

    /// Answer a point-to-point query with the exact distance and a concrete
    /// node path. An unreachable pair yields an empty result; a label store
    /// contradicting itself yields `CorruptLabels` instead of a wrong path.
    pub fn route(&mut self, query: Query) -> Result<RoutingResult, CorruptLabels> {
        let (result, time) = measure(|| self.route_internal(query));
        result.map(|(path, distance)| RoutingResult {
            path,
            distance,
            time_ms: time.as_secs_f64() * 1000.0,
        })
    }

    fn route_internal(&mut self, Query { from, to }: Query) -> Result<(Vec<NodeId>, Option<Weight>), CorruptLabels> {
        assert!((from as usize) < self.store.num_nodes());
        assert!((to as usize) < self.store.num_nodes());

        if from == to {
            return Ok((vec![from], Some(0)));
        }

        self.forward_label.clear();
        self.backward_label.clear();

        let from_labeled = self.store.has_label(from);
        let to_labeled = self.store.has_label(to);

        // endpoints without a stored label get a temporary one per query
        if !from_labeled {
            self.materialize_label(from, true);
        }
        if !to_labeled {
            self.materialize_label(to, false);
        }

        let best = match (from_labeled, to_labeled) {
            (true, true) => best_common_hub(self.store.label(from).iter(), self.store.label(to).iter()),
            (true, false) => best_common_hub(self.store.label(from).iter(), temp_iter(&self.backward_label)),
            (false, true) => best_common_hub(temp_iter(&self.forward_label), self.store.label(to).iter()),
            (false, false) => best_common_hub(temp_iter(&self.forward_label), temp_iter(&self.backward_label)),
        };

        let (meeting_hub, distance) = match best {
            Some(best) => best,
            None => return Ok((Vec::new(), None)),
        };

        let left_edges = if from_labeled {
            self.walk_stored_from(from, meeting_hub)?
        } else {
            self.walk_temp(&self.forward_label, meeting_hub)?
        };
        let right_edges = if to_labeled {
            self.walk_stored_from(to, meeting_hub)?
        } else {
            self.walk_temp(&self.backward_label, meeting_hub)?
        };

        let mut path = vec![from];
        for &edge in &left_edges {
            self.unpack_edge(edge, &mut path);
        }
        let mut right_path = vec![to];
        for &edge in &right_edges {
            self.unpack_edge(edge, &mut right_path);
        }

        // both sides end at the meeting hub; splice the right side in reverse
        debug_assert_eq!(path.last(), right_path.last());
        right_path.pop();
        path.extend(right_path.into_iter().rev());

        Ok((path, Some(distance)))
    }

    /// The constrained upward search of the label builder, run on the fly.
    /// Results go to the forward or backward temporary label.
    fn materialize_label(&mut self, source: NodeId, forward: bool) {
        let Server {
            store,
            raw_queue,
            labeled_queue,
            distances,
            pred_edges,
            forward_label,
            backward_label,
            ..
        } = self;
        let result = if forward { forward_label } else { backward_label };

        raw_queue.clear();
        labeled_queue.clear();
        distances.reset();

        distances[source as usize] = 0;
        insert_min(result, source, 0, FirstHop::Origin);
        raw_queue.push(State { distance: 0, node: source });

        loop {
            let take_raw = match (raw_queue.peek(), labeled_queue.peek()) {
                (Some(raw), Some(labeled)) => raw <= labeled,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (None, None) => break,
            };

            if take_raw {
                let State { node, distance } = raw_queue.pop().unwrap();
                if node != source {
                    insert_min(result, node, distance, FirstHop::Settled(pred_edges[node as usize]));
                }

                for &edge in store.edge_ids(node) {
                    let next = store.head(edge);
                    if store.rank(next) < store.rank(node) {
                        continue;
                    }
                    let next_distance = distance + store.weight(edge);
                    if next_distance < distances[next as usize] {
                        distances[next as usize] = next_distance;
                        pred_edges[next as usize] = edge;
                        let state = State {
                            distance: next_distance,
                            node: next,
                        };
                        let queue = if store.has_label(next) { &mut *labeled_queue } else { &mut *raw_queue };
                        if queue.contains(next) {
                            queue.decrease_key(state);
                        } else {
                            queue.push(state);
                        }
                    }
                }
            } else {
                // a labeled node: merge its stored label, do not search past it
                let State { node: hub, distance } = labeled_queue.pop().unwrap();
                insert_min(result, hub, distance, FirstHop::Settled(pred_edges[hub as usize]));
                let label = store.label(hub);
                for index in 0..label.len() {
                    if label.hub(index) == hub {
                        continue;
                    }
                    insert_min(result, label.hub(index), distance + label.dist(index), FirstHop::ViaHub(hub));
                }
            }
        }
    }

    /// Edge sequence from a labeled endpoint towards the meeting hub.
    fn walk_stored_from(&self, node: NodeId, hub: NodeId) -> Result<Vec<EdgeId>, CorruptLabels> {
        let label = self.store.label(node);
        let index = label.find(hub).ok_or(CorruptLabels("meeting hub vanished from a stored label"))?;
        self.walk_stored(node, hub, label.dist(index))
    }

    /// Follow first-edge pointers through stored labels until the hub is
    /// reached, keeping the running remaining distance as the invariant. A
    /// pruned-away hub entry on the way is re-routed through an intermediate
    /// hub reproducing the remaining distance exactly; only if that fails the
    /// store is declared corrupt.
    fn walk_stored(&self, node: NodeId, hub: NodeId, full_dist: Weight) -> Result<Vec<EdgeId>, CorruptLabels> {
        let mut edges = Vec::new();
        let mut cursor = node;
        let mut remaining = full_dist;
        let mut steps = 0usize;

        while cursor != hub {
            steps += 1;
            if steps > self.store.num_nodes() {
                return Err(CorruptLabels("label walk does not terminate"));
            }

            let label = self.store.label(cursor);
            let edge = match label.find(hub) {
                Some(index) if label.dist(index) == remaining => label
                    .first_edge(index)
                    .ok_or(CorruptLabels("self entry with leftover distance"))?,
                _ => self.rescue_edge(&label, hub, remaining)?,
            };

            remaining = remaining
                .checked_sub(self.store.weight(edge))
                .ok_or(CorruptLabels("label walk overshoots the hub distance"))?;
            edges.push(edge);
            cursor = self.store.head(edge);
        }

        if remaining != 0 {
            return Err(CorruptLabels("label walk reaches the hub early"));
        }
        Ok(edges)
    }

    /// Find an entry whose hub provably lies on a shortest path towards
    /// `hub`: its own distance plus the label distance between the two hubs
    /// must reproduce the remaining distance exactly.
    fn rescue_edge(&self, label: &StoredLabel, hub: NodeId, remaining: Weight) -> Result<EdgeId, CorruptLabels> {
        for index in 0..label.len() {
            let via = label.hub(index);
            if via == hub {
                continue;
            }
            let edge = match label.first_edge(index) {
                Some(edge) => edge,
                None => continue,
            };
            let to_via = label.dist(index);
            if to_via > remaining {
                continue;
            }
            if let Some((_, rest)) = best_common_hub(self.store.label(via).iter(), self.store.label(hub).iter()) {
                if to_via + rest == remaining {
                    return Ok(edge);
                }
            }
        }
        Err(CorruptLabels("no label entry continues towards the meeting hub"))
    }

    /// Edge sequence from an unlabeled endpoint towards the meeting hub,
    /// using the temporary label: predecessor edges through the raw search
    /// region, stored labels from the first labeled node onwards.
    fn walk_temp(&self, temp: &TempLabel, hub: NodeId) -> Result<Vec<EdgeId>, CorruptLabels> {
        // peel merge layers: each gives a stored segment towards its target
        let mut segments: Vec<(NodeId, NodeId)> = Vec::new();
        let mut target = hub;
        let chain_start = loop {
            let &(_, hop) = temp.get(target).ok_or(CorruptLabels("meeting hub missing from the temporary label"))?;
            match hop {
                FirstHop::ViaHub(via) => {
                    segments.push((via, target));
                    target = via;
                }
                FirstHop::Settled(edge) => break Some(edge),
                FirstHop::Origin => break None,
            }
        };

        // predecessor chain from the first settled node back to the origin
        let mut edges = Vec::new();
        if let Some(first) = chain_start {
            let mut edge = first;
            loop {
                edges.push(edge);
                let prev = self.store.tail(edge);
                match temp.get(prev) {
                    Some(&(_, FirstHop::Origin)) => break,
                    Some(&(_, FirstHop::Settled(pred))) => edge = pred,
                    _ => return Err(CorruptLabels("broken predecessor chain in the temporary label")),
                }
            }
        }
        edges.reverse();

        for &(via, segment_target) in segments.iter().rev() {
            let label = self.store.label(via);
            let index = label
                .find(segment_target)
                .ok_or(CorruptLabels("merged hub vanished from its stored label"))?;
            edges.extend(self.walk_stored(via, segment_target, label.dist(index))?);
        }

        Ok(edges)
    }

    /// Expand one hierarchy edge to the original edges it represents and
    /// append their head nodes to the path.
    fn unpack_edge(&mut self, edge: EdgeId, path: &mut Vec<NodeId>) {
        self.unpack_stack.clear();
        self.unpack_stack.push(edge);
        while let Some(edge) = self.unpack_stack.pop() {
            if let Some((first, second)) = self.store.shortcut_parts(edge) {
                self.unpack_stack.push(second);
                self.unpack_stack.push(first);
            } else {
                path.push(self.store.head(edge));
            }
        }
    }
}

fn temp_iter(temp: &TempLabel) -> impl Iterator<Item = (NodeId, Weight)> + '_ {
    temp.iter().map(|(hub, &(dist, _))| (hub, dist))
}

fn insert_min(result: &mut TempLabel, hub: NodeId, dist: Weight, hop: FirstHop) {
    result.insert_or_merge(hub, (dist, hop), |old, new| {
        if new.0 < old.0 {
            *old = new;
        }
    });
}
