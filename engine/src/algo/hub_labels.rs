//! Hub labeling on top of the contraction hierarchy.
//!
//! A label is a per-node table of (hub, exact upward distance, first edge
//! towards the hub) triples. Two labels answer a query by a merge scan over
//! their common hubs. Construction, the frozen store and the query engine
//! live in the submodules.

use super::*;
use crate::in_range_option::InRangeOption;
use std::{error::Error, fmt, fmt::Display};

pub mod builder;
pub mod query;
pub mod store;

pub use builder::HubLabelBuilder;
pub use query::Server;
pub use store::LabelStore;

/// A single label entry: the exact distance from the owning node to `hub`
/// when moving to equal-or-higher ranks only, plus the first edge of such a
/// path. The self entry carries no edge.
#[derive(Debug, Clone, Copy)]
pub struct LabelEntry {
    pub hub: NodeId,
    pub dist: Weight,
    pub first_edge: InRangeOption<EdgeId>,
}

/// A label store that contradicts itself during path reconstruction.
/// Queries surface this instead of returning a plausible-looking wrong path;
/// the only fix is to re-run preprocessing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CorruptLabels(pub &'static str);

impl Display for CorruptLabels {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "corrupt hub labels: {}", self.0)
    }
}

impl Error for CorruptLabels {}

/// Merge scan over two hub-sorted label iterators. Returns the hub
/// minimizing the summed distance together with that sum; on ties the
/// smallest hub id wins.
pub fn best_common_hub(
    forward: impl Iterator<Item = (NodeId, Weight)>,
    backward: impl Iterator<Item = (NodeId, Weight)>,
) -> Option<(NodeId, Weight)> {
    let mut forward = forward.peekable();
    let mut backward = backward.peekable();

    let mut result: Option<(NodeId, Weight)> = None;

    while let (Some(&(forward_hub, forward_dist)), Some(&(backward_hub, backward_dist))) = (forward.peek(), backward.peek()) {
        if forward_hub < backward_hub {
            forward.next();
        } else if backward_hub < forward_hub {
            backward.next();
        } else {
            let dist = forward_dist + backward_dist;
            if result.map(|(_, best)| dist < best).unwrap_or(true) {
                result = Some((forward_hub, dist));
            }
            forward.next();
            backward.next();
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_scan_picks_cheapest_common_hub() {
        let forward = [(1, 4), (3, 1), (7, 10)];
        let backward = [(2, 1), (3, 2), (7, 1)];
        assert_eq!(
            best_common_hub(forward.iter().copied(), backward.iter().copied()),
            Some((3, 3))
        );
    }

    #[test]
    fn merge_scan_without_common_hub() {
        let forward = [(1, 4), (3, 1)];
        let backward = [(2, 1), (4, 2)];
        assert_eq!(best_common_hub(forward.iter().copied(), backward.iter().copied()), None);
    }

    #[test]
    fn merge_scan_tie_prefers_smaller_hub() {
        let forward = [(2, 2), (5, 1)];
        let backward = [(2, 2), (5, 3)];
        assert_eq!(best_common_hub(forward.iter().copied(), backward.iter().copied()), Some((2, 4)));
    }
}
