//! Sorted dynamic arrays used as compact per-query maps.
//!
//! Label searches touch a tiny, unpredictable subset of a graph with millions
//! of nodes, so dense scratch arrays per search are wasteful. These maps keep
//! parallel arrays sorted by node id instead: lookup is a binary search
//! (`O(log k)` for `k` contained keys), insertion shifts the tail (`O(k)`),
//! iteration is a linear scan in id order - which is exactly the order label
//! entries must end up in. For the small key sets of a single search this
//! beats a hash map through cache locality and the free sorted iteration;
//! swap in a hash map here if profiling ever says otherwise.

use super::graph::NodeId;

/// A map from node ids to values backed by two parallel sorted arrays.
#[derive(Debug, Clone)]
pub struct SortedIndexMap<V> {
    keys: Vec<NodeId>,
    values: Vec<V>,
}

impl<V> SortedIndexMap<V> {
    pub fn new() -> SortedIndexMap<V> {
        SortedIndexMap { keys: Vec::new(), values: Vec::new() }
    }

    /// Pre-size the backing arrays for an expected number of entries.
    pub fn with_capacity(capacity: usize) -> SortedIndexMap<V> {
        SortedIndexMap {
            keys: Vec::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
        self.values.clear();
    }

    /// The slot of `key`, or the slot it would have to be inserted at.
    pub fn index_of(&self, key: NodeId) -> Result<usize, usize> {
        self.keys.binary_search(&key)
    }

    pub fn get(&self, key: NodeId) -> Option<&V> {
        self.index_of(key).ok().map(|index| &self.values[index])
    }

    pub fn key_at(&self, index: usize) -> NodeId {
        self.keys[index]
    }

    pub fn value_at(&self, index: usize) -> &V {
        &self.values[index]
    }

    /// Insert `value` at `index`, which must be the slot reported by `index_of`.
    pub fn insert_at(&mut self, index: usize, key: NodeId, value: V) {
        debug_assert!(index == 0 || self.keys[index - 1] < key);
        debug_assert!(index == self.keys.len() || key < self.keys[index]);
        self.keys.insert(index, key);
        self.values.insert(index, value);
    }

    pub fn remove_at(&mut self, index: usize) -> (NodeId, V) {
        (self.keys.remove(index), self.values.remove(index))
    }

    /// Insert the value for a missing key, or update the present one through `merge`.
    pub fn insert_or_merge(&mut self, key: NodeId, value: V, merge: impl FnOnce(&mut V, V)) {
        match self.index_of(key) {
            Ok(index) => merge(&mut self.values[index], value),
            Err(index) => self.insert_at(index, key, value),
        }
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &V)> {
        self.keys.iter().copied().zip(self.values.iter())
    }
}

impl<V> Default for SortedIndexMap<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// The membership-only sibling of `SortedIndexMap`.
#[derive(Debug, Clone, Default)]
pub struct SortedIdSet {
    keys: Vec<NodeId>,
}

impl SortedIdSet {
    pub fn new() -> SortedIdSet {
        SortedIdSet { keys: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> SortedIdSet {
        SortedIdSet { keys: Vec::with_capacity(capacity) }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn clear(&mut self) {
        self.keys.clear();
    }

    pub fn contains(&self, key: NodeId) -> bool {
        self.keys.binary_search(&key).is_ok()
    }

    /// Insert `key`; returns false if it was already contained.
    pub fn insert(&mut self, key: NodeId) -> bool {
        match self.keys.binary_search(&key) {
            Ok(_) => false,
            Err(index) => {
                self.keys.insert(index, key);
                true
            }
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.keys.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_entries_sorted() {
        let mut map = SortedIndexMap::new();
        for key in [5, 1, 9, 3] {
            let index = map.index_of(key).unwrap_err();
            map.insert_at(index, key, key * 10);
        }

        assert_eq!(map.len(), 4);
        assert_eq!(map.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec![1, 3, 5, 9]);
        assert_eq!(map.get(9), Some(&90));
        assert_eq!(map.get(2), None);
    }

    #[test]
    fn insert_or_merge_keeps_minimum() {
        let mut map = SortedIndexMap::new();
        map.insert_or_merge(7, 30u32, |old, new| *old = (*old).min(new));
        map.insert_or_merge(7, 20, |old, new| *old = (*old).min(new));
        map.insert_or_merge(7, 25, |old, new| *old = (*old).min(new));

        assert_eq!(map.get(7), Some(&20));
        assert_eq!(map.len(), 1);
    }

    #[test]
    fn remove_at_shifts_tail() {
        let mut map = SortedIndexMap::new();
        for key in [1, 2, 3] {
            let index = map.index_of(key).unwrap_err();
            map.insert_at(index, key, key);
        }
        assert_eq!(map.remove_at(1), (2, 2));
        assert_eq!(map.iter().map(|(k, _)| k).collect::<Vec<_>>(), vec![1, 3]);
    }

    #[test]
    fn id_set_membership() {
        let mut set = SortedIdSet::new();
        assert!(set.insert(4));
        assert!(set.insert(2));
        assert!(!set.insert(4));
        assert!(set.contains(2));
        assert!(!set.contains(3));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![2, 4]);
    }
}
