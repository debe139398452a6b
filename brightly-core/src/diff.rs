//! Key-set differ.
//!
//! Classifies every key of two key spaces as added, retained or removed. The
//! same routine serves the environment level and the flag level of an
//! archive; it only needs the [`KeySpace`] capability from its inputs.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::hash::{BuildHasher, Hash};

/// Anything that exposes a set of unique keys.
pub trait KeySpace {
    type Key: Ord + Clone;

    fn space_keys(&self) -> impl Iterator<Item = &Self::Key>;

    fn has_key(&self, key: &Self::Key) -> bool;
}

impl<K: Ord + Clone, V> KeySpace for BTreeMap<K, V> {
    type Key = K;

    fn space_keys(&self) -> impl Iterator<Item = &K> {
        self.keys()
    }

    fn has_key(&self, key: &K) -> bool {
        self.contains_key(key)
    }
}

impl<K: Ord + Clone + Hash, V, S: BuildHasher> KeySpace for HashMap<K, V, S> {
    type Key = K;

    fn space_keys(&self) -> impl Iterator<Item = &K> {
        self.keys()
    }

    fn has_key(&self, key: &K) -> bool {
        self.contains_key(key)
    }
}

impl<K: Ord + Clone> KeySpace for BTreeSet<K> {
    type Key = K;

    fn space_keys(&self) -> impl Iterator<Item = &K> {
        self.iter()
    }

    fn has_key(&self, key: &K) -> bool {
        self.contains(key)
    }
}

/// Three disjoint key sets whose union is `keys(old) ∪ keys(new)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyDiff<K: Ord> {
    /// In NEW only.
    pub added: BTreeSet<K>,
    /// In both.
    pub retained: BTreeSet<K>,
    /// In OLD only.
    pub removed: BTreeSet<K>,
}

impl<K: Ord> Default for KeyDiff<K> {
    fn default() -> Self {
        Self {
            added: BTreeSet::new(),
            retained: BTreeSet::new(),
            removed: BTreeSet::new(),
        }
    }
}

impl<K: Ord> KeyDiff<K> {
    /// Every classified key exactly once.
    pub fn iter_all(&self) -> impl Iterator<Item = &K> {
        self.added
            .iter()
            .chain(self.retained.iter())
            .chain(self.removed.iter())
    }

    pub fn len(&self) -> usize {
        self.added.len() + self.retained.len() + self.removed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Compare the keys of `old` and `new`. A missing side behaves as empty.
pub fn diff_keys<M: KeySpace>(old: Option<&M>, new: Option<&M>) -> KeyDiff<M::Key> {
    let mut diff = KeyDiff::default();

    if let Some(old) = old {
        for key in old.space_keys() {
            if new.is_some_and(|new| new.has_key(key)) {
                diff.retained.insert(key.clone());
            } else {
                diff.removed.insert(key.clone());
            }
        }
    }

    if let Some(new) = new {
        for key in new.space_keys() {
            if !old.is_some_and(|old| old.has_key(key)) {
                diff.added.insert(key.clone());
            }
        }
    }

    diff
}
