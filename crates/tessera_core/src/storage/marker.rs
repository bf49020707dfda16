//! # Marker Storage
//!
//! Presence-only storage for flag components. Only the occupancy bitset is
//! kept; inserted values are dropped and every accessor returns one shared
//! instance.

use std::borrow::Cow;
use std::ops::{Index, IndexMut};

use super::Storage;
use crate::bitset::BitSet;
use crate::config::CoreConfig;

/// Tag storage for zero-size marker components.
///
/// # Example
///
/// ```rust
/// use tessera_core::{MarkerStorage, Storage};
///
/// #[derive(Default)]
/// struct Frozen;
///
/// let mut frozen: MarkerStorage<Frozen> = MarkerStorage::new();
/// frozen.insert(2, Frozen);
/// assert!(frozen.contains(2));
/// ```
#[derive(Clone, Debug)]
pub struct MarkerStorage<C> {
    /// Occupancy ledger.
    mask: BitSet,
    /// Number of tagged slots.
    count: usize,
    /// Instance handed out by every accessor.
    marker: C,
}

impl<C: Default> MarkerStorage<C> {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            mask: BitSet::new(),
            count: 0,
            marker: C::default(),
        }
    }

    /// Creates an empty storage with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            mask: BitSet::with_capacity(capacity),
            count: 0,
            marker: C::default(),
        }
    }

    /// Creates an empty storage sized from `config`.
    #[must_use]
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::with_capacity(config.initial_components)
    }
}

impl<C> MarkerStorage<C> {
    /// Tags `index` without constructing a value.
    pub fn mark(&mut self, index: usize) {
        if !self.mask.test(index) {
            self.mask.set(index, true);
            self.count += 1;
        }
    }

    /// Removes every tag.
    pub fn clear(&mut self) {
        self.mask.clear();
        self.count = 0;
    }
}

impl<C: Default> Default for MarkerStorage<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> Storage for MarkerStorage<C> {
    type Component = C;

    #[inline]
    fn contains(&self, index: usize) -> bool {
        self.mask.test(index)
    }

    fn insert(&mut self, index: usize, _component: C) -> &mut C {
        self.mark(index);
        &mut self.marker
    }

    fn erase(&mut self, index: usize) -> bool {
        if !self.mask.test(index) {
            return false;
        }
        self.mask.set(index, false);
        self.count -= 1;
        true
    }

    #[inline]
    fn occupancy(&self) -> Cow<'_, BitSet> {
        Cow::Borrowed(&self.mask)
    }

    /// Returns the shared marker. Never panics.
    #[inline]
    fn slot(&self, _index: usize) -> &C {
        &self.marker
    }

    /// Returns the shared marker. Never panics.
    #[inline]
    fn slot_mut(&mut self, _index: usize) -> &mut C {
        &mut self.marker
    }

    #[inline]
    fn len(&self) -> usize {
        self.count
    }
}

impl<C: 'static> Index<usize> for MarkerStorage<C> {
    type Output = C;

    fn index(&self, index: usize) -> &C {
        self.slot(index)
    }
}

impl<C: 'static> IndexMut<usize> for MarkerStorage<C> {
    fn index_mut(&mut self, index: usize) -> &mut C {
        self.slot_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Frozen;

    #[test]
    fn test_marker_contract() {
        let mut storage: MarkerStorage<Frozen> = MarkerStorage::new();
        assert!(matches!(
            storage.at(1),
            Err(CoreError::ComponentAbsent { index: 1, .. })
        ));

        storage.insert(1, Frozen);
        storage.insert(1, Frozen);
        storage.mark(64);
        assert_eq!(storage.len(), 2);
        assert_eq!(storage.at(1), Ok(&Frozen));
        assert_eq!(storage.indices().collect::<Vec<_>>(), vec![1, 64]);

        assert!(storage.erase(1));
        assert!(!storage.erase(1));
        assert_eq!(storage.len(), 1);

        storage.clear();
        assert!(storage.is_empty());
    }

    #[test]
    fn test_unchecked_access_never_panics() {
        let storage: MarkerStorage<Frozen> = MarkerStorage::default();
        assert_eq!(storage[123_456], Frozen);
    }

    #[test]
    fn test_no_payload() {
        assert_eq!(
            std::mem::size_of::<MarkerStorage<Frozen>>(),
            std::mem::size_of::<BitSet>() + std::mem::size_of::<usize>()
        );
    }
}
