//! # Map Storage
//!
//! Associative storage keyed by slot index. Memory follows the number of
//! components, not the highest slot index, so it suits components that only
//! a small fraction of entities carry.

use std::any::type_name;
use std::borrow::Cow;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::ops::{Index, IndexMut};

use super::Storage;
use crate::bitset::BitSet;
use crate::config::CoreConfig;

/// Sparse storage backed by a hash map.
///
/// There is no default slot to fall back on, so unchecked access always
/// looks the key up and panics on a miss.
#[derive(Clone, Debug)]
pub struct MapStorage<C> {
    components: HashMap<usize, C>,
}

impl<C> MapStorage<C> {
    /// Creates an empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self {
            components: HashMap::new(),
        }
    }

    /// Creates an empty storage with room for `capacity` components.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            components: HashMap::with_capacity(capacity),
        }
    }

    /// Creates an empty storage sized from `config`.
    ///
    /// Reserves a tenth of the configured component slots: map storage is
    /// meant for sparse populations.
    #[must_use]
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::with_capacity(config.initial_components / 10)
    }

    /// Iterates stored components in unspecified order.
    ///
    /// Use [`Storage::indices`] for ascending order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &C)> {
        self.components.iter().map(|(index, component)| (*index, component))
    }

    /// Iterates stored components mutably in unspecified order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut C)> {
        self.components
            .iter_mut()
            .map(|(index, component)| (*index, component))
    }

    /// Removes every component.
    pub fn clear(&mut self) {
        self.components.clear();
    }
}

impl<C> Default for MapStorage<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: 'static> Storage for MapStorage<C> {
    type Component = C;

    #[inline]
    fn contains(&self, index: usize) -> bool {
        self.components.contains_key(&index)
    }

    fn insert(&mut self, index: usize, component: C) -> &mut C {
        match self.components.entry(index) {
            Entry::Occupied(mut entry) => {
                entry.insert(component);
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(component),
        }
    }

    fn erase(&mut self, index: usize) -> bool {
        self.components.remove(&index).is_some()
    }

    fn occupancy(&self) -> Cow<'_, BitSet> {
        Cow::Owned(self.components.keys().copied().collect())
    }

    /// Looks the component up.
    ///
    /// # Panics
    ///
    /// Panics if `index` holds no component.
    fn slot(&self, index: usize) -> &C {
        match self.components.get(&index) {
            Some(component) => component,
            None => panic!("entity {index} has no {} component", type_name::<C>()),
        }
    }

    /// Looks the component up mutably.
    ///
    /// # Panics
    ///
    /// Panics if `index` holds no component.
    fn slot_mut(&mut self, index: usize) -> &mut C {
        match self.components.get_mut(&index) {
            Some(component) => component,
            None => panic!("entity {index} has no {} component", type_name::<C>()),
        }
    }

    #[inline]
    fn len(&self) -> usize {
        self.components.len()
    }
}

impl<C: 'static> Index<usize> for MapStorage<C> {
    type Output = C;

    fn index(&self, index: usize) -> &C {
        self.slot(index)
    }
}

impl<C: 'static> IndexMut<usize> for MapStorage<C> {
    fn index_mut(&mut self, index: usize) -> &mut C {
        self.slot_mut(index)
    }
}
