//! # Dense Storage
//!
//! Index-addressed component array with an occupancy bitset.
//!
//! The slot index directly addresses the payload array, which grows on
//! demand. Vacant slots hold `C::default()` (or, for slots never reached,
//! nothing at all).

use std::borrow::Cow;
use std::ops::{Index, IndexMut};

use super::Storage;
use crate::bitset::BitSet;
use crate::config::CoreConfig;

/// Dense storage for components attached to most entities.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Storage, VecStorage};
///
/// let mut positions: VecStorage<(f32, f32)> = VecStorage::new();
/// positions.insert(4, (1.0, 2.0));
/// assert_eq!(positions[4], (1.0, 2.0));
/// assert!(!positions.contains(3));
/// ```
#[derive(Clone, Debug)]
pub struct VecStorage<C> {
    /// Payload array, addressed by slot index.
    data: Vec<C>,
    /// Occupancy ledger.
    mask: BitSet,
    /// Number of occupied slots.
    count: usize,
}

impl<C: Default> VecStorage<C> {
    /// Creates an empty storage.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            data: Vec::new(),
            mask: BitSet::new(),
            count: 0,
        }
    }

    /// Creates an empty storage with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: Vec::with_capacity(capacity),
            mask: BitSet::with_capacity(capacity),
            count: 0,
        }
    }

    /// Creates an empty storage sized from `config`.
    #[must_use]
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::with_capacity(config.initial_components)
    }

    /// Iterates occupied slots in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &C)> {
        self.mask
            .iter_ones()
            .filter_map(|index| self.data.get(index).map(|component| (index, component)))
    }

    /// Iterates occupied slots mutably in ascending index order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = (usize, &mut C)> {
        let mask = &self.mask;
        self.data
            .iter_mut()
            .enumerate()
            .filter(move |(index, _)| mask.test(*index))
    }

    /// Erases every component, keeping the allocated array.
    pub fn clear(&mut self) {
        for index in self.mask.iter_ones() {
            if let Some(slot) = self.data.get_mut(index) {
                *slot = C::default();
            }
        }
        self.mask.clear();
        self.count = 0;
    }
}

impl<C: Default> Default for VecStorage<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Default + 'static> Storage for VecStorage<C> {
    type Component = C;

    #[inline]
    fn contains(&self, index: usize) -> bool {
        self.mask.test(index)
    }

    fn insert(&mut self, index: usize, component: C) -> &mut C {
        if index >= self.data.len() {
            self.data.resize_with(index + 1, C::default);
        }
        if !self.mask.test(index) {
            self.mask.set(index, true);
            self.count += 1;
        }
        let slot = &mut self.data[index];
        *slot = component;
        slot
    }

    fn erase(&mut self, index: usize) -> bool {
        if !self.mask.test(index) {
            return false;
        }
        self.mask.set(index, false);
        self.data[index] = C::default();
        self.count -= 1;
        true
    }

    #[inline]
    fn occupancy(&self) -> Cow<'_, BitSet> {
        Cow::Borrowed(&self.mask)
    }

    /// Returns the array slot at `index` without an occupancy check.
    ///
    /// A vacant slot inside the array yields its default value.
    ///
    /// # Panics
    ///
    /// Panics if `index` was never reached by an insert.
    #[inline]
    fn slot(&self, index: usize) -> &C {
        &self.data[index]
    }

    /// Mutable counterpart of [`slot`](Storage::slot).
    ///
    /// # Panics
    ///
    /// Panics if `index` was never reached by an insert.
    #[inline]
    fn slot_mut(&mut self, index: usize) -> &mut C {
        &mut self.data[index]
    }

    #[inline]
    fn len(&self) -> usize {
        self.count
    }
}

impl<C: Default + 'static> Index<usize> for VecStorage<C> {
    type Output = C;

    fn index(&self, index: usize) -> &C {
        self.slot(index)
    }
}

impl<C: Default + 'static> IndexMut<usize> for VecStorage<C> {
    fn index_mut(&mut self, index: usize) -> &mut C {
        self.slot_mut(index)
    }
}
