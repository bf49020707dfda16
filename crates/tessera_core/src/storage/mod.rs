//! # Component Storage
//!
//! One capability contract, several backing strategies:
//!
//! | Backend | Occupancy | Access | Best for |
//! |---|---|---|---|
//! | [`VecStorage`] | bit in a growable [`BitSet`] | O(1) array index | components most entities carry |
//! | [`MapStorage`] | key lookup in a hash map | O(1) amortized lookup | components few entities carry |
//! | [`MarkerStorage`] | bit in a growable [`BitSet`] | O(1), no payload | zero-size flags |
//!
//! Storages are addressed by slot index ([`Entity::slot`]) and know nothing
//! about the registry. Killing an entity does not erase its components: the
//! owner erases them explicitly, and until then the old values linger under
//! the slot index.

mod map;
mod marker;
mod vec;

use std::any::type_name;
use std::borrow::Cow;

use crate::bitset::{BitSet, IntoOnes};
use crate::ecs::Entity;
use crate::error::{CoreError, CoreResult};

pub use map::MapStorage;
pub use marker::MarkerStorage;
pub use vec::VecStorage;

/// Capability contract every component container satisfies.
///
/// Query and entity code is generic over this trait only, never over a
/// concrete backend.
pub trait Storage {
    /// Stored component type.
    type Component: 'static;

    /// Tests whether `index` holds a component. O(1), never panics.
    fn contains(&self, index: usize) -> bool;

    /// Stores `component` at `index`, replacing any previous value.
    fn insert(&mut self, index: usize, component: Self::Component) -> &mut Self::Component;

    /// Removes the component at `index`.
    ///
    /// Returns `false` (and does nothing) if there was none.
    fn erase(&mut self, index: usize) -> bool;

    /// Returns the occupied indices as a bitset.
    ///
    /// Bitset-backed storages lend their ledger; others build one.
    fn occupancy(&self) -> Cow<'_, BitSet>;

    /// Unchecked access to the component at `index`.
    ///
    /// Callers pair this with [`contains`](Self::contains) (or a query that
    /// proved occupancy). What happens for a vacant index is
    /// backend-dependent; see each backend's `# Panics` section.
    fn slot(&self, index: usize) -> &Self::Component;

    /// Unchecked mutable access to the component at `index`.
    ///
    /// Same contract as [`slot`](Self::slot).
    fn slot_mut(&mut self, index: usize) -> &mut Self::Component;

    /// Number of occupied indices.
    fn len(&self) -> usize;

    /// Returns `true` if no index is occupied.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Checked access to the component at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ComponentAbsent`] if `index` holds no component.
    fn at(&self, index: usize) -> CoreResult<&Self::Component> {
        if !self.contains(index) {
            return Err(absent::<Self::Component>(index));
        }
        Ok(self.slot(index))
    }

    /// Checked mutable access to the component at `index`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ComponentAbsent`] if `index` holds no component.
    fn at_mut(&mut self, index: usize) -> CoreResult<&mut Self::Component> {
        if !self.contains(index) {
            return Err(absent::<Self::Component>(index));
        }
        Ok(self.slot_mut(index))
    }

    /// Returns the component at `index`, if any.
    fn get(&self, index: usize) -> Option<&Self::Component> {
        self.contains(index).then(|| self.slot(index))
    }

    /// Returns the component at `index` mutably, if any.
    fn get_mut(&mut self, index: usize) -> Option<&mut Self::Component> {
        if self.contains(index) {
            Some(self.slot_mut(index))
        } else {
            None
        }
    }

    /// Erases every index in `indices`. Returns how many were present.
    fn erase_many<I>(&mut self, indices: I) -> usize
    where
        I: IntoIterator<Item = usize>,
        Self: Sized,
    {
        indices
            .into_iter()
            .filter(|index| self.erase(*index))
            .count()
    }

    /// Erases the components of `entities`, by slot index.
    ///
    /// Generations are not checked: storages are slot-addressed.
    fn erase_entities(&mut self, entities: &[Entity]) -> usize
    where
        Self: Sized,
    {
        self.erase_many(entities.iter().map(|entity| entity.slot()))
    }

    /// Lazily enumerates occupied indices in ascending order.
    fn indices(&self) -> IntoOnes {
        self.occupancy().into_owned().into_iter()
    }
}

/// Builds the checked-access miss for component `C`.
pub(crate) fn absent<C>(index: usize) -> CoreError {
    CoreError::ComponentAbsent {
        index,
        component: type_name::<C>(),
    }
}
