//! # Queries
//!
//! Iterate the entities whose slots satisfy a component-presence predicate:
//!
//! ```text
//! matching = AND(required occupancy) − OR(excluded occupancy) [AND liveness]
//! ```
//!
//! Every evaluation recomputes the mask from the storages, so nothing is
//! cached between calls. Indices come out in ascending order, which keeps
//! simulation steps reproducible.
//!
//! A query holds `&` or `&mut` borrows of every storage it touches, so no
//! storage can be structurally changed while a query over it is alive.

use std::borrow::Cow;

use super::entities::Entities;
use crate::bitset::{BitSet, IntoOnes};
use crate::storage::Storage;

/// Storages a query reads components from.
///
/// Implemented for `&S`, `&mut S` (any [`Storage`]) and tuples of those.
pub trait QueryData {
    /// Components fetched for one index.
    type Item<'a>
    where
        Self: 'a;

    /// Pushes the occupancy of every member storage.
    fn collect_occupancy<'s>(&'s self, out: &mut Vec<Cow<'s, BitSet>>);

    /// Fetches the components at `index` without occupancy checks.
    fn fetch(&mut self, index: usize) -> Self::Item<'_>;
}

/// [`QueryData`] whose members are all shared borrows.
pub trait ReadOnlyQueryData: QueryData {
    /// Fetches the components at `index` through a shared borrow.
    fn fetch_shared(&self, index: usize) -> Self::Item<'_>;
}

impl<S: Storage> QueryData for &S {
    type Item<'a> = &'a S::Component where Self: 'a;

    fn collect_occupancy<'s>(&'s self, out: &mut Vec<Cow<'s, BitSet>>) {
        out.push((**self).occupancy());
    }

    #[inline]
    fn fetch(&mut self, index: usize) -> Self::Item<'_> {
        (**self).slot(index)
    }
}

impl<S: Storage> ReadOnlyQueryData for &S {
    #[inline]
    fn fetch_shared(&self, index: usize) -> Self::Item<'_> {
        (**self).slot(index)
    }
}

impl<S: Storage> QueryData for &mut S {
    type Item<'a> = &'a mut S::Component where Self: 'a;

    fn collect_occupancy<'s>(&'s self, out: &mut Vec<Cow<'s, BitSet>>) {
        out.push((**self).occupancy());
    }

    #[inline]
    fn fetch(&mut self, index: usize) -> Self::Item<'_> {
        (**self).slot_mut(index)
    }
}

impl QueryData for () {
    type Item<'a> = ();

    fn collect_occupancy<'s>(&'s self, _out: &mut Vec<Cow<'s, BitSet>>) {}

    fn fetch(&mut self, _index: usize) -> Self::Item<'_> {}
}

impl ReadOnlyQueryData for () {
    fn fetch_shared(&self, _index: usize) -> Self::Item<'_> {}
}

macro_rules! impl_query_data_tuple {
    ($($name:ident : $field:tt),+) => {
        impl<$($name: QueryData),+> QueryData for ($($name,)+) {
            type Item<'a> = ($($name::Item<'a>,)+) where Self: 'a;

            fn collect_occupancy<'s>(&'s self, out: &mut Vec<Cow<'s, BitSet>>) {
                $(self.$field.collect_occupancy(out);)+
            }

            #[inline]
            fn fetch(&mut self, index: usize) -> Self::Item<'_> {
                ($(self.$field.fetch(index),)+)
            }
        }

        impl<$($name: ReadOnlyQueryData),+> ReadOnlyQueryData for ($($name,)+) {
            #[inline]
            fn fetch_shared(&self, index: usize) -> Self::Item<'_> {
                ($(self.$field.fetch_shared(index),)+)
            }
        }
    };
}

impl_query_data_tuple!(A: 0);
impl_query_data_tuple!(A: 0, B: 1);
impl_query_data_tuple!(A: 0, B: 1, C: 2);
impl_query_data_tuple!(A: 0, B: 1, C: 2, D: 3);
impl_query_data_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4);
impl_query_data_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
impl_query_data_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6);
impl_query_data_tuple!(A: 0, B: 1, C: 2, D: 3, E: 4, F: 5, G: 6, H: 7);

/// Predicate over required and excluded storages.
///
/// # Example
///
/// ```rust
/// use tessera_core::{Entities, MarkerStorage, Query, Storage, VecStorage};
///
/// #[derive(Default)]
/// struct Frozen;
///
/// let mut entities = Entities::new();
/// let mut positions: VecStorage<i32> = VecStorage::new();
/// let mut velocities: VecStorage<i32> = VecStorage::new();
/// let mut frozen: MarkerStorage<Frozen> = MarkerStorage::new();
///
/// for i in 0..4 {
///     let e = entities.create(true);
///     positions.insert(e.slot(), 0);
///     velocities.insert(e.slot(), i);
/// }
/// frozen.insert(2, Frozen);
///
/// let mut query = Query::new((&mut positions, &velocities))
///     .without(&frozen)
///     .alive(&entities);
/// let mut moving = query.iter_mut();
/// while let Some((_, (position, velocity))) = moving.next() {
///     *position += *velocity;
/// }
///
/// assert_eq!(positions[3], 3);
/// assert_eq!(positions[2], 0);
/// ```
pub struct Query<'q, D: QueryData> {
    data: D,
    excluded: Vec<Cow<'q, BitSet>>,
    alive: Option<&'q BitSet>,
}

impl<'q, D: QueryData> Query<'q, D> {
    /// Creates a query over the `required` storages.
    pub fn new(required: D) -> Self {
        Self {
            data: required,
            excluded: Vec::new(),
            alive: None,
        }
    }

    /// Excludes slots that hold a component in `storage`.
    #[must_use]
    pub fn without<S: Storage>(mut self, storage: &'q S) -> Self {
        self.excluded.push(storage.occupancy());
        self
    }

    /// Restricts the query to slots alive in `entities`.
    #[must_use]
    pub fn alive(mut self, entities: &'q Entities) -> Self {
        self.alive = Some(entities.alive_mask());
        self
    }

    /// Computes a fresh matching mask.
    ///
    /// Without required storages the base set is the liveness mask, or
    /// nothing when no registry was given.
    #[must_use]
    pub fn matching(&self) -> BitSet {
        let mut required = Vec::new();
        self.data.collect_occupancy(&mut required);
        let mut required = required.into_iter();

        let mut mask = match (required.next(), self.alive) {
            (Some(first), _) => first.into_owned(),
            (None, Some(alive)) => alive.clone(),
            (None, None) => return BitSet::new(),
        };
        for occupancy in required {
            mask &= occupancy.as_ref();
        }
        for occupancy in &self.excluded {
            mask -= occupancy.as_ref();
        }
        if let Some(alive) = self.alive {
            mask &= alive;
        }
        mask
    }

    /// Lazily yields matching slot indices in ascending order.
    #[must_use]
    pub fn indices(&self) -> IntoOnes {
        self.matching().into_iter()
    }

    /// Number of matching slots.
    #[must_use]
    pub fn count(&self) -> usize {
        self.matching().count_ones()
    }

    /// Walks matches with mutable access to `&mut` members.
    pub fn iter_mut(&mut self) -> QueryIterMut<'_, D> {
        QueryIterMut {
            indices: self.indices(),
            data: &mut self.data,
        }
    }
}

impl<'q, D: ReadOnlyQueryData> Query<'q, D> {
    /// Iterates matches with their components.
    #[must_use]
    pub fn iter(&self) -> QueryIter<'_, D> {
        QueryIter {
            indices: self.indices(),
            data: &self.data,
        }
    }
}

/// Iterator over a read-only query. See [`Query::iter`].
pub struct QueryIter<'a, D> {
    indices: IntoOnes,
    data: &'a D,
}

impl<'a, D: ReadOnlyQueryData + 'a> Iterator for QueryIter<'a, D> {
    type Item = (usize, D::Item<'a>);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        let index = self.indices.next()?;
        Some((index, self.data.fetch_shared(index)))
    }
}

/// Lending walk over a query with mutable members. See [`Query::iter_mut`].
///
/// Each item borrows the walker, so use `while let Some(..) = walk.next()`.
pub struct QueryIterMut<'a, D> {
    indices: IntoOnes,
    data: &'a mut D,
}

impl<'a, D: QueryData> QueryIterMut<'a, D> {
    /// Advances to the next match.
    #[allow(clippy::should_implement_trait)]
    pub fn next(&mut self) -> Option<(usize, D::Item<'_>)> {
        let index = self.indices.next()?;
        Some((index, self.data.fetch(index)))
    }
}
