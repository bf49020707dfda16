//! # Entities Registry
//!
//! Owner of identity state: one generation counter per slot ever allocated
//! and a liveness bitset. The registry knows nothing about storages.
//!
//! ## Slot lifecycle
//!
//! ```text
//! create ──► alive ──kill──► dead (generation + 1) ──create──► alive ...
//!    │
//!    └── builder ──► staging ──build──► alive
//!                       │
//!                       └──drop──► retired (generation + 1, orphan if it got components)
//! ```

use tracing::{debug, trace, warn};

use super::builder::Builder;
use super::entity::Entity;
use crate::bitset::BitSet;
use crate::config::CoreConfig;

/// Registry of entity identities.
///
/// One explicitly constructed instance is shared by reference with every
/// collaborator; dropping it invalidates every handle it issued.
///
/// # Example
///
/// ```rust
/// use tessera_core::Entities;
///
/// let mut entities = Entities::new();
/// let e0 = entities.create(true);
/// assert!(entities.kill(e0));
/// let e1 = entities.create(true);
///
/// assert_eq!(e1.index(), e0.index());
/// assert!(e1.generation() > e0.generation());
/// assert!(!entities.is_alive(e0));
/// ```
#[derive(Clone, Debug, Default)]
pub struct Entities {
    /// Current generation of every slot.
    generations: Vec<u32>,
    /// Liveness ledger, always `generations.len()` bits long.
    alive: BitSet,
    /// Slots retired by abandoned builders that still hold components.
    orphans: BitSet,
}

impl Entities {
    /// Creates an empty registry.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            generations: Vec::new(),
            alive: BitSet::new(),
            orphans: BitSet::new(),
        }
    }

    /// Creates an empty registry with room for `capacity` slots.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            generations: Vec::with_capacity(capacity),
            alive: BitSet::with_capacity(capacity),
            orphans: BitSet::new(),
        }
    }

    /// Creates an empty registry sized from `config`.
    #[must_use]
    pub fn from_config(config: &CoreConfig) -> Self {
        Self::with_capacity(config.initial_entities)
    }

    /// Allocates an entity.
    ///
    /// Reuses the lowest-index dead slot, keeping the generation it got when
    /// it was killed, or appends a new slot at generation 0. Slots holding
    /// orphaned builder components are skipped until [`maintain`](Self::maintain).
    ///
    /// # Arguments
    ///
    /// * `start_alive` - Whether the entity is alive immediately
    ///
    /// # Panics
    ///
    /// Panics if more than `u32::MAX` slots would be allocated.
    pub fn create(&mut self, start_alive: bool) -> Entity {
        let index = self.free_slot().unwrap_or_else(|| {
            assert!(
                self.generations.len() < u32::MAX as usize,
                "entity slots exhausted"
            );
            self.generations.push(0);
            self.alive.resize(self.generations.len());
            self.generations.len() - 1
        });

        self.alive.set(index, start_alive);
        let entity = Entity::new(index as u32, self.generations[index]);
        trace!(%entity, start_alive, "entity created");
        entity
    }

    /// Starts an atomic multi-component creation.
    ///
    /// The builder holds the registry exclusively until it is finalized or
    /// dropped, so no other code observes the entity half-built.
    #[must_use = "dropping an unbuilt builder retires its entity"]
    pub fn builder(&mut self) -> Builder<'_> {
        let entity = self.create(false);
        Builder::new(self, entity)
    }

    /// Rebuilds the current handle of slot `index`.
    ///
    /// Returns `None` for a slot that was never allocated. The handle may be
    /// dead; check [`is_alive`](Self::is_alive) when it matters.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<Entity> {
        let generation = *self.generations.get(index)?;
        Some(Entity::new(index as u32, generation))
    }

    /// Kills an entity.
    ///
    /// Fails closed: returns `false` without any effect if the handle is
    /// stale, null, out of range, or already dead. Components are not touched;
    /// erase them from their storages yourself.
    pub fn kill(&mut self, entity: Entity) -> bool {
        if !self.is_alive(entity) {
            return false;
        }
        let index = entity.slot();
        self.alive.set(index, false);
        self.generations[index] = self.generations[index].wrapping_add(1);
        trace!(%entity, "entity killed");
        true
    }

    /// Checks that the slot is alive and the generation matches.
    #[inline]
    #[must_use]
    pub fn is_alive(&self, entity: Entity) -> bool {
        let index = entity.slot();
        self.alive.test(index) && self.generations.get(index) == Some(&entity.generation())
    }

    /// Number of slots ever allocated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.generations.len()
    }

    /// Returns `true` if no slot was ever allocated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.generations.is_empty()
    }

    /// Number of alive entities.
    #[must_use]
    pub fn alive_count(&self) -> usize {
        self.alive.count_ones()
    }

    /// Liveness ledger, one bit per slot.
    #[inline]
    #[must_use]
    pub fn alive_mask(&self) -> &BitSet {
        &self.alive
    }

    /// Iterates alive entities in ascending index order.
    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.alive.iter_ones().filter_map(|index| self.get(index))
    }

    /// Returns `true` if abandoned builders left components behind.
    #[must_use]
    pub fn has_orphans(&self) -> bool {
        self.orphans.any()
    }

    /// Drains the slots abandoned builders left components in.
    ///
    /// Erase the returned indices from every storage (see
    /// [`Storage::erase_many`](crate::Storage::erase_many)); the slots become
    /// reusable again.
    pub fn maintain(&mut self) -> Vec<usize> {
        let reclaimed: Vec<usize> = self.orphans.iter_ones().collect();
        if !reclaimed.is_empty() {
            debug!(count = reclaimed.len(), "reclaimed orphaned builder slots");
        }
        self.orphans.clear();
        reclaimed
    }

    /// Marks a staged entity alive. Called once by [`Builder::build`].
    pub(crate) fn revive(&mut self, entity: Entity) {
        debug_assert_eq!(
            self.generations.get(entity.slot()),
            Some(&entity.generation())
        );
        self.alive.set(entity.slot(), true);
    }

    /// Retires the slot of a builder dropped before `build`.
    ///
    /// The generation moves on so the staged handle is stale. If the builder
    /// attached components the slot is held back until [`maintain`](Self::maintain).
    pub(crate) fn retire(&mut self, entity: Entity, attached: usize) {
        let index = entity.slot();
        if self.alive.test(index) || self.generations.get(index) != Some(&entity.generation()) {
            return;
        }
        self.generations[index] = self.generations[index].wrapping_add(1);
        if attached > 0 {
            self.orphans.set(index, true);
        }
        warn!(%entity, attached, "builder dropped before build");
    }

    fn free_slot(&self) -> Option<usize> {
        if self.orphans.any() {
            self.alive.first_zero_excluding(&self.orphans)
        } else {
            self.alive.first_zero()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_appends_then_reuses_lowest() {
        let mut entities = Entities::new();
        let a = entities.create(true);
        let b = entities.create(true);
        let c = entities.create(true);
        assert_eq!((a.index(), b.index(), c.index()), (0, 1, 2));
        assert_eq!(a.generation(), 0);

        assert!(entities.kill(c));
        assert!(entities.kill(a));

        let d = entities.create(true);
        assert_eq!(d, Entity::new(0, 1));
        let e = entities.create(true);
        assert_eq!(e, Entity::new(2, 1));
        assert_eq!(entities.len(), 3);
    }

    #[test]
    fn test_create_dead() {
        let mut entities = Entities::new();
        let ghost = entities.create(false);
        assert!(!entities.is_alive(ghost));
        assert_eq!(entities.alive_count(), 0);

        // A dead slot is the first candidate for reuse.
        let next = entities.create(true);
        assert_eq!(next, ghost);
        assert!(entities.is_alive(next));
    }

    #[test]
    fn test_kill_fails_closed() {
        let mut entities = Entities::new();
        let e = entities.create(true);

        assert!(!entities.kill(Entity::new(e.index(), 5)));
        assert!(!entities.kill(Entity::new(42, 0)));
        assert!(!entities.kill(Entity::NULL));
        assert!(entities.is_alive(e));

        assert!(entities.kill(e));
        let snapshot = entities.get(0);
        assert!(!entities.kill(e));
        assert_eq!(entities.get(0), snapshot);
    }

    #[test]
    fn test_get_uses_current_generation() {
        let mut entities = Entities::new();
        let e = entities.create(true);
        entities.kill(e);
        assert_eq!(entities.get(0), Some(Entity::new(0, 1)));
        assert_eq!(entities.get(1), None);
    }

    #[test]
    fn test_iter_alive_only() {
        let mut entities = Entities::with_capacity(8);
        let all: Vec<_> = (0..5).map(|_| entities.create(true)).collect();
        entities.kill(all[1]);
        entities.kill(all[3]);
        assert_eq!(entities.iter().collect::<Vec<_>>(), vec![all[0], all[2], all[4]]);
        assert_eq!(entities.alive_count(), 3);
    }

    #[test]
    fn test_create_skips_orphaned_slots() {
        let mut entities = Entities::new();
        let slots: Vec<_> = (0..4).map(|_| entities.create(true)).collect();
        entities.kill(slots[1]);
        entities.kill(slots[2]);
        let staged = entities.create(false);
        entities.retire(staged, 1);
        assert!(entities.has_orphans());

        // Slot 1 is held back, slot 2 is the lowest free one.
        assert_eq!(entities.create(true).index(), 2);
        assert_eq!(entities.create(true).index(), 4);

        assert_eq!(entities.maintain(), vec![1]);
        assert_eq!(entities.create(true), Entity::new(1, 2));
    }

    #[test]
    fn test_from_config() {
        let config = CoreConfig {
            initial_entities: 32,
            initial_components: 0,
        };
        let entities = Entities::from_config(&config);
        assert!(entities.is_empty());
    }
}
