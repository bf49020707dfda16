//! # Entity Builder
//!
//! Atomic multi-component creation. The bound entity stays dead while
//! components are attached and becomes alive exactly once, on [`Builder::build`].

use std::any::type_name;

use tracing::debug;

use super::entities::Entities;
use super::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::storage::Storage;

/// Stage of a [`Builder`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuilderState {
    /// Accepting components.
    Staging,
    /// Finalized; every further operation fails.
    Built,
}

/// Single-use staging object for one freshly allocated entity.
///
/// Move-only. Obtained from [`Entities::builder`].
///
/// # Example
///
/// ```rust
/// use tessera_core::{Entities, MapStorage, Storage, VecStorage};
///
/// let mut entities = Entities::new();
/// let mut health: VecStorage<u32> = VecStorage::new();
/// let mut names: MapStorage<&str> = MapStorage::new();
///
/// let hero = entities
///     .builder()
///     .with(&mut health, 100)?
///     .with(&mut names, "hero")?
///     .build()?;
///
/// assert!(entities.is_alive(hero));
/// assert_eq!(health.at(hero.slot())?, &100);
/// # Ok::<(), tessera_core::CoreError>(())
/// ```
///
/// Dropping a builder without calling `build` retires its slot: the staged
/// handle turns stale and any attached components are reported by
/// [`Entities::maintain`].
#[derive(Debug)]
pub struct Builder<'a> {
    entities: &'a mut Entities,
    entity: Entity,
    state: BuilderState,
    attached: usize,
}

impl<'a> Builder<'a> {
    pub(crate) fn new(entities: &'a mut Entities, entity: Entity) -> Self {
        Self {
            entities,
            entity,
            state: BuilderState::Staging,
            attached: 0,
        }
    }

    /// Handle of the entity under construction. Not alive until `build`.
    #[inline]
    #[must_use]
    pub const fn entity(&self) -> Entity {
        self.entity
    }

    /// Current stage.
    #[inline]
    #[must_use]
    pub const fn state(&self) -> BuilderState {
        self.state
    }

    /// Attaches `component` to the entity in `storage`.
    ///
    /// # Errors
    ///
    /// - [`CoreError::AlreadyBuilt`] if the builder was finalized
    /// - [`CoreError::DuplicateComponent`] if the slot already holds a
    ///   component in `storage` (including one left over by an earlier
    ///   occupant that was never erased)
    pub fn with<S: Storage>(
        &mut self,
        storage: &mut S,
        component: S::Component,
    ) -> CoreResult<&mut Self> {
        self.ensure_staging()?;
        let index = self.entity.slot();
        if storage.contains(index) {
            return Err(CoreError::DuplicateComponent {
                index,
                component: type_name::<S::Component>(),
            });
        }
        storage.insert(index, component);
        self.attached += 1;
        Ok(self)
    }

    /// Finalizes the entity, making it alive.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::AlreadyBuilt`] on any call after the first; the
    /// registry is left untouched.
    pub fn build(&mut self) -> CoreResult<Entity> {
        self.ensure_staging()?;
        self.entities.revive(self.entity);
        self.state = BuilderState::Built;
        debug!(entity = %self.entity, components = self.attached, "entity built");
        Ok(self.entity)
    }

    fn ensure_staging(&self) -> CoreResult<()> {
        match self.state {
            BuilderState::Staging => Ok(()),
            BuilderState::Built => Err(CoreError::AlreadyBuilt {
                index: self.entity.slot(),
            }),
        }
    }
}

impl Drop for Builder<'_> {
    fn drop(&mut self) {
        if self.state == BuilderState::Staging {
            self.entities.retire(self.entity, self.attached);
        }
    }
}
