//! # Component Serialization
//!
//! Save/load dispatch through an explicit registration table. Each component
//! type gets at most one [`Codec`], converting between the component and a
//! [`toml::Value`]:
//!
//! - [`Codecs::register_serde`] installs the codec derived from the type's
//!   `serde` implementations
//! - [`Codecs::register`] installs a hand-written codec, which always takes
//!   precedence over the serde one
//!
//! Whole storages are saved as a [`toml::Table`] keyed by decimal slot index.
//!
//! ```text
//! [position]
//! 0 = { x = 1, y = 2 }
//! 7 = { x = -4, y = 0 }
//! ```

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use toml::{Table, Value};
use tracing::{debug, trace};

use crate::error::{CoreError, CoreResult};
use crate::storage::Storage;

/// Converts a component into a value.
pub type SaveFn<C> = fn(&C) -> CoreResult<Value>;
/// Builds a component from a value.
pub type LoadFn<C> = fn(&Value) -> CoreResult<C>;
/// Updates an existing component in place from a value.
pub type UpdateFn<C> = fn(&mut C, &Value) -> CoreResult<()>;

/// Save/load/update entry points for one component type.
pub struct Codec<C> {
    save: SaveFn<C>,
    load: LoadFn<C>,
    update: Option<UpdateFn<C>>,
}

impl<C> Codec<C> {
    /// Creates a codec without an in-place update.
    ///
    /// Updates fall back to loading a fresh value and assigning it.
    #[must_use]
    pub const fn new(save: SaveFn<C>, load: LoadFn<C>) -> Self {
        Self {
            save,
            load,
            update: None,
        }
    }

    /// Adds an in-place update.
    #[must_use]
    pub const fn with_update(mut self, update: UpdateFn<C>) -> Self {
        self.update = Some(update);
        self
    }

    /// Converts `component` into a value.
    ///
    /// # Errors
    ///
    /// Propagates the save function's error.
    pub fn save(&self, component: &C) -> CoreResult<Value> {
        (self.save)(component)
    }

    /// Builds a component from `value`.
    ///
    /// # Errors
    ///
    /// Propagates the load function's error.
    pub fn load(&self, value: &Value) -> CoreResult<C> {
        (self.load)(value)
    }

    /// Updates `component` from `value`.
    ///
    /// # Errors
    ///
    /// Propagates the update (or load) function's error; `component` is
    /// untouched when loading fails.
    pub fn update(&self, component: &mut C, value: &Value) -> CoreResult<()> {
        match self.update {
            Some(update) => update(component, value),
            None => {
                *component = (self.load)(value)?;
                Ok(())
            }
        }
    }
}

impl<C: Serialize + DeserializeOwned> Codec<C> {
    /// Codec driven by the type's `serde` implementations.
    #[must_use]
    pub fn serde() -> Self {
        Self::new(serde_save::<C>, serde_load::<C>)
    }
}

impl<C> Clone for Codec<C> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<C> Copy for Codec<C> {}

impl<C> fmt::Debug for Codec<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec")
            .field("component", &type_name::<C>())
            .field("update", &self.update.is_some())
            .finish()
    }
}

fn serde_save<C: Serialize>(component: &C) -> CoreResult<Value> {
    Value::try_from(component).map_err(codec_error::<C>)
}

fn serde_load<C: DeserializeOwned>(value: &Value) -> CoreResult<C> {
    value.clone().try_into().map_err(codec_error::<C>)
}

/// Wraps any displayable failure as a [`CoreError::Codec`] for `C`.
pub fn codec_error<C>(error: impl fmt::Display) -> CoreError {
    CoreError::Codec {
        component: type_name::<C>(),
        message: error.to_string(),
    }
}

struct Registration {
    codec: Box<dyn Any + Send + Sync>,
    explicit: bool,
}

/// Registration table of component codecs, keyed by component type.
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use tessera_core::{Codecs, Storage, VecStorage};
///
/// #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// struct Health(u32);
///
/// let mut codecs = Codecs::new();
/// codecs.register_serde::<Health>();
///
/// let mut health: VecStorage<Health> = VecStorage::new();
/// health.insert(3, Health(40));
/// let saved = codecs.save_storage(&health)?;
///
/// let mut restored: VecStorage<Health> = VecStorage::new();
/// assert_eq!(codecs.load_storage(&saved, &mut restored)?, 1);
/// assert_eq!(restored.at(3)?, &Health(40));
/// # Ok::<(), tessera_core::CoreError>(())
/// ```
#[derive(Default)]
pub struct Codecs {
    entries: HashMap<TypeId, Registration>,
}

impl Codecs {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an explicit codec for `C`, replacing any previous one.
    pub fn register<C: 'static>(&mut self, codec: Codec<C>) -> &mut Self {
        trace!(component = type_name::<C>(), "explicit codec registered");
        self.entries.insert(
            TypeId::of::<C>(),
            Registration {
                codec: Box::new(codec),
                explicit: true,
            },
        );
        self
    }

    /// Registers the serde-driven codec for `C`.
    ///
    /// Does nothing if an explicit codec is already registered.
    pub fn register_serde<C>(&mut self) -> &mut Self
    where
        C: Serialize + DeserializeOwned + 'static,
    {
        if self.is_explicit::<C>() {
            return self;
        }
        trace!(component = type_name::<C>(), "serde codec registered");
        self.entries.insert(
            TypeId::of::<C>(),
            Registration {
                codec: Box::new(Codec::<C>::serde()),
                explicit: false,
            },
        );
        self
    }

    /// Returns `true` if any codec is registered for `C`.
    #[must_use]
    pub fn is_registered<C: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<C>())
    }

    /// Returns `true` if a hand-written codec is registered for `C`.
    #[must_use]
    pub fn is_explicit<C: 'static>(&self) -> bool {
        self.entries
            .get(&TypeId::of::<C>())
            .is_some_and(|entry| entry.explicit)
    }

    /// Number of registered component types.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Looks up the codec for `C`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::CodecMissing`] if `C` was never registered.
    pub fn codec<C: 'static>(&self) -> CoreResult<Codec<C>> {
        self.entries
            .get(&TypeId::of::<C>())
            .and_then(|entry| entry.codec.downcast_ref::<Codec<C>>())
            .copied()
            .ok_or(CoreError::CodecMissing {
                component: type_name::<C>(),
            })
    }

    /// Saves one component.
    ///
    /// # Errors
    ///
    /// [`CoreError::CodecMissing`] or the codec's own error.
    pub fn save<C: 'static>(&self, component: &C) -> CoreResult<Value> {
        self.codec::<C>()?.save(component)
    }

    /// Loads one component.
    ///
    /// # Errors
    ///
    /// [`CoreError::CodecMissing`] or the codec's own error.
    pub fn load<C: 'static>(&self, value: &Value) -> CoreResult<C> {
        self.codec::<C>()?.load(value)
    }

    /// Updates one component in place.
    ///
    /// # Errors
    ///
    /// [`CoreError::CodecMissing`] or the codec's own error.
    pub fn update<C: 'static>(&self, component: &mut C, value: &Value) -> CoreResult<()> {
        self.codec::<C>()?.update(component, value)
    }

    /// Saves every component of `storage`, keyed by decimal slot index.
    ///
    /// # Errors
    ///
    /// [`CoreError::CodecMissing`] or the first codec error.
    pub fn save_storage<S: Storage>(&self, storage: &S) -> CoreResult<Table> {
        let codec = self.codec::<S::Component>()?;
        let mut table = Table::new();
        for index in storage.indices() {
            table.insert(index.to_string(), codec.save(storage.slot(index))?);
        }
        debug!(
            component = type_name::<S::Component>(),
            count = table.len(),
            "storage saved"
        );
        Ok(table)
    }

    /// Loads `table` into `storage`.
    ///
    /// Components already present are updated in place; absent ones are
    /// inserted. Slots missing from `table` are left alone. Returns the
    /// number of entries applied.
    ///
    /// # Errors
    ///
    /// [`CoreError::CodecMissing`], a [`CoreError::Codec`] for a key that is
    /// not a slot index, or the first codec error. Entries applied before
    /// the failure stay applied.
    pub fn load_storage<S: Storage>(&self, table: &Table, storage: &mut S) -> CoreResult<usize> {
        let codec = self.codec::<S::Component>()?;
        for (key, value) in table {
            let index: usize = key
                .parse()
                .map_err(|_| codec_error::<S::Component>(format!("invalid slot index {key:?}")))?;
            if storage.contains(index) {
                codec.update(storage.slot_mut(index), value)?;
            } else {
                storage.insert(index, codec.load(value)?);
            }
        }
        debug!(
            component = type_name::<S::Component>(),
            count = table.len(),
            "storage loaded"
        );
        Ok(table.len())
    }
}

impl fmt::Debug for Codecs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codecs")
            .field("registered", &self.entries.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MapStorage, MarkerStorage, VecStorage};
    use serde::Deserialize;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Position {
        x: i64,
        y: i64,
    }

    #[derive(Clone, Copy, Debug, Default, PartialEq)]
    struct Frozen;

    fn frozen_codec() -> Codec<Frozen> {
        Codec::new(
            |_| Ok(Value::Boolean(true)),
            |value| match value {
                Value::Boolean(true) => Ok(Frozen),
                other => Err(codec_error::<Frozen>(format!("expected true, got {other}"))),
            },
        )
    }

    #[test]
    fn test_serde_round_trip() {
        let mut codecs = Codecs::new();
        codecs.register_serde::<Position>();

        let value = codecs.save(&Position { x: 1, y: -2 }).unwrap();
        assert_eq!(value.get("x"), Some(&Value::Integer(1)));
        assert_eq!(
            codecs.load::<Position>(&value).unwrap(),
            Position { x: 1, y: -2 }
        );
    }

    #[test]
    fn test_missing_codec() {
        let codecs = Codecs::new();
        assert!(matches!(
            codecs.save(&Position::default()),
            Err(CoreError::CodecMissing { .. })
        ));
    }

    #[test]
    fn test_explicit_codec_wins() {
        #[derive(Debug, PartialEq, Serialize, Deserialize)]
        struct Score(i64);

        let mut codecs = Codecs::new();
        codecs.register(Codec::<Score>::new(
            |score| Ok(Value::Integer(score.0 * 10)),
            |value| {
                value
                    .as_integer()
                    .map(|raw| Score(raw / 10))
                    .ok_or_else(|| codec_error::<Score>("expected an integer"))
            },
        ));
        codecs.register_serde::<Score>();

        assert!(codecs.is_explicit::<Score>());
        assert_eq!(codecs.save(&Score(4)).unwrap(), Value::Integer(40));
    }

    #[test]
    fn test_update_in_place_and_fallback() {
        let mut codecs = Codecs::new();
        codecs.register(
            Codec::<Position>::serde().with_update(|position, value| {
                if let Some(x) = value.get("x").and_then(Value::as_integer) {
                    position.x = x;
                }
                Ok(())
            }),
        );

        let mut position = Position { x: 1, y: 1 };
        let mut patch = Table::new();
        patch.insert("x".into(), Value::Integer(9));
        codecs.update(&mut position, &Value::Table(patch)).unwrap();
        assert_eq!(position, Position { x: 9, y: 1 });

        codecs.register(frozen_codec());
        let mut frozen = Frozen;
        assert!(codecs.update(&mut frozen, &Value::Boolean(true)).is_ok());
        assert!(matches!(
            codecs.update(&mut frozen, &Value::Integer(0)),
            Err(CoreError::Codec { .. })
        ));
    }

    #[test]
    fn test_storage_round_trip() {
        let mut codecs = Codecs::new();
        codecs.register_serde::<Position>().register(frozen_codec());

        let mut positions: VecStorage<Position> = VecStorage::new();
        positions.insert(0, Position { x: 1, y: 2 });
        positions.insert(7, Position { x: -4, y: 0 });
        let mut frozen: MarkerStorage<Frozen> = MarkerStorage::new();
        frozen.insert(7, Frozen);

        let saved = codecs.save_storage(&positions).unwrap();
        assert_eq!(saved.len(), 2);
        assert!(saved.contains_key("7"));
        let saved_frozen = codecs.save_storage(&frozen).unwrap();

        let mut restored: MapStorage<Position> = MapStorage::new();
        restored.insert(0, Position::default());
        assert_eq!(codecs.load_storage(&saved, &mut restored).unwrap(), 2);
        assert_eq!(restored[0], Position { x: 1, y: 2 });
        assert_eq!(restored[7], Position { x: -4, y: 0 });

        let mut restored_frozen: MarkerStorage<Frozen> = MarkerStorage::new();
        codecs
            .load_storage(&saved_frozen, &mut restored_frozen)
            .unwrap();
        assert_eq!(restored_frozen.indices().collect::<Vec<_>>(), vec![7]);
    }

    #[test]
    fn test_load_rejects_bad_index() {
        let mut codecs = Codecs::new();
        codecs.register_serde::<Position>();

        let mut table = Table::new();
        table.insert("first".into(), Value::Table(Table::new()));
        let mut storage: VecStorage<Position> = VecStorage::new();
        let err = codecs.load_storage(&table, &mut storage).unwrap_err();
        assert!(err.to_string().contains("invalid slot index"));
    }
}
