//! # TESSERA Core
//!
//! Entity/component data core for simulations that own their main loop:
//! - Generational entity handles that detect stale references
//! - Interchangeable component storages behind one trait
//! - Presence queries computed by intersecting bitsets
//!
//! ## Architecture Rules
//!
//! 1. **Identity and data are separate ledgers** - the registry tracks
//!    liveness, storages track occupancy, and killing an entity erases nothing
//! 2. **One registry, passed by reference** - no globals, no hidden world
//! 3. **Borrows enforce exclusivity** - a query holds every storage it reads
//!
//! ## Example
//!
//! ```rust
//! use tessera_core::{Entities, MapStorage, Query, Storage, VecStorage};
//!
//! let mut entities = Entities::new();
//! let mut positions: VecStorage<(i32, i32)> = VecStorage::new();
//! let mut names: MapStorage<String> = MapStorage::new();
//!
//! let scout = entities
//!     .builder()
//!     .with(&mut positions, (0, 0))?
//!     .with(&mut names, "scout".to_owned())?
//!     .build()?;
//! let rock = entities.create(true);
//! positions.insert(rock.slot(), (5, 5));
//!
//! let named = Query::new((&positions, &names)).alive(&entities);
//! let found: Vec<_> = named.iter().map(|(index, (_, name))| (index, name.clone())).collect();
//! assert_eq!(found, vec![(scout.slot(), "scout".to_owned())]);
//! # Ok::<(), tessera_core::CoreError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod bitset;
pub mod config;
pub mod ecs;
pub mod error;
pub mod serialization;
pub mod storage;

pub use bitset::{BitSet, IntoOnes, Ones};
pub use config::CoreConfig;
pub use ecs::{
    Builder, BuilderState, Entities, Entity, Query, QueryData, QueryIter, QueryIterMut,
    ReadOnlyQueryData,
};
pub use error::{CoreError, CoreResult};
pub use serialization::{codec_error, Codec, Codecs};
pub use storage::{MapStorage, MarkerStorage, Storage, VecStorage};
