//! # Entity Component System Core
//!
//! Identity, creation and querying:
//!
//! - [`Entity`] - generational handle (index + generation)
//! - [`Entities`] - registry of generations and liveness
//! - [`Builder`] - atomic multi-component creation
//! - [`Query`] - presence predicate over storages, evaluated fresh each time

mod builder;
mod entities;
mod entity;
mod query;

pub use builder::{Builder, BuilderState};
pub use entities::Entities;
pub use entity::Entity;
pub use query::{Query, QueryData, QueryIter, QueryIterMut, ReadOnlyQueryData};
