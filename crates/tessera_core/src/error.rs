//! # Core Error Types
//!
//! Stale or out-of-range entity handles are not errors: `kill` and
//! `is_alive` answer them with `false`. Everything below is surfaced
//! synchronously to the immediate caller and never retried internally.

use thiserror::Error;

/// Errors that can occur in the data core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    /// Checked access found no component at the index.
    #[error("entity {index} has no {component} component")]
    ComponentAbsent {
        /// Slot index that was looked up.
        index: usize,
        /// Component type name.
        component: &'static str,
    },

    /// A builder tried to attach a component the entity already has.
    #[error("entity {index} already has a {component} component")]
    DuplicateComponent {
        /// Slot index of the entity under construction.
        index: usize,
        /// Component type name.
        component: &'static str,
    },

    /// A builder was used after `build` finalized it.
    #[error("builder for entity {index} was already finalized")]
    AlreadyBuilt {
        /// Slot index of the finalized entity.
        index: usize,
    },

    /// No codec is registered for the component type.
    #[error("no codec registered for {component}")]
    CodecMissing {
        /// Component type name.
        component: &'static str,
    },

    /// A codec failed to save or load a component.
    #[error("codec for {component} failed: {message}")]
    Codec {
        /// Component type name.
        component: &'static str,
        /// Underlying failure.
        message: String,
    },

    /// Invalid configuration text.
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    /// Returns `true` for errors that indicate a caller bug rather than a
    /// recoverable condition.
    #[must_use]
    pub const fn is_logic_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateComponent { .. } | Self::AlreadyBuilt { .. }
        )
    }
}
