//! # Core Configuration
//!
//! Pre-sizing hints for the registry and storages, loaded once at startup
//! from TOML.
//!
//! ```toml
//! initial_entities = 4096
//! initial_components = 1024
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};

fn default_initial_entities() -> usize {
    1024
}

fn default_initial_components() -> usize {
    1024
}

/// Capacity hints for [`Entities`](crate::Entities) and the storages.
///
/// Every field is optional in the TOML source; unknown keys are rejected.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CoreConfig {
    /// Entity slots reserved up front.
    #[serde(default = "default_initial_entities")]
    pub initial_entities: usize,
    /// Component slots reserved up front by each storage.
    #[serde(default = "default_initial_components")]
    pub initial_components: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            initial_entities: default_initial_entities(),
            initial_components: default_initial_components(),
        }
    }
}

impl CoreConfig {
    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if the text is not valid TOML or holds
    /// unknown keys.
    pub fn from_toml_str(text: &str) -> CoreResult<Self> {
        toml::from_str(text).map_err(|err| CoreError::Config(err.to_string()))
    }

    /// Renders the configuration as TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::Config`] if serialization fails.
    pub fn to_toml_string(&self) -> CoreResult<String> {
        toml::to_string(self).map_err(|err| CoreError::Config(err.to_string()))
    }
}
