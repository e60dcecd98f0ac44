//! Configuration for the caches.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;

/// Default number of result sets kept by the resolve cache.
pub const DEFAULT_RESOLVE_CAPACITY: usize = 10;

/// Tunables for the derivation core.
///
/// Deserializable so hosts can embed it in their own settings; missing fields
/// take their defaults.
///
/// ```
/// # use razor_derive::CoreConfig;
/// let config = CoreConfig::builder().resolve_capacity(32).build().unwrap();
/// assert_eq!(config.resolve_capacity, 32);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CoreConfig {
    /// Maximum number of result sets the resolve cache retains.
    pub resolve_capacity: usize,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            resolve_capacity: DEFAULT_RESOLVE_CAPACITY,
        }
    }
}

impl CoreConfig {
    pub fn builder() -> CoreConfigBuilder {
        CoreConfigBuilder::new()
    }

    /// Check the configuration for values the caches cannot work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.resolve_capacity == 0 {
            return Err(CoreError::invalid_argument(
                "resolve cache capacity must be at least 1",
            ));
        }
        Ok(())
    }
}

/// Builder for [`CoreConfig`].
#[derive(Debug, Clone, Default)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl CoreConfigBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the resolve cache capacity.
    pub fn resolve_capacity(mut self, capacity: usize) -> Self {
        self.config.resolve_capacity = capacity;
        self
    }

    /// Validate and build the configuration.
    pub fn build(self) -> Result<CoreConfig, CoreError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
