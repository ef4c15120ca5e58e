//! Pool configuration, loadable from TOML.
//!
//! ```toml
//! capacity = 4096
//! checked = true
//! ```

use serde::{Deserialize, Serialize};

use crate::{
  error::{ConfigError, Result},
  pool::PoolAllocator,
};

/// Capacity used when a config omits it.
pub const DEFAULT_CAPACITY: usize = 1024;

/// Construction parameters for a [`PoolAllocator`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
  /// Size of the backing region in bytes.
  pub capacity: usize,
  /// Track live allocations and reject invalid or repeated frees.
  ///
  /// Defaults to on in debug builds and off in release builds.
  pub checked: bool,
}

impl Default for PoolConfig {
  fn default() -> Self {
    Self {
      capacity: DEFAULT_CAPACITY,
      checked: cfg!(debug_assertions),
    }
  }
}

impl PoolConfig {
  #[must_use]
  pub fn with_capacity(
    mut self,
    capacity: usize,
  ) -> Self {
    self.capacity = capacity;
    self
  }

  #[must_use]
  pub fn with_checked(
    mut self,
    checked: bool,
  ) -> Self {
    self.checked = checked;
    self
  }

  /// Parses a config from a TOML document. Missing keys keep their defaults.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::Parse`] if the document is not valid TOML or has
  /// fields of the wrong type.
  pub fn from_toml_str(source: &str) -> std::result::Result<Self, ConfigError> {
    Ok(toml::from_str(source)?)
  }

  /// Builds the allocator this config describes.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::CapacityTooSmall`](crate::PoolError::CapacityTooSmall)
  /// if `capacity` cannot hold a single block.
  pub fn build(&self) -> Result<PoolAllocator> {
    PoolAllocator::with_config(self)
  }
}

impl PoolAllocator {
  /// Parses `source` as a [`PoolConfig`] and builds the allocator from it.
  ///
  /// # Errors
  ///
  /// Returns [`ConfigError::Parse`] for malformed TOML and
  /// [`ConfigError::Pool`] if the configured capacity is too small.
  pub fn from_toml_str(source: &str) -> std::result::Result<Self, ConfigError> {
    Ok(PoolConfig::from_toml_str(source)?.build()?)
  }
}
