use thiserror::Error;

/// Errors returned by pool operations.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
  #[error("capacity of {capacity} bytes cannot hold a single {minimum}-byte block")]
  CapacityTooSmall { capacity: usize, minimum: usize },

  #[error("no free block can hold {requested} bytes")]
  OutOfMemory { requested: usize },

  #[error("block at offset {offset:#x} was not allocated by this pool")]
  InvalidFree { offset: usize },

  #[error("block at offset {offset:#x} is already free")]
  DoubleFree { offset: usize },
}

/// Errors raised while loading a [`PoolConfig`](crate::PoolConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("invalid pool config: {0}")]
  Parse(#[from] toml::de::Error),

  #[error(transparent)]
  Pool(#[from] PoolError),
}

pub type Result<T> = std::result::Result<T, PoolError>;
