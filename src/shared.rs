use std::sync::Arc;

use parking_lot::Mutex;

use crate::{
  error::Result,
  pool::{Allocation, PoolAllocator, PoolStats},
};

/// A [`PoolAllocator`] that can be used from several threads.
///
/// Every operation takes one lock around the whole pool, since the free list
/// threads through all blocks and none of them can be locked on its own.
/// Clones share the same pool.
#[derive(Clone, Debug)]
pub struct SharedPool {
  inner: Arc<Mutex<PoolAllocator>>,
}

impl SharedPool {
  pub fn new(pool: PoolAllocator) -> Self {
    Self {
      inner: Arc::new(Mutex::new(pool)),
    }
  }

  /// See [`PoolAllocator::allocate`].
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::OutOfMemory`](crate::PoolError::OutOfMemory) if no
  /// free block is large enough.
  pub fn allocate(
    &self,
    requested: usize,
  ) -> Result<Allocation> {
    self.inner.lock().allocate(requested)
  }

  /// See [`PoolAllocator::deallocate`].
  ///
  /// # Errors
  ///
  /// Same as [`PoolAllocator::deallocate`].
  pub fn deallocate(
    &self,
    allocation: Allocation,
  ) -> Result<()> {
    self.inner.lock().deallocate(allocation)
  }

  /// Runs `f` on the bytes of `allocation` while holding the lock.
  ///
  /// Returns `None` without calling `f` if the handle is not live.
  pub fn with_bytes<R>(
    &self,
    allocation: Allocation,
    f: impl FnOnce(&mut [u8]) -> R,
  ) -> Option<R> {
    let mut pool = self.inner.lock();
    pool.get_mut(allocation).map(f)
  }

  pub fn stats(&self) -> PoolStats {
    self.inner.lock().stats()
  }

  pub fn reset(&self) {
    self.inner.lock().reset();
  }
}

impl From<PoolAllocator> for SharedPool {
  fn from(pool: PoolAllocator) -> Self {
    Self::new(pool)
  }
}
