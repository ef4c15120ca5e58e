use std::{collections::HashMap, fmt, ops::Range};

use tracing::{debug, trace, warn};

use crate::{
  align::{NODE_ALIGN, align_down, align_up, checked_align_up},
  block::{Block, NIL, NODE_SIZE},
  config::PoolConfig,
  error::{PoolError, Result},
};

/// Handle to a block handed out by [`PoolAllocator::allocate`].
///
/// Holds the block's offset inside the pool and the number of bytes reserved
/// for it, which may exceed the requested size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Allocation {
  offset: usize,
  size: usize,
}

impl Allocation {
  /// Offset of the first byte of the block, always a multiple of [`NODE_ALIGN`].
  #[inline]
  #[must_use]
  pub const fn offset(&self) -> usize {
    self.offset
  }

  /// Bytes reserved for the block.
  #[inline]
  #[must_use]
  pub const fn size(&self) -> usize {
    self.size
  }

  #[inline]
  #[must_use]
  pub const fn range(&self) -> Range<usize> {
    self.offset..self.offset + self.size
  }
}

/// Snapshot of the pool's occupancy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PoolStats {
  /// Bytes requested at construction.
  pub capacity: usize,
  /// Bytes that can ever be handed out (capacity rounded down to [`NODE_ALIGN`]).
  pub usable: usize,
  pub free_bytes: usize,
  pub free_blocks: usize,
  pub largest_free_block: usize,
  pub allocated_bytes: usize,
  pub allocations: usize,
}

/// Fixed-capacity allocator carving one owned byte region into blocks.
///
/// Free blocks form a singly linked list threaded through the region itself:
/// each one starts with a two-word header holding its size and the offset of
/// the next free block. Allocation walks that list and takes the first block
/// that is large enough, splitting off the tail when it can host a header of
/// its own. Deallocation pushes the block back on the head of the list without
/// merging it with its neighbours.
///
/// In checked mode the pool also remembers every live allocation and rejects
/// frees of handles it did not hand out or that were already returned.
pub struct PoolAllocator {
  storage: Box<[usize]>,
  capacity: usize,
  usable: usize,
  root: usize,
  live: Option<HashMap<usize, usize>>,
  allocated_bytes: usize,
  allocations: usize,
}

impl PoolAllocator {
  /// Creates a pool of `capacity` bytes.
  ///
  /// Checked mode is on in debug builds and off in release builds.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::CapacityTooSmall`] if `capacity` cannot hold a
  /// single free-block header.
  pub fn new(capacity: usize) -> Result<Self> {
    Self::with_config(&PoolConfig::default().with_capacity(capacity))
  }

  /// Creates a pool as described by `config`.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::CapacityTooSmall`] if the configured capacity cannot
  /// hold a single free-block header.
  pub fn with_config(config: &PoolConfig) -> Result<Self> {
    let capacity = config.capacity;
    let usable = align_down(capacity, NODE_ALIGN);

    if usable < NODE_SIZE {
      return Err(PoolError::CapacityTooSmall {
        capacity,
        minimum: NODE_SIZE,
      });
    }

    // Word storage keeps every block offset an aligned address as well.
    let words = capacity.div_ceil(std::mem::size_of::<usize>());

    let mut pool = Self {
      storage: vec![0usize; words].into_boxed_slice(),
      capacity,
      usable,
      root: NIL,
      live: config.checked.then(HashMap::new),
      allocated_bytes: 0,
      allocations: 0,
    };
    pool.reset();

    debug!(capacity, usable, checked = config.checked, "pool created");

    Ok(pool)
  }

  #[inline]
  #[must_use]
  pub const fn capacity(&self) -> usize {
    self.capacity
  }

  #[inline]
  #[must_use]
  pub const fn is_checked(&self) -> bool {
    self.live.is_some()
  }

  /// Reserves a block of at least `requested` bytes.
  ///
  /// The request is rounded up to [`NODE_ALIGN`] and to no less than
  /// [`NODE_SIZE`], so a zero-byte request still takes one node-sized block.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::OutOfMemory`] if no free block is large enough.
  pub fn allocate(
    &mut self,
    requested: usize,
  ) -> Result<Allocation> {
    let out_of_memory = PoolError::OutOfMemory { requested };
    let needed = checked_align_up(requested, NODE_ALIGN)
      .ok_or(out_of_memory)?
      .max(NODE_SIZE);

    let mut prev = NIL;
    let mut current = self.root;
    let mut hops = 0;

    while current != NIL {
      if hops == self.max_hops() {
        warn!(hops, "free list walk exceeded its bound, list is corrupted");
        break;
      }
      hops += 1;

      let Some(block) = Block::read(self.bytes(), current) else {
        warn!(offset = current, "free list points outside the pool");
        break;
      };

      let Some(block_end) = current
        .checked_add(block.size)
        .filter(|end| *end <= self.usable)
      else {
        warn!(offset = current, size = block.size, "free block runs past the pool");
        break;
      };

      let start = align_up(current, NODE_ALIGN);

      if let Some(end) = start.checked_add(needed)
        && end <= block_end
        && end <= self.usable
      {
        let remainder = block_end - end;

        let (size, replacement) = if remainder >= NODE_SIZE {
          let written = Block::new(remainder, block.next).write(self.bytes_mut(), end);
          debug_assert!(written, "split remainder header must fit in the pool");
          (needed, end)
        } else {
          (block_end - start, block.next)
        };

        self.link(prev, replacement);

        if let Some(live) = &mut self.live {
          live.insert(start, size);
        }
        self.allocated_bytes += size;
        self.allocations += 1;

        trace!(requested, offset = start, size, "allocated");

        return Ok(Allocation {
          offset: start,
          size,
        });
      }

      prev = current;
      current = block.next;
    }

    trace!(requested, "out of memory");

    Err(out_of_memory)
  }

  /// Returns `allocation` to the free list.
  ///
  /// The block becomes the new head of the list and is not merged with
  /// adjacent free blocks.
  ///
  /// # Errors
  ///
  /// Returns [`PoolError::InvalidFree`] if the handle does not describe a block
  /// inside this pool. In checked mode, also returns [`PoolError::DoubleFree`]
  /// for a block that is already on the free list and
  /// [`PoolError::InvalidFree`] for any other handle that is not live.
  pub fn deallocate(
    &mut self,
    allocation: Allocation,
  ) -> Result<()> {
    let Allocation { offset, size } = allocation;

    if !self.in_bounds(allocation) {
      return Err(PoolError::InvalidFree { offset });
    }

    match self.live.as_ref().map(|live| live.get(&offset).copied()) {
      None => {},
      Some(Some(recorded)) if recorded == size => {
        if let Some(live) = &mut self.live {
          live.remove(&offset);
        }
      },
      Some(Some(_)) => return Err(PoolError::InvalidFree { offset }),
      Some(None) if self.is_free_block(offset) => return Err(PoolError::DoubleFree { offset }),
      Some(None) => return Err(PoolError::InvalidFree { offset }),
    }

    let root = self.root;
    let written = Block::new(size, root).write(self.bytes_mut(), offset);
    debug_assert!(written, "freed block header must fit in the pool");
    self.root = offset;

    self.allocated_bytes = self.allocated_bytes.saturating_sub(size);
    self.allocations = self.allocations.saturating_sub(1);

    trace!(offset, size, "deallocated");

    Ok(())
  }

  /// Bytes of a live allocation.
  ///
  /// Returns `None` if the handle lies outside the pool or, in checked mode,
  /// is not live.
  #[must_use]
  pub fn get(
    &self,
    allocation: Allocation,
  ) -> Option<&[u8]> {
    if !self.is_live(allocation) {
      return None;
    }
    self.bytes().get(allocation.range())
  }

  /// Mutable bytes of a live allocation. See [`PoolAllocator::get`].
  pub fn get_mut(
    &mut self,
    allocation: Allocation,
  ) -> Option<&mut [u8]> {
    if !self.is_live(allocation) {
      return None;
    }
    self.bytes_mut().get_mut(allocation.range())
  }

  /// Forgets every allocation and makes the whole region one free block again.
  ///
  /// Handles issued before the reset must not be used afterwards.
  pub fn reset(&mut self) {
    let usable = self.usable;
    Block::new(usable, NIL).write(self.bytes_mut(), 0);
    self.root = 0;

    if let Some(live) = &mut self.live {
      live.clear();
    }
    self.allocated_bytes = 0;
    self.allocations = 0;

    trace!(usable, "pool reset");
  }

  /// Walks the free list in list order, yielding `(offset, size)` per block.
  pub fn free_blocks(&self) -> FreeBlocks<'_> {
    FreeBlocks {
      bytes: self.bytes(),
      current: self.root,
      remaining: self.max_hops(),
    }
  }

  #[must_use]
  pub fn stats(&self) -> PoolStats {
    let (free_bytes, free_blocks, largest_free_block) =
      self
        .free_blocks()
        .fold((0usize, 0usize, 0usize), |(bytes, count, largest), (_, size)| {
          (bytes.saturating_add(size), count + 1, largest.max(size))
        });

    PoolStats {
      capacity: self.capacity,
      usable: self.usable,
      free_bytes,
      free_blocks,
      largest_free_block,
      allocated_bytes: self.allocated_bytes,
      allocations: self.allocations,
    }
  }

  /// Consumes the pool, releasing its region.
  ///
  /// Returns how many allocations were still outstanding; their handles are
  /// meaningless from here on.
  pub fn destroy(self) -> usize {
    debug!(
      capacity = self.capacity,
      outstanding = self.allocations,
      "pool destroyed"
    );
    self.allocations
  }

  fn bytes(&self) -> &[u8] {
    &bytemuck::cast_slice::<usize, u8>(&self.storage)[..self.capacity]
  }

  fn bytes_mut(&mut self) -> &mut [u8] {
    let capacity = self.capacity;
    &mut bytemuck::cast_slice_mut::<usize, u8>(&mut self.storage)[..capacity]
  }

  /// Upper bound on the length of an intact free list.
  fn max_hops(&self) -> usize {
    self.usable / NODE_SIZE
  }

  /// Points `prev` (or the root when `prev` is `NIL`) at `next`.
  fn link(
    &mut self,
    prev: usize,
    next: usize,
  ) {
    if prev == NIL {
      self.root = next;
      return;
    }

    let read = Block::read(self.bytes(), prev);
    debug_assert!(read.is_some(), "free list predecessor at {prev:#x} is unreadable");
    let Some(mut block) = read else {
      return;
    };
    block.next = next;
    let written = block.write(self.bytes_mut(), prev);
    debug_assert!(written, "free list predecessor header must fit in the pool");
  }

  fn in_bounds(
    &self,
    allocation: Allocation,
  ) -> bool {
    allocation.offset % NODE_ALIGN == 0
      && allocation.size >= NODE_SIZE
      && allocation
        .offset
        .checked_add(allocation.size)
        .is_some_and(|end| end <= self.usable)
  }

  fn is_live(
    &self,
    allocation: Allocation,
  ) -> bool {
    if !self.in_bounds(allocation) {
      return false;
    }
    match &self.live {
      Some(live) => live.get(&allocation.offset) == Some(&allocation.size),
      None => true,
    }
  }

  fn is_free_block(
    &self,
    offset: usize,
  ) -> bool {
    self.free_blocks().any(|(start, _)| start == offset)
  }
}

impl fmt::Debug for PoolAllocator {
  fn fmt(
    &self,
    f: &mut fmt::Formatter<'_>,
  ) -> fmt::Result {
    f.debug_struct("PoolAllocator")
      .field("capacity", &self.capacity)
      .field("usable", &self.usable)
      .field("root", &self.root)
      .field("checked", &self.is_checked())
      .field("allocations", &self.allocations)
      .finish_non_exhaustive()
  }
}

/// Iterator over the free list, see [`PoolAllocator::free_blocks`].
pub struct FreeBlocks<'a> {
  bytes: &'a [u8],
  current: usize,
  remaining: usize,
}

impl Iterator for FreeBlocks<'_> {
  type Item = (usize, usize);

  fn next(&mut self) -> Option<Self::Item> {
    if self.current == NIL || self.remaining == 0 {
      return None;
    }
    self.remaining -= 1;

    let block = Block::read(self.bytes, self.current)?;
    let offset = self.current;
    self.current = block.next;

    Some((offset, block.size))
  }
}
