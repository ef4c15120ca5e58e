use std::mem;

/// Link value terminating the free list.
pub const NIL: usize = usize::MAX;

const WORD: usize = mem::size_of::<usize>();

/// Bytes occupied by a free-block header, and so the smallest block the pool hands out.
pub const NODE_SIZE: usize = 2 * WORD;

/// Header stored in the first bytes of every free block.
///
/// ```text
///   ┌──────────────┬──────────────┬──────────────────────────┐
///   │ size: usize  │ next: usize  │   rest of the free block │
///   └──────────────┴──────────────┴──────────────────────────┘
///   ▲ block offset
/// ```
///
/// While the block is allocated these bytes belong to the caller and are never read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Block {
  pub size: usize,
  pub next: usize,
}

impl Block {
  pub fn new(
    size: usize,
    next: usize,
  ) -> Self {
    Self { size, next }
  }

  /// Reads the header stored at `offset`, or `None` if it would run past `bytes`.
  pub fn read(
    bytes: &[u8],
    offset: usize,
  ) -> Option<Self> {
    let header = bytes.get(offset..offset.checked_add(NODE_SIZE)?)?;
    let (size, next) = header.split_at(WORD);

    Some(Self {
      size: bytemuck::pod_read_unaligned(size),
      next: bytemuck::pod_read_unaligned(next),
    })
  }

  /// Writes this header at `offset`. Returns `false` if it does not fit.
  pub fn write(
    self,
    bytes: &mut [u8],
    offset: usize,
  ) -> bool {
    let Some(end) = offset.checked_add(NODE_SIZE) else {
      return false;
    };
    let Some(header) = bytes.get_mut(offset..end) else {
      return false;
    };

    let (size, next) = header.split_at_mut(WORD);
    size.copy_from_slice(bytemuck::bytes_of(&self.size));
    next.copy_from_slice(bytemuck::bytes_of(&self.next));

    true
  }
}
