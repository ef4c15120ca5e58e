/// Rounds the given size up to the node alignment of the pool (the machine word).
///
/// # Examples
///
/// ```rust
/// use std::mem;
/// use rpool::align;
///
/// match mem::size_of::<usize>() {
///     8 => assert_eq!(align!(13), 16), // 64 bit machine.
///     4 => assert_eq!(align!(11), 12), // 32 bit machine.
///     _ => {},
/// };
/// ```
#[macro_export]
macro_rules! align {
  ($value:expr) => {
    $crate::align::align_up($value, $crate::align::NODE_ALIGN)
  };
}

/// Rounds `value` up to the next multiple of `alignment`.
///
/// ```rust
/// use rpool::align_to;
///
/// assert_eq!(align_to!(17, 16), 32);
/// assert_eq!(align_to!(32, 16), 32);
/// ```
#[macro_export]
macro_rules! align_to {
  ($value:expr, $alignment:expr) => {
    $crate::align::align_up($value, $alignment)
  };
}

/// Alignment of every block offset and block size handed out by the pool.
pub const NODE_ALIGN: usize = std::mem::align_of::<usize>();

/// Rounds `address` up to the next multiple of `alignment`.
///
/// `alignment` must be a power of two. Wraps on overflow, use
/// [`checked_align_up`] when `address` comes from a caller.
#[inline]
#[must_use]
pub const fn align_up(
  address: usize,
  alignment: usize,
) -> usize {
  debug_assert!(alignment.is_power_of_two());
  address.wrapping_add(alignment - 1) & !(alignment - 1)
}

/// Like [`align_up`], but returns `None` instead of wrapping past `usize::MAX`.
#[inline]
#[must_use]
pub const fn checked_align_up(
  address: usize,
  alignment: usize,
) -> Option<usize> {
  debug_assert!(alignment.is_power_of_two());
  match address.checked_add(alignment - 1) {
    Some(bumped) => Some(bumped & !(alignment - 1)),
    None => None,
  }
}

/// Rounds `address` down to the previous multiple of `alignment`.
#[inline]
#[must_use]
pub const fn align_down(
  address: usize,
  alignment: usize,
) -> usize {
  debug_assert!(alignment.is_power_of_two());
  address & !(alignment - 1)
}

#[cfg(test)]
mod tests {
  use std::mem;

  use super::*;

  #[test]
  fn test_align() {
    let ptr_size = mem::size_of::<usize>();

    let mut alignments = Vec::new();

    for i in 0..10 {
      let sizes = (ptr_size * i + 1)..=(ptr_size * (i + 1));

      let expected_alignment = ptr_size * (i + 1);

      alignments.push((sizes, expected_alignment));
    }

    for (sizes, expected) in alignments {
      for size in sizes {
        assert_eq!(expected, align!(size));
      }
    }
  }

  #[test]
  fn test_align_to_other_powers() {
    assert_eq!(align_to!(0, 16), 0);
    assert_eq!(align_to!(1, 16), 16);
    assert_eq!(align_to!(4097, 4096), 8192);
    assert_eq!(align_to!(7, 1), 7);
  }

  #[test]
  fn test_checked_align_up_overflow() {
    assert_eq!(checked_align_up(usize::MAX, 8), None);
    assert_eq!(checked_align_up(usize::MAX - 7, 8), Some(usize::MAX - 7));
    assert_eq!(checked_align_up(9, 8), Some(16));
  }

  #[test]
  fn test_align_down() {
    assert_eq!(align_down(1023, 8), 1016);
    assert_eq!(align_down(1024, 8), 1024);
    assert_eq!(align_down(7, 8), 0);
  }
}
