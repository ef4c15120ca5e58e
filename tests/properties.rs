//! Property tests for the pool's block-management invariants.

use std::collections::HashMap;

use proptest::prelude::*;
use rpool::{Allocation, NODE_SIZE, PoolAllocator, PoolConfig, PoolError, align::NODE_ALIGN};

const CAPACITY: usize = 4096;

#[derive(Clone, Debug)]
enum Op {
  Allocate(usize),
  /// Frees the live allocation at this index (modulo the live count).
  Free(usize),
}

fn op() -> impl Strategy<Value = Op> {
  prop_oneof![
    3 => (0usize..600).prop_map(Op::Allocate),
    2 => any::<usize>().prop_map(Op::Free),
  ]
}

fn checked_pool(capacity: usize) -> PoolAllocator {
  PoolConfig::default()
    .with_capacity(capacity)
    .with_checked(true)
    .build()
    .unwrap()
}

/// Applies `ops`, returning every outcome and the allocations still live.
fn run(
  pool: &mut PoolAllocator,
  ops: &[Op],
) -> (Vec<Result<Option<Allocation>, PoolError>>, Vec<Allocation>) {
  let mut live = Vec::new();
  let mut outcomes = Vec::new();

  for op in ops {
    match op {
      Op::Allocate(size) => {
        let result = pool.allocate(*size);
        if let Ok(allocation) = result {
          live.push(allocation);
        }
        outcomes.push(result.map(Some));
      },
      Op::Free(index) if !live.is_empty() => {
        let allocation = live.swap_remove(index % live.len());
        outcomes.push(pool.deallocate(allocation).map(|()| None));
      },
      Op::Free(_) => {},
    }
  }

  (outcomes, live)
}

fn assert_disjoint(ranges: &mut [(usize, usize)]) {
  ranges.sort_unstable();
  for pair in ranges.windows(2) {
    assert!(
      pair[0].0 + pair[0].1 <= pair[1].0,
      "overlapping blocks {:?} and {:?}",
      pair[0],
      pair[1]
    );
  }
}

proptest! {
  #![proptest_config(ProptestConfig::with_cases(128))]

  #[test]
  fn allocations_stay_in_bounds_aligned_and_disjoint(
    ops in proptest::collection::vec(op(), 1..80),
  ) {
    let mut pool = checked_pool(CAPACITY);
    let (outcomes, live) = run(&mut pool, &ops);

    for outcome in &outcomes {
      prop_assert!(outcome.is_ok() || matches!(outcome, Err(PoolError::OutOfMemory { .. })), "unexpected outcome: {:?}", outcome);
    }

    for allocation in &live {
      prop_assert_eq!(allocation.offset() % NODE_ALIGN, 0);
      prop_assert!(allocation.size() >= NODE_SIZE);
      prop_assert!(allocation.range().end <= CAPACITY);
    }

    // Live blocks and free blocks together tile the region without overlap.
    let mut ranges: Vec<_> = live.iter().map(|a| (a.offset(), a.size())).collect();
    ranges.extend(pool.free_blocks());
    assert_disjoint(&mut ranges);

    let stats = pool.stats();
    prop_assert_eq!(stats.free_bytes + stats.allocated_bytes, stats.usable);
    prop_assert_eq!(stats.allocations, live.len());
  }

  #[test]
  fn requests_get_at_least_what_they_asked_for(
    sizes in proptest::collection::vec(0usize..300, 1..40),
  ) {
    let mut pool = checked_pool(CAPACITY);

    for size in sizes {
      if let Ok(allocation) = pool.allocate(size) {
        prop_assert!(allocation.size() >= size);
        prop_assert_eq!(pool.get(allocation).map(<[u8]>::len), Some(allocation.size()));
      }
    }
  }

  #[test]
  fn exhaustion_yields_out_of_memory(
    size in 0usize..512,
  ) {
    let mut pool = checked_pool(CAPACITY);
    let mut reserved = 0;

    let err = loop {
      match pool.allocate(size) {
        Ok(allocation) => {
          reserved += allocation.size();
          prop_assert!(reserved <= CAPACITY);
        },
        Err(err) => break err,
      }
    };

    prop_assert_eq!(err, PoolError::OutOfMemory { requested: size });
  }

  #[test]
  fn freed_block_is_reused(
    size in 0usize..CAPACITY,
  ) {
    let mut pool = checked_pool(CAPACITY);

    let first = pool.allocate(size).unwrap();
    pool.deallocate(first).unwrap();
    let second = pool.allocate(size).unwrap();

    prop_assert_eq!(first, second);
  }

  #[test]
  fn same_operations_give_same_results(
    ops in proptest::collection::vec(op(), 1..60),
  ) {
    let mut a = checked_pool(CAPACITY);
    let mut b = checked_pool(CAPACITY);

    prop_assert_eq!(run(&mut a, &ops), run(&mut b, &ops));
    prop_assert_eq!(a.free_blocks().collect::<Vec<_>>(), b.free_blocks().collect::<Vec<_>>());
  }

  #[test]
  fn checked_mode_rejects_every_repeated_free(
    sizes in proptest::collection::vec(0usize..200, 1..20),
  ) {
    let mut pool = checked_pool(CAPACITY);
    let allocations: Vec<_> = sizes.iter().filter_map(|size| pool.allocate(*size).ok()).collect();

    let mut freed = HashMap::new();
    for allocation in &allocations {
      pool.deallocate(*allocation).unwrap();
      freed.insert(allocation.offset(), *allocation);
    }

    for allocation in freed.values() {
      prop_assert_eq!(
        pool.deallocate(*allocation),
        Err(PoolError::DoubleFree { offset: allocation.offset() })
      );
    }
  }
}
