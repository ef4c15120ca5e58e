use rpool::{Allocation, PoolAllocator, PoolError};
use tracing::info;
use tracing_subscriber::EnvFilter;

const POOL_SIZE: usize = 1024;

/// Prints the current program break using `sbrk(0)`.
/// Pool allocations should leave it where construction put it.
#[cfg(unix)]
fn print_program_break(label: &str) {
  println!(
    "[{}] PID = {}, program break (sbrk(0)) = {:?}",
    label,
    std::process::id(),
    unsafe { libc::sbrk(0) },
  );
}

#[cfg(not(unix))]
fn print_program_break(_label: &str) {}

fn print_alloc(
  requested: usize,
  result: &Result<Allocation, PoolError>,
) {
  match result {
    Ok(block) => println!(
      "Allocated {} bytes at offset {:#06x} ({} bytes reserved)",
      requested,
      block.offset(),
      block.size()
    ),
    Err(err) => println!("Allocation of {requested} bytes failed: {err}"),
  }
}

fn main() -> Result<(), PoolError> {
  tracing_subscriber::fmt()
    .with_env_filter(
      EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("rpool=info")),
    )
    .with_target(false)
    .init();

  let mut allocator = PoolAllocator::new(POOL_SIZE)?;
  info!(capacity = allocator.capacity(), "pool ready");

  print_program_break("after construction");

  // Allocate 128 bytes
  let p1 = allocator.allocate(128);
  print_alloc(128, &p1);
  let p1 = p1?;

  // Allocate 256 bytes
  let p2 = allocator.allocate(256);
  print_alloc(256, &p2);
  let p2 = p2?;

  // Deallocate p1
  allocator.deallocate(p1)?;
  println!("Deallocated memory at offset {:#06x}", p1.offset());

  // Allocate 64 bytes, which lands in the block p1 gave back
  let p3 = allocator.allocate(64);
  print_alloc(64, &p3);
  let p3 = p3?;

  println!(
    "p3 == p1? {}",
    if p3.offset() == p1.offset() {
      "Yes, it reused the freed block"
    } else {
      "No, it allocated somewhere else"
    }
  );

  // Ask for more than is left to show the failure path
  let too_big = allocator.allocate(POOL_SIZE);
  print_alloc(POOL_SIZE, &too_big);

  print_program_break("after allocations");

  let stats = allocator.stats();
  info!(
    free_bytes = stats.free_bytes,
    free_blocks = stats.free_blocks,
    largest_free_block = stats.largest_free_block,
    "free list"
  );

  allocator.deallocate(p2)?;
  allocator.deallocate(p3)?;

  let outstanding = allocator.destroy();
  info!(outstanding, "pool destroyed");

  Ok(())
}
