//! # rpool - A Fixed-Capacity Pool Allocator
//!
//! This crate provides a **pool allocator** that carves one pre-allocated byte
//! region into variably-sized blocks and takes them back for reuse, so a
//! workload of many short-lived allocations never reaches the system allocator.
//!
//! ## Overview
//!
//! The free blocks of the region form a singly linked list whose links live in
//! the free bytes themselves:
//!
//! ```text
//!   Pool Region (capacity bytes, allocated once):
//!
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │  ┌────────┬──────────┬────────┬────────────┬──────────────────────┐  │
//!   │  │  Free  │  In use  │  Free  │   In use   │         Free         │  │
//!   │  └───┬────┴──────────┴───▲────┴────────────┴──────────▲───────────┘  │
//!   │      │                   │                            │              │
//!   │      └── next ───────────┘                            │              │
//!   │   root                   └──────── next ──────────────┘              │
//!   │                                                                      │
//!   └──────────────────────────────────────────────────────────────────────┘
//!
//!   Blocks in use are not linked anywhere: "in use" means "not on the list".
//! ```
//!
//! ## Crate Structure
//!
//! ```text
//!   rpool
//!   ├── align      - Alignment macros and helpers (align!, align_to!)
//!   ├── block      - Free-block header layout (internal)
//!   ├── config     - PoolConfig, loadable from TOML
//!   ├── error      - PoolError, ConfigError
//!   ├── pool       - PoolAllocator implementation
//!   └── shared     - SharedPool, a mutex-guarded PoolAllocator
//! ```
//!
//! ## Quick Start
//!
//! ```rust
//! use rpool::PoolAllocator;
//!
//! let mut pool = PoolAllocator::new(1024)?;
//!
//! let block = pool.allocate(128)?;
//! pool.get_mut(block).unwrap()[..5].copy_from_slice(b"hello");
//!
//! pool.deallocate(block)?;
//! # Ok::<(), rpool::PoolError>(())
//! ```
//!
//! ## How It Works
//!
//! Each free block starts with a two-word header:
//!
//! ```text
//!   Free Block:
//!   ┌───────────────────────┬────────────────────────────────┐
//!   │    Block Header       │                                │
//!   │  ┌─────────────────┐  │                                │
//!   │  │ size: N         │  │        unused free bytes       │
//!   │  │ next: offset    │  │                                │
//!   │  └─────────────────┘  │                                │
//!   │   2 machine words     │                                │
//!   └───────────────────────┴────────────────────────────────┘
//!   ▲
//!   └── offset handed to the caller once the block is allocated
//! ```
//!
//! Allocation rounds the request up to the machine word (and to at least one
//! header), then walks the list from the root and takes the **first** block
//! that is large enough. When the rest of that block can still hold a header
//! it becomes a new free block in the same list position:
//!
//! ```text
//!   allocate(64) on a free 128-byte block:
//!
//!   before   ┌────────────────────── 128 ──────────────────────┐
//!            │ Free                                            │
//!            └─────────────────────────────────────────────────┘
//!   after    ┌──────────── 64 ─────────┬──────────── 64 ────────┐
//!            │ In use (returned)       │ Free (relinked)        │
//!            └─────────────────────────┴────────────────────────┘
//! ```
//!
//! Deallocation writes a fresh header into the block and pushes it on the
//! head of the list.
//!
//! ## Features
//!
//! - **No system calls after construction**: the region is allocated once
//! - **Safe handles**: allocations are offsets into the region, not pointers
//! - **Checked mode**: double frees and foreign handles are reported as errors
//! - **Thread sharing**: [`SharedPool`] serialises access behind one mutex
//!
//! ## Limitations
//!
//! - **Fixed size**: the region never grows
//! - **No coalescing**: adjacent free blocks are never merged, so long
//!   alloc/free sequences fragment the region
//! - **List-order search**: the first fit is the first block on the list, which
//!   after frees is not the lowest address
//! - **Trusting release mode**: without checked mode a repeated free corrupts
//!   the free list (safely, but the blocks involved are lost)

#![deny(unsafe_code)]

pub mod align;
mod block;
mod config;
mod error;
mod pool;
mod shared;

pub use block::NODE_SIZE;
pub use config::{DEFAULT_CAPACITY, PoolConfig};
pub use error::{ConfigError, PoolError, Result};
pub use pool::{Allocation, FreeBlocks, PoolAllocator, PoolStats};
pub use shared::SharedPool;
