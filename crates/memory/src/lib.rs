//! NUMA-pinned monotonic memory pools
//!
//! This crate provides the memory substrate for column migration: fixed-size
//! arenas whose backing pages are bound to a specific NUMA node (modeling
//! tiered or CXL-attached memory), and a registry that owns them.
//!
//! Pools are append-only for their lifetime:
//! - [`NumaPool::allocate`] bumps a cursor and never reuses an address
//! - [`NumaPool::deallocate`] only adjusts the accounting counter
//! - the backing buffer is released exactly once, when the pool is dropped
//!
//! The single-writer model is deliberate. A pool uses [`core::cell::Cell`]
//! cursors and is `!Sync`; callers that need cross-thread access must
//! serialize externally.

#![allow(unsafe_code)]

pub mod error;
pub mod platform;
pub mod pool;
pub mod registry;

pub use error::{AllocResult, MemoryError};
pub use platform::{NumaNode, node_count, numa_available};
pub use pool::NumaPool;
pub use registry::{PoolId, PoolRegistry};

/// Log an unrecoverable diagnostic and terminate.
///
/// Used for the conditions the engine treats as programming or configuration
/// errors: invalid NUMA nodes, unknown pool ids, shared-ownership violations,
/// unsupported segment kinds. These must never be silently ignored.
#[macro_export]
macro_rules! fatal {
    ($($arg:tt)*) => {{
        ::tracing::error!($($arg)*);
        panic!($($arg)*);
    }};
}
