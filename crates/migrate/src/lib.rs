//! Column migration into NUMA-pinned pools
//!
//! The engine walks one column of one table, deep-copies each chunk's
//! segment into an append-only pool bound to the target node, and swaps the
//! copy into the chunk. Pool sizes are estimates — the exact footprint after
//! alignment is unknowable up front — so allocation failure is part of the
//! normal control flow: the active pool is committed (if it holds anything)
//! or discarded, the estimate grows, and the same segment is retried against
//! a fresh pool.
//!
//! Termination argument for the retry loop: every retry either commits a
//! pool holding at least one segment (monotone progress through the column)
//! or doubles the size estimate (monotone growth until a single segment
//! fits). A configurable attempt ceiling turns a misbehaving host into a
//! loud failure instead of an unbounded loop.

mod copy;
pub mod engine;
pub mod export;
pub mod journal;

pub use engine::{MigrationConfig, MigrationEngine, MigrationReport};
pub use export::{MEM_REGIONS_FORMAT, export_memory_regions, unit_id, write_memory_regions};
pub use journal::MigrationJournal;
