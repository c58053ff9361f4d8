//! Columnar storage surface for the Strata migration core
//!
//! A deliberately narrow model of the surrounding engine: tables partitioned
//! into row chunks, one segment per column per chunk, segments either plain
//! (typed value array, optionally nullable) or dictionary-encoded
//! (deduplicated dictionary plus a fixed-width index vector).
//!
//! What makes this crate different from an ordinary columnar store is that
//! every segment's backing buffers know where they live: a [`PoolBuffer`]
//! is backed either by the global heap or by a registered
//! [`strata_memory::NumaPool`], and each segment kind exposes a pool-aware
//! copy constructor producing a value-identical twin inside a given pool.
//! The migration engine is built entirely on those primitives.

#![allow(unsafe_code)]

pub mod buffer;
pub mod chunk;
pub mod encode;
pub mod error;
pub mod segment;
pub mod table;
pub mod types;
pub mod vector;

pub use buffer::{AddressRange, PoolBuffer, PoolString};
pub use chunk::Chunk;
pub use error::StorageError;
pub use segment::{
    DictionarySegment, EncodingKind, Segment, TextDictionary, TextDictionarySegment,
    TextValueSegment, ValueSegment,
};
pub use table::{ColumnDefinition, Table};
pub use types::{ChunkId, ColumnId, DataType, SegmentValue, Value};
pub use vector::FixedWidthVector;
