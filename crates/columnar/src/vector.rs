//! Fixed-width compressed index vectors
//!
//! Dictionary segments reference their dictionary through a vector of value
//! ids stored at the smallest unsigned width that can hold the highest id
//! (u8, u16 or u32).

use std::sync::Arc;

use strata_memory::{AllocResult, NumaPool};

use crate::buffer::{AddressRange, PoolBuffer};

/// Index vector compressed to the narrowest sufficient integer width.
#[derive(Debug)]
pub enum FixedWidthVector {
    U8(PoolBuffer<u8>),
    U16(PoolBuffer<u16>),
    U32(PoolBuffer<u32>),
}

impl FixedWidthVector {
    /// Compress `ids`, choosing the width from the highest id present.
    pub fn compress(ids: &[u32]) -> Self {
        let max = ids.iter().copied().max().unwrap_or(0);
        if max <= u32::from(u8::MAX) {
            Self::U8(PoolBuffer::from_vec(ids.iter().map(|&id| id as u8).collect()))
        } else if max <= u32::from(u16::MAX) {
            Self::U16(PoolBuffer::from_vec(ids.iter().map(|&id| id as u16).collect()))
        } else {
            Self::U32(PoolBuffer::from_vec(ids.to_vec()))
        }
    }

    /// Value id at `row`.
    pub fn get(&self, row: usize) -> u32 {
        match self {
            Self::U8(ids) => u32::from(ids[row]),
            Self::U16(ids) => u32::from(ids[row]),
            Self::U32(ids) => ids[row],
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::U8(ids) => ids.len(),
            Self::U16(ids) => ids.len(),
            Self::U32(ids) => ids.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes per stored id.
    pub fn width_bytes(&self) -> usize {
        match self {
            Self::U8(_) => 1,
            Self::U16(_) => 2,
            Self::U32(_) => 4,
        }
    }

    /// Occupied bytes.
    pub fn byte_size(&self) -> usize {
        self.len() * self.width_bytes()
    }

    /// Deep-copy into `pool`, preserving the width.
    pub fn copy_into_pool(&self, pool: &Arc<NumaPool>) -> AllocResult<Self> {
        Ok(match self {
            Self::U8(ids) => Self::U8(ids.copy_into_pool(pool)?),
            Self::U16(ids) => Self::U16(ids.copy_into_pool(pool)?),
            Self::U32(ids) => Self::U32(ids.copy_into_pool(pool)?),
        })
    }

    /// Byte range of the id array.
    pub fn address_range(&self) -> AddressRange {
        match self {
            Self::U8(ids) => ids.address_range(),
            Self::U16(ids) => ids.address_range(),
            Self::U32(ids) => ids.address_range(),
        }
    }

    /// The pool the id array lives in, if pool-backed.
    pub fn backing_pool(&self) -> Option<&Arc<NumaPool>> {
        match self {
            Self::U8(ids) => ids.backing_pool(),
            Self::U16(ids) => ids.backing_pool(),
            Self::U32(ids) => ids.backing_pool(),
        }
    }
}
