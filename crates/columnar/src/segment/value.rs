//! Plain (unencoded) segments

use std::sync::Arc;

use strata_memory::{AllocResult, NumaPool};

use crate::buffer::{AddressRange, PoolBuffer};
use crate::error::StorageError;
use crate::types::SegmentValue;

/// Directly stored typed values, optionally nullable.
///
/// The null mask runs parallel to the value array; a masked row keeps a
/// default element in the value slot so the arrays stay rectangular.
#[derive(Debug)]
pub struct ValueSegment<T: SegmentValue> {
    values: PoolBuffer<T>,
    null_mask: Option<PoolBuffer<bool>>,
}

impl<T: SegmentValue> ValueSegment<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self {
            values: PoolBuffer::from_vec(values),
            null_mask: None,
        }
    }

    pub fn nullable(values: Vec<T>, null_mask: Vec<bool>) -> Result<Self, StorageError> {
        if values.len() != null_mask.len() {
            return Err(StorageError::LengthMismatch {
                values: values.len(),
                nulls: null_mask.len(),
            });
        }
        Ok(Self {
            values: PoolBuffer::from_vec(values),
            null_mask: Some(PoolBuffer::from_vec(null_mask)),
        })
    }

    fn from_parts(values: PoolBuffer<T>, null_mask: Option<PoolBuffer<bool>>) -> Self {
        Self { values, null_mask }
    }

    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    /// Value at `row`; `None` for a NULL marker.
    pub fn get(&self, row: usize) -> Option<T> {
        if let Some(mask) = &self.null_mask {
            if mask[row] {
                return None;
            }
        }
        Some(self.values[row])
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn null_mask(&self) -> Option<&[bool]> {
        self.null_mask.as_deref()
    }

    pub fn is_nullable(&self) -> bool {
        self.null_mask.is_some()
    }

    /// Full memory footprint of the backing buffers.
    pub fn memory_usage(&self) -> usize {
        self.values.byte_size() + self.null_mask.as_ref().map_or(0, PoolBuffer::byte_size)
    }

    /// Pool-based copy constructor: a value-identical twin whose buffers
    /// live in `pool`.
    pub fn copy_into_pool(&self, pool: &Arc<NumaPool>) -> AllocResult<Self> {
        let values = self.values.copy_into_pool(pool)?;
        let null_mask = match &self.null_mask {
            Some(mask) => Some(mask.copy_into_pool(pool)?),
            None => None,
        };
        Ok(Self::from_parts(values, null_mask))
    }

    /// One range per live allocation unit (value array, then null mask).
    pub fn address_ranges(&self) -> Vec<AddressRange> {
        let mut ranges = vec![self.values.address_range()];
        if let Some(mask) = &self.null_mask {
            ranges.push(mask.address_range());
        }
        ranges
    }

    /// The pool the value array lives in, if pool-backed.
    pub fn backing_pool(&self) -> Option<&Arc<NumaPool>> {
        self.values.backing_pool()
    }
}

/// Plain text segment. Heap-only: variable-length rows have no pool-based
/// copy constructor, and the migration engine treats this kind as
/// unsupported rather than silently skipping it.
#[derive(Debug)]
pub struct TextValueSegment {
    values: Vec<String>,
    null_mask: Option<Vec<bool>>,
}

impl TextValueSegment {
    pub fn new(values: Vec<String>) -> Self {
        Self { values, null_mask: None }
    }

    pub fn nullable(values: Vec<String>, null_mask: Vec<bool>) -> Result<Self, StorageError> {
        if values.len() != null_mask.len() {
            return Err(StorageError::LengthMismatch {
                values: values.len(),
                nulls: null_mask.len(),
            });
        }
        Ok(Self { values, null_mask: Some(null_mask) })
    }

    pub fn row_count(&self) -> usize {
        self.values.len()
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        if let Some(mask) = &self.null_mask {
            if mask[row] {
                return None;
            }
        }
        Some(&self.values[row])
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }

    pub fn null_mask(&self) -> Option<&[bool]> {
        self.null_mask.as_deref()
    }

    pub fn memory_usage(&self) -> usize {
        let strings: usize = self.values.iter().map(String::len).sum();
        strings
            + self.values.len() * core::mem::size_of::<String>()
            + self.null_mask.as_ref().map_or(0, Vec::len)
    }
}
