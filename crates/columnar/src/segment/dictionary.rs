//! Dictionary-encoded segments
//!
//! A dictionary segment stores the deduplicated, sorted value domain once
//! and references it through a fixed-width index vector. NULL is encoded as
//! the one-past-the-end value id (`dictionary.len()`), so a nullable column
//! widens its index vector only when the dictionary is exactly at a width
//! boundary.

use std::sync::Arc;

use strata_memory::{AllocResult, NumaPool};

use crate::buffer::{AddressRange, PoolBuffer, PoolString};
use crate::types::SegmentValue;
use crate::vector::FixedWidthVector;

/// Dictionary segment over a fixed-width element type.
#[derive(Debug)]
pub struct DictionarySegment<T: SegmentValue> {
    dictionary: PoolBuffer<T>,
    attribute_vector: FixedWidthVector,
}

impl<T: SegmentValue> DictionarySegment<T> {
    /// Assemble from an already sorted, deduplicated dictionary and the
    /// per-row value ids.
    pub fn new(dictionary: Vec<T>, value_ids: &[u32]) -> Self {
        Self {
            dictionary: PoolBuffer::from_vec(dictionary),
            attribute_vector: FixedWidthVector::compress(value_ids),
        }
    }

    /// Assemble from pre-built parts, used by the pool copy path.
    pub fn from_parts(dictionary: PoolBuffer<T>, attribute_vector: FixedWidthVector) -> Self {
        Self { dictionary, attribute_vector }
    }

    /// Value id that encodes NULL.
    pub fn null_value_id(&self) -> u32 {
        self.dictionary.len() as u32
    }

    pub fn row_count(&self) -> usize {
        self.attribute_vector.len()
    }

    /// Decoded value at `row`; `None` for a NULL marker.
    pub fn get(&self, row: usize) -> Option<T> {
        let id = self.attribute_vector.get(row);
        if id == self.null_value_id() {
            None
        } else {
            Some(self.dictionary[id as usize])
        }
    }

    pub fn dictionary(&self) -> &[T] {
        &self.dictionary
    }

    pub fn attribute_vector(&self) -> &FixedWidthVector {
        &self.attribute_vector
    }

    pub fn unique_values(&self) -> usize {
        self.dictionary.len()
    }

    pub fn memory_usage(&self) -> usize {
        self.dictionary.byte_size() + self.attribute_vector.byte_size()
    }

    /// Pool-based copy constructor: dictionary and index vector both
    /// deep-copied into `pool`.
    pub fn copy_into_pool(&self, pool: &Arc<NumaPool>) -> AllocResult<Self> {
        Ok(Self::from_parts(
            self.dictionary.copy_into_pool(pool)?,
            self.attribute_vector.copy_into_pool(pool)?,
        ))
    }

    /// One range per allocation unit: dictionary array, then index vector.
    pub fn address_ranges(&self) -> Vec<AddressRange> {
        vec![
            self.dictionary.address_range(),
            self.attribute_vector.address_range(),
        ]
    }

    pub fn backing_pool(&self) -> Option<&Arc<NumaPool>> {
        self.dictionary.backing_pool()
    }
}

/// Deduplicated string domain of a text dictionary segment.
///
/// Heap-resident after encoding; migrated to per-string pool allocations by
/// the migration engine (strings have variable length and cannot be
/// bulk-copied the way fixed-width buffers can).
#[derive(Debug)]
pub enum TextDictionary {
    Heap(Vec<String>),
    Pool(Vec<PoolString>),
}

impl TextDictionary {
    pub fn len(&self) -> usize {
        match self {
            Self::Heap(strings) => strings.len(),
            Self::Pool(strings) => strings.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, id: usize) -> &str {
        match self {
            Self::Heap(strings) => &strings[id],
            Self::Pool(strings) => strings[id].as_str(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        (0..self.len()).map(move |id| self.get(id))
    }

    /// Total string bytes plus container spine.
    pub fn byte_size(&self) -> usize {
        let strings: usize = self.iter().map(str::len).sum();
        let spine = match self {
            Self::Heap(s) => s.len() * core::mem::size_of::<String>(),
            Self::Pool(s) => s.len() * core::mem::size_of::<PoolString>(),
        };
        strings + spine
    }

    /// One byte range per string (pool-backed dictionaries only expose the
    /// string payloads; the spine is engine-side bookkeeping).
    pub fn string_ranges(&self) -> Vec<AddressRange> {
        match self {
            Self::Heap(strings) => strings
                .iter()
                .map(|s| {
                    let start = s.as_ptr() as usize;
                    AddressRange { start, end: start + s.len() }
                })
                .collect(),
            Self::Pool(strings) => strings.iter().map(PoolString::address_range).collect(),
        }
    }
}

/// Dictionary segment over text.
#[derive(Debug)]
pub struct TextDictionarySegment {
    dictionary: TextDictionary,
    attribute_vector: FixedWidthVector,
}

impl TextDictionarySegment {
    /// Assemble from an already sorted, deduplicated dictionary and the
    /// per-row value ids.
    pub fn new(dictionary: Vec<String>, value_ids: &[u32]) -> Self {
        Self {
            dictionary: TextDictionary::Heap(dictionary),
            attribute_vector: FixedWidthVector::compress(value_ids),
        }
    }

    /// Assemble from pre-built parts, used by the migration copy path.
    pub fn from_parts(dictionary: TextDictionary, attribute_vector: FixedWidthVector) -> Self {
        Self { dictionary, attribute_vector }
    }

    pub fn null_value_id(&self) -> u32 {
        self.dictionary.len() as u32
    }

    pub fn row_count(&self) -> usize {
        self.attribute_vector.len()
    }

    pub fn get(&self, row: usize) -> Option<&str> {
        let id = self.attribute_vector.get(row);
        if id == self.null_value_id() {
            None
        } else {
            Some(self.dictionary.get(id as usize))
        }
    }

    pub fn dictionary(&self) -> &TextDictionary {
        &self.dictionary
    }

    pub fn attribute_vector(&self) -> &FixedWidthVector {
        &self.attribute_vector
    }

    pub fn unique_values(&self) -> usize {
        self.dictionary.len()
    }

    pub fn memory_usage(&self) -> usize {
        self.dictionary.byte_size() + self.attribute_vector.byte_size()
    }

    /// Index-vector range, then one range per dictionary string.
    pub fn address_ranges(&self) -> Vec<AddressRange> {
        let mut ranges = vec![self.attribute_vector.address_range()];
        ranges.extend(self.dictionary.string_ranges());
        ranges
    }

    pub fn backing_pool(&self) -> Option<&Arc<NumaPool>> {
        self.attribute_vector.backing_pool()
    }
}
