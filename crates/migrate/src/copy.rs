//! Per-segment copy dispatch
//!
//! Exhaustive dispatch over the segment union. Fixed-width segments go
//! through their own pool-based copy constructors; text dictionaries are
//! reassembled here because their strings must be materialized in pool
//! memory one at a time. Kinds with no pool representation are fatal — a
//! silently skipped segment would leave the column half-migrated.

use std::sync::Arc;

use strata_columnar::{PoolString, Segment, TextDictionary, TextDictionarySegment};
use strata_memory::{AllocResult, NumaPool, fatal};

/// Value-identical copy of `segment` with every backing buffer allocated
/// from `pool`.
///
/// The only expected error is pool exhaustion, which the engine handles by
/// growing capacity and retrying.
pub(crate) fn copy_segment_into_pool(
    segment: &Segment,
    pool: &Arc<NumaPool>,
) -> AllocResult<Segment> {
    match segment {
        Segment::DictionaryInt32(s) => s.copy_into_pool(pool).map(Segment::DictionaryInt32),
        Segment::DictionaryInt64(s) => s.copy_into_pool(pool).map(Segment::DictionaryInt64),
        Segment::DictionaryFloat32(s) => s.copy_into_pool(pool).map(Segment::DictionaryFloat32),
        Segment::DictionaryFloat64(s) => s.copy_into_pool(pool).map(Segment::DictionaryFloat64),
        Segment::DictionaryText(s) => copy_text_dictionary(s, pool).map(Segment::DictionaryText),
        Segment::ValueInt32(s) => s.copy_into_pool(pool).map(Segment::ValueInt32),
        Segment::ValueInt64(s) => s.copy_into_pool(pool).map(Segment::ValueInt64),
        Segment::ValueFloat32(s) => s.copy_into_pool(pool).map(Segment::ValueFloat32),
        Segment::ValueFloat64(s) => s.copy_into_pool(pool).map(Segment::ValueFloat64),
        Segment::ValueText(_) => {
            fatal!("unsupported segment kind for migration: plain text");
        }
    }
}

/// Text dictionaries have no single-shot copy constructor: the index vector
/// copies through its own pool-aware path, then every string is deep-copied
/// into pool memory individually and the segment reassembled.
fn copy_text_dictionary(
    segment: &TextDictionarySegment,
    pool: &Arc<NumaPool>,
) -> AllocResult<TextDictionarySegment> {
    let attribute_vector = segment.attribute_vector().copy_into_pool(pool)?;

    let mut strings = Vec::with_capacity(segment.unique_values());
    for entry in segment.dictionary().iter() {
        strings.push(PoolString::copy_into_pool(entry, pool)?);
    }

    Ok(TextDictionarySegment::from_parts(
        TextDictionary::Pool(strings),
        attribute_vector,
    ))
}
