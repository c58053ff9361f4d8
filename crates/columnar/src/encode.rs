//! Dictionary encoding
//!
//! Rewrites plain segments into dictionary segments: the value domain is
//! sorted and deduplicated, every row becomes an index into it, and NULL
//! becomes the one-past-the-end id. Already-encoded segments are left
//! untouched, so the pass is idempotent.

use std::sync::Arc;

use tracing::debug;

use crate::segment::{
    DictionarySegment, Segment, TextDictionarySegment, TextValueSegment, ValueSegment,
};
use crate::table::Table;
use crate::types::{ChunkId, ColumnId, SegmentValue};

/// Dictionary-encode one column across every chunk of `table`.
pub fn dictionary_encode_column(table: &mut Table, column: ColumnId) {
    for chunk_id in 0..table.chunk_count() {
        let chunk = table.chunk_mut(ChunkId(chunk_id));
        let segment = chunk.segment(column);
        if let Some(encoded) = encode_segment(&segment) {
            chunk.replace_segment(column, Arc::new(encoded));
        }
    }
    debug!(column = %column, "column dictionary-encoded");
}

/// Dictionary-encode every column of `table`.
pub fn dictionary_encode_table(table: &mut Table) {
    for idx in 0..table.column_count() {
        dictionary_encode_column(table, ColumnId(idx as u16));
    }
}

/// Encoded twin of a plain segment, or `None` if the segment is already
/// dictionary-encoded.
fn encode_segment(segment: &Segment) -> Option<Segment> {
    match segment {
        Segment::ValueInt32(s) => Some(Segment::DictionaryInt32(encode_numeric(s))),
        Segment::ValueInt64(s) => Some(Segment::DictionaryInt64(encode_numeric(s))),
        Segment::ValueFloat32(s) => Some(Segment::DictionaryFloat32(encode_numeric(s))),
        Segment::ValueFloat64(s) => Some(Segment::DictionaryFloat64(encode_numeric(s))),
        Segment::ValueText(s) => Some(Segment::DictionaryText(encode_text(s))),
        Segment::DictionaryInt32(_)
        | Segment::DictionaryInt64(_)
        | Segment::DictionaryFloat32(_)
        | Segment::DictionaryFloat64(_)
        | Segment::DictionaryText(_) => None,
    }
}

fn encode_numeric<T: SegmentValue>(segment: &ValueSegment<T>) -> DictionarySegment<T> {
    let mut dictionary: Vec<T> = (0..segment.row_count())
        .filter_map(|row| segment.get(row))
        .collect();
    dictionary.sort_by(SegmentValue::total_order);
    dictionary.dedup_by(|a, b| a.total_order(b).is_eq());

    let null_id = dictionary.len() as u32;
    let value_ids: Vec<u32> = (0..segment.row_count())
        .map(|row| {
            segment.get(row).map_or(null_id, |value| {
                dictionary
                    .binary_search_by(|probe| probe.total_order(&value))
                    .expect("encoded value is in its own dictionary") as u32
            })
        })
        .collect();

    DictionarySegment::new(dictionary, &value_ids)
}

fn encode_text(segment: &TextValueSegment) -> TextDictionarySegment {
    let mut dictionary: Vec<String> = (0..segment.row_count())
        .filter_map(|row| segment.get(row).map(str::to_owned))
        .collect();
    dictionary.sort();
    dictionary.dedup();

    let null_id = dictionary.len() as u32;
    let value_ids: Vec<u32> = (0..segment.row_count())
        .map(|row| {
            segment.get(row).map_or(null_id, |value| {
                dictionary
                    .binary_search_by(|probe| probe.as_str().cmp(value))
                    .expect("encoded value is in its own dictionary") as u32
            })
        })
        .collect();

    TextDictionarySegment::new(dictionary, &value_ids)
}
