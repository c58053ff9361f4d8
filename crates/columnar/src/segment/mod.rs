//! Segment union
//!
//! The storage unit for one column within one chunk, as a closed tagged
//! union over {plain, dictionary-encoded} × {int32, int64, float32,
//! float64, text}. Consumers dispatch with an exhaustive `match`, so adding
//! a kind is a compile-time event rather than a runtime fallthrough.

mod dictionary;
mod value;

pub use dictionary::{DictionarySegment, TextDictionary, TextDictionarySegment};
pub use value::{TextValueSegment, ValueSegment};

use crate::buffer::AddressRange;
use crate::error::StorageError;
use crate::table::ColumnDefinition;
use crate::types::{DataType, SegmentValue, Value};

/// Physical layout family of a segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EncodingKind {
    Plain,
    Dictionary,
}

/// One column's storage within one chunk.
#[derive(Debug)]
pub enum Segment {
    ValueInt32(ValueSegment<i32>),
    ValueInt64(ValueSegment<i64>),
    ValueFloat32(ValueSegment<f32>),
    ValueFloat64(ValueSegment<f64>),
    ValueText(TextValueSegment),
    DictionaryInt32(DictionarySegment<i32>),
    DictionaryInt64(DictionarySegment<i64>),
    DictionaryFloat32(DictionarySegment<f32>),
    DictionaryFloat64(DictionarySegment<f64>),
    DictionaryText(TextDictionarySegment),
}

impl Segment {
    /// Build a plain segment from row values for `column`.
    ///
    /// NULL markers require the column to be nullable; masked rows keep a
    /// default element in the value slot.
    pub fn from_values(
        column: &ColumnDefinition,
        values: Vec<Value>,
    ) -> Result<Self, StorageError> {
        match column.data_type {
            DataType::Int32 => build_numeric(column, values, |v| match v {
                Value::Int32(v) => Some(v),
                _ => None,
            })
            .map(Segment::ValueInt32),
            DataType::Int64 => build_numeric(column, values, |v| match v {
                Value::Int64(v) => Some(v),
                _ => None,
            })
            .map(Segment::ValueInt64),
            DataType::Float32 => build_numeric(column, values, |v| match v {
                Value::Float32(v) => Some(v),
                _ => None,
            })
            .map(Segment::ValueFloat32),
            DataType::Float64 => build_numeric(column, values, |v| match v {
                Value::Float64(v) => Some(v),
                _ => None,
            })
            .map(Segment::ValueFloat64),
            DataType::Text => build_text_segment(column, values).map(Segment::ValueText),
        }
    }

    pub fn data_type(&self) -> DataType {
        match self {
            Self::ValueInt32(_) | Self::DictionaryInt32(_) => DataType::Int32,
            Self::ValueInt64(_) | Self::DictionaryInt64(_) => DataType::Int64,
            Self::ValueFloat32(_) | Self::DictionaryFloat32(_) => DataType::Float32,
            Self::ValueFloat64(_) | Self::DictionaryFloat64(_) => DataType::Float64,
            Self::ValueText(_) | Self::DictionaryText(_) => DataType::Text,
        }
    }

    pub fn encoding(&self) -> EncodingKind {
        match self {
            Self::ValueInt32(_)
            | Self::ValueInt64(_)
            | Self::ValueFloat32(_)
            | Self::ValueFloat64(_)
            | Self::ValueText(_) => EncodingKind::Plain,
            Self::DictionaryInt32(_)
            | Self::DictionaryInt64(_)
            | Self::DictionaryFloat32(_)
            | Self::DictionaryFloat64(_)
            | Self::DictionaryText(_) => EncodingKind::Dictionary,
        }
    }

    pub fn row_count(&self) -> usize {
        match self {
            Self::ValueInt32(s) => s.row_count(),
            Self::ValueInt64(s) => s.row_count(),
            Self::ValueFloat32(s) => s.row_count(),
            Self::ValueFloat64(s) => s.row_count(),
            Self::ValueText(s) => s.row_count(),
            Self::DictionaryInt32(s) => s.row_count(),
            Self::DictionaryInt64(s) => s.row_count(),
            Self::DictionaryFloat32(s) => s.row_count(),
            Self::DictionaryFloat64(s) => s.row_count(),
            Self::DictionaryText(s) => s.row_count(),
        }
    }

    /// Decoded cell value at `row`.
    pub fn value(&self, row: usize) -> Value {
        match self {
            Self::ValueInt32(s) => wrap(s.get(row)),
            Self::ValueInt64(s) => wrap(s.get(row)),
            Self::ValueFloat32(s) => wrap(s.get(row)),
            Self::ValueFloat64(s) => wrap(s.get(row)),
            Self::ValueText(s) => wrap_text(s.get(row)),
            Self::DictionaryInt32(s) => wrap(s.get(row)),
            Self::DictionaryInt64(s) => wrap(s.get(row)),
            Self::DictionaryFloat32(s) => wrap(s.get(row)),
            Self::DictionaryFloat64(s) => wrap(s.get(row)),
            Self::DictionaryText(s) => wrap_text(s.get(row)),
        }
    }

    /// Full memory footprint of the backing storage, the quantity the
    /// migration engine sizes pools from.
    pub fn memory_usage(&self) -> usize {
        match self {
            Self::ValueInt32(s) => s.memory_usage(),
            Self::ValueInt64(s) => s.memory_usage(),
            Self::ValueFloat32(s) => s.memory_usage(),
            Self::ValueFloat64(s) => s.memory_usage(),
            Self::ValueText(s) => s.memory_usage(),
            Self::DictionaryInt32(s) => s.memory_usage(),
            Self::DictionaryInt64(s) => s.memory_usage(),
            Self::DictionaryFloat32(s) => s.memory_usage(),
            Self::DictionaryFloat64(s) => s.memory_usage(),
            Self::DictionaryText(s) => s.memory_usage(),
        }
    }

    /// Byte ranges of every live allocation unit, for the address export.
    pub fn address_ranges(&self) -> Vec<AddressRange> {
        match self {
            Self::ValueInt32(s) => s.address_ranges(),
            Self::ValueInt64(s) => s.address_ranges(),
            Self::ValueFloat32(s) => s.address_ranges(),
            Self::ValueFloat64(s) => s.address_ranges(),
            Self::ValueText(_) => Vec::new(),
            Self::DictionaryInt32(s) => s.address_ranges(),
            Self::DictionaryInt64(s) => s.address_ranges(),
            Self::DictionaryFloat32(s) => s.address_ranges(),
            Self::DictionaryFloat64(s) => s.address_ranges(),
            Self::DictionaryText(s) => s.address_ranges(),
        }
    }
}

fn wrap<T: SegmentValue>(value: Option<T>) -> Value {
    value.map_or(Value::Null, SegmentValue::into_value)
}

fn wrap_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |s| Value::Text(s.to_owned()))
}

fn build_numeric<T: SegmentValue + Default>(
    column: &ColumnDefinition,
    values: Vec<Value>,
    extract: impl Fn(Value) -> Option<T>,
) -> Result<ValueSegment<T>, StorageError> {
    let mut data = Vec::with_capacity(values.len());
    let mut null_mask = Vec::with_capacity(values.len());
    let mut any_null = false;

    for value in values {
        if value.is_null() {
            if !column.nullable {
                return Err(StorageError::NullNotAllowed { column: column.name.clone() });
            }
            any_null = true;
            data.push(T::default());
            null_mask.push(true);
        } else {
            let got = value.data_type().expect("non-null value has a type");
            let extracted = extract(value).ok_or(StorageError::TypeMismatch {
                column: column.name.clone(),
                expected: column.data_type,
                got,
            })?;
            data.push(extracted);
            null_mask.push(false);
        }
    }

    if column.nullable || any_null {
        ValueSegment::nullable(data, null_mask)
    } else {
        Ok(ValueSegment::new(data))
    }
}

fn build_text_segment(
    column: &ColumnDefinition,
    values: Vec<Value>,
) -> Result<TextValueSegment, StorageError> {
    let mut data = Vec::with_capacity(values.len());
    let mut null_mask = Vec::with_capacity(values.len());
    let mut any_null = false;

    for value in values {
        match value {
            Value::Null => {
                if !column.nullable {
                    return Err(StorageError::NullNotAllowed { column: column.name.clone() });
                }
                any_null = true;
                data.push(String::new());
                null_mask.push(true);
            }
            Value::Text(s) => {
                data.push(s);
                null_mask.push(false);
            }
            other => {
                return Err(StorageError::TypeMismatch {
                    column: column.name.clone(),
                    expected: column.data_type,
                    got: other.data_type().expect("non-null value has a type"),
                });
            }
        }
    }

    if column.nullable || any_null {
        TextValueSegment::nullable(data, null_mask)
    } else {
        Ok(TextValueSegment::new(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use strata_memory::{NumaNode, NumaPool};

    fn int_column(nullable: bool) -> ColumnDefinition {
        ColumnDefinition::new("n", DataType::Int32, nullable)
    }

    #[test]
    fn plain_segment_round_trips_with_nulls() {
        let segment = Segment::from_values(
            &int_column(true),
            vec![Value::Int32(7), Value::Null, Value::Int32(-3)],
        )
        .expect("build failed");

        assert_eq!(segment.data_type(), DataType::Int32);
        assert_eq!(segment.encoding(), EncodingKind::Plain);
        assert_eq!(segment.row_count(), 3);
        assert_eq!(segment.value(0), Value::Int32(7));
        assert_eq!(segment.value(1), Value::Null);
        assert_eq!(segment.value(2), Value::Int32(-3));
        // Value array plus null mask.
        assert_eq!(segment.memory_usage(), 3 * 4 + 3);
        assert_eq!(segment.address_ranges().len(), 2);
    }

    #[test]
    fn null_in_non_nullable_column_is_rejected() {
        let err = Segment::from_values(&int_column(false), vec![Value::Null])
            .expect_err("null must be rejected");
        assert!(matches!(err, StorageError::NullNotAllowed { .. }));
    }

    #[test]
    fn mistyped_value_is_rejected() {
        let err = Segment::from_values(&int_column(false), vec![Value::Int64(1)])
            .expect_err("type mismatch must be rejected");
        assert!(matches!(
            err,
            StorageError::TypeMismatch { expected: DataType::Int32, got: DataType::Int64, .. }
        ));
    }

    #[test]
    fn value_segment_pool_copy_is_identical() {
        let pool = Arc::new(NumaPool::create(4096, NumaNode(0)));
        let segment = ValueSegment::nullable(vec![1i64, 0, 3], vec![false, true, false])
            .expect("build failed");

        let copy = segment.copy_into_pool(&pool).expect("copy failed");
        assert_eq!(copy.get(0), Some(1));
        assert_eq!(copy.get(1), None);
        assert_eq!(copy.get(2), Some(3));
        assert_eq!(copy.memory_usage(), segment.memory_usage());
        assert!(copy.backing_pool().is_some());
        assert!(segment.backing_pool().is_none());
        assert_eq!(pool.allocated_bytes(), segment.memory_usage());
    }

    #[test]
    fn dictionary_segment_pool_copy_is_identical() {
        let pool = Arc::new(NumaPool::create(4096, NumaNode(0)));
        // Rows decode as [20, 10, NULL, 20].
        let segment = DictionarySegment::new(vec![10i32, 20], &[1, 0, 2, 1]);
        assert_eq!(segment.null_value_id(), 2);

        let copy = segment.copy_into_pool(&pool).expect("copy failed");
        assert_eq!(copy.get(0), Some(20));
        assert_eq!(copy.get(1), Some(10));
        assert_eq!(copy.get(2), None);
        assert_eq!(copy.get(3), Some(20));
        assert_eq!(copy.unique_values(), 2);
        assert!(copy.backing_pool().is_some());
        for range in copy.address_ranges() {
            assert!(pool.contains(range.start));
        }
    }
}
