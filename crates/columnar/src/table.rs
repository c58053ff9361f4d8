//! Tables: named column definitions over a sequence of chunks

use std::sync::Arc;

use crate::chunk::Chunk;
use crate::error::StorageError;
use crate::segment::Segment;
use crate::types::{ChunkId, ColumnId, DataType, Value};

/// Name, type and nullability of one column.
#[derive(Debug, Clone)]
pub struct ColumnDefinition {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
}

impl ColumnDefinition {
    pub fn new(name: impl Into<String>, data_type: DataType, nullable: bool) -> Self {
        Self { name: name.into(), data_type, nullable }
    }
}

/// An in-memory table partitioned into row chunks.
///
/// Rows are appended through a per-column accumulator; a chunk is sealed
/// into plain segments whenever `target_chunk_rows` is reached (or on
/// [`Table::finalize`]). Encoding to dictionaries happens afterwards, per
/// chunk, through [`crate::encode`].
#[derive(Debug)]
pub struct Table {
    name: String,
    columns: Vec<ColumnDefinition>,
    chunks: Vec<Chunk>,
    target_chunk_rows: usize,
    pending: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(
        name: impl Into<String>,
        columns: Vec<ColumnDefinition>,
        target_chunk_rows: usize,
    ) -> Self {
        let pending = columns.iter().map(|_| Vec::new()).collect();
        Self {
            name: name.into(),
            columns,
            chunks: Vec::new(),
            target_chunk_rows: target_chunk_rows.max(1),
            pending,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Resolve a column name to its id.
    pub fn column_id_by_name(&self, name: &str) -> Option<ColumnId> {
        self.columns
            .iter()
            .position(|c| c.name == name)
            .map(|idx| ColumnId(idx as u16))
    }

    pub fn column_definition(&self, column: ColumnId) -> &ColumnDefinition {
        &self.columns[column.0 as usize]
    }

    /// Append one row, sealing the open chunk when it reaches the target
    /// row count.
    pub fn append_row(&mut self, row: Vec<Value>) -> Result<(), StorageError> {
        if row.len() != self.columns.len() {
            return Err(StorageError::ColumnCountMismatch {
                expected: self.columns.len(),
                got: row.len(),
            });
        }
        for (column, value) in self.columns.iter().zip(&row) {
            match value.data_type() {
                None => {
                    if !column.nullable {
                        return Err(StorageError::NullNotAllowed { column: column.name.clone() });
                    }
                }
                Some(got) => {
                    if got != column.data_type {
                        return Err(StorageError::TypeMismatch {
                            column: column.name.clone(),
                            expected: column.data_type,
                            got,
                        });
                    }
                }
            }
        }

        for (accumulator, value) in self.pending.iter_mut().zip(row) {
            accumulator.push(value);
        }
        if self.pending.first().is_some_and(|p| p.len() >= self.target_chunk_rows) {
            self.seal_chunk()?;
        }
        Ok(())
    }

    /// Seal any buffered rows into a final (possibly short) chunk.
    pub fn finalize(&mut self) -> Result<(), StorageError> {
        if self.pending.first().is_some_and(|p| !p.is_empty()) {
            self.seal_chunk()?;
        }
        Ok(())
    }

    fn seal_chunk(&mut self) -> Result<(), StorageError> {
        let mut segments = Vec::with_capacity(self.columns.len());
        for (column, values) in self.columns.iter().zip(self.pending.iter_mut()) {
            let segment = Segment::from_values(column, std::mem::take(values))?;
            segments.push(Arc::new(segment));
        }
        self.chunks.push(Chunk::new(segments));
        Ok(())
    }

    pub fn chunk_count(&self) -> u32 {
        self.chunks.len() as u32
    }

    pub fn chunk(&self, chunk: ChunkId) -> &Chunk {
        &self.chunks[chunk.0 as usize]
    }

    pub fn chunk_mut(&mut self, chunk: ChunkId) -> &mut Chunk {
        &mut self.chunks[chunk.0 as usize]
    }

    /// Total rows across sealed chunks.
    pub fn row_count(&self) -> usize {
        self.chunks.iter().map(Chunk::row_count).sum()
    }

    /// Decoded cell at (`chunk`-relative) absolute `row` for `column`.
    /// Convenience for tests and the command surface; scans in the real
    /// engine go through segment iterators instead.
    pub fn cell(&self, column: ColumnId, mut row: usize) -> Option<Value> {
        for chunk in &self.chunks {
            let rows = chunk.row_count();
            if row < rows {
                return Some(chunk.segment(column).value(row));
            }
            row -= rows;
        }
        None
    }
}
