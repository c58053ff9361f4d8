//! Row chunks

use std::sync::Arc;

use crate::segment::Segment;
use crate::types::ColumnId;

/// A horizontal partition of a table's rows, owning one shared segment
/// handle per column.
///
/// Segments are handed out as `Arc` clones because the surrounding engine
/// (cached plans, scans) may hold them past a single call; migration relies
/// on exactly this, swapping a chunk's handle and then asserting the
/// displaced one is no longer shared.
#[derive(Debug)]
pub struct Chunk {
    segments: Vec<Arc<Segment>>,
}

impl Chunk {
    pub fn new(segments: Vec<Arc<Segment>>) -> Self {
        Self { segments }
    }

    pub fn column_count(&self) -> usize {
        self.segments.len()
    }

    pub fn row_count(&self) -> usize {
        self.segments.first().map_or(0, |s| s.row_count())
    }

    /// Shared handle to the segment backing `column`.
    pub fn segment(&self, column: ColumnId) -> Arc<Segment> {
        Arc::clone(&self.segments[column.0 as usize])
    }

    /// Swap in a replacement segment for `column`, dropping the chunk's
    /// handle on the previous one.
    pub fn replace_segment(&mut self, column: ColumnId, segment: Arc<Segment>) {
        self.segments[column.0 as usize] = segment;
    }
}
