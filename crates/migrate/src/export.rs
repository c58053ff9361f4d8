//! Address-range export
//!
//! Enumerates every live allocation unit of a table — value arrays, null
//! masks, dictionary arrays, index vectors, and each dictionary string — and
//! emits one `unit_id,start,end` record per unit, addresses in hex. The
//! contract is accurate, non-overlapping byte ranges; consumers (memory
//! topology simulators) never dereference them.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use strata_columnar::{ChunkId, ColumnId, Table};

/// Header line identifying the export format revision.
pub const MEM_REGIONS_FORMAT: &str = "# strata-mem-regions v1";

/// Unit identifier encoding (table, column, chunk) in decimal digits.
pub fn unit_id(table_index: usize, column: ColumnId, chunk: ChunkId) -> u64 {
    table_index as u64 * 10_000_000 + u64::from(column.0) * 100_000 + u64::from(chunk.0)
}

/// Write the versioned region records for `table` to `out`. Returns the
/// number of records written (excluding the header).
pub fn write_memory_regions(
    table: &Table,
    table_index: usize,
    out: &mut impl Write,
) -> io::Result<usize> {
    writeln!(out, "{MEM_REGIONS_FORMAT}")?;

    let mut records = 0;
    for chunk_idx in 0..table.chunk_count() {
        let chunk_id = ChunkId(chunk_idx);
        let chunk = table.chunk(chunk_id);
        for column_idx in 0..chunk.column_count() {
            let column = ColumnId(column_idx as u16);
            let id = unit_id(table_index, column, chunk_id);
            for range in chunk.segment(column).address_ranges() {
                writeln!(out, "{id},{:x},{:x}", range.start, range.end)?;
                records += 1;
            }
        }
    }
    Ok(records)
}

/// Write the region records for `table` to a file at `path`.
pub fn export_memory_regions(table: &Table, table_index: usize, path: &Path) -> io::Result<usize> {
    let mut out = BufWriter::new(File::create(path)?);
    let records = write_memory_regions(table, table_index, &mut out)?;
    out.flush()?;
    Ok(records)
}
