//! Migration journal
//!
//! Append-only, line-oriented record of completed migrations, one CSV line
//! per run: table, column, pool ids (joined with `+`), bytes moved, elapsed
//! nanoseconds. Consumed by offline tooling; journal failures are reported
//! but never abort a migration that already succeeded.

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::engine::MigrationReport;

/// Appender for the migration journal file.
#[derive(Debug)]
pub struct MigrationJournal {
    path: PathBuf,
}

impl MigrationJournal {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one journal line for `report`, creating the file on first use.
    pub fn append(&self, report: &MigrationReport) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        let pools = report
            .pools
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("+");
        writeln!(
            file,
            "{},{},{},{},{}",
            report.table,
            report.column,
            pools,
            report.migrated_bytes,
            report.elapsed.as_nanos()
        )
    }
}
