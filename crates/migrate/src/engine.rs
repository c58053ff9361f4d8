//! Migration engine
//!
//! Orchestrates migrating one column of one table into pools drawn from the
//! registry: estimates sizes, walks chunks in order, recovers from pool
//! exhaustion by committing partial progress and growing capacity, and
//! records the resulting column→pools mapping for later release.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use strata_columnar::{Chunk, ChunkId, ColumnId, Table};
use strata_memory::{AllocResult, NumaNode, NumaPool, PoolId, PoolRegistry, fatal};

use crate::copy::copy_segment_into_pool;
use crate::journal::MigrationJournal;

/// Tunables for one engine instance.
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Multiplier applied to footprint estimates when sizing a pool. The
    /// default 20% slack absorbs allocator alignment overhead; values below
    /// 1.0 deliberately undershoot (useful to exercise the retry path).
    pub slack_factor: f64,
    /// Hard ceiling on pools requested for a single column. The retry loop
    /// terminates on its own (committed pools or doubled estimates), but a
    /// host that keeps granting tiny pools should fail loudly, not spin.
    pub max_pool_attempts: u32,
    /// Where to append the per-migration journal line, if anywhere.
    pub journal_path: Option<PathBuf>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            slack_factor: 1.2,
            max_pool_attempts: 32,
            journal_path: None,
        }
    }
}

/// Outcome of one `migrate_column` run.
#[derive(Debug, Clone)]
pub struct MigrationReport {
    pub table: String,
    pub column: String,
    pub node: NumaNode,
    /// Column footprint before migration.
    pub original_bytes: usize,
    /// Sum of `allocated_bytes` across the committed pool sequence.
    pub migrated_bytes: usize,
    /// Committed pools, in fill order.
    pub pools: Vec<PoolId>,
    pub elapsed: Duration,
}

impl MigrationReport {
    /// The one-line human summary logged at the end of a migration.
    pub fn summary(&self) -> String {
        format!(
            "column {} of size {}B migrated to {} with total migrated size {}B across {} pool(s)",
            self.column,
            self.original_bytes,
            self.node,
            self.migrated_bytes,
            self.pools.len()
        )
    }
}

/// Single-writer migration orchestrator.
pub struct MigrationEngine {
    config: MigrationConfig,
    journal: Option<MigrationJournal>,
    column_pools: HashMap<String, Vec<PoolId>>,
}

impl Default for MigrationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MigrationEngine {
    pub fn new() -> Self {
        Self::with_config(MigrationConfig::default())
    }

    pub fn with_config(config: MigrationConfig) -> Self {
        let journal = config.journal_path.clone().map(MigrationJournal::new);
        Self {
            config,
            journal,
            column_pools: HashMap::new(),
        }
    }

    /// Full current memory footprint of `column`: the sum over every chunk
    /// of that chunk's segment footprint.
    pub fn column_footprint(table: &Table, column: ColumnId) -> usize {
        (0..table.chunk_count())
            .map(|idx| table.chunk(ChunkId(idx)).segment(column).memory_usage())
            .sum()
    }

    /// Pools committed for `column` by earlier migrations, in fill order.
    pub fn pools_for(&self, column: &str) -> Option<&[PoolId]> {
        self.column_pools.get(column).map(Vec::as_slice)
    }

    /// Migrate `column_name` of `table` into pools on `node`.
    ///
    /// Runs the full estimate/copy/commit/regrow state machine; allocation
    /// failure is recovered internally. Unknown columns, shared segment
    /// handles, unsupported segment kinds and an exceeded attempt ceiling
    /// are fatal.
    pub fn migrate_column(
        &mut self,
        registry: &mut PoolRegistry,
        table: &mut Table,
        column_name: &str,
        node: NumaNode,
    ) -> MigrationReport {
        let started = Instant::now();

        let Some(column) = table.column_id_by_name(column_name) else {
            fatal!(
                "unknown column '{column_name}' in table '{}'",
                table.name()
            );
        };

        let footprint = Self::column_footprint(table, column);
        info!(
            table = table.name(),
            column = column_name,
            bytes = footprint,
            %node,
            "migrating column"
        );

        let mut pool_size = scaled(footprint, self.config.slack_factor);
        let mut attempts: u32 = 1;
        let mut pool_id = registry.create_pool(pool_size, node);

        let mut committed: Vec<PoolId> = Vec::new();
        let mut bytes_migrated = 0usize;
        let mut segments_in_pool = 0usize;

        for chunk_idx in 0..table.chunk_count() {
            let chunk_id = ChunkId(chunk_idx);
            let segment_size = table.chunk(chunk_id).segment(column).memory_usage();
            debug!(chunk = %chunk_id, bytes = segment_size, "migrating segment");

            loop {
                let result = {
                    let pool = registry.get_pool(pool_id);
                    migrate_segment(table.chunk_mut(chunk_id), column, &pool)
                };
                match result {
                    Ok(()) => {
                        segments_in_pool += 1;
                        break;
                    }
                    Err(err) if !err.is_out_of_pool_memory() => {
                        fatal!("segment copy failed for column '{column_name}': {err}");
                    }
                    Err(err) => {
                        debug!(pool = %pool_id, %err, "active pool exhausted");

                        if segments_in_pool > 0 {
                            // Partial progress: keep the pool and size the
                            // next one for what is still left to move.
                            committed.push(pool_id);
                            info!(
                                pool = %pool_id,
                                segments = segments_in_pool,
                                column = column_name,
                                "pool committed"
                            );
                            pool_size =
                                scaled(footprint - bytes_migrated, self.config.slack_factor);
                        } else {
                            // Not even one segment fit: the estimate itself
                            // is wrong. Throw the pool away and double.
                            registry.delete_pool(pool_id);
                            info!(
                                pool = %pool_id,
                                size = pool_size,
                                "pool discarded, accommodated 0 segments"
                            );
                            pool_size = pool_size.saturating_mul(2).max(1);
                        }

                        if attempts >= self.config.max_pool_attempts {
                            fatal!(
                                "migration of column '{column_name}' exceeded {} pool attempts",
                                self.config.max_pool_attempts
                            );
                        }
                        attempts += 1;
                        pool_id = registry.create_pool(pool_size, node);
                        info!(
                            pool = %pool_id,
                            size = pool_size,
                            column = column_name,
                            %node,
                            "new pool created"
                        );
                        segments_in_pool = 0;
                        // Retry the same chunk against the fresh pool.
                    }
                }
            }

            bytes_migrated += segment_size;
        }

        // The terminal pool is always part of the column's sequence, even
        // when it holds nothing — releasing the column must release it too.
        committed.push(pool_id);
        info!(
            pool = %pool_id,
            segments = segments_in_pool,
            column = column_name,
            "terminal pool committed"
        );

        let migrated_bytes: usize = committed
            .iter()
            .map(|&id| registry.get_pool(id).allocated_bytes())
            .sum();

        self.column_pools
            .entry(column_name.to_owned())
            .or_default()
            .extend(&committed);

        let report = MigrationReport {
            table: table.name().to_owned(),
            column: column_name.to_owned(),
            node,
            original_bytes: footprint,
            migrated_bytes,
            pools: committed,
            elapsed: started.elapsed(),
        };
        info!("{}", report.summary());

        if let Some(journal) = &self.journal {
            if let Err(err) = journal.append(&report) {
                warn!(path = %journal.path().display(), %err, "journal append failed");
            }
        }

        report
    }

    /// Release every pool recorded for `column_name` and forget the mapping.
    ///
    /// Fatal if the column has no recorded pools, or if any pool is still
    /// referenced by live segment data (the registry's uniqueness check).
    pub fn delete_column_pool(&mut self, registry: &mut PoolRegistry, column_name: &str) {
        let Some(pool_ids) = self.column_pools.remove(column_name) else {
            fatal!("no pools recorded for column '{column_name}'");
        };
        for id in &pool_ids {
            registry.delete_pool(*id);
        }
        info!(
            column = column_name,
            pools = pool_ids.len(),
            "column pools released"
        );
    }
}

/// Copy one chunk's segment for `column` into `pool` and swap it in.
///
/// After the swap the displaced handle must be the sole owner of the
/// original segment; anything else means the segment is referenced
/// elsewhere (a cached plan, a concurrent scan) and migration correctness
/// cannot be guaranteed.
fn migrate_segment(chunk: &mut Chunk, column: ColumnId, pool: &Arc<NumaPool>) -> AllocResult<()> {
    let original = chunk.segment(column);
    let replacement = copy_segment_into_pool(&original, pool)?;
    chunk.replace_segment(column, Arc::new(replacement));

    let holders = Arc::strong_count(&original);
    if holders != 1 {
        fatal!(
            "original segment still shared by {} other holder(s) after replacement",
            holders - 1
        );
    }
    drop(original);
    Ok(())
}

fn scaled(bytes: usize, factor: f64) -> usize {
    (bytes as f64 * factor) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scaled_truncates() {
        assert_eq!(scaled(100, 1.2), 120);
        assert_eq!(scaled(5, 1.2), 6);
        assert_eq!(scaled(3, 0.9), 2);
        assert_eq!(scaled(0, 1.2), 0);
    }
}
