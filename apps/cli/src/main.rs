//! `strata` — drive tiered-memory column migration from the command line
//!
//! One-shot driver around the library crates: generates a deterministic
//! demo table, migrates columns to a NUMA node, reports sizes, probes pool
//! placement, and exports memory regions for external tooling.

mod sample;

use std::path::PathBuf;

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use strata_columnar::encode::dictionary_encode_table;
use strata_memory::{NumaNode, PoolRegistry, node_count, numa_available};
use strata_migrate::{MigrationConfig, MigrationEngine, export_memory_regions};

#[derive(Parser)]
#[command(name = "strata", version, about = "Tiered-memory column migration driver")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate the demo table, migrate columns to a node, report results
    Demo {
        /// Rows in the generated table
        #[arg(long, default_value_t = 100_000)]
        rows: usize,
        /// Rows per chunk
        #[arg(long, default_value_t = 10_000)]
        chunk_rows: usize,
        /// Columns to migrate (default: every column)
        #[arg(long)]
        column: Vec<String>,
        /// Target NUMA node
        #[arg(long, default_value_t = 0)]
        node: usize,
        /// Skip dictionary encoding and migrate plain segments
        #[arg(long)]
        plain: bool,
        /// Append per-migration journal lines to this file
        #[arg(long)]
        journal: Option<PathBuf>,
        /// Export post-migration memory regions to this file
        #[arg(long)]
        regions: Option<PathBuf>,
        /// Pool size estimate multiplier
        #[arg(long, default_value_t = 1.2)]
        slack: f64,
    },
    /// Print per-column footprints of the demo table
    Size {
        #[arg(long, default_value_t = 100_000)]
        rows: usize,
        #[arg(long, default_value_t = 10_000)]
        chunk_rows: usize,
        /// Report footprints after dictionary encoding
        #[arg(long)]
        encoded: bool,
    },
    /// Create a pool and report its id, address range and observed node
    Probe {
        /// Pool capacity in bytes
        #[arg(long)]
        size: usize,
        /// Target NUMA node
        #[arg(long, default_value_t = 0)]
        node: usize,
    },
    /// Print the detected NUMA topology
    Topology,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match Cli::parse().command {
        Command::Demo {
            rows,
            chunk_rows,
            column,
            node,
            plain,
            journal,
            regions,
            slack,
        } => demo(rows, chunk_rows, column, node, plain, journal, regions, slack),
        Command::Size { rows, chunk_rows, encoded } => size(rows, chunk_rows, encoded),
        Command::Probe { size, node } => probe(size, node),
        Command::Topology => {
            println!(
                "numa_available={} nodes={}",
                numa_available(),
                node_count()
            );
            Ok(())
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn demo(
    rows: usize,
    chunk_rows: usize,
    columns: Vec<String>,
    node: usize,
    plain: bool,
    journal: Option<PathBuf>,
    regions: Option<PathBuf>,
    slack: f64,
) -> anyhow::Result<()> {
    if node >= node_count() {
        bail!("node {node} out of range (host has {} node(s))", node_count());
    }

    let mut table = sample::orders_table(rows, chunk_rows)?;
    if !plain {
        dictionary_encode_table(&mut table);
    }
    info!(rows = table.row_count(), chunks = table.chunk_count(), "demo table ready");

    let columns = if columns.is_empty() {
        let all: Vec<String> = table.columns().iter().map(|c| c.name.clone()).collect();
        if plain {
            // Plain text segments are not migratable; keep the demo usable.
            all.into_iter().filter(|c| c.as_str() != "country").collect()
        } else {
            all
        }
    } else {
        columns
    };

    let mut registry = PoolRegistry::new();
    let mut engine = MigrationEngine::with_config(MigrationConfig {
        slack_factor: slack,
        journal_path: journal,
        ..MigrationConfig::default()
    });

    for name in &columns {
        if table.column_id_by_name(name).is_none() {
            bail!("table '{}' has no column '{name}'", table.name());
        }
        let report = engine.migrate_column(&mut registry, &mut table, name, NumaNode(node));
        println!("{}", report.summary());
    }

    if let Some(path) = regions {
        let records = export_memory_regions(&table, 0, &path)
            .with_context(|| format!("writing {}", path.display()))?;
        println!("{records} region record(s) written to {}", path.display());
    }

    Ok(())
}

fn size(rows: usize, chunk_rows: usize, encoded: bool) -> anyhow::Result<()> {
    let mut table = sample::orders_table(rows, chunk_rows)?;
    if encoded {
        dictionary_encode_table(&mut table);
    }
    for (idx, column) in table.columns().iter().enumerate() {
        let footprint = MigrationEngine::column_footprint(
            &table,
            strata_columnar::ColumnId(idx as u16),
        );
        println!("{}.{}: {footprint}B", table.name(), column.name);
    }
    Ok(())
}

fn probe(size: usize, node: usize) -> anyhow::Result<()> {
    if node >= node_count() {
        bail!("node {node} out of range (host has {} node(s))", node_count());
    }
    let mut registry = PoolRegistry::new();
    let id = registry.create_pool(size, NumaNode(node));
    let pool = registry.get_pool(id);
    println!(
        "{id},{:#018x},{:#018x},{}",
        pool.start_address(),
        pool.end_address(),
        pool.capacity()
    );
    match pool.verify_numa_node() {
        Some(observed) => println!("observed node: {observed}"),
        None => println!("observed node: inconclusive"),
    }
    drop(pool);
    registry.delete_pool(id);
    Ok(())
}
