//! Address-range export: coverage, format, non-overlap, pool residency

use strata_columnar::encode::dictionary_encode_table;
use strata_columnar::{ChunkId, ColumnDefinition, ColumnId, DataType, Segment, Table, Value};
use strata_memory::{NumaNode, PoolRegistry};
use strata_migrate::{MEM_REGIONS_FORMAT, MigrationEngine, unit_id, write_memory_regions};

fn small_table() -> Table {
    let columns = vec![
        ColumnDefinition::new("qty", DataType::Int32, false),
        ColumnDefinition::new("tag", DataType::Text, false),
    ];
    let mut table = Table::new("items", columns, 4);
    let tags = ["a", "bb", "ccc", "a", "bb", "dddd"];
    for (i, tag) in tags.iter().enumerate() {
        table
            .append_row(vec![
                Value::Int32((i % 3) as i32),
                Value::Text((*tag).to_owned()),
            ])
            .expect("append failed");
    }
    table.finalize().expect("finalize failed");
    table
}

fn parse_records(raw: &str) -> Vec<(u64, usize, usize)> {
    let mut lines = raw.lines();
    assert_eq!(lines.next(), Some(MEM_REGIONS_FORMAT));
    lines
        .map(|line| {
            let fields: Vec<&str> = line.split(',').collect();
            assert_eq!(fields.len(), 3, "malformed record: {line}");
            (
                fields[0].parse::<u64>().expect("unit id"),
                usize::from_str_radix(fields[1], 16).expect("start address"),
                usize::from_str_radix(fields[2], 16).expect("end address"),
            )
        })
        .collect()
}

#[test]
fn export_covers_every_allocation_unit() {
    let mut table = small_table();
    dictionary_encode_table(&mut table);

    let mut raw = Vec::new();
    let records = write_memory_regions(&table, 0, &mut raw).expect("export failed");
    let parsed = parse_records(std::str::from_utf8(&raw).expect("utf8"));
    assert_eq!(parsed.len(), records);

    // Two chunks (4 + 2 rows). Per chunk: int32 dictionary contributes the
    // dictionary array and the index vector; the text dictionary contributes
    // the index vector plus one record per unique string.
    let mut expected = 0;
    for chunk_idx in 0..table.chunk_count() {
        expected += 2;
        match &*table.chunk(ChunkId(chunk_idx)).segment(ColumnId(1)) {
            Segment::DictionaryText(s) => expected += 1 + s.unique_values(),
            other => panic!("expected text dictionary, got {other:?}"),
        }
    }
    assert_eq!(records, expected);

    // Every record belongs to a known (column, chunk) unit id.
    for (id, start, end) in &parsed {
        assert!(start <= end, "inverted range");
        let known = (0..table.chunk_count()).any(|chunk_idx| {
            (0..table.column_count())
                .any(|col| unit_id(0, ColumnId(col as u16), ChunkId(chunk_idx)) == *id)
        });
        assert!(known, "unexpected unit id {id}");
    }

    // Live allocation units never overlap.
    let mut ranges: Vec<(usize, usize)> = parsed
        .iter()
        .filter(|(_, start, end)| end > start)
        .map(|&(_, start, end)| (start, end))
        .collect();
    ranges.sort_unstable();
    for pair in ranges.windows(2) {
        assert!(pair[0].1 <= pair[1].0, "overlapping ranges: {pair:?}");
    }
}

#[test]
fn exported_ranges_follow_migration_into_pools() {
    let mut table = small_table();
    dictionary_encode_table(&mut table);

    let mut registry = PoolRegistry::new();
    let mut engine = MigrationEngine::new();
    let qty = engine.migrate_column(&mut registry, &mut table, "qty", NumaNode(0));
    let tag = engine.migrate_column(&mut registry, &mut table, "tag", NumaNode(0));

    let pools: Vec<_> = qty
        .pools
        .iter()
        .chain(&tag.pools)
        .map(|&id| registry.get_pool(id))
        .collect();

    let mut raw = Vec::new();
    write_memory_regions(&table, 0, &mut raw).expect("export failed");
    let parsed = parse_records(std::str::from_utf8(&raw).expect("utf8"));

    for (id, start, end) in parsed {
        if end == start {
            continue;
        }
        assert!(
            pools.iter().any(|p| p.contains(start) && p.contains(end - 1)),
            "unit {id} range {start:#x}..{end:#x} not inside any committed pool"
        );
    }
}
