//! Deterministic demo table
//!
//! A small stand-in for the engine's benchmark generators: an `orders`
//! table with one column per supported element type, generated from a
//! fixed linear-congruential sequence so runs are reproducible.

use strata_columnar::{ColumnDefinition, DataType, StorageError, Table, Value};

const COUNTRIES: [&str; 8] = ["DE", "US", "JP", "FR", "BR", "IN", "GB", "AU"];

/// Fixed-seed LCG; quality is irrelevant, determinism is the point.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

/// Build the `orders` demo table with `rows` rows in chunks of `chunk_rows`.
pub fn orders_table(rows: usize, chunk_rows: usize) -> Result<Table, StorageError> {
    let columns = vec![
        ColumnDefinition::new("id", DataType::Int32, false),
        ColumnDefinition::new("quantity", DataType::Int64, true),
        ColumnDefinition::new("discount", DataType::Float32, false),
        ColumnDefinition::new("price", DataType::Float64, true),
        ColumnDefinition::new("country", DataType::Text, true),
    ];
    let mut table = Table::new("orders", columns, chunk_rows);
    let mut rng = Lcg(0x5713_7a5e);

    for i in 0..rows {
        let quantity = if rng.next() % 10 == 0 {
            Value::Null
        } else {
            Value::Int64((rng.next() % 1000) as i64)
        };
        let price = if rng.next() % 16 == 0 {
            Value::Null
        } else {
            Value::Float64((rng.next() % 100_000) as f64 / 100.0)
        };
        let country = if rng.next() % 20 == 0 {
            Value::Null
        } else {
            Value::Text(COUNTRIES[(rng.next() as usize) % COUNTRIES.len()].to_owned())
        };
        table.append_row(vec![
            Value::Int32(i as i32),
            quantity,
            Value::Float32((rng.next() % 50) as f32 / 100.0),
            price,
            country,
        ])?;
    }
    table.finalize()?;
    Ok(table)
}
