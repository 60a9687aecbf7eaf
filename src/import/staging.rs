//! One-shot readers over the staging database.
//!
//! The staging source is the read-only copy of the legacy dump. Every cell
//! is read back as text (or null) regardless of its declared affinity, so
//! the validators see exactly what the dump carried, zero dates and all.

use sqlx::{Row, SqlitePool};

use super::rows::RawRecord;
use super::table_order::TableKind;

pub(crate) fn quote_ident(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{escaped}\"")
}

fn select_sql(table: TableKind) -> String {
    let columns = table
        .columns()
        .iter()
        .map(|column| {
            let ident = quote_ident(column);
            format!("CAST({ident} AS TEXT) AS {ident}")
        })
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "SELECT {columns} FROM {} ORDER BY rowid",
        quote_ident(table.as_str())
    )
}

/// Pre-flight record count; also proves the table is readable at all.
pub async fn count_records(pool: &SqlitePool, table: TableKind) -> Result<u64, sqlx::Error> {
    let sql = format!("SELECT COUNT(*) FROM {}", quote_ident(table.as_str()));
    let count: i64 = sqlx::query_scalar(&sql).fetch_one(pool).await?;
    Ok(count.max(0) as u64)
}

/// Read the whole table as raw string-or-null records, in dump order.
pub async fn fetch_all(pool: &SqlitePool, table: TableKind) -> Result<Vec<RawRecord>, sqlx::Error> {
    let sql = select_sql(table);
    let rows = sqlx::query(&sql).fetch_all(pool).await?;

    let mut records = Vec::with_capacity(rows.len());
    for row in rows {
        let mut cells = Vec::with_capacity(table.columns().len());
        for (idx, column) in table.columns().iter().enumerate() {
            let value: Option<String> = row.try_get(idx)?;
            cells.push((column.to_string(), value));
        }
        records.push(RawRecord::new(table, cells));
    }
    Ok(records)
}
