// crates/allot-server/src/db/migration_helpers.rs
// Schema introspection used by the store migrations

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};
use tracing::info;

fn schema_object_exists(conn: &Connection, kind: &str, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT 1 FROM sqlite_master WHERE type = ?1 AND name = ?2",
        [kind, name],
        |_| Ok(()),
    )
    .optional()
    .map(|row| row.is_some())
}

pub fn table_exists(conn: &Connection, table: &str) -> bool {
    schema_object_exists(conn, "table", table).unwrap_or(false)
}

pub fn index_exists(conn: &Connection, index: &str) -> bool {
    schema_object_exists(conn, "index", index).unwrap_or(false)
}

/// Run `ddl` (table plus its indexes) only when `table` is absent
pub fn create_table_if_missing(conn: &Connection, table: &str, ddl: &str) -> Result<()> {
    if table_exists(conn, table) {
        return Ok(());
    }
    info!(table, "Creating allocation store table");
    conn.execute_batch(ddl)
        .with_context(|| format!("failed to create table {table}"))
}
