// crates/allot-server/src/db/specializations.rs
// Specializations and their project/supervisor pivots

use rusqlite::{Connection, OptionalExtension, params};

use super::types::Specialization;

pub fn parse_specialization_row(row: &rusqlite::Row) -> rusqlite::Result<Specialization> {
    Ok(Specialization {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
    })
}

/// Return the id of the named specialization, creating it when missing
pub fn get_or_create_specialization_sync(
    conn: &Connection,
    name: &str,
    description: Option<&str>,
) -> rusqlite::Result<i64> {
    let existing: Option<i64> = conn
        .query_row(
            "SELECT id FROM specializations WHERE name = ?",
            [name],
            |row| row.get(0),
        )
        .optional()?;
    if let Some(id) = existing {
        return Ok(id);
    }
    conn.execute(
        "INSERT INTO specializations (name, description) VALUES (?, ?)",
        params![name, description],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn tag_project_sync(conn: &Connection, project_id: i64, specialization_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO project_specializations (project_id, specialization_id) VALUES (?, ?)",
        params![project_id, specialization_id],
    )?;
    Ok(())
}

pub fn tag_supervisor_sync(
    conn: &Connection,
    supervisor_id: i64,
    specialization_id: i64,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT OR IGNORE INTO supervisor_specializations (supervisor_id, specialization_id) VALUES (?, ?)",
        params![supervisor_id, specialization_id],
    )?;
    Ok(())
}

/// Specializations of a project, ordered by id
pub fn project_specializations_sync(
    conn: &Connection,
    project_id: i64,
) -> rusqlite::Result<Vec<Specialization>> {
    let sql = "SELECT s.id, s.name, s.description
               FROM specializations s
               JOIN project_specializations ps ON ps.specialization_id = s.id
               WHERE ps.project_id = ?
               ORDER BY s.id ASC";
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([project_id], parse_specialization_row)?;
    rows.collect()
}

/// Specializations of a supervisor, ordered by id
pub fn supervisor_specializations_sync(
    conn: &Connection,
    supervisor_id: i64,
) -> rusqlite::Result<Vec<Specialization>> {
    let sql = "SELECT s.id, s.name, s.description
               FROM specializations s
               JOIN supervisor_specializations ss ON ss.specialization_id = s.id
               WHERE ss.supervisor_id = ?
               ORDER BY s.id ASC";
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map([supervisor_id], parse_specialization_row)?;
    rows.collect()
}
