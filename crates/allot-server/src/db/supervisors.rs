// crates/allot-server/src/db/supervisors.rs
// Supervisor records and derived load

use rusqlite::{Connection, OptionalExtension, params};

use super::types::{NewSupervisor, Supervisor};

/// Parse Supervisor from a row with column order:
/// (id, name, email, staff_id, title, bio, department_id, max_students, is_active)
pub fn parse_supervisor_row(row: &rusqlite::Row) -> rusqlite::Result<Supervisor> {
    Ok(Supervisor {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        staff_id: row.get(3)?,
        title: row.get(4)?,
        bio: row.get(5)?,
        department_id: row.get(6)?,
        max_students: row.get(7)?,
        is_active: row.get::<_, i32>(8)? != 0,
    })
}

const SUPERVISOR_COLUMNS: &str =
    "id, name, email, staff_id, title, bio, department_id, max_students, is_active";

pub fn create_supervisor_sync(conn: &Connection, supervisor: &NewSupervisor) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO supervisors (name, email, staff_id, title, bio, department_id, max_students, is_active)
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        params![
            supervisor.name,
            supervisor.email,
            supervisor.staff_id,
            supervisor.title,
            supervisor.bio,
            supervisor.department_id,
            supervisor.max_students,
            supervisor.is_active as i32,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_supervisor_sync(conn: &Connection, id: i64) -> rusqlite::Result<Option<Supervisor>> {
    let sql = format!("SELECT {SUPERVISOR_COLUMNS} FROM supervisors WHERE id = ?");
    conn.query_row(&sql, [id], parse_supervisor_row).optional()
}

/// Active supervisors ordered by id
pub fn list_active_supervisors_sync(conn: &Connection) -> rusqlite::Result<Vec<Supervisor>> {
    let sql = format!("SELECT {SUPERVISOR_COLUMNS} FROM supervisors WHERE is_active = 1 ORDER BY id ASC");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], parse_supervisor_row)?;
    rows.collect()
}

pub fn set_supervisor_active_sync(conn: &Connection, id: i64, active: bool) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE supervisors SET is_active = ? WHERE id = ?",
        params![active as i32, id],
    )?;
    Ok(changed > 0)
}

/// Current load: number of approved allocations. Never stored.
pub fn approved_count_sync(conn: &Connection, supervisor_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM allocations WHERE supervisor_id = ? AND status = 'approved'",
        [supervisor_id],
        |row| row.get(0),
    )
}
