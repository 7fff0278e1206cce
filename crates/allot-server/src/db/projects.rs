// crates/allot-server/src/db/projects.rs
// Student project records

use allot_types::ProjectStatus;
use rusqlite::{Connection, OptionalExtension, params};
use std::str::FromStr;

use super::types::{NewProject, Project};

/// Parse Project from a row with column order:
/// (id, student_id, title, description, objectives, methodology, status)
pub fn parse_project_row(row: &rusqlite::Row) -> rusqlite::Result<Project> {
    let status: String = row.get(6)?;
    let status = ProjectStatus::from_str(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(6, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Project {
        id: row.get(0)?,
        student_id: row.get(1)?,
        title: row.get(2)?,
        description: row.get(3)?,
        objectives: row.get(4)?,
        methodology: row.get(5)?,
        status,
    })
}

const PROJECT_COLUMNS: &str = "id, student_id, title, description, objectives, methodology, status";

pub fn create_project_sync(conn: &Connection, project: &NewProject) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO projects (student_id, title, description, objectives, methodology, status)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            project.student_id,
            project.title,
            project.description,
            project.objectives,
            project.methodology,
            project.status.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_project_sync(conn: &Connection, id: i64) -> rusqlite::Result<Option<Project>> {
    let sql = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = ?");
    conn.query_row(&sql, [id], parse_project_row).optional()
}

pub fn set_project_status_sync(
    conn: &Connection,
    id: i64,
    status: ProjectStatus,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE projects SET status = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        params![status.as_str(), id],
    )?;
    Ok(changed > 0)
}

/// Allocation candidates: submitted projects with no allocation of any status
pub fn list_unallocated_submitted_projects_sync(conn: &Connection) -> rusqlite::Result<Vec<Project>> {
    let sql = format!(
        "SELECT {PROJECT_COLUMNS} FROM projects p
         WHERE p.status = 'submitted'
           AND NOT EXISTS (SELECT 1 FROM allocations a WHERE a.project_id = p.id)
         ORDER BY p.id ASC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], parse_project_row)?;
    rows.collect()
}

pub fn count_projects_by_status_sync(conn: &Connection, status: ProjectStatus) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM projects WHERE status = ?",
        [status.as_str()],
        |row| row.get(0),
    )
}
