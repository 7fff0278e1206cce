// crates/allot-server/src/db/allocations.rs
// Allocation records and status transitions

use rusqlite::{Connection, OptionalExtension, Transaction, TransactionBehavior, params};
use std::str::FromStr;

use super::types::{Allocation, AllocationStatus, NewAllocation};

/// Open a `BEGIN IMMEDIATE` transaction on a pooled connection.
///
/// Takes the write lock up front so a capacity read and the following
/// insert cannot interleave with another writer.
pub fn immediate_transaction(conn: &Connection) -> rusqlite::Result<Transaction<'_>> {
    Transaction::new_unchecked(conn, TransactionBehavior::Immediate)
}

/// Parse Allocation from a row with column order:
/// (id, project_id, student_id, supervisor_id, status, match_score,
///  admin_notes, rejection_reason, allocated_at, created_at, updated_at)
pub fn parse_allocation_row(row: &rusqlite::Row) -> rusqlite::Result<Allocation> {
    let status: String = row.get(4)?;
    let status = AllocationStatus::from_str(&status).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(e))
    })?;
    Ok(Allocation {
        id: row.get(0)?,
        project_id: row.get(1)?,
        student_id: row.get(2)?,
        supervisor_id: row.get(3)?,
        status,
        match_score: row.get(5)?,
        admin_notes: row.get(6)?,
        rejection_reason: row.get(7)?,
        allocated_at: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

const ALLOCATION_COLUMNS: &str = "id, project_id, student_id, supervisor_id, status, match_score, \
     admin_notes, rejection_reason, allocated_at, created_at, updated_at";

pub fn get_allocation_sync(conn: &Connection, id: i64) -> rusqlite::Result<Option<Allocation>> {
    let sql = format!("SELECT {ALLOCATION_COLUMNS} FROM allocations WHERE id = ?");
    conn.query_row(&sql, [id], parse_allocation_row).optional()
}

/// All allocations, newest first, optionally filtered by status
pub fn list_allocations_sync(
    conn: &Connection,
    status: Option<AllocationStatus>,
) -> rusqlite::Result<Vec<Allocation>> {
    let sql = format!(
        "SELECT {ALLOCATION_COLUMNS} FROM allocations
         WHERE (?1 IS NULL OR status = ?1)
         ORDER BY id DESC"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([status.map(|s| s.as_str())], parse_allocation_row)?;
    rows.collect()
}

/// Insert a pending allocation and return the stored row
pub fn insert_pending_allocation_sync(
    conn: &Connection,
    allocation: &NewAllocation,
) -> rusqlite::Result<Allocation> {
    conn.execute(
        "INSERT INTO allocations (project_id, student_id, supervisor_id, status, match_score, admin_notes)
         VALUES (?, ?, ?, 'pending', ?, ?)",
        params![
            allocation.project_id,
            allocation.student_id,
            allocation.supervisor_id,
            allocation.match_score,
            allocation.admin_notes,
        ],
    )?;
    let id = conn.last_insert_rowid();
    let sql = format!("SELECT {ALLOCATION_COLUMNS} FROM allocations WHERE id = ?");
    conn.query_row(&sql, [id], parse_allocation_row)
}

/// Whether the student already holds an approved allocation (other than `excluding`)
pub fn student_has_approved_allocation_sync(
    conn: &Connection,
    student_id: i64,
    excluding: Option<i64>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM allocations
                       WHERE student_id = ?1 AND status = 'approved'
                         AND (?2 IS NULL OR id != ?2))",
        params![student_id, excluding],
        |row| row.get(0),
    )
}

pub fn project_has_allocation_sync(conn: &Connection, project_id: i64) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM allocations WHERE project_id = ?)",
        [project_id],
        |row| row.get(0),
    )
}

/// Whether a (student, supervisor) pair is already taken by another row
pub fn pair_taken_sync(
    conn: &Connection,
    project_id: i64,
    student_id: i64,
    supervisor_id: i64,
    excluding: Option<i64>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM allocations
                       WHERE supervisor_id = ?3
                         AND (project_id = ?1 OR student_id = ?2)
                         AND (?4 IS NULL OR id != ?4))",
        params![project_id, student_id, supervisor_id, excluding],
        |row| row.get(0),
    )
}

/// Set status to approved and stamp allocated_at
pub fn mark_approved_sync(
    conn: &Connection,
    id: i64,
    allocated_at: &str,
    admin_notes: Option<&str>,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE allocations
         SET status = 'approved', allocated_at = ?, rejection_reason = NULL,
             admin_notes = COALESCE(?, admin_notes), updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
        params![allocated_at, admin_notes, id],
    )?;
    Ok(changed > 0)
}

pub fn mark_rejected_sync(conn: &Connection, id: i64, reason: &str) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE allocations
         SET status = 'rejected', rejection_reason = ?, allocated_at = NULL,
             updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
        params![reason, id],
    )?;
    Ok(changed > 0)
}

/// Move an allocation to another supervisor with a recomputed score
pub fn mark_reassigned_sync(
    conn: &Connection,
    id: i64,
    supervisor_id: i64,
    match_score: f64,
) -> rusqlite::Result<bool> {
    let changed = conn.execute(
        "UPDATE allocations
         SET supervisor_id = ?, match_score = ?, status = 'reassigned', allocated_at = NULL,
             updated_at = CURRENT_TIMESTAMP
         WHERE id = ?",
        params![supervisor_id, match_score, id],
    )?;
    Ok(changed > 0)
}

pub fn delete_allocation_sync(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let changed = conn.execute("DELETE FROM allocations WHERE id = ?", [id])?;
    Ok(changed > 0)
}

pub fn count_allocations_by_status_sync(
    conn: &Connection,
    status: AllocationStatus,
) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(*) FROM allocations WHERE status = ?",
        [status.as_str()],
        |row| row.get(0),
    )
}

/// Mean of non-null match scores, None when there are none
pub fn average_match_score_sync(conn: &Connection) -> rusqlite::Result<Option<f64>> {
    conn.query_row(
        "SELECT AVG(match_score) FROM allocations WHERE match_score IS NOT NULL",
        [],
        |row| row.get(0),
    )
}
