// crates/allot-server/src/db/test_support.rs
// Shared fixtures for database and engine tests

use super::allocations::{insert_pending_allocation_sync, mark_approved_sync, mark_rejected_sync};
use super::departments::create_department_sync;
use super::pool::DatabasePool;
use super::projects::create_project_sync;
use super::specializations::{get_or_create_specialization_sync, tag_project_sync, tag_supervisor_sync};
use super::students::create_student_sync;
use super::supervisors::create_supervisor_sync;
use super::types::{AllocationStatus, NewAllocation, NewProject, NewStudent, NewSupervisor};
use allot_types::ProjectStatus;
use rusqlite::Connection;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

static SEQ: AtomicU64 = AtomicU64::new(1);

fn next_seq() -> u64 {
    SEQ.fetch_add(1, Ordering::Relaxed)
}

/// Create a test pool (in-memory shared-cache DB, schema applied)
pub async fn setup_test_pool() -> Arc<DatabasePool> {
    Arc::new(
        DatabasePool::open_in_memory()
            .await
            .expect("Failed to open in-memory pool"),
    )
}

/// Plain connection with schema applied, for sync tests
pub fn setup_test_connection() -> Connection {
    let conn = Connection::open_in_memory().expect("Failed to open in-memory connection");
    conn.execute_batch("PRAGMA foreign_keys=ON;")
        .expect("Failed to enable foreign keys");
    super::schema::run_all_migrations(&conn).expect("Failed to run migrations");
    conn
}

pub fn seed_department(conn: &Connection, code: &str) -> i64 {
    create_department_sync(conn, &format!("Department of {code}"), code)
        .expect("Failed to seed department")
}

pub fn seed_student(conn: &Connection, name: &str, department_id: Option<i64>) -> i64 {
    let n = next_seq();
    create_student_sync(
        conn,
        &NewStudent {
            name: name.to_string(),
            email: format!("student{n}@uni.test"),
            matric_number: format!("MAT{n:05}"),
            department_id,
            level: Some("400".to_string()),
            session: Some("2024/2025".to_string()),
        },
    )
    .expect("Failed to seed student")
}

/// Seed a submitted project tagged with the named specializations
pub fn seed_project(conn: &Connection, student_id: i64, title: &str, specs: &[&str]) -> i64 {
    let id = create_project_sync(
        conn,
        &NewProject {
            student_id,
            title: title.to_string(),
            description: format!("{title} description"),
            objectives: None,
            methodology: None,
            status: ProjectStatus::Submitted,
        },
    )
    .expect("Failed to seed project");
    for spec in specs {
        let spec_id = get_or_create_specialization_sync(conn, spec, None).expect("spec");
        tag_project_sync(conn, id, spec_id).expect("tag project");
    }
    id
}

/// Seed an active supervisor tagged with the named specializations
pub fn seed_supervisor(
    conn: &Connection,
    name: &str,
    department_id: Option<i64>,
    max_students: i64,
    specs: &[&str],
) -> i64 {
    let n = next_seq();
    let id = create_supervisor_sync(
        conn,
        &NewSupervisor {
            name: name.to_string(),
            email: format!("staff{n}@uni.test"),
            staff_id: format!("STF{n:05}"),
            title: Some("Dr".to_string()),
            department_id,
            max_students,
            ..Default::default()
        },
    )
    .expect("Failed to seed supervisor");
    for spec in specs {
        let spec_id = get_or_create_specialization_sync(conn, spec, None).expect("spec");
        tag_supervisor_sync(conn, id, spec_id).expect("tag supervisor");
    }
    id
}

/// Seed an allocation directly in the given status
pub fn seed_allocation(
    conn: &Connection,
    project_id: i64,
    student_id: i64,
    supervisor_id: i64,
    status: AllocationStatus,
) -> i64 {
    let alloc = insert_pending_allocation_sync(
        conn,
        &NewAllocation {
            project_id,
            student_id,
            supervisor_id,
            match_score: None,
            admin_notes: None,
        },
    )
    .expect("Failed to seed allocation");
    match status {
        AllocationStatus::Pending => {}
        AllocationStatus::Approved => {
            mark_approved_sync(conn, alloc.id, "2024-01-01T00:00:00+00:00", None).expect("approve");
        }
        AllocationStatus::Rejected => {
            mark_rejected_sync(conn, alloc.id, "seeded").expect("reject");
        }
        AllocationStatus::Reassigned => {
            conn.execute(
                "UPDATE allocations SET status = 'reassigned' WHERE id = ?",
                [alloc.id],
            )
            .expect("reassign");
        }
    }
    alloc.id
}
