// crates/allot-server/src/db/schema.rs
// Database schema and migrations

use super::migration_helpers::create_table_if_missing;
use anyhow::Result;
use rusqlite::Connection;

/// Run all schema setup.
///
/// Idempotent: each table is created only when missing.
pub fn run_all_migrations(conn: &Connection) -> Result<()> {
    migrate_directory_tables(conn)?;
    migrate_project_tables(conn)?;
    migrate_allocations_table(conn)?;
    Ok(())
}

/// Departments, specializations, students and supervisors.
fn migrate_directory_tables(conn: &Connection) -> Result<()> {
    create_table_if_missing(
        conn,
        "departments",
        r#"
        CREATE TABLE IF NOT EXISTS departments (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            code TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
    "#,
    )?;

    create_table_if_missing(
        conn,
        "specializations",
        r#"
        CREATE TABLE IF NOT EXISTS specializations (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            description TEXT
        );
    "#,
    )?;

    create_table_if_missing(
        conn,
        "students",
        r#"
        CREATE TABLE IF NOT EXISTS students (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            matric_number TEXT NOT NULL UNIQUE,
            department_id INTEGER REFERENCES departments(id) ON DELETE SET NULL,
            level TEXT,
            session TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_students_department ON students(department_id);
    "#,
    )?;

    create_table_if_missing(
        conn,
        "supervisors",
        r#"
        CREATE TABLE IF NOT EXISTS supervisors (
            id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT NOT NULL UNIQUE,
            staff_id TEXT NOT NULL UNIQUE,
            title TEXT,
            bio TEXT,
            department_id INTEGER REFERENCES departments(id) ON DELETE SET NULL,
            max_students INTEGER NOT NULL DEFAULT 5 CHECK (max_students >= 0),
            is_active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_supervisors_active ON supervisors(is_active);
    "#,
    )?;

    create_table_if_missing(
        conn,
        "supervisor_specializations",
        r#"
        CREATE TABLE IF NOT EXISTS supervisor_specializations (
            supervisor_id INTEGER NOT NULL REFERENCES supervisors(id) ON DELETE CASCADE,
            specialization_id INTEGER NOT NULL REFERENCES specializations(id) ON DELETE CASCADE,
            PRIMARY KEY (supervisor_id, specialization_id)
        );
    "#,
    )?;

    Ok(())
}

/// Student projects and their specialization tags.
fn migrate_project_tables(conn: &Connection) -> Result<()> {
    create_table_if_missing(
        conn,
        "projects",
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id INTEGER PRIMARY KEY,
            student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            description TEXT NOT NULL DEFAULT '',
            objectives TEXT,
            methodology TEXT,
            status TEXT NOT NULL DEFAULT 'draft'
                CHECK (status IN ('draft', 'submitted', 'approved', 'rejected', 'in_progress', 'completed')),
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );
        CREATE INDEX IF NOT EXISTS idx_projects_status ON projects(status);
        CREATE INDEX IF NOT EXISTS idx_projects_student ON projects(student_id);
    "#,
    )?;

    create_table_if_missing(
        conn,
        "project_specializations",
        r#"
        CREATE TABLE IF NOT EXISTS project_specializations (
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            specialization_id INTEGER NOT NULL REFERENCES specializations(id) ON DELETE CASCADE,
            PRIMARY KEY (project_id, specialization_id)
        );
    "#,
    )?;

    Ok(())
}

/// Allocations: allocated_at is set exactly when status is approved.
fn migrate_allocations_table(conn: &Connection) -> Result<()> {
    create_table_if_missing(
        conn,
        "allocations",
        r#"
        CREATE TABLE IF NOT EXISTS allocations (
            id INTEGER PRIMARY KEY,
            project_id INTEGER NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            student_id INTEGER NOT NULL REFERENCES students(id) ON DELETE CASCADE,
            supervisor_id INTEGER NOT NULL REFERENCES supervisors(id) ON DELETE CASCADE,
            status TEXT NOT NULL DEFAULT 'pending'
                CHECK (status IN ('pending', 'approved', 'rejected', 'reassigned')),
            match_score REAL CHECK (match_score IS NULL OR (match_score >= 0 AND match_score <= 100)),
            admin_notes TEXT,
            rejection_reason TEXT,
            allocated_at TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            UNIQUE(project_id, supervisor_id),
            UNIQUE(student_id, supervisor_id),
            CHECK ((status = 'approved') = (allocated_at IS NOT NULL))
        );
        CREATE INDEX IF NOT EXISTS idx_allocations_supervisor_status ON allocations(supervisor_id, status);
        CREATE INDEX IF NOT EXISTS idx_allocations_student_status ON allocations(student_id, status);
        CREATE INDEX IF NOT EXISTS idx_allocations_project ON allocations(project_id);
    "#,
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::migration_helpers::table_exists;

    #[test]
    fn test_migrations_create_all_tables() {
        let conn = Connection::open_in_memory().unwrap();
        run_all_migrations(&conn).unwrap();
        for table in [
            "departments",
            "specializations",
            "students",
            "supervisors",
            "supervisor_specializations",
            "projects",
            "project_specializations",
            "allocations",
        ] {
            assert!(table_exists(&conn, table), "missing table {table}");
        }
    }

    #[test]
    fn test_migrations_are_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        run_all_migrations(&conn).unwrap();
        run_all_migrations(&conn).unwrap();
    }

    #[test]
    fn test_allocated_at_check_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys=ON;").unwrap();
        run_all_migrations(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO students (id, name, email, matric_number) VALUES (1, 'Ada', 'ada@uni.test', 'M1');
             INSERT INTO supervisors (id, name, email, staff_id) VALUES (1, 'Dr B', 'b@uni.test', 'S1');
             INSERT INTO projects (id, student_id, title, status) VALUES (1, 1, 'P', 'submitted');",
        )
        .unwrap();

        // approved without allocated_at is rejected
        let err = conn.execute(
            "INSERT INTO allocations (project_id, student_id, supervisor_id, status) VALUES (1, 1, 1, 'approved')",
            [],
        );
        assert!(err.is_err());

        // pending with allocated_at is rejected
        let err = conn.execute(
            "INSERT INTO allocations (project_id, student_id, supervisor_id, status, allocated_at)
             VALUES (1, 1, 1, 'pending', '2024-01-01T00:00:00Z')",
            [],
        );
        assert!(err.is_err());

        conn.execute(
            "INSERT INTO allocations (project_id, student_id, supervisor_id) VALUES (1, 1, 1)",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_match_score_range_constraint() {
        let conn = Connection::open_in_memory().unwrap();
        run_all_migrations(&conn).unwrap();
        conn.execute_batch(
            "INSERT INTO students (id, name, email, matric_number) VALUES (1, 'Ada', 'ada@uni.test', 'M1');
             INSERT INTO supervisors (id, name, email, staff_id) VALUES (1, 'Dr B', 'b@uni.test', 'S1');
             INSERT INTO projects (id, student_id, title, status) VALUES (1, 1, 'P', 'submitted');",
        )
        .unwrap();
        let err = conn.execute(
            "INSERT INTO allocations (project_id, student_id, supervisor_id, match_score) VALUES (1, 1, 1, 120)",
            [],
        );
        assert!(err.is_err());
    }
}
