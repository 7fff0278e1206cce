// crates/allot-server/src/db/students.rs
// Student records

use rusqlite::{Connection, OptionalExtension, params};

use super::types::{NewStudent, Student};

/// Parse Student from a row with column order:
/// (id, name, email, matric_number, department_id, level, session)
pub fn parse_student_row(row: &rusqlite::Row) -> rusqlite::Result<Student> {
    Ok(Student {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        matric_number: row.get(3)?,
        department_id: row.get(4)?,
        level: row.get(5)?,
        session: row.get(6)?,
    })
}

const STUDENT_COLUMNS: &str = "id, name, email, matric_number, department_id, level, session";

pub fn create_student_sync(conn: &Connection, student: &NewStudent) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO students (name, email, matric_number, department_id, level, session)
         VALUES (?, ?, ?, ?, ?, ?)",
        params![
            student.name,
            student.email,
            student.matric_number,
            student.department_id,
            student.level,
            student.session,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_student_sync(conn: &Connection, id: i64) -> rusqlite::Result<Option<Student>> {
    let sql = format!("SELECT {STUDENT_COLUMNS} FROM students WHERE id = ?");
    conn.query_row(&sql, [id], parse_student_row).optional()
}

/// Students with the given ids, ordered by id; unknown ids are skipped
pub fn get_students_by_ids_sync(conn: &Connection, ids: &[i64]) -> rusqlite::Result<Vec<Student>> {
    let mut students = Vec::with_capacity(ids.len());
    let mut sorted = ids.to_vec();
    sorted.sort_unstable();
    sorted.dedup();
    for id in sorted {
        if let Some(student) = get_student_sync(conn, id)? {
            students.push(student);
        }
    }
    Ok(students)
}
