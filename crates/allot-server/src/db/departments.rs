// crates/allot-server/src/db/departments.rs
// Department records

use rusqlite::{Connection, OptionalExtension, params};

use super::types::Department;

pub fn parse_department_row(row: &rusqlite::Row) -> rusqlite::Result<Department> {
    Ok(Department {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
    })
}

pub fn create_department_sync(conn: &Connection, name: &str, code: &str) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO departments (name, code) VALUES (?, ?)",
        params![name, code],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_department_sync(conn: &Connection, id: i64) -> rusqlite::Result<Option<Department>> {
    conn.query_row(
        "SELECT id, name, code FROM departments WHERE id = ?",
        [id],
        parse_department_row,
    )
    .optional()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_support::setup_test_connection;

    #[test]
    fn test_create_and_get_department() {
        let conn = setup_test_connection();
        let id = create_department_sync(&conn, "Computer Science", "CSC").unwrap();
        let dept = get_department_sync(&conn, id).unwrap().unwrap();
        assert_eq!(dept.code, "CSC");
        assert!(get_department_sync(&conn, id + 1).unwrap().is_none());
    }

    #[test]
    fn test_duplicate_code_rejected() {
        let conn = setup_test_connection();
        create_department_sync(&conn, "Computer Science", "CSC").unwrap();
        assert!(create_department_sync(&conn, "Comp Sci", "CSC").is_err());
    }
}
