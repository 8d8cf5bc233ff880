//! SQLite-backed employee lookup.
//!
//! Read-only view over the `employees` table, which is created and
//! maintained outside this crate.

use crate::error::RepoResult;
use crate::model::employee::{Employee, EmployeeId, EmployeeLookup};
use log::debug;
use rusqlite::{params, Connection};

const EMPLOYEE_BY_ID_SQL: &str = "SELECT id, name, job_title FROM employees WHERE id = ?1;";

/// Looks employees up by primary key on a borrowed connection.
#[derive(Debug, Clone, Copy)]
pub struct SqliteEmployeeLookup<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEmployeeLookup<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl EmployeeLookup for SqliteEmployeeLookup<'_> {
    fn find_by_id(&self, id: EmployeeId) -> RepoResult<Option<Employee>> {
        let mut stmt = self.conn.prepare(EMPLOYEE_BY_ID_SQL)?;
        let mut rows = stmt.query(params![id])?;

        let employee = match rows.next()? {
            Some(row) => Some(Employee {
                id: row.get("id")?,
                name: row.get("name")?,
                job_title: row.get("job_title")?,
            }),
            None => None,
        };

        debug!(
            "event=employee_lookup module=employee_repo status=ok employee_id={id} found={}",
            employee.is_some()
        );
        Ok(employee)
    }
}
