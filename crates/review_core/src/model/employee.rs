//! Employee read model and lookup contract.
//!
//! Employees live in an externally managed `employees` table. Reviews only
//! need to know whether an id resolves to an existing row.

use crate::error::RepoResult;
use serde::Serialize;

pub type EmployeeId = i64;

/// Employee row as seen by the review layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub job_title: String,
}

/// Resolves employee ids during `employee_id` validation.
pub trait EmployeeLookup {
    fn find_by_id(&self, id: EmployeeId) -> RepoResult<Option<Employee>>;
}
