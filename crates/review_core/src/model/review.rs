//! Review domain model.
//!
//! # Responsibility
//! - Define the in-memory shape of one `reviews` row.
//! - Validate every attribute assignment, at construction and afterwards.
//!
//! # Invariants
//! - `year >= MIN_REVIEW_YEAR`.
//! - `summary` is never empty.
//! - `employee_id > 0`, and references an existing employee. Only
//!   `Review::bulk_import` suspends the existence check.
//! - `id` is `None` until the store inserts the row, and again after delete.

use crate::error::RepoResult;
use crate::model::employee::{EmployeeId, EmployeeLookup};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Storage-assigned primary key of a review row.
pub type ReviewId = i64;

/// Earliest accepted review year.
pub const MIN_REVIEW_YEAR: i64 = 2000;

/// Reason an attribute assignment was rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewValidationError {
    /// Stored `year` value is not an integer.
    YearNotInteger,
    /// `year` is earlier than `MIN_REVIEW_YEAR`.
    YearTooEarly { year: i64 },
    /// Stored `summary` value is not text.
    SummaryNotText,
    SummaryEmpty,
    /// Stored `employee_id` value is not an integer.
    EmployeeIdNotInteger,
    EmployeeIdNotPositive { employee_id: i64 },
    /// No employee row exists for `employee_id`.
    UnknownEmployee { employee_id: EmployeeId },
}

impl Display for ReviewValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::YearNotInteger => write!(f, "year must be an integer"),
            Self::YearTooEarly { year } => {
                write!(f, "year must be >= {MIN_REVIEW_YEAR}, got {year}")
            }
            Self::SummaryNotText => write!(f, "summary must be text"),
            Self::SummaryEmpty => write!(f, "summary must be non-empty"),
            Self::EmployeeIdNotInteger => write!(f, "employee_id must be an integer"),
            Self::EmployeeIdNotPositive { employee_id } => write!(
                f,
                "employee_id must be a positive integer, got {employee_id}"
            ),
            Self::UnknownEmployee { employee_id } => write!(
                f,
                "employee_id {employee_id} must reference an existing employee"
            ),
        }
    }
}

impl Error for ReviewValidationError {}

/// One performance review written for an employee.
///
/// Serialized with wire fields `id`, `year`, `summary`, `employee_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Review {
    id: Option<ReviewId>,
    year: i64,
    summary: String,
    employee_id: EmployeeId,
}

impl Review {
    /// Builds an unpersisted review after validating every attribute.
    ///
    /// # Errors
    /// - `ReviewError::Validation` when any attribute breaks its contract.
    /// - `ReviewError::Db` when the employee lookup itself fails.
    pub fn new(
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
        employees: &dyn EmployeeLookup,
    ) -> RepoResult<Self> {
        let review = Self::bulk_import(year, summary, employee_id)?;
        ensure_employee_exists(employee_id, employees)?;
        Ok(review)
    }

    /// Builds an unpersisted review for bootstrap and bulk loads, where the
    /// referenced employees may not be visible yet.
    ///
    /// Every contract except employee existence is still enforced; storage
    /// constraints apply once the review is saved.
    pub fn bulk_import(
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
    ) -> Result<Self, ReviewValidationError> {
        let summary = summary.into();
        validate_year(year)?;
        validate_summary(&summary)?;
        validate_employee_id(employee_id)?;

        Ok(Self {
            id: None,
            year,
            summary,
            employee_id,
        })
    }

    pub fn id(&self) -> Option<ReviewId> {
        self.id
    }

    pub fn year(&self) -> i64 {
        self.year
    }

    pub fn summary(&self) -> &str {
        &self.summary
    }

    pub fn employee_id(&self) -> EmployeeId {
        self.employee_id
    }

    /// Returns whether this review currently maps to a stored row.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Replaces `year`; the previous value is kept on error.
    pub fn set_year(&mut self, year: i64) -> Result<(), ReviewValidationError> {
        validate_year(year)?;
        self.year = year;
        Ok(())
    }

    /// Replaces `summary`; the previous value is kept on error.
    pub fn set_summary(&mut self, summary: impl Into<String>) -> Result<(), ReviewValidationError> {
        let summary = summary.into();
        validate_summary(&summary)?;
        self.summary = summary;
        Ok(())
    }

    /// Replaces `employee_id`; the previous value is kept on error.
    pub fn set_employee_id(
        &mut self,
        employee_id: EmployeeId,
        employees: &dyn EmployeeLookup,
    ) -> RepoResult<()> {
        validate_employee_id(employee_id)?;
        ensure_employee_exists(employee_id, employees)?;
        self.employee_id = employee_id;
        Ok(())
    }

    pub(crate) fn assign_id(&mut self, id: Option<ReviewId>) {
        self.id = id;
    }
}

impl Display for Review {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let id = self
            .id
            .map_or_else(|| "None".to_string(), |id| id.to_string());
        write!(
            f,
            "<Review {id}: {}, {}, Employee: {}>",
            self.year, self.summary, self.employee_id
        )
    }
}

fn validate_year(year: i64) -> Result<(), ReviewValidationError> {
    if year < MIN_REVIEW_YEAR {
        return Err(ReviewValidationError::YearTooEarly { year });
    }
    Ok(())
}

fn validate_summary(summary: &str) -> Result<(), ReviewValidationError> {
    if summary.is_empty() {
        return Err(ReviewValidationError::SummaryEmpty);
    }
    Ok(())
}

fn validate_employee_id(employee_id: EmployeeId) -> Result<(), ReviewValidationError> {
    if employee_id <= 0 {
        return Err(ReviewValidationError::EmployeeIdNotPositive { employee_id });
    }
    Ok(())
}

fn ensure_employee_exists(
    employee_id: EmployeeId,
    employees: &dyn EmployeeLookup,
) -> RepoResult<()> {
    if employees.find_by_id(employee_id)?.is_none() {
        return Err(ReviewValidationError::UnknownEmployee { employee_id }.into());
    }
    Ok(())
}
