//! Review persistence core.
//! Maps `Review` records onto the `reviews` table and keeps one in-memory
//! instance per persisted row.

pub mod db;
pub mod error;
pub mod logging;
pub mod model;
pub mod repo;

pub use error::{RepoResult, ReviewError};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::employee::{Employee, EmployeeId, EmployeeLookup};
pub use model::review::{Review, ReviewId, ReviewValidationError, MIN_REVIEW_YEAR};
pub use repo::employee_repo::SqliteEmployeeLookup;
pub use repo::review_repo::{ReviewHandle, ReviewStore};
