//! Crate-level error type shared by the model and repository layers.
//!
//! # Invariants
//! - Storage failures surface unchanged inside `ReviewError::Db`.
//! - Attribute contract violations surface as `ReviewError::Validation`.

use crate::db::DbError;
use crate::model::review::{ReviewId, ReviewValidationError};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, ReviewError>;

/// Error for review validation, persistence and query operations.
#[derive(Debug)]
pub enum ReviewError {
    Validation(ReviewValidationError),
    Db(DbError),
    /// Operation needs a stored row but the review has no `id`.
    NotPersisted,
    /// `save` was given a review that already carries an `id`.
    AlreadyPersisted(ReviewId),
    NotFound(ReviewId),
    /// The handle is currently borrowed elsewhere.
    HandleInUse,
}

impl Display for ReviewError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotPersisted => write!(f, "review has not been saved"),
            Self::AlreadyPersisted(id) => write!(f, "review {id} is already saved"),
            Self::NotFound(id) => write!(f, "review not found: {id}"),
            Self::HandleInUse => write!(f, "review handle is already borrowed"),
        }
    }
}

impl Error for ReviewError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ReviewValidationError> for ReviewError {
    fn from(value: ReviewValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for ReviewError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for ReviewError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}
