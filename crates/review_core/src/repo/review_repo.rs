//! Review record manager over the `reviews` table.
//!
//! # Responsibility
//! - Own the `reviews` schema (create/drop) and its CRUD statements.
//! - Keep an identity map so repeated queries for one row yield one instance.
//!
//! # Invariants
//! - `id` and the identity map only change after the SQL statement succeeds.
//! - Materialized rows pass the same validation as in-memory assignments,
//!   including the employee foreign-key check.
//! - Every mutating statement auto-commits; there are no multi-statement
//!   transactions.

use crate::model::employee::{EmployeeId, EmployeeLookup};
use crate::model::review::{Review, ReviewId, ReviewValidationError};
use log::{debug, error, info};
use rusqlite::types::Value;
use rusqlite::{params, Connection, Row};
use std::cell::{Ref, RefCell, RefMut};
use std::collections::HashMap;
use std::rc::Rc;
use std::time::Instant;

pub use crate::error::{RepoResult, ReviewError};

const CREATE_TABLE_SQL: &str = "CREATE TABLE IF NOT EXISTS reviews (
    id INTEGER PRIMARY KEY,
    year INT,
    summary TEXT,
    employee_id INTEGER,
    FOREIGN KEY (employee_id) REFERENCES employees(id)
);";

const DROP_TABLE_SQL: &str = "DROP TABLE IF EXISTS reviews;";

const REVIEW_SELECT_SQL: &str = "SELECT
    id,
    year,
    summary,
    employee_id
FROM reviews";

/// Shared handle to a persisted review.
///
/// Two handles refer to the same stored row iff `Rc::ptr_eq` holds.
pub type ReviewHandle = Rc<RefCell<Review>>;

/// Raw `reviews` row before validation.
///
/// SQLite columns are dynamically typed, so attribute values are kept as
/// `Value` until they are checked.
#[derive(Debug, Clone)]
struct ReviewRow {
    id: ReviewId,
    year: Value,
    summary: Value,
    employee_id: Value,
}

impl ReviewRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get("id")?,
            year: row.get("year")?,
            summary: row.get("summary")?,
            employee_id: row.get("employee_id")?,
        })
    }
}

/// Record manager for reviews on one connection.
///
/// Owns the identity map for every review it saves or loads. Not thread-safe.
pub struct ReviewStore<'conn, E: EmployeeLookup> {
    conn: &'conn Connection,
    employees: E,
    identity_map: HashMap<ReviewId, ReviewHandle>,
}

impl<'conn, E: EmployeeLookup> ReviewStore<'conn, E> {
    pub fn new(conn: &'conn Connection, employees: E) -> Self {
        Self {
            conn,
            employees,
            identity_map: HashMap::new(),
        }
    }

    /// Employee lookup used to validate `employee_id` assignments.
    pub fn employees(&self) -> &E {
        &self.employees
    }

    /// Creates the `reviews` table if missing.
    ///
    /// Runs in bootstrap mode: no review is built here, so no employee lookup
    /// happens and there is no check state to restore afterwards.
    pub fn create_table(&self) -> RepoResult<()> {
        self.conn.execute_batch(CREATE_TABLE_SQL)?;
        info!("event=review_schema module=review_repo status=ok action=create_table");
        Ok(())
    }

    /// Drops the `reviews` table if present.
    ///
    /// The identity map is left untouched; cached handles keep their ids.
    pub fn drop_table(&self) -> RepoResult<()> {
        self.conn.execute_batch(DROP_TABLE_SQL)?;
        info!("event=review_schema module=review_repo status=ok action=drop_table");
        Ok(())
    }

    /// Inserts `review` and registers it in the identity map.
    ///
    /// # Errors
    /// - `AlreadyPersisted` when `review` already has an `id`.
    /// - `Db` when the insert fails; nothing is registered in that case.
    pub fn save(&mut self, review: Review) -> RepoResult<ReviewHandle> {
        if let Some(id) = review.id() {
            return Err(ReviewError::AlreadyPersisted(id));
        }

        let started_at = Instant::now();
        if let Err(err) = self.conn.execute(
            "INSERT INTO reviews (year, summary, employee_id) VALUES (?1, ?2, ?3);",
            params![review.year(), review.summary(), review.employee_id()],
        ) {
            error!(
                "event=review_save module=review_repo status=error duration_ms={} error={}",
                started_at.elapsed().as_millis(),
                err
            );
            return Err(err.into());
        }

        let id = self.conn.last_insert_rowid();
        let mut review = review;
        review.assign_id(Some(id));
        let handle = Rc::new(RefCell::new(review));
        self.identity_map.insert(id, Rc::clone(&handle));

        info!(
            "event=review_save module=review_repo status=ok review_id={id} duration_ms={}",
            started_at.elapsed().as_millis()
        );
        Ok(handle)
    }

    /// Validates, inserts and registers a new review in one step.
    pub fn create(
        &mut self,
        year: i64,
        summary: impl Into<String>,
        employee_id: EmployeeId,
    ) -> RepoResult<ReviewHandle> {
        let review = Review::new(year, summary, employee_id, &self.employees)?;
        self.save(review)
    }

    /// Writes the current attribute values of `review` to its row.
    ///
    /// # Errors
    /// - `NotPersisted` when `review` has no `id`.
    /// - `NotFound` when no row matches the `id`.
    pub fn update(&self, review: &ReviewHandle) -> RepoResult<()> {
        let review = borrow(review)?;
        let id = review.id().ok_or(ReviewError::NotPersisted)?;

        let changed = self.conn.execute(
            "UPDATE reviews
             SET year = ?1, summary = ?2, employee_id = ?3
             WHERE id = ?4;",
            params![review.year(), review.summary(), review.employee_id(), id],
        )?;

        if changed == 0 {
            return Err(ReviewError::NotFound(id));
        }

        info!("event=review_update module=review_repo status=ok review_id={id}");
        Ok(())
    }

    /// Deletes the row of `review`, evicts it from the identity map and
    /// resets its `id` to `None`.
    ///
    /// A row that is already gone from storage is still evicted and reset.
    pub fn delete(&mut self, review: &ReviewHandle) -> RepoResult<()> {
        let mut review = borrow_mut(review)?;
        let id = review.id().ok_or(ReviewError::NotPersisted)?;

        let changed = self
            .conn
            .execute("DELETE FROM reviews WHERE id = ?1;", params![id])?;

        self.identity_map.remove(&id);
        review.assign_id(None);

        info!(
            "event=review_delete module=review_repo status=ok review_id={id} rows_deleted={changed}"
        );
        Ok(())
    }

    /// Loads one review by primary key.
    pub fn find_by_id(&mut self, id: ReviewId) -> RepoResult<Option<ReviewHandle>> {
        let conn = self.conn;
        let mut stmt = conn.prepare(&format!("{REVIEW_SELECT_SQL} WHERE id = ?1;"))?;
        let mut rows = stmt.query(params![id])?;

        let row = match rows.next()? {
            Some(row) => ReviewRow::from_row(row)?,
            None => {
                debug!("event=review_find module=review_repo status=ok review_id={id} found=false");
                return Ok(None);
            }
        };

        let handle = self
            .materialize(vec![row])?
            .pop()
            .ok_or(ReviewError::NotFound(id))?;
        debug!("event=review_find module=review_repo status=ok review_id={id} found=true");
        Ok(Some(handle))
    }

    /// Loads every review, ordered by `id`.
    pub fn get_all(&mut self) -> RepoResult<Vec<ReviewHandle>> {
        let conn = self.conn;
        let mut stmt = conn.prepare(&format!("{REVIEW_SELECT_SQL} ORDER BY id ASC;"))?;
        let mut rows = stmt.query([])?;

        let mut raw = Vec::new();
        while let Some(row) = rows.next()? {
            raw.push(ReviewRow::from_row(row)?);
        }

        let reviews = self.materialize(raw)?;

        debug!(
            "event=review_list module=review_repo status=ok count={}",
            reviews.len()
        );
        Ok(reviews)
    }

    /// Returns the cached handle for `id`, if this store has one.
    pub fn cached(&self, id: ReviewId) -> Option<ReviewHandle> {
        self.identity_map.get(&id).map(Rc::clone)
    }

    /// Number of reviews currently tracked by the identity map.
    pub fn identity_map_len(&self) -> usize {
        self.identity_map.len()
    }

    /// Maps raw rows onto their identity-map instances.
    ///
    /// Every row is validated before any cached instance is touched, and every
    /// cached instance is exclusively borrowed before the first one is
    /// overwritten. A failure therefore leaves the identity map and all cached
    /// instances as they were.
    fn materialize(&mut self, rows: Vec<ReviewRow>) -> RepoResult<Vec<ReviewHandle>> {
        let mut fresh = Vec::with_capacity(rows.len());
        for row in rows {
            fresh.push(self.review_from_row(row)?);
        }

        let cached: Vec<Option<ReviewHandle>> =
            fresh.iter().map(|(id, _)| self.cached(*id)).collect();
        let mut guards = Vec::new();
        for handle in cached.iter().flatten() {
            guards.push(borrow_mut(handle)?);
        }

        let mut guards = guards.into_iter();
        let mut handles = Vec::with_capacity(fresh.len());
        for ((id, review), cached) in fresh.into_iter().zip(&cached) {
            match cached {
                Some(handle) => {
                    if let Some(mut guard) = guards.next() {
                        *guard = review;
                    }
                    handles.push(Rc::clone(handle));
                }
                None => {
                    let handle = Rc::new(RefCell::new(review));
                    self.identity_map.insert(id, Rc::clone(&handle));
                    handles.push(handle);
                }
            }
        }

        Ok(handles)
    }

    /// Validates one raw row, including the employee foreign-key check.
    fn review_from_row(&self, row: ReviewRow) -> RepoResult<(ReviewId, Review)> {
        let year = year_from_value(row.year)?;
        let summary = summary_from_value(row.summary)?;
        let employee_id = employee_id_from_value(row.employee_id)?;

        let mut review = Review::new(year, summary, employee_id, &self.employees)?;
        review.assign_id(Some(row.id));
        Ok((row.id, review))
    }
}

fn borrow(handle: &ReviewHandle) -> RepoResult<Ref<'_, Review>> {
    handle.try_borrow().map_err(|_| ReviewError::HandleInUse)
}

fn borrow_mut(handle: &ReviewHandle) -> RepoResult<RefMut<'_, Review>> {
    handle.try_borrow_mut().map_err(|_| ReviewError::HandleInUse)
}

fn year_from_value(value: Value) -> Result<i64, ReviewValidationError> {
    match value {
        Value::Integer(year) => Ok(year),
        _ => Err(ReviewValidationError::YearNotInteger),
    }
}

fn summary_from_value(value: Value) -> Result<String, ReviewValidationError> {
    match value {
        Value::Text(summary) => Ok(summary),
        _ => Err(ReviewValidationError::SummaryNotText),
    }
}

fn employee_id_from_value(value: Value) -> Result<EmployeeId, ReviewValidationError> {
    match value {
        Value::Integer(employee_id) => Ok(employee_id),
        _ => Err(ReviewValidationError::EmployeeIdNotInteger),
    }
}
