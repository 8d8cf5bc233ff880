//! Repository layer over the `reviews` table and the external `employees` table.
//!
//! # Invariants
//! - Review writes only ever persist values that passed model validation.
//! - At most one `ReviewHandle` exists per stored review id and store.

pub mod employee_repo;
pub mod review_repo;
