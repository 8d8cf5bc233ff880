//! Domain model for persisted reviews and the employees they reference.
//!
//! # Invariants
//! - `Review` fields are only mutable through validating setters.
//! - `Employee` is a read model; this crate never writes employees.

pub mod employee;
pub mod review;
