use review_core::db::open_db_in_memory;
use review_core::{ReviewError, ReviewStore, ReviewValidationError, SqliteEmployeeLookup};
use rusqlite::{params, Connection};
use std::rc::Rc;

fn conn_with_reviews_table() -> Connection {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "CREATE TABLE employees (id INTEGER PRIMARY KEY, name TEXT, job_title TEXT);
         INSERT INTO employees (id, name, job_title) VALUES (1, 'Lee', 'Manager');
         INSERT INTO employees (id, name, job_title) VALUES (2, 'Sasha', 'Engineer');",
    )
    .unwrap();
    ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn))
        .create_table()
        .unwrap();
    conn
}

#[test]
fn find_by_id_returns_the_handle_returned_by_create() {
    let conn = conn_with_reviews_table();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));

    let created = store.create(2022, "Same object", 1).unwrap();
    let id = created.borrow().id().unwrap();

    let found = store.find_by_id(id).unwrap().unwrap();
    assert!(Rc::ptr_eq(&created, &found));
    assert_eq!(store.identity_map_len(), 1);
}

#[test]
fn repeated_queries_share_one_instance() {
    let conn = conn_with_reviews_table();
    conn.execute(
        "INSERT INTO reviews (year, summary, employee_id) VALUES (2019, 'Loaded', 1);",
        [],
    )
    .unwrap();
    let id = conn.last_insert_rowid();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));

    let first = store.find_by_id(id).unwrap().unwrap();
    let second = store.find_by_id(id).unwrap().unwrap();
    let listed = store.get_all().unwrap();

    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(listed.len(), 1);
    assert!(Rc::ptr_eq(&first, &listed[0]));
    assert!(Rc::ptr_eq(&first, &store.cached(id).unwrap()));
}

#[test]
fn materialization_refreshes_cached_instance_in_place() {
    let conn = conn_with_reviews_table();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));

    let handle = store.create(2020, "Before", 1).unwrap();
    let id = handle.borrow().id().unwrap();

    conn.execute(
        "UPDATE reviews SET year = 2025, summary = 'After', employee_id = 2 WHERE id = ?1;",
        params![id],
    )
    .unwrap();

    let refreshed = store.find_by_id(id).unwrap().unwrap();
    assert!(Rc::ptr_eq(&handle, &refreshed));
    let review = handle.borrow();
    assert_eq!(review.year(), 2025);
    assert_eq!(review.summary(), "After");
    assert_eq!(review.employee_id(), 2);
}

#[test]
fn unsaved_local_changes_are_overwritten_by_reload() {
    let conn = conn_with_reviews_table();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));

    let handle = store.create(2020, "Stored", 1).unwrap();
    let id = handle.borrow().id().unwrap();
    handle.borrow_mut().set_summary("Local only").unwrap();

    store.find_by_id(id).unwrap();
    assert_eq!(handle.borrow().summary(), "Stored");
}

#[test]
fn invalid_stored_row_is_rejected_and_cache_is_kept() {
    let conn = conn_with_reviews_table();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));

    let handle = store.create(2020, "Valid", 1).unwrap();
    let id = handle.borrow().id().unwrap();

    conn.execute(
        "UPDATE reviews SET year = 1990, summary = 'Changed' WHERE id = ?1;",
        params![id],
    )
    .unwrap();
    let err = store.find_by_id(id).unwrap_err();
    assert!(matches!(
        err,
        ReviewError::Validation(ReviewValidationError::YearTooEarly { year: 1990 })
    ));

    conn.execute(
        "UPDATE reviews SET year = 'twenty', summary = 'Changed' WHERE id = ?1;",
        params![id],
    )
    .unwrap();
    let err = store.find_by_id(id).unwrap_err();
    assert!(matches!(
        err,
        ReviewError::Validation(ReviewValidationError::YearNotInteger)
    ));

    let review = handle.borrow();
    assert_eq!(review.year(), 2020);
    assert_eq!(review.summary(), "Valid");
}

#[test]
fn materialization_reports_borrowed_handle_instead_of_panicking() {
    let conn = conn_with_reviews_table();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));

    let handle = store.create(2020, "Held", 1).unwrap();
    let id = handle.borrow().id().unwrap();

    let held = handle.borrow_mut();
    let err = store.find_by_id(id).unwrap_err();
    assert!(matches!(err, ReviewError::HandleInUse));
    drop(held);
}

#[test]
fn stores_on_the_same_connection_keep_separate_identity_maps() {
    let conn = conn_with_reviews_table();
    let mut first = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));
    let mut second = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));

    let created = first.create(2021, "Shared row", 1).unwrap();
    let id = created.borrow().id().unwrap();

    let from_second = second.find_by_id(id).unwrap().unwrap();
    assert!(!Rc::ptr_eq(&created, &from_second));
    assert_eq!(*created.borrow(), *from_second.borrow());
}

#[test]
fn failed_get_all_leaves_every_cached_instance_untouched() {
    let conn = conn_with_reviews_table();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));

    let first = store.create(2020, "First", 1).unwrap();
    let second = store.create(2021, "Second", 2).unwrap();
    let first_id = first.borrow().id().unwrap();
    let second_id = second.borrow().id().unwrap();

    conn.execute(
        "UPDATE reviews SET summary = 'First edited' WHERE id = ?1;",
        params![first_id],
    )
    .unwrap();
    conn.execute(
        "UPDATE reviews SET year = 1990 WHERE id = ?1;",
        params![second_id],
    )
    .unwrap();

    let err = store.get_all().unwrap_err();
    assert!(matches!(
        err,
        ReviewError::Validation(ReviewValidationError::YearTooEarly { year: 1990 })
    ));
    assert_eq!(first.borrow().summary(), "First");
    assert_eq!(second.borrow().year(), 2021);
}

#[test]
fn failed_get_all_registers_no_new_instances() {
    let conn = conn_with_reviews_table();
    conn.execute_batch(
        "INSERT INTO reviews (year, summary, employee_id) VALUES (2019, 'Valid', 1);
         INSERT INTO reviews (year, summary, employee_id) VALUES (2020, '', 2);",
    )
    .unwrap();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));

    let err = store.get_all().unwrap_err();
    assert!(matches!(
        err,
        ReviewError::Validation(ReviewValidationError::SummaryEmpty)
    ));
    assert_eq!(store.identity_map_len(), 0);
}

#[test]
fn borrowed_handle_blocks_get_all_before_any_refresh() {
    let conn = conn_with_reviews_table();
    let mut store = ReviewStore::new(&conn, SqliteEmployeeLookup::new(&conn));

    let first = store.create(2020, "First", 1).unwrap();
    let second = store.create(2021, "Second", 2).unwrap();
    let first_id = first.borrow().id().unwrap();
    conn.execute(
        "UPDATE reviews SET summary = 'First edited' WHERE id = ?1;",
        params![first_id],
    )
    .unwrap();

    let held = second.borrow_mut();
    let err = store.get_all().unwrap_err();
    assert!(matches!(err, ReviewError::HandleInUse));
    drop(held);
    assert_eq!(first.borrow().summary(), "First");
}
