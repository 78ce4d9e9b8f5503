//! create / update / delete through the query builder.

use crate::fixtures::{blog, empty, row, Product, User};
use lifeline::{LifeEntity, LifeError};
use serde_json::{json, Value};

// ============================================================================
// create
// ============================================================================

#[test]
fn test_create_stamps_both_markers_with_one_instant() {
    let (db, _) = empty();
    let user = User::query(&db)
        .unwrap()
        .create(row(json!({"name": "Ada", "email": "ada@example.com"})))
        .unwrap();

    let created = user.value("createdAt");
    assert!(created.is_string());
    assert_eq!(created, user.value("updatedAt"));
    assert_eq!(user.value("id"), json!(1));
}

#[test]
fn test_create_fills_defaults_but_keeps_supplied_values() {
    let (db, storage) = empty();
    let defaulted = User::query(&db)
        .unwrap()
        .create(row(json!({"name": "Ada"})))
        .unwrap();
    assert_eq!(defaulted.value("status"), json!("active"));

    let explicit = User::query(&db)
        .unwrap()
        .create(row(json!({"name": "Linus", "status": "banned", "createdAt": "2020-01-01T00:00:00.000Z"})))
        .unwrap();
    assert_eq!(explicit.value("status"), json!("banned"));
    assert_eq!(explicit.value("createdAt"), json!("2020-01-01T00:00:00.000Z"));
    assert_ne!(explicit.value("updatedAt"), Value::Null);

    let stored = storage.rows("users").unwrap();
    assert!(stored.iter().all(|r| r.contains_key("created_at")));
}

#[test]
fn test_create_applies_persist_only() {
    let (db, storage) = empty();
    let product = Product::query(&db)
        .unwrap()
        .create(row(json!({"sku": "A-1", "name": "Anvil", "price": 10, "internalNote": "fragile"})))
        .unwrap();

    assert_eq!(product.value("sku"), json!("A-1"));
    assert!(product.get("internalNote").is_none());
    assert!(!storage.rows("products").unwrap()[0].contains_key("internal_note"));

    let unrestricted = Product::query(&db)
        .unwrap()
        .create_ignoring_persist_only(row(json!({"sku": "A-2", "internalNote": "heavy"})))
        .unwrap();
    assert_eq!(unrestricted.value("internalNote"), json!("heavy"));
}

#[test]
fn test_create_skips_properties_that_are_not_columns() {
    let (db, storage) = empty();
    let user = User::query(&db)
        .unwrap()
        .create(row(json!({"name": "Ada", "nickname": "countess"})))
        .unwrap();
    assert!(user.get("nickname").is_none());
    assert!(!storage.rows("users").unwrap()[0].contains_key("nickname"));

    let product = Product::query(&db)
        .unwrap()
        .create_ignoring_persist_only(row(json!({"sku": "N-1", "internalNote": "kept", "colour": "red"})))
        .unwrap();
    assert_eq!(product.value("internalNote"), json!("kept"));
    assert!(!storage.rows("products").unwrap()[0].contains_key("colour"));

    assert_eq!(User::query(&db).unwrap().get_many().unwrap().len(), 1);
    assert_eq!(Product::query(&db).unwrap().get_many().unwrap().len(), 1);
}

#[test]
fn test_create_keeps_includes_on_refetch() {
    let (db, storage) = blog();
    storage
        .seed("profiles", "id", vec![row(json!({"user_id": 4, "bio": "New"}))])
        .unwrap();

    let user = User::query(&db)
        .unwrap()
        .includes("profile")
        .unwrap()
        .create(row(json!({"name": "Barbara"})))
        .unwrap();
    assert_eq!(user.value("id"), json!(4));
    assert_eq!(user.one("profile").unwrap().value("bio"), json!("New"));
}

// ============================================================================
// update
// ============================================================================

#[test]
fn test_update_returns_first_touched_instance() {
    let (db, _) = blog();
    let updated = User::query(&db)
        .unwrap()
        .where_eq("status", "active")
        .update(row(json!({"status": "away"})))
        .unwrap()
        .unwrap();

    assert_eq!(updated.value("id"), json!(1));
    assert_eq!(updated.value("status"), json!("away"));
    assert!(updated.value("updatedAt").is_string());
    assert_eq!(User::query(&db).unwrap().where_eq("status", "away").count().unwrap(), 2);
}

#[test]
fn test_update_without_matches_returns_none() {
    let (db, _) = blog();
    let updated = User::query(&db)
        .unwrap()
        .where_eq("id", 99)
        .update_column("name", "Ghost")
        .unwrap();
    assert!(updated.is_none());
}

#[test]
fn test_update_drops_properties_outside_persist_only() {
    let (db, _) = empty();
    Product::query(&db)
        .unwrap()
        .create_ignoring_persist_only(row(json!({"sku": "B-1", "name": "Bolt", "internalNote": "old"})))
        .unwrap();

    let product = Product::query(&db)
        .unwrap()
        .where_eq("sku", "B-1")
        .update(row(json!({"price": 2, "internalNote": "new"})))
        .unwrap()
        .unwrap();
    assert_eq!(product.value("price"), json!(2));
    assert_eq!(product.value("internalNote"), json!("old"));
}

#[test]
fn test_update_skips_properties_that_are_not_columns() {
    let (db, storage) = blog();
    let updated = User::query(&db)
        .unwrap()
        .where_eq("id", 2)
        .update(row(json!({"name": "Grace H.", "nickname": "amazing"})))
        .unwrap()
        .unwrap();
    assert_eq!(updated.value("name"), json!("Grace H."));

    assert!(storage.rows("users").unwrap().iter().all(|r| !r.contains_key("nickname")));
    assert_eq!(User::query(&db).unwrap().get_many().unwrap().len(), 3);
}

// ============================================================================
// delete
// ============================================================================

#[test]
fn test_delete_is_soft_with_deleted_at_marker() {
    let (db, storage) = empty();
    Product::query(&db)
        .unwrap()
        .create(row(json!({"sku": "C-1", "name": "Crate"})))
        .unwrap();

    let deleted = Product::query(&db)
        .unwrap()
        .where_eq("sku", "C-1")
        .delete()
        .unwrap()
        .unwrap();
    assert!(deleted.value("deletedAt").is_string());

    let still_there = Product::query(&db).unwrap().where_eq("sku", "C-1").get().unwrap();
    assert!(still_there.is_some());

    let live = Product::query(&db).unwrap().where_null("deletedAt").count().unwrap();
    assert_eq!(live, 0);
    assert_eq!(storage.rows("products").unwrap().len(), 1);
}

#[test]
fn test_force_delete_removes_rows() {
    let (db, storage) = empty();
    Product::query(&db)
        .unwrap()
        .create(row(json!({"sku": "D-1", "name": "Drum"})))
        .unwrap();

    let removed = Product::query(&db).unwrap().where_eq("sku", "D-1").force_delete().unwrap();
    assert_eq!(removed, 1);
    assert!(storage.rows("products").unwrap().is_empty());
}

#[test]
fn test_delete_without_marker_is_hard() {
    let (db, storage) = blog();
    let result = User::query(&db).unwrap().where_eq("id", 3).delete().unwrap();
    assert!(result.is_none());
    assert_eq!(storage.rows("users").unwrap().len(), 2);
}

#[test]
fn test_storage_failures_propagate() {
    struct Failing;
    impl lifeline::Storage for Failing {
        fn find(&self, _: &lifeline::query::TableQuery) -> Result<Option<lifeline::Row>, LifeError> {
            Err(LifeError::storage("disk on fire"))
        }
        fn find_many(&self, _: &lifeline::query::TableQuery) -> Result<Vec<lifeline::Row>, LifeError> {
            Err(LifeError::storage("disk on fire"))
        }
        fn insert(&self, _: &str, _: lifeline::Row, _: &str) -> Result<Vec<Value>, LifeError> {
            Err(LifeError::storage("disk on fire"))
        }
        fn update(&self, _: &lifeline::query::TableQuery, _: lifeline::Row, _: &str) -> Result<Vec<Value>, LifeError> {
            Err(LifeError::storage("disk on fire"))
        }
        fn delete(&self, _: &lifeline::query::TableQuery) -> Result<u64, LifeError> {
            Err(LifeError::storage("disk on fire"))
        }
    }

    let db = lifeline::Database::single(std::sync::Arc::new(Failing));
    assert!(User::query(&db).unwrap().get_many().unwrap_err().is_storage());
    assert!(User::query(&db).unwrap().create(row(json!({"name": "x"}))).unwrap_err().is_storage());
    assert!(User::query(&db).unwrap().count().unwrap_err().is_storage());
}
