//! Test-data factories and their assertions.

use crate::fixtures::{empty, row, Post, Role, User};
use lifeline::factory::{Fabricated, NestedFactory};
use lifeline::{Definition, Factory, LifeEntity, LifeError, Row};
use serde_json::json;

#[test]
fn test_create_one_persists_definition_values() {
    let (db, storage) = empty();
    let user = User::factory(&db).create(Row::new()).unwrap().into_one().unwrap();

    assert!(user.value("name").is_string());
    assert!(user.value("email").as_str().unwrap().ends_with("@example.com"));
    assert_eq!(user.value("status"), json!("active"));
    assert_eq!(storage.rows("users").unwrap().len(), 1);
}

#[test]
fn test_count_creates_many_concurrently() {
    let (db, _) = empty();
    let users = User::factory(&db).count(12).create(Row::new()).unwrap();
    assert_eq!(users.len(), 12);
    assert!(matches!(users, Fabricated::Many(_)));

    User::factory(&db).assert_count(12).unwrap();

    let mut ids: Vec<i64> = users
        .into_vec()
        .iter()
        .map(|u| u.value("id").as_i64().unwrap())
        .collect();
    ids.sort_unstable();
    ids.dedup();
    assert_eq!(ids.len(), 12);
}

#[test]
fn test_overrides_win_over_definition() {
    let (db, _) = empty();
    User::factory(&db)
        .count(3)
        .create(row(json!({"name": "Ada"})))
        .unwrap();

    let factory = User::factory(&db);
    factory.assert_has(row(json!({"name": "Ada"})), 3).unwrap();
    factory.assert_exists(row(json!({"status": "active"}))).unwrap();
    factory.assert_missing(row(json!({"name": "Grace"}))).unwrap();
}

#[test]
fn test_nested_factory_creates_the_parent_first() {
    let (db, storage) = empty();
    let post = Post::factory(&db).create(Row::new()).unwrap().into_one().unwrap();

    let owner = post.value("userId");
    assert!(owner.is_i64());
    User::factory(&db).assert_exists(row(json!({"id": owner}))).unwrap();
    assert_eq!(post.value("views"), json!(0));
    assert_eq!(storage.rows("users").unwrap().len(), 1);
}

#[test]
fn test_overridden_nested_reference_is_not_fabricated() {
    let (db, storage) = empty();
    Post::factory(&db)
        .create(row(json!({"userId": 42})))
        .unwrap();

    assert!(storage.rows("users").unwrap().is_empty());
    Post::factory(&db).assert_has(row(json!({"userId": 42})), 1).unwrap();
}

#[test]
fn test_make_touches_no_storage() {
    let (db, storage) = empty();
    let posts = Post::factory(&db).count(2).make(Row::new()).unwrap().into_vec();

    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.contains_key("title")));
    assert!(posts.iter().all(|p| p["views"] == json!(0)));
    assert!(storage.calls().unwrap().is_empty());
    assert!(storage.rows("posts").unwrap().is_empty());
}

#[test]
fn test_nested_returning_another_property() {
    struct Invite;
    impl LifeEntity for Invite {
        const NAME: &'static str = "Invite";
        fn describe(schema: &mut lifeline::SchemaBuilder) -> Result<(), LifeError> {
            schema
                .column(lifeline::ColumnDef::new("id"))?
                .column(lifeline::ColumnDef::new("email"))?;
            Ok(())
        }
        fn definition() -> Result<Definition, LifeError> {
            Ok(Definition::new()
                .nested_factory("email", NestedFactory::of::<User>().returning("email")))
        }
    }

    let (db, _) = empty();
    let invite = Invite::factory(&db).create(Row::new()).unwrap().into_one().unwrap();
    User::factory(&db)
        .assert_exists(row(json!({"email": invite.value("email")})))
        .unwrap();
}

#[test]
fn test_failed_assertions_report() {
    let (db, _) = empty();
    let err = User::factory(&db).assert_count(1).unwrap_err();
    assert!(matches!(err, LifeError::AssertionFailed(ref m) if m.contains("expected 1 User rows, found 0")));

    assert!(matches!(
        User::factory(&db).assert_exists(row(json!({"name": "Ada"}))),
        Err(LifeError::AssertionFailed(_))
    ));
}

#[test]
fn test_entity_without_definition() {
    let (db, _) = empty();
    let err = Factory::<Role>::new(&db).make(Row::new()).unwrap_err();
    assert!(matches!(err, LifeError::DefinitionNotImplemented(ref name) if name == "Role"));
}
