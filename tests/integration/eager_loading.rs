//! Eager loading through `includes`.

use crate::fixtures::{blog, rows, Comment, Post, User};
use lifeline::storage::StorageOperation;
use lifeline::{Direction, LifeEntity, LifeError, Loaded};
use serde_json::json;

// ============================================================================
// Relation kinds
// ============================================================================

#[test]
fn test_many_to_many_keeps_pivot_order_and_extras() {
    let (db, storage) = blog();
    let user = User::query(&db)
        .unwrap()
        .where_eq("id", 1)
        .includes("roles")
        .unwrap()
        .get()
        .unwrap()
        .unwrap();

    let ids: Vec<_> = user.many("roles").iter().map(|r| r.value("id")).collect();
    assert_eq!(ids, vec![json!(10), json!(20)]);

    let pivot = storage.rows("users_roles").unwrap();
    assert_eq!(user.extras("roles").unwrap(), pivot.as_slice());
}

#[test]
fn test_many_to_many_follows_pivot_not_storage_order() {
    let (db, storage) = blog();
    storage
        .seed("users_roles", "id", rows(vec![json!({"userId": 2, "roleId": 20}), json!({"userId": 2, "roleId": 10})]))
        .unwrap();

    let user = User::query(&db)
        .unwrap()
        .where_eq("id", 2)
        .includes("roles")
        .unwrap()
        .get()
        .unwrap()
        .unwrap();
    let labels: Vec<_> = user.many("roles").iter().map(|r| r.value("label")).collect();
    assert_eq!(labels, vec![json!("writer"), json!("reader")]);
}

#[test]
fn test_belongs_to_and_has_one() {
    let (db, _) = blog();
    let post = Post::query(&db)
        .unwrap()
        .where_eq("id", 3)
        .includes("author.profile")
        .unwrap()
        .get()
        .unwrap()
        .unwrap();

    let author = post.one("author").unwrap();
    assert_eq!(author.value("name"), json!("Grace"));
    assert!(matches!(author.relation("profile"), Some(Loaded::One(None))));

    let comment = Comment::query(&db)
        .unwrap()
        .where_eq("id", 1)
        .includes("post.author.profile")
        .unwrap()
        .get()
        .unwrap()
        .unwrap();
    let profile = comment.one("post").unwrap().one("author").unwrap().one("profile").unwrap();
    assert_eq!(profile.value("bio"), json!("Engines"));
}

#[test]
fn test_nested_has_many() {
    let (db, _) = blog();
    let users = User::query(&db)
        .unwrap()
        .includes("posts.comments")
        .unwrap()
        .order_by("id", Direction::Asc)
        .get_many()
        .unwrap();

    let counts: Vec<Vec<usize>> = users
        .iter()
        .map(|u| u.many("posts").iter().map(|p| p.many("comments").len()).collect())
        .collect();
    assert_eq!(counts, vec![vec![2, 0], vec![1], vec![]]);
}

#[test]
fn test_callback_shapes_the_related_query() {
    let (db, _) = blog();
    let user = User::query(&db)
        .unwrap()
        .where_eq("id", 1)
        .includes_with("posts", |q| Ok(q.order_by("views", Direction::Asc).limit(1)))
        .unwrap()
        .get()
        .unwrap()
        .unwrap();

    let titles: Vec<_> = user.many("posts").iter().map(|p| p.value("title")).collect();
    assert_eq!(titles, vec![json!("Bernoulli")]);
}

#[test]
fn test_callback_error_aborts_resolution() {
    let (db, _) = blog();
    let err = User::query(&db)
        .unwrap()
        .includes_with("posts", |_| Err(LifeError::storage("refused")))
        .unwrap()
        .get_many()
        .unwrap_err();
    assert!(err.is_storage());
}

#[test]
fn test_to_json_nests_relations() {
    let (db, _) = blog();
    let user = User::query(&db)
        .unwrap()
        .where_eq("id", 1)
        .includes("profile")
        .unwrap()
        .includes("roles")
        .unwrap()
        .get()
        .unwrap()
        .unwrap();

    let body = user.to_json();
    assert_eq!(body["profile"]["bio"], json!("Engines"));
    assert_eq!(body["roles"].as_array().unwrap().len(), 2);
    assert_eq!(body["$extras"]["roles"].as_array().unwrap().len(), 2);
}

// ============================================================================
// Include validation and isolation
// ============================================================================

#[test]
fn test_unknown_relation_fails_before_any_query() {
    let (db, storage) = blog();

    let err = User::query(&db).unwrap().includes("followers.posts").unwrap_err();
    assert!(matches!(err, LifeError::RelationNotFound { ref relation, .. } if relation == "followers"));

    let err = User::query(&db).unwrap().includes("posts.likes").unwrap_err();
    assert!(matches!(err, LifeError::RelationNotFound { ref entity, .. } if entity == "Post"));

    assert!(storage.calls().unwrap().is_empty());
}

#[test]
fn test_includes_never_leak_into_later_queries() {
    let (db, storage) = blog();
    let with = User::query(&db).unwrap().includes("posts").unwrap().get_many().unwrap();
    assert!(with.iter().all(|u| u.is_loaded("posts")));

    storage.clear_calls().unwrap();
    let without = User::query(&db).unwrap().get_many().unwrap();
    assert!(without.iter().all(|u| !u.is_loaded("posts")));
    assert!(storage.calls_on("posts").unwrap().is_empty());
}

#[test]
fn test_concurrent_chains_keep_their_own_includes() {
    let (db, _) = blog();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let db = db.clone();
            std::thread::spawn(move || {
                let query = User::query(&db).unwrap();
                let query = if i % 2 == 0 { query.includes("posts").unwrap() } else { query };
                let users = query.get_many().unwrap();
                (i, users.iter().all(|u| u.is_loaded("posts")))
            })
        })
        .collect();

    for handle in handles {
        let (i, loaded) = handle.join().unwrap();
        assert_eq!(loaded, i % 2 == 0, "chain {i}");
    }
}

#[test]
fn test_lookups_are_one_per_instance() {
    let (db, storage) = blog();
    User::query(&db)
        .unwrap()
        .includes("posts")
        .unwrap()
        .includes("profile")
        .unwrap()
        .get_many()
        .unwrap();

    let posts = storage.calls_on("posts").unwrap();
    assert_eq!(posts.len(), 3);
    assert!(posts.iter().all(|c| c.operation == StorageOperation::FindMany));
    assert_eq!(storage.calls_on("profiles").unwrap().len(), 3);
}
