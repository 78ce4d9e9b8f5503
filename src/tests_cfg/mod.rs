//! Entities and storage fixtures shared by the unit tests.
//!
//! Schemas are cached per type for the whole test binary, so every entity here
//! has exactly one description; tests needing a different shape declare their
//! own local entity type.

use crate::error::LifeError;
use crate::factory::Definition;
use crate::relation::Relation;
use crate::schema::{ColumnDef, LifeEntity, SchemaBuilder};
use crate::storage::{MemoryStorage, Row};
use crate::Database;
use serde_json::Value;
use std::sync::Arc;

pub struct User;
pub struct Profile;
pub struct Post;
pub struct Comment;
pub struct Role;

impl LifeEntity for User {
    const NAME: &'static str = "User";

    fn describe(schema: &mut SchemaBuilder) -> Result<(), LifeError> {
        schema
            .column(ColumnDef::new("id"))?
            .column(ColumnDef::new("name"))?
            .column(ColumnDef::new("role").default_value("member"))?
            .column(ColumnDef::new("createdAt").name("created_at").created_at())?
            .column(ColumnDef::new("updatedAt").name("updated_at").updated_at())?
            .relation(Relation::has_one::<Profile>("profile"))
            .relation(Relation::has_many::<Post>("posts"))
            .relation(Relation::many_to_many::<Role>("roles"));
        Ok(())
    }

    fn definition() -> Result<Definition, LifeError> {
        Ok(Definition::new().value("name", "Fixture"))
    }
}

impl LifeEntity for Profile {
    const NAME: &'static str = "Profile";

    fn describe(schema: &mut SchemaBuilder) -> Result<(), LifeError> {
        schema
            .column(ColumnDef::new("id"))?
            .column(ColumnDef::new("userId").name("user_id"))?
            .column(ColumnDef::new("bio"))?;
        Ok(())
    }
}

impl LifeEntity for Post {
    const NAME: &'static str = "Post";

    fn describe(schema: &mut SchemaBuilder) -> Result<(), LifeError> {
        schema
            .column(ColumnDef::new("id"))?
            .column(ColumnDef::new("userId").name("user_id"))?
            .column(ColumnDef::new("title"))?
            .relation(Relation::belongs_to::<User>("user"))
            .relation(Relation::has_many::<Comment>("comments"));
        Ok(())
    }

    fn definition() -> Result<Definition, LifeError> {
        Ok(Definition::new()
            .value("title", "Untitled")
            .nested::<User>("userId"))
    }
}

impl LifeEntity for Comment {
    const NAME: &'static str = "Comment";

    fn describe(schema: &mut SchemaBuilder) -> Result<(), LifeError> {
        schema
            .column(ColumnDef::new("id"))?
            .column(ColumnDef::new("postId").name("post_id"))?
            .column(ColumnDef::new("body"))?;
        Ok(())
    }
}

impl LifeEntity for Role {
    const NAME: &'static str = "Role";

    fn describe(schema: &mut SchemaBuilder) -> Result<(), LifeError> {
        schema
            .column(ColumnDef::new("id"))?
            .column(ColumnDef::new("label"))?;
        Ok(())
    }
}

/// Object literal to [`Row`].
pub fn row(value: Value) -> Row {
    match value {
        Value::Object(map) => map,
        other => panic!("expected an object, got {other}"),
    }
}

pub fn rows(values: Vec<Value>) -> Vec<Row> {
    values.into_iter().map(row).collect()
}

/// Empty memory storage behind a default database.
pub fn memory_db() -> (Database, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    (Database::single(Arc::clone(&storage)), storage)
}

/// Two users, three posts, one profile, comments and roles through a pivot.
pub fn seeded_db() -> (Database, Arc<MemoryStorage>) {
    let (db, storage) = memory_db();
    let seed = |table: &str, values: Vec<Value>| {
        storage
            .seed(table, "id", rows(values))
            .expect("seed fixture rows");
    };
    seed(
        "users",
        vec![
            serde_json::json!({"id": 1, "name": "Ada", "role": "admin", "created_at": null, "updated_at": null}),
            serde_json::json!({"id": 2, "name": "Grace", "role": "member", "created_at": null, "updated_at": null}),
        ],
    );
    seed(
        "profiles",
        vec![serde_json::json!({"id": 1, "user_id": 1, "bio": "Analyst"})],
    );
    seed(
        "posts",
        vec![
            serde_json::json!({"id": 1, "user_id": 1, "title": "Notes"}),
            serde_json::json!({"id": 2, "user_id": 1, "title": "Engines"}),
            serde_json::json!({"id": 3, "user_id": 2, "title": "Compilers"}),
        ],
    );
    seed(
        "comments",
        vec![
            serde_json::json!({"id": 1, "post_id": 1, "body": "first"}),
            serde_json::json!({"id": 2, "post_id": 3, "body": "second"}),
        ],
    );
    seed(
        "roles",
        vec![
            serde_json::json!({"id": 10, "label": "reader"}),
            serde_json::json!({"id": 20, "label": "writer"}),
        ],
    );
    seed(
        "users_roles",
        vec![
            serde_json::json!({"id": 1, "userId": 1, "roleId": 20}),
            serde_json::json!({"id": 2, "userId": 1, "roleId": 10}),
        ],
    );
    (db, storage)
}
