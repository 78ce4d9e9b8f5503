//! Schema boot, column dictionaries and relation key generation.

use crate::fixtures::{Comment, Post, Product, Role, Tag, User};
use lifeline::relation::{RelationKind, RelationType};
use lifeline::{LifeEntity, LifeError};
use std::sync::Arc;

// ============================================================================
// Boot defaults
// ============================================================================

#[test]
fn test_boot_defaults() {
    let users = User::schema().unwrap();
    assert_eq!(users.table(), "users");
    assert_eq!(users.connection(), "default");
    assert_eq!(users.primary_key(), "id");

    let products = Product::schema().unwrap();
    assert_eq!(products.table(), "products");
    assert_eq!(products.primary_key(), "sku");

    assert_eq!(Tag::schema().unwrap().connection(), "catalog");
}

#[test]
fn test_schema_is_built_once_and_shared() {
    let a = User::schema().unwrap();
    let b = User::schema().unwrap();
    assert!(Arc::ptr_eq(&a, &b));
}

// ============================================================================
// Column invariants
// ============================================================================

#[test]
fn test_column_dictionaries_are_inverse() {
    for schema in [
        User::schema().unwrap(),
        Post::schema().unwrap(),
        Comment::schema().unwrap(),
        Product::schema().unwrap(),
    ] {
        for (column, property) in schema.column_dictionary() {
            assert_eq!(&schema.reverse_column_dictionary()[property], column);
        }
        assert_eq!(
            schema.column_dictionary().len(),
            schema.reverse_column_dictionary().len()
        );
    }
}

#[test]
fn test_exactly_one_primary_column() {
    for schema in [User::schema().unwrap(), Product::schema().unwrap()] {
        let primaries: Vec<_> = schema.columns().iter().filter(|c| c.is_primary).collect();
        assert_eq!(primaries.len(), 1);
        assert_eq!(primaries[0].property, schema.primary_key());
    }
}

#[test]
fn test_missing_primary_key_fails_boot() {
    struct Keyless;
    impl LifeEntity for Keyless {
        const NAME: &'static str = "Keyless";
        fn describe(schema: &mut lifeline::SchemaBuilder) -> Result<(), LifeError> {
            schema.column(lifeline::ColumnDef::new("name"))?;
            Ok(())
        }
    }

    let err = Keyless::schema().unwrap_err();
    assert!(matches!(err, LifeError::MissingPrimaryKey { ref entity, .. } if entity == "Keyless"));
}

// ============================================================================
// Relation keys
// ============================================================================

#[test]
fn test_relation_keys_follow_conventions() {
    let users = User::schema().unwrap();

    match &users.relation("posts").unwrap().kind {
        RelationKind::HasMany {
            host_primary_key,
            related_foreign_key,
        } => {
            assert_eq!(host_primary_key, "id");
            assert_eq!(related_foreign_key, "userId");
        }
        other => panic!("unexpected kind: {other:?}"),
    }

    let roles = users.relation("roles").unwrap();
    assert_eq!(roles.rel_type(), RelationType::ManyToMany);
    let RelationKind::ManyToMany(keys) = &roles.kind else {
        panic!("roles is not many-to-many");
    };
    assert_eq!(keys.pivot_host_foreign_key, "userId");
    assert_eq!(keys.pivot_table, None);

    let pivot = keys.resolve(&users, &Role::schema().unwrap());
    assert_eq!(pivot.pivot_table, "users_roles");
    assert_eq!(pivot.related_primary_key, "id");
    assert_eq!(pivot.pivot_related_foreign_key, "roleId");
}

#[test]
fn test_explicit_foreign_key_wins() {
    let posts = Post::schema().unwrap();
    match &posts.relation("author").unwrap().kind {
        RelationKind::BelongsTo {
            host_foreign_key,
            related_primary_key,
        } => {
            assert_eq!(host_foreign_key, "userId");
            assert_eq!(related_primary_key, &None);
        }
        other => panic!("unexpected kind: {other:?}"),
    }

    match &Comment::schema().unwrap().relation("post").unwrap().kind {
        RelationKind::BelongsTo { host_foreign_key, .. } => assert_eq!(host_foreign_key, "postId"),
        other => panic!("unexpected kind: {other:?}"),
    }
}
