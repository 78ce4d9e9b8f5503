//! Naming conventions used for default tables and relation keys.

use heck::{ToLowerCamelCase, ToSnakeCase};

/// Default table for an entity: `BlogPost` -> `blog_posts`.
pub fn table_name(entity: &str) -> String {
    pluralizer::pluralize(&entity.to_snake_case(), 2, false)
}

/// `ProductDetail` -> `productDetail`.
pub fn lower_first(name: &str) -> String {
    name.to_lower_camel_case()
}

/// `users` -> `user`.
pub fn singular(word: &str) -> String {
    pluralizer::pluralize(word, 1, false)
}

/// Conventional foreign-key property pointing at `owner`: `User` -> `userId`.
pub fn foreign_key_for(owner: &str) -> String {
    format!("{}Id", lower_first(owner))
}
