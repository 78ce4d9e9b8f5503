//! Per-query include directives.
//!
//! Each [`QueryBuilder`] owns an [`IncludeTree`] describing which relations to
//! eager-load, nested by dotted path. Nothing is recorded on the shared schema,
//! so one query's includes never leak into another.

use crate::error::LifeError;
use crate::query::QueryBuilder;
use crate::schema::EntitySchema;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Customizes the query issued for an included relation.
pub type IncludeCallback =
    Arc<dyn Fn(QueryBuilder) -> Result<QueryBuilder, LifeError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct IncludeNode {
    callback: Option<IncludeCallback>,
    children: IncludeTree,
}

impl IncludeNode {
    pub fn callback(&self) -> Option<&IncludeCallback> {
        self.callback.as_ref()
    }

    /// Includes to apply on the related entity.
    pub fn children(&self) -> &IncludeTree {
        &self.children
    }
}

impl fmt::Debug for IncludeNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IncludeNode")
            .field("callback", &self.callback.is_some())
            .field("children", &self.children)
            .finish()
    }
}

/// Relations to eager-load, keyed by relation property.
#[derive(Clone, Default, Debug)]
pub struct IncludeTree {
    nodes: BTreeMap<String, IncludeNode>,
}

impl IncludeTree {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn get(&self, relation: &str) -> Option<&IncludeNode> {
        self.nodes.get(relation)
    }

    /// Whether the dotted `path` is included.
    pub fn contains(&self, path: &str) -> bool {
        let mut tree = self;
        for segment in path.split('.') {
            match tree.nodes.get(segment) {
                Some(node) => tree = &node.children,
                None => return false,
            }
        }
        true
    }

    /// Record `path` starting at `root`.
    ///
    /// Every segment is checked against the schema it lands on before anything
    /// is recorded, so a bad path leaves the tree untouched. `callback` is
    /// attached to the first segment only.
    pub(crate) fn insert(
        &mut self,
        root: &Arc<EntitySchema>,
        path: &str,
        mut callback: Option<IncludeCallback>,
    ) -> Result<(), LifeError> {
        let segments: Vec<&str> = path.split('.').collect();

        let mut schema = Arc::clone(root);
        for (i, segment) in segments.iter().enumerate() {
            let relation = schema
                .relation(segment)
                .ok_or_else(|| LifeError::RelationNotFound {
                    relation: (*segment).to_string(),
                    entity: schema.name().to_string(),
                })?;
            if i + 1 < segments.len() {
                let next = relation.related.schema()?;
                schema = next;
            }
        }

        let mut tree = self;
        for (i, segment) in segments.iter().enumerate() {
            let node = tree.nodes.entry((*segment).to_string()).or_default();
            if i == 0 {
                if let Some(callback) = callback.take() {
                    node.callback = Some(callback);
                }
            }
            tree = &mut node.children;
        }
        Ok(())
    }
}
