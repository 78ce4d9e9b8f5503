//! Column metadata.

use serde_json::Value;

/// Mapping between one entity property and one storage column.
///
/// # Example
///
/// ```
/// use lifeline::schema::ColumnDef;
///
/// let created = ColumnDef::new("createdAt").name("created_at").created_at();
/// assert_eq!(created.column, "created_at");
/// assert!(created.is_created_at);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    /// Property name on the entity.
    pub property: String,
    /// Storage column name; defaults to the property name.
    pub column: String,
    /// Set when the owning schema is built.
    pub is_primary: bool,
    /// Filled into inserts that omit the property.
    pub default_value: Option<Value>,
    pub is_created_at: bool,
    pub is_updated_at: bool,
    pub is_deleted_at: bool,
}

impl ColumnDef {
    pub fn new(property: impl Into<String>) -> Self {
        let property = property.into();
        Self {
            column: property.clone(),
            property,
            is_primary: false,
            default_value: None,
            is_created_at: false,
            is_updated_at: false,
            is_deleted_at: false,
        }
    }

    /// Storage column name, when it differs from the property.
    pub fn name(mut self, column: impl Into<String>) -> Self {
        self.column = column.into();
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Stamped with the current time on insert.
    pub fn created_at(mut self) -> Self {
        self.is_created_at = true;
        self
    }

    /// Stamped with the current time on insert and update.
    pub fn updated_at(mut self) -> Self {
        self.is_updated_at = true;
        self
    }

    /// Set instead of removing the row on delete.
    pub fn deleted_at(mut self) -> Self {
        self.is_deleted_at = true;
        self
    }

    /// Whether the column carries any timestamp marker.
    pub fn is_marker(&self) -> bool {
        self.is_created_at || self.is_updated_at || self.is_deleted_at
    }
}
