//! Resolved entity model: entity document validated and flattened for runtime use.

use crate::config::{ColumnType, PkType, ValidationRule};

pub const CREATED_AT: &str = "created_at";
pub const UPDATED_AT: &str = "updated_at";

#[derive(Clone, Debug)]
pub struct ColumnInfo {
    pub name: String,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub has_default: bool,
    pub hidden: bool,
    pub validation: Option<ValidationRule>,
}

impl ColumnInfo {
    /// Create input must provide a value for this column.
    pub fn is_required(&self) -> bool {
        !self.nullable && !self.has_default
    }
}

#[derive(Clone, Debug)]
pub struct PrimaryKey {
    pub name: String,
    pub pk_type: PkType,
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub name: String,
    pub schema_name: String,
    pub table_name: String,
    pub path_segment: String,
    pub pk: PrimaryKey,
    /// Client-writable attribute columns, excluding the primary key and timestamps.
    pub columns: Vec<ColumnInfo>,
}

impl ResolvedEntity {
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Columns maintained by the store; clients can never write them.
    pub fn is_managed(&self, name: &str) -> bool {
        name == self.pk.name || name == CREATED_AT || name == UPDATED_AT
    }

    /// Names a list may be ordered by: the key, both timestamps, and every visible column.
    pub fn is_sortable(&self, name: &str) -> bool {
        self.is_managed(name) || self.column(name).is_some_and(|c| !c.hidden)
    }

    pub fn visible_columns(&self) -> impl Iterator<Item = &ColumnInfo> {
        self.columns.iter().filter(|c| !c.hidden)
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub entities: Vec<ResolvedEntity>,
}
