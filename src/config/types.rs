//! Raw entity document types as read from JSON.

use serde::{Deserialize, Serialize};

fn default_schema() -> String {
    "public".to_string()
}

/// Top-level entity document: every entity the application exposes.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EntityDocument {
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntityConfig {
    /// Display name used in messages and API docs (e.g. "Example").
    pub name: String,
    pub table: String,
    #[serde(default = "default_schema")]
    pub schema: String,
    /// URL prefix the entity router is mounted under. Defaults to the table name.
    #[serde(default)]
    pub path_segment: Option<String>,
    #[serde(default)]
    pub primary_key: PrimaryKeyConfig,
    pub columns: Vec<ColumnConfig>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PrimaryKeyConfig {
    #[serde(default = "default_pk_name")]
    pub name: String,
    #[serde(rename = "type", default)]
    pub pk_type: PkType,
}

fn default_pk_name() -> String {
    "id".to_string()
}

impl Default for PrimaryKeyConfig {
    fn default() -> Self {
        PrimaryKeyConfig {
            name: default_pk_name(),
            pk_type: PkType::default(),
        }
    }
}

/// Primary key type. Integer keys are generated by the database; uuid and text keys by the store.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PkType {
    #[default]
    #[serde(alias = "int8", alias = "bigserial")]
    BigInt,
    #[serde(alias = "int4", alias = "integer", alias = "serial")]
    Int,
    Uuid,
    Text,
}

impl PkType {
    /// Column type of the key values.
    pub fn column_type(self) -> ColumnType {
        match self {
            PkType::BigInt => ColumnType::BigInt,
            PkType::Int => ColumnType::Int,
            PkType::Uuid => ColumnType::Uuid,
            PkType::Text => ColumnType::Text,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    #[serde(alias = "varchar", alias = "string")]
    Text,
    #[serde(alias = "int4", alias = "integer")]
    Int,
    #[serde(alias = "int8")]
    BigInt,
    #[serde(alias = "float8", alias = "double")]
    Float,
    #[serde(alias = "boolean")]
    Bool,
    #[serde(alias = "timestamptz", alias = "datetime")]
    Timestamp,
    Uuid,
    #[serde(alias = "jsonb")]
    Json,
}

impl ColumnType {
    pub fn as_str(self) -> &'static str {
        match self {
            ColumnType::Text => "text",
            ColumnType::Int => "int",
            ColumnType::BigInt => "bigint",
            ColumnType::Float => "float",
            ColumnType::Bool => "bool",
            ColumnType::Timestamp => "timestamp",
            ColumnType::Uuid => "uuid",
            ColumnType::Json => "json",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ColumnConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    /// Column has a database default, so create input may omit it.
    #[serde(default)]
    pub has_default: bool,
    /// Never exposed in API responses (e.g. password hashes).
    #[serde(default)]
    pub hidden: bool,
    #[serde(default)]
    pub validation: Option<ValidationRule>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    /// "email" or "uuid".
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub allowed: Option<Vec<serde_json::Value>>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}
