//! Load the entity document from JSON and resolve it into the runtime model.

use crate::config::resolved::{ColumnInfo, PrimaryKey, ResolvedEntity, ResolvedModel};
use crate::config::{path_segment_of, validate, EntityDocument};
use crate::error::ConfigError;
use std::path::Path;

/// Build resolved model from the entity document. Validates first.
pub fn resolve(doc: &EntityDocument) -> Result<ResolvedModel, ConfigError> {
    validate(doc)?;

    let mut entities = Vec::with_capacity(doc.entities.len());
    for e in &doc.entities {
        let columns = e
            .columns
            .iter()
            .map(|c| ColumnInfo {
                name: c.name.clone(),
                column_type: c.column_type,
                nullable: c.nullable,
                has_default: c.has_default,
                hidden: c.hidden,
                validation: c.validation.clone(),
            })
            .collect();
        let entity = ResolvedEntity {
            name: e.name.clone(),
            schema_name: e.schema.clone(),
            table_name: e.table.clone(),
            path_segment: path_segment_of(e).to_string(),
            pk: PrimaryKey {
                name: e.primary_key.name.clone(),
                pk_type: e.primary_key.pk_type,
            },
            columns,
        };
        entities.push(entity);
    }

    Ok(ResolvedModel { entities })
}

pub fn parse_document(json: &str) -> Result<EntityDocument, ConfigError> {
    serde_json::from_str(json).map_err(|e| ConfigError::Load(e.to_string()))
}

/// Read and resolve the entity document at `path`.
pub async fn load_from_path(path: impl AsRef<Path>) -> Result<ResolvedModel, ConfigError> {
    let path = path.as_ref();
    let raw = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let doc = parse_document(&raw)?;
    let model = resolve(&doc)?;
    tracing::info!(path = %path.display(), entities = model.entities.len(), "entity document loaded");
    Ok(model)
}
