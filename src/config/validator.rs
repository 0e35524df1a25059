//! Entity document validation: identifiers, uniqueness, and column rules.

use crate::config::resolved::{CREATED_AT, UPDATED_AT};
use crate::config::{EntityConfig, EntityDocument};
use crate::error::ConfigError;
use regex::Regex;
use std::collections::HashSet;

/// Path segments taken by the common routes.
pub(crate) const RESERVED_PATHS: [&str; 4] = ["health", "ready", "version", "openapi.json"];

fn check_identifier(kind: &str, s: &str) -> Result<(), ConfigError> {
    let ok = !s.is_empty()
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if !ok {
        return Err(ConfigError::Validation(format!("invalid {} name: '{}'", kind, s)));
    }
    Ok(())
}

pub fn validate(doc: &EntityDocument) -> Result<(), ConfigError> {
    if doc.entities.is_empty() {
        return Err(ConfigError::Validation("at least one entity required".into()));
    }
    let mut names = HashSet::new();
    let mut paths = HashSet::new();
    for e in &doc.entities {
        if e.name.trim().is_empty() {
            return Err(ConfigError::Validation("entity name must not be empty".into()));
        }
        if !names.insert(e.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "entity name",
                name: e.name.clone(),
            });
        }
        let path = path_segment_of(e);
        check_identifier("path segment", path)?;
        if RESERVED_PATHS.contains(&path) {
            return Err(ConfigError::Validation(format!("path segment '{}' is reserved", path)));
        }
        if !paths.insert(path) {
            return Err(ConfigError::Duplicate {
                kind: "path segment",
                name: path.to_string(),
            });
        }
        validate_entity(e)?;
    }
    Ok(())
}

/// Path segment the entity is mounted under: explicit, else table name.
pub fn path_segment_of(e: &EntityConfig) -> &str {
    e.path_segment.as_deref().unwrap_or(&e.table)
}

fn validate_entity(e: &EntityConfig) -> Result<(), ConfigError> {
    check_identifier("schema", &e.schema)?;
    check_identifier("table", &e.table)?;
    check_identifier("primary key", &e.primary_key.name)?;
    let reserved = [e.primary_key.name.as_str(), CREATED_AT, UPDATED_AT];
    let mut seen = HashSet::new();
    for c in &e.columns {
        check_identifier("column", &c.name)?;
        if reserved.contains(&c.name.as_str()) {
            return Err(ConfigError::Validation(format!(
                "entity {}: column '{}' is managed by the store and cannot be declared",
                e.name, c.name
            )));
        }
        if !seen.insert(c.name.as_str()) {
            return Err(ConfigError::Duplicate {
                kind: "column",
                name: format!("{}.{}", e.table, c.name),
            });
        }
        if let Some(rule) = &c.validation {
            if let Some(pattern) = &rule.pattern {
                Regex::new(pattern).map_err(|err| {
                    ConfigError::Validation(format!("entity {}: column {} pattern: {}", e.name, c.name, err))
                })?;
            }
            if let (Some(min), Some(max)) = (rule.min_length, rule.max_length) {
                if min > max {
                    return Err(ConfigError::Validation(format!(
                        "entity {}: column {} min_length exceeds max_length",
                        e.name, c.name
                    )));
                }
            }
        }
    }
    Ok(())
}
