//! Create and update input shapes derived from an entity, plus response projection.

use crate::config::{ColumnInfo, ColumnType, PkType, ResolvedEntity};
use crate::error::{AppError, FieldError};
use crate::service::RequestValidator;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Validated column values, keyed by column name. Values are normalized for their column type.
pub type Fields = HashMap<String, Value>;

/// Full create input: every required column present, no managed or unknown fields.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateInput(Fields);

/// Partial update input: only the fields the client sent.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateInput(Fields);

impl CreateInput {
    pub fn parse(entity: &ResolvedEntity, body: Value) -> Result<Self, AppError> {
        let obj = into_object(body)?;
        let mut errors = Vec::new();
        for col in entity.columns.iter().filter(|c| c.is_required()) {
            if !obj.contains_key(&col.name) {
                errors.push(FieldError::new(&col.name, "field required"));
            }
        }
        let fields = parse_fields(entity, obj, &mut errors);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(CreateInput(fields))
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }
}

impl UpdateInput {
    pub fn parse(entity: &ResolvedEntity, body: Value) -> Result<Self, AppError> {
        let obj = into_object(body)?;
        let mut errors = Vec::new();
        let fields = parse_fields(entity, obj, &mut errors);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(UpdateInput(fields))
    }

    pub fn fields(&self) -> &Fields {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn into_object(body: Value) -> Result<Map<String, Value>, AppError> {
    match body {
        Value::Object(m) => Ok(m),
        _ => Err(AppError::invalid("body", "must be a JSON object")),
    }
}

fn parse_fields(entity: &ResolvedEntity, obj: Map<String, Value>, errors: &mut Vec<FieldError>) -> Fields {
    let mut fields = Fields::with_capacity(obj.len());
    for (key, value) in obj {
        if entity.is_managed(&key) {
            errors.push(FieldError::new(&key, "is assigned by the server and cannot be set"));
            continue;
        }
        let Some(col) = entity.column(&key) else {
            errors.push(FieldError::new(&key, "unknown field"));
            continue;
        };
        match coerce(col, value) {
            Ok(v) => {
                if let Some(rule) = &col.validation {
                    errors.extend(RequestValidator::check(&col.name, &v, rule));
                }
                fields.insert(key, v);
            }
            Err(e) => errors.push(e),
        }
    }
    fields
}

/// Type-check a JSON value for a column and normalize it (timestamps to RFC 3339, uuids hyphenated).
fn coerce(col: &ColumnInfo, value: Value) -> Result<Value, FieldError> {
    if value.is_null() {
        return if col.nullable {
            Ok(Value::Null)
        } else {
            Err(FieldError::new(&col.name, "must not be null"))
        };
    }
    let mismatch = || FieldError::new(&col.name, format!("expected {}", col.column_type.as_str()));
    match col.column_type {
        ColumnType::Text => value.is_string().then_some(value).ok_or_else(mismatch),
        ColumnType::Int => value
            .as_i64()
            .filter(|n| i32::try_from(*n).is_ok())
            .map(Value::from)
            .ok_or_else(mismatch),
        ColumnType::BigInt => value.as_i64().map(Value::from).ok_or_else(mismatch),
        ColumnType::Float => value.as_f64().map(Value::from).ok_or_else(mismatch),
        ColumnType::Bool => value.is_boolean().then_some(value).ok_or_else(mismatch),
        ColumnType::Timestamp => value
            .as_str()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|d| Value::String(d.with_timezone(&chrono::Utc).to_rfc3339()))
            .ok_or_else(mismatch),
        ColumnType::Uuid => value
            .as_str()
            .and_then(|s| uuid::Uuid::parse_str(s).ok())
            .map(|u| Value::String(u.to_string()))
            .ok_or_else(mismatch),
        ColumnType::Json => Ok(value),
    }
}

/// Parse a path id for the entity's key type. `None` means no row can have this id.
pub fn parse_id(entity: &ResolvedEntity, raw: &str) -> Option<Value> {
    match entity.pk.pk_type {
        PkType::BigInt => raw.parse::<i64>().ok().map(Value::from),
        PkType::Int => raw.parse::<i32>().ok().map(Value::from),
        PkType::Uuid => uuid::Uuid::parse_str(raw).ok().map(|u| Value::String(u.to_string())),
        PkType::Text => Some(Value::String(raw.to_string())),
    }
}

/// Response shape of a stored row: hidden columns removed.
pub fn project_row(entity: &ResolvedEntity, row: Value) -> Value {
    match row {
        Value::Object(mut m) => {
            for col in entity.columns.iter().filter(|c| c.hidden) {
                m.remove(&col.name);
            }
            Value::Object(m)
        }
        other => other,
    }
}
