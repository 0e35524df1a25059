//! Shared helpers for integration tests: an in-memory `EntityStore` and request plumbing.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use crud_scaffold::config::{parse_document, resolve, ColumnType, PkType, CREATED_AT, UPDATED_AT};
use crud_scaffold::service::{CreateInput, UpdateInput};
use crud_scaffold::store::{Direction, EntityStore, ListQuery};
use crud_scaffold::{build_app, AppError, AppState, HttpSettings, Identity, PaginationSettings, PermissionRegistry, ResolvedEntity, ResolvedModel};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex};
use tower::ServiceExt;

pub const EXAMPLE_DOCUMENT: &str = r#"{
  "entities": [
    {
      "name": "Example",
      "table": "example",
      "columns": [
        { "name": "name", "type": "text", "validation": { "min_length": 1, "max_length": 255 } },
        { "name": "value", "type": "int" },
        { "name": "description", "type": "text", "validation": { "max_length": 255 } }
      ]
    },
    {
      "name": "Note",
      "table": "notes",
      "primary_key": { "name": "id", "type": "uuid" },
      "columns": [
        { "name": "body", "type": "text" },
        { "name": "pinned", "type": "bool", "has_default": true },
        { "name": "token", "type": "text", "nullable": true, "hidden": true }
      ]
    }
  ]
}"#;

pub fn example_model() -> ResolvedModel {
    resolve(&parse_document(EXAMPLE_DOCUMENT).unwrap()).unwrap()
}

#[derive(Default)]
struct Table {
    next_id: i64,
    rows: Vec<Map<String, Value>>,
}

/// Rows live in memory per table. Keys and timestamps are assigned the way `PgStore` assigns them.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<HashMap<String, Table>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Arc<Self> {
        Arc::new(MemoryStore::default())
    }

    /// Make every following call fail with a storage error.
    pub fn fail(&self) {
        self.failing.store(true, AtomicOrdering::SeqCst);
    }

    pub fn len(&self, table: &str) -> usize {
        self.tables.lock().unwrap().get(table).map_or(0, |t| t.rows.len())
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(AtomicOrdering::SeqCst) {
            return Err(AppError::Storage(sqlx::Error::PoolTimedOut));
        }
        Ok(())
    }
}

fn timestamp(t: DateTime<Utc>) -> Value {
    Value::String(t.to_rfc3339_opts(SecondsFormat::Micros, false))
}

fn compare(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => {
            x.as_f64().unwrap_or(0.0).total_cmp(&y.as_f64().unwrap_or(0.0))
        }
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn count(&self, entity: &ResolvedEntity) -> Result<u64, AppError> {
        self.check()?;
        Ok(self.len(&entity.table_name) as u64)
    }

    async fn list(&self, entity: &ResolvedEntity, query: &ListQuery) -> Result<Vec<Value>, AppError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        let mut rows: Vec<Map<String, Value>> = tables
            .get(&entity.table_name)
            .map(|t| t.rows.clone())
            .unwrap_or_default();
        let pk = entity.pk.name.as_str();
        let sort = query.sort_by.as_deref().unwrap_or(pk);
        rows.sort_by(|a, b| {
            let ord = compare(a.get(sort), b.get(sort)).then_with(|| compare(a.get(pk), b.get(pk)));
            match query.direction {
                Direction::Asc => ord,
                Direction::Desc => ord.reverse(),
            }
        });
        let rows = rows.into_iter().map(Value::Object);
        Ok(match query.window {
            Some(w) => rows.skip(w.offset as usize).take(w.limit as usize).collect(),
            None => rows.collect(),
        })
    }

    async fn read(&self, entity: &ResolvedEntity, id: &Value) -> Result<Option<Value>, AppError> {
        self.check()?;
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .get(&entity.table_name)
            .and_then(|t| t.rows.iter().find(|r| r.get(&entity.pk.name) == Some(id)))
            .cloned()
            .map(Value::Object))
    }

    async fn create(&self, entity: &ResolvedEntity, input: &CreateInput) -> Result<Value, AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let table = tables.entry(entity.table_name.clone()).or_default();
        let id = match entity.pk.pk_type {
            PkType::BigInt | PkType::Int => {
                table.next_id += 1;
                Value::from(table.next_id)
            }
            PkType::Uuid | PkType::Text => Value::String(uuid::Uuid::new_v4().to_string()),
        };
        let now = timestamp(Utc::now());
        let mut row = Map::new();
        row.insert(entity.pk.name.clone(), id);
        for col in &entity.columns {
            let value = match input.fields().get(&col.name) {
                Some(v) => v.clone(),
                None if col.has_default && col.column_type == ColumnType::Bool => Value::Bool(false),
                None => Value::Null,
            };
            row.insert(col.name.clone(), value);
        }
        row.insert(CREATED_AT.to_string(), now.clone());
        row.insert(UPDATED_AT.to_string(), now);
        table.rows.push(row.clone());
        Ok(Value::Object(row))
    }

    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: &Value,
        input: &UpdateInput,
    ) -> Result<Option<Value>, AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(row) = tables
            .get_mut(&entity.table_name)
            .and_then(|t| t.rows.iter_mut().find(|r| r.get(&entity.pk.name) == Some(id)))
        else {
            return Ok(None);
        };
        for (k, v) in input.fields() {
            row.insert(k.clone(), v.clone());
        }
        let previous = row
            .get(UPDATED_AT)
            .and_then(Value::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|d| d.with_timezone(&Utc));
        let mut now = Utc::now();
        if let Some(prev) = previous {
            if now <= prev {
                now = prev + Duration::microseconds(1);
            }
        }
        row.insert(UPDATED_AT.to_string(), timestamp(now));
        Ok(Some(Value::Object(row.clone())))
    }

    async fn delete(&self, entity: &ResolvedEntity, id: &Value) -> Result<bool, AppError> {
        self.check()?;
        let mut tables = self.tables.lock().unwrap();
        let Some(table) = tables.get_mut(&entity.table_name) else {
            return Ok(false);
        };
        let before = table.rows.len();
        table.rows.retain(|r| r.get(&entity.pk.name) != Some(id));
        Ok(table.rows.len() < before)
    }

    async fn ping(&self) -> Result<(), AppError> {
        self.check()
    }
}

pub fn app_with(store: Arc<MemoryStore>, permissions: PermissionRegistry, http: HttpSettings) -> Router {
    let pagination = PaginationSettings {
        default_size: 10,
        max_size: 50,
    };
    let state = AppState::new(store, example_model(), pagination);
    build_app(state, &permissions, &http)
}

pub fn app(store: Arc<MemoryStore>) -> Router {
    app_with(store, PermissionRegistry::new(), HttpSettings::default())
}

pub async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    send_as(app, method, uri, body, None).await
}

/// Send a request, optionally as an authenticated caller, and decode the JSON response.
pub async fn send_as(
    app: &Router,
    method: &str,
    uri: &str,
    body: Option<Value>,
    identity: Option<Identity>,
) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(identity) = identity {
        builder = builder.extension(identity);
    }
    let request = match body {
        Some(b) => builder
            .header("content-type", "application/json")
            .body(Body::from(b.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

pub async fn create_example(app: &Router, name: &str, value: i64) -> Value {
    let (status, body) = send(
        app,
        "POST",
        "/example",
        Some(serde_json::json!({ "name": name, "value": value, "description": "d" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    body["data"].clone()
}
