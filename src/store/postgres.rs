//! PostgreSQL store: executes builder queries on a pooled connection per call.

use crate::config::{ColumnType, PkType, ResolvedEntity, CREATED_AT, UPDATED_AT};
use crate::error::AppError;
use crate::service::{CreateInput, UpdateInput};
use crate::sql::{self, PgBindValue, QueryBuf};
use crate::store::{EntityStore, ListQuery};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sqlx::postgres::PgRow;
use sqlx::PgPool;

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        PgStore { pool }
    }

    async fn fetch_optional(&self, q: QueryBuf) -> Result<Option<PgRow>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = query.bind(p);
        }
        Ok(query.fetch_optional(&self.pool).await?)
    }

    async fn fetch_all(&self, q: QueryBuf) -> Result<Vec<PgRow>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in q.params {
            query = query.bind(p);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn count(&self, entity: &ResolvedEntity) -> Result<u64, AppError> {
        let q = sql::count(entity);
        tracing::debug!(sql = %q.sql, "query");
        let n = sqlx::query_scalar::<_, i64>(&q.sql).fetch_one(&self.pool).await?;
        Ok(n.max(0) as u64)
    }

    async fn list(&self, entity: &ResolvedEntity, query: &ListQuery) -> Result<Vec<Value>, AppError> {
        let rows = self.fetch_all(sql::select_list(entity, query)).await?;
        rows.iter().map(|r| row_to_json(entity, r)).collect()
    }

    async fn read(&self, entity: &ResolvedEntity, id: &Value) -> Result<Option<Value>, AppError> {
        let id = PgBindValue::for_key(&entity.pk, id)?;
        let row = self.fetch_optional(sql::select_by_id(entity, id)).await?;
        row.map(|r| row_to_json(entity, &r)).transpose()
    }

    async fn create(&self, entity: &ResolvedEntity, input: &CreateInput) -> Result<Value, AppError> {
        let key = match entity.pk.pk_type {
            PkType::Uuid => Some(PgBindValue::Uuid(uuid::Uuid::new_v4())),
            PkType::Text => Some(PgBindValue::Text(uuid::Uuid::new_v4().to_string())),
            PkType::BigInt | PkType::Int => None,
        };
        let q = sql::insert(entity, input.fields(), key)?;
        let row = self
            .fetch_optional(q)
            .await?
            .ok_or(AppError::Storage(sqlx::Error::RowNotFound))?;
        row_to_json(entity, &row)
    }

    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: &Value,
        input: &UpdateInput,
    ) -> Result<Option<Value>, AppError> {
        let id = PgBindValue::for_key(&entity.pk, id)?;
        let q = sql::update(entity, id, input.fields())?;
        let row = self.fetch_optional(q).await?;
        row.map(|r| row_to_json(entity, &r)).transpose()
    }

    async fn delete(&self, entity: &ResolvedEntity, id: &Value) -> Result<bool, AppError> {
        let id = PgBindValue::for_key(&entity.pk, id)?;
        let row = self.fetch_optional(sql::delete(entity, id)).await?;
        Ok(row.is_some())
    }

    async fn ping(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn row_to_json(entity: &ResolvedEntity, row: &PgRow) -> Result<Value, AppError> {
    let mut map = Map::new();
    let pk = &entity.pk;
    map.insert(pk.name.clone(), cell_to_value(row, &pk.name, pk.pk_type.column_type())?);
    for c in &entity.columns {
        map.insert(c.name.clone(), cell_to_value(row, &c.name, c.column_type)?);
    }
    for ts in [CREATED_AT, UPDATED_AT] {
        map.insert(ts.to_string(), cell_to_value(row, ts, ColumnType::Timestamp)?);
    }
    Ok(Value::Object(map))
}

/// Decode one cell by its declared type, accepting the narrower/wider database types a column may use.
/// SQL NULL becomes `null`; a database type the declared type cannot read is a storage error.
fn cell_to_value(row: &PgRow, name: &str, ty: ColumnType) -> Result<Value, AppError> {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use sqlx::Row;
    let value = match ty {
        ColumnType::Int | ColumnType::BigInt => row
            .try_get::<Option<i64>, _>(name)
            .or_else(|_| row.try_get::<Option<i32>, _>(name).map(|n| n.map(i64::from)))
            .or_else(|_| row.try_get::<Option<i16>, _>(name).map(|n| n.map(i64::from)))?
            .map(Value::from),
        ColumnType::Float => row
            .try_get::<Option<f64>, _>(name)
            .or_else(|_| row.try_get::<Option<f32>, _>(name).map(|n| n.map(f64::from)))?
            .map(Value::from),
        ColumnType::Bool => row.try_get::<Option<bool>, _>(name)?.map(Value::Bool),
        ColumnType::Timestamp => row
            .try_get::<Option<DateTime<Utc>>, _>(name)
            .or_else(|_| row.try_get::<Option<NaiveDateTime>, _>(name).map(|d| d.map(|d| d.and_utc())))?
            .map(|d| Value::String(d.to_rfc3339())),
        ColumnType::Uuid => row
            .try_get::<Option<uuid::Uuid>, _>(name)
            .map(|u| u.map(|u| u.to_string()))
            .or_else(|_| row.try_get::<Option<String>, _>(name))?
            .map(Value::String),
        ColumnType::Text => row.try_get::<Option<String>, _>(name)?.map(Value::String),
        ColumnType::Json => row.try_get::<Option<Value>, _>(name)?,
    };
    Ok(value.unwrap_or(Value::Null))
}
