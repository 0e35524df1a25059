//! Typed bind values: validated JSON converted to the PostgreSQL type of its column.

use crate::config::{ColumnInfo, ColumnType, PrimaryKey};
use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::encode::{Encode, IsNull};
use sqlx::postgres::{PgTypeInfo, Postgres};
use sqlx::{Database, Type};

/// A value that can be bound to a PostgreSQL query. `Null` keeps its column type so the parameter is typed.
#[derive(Clone, Debug, PartialEq)]
pub enum PgBindValue {
    Null(ColumnType),
    Text(String),
    Int(i32),
    BigInt(i64),
    Float(f64),
    Bool(bool),
    Timestamp(DateTime<Utc>),
    Uuid(uuid::Uuid),
    Json(Value),
}

impl PgBindValue {
    /// Convert a value already normalized by the input schema.
    pub fn for_column(col: &ColumnInfo, v: &Value) -> Result<Self, AppError> {
        Self::convert(&col.name, col.column_type, v)
    }

    pub fn for_key(pk: &PrimaryKey, v: &Value) -> Result<Self, AppError> {
        Self::convert(&pk.name, pk.pk_type.column_type(), v)
    }

    fn convert(field: &str, ty: ColumnType, v: &Value) -> Result<Self, AppError> {
        if v.is_null() {
            return Ok(PgBindValue::Null(ty));
        }
        let bad = || AppError::invalid(field, format!("cannot bind value as {}", ty.as_str()));
        Ok(match ty {
            ColumnType::Text => PgBindValue::Text(v.as_str().ok_or_else(bad)?.to_string()),
            ColumnType::Int => PgBindValue::Int(
                v.as_i64()
                    .and_then(|n| i32::try_from(n).ok())
                    .ok_or_else(bad)?,
            ),
            ColumnType::BigInt => PgBindValue::BigInt(v.as_i64().ok_or_else(bad)?),
            ColumnType::Float => PgBindValue::Float(v.as_f64().ok_or_else(bad)?),
            ColumnType::Bool => PgBindValue::Bool(v.as_bool().ok_or_else(bad)?),
            ColumnType::Timestamp => PgBindValue::Timestamp(
                v.as_str()
                    .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
                    .map(|d| d.with_timezone(&Utc))
                    .ok_or_else(bad)?,
            ),
            ColumnType::Uuid => PgBindValue::Uuid(
                v.as_str()
                    .and_then(|s| uuid::Uuid::parse_str(s).ok())
                    .ok_or_else(bad)?,
            ),
            ColumnType::Json => PgBindValue::Json(v.clone()),
        })
    }

    fn pg_type(&self) -> PgTypeInfo {
        match self {
            PgBindValue::Null(ty) => column_type_info(*ty),
            PgBindValue::Text(_) => <String as Type<Postgres>>::type_info(),
            PgBindValue::Int(_) => <i32 as Type<Postgres>>::type_info(),
            PgBindValue::BigInt(_) => <i64 as Type<Postgres>>::type_info(),
            PgBindValue::Float(_) => <f64 as Type<Postgres>>::type_info(),
            PgBindValue::Bool(_) => <bool as Type<Postgres>>::type_info(),
            PgBindValue::Timestamp(_) => <DateTime<Utc> as Type<Postgres>>::type_info(),
            PgBindValue::Uuid(_) => <uuid::Uuid as Type<Postgres>>::type_info(),
            PgBindValue::Json(_) => <Value as Type<Postgres>>::type_info(),
        }
    }
}

fn column_type_info(ty: ColumnType) -> PgTypeInfo {
    match ty {
        ColumnType::Text => <String as Type<Postgres>>::type_info(),
        ColumnType::Int => <i32 as Type<Postgres>>::type_info(),
        ColumnType::BigInt => <i64 as Type<Postgres>>::type_info(),
        ColumnType::Float => <f64 as Type<Postgres>>::type_info(),
        ColumnType::Bool => <bool as Type<Postgres>>::type_info(),
        ColumnType::Timestamp => <DateTime<Utc> as Type<Postgres>>::type_info(),
        ColumnType::Uuid => <uuid::Uuid as Type<Postgres>>::type_info(),
        ColumnType::Json => <Value as Type<Postgres>>::type_info(),
    }
}

impl<'q> Encode<'q, Postgres> for PgBindValue {
    fn encode_by_ref(
        &self,
        buf: &mut <Postgres as Database>::ArgumentBuffer<'q>,
    ) -> Result<IsNull, Box<dyn std::error::Error + Send + Sync>> {
        match self {
            PgBindValue::Null(_) => Ok(IsNull::Yes),
            PgBindValue::Text(s) => <String as Encode<Postgres>>::encode_by_ref(s, buf),
            PgBindValue::Int(n) => <i32 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::BigInt(n) => <i64 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::Float(n) => <f64 as Encode<Postgres>>::encode_by_ref(n, buf),
            PgBindValue::Bool(b) => <bool as Encode<Postgres>>::encode_by_ref(b, buf),
            PgBindValue::Timestamp(d) => <DateTime<Utc> as Encode<Postgres>>::encode_by_ref(d, buf),
            PgBindValue::Uuid(u) => <uuid::Uuid as Encode<Postgres>>::encode_by_ref(u, buf),
            PgBindValue::Json(v) => <Value as Encode<Postgres>>::encode_by_ref(v, buf),
        }
    }

    fn produces(&self) -> Option<PgTypeInfo> {
        Some(self.pg_type())
    }
}

impl Type<Postgres> for PgBindValue {
    fn type_info() -> PgTypeInfo {
        PgTypeInfo::with_name("TEXT")
    }
}
