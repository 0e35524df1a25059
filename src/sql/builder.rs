//! Builds parameterized SELECT, COUNT, INSERT, UPDATE, DELETE from a resolved entity.

use crate::config::{ResolvedEntity, CREATED_AT, UPDATED_AT};
use crate::error::AppError;
use crate::service::Fields;
use crate::sql::PgBindValue;
use crate::store::{Direction, ListQuery};

/// Quote identifier for PostgreSQL (safe: only from the entity document).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Full qualified table name.
fn qualified_table(entity: &ResolvedEntity) -> String {
    format!("{}.{}", quoted(&entity.schema_name), quoted(&entity.table_name))
}

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<PgBindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: PgBindValue) -> usize {
        self.params.push(v);
        self.params.len()
    }
}

/// Every stored column in response order: key, attributes, timestamps.
pub fn select_column_list(entity: &ResolvedEntity) -> String {
    std::iter::once(entity.pk.name.as_str())
        .chain(entity.columns.iter().map(|c| c.name.as_str()))
        .chain([CREATED_AT, UPDATED_AT])
        .map(quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

pub fn count(entity: &ResolvedEntity) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.sql = format!("SELECT COUNT(*) FROM {}", qualified_table(entity));
    q
}

/// SELECT list ordered by the requested column, then the key; optional LIMIT/OFFSET window.
pub fn select_list(entity: &ResolvedEntity, query: &ListQuery) -> QueryBuf {
    let mut q = QueryBuf::new();
    let pk = &entity.pk.name;
    let dir = match query.direction {
        Direction::Asc => "ASC",
        Direction::Desc => "DESC",
    };
    let order_clause = match query.sort_by.as_deref() {
        Some(col) if col != pk.as_str() => format!(" ORDER BY {} {}, {} {}", quoted(col), dir, quoted(pk), dir),
        _ => format!(" ORDER BY {} {}", quoted(pk), dir),
    };
    let window_clause = query
        .window
        .map(|w| format!(" LIMIT {} OFFSET {}", w.limit, w.offset))
        .unwrap_or_default();
    q.sql = format!(
        "SELECT {} FROM {}{}{}",
        select_column_list(entity),
        qualified_table(entity),
        order_clause,
        window_clause
    );
    q
}

/// SELECT by primary key.
pub fn select_by_id(entity: &ResolvedEntity, id: PgBindValue) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ${}",
        select_column_list(entity),
        qualified_table(entity),
        quoted(&entity.pk.name),
        n
    );
    q
}

/// INSERT the provided fields; both timestamps come from the same NOW() so they are equal.
/// `key` is set when the store generates the identifier; otherwise the database assigns it.
pub fn insert(entity: &ResolvedEntity, fields: &Fields, key: Option<PgBindValue>) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut cols = Vec::new();
    let mut values = Vec::new();
    if let Some(key) = key {
        let n = q.push_param(key);
        cols.push(quoted(&entity.pk.name));
        values.push(format!("${}", n));
    }
    for c in &entity.columns {
        let Some(v) = fields.get(&c.name) else { continue };
        let n = q.push_param(PgBindValue::for_column(c, v)?);
        cols.push(quoted(&c.name));
        values.push(format!("${}", n));
    }
    for ts in [CREATED_AT, UPDATED_AT] {
        cols.push(quoted(ts));
        values.push("NOW()".to_string());
    }
    q.sql = format!(
        "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
        qualified_table(entity),
        cols.join(", "),
        values.join(", "),
        select_column_list(entity)
    );
    Ok(q)
}

/// UPDATE by id: SET only the provided fields and advance `updated_at` strictly past its previous value.
pub fn update(entity: &ResolvedEntity, id: PgBindValue, fields: &Fields) -> Result<QueryBuf, AppError> {
    let mut q = QueryBuf::new();
    let mut sets = Vec::new();
    for c in &entity.columns {
        let Some(v) = fields.get(&c.name) else { continue };
        let n = q.push_param(PgBindValue::for_column(c, v)?);
        sets.push(format!("{} = ${}", quoted(&c.name), n));
    }
    let updated = quoted(UPDATED_AT);
    sets.push(format!(
        "{} = GREATEST(clock_timestamp(), {} + INTERVAL '1 microsecond')",
        updated, updated
    ));
    let n = q.push_param(id);
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ${} RETURNING {}",
        qualified_table(entity),
        sets.join(", "),
        quoted(&entity.pk.name),
        n,
        select_column_list(entity)
    );
    Ok(q)
}

/// DELETE by id, returning the key so callers can tell whether a row existed.
pub fn delete(entity: &ResolvedEntity, id: PgBindValue) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(id);
    let pk = quoted(&entity.pk.name);
    q.sql = format!("DELETE FROM {} WHERE {} = ${} RETURNING {}", qualified_table(entity), pk, n, pk);
    q
}
