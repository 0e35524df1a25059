//! `PgStore` against a live PostgreSQL. Run with `DATABASE_URL` set:
//! `cargo test --test postgres_store -- --ignored`.

use chrono::{DateTime, Utc};
use crud_scaffold::config::{parse_document, resolve};
use crud_scaffold::service::{CreateInput, UpdateInput};
use crud_scaffold::store::ListQuery;
use crud_scaffold::{AppError, EntityStore, PgStore, ResolvedEntity};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

async fn pool() -> PgPool {
    dotenvy::dotenv().ok();
    let url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set for postgres tests");
    PgPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .expect("connect to DATABASE_URL")
}

fn entity(document: &str) -> ResolvedEntity {
    let model = resolve(&parse_document(document).unwrap()).unwrap();
    model.entities.into_iter().next().unwrap()
}

fn ts(row: &Value, column: &str) -> DateTime<Utc> {
    let raw = row[column].as_str().unwrap_or_else(|| panic!("{column} is not a string: {row}"));
    DateTime::parse_from_rfc3339(raw).unwrap().with_timezone(&Utc)
}

/// A throwaway schema so concurrent runs never share tables.
async fn scratch_schema(pool: &PgPool, ddl: &str) -> String {
    let schema = format!("crud_test_{}", uuid::Uuid::new_v4().simple());
    let sql = format!("CREATE SCHEMA {schema}; {}", ddl.replace("{schema}", &schema));
    sqlx::raw_sql(&sql).execute(pool).await.unwrap();
    schema
}

async fn drop_schema(pool: &PgPool, schema: &str) {
    sqlx::raw_sql(&format!("DROP SCHEMA {schema} CASCADE"))
        .execute(pool)
        .await
        .unwrap();
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn timestamps_are_set_on_create_and_advance_on_every_update() {
    let pool = pool().await;
    sqlx::raw_sql(include_str!("../demos/schema.sql"))
        .execute(&pool)
        .await
        .unwrap();
    let example = entity(include_str!("../demos/entities.json"));
    let store = PgStore::new(pool);

    let body = json!({"name": "Example", "value": 1, "description": "Test description"});
    let created = store
        .create(&example, &CreateInput::parse(&example, body).unwrap())
        .await
        .unwrap();
    assert_eq!(created["created_at"], created["updated_at"]);
    let id = created["id"].clone();
    assert!(id.is_i64());

    let first = store
        .update(&example, &id, &UpdateInput::parse(&example, json!({"value": 2})).unwrap())
        .await
        .unwrap()
        .unwrap();
    let second = store
        .update(&example, &id, &UpdateInput::parse(&example, json!({})).unwrap())
        .await
        .unwrap()
        .unwrap();

    assert!(ts(&first, "updated_at") > ts(&created, "updated_at"));
    assert!(ts(&second, "updated_at") > ts(&first, "updated_at"));
    assert_eq!(second["created_at"], created["created_at"]);
    assert_eq!(second["name"], "Example");
    assert_eq!(second["value"], 2);

    assert_eq!(store.read(&example, &id).await.unwrap(), Some(second));
    assert!(store.delete(&example, &id).await.unwrap());
    assert_eq!(store.read(&example, &id).await.unwrap(), None);
    assert!(store.update(&example, &id, &UpdateInput::parse(&example, json!({})).unwrap()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn every_column_type_reads_back_as_written() {
    let pool = pool().await;
    let schema = scratch_schema(
        &pool,
        "CREATE TABLE {schema}.sample (
            id UUID PRIMARY KEY,
            label TEXT NOT NULL,
            small INTEGER NOT NULL,
            big BIGINT NOT NULL,
            ratio DOUBLE PRECISION NOT NULL,
            flag BOOLEAN NOT NULL,
            due_at TIMESTAMPTZ NOT NULL,
            ref_id UUID NOT NULL,
            meta JSONB NOT NULL,
            note TEXT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );",
    )
    .await;
    let sample = entity(&format!(
        r#"{{"entities":[{{"name":"Sample","schema":"{schema}","table":"sample",
            "primary_key":{{"name":"id","type":"uuid"}},"columns":[
            {{"name":"label","type":"text"}},
            {{"name":"small","type":"int"}},
            {{"name":"big","type":"bigint"}},
            {{"name":"ratio","type":"float"}},
            {{"name":"flag","type":"bool"}},
            {{"name":"due_at","type":"timestamp"}},
            {{"name":"ref_id","type":"uuid"}},
            {{"name":"meta","type":"json"}},
            {{"name":"note","type":"text","nullable":true}}]}}]}}"#
    ));
    let store = PgStore::new(pool.clone());

    let ref_id = uuid::Uuid::new_v4().to_string();
    let body = json!({
        "label": "alpha",
        "small": 7,
        "big": 9_000_000_000_i64,
        "ratio": 1.5,
        "flag": true,
        "due_at": "2024-05-01T12:30:00Z",
        "ref_id": ref_id,
        "meta": {"tags": ["a", "b"], "depth": 2}
    });
    let created = store.create(&sample, &CreateInput::parse(&sample, body).unwrap()).await;
    let read = match &created {
        Ok(row) => store.read(&sample, &row["id"]).await,
        Err(_) => Ok(None),
    };
    drop_schema(&pool, &schema).await;

    let created = created.unwrap();
    assert!(uuid::Uuid::parse_str(created["id"].as_str().unwrap()).is_ok());
    assert_eq!(read.unwrap(), Some(created.clone()));
    assert_eq!(created["label"], "alpha");
    assert_eq!(created["small"], 7);
    assert_eq!(created["big"], 9_000_000_000_i64);
    assert_eq!(created["ratio"], 1.5);
    assert_eq!(created["flag"], true);
    assert_eq!(ts(&created, "due_at"), DateTime::parse_from_rfc3339("2024-05-01T12:30:00Z").unwrap());
    assert_eq!(created["ref_id"], ref_id);
    assert_eq!(created["meta"], json!({"tags": ["a", "b"], "depth": 2}));
    assert_eq!(created["note"], Value::Null);
}

#[tokio::test]
#[ignore = "requires DATABASE_URL"]
async fn undecodable_column_is_a_storage_error() {
    let pool = pool().await;
    let schema = scratch_schema(
        &pool,
        "CREATE TABLE {schema}.measure (
            id BIGINT GENERATED BY DEFAULT AS IDENTITY PRIMARY KEY,
            reading NUMERIC(10, 2) NOT NULL,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        );
        INSERT INTO {schema}.measure (reading) VALUES (1.25);",
    )
    .await;
    let measure = entity(&format!(
        r#"{{"entities":[{{"name":"Measure","schema":"{schema}","table":"measure",
            "columns":[{{"name":"reading","type":"float"}}]}}]}}"#
    ));
    let store = PgStore::new(pool.clone());

    let count = store.count(&measure).await;
    let listed = store.list(&measure, &ListQuery::default()).await;
    let read = store.read(&measure, &json!(1)).await;
    drop_schema(&pool, &schema).await;

    assert_eq!(count.unwrap(), 1);
    assert!(matches!(listed, Err(AppError::Storage(_))), "{listed:?}");
    assert!(matches!(read, Err(AppError::Storage(_))), "{read:?}");
}
