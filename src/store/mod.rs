//! Storage seam: the operations a backing engine must provide for generic CRUD.
//!
//! The store owns identifier and timestamp assignment. Rows travel as JSON objects
//! holding the key, every attribute column, `created_at` and `updated_at`.

mod postgres;

pub use postgres::PgStore;

use crate::config::ResolvedEntity;
use crate::error::AppError;
use crate::service::{CreateInput, UpdateInput};
use async_trait::async_trait;
use serde_json::Value;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Direction {
    #[default]
    Asc,
    Desc,
}

/// LIMIT/OFFSET window of a paginated read.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    pub limit: u32,
    pub offset: u64,
}

/// Ordering and optional window for list reads. `sort_by: None` orders by the key.
/// The key is always the final tie-breaker, in the same direction.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListQuery {
    pub sort_by: Option<String>,
    pub direction: Direction,
    pub window: Option<Window>,
}

#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn count(&self, entity: &ResolvedEntity) -> Result<u64, AppError>;

    async fn list(&self, entity: &ResolvedEntity, query: &ListQuery) -> Result<Vec<Value>, AppError>;

    async fn read(&self, entity: &ResolvedEntity, id: &Value) -> Result<Option<Value>, AppError>;

    /// Insert a row; the store assigns the key and sets both timestamps to the same instant.
    async fn create(&self, entity: &ResolvedEntity, input: &CreateInput) -> Result<Value, AppError>;

    /// Apply present fields and advance `updated_at`. `None` when no row has this id.
    async fn update(
        &self,
        entity: &ResolvedEntity,
        id: &Value,
        input: &UpdateInput,
    ) -> Result<Option<Value>, AppError>;

    /// Remove a row. `false` when no row has this id.
    async fn delete(&self, entity: &ResolvedEntity, id: &Value) -> Result<bool, AppError>;

    /// Connectivity check used by the readiness route.
    async fn ping(&self) -> Result<(), AppError>;
}
