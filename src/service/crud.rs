//! Generic CRUD for one entity over any `EntityStore`.

use crate::config::{PaginationSettings, ResolvedEntity};
use crate::error::{AppError, FieldError};
use crate::pagination::{Page, PageRequest};
use crate::service::{parse_id, project_row, CreateInput, UpdateInput};
use crate::store::{Direction, EntityStore, ListQuery, Window};
use serde_json::Value;
use std::collections::HashMap;

pub struct CrudService<'a> {
    store: &'a dyn EntityStore,
    entity: &'a ResolvedEntity,
}

impl<'a> CrudService<'a> {
    pub fn new(store: &'a dyn EntityStore, entity: &'a ResolvedEntity) -> Self {
        CrudService { store, entity }
    }

    /// All rows, ordered by `sort_by`/`order` when given, else by key.
    pub async fn list(&self, params: &HashMap<String, String>) -> Result<Vec<Value>, AppError> {
        let query = self.list_query(params)?;
        let rows = self.store.list(self.entity, &query).await?;
        Ok(self.project_all(rows))
    }

    /// One page of rows plus totals. A page past the end is empty, not an error.
    pub async fn list_paginated(
        &self,
        params: &HashMap<String, String>,
        settings: &PaginationSettings,
    ) -> Result<Page<Value>, AppError> {
        let request = PageRequest::from_params(params, settings)?;
        let mut query = self.list_query(params)?;
        query.window = Some(Window {
            limit: request.limit(),
            offset: request.offset(),
        });
        let total = self.store.count(self.entity).await?;
        let rows = self.store.list(self.entity, &query).await?;
        Ok(Page::new(self.project_all(rows), request, total))
    }

    pub async fn get(&self, raw_id: &str) -> Result<Value, AppError> {
        let id = self.id(raw_id)?;
        let row = self.store.read(self.entity, &id).await?.ok_or_else(|| self.not_found())?;
        Ok(project_row(self.entity, row))
    }

    pub async fn create(&self, body: Value) -> Result<Value, AppError> {
        let input = CreateInput::parse(self.entity, body)?;
        let row = self.store.create(self.entity, &input).await?;
        tracing::info!(entity = %self.entity.name, "record created");
        Ok(project_row(self.entity, row))
    }

    pub async fn update(&self, raw_id: &str, body: Value) -> Result<Value, AppError> {
        let id = self.id(raw_id)?;
        let input = UpdateInput::parse(self.entity, body)?;
        let row = self
            .store
            .update(self.entity, &id, &input)
            .await?
            .ok_or_else(|| self.not_found())?;
        Ok(project_row(self.entity, row))
    }

    pub async fn delete(&self, raw_id: &str) -> Result<(), AppError> {
        let id = self.id(raw_id)?;
        if !self.store.delete(self.entity, &id).await? {
            return Err(self.not_found());
        }
        tracing::info!(entity = %self.entity.name, "record deleted");
        Ok(())
    }

    fn id(&self, raw: &str) -> Result<Value, AppError> {
        parse_id(self.entity, raw).ok_or_else(|| self.not_found())
    }

    fn not_found(&self) -> AppError {
        AppError::NotFound(self.entity.name.clone())
    }

    fn project_all(&self, rows: Vec<Value>) -> Vec<Value> {
        rows.into_iter().map(|r| project_row(self.entity, r)).collect()
    }

    fn list_query(&self, params: &HashMap<String, String>) -> Result<ListQuery, AppError> {
        let mut errors = Vec::new();
        let sort_by = match params.get("sort_by").map(|s| s.trim()) {
            None | Some("") => None,
            Some(col) if self.entity.is_sortable(col) => Some(col.to_string()),
            Some(_) => {
                errors.push(FieldError::new("sort_by", "unknown column"));
                None
            }
        };
        let direction = match params.get("order").map(|s| s.trim().to_ascii_lowercase()).as_deref() {
            None | Some("") | Some("asc") => Direction::Asc,
            Some("desc") => Direction::Desc,
            Some(_) => {
                errors.push(FieldError::new("order", "must be 'asc' or 'desc'"));
                Direction::Asc
            }
        };
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(ListQuery {
            sort_by,
            direction,
            window: None,
        })
    }
}
