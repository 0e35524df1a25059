//! Entity CRUD handlers: list, paginated list, read, create, update, delete.
//!
//! Every handler runs the entity's permission hook before touching the id, the body, or the store,
//! so a denied caller learns nothing about which records exist.

use crate::error::AppError;
use crate::extractors::RequestContext;
use crate::response::{success_many, success_one, success_one_created, success_page, success_status};
use crate::state::EntityState;
use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    response::IntoResponse,
    Json,
};
use serde_json::Value;
use std::collections::HashMap;

/// A path id axum could not decode (e.g. invalid UTF-8) names no stored row.
fn path_id(state: &EntityState, id: Result<Path<String>, PathRejection>) -> Result<String, AppError> {
    id.map(|Path(id)| id).map_err(|rejection| {
        tracing::debug!(entity = %state.entity.name, error = %rejection, "undecodable id");
        AppError::NotFound(state.entity.name.clone())
    })
}

fn body_value(body: Result<Json<Value>, JsonRejection>) -> Result<Value, AppError> {
    body.map(|Json(v)| v).map_err(|rejection| AppError::invalid("body", rejection.body_text()))
}

pub async fn list(
    State(state): State<EntityState>,
    ctx: RequestContext,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    state.permissions.ensure_read(&ctx)?;
    let rows = state.service().list(&params).await?;
    Ok(success_many(format!("All {} records", state.entity.name), rows))
}

pub async fn list_paginated(
    State(state): State<EntityState>,
    ctx: RequestContext,
    Query(params): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    state.permissions.ensure_read(&ctx)?;
    let page = state.service().list_paginated(&params, &state.pagination).await?;
    Ok(success_page(format!("All {} records", state.entity.name), page))
}

pub async fn read(
    State(state): State<EntityState>,
    ctx: RequestContext,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    state.permissions.ensure_read(&ctx)?;
    let id = path_id(&state, id)?;
    let row = state.service().get(&id).await?;
    Ok(success_one(format!("{} Found", state.entity.name), row))
}

pub async fn create(
    State(state): State<EntityState>,
    ctx: RequestContext,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    state.permissions.ensure_write(&ctx)?;
    let row = state.service().create(body_value(body)?).await?;
    Ok(success_one_created(format!("{} Created Successfully", state.entity.name), row))
}

/// Serves both PUT and PATCH: fields absent from the body keep their stored values.
pub async fn update(
    State(state): State<EntityState>,
    ctx: RequestContext,
    id: Result<Path<String>, PathRejection>,
    body: Result<Json<Value>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    state.permissions.ensure_write(&ctx)?;
    let id = path_id(&state, id)?;
    let row = state.service().update(&id, body_value(body)?).await?;
    Ok(success_one(format!("{} Updated Successfully", state.entity.name), row))
}

pub async fn delete(
    State(state): State<EntityState>,
    ctx: RequestContext,
    id: Result<Path<String>, PathRejection>,
) -> Result<impl IntoResponse, AppError> {
    state.permissions.ensure_write(&ctx)?;
    let id = path_id(&state, id)?;
    state.service().delete(&id).await?;
    Ok(success_status(format!("{} Deleted Successfully", state.entity.name)))
}
