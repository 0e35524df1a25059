//! Standard response envelopes: single item, list, paginated list, and bare status.

use crate::pagination::Page;
use axum::{http::StatusCode, Json};
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Ok,
    Error,
}

#[derive(Serialize)]
pub struct SuccessOne<T> {
    pub status: Status,
    pub message: String,
    pub data: T,
}

#[derive(Serialize)]
pub struct SuccessMany<T> {
    pub status: Status,
    pub message: String,
    pub data: Vec<T>,
    pub count: u64,
}

#[derive(Serialize)]
pub struct SuccessPage<T> {
    pub status: Status,
    pub message: String,
    pub data: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

/// Confirmation without payload (delete).
#[derive(Serialize)]
pub struct SuccessStatus {
    pub status: Status,
    pub message: String,
}

pub fn success_one<T: Serialize>(message: String, data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (
        StatusCode::OK,
        Json(SuccessOne {
            status: Status::Ok,
            message,
            data,
        }),
    )
}

pub fn success_one_created<T: Serialize>(message: String, data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    let (_, body) = success_one(message, data);
    (StatusCode::CREATED, body)
}

pub fn success_many<T: Serialize>(message: String, data: Vec<T>) -> (StatusCode, Json<SuccessMany<T>>) {
    let count = data.len() as u64;
    (
        StatusCode::OK,
        Json(SuccessMany {
            status: Status::Ok,
            message,
            data,
            count,
        }),
    )
}

pub fn success_page<T: Serialize>(message: String, page: Page<T>) -> (StatusCode, Json<SuccessPage<T>>) {
    (
        StatusCode::OK,
        Json(SuccessPage {
            status: Status::Ok,
            message,
            data: page.items,
            page: page.page,
            page_size: page.page_size,
            total_count: page.total_count,
            total_pages: page.total_pages,
        }),
    )
}

pub fn success_status(message: String) -> (StatusCode, Json<SuccessStatus>) {
    (
        StatusCode::OK,
        Json(SuccessStatus {
            status: Status::Ok,
            message,
        }),
    )
}
