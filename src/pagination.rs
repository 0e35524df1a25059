//! Page requests for paginated lists: 1-based page number and bounded size.

use crate::config::PaginationSettings;
use crate::error::{AppError, FieldError};
use serde::Serialize;
use std::collections::HashMap;

/// Validated page window. `size` is always in `[1, max]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u32,
    pub size: u32,
}

impl PageRequest {
    /// Validate raw numbers against the configured bounds.
    pub fn new(page: i64, size: i64, settings: &PaginationSettings) -> Result<Self, AppError> {
        let mut errors = Vec::new();
        if page < 1 {
            errors.push(FieldError::new("page", "must be at least 1"));
        } else if page > i64::from(u32::MAX) {
            errors.push(FieldError::new("page", format!("must be at most {}", u32::MAX)));
        }
        if size < 1 || size > i64::from(settings.max_size) {
            errors.push(FieldError::new(
                "size",
                format!("must be between 1 and {}", settings.max_size),
            ));
        }
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        Ok(PageRequest {
            page: page as u32,
            size: size as u32,
        })
    }

    /// Read `page` and `size` (or `limit`) from query parameters, applying defaults.
    pub fn from_params(params: &HashMap<String, String>, settings: &PaginationSettings) -> Result<Self, AppError> {
        let mut errors = Vec::new();
        let page = parse_param(params, "page", 1, &mut errors);
        let size_key = if params.contains_key("size") { "size" } else { "limit" };
        let size = parse_param(params, size_key, i64::from(settings.default_size), &mut errors);
        if !errors.is_empty() {
            return Err(AppError::Validation(errors));
        }
        PageRequest::new(page, size, settings)
    }

    pub fn offset(&self) -> u64 {
        u64::from(self.page - 1) * u64::from(self.size)
    }

    pub fn limit(&self) -> u32 {
        self.size
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(u64::from(self.size))
    }
}

fn parse_param(params: &HashMap<String, String>, key: &str, default: i64, errors: &mut Vec<FieldError>) -> i64 {
    match params.get(key) {
        None => default,
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(n) => n,
            Err(_) => {
                errors.push(FieldError::new(key, "must be an integer"));
                default
            }
        },
    }
}

/// One page of rows plus the totals needed by the paginated envelope.
#[derive(Clone, Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub page_size: u32,
    pub total_count: u64,
    pub total_pages: u64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, request: PageRequest, total_count: u64) -> Self {
        Page {
            items,
            page: request.page,
            page_size: request.size,
            total_count,
            total_pages: request.total_pages(total_count),
        }
    }
}
