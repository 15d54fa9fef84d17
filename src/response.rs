//! Response helpers: status wrappers and the page-number pagination envelope.

use crate::error::AppError;
use axum::{http::StatusCode, http::Uri, Json};
use serde::{Deserialize, Serialize};

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::CREATED, Json(data))
}

pub fn ok<T: Serialize>(data: T) -> (StatusCode, Json<T>) {
    (StatusCode::OK, Json(data))
}

/// `?page=N` query parameter. Kept as a string so a non-numeric page maps to 404 like an out-of-range one.
#[derive(Debug, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// A validated page request: 1-based page number and page size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PageRequest {
    pub number: u32,
    pub size: u32,
}

impl PageRequest {
    pub fn parse(raw: Option<&str>, size: u32) -> Result<Self, AppError> {
        let number = match raw.map(str::trim) {
            None | Some("") => 1,
            Some("last") => u32::MAX,
            Some(s) => s
                .parse::<u32>()
                .ok()
                .filter(|n| *n >= 1)
                .ok_or_else(invalid_page)?,
        };
        Ok(PageRequest { number, size })
    }

    pub fn limit(&self) -> u32 {
        self.size
    }

    pub fn offset(&self) -> u64 {
        (self.number.saturating_sub(1) as u64) * self.size as u64
    }

    /// Resolve `last` and reject pages past the end. Page 1 always exists, even for zero rows.
    pub fn clamp_to(self, count: u64) -> Result<Self, AppError> {
        let pages = num_pages(count, self.size);
        if self.number == u32::MAX {
            return Ok(PageRequest { number: pages, size: self.size });
        }
        if self.number > pages {
            return Err(invalid_page());
        }
        Ok(self)
    }
}

fn invalid_page() -> AppError {
    AppError::NotFound("Invalid page.".into())
}

fn num_pages(count: u64, size: u32) -> u32 {
    let size = size.max(1) as u64;
    (count.div_ceil(size)).max(1).min(u32::MAX as u64 - 1) as u32
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub count: u64,
    pub next: Option<String>,
    pub previous: Option<String>,
    pub results: Vec<T>,
}

impl<T: Serialize> Page<T> {
    /// Links keep the request path and every query parameter except `page`.
    pub fn new(results: Vec<T>, count: u64, page: PageRequest, uri: &Uri) -> Self {
        let pages = num_pages(count, page.size);
        let next = (page.number < pages).then(|| page_link(uri, Some(page.number + 1)));
        let previous = match page.number {
            1 => None,
            2 => Some(page_link(uri, None)),
            n => Some(page_link(uri, Some(n - 1))),
        };
        Page {
            count,
            next,
            previous,
            results,
        }
    }
}

/// Rewrite the `page` parameter of `uri`; `None` drops it.
pub fn page_link(uri: &Uri, page: Option<u32>) -> String {
    let mut pairs: Vec<String> = uri
        .query()
        .unwrap_or("")
        .split('&')
        .filter(|p| !p.is_empty() && p.split('=').next() != Some("page"))
        .map(str::to_string)
        .collect();
    if let Some(n) = page {
        pairs.push(format!("page={}", n));
    }
    if pairs.is_empty() {
        uri.path().to_string()
    } else {
        format!("{}?{}", uri.path(), pairs.join("&"))
    }
}
