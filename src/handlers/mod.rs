//! HTTP handlers: auth, users, categories/genres, titles, reviews, comments.

pub mod auth;
pub mod catalog;
pub mod comments;
pub mod reviews;
pub mod titles;
pub mod users;

use crate::error::AppError;
use crate::response::{Page, PageQuery, PageRequest};
use crate::service::Listing;
use crate::state::AppState;
use axum::http::Uri;
use serde::{Deserialize, Serialize};

/// `?search=` on users, categories and genres.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    pub search: Option<String>,
}

/// Numeric path ids; anything else cannot name a row.
fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse::<i64>()
        .ok()
        .filter(|n| *n > 0)
        .ok_or_else(|| AppError::NotFound(id_str.to_string()))
}

fn page_request(state: &AppState, query: &PageQuery) -> Result<PageRequest, AppError> {
    PageRequest::parse(query.page.as_deref(), state.settings.page_size)
}

fn to_page<T, U: Serialize>(listing: Listing<T>, uri: &Uri, f: impl FnMut(T) -> U) -> Page<U> {
    let listing = listing.map(f);
    Page::new(listing.items, listing.count, listing.page, uri)
}
