//! Titles: reads for everyone, writes for admins.
//! Reads return nested category/genre objects; writes echo slugs back.

use super::{page_request, parse_id, to_page};
use crate::error::AppError;
use crate::extractors::{AdminWrite, Payload, Viewer};
use crate::models::TitleWriteView;
use crate::response::{created, ok, PageQuery};
use crate::service::{TitleFilters, TitleInput, TitleService};
use crate::state::AppState;
use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    response::IntoResponse,
};

pub async fn list(
    State(state): State<AppState>,
    _viewer: Viewer,
    Query(filters): Query<TitleFilters>,
    Query(page): Query<PageQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<impl IntoResponse, AppError> {
    let page = page_request(&state, &page)?;
    let listing = TitleService::list(&state.pool, &filters, page).await?;
    Ok(ok(to_page(listing, &uri, |t| t)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    _viewer: Viewer,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let title = TitleService::get(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("title {}", id)))?;
    Ok(ok(title))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminWrite,
    Payload(input): Payload<TitleInput>,
) -> Result<impl IntoResponse, AppError> {
    let title = TitleService::create(&state.pool, &input).await?;
    Ok(created(TitleWriteView::from_view(title)))
}

/// PUT replaces every field; PATCH keeps the ones left out.
pub async fn update(
    State(state): State<AppState>,
    method: Method,
    _admin: AdminWrite,
    Path(id_str): Path<String>,
    Payload(input): Payload<TitleInput>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    let partial = method == Method::PATCH;
    let title = TitleService::update(&state.pool, id, &input, partial)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("title {}", id)))?;
    Ok(ok(TitleWriteView::from_view(title)))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminWrite,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let id = parse_id(&id_str)?;
    if !TitleService::delete(&state.pool, id).await? {
        return Err(AppError::NotFound(format!("title {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}
