//! Categories and genres: list for everyone, create and delete for admins.

use super::{page_request, to_page, SearchQuery};
use crate::error::AppError;
use crate::extractors::{AdminWrite, Payload, Viewer};
use crate::response::{created, ok, PageQuery};
use crate::service::{TagInput, TagKind, TagService};
use crate::state::AppState;
use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::{StatusCode, Uri},
    response::IntoResponse,
};

async fn list(
    state: &AppState,
    kind: TagKind,
    search: SearchQuery,
    page: PageQuery,
    uri: &Uri,
) -> Result<impl IntoResponse, AppError> {
    let page = page_request(state, &page)?;
    let listing = TagService::list(&state.pool, kind, search.search.as_deref(), page).await?;
    Ok(ok(to_page(listing, uri, |t| t)))
}

async fn delete(state: &AppState, kind: TagKind, slug: &str) -> Result<impl IntoResponse, AppError> {
    if !TagService::delete(&state.pool, kind, slug).await? {
        return Err(AppError::NotFound(slug.to_string()));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_categories(
    State(state): State<AppState>,
    _viewer: Viewer,
    Query(search): Query<SearchQuery>,
    Query(page): Query<PageQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<impl IntoResponse, AppError> {
    list(&state, TagKind::Category, search, page, &uri).await
}

pub async fn create_category(
    State(state): State<AppState>,
    _admin: AdminWrite,
    Payload(input): Payload<TagInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(created(TagService::create(&state.pool, TagKind::Category, &input).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    _admin: AdminWrite,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    delete(&state, TagKind::Category, &slug).await
}

pub async fn list_genres(
    State(state): State<AppState>,
    _viewer: Viewer,
    Query(search): Query<SearchQuery>,
    Query(page): Query<PageQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<impl IntoResponse, AppError> {
    list(&state, TagKind::Genre, search, page, &uri).await
}

pub async fn create_genre(
    State(state): State<AppState>,
    _admin: AdminWrite,
    Payload(input): Payload<TagInput>,
) -> Result<impl IntoResponse, AppError> {
    Ok(created(TagService::create(&state.pool, TagKind::Genre, &input).await?))
}

pub async fn delete_genre(
    State(state): State<AppState>,
    _admin: AdminWrite,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    delete(&state, TagKind::Genre, &slug).await
}
