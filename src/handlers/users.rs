//! User administration (admins only) and the caller's own profile at `/users/me/`.

use super::{page_request, to_page, SearchQuery};
use crate::error::AppError;
use crate::extractors::{AdminUser, CurrentUser, Payload};
use crate::models::UserView;
use crate::response::{created, ok, PageQuery};
use crate::service::{UserInput, UserService};
use crate::state::AppState;
use axum::{
    extract::{OriginalUri, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};

pub async fn list(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(search): Query<SearchQuery>,
    Query(page): Query<PageQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<impl IntoResponse, AppError> {
    let page = page_request(&state, &page)?;
    let listing = UserService::list(&state.pool, search.search.as_deref(), page).await?;
    Ok(ok(to_page(listing, &uri, UserView::from)))
}

pub async fn create(
    State(state): State<AppState>,
    _admin: AdminUser,
    Payload(input): Payload<UserInput>,
) -> Result<impl IntoResponse, AppError> {
    let user = UserService::create(&state.pool, &input).await?;
    Ok(created(UserView::from(user)))
}

pub async fn retrieve(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let user = UserService::get_by_username(&state.pool, &username)
        .await?
        .ok_or(AppError::NotFound(username))?;
    Ok(ok(UserView::from(user)))
}

pub async fn update(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(username): Path<String>,
    Payload(input): Payload<UserInput>,
) -> Result<impl IntoResponse, AppError> {
    let existing = UserService::get_by_username(&state.pool, &username)
        .await?
        .ok_or(AppError::NotFound(username))?;
    let user = UserService::update(&state.pool, &existing, &input, true).await?;
    Ok(ok(UserView::from(user)))
}

pub async fn delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    if !UserService::delete(&state.pool, &username).await? {
        return Err(AppError::NotFound(username));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub async fn me(CurrentUser(user): CurrentUser) -> Result<impl IntoResponse, AppError> {
    Ok(ok(UserView::from(user)))
}

/// Role changes are ignored here; only admins change roles.
pub async fn update_me(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Payload(input): Payload<UserInput>,
) -> Result<impl IntoResponse, AppError> {
    let user = UserService::update(&state.pool, &user, &input, false).await?;
    Ok(ok(UserView::from(user)))
}
