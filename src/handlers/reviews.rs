//! Reviews nested under a title.

use super::{page_request, parse_id, to_page};
use crate::auth::staff_or_author;
use crate::error::AppError;
use crate::extractors::{AuthWrite, Payload, Viewer};
use crate::models::ReviewView;
use crate::response::{created, ok, PageQuery};
use crate::service::{ReviewInput, ReviewService};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    response::IntoResponse,
};

async fn load(state: &AppState, title_id: &str, review_id: &str) -> Result<ReviewView, AppError> {
    let title_id = parse_id(title_id)?;
    let review_id = parse_id(review_id)?;
    ReviewService::get(&state.pool, title_id, review_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("review {}", review_id)))
}

pub async fn list(
    State(state): State<AppState>,
    _viewer: Viewer,
    Path(title_id): Path<String>,
    Query(page): Query<PageQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<impl IntoResponse, AppError> {
    let title_id = parse_id(&title_id)?;
    let page = page_request(&state, &page)?;
    let listing = ReviewService::list(&state.pool, title_id, page).await?;
    Ok(ok(to_page(listing, &uri, |r| r)))
}

pub async fn create(
    State(state): State<AppState>,
    writer: AuthWrite,
    Path(title_id): Path<String>,
    Payload(input): Payload<ReviewInput>,
) -> Result<impl IntoResponse, AppError> {
    let author = writer.author()?;
    let title_id = parse_id(&title_id)?;
    let review = ReviewService::create(&state.pool, title_id, author, &input).await?;
    Ok(created(review))
}

pub async fn retrieve(
    State(state): State<AppState>,
    _viewer: Viewer,
    Path((title_id, review_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(load(&state, &title_id, &review_id).await?))
}

pub async fn update(
    State(state): State<AppState>,
    method: Method,
    writer: AuthWrite,
    Path((title_id, review_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let review = load(&state, &title_id, &review_id).await?;
    staff_or_author(&method, writer.user(), review.author_id)?;
    let Payload(input) = Payload::<ReviewInput>::from_bytes(&body)?;
    let partial = method == Method::PATCH;
    let review = ReviewService::update(&state.pool, review.id, &input, partial).await?;
    Ok(ok(review))
}

pub async fn delete(
    State(state): State<AppState>,
    method: Method,
    writer: AuthWrite,
    Path((title_id, review_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let review = load(&state, &title_id, &review_id).await?;
    staff_or_author(&method, writer.user(), review.author_id)?;
    ReviewService::delete(&state.pool, review.id).await?;
    tracing::info!(review_id = review.id, "review deleted");
    Ok(StatusCode::NO_CONTENT)
}
