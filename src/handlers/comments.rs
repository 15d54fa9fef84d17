//! Comments nested under a review of a title.

use super::{page_request, parse_id, to_page};
use crate::auth::staff_or_author;
use crate::error::AppError;
use crate::extractors::{AuthWrite, Payload, Viewer};
use crate::models::CommentView;
use crate::response::{created, ok, PageQuery};
use crate::service::{CommentInput, CommentService};
use crate::state::AppState;
use axum::{
    body::Bytes,
    extract::{OriginalUri, Path, Query, State},
    http::{Method, StatusCode},
    response::IntoResponse,
};

async fn load(state: &AppState, ids: &(String, String, String)) -> Result<CommentView, AppError> {
    let title_id = parse_id(&ids.0)?;
    let review_id = parse_id(&ids.1)?;
    let comment_id = parse_id(&ids.2)?;
    CommentService::get(&state.pool, title_id, review_id, comment_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("comment {}", comment_id)))
}

pub async fn list(
    State(state): State<AppState>,
    _viewer: Viewer,
    Path((title_id, review_id)): Path<(String, String)>,
    Query(page): Query<PageQuery>,
    OriginalUri(uri): OriginalUri,
) -> Result<impl IntoResponse, AppError> {
    let title_id = parse_id(&title_id)?;
    let review_id = parse_id(&review_id)?;
    let page = page_request(&state, &page)?;
    let listing = CommentService::list(&state.pool, title_id, review_id, page).await?;
    Ok(ok(to_page(listing, &uri, |c| c)))
}

pub async fn create(
    State(state): State<AppState>,
    writer: AuthWrite,
    Path((title_id, review_id)): Path<(String, String)>,
    Payload(input): Payload<CommentInput>,
) -> Result<impl IntoResponse, AppError> {
    let author = writer.author()?;
    let title_id = parse_id(&title_id)?;
    let review_id = parse_id(&review_id)?;
    let comment = CommentService::create(&state.pool, title_id, review_id, author, &input).await?;
    Ok(created(comment))
}

pub async fn retrieve(
    State(state): State<AppState>,
    _viewer: Viewer,
    Path(ids): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    Ok(ok(load(&state, &ids).await?))
}

pub async fn update(
    State(state): State<AppState>,
    method: Method,
    writer: AuthWrite,
    Path(ids): Path<(String, String, String)>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let comment = load(&state, &ids).await?;
    staff_or_author(&method, writer.user(), comment.author_id)?;
    let Payload(input) = Payload::<CommentInput>::from_bytes(&body)?;
    let partial = method == Method::PATCH;
    let comment = CommentService::update(&state.pool, comment.id, &input, partial).await?;
    Ok(ok(comment))
}

pub async fn delete(
    State(state): State<AppState>,
    method: Method,
    writer: AuthWrite,
    Path(ids): Path<(String, String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let comment = load(&state, &ids).await?;
    staff_or_author(&method, writer.user(), comment.author_id)?;
    CommentService::delete(&state.pool, comment.id).await?;
    tracing::info!(comment_id = comment.id, "comment deleted");
    Ok(StatusCode::NO_CONTENT)
}
