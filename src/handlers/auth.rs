//! Signup and token endpoints; open to anonymous users.

use crate::error::AppError;
use crate::extractors::Payload;
use crate::response::ok;
use crate::service::{SignupInput, SignupService, TokenInput};
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};

pub async fn signup(
    State(state): State<AppState>,
    Payload(input): Payload<SignupInput>,
) -> Result<impl IntoResponse, AppError> {
    let body = SignupService::signup(
        &state.pool,
        state.mailer.as_ref(),
        &state.settings.confirm_code_email,
        &input,
    )
    .await?;
    Ok(ok(body))
}

pub async fn token(
    State(state): State<AppState>,
    Payload(input): Payload<TokenInput>,
) -> Result<impl IntoResponse, AppError> {
    let body = SignupService::exchange_token(&state.pool, &state.settings.jwt, &input).await?;
    Ok(ok(body))
}
