//! Resolve the requesting user from an `Authorization: Bearer <token>` header.

use crate::auth::{permissions, verify_access_token};
use crate::error::AppError;
use crate::models::User;
use crate::service::UserService;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

pub const BEARER: &str = "Bearer";

/// Requesting user, or `None` for anonymous requests.
/// A bearer token that fails verification is rejected with 401 rather than treated as anonymous.
#[derive(Clone, Debug)]
pub struct Viewer(pub Option<User>);

impl Viewer {
    pub fn user(&self) -> Option<&User> {
        self.0.as_ref()
    }
}

/// An authenticated user; anonymous requests get 401.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// An authenticated admin; anonymous requests get 401, other users 403.
#[derive(Clone, Debug)]
pub struct AdminUser(pub User);

/// Viewer allowed to call this route: safe methods for anyone, writes for admins.
/// Checked before the body is read.
#[derive(Clone, Debug)]
pub struct AdminWrite(pub Viewer);

/// Viewer allowed to call this route: safe methods for anyone, writes for any authenticated user.
/// Checked before the body is read.
#[derive(Clone, Debug)]
pub struct AuthWrite(pub Viewer);

impl AdminWrite {
    pub fn user(&self) -> Option<&User> {
        self.0.user()
    }
}

impl AuthWrite {
    pub fn user(&self) -> Option<&User> {
        self.0.user()
    }

    /// The author of a new object; writes always carry a user here.
    pub fn author(&self) -> Result<&User, AppError> {
        permissions::require_authenticated(self.user())
    }
}

/// Token from the header when it uses the Bearer scheme.
fn bearer_token(parts: &Parts) -> Option<&str> {
    let value = parts.headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let (scheme, token) = value.split_once(' ')?;
    if scheme != BEARER {
        return None;
    }
    Some(token.trim()).filter(|t| !t.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for Viewer {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(Viewer(None));
        };
        let claims = verify_access_token(token, &state.settings.jwt)?;
        let user = UserService::get_by_id(&state.pool, claims.user_id)
            .await?
            .ok_or_else(|| AppError::InvalidToken("user not found".into()))?;
        tracing::trace!(user = %user.username, "authenticated");
        Ok(Viewer(Some(user)))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Viewer(user) = Viewer::from_request_parts(parts, state).await?;
        user.map(CurrentUser).ok_or(AppError::Unauthenticated)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Viewer(user) = Viewer::from_request_parts(parts, state).await?;
        permissions::require_admin(user.as_ref())?;
        user.map(AdminUser).ok_or(AppError::Unauthenticated)
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminWrite {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let viewer = Viewer::from_request_parts(parts, state).await?;
        permissions::admin_or_read_only(&parts.method, viewer.user())?;
        Ok(AdminWrite(viewer))
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AuthWrite {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let viewer = Viewer::from_request_parts(parts, state).await?;
        permissions::authenticated_or_read_only(&parts.method, viewer.user())?;
        Ok(AuthWrite(viewer))
    }
}
