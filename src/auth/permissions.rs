//! Permission predicates. Each returns `Ok(())` or the error to respond with:
//! 401 when no user is authenticated, 403 when the user lacks the role.

use crate::error::AppError;
use crate::models::User;
use axum::http::Method;

pub fn is_safe_method(method: &Method) -> bool {
    matches!(*method, Method::GET | Method::HEAD | Method::OPTIONS)
}

/// Any authenticated user.
pub fn require_authenticated(user: Option<&User>) -> Result<&User, AppError> {
    user.ok_or(AppError::Unauthenticated)
}

/// Admin role or staff superuser.
pub fn require_admin(user: Option<&User>) -> Result<&User, AppError> {
    let user = require_authenticated(user)?;
    if user.is_admin() {
        Ok(user)
    } else {
        Err(AppError::Forbidden)
    }
}

/// Reads for everyone, writes for admins.
pub fn admin_or_read_only(method: &Method, user: Option<&User>) -> Result<(), AppError> {
    if is_safe_method(method) {
        return Ok(());
    }
    require_admin(user).map(|_| ())
}

/// Reads for everyone, writes for any authenticated user.
pub fn authenticated_or_read_only(method: &Method, user: Option<&User>) -> Result<(), AppError> {
    if is_safe_method(method) {
        return Ok(());
    }
    require_authenticated(user).map(|_| ())
}

/// Changing an existing review or comment: admins, moderators and the author.
pub fn staff_or_author(method: &Method, user: Option<&User>, author_id: i64) -> Result<(), AppError> {
    if is_safe_method(method) {
        return Ok(());
    }
    let user = require_authenticated(user)?;
    if user.is_admin() || user.is_moderator() || user.id == author_id {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}
