//! User accounts: admin CRUD, self-service profile, lookups for auth.

use super::validation::{Validator, PERSON_NAME_MAX};
use super::{fetch_page, Listing};
use crate::error::{is_unique_violation, AppError};
use crate::models::{Role, User};
use crate::response::PageRequest;
use crate::sql::ListQuery;
use serde::Deserialize;
use sqlx::PgPool;

const USER_COLUMNS: &str =
    "id, username, email, first_name, last_name, bio, role, is_staff, is_superuser, confirmation_code";

/// Body of POST/PATCH on users. Every field is optional here; `validate` decides what is required.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct UserInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub bio: Option<String>,
    pub role: Option<String>,
}

impl UserInput {
    /// Field checks; with `partial` missing fields are skipped.
    pub fn validate(&self, partial: bool) -> Result<Option<Role>, AppError> {
        let mut v = Validator::new();
        if let Some(username) = &self.username {
            v.username("username", username);
        } else if !partial {
            v.required::<String>("username", None);
        }
        if let Some(email) = &self.email {
            v.email("email", email);
        } else if !partial {
            v.required::<String>("email", None);
        }
        if let Some(first) = &self.first_name {
            v.max_len("first_name", first, PERSON_NAME_MAX);
        }
        if let Some(last) = &self.last_name {
            v.max_len("last_name", last, PERSON_NAME_MAX);
        }
        let mut role = None;
        if let Some(raw) = &self.role {
            match raw.parse::<Role>() {
                Ok(r) => role = Some(r),
                Err(msg) => v.add("role", msg),
            }
        }
        v.finish()?;
        Ok(role)
    }
}

pub struct UserService;

impl UserService {
    pub async fn get_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).bind(id).fetch_optional(pool).await?)
    }

    pub async fn get_by_username(pool: &PgPool, username: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).bind(username).fetch_optional(pool).await?)
    }

    pub async fn get_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM users WHERE email = $1", USER_COLUMNS);
        Ok(sqlx::query_as::<_, User>(&sql).bind(email).fetch_optional(pool).await?)
    }

    /// Users ordered by username; `search` is a case-insensitive substring of the username.
    pub async fn list(pool: &PgPool, search: Option<&str>, page: PageRequest) -> Result<Listing<User>, AppError> {
        let mut q = ListQuery::new(USER_COLUMNS, "users", "username");
        if let Some(term) = search.map(str::trim).filter(|s| !s.is_empty()) {
            q.where_contains("username", term);
        }
        fetch_page(pool, &q, page).await
    }

    /// Reject a username or email already held by a user other than `except_id`.
    async fn check_unique(
        pool: &PgPool,
        username: Option<&str>,
        email: Option<&str>,
        except_id: Option<i64>,
    ) -> Result<(), AppError> {
        let mut v = Validator::new();
        if let Some(username) = username {
            if let Some(other) = Self::get_by_username(pool, username).await? {
                if Some(other.id) != except_id {
                    v.add("username", "A user with that username already exists.");
                }
            }
        }
        if let Some(email) = email {
            if let Some(other) = Self::get_by_email(pool, email).await? {
                if Some(other.id) != except_id {
                    v.add("email", "A user with that email already exists.");
                }
            }
        }
        v.finish()
    }

    /// Admin-side create. Validates the full body and uniqueness.
    pub async fn create(pool: &PgPool, input: &UserInput) -> Result<User, AppError> {
        let role = input.validate(false)?.unwrap_or_default();
        let (Some(username), Some(email)) = (input.username.as_deref(), input.email.as_deref()) else {
            return Err(AppError::non_field("username and email are required"));
        };
        Self::check_unique(pool, Some(username), Some(email), None).await?;
        let sql = format!(
            "INSERT INTO users (username, email, first_name, last_name, bio, role) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(email)
            .bind(input.first_name.as_deref().unwrap_or(""))
            .bind(input.last_name.as_deref().unwrap_or(""))
            .bind(input.bio.as_deref().unwrap_or(""))
            .bind(role.as_str())
            .fetch_one(pool)
            .await
            .map_err(unique_to_validation)?;
        tracing::info!(username = %user.username, role = %user.role, "user created");
        Ok(user)
    }

    /// Signup-side create: role `user`, no profile fields.
    pub async fn create_basic(pool: &PgPool, username: &str, email: &str) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO users (username, email) VALUES ($1, $2) RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(email)
            .fetch_one(pool)
            .await
            .map_err(unique_to_validation)?;
        tracing::info!(username = %user.username, "user signed up");
        Ok(user)
    }

    /// Partial update. `allow_role` is false for self-service edits, where the role is kept.
    pub async fn update(pool: &PgPool, existing: &User, input: &UserInput, allow_role: bool) -> Result<User, AppError> {
        let role = input.validate(true)?;
        Self::check_unique(
            pool,
            input.username.as_deref(),
            input.email.as_deref(),
            Some(existing.id),
        )
        .await?;
        let role = if allow_role { role.unwrap_or(existing.role) } else { existing.role };
        let sql = format!(
            "UPDATE users SET username = $2, email = $3, first_name = $4, last_name = $5, bio = $6, role = $7 \
             WHERE id = $1 RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(existing.id)
            .bind(input.username.as_deref().unwrap_or(&existing.username))
            .bind(input.email.as_deref().unwrap_or(&existing.email))
            .bind(input.first_name.as_deref().unwrap_or(&existing.first_name))
            .bind(input.last_name.as_deref().unwrap_or(&existing.last_name))
            .bind(input.bio.as_deref().unwrap_or(&existing.bio))
            .bind(role.as_str())
            .fetch_optional(pool)
            .await
            .map_err(unique_to_validation)?
            .ok_or_else(|| AppError::NotFound(existing.username.clone()))?;
        Ok(user)
    }

    /// Delete by username; reviews and comments go with the account. Returns false if absent.
    pub async fn delete(pool: &PgPool, username: &str) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM users WHERE username = $1")
            .bind(username)
            .execute(pool)
            .await?;
        if result.rows_affected() > 0 {
            tracing::info!(username = %username, "user deleted");
        }
        Ok(result.rows_affected() > 0)
    }

    pub async fn set_confirmation_code(pool: &PgPool, id: i64, code: Option<&str>) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET confirmation_code = $2 WHERE id = $1")
            .bind(id)
            .bind(code)
            .execute(pool)
            .await?;
        Ok(())
    }

    /// Create the account if missing, then grant staff, superuser and the admin role.
    pub async fn create_superuser(pool: &PgPool, username: &str, email: &str) -> Result<User, AppError> {
        let mut v = Validator::new();
        v.username("username", username);
        v.email("email", email);
        v.finish()?;
        let sql = format!(
            "INSERT INTO users (username, email, role, is_staff, is_superuser) \
             VALUES ($1, $2, 'admin', TRUE, TRUE) \
             ON CONFLICT (username) DO UPDATE SET role = 'admin', is_staff = TRUE, is_superuser = TRUE \
             RETURNING {}",
            USER_COLUMNS
        );
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .bind(email)
            .fetch_one(pool)
            .await
            .map_err(unique_to_validation)?;
        tracing::info!(username = %user.username, "superuser ready");
        Ok(user)
    }
}

fn unique_to_validation(e: sqlx::Error) -> AppError {
    if is_unique_violation(&e) {
        AppError::non_field("A user with that username or email already exists.")
    } else {
        AppError::Db(e)
    }
}
