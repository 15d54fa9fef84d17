//! Signup by email confirmation code and exchange of the code for an access token.

use super::users::UserService;
use super::validation::{Validator, CODE_MAX};
use crate::auth::mint_access_token;
use crate::error::AppError;
use crate::mail::{EmailMessage, Mailer};
use crate::settings::JwtSettings;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

pub const CONFIRMATION_SUBJECT: &str = "Confirmation code";

#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct SignupInput {
    pub username: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SignupResponse {
    pub username: String,
    pub email: String,
}

#[derive(Debug, Default, Clone, Deserialize)]
pub struct TokenInput {
    pub username: Option<String>,
    pub confirmation_code: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenResponse {
    pub token: String,
}

impl SignupInput {
    fn validate(&self) -> Result<(&str, &str), AppError> {
        let mut v = Validator::new();
        if let Some(username) = v.required("username", self.username.as_ref()) {
            v.username("username", username);
        }
        if let Some(email) = v.required("email", self.email.as_ref()) {
            v.email("email", email);
        }
        v.finish()?;
        match (self.username.as_deref(), self.email.as_deref()) {
            (Some(u), Some(e)) => Ok((u, e)),
            _ => Err(AppError::non_field("username and email are required")),
        }
    }
}

impl TokenInput {
    fn validate(&self) -> Result<(&str, &str), AppError> {
        let mut v = Validator::new();
        if let Some(username) = v.required("username", self.username.as_ref()) {
            v.username("username", username);
        }
        if let Some(code) = v.required("confirmation_code", self.confirmation_code.as_ref()) {
            if v.not_blank("confirmation_code", code) {
                v.max_len("confirmation_code", code, CODE_MAX);
            }
        }
        v.finish()?;
        match (self.username.as_deref(), self.confirmation_code.as_deref()) {
            (Some(u), Some(c)) => Ok((u, c)),
            _ => Err(AppError::non_field("username and confirmation_code are required")),
        }
    }
}

/// Fresh one-time code; 32 hex chars.
pub fn new_confirmation_code() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

pub struct SignupService;

impl SignupService {
    /// Register (or re-register) `username`/`email` and mail a new confirmation code.
    /// An existing username must come with its own email; an email may not be reused by another username.
    pub async fn signup(
        pool: &PgPool,
        mailer: &dyn Mailer,
        from: &str,
        input: &SignupInput,
    ) -> Result<SignupResponse, AppError> {
        let (username, email) = input.validate()?;

        let user = match UserService::get_by_username(pool, username).await? {
            Some(user) if user.email != email => {
                return Err(AppError::non_field(format!(
                    "The email given for user <{}> is incorrect.",
                    username
                )));
            }
            Some(user) => user,
            None => {
                if UserService::get_by_email(pool, email).await?.is_some() {
                    return Err(AppError::non_field(format!(
                        "Email <{}> is already registered to another user.",
                        email
                    )));
                }
                UserService::create_basic(pool, username, email).await?
            }
        };

        let code = new_confirmation_code();
        UserService::set_confirmation_code(pool, user.id, Some(&code)).await?;
        mailer
            .send(EmailMessage {
                subject: CONFIRMATION_SUBJECT.to_string(),
                body: code,
                from: from.to_string(),
                to: vec![email.to_string()],
            })
            .await?;
        tracing::info!(username = %username, "confirmation code sent");
        Ok(SignupResponse {
            username: username.to_string(),
            email: email.to_string(),
        })
    }

    /// Trade a confirmation code for an access token. The stored code is replaced on every
    /// attempt, so it can be used once whether or not it matched.
    pub async fn exchange_token(pool: &PgPool, jwt: &JwtSettings, input: &TokenInput) -> Result<TokenResponse, AppError> {
        let (username, code) = input.validate()?;

        let mut tx = pool.begin().await?;
        let row: Option<(i64, Option<String>)> =
            sqlx::query_as("SELECT id, confirmation_code FROM users WHERE username = $1 FOR UPDATE")
                .bind(username)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((user_id, stored)) = row else {
            return Err(AppError::NotFound(format!("user {}", username)));
        };
        sqlx::query("UPDATE users SET confirmation_code = $2 WHERE id = $1")
            .bind(user_id)
            .bind(new_confirmation_code())
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        if stored.as_deref() != Some(code) {
            tracing::warn!(username = %username, "confirmation code mismatch");
            return Err(AppError::field("confirmation_code", "Invalid confirmation_code."));
        }
        let token = mint_access_token(user_id, jwt)?;
        tracing::info!(username = %username, "access token issued");
        Ok(TokenResponse { token })
    }
}
