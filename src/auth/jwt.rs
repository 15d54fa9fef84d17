//! HS256 access tokens carrying the user id.

use crate::error::AppError;
use crate::settings::JwtSettings;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

pub const ACCESS_TOKEN_TYPE: &str = "access";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub token_type: String,
    pub user_id: i64,
    pub iat: u64,
    pub exp: u64,
    pub jti: String,
}

fn now_secs() -> u64 {
    chrono::Utc::now().timestamp().max(0) as u64
}

pub fn mint_access_token(user_id: i64, cfg: &JwtSettings) -> Result<String, AppError> {
    let iat = now_secs();
    let claims = Claims {
        token_type: ACCESS_TOKEN_TYPE.to_string(),
        user_id,
        iat,
        exp: iat + cfg.access_ttl_secs,
        jti: uuid::Uuid::new_v4().simple().to_string(),
    };
    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(cfg.secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("token encode: {}", e)))
}

/// Check signature, expiry and token type.
pub fn verify_access_token(token: &str, cfg: &JwtSettings) -> Result<Claims, AppError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;
    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(cfg.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| AppError::InvalidToken(e.to_string()))?;
    if data.claims.token_type != ACCESS_TOKEN_TYPE {
        return Err(AppError::InvalidToken("token has wrong type".into()));
    }
    Ok(data.claims)
}
