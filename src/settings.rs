//! Runtime settings read from the environment.

use crate::error::ConfigError;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

/// Where confirmation emails go.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MailBackend {
    /// Emit a tracing event per message.
    Log,
    /// Write one file per message into a directory.
    File(PathBuf),
}

#[derive(Clone, Debug)]
pub struct JwtSettings {
    pub secret: String,
    pub access_ttl_secs: u64,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub database_url: String,
    pub bind_addr: SocketAddr,
    pub db_max_connections: u32,
    pub jwt: JwtSettings,
    /// Sender address for confirmation codes.
    pub confirm_code_email: String,
    pub page_size: u32,
    pub max_body_bytes: usize,
    pub mail: MailBackend,
}

impl Settings {
    /// Read settings from process env. `DATABASE_URL` and `JWT_SECRET` are required.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Settings::from_env`] but reads values through `get`.
    pub fn from_lookup<F>(get: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| get(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let database_url = get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?;
        let secret = get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?;

        let bind_addr = parse_or("BIND_ADDR", get("BIND_ADDR"), "0.0.0.0:8000".parse().ok())?;
        let db_max_connections = parse_or("DB_MAX_CONNECTIONS", get("DB_MAX_CONNECTIONS"), Some(5))?;
        let access_ttl_secs = parse_or("ACCESS_TOKEN_TTL_SECS", get("ACCESS_TOKEN_TTL_SECS"), Some(86_400))?;
        let page_size: u32 = parse_or("PAGE_SIZE", get("PAGE_SIZE"), Some(10))?;
        if !(1..=1000).contains(&page_size) {
            return Err(ConfigError::Invalid {
                name: "PAGE_SIZE",
                reason: "must be between 1 and 1000".into(),
            });
        }
        let max_body_bytes = parse_or("MAX_BODY_BYTES", get("MAX_BODY_BYTES"), Some(1024 * 1024))?;

        let mail = match get("MAIL_BACKEND").as_deref().unwrap_or("log") {
            "log" => MailBackend::Log,
            "file" => MailBackend::File(PathBuf::from(
                get("MAIL_FILE_PATH").unwrap_or_else(|| "sent_emails".into()),
            )),
            other => {
                return Err(ConfigError::Invalid {
                    name: "MAIL_BACKEND",
                    reason: format!("unknown backend '{}' (expected log or file)", other),
                })
            }
        };

        Ok(Settings {
            database_url,
            bind_addr,
            db_max_connections,
            jwt: JwtSettings {
                secret,
                access_ttl_secs,
            },
            confirm_code_email: get("CONFIRM_CODE_EMAIL").unwrap_or_else(|| "noreply@yamdb.local".into()),
            page_size,
            max_body_bytes,
            mail,
        })
    }
}

fn parse_or<T: FromStr>(name: &'static str, raw: Option<String>, default: Option<T>) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(s) => s.parse::<T>().map_err(|e| ConfigError::Invalid {
            name,
            reason: e.to_string(),
        }),
        None => default.ok_or(ConfigError::Missing(name)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |k| map.get(k).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_missing() {
        let s = Settings::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/yamdb"),
            ("JWT_SECRET", "s3cret"),
        ]))
        .unwrap();
        assert_eq!(s.bind_addr.port(), 8000);
        assert_eq!(s.page_size, 10);
        assert_eq!(s.jwt.access_ttl_secs, 86_400);
        assert_eq!(s.mail, MailBackend::Log);
    }

    #[test]
    fn missing_secret_is_rejected() {
        let err = Settings::from_lookup(lookup(&[("DATABASE_URL", "postgres://localhost/yamdb")])).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("JWT_SECRET")));
    }

    #[test]
    fn bad_values_are_rejected() {
        let base = [("DATABASE_URL", "postgres://x/y"), ("JWT_SECRET", "k")];
        let err = Settings::from_lookup(lookup(&[base[0], base[1], ("PAGE_SIZE", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "PAGE_SIZE", .. }));
        let err = Settings::from_lookup(lookup(&[base[0], base[1], ("MAIL_BACKEND", "smtp")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { name: "MAIL_BACKEND", .. }));
        let s = Settings::from_lookup(lookup(&[base[0], base[1], ("MAIL_BACKEND", "file")])).unwrap();
        assert_eq!(s.mail, MailBackend::File(PathBuf::from("sent_emails")));
    }
}
