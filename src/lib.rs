//! YaMDb API: REST backend for titles, their reviews and comments, with
//! email-code signup and JWT-authenticated roles.

pub mod auth;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod mail;
pub mod migration;
pub mod models;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, ConfigError, FieldErrors};
pub use mail::{EmailMessage, Mailer, MemoryMailer};
pub use migration::apply_migrations;
pub use models::{Role, User};
pub use routes::{build_router, API_PREFIX};
pub use settings::Settings;
pub use state::AppState;
pub use store::{connect, ensure_database_exists};
