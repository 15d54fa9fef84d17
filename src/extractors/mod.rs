//! Request extractors: authenticated viewer and JSON payloads.

pub mod auth;
pub mod json;

pub use auth::{AdminUser, AdminWrite, AuthWrite, CurrentUser, Viewer};
pub use json::Payload;
