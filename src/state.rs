//! Shared application state for all routes.

use crate::mail::{self, Mailer};
use crate::settings::Settings;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub settings: Arc<Settings>,
    pub mailer: Arc<dyn Mailer>,
}

impl AppState {
    /// State with the mailer chosen by `settings.mail`.
    pub fn new(pool: PgPool, settings: Settings) -> Self {
        let mailer = mail::from_backend(&settings.mail);
        AppState {
            pool,
            settings: Arc::new(settings),
            mailer,
        }
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn Mailer>) -> Self {
        self.mailer = mailer;
        self
    }
}
