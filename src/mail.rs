//! Outgoing email. The signup flow sends confirmation codes through a [`Mailer`].

use crate::error::AppError;
use crate::settings::MailBackend;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EmailMessage {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError>;
}

/// Build the mailer selected by `MAIL_BACKEND`.
pub fn from_backend(backend: &MailBackend) -> Arc<dyn Mailer> {
    match backend {
        MailBackend::Log => Arc::new(LogMailer),
        MailBackend::File(dir) => Arc::new(FileMailer::new(dir.clone())),
    }
}

pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        tracing::info!(
            from = %message.from,
            to = ?message.to,
            subject = %message.subject,
            body = %message.body,
            "email"
        );
        Ok(())
    }
}

/// One `<timestamp>-<uuid>.eml` file per message.
pub struct FileMailer {
    dir: PathBuf,
}

impl FileMailer {
    pub fn new(dir: PathBuf) -> Self {
        FileMailer { dir }
    }
}

#[async_trait]
impl Mailer for FileMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|e| AppError::Internal(format!("mail dir {}: {}", self.dir.display(), e)))?;
        let name = format!(
            "{}-{}.eml",
            chrono::Utc::now().format("%Y%m%d-%H%M%S"),
            uuid::Uuid::new_v4().simple()
        );
        let path = self.dir.join(name);
        let content = format!(
            "Subject: {}\nFrom: {}\nTo: {}\n\n{}\n",
            message.subject,
            message.from,
            message.to.join(", "),
            message.body
        );
        tokio::fs::write(&path, content)
            .await
            .map_err(|e| AppError::Internal(format!("mail write {}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "email written");
        Ok(())
    }
}

/// Keeps sent messages in memory.
#[derive(Clone, Default)]
pub struct MemoryMailer {
    outbox: Arc<Mutex<Vec<EmailMessage>>>,
}

impl MemoryMailer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<EmailMessage> {
        self.outbox.lock().map(|o| o.clone()).unwrap_or_default()
    }

    /// Most recent message addressed to `to`.
    pub fn last_to(&self, to: &str) -> Option<EmailMessage> {
        self.sent().into_iter().rev().find(|m| m.to.iter().any(|t| t == to))
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(&self, message: EmailMessage) -> Result<(), AppError> {
        self.outbox
            .lock()
            .map_err(|_| AppError::Internal("outbox lock poisoned".into()))?
            .push(message);
        Ok(())
    }
}
