use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::config::NotificationConfig;

/// Structured payload handed to the outbound webhook
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NotificationEvent {
    pub event: String,
    pub to: Vec<String>,
    pub subject: String,
    pub payload: Value,
    pub occurred_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(event: &str, to: Vec<String>, subject: impl Into<String>, payload: Value) -> Self {
        Self { event: event.to_string(), to, subject: subject.into(), payload, occurred_at: Utc::now() }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("webhook request failed: {0}")]
    Transport(String),

    #[error("webhook answered with status {0}")]
    Status(u16),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError>;
}

/// POSTs each event as JSON to the configured webhook
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: String, timeout_secs: u64) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| NotifyError::Transport(e.to_string()))?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(&self.url)
            .json(event)
            .send()
            .await
            .map_err(|e| NotifyError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Status(response.status().as_u16()));
        }
        Ok(())
    }
}

/// Used when no webhook is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        tracing::info!(event = %event.event, recipients = event.to.len(), "Notification (no webhook configured): {}", event.subject);
        Ok(())
    }
}

/// Keeps every event in memory; lets tests assert on what was dispatched
#[derive(Default, Clone)]
pub struct MemoryNotifier {
    sent: Arc<RwLock<Vec<NotificationEvent>>>,
}

impl MemoryNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn sent(&self) -> Vec<NotificationEvent> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for MemoryNotifier {
    async fn send(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        self.sent.write().await.push(event.clone());
        Ok(())
    }
}

/// Webhook when a URL is configured, log-only otherwise
pub fn from_config(config: &NotificationConfig) -> Arc<dyn Notifier> {
    match config.webhook_url.as_ref() {
        Some(url) => match WebhookNotifier::new(url.clone(), config.timeout_secs) {
            Ok(notifier) => Arc::new(notifier),
            Err(e) => {
                tracing::warn!("Webhook notifier unavailable ({}), falling back to log notifier", e);
                Arc::new(LogNotifier)
            }
        },
        None => Arc::new(LogNotifier),
    }
}
