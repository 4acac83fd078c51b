//! Notifier trait definition and shared error types.

use std::collections::HashMap;

use hostwatch_core::Priority;

/// Errors that can occur during alert delivery.
#[derive(Debug, thiserror::Error)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Endpoint rejected delivery with status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("SMTP delivery failed: {0}")]
    Smtp(String),

    #[error("Desktop notification failed: {0}")]
    Process(String),

    #[error("Template rendering failed: {0}")]
    Template(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Delivery timed out after {0}s")]
    Timeout(u64),
}

/// A rendered alert ready for delivery.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Notification {
    pub subject: String,
    /// The alert message.
    pub body: String,
    pub priority: Priority,
    /// Additional metadata (alert key, metric, tier).
    pub metadata: HashMap<String, String>,
}

impl Notification {
    pub fn new(subject: impl Into<String>, body: impl Into<String>, priority: Priority) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
            priority,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Trait for alert channel implementations.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Deliver an alert through this channel.
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError>;

    /// Check the channel end to end with a sample alert.
    async fn test(&self) -> Result<(), NotifyError> {
        let test_notification = Notification::new(
            "[LOW] System Alert: TEST",
            "This is a test alert from hostwatch.",
            Priority::Low,
        )
        .with_metadata("alert_key", "test");
        self.send(&test_notification).await
    }

    /// Human-readable name for this channel (e.g. "console", "email").
    fn channel_name(&self) -> &str;
}

/// Result of delivering an alert to a single channel.
#[derive(Debug, Clone)]
pub struct DispatchResult {
    pub channel: String,
    pub alert_key: String,
    pub success: bool,
    pub error: Option<String>,
    pub duration_ms: u64,
}
