//! Generic HTTP webhook notifier.
//!
//! Posts each alert as a JSON document:
//! `{"subject", "body", "priority", "metadata"}`.

use crate::traits::{Notification, Notifier, NotifyError};

#[derive(Debug)]
pub struct WebhookNotifier {
    url: reqwest::Url,
    /// Shared HTTP client (connection pooling).
    client: reqwest::Client,
}

impl WebhookNotifier {
    /// Validate `url` eagerly so a typo fails at startup, not on the first alert.
    pub fn new(url: &str) -> Result<Self, NotifyError> {
        let url = reqwest::Url::parse(url)
            .map_err(|e| NotifyError::Config(format!("invalid webhook URL '{url}': {e}")))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(NotifyError::Config(format!(
                "webhook URL must be http or https, got '{}'",
                url.scheme()
            )));
        }
        Ok(Self {
            url,
            client: reqwest::Client::new(),
        })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }
}

#[async_trait::async_trait]
impl Notifier for WebhookNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(notification)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body_text = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(NotifyError::Status {
                status: status.as_u16(),
                body: body_text,
            });
        }

        tracing::debug!(url = %self.url, %status, "webhook alert delivered");
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "webhook"
    }
}
