//! Fans an alert out to every configured channel.
//!
//! Channels are driven concurrently and each delivery is bounded by a
//! timeout. A failed or slow channel never blocks the others.

use std::time::{Duration, Instant};

use futures::future::join_all;

use crate::traits::{DispatchResult, Notification, Notifier, NotifyError};

/// Delivers alerts to a fixed set of channels.
pub struct Dispatcher {
    channels: Vec<Box<dyn Notifier>>,
    timeout: Duration,
}

impl Dispatcher {
    pub fn new(channels: Vec<Box<dyn Notifier>>, timeout: Duration) -> Self {
        Self { channels, timeout }
    }

    /// Create a dispatcher with no channels.
    pub fn empty() -> Self {
        Self::new(Vec::new(), Duration::from_secs(10))
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn channel_names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.channel_name()).collect()
    }

    /// Send `notification` to all channels and collect one result per channel,
    /// in channel order.
    pub async fn dispatch(&self, notification: &Notification) -> Vec<DispatchResult> {
        let alert_key = notification
            .metadata
            .get("alert_key")
            .cloned()
            .unwrap_or_default();

        if self.channels.is_empty() {
            tracing::debug!(alert_key = %alert_key, "No alert channels configured");
            return Vec::new();
        }

        let deliveries = self.channels.iter().map(|channel| {
            let alert_key = alert_key.clone();
            async move {
                let start = Instant::now();
                let result = self.bounded(channel.send(notification)).await;
                self.record(channel.as_ref(), alert_key, start, result)
            }
        });

        join_all(deliveries).await
    }

    /// Run each channel's self-test concurrently.
    pub async fn test_all(&self) -> Vec<DispatchResult> {
        let tests = self.channels.iter().map(|channel| async move {
            let start = Instant::now();
            let result = self.bounded(channel.test()).await;
            self.record(channel.as_ref(), "test".to_string(), start, result)
        });

        join_all(tests).await
    }

    async fn bounded<F>(&self, delivery: F) -> Result<(), NotifyError>
    where
        F: std::future::Future<Output = Result<(), NotifyError>>,
    {
        match tokio::time::timeout(self.timeout, delivery).await {
            Ok(result) => result,
            Err(_) => Err(NotifyError::Timeout(self.timeout.as_secs())),
        }
    }

    fn record(
        &self,
        channel: &dyn Notifier,
        alert_key: String,
        start: Instant,
        result: Result<(), NotifyError>,
    ) -> DispatchResult {
        let duration_ms = start.elapsed().as_millis() as u64;
        let (success, error) = match result {
            Ok(()) => {
                tracing::debug!(
                    alert_key = %alert_key,
                    channel = channel.channel_name(),
                    duration_ms,
                    "Alert delivered"
                );
                (true, None)
            }
            Err(e) => {
                tracing::warn!(
                    alert_key = %alert_key,
                    channel = channel.channel_name(),
                    error = %e,
                    duration_ms,
                    "Alert delivery failed"
                );
                (false, Some(e.to_string()))
            }
        };

        DispatchResult {
            channel: channel.channel_name().to_string(),
            alert_key,
            success,
            error,
            duration_ms,
        }
    }
}
