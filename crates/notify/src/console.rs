use hostwatch_core::Priority;

use crate::traits::{Notification, Notifier, NotifyError};

/// Writes alerts to the process log at a level matching their priority.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleNotifier;

#[async_trait::async_trait]
impl Notifier for ConsoleNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let priority = notification.priority;
        let message = &notification.body;
        match priority {
            Priority::Critical | Priority::High => {
                tracing::error!(target: "hostwatch::alert", %priority, "[ALERT - {priority}] {message}")
            }
            Priority::Medium => {
                tracing::warn!(target: "hostwatch::alert", %priority, "[ALERT - {priority}] {message}")
            }
            Priority::Low => {
                tracing::info!(target: "hostwatch::alert", %priority, "[ALERT - {priority}] {message}")
            }
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "console"
    }
}
