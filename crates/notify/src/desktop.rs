//! Desktop pop-up via the freedesktop `notify-send` command.

use hostwatch_core::Priority;

use crate::traits::{Notification, Notifier, NotifyError};

const DEFAULT_PROGRAM: &str = "notify-send";

/// Shows alerts as desktop notifications by spawning `notify-send`.
#[derive(Debug, Clone)]
pub struct DesktopNotifier {
    program: String,
}

impl DesktopNotifier {
    pub fn new() -> Self {
        Self::with_program(DEFAULT_PROGRAM)
    }

    /// Use a different executable with a `notify-send` compatible CLI.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl Default for DesktopNotifier {
    fn default() -> Self {
        Self::new()
    }
}

fn urgency(priority: Priority) -> &'static str {
    match priority {
        Priority::Critical | Priority::High => "critical",
        Priority::Medium => "normal",
        Priority::Low => "low",
    }
}

#[async_trait::async_trait]
impl Notifier for DesktopNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let output = tokio::process::Command::new(&self.program)
            .arg("--app-name=hostwatch")
            .arg(format!("--urgency={}", urgency(notification.priority)))
            .arg(&notification.subject)
            .arg(&notification.body)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| NotifyError::Process(format!("failed to spawn {}: {e}", self.program)))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(NotifyError::Process(format!(
                "{} exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }
        Ok(())
    }

    fn channel_name(&self) -> &str {
        "desktop"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urgency_by_priority() {
        assert_eq!(urgency(Priority::Critical), "critical");
        assert_eq!(urgency(Priority::High), "critical");
        assert_eq!(urgency(Priority::Medium), "normal");
        assert_eq!(urgency(Priority::Low), "low");
    }

    #[tokio::test]
    async fn missing_program_is_an_error() {
        let notifier = DesktopNotifier::with_program("hostwatch-no-such-binary-xyz");
        let err = notifier
            .send(&Notification::new("s", "b", Priority::Low))
            .await
            .unwrap_err();
        assert!(matches!(err, NotifyError::Process(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn nonzero_exit_is_an_error() {
        let notifier = DesktopNotifier::with_program("false");
        assert!(notifier
            .send(&Notification::new("s", "b", Priority::Low))
            .await
            .is_err());
    }
}
