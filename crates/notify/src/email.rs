//! SMTP email notifier via `lettre` with TLS support.

use hostwatch_core::config::EmailConfig;
use lettre::{
    message::Mailbox, transport::smtp::authentication::Credentials, AsyncSmtpTransport,
    AsyncTransport, Message, Tokio1Executor,
};

use crate::traits::{Notification, Notifier, NotifyError};

/// Sends alerts as emails via SMTP.
#[derive(Debug)]
pub struct EmailNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Vec<Mailbox>,
}

fn parse_mailbox(addr: &str) -> Result<Mailbox, NotifyError> {
    addr.parse()
        .map_err(|e: lettre::address::AddressError| NotifyError::Config(format!("{addr}: {e}")))
}

impl EmailNotifier {
    /// Build an `EmailNotifier` from the alert email settings.
    ///
    /// Port defaults to 587. Port 465 uses implicit TLS, other ports use
    /// STARTTLS unless `tls` is off. Credentials come from `SMTP_USERNAME`
    /// and `SMTP_PASSWORD` when both are set.
    pub fn from_config(config: &EmailConfig) -> Result<Self, NotifyError> {
        let host = config
            .smtp_host
            .as_deref()
            .ok_or_else(|| NotifyError::Config("SMTP_HOST is not set".to_string()))?;
        let from = config
            .from
            .as_deref()
            .ok_or_else(|| NotifyError::Config("ALERT_EMAIL_FROM is not set".to_string()))?;

        let from_mailbox = parse_mailbox(from)?;
        let to_mailboxes = config
            .to
            .iter()
            .map(|addr| parse_mailbox(addr))
            .collect::<Result<Vec<_>, _>>()?;

        if to_mailboxes.is_empty() {
            return Err(NotifyError::Config(
                "at least one recipient is required".to_string(),
            ));
        }

        let port = config.smtp_port.unwrap_or(587);

        let mut builder = if port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else if config.tls {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| NotifyError::Config(e.to_string()))?
                .port(port)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(host).port(port)
        };

        if let (Ok(username), Ok(password)) =
            (std::env::var("SMTP_USERNAME"), std::env::var("SMTP_PASSWORD"))
        {
            builder = builder.credentials(Credentials::new(username, password));
        }

        Ok(Self {
            transport: builder.build(),
            from: from_mailbox,
            to: to_mailboxes,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for EmailNotifier {
    async fn send(&self, notification: &Notification) -> Result<(), NotifyError> {
        let mut message_builder = Message::builder().from(self.from.clone());

        for recipient in &self.to {
            message_builder = message_builder.to(recipient.clone());
        }

        let email = message_builder
            .subject(&notification.subject)
            .body(notification.body.clone())
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| NotifyError::Smtp(e.to_string()))?;

        tracing::info!(
            channel = "email",
            subject = %notification.subject,
            recipients = self.to.len(),
            "alert email sent"
        );

        Ok(())
    }

    fn channel_name(&self) -> &str {
        "email"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(port: Option<u16>, tls: bool) -> EmailConfig {
        EmailConfig {
            smtp_host: Some("smtp.example.com".to_string()),
            smtp_port: port,
            tls,
            from: Some("Hostwatch <alerts@example.com>".to_string()),
            to: vec!["admin@example.com".to_string()],
        }
    }

    #[test]
    fn from_config_starttls() {
        let notifier = EmailNotifier::from_config(&config(Some(587), true)).unwrap();
        assert_eq!(notifier.channel_name(), "email");
        assert_eq!(notifier.from.email.to_string(), "alerts@example.com");
    }

    #[test]
    fn from_config_implicit_tls_port() {
        assert!(EmailNotifier::from_config(&config(Some(465), true)).is_ok());
    }

    #[test]
    fn from_config_no_tls() {
        assert!(EmailNotifier::from_config(&config(Some(25), false)).is_ok());
    }

    #[test]
    fn missing_host_rejected() {
        let mut cfg = config(None, true);
        cfg.smtp_host = None;
        let err = EmailNotifier::from_config(&cfg).unwrap_err().to_string();
        assert!(err.contains("SMTP_HOST"), "got: {err}");
    }

    #[test]
    fn invalid_recipient_rejected() {
        let mut cfg = config(None, true);
        cfg.to = vec!["not-an-email".to_string()];
        assert!(EmailNotifier::from_config(&cfg).is_err());
    }

    #[test]
    fn empty_recipients_rejected() {
        let mut cfg = config(None, true);
        cfg.to.clear();
        let err = EmailNotifier::from_config(&cfg).unwrap_err().to_string();
        assert!(err.contains("at least one recipient"), "got: {err}");
    }
}
