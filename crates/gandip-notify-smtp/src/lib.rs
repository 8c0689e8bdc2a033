// # SMTP Notifier
//
// Sends one plain-text mail per run when records changed. The relay is
// reached on the submission port and upgraded with STARTTLS before
// authenticating. Subject and body come from templates in which `{ip}` is
// replaced by the new address(es).
//
// Addresses and the relay are checked when the notifier is built, so a bad
// configuration fails at startup rather than after the DNS update. Build it
// from within a tokio runtime, the transport owns a connection pool.

use async_trait::async_trait;
use gandip_core::config::SmtpConfig;
use gandip_core::traits::{Notification, Notifier};
use gandip_core::{Error, Result};
use lettre::message::Mailbox;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

/// Mail notifier
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    config: SmtpConfig,
}

impl std::fmt::Debug for SmtpNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // SmtpConfig's Debug already hides the password
        f.debug_struct("SmtpNotifier")
            .field("config", &self.config)
            .finish()
    }
}

impl SmtpNotifier {
    /// Build a notifier from configuration
    pub fn new(config: SmtpConfig) -> Result<Self> {
        config.validate()?;

        let from = parse_mailbox(&config.from)?;
        let to = parse_mailbox(&config.to)?;

        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)
            .map_err(|e| Error::config(format!("Invalid SMTP relay {}: {}", config.host, e)))?
            .port(config.port);

        if !config.username.is_empty() {
            builder = builder.credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ));
        }

        Ok(Self {
            transport: builder.build(),
            from,
            to,
            config,
        })
    }

    /// Render the mail for a notification
    pub fn message(&self, notification: &Notification) -> Result<Message> {
        let ips = notification.new_ips();

        Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(self.config.subject(&ips))
            .header(ContentType::TEXT_PLAIN)
            .body(self.config.body(&ips))
            .map_err(|e| Error::notify(format!("Failed to build mail: {}", e)))
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address
        .parse()
        .map_err(|e| Error::config(format!("Invalid email address {:?}: {}", address, e)))
}

#[async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let message = self.message(notification)?;

        tracing::debug!(
            "Sending change notification for {} to {} via {}:{}",
            notification.zone,
            self.to,
            self.config.host,
            self.config.port
        );

        self.transport
            .send(message)
            .await
            .map_err(|e| Error::notify(format!("SMTP delivery failed: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gandip_core::traits::UpdateResult;

    fn config() -> SmtpConfig {
        SmtpConfig {
            host: "smtp.example.com".to_string(),
            port: 587,
            username: "updater".to_string(),
            password: "hunter2".to_string(),
            from: "updater@example.com".to_string(),
            to: "ops@example.com".to_string(),
            subject_template: "Home's IP address has changed to {ip}".to_string(),
            body_template: "Home's IP address has changed to {ip}".to_string(),
        }
    }

    fn notification() -> Notification {
        Notification {
            zone: "example.com".to_string(),
            changes: vec![UpdateResult::Updated {
                name: "www".to_string(),
                previous: vec!["203.0.113.5".to_string()],
                ip: "203.0.113.7".to_string(),
            }],
        }
    }

    #[tokio::test]
    async fn test_message_contents() {
        let notifier = SmtpNotifier::new(config()).unwrap();
        let message = notifier.message(&notification()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();

        assert!(raw.contains("From: updater@example.com"));
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("Subject: Home's IP address has changed to 203.0.113.7"));
        assert!(raw.contains("Content-Type: text/plain"));
        assert!(raw.contains("\r\n\r\nHome's IP address has changed to 203.0.113.7"));
    }

    #[tokio::test]
    async fn test_invalid_addresses_rejected() {
        let mut bad_from = config();
        bad_from.from = "not-an-address".to_string();
        assert!(matches!(SmtpNotifier::new(bad_from), Err(Error::Config(_))));

        let mut bad_to = config();
        bad_to.to = "ops@@example.com".to_string();
        assert!(matches!(SmtpNotifier::new(bad_to), Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_password_not_exposed_in_debug() {
        let notifier = SmtpNotifier::new(config()).unwrap();
        let debug_str = format!("{:?}", notifier);
        assert!(!debug_str.contains("hunter2"));
        assert!(debug_str.contains("smtp.example.com"));
    }

    #[tokio::test]
    async fn test_unreachable_relay_is_notify_error() {
        let mut config = config();
        config.host = "127.0.0.1".to_string();
        config.port = 9;
        let notifier = SmtpNotifier::new(config).unwrap();

        let result = notifier.notify(&notification()).await;
        assert!(matches!(result, Err(Error::Notify(_))));
    }
}
