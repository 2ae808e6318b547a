//! Transactional email notifications.
//!
//! Notifications are strictly best-effort: a failure here is logged and
//! never rolls back the lifecycle transition that triggered it. When SMTP
//! is not configured the notifier is a no-op.

use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::Mailbox,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use secrecy::ExposeSecret;
use thiserror::Error;

use crate::config::EmailConfig;
use crate::models::{Order, Payment, User};

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum NotificationError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Email notifier for lifecycle events.
#[derive(Clone)]
pub struct Notifier {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from_address: String,
}

impl Notifier {
    /// Create a notifier from optional SMTP configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay parameters are invalid.
    pub fn new(config: Option<&EmailConfig>) -> Result<Self, SmtpError> {
        let Some(config) = config else {
            return Ok(Self {
                mailer: None,
                from_address: String::new(),
            });
        };

        let credentials = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_owned(),
        );
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.host)?
            .port(config.port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer: Some(mailer),
            from_address: config.from_address.clone(),
        })
    }

    /// Send the order confirmation email.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or handed to the relay.
    pub async fn order_confirmation(
        &self,
        user: &User,
        order: &Order,
    ) -> Result<(), NotificationError> {
        let subject = format!("Order #{} Confirmation", order.id);
        let body = format!(
            "Dear {name},\n\n\
             Thank you for your purchase! Your order #{id} has been received \
             and is currently {status}. We will notify you when it ships.\n\n\
             Total: {total}\n\
             Shipping to: {address}\n\n\
             Regards,\nDuka",
            name = display_name(user),
            id = order.id,
            status = order.status,
            total = order.total_amount,
            address = order.address,
        );

        self.send(&user.email, &subject, body).await
    }

    /// Send the payment result email.
    ///
    /// # Errors
    ///
    /// Returns error if the message cannot be built or handed to the relay.
    pub async fn payment_result(
        &self,
        user: &User,
        payment: &Payment,
    ) -> Result<(), NotificationError> {
        let subject = format!("Payment #{} {}", payment.id, payment.status);
        let body = format!(
            "Dear {name},\n\n\
             Your payment of {amount} via {method} is {status}.\n\
             Reference: {reference}\n\n\
             Regards,\nDuka",
            name = display_name(user),
            amount = payment.amount,
            method = payment.method,
            status = payment.status,
            reference = payment.transaction_id.as_deref().unwrap_or("n/a"),
        );

        self.send(&user.email, &subject, body).await
    }

    async fn send(&self, to: &str, subject: &str, body: String) -> Result<(), NotificationError> {
        let Some(mailer) = &self.mailer else {
            tracing::debug!(to, subject, "Email disabled; skipping notification");
            return Ok(());
        };

        let message = Message::builder()
            .from(parse_mailbox(&self.from_address)?)
            .to(parse_mailbox(to)?)
            .subject(subject)
            .body(body)?;

        mailer.send(message).await?;
        tracing::info!(to, subject, "Sent notification email");
        Ok(())
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox, NotificationError> {
    address
        .parse()
        .map_err(|_| NotificationError::InvalidAddress(address.to_owned()))
}

fn display_name(user: &User) -> &str {
    if user.name.is_empty() {
        &user.email
    } else {
        &user.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mailbox_parsing() {
        assert!(parse_mailbox("jane@example.com").is_ok());
        assert!(parse_mailbox("not an address").is_err());
    }

    #[tokio::test]
    async fn disabled_notifier_is_a_noop() {
        let notifier = Notifier::new(None).unwrap();
        // No relay configured; send must succeed without doing anything.
        notifier
            .send("jane@example.com", "subject", "body".to_owned())
            .await
            .unwrap();
    }
}
