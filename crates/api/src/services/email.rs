//! Outbound email for shop notifications.
//!
//! Supports two providers:
//! - `console`: Logs emails (development)
//! - `sendgrid`: Uses the SendGrid v3 API

use crate::config::EmailConfig;
use domain::models::SendNotificationRequest;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, error, info};

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// Errors that can occur during email operations.
#[derive(Debug, Error)]
pub enum EmailError {
    #[error("Email service not configured")]
    NotConfigured,

    #[error("Failed to send email: {0}")]
    SendFailed(String),

    #[error("Provider error: {0}")]
    ProviderError(String),
}

/// Email message to be sent.
#[derive(Debug, Clone)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body_text: String,
}

/// Email service for shop notifications.
#[derive(Clone)]
pub struct EmailService {
    config: Arc<EmailConfig>,
    client: reqwest::Client,
}

impl EmailService {
    pub fn new(config: EmailConfig) -> Self {
        Self {
            config: Arc::new(config),
            client: reqwest::Client::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.enabled
    }

    /// Send an email message. A disabled service drops the message.
    pub async fn send(&self, message: EmailMessage) -> Result<(), EmailError> {
        if !self.config.enabled {
            debug!(
                to = %message.to,
                subject = %message.subject,
                "Email service disabled, skipping send"
            );
            return Ok(());
        }

        match self.config.provider.as_str() {
            "console" => self.send_console(message),
            "sendgrid" => self.send_sendgrid(message).await,
            provider => {
                error!(provider = %provider, "Unknown email provider");
                Err(EmailError::NotConfigured)
            }
        }
    }

    /// Sends a customer notification with its category subject.
    pub async fn send_notification(&self, request: &SendNotificationRequest) -> Result<(), EmailError> {
        self.send(EmailMessage {
            to: request.to.clone(),
            subject: request.full_subject(),
            body_text: format!(
                "{}\n\n{}",
                request.message, self.config.sender_name
            ),
        })
        .await
    }

    fn send_console(&self, message: EmailMessage) -> Result<(), EmailError> {
        info!(
            to = %message.to,
            subject = %message.subject,
            from = %self.config.sender_email,
            from_name = %self.config.sender_name,
            "Email (console provider)"
        );
        info!(body_text = %message.body_text, "Email body");
        Ok(())
    }

    fn sendgrid_body(&self, message: &EmailMessage) -> serde_json::Value {
        serde_json::json!({
            "personalizations": [{
                "to": [{ "email": message.to }]
            }],
            "from": {
                "email": self.config.sender_email,
                "name": self.config.sender_name
            },
            "subject": message.subject,
            "content": [{
                "type": "text/plain",
                "value": message.body_text
            }]
        })
    }

    async fn send_sendgrid(&self, message: EmailMessage) -> Result<(), EmailError> {
        if self.config.sendgrid_api_key.is_empty() {
            return Err(EmailError::NotConfigured);
        }

        let response = self
            .client
            .post(SENDGRID_URL)
            .bearer_auth(&self.config.sendgrid_api_key)
            .json(&self.sendgrid_body(&message))
            .send()
            .await
            .map_err(|e| EmailError::SendFailed(format!("SendGrid request failed: {}", e)))?;

        if response.status().is_success() {
            info!(to = %message.to, subject = %message.subject, "Email sent via SendGrid");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            error!(status = %status, body = %body, "SendGrid API error");
            Err(EmailError::ProviderError(format!(
                "SendGrid returned {}: {}",
                status, body
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::models::invitation::NotificationCategory;

    fn config(enabled: bool, provider: &str) -> EmailConfig {
        EmailConfig {
            enabled,
            provider: provider.to_string(),
            ..EmailConfig::default()
        }
    }

    fn message() -> EmailMessage {
        EmailMessage {
            to: "driver@example.com".to_string(),
            subject: "Your vehicle is ready".to_string(),
            body_text: "Come pick it up".to_string(),
        }
    }

    #[test]
    fn test_disabled_service_skips() {
        let service = EmailService::new(config(false, "sendgrid"));
        assert!(!service.is_enabled());
        assert!(tokio_test::block_on(service.send(message())).is_ok());
    }

    #[test]
    fn test_console_provider() {
        let service = EmailService::new(config(true, "console"));
        assert!(tokio_test::block_on(service.send(message())).is_ok());
    }

    #[tokio::test]
    async fn test_unknown_provider() {
        let service = EmailService::new(config(true, "pigeon"));
        assert!(matches!(
            service.send(message()).await,
            Err(EmailError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_sendgrid_requires_key() {
        let service = EmailService::new(config(true, "sendgrid"));
        assert!(matches!(
            service.send(message()).await,
            Err(EmailError::NotConfigured)
        ));
    }

    #[tokio::test]
    async fn test_notification_uses_category_subject() {
        let service = EmailService::new(config(true, "console"));
        let request = SendNotificationRequest {
            to: "driver@example.com".to_string(),
            subject: "Brake job".to_string(),
            message: "Estimate attached".to_string(),
            category: NotificationCategory::EstimateReady,
        };
        assert!(service.send_notification(&request).await.is_ok());
    }

    #[test]
    fn test_sendgrid_body_shape() {
        let service = EmailService::new(config(true, "sendgrid"));
        let body = service.sendgrid_body(&message());
        assert_eq!(body["personalizations"][0]["to"][0]["email"], "driver@example.com");
        assert_eq!(body["content"][0]["type"], "text/plain");
    }
}
