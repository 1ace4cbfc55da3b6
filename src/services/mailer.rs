//! Outbound email delivery. Reports are posted as JSON to an HTTP mail API
//! (MAIL_API_URL + MAIL_API_TOKEN); without configuration the transport
//! degrades to a tracing-only sink so development setups keep working.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct OutboundEmail {
    pub to: String,
    pub subject: String,
    pub html: String,
}

#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, mail: &OutboundEmail) -> Result<()>;
}

pub struct HttpMailer {
    client: reqwest::Client,
    api_url: String,
    api_token: String,
    from: String,
}

impl HttpMailer {
    pub fn new(api_url: String, api_token: String, from: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url,
            api_token,
            from,
        }
    }

    fn payload(&self, mail: &OutboundEmail) -> serde_json::Value {
        serde_json::json!({
            "from": self.from,
            "to": [mail.to],
            "subject": mail.subject,
            "html": mail.html,
        })
    }
}

#[async_trait]
impl MailTransport for HttpMailer {
    async fn send(&self, mail: &OutboundEmail) -> Result<()> {
        let response = self
            .client
            .post(&self.api_url)
            .bearer_auth(&self.api_token)
            .json(&self.payload(mail))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("mail API returned {status}: {body}"));
        }
        tracing::debug!("Mail accepted for {}: {}", mail.to, mail.subject);
        Ok(())
    }
}

/// Development transport: logs the delivery instead of sending it.
pub struct LogMailer;

#[async_trait]
impl MailTransport for LogMailer {
    async fn send(&self, mail: &OutboundEmail) -> Result<()> {
        tracing::info!(
            "LogMailer: would send '{}' to {} ({} bytes of HTML)",
            mail.subject,
            mail.to,
            mail.html.len()
        );
        Ok(())
    }
}

/// Pick the transport from the environment. MAIL_FROM defaults to a
/// placeholder sender when only the API settings are present.
pub fn from_env() -> Arc<dyn MailTransport> {
    match (std::env::var("MAIL_API_URL"), std::env::var("MAIL_API_TOKEN")) {
        (Ok(url), Ok(token)) => {
            let from = std::env::var("MAIL_FROM")
                .unwrap_or_else(|_| "reports@quizdesk.local".to_string());
            tracing::info!("Using HTTP mail transport via {}", url);
            Arc::new(HttpMailer::new(url, token, from))
        }
        _ => {
            tracing::warn!("MAIL_API_URL/MAIL_API_TOKEN not set, emails will only be logged");
            Arc::new(LogMailer)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payload_carries_sender_and_recipient() {
        let mailer = HttpMailer::new(
            "https://mail.example/api/send".into(),
            "token".into(),
            "reports@school.test".into(),
        );
        let mail = OutboundEmail {
            to: "admin@school.test".into(),
            subject: "Daily report".into(),
            html: "<p>hi</p>".into(),
        };
        let payload = mailer.payload(&mail);
        assert_eq!(payload["from"], "reports@school.test");
        assert_eq!(payload["to"][0], "admin@school.test");
        assert_eq!(payload["subject"], "Daily report");
        assert_eq!(payload["html"], "<p>hi</p>");
    }

    #[tokio::test]
    async fn log_mailer_always_succeeds() {
        let mail = OutboundEmail {
            to: "admin@school.test".into(),
            subject: "s".into(),
            html: "h".into(),
        };
        assert!(LogMailer.send(&mail).await.is_ok());
    }
}
