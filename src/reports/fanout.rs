//! Best-effort delivery of one rendered report to a list of recipients.
//! A failed send is logged and never stops the remaining sends.

use crate::db::reports::AdminRecipient;
use crate::services::mailer::{MailTransport, OutboundEmail};

#[derive(Debug, Default, PartialEq, Eq)]
pub struct FanoutOutcome {
    pub sent: usize,
    pub failed: usize,
}

pub async fn deliver_to_recipients(
    mailer: &dyn MailTransport,
    recipients: &[AdminRecipient],
    subject: &str,
    html: &str,
) -> FanoutOutcome {
    let mut outcome = FanoutOutcome::default();
    for recipient in recipients {
        let mail = OutboundEmail {
            to: recipient.email.clone(),
            subject: subject.to_string(),
            html: html.to_string(),
        };
        match mailer.send(&mail).await {
            Ok(()) => {
                outcome.sent += 1;
                tracing::info!("Report sent to {}", recipient.email);
            }
            Err(e) => {
                outcome.failed += 1;
                tracing::error!("Failed to send report to {}: {}", recipient.email, e);
            }
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::{anyhow, Result};
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    /// Records deliveries and rejects one configured address.
    struct FlakyMailer {
        rejects: String,
        delivered: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl MailTransport for FlakyMailer {
        async fn send(&self, mail: &OutboundEmail) -> Result<()> {
            if mail.to == self.rejects {
                return Err(anyhow!("mailbox unavailable"));
            }
            self.delivered.lock().unwrap().push(mail.to.clone());
            Ok(())
        }
    }

    fn recipient(email: &str) -> AdminRecipient {
        AdminRecipient {
            user_id: Uuid::new_v4(),
            email: email.into(),
            name: "Admin".into(),
        }
    }

    #[tokio::test]
    async fn one_failing_recipient_does_not_abort_the_rest() {
        let mailer = FlakyMailer {
            rejects: "b@school.test".into(),
            delivered: Mutex::new(Vec::new()),
        };
        let recipients = vec![
            recipient("a@school.test"),
            recipient("b@school.test"),
            recipient("c@school.test"),
        ];

        let outcome =
            deliver_to_recipients(&mailer, &recipients, "Daily report", "<p>body</p>").await;

        assert_eq!(outcome, FanoutOutcome { sent: 2, failed: 1 });
        let delivered = mailer.delivered.lock().unwrap();
        assert_eq!(delivered.as_slice(), ["a@school.test", "c@school.test"]);
    }

    #[tokio::test]
    async fn empty_recipient_list_sends_nothing() {
        let mailer = FlakyMailer {
            rejects: String::new(),
            delivered: Mutex::new(Vec::new()),
        };
        let outcome = deliver_to_recipients(&mailer, &[], "Report", "<p></p>").await;
        assert_eq!(outcome, FanoutOutcome { sent: 0, failed: 0 });
        assert!(mailer.delivered.lock().unwrap().is_empty());
    }
}
