//! Outbound email seam.
//!
//! Verification and reset links leave the service through [`Mailer`]. The
//! default implementation only logs; deployments wire a real provider in.

use async_trait::async_trait;
use tracing::info;

#[derive(Clone, Debug)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()>;
}

/// Logs outbound mail instead of delivering it.
#[derive(Clone, Debug, Default)]
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
        info!(
            to = %message.to,
            subject = %message.subject,
            body = %message.body,
            "outbound email"
        );
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::{MailMessage, Mailer};
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Captures outbound mail so tests can pull tokens out of the links.
    #[derive(Default)]
    pub(crate) struct RecordingMailer {
        sent: Mutex<Vec<MailMessage>>,
    }

    impl RecordingMailer {
        pub(crate) fn sent(&self) -> Vec<MailMessage> {
            self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
        }

        /// Extract the `token=` fragment from the last message sent.
        pub(crate) fn last_token(&self) -> Option<String> {
            let sent = self.sent();
            let body = &sent.last()?.body;
            let (_, token) = body.split_once("#token=")?;
            let token = token.split_whitespace().next()?;
            Some(token.to_string())
        }
    }

    #[async_trait]
    impl Mailer for RecordingMailer {
        async fn send(&self, message: MailMessage) -> anyhow::Result<()> {
            if let Ok(mut sent) = self.sent.lock() {
                sent.push(message);
            }
            Ok(())
        }
    }
}
