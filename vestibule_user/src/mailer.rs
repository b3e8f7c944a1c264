//! Outbound Notification Seam
//!
//! The lifecycle manager renders every message itself (see
//! [`crate::templates`]) and hands fully-formed text to a [`Mailer`]. The
//! transport is a black box: SMTP relays, HTTP mail APIs, and queues all sit
//! behind the same call.
//!
//! # Important Notes
//!
//! * Delivery failures propagate to the caller untouched; the manager does
//!   not retry and never rolls back persisted state on a failed send
//! * Subjects are single-line by the time they reach `send`

use crate::misc::AccountError;
use async_trait::async_trait;
use parking_lot::Mutex;

/// A fully rendered outbound message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub subject: String,
    pub body: String,
}

#[async_trait]
pub trait Mailer: Send + Sync + 'static {
    /// Delivers one message to every address in `to`
    async fn send(
        &self,
        subject: &str,
        body: &str,
        from: &str,
        to: &[String],
    ) -> Result<(), AccountError>;
}

/// One captured message, as handed to [`MemoryMailer::send`]
#[derive(Debug, Clone)]
pub struct OutboundMail {
    pub subject: String,
    pub body: String,
    pub from: String,
    pub to: Vec<String>,
}

/// Captures outbound mail instead of delivering it. Useful for tests and
/// local development.
#[derive(Default)]
pub struct MemoryMailer {
    outbox: Mutex<Vec<OutboundMail>>,
}

impl MemoryMailer {
    /// Clones the captured messages, oldest first
    pub fn sent(&self) -> Vec<OutboundMail> {
        self.outbox.lock().clone()
    }

    /// Drains the captured messages
    pub fn take(&self) -> Vec<OutboundMail> {
        std::mem::take(&mut *self.outbox.lock())
    }

    pub fn count(&self) -> usize {
        self.outbox.lock().len()
    }
}

#[async_trait]
impl Mailer for MemoryMailer {
    async fn send(
        &self,
        subject: &str,
        body: &str,
        from: &str,
        to: &[String],
    ) -> Result<(), AccountError> {
        self.outbox.lock().push(OutboundMail {
            subject: subject.to_string(),
            body: body.to_string(),
            from: from.to_string(),
            to: to.to_vec(),
        });
        Ok(())
    }
}
