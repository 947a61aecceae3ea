use crate::{error::ReciboError, event::QuickReplyButton};
use async_trait::async_trait;
use std::path::Path;

/// Messaging gateway — the outbound side of the conversation.
///
/// The production implementation speaks the WhatsApp Cloud API; tests use a
/// recording mock. Failures are returned as errors; callers log and swallow
/// them — a failed send never rolls back a committed dialogue transition.
#[async_trait]
pub trait MessagingGateway: Send + Sync {
    /// Send a plain text message.
    async fn send_text(&self, to: &str, text: &str) -> Result<(), ReciboError>;

    /// Send an interactive message with 1..=3 quick-reply buttons.
    async fn send_quick_reply_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[QuickReplyButton],
    ) -> Result<(), ReciboError>;

    /// Send a document from a local file.
    async fn send_document(
        &self,
        to: &str,
        path: &Path,
        filename: &str,
    ) -> Result<(), ReciboError>;
}

/// Real-time fan-out broadcaster.
///
/// Best-effort, at-most-once per currently connected subscriber. Topics are
/// phone numbers, or `"*"` for everything.
pub trait Broadcaster: Send + Sync {
    fn publish(&self, topic: &str, event: serde_json::Value);
}
