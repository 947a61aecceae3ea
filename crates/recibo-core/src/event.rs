use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A decoded inbound message from the webhook receiver.
///
/// Only text-bearing events reach the dialogue engine; button replies carry
/// the pressed button id as their text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundEvent {
    /// Provider message id (used for history dedup on redelivery).
    pub message_id: String,
    /// Sender phone number — the contact primary key.
    pub from_phone: String,
    /// Profile name the provider attached to the message, if any.
    pub display_name: Option<String>,
    /// Message text, or the quick-reply button id that was pressed.
    pub text: String,
    pub timestamp: DateTime<Utc>,
}

/// A quick-reply button on an interactive message.
///
/// The Cloud API allows 1 to 3 buttons with titles up to 20 characters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuickReplyButton {
    pub id: String,
    pub title: String,
}

impl QuickReplyButton {
    pub fn new(id: &str, title: &str) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
        }
    }
}
