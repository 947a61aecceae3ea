//! Row types returned by the store.

use chrono::NaiveDate;
use recibo_core::state::{ConversationContext, ConversationState};

/// A WhatsApp contact the bot has exchanged messages with.
#[derive(Debug, Clone)]
pub struct Contact {
    pub phone_number: String,
    pub name: Option<String>,
    pub is_active: bool,
    pub state: Option<ConversationState>,
    pub context: Option<ConversationContext>,
}

/// An employee entitled to retrieve receipts.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    pub national_id: String,
    pub name: String,
    pub issue_date: NaiveDate,
    pub is_active: bool,
}
