//! Dialogue engine.
//!
//! One inbound event at a time per contact: `handle_event` serializes on a
//! per-phone lock, persists history and state transitions, and routes the
//! message by the contact's stored conversation state.

mod menu;
mod receipt_flow;
pub mod texts;

#[cfg(test)]
mod tests;

use recibo_archive::ReceiptRepository;
use recibo_core::config::CompanyConfig;
use recibo_core::error::ReciboError;
use recibo_core::event::{InboundEvent, QuickReplyButton};
use recibo_core::state::ConversationState;
use recibo_core::traits::{Broadcaster, MessagingGateway};
use recibo_store::Store;
use serde_json::json;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info};

/// Whole-message keywords that abort an in-flight conversation.
const CANCEL_KEYWORDS: &[&str] = &[
    "cancelar", "cancel", "menu", "menú", "volver", "atras", "atrás", "salir", "back", "exit",
    "0",
];

pub struct Engine {
    store: Store,
    repo: Arc<ReceiptRepository>,
    gateway: Arc<dyn MessagingGateway>,
    broadcaster: Arc<dyn Broadcaster>,
    company: CompanyConfig,
    /// Per-contact locks; one transition at a time per phone number.
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl Engine {
    pub fn new(
        store: Store,
        repo: Arc<ReceiptRepository>,
        gateway: Arc<dyn MessagingGateway>,
        broadcaster: Arc<dyn Broadcaster>,
        company: CompanyConfig,
    ) -> Self {
        Self {
            store,
            repo,
            gateway,
            broadcaster,
            company,
            locks: Mutex::new(HashMap::new()),
        }
    }

    async fn contact_lock(&self, phone: &str) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        // A count of 1 means the map holds the only reference: nobody is
        // in a transition for that contact, so the entry can go.
        locks.retain(|_, lock| Arc::strong_count(lock) > 1);
        locks
            .entry(phone.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }

    #[cfg(test)]
    async fn contact_lock_count(&self) -> usize {
        self.locks.lock().await.len()
    }

    /// Process one inbound event end to end.
    pub async fn handle_event(&self, event: InboundEvent) {
        let lock = self.contact_lock(&event.from_phone).await;
        let _guard = lock.lock().await;

        if let Err(e) = self.process(&event).await {
            error!("failed to process message from {}: {e}", event.from_phone);
            self.send_text(&event.from_phone, &texts::service_error())
                .await;
        }
    }

    async fn process(&self, event: &InboundEvent) -> Result<(), ReciboError> {
        let phone = &event.from_phone;

        self.store
            .upsert_contact(phone, event.display_name.as_deref())
            .await?;
        self.store
            .record_inbound(&event.message_id, phone, &event.text)
            .await?;
        self.broadcaster.publish(
            phone,
            json!({
                "direction": "in",
                "phone": phone,
                "text": event.text,
                "timestamp": event.timestamp.to_rfc3339(),
            }),
        );

        let contact = self
            .store
            .get_contact(phone)
            .await?
            .ok_or_else(|| ReciboError::Store(format!("contact {phone} vanished")))?;

        // Cancellation wins over every state, matched as the whole message.
        let lower = event.text.trim().to_lowercase();
        if CANCEL_KEYWORDS.contains(&lower.as_str()) {
            let was_in_flow = contact.state.is_some();
            if was_in_flow {
                self.store.set_conversation(phone, None, None).await?;
                info!("contact {phone} cancelled the conversation");
                self.send_text(phone, &texts::cancelled()).await;
            }
            self.send_text(
                phone,
                &texts::welcome_menu(&self.company, contact.name.as_deref()),
            )
            .await;
            return Ok(());
        }

        match contact.state {
            None => self.handle_idle(&contact, &event.text).await,
            Some(ConversationState::AwaitingNationalId) => {
                self.on_national_id(phone, &event.text).await
            }
            Some(ConversationState::AwaitingIssueDate) => {
                self.on_issue_date(phone, contact.context.as_ref(), &event.text)
                    .await
            }
            Some(ConversationState::AwaitingFolderChoice) => {
                self.on_folder_choice(phone, contact.context.as_ref(), &event.text)
                    .await
            }
        }
    }

    /// Send a text reply. Failures are logged, never propagated: a lost
    /// reply must not roll back the committed transition.
    pub(crate) async fn send_text(&self, to: &str, text: &str) {
        if let Err(e) = self.gateway.send_text(to, text).await {
            error!("send to {to} failed: {e}");
            return;
        }
        self.mirror_outbound(to, text);
    }

    async fn send_buttons(&self, to: &str, body: &str, buttons: &[QuickReplyButton]) {
        if let Err(e) = self.gateway.send_quick_reply_buttons(to, body, buttons).await {
            error!("interactive send to {to} failed: {e}");
            return;
        }
        self.mirror_outbound(to, body);
    }

    async fn send_document(&self, to: &str, path: &Path, filename: &str) {
        if let Err(e) = self.gateway.send_document(to, path, filename).await {
            error!("document send to {to} failed: {e}");
            return;
        }
        self.mirror_outbound(to, &format!("[documento] {filename}"));
    }

    fn mirror_outbound(&self, to: &str, text: &str) {
        self.broadcaster.publish(
            to,
            json!({
                "direction": "out",
                "phone": to,
                "text": text,
            }),
        );
    }
}
