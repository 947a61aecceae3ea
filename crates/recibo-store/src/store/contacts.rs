//! Contact upsert and conversation state transitions.

use super::Store;
use crate::models::Contact;
use recibo_core::error::ReciboError;
use recibo_core::state::{ConversationContext, ConversationState};

impl Store {
    /// Create or refresh a contact. An existing name is kept when the
    /// incoming event carries none; `last_interaction` always advances.
    pub async fn upsert_contact(
        &self,
        phone_number: &str,
        name: Option<&str>,
    ) -> Result<(), ReciboError> {
        sqlx::query(
            "INSERT INTO contacts (phone_number, name) VALUES (?, ?)
             ON CONFLICT(phone_number) DO UPDATE SET
                 name = COALESCE(excluded.name, contacts.name),
                 last_interaction = datetime('now')",
        )
        .bind(phone_number)
        .bind(name)
        .execute(&self.pool)
        .await
        .map_err(|e| ReciboError::Store(format!("contact upsert failed: {e}")))?;
        Ok(())
    }

    /// Look up a contact by phone number.
    pub async fn get_contact(&self, phone_number: &str) -> Result<Option<Contact>, ReciboError> {
        let row: Option<(String, Option<String>, i64, Option<String>, Option<String>)> =
            sqlx::query_as(
                "SELECT phone_number, name, is_active, conversation_state, conversation_context
                 FROM contacts WHERE phone_number = ?",
            )
            .bind(phone_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| ReciboError::Store(format!("contact lookup failed: {e}")))?;

        let Some((phone_number, name, is_active, state, context)) = row else {
            return Ok(None);
        };

        let state = state.as_deref().and_then(ConversationState::parse);
        let context = match context {
            Some(raw) => Some(serde_json::from_str::<ConversationContext>(&raw)?),
            None => None,
        };

        Ok(Some(Contact {
            phone_number,
            name,
            is_active: is_active != 0,
            state,
            context,
        }))
    }

    /// Persist a conversation transition. Clearing the state always clears
    /// the context with it, so an idle contact never carries stale data.
    pub async fn set_conversation(
        &self,
        phone_number: &str,
        state: Option<ConversationState>,
        context: Option<&ConversationContext>,
    ) -> Result<(), ReciboError> {
        let context_json = match (&state, context) {
            (Some(_), Some(ctx)) => Some(serde_json::to_string(ctx)?),
            _ => None,
        };

        sqlx::query(
            "UPDATE contacts SET conversation_state = ?, conversation_context = ?,
                 last_interaction = datetime('now')
             WHERE phone_number = ?",
        )
        .bind(state.map(|s| s.as_str()))
        .bind(context_json)
        .bind(phone_number)
        .execute(&self.pool)
        .await
        .map_err(|e| ReciboError::Store(format!("conversation update failed: {e}")))?;
        Ok(())
    }

    /// Flag a contact as subscribed or unsubscribed.
    pub async fn set_active(&self, phone_number: &str, active: bool) -> Result<(), ReciboError> {
        sqlx::query("UPDATE contacts SET is_active = ? WHERE phone_number = ?")
            .bind(active as i64)
            .bind(phone_number)
            .execute(&self.pool)
            .await
            .map_err(|e| ReciboError::Store(format!("contact update failed: {e}")))?;
        Ok(())
    }
}
