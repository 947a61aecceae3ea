//! Inbound message history.

use super::Store;
use recibo_core::error::ReciboError;

impl Store {
    /// Record an inbound message. The WhatsApp message id is the primary
    /// key, so webhook redeliveries are dropped silently.
    pub async fn record_inbound(
        &self,
        message_id: &str,
        phone_number: &str,
        content: &str,
    ) -> Result<(), ReciboError> {
        sqlx::query(
            "INSERT OR IGNORE INTO messages (id, phone_number, content, sender)
             VALUES (?, ?, ?, 'user')",
        )
        .bind(message_id)
        .bind(phone_number)
        .bind(content)
        .execute(&self.pool)
        .await
        .map_err(|e| ReciboError::Store(format!("message insert failed: {e}")))?;
        Ok(())
    }

    /// Count stored inbound messages for one contact.
    pub async fn message_count(&self, phone_number: &str) -> Result<i64, ReciboError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM messages WHERE phone_number = ?")
                .bind(phone_number)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| ReciboError::Store(format!("message count failed: {e}")))?;
        Ok(count)
    }
}
