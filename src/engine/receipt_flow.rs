//! The receipt-retrieval conversation: identity proof, then folder choice.

use super::texts;
use super::Engine;
use recibo_archive::Bucket;
use recibo_core::error::ReciboError;
use recibo_core::state::{ConversationContext, ConversationState};
use recibo_core::validate::{normalize_national_id, parse_issue_date};
use recibo_store::IdentityError;
use tracing::{info, warn};

/// Map a folder-choice reply to a bucket. Only the two button ids are
/// accepted; anything else is rejected in place.
fn parse_folder_choice(text: &str) -> Option<Bucket> {
    match text.trim() {
        "1" => Some(Bucket::Older),
        "2" => Some(Bucket::Recent),
        _ => None,
    }
}

fn folder_label(bucket: Bucket) -> &'static str {
    match bucket {
        Bucket::Recent => "quincena actual",
        Bucket::Older => "quincena anterior",
    }
}

impl Engine {
    /// `AwaitingNationalId`: collect the cédula and check it against the
    /// registry. An unknown id keeps the contact in this state.
    pub(super) async fn on_national_id(&self, phone: &str, text: &str) -> Result<(), ReciboError> {
        let id = match normalize_national_id(text) {
            Ok(id) => id,
            Err(e) => {
                self.send_text(phone, &texts::invalid_national_id(&e.to_string()))
                    .await;
                return Ok(());
            }
        };

        let Some(user) = self.store.find_registered_user(&id).await? else {
            self.send_text(phone, &texts::unknown_national_id(&id)).await;
            return Ok(());
        };

        self.store
            .set_conversation(
                phone,
                Some(ConversationState::AwaitingIssueDate),
                Some(&ConversationContext::NationalId { id }),
            )
            .await?;
        self.send_text(phone, &texts::ask_issue_date(&user.name)).await;
        Ok(())
    }

    /// `AwaitingIssueDate`: parse the date, check the identity claim, and
    /// confirm receipts exist somewhere before offering the folder choice.
    pub(super) async fn on_issue_date(
        &self,
        phone: &str,
        context: Option<&ConversationContext>,
        text: &str,
    ) -> Result<(), ReciboError> {
        let Some(national_id) = context.map(|c| c.national_id().to_string()) else {
            // Context lost (manual db edit, migration gap): restart the flow.
            warn!("contact {phone} awaiting issue date without stored national id");
            self.store
                .set_conversation(phone, Some(ConversationState::AwaitingNationalId), None)
                .await?;
            self.send_text(phone, &texts::ask_national_id()).await;
            return Ok(());
        };

        let date = match parse_issue_date(text) {
            Ok(d) => d,
            Err(e) => {
                self.send_text(phone, &texts::invalid_issue_date(&e.to_string()))
                    .await;
                return Ok(());
            }
        };

        match self.store.validate_identity(&national_id, date).await? {
            Ok(_user) => {}
            Err(IdentityError::NotRegistered) => {
                // Deactivated between the id step and now.
                self.store.set_conversation(phone, None, None).await?;
                self.send_text(phone, &texts::not_registered()).await;
                return Ok(());
            }
            Err(IdentityError::DateMismatch) => {
                // Stay in this state; the contact may have misread the card.
                self.send_text(phone, &texts::date_mismatch()).await;
                return Ok(());
            }
        }

        info!("identity verified for contact {phone}");

        // Offer the folder choice only when something can actually be
        // delivered from at least one bucket.
        let recent = self.repo.find_by_owner(Bucket::Recent, &national_id).await?;
        let older = self.repo.find_by_owner(Bucket::Older, &national_id).await?;
        if recent.is_empty() && older.is_empty() {
            self.store.set_conversation(phone, None, None).await?;
            self.send_text(phone, &texts::no_receipts_anywhere()).await;
            return Ok(());
        }

        self.store
            .set_conversation(
                phone,
                Some(ConversationState::AwaitingFolderChoice),
                Some(&ConversationContext::NationalId { id: national_id }),
            )
            .await?;
        self.send_buttons(
            phone,
            &texts::folder_choice_body(),
            &texts::folder_choice_buttons(),
        )
        .await;
        Ok(())
    }

    /// `AwaitingFolderChoice`: pick a bucket and deliver the first match.
    pub(super) async fn on_folder_choice(
        &self,
        phone: &str,
        context: Option<&ConversationContext>,
        text: &str,
    ) -> Result<(), ReciboError> {
        let Some(national_id) = context.map(|c| c.national_id().to_string()) else {
            warn!("contact {phone} awaiting folder choice without stored national id");
            self.store
                .set_conversation(phone, Some(ConversationState::AwaitingNationalId), None)
                .await?;
            self.send_text(phone, &texts::ask_national_id()).await;
            return Ok(());
        };

        let Some(bucket) = parse_folder_choice(text) else {
            self.send_text(phone, &texts::invalid_folder_choice()).await;
            return Ok(());
        };

        // Scoped to the chosen bucket only; the other is never re-scanned.
        let filenames = self.repo.find_by_owner(bucket, &national_id).await?;
        let Some(filename) = filenames.first() else {
            self.store.set_conversation(phone, None, None).await?;
            self.send_text(phone, &texts::no_receipts(folder_label(bucket)))
                .await;
            return Ok(());
        };

        // The flow is over either way; commit idle before the transfer so
        // a crash mid-send cannot trap the contact in this state.
        self.store.set_conversation(phone, None, None).await?;

        match self.repo.download(bucket, filename).await {
            Ok(local) => {
                self.send_document(phone, &local, filename).await;
                if let Err(e) = tokio::fs::remove_file(&local).await {
                    warn!("failed to remove temp file {}: {e}", local.display());
                }
                info!("delivered {filename} from {bucket} to contact {phone}");
                self.send_text(phone, &texts::receipt_sent()).await;
            }
            Err(e) => {
                warn!("download of {filename} failed: {e}");
                self.send_text(phone, &texts::service_error()).await;
            }
        }
        Ok(())
    }
}
