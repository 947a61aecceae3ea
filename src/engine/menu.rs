//! Idle-state menu routing.

use super::texts;
use super::Engine;
use recibo_core::error::ReciboError;
use recibo_core::state::ConversationState;
use recibo_store::Contact;

/// Menu options a contact can pick from the idle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MenuOption {
    ContactLines,
    Receipt,
    Mood,
    Pqrs,
    DataPolicy,
    Unsubscribe,
}

/// Map a message to a menu option: exact digit first, then keywords.
fn parse_option(text: &str) -> Option<MenuOption> {
    let lower = text.trim().to_lowercase();
    match lower.as_str() {
        "1" => return Some(MenuOption::ContactLines),
        "2" => return Some(MenuOption::Receipt),
        "3" => return Some(MenuOption::Mood),
        "4" => return Some(MenuOption::Pqrs),
        "5" => return Some(MenuOption::DataPolicy),
        "6" => return Some(MenuOption::Unsubscribe),
        _ => {}
    }

    const KEYWORDS: &[(&str, MenuOption)] = &[
        ("linea", MenuOption::ContactLines),
        ("línea", MenuOption::ContactLines),
        ("contacto", MenuOption::ContactLines),
        ("recibo", MenuOption::Receipt),
        ("nomina", MenuOption::Receipt),
        ("nómina", MenuOption::Receipt),
        ("desprendible", MenuOption::Receipt),
        ("animo", MenuOption::Mood),
        ("ánimo", MenuOption::Mood),
        ("pqrs", MenuOption::Pqrs),
        ("queja", MenuOption::Pqrs),
        ("datos", MenuOption::DataPolicy),
        ("politica", MenuOption::DataPolicy),
        ("política", MenuOption::DataPolicy),
        ("baja", MenuOption::Unsubscribe),
    ];
    KEYWORDS
        .iter()
        .find(|(kw, _)| lower.contains(kw))
        .map(|(_, opt)| *opt)
}

impl Engine {
    /// Handle a message from a contact with no conversation in flight.
    pub(super) async fn handle_idle(
        &self,
        contact: &Contact,
        text: &str,
    ) -> Result<(), ReciboError> {
        let phone = &contact.phone_number;
        match parse_option(text) {
            Some(MenuOption::ContactLines) => {
                self.send_text(phone, &texts::contact_lines(&self.company)).await;
            }
            Some(MenuOption::Receipt) => {
                // Persist the transition before prompting, so a crash
                // between the two never leaves the contact mid-flow
                // without a stored state.
                self.store
                    .set_conversation(phone, Some(ConversationState::AwaitingNationalId), None)
                    .await?;
                self.send_text(phone, &texts::ask_national_id()).await;
            }
            Some(MenuOption::Mood) => {
                self.send_text(phone, &texts::mood_unavailable()).await;
            }
            Some(MenuOption::Pqrs) => {
                self.send_text(phone, &texts::pqrs(&self.company)).await;
            }
            Some(MenuOption::DataPolicy) => {
                self.send_text(phone, &texts::data_policy(&self.company)).await;
            }
            Some(MenuOption::Unsubscribe) => {
                self.store.set_active(phone, false).await?;
                self.send_text(phone, &texts::unsubscribed()).await;
            }
            None => {
                self.send_text(
                    phone,
                    &texts::welcome_menu(&self.company, contact.name.as_deref()),
                )
                .await;
            }
        }
        Ok(())
    }
}
