use serde::{Deserialize, Serialize};

/// Conversation state persisted on the contact row.
///
/// `Idle` is represented as NULL in the store, so this enum only covers the
/// in-flight receipt-retrieval states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    AwaitingNationalId,
    AwaitingIssueDate,
    AwaitingFolderChoice,
}

impl ConversationState {
    /// Stable text form used as the database column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AwaitingNationalId => "awaiting_national_id",
            Self::AwaitingIssueDate => "awaiting_issue_date",
            Self::AwaitingFolderChoice => "awaiting_folder_choice",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "awaiting_national_id" => Some(Self::AwaitingNationalId),
            "awaiting_issue_date" => Some(Self::AwaitingIssueDate),
            "awaiting_folder_choice" => Some(Self::AwaitingFolderChoice),
            _ => None,
        }
    }
}

/// Per-contact scratch data, valid only while a non-idle state is active.
///
/// Serialized to JSON at the persistence boundary; the store clears it
/// whenever the state returns to idle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ConversationContext {
    /// The national id collected in `AwaitingNationalId`.
    NationalId { id: String },
}

impl ConversationContext {
    pub fn national_id(&self) -> &str {
        match self {
            Self::NationalId { id } => id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_roundtrip() {
        for state in [
            ConversationState::AwaitingNationalId,
            ConversationState::AwaitingIssueDate,
            ConversationState::AwaitingFolderChoice,
        ] {
            assert_eq!(ConversationState::parse(state.as_str()), Some(state));
        }
        assert_eq!(ConversationState::parse("waiting_cedula"), None);
    }

    #[test]
    fn context_serializes_tagged() {
        let ctx = ConversationContext::NationalId {
            id: "1001234567".to_string(),
        };
        let json = serde_json::to_string(&ctx).unwrap();
        assert!(json.contains("national_id"));
        let back: ConversationContext = serde_json::from_str(&json).unwrap();
        assert_eq!(back.national_id(), "1001234567");
    }
}
