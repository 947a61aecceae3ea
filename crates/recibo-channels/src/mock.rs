//! Recording gateway for tests.

use async_trait::async_trait;
use recibo_core::error::ReciboError;
use recibo_core::event::QuickReplyButton;
use recibo_core::traits::MessagingGateway;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// What the engine asked the gateway to send, in order.
#[derive(Debug, Clone, PartialEq)]
pub enum SentMessage {
    Text { to: String, text: String },
    Buttons {
        to: String,
        body: String,
        button_ids: Vec<String>,
    },
    Document {
        to: String,
        path: PathBuf,
        filename: String,
    },
}

/// Gateway that records every send instead of talking to the network.
#[derive(Default)]
pub struct MockGateway {
    sent: Mutex<Vec<SentMessage>>,
    fail_sends: Mutex<bool>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail.
    pub fn set_fail_sends(&self, fail: bool) {
        *self.lock_fail() = fail;
    }

    pub fn sent(&self) -> Vec<SentMessage> {
        self.lock_sent().clone()
    }

    /// Concatenated text bodies, for substring assertions.
    pub fn sent_texts(&self) -> Vec<String> {
        self.lock_sent()
            .iter()
            .filter_map(|m| match m {
                SentMessage::Text { text, .. } => Some(text.clone()),
                SentMessage::Buttons { body, .. } => Some(body.clone()),
                SentMessage::Document { .. } => None,
            })
            .collect()
    }

    fn lock_sent(&self) -> std::sync::MutexGuard<'_, Vec<SentMessage>> {
        match self.sent.lock() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        }
    }

    fn lock_fail(&self) -> std::sync::MutexGuard<'_, bool> {
        match self.fail_sends.lock() {
            Ok(g) => g,
            Err(p) => p.into_inner(),
        }
    }

    fn record(&self, message: SentMessage) -> Result<(), ReciboError> {
        if *self.lock_fail() {
            return Err(ReciboError::Channel("mock send failure".to_string()));
        }
        self.lock_sent().push(message);
        Ok(())
    }
}

#[async_trait]
impl MessagingGateway for MockGateway {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), ReciboError> {
        self.record(SentMessage::Text {
            to: to.to_string(),
            text: text.to_string(),
        })
    }

    async fn send_quick_reply_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[QuickReplyButton],
    ) -> Result<(), ReciboError> {
        self.record(SentMessage::Buttons {
            to: to.to_string(),
            body: body.to_string(),
            button_ids: buttons.iter().map(|b| b.id.clone()).collect(),
        })
    }

    async fn send_document(
        &self,
        to: &str,
        path: &Path,
        filename: &str,
    ) -> Result<(), ReciboError> {
        self.record(SentMessage::Document {
            to: to.to_string(),
            path: path.to_path_buf(),
            filename: filename.to_string(),
        })
    }
}
