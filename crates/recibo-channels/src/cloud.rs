//! WhatsApp Cloud API gateway.
//!
//! Sends via `POST /{phone_number_id}/messages`; documents are uploaded to
//! `/{phone_number_id}/media` first, then referenced by media id.

use async_trait::async_trait;
use recibo_core::config::WhatsAppConfig;
use recibo_core::error::ReciboError;
use recibo_core::event::QuickReplyButton;
use recibo_core::traits::MessagingGateway;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{debug, info};

/// Cloud API caps interactive messages at three buttons with short titles.
const MAX_BUTTONS: usize = 3;
const MAX_BUTTON_TITLE: usize = 20;

pub struct CloudApiGateway {
    client: reqwest::Client,
    api_base: String,
    access_token: String,
    phone_number_id: String,
}

impl CloudApiGateway {
    pub fn new(config: &WhatsAppConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            access_token: config.access_token.clone(),
            phone_number_id: config.phone_number_id.clone(),
        }
    }

    async fn post_message(&self, payload: Value) -> Result<(), ReciboError> {
        let url = format!("{}/{}/messages", self.api_base, self.phone_number_id);
        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| ReciboError::Channel(format!("whatsapp send failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ReciboError::Channel(format!(
                "whatsapp API error {status}: {body}"
            )));
        }
        debug!("message delivered to cloud API");
        Ok(())
    }

    /// Upload a local file, returning the media id to reference it by.
    async fn upload_media(&self, path: &Path) -> Result<String, ReciboError> {
        let url = format!("{}/{}/media", self.api_base, self.phone_number_id);
        let data = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document.pdf".to_string());

        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename)
            .mime_str("application/pdf")
            .map_err(|e| ReciboError::Channel(format!("invalid mime: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("messaging_product", "whatsapp")
            .part("file", part);

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ReciboError::Channel(format!("media upload failed: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(ReciboError::Channel(format!(
                "media upload error {status}: {body}"
            )));
        }

        let body: Value = resp
            .json()
            .await
            .map_err(|e| ReciboError::Channel(format!("media upload parse failed: {e}")))?;
        body["id"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| ReciboError::Channel("media upload returned no id".to_string()))
    }
}

pub fn text_payload(to: &str, text: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "text",
        "text": { "body": text },
    })
}

pub fn buttons_payload(
    to: &str,
    body: &str,
    buttons: &[QuickReplyButton],
) -> Result<Value, ReciboError> {
    if buttons.is_empty() || buttons.len() > MAX_BUTTONS {
        return Err(ReciboError::Channel(format!(
            "interactive message needs 1-{MAX_BUTTONS} buttons, got {}",
            buttons.len()
        )));
    }
    for b in buttons {
        if b.title.chars().count() > MAX_BUTTON_TITLE {
            return Err(ReciboError::Channel(format!(
                "button title '{}' exceeds {MAX_BUTTON_TITLE} chars",
                b.title
            )));
        }
    }

    let actions: Vec<Value> = buttons
        .iter()
        .map(|b| {
            json!({
                "type": "reply",
                "reply": { "id": b.id, "title": b.title },
            })
        })
        .collect();

    Ok(json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "interactive",
        "interactive": {
            "type": "button",
            "body": { "text": body },
            "action": { "buttons": actions },
        },
    }))
}

pub fn document_payload(to: &str, media_id: &str, filename: &str) -> Value {
    json!({
        "messaging_product": "whatsapp",
        "recipient_type": "individual",
        "to": to,
        "type": "document",
        "document": { "id": media_id, "filename": filename },
    })
}

#[async_trait]
impl MessagingGateway for CloudApiGateway {
    async fn send_text(&self, to: &str, text: &str) -> Result<(), ReciboError> {
        self.post_message(text_payload(to, text)).await
    }

    async fn send_quick_reply_buttons(
        &self,
        to: &str,
        body: &str,
        buttons: &[QuickReplyButton],
    ) -> Result<(), ReciboError> {
        self.post_message(buttons_payload(to, body, buttons)?).await
    }

    async fn send_document(
        &self,
        to: &str,
        path: &Path,
        filename: &str,
    ) -> Result<(), ReciboError> {
        let media_id = self.upload_media(path).await?;
        info!("sending document {filename} (media {media_id})");
        self.post_message(document_payload(to, &media_id, filename))
            .await
    }
}
