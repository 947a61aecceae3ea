//! Webhook payload decoding.
//!
//! Meta delivers message events wrapped in entry/change envelopes. Only
//! text messages and quick-reply button presses become [`InboundEvent`]s;
//! media, reactions, and delivery statuses are dropped.

use chrono::{DateTime, Utc};
use recibo_core::event::InboundEvent;
use serde::Deserialize;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    #[serde(default)]
    entry: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    changes: Vec<Change>,
}

#[derive(Debug, Deserialize)]
struct Change {
    value: ChangeValue,
}

#[derive(Debug, Deserialize)]
struct ChangeValue {
    #[serde(default)]
    contacts: Vec<WaContact>,
    #[serde(default)]
    messages: Vec<WaMessage>,
}

#[derive(Debug, Deserialize)]
struct WaContact {
    wa_id: String,
    profile: Option<WaProfile>,
}

#[derive(Debug, Deserialize)]
struct WaProfile {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WaMessage {
    id: String,
    from: String,
    timestamp: Option<String>,
    text: Option<WaText>,
    interactive: Option<WaInteractive>,
}

#[derive(Debug, Deserialize)]
struct WaText {
    body: String,
}

#[derive(Debug, Deserialize)]
struct WaInteractive {
    button_reply: Option<WaButtonReply>,
}

#[derive(Debug, Deserialize)]
struct WaButtonReply {
    id: String,
}

/// Decode a webhook body into inbound events. Unparseable payloads and
/// non-text messages yield nothing; the webhook must always answer 200.
pub fn decode_events(payload: &serde_json::Value) -> Vec<InboundEvent> {
    let parsed: WebhookPayload = match serde_json::from_value(payload.clone()) {
        Ok(p) => p,
        Err(e) => {
            warn!("unparseable webhook payload: {e}");
            return Vec::new();
        }
    };

    let mut events = Vec::new();
    for entry in parsed.entry {
        for change in entry.changes {
            let value = change.value;
            for msg in value.messages {
                let text = if let Some(t) = &msg.text {
                    t.body.clone()
                } else if let Some(reply) =
                    msg.interactive.as_ref().and_then(|i| i.button_reply.as_ref())
                {
                    reply.id.clone()
                } else {
                    debug!("dropping non-text message {}", msg.id);
                    continue;
                };

                let display_name = value
                    .contacts
                    .iter()
                    .find(|c| c.wa_id == msg.from)
                    .and_then(|c| c.profile.as_ref())
                    .and_then(|p| p.name.clone());

                let timestamp = msg
                    .timestamp
                    .as_deref()
                    .and_then(|s| s.parse::<i64>().ok())
                    .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
                    .unwrap_or_else(Utc::now);

                events.push(InboundEvent {
                    message_id: msg.id,
                    from_phone: msg.from,
                    display_name,
                    text,
                    timestamp,
                });
            }
        }
    }
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text_payload() -> serde_json::Value {
        json!({
            "object": "whatsapp_business_account",
            "entry": [{
                "id": "123",
                "changes": [{
                    "field": "messages",
                    "value": {
                        "messaging_product": "whatsapp",
                        "contacts": [{
                            "wa_id": "573001112233",
                            "profile": { "name": "Ana" }
                        }],
                        "messages": [{
                            "id": "wamid.abc",
                            "from": "573001112233",
                            "timestamp": "1717243200",
                            "type": "text",
                            "text": { "body": "hola" }
                        }]
                    }
                }]
            }]
        })
    }

    #[test]
    fn decodes_text_message() {
        let events = decode_events(&text_payload());
        assert_eq!(events.len(), 1);
        let e = &events[0];
        assert_eq!(e.message_id, "wamid.abc");
        assert_eq!(e.from_phone, "573001112233");
        assert_eq!(e.display_name.as_deref(), Some("Ana"));
        assert_eq!(e.text, "hola");
        assert_eq!(e.timestamp.timestamp(), 1717243200);
    }

    #[test]
    fn decodes_button_reply_as_id() {
        let payload = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "messages": [{
                            "id": "wamid.btn",
                            "from": "573001112233",
                            "type": "interactive",
                            "interactive": {
                                "type": "button_reply",
                                "button_reply": { "id": "2", "title": "Quincena actual" }
                            }
                        }]
                    }
                }]
            }]
        });
        let events = decode_events(&payload);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].text, "2");
        assert!(events[0].display_name.is_none());
    }

    #[test]
    fn drops_status_and_media_payloads() {
        let statuses = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "statuses": [{ "id": "wamid.x", "status": "delivered" }]
                    }
                }]
            }]
        });
        assert!(decode_events(&statuses).is_empty());

        let media = json!({
            "entry": [{
                "changes": [{
                    "value": {
                        "messages": [{
                            "id": "wamid.img",
                            "from": "573001112233",
                            "type": "image",
                            "image": { "id": "MEDIA" }
                        }]
                    }
                }]
            }]
        });
        assert!(decode_events(&media).is_empty());
    }

    #[test]
    fn garbage_payload_yields_nothing() {
        assert!(decode_events(&json!("not an object")).is_empty());
        assert!(decode_events(&json!({})).is_empty());
    }
}
