//! Webhook receiver.
//!
//! Meta calls `GET /webhook` once with a verification handshake, then
//! `POST /webhook` for every delivery. The POST handler acknowledges
//! immediately and processes events in the background — a slow archive
//! must never make Meta retry and redeliver.

use crate::engine::Engine;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use recibo_channels::decode_events;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
struct AppState {
    engine: Arc<Engine>,
    verify_token: String,
}

pub fn router(engine: Arc<Engine>, verify_token: &str) -> Router {
    let state = AppState {
        engine,
        verify_token: verify_token.to_string(),
    };

    Router::new()
        .route("/webhook", get(verify))
        .route("/webhook", post(receive))
        .with_state(state)
}

/// Subscription handshake: echo the challenge iff the token matches.
async fn verify(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<String, StatusCode> {
    let mode = params.get("hub.mode").map(String::as_str);
    let token = params.get("hub.verify_token").map(String::as_str);
    let challenge = params.get("hub.challenge");

    match (mode, token, challenge) {
        (Some("subscribe"), Some(token), Some(challenge))
            if token == state.verify_token && !state.verify_token.is_empty() =>
        {
            info!("webhook verification handshake accepted");
            Ok(challenge.clone())
        }
        _ => {
            warn!("webhook verification rejected");
            Err(StatusCode::FORBIDDEN)
        }
    }
}

/// Delivery endpoint. Always answers 200; a non-2xx here would make Meta
/// retry the same payload against us.
async fn receive(State(state): State<AppState>, Json(payload): Json<Value>) -> StatusCode {
    let events = decode_events(&payload);
    debug!("webhook delivered {} event(s)", events.len());

    for event in events {
        let engine = Arc::clone(&state.engine);
        tokio::spawn(async move {
            engine.handle_event(event).await;
        });
    }

    StatusCode::OK
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::broadcast::NullBroadcaster;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use recibo_archive::memory::MemoryRemoteStore;
    use recibo_archive::ReceiptRepository;
    use recibo_channels::MockGateway;
    use recibo_core::config::StoreConfig;
    use recibo_store::Store;
    use tower::ServiceExt;

    async fn test_router() -> (Router, Arc<MockGateway>) {
        let store = Store::new(&StoreConfig {
            db_path: ":memory:".to_string(),
        })
        .await
        .unwrap();

        let gateway = Arc::new(MockGateway::new());
        let repo = Arc::new(ReceiptRepository::new(
            Arc::new(MemoryRemoteStore::new()),
            "archivo",
        ));
        let engine = Arc::new(Engine::new(
            store,
            repo,
            gateway.clone(),
            Arc::new(NullBroadcaster),
            Default::default(),
        ));
        (router(engine, "secreto"), gateway)
    }

    #[tokio::test]
    async fn handshake_accepts_matching_token() {
        let (app, _) = test_router().await;
        let resp = app
            .oneshot(
                Request::get(
                    "/webhook?hub.mode=subscribe&hub.verify_token=secreto&hub.challenge=12345",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = resp.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"12345");
    }

    #[tokio::test]
    async fn handshake_rejects_wrong_token() {
        let (app, _) = test_router().await;
        let resp = app
            .oneshot(
                Request::get(
                    "/webhook?hub.mode=subscribe&hub.verify_token=equivocado&hub.challenge=1",
                )
                .body(Body::empty())
                .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn delivery_always_answers_ok() {
        let (app, _) = test_router().await;
        let resp = app
            .oneshot(
                Request::post("/webhook")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"entry": "garbage"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
    }
}
