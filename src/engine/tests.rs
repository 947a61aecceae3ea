use super::Engine;
use crate::broadcast::LocalBroadcaster;
use chrono::{NaiveDate, Utc};
use recibo_archive::memory::MemoryRemoteStore;
use recibo_archive::ReceiptRepository;
use recibo_channels::mock::{MockGateway, SentMessage};
use recibo_core::config::{CompanyConfig, StoreConfig};
use recibo_core::event::InboundEvent;
use recibo_core::state::ConversationState;
use recibo_store::Store;
use std::sync::Arc;
use uuid::Uuid;

const PHONE: &str = "573001112233";

struct Harness {
    engine: Arc<Engine>,
    gateway: Arc<MockGateway>,
    store: Store,
    archive: MemoryRemoteStore,
    bus: Arc<LocalBroadcaster>,
}

impl Harness {
    async fn send(&self, text: &str) {
        self.send_from(PHONE, text).await;
    }

    async fn send_from(&self, phone: &str, text: &str) {
        self.engine
            .handle_event(InboundEvent {
                message_id: format!("wamid.{}", Uuid::new_v4()),
                from_phone: phone.to_string(),
                display_name: Some("Ana".to_string()),
                text: text.to_string(),
                timestamp: Utc::now(),
            })
            .await;
    }

    async fn state(&self) -> Option<ConversationState> {
        self.store.get_contact(PHONE).await.unwrap().unwrap().state
    }

    fn last_text(&self) -> String {
        self.gateway.sent_texts().last().cloned().unwrap_or_default()
    }
}

async fn harness() -> Harness {
    harness_with(MemoryRemoteStore::new()).await
}

async fn harness_with(archive: MemoryRemoteStore) -> Harness {
    let store = Store::new(&StoreConfig {
        db_path: ":memory:".to_string(),
    })
    .await
    .unwrap();
    store
        .upsert_registered_user(
            "1001234567",
            "Ana Gómez",
            NaiveDate::from_ymd_opt(1990, 3, 15).unwrap(),
        )
        .await
        .unwrap();

    archive.insert_file("archivo/recientes/recibo_1001234567.pdf", b"pdf");
    archive.insert_dir("archivo/anteriores");

    let gateway = Arc::new(MockGateway::new());
    let bus = Arc::new(LocalBroadcaster::new());
    let repo = Arc::new(ReceiptRepository::new(Arc::new(archive.clone()), "archivo"));

    let company = CompanyConfig {
        name: "Agroware".to_string(),
        hr_line: "601 555 0101".to_string(),
        ..CompanyConfig::default()
    };

    let engine = Arc::new(Engine::new(
        store.clone(),
        repo,
        gateway.clone(),
        bus.clone(),
        company,
    ));

    Harness {
        engine,
        gateway,
        store,
        archive,
        bus,
    }
}

#[tokio::test]
async fn greeting_shows_menu() {
    let h = harness().await;
    h.send("hola").await;

    assert!(h.last_text().contains("Recibo de nómina"));
    assert!(h.last_text().contains("Ana"));
    assert!(h.state().await.is_none());
}

#[tokio::test]
async fn full_receipt_flow_delivers_document() {
    let h = harness().await;

    h.send("2").await;
    assert_eq!(h.state().await, Some(ConversationState::AwaitingNationalId));
    assert!(h.last_text().contains("cédula"));

    h.send("1001234567").await;
    assert_eq!(h.state().await, Some(ConversationState::AwaitingIssueDate));
    assert!(h.last_text().contains("Ana Gómez"));
    assert!(h.last_text().contains("DD/MM/AAAA"));

    h.send("15/03/1990").await;
    assert_eq!(h.state().await, Some(ConversationState::AwaitingFolderChoice));
    let sent = h.gateway.sent();
    assert!(matches!(
        sent.last().unwrap(),
        SentMessage::Buttons { button_ids, .. } if button_ids == &["1", "2"]
    ));

    // Button id "2" is the current fortnight.
    h.send("2").await;
    assert!(h.state().await.is_none());
    let sent = h.gateway.sent();
    assert!(sent.iter().any(|m| matches!(
        m,
        SentMessage::Document { filename, .. } if filename == "recibo_1001234567.pdf"
    )));
    assert!(h.last_text().contains("recibo"));

    // Only the four inbound messages are persisted; bot replies never are.
    assert_eq!(h.store.message_count(PHONE).await.unwrap(), 4);
}

#[tokio::test]
async fn path_echoing_archive_still_delivers() {
    // Some servers answer a glob NLST with full paths instead of bare names.
    let h = harness_with(MemoryRemoteStore::new().with_full_path_names()).await;

    h.send("2").await;
    h.send("1001234567").await;
    h.send("15/03/1990").await;
    h.send("2").await;

    assert!(h.state().await.is_none());
    let sent = h.gateway.sent();
    assert!(sent.iter().any(|m| matches!(
        m,
        SentMessage::Document { filename, .. } if filename == "recibo_1001234567.pdf"
    )));
}

#[tokio::test]
async fn malformed_national_id_reprompts() {
    let h = harness().await;
    h.send("2").await;
    h.send("sin numeros").await;

    assert_eq!(h.state().await, Some(ConversationState::AwaitingNationalId));
    assert!(h.last_text().contains("números"));
}

#[tokio::test]
async fn id_with_separators_is_normalized() {
    let h = harness().await;
    h.send("2").await;
    h.send("cc 1.001.234.567").await;

    assert_eq!(h.state().await, Some(ConversationState::AwaitingIssueDate));
}

#[tokio::test]
async fn date_mismatch_keeps_state_tolerance_passes() {
    let h = harness().await;
    h.send("2").await;
    h.send("1001234567").await;

    h.send("01/01/2000").await;
    assert_eq!(h.state().await, Some(ConversationState::AwaitingIssueDate));
    assert!(h.last_text().contains("no coincide"));

    // One day off the registered date is accepted.
    h.send("16/03/1990").await;
    assert_eq!(h.state().await, Some(ConversationState::AwaitingFolderChoice));
}

#[tokio::test]
async fn unknown_id_reprompts_naming_it() {
    let h = harness().await;
    h.send("2").await;
    h.send("999999999").await;

    assert_eq!(h.state().await, Some(ConversationState::AwaitingNationalId));
    assert!(h.last_text().contains("999999999"));
}

#[tokio::test]
async fn verified_identity_without_receipts_resets_to_idle() {
    let h = harness().await;
    h.store
        .upsert_registered_user(
            "80123456",
            "Luis Rojas",
            NaiveDate::from_ymd_opt(1985, 7, 2).unwrap(),
        )
        .await
        .unwrap();

    h.send("2").await;
    h.send("80123456").await;
    h.send("02/07/1985").await;

    // Identity checks out but neither bucket holds anything for this id.
    assert!(h.state().await.is_none());
    assert!(h.last_text().contains("no encontré recibos"));
}

#[tokio::test]
async fn cancel_works_from_every_state() {
    for (steps, keyword) in [
        (vec!["2"], "cancelar"),
        (vec!["2", "1001234567"], "menú"),
        (vec!["2", "1001234567", "15/03/1990"], "0"),
    ] {
        let h = harness().await;
        for step in steps {
            h.send(step).await;
        }
        assert!(h.state().await.is_some());

        h.send(keyword).await;
        assert!(h.state().await.is_none());
        let texts = h.gateway.sent_texts();
        assert!(texts.iter().any(|t| t.contains("cancelé")));
        assert!(h.last_text().contains("Recibo de nómina"));
    }
}

#[tokio::test]
async fn cancel_requires_whole_message() {
    let h = harness().await;
    h.send("2").await;
    // Contains a cancel word but is not one; treated as (invalid) id input.
    h.send("no quiero cancelar todavia").await;
    assert_eq!(h.state().await, Some(ConversationState::AwaitingNationalId));
}

#[tokio::test]
async fn invalid_folder_choice_reprompts() {
    let h = harness().await;
    h.send("2").await;
    h.send("1001234567").await;
    h.send("15/03/1990").await;

    h.send("tal vez").await;
    assert_eq!(h.state().await, Some(ConversationState::AwaitingFolderChoice));
    assert!(h.last_text().contains("No entendí"));
}

#[tokio::test]
async fn empty_folder_ends_flow() {
    let h = harness().await;
    h.send("2").await;
    h.send("1001234567").await;
    h.send("15/03/1990").await;

    // The older bucket holds nothing for this contact.
    h.send("1").await;
    assert!(h.state().await.is_none());
    assert!(h.last_text().contains("No encontré recibos"));
    assert!(!h
        .gateway
        .sent()
        .iter()
        .any(|m| matches!(m, SentMessage::Document { .. })));
}

#[tokio::test]
async fn freshly_uploaded_receipt_is_found() {
    let h = harness().await;
    h.archive
        .insert_file("archivo/anteriores/recibo_1001234567.pdf", b"old");

    h.send("2").await;
    h.send("1001234567").await;
    h.send("15/03/1990").await;
    h.send("1").await;

    assert!(h.gateway.sent().iter().any(|m| matches!(
        m,
        SentMessage::Document { filename, .. } if filename == "recibo_1001234567.pdf"
    )));
}

#[tokio::test]
async fn unsubscribe_deactivates_contact() {
    let h = harness().await;
    h.send("6").await;

    let contact = h.store.get_contact(PHONE).await.unwrap().unwrap();
    assert!(!contact.is_active);
    assert!(h.last_text().contains("no recibirás"));
}

#[tokio::test]
async fn failed_send_does_not_roll_back_transition() {
    let h = harness().await;
    h.gateway.set_fail_sends(true);
    h.send("2").await;

    // The reply was lost but the transition was committed first.
    assert_eq!(h.state().await, Some(ConversationState::AwaitingNationalId));
}

#[tokio::test]
async fn events_are_mirrored_to_broadcaster() {
    let h = harness().await;
    let mut rx = h.bus.subscribe();

    h.send("hola").await;

    let (topic, event) = rx.recv().await.unwrap();
    assert_eq!(topic, PHONE);
    assert_eq!(event["direction"], "in");
    assert_eq!(event["text"], "hola");

    let (_, event) = rx.recv().await.unwrap();
    assert_eq!(event["direction"], "out");
}

#[tokio::test]
async fn idle_contact_locks_are_pruned() {
    let h = harness().await;

    h.send_from("573001112233", "hola").await;
    h.send_from("573004445566", "hola").await;
    h.send_from("573007778899", "hola").await;

    // Each acquisition drops entries nobody holds, so the map never
    // accumulates one lock per contact ever seen.
    assert_eq!(h.engine.contact_lock_count().await, 1);
}

#[tokio::test]
async fn concurrent_events_from_one_contact_are_serialized() {
    let h = harness().await;

    let a = h.engine.clone();
    let b = h.engine.clone();
    let mk = |text: &str| InboundEvent {
        message_id: format!("wamid.{}", Uuid::new_v4()),
        from_phone: PHONE.to_string(),
        display_name: None,
        text: text.to_string(),
        timestamp: Utc::now(),
    };
    let (e1, e2) = (mk("2"), mk("1001234567"));

    let (r1, r2) = tokio::join!(
        tokio::spawn(async move { a.handle_event(e1).await }),
        tokio::spawn(async move { b.handle_event(e2).await }),
    );
    r1.unwrap();
    r2.unwrap();

    // Both were applied against a consistent state; whatever the arrival
    // order, the contact is in exactly one stored state and both inbound
    // messages were recorded.
    assert_eq!(h.store.message_count(PHONE).await.unwrap(), 2);
    assert!(h.store.get_contact(PHONE).await.unwrap().is_some());
}
