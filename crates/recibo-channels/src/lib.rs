//! # recibo-channels
//!
//! WhatsApp Cloud API messaging gateway and webhook payload decoding.
//! Docs: <https://developers.facebook.com/docs/whatsapp/cloud-api>

pub mod cloud;
pub mod mock;
pub mod webhook;

pub use cloud::CloudApiGateway;
pub use mock::MockGateway;
pub use webhook::decode_events;
