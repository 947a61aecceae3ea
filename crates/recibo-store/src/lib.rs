//! # recibo-store
//!
//! SQLite-backed persistence for Recibo: contacts with conversation state,
//! the registered-user identity registry, and inbound message history.

pub mod models;
pub mod store;

pub use models::{Contact, RegisteredUser};
pub use store::{IdentityError, Store};
