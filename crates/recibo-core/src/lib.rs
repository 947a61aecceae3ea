//! # recibo-core
//!
//! Core types and traits shared across Recibo crates.

pub mod config;
pub mod error;
pub mod event;
pub mod state;
pub mod traits;
pub mod validate;

pub use config::{shellexpand, Config};
pub use error::ReciboError;
