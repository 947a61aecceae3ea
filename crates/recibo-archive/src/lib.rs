//! # recibo-archive
//!
//! Access to the FTP receipt archive: directory listings with metadata,
//! owner-id extraction from filenames, a short-lived listing cache, and
//! rate-limited batch maintenance operations.

pub mod batch;
pub mod cache;
pub mod extractor;
pub mod listing;
pub mod memory;
pub mod repository;
pub mod session;
pub mod types;

pub use batch::{BatchItemOutcome, BatchReport};
pub use repository::ReceiptRepository;
pub use session::{FtpRemoteStore, RemoteError, RemoteSession, RemoteStore};
pub use types::{Bucket, ReceiptDocument};
