//! Short-lived per-bucket listing cache.
//!
//! Receipt buckets change rarely (a payroll export lands twice a month),
//! so repeated metadata listings within a few minutes can be served from
//! memory instead of a fresh FTP round-trip.

use crate::types::{Bucket, ReceiptDocument};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

/// Default listing lifetime.
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

struct CachedListing {
    fetched_at: Instant,
    documents: Vec<ReceiptDocument>,
}

/// Cache of enriched listings, one slot per bucket.
pub struct MetadataCache {
    ttl: Duration,
    recent: Mutex<Option<CachedListing>>,
    older: Mutex<Option<CachedListing>>,
}

impl MetadataCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            recent: Mutex::new(None),
            older: Mutex::new(None),
        }
    }

    fn slot(&self, bucket: Bucket) -> &Mutex<Option<CachedListing>> {
        match bucket {
            Bucket::Recent => &self.recent,
            Bucket::Older => &self.older,
        }
    }

    /// Return the cached listing for a bucket unless it has expired.
    pub async fn get(&self, bucket: Bucket) -> Option<Vec<ReceiptDocument>> {
        let slot = self.slot(bucket).lock().await;
        match slot.as_ref() {
            Some(entry) if entry.fetched_at.elapsed() < self.ttl => {
                Some(entry.documents.clone())
            }
            _ => None,
        }
    }

    /// Store a fresh listing for a bucket.
    pub async fn put(&self, bucket: Bucket, documents: Vec<ReceiptDocument>) {
        let mut slot = self.slot(bucket).lock().await;
        *slot = Some(CachedListing {
            fetched_at: Instant::now(),
            documents,
        });
    }

    /// Drop the cached listing for one bucket.
    pub async fn invalidate(&self, bucket: Bucket) {
        let mut slot = self.slot(bucket).lock().await;
        *slot = None;
    }
}

impl Default for MetadataCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL)
    }
}
