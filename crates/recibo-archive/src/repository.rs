//! Receipt repository over a remote store.
//!
//! Each operation opens a fresh session on a blocking thread; listings with
//! metadata are served from the [`MetadataCache`] when fresh.

use crate::cache::MetadataCache;
use crate::extractor::owner_id_from_filename;
use crate::listing::parse_list_line;
use crate::session::{RemoteError, RemoteSession, RemoteStore};
use crate::types::{Bucket, ReceiptDocument};
use recibo_core::error::ReciboError;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

pub struct ReceiptRepository {
    store: Arc<dyn RemoteStore>,
    pub(crate) cache: MetadataCache,
    pub(crate) base_dir: String,
}

impl ReceiptRepository {
    pub fn new(store: Arc<dyn RemoteStore>, base_dir: &str) -> Self {
        Self::with_cache_ttl(store, base_dir, crate::cache::DEFAULT_TTL)
    }

    pub fn with_cache_ttl(store: Arc<dyn RemoteStore>, base_dir: &str, ttl: Duration) -> Self {
        Self {
            store,
            cache: MetadataCache::new(ttl),
            base_dir: base_dir.trim_end_matches('/').to_string(),
        }
    }

    pub(crate) fn bucket_path(&self, bucket: Bucket) -> String {
        if self.base_dir.is_empty() {
            bucket.remote_dir().to_string()
        } else {
            format!("{}/{}", self.base_dir, bucket.remote_dir())
        }
    }

    pub(crate) fn file_path(&self, bucket: Bucket, filename: &str) -> String {
        format!("{}/{}", self.bucket_path(bucket), filename)
    }

    /// Run a closure against a fresh session on a blocking thread.
    pub(crate) async fn with_session<T, F>(&self, f: F) -> Result<T, RemoteError>
    where
        T: Send + 'static,
        F: FnOnce(&mut dyn RemoteSession) -> Result<T, RemoteError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || {
            let mut session = store.connect()?;
            f(session.as_mut())
        })
        .await
        .map_err(|e| RemoteError::Other(format!("archive task failed: {e}")))?
    }

    /// Bare, sorted filename listing for a bucket. Never cached.
    ///
    /// An unreachable server degrades to an empty listing.
    pub async fn list_names(&self, bucket: Bucket) -> Result<Vec<String>, ReciboError> {
        let path = self.bucket_path(bucket);
        let mut names = match self.with_session(move |s| s.nlst(&path)).await {
            Ok(names) => names,
            Err(e) => {
                warn!("listing {bucket} failed ({e}), treating as empty");
                return Ok(Vec::new());
            }
        };
        names.sort();
        Ok(names)
    }

    /// Sorted listing enriched with size, mtime, and extracted owner id.
    ///
    /// An unreachable server degrades to an empty listing, which is never
    /// cached, so the next call retries the server.
    pub async fn list_with_metadata(
        &self,
        bucket: Bucket,
    ) -> Result<Vec<ReceiptDocument>, ReciboError> {
        if let Some(cached) = self.cache.get(bucket).await {
            return Ok(cached);
        }

        let path = self.bucket_path(bucket);
        let lines = match self.with_session(move |s| s.list(&path)).await {
            Ok(lines) => lines,
            Err(e) => {
                warn!("listing {bucket} failed ({e}), treating as empty");
                return Ok(Vec::new());
            }
        };

        let mut documents: Vec<ReceiptDocument> = lines
            .iter()
            .filter_map(|line| parse_list_line(line))
            .map(|entry| ReceiptDocument {
                bucket,
                owner_id: owner_id_from_filename(&entry.name),
                filename: entry.name,
                size: entry.size,
                modified: entry.modified,
            })
            .collect();
        documents.sort_by(|a, b| a.filename.cmp(&b.filename));

        self.cache.put(bucket, documents.clone()).await;
        Ok(documents)
    }

    /// Filenames in a bucket belonging to one owner.
    ///
    /// Tries a server-side glob first; falls back to filtering a full
    /// listing when the server rejects it. A listing failure degrades to
    /// an empty result so the caller can answer "no receipts found".
    pub async fn find_by_owner(
        &self,
        bucket: Bucket,
        owner_id: &str,
    ) -> Result<Vec<String>, ReciboError> {
        let path = self.bucket_path(bucket);
        let pattern = format!("{path}/*{owner_id}*");
        match self.with_session(move |s| s.nlst(&pattern)).await {
            Ok(names) => {
                // Servers differ on whether a glob NLST echoes the directory
                // back; reduce every entry to its final segment.
                let mut names: Vec<String> = names
                    .iter()
                    .filter_map(|n| basename(n))
                    .map(str::to_string)
                    .collect();
                names.sort();
                Ok(names)
            }
            Err(e) => {
                warn!("glob search failed ({e}), falling back to full listing");
                let names = self.list_names(bucket).await?;
                Ok(names.into_iter().filter(|n| n.contains(owner_id)).collect())
            }
        }
    }

    /// Owner's documents with metadata, via the cached bucket listing.
    pub async fn find_by_owner_with_metadata(
        &self,
        bucket: Bucket,
        owner_id: &str,
    ) -> Result<Vec<ReceiptDocument>, ReciboError> {
        let documents = self.list_with_metadata(bucket).await?;
        Ok(documents
            .into_iter()
            .filter(|d| {
                d.owner_id.as_deref() == Some(owner_id) || d.filename.contains(owner_id)
            })
            .collect())
    }

    /// Upload one receipt into a bucket, creating directories as needed.
    pub async fn upload(
        &self,
        bucket: Bucket,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<(), ReciboError> {
        let base = self.base_dir.clone();
        let dir = self.bucket_path(bucket);
        let path = self.file_path(bucket, filename);
        self.with_session(move |s| {
            ensure_dirs(s, &base, &dir)?;
            s.upload(&path, &data)
        })
        .await
        .map_err(archive_err)?;
        self.cache.invalidate(bucket).await;
        Ok(())
    }

    /// Rename a receipt within its bucket.
    pub async fn rename(
        &self,
        bucket: Bucket,
        from: &str,
        to: &str,
    ) -> Result<(), ReciboError> {
        let from_path = self.file_path(bucket, from);
        let to_path = self.file_path(bucket, to);
        self.with_session(move |s| s.rename(&from_path, &to_path))
            .await
            .map_err(archive_err)?;
        self.cache.invalidate(bucket).await;
        Ok(())
    }

    /// Move a receipt between buckets.
    ///
    /// The source is size-probed first so a missing file fails before any
    /// directory is created on the destination side.
    pub async fn mv(
        &self,
        from_bucket: Bucket,
        to_bucket: Bucket,
        filename: &str,
    ) -> Result<(), ReciboError> {
        let base = self.base_dir.clone();
        let from_path = self.file_path(from_bucket, filename);
        let to_dir = self.bucket_path(to_bucket);
        let to_path = self.file_path(to_bucket, filename);
        self.with_session(move |s| {
            s.size(&from_path)?;
            ensure_dirs(s, &base, &to_dir)?;
            s.rename(&from_path, &to_path)
        })
        .await
        .map_err(archive_err)?;
        self.cache.invalidate(from_bucket).await;
        self.cache.invalidate(to_bucket).await;
        Ok(())
    }

    /// Delete one receipt. A missing file is a defined failure.
    pub async fn delete(&self, bucket: Bucket, filename: &str) -> Result<(), ReciboError> {
        let path = self.file_path(bucket, filename);
        self.with_session(move |s| s.delete(&path))
            .await
            .map_err(archive_err)?;
        self.cache.invalidate(bucket).await;
        Ok(())
    }

    /// Download one receipt to a uniquely-named temp file.
    ///
    /// The caller owns the file and removes it after sending.
    pub async fn download(&self, bucket: Bucket, filename: &str) -> Result<PathBuf, ReciboError> {
        let path = self.file_path(bucket, filename);
        let data = self
            .with_session(move |s| s.download(&path))
            .await
            .map_err(archive_err)?;

        let local = std::env::temp_dir().join(format!("recibo-{}-{filename}", Uuid::new_v4()));
        tokio::fs::write(&local, &data).await?;
        info!("downloaded {filename} ({} bytes)", data.len());
        Ok(local)
    }

    /// Drop a bucket's cached listing.
    pub async fn invalidate(&self, bucket: Bucket) {
        self.cache.invalidate(bucket).await;
    }
}

/// Create the base and bucket directories, tolerating ones that exist.
pub(crate) fn ensure_dirs(
    session: &mut dyn RemoteSession,
    base: &str,
    bucket_dir: &str,
) -> Result<(), RemoteError> {
    for dir in [base, bucket_dir] {
        if dir.is_empty() {
            continue;
        }
        match session.mkdir(dir) {
            // 550 means the directory already exists.
            Ok(()) | Err(RemoteError::NotFound) => {}
            Err(e) => return Err(e),
        }
    }
    Ok(())
}

fn archive_err(e: RemoteError) -> ReciboError {
    ReciboError::Archive(e.to_string())
}

/// Last path segment of an `NLST` entry; `None` for directory-like entries.
fn basename(path: &str) -> Option<&str> {
    path.rsplit('/').next().filter(|name| !name.is_empty())
}
