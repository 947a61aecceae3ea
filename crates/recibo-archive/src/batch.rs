//! Rate-limited batch maintenance operations.
//!
//! Payroll exports arrive as dozens of files at once. To keep the archive
//! server responsive, batch operations run each chunk's items concurrently
//! but cap the chunk size, pause between chunks, report per-item outcomes
//! instead of failing the whole run, and refresh the listing cache once at
//! the end.

use crate::repository::{ensure_dirs, ReceiptRepository};
use crate::session::RemoteError;
use crate::types::Bucket;
use futures::future::join_all;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{info, warn};

/// Chunk sizes and inter-chunk pauses, per operation.
const UPLOAD_CHUNK: usize = 3;
const UPLOAD_PAUSE: Duration = Duration::from_millis(300);
const UPLOAD_RETRY_DELAY: Duration = Duration::from_millis(500);
const DELETE_CHUNK: usize = 5;
const DELETE_PAUSE: Duration = Duration::from_millis(200);
const MOVE_CHUNK: usize = 4;
const MOVE_PAUSE: Duration = Duration::from_millis(300);

/// Outcome of one item in a batch run.
#[derive(Debug, Clone)]
pub struct BatchItemOutcome {
    pub filename: String,
    pub ok: bool,
    pub error: Option<String>,
}

/// Aggregate result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub succeeded: usize,
    pub failed: usize,
    pub outcomes: Vec<BatchItemOutcome>,
}

impl BatchReport {
    fn record(&mut self, filename: &str, result: Result<(), RemoteError>) {
        match result {
            Ok(()) => {
                self.succeeded += 1;
                self.outcomes.push(BatchItemOutcome {
                    filename: filename.to_string(),
                    ok: true,
                    error: None,
                });
            }
            Err(e) => {
                warn!("batch item {filename} failed: {e}");
                self.failed += 1;
                self.outcomes.push(BatchItemOutcome {
                    filename: filename.to_string(),
                    ok: false,
                    error: Some(e.to_string()),
                });
            }
        }
    }
}

impl ReceiptRepository {
    /// Upload many receipts into a bucket, three at a time.
    ///
    /// Each failed transfer is retried once after a short delay before
    /// being recorded as failed.
    pub async fn upload_many(
        &self,
        bucket: Bucket,
        files: Vec<(String, Vec<u8>)>,
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let total = files.len();

        for (chunk_idx, chunk) in files.chunks(UPLOAD_CHUNK).enumerate() {
            if chunk_idx > 0 {
                tokio::time::sleep(UPLOAD_PAUSE).await;
            }
            let results = join_all(
                chunk
                    .iter()
                    .map(|(filename, data)| self.upload_with_retry(bucket, filename, data.clone())),
            )
            .await;
            for ((filename, _), result) in chunk.iter().zip(results) {
                report.record(filename, result);
            }
        }

        info!(
            "uploaded {}/{total} files to {bucket} ({} failed)",
            report.succeeded, report.failed
        );
        self.cache.invalidate(bucket).await;
        report
    }

    async fn upload_with_retry(
        &self,
        bucket: Bucket,
        filename: &str,
        data: Vec<u8>,
    ) -> Result<(), RemoteError> {
        let base = self.base_dir.clone();
        let dir = self.bucket_path(bucket);
        let path = self.file_path(bucket, filename);

        let first = {
            let (base, dir, path, data) =
                (base.clone(), dir.clone(), path.clone(), data.clone());
            self.with_session(move |s| {
                ensure_dirs(s, &base, &dir)?;
                s.upload(&path, &data)
            })
            .await
        };
        if first.is_ok() {
            return Ok(());
        }

        tokio::time::sleep(UPLOAD_RETRY_DELAY).await;
        self.with_session(move |s| {
            ensure_dirs(s, &base, &dir)?;
            s.upload(&path, &data)
        })
        .await
    }

    /// Delete many receipts from a bucket, five at a time.
    pub async fn delete_many(&self, bucket: Bucket, filenames: &[String]) -> BatchReport {
        let mut report = BatchReport::default();

        for (chunk_idx, chunk) in filenames.chunks(DELETE_CHUNK).enumerate() {
            if chunk_idx > 0 {
                tokio::time::sleep(DELETE_PAUSE).await;
            }
            let results = join_all(chunk.iter().map(|filename| {
                let path = self.file_path(bucket, filename);
                self.with_session(move |s| s.delete(&path))
            }))
            .await;
            for (filename, result) in chunk.iter().zip(results) {
                report.record(filename, result);
            }
        }

        info!(
            "deleted {}/{} files from {bucket} ({} failed)",
            report.succeeded,
            filenames.len(),
            report.failed
        );
        self.cache.invalidate(bucket).await;
        report
    }

    /// Move many receipts between buckets, four at a time.
    pub async fn move_many(
        &self,
        from_bucket: Bucket,
        to_bucket: Bucket,
        filenames: &[String],
    ) -> BatchReport {
        let mut report = BatchReport::default();
        let mut touched: HashSet<Bucket> = HashSet::new();

        for (chunk_idx, chunk) in filenames.chunks(MOVE_CHUNK).enumerate() {
            if chunk_idx > 0 {
                tokio::time::sleep(MOVE_PAUSE).await;
            }
            let results = join_all(chunk.iter().map(|filename| {
                let base = self.base_dir.clone();
                let from_path = self.file_path(from_bucket, filename);
                let to_dir = self.bucket_path(to_bucket);
                let to_path = self.file_path(to_bucket, filename);
                self.with_session(move |s| {
                    s.size(&from_path)?;
                    ensure_dirs(s, &base, &to_dir)?;
                    s.rename(&from_path, &to_path)
                })
            }))
            .await;
            for (filename, result) in chunk.iter().zip(results) {
                if result.is_ok() {
                    touched.insert(from_bucket);
                    touched.insert(to_bucket);
                }
                report.record(filename, result);
            }
        }

        info!(
            "moved {}/{} files {from_bucket} -> {to_bucket} ({} failed)",
            report.succeeded,
            filenames.len(),
            report.failed
        );
        for bucket in touched {
            self.cache.invalidate(bucket).await;
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryRemoteStore;
    use std::sync::Arc;

    fn repo_with(store: &MemoryRemoteStore) -> ReceiptRepository {
        ReceiptRepository::new(Arc::new(store.clone()), "archivo")
    }

    fn pdf(n: usize) -> (String, Vec<u8>) {
        (format!("recibo_10012345{n:02}.pdf"), b"pdf".to_vec())
    }

    #[tokio::test]
    async fn upload_many_all_succeed() {
        let store = MemoryRemoteStore::new();
        let repo = repo_with(&store);

        let files: Vec<_> = (0..7).map(pdf).collect();
        let report = repo.upload_many(Bucket::Recent, files).await;
        assert_eq!(report.succeeded, 7);
        assert_eq!(report.failed, 0);
        assert_eq!(store.file_paths().len(), 7);
    }

    #[tokio::test]
    async fn uploads_within_a_chunk_overlap() {
        let store = MemoryRemoteStore::new();
        store.insert_dir("archivo");
        store.insert_dir("archivo/recientes");
        store.set_transfer_delay(Duration::from_millis(50));
        let repo = repo_with(&store);

        let files: Vec<_> = (0..UPLOAD_CHUNK).map(pdf).collect();
        let report = repo.upload_many(Bucket::Recent, files).await;
        assert_eq!(report.succeeded, UPLOAD_CHUNK);
        assert!(store.peak_sessions() >= 2);
    }

    #[tokio::test]
    async fn upload_retries_transient_failure() {
        let store = MemoryRemoteStore::new();
        let repo = repo_with(&store);

        // First transfer fails once; the retry lands it.
        store.fail_next_uploads(1);
        let report = repo.upload_many(Bucket::Recent, vec![pdf(0)]).await;
        assert_eq!(report.succeeded, 1);
        assert!(store.file_exists("archivo/recientes/recibo_1001234500.pdf"));
    }

    #[tokio::test]
    async fn upload_fails_after_retry_exhausted() {
        let store = MemoryRemoteStore::new();
        let repo = repo_with(&store);

        store.fail_next_uploads(2);
        let report = repo.upload_many(Bucket::Recent, vec![pdf(0)]).await;
        assert_eq!(report.failed, 1);
        assert!(report.outcomes[0].error.is_some());
    }

    #[tokio::test]
    async fn uploads_visible_to_owner_search() {
        let store = MemoryRemoteStore::new();
        let repo = repo_with(&store);

        repo.upload_many(Bucket::Recent, vec![pdf(0), pdf(1)]).await;
        let names = repo.find_by_owner(Bucket::Recent, "1001234501").await.unwrap();
        assert_eq!(names, vec!["recibo_1001234501.pdf"]);
    }

    #[tokio::test]
    async fn delete_many_mixed_outcomes() {
        let store = MemoryRemoteStore::new();
        for n in 0..3 {
            store.insert_file(&format!("archivo/recientes/recibo_10012345{n:02}.pdf"), b"x");
        }
        let repo = repo_with(&store);

        let names: Vec<String> = (0..5).map(|n| format!("recibo_10012345{n:02}.pdf")).collect();
        let report = repo.delete_many(Bucket::Recent, &names).await;
        assert_eq!(report.succeeded, 3);
        assert_eq!(report.failed, 2);
        assert!(store.file_paths().is_empty());

        let failures: Vec<_> = report.outcomes.iter().filter(|o| !o.ok).collect();
        assert_eq!(failures.len(), 2);
        assert_eq!(failures[0].filename, "recibo_1001234503.pdf");
    }

    #[tokio::test]
    async fn move_many_refreshes_both_buckets() {
        let store = MemoryRemoteStore::new();
        for n in 0..5 {
            store.insert_file(&format!("archivo/recientes/recibo_10012345{n:02}.pdf"), b"x");
        }
        let repo = repo_with(&store);

        // Warm both caches.
        repo.list_with_metadata(Bucket::Recent).await.unwrap();

        let names: Vec<String> = (0..5).map(|n| format!("recibo_10012345{n:02}.pdf")).collect();
        let report = repo.move_many(Bucket::Recent, Bucket::Older, &names).await;
        assert_eq!(report.succeeded, 5);

        let recent = repo.list_with_metadata(Bucket::Recent).await.unwrap();
        assert!(recent.is_empty());
        let older = repo.list_with_metadata(Bucket::Older).await.unwrap();
        assert_eq!(older.len(), 5);
    }
}
