//! In-memory remote store.
//!
//! Stands in for the FTP server in tests: same session contract, same 550
//! semantics, with knobs for failure injection, slow transfers, and server
//! quirks (`NLST` rejecting globs or echoing full paths).

use crate::session::{RemoteError, RemoteSession, RemoteStore};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Default)]
struct State {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
}

/// Shared in-memory file tree behaving like a small FTP server.
#[derive(Clone)]
pub struct MemoryRemoteStore {
    state: Arc<Mutex<State>>,
    supports_glob: bool,
    echo_full_paths: bool,
    fail_connections: Arc<AtomicBool>,
    fail_next_uploads: Arc<AtomicUsize>,
    transfer_delay_ms: Arc<AtomicU64>,
    live_sessions: Arc<AtomicUsize>,
    peak_sessions: Arc<AtomicUsize>,
}

impl Default for MemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRemoteStore {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(State::default())),
            supports_glob: true,
            echo_full_paths: false,
            fail_connections: Arc::new(AtomicBool::new(false)),
            fail_next_uploads: Arc::new(AtomicUsize::new(0)),
            transfer_delay_ms: Arc::new(AtomicU64::new(0)),
            live_sessions: Arc::new(AtomicUsize::new(0)),
            peak_sessions: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Variant whose `NLST` rejects glob arguments, as some servers do.
    pub fn without_glob(mut self) -> Self {
        self.supports_glob = false;
        self
    }

    /// Variant whose `NLST` echoes full paths back, as some servers do.
    pub fn with_full_path_names(mut self) -> Self {
        self.echo_full_paths = true;
        self
    }

    /// Make every transfer take this long, to expose session overlap.
    pub fn set_transfer_delay(&self, delay: Duration) {
        self.transfer_delay_ms
            .store(delay.as_millis() as u64, Ordering::SeqCst);
    }

    /// Highest number of sessions that were ever open at once.
    pub fn peak_sessions(&self) -> usize {
        self.peak_sessions.load(Ordering::SeqCst)
    }

    pub fn set_fail_connections(&self, fail: bool) {
        self.fail_connections.store(fail, Ordering::SeqCst);
    }

    /// Make the next `n` uploads fail with a transient error.
    pub fn fail_next_uploads(&self, n: usize) {
        self.fail_next_uploads.store(n, Ordering::SeqCst);
    }

    pub fn insert_dir(&self, path: &str) {
        self.lock().dirs.insert(path.to_string());
    }

    pub fn insert_file(&self, path: &str, data: &[u8]) {
        let mut state = self.lock();
        if let Some((dir, _)) = path.rsplit_once('/') {
            state.dirs.insert(dir.to_string());
        }
        state.files.insert(path.to_string(), data.to_vec());
    }

    pub fn file_exists(&self, path: &str) -> bool {
        self.lock().files.contains_key(path)
    }

    pub fn file_paths(&self) -> Vec<String> {
        self.lock().files.keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl RemoteStore for MemoryRemoteStore {
    fn connect(&self) -> Result<Box<dyn RemoteSession>, RemoteError> {
        if self.fail_connections.load(Ordering::SeqCst) {
            return Err(RemoteError::Other("connection refused".to_string()));
        }
        let live = self.live_sessions.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_sessions.fetch_max(live, Ordering::SeqCst);
        Ok(Box::new(MemorySession {
            store: self.clone(),
        }))
    }
}

struct MemorySession {
    store: MemoryRemoteStore,
}

impl Drop for MemorySession {
    fn drop(&mut self) {
        self.store.live_sessions.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MemorySession {
    fn transfer_pause(&self) {
        let ms = self.store.transfer_delay_ms.load(Ordering::SeqCst);
        if ms > 0 {
            std::thread::sleep(Duration::from_millis(ms));
        }
    }

    fn names_in(&self, dir: &str) -> Result<Vec<String>, RemoteError> {
        let state = self.store.lock();
        if !state.dirs.contains(dir) {
            return Err(RemoteError::NotFound);
        }
        let prefix = format!("{dir}/");
        Ok(state
            .files
            .keys()
            .filter_map(|path| path.strip_prefix(&prefix))
            .filter(|rest| !rest.contains('/'))
            .map(str::to_string)
            .collect())
    }
}

/// Match a `*`-only glob pattern against a name.
fn glob_matches(pattern: &str, name: &str) -> bool {
    let segments: Vec<&str> = pattern.split('*').collect();
    let mut rest = name;
    for (i, seg) in segments.iter().enumerate() {
        if seg.is_empty() {
            continue;
        }
        if i == 0 {
            match rest.strip_prefix(seg) {
                Some(r) => rest = r,
                None => return false,
            }
        } else if i == segments.len() - 1 && !pattern.ends_with('*') {
            return rest.ends_with(seg);
        } else {
            match rest.find(seg) {
                Some(pos) => rest = &rest[pos + seg.len()..],
                None => return false,
            }
        }
    }
    true
}

impl RemoteSession for MemorySession {
    fn nlst(&mut self, path: &str) -> Result<Vec<String>, RemoteError> {
        let (dir, names) = match path.rsplit_once('/') {
            Some((dir, pattern)) if pattern.contains('*') => {
                if !self.store.supports_glob {
                    return Err(RemoteError::Other("glob not supported".to_string()));
                }
                let names: Vec<String> = self
                    .names_in(dir)?
                    .into_iter()
                    .filter(|n| glob_matches(pattern, n))
                    .collect();
                (dir, names)
            }
            _ => (path, self.names_in(path)?),
        };
        if self.store.echo_full_paths {
            Ok(names.into_iter().map(|n| format!("{dir}/{n}")).collect())
        } else {
            Ok(names)
        }
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, RemoteError> {
        let names = self.names_in(path)?;
        let state = self.store.lock();
        Ok(names
            .into_iter()
            .map(|name| {
                let size = state
                    .files
                    .get(&format!("{path}/{name}"))
                    .map(|d| d.len())
                    .unwrap_or(0);
                format!("-rw-r--r-- 1 ftp ftp {size} Sep 4 2023 {name}")
            })
            .collect())
    }

    fn mkdir(&mut self, path: &str) -> Result<(), RemoteError> {
        let mut state = self.store.lock();
        if !state.dirs.insert(path.to_string()) {
            // Existing directory answers 550, like a real server.
            return Err(RemoteError::NotFound);
        }
        Ok(())
    }

    fn upload(&mut self, path: &str, data: &[u8]) -> Result<(), RemoteError> {
        self.transfer_pause();
        let remaining = self.store.fail_next_uploads.load(Ordering::SeqCst);
        if remaining > 0 {
            self.store
                .fail_next_uploads
                .store(remaining - 1, Ordering::SeqCst);
            return Err(RemoteError::Other("transfer aborted".to_string()));
        }
        let mut state = self.store.lock();
        match path.rsplit_once('/') {
            Some((dir, _)) if state.dirs.contains(dir) => {
                state.files.insert(path.to_string(), data.to_vec());
                Ok(())
            }
            _ => Err(RemoteError::NotFound),
        }
    }

    fn download(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        self.transfer_pause();
        self.store
            .lock()
            .files
            .get(path)
            .cloned()
            .ok_or(RemoteError::NotFound)
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), RemoteError> {
        let mut state = self.store.lock();
        let data = state.files.remove(from).ok_or(RemoteError::NotFound)?;
        state.files.insert(to.to_string(), data);
        Ok(())
    }

    fn delete(&mut self, path: &str) -> Result<(), RemoteError> {
        self.transfer_pause();
        self.store
            .lock()
            .files
            .remove(path)
            .map(|_| ())
            .ok_or(RemoteError::NotFound)
    }

    fn size(&mut self, path: &str) -> Result<u64, RemoteError> {
        self.store
            .lock()
            .files
            .get(path)
            .map(|d| d.len() as u64)
            .ok_or(RemoteError::NotFound)
    }
}
