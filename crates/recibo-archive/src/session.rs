//! Remote archive sessions.
//!
//! `RemoteStore`/`RemoteSession` abstract the FTP control connection so the
//! repository and its tests can run against an in-memory backend. Sessions
//! are blocking by design; the repository drives them from
//! `spawn_blocking`.

use recibo_core::config::ArchiveConfig;
use std::io::Cursor;
use std::net::{SocketAddr, ToSocketAddrs};
use std::time::Duration;
use suppaftp::types::FileType;
use suppaftp::{FtpError, FtpStream, Status};
use thiserror::Error;
use tracing::debug;

/// Failure at the remote-archive boundary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The server answered 550: the path does not exist (or, for mkdir,
    /// already does).
    #[error("remote path not found")]
    NotFound,
    #[error("remote archive error: {0}")]
    Other(String),
}

impl From<FtpError> for RemoteError {
    fn from(e: FtpError) -> Self {
        match &e {
            FtpError::UnexpectedResponse(resp) if resp.status == Status::FileUnavailable => {
                RemoteError::NotFound
            }
            _ => RemoteError::Other(e.to_string()),
        }
    }
}

/// One live control connection. All calls block.
pub trait RemoteSession: Send {
    /// Bare filename listing. `path` may carry a server-side glob.
    fn nlst(&mut self, path: &str) -> Result<Vec<String>, RemoteError>;
    /// Long-format listing (`LIST`) lines.
    fn list(&mut self, path: &str) -> Result<Vec<String>, RemoteError>;
    fn mkdir(&mut self, path: &str) -> Result<(), RemoteError>;
    fn upload(&mut self, path: &str, data: &[u8]) -> Result<(), RemoteError>;
    fn download(&mut self, path: &str) -> Result<Vec<u8>, RemoteError>;
    fn rename(&mut self, from: &str, to: &str) -> Result<(), RemoteError>;
    fn delete(&mut self, path: &str) -> Result<(), RemoteError>;
    fn size(&mut self, path: &str) -> Result<u64, RemoteError>;
}

/// Factory for sessions. Each repository operation opens a fresh one.
pub trait RemoteStore: Send + Sync {
    fn connect(&self) -> Result<Box<dyn RemoteSession>, RemoteError>;
}

/// FTP-backed store.
pub struct FtpRemoteStore {
    host: String,
    port: u16,
    user: String,
    password: String,
    connect_timeout: Duration,
}

impl FtpRemoteStore {
    pub fn new(config: &ArchiveConfig) -> Self {
        Self {
            host: config.host.clone(),
            port: config.port,
            user: config.user.clone(),
            password: config.password.clone(),
            connect_timeout: Duration::from_secs(config.connect_timeout_secs),
        }
    }

    fn resolve(&self) -> Result<SocketAddr, RemoteError> {
        (self.host.as_str(), self.port)
            .to_socket_addrs()
            .map_err(|e| RemoteError::Other(format!("resolve {}: {e}", self.host)))?
            .next()
            .ok_or_else(|| RemoteError::Other(format!("no address for {}", self.host)))
    }
}

impl RemoteStore for FtpRemoteStore {
    fn connect(&self) -> Result<Box<dyn RemoteSession>, RemoteError> {
        let addr = self.resolve()?;
        debug!("connecting to ftp archive at {addr}");
        let mut stream = FtpStream::connect_timeout(addr, self.connect_timeout)?;
        stream.login(&self.user, &self.password)?;
        stream.transfer_type(FileType::Binary)?;
        Ok(Box::new(FtpSession { stream }))
    }
}

struct FtpSession {
    stream: FtpStream,
}

impl RemoteSession for FtpSession {
    fn nlst(&mut self, path: &str) -> Result<Vec<String>, RemoteError> {
        Ok(self.stream.nlst(Some(path))?)
    }

    fn list(&mut self, path: &str) -> Result<Vec<String>, RemoteError> {
        Ok(self.stream.list(Some(path))?)
    }

    fn mkdir(&mut self, path: &str) -> Result<(), RemoteError> {
        Ok(self.stream.mkdir(path)?)
    }

    fn upload(&mut self, path: &str, data: &[u8]) -> Result<(), RemoteError> {
        let mut reader = Cursor::new(data);
        self.stream.put_file(path, &mut reader)?;
        Ok(())
    }

    fn download(&mut self, path: &str) -> Result<Vec<u8>, RemoteError> {
        Ok(self.stream.retr_as_buffer(path)?.into_inner())
    }

    fn rename(&mut self, from: &str, to: &str) -> Result<(), RemoteError> {
        Ok(self.stream.rename(from, to)?)
    }

    fn delete(&mut self, path: &str) -> Result<(), RemoteError> {
        Ok(self.stream.rm(path)?)
    }

    fn size(&mut self, path: &str) -> Result<u64, RemoteError> {
        Ok(self.stream.size(path)? as u64)
    }
}

impl Drop for FtpSession {
    fn drop(&mut self) {
        let _ = self.stream.quit();
    }
}
