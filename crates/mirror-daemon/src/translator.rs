//! Event translator: turns watch events into protocol exchanges.
//!
//! The translator is the single consumer of the watch-event channel and the
//! sole owner of the session, so at most one exchange is ever in flight on
//! the connection. Server-reported failures are logged with their catalog
//! message and the stream moves on; transport and framing errors propagate
//! to the caller and end the run.

use crate::watcher::WatchEvent;
use mirror_core::{Command, FileTransfer, ProtocolError, Response, Session, SessionError};
use std::path::PathBuf;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

/// Mirrors watch events onto the server through one session.
pub struct Translator<S> {
    session: Session<S>,
    root: PathBuf,
}

impl<S: AsyncRead + AsyncWrite + Unpin> Translator<S> {
    /// Create a translator over an authenticated session for the given
    /// watched root.
    pub fn new(session: Session<S>, root: PathBuf) -> Self {
        Self { session, root }
    }

    /// Hand the session back, for the final exit exchange at shutdown.
    pub fn into_session(self) -> Session<S> {
        self.session
    }

    /// Mirror one event onto the server.
    ///
    /// Returns `Err` only for terminal session errors; everything the
    /// translator can recover from (server failures, unreadable files,
    /// unencodable paths) is reported and swallowed.
    pub async fn handle(&mut self, event: WatchEvent) -> Result<(), SessionError> {
        match event {
            WatchEvent::Created { path, is_dir: true } => self.create_directory(&path).await,
            WatchEvent::Created { path, is_dir: false }
            | WatchEvent::Modified { path, is_dir: false } => self.upload_file(&path).await,
            WatchEvent::Modified { path, is_dir: true } => {
                debug!("ignoring directory modification: {}", path);
                Ok(())
            }
            WatchEvent::Deleted { path, is_dir: true } => self.delete_directory(&path).await,
            WatchEvent::Deleted { path, is_dir: false } => self.delete_file(&path).await,
            WatchEvent::Renamed { from, to, is_dir: true } => {
                self.rename_directory(&from, &to).await
            }
            WatchEvent::Renamed { from, to, is_dir: false } => {
                // No file-rename command exists on the wire: delete the old
                // path, then upload the new contents, as two independent
                // exchanges. The upload happens even if the delete fails.
                self.delete_file(&from).await?;
                self.upload_file(&to).await
            }
        }
    }

    /// Read the file and run the two-phase upload. A file that cannot be
    /// read any more (deleted again, permissions) is reported and dropped
    /// without contacting the server.
    async fn upload_file(&mut self, path: &str) -> Result<(), SessionError> {
        let data = match tokio::fs::read(self.root.join(path)).await {
            Ok(data) => data,
            Err(e) => {
                warn!("cannot read {}: {}; event dropped", path, e);
                return Ok(());
            }
        };

        let transfer = FileTransfer::new(path, data);
        let size = transfer.size();
        let result = self.session.upload(&transfer).await;
        match screen(result, path)? {
            Some(Response::Success) => info!("uploaded {} ({})", path, human_size(size)),
            Some(Response::Failure(code)) => warn!("failed to upload {}: {}", path, code),
            None => {}
        }
        Ok(())
    }

    async fn delete_file(&mut self, path: &str) -> Result<(), SessionError> {
        let result = self
            .session
            .request(Command::DeleteFile(path.to_string()))
            .await;
        match screen(result, path)? {
            Some(Response::Success) => info!("deleted {}", path),
            Some(Response::Failure(code)) => warn!("failed to delete {}: {}", path, code),
            None => {}
        }
        Ok(())
    }

    async fn create_directory(&mut self, path: &str) -> Result<(), SessionError> {
        let result = self
            .session
            .request(Command::CreateDir(path.to_string()))
            .await;
        match screen(result, path)? {
            Some(Response::Success) => info!("created directory {}", path),
            Some(Response::Failure(code)) => {
                warn!("failed to create directory {}: {}", path, code)
            }
            None => {}
        }
        Ok(())
    }

    async fn delete_directory(&mut self, path: &str) -> Result<(), SessionError> {
        let result = self
            .session
            .request(Command::DeleteDir(path.to_string()))
            .await;
        match screen(result, path)? {
            Some(Response::Success) => info!("deleted directory {}", path),
            Some(Response::Failure(code)) => {
                warn!("failed to delete directory {}: {}", path, code)
            }
            None => {}
        }
        Ok(())
    }

    async fn rename_directory(&mut self, from: &str, to: &str) -> Result<(), SessionError> {
        let result = self
            .session
            .request(Command::RenameDir {
                from: from.to_string(),
                to: to.to_string(),
            })
            .await;
        match screen(result, from)? {
            Some(Response::Success) => info!("renamed directory {} to {}", from, to),
            Some(Response::Failure(code)) => {
                warn!("failed to rename directory {}: {}", from, code)
            }
            None => {}
        }
        Ok(())
    }
}

/// Screen an exchange outcome: paths the wire cannot carry are reported and
/// dropped (`None`), terminal errors propagate, responses pass through.
fn screen(
    result: Result<Response, SessionError>,
    path: &str,
) -> Result<Option<Response>, SessionError> {
    match result {
        Ok(response) => Ok(Some(response)),
        Err(SessionError::Protocol(ProtocolError::InvalidArgument(arg))) => {
            warn!("cannot mirror {}: unencodable argument {:?}", path, arg);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Human-readable byte count for confirmation messages.
fn human_size(n: u64) -> String {
    if n < 1 << 10 {
        format!("{} B", n)
    } else if n < 1 << 20 {
        format!("{} KiB", div_round(n, 1 << 10))
    } else if n < 1 << 30 {
        format!("{} MiB", div_round(n, 1 << 20))
    } else {
        format!("{} GiB", div_round(n, 1 << 30))
    }
}

fn div_round(n: u64, unit: u64) -> u64 {
    (n + unit / 2) / unit
}
