//! Protocol session: owns the connection and the request/response cycle.
//!
//! A session drives exactly one connection through its lifecycle:
//! `Unauthenticated` → (username + password accepted) → `Authenticated` →
//! (`EXIT` exchange) → `Closed`. Every exchange is half-duplex — one request
//! line written, one response line read — and the `&mut self` receiver on
//! every exchange method makes a second in-flight request unrepresentable.
//!
//! The session is generic over the transport so tests can drive it over
//! [`tokio::io::duplex`]; production code connects a [`TcpStream`].

use crate::protocol::{Command, ProtocolError, Response};
use std::io;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::debug;

/// Session lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, handshake not completed.
    Unauthenticated,
    /// Username and password both accepted.
    Authenticated,
    /// Connection released; no further exchanges possible.
    Closed,
}

/// Result of one authentication attempt.
///
/// A rejection leaves the session `Unauthenticated` so the caller can prompt
/// for new credentials and try again; the retry loop and its bound belong to
/// the caller, not the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Both steps succeeded; the session is now authenticated.
    Accepted,
    /// The username step was rejected; the password was never sent.
    UserRejected(crate::protocol::ErrorCode),
    /// The password step was rejected.
    PasswordRejected(crate::protocol::ErrorCode),
}

/// Terminal and state errors raised by session operations.
///
/// Server-reported failures are not errors at this level — they come back as
/// [`Response::Failure`] and the caller decides what to do with them.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The transport could not be established.
    #[error("failed to connect: {0}")]
    Connect(#[source] io::Error),

    /// The transport failed mid-session. Terminal: there is no reconnect.
    #[error("transport error: {0}")]
    Io(#[from] io::Error),

    /// The wire contract was violated (unparseable response, or an argument
    /// that cannot be framed).
    #[error("protocol violation: {0}")]
    Protocol(#[from] ProtocolError),

    /// A command that requires authentication was issued too early.
    #[error("session is not authenticated")]
    NotAuthenticated,

    /// An authentication attempt on an already-authenticated session.
    #[error("session is already authenticated")]
    AlreadyAuthenticated,

    /// Any operation on a closed session.
    #[error("session is closed")]
    Closed,
}

/// Transient descriptor for one upload exchange.
///
/// The declared size is always the payload length, so the size sent in the
/// begin phase can never disagree with the bytes sent in the data phase.
#[derive(Debug, Clone)]
pub struct FileTransfer {
    path: String,
    data: Vec<u8>,
}

impl FileTransfer {
    /// Create a transfer for `path` (relative, `/`-separated) with the full
    /// file contents.
    pub fn new(path: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            path: path.into(),
            data,
        }
    }

    /// The relative path sent to the server.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Payload size in bytes, as declared in the begin phase.
    pub fn size(&self) -> u64 {
        self.data.len() as u64
    }

    /// The raw payload.
    pub fn data(&self) -> &[u8] {
        &self.data
    }
}

/// One protocol session over one connection.
pub struct Session<S> {
    stream: BufReader<S>,
    state: SessionState,
}

impl Session<TcpStream> {
    /// Establish the transport and return an unauthenticated session.
    pub async fn connect(host: &str, port: u16) -> Result<Self, SessionError> {
        let stream = TcpStream::connect((host, port))
            .await
            .map_err(SessionError::Connect)?;
        debug!("connected to {}:{}", host, port);
        Ok(Self::new(stream))
    }
}

impl<S: AsyncRead + AsyncWrite + Unpin> Session<S> {
    /// Wrap an already-established transport.
    ///
    /// Tests drive this over [`tokio::io::duplex`]; production code goes
    /// through [`Session::connect`].
    pub fn new(stream: S) -> Self {
        Self {
            stream: BufReader::new(stream),
            state: SessionState::Unauthenticated,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Perform one username + password attempt.
    ///
    /// Two sequential exchanges: the username command, then — only if the
    /// username was accepted — the password command. A rejection on either
    /// step is reported in the outcome and leaves the session
    /// `Unauthenticated`; on [`AuthOutcome::Accepted`] the session becomes
    /// `Authenticated`.
    pub async fn authenticate(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<AuthOutcome, SessionError> {
        match self.state {
            SessionState::Unauthenticated => {}
            SessionState::Authenticated => return Err(SessionError::AlreadyAuthenticated),
            SessionState::Closed => return Err(SessionError::Closed),
        }

        let response = self.exchange(&Command::User(username.to_string())).await?;
        if let Response::Failure(code) = response {
            debug!("username rejected: {}", code);
            return Ok(AuthOutcome::UserRejected(code));
        }

        let response = self
            .exchange(&Command::Password(password.to_string()))
            .await?;
        if let Response::Failure(code) = response {
            debug!("password rejected: {}", code);
            return Ok(AuthOutcome::PasswordRejected(code));
        }

        self.state = SessionState::Authenticated;
        debug!("session authenticated as {}", username);
        Ok(AuthOutcome::Accepted)
    }

    /// Perform one request/response exchange.
    ///
    /// Requires an authenticated session; [`Command::Exit`] is the one
    /// command also allowed beforehand, and transitions the session to
    /// `Closed` after its response is read.
    pub async fn request(&mut self, command: Command) -> Result<Response, SessionError> {
        match self.state {
            SessionState::Closed => return Err(SessionError::Closed),
            SessionState::Unauthenticated if !matches!(command, Command::Exit) => {
                return Err(SessionError::NotAuthenticated);
            }
            _ => {}
        }

        let response = self.exchange(&command).await?;
        if matches!(command, Command::Exit) {
            self.state = SessionState::Closed;
            debug!("session closed");
        }
        Ok(response)
    }

    /// Upload a file in the protocol's two-phase form.
    ///
    /// Phase one declares path and size; a failure response there aborts the
    /// upload with zero payload bytes written. Phase two sends the data
    /// marker line followed immediately by exactly the declared number of
    /// raw bytes — the payload has no terminator of its own — then reads the
    /// final response.
    pub async fn upload(&mut self, transfer: &FileTransfer) -> Result<Response, SessionError> {
        match self.state {
            SessionState::Authenticated => {}
            SessionState::Unauthenticated => return Err(SessionError::NotAuthenticated),
            SessionState::Closed => return Err(SessionError::Closed),
        }

        let begin = Command::UploadBegin {
            path: transfer.path().to_string(),
            size: transfer.size(),
        };
        let response = self.exchange(&begin).await?;
        if response.is_failure() {
            return Ok(response);
        }

        let marker = Command::UploadData.encode()?;
        let result = self.send_payload(&marker, transfer.data()).await;
        if result.is_err() {
            self.state = SessionState::Closed;
        }
        result
    }

    /// Send the exit command and release the connection.
    pub async fn exit(&mut self) -> Result<Response, SessionError> {
        self.request(Command::Exit).await
    }

    /// One half-duplex exchange. Encoding happens before anything touches
    /// the wire, so an unencodable command leaves the session usable; a
    /// transport or framing error closes it.
    async fn exchange(&mut self, command: &Command) -> Result<Response, SessionError> {
        let line = command.encode()?;
        debug!("sending {} command", command.token());

        let result = self.send_and_read(&line).await;
        if result.is_err() {
            self.state = SessionState::Closed;
        }
        result
    }

    async fn send_and_read(&mut self, line: &[u8]) -> Result<Response, SessionError> {
        self.stream.write_all(line).await?;
        self.stream.flush().await?;
        self.read_response().await
    }

    async fn send_payload(
        &mut self,
        marker: &[u8],
        payload: &[u8],
    ) -> Result<Response, SessionError> {
        self.stream.write_all(marker).await?;
        self.stream.write_all(payload).await?;
        self.stream.flush().await?;
        self.read_response().await
    }

    /// Blocking read of exactly one response line.
    async fn read_response(&mut self) -> Result<Response, SessionError> {
        let mut line = String::new();
        let n = self.stream.read_line(&mut line).await?;
        if n == 0 {
            return Err(SessionError::Io(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "server closed the connection",
            )));
        }

        let trimmed = line
            .strip_suffix("\r\n")
            .or_else(|| line.strip_suffix('\n'))
            .unwrap_or(&line);
        Ok(Response::decode(trimmed)?)
    }
}
