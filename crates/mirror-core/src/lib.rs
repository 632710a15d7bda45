//! mirror-core: protocol library for the directory-mirroring client.
//!
//! This crate provides the client's view of the line-oriented mirroring
//! protocol:
//! - The fixed error catalog translating server failure codes
//! - Command encoding and response decoding (wire codec)
//! - The [`Session`] state machine owning one connection through
//!   authentication, mirrored operations and shutdown

pub mod catalog;
pub mod protocol;
pub mod session;

pub use protocol::{Command, ErrorCode, ProtocolError, Response};
pub use session::{AuthOutcome, FileTransfer, Session, SessionError, SessionState};
