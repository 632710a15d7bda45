//! Wire protocol definitions for the mirroring client.
//!
//! Requests and responses are single ASCII lines terminated by `\r\n`:
//! - Requests: a four-character command token followed by its arguments,
//!   joined by `?` (see [`command`])
//! - Responses: an opaque success line, or `ER<code>` reporting a failure
//!   from the error catalog (see [`response`])

pub mod command;
pub mod response;

pub use command::{ARG_DELIMITER, Command, LINE_TERMINATOR};
pub use response::{ERROR_MARKER, ErrorCode, Response};

use thiserror::Error;

/// A violation of the wire contract, on either side of the connection.
///
/// Distinct from a server-reported [`Response::Failure`]: a failure is a
/// well-formed protocol outcome, a `ProtocolError` means the exchange itself
/// could not be framed or understood.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The wire defines no escaping, so an argument containing the delimiter
    /// or a line terminator cannot be represented unambiguously.
    #[error("argument contains a reserved wire character: {0:?}")]
    InvalidArgument(String),

    /// A response line started with the error marker but the code was not
    /// numeric.
    #[error("malformed error code in response line {0:?}")]
    MalformedCode(String),

    /// A numeric error code outside the fixed catalog.
    #[error("error code {0} is outside the catalog")]
    UnknownCode(u32),
}
