//! Response line decoding.
//!
//! A response is one line. Lines starting with the `ER` marker followed by a
//! decimal code report a failure from the error catalog; every other line —
//! including the empty line — is a success. The success text is opaque and
//! carries no protocol meaning.

use super::ProtocolError;
use crate::catalog;
use std::fmt;

/// Marker prefix identifying a failure response line.
pub const ERROR_MARKER: &str = "ER";

/// A server-reported failure code, guaranteed to index the error catalog.
///
/// Construction goes through [`Response::decode`], which range-checks the
/// code, so [`ErrorCode::message`] is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorCode(u8);

impl ErrorCode {
    /// The numeric code as sent on the wire.
    pub fn value(&self) -> u8 {
        self.0
    }

    /// The catalog message for this code.
    pub fn message(&self) -> &'static str {
        catalog::lookup(self.0)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}: {}", ERROR_MARKER, self.0, self.message())
    }
}

/// Decoded server response to one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Response {
    /// Any line that is not an error report.
    Success,
    /// An `ER<code>` line.
    Failure(ErrorCode),
}

impl Response {
    /// Decode a response line (terminator already stripped).
    ///
    /// A line starting with [`ERROR_MARKER`] must carry a decimal code
    /// within the catalog; a non-numeric or out-of-catalog suffix is a
    /// protocol violation, not a failure report.
    pub fn decode(line: &str) -> Result<Self, ProtocolError> {
        let Some(digits) = line.strip_prefix(ERROR_MARKER) else {
            return Ok(Response::Success);
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ProtocolError::MalformedCode(line.to_string()));
        }

        let code: u32 = digits
            .parse()
            .map_err(|_| ProtocolError::MalformedCode(line.to_string()))?;
        if code as usize >= catalog::CATALOG_LEN {
            return Err(ProtocolError::UnknownCode(code));
        }

        Ok(Response::Failure(ErrorCode(code as u8)))
    }

    /// True for [`Response::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, Response::Success)
    }

    /// True for [`Response::Failure`].
    pub fn is_failure(&self) -> bool {
        matches!(self, Response::Failure(_))
    }
}
