//! Error types for the reading pipeline
//!
//! Propagation policy, in one place:
//!
//! - [`DecodeError`] is always recovered locally. The offending fragment is
//!   dropped, the error is logged, and the pipeline resumes framing. A decode
//!   failure never touches reconciliation state.
//! - [`SinkError`] is recovered at the sink boundary. Reconciler correctness
//!   is independent of sink availability.
//! - [`SourceError`] is the only fatal kind: a permanently closed line source
//!   ends the run loop, and the process-level policy (reconnect or exit)
//!   belongs to the caller.
//!
//! Variants stay small and carry `&'static str` field names where a name is
//! all the context a reader needs.

use thiserror::Error;

/// Errors raised by a [`LineSource`](crate::source::LineSource).
#[derive(Debug, Error)]
pub enum SourceError {
    /// The stream is permanently closed (EOF, unplugged bridge, dead link).
    #[error("line source disconnected")]
    Disconnected,

    /// Transport failure from the underlying reader.
    ///
    /// Read timeouts surface here too; whether a timeout means "dead link"
    /// is the line source owner's liveness policy.
    #[error("line source I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// A fragment that could not be turned into a reading.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    /// The fragment's markup is not the expected open/leaf/close shape.
    #[error("malformed fragment: {0}")]
    MalformedFragment(&'static str),

    /// A required leaf element is absent.
    #[error("missing required field <{0}>")]
    MissingField(&'static str),

    /// A leaf element's text is not parseable hexadecimal.
    #[error("field <{field}> is not hexadecimal: {text:?}")]
    NonHexField {
        /// Leaf element name.
        field: &'static str,
        /// The offending text content.
        text: String,
    },

    /// A field that is never legitimately zero decoded as zero.
    ///
    /// Zero timestamps, quantities, and scaling factors are the signature of
    /// a partially-populated fragment.
    #[error("field <{0}> is zero")]
    ZeroField(&'static str),
}

/// A sink adapter failure.
///
/// Sinks report these so the pipeline can count and log them; they never
/// propagate past the emission loop.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The sink has no usable connection.
    #[error("not connected")]
    NotConnected,

    /// Connecting to the sink endpoint failed.
    #[error("connect failed: {0}")]
    Connect(String),

    /// Delivering a payload failed.
    #[error("write failed: {0}")]
    Write(String),

    /// The observation could not be encoded for this sink.
    #[error("payload encoding failed: {0}")]
    Encode(String),

    /// The sink was constructed with an unusable configuration.
    #[error("configuration error: {0}")]
    Config(String),
}
