//! Centralized error types for the sampleflut core library.
//!
//! Each module defines its own `thiserror` enum. [`SampleflutError`] gathers
//! them so the binary can report which phase of the run failed.

use thiserror::Error;

use crate::audio::SourceError;
use crate::protocol::ProtocolError;
use crate::session::SessionError;

/// Trait for error types that provide machine-readable error codes.
pub trait ErrorCode {
    /// Returns a machine-readable error code.
    fn code(&self) -> &'static str;
}

impl ErrorCode for SourceError {
    fn code(&self) -> &'static str {
        match self {
            Self::Open { .. } => "audio_open_failed",
            Self::Decode(_) => "audio_decode_failed",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::OutOfRange { .. } => "offset_out_of_range",
        }
    }
}

impl ErrorCode for ProtocolError {
    fn code(&self) -> &'static str {
        match self {
            Self::EmptyResponse => "handshake_empty",
            Self::NotUtf8 => "handshake_not_utf8",
            Self::InvalidCapacity(_) => "handshake_not_numeric",
            Self::ZeroCapacity => "handshake_zero_capacity",
            Self::Timeout(_) => "handshake_timeout",
        }
    }
}

impl ErrorCode for SessionError {
    fn code(&self) -> &'static str {
        match self {
            Self::Connect { .. } => "connect_failed",
            Self::Protocol(e) => e.code(),
            Self::Connection { .. } => "connection_lost",
        }
    }
}

/// Application-wide error type for the sampleflut client.
#[derive(Debug, Error)]
pub enum SampleflutError {
    /// The audio file could not be turned into samples.
    #[error(transparent)]
    Source(#[from] SourceError),

    /// Connecting, handshaking or sending failed.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Client configuration is invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl SampleflutError {
    /// Returns a machine-readable error code.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Source(e) => e.code(),
            Self::Session(e) => e.code(),
            Self::Configuration(_) => "configuration_error",
        }
    }

    /// Names the phase of the run that failed, for user-facing messages.
    pub fn phase(&self) -> &'static str {
        match self {
            Self::Source(_) => "audio decode",
            Self::Session(e) => e.phase().as_str(),
            Self::Configuration(_) => "configuration",
        }
    }
}

impl From<ProtocolError> for SampleflutError {
    fn from(err: ProtocolError) -> Self {
        Self::Session(SessionError::Protocol(err))
    }
}

/// Convenient Result alias for application-wide operations.
pub type SampleflutResult<T> = Result<T, SampleflutError>;
