//! Client configuration.
//!
//! Everything the client needs is carried in one [`ClientConfig`] value that
//! is passed explicitly to the sample loader and the session.

use std::path::PathBuf;
use std::time::Duration;

use crate::protocol_constants::{
    DEFAULT_HANDSHAKE_TIMEOUT, DEFAULT_SERVER_HOST, DEFAULT_SERVER_PORT,
};

/// Configuration for one client run.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// WAV file to stream.
    pub wav_path: PathBuf,

    /// Where in the recording to start (seconds).
    ///
    /// Truncated to whole seconds before the frame offset is computed.
    pub offset_seconds: f64,

    /// Server hostname or IP address.
    pub host: String,

    /// Server TCP port.
    pub port: u16,

    /// How long to wait for the handshake response.
    pub handshake_timeout: Duration,

    /// Optional bound on each blocking send.
    pub send_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            wav_path: PathBuf::new(),
            offset_seconds: 0.0,
            host: DEFAULT_SERVER_HOST.to_string(),
            port: DEFAULT_SERVER_PORT,
            handshake_timeout: DEFAULT_HANDSHAKE_TIMEOUT,
            send_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Creates a configuration for `wav_path` with default server settings.
    pub fn new(wav_path: impl Into<PathBuf>) -> Self {
        Self {
            wav_path: wav_path.into(),
            ..Default::default()
        }
    }

    /// Validates the configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.wav_path.as_os_str().is_empty() {
            return Err("wav_path must be set".to_string());
        }
        if !self.offset_seconds.is_finite() || self.offset_seconds < 0.0 {
            return Err(format!(
                "offset_seconds must be a non-negative number (got {})",
                self.offset_seconds
            ));
        }
        if self.host.trim().is_empty() {
            return Err("host must not be empty".to_string());
        }
        if self.port == 0 {
            return Err("port must be >= 1".to_string());
        }
        // A zero timeout is rejected by the socket API.
        if self.handshake_timeout.is_zero() {
            return Err("handshake_timeout must be > 0".to_string());
        }
        if self.send_timeout.is_some_and(|t| t.is_zero()) {
            return Err("send_timeout must be > 0 when set".to_string());
        }
        Ok(())
    }

    /// The offset truncated to whole seconds.
    pub fn whole_offset_seconds(&self) -> u64 {
        if self.offset_seconds.fract() != 0.0 {
            log::warn!(
                "[Config] Fractional offset {}s truncated to {}s",
                self.offset_seconds,
                self.offset_seconds.trunc()
            );
        }
        // Saturating float-to-int cast; validate() rejects negatives and NaN.
        self.offset_seconds as u64
    }

    /// `host:port` for logging and error messages.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
