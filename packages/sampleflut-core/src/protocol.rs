//! Encoding and parsing for the sampleflut line protocol.
//!
//! ```text
//! client -> server   CONFIG\n
//! server -> client   <max_size> ...\n
//! client -> server   SMPL <position> <value>\n   (repeated forever)
//! ```
//!
//! Everything here is pure; the socket lives in [`crate::session`].

use std::fmt::Write as _;
use std::time::Duration;

use bytes::BytesMut;
use thiserror::Error;

use crate::protocol_constants::{PCM_16BIT_FULL_SCALE, SAMPLE_COMMAND, SAMPLE_VALUE_PRECISION};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors raised while interpreting the server's handshake response.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The server closed the connection or sent only whitespace.
    #[error("Server sent an empty handshake response")]
    EmptyResponse,

    /// The response is not valid UTF-8.
    #[error("Handshake response is not valid UTF-8")]
    NotUtf8,

    /// The first token is not an unsigned integer.
    #[error("Handshake response does not start with a buffer size: {0:?}")]
    InvalidCapacity(String),

    /// The server announced a capacity of zero.
    #[error("Server announced a buffer size of 0")]
    ZeroCapacity,

    /// No response arrived within the handshake timeout.
    #[error("No handshake response within {0:?}")]
    Timeout(Duration),
}

/// Convenient Result alias for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

// ─────────────────────────────────────────────────────────────────────────────
// Handshake
// ─────────────────────────────────────────────────────────────────────────────

/// Buffer size announced by the server during the handshake.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServerCapacity {
    max_size: usize,
}

impl ServerCapacity {
    /// Creates a capacity, rejecting zero.
    pub fn new(max_size: usize) -> ProtocolResult<Self> {
        if max_size == 0 {
            return Err(ProtocolError::ZeroCapacity);
        }
        Ok(Self { max_size })
    }

    #[inline]
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Number of positions streamed per pass for a buffer of `buffer_len`
    /// samples: `min(max_size, buffer_len - 1)`.
    ///
    /// The last sample of the buffer is never sent. Buffers shorter than two
    /// samples give an empty window.
    #[inline]
    pub fn window_for(&self, buffer_len: usize) -> usize {
        self.max_size.min(buffer_len.saturating_sub(1))
    }
}

/// Parses the handshake response. Only the first whitespace-delimited token
/// is significant.
pub fn parse_capacity(response: &[u8]) -> ProtocolResult<ServerCapacity> {
    let text = std::str::from_utf8(response).map_err(|_| ProtocolError::NotUtf8)?;
    let token = text
        .split_whitespace()
        .next()
        .ok_or(ProtocolError::EmptyResponse)?;
    let max_size = token
        .parse::<usize>()
        .map_err(|_| ProtocolError::InvalidCapacity(token.to_string()))?;
    ServerCapacity::new(max_size)
}

// ─────────────────────────────────────────────────────────────────────────────
// Sample Lines
// ─────────────────────────────────────────────────────────────────────────────

/// Maps a 16-bit sample into `[-1.0, 1.0)`.
#[inline]
pub fn normalize(sample: i16) -> f64 {
    f64::from(sample) / PCM_16BIT_FULL_SCALE
}

/// Appends `SMPL <position> <value>\n` to `buf`.
///
/// `value` is rendered fixed-point with exactly seven fractional digits.
pub fn write_sample_line(buf: &mut BytesMut, position: usize, value: f64) {
    // BytesMut grows on demand, so formatting into it cannot fail.
    let _ = writeln!(
        buf,
        "{SAMPLE_COMMAND} {position} {value:.prec$}",
        prec = SAMPLE_VALUE_PRECISION
    );
}

/// Renders a single sample line as a `String`.
pub fn sample_line(position: usize, value: f64) -> String {
    format!(
        "{SAMPLE_COMMAND} {position} {value:.prec$}\n",
        prec = SAMPLE_VALUE_PRECISION
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_first_token_only() {
        let capacity = parse_capacity(b"500 samples max\n").unwrap();
        assert_eq!(capacity.max_size(), 500);
    }

    #[test]
    fn tolerates_leading_whitespace() {
        assert_eq!(parse_capacity(b"  \n42\n").unwrap().max_size(), 42);
    }

    #[test]
    fn empty_response_is_rejected() {
        assert!(matches!(parse_capacity(b""), Err(ProtocolError::EmptyResponse)));
        assert!(matches!(
            parse_capacity(b" \r\n"),
            Err(ProtocolError::EmptyResponse)
        ));
    }

    #[test]
    fn non_numeric_response_is_rejected() {
        let err = parse_capacity(b"ERROR unknown command\n").unwrap_err();
        assert!(matches!(err, ProtocolError::InvalidCapacity(ref t) if t == "ERROR"));
        assert!(matches!(
            parse_capacity(b"-5\n"),
            Err(ProtocolError::InvalidCapacity(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_rejected() {
        assert!(matches!(
            parse_capacity(&[0xff, 0xfe]),
            Err(ProtocolError::NotUtf8)
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            parse_capacity(b"0\n"),
            Err(ProtocolError::ZeroCapacity)
        ));
    }

    #[test]
    fn window_is_bounded_by_capacity_and_buffer() {
        let capacity = ServerCapacity::new(500).unwrap();
        assert_eq!(capacity.window_for(300), 299);
        assert_eq!(capacity.window_for(10_000), 500);
        assert_eq!(capacity.window_for(1), 0);
        assert_eq!(capacity.window_for(0), 0);
    }

    #[test]
    fn normalization_stays_in_range() {
        for sample in i16::MIN..=i16::MAX {
            let value = normalize(sample);
            assert!((-1.0..1.0).contains(&value), "{sample} -> {value}");
        }
    }

    #[test]
    fn normalization_extremes_render_as_expected() {
        assert_eq!(sample_line(0, normalize(i16::MIN)), "SMPL 0 -1.0000000\n");
        assert_eq!(sample_line(0, normalize(i16::MAX)), "SMPL 0 0.9999695\n");
        assert_eq!(sample_line(0, normalize(0)), "SMPL 0 0.0000000\n");
    }

    #[test]
    fn line_format_is_exact() {
        assert_eq!(sample_line(42, -0.1234567), "SMPL 42 -0.1234567\n");
    }

    #[test]
    fn buffered_line_matches_string_line() {
        let mut buf = BytesMut::new();
        write_sample_line(&mut buf, 7, normalize(-16384));
        assert_eq!(&buf[..], b"SMPL 7 -0.5000000\n");

        buf.clear();
        write_sample_line(&mut buf, 8, normalize(1));
        assert_eq!(&buf[..], sample_line(8, normalize(1)).as_bytes());
    }
}
