//! Fixed protocol constants that should NOT be changed.
//!
//! These values are defined by the sampleflut server and the PCM format we
//! accept. Changing them breaks compatibility with deployed servers.

use std::time::Duration;

// ─────────────────────────────────────────────────────────────────────────────
// Sampleflut Wire Protocol
// ─────────────────────────────────────────────────────────────────────────────

/// Handshake request asking the server for its buffer capacity.
pub const CONFIG_REQUEST: &[u8] = b"CONFIG\n";

/// Command keyword that prefixes every sample line.
pub const SAMPLE_COMMAND: &str = "SMPL";

/// Number of fractional digits rendered for a normalized sample value.
pub const SAMPLE_VALUE_PRECISION: usize = 7;

/// Upper bound on the handshake response we read (bytes).
pub const HANDSHAKE_RESPONSE_MAX_BYTES: usize = 200;

/// Default time to wait for the handshake response.
pub const DEFAULT_HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(2);

/// Initial capacity of the reusable line buffer.
///
/// `SMPL 18446744073709551615 -1.0000000\n` is 36 bytes; 48 leaves headroom.
pub const SAMPLE_LINE_CAPACITY: usize = 48;

// ─────────────────────────────────────────────────────────────────────────────
// Server Defaults
// ─────────────────────────────────────────────────────────────────────────────

/// Public sampleflut instance.
pub const DEFAULT_SERVER_HOST: &str = "sampleflut.de";

/// Port the public sampleflut instance listens on.
pub const DEFAULT_SERVER_PORT: u16 = 8080;

// ─────────────────────────────────────────────────────────────────────────────
// Audio Standards
// ─────────────────────────────────────────────────────────────────────────────

/// The only bit depth we decode.
pub const PCM_BITS_PER_SAMPLE: u16 = 16;

/// Bytes per sample for 16-bit PCM audio.
pub const PCM_16BIT_BYTES_PER_SAMPLE: usize = 2;

/// Divisor mapping an `i16` sample into `[-1.0, 1.0)`.
pub const PCM_16BIT_FULL_SCALE: f64 = 32768.0;

// ─────────────────────────────────────────────────────────────────────────────
// Diagnostics
// ─────────────────────────────────────────────────────────────────────────────

/// Minimum interval between throughput reports while flooding.
pub const PROGRESS_LOG_INTERVAL: Duration = Duration::from_secs(10);

/// Lines sent between checks of the progress clock.
pub const PROGRESS_CHECK_LINES: u64 = 4096;
