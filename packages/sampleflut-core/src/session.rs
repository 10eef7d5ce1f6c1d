//! Streaming session: connect, handshake, then flood `SMPL` lines forever.
//!
//! The session is a single blocking flow. Writes block until the kernel
//! accepts the bytes, which is the only backpressure applied. Once streaming
//! starts the loop only ends on a connection failure or when the
//! [`CancellationToken`] is cancelled.

use std::fmt;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::time::{Duration, Instant};

use bytes::BytesMut;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use crate::audio::SampleBuffer;
use crate::config::ClientConfig;
use crate::protocol::{self, ProtocolError, ServerCapacity};
use crate::protocol_constants::{
    CONFIG_REQUEST, HANDSHAKE_RESPONSE_MAX_BYTES, PROGRESS_CHECK_LINES, PROGRESS_LOG_INTERVAL,
    SAMPLE_LINE_CAPACITY,
};

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Phase of the session an error occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    Connect,
    Handshake,
    Send,
}

impl SessionPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Connect => "connect",
            Self::Handshake => "handshake",
            Self::Send => "send",
        }
    }
}

impl fmt::Display for SessionPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors that end a streaming session.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The TCP connection could not be established.
    #[error("Failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The handshake response was missing, malformed or late.
    #[error("Handshake failed: {0}")]
    Protocol(#[from] ProtocolError),

    /// The established connection failed.
    #[error("Connection failed during {phase}: {source}")]
    Connection {
        phase: SessionPhase,
        #[source]
        source: io::Error,
    },
}

impl SessionError {
    /// Returns the phase the session was in when it failed.
    pub fn phase(&self) -> SessionPhase {
        match self {
            Self::Connect { .. } => SessionPhase::Connect,
            Self::Protocol(_) => SessionPhase::Handshake,
            Self::Connection { phase, .. } => *phase,
        }
    }

    fn io(phase: SessionPhase) -> impl FnOnce(io::Error) -> Self {
        move |source| Self::Connection { phase, source }
    }
}

/// Convenient Result alias for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

// ─────────────────────────────────────────────────────────────────────────────
// Transport
// ─────────────────────────────────────────────────────────────────────────────

/// Byte stream the session runs over.
///
/// Implemented for [`TcpStream`]; other implementations exist for tests.
pub trait Transport: Read + Write {
    /// Bounds how long a read may block (`None` = forever).
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;

    /// Bounds how long a write may block (`None` = forever).
    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()>;
}

impl Transport for TcpStream {
    fn set_read_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_read_timeout(self, timeout)
    }

    fn set_write_timeout(&self, timeout: Option<Duration>) -> io::Result<()> {
        TcpStream::set_write_timeout(self, timeout)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Session
// ─────────────────────────────────────────────────────────────────────────────

/// Counters reported when streaming stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamSummary {
    /// Positions streamed per pass.
    pub window: usize,
    /// Passes over the whole window that completed.
    pub passes: u64,
    /// `SMPL` lines written.
    pub lines_sent: u64,
    /// Bytes written after the handshake.
    pub bytes_sent: u64,
}

/// A connection to one sampleflut server.
pub struct StreamingSession<T: Transport = TcpStream> {
    transport: T,
    peer: String,
}

impl StreamingSession<TcpStream> {
    /// Opens a TCP connection to the configured server.
    pub fn connect(config: &ClientConfig) -> SessionResult<Self> {
        let addr = config.server_addr();
        log::info!("[Session] Connecting to {}", addr);

        let stream = TcpStream::connect((config.host.as_str(), config.port)).map_err(|source| {
            SessionError::Connect {
                addr: addr.clone(),
                source,
            }
        })?;
        Transport::set_write_timeout(&stream, config.send_timeout)
            .map_err(SessionError::io(SessionPhase::Connect))?;

        log::info!("[Session] Connected to {}", addr);
        Ok(Self::new(stream, addr))
    }
}

impl<T: Transport> StreamingSession<T> {
    /// Wraps an established transport.
    pub fn new(transport: T, peer: impl Into<String>) -> Self {
        Self {
            transport,
            peer: peer.into(),
        }
    }

    /// Consumes the session and returns the transport.
    pub fn into_inner(self) -> T {
        self.transport
    }

    /// Sends `CONFIG` and reads the server's buffer capacity.
    ///
    /// A single read of at most 200 bytes is made, bounded by `timeout`.
    pub fn handshake(&mut self, timeout: Duration) -> SessionResult<ServerCapacity> {
        self.transport
            .write_all(CONFIG_REQUEST)
            .map_err(SessionError::io(SessionPhase::Handshake))?;
        self.transport
            .set_read_timeout(Some(timeout))
            .map_err(SessionError::io(SessionPhase::Handshake))?;

        let mut response = [0u8; HANDSHAKE_RESPONSE_MAX_BYTES];
        let n = match self.transport.read(&mut response) {
            Ok(n) => n,
            // Unix reports an expired timeout as WouldBlock, Windows as TimedOut.
            Err(e) if matches!(e.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut) => {
                return Err(ProtocolError::Timeout(timeout).into());
            }
            Err(e) => return Err(SessionError::io(SessionPhase::Handshake)(e)),
        };
        if n == 0 {
            return Err(ProtocolError::EmptyResponse.into());
        }

        let capacity = protocol::parse_capacity(&response[..n])?;
        log::info!(
            "[Session] {} accepts up to {} samples",
            self.peer,
            capacity.max_size()
        );
        Ok(capacity)
    }

    /// Streams the sample window until cancelled or the connection fails.
    ///
    /// Positions `0..W` are sent in ascending order, then the pass repeats
    /// from 0, where `W = capacity.window_for(samples.len())`. With an empty
    /// window nothing is sent and the summary is returned immediately.
    pub fn stream(
        &mut self,
        samples: &SampleBuffer,
        capacity: ServerCapacity,
        cancel: &CancellationToken,
    ) -> SessionResult<StreamSummary> {
        let window = capacity.window_for(samples.len());
        let mut summary = StreamSummary {
            window,
            ..StreamSummary::default()
        };

        if window == 0 {
            if samples.is_empty() {
                log::warn!("[Session] Nothing to stream: no samples loaded");
            } else {
                log::warn!(
                    "[Session] Nothing to stream: {} sample(s) loaded, server capacity {}",
                    samples.len(),
                    capacity.max_size()
                );
            }
            return Ok(summary);
        }

        log::info!(
            "[Session] Streaming {} positions to {} (buffer {}, capacity {})",
            window,
            self.peer,
            samples.len(),
            capacity.max_size()
        );

        let window_samples = &samples.as_slice()[..window];
        let mut line = BytesMut::with_capacity(SAMPLE_LINE_CAPACITY);
        let mut throughput =
            ThroughputLog::new(Instant::now(), PROGRESS_LOG_INTERVAL, PROGRESS_CHECK_LINES);

        loop {
            for (position, &sample) in window_samples.iter().enumerate() {
                if cancel.is_cancelled() {
                    log::info!(
                        "[Session] Cancelled after {} passes ({} lines, {} bytes)",
                        summary.passes,
                        summary.lines_sent,
                        summary.bytes_sent
                    );
                    return Ok(summary);
                }

                line.clear();
                protocol::write_sample_line(&mut line, position, protocol::normalize(sample));
                self.transport
                    .write_all(&line)
                    .map_err(SessionError::io(SessionPhase::Send))?;

                summary.lines_sent += 1;
                summary.bytes_sent += line.len() as u64;

                if let Some(rate) = throughput.tick(summary.lines_sent) {
                    log::info!(
                        "[Session] {} passes, {} lines sent ({:.0} lines/s)",
                        summary.passes,
                        summary.lines_sent,
                        rate
                    );
                }
            }

            summary.passes += 1;
            log::debug!("[Session] Completed pass {}", summary.passes);
        }
    }
}

/// Rate-limited throughput reporting for the flood loop.
///
/// The clock is read only every `check_every` lines, so reports keep their
/// interval even when a single pass is very long.
struct ThroughputLog {
    started: Instant,
    last_report: Instant,
    interval: Duration,
    check_every: u64,
}

impl ThroughputLog {
    fn new(started: Instant, interval: Duration, check_every: u64) -> Self {
        Self {
            started,
            last_report: started,
            interval,
            check_every: check_every.max(1),
        }
    }

    /// Returns the average lines/s when a report is due after `lines_sent`.
    fn tick(&mut self, lines_sent: u64) -> Option<f64> {
        if lines_sent % self.check_every != 0 {
            return None;
        }
        self.report_at(lines_sent, Instant::now())
    }

    fn report_at(&mut self, lines_sent: u64, now: Instant) -> Option<f64> {
        if now.duration_since(self.last_report) < self.interval {
            return None;
        }
        self.last_report = now;
        let secs = now
            .duration_since(self.started)
            .as_secs_f64()
            .max(f64::EPSILON);
        Some(lines_sent as f64 / secs)
    }
}

/// Connects, handshakes and streams `samples` until cancelled or failed.
pub fn run(
    config: &ClientConfig,
    samples: &SampleBuffer,
    cancel: &CancellationToken,
) -> SessionResult<StreamSummary> {
    let mut session = StreamingSession::connect(config)?;
    let capacity = session.handshake(config.handshake_timeout)?;
    session.stream(samples, capacity, cancel)
}
