//! Sampleflut Core - streams WAV samples to a sampleflut server.
//!
//! A sampleflut server accepts normalized audio samples over a tiny line
//! protocol and announces how many sample positions it holds. This crate
//! turns a WAV recording into mono samples and floods them to the server,
//! replaying the same window forever.
//!
//! # Architecture
//!
//! - [`audio`]: PCM source capability, `hound` WAV decoding, mono sample buffer
//! - [`protocol`]: `CONFIG` handshake parsing and `SMPL` line encoding
//! - [`session`]: TCP connection, handshake and the unbounded send loop
//! - [`client`]: wires the pieces together for one run
//! - [`config`]: explicit client configuration
//! - [`error`]: centralized error types

#![warn(clippy::all)]

pub mod audio;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod protocol_constants;
pub mod session;

// Re-export commonly used types at the crate root
pub use audio::{MemorySource, PcmSource, PcmSpec, SampleBuffer, SourceError, WavSource};
pub use client::{load_samples, run_client};
pub use config::ClientConfig;
pub use error::{ErrorCode, SampleflutError, SampleflutResult};
pub use protocol::{ProtocolError, ServerCapacity};
pub use session::{SessionError, SessionPhase, StreamSummary, StreamingSession, Transport};

// Callers need the token type to cancel a run.
pub use tokio_util::sync::CancellationToken;
