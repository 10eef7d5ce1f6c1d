//! End-to-end client run: load samples, connect, handshake, stream.
//!
//! Samples are loaded before connecting so a bad file never opens a socket.

use tokio_util::sync::CancellationToken;

use crate::audio::{SampleBuffer, WavSource};
use crate::config::ClientConfig;
use crate::error::{SampleflutError, SampleflutResult};
use crate::session::{self, StreamSummary};

/// Loads the configured WAV file into a mono sample buffer.
pub fn load_samples(config: &ClientConfig) -> SampleflutResult<SampleBuffer> {
    let mut source = WavSource::open(&config.wav_path)?;
    Ok(SampleBuffer::load(
        &mut source,
        config.whole_offset_seconds(),
    )?)
}

/// Runs the client until `cancel` fires or a fatal error occurs.
///
/// The streaming loop never finishes on its own; an `Ok` result means the
/// run was cancelled or there was nothing to stream.
pub fn run_client(
    config: &ClientConfig,
    cancel: &CancellationToken,
) -> SampleflutResult<StreamSummary> {
    config.validate().map_err(SampleflutError::Configuration)?;

    let samples = load_samples(config)?;
    Ok(session::run(config, &samples, cancel)?)
}
