//! Audio input: decoded PCM sources and the mono sample buffer built from them.
//!
//! [`PcmSource`] is the seam between container decoding and the streaming
//! core. The core only needs frame metadata, a seek, and the raw interleaved
//! 16-bit little-endian PCM from that point onward.

pub mod memory;
pub mod samples;
pub mod wav;

pub use memory::MemorySource;
pub use samples::{decode_le_samples, downmix_stereo, frame_index, SampleBuffer};
pub use wav::WavSource;

use std::path::PathBuf;

use bytes::Bytes;
use thiserror::Error;

// ─────────────────────────────────────────────────────────────────────────────
// Error Types
// ─────────────────────────────────────────────────────────────────────────────

/// Errors that can occur while turning an audio file into samples.
#[derive(Debug, Error)]
pub enum SourceError {
    /// The file could not be opened or its header could not be parsed.
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: hound::Error,
    },

    /// Reading or seeking within the PCM data failed.
    #[error("Failed to decode PCM data: {0}")]
    Decode(#[from] hound::Error),

    /// The recording is not 16-bit integer PCM with one or two channels.
    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    /// The requested offset lies at or beyond the end of the recording.
    #[error("Offset frame {frame_index} is beyond the {total_frames} frames available")]
    OutOfRange { frame_index: u64, total_frames: u64 },
}

/// Convenient Result alias for audio source operations.
pub type SourceResult<T> = Result<T, SourceError>;

// ─────────────────────────────────────────────────────────────────────────────
// Source Capability
// ─────────────────────────────────────────────────────────────────────────────

/// Frame metadata of a decoded recording.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PcmSpec {
    /// Frames per second (Hz).
    pub frame_rate: u32,
    /// Total number of frames in the recording.
    pub total_frames: u64,
    /// Interleaved channels per frame.
    pub channels: u16,
}

impl PcmSpec {
    /// Creates a new spec.
    pub fn new(frame_rate: u32, total_frames: u64, channels: u16) -> Self {
        Self {
            frame_rate,
            total_frames,
            channels,
        }
    }

    /// Returns the byte length of one interleaved frame.
    #[inline]
    pub const fn frame_bytes(&self) -> usize {
        crate::protocol_constants::PCM_16BIT_BYTES_PER_SAMPLE * self.channels as usize
    }
}

/// A decoded 16-bit PCM recording that can be positioned and read.
///
/// Implementations are expected to be single-use: seek once, read once.
pub trait PcmSource {
    /// Returns the recording's frame metadata.
    fn spec(&self) -> PcmSpec;

    /// Positions the read cursor at `frame`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::OutOfRange`] if `frame` is past the end.
    fn seek(&mut self, frame: u64) -> SourceResult<()>;

    /// Reads every frame from the cursor to the end of the recording.
    ///
    /// The result is raw interleaved signed 16-bit little-endian PCM.
    fn read_remaining(&mut self) -> SourceResult<Bytes>;
}
