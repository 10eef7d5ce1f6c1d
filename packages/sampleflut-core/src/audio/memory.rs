use bytes::Bytes;

use super::{PcmSource, PcmSpec, SourceError, SourceResult};

/// A PCM recording held in memory.
///
/// Useful for embedding the client with audio produced elsewhere and for
/// driving the sample buffer without touching the filesystem.
#[derive(Debug, Clone)]
pub struct MemorySource {
    spec: PcmSpec,
    pcm: Bytes,
    position: u64,
}

impl MemorySource {
    /// Creates a source from raw interleaved 16-bit little-endian PCM.
    ///
    /// The total frame count is derived from the byte length; a trailing
    /// partial frame is not counted.
    pub fn from_pcm(frame_rate: u32, channels: u16, pcm: impl Into<Bytes>) -> Self {
        let pcm = pcm.into();
        let frame_bytes = PcmSpec::new(frame_rate, 0, channels).frame_bytes().max(1);
        let total_frames = (pcm.len() / frame_bytes) as u64;
        Self {
            spec: PcmSpec::new(frame_rate, total_frames, channels),
            pcm,
            position: 0,
        }
    }

    /// Creates a source from interleaved samples.
    pub fn from_samples(frame_rate: u32, channels: u16, samples: &[i16]) -> Self {
        let pcm: Vec<u8> = samples.iter().flat_map(|s| s.to_le_bytes()).collect();
        Self::from_pcm(frame_rate, channels, pcm)
    }
}

impl PcmSource for MemorySource {
    fn spec(&self) -> PcmSpec {
        self.spec
    }

    fn seek(&mut self, frame: u64) -> SourceResult<()> {
        if frame > self.spec.total_frames {
            return Err(SourceError::OutOfRange {
                frame_index: frame,
                total_frames: self.spec.total_frames,
            });
        }
        self.position = frame;
        Ok(())
    }

    fn read_remaining(&mut self) -> SourceResult<Bytes> {
        let start = self.position as usize * self.spec.frame_bytes();
        let end = self.spec.total_frames as usize * self.spec.frame_bytes();
        self.position = self.spec.total_frames;
        // Bytes::slice is O(1), no copy.
        Ok(self.pcm.slice(start..end))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_trailing_frame_is_not_counted() {
        let source = MemorySource::from_samples(44100, 2, &[1, 2, 3]);
        assert_eq!(source.spec().total_frames, 1);
    }

    #[test]
    fn read_remaining_starts_at_seek_position() {
        let mut source = MemorySource::from_samples(10, 1, &[7, 8, 9]);
        source.seek(1).unwrap();
        let pcm = source.read_remaining().unwrap();
        assert_eq!(&pcm[..], &[8, 0, 9, 0]);
    }

    #[test]
    fn seek_to_end_reads_nothing() {
        let mut source = MemorySource::from_samples(10, 1, &[7, 8]);
        source.seek(2).unwrap();
        assert!(source.read_remaining().unwrap().is_empty());
    }
}
