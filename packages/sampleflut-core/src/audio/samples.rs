use super::{PcmSource, SourceError, SourceResult};
use crate::protocol_constants::PCM_16BIT_BYTES_PER_SAMPLE;

/// Computes the frame a whole-second offset starts at.
///
/// Returns `None` on overflow.
#[inline]
pub fn frame_index(offset_seconds: u64, frame_rate: u32) -> Option<u64> {
    offset_seconds.checked_mul(u64::from(frame_rate))
}

/// Decodes interleaved signed 16-bit little-endian PCM.
///
/// A trailing odd byte is ignored.
pub fn decode_le_samples(pcm: &[u8]) -> Vec<i16> {
    pcm.chunks_exact(PCM_16BIT_BYTES_PER_SAMPLE)
        .map(|b| i16::from_le_bytes([b[0], b[1]]))
        .collect()
}

/// Averages each interleaved stereo pair into one mono sample.
///
/// The mean is truncated toward zero. A trailing unpaired sample is dropped.
pub fn downmix_stereo(interleaved: &[i16]) -> Vec<i16> {
    interleaved
        .chunks_exact(2)
        .map(|pair| ((i32::from(pair[0]) + i32::from(pair[1])) / 2) as i16)
        .collect()
}

/// Mono samples extracted from a recording, starting at a time offset.
///
/// Built once and never mutated; the streaming loop replays it forever.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: Vec<i16>,
    frame_rate: u32,
    frame_offset: u64,
}

impl SampleBuffer {
    /// Reads every frame from `offset_seconds` onward and reduces it to mono.
    ///
    /// # Errors
    ///
    /// - [`SourceError::UnsupportedFormat`] for channel counts other than 1 or 2
    /// - [`SourceError::OutOfRange`] if the offset is at or past the last frame
    pub fn load<S: PcmSource + ?Sized>(source: &mut S, offset_seconds: u64) -> SourceResult<Self> {
        let spec = source.spec();
        if !matches!(spec.channels, 1 | 2) {
            return Err(SourceError::UnsupportedFormat(format!(
                "{} channels (expected mono or stereo)",
                spec.channels
            )));
        }

        let frame_offset =
            frame_index(offset_seconds, spec.frame_rate).ok_or(SourceError::OutOfRange {
                frame_index: u64::MAX,
                total_frames: spec.total_frames,
            })?;
        if frame_offset >= spec.total_frames {
            return Err(SourceError::OutOfRange {
                frame_index: frame_offset,
                total_frames: spec.total_frames,
            });
        }

        log::debug!(
            "[Audio] Offset {}s at {} Hz -> frame {}",
            offset_seconds,
            spec.frame_rate,
            frame_offset
        );

        source.seek(frame_offset)?;
        let interleaved = decode_le_samples(&source.read_remaining()?);
        let samples = if spec.channels == 2 {
            downmix_stereo(&interleaved)
        } else {
            interleaved
        };

        log::info!(
            "[Audio] Loaded {} mono samples starting at frame {}",
            samples.len(),
            frame_offset
        );

        Ok(Self {
            samples,
            frame_rate: spec.frame_rate,
            frame_offset,
        })
    }

    /// Wraps samples that are already mono.
    pub fn from_mono(frame_rate: u32, samples: Vec<i16>) -> Self {
        Self {
            samples,
            frame_rate,
            frame_offset: 0,
        }
    }

    #[inline]
    pub fn as_slice(&self) -> &[i16] {
        &self.samples
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Frame rate of the recording the samples came from (Hz).
    #[inline]
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// First frame of the recording included in this buffer.
    #[inline]
    pub fn frame_offset(&self) -> u64 {
        self.frame_offset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::MemorySource;

    #[test]
    fn frame_index_is_offset_times_rate() {
        assert_eq!(frame_index(2, 44100), Some(88200));
        assert_eq!(frame_index(0, 44100), Some(0));
        assert_eq!(frame_index(u64::MAX, 2), None);
    }

    #[test]
    fn downmix_truncates_mean() {
        assert_eq!(downmix_stereo(&[10, 20]), vec![15]);
        assert_eq!(downmix_stereo(&[1, 2]), vec![1]);
        assert_eq!(downmix_stereo(&[-1, -2]), vec![-1]);
        assert_eq!(downmix_stereo(&[-1, 0]), vec![0]);
    }

    #[test]
    fn downmix_handles_boundary_values() {
        assert_eq!(downmix_stereo(&[i16::MAX, i16::MAX]), vec![i16::MAX]);
        assert_eq!(downmix_stereo(&[i16::MIN, i16::MIN]), vec![i16::MIN]);
        assert_eq!(downmix_stereo(&[i16::MIN, i16::MAX]), vec![0]);
    }

    #[test]
    fn downmix_drops_unpaired_sample() {
        assert_eq!(downmix_stereo(&[4, 6, 9]), vec![5]);
    }

    #[test]
    fn decode_ignores_trailing_byte() {
        assert_eq!(decode_le_samples(&[0x01, 0x00, 0xff, 0xff, 0x7f]), vec![1, -1]);
    }

    #[test]
    fn mono_passes_through_from_offset() {
        let mut source = MemorySource::from_samples(2, 1, &[1, 2, 3, 4, 5, 6]);
        let buffer = SampleBuffer::load(&mut source, 1).unwrap();
        assert_eq!(buffer.as_slice(), &[3, 4, 5, 6]);
        assert_eq!(buffer.frame_offset(), 2);
        assert_eq!(buffer.frame_rate(), 2);
    }

    #[test]
    fn from_mono_reports_emptiness() {
        assert!(SampleBuffer::from_mono(8000, Vec::new()).is_empty());
        let buffer = SampleBuffer::from_mono(8000, vec![1]);
        assert!(!buffer.is_empty());
        assert_eq!(buffer.len(), 1);
    }

    #[test]
    fn stereo_is_downmixed() {
        let mut source = MemorySource::from_samples(4, 2, &[100, 200, -5, -6, i16::MAX, i16::MAX]);
        let buffer = SampleBuffer::load(&mut source, 0).unwrap();
        assert_eq!(buffer.as_slice(), &[150, -5, i16::MAX]);
    }

    #[test]
    fn offset_at_end_is_out_of_range() {
        let mut source = MemorySource::from_samples(2, 1, &[1, 2, 3, 4]);
        let err = SampleBuffer::load(&mut source, 2).unwrap_err();
        assert!(matches!(
            err,
            SourceError::OutOfRange {
                frame_index: 4,
                total_frames: 4
            }
        ));
    }

    #[test]
    fn offset_far_past_end_is_out_of_range() {
        let mut source = MemorySource::from_samples(44100, 1, &[0; 10]);
        let err = SampleBuffer::load(&mut source, 2).unwrap_err();
        assert!(matches!(
            err,
            SourceError::OutOfRange {
                frame_index: 88200,
                ..
            }
        ));
    }

    #[test]
    fn more_than_two_channels_is_unsupported() {
        let mut source = MemorySource::from_samples(8000, 3, &[1, 2, 3]);
        let err = SampleBuffer::load(&mut source, 0).unwrap_err();
        assert!(matches!(err, SourceError::UnsupportedFormat(_)));
    }
}
