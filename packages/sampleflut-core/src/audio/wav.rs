use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;

use bytes::{BufMut, Bytes, BytesMut};
use hound::{SampleFormat, WavReader};

use super::{PcmSource, PcmSpec, SourceError, SourceResult};
use crate::protocol_constants::{PCM_16BIT_BYTES_PER_SAMPLE, PCM_BITS_PER_SAMPLE};

/// A WAV recording decoded with `hound`.
///
/// Only 16-bit integer PCM is accepted; everything else is rejected when the
/// file is opened so the failure surfaces before any network activity.
pub struct WavSource<R: Read + Seek> {
    reader: WavReader<R>,
    spec: PcmSpec,
    position: u64,
}

impl WavSource<BufReader<File>> {
    /// Opens and validates a WAV file.
    pub fn open(path: &Path) -> SourceResult<Self> {
        let reader = WavReader::open(path).map_err(|source| SourceError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        let source = Self::from_reader(reader)?;
        log::info!(
            "[Audio] Opened {}: {} Hz, {} channel(s), {} frames",
            path.display(),
            source.spec.frame_rate,
            source.spec.channels,
            source.spec.total_frames
        );
        Ok(source)
    }
}

impl<R: Read + Seek> WavSource<R> {
    /// Wraps an already-parsed reader.
    pub fn from_reader(reader: WavReader<R>) -> SourceResult<Self> {
        let wav_spec = reader.spec();
        if wav_spec.sample_format != SampleFormat::Int
            || wav_spec.bits_per_sample != PCM_BITS_PER_SAMPLE
        {
            return Err(SourceError::UnsupportedFormat(format!(
                "{}-bit {:?} samples (expected {}-bit integer PCM)",
                wav_spec.bits_per_sample, wav_spec.sample_format, PCM_BITS_PER_SAMPLE
            )));
        }

        let spec = PcmSpec::new(
            wav_spec.sample_rate,
            u64::from(reader.duration()),
            wav_spec.channels,
        );
        Ok(Self {
            reader,
            spec,
            position: 0,
        })
    }
}

impl<R: Read + Seek> PcmSource for WavSource<R> {
    fn spec(&self) -> PcmSpec {
        self.spec
    }

    fn seek(&mut self, frame: u64) -> SourceResult<()> {
        let out_of_range = || SourceError::OutOfRange {
            frame_index: frame,
            total_frames: self.spec.total_frames,
        };
        if frame > self.spec.total_frames {
            return Err(out_of_range());
        }
        let target = u32::try_from(frame).map_err(|_| out_of_range())?;

        self.reader
            .seek(target)
            .map_err(|e| SourceError::Decode(hound::Error::IoError(e)))?;
        self.position = frame;
        Ok(())
    }

    fn read_remaining(&mut self) -> SourceResult<Bytes> {
        let remaining_frames = self.spec.total_frames - self.position;
        let sample_count = remaining_frames as usize * self.spec.channels as usize;

        let mut pcm = BytesMut::with_capacity(sample_count * PCM_16BIT_BYTES_PER_SAMPLE);
        for sample in self.reader.samples::<i16>().take(sample_count) {
            pcm.put_i16_le(sample?);
        }

        self.position = self.spec.total_frames;
        Ok(pcm.freeze())
    }
}

#[cfg(test)]
mod tests {
    use hound::{WavSpec, WavWriter};

    use super::*;

    fn write_wav(path: &Path, spec: WavSpec, samples: &[i16]) {
        let mut writer = WavWriter::create(path, spec).unwrap();
        for &s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn int_spec(channels: u16, bits_per_sample: u16) -> WavSpec {
        WavSpec {
            channels,
            sample_rate: 8000,
            bits_per_sample,
            sample_format: SampleFormat::Int,
        }
    }

    #[test]
    fn reports_frame_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stereo.wav");
        write_wav(&path, int_spec(2, 16), &[1, 2, 3, 4, 5, 6]);

        let source = WavSource::open(&path).unwrap();
        assert_eq!(source.spec(), PcmSpec::new(8000, 3, 2));
    }

    #[test]
    fn reads_little_endian_pcm_after_seek() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mono.wav");
        write_wav(&path, int_spec(1, 16), &[10, -20, 300, i16::MIN]);

        let mut source = WavSource::open(&path).unwrap();
        source.seek(2).unwrap();
        let pcm = source.read_remaining().unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&300i16.to_le_bytes());
        expected.extend_from_slice(&i16::MIN.to_le_bytes());
        assert_eq!(&pcm[..], &expected[..]);
    }

    #[test]
    fn rejects_non_16_bit_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("eight.wav");
        let mut writer = WavWriter::create(&path, int_spec(1, 8)).unwrap();
        writer.write_sample(5i8).unwrap();
        writer.finalize().unwrap();

        let err = WavSource::open(&path).err().unwrap();
        assert!(matches!(err, SourceError::UnsupportedFormat(_)));
    }

    #[test]
    fn rejects_float_pcm() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 32,
            sample_format: SampleFormat::Float,
        };
        let mut writer = WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.5f32).unwrap();
        writer.finalize().unwrap();

        let err = WavSource::open(&path).err().unwrap();
        assert!(matches!(err, SourceError::UnsupportedFormat(_)));
    }

    #[test]
    fn missing_file_is_an_open_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = WavSource::open(&dir.path().join("absent.wav")).err().unwrap();
        assert!(matches!(err, SourceError::Open { .. }));
    }

    #[test]
    fn seek_past_end_is_out_of_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.wav");
        write_wav(&path, int_spec(1, 16), &[1, 2]);

        let mut source = WavSource::open(&path).unwrap();
        let err = source.seek(3).unwrap_err();
        assert!(matches!(
            err,
            SourceError::OutOfRange {
                frame_index: 3,
                total_frames: 2
            }
        ));
    }
}
