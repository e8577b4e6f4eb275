//! Streaming audio file I/O
//!
//! Sources are decoded block by block and outputs are written block by
//! block, so neither side ever holds a whole file in memory. Output files
//! reuse the source's exact `WavSpec` (channels, rate, bit depth, int/float).

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use crate::engine::buffer::AudioBlock;
use crate::error::{FxError, Result};

/// Format of a decodable source file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFormat {
    /// Container/sample layout, reused verbatim for the output
    pub spec: WavSpec,
    /// Total frames in the source
    pub total_frames: u64,
}

impl SourceFormat {
    /// Number of interleaved channels
    pub fn channels(&self) -> usize {
        self.spec.channels as usize
    }

    /// Sample rate in Hz
    pub fn sample_rate(&self) -> u32 {
        self.spec.sample_rate
    }

    /// Bits per sample
    pub fn bits_per_sample(&self) -> u16 {
        self.spec.bits_per_sample
    }

    /// Duration in seconds
    pub fn duration_secs(&self) -> f64 {
        if self.spec.sample_rate == 0 {
            return 0.0;
        }
        self.total_frames as f64 / self.spec.sample_rate as f64
    }
}

/// Reject sample layouts this crate cannot convert
fn check_spec(path: &Path, spec: &WavSpec) -> Result<()> {
    if spec.channels == 0 {
        return Err(FxError::file_reason(path, "file declares zero channels"));
    }
    if spec.sample_rate == 0 {
        return Err(FxError::file_reason(path, "file declares a zero sample rate"));
    }
    let supported = match spec.sample_format {
        SampleFormat::Float => spec.bits_per_sample == 32,
        SampleFormat::Int => matches!(spec.bits_per_sample, 8 | 16 | 24 | 32),
    };
    if !supported {
        return Err(FxError::file_reason(
            path,
            format!(
                "unsupported sample format: {}-bit {:?}",
                spec.bits_per_sample, spec.sample_format
            ),
        ));
    }
    Ok(())
}

/// Read just the format of a source file
pub fn probe(path: &Path) -> Result<SourceFormat> {
    let reader = WavReader::open(path).map_err(|e| FxError::file_access(path, e))?;
    let spec = reader.spec();
    check_spec(path, &spec)?;
    Ok(SourceFormat {
        spec,
        total_frames: reader.duration() as u64,
    })
}

/// Sample rate of an audio file in Hz
pub fn file_sample_rate(path: &Path) -> Result<u32> {
    Ok(probe(path)?.sample_rate())
}

/// Duration of an audio file in seconds
pub fn file_duration(path: &Path) -> Result<f64> {
    Ok(probe(path)?.duration_secs())
}

// ============================================================================
// SourceReader
// ============================================================================

/// Block-wise decoder for a source file
pub struct SourceReader {
    path: PathBuf,
    reader: WavReader<BufReader<File>>,
    format: SourceFormat,
    frames_read: u64,
    scratch: Vec<f32>,
}

impl SourceReader {
    /// Open a source file for reading
    ///
    /// # Errors
    /// * `FileAccess` - if the file is missing, not a WAV, or uses an
    ///   unsupported sample layout
    pub fn open(path: &Path) -> Result<Self> {
        let reader = WavReader::open(path).map_err(|e| FxError::file_access(path, e))?;
        let spec = reader.spec();
        check_spec(path, &spec)?;
        let format = SourceFormat {
            spec,
            total_frames: reader.duration() as u64,
        };
        Ok(Self {
            path: path.to_path_buf(),
            reader,
            format,
            frames_read: 0,
            scratch: Vec::new(),
        })
    }

    /// Format of the open source
    pub fn format(&self) -> &SourceFormat {
        &self.format
    }

    /// Frames decoded so far
    pub fn frames_read(&self) -> u64 {
        self.frames_read
    }

    /// Decode up to `frames` frames into `block` (cleared first)
    ///
    /// Returns the number of frames decoded, which is smaller than
    /// requested only at the end of the file.
    pub fn read_block(&mut self, frames: usize, block: &mut AudioBlock) -> Result<usize> {
        let channels = self.format.channels();
        let wanted = frames * channels;
        self.scratch.clear();
        self.scratch.reserve(wanted);

        let spec = self.format.spec;
        let scratch = &mut self.scratch;
        let reader = &mut self.reader;
        let decoded = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Float, _) => read_into::<f32, _>(reader, wanted, scratch, |s| s),
            (SampleFormat::Int, 8) => {
                read_into::<i8, _>(reader, wanted, scratch, |s| s as f32 / 128.0)
            }
            (SampleFormat::Int, 16) => {
                read_into::<i16, _>(reader, wanted, scratch, |s| s as f32 / 32768.0)
            }
            (SampleFormat::Int, 24) => {
                read_into::<i32, _>(reader, wanted, scratch, |s| s as f32 / 8388608.0)
            }
            (SampleFormat::Int, _) => read_into::<i32, _>(reader, wanted, scratch, |s| {
                (s as f64 / 2147483648.0) as f32
            }),
        };
        decoded.map_err(|e| FxError::file_access(&self.path, e))?;

        block.clear();
        block.extend_interleaved(&self.scratch);
        let got = block.frames();
        self.frames_read += got as u64;
        Ok(got)
    }
}

/// Read up to `count` samples of type `S`, converting each with `convert`
fn read_into<S, F>(
    reader: &mut WavReader<BufReader<File>>,
    count: usize,
    out: &mut Vec<f32>,
    convert: F,
) -> std::result::Result<(), hound::Error>
where
    S: hound::Sample,
    F: Fn(S) -> f32,
{
    for sample in reader.samples::<S>().take(count) {
        out.push(convert(sample?));
    }
    Ok(())
}

// ============================================================================
// OutputWriter
// ============================================================================

/// Block-wise encoder for a rendered file
pub struct OutputWriter {
    path: PathBuf,
    writer: WavWriter<BufWriter<File>>,
    spec: WavSpec,
    frames_written: u64,
}

impl OutputWriter {
    /// Create (or truncate) an output file with the given layout
    pub fn create(path: &Path, spec: WavSpec) -> Result<Self> {
        let writer = WavWriter::create(path, spec).map_err(|e| FxError::file_access(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            writer,
            spec,
            frames_written: 0,
        })
    }

    /// Path of the file being written
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Frames written so far
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Append a block and flush it (header included) to disk
    pub fn write_block(&mut self, block: &AudioBlock) -> Result<()> {
        let frames = block.frames();
        let path = &self.path;
        let writer = &mut self.writer;
        let written = (|| -> std::result::Result<(), hound::Error> {
            for frame in 0..frames {
                for channel in &block.samples {
                    write_sample(writer, &self.spec, channel[frame])?;
                }
            }
            writer.flush()
        })();
        written.map_err(|e| FxError::file_access(path, e))?;
        self.frames_written += frames as u64;
        Ok(())
    }

    /// Finalize the header and close the file
    pub fn finalize(self) -> Result<PathBuf> {
        let path = self.path;
        self.writer
            .finalize()
            .map_err(|e| FxError::file_access(&path, e))?;
        Ok(path)
    }
}

/// Encode one float sample in the output's native layout
///
/// Integer scales are the same powers of two the reader divides by, so a
/// decoded sample encodes back to the identical integer.
#[inline]
fn write_sample(
    writer: &mut WavWriter<BufWriter<File>>,
    spec: &WavSpec,
    sample: f32,
) -> std::result::Result<(), hound::Error> {
    match (spec.sample_format, spec.bits_per_sample) {
        (SampleFormat::Float, _) => writer.write_sample(sample),
        (SampleFormat::Int, 8) => {
            writer.write_sample((sample * 128.0).round().clamp(-128.0, 127.0) as i8)
        }
        (SampleFormat::Int, 16) => {
            writer.write_sample((sample * 32768.0).round().clamp(-32768.0, 32767.0) as i16)
        }
        (SampleFormat::Int, 24) => {
            writer.write_sample((sample * 8388608.0).round().clamp(-8388608.0, 8388607.0) as i32)
        }
        (SampleFormat::Int, _) => writer.write_sample(
            (sample as f64 * 2147483648.0)
                .round()
                .clamp(-2147483648.0, 2147483647.0) as i32,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn write_ramp(path: &Path, spec: WavSpec, frames: usize) {
        let mut writer = WavWriter::create(path, spec).unwrap();
        for i in 0..frames {
            for ch in 0..spec.channels {
                let v = ((i % 100) as f32 / 100.0 - 0.5) * if ch == 0 { 1.0 } else { -1.0 };
                writer.write_sample((v * 32767.0) as i16).unwrap();
            }
        }
        writer.finalize().unwrap();
    }

    fn stereo16(rate: u32) -> WavSpec {
        WavSpec {
            channels: 2,
            sample_rate: rate,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        }
    }

    #[test]
    fn test_probe_reports_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        write_ramp(&path, stereo16(22050), 22050);

        let format = probe(&path).unwrap();
        assert_eq!(format.channels(), 2);
        assert_eq!(format.total_frames, 22050);
        assert!((format.duration_secs() - 1.0).abs() < 1e-9);
        assert_eq!(file_sample_rate(&path).unwrap(), 22050);
    }

    #[test]
    fn test_missing_file_is_file_access() {
        let err = SourceReader::open(Path::new("/no/such/file.wav")).err().unwrap();
        assert_eq!(err.error_code(), "FILE_ACCESS_ERROR");
    }

    #[test]
    fn test_not_a_wav_is_file_access() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("junk.wav");
        std::fs::write(&path, b"definitely not riff data").unwrap();
        let err = probe(&path).unwrap_err();
        assert_eq!(err.error_code(), "FILE_ACCESS_ERROR");
    }

    #[test]
    fn test_block_reads_cover_file_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ramp.wav");
        write_ramp(&path, stereo16(8000), 1000);

        let mut reader = SourceReader::open(&path).unwrap();
        let mut block = AudioBlock::with_capacity(2, 300);
        let mut total = 0;
        loop {
            let got = reader.read_block(300, &mut block).unwrap();
            if got == 0 {
                break;
            }
            assert_eq!(block.frames(), got);
            total += got;
        }
        assert_eq!(total, 1000);
        assert_eq!(reader.frames_read(), 1000);
    }

    #[test]
    fn test_write_preserves_spec_and_samples() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.wav");
        let dst = dir.path().join("dst.wav");
        write_ramp(&src, stereo16(8000), 500);

        let mut reader = SourceReader::open(&src).unwrap();
        let mut writer = OutputWriter::create(&dst, reader.format().spec).unwrap();
        let mut block = AudioBlock::with_capacity(2, 128);
        while reader.read_block(128, &mut block).unwrap() > 0 {
            writer.write_block(&block).unwrap();
        }
        assert_eq!(writer.frames_written(), 500);
        writer.finalize().unwrap();

        let a: Vec<i16> = WavReader::open(&src).unwrap().samples().map(|s| s.unwrap()).collect();
        let out = WavReader::open(&dst).unwrap();
        assert_eq!(out.spec(), stereo16(8000));
        let b: Vec<i16> = out.into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(a, b);
    }

    /// Copy `src` to `dst` through the block reader and writer
    fn copy_through_blocks(src: &Path, dst: &Path) {
        let mut reader = SourceReader::open(src).unwrap();
        let mut writer = OutputWriter::create(dst, reader.format().spec).unwrap();
        let mut block = AudioBlock::with_capacity(reader.format().channels(), 64);
        while reader.read_block(64, &mut block).unwrap() > 0 {
            writer.write_block(&block).unwrap();
        }
        writer.finalize().unwrap();
    }

    fn mono_int(bits: u16) -> WavSpec {
        WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: bits,
            sample_format: SampleFormat::Int,
        }
    }

    #[test]
    fn test_full_scale_16_bit_survives_round_trip() {
        let dir = tempdir().unwrap();
        let src = dir.path().join("src.wav");
        let dst = dir.path().join("dst.wav");
        let samples: [i16; 7] = [32767, 20000, 16385, -20000, -32768, 1000, -1];
        let mut writer = WavWriter::create(&src, mono_int(16)).unwrap();
        for s in samples {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();

        copy_through_blocks(&src, &dst);
        let out: Vec<i16> = WavReader::open(&dst).unwrap().into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(out, samples.to_vec());
    }

    #[test]
    fn test_full_scale_8_and_24_bit_survive_round_trip() {
        let dir = tempdir().unwrap();

        let src = dir.path().join("src8.wav");
        let dst = dir.path().join("dst8.wav");
        let samples8: [i8; 5] = [127, 100, 65, -128, -1];
        let mut writer = WavWriter::create(&src, mono_int(8)).unwrap();
        for s in samples8 {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        copy_through_blocks(&src, &dst);
        let out: Vec<i8> = WavReader::open(&dst).unwrap().into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(out, samples8.to_vec());

        let src = dir.path().join("src24.wav");
        let dst = dir.path().join("dst24.wav");
        let samples24: [i32; 5] = [8_388_607, 5_000_000, 4_194_305, -8_388_608, -3];
        let mut writer = WavWriter::create(&src, mono_int(24)).unwrap();
        for s in samples24 {
            writer.write_sample(s).unwrap();
        }
        writer.finalize().unwrap();
        copy_through_blocks(&src, &dst);
        let out: Vec<i32> = WavReader::open(&dst).unwrap().into_samples().map(|s| s.unwrap()).collect();
        assert_eq!(out, samples24.to_vec());
    }
}
