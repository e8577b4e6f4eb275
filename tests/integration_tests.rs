//! Integration Tests
//!
//! End-to-end tests for the fxchain render pipeline.

use std::path::{Path, PathBuf};

use approx::assert_abs_diff_eq;
use hound::{SampleFormat, WavReader, WavSpec, WavWriter};
use pretty_assertions::assert_eq;
use tempfile::TempDir;
use test_case::test_case;

use fxchain::{AudioProcessor, FxError, ProcessOptions, ProcessorConfig};

const RATE: u32 = 8000;

/// Write a sine source with the given layout
fn write_sine(path: &Path, spec: WavSpec, seconds: f64) {
    let frames = (seconds * spec.sample_rate as f64).round() as u32;
    let mut writer = WavWriter::create(path, spec).unwrap();
    for i in 0..frames {
        let v = (2.0 * std::f64::consts::PI * 220.0 * i as f64 / spec.sample_rate as f64).sin() * 0.25;
        for ch in 0..spec.channels {
            let v = if ch % 2 == 0 { v } else { -v };
            match (spec.sample_format, spec.bits_per_sample) {
                (SampleFormat::Float, _) => writer.write_sample(v as f32).unwrap(),
                (SampleFormat::Int, 8) => writer.write_sample((v * 127.0) as i8).unwrap(),
                (SampleFormat::Int, 16) => writer.write_sample((v * 32767.0) as i16).unwrap(),
                (SampleFormat::Int, 24) => writer.write_sample((v * 8_388_607.0) as i32).unwrap(),
                (SampleFormat::Int, _) => writer.write_sample((v * 2_147_483_647.0) as i32).unwrap(),
            }
        }
    }
    writer.finalize().unwrap();
}

fn mono16() -> WavSpec {
    WavSpec {
        channels: 1,
        sample_rate: RATE,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    }
}

struct Fixture {
    dir: TempDir,
    source: PathBuf,
    processor: AudioProcessor,
}

impl Fixture {
    fn new(spec: WavSpec, seconds: f64) -> Self {
        Self::with_config(spec, seconds, |_| {})
    }

    fn with_config(spec: WavSpec, seconds: f64, tweak: impl FnOnce(&mut ProcessorConfig)) -> Self {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("source.wav");
        write_sine(&source, spec, seconds);
        let mut config = ProcessorConfig::with_cache_dir(dir.path().join("cache"));
        tweak(&mut config);
        let processor = AudioProcessor::new(config).unwrap();
        Self {
            dir,
            source,
            processor,
        }
    }

    fn output(&self, name: &str) -> PathBuf {
        self.dir.path().join("cache").join(name)
    }

    fn process(&self, options: &ProcessOptions) -> fxchain::Result<PathBuf> {
        self.processor.process_file(&self.source, "out.wav", options)
    }
}

fn duration_secs(path: &Path) -> f64 {
    let reader = WavReader::open(path).unwrap();
    reader.duration() as f64 / reader.spec().sample_rate as f64
}

// === Duration Scenarios ===

#[test]
fn test_play_rate_two_halves_duration() {
    let fx = Fixture::new(mono16(), 10.0);
    let out = fx.process(&ProcessOptions::new().play_rate(2.0)).unwrap();
    assert_abs_diff_eq!(duration_secs(&out), 5.0, epsilon = 0.01);
}

#[test]
fn test_defaults_keep_duration_and_samples() {
    let fx = Fixture::new(mono16(), 3.0);
    let out = fx.process(&ProcessOptions::new()).unwrap();
    assert_eq!(out, fx.output("out.wav"));

    let mut source = WavReader::open(&fx.source).unwrap();
    let mut rendered = WavReader::open(&out).unwrap();
    assert_eq!(rendered.duration(), source.duration());

    let a: Vec<i16> = source.samples::<i16>().map(|s| s.unwrap()).collect();
    let b: Vec<i16> = rendered.samples::<i16>().map(|s| s.unwrap()).collect();
    assert_eq!(a, b);
}

#[test]
fn test_defaults_keep_full_scale_samples() {
    let fx = Fixture::new(mono16(), 0.1);
    let samples: [i16; 6] = [32767, 20000, 16385, -20000, -32768, 1000];
    let mut writer = WavWriter::create(&fx.source, mono16()).unwrap();
    for _ in 0..500 {
        for s in samples {
            writer.write_sample(s).unwrap();
        }
    }
    writer.finalize().unwrap();

    let out = fx.process(&ProcessOptions::new()).unwrap();
    let a: Vec<i16> = WavReader::open(&fx.source).unwrap().samples().map(|s| s.unwrap()).collect();
    let b: Vec<i16> = WavReader::open(&out).unwrap().samples().map(|s| s.unwrap()).collect();
    assert_eq!(b.len(), 3000);
    assert_eq!(a, b);
}

#[test_case(0.25 ; "quarter speed")]
#[test_case(0.5 ; "half speed")]
#[test_case(1.5 ; "one and a half")]
#[test_case(4.0 ; "four times")]
fn test_play_rate_scales_duration(rate: f64) {
    let fx = Fixture::new(mono16(), 2.0);
    let out = fx.process(&ProcessOptions::new().play_rate(rate)).unwrap();
    assert_abs_diff_eq!(duration_secs(&out), 2.0 / rate, epsilon = 0.01);
}

#[test]
fn test_play_rate_independent_of_effect_amounts() {
    let fx = Fixture::new(mono16(), 2.0);
    let options = ProcessOptions::new()
        .reverb(60.0)
        .delay(50.0)
        .delay_time_ms(300.0)
        .delay_feedback(70.0)
        .distortion(40.0)
        .distortion_gain(12.0)
        .pitch_cents(500.0)
        .play_rate(2.0);
    let out = fx.process(&options).unwrap();
    assert_abs_diff_eq!(duration_secs(&out), 1.0, epsilon = 0.01);
}

#[test]
fn test_pitch_rate_and_play_rate_compose() {
    let fx = Fixture::new(mono16(), 2.0);
    let report = fx
        .processor
        .process_file_with_report(
            &fx.source,
            "out.wav",
            &ProcessOptions::new().pitch_rate(0.5).play_rate(2.0),
        )
        .unwrap();
    assert_eq!(report.consumed_frames, 16_000);
    assert_eq!(report.output_frames, 16_000);
    assert_eq!(WavReader::open(&report.output_path).unwrap().duration(), 16_000);
}

// === Validation ===

#[test_case(ProcessOptions::new().reverb(101.0), "reverb must be between 0 and 100." ; "reverb")]
#[test_case(ProcessOptions::new().delay(-1.0), "delay must be between 0 and 100." ; "delay")]
#[test_case(ProcessOptions::new().delay_time_ms(2001.0), "delayTimeInMS must be between 0 and 2000." ; "delay time")]
#[test_case(ProcessOptions::new().delay_feedback(-101.0), "delayFeedback must be between -100 and 100." ; "delay feedback")]
#[test_case(ProcessOptions::new().delay_low_pass_cutoff(9.0), "delayLowPassCutoff must be larger than 10." ; "delay cutoff")]
#[test_case(ProcessOptions::new().distortion(100.5), "distortionAmount must be between 0 and 100." ; "distortion")]
#[test_case(ProcessOptions::new().distortion_gain(21.0), "distortionGain must be between -80 and 20." ; "distortion gain")]
#[test_case(ProcessOptions::new().pitch_cents(2401.0), "pitchAmount must be between -2400 and 2400." ; "pitch")]
#[test_case(ProcessOptions::new().pitch_overlap(2.0), "pitchOverlap must be between 3 and 32." ; "overlap")]
#[test_case(ProcessOptions::new().pitch_rate(33.0), "pitchRate must be between 1/32 and 32." ; "pitch rate")]
#[test_case(ProcessOptions::new().play_rate(0.2), "playRate must be between 0.25 and 4." ; "play rate")]
fn test_out_of_range_rejected_without_io(options: ProcessOptions, message: &str) {
    let fx = Fixture::new(mono16(), 0.5);
    let err = fx.process(&options).unwrap_err();
    assert!(matches!(err, FxError::Validation { .. }));
    assert_eq!(err.to_string(), message);
    assert!(!fx.output("out.wav").exists());
    assert!(!fx.dir.path().join("cache").exists());
}

#[test]
fn test_json_options_validated() {
    let fx = Fixture::new(mono16(), 0.5);
    let options = ProcessOptions::from_json(r#"{"delay":{"timeInMS":2001}}"#).unwrap();
    let err = fx.process(&options).unwrap_err();
    assert_eq!(err.to_string(), "delayTimeInMS must be between 0 and 2000.");
    assert_eq!(err.field(), Some("delayTimeInMS"));
}

#[test]
fn test_range_edges_accepted() {
    let fx = Fixture::new(mono16(), 0.5);
    let options = ProcessOptions::new()
        .reverb(100.0)
        .delay(100.0)
        .delay_time_ms(2000.0)
        .delay_feedback(-100.0)
        .delay_low_pass_cutoff(10.5)
        .distortion(0.0)
        .distortion_gain(-80.0)
        .pitch_cents(-2400.0)
        .pitch_overlap(32.0)
        .pitch_rate(32.0)
        .play_rate(4.0);
    let out = fx.process(&options).unwrap();
    assert!(out.exists());
}

// === Format Fidelity ===

#[test_case(1, 8, SampleFormat::Int ; "mono 8-bit")]
#[test_case(2, 16, SampleFormat::Int ; "stereo 16-bit")]
#[test_case(2, 24, SampleFormat::Int ; "stereo 24-bit")]
#[test_case(1, 32, SampleFormat::Int ; "mono 32-bit int")]
#[test_case(2, 32, SampleFormat::Float ; "stereo float")]
fn test_output_keeps_source_spec(channels: u16, bits: u16, format: SampleFormat) {
    let spec = WavSpec {
        channels,
        sample_rate: 11_025,
        bits_per_sample: bits,
        sample_format: format,
    };
    let fx = Fixture::new(spec, 1.0);
    let out = fx
        .process(&ProcessOptions::new().reverb(25.0).distortion(30.0))
        .unwrap();
    let rendered = WavReader::open(&out).unwrap();
    assert_eq!(rendered.spec(), spec);
    assert_eq!(rendered.duration(), 11_025);
    assert_eq!(fx.processor.file_sample_rate(&out).unwrap(), 11_025);
}

// === File Access ===

#[test]
fn test_missing_source_is_file_access_error() {
    let fx = Fixture::new(mono16(), 0.5);
    let err = fx
        .processor
        .process_file(&fx.dir.path().join("nope.wav"), "out.wav", &ProcessOptions::new())
        .unwrap_err();
    assert_eq!(err.error_code(), "FILE_ACCESS_ERROR");
    assert!(!fx.output("out.wav").exists());
}

#[test]
fn test_output_name_with_directory_rejected() {
    let fx = Fixture::new(mono16(), 0.5);
    let err = fx
        .processor
        .process_file(&fx.source, "nested/out.wav", &ProcessOptions::new())
        .unwrap_err();
    assert_eq!(err.error_code(), "FILE_ACCESS_ERROR");
}

#[test]
fn test_not_a_wav_is_file_access_error() {
    let fx = Fixture::new(mono16(), 0.5);
    let bogus = fx.dir.path().join("bogus.wav");
    std::fs::write(&bogus, b"definitely not audio").unwrap();
    let err = fx
        .processor
        .process_file(&bogus, "out.wav", &ProcessOptions::new())
        .unwrap_err();
    assert_eq!(err.error_code(), "FILE_ACCESS_ERROR");
}

/// Cut a source short so its header promises more frames than it holds
fn truncate(path: &Path, bytes: u64) {
    let file = std::fs::OpenOptions::new().write(true).open(path).unwrap();
    file.set_len(bytes).unwrap();
}

#[test]
fn test_truncated_source_fails_and_removes_partial_output() {
    let fx = Fixture::new(mono16(), 2.0);
    truncate(&fx.source, 10_000);
    let err = fx.process(&ProcessOptions::new()).unwrap_err();
    assert_eq!(err.error_code(), "RENDER_ERROR");
    assert!(!fx.output("out.wav").exists());
}

#[test]
fn test_truncated_source_keeps_partial_output_when_configured() {
    let fx = Fixture::with_config(mono16(), 2.0, |c| c.keep_partial_output = true);
    truncate(&fx.source, 10_000);
    let err = fx.process(&ProcessOptions::new()).unwrap_err();
    assert_eq!(err.error_code(), "RENDER_ERROR");

    // Each block is flushed with its header, so the partial file is readable.
    let partial = WavReader::open(fx.output("out.wav")).unwrap();
    assert_eq!(partial.duration(), 4096);
}

#[test]
fn test_small_blocks_match_default_blocks() {
    let big = Fixture::new(mono16(), 1.0);
    let small = Fixture::with_config(mono16(), 1.0, |c| c.max_block_frames = 333);
    let options = ProcessOptions::new()
        .delay(40.0)
        .delay_time_ms(90.0)
        .pitch_cents(300.0)
        .pitch_rate(1.25)
        .play_rate(0.75);

    let a: Vec<i16> = WavReader::open(big.process(&options).unwrap())
        .unwrap()
        .samples::<i16>()
        .map(|s| s.unwrap())
        .collect();
    let b: Vec<i16> = WavReader::open(small.process(&options).unwrap())
        .unwrap()
        .samples::<i16>()
        .map(|s| s.unwrap())
        .collect();
    assert_eq!(a.len(), b.len());
    assert_eq!(a, b);
}
