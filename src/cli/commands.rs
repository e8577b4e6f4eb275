//! CLI Command Implementations
//!
//! Implements the actual logic for each CLI command.

use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use serde_json::json;
use tracing::info;

use super::ProcessArgs;
use crate::error::Result;
use crate::processor::AudioProcessor;

/// Position polling cadence for `play`
pub const POLL_INTERVAL: Duration = Duration::from_millis(200);

/// Render a file through the effect chain.
pub fn process(processor: &AudioProcessor, args: &ProcessArgs) -> Result<()> {
    let options = args.to_options()?;
    info!("Processing {}", args.source.display());

    let report = processor.process_file_with_report(&args.source, &args.output_name, &options)?;

    if args.json {
        let summary = json!({
            "outputPath": report.output_path,
            "consumedFrames": report.consumed_frames,
            "outputFrames": report.output_frames,
            "blocks": report.blocks,
            "transientRetries": report.transient_retries,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Rendered: {}", report.output_path.display());
        println!(
            "Frames: {} in, {} out ({} blocks)",
            report.consumed_frames, report.output_frames, report.blocks
        );
    }

    Ok(())
}

/// Print the sample rate of a file.
pub fn sample_rate(processor: &AudioProcessor, path: &Path) -> Result<()> {
    let rate = processor.file_sample_rate(path)?;
    println!("{}", rate);
    Ok(())
}

/// Play a file, printing position until it ends or the time limit passes.
pub fn play(processor: &AudioProcessor, path: &Path, seconds: Option<f64>) -> Result<()> {
    let subscription = processor.subscribe(|playing| {
        println!("SONG_IS_PLAYING: {}", playing);
    });

    processor.play_file(path)?;
    if let Some(duration) = processor.duration() {
        println!("Duration: {:.2}s", duration);
    }

    let started = Instant::now();
    while processor.is_playing() {
        if let Some(limit) = seconds {
            if started.elapsed().as_secs_f64() >= limit {
                processor.stop();
                break;
            }
        }
        if let Some(position) = processor.playback_time() {
            println!("Position: {:.2}s", position);
        }
        thread::sleep(POLL_INTERVAL);
    }

    processor.unsubscribe(subscription);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProcessorConfig;
    use hound::{SampleFormat, WavSpec, WavWriter};
    use tempfile::TempDir;

    #[test]
    fn test_process_command_writes_output() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("in.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 8000,
            bits_per_sample: 16,
            sample_format: SampleFormat::Int,
        };
        let mut writer = WavWriter::create(&source, spec).unwrap();
        for i in 0..800 {
            writer.write_sample(((i % 40) * 100) as i16).unwrap();
        }
        writer.finalize().unwrap();

        let processor =
            AudioProcessor::new(ProcessorConfig::with_cache_dir(dir.path().join("cache"))).unwrap();
        let args = ProcessArgs {
            source,
            output_name: "out.wav".into(),
            play_rate: Some(2.0),
            json: true,
            ..ProcessArgs::default()
        };
        process(&processor, &args).unwrap();

        let out = hound::WavReader::open(dir.path().join("cache").join("out.wav")).unwrap();
        assert_eq!(out.duration(), 400);
    }
}
