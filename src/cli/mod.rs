//! CLI Module
//!
//! Command-line interface for the fxchain renderer.

pub mod commands;

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::error::Result;
use crate::params::ProcessOptions;

/// fxchain - offline audio effect chain renderer
#[derive(Parser, Debug)]
#[command(name = "fxchain-cli")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON processor configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Render a file through the effect chain into the cache directory
    #[command(name = "process")]
    Process(ProcessArgs),

    /// Print the sample rate of an audio file
    #[command(name = "sample-rate")]
    SampleRate {
        /// Audio file to inspect
        path: PathBuf,
    },

    /// Play a file on the headless transport, reporting position
    #[command(name = "play")]
    Play {
        /// Audio file to play
        path: PathBuf,

        /// Stop after this many seconds
        #[arg(short, long)]
        seconds: Option<f64>,
    },
}

/// Arguments of `process`
///
/// Effect flags override the same fields given in `--options`.
#[derive(Args, Debug, Default)]
pub struct ProcessArgs {
    /// Source audio file
    pub source: PathBuf,

    /// Bare file name of the rendered output
    pub output_name: String,

    /// Nested JSON options, e.g. '{"delay":{"timeInMS":250}}'
    #[arg(long)]
    pub options: Option<String>,

    /// Reverb wet mix (0-100)
    #[arg(long)]
    pub reverb: Option<f64>,

    /// Delay wet mix (0-100)
    #[arg(long)]
    pub delay: Option<f64>,

    /// Delay time in milliseconds (0-2000)
    #[arg(long)]
    pub delay_time_ms: Option<f64>,

    /// Delay feedback percentage (-100-100)
    #[arg(long, allow_negative_numbers = true)]
    pub delay_feedback: Option<f64>,

    /// Delay feedback low-pass cutoff in Hz (>10)
    #[arg(long)]
    pub delay_cutoff: Option<f64>,

    /// Distortion wet mix (0-100)
    #[arg(long)]
    pub distortion: Option<f64>,

    /// Distortion pre-gain in dB (-80-20)
    #[arg(long, allow_negative_numbers = true)]
    pub distortion_gain: Option<f64>,

    /// Pitch shift in cents (-2400-2400)
    #[arg(long, allow_negative_numbers = true)]
    pub pitch_cents: Option<f64>,

    /// Pitch grain overlap (3-32)
    #[arg(long)]
    pub pitch_overlap: Option<f64>,

    /// Time-stretch rate, pitch preserved (1/32-32)
    #[arg(long)]
    pub pitch_rate: Option<f64>,

    /// Playback rate, pitch follows (0.25-4)
    #[arg(long)]
    pub play_rate: Option<f64>,

    /// Print the render report as JSON
    #[arg(long)]
    pub json: bool,
}

impl ProcessArgs {
    /// Merge `--options` JSON with the individual effect flags
    pub fn to_options(&self) -> Result<ProcessOptions> {
        let mut options = match &self.options {
            Some(json) => ProcessOptions::from_json(json)?,
            None => ProcessOptions::new(),
        };

        let setters: [(Option<f64>, fn(ProcessOptions, f64) -> ProcessOptions); 11] = [
            (self.reverb, ProcessOptions::reverb),
            (self.delay, ProcessOptions::delay),
            (self.delay_time_ms, ProcessOptions::delay_time_ms),
            (self.delay_feedback, ProcessOptions::delay_feedback),
            (self.delay_cutoff, ProcessOptions::delay_low_pass_cutoff),
            (self.distortion, ProcessOptions::distortion),
            (self.distortion_gain, ProcessOptions::distortion_gain),
            (self.pitch_cents, ProcessOptions::pitch_cents),
            (self.pitch_overlap, ProcessOptions::pitch_overlap),
            (self.pitch_rate, ProcessOptions::pitch_rate),
            (self.play_rate, ProcessOptions::play_rate),
        ];
        for (value, set) in setters {
            if let Some(value) = value {
                options = set(options, value);
            }
        }
        Ok(options)
    }
}
