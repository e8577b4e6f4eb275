//! fxchain - Offline Audio Effect Chain
//!
//! Renders an audio file through a fixed chain of effects and writes the
//! result next to a cache of earlier renders, with a single-session player
//! for auditioning.
//!
//! # Architecture
//!
//! The chain always runs in the same order:
//! - Reverb (Freeverb hall)
//! - Delay (feedback echo with a low-passed loop)
//! - Distortion (pre-gain into a soft waveshaper)
//! - Time/pitch (granular stretch and shift)
//! - Play rate (varispeed)
//!
//! Rendering pulls fixed-size blocks through the chain, so memory stays
//! bounded by the block size regardless of file length.
//!
//! ```no_run
//! use std::path::Path;
//! use fxchain::{AudioProcessor, ProcessOptions, ProcessorConfig};
//!
//! let processor = AudioProcessor::new(ProcessorConfig::default())?;
//! let options = ProcessOptions::new().reverb(30.0).play_rate(1.25);
//! let rendered = processor.process_file(Path::new("song.wav"), "song-fx.wav", &options)?;
//! processor.play_file(&rendered)?;
//! # Ok::<(), fxchain::FxError>(())
//! ```

pub mod cli;
pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;
pub mod params;
pub mod playback;
pub mod processor;

pub use config::ProcessorConfig;
pub use engine::RenderReport;
pub use error::{FxError, Result};
pub use params::{ParameterSet, ProcessOptions};
pub use playback::{PlaybackController, SubscriptionId, SONG_IS_PLAYING};
pub use processor::AudioProcessor;
