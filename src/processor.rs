//! Audio processor
//!
//! The public front end: offline rendering of a source through the effect
//! chain into the cache directory, plus the playback operations.
//!
//! Renders are serialized: a second `process_file` call waits for the
//! first to finish rather than sharing the render path.

use std::path::{Component, Path, PathBuf};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::config::ProcessorConfig;
use crate::dsp::{EffectChain, StreamFormat};
use crate::engine::{self, ChainGraph, OfflineRenderer, OutputWriter, RenderReport, SourceReader};
use crate::error::{FxError, Result};
use crate::params::{ParameterSet, ProcessOptions};
use crate::playback::{PlaybackController, SubscriptionId};

/// Offline effect renderer with a single playback session
pub struct AudioProcessor {
    config: ProcessorConfig,
    render_lock: Mutex<()>,
    playback: PlaybackController,
}

impl AudioProcessor {
    /// Create a processor with headless playback on the wall clock
    pub fn new(config: ProcessorConfig) -> Result<Self> {
        Self::with_playback(config, PlaybackController::headless())
    }

    /// Create a processor around an existing playback controller
    pub fn with_playback(config: ProcessorConfig, playback: PlaybackController) -> Result<Self> {
        config.validate()?;
        debug!(cache_dir = %config.cache_dir.display(), "audio processor created");
        Ok(Self {
            config,
            render_lock: Mutex::new(()),
            playback,
        })
    }

    pub fn config(&self) -> &ProcessorConfig {
        &self.config
    }

    pub fn playback(&self) -> &PlaybackController {
        &self.playback
    }

    /// Where a render named `output_name` will be written
    ///
    /// The name must be a bare file name: no directories, not empty.
    pub fn output_path(&self, output_name: &str) -> Result<PathBuf> {
        let name = Path::new(output_name);
        let mut components = name.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(part)), None) if part == name.as_os_str() => {
                Ok(self.config.cache_dir.join(name))
            }
            _ => Err(FxError::file_reason(
                name,
                "output file name must be a bare file name",
            )),
        }
    }

    /// Render `source` through the chain into the cache directory
    ///
    /// Returns the path of the new file.
    pub fn process_file(
        &self,
        source: &Path,
        output_name: &str,
        options: &ProcessOptions,
    ) -> Result<PathBuf> {
        Ok(self
            .process_file_with_report(source, output_name, options)?
            .output_path)
    }

    /// Like `process_file`, returning render statistics as well
    ///
    /// Options are validated before any file is touched. On failure the
    /// partial output is removed unless `keep_partial_output` is set.
    pub fn process_file_with_report(
        &self,
        source: &Path,
        output_name: &str,
        options: &ProcessOptions,
    ) -> Result<RenderReport> {
        let params = ParameterSet::from_options(options)?;
        let output_path = self.output_path(output_name)?;

        let _render = self.render_lock.lock();

        let reader = SourceReader::open(source)?;
        let format = *reader.format();
        if same_file(source, &output_path) {
            return Err(FxError::file_reason(
                &output_path,
                "output would overwrite the source",
            ));
        }

        let chain = EffectChain::build(
            &params,
            StreamFormat {
                sample_rate: format.sample_rate(),
                channels: format.channels(),
            },
            self.config.max_block_frames,
        );

        std::fs::create_dir_all(&self.config.cache_dir)
            .map_err(|e| FxError::file_access(&self.config.cache_dir, e))?;
        let writer = OutputWriter::create(&output_path, format.spec)?;

        info!(
            source = %source.display(),
            output = %output_path.display(),
            sample_rate = format.sample_rate(),
            channels = format.channels(),
            bits = format.bits_per_sample(),
            expected_frames = params.expected_output_frames(format.total_frames),
            "processing file"
        );

        let mut renderer = OfflineRenderer::new(
            ChainGraph::new(reader, chain),
            writer,
            self.config.max_block_frames,
            self.config.max_transient_retries,
        );
        let result = renderer.run();
        drop(renderer);

        if result.is_err() {
            if self.config.keep_partial_output {
                warn!(path = %output_path.display(), "keeping partial output");
            } else if let Err(e) = std::fs::remove_file(&output_path) {
                warn!(path = %output_path.display(), error = %e, "could not remove partial output");
            } else {
                debug!(path = %output_path.display(), "partial output removed");
            }
        }
        result
    }

    /// Sample rate of an audio file in Hz
    pub fn file_sample_rate(&self, path: &Path) -> Result<u32> {
        engine::file_sample_rate(path)
    }

    // ========================================================================
    // Playback
    // ========================================================================

    pub fn play_file(&self, path: &Path) -> Result<()> {
        self.playback.play_file(path)
    }

    pub fn play(&self) -> bool {
        self.playback.play()
    }

    pub fn pause(&self) -> bool {
        self.playback.pause()
    }

    pub fn stop(&self) -> bool {
        self.playback.stop()
    }

    pub fn is_playing(&self) -> bool {
        self.playback.is_playing()
    }

    pub fn playback_time(&self) -> Option<f64> {
        self.playback.playback_time()
    }

    pub fn set_playback_time(&self, seconds: f64) -> Result<bool> {
        self.playback.set_playback_time(seconds)
    }

    pub fn duration(&self) -> Option<f64> {
        self.playback.duration()
    }

    /// Listen for `SONG_IS_PLAYING` transitions
    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.playback.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.playback.unsubscribe(id)
    }
}

/// Whether two paths name the same existing file
fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
