//! Offline block renderer
//!
//! Pulls a source through the effect chain in bounded blocks and streams
//! each rendered block to a sink. Peak memory is one block per channel
//! plus whatever the rate stages hold back, independent of file length.
//!
//! Each render step reports a tagged status. Transient statuses are
//! retried without advancing the consumed-frame count; a fatal status
//! ends the render.

use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use tracing::{debug, info, trace, warn};

use crate::dsp::EffectChain;
use crate::engine::buffer::AudioBlock;
use crate::engine::io::{OutputWriter, SourceReader};
use crate::error::{FxError, Result};

// ============================================================================
// Render statuses
// ============================================================================

/// Why a render step asked to be retried
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransientReason {
    /// Not enough input was available this call
    InsufficientInput,
    /// The graph cannot render in its current context
    CannotRenderNow,
}

impl fmt::Display for TransientReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransientReason::InsufficientInput => write!(f, "insufficient input"),
            TransientReason::CannotRenderNow => write!(f, "cannot render in current context"),
        }
    }
}

/// Outcome of one render step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderStatus {
    /// The block was rendered
    Success,
    /// Try the same step again; nothing was consumed
    TransientRetry(TransientReason),
    /// Unrecoverable failure
    Fatal(String),
}

/// Lifecycle of one renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderState {
    #[default]
    Idle,
    Rendering,
    Completed,
    Failed,
}

impl fmt::Display for RenderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RenderState::Idle => write!(f, "Idle"),
            RenderState::Rendering => write!(f, "Rendering"),
            RenderState::Completed => write!(f, "Completed"),
            RenderState::Failed => write!(f, "Failed"),
        }
    }
}

// ============================================================================
// Seams
// ============================================================================

/// A graph that renders source frames on demand
pub trait RenderStep {
    /// Total source frames to consume
    fn total_frames(&self) -> u64;

    /// Channel count of rendered blocks
    fn channels(&self) -> usize;

    /// Consume `frames` source frames and leave the rendered result in `block`
    ///
    /// On anything but `Success` no source frames may be consumed.
    fn render(&mut self, frames: usize, block: &mut AudioBlock) -> RenderStatus;

    /// Emit output still held back once every source frame is consumed
    fn finish(&mut self, block: &mut AudioBlock) -> RenderStatus;
}

/// Destination for rendered blocks
pub trait BlockSink {
    fn write_block(&mut self, block: &AudioBlock) -> Result<()>;

    /// Close the destination, returning where it lives
    fn finalize(self) -> Result<PathBuf>
    where
        Self: Sized;
}

impl BlockSink for OutputWriter {
    fn write_block(&mut self, block: &AudioBlock) -> Result<()> {
        OutputWriter::write_block(self, block)
    }

    fn finalize(self) -> Result<PathBuf> {
        OutputWriter::finalize(self)
    }
}

// ============================================================================
// ChainGraph
// ============================================================================

/// WAV source feeding an effect chain
///
/// Every stage runs in-process, so a step is either `Success` or `Fatal`;
/// `TransientRetry` only comes from other `RenderStep` implementations.
pub struct ChainGraph {
    source: SourceReader,
    chain: EffectChain,
}

impl ChainGraph {
    pub fn new(source: SourceReader, chain: EffectChain) -> Self {
        Self { source, chain }
    }
}

impl RenderStep for ChainGraph {
    fn total_frames(&self) -> u64 {
        self.source.format().total_frames
    }

    fn channels(&self) -> usize {
        self.source.format().channels()
    }

    fn render(&mut self, frames: usize, block: &mut AudioBlock) -> RenderStatus {
        match self.source.read_block(frames, block) {
            Ok(got) if got == frames => {
                self.chain.process(block);
                RenderStatus::Success
            }
            Ok(got) => RenderStatus::Fatal(format!(
                "source ended early: expected {} frames, decoded {}",
                frames, got
            )),
            Err(e) => RenderStatus::Fatal(e.to_string()),
        }
    }

    fn finish(&mut self, block: &mut AudioBlock) -> RenderStatus {
        self.chain.finish(block);
        RenderStatus::Success
    }
}

// ============================================================================
// OfflineRenderer
// ============================================================================

/// Summary of a completed render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderReport {
    pub output_path: PathBuf,
    /// Source frames consumed (always the source total)
    pub consumed_frames: u64,
    /// Frames written to the output
    pub output_frames: u64,
    /// Successful block renders, excluding the final flush
    pub blocks: u64,
    /// Transient statuses retried along the way
    pub transient_retries: u64,
}

/// Single-use block renderer
///
/// `Idle → Rendering → {Completed | Failed}`
pub struct OfflineRenderer<G: RenderStep, W: BlockSink> {
    graph: G,
    sink: Option<W>,
    state: RenderState,
    max_block_frames: usize,
    max_transient_retries: Option<u64>,
    consumed_frames: u64,
    output_frames: u64,
    blocks: u64,
    transient_retries: u64,
    consecutive_retries: u64,
}

impl<G: RenderStep, W: BlockSink> OfflineRenderer<G, W> {
    /// Create a renderer
    ///
    /// # Arguments
    /// * `max_block_frames` - Largest block pulled per step (at least 1)
    /// * `max_transient_retries` - Cap on consecutive transient statuses; `None` retries forever
    pub fn new(
        graph: G,
        sink: W,
        max_block_frames: usize,
        max_transient_retries: Option<u64>,
    ) -> Self {
        Self {
            graph,
            sink: Some(sink),
            state: RenderState::Idle,
            max_block_frames: max_block_frames.max(1),
            max_transient_retries,
            consumed_frames: 0,
            output_frames: 0,
            blocks: 0,
            transient_retries: 0,
            consecutive_retries: 0,
        }
    }

    pub fn state(&self) -> RenderState {
        self.state
    }

    pub fn consumed_frames(&self) -> u64 {
        self.consumed_frames
    }

    /// Run the render to completion
    ///
    /// # Errors
    /// * `Render` - a step failed fatally, the retry cap was hit, or the
    ///   renderer was not `Idle`
    /// * `FileAccess` - the sink could not be written or finalized
    pub fn run(&mut self) -> Result<RenderReport> {
        if self.state != RenderState::Idle {
            return Err(FxError::Render {
                reason: format!("renderer is {}, not Idle", self.state),
            });
        }

        self.state = RenderState::Rendering;
        let total = self.graph.total_frames();
        info!(
            total_frames = total,
            max_block_frames = self.max_block_frames,
            "render started"
        );
        let started = Instant::now();

        match self.render_all(total) {
            Ok(report) => {
                self.state = RenderState::Completed;
                info!(
                    consumed_frames = report.consumed_frames,
                    output_frames = report.output_frames,
                    blocks = report.blocks,
                    transient_retries = report.transient_retries,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    path = %report.output_path.display(),
                    "render completed"
                );
                Ok(report)
            }
            Err(e) => {
                self.state = RenderState::Failed;
                warn!(
                    consumed_frames = self.consumed_frames,
                    total_frames = total,
                    error = %e,
                    "render failed"
                );
                Err(e)
            }
        }
    }

    fn render_all(&mut self, total: u64) -> Result<RenderReport> {
        let mut block = AudioBlock::with_capacity(self.graph.channels(), self.max_block_frames);

        while self.consumed_frames < total {
            let frames = (total - self.consumed_frames).min(self.max_block_frames as u64) as usize;
            match self.graph.render(frames, &mut block) {
                RenderStatus::Success => {
                    self.write(&block)?;
                    self.consumed_frames += frames as u64;
                    self.blocks += 1;
                    self.consecutive_retries = 0;
                }
                RenderStatus::TransientRetry(reason) => self.note_transient(reason)?,
                RenderStatus::Fatal(reason) => return Err(FxError::Render { reason }),
            }
        }

        debug!(consumed_frames = self.consumed_frames, "source exhausted, flushing chain");
        loop {
            match self.graph.finish(&mut block) {
                RenderStatus::Success => {
                    self.write(&block)?;
                    break;
                }
                RenderStatus::TransientRetry(reason) => self.note_transient(reason)?,
                RenderStatus::Fatal(reason) => return Err(FxError::Render { reason }),
            }
        }

        let sink = self.sink.take().ok_or_else(|| FxError::Render {
            reason: "output already finalized".to_string(),
        })?;
        let output_path = sink.finalize()?;

        Ok(RenderReport {
            output_path,
            consumed_frames: self.consumed_frames,
            output_frames: self.output_frames,
            blocks: self.blocks,
            transient_retries: self.transient_retries,
        })
    }

    fn write(&mut self, block: &AudioBlock) -> Result<()> {
        if block.is_empty() {
            return Ok(());
        }
        let sink = self.sink.as_mut().ok_or_else(|| FxError::Render {
            reason: "output already finalized".to_string(),
        })?;
        sink.write_block(block)?;
        self.output_frames += block.frames() as u64;
        Ok(())
    }

    fn note_transient(&mut self, reason: TransientReason) -> Result<()> {
        self.transient_retries += 1;
        self.consecutive_retries += 1;
        trace!(
            %reason,
            consecutive = self.consecutive_retries,
            consumed_frames = self.consumed_frames,
            "transient render status, retrying"
        );
        if let Some(max) = self.max_transient_retries {
            if self.consecutive_retries > max {
                return Err(FxError::Render {
                    reason: format!(
                        "gave up after {} consecutive transient statuses ({})",
                        max, reason
                    ),
                });
            }
        }
        std::thread::yield_now();
        Ok(())
    }
}
