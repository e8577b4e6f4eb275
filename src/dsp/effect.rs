//! Effect trait definition
//!
//! Base trait for every stage of the render chain.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::engine::buffer::AudioBlock;

/// Identity of a chain stage, in chain order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageKind {
    Reverb = 0,
    Delay = 1,
    Distortion = 2,
    TimePitch = 3,
    PlayRate = 4,
}

impl StageKind {
    /// Every stage in the order audio flows through them
    pub const ORDER: [StageKind; 5] = [
        StageKind::Reverb,
        StageKind::Delay,
        StageKind::Distortion,
        StageKind::TimePitch,
        StageKind::PlayRate,
    ];

    /// Whether the stage changes the number of frames
    pub fn changes_length(self) -> bool {
        matches!(self, StageKind::TimePitch | StageKind::PlayRate)
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StageKind::Reverb => "reverb",
            StageKind::Delay => "delay",
            StageKind::Distortion => "distortion",
            StageKind::TimePitch => "time_pitch",
            StageKind::PlayRate => "play_rate",
        };
        f.write_str(name)
    }
}

/// Base trait for all chain stages
///
/// Stages process blocks in place. Length-preserving stages leave the
/// frame count alone; rate stages replace the block with however many
/// output frames are ready and hand back the rest from `drain` once the
/// input is exhausted.
pub trait Effect: Send {
    /// Which stage this is
    fn stage(&self) -> StageKind;

    /// Get human-readable display name
    fn display_name(&self) -> &str;

    /// Prepare the effect for processing
    ///
    /// Called once before the first block, and again if the stream format changes.
    fn prepare(&mut self, sample_rate: u32, channels: usize, max_block_size: usize);

    /// Process audio block in place
    fn process(&mut self, block: &mut AudioBlock);

    /// Emit any output still held back after the last input block
    ///
    /// The block is cleared first. Stages without a tail emit nothing.
    fn drain(&mut self, block: &mut AudioBlock) {
        block.clear();
    }

    /// Reset effect state
    ///
    /// Clears internal buffers (filter history, delay lines, grain queues).
    fn reset(&mut self);

    /// Get all parameters as JSON (for logging/reporting)
    fn params(&self) -> Value;
}

/// Crossfade between a dry and a wet sample
///
/// `mix` is the wet fraction (0 = dry only, 1 = wet only).
#[inline]
pub fn crossfade(dry: f32, wet: f32, mix: f32) -> f32 {
    dry * (1.0 - mix) + wet * mix
}

/// Helper macro to implement common Effect trait methods
#[macro_export]
macro_rules! impl_effect_common {
    ($stage:expr, $display_name:expr) => {
        fn stage(&self) -> $crate::dsp::StageKind {
            $stage
        }

        fn display_name(&self) -> &str {
            $display_name
        }
    };
}
