//! Play-rate (varispeed) stage
//!
//! Output frame `i` reads the input at `i * rate` with linear
//! interpolation, so pitch and duration change together.

use serde_json::{json, Value};

use super::effect::{Effect, StageKind};
use super::fifo::FrameFifo;
use crate::engine::buffer::AudioBlock;
use crate::impl_effect_common;

/// Linear-interpolating resampler
#[derive(Debug, Clone)]
pub struct Varispeed {
    rate: f32,
    input: FrameFifo,
    frames_in: u64,
    emitted: u64,
}

impl Varispeed {
    /// Create a resampler stepping `rate` input frames per output frame
    pub fn new(rate: f32) -> Self {
        Self {
            rate,
            input: FrameFifo::default(),
            frames_in: 0,
            emitted: 0,
        }
    }

    pub fn rate(&self) -> f32 {
        self.rate
    }

    /// Whether the stage leaves audio untouched
    pub fn is_identity(&self) -> bool {
        self.rate == 1.0
    }

    #[inline]
    fn source_pos(&self, index: u64) -> f64 {
        index as f64 * self.rate as f64
    }

    fn emit(&mut self, flushing: bool, block: &mut AudioBlock) {
        block.clear();
        let exact = self.frames_in as f64 / self.rate as f64;

        if flushing {
            let target = exact.round() as u64;
            let last = self.frames_in.saturating_sub(1) as f64;
            while self.emitted < target {
                // Hold the final frame instead of fading into silence
                let pos = self.source_pos(self.emitted).min(last);
                self.push_frame(pos, block);
                self.emitted += 1;
            }
        } else {
            let target = exact.floor() as u64;
            while self.emitted < target {
                let pos = self.source_pos(self.emitted);
                if pos.floor() as u64 + 1 >= self.frames_in {
                    break;
                }
                self.push_frame(pos, block);
                self.emitted += 1;
            }
        }

        let keep_from = self.source_pos(self.emitted).floor() as u64;
        self.input.discard_before(keep_from);
    }

    #[inline]
    fn push_frame(&self, pos: f64, block: &mut AudioBlock) {
        for (ch, channel) in block.samples.iter_mut().enumerate() {
            channel.push(self.input.sample_at(ch, pos));
        }
    }
}

impl Effect for Varispeed {
    impl_effect_common!(StageKind::PlayRate, "Play Rate");

    fn prepare(&mut self, _sample_rate: u32, channels: usize, _max_block_size: usize) {
        self.input = FrameFifo::new(channels);
        self.reset();
    }

    fn process(&mut self, block: &mut AudioBlock) {
        if self.is_identity() {
            return;
        }
        self.input.push(block);
        self.frames_in += block.frames() as u64;
        self.emit(false, block);
    }

    fn drain(&mut self, block: &mut AudioBlock) {
        block.clear();
        if self.is_identity() {
            return;
        }
        self.emit(true, block);
    }

    fn reset(&mut self) {
        self.input.clear();
        self.frames_in = 0;
        self.emitted = 0;
    }

    fn params(&self) -> Value {
        json!({ "rate": self.rate })
    }
}
