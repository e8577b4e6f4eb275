//! Effect chain
//!
//! The chain is fixed: reverb → delay → distortion → time/pitch → play rate.
//! Every stage is always present; a stage at its neutral setting passes
//! audio through untouched.

use serde_json::{json, Value};
use tracing::debug;

use super::{Delay, Distortion, Effect, Reverb, StageKind, TimePitch, Varispeed};
use crate::engine::buffer::AudioBlock;
use crate::params::ParameterSet;

/// Layout of the audio flowing through a chain
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamFormat {
    pub sample_rate: u32,
    pub channels: usize,
}

/// Ordered, prepared chain of stages for one render
pub struct EffectChain {
    effects: Vec<Box<dyn Effect>>,
    format: StreamFormat,
    max_block_frames: usize,
}

impl EffectChain {
    /// Instantiate and prepare all five stages from validated parameters
    pub fn build(params: &ParameterSet, format: StreamFormat, max_block_frames: usize) -> Self {
        let mut effects: Vec<Box<dyn Effect>> = vec![
            Box::new(Reverb::new(params.reverb_amount())),
            Box::new(Delay::new(
                params.delay_amount(),
                params.delay_time_ms(),
                params.delay_feedback(),
                params.delay_low_pass_cutoff_hz(),
            )),
            Box::new(Distortion::new(
                params.distortion_amount(),
                params.distortion_gain_db(),
            )),
            Box::new(TimePitch::new(
                params.pitch_cents(),
                params.pitch_overlap(),
                params.pitch_rate(),
            )),
            Box::new(Varispeed::new(params.play_rate())),
        ];

        for effect in &mut effects {
            effect.prepare(format.sample_rate, format.channels, max_block_frames);
        }

        let chain = Self {
            effects,
            format,
            max_block_frames,
        };
        debug!(
            sample_rate = format.sample_rate,
            channels = format.channels,
            max_block_frames,
            stages = %chain.to_json(),
            "effect chain built"
        );
        chain
    }

    /// Stage order, first to last
    pub fn stages(&self) -> Vec<StageKind> {
        self.effects.iter().map(|e| e.stage()).collect()
    }

    /// Stream layout the chain was prepared for
    pub fn format(&self) -> StreamFormat {
        self.format
    }

    /// Get the number of stages in the chain
    pub fn len(&self) -> usize {
        self.effects.len()
    }

    /// Check if the chain is empty
    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }

    /// Run one block through every stage
    ///
    /// Rate stages may leave the block shorter or longer than it came in.
    pub fn process(&mut self, block: &mut AudioBlock) {
        for effect in &mut self.effects {
            effect.process(block);
        }
    }

    /// Flush every stage's held-back output into `out`
    ///
    /// Each stage's tail is pushed through the stages after it before the
    /// next stage is drained.
    pub fn finish(&mut self, out: &mut AudioBlock) {
        out.clear();
        let mut tail = AudioBlock::with_capacity(self.format.channels, self.max_block_frames);
        for i in 0..self.effects.len() {
            let (head, rest) = self.effects.split_at_mut(i + 1);
            head[i].drain(&mut tail);
            for effect in rest.iter_mut() {
                effect.process(&mut tail);
            }
            out.append(&tail);
        }
    }

    /// Reset all stages
    pub fn reset(&mut self) {
        for effect in &mut self.effects {
            effect.reset();
        }
    }

    /// Describe the chain as JSON
    pub fn to_json(&self) -> Value {
        let stages: Vec<Value> = self
            .effects
            .iter()
            .map(|e| {
                json!({
                    "stage": e.stage(),
                    "name": e.display_name(),
                    "params": e.params(),
                })
            })
            .collect();
        json!({
            "stages": stages,
            "sample_rate": self.format.sample_rate,
            "channels": self.format.channels,
            "max_block_frames": self.max_block_frames,
        })
    }
}
