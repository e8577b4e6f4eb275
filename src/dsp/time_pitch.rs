//! Time-stretch / pitch-shift stage
//!
//! Windowed overlap-add granular stretcher. Grain `k` starts reading the
//! input at `k * analysis_hop`, steps through it at `2^(cents/1200)` input
//! frames per output frame, and is added to the output at
//! `k * synthesis_hop`. The ratio of the two hops sets the duration; the
//! in-grain read speed sets the pitch.
//!
//! Output is normalized by the summed window weight, so a flat signal
//! stays flat for any overlap factor.

use std::f64::consts::PI;

use serde_json::{json, Value};

use super::effect::{Effect, StageKind};
use super::fifo::FrameFifo;
use crate::engine::buffer::AudioBlock;
use crate::impl_effect_common;

/// Grain length in seconds
const GRAIN_SECONDS: f64 = 0.0464;

/// Shortest grain in frames, for very low sample rates
const MIN_GRAIN_FRAMES: usize = 16;

/// Granular time-stretcher and pitch-shifter
#[derive(Debug, Clone)]
pub struct TimePitch {
    cents: i32,
    overlap: f32,
    rate: f32,

    grain_len: usize,
    synthesis_hop: u64,
    analysis_hop: f64,
    pitch_ratio: f64,
    window: Vec<f32>,

    input: FrameFifo,
    frames_in: u64,
    /// Overlap-add accumulator; index 0 is output frame `emitted`
    acc: Vec<Vec<f32>>,
    weight: Vec<f32>,
    next_grain: u64,
    emitted: u64,
}

impl TimePitch {
    /// Create a stretcher
    ///
    /// # Arguments
    /// * `cents` - Pitch shift in cents
    /// * `overlap` - Grain overlap factor (3-32)
    /// * `rate` - Time-stretch rate; 2.0 halves the duration
    pub fn new(cents: i32, overlap: f32, rate: f32) -> Self {
        Self {
            cents,
            overlap: overlap.max(1.0),
            rate,
            grain_len: 0,
            synthesis_hop: 1,
            analysis_hop: rate as f64,
            pitch_ratio: 2.0_f64.powf(cents as f64 / 1200.0),
            window: Vec::new(),
            input: FrameFifo::default(),
            frames_in: 0,
            acc: Vec::new(),
            weight: Vec::new(),
            next_grain: 0,
            emitted: 0,
        }
    }

    /// Whether the stage leaves audio untouched
    pub fn is_identity(&self) -> bool {
        self.cents == 0 && self.rate == 1.0
    }

    /// Grain length in frames (0 before `prepare`)
    pub fn grain_len(&self) -> usize {
        self.grain_len
    }

    /// Output frames owed for the input seen so far
    fn output_target(&self, flushing: bool) -> u64 {
        let exact = self.frames_in as f64 / self.rate as f64;
        if flushing {
            exact.round() as u64
        } else {
            exact.floor() as u64
        }
    }

    fn grain_start(&self, k: u64) -> f64 {
        k as f64 * self.analysis_hop
    }

    /// Whether every input frame grain `k` reads has arrived
    fn grain_ready(&self, k: u64) -> bool {
        let last = self.grain_start(k) + (self.grain_len - 1) as f64 * self.pitch_ratio;
        (last.floor() as u64) + 1 < self.frames_in
    }

    /// Overlap-add one grain into the accumulator
    fn add_grain(&mut self, k: u64) {
        let start = self.grain_start(k);
        let offset = (k * self.synthesis_hop - self.emitted) as usize;
        let needed = offset + self.grain_len;
        if self.weight.len() < needed {
            self.weight.resize(needed, 0.0);
            for channel in &mut self.acc {
                channel.resize(needed, 0.0);
            }
        }

        for (j, &w) in self.window.iter().enumerate() {
            let pos = start + j as f64 * self.pitch_ratio;
            for (ch, channel) in self.acc.iter_mut().enumerate() {
                channel[offset + j] += w * self.input.sample_at(ch, pos);
            }
            self.weight[offset + j] += w;
        }
    }

    /// Process grains, then emit finalized output up to the target
    fn advance(&mut self, flushing: bool, block: &mut AudioBlock) {
        let target = self.output_target(flushing);

        if flushing {
            while self.next_grain * self.synthesis_hop < target {
                self.add_grain(self.next_grain);
                self.next_grain += 1;
            }
        } else {
            while self.grain_ready(self.next_grain) {
                self.add_grain(self.next_grain);
                self.next_grain += 1;
            }
        }

        // Everything before the next grain's start is final
        let finalized = (self.next_grain * self.synthesis_hop).min(target);
        let count = finalized.saturating_sub(self.emitted) as usize;

        block.clear();
        for i in 0..count {
            let weight = self.weight.get(i).copied().unwrap_or(0.0);
            for (channel, acc) in block.samples.iter_mut().zip(&self.acc) {
                let value = acc.get(i).copied().unwrap_or(0.0);
                channel.push(if weight > 0.0 { value / weight } else { 0.0 });
            }
        }

        let consumed = count.min(self.weight.len());
        self.weight.drain(..consumed);
        for channel in &mut self.acc {
            channel.drain(..consumed);
        }
        self.emitted += count as u64;

        // Future grains never read before their own start
        let keep_from = self.grain_start(self.next_grain).floor() as u64;
        self.input.discard_before(keep_from);
    }
}

impl Effect for TimePitch {
    impl_effect_common!(StageKind::TimePitch, "Time/Pitch");

    fn prepare(&mut self, sample_rate: u32, channels: usize, _max_block_size: usize) {
        self.grain_len = ((sample_rate as f64 * GRAIN_SECONDS).round() as usize).max(MIN_GRAIN_FRAMES);
        self.synthesis_hop = ((self.grain_len as f64 / self.overlap as f64).round() as u64).max(1);
        self.analysis_hop = self.synthesis_hop as f64 * self.rate as f64;
        self.pitch_ratio = 2.0_f64.powf(self.cents as f64 / 1200.0);

        // Hann window sampled at half-frame offsets so no tap is exactly zero
        let n = self.grain_len as f64;
        self.window = (0..self.grain_len)
            .map(|j| (0.5 - 0.5 * (2.0 * PI * (j as f64 + 0.5) / n).cos()) as f32)
            .collect();

        self.input = FrameFifo::new(channels);
        self.acc = vec![Vec::new(); channels];
        self.reset();
    }

    fn process(&mut self, block: &mut AudioBlock) {
        if self.is_identity() {
            return;
        }
        self.input.push(block);
        self.frames_in += block.frames() as u64;
        self.advance(false, block);
    }

    fn drain(&mut self, block: &mut AudioBlock) {
        block.clear();
        if self.is_identity() {
            return;
        }
        self.advance(true, block);
    }

    fn reset(&mut self) {
        self.input.clear();
        self.frames_in = 0;
        for channel in &mut self.acc {
            channel.clear();
        }
        self.weight.clear();
        self.next_grain = 0;
        self.emitted = 0;
    }

    fn params(&self) -> Value {
        json!({
            "cents": self.cents,
            "overlap": self.overlap,
            "rate": self.rate,
            "grain_len": self.grain_len,
            "synthesis_hop": self.synthesis_hop,
        })
    }
}
