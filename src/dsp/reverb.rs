//! Reverb stage
//!
//! Freeverb tank per channel:
//! - 8 parallel lowpass-feedback comb filters
//! - 4 series allpass filters for diffusion
//!
//! The room is fixed to a medium hall; only the wet/dry blend is exposed.

use serde_json::{json, Value};

use super::effect::{crossfade, Effect, StageKind};
use crate::engine::buffer::AudioBlock;
use crate::impl_effect_common;

// ============================================================================
// Freeverb Constants
// ============================================================================

/// Reference sample rate for Freeverb delays
const REFERENCE_SAMPLE_RATE: f64 = 44100.0;

/// Comb filter delays at 44100 Hz (8 filters)
const COMB_DELAYS: [usize; 8] = [1116, 1188, 1277, 1356, 1422, 1491, 1557, 1617];

/// Allpass filter delays at 44100 Hz (4 filters)
const ALLPASS_DELAYS: [usize; 4] = [556, 441, 341, 225];

/// Per-channel delay offset in samples, decorrelates the tanks
const STEREO_SPREAD: usize = 23;

/// Fixed gain for allpass filters
const ALLPASS_GAIN: f32 = 0.5;

/// Room size to comb feedback mapping
const ROOM_SCALE: f32 = 0.28;
const ROOM_OFFSET: f32 = 0.7;

/// Damping to low-pass coefficient mapping
const DAMP_SCALE: f32 = 0.4;

/// Tank input attenuation and wet output makeup
const INPUT_GAIN: f32 = 0.015;
const WET_SCALE: f32 = 3.0;

/// Medium hall room
const HALL_ROOM_SIZE: f32 = 0.75;
const HALL_DAMPING: f32 = 0.5;

// ============================================================================
// Filter Components
// ============================================================================

/// Low-pass comb filter
///
/// y[n] = x[n - d] + feedback * lowpass(y[n - d])
#[derive(Debug, Clone)]
struct CombFilter {
    buffer: Vec<f32>,
    pos: usize,
    filter_state: f32,
    feedback: f32,
    damp1: f32,
    damp2: f32,
}

impl CombFilter {
    fn new(delay: usize, feedback: f32, damping: f32) -> Self {
        Self {
            buffer: vec![0.0; delay.max(1)],
            pos: 0,
            filter_state: 0.0,
            feedback,
            damp1: damping,
            damp2: 1.0 - damping,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let output = self.buffer[self.pos];
        self.filter_state = output * self.damp2 + self.filter_state * self.damp1;
        self.buffer[self.pos] = input + self.filter_state * self.feedback;
        self.pos += 1;
        if self.pos == self.buffer.len() {
            self.pos = 0;
        }
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.filter_state = 0.0;
        self.pos = 0;
    }
}

/// Schroeder allpass filter
#[derive(Debug, Clone)]
struct AllpassFilter {
    buffer: Vec<f32>,
    pos: usize,
}

impl AllpassFilter {
    fn new(delay: usize) -> Self {
        Self {
            buffer: vec![0.0; delay.max(1)],
            pos: 0,
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let delayed = self.buffer[self.pos];
        let output = delayed - input;
        self.buffer[self.pos] = input + delayed * ALLPASS_GAIN;
        self.pos += 1;
        if self.pos == self.buffer.len() {
            self.pos = 0;
        }
        output
    }

    fn clear(&mut self) {
        self.buffer.fill(0.0);
        self.pos = 0;
    }
}

/// One channel's comb bank and allpass chain
#[derive(Debug, Clone)]
struct Tank {
    combs: Vec<CombFilter>,
    allpasses: Vec<AllpassFilter>,
}

impl Tank {
    fn new(sample_rate: u32, spread: usize) -> Self {
        let scale = sample_rate as f64 / REFERENCE_SAMPLE_RATE;
        let scaled = |d: usize| (((d + spread) as f64) * scale).round() as usize;
        let feedback = HALL_ROOM_SIZE * ROOM_SCALE + ROOM_OFFSET;
        let damping = HALL_DAMPING * DAMP_SCALE;
        Self {
            combs: COMB_DELAYS
                .iter()
                .map(|&d| CombFilter::new(scaled(d), feedback, damping))
                .collect(),
            allpasses: ALLPASS_DELAYS
                .iter()
                .map(|&d| AllpassFilter::new(scaled(d)))
                .collect(),
        }
    }

    #[inline]
    fn process(&mut self, input: f32) -> f32 {
        let input = input * INPUT_GAIN;
        let mut out: f32 = self.combs.iter_mut().map(|c| c.process(input)).sum();
        for allpass in &mut self.allpasses {
            out = allpass.process(out);
        }
        out * WET_SCALE
    }

    fn clear(&mut self) {
        self.combs.iter_mut().for_each(CombFilter::clear);
        self.allpasses.iter_mut().for_each(AllpassFilter::clear);
    }
}

// ============================================================================
// Main Reverb Effect
// ============================================================================

/// Medium-hall reverb with a wet/dry blend
#[derive(Debug, Clone)]
pub struct Reverb {
    /// Wet/dry blend, percent
    amount: f32,
    sample_rate: u32,
    tanks: Vec<Tank>,
}

impl Reverb {
    /// Create a reverb with the given wet/dry blend (percent)
    pub fn new(amount: f32) -> Self {
        Self {
            amount: amount.clamp(0.0, 100.0),
            sample_rate: REFERENCE_SAMPLE_RATE as u32,
            tanks: Vec::new(),
        }
    }

    /// Wet/dry blend, percent
    pub fn amount(&self) -> f32 {
        self.amount
    }
}

impl Effect for Reverb {
    impl_effect_common!(StageKind::Reverb, "Reverb");

    fn prepare(&mut self, sample_rate: u32, channels: usize, _max_block_size: usize) {
        self.sample_rate = sample_rate;
        self.tanks = (0..channels)
            .map(|ch| Tank::new(sample_rate, ch * STEREO_SPREAD))
            .collect();
    }

    fn process(&mut self, block: &mut AudioBlock) {
        if self.amount <= 0.0 {
            return;
        }
        let mix = self.amount / 100.0;
        for (tank, channel) in self.tanks.iter_mut().zip(block.samples.iter_mut()) {
            for sample in channel.iter_mut() {
                let wet = tank.process(*sample);
                *sample = crossfade(*sample, wet, mix);
            }
        }
    }

    fn reset(&mut self) {
        self.tanks.iter_mut().for_each(Tank::clear);
    }

    fn params(&self) -> Value {
        json!({
            "amount": self.amount,
            "preset": "medium_hall",
            "room_size": HALL_ROOM_SIZE,
            "damping": HALL_DAMPING,
            "sample_rate": self.sample_rate,
        })
    }
}
