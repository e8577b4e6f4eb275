//! Delay Effect
//!
//! Per-channel delay line with signed feedback and a one-pole low-pass
//! in the feedback path.

use std::f32::consts::PI;

use serde_json::{json, Value};
use tracing::warn;

use crate::dsp::effect::{crossfade, Effect, StageKind};
use crate::engine::buffer::AudioBlock;
use crate::impl_effect_common;

/// Delay line with filtered feedback and a wet/dry blend
#[derive(Debug, Clone)]
pub struct Delay {
    /// Wet/dry blend, percent (0-100)
    amount: f32,
    /// Delay time in milliseconds (0-2000)
    delay_time_ms: u32,
    /// Feedback, percent (-100-100); negative inverts the repeats
    feedback: f32,
    /// Requested feedback low-pass cutoff in Hz
    low_pass_cutoff_hz: u32,
    /// Cutoff actually in use after clamping to Nyquist
    effective_cutoff_hz: f32,
    /// Circular buffer per channel, one delay period long
    lines: Vec<Vec<f32>>,
    /// One-pole lowpass filter state per channel
    filter_states: Vec<f32>,
    /// Current read/write position in the circular buffers
    pos: usize,
    /// One-pole coefficient for the current cutoff and rate
    filter_coeff: f32,
    sample_rate: u32,
}

impl Delay {
    /// Create a delay
    ///
    /// # Arguments
    /// * `amount` - Wet/dry blend, percent
    /// * `delay_time_ms` - Delay time in milliseconds
    /// * `feedback` - Feedback percent, sign kept
    /// * `low_pass_cutoff_hz` - Feedback low-pass cutoff
    pub fn new(amount: f32, delay_time_ms: u32, feedback: f32, low_pass_cutoff_hz: u32) -> Self {
        Self {
            amount: amount.clamp(0.0, 100.0),
            delay_time_ms,
            feedback: feedback.clamp(-100.0, 100.0),
            low_pass_cutoff_hz,
            effective_cutoff_hz: low_pass_cutoff_hz as f32,
            lines: Vec::new(),
            filter_states: Vec::new(),
            pos: 0,
            filter_coeff: 1.0,
            sample_rate: 48000,
        }
    }

    /// Delay time in milliseconds
    pub fn delay_time_ms(&self) -> u32 {
        self.delay_time_ms
    }

    /// Feedback as a signed gain (-1 to 1)
    pub fn feedback_gain(&self) -> f32 {
        self.feedback / 100.0
    }

    /// Cutoff in use after Nyquist clamping
    pub fn effective_cutoff_hz(&self) -> f32 {
        self.effective_cutoff_hz
    }

    /// Calculate delay in samples (at least one)
    fn delay_samples(&self) -> usize {
        ((self.delay_time_ms as f64 * self.sample_rate as f64 / 1000.0).round() as usize).max(1)
    }

    /// Calculate one-pole lowpass filter coefficient
    fn calc_filter_coeff(&self) -> f32 {
        // y[n] = y[n-1] + coeff * (x[n] - y[n-1])
        1.0 - (-2.0 * PI * self.effective_cutoff_hz / self.sample_rate as f32).exp()
    }

    /// Apply one-pole lowpass filter
    #[inline]
    fn apply_filter_inline(input: f32, state: &mut f32, coeff: f32) -> f32 {
        *state += coeff * (input - *state);
        *state
    }
}

impl Effect for Delay {
    impl_effect_common!(StageKind::Delay, "Delay");

    fn prepare(&mut self, sample_rate: u32, channels: usize, _max_block_size: usize) {
        self.sample_rate = sample_rate;

        let nyquist = sample_rate as f32 / 2.0;
        self.effective_cutoff_hz = self.low_pass_cutoff_hz as f32;
        if self.effective_cutoff_hz > nyquist {
            warn!(
                requested_hz = self.low_pass_cutoff_hz,
                nyquist_hz = nyquist,
                "delay low-pass cutoff above Nyquist, clamping"
            );
            self.effective_cutoff_hz = nyquist;
        }
        self.filter_coeff = self.calc_filter_coeff();

        let size = self.delay_samples();
        self.lines = vec![vec![0.0; size]; channels];
        self.filter_states = vec![0.0; channels];
        self.pos = 0;
    }

    fn process(&mut self, block: &mut AudioBlock) {
        if self.amount <= 0.0 || self.lines.is_empty() || block.is_empty() {
            return;
        }
        let mix = self.amount / 100.0;
        let feedback = self.feedback_gain();
        let coeff = self.filter_coeff;
        let size = self.lines[0].len();
        let frames = block.frames();
        let start = self.pos;

        for ((line, state), channel) in self
            .lines
            .iter_mut()
            .zip(self.filter_states.iter_mut())
            .zip(block.samples.iter_mut())
        {
            let mut pos = start;
            for sample in channel.iter_mut() {
                let input = *sample;
                let delayed = line[pos];
                let filtered = Self::apply_filter_inline(delayed, state, coeff);
                line[pos] = input + filtered * feedback;
                *sample = crossfade(input, delayed, mix);
                pos += 1;
                if pos == size {
                    pos = 0;
                }
            }
        }

        self.pos = (start + frames) % size;
    }

    fn reset(&mut self) {
        for line in &mut self.lines {
            line.fill(0.0);
        }
        self.filter_states.fill(0.0);
        self.pos = 0;
    }

    fn params(&self) -> Value {
        json!({
            "amount": self.amount,
            "delay_time_ms": self.delay_time_ms,
            "feedback": self.feedback,
            "low_pass_cutoff_hz": self.low_pass_cutoff_hz,
            "effective_cutoff_hz": self.effective_cutoff_hz,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn impulse(channels: usize, frames: usize) -> AudioBlock {
        let mut block = AudioBlock::silent(channels, frames);
        for ch in 0..channels {
            block.samples[ch][0] = 1.0;
        }
        block
    }

    #[test]
    fn test_zero_amount_is_passthrough() {
        let mut delay = Delay::new(0.0, 100, 50.0, 15000);
        delay.prepare(1000, 1, 512);
        let original = impulse(1, 300);
        let mut block = original.clone();
        delay.process(&mut block);
        assert_eq!(block, original);
    }

    #[test]
    fn test_fully_wet_echo_lands_on_delay_time() {
        // 100 ms at 1 kHz = 100 samples
        let mut delay = Delay::new(100.0, 100, 0.0, 400);
        delay.prepare(1000, 1, 512);
        let mut block = impulse(1, 300);
        delay.process(&mut block);

        assert_eq!(block.samples[0][0], 0.0);
        assert_relative_eq!(block.samples[0][100], 1.0);
        // No feedback: a single repeat
        assert_eq!(block.samples[0][200], 0.0);
    }

    #[test]
    fn test_echo_crosses_block_boundaries() {
        let mut delay = Delay::new(100.0, 100, 0.0, 400);
        delay.prepare(1000, 1, 64);
        let mut first = impulse(1, 64);
        delay.process(&mut first);
        let mut second = AudioBlock::silent(1, 64);
        delay.process(&mut second);
        // Absolute frame 100 is index 36 of the second block
        assert_relative_eq!(second.samples[0][36], 1.0);
    }

    #[test]
    fn test_negative_feedback_inverts_repeats() {
        let mut delay = Delay::new(100.0, 10, -50.0, 450);
        delay.prepare(1000, 1, 512);
        let mut block = impulse(1, 40);
        delay.process(&mut block);

        assert!(block.samples[0][10] > 0.0);
        assert!(block.samples[0][20] < 0.0, "second repeat should be inverted");
        assert!(block.samples[0][20].abs() < block.samples[0][10]);
    }

    #[test]
    fn test_cutoff_clamped_to_nyquist() {
        let mut delay = Delay::new(50.0, 500, 50.0, 30000);
        delay.prepare(22050, 2, 4096);
        assert_relative_eq!(delay.effective_cutoff_hz(), 11025.0);

        let mut delay = Delay::new(50.0, 500, 50.0, 8000);
        delay.prepare(44100, 2, 4096);
        assert_relative_eq!(delay.effective_cutoff_hz(), 8000.0);
    }

    #[test]
    fn test_zero_time_uses_one_sample() {
        let mut delay = Delay::new(100.0, 0, 0.0, 15000);
        delay.prepare(44100, 1, 16);
        let mut block = impulse(1, 4);
        delay.process(&mut block);
        assert_eq!(block.samples[0][0], 0.0);
        assert_relative_eq!(block.samples[0][1], 1.0);
    }

    #[test]
    fn test_reset_clears_line() {
        let mut delay = Delay::new(100.0, 10, 90.0, 15000);
        delay.prepare(1000, 1, 64);
        let mut block = impulse(1, 5);
        delay.process(&mut block);
        delay.reset();
        let mut silent = AudioBlock::silent(1, 64);
        delay.process(&mut silent);
        assert_eq!(silent.peak(), 0.0);
    }
}
