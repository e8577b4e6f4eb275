//! Distortion stage
//!
//! Pre-gain followed by a tape-style soft-saturation waveshaper, blended
//! with the dry signal.

use serde_json::{json, Value};

use crate::dsp::effect::{crossfade, Effect, StageKind};
use crate::engine::buffer::{db_to_linear, AudioBlock};
use crate::impl_effect_common;

/// Fixed drive of the waveshaper
const DRIVE: f32 = 0.5;

// ============================================================================
// Waveshaping
// ============================================================================

/// Tape saturation: soft saturation with slight asymmetry
///
/// `tanh(x * (1 + drive * 4))` plus a small even-harmonic term.
#[inline]
fn waveshape_tape(x: f32, drive: f32) -> f32 {
    let gain = 1.0 + drive * 4.0;
    let shaped = (x * gain).tanh();
    let asymmetry = 0.1 * drive;
    shaped + asymmetry * shaped * shaped
}

// ============================================================================
// Distortion Effect
// ============================================================================

/// Waveshaping distortion
///
/// # Parameters
/// - `amount`: wet/dry blend, percent (0 = dry)
/// - `gain_db`: gain applied before the waveshaper, dB
#[derive(Debug, Clone)]
pub struct Distortion {
    amount: f32,
    gain_db: f32,
    gain_linear: f32,
}

impl Distortion {
    pub fn new(amount: f32, gain_db: f32) -> Self {
        Self {
            amount: amount.clamp(0.0, 100.0),
            gain_db,
            gain_linear: db_to_linear(gain_db),
        }
    }

    /// Wet/dry blend, percent
    pub fn amount(&self) -> f32 {
        self.amount
    }

    /// Pre-gain in dB
    pub fn gain_db(&self) -> f32 {
        self.gain_db
    }

    /// Wet signal for one dry sample
    #[inline]
    fn shape(&self, x: f32) -> f32 {
        waveshape_tape(x * self.gain_linear, DRIVE)
    }
}

impl Effect for Distortion {
    impl_effect_common!(StageKind::Distortion, "Distortion");

    fn prepare(&mut self, _sample_rate: u32, _channels: usize, _max_block_size: usize) {
        self.gain_linear = db_to_linear(self.gain_db);
    }

    fn process(&mut self, block: &mut AudioBlock) {
        // Fully dry: leave the block untouched
        if self.amount <= 0.0 {
            return;
        }
        let mix = self.amount / 100.0;
        for channel in &mut block.samples {
            for sample in channel.iter_mut() {
                let dry = *sample;
                *sample = crossfade(dry, self.shape(dry), mix);
            }
        }
    }

    fn reset(&mut self) {
        // Stateless
    }

    fn params(&self) -> Value {
        json!({
            "amount": self.amount,
            "gain_db": self.gain_db,
            "shape": "tape",
            "drive": DRIVE,
        })
    }
}
