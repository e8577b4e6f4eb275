//! Validated effect parameters
//!
//! `ParameterSet` is the only form in which parameters reach the effect
//! chain. It can be built from defaults or through `from_options`, which
//! checks every supplied field before anything else happens.

use std::ops::RangeInclusive;

use serde::Serialize;

use super::options::ProcessOptions;
use crate::error::{FxError, Result};

// ============================================================================
// Ranges and defaults
// ============================================================================

pub const PERCENT_RANGE: RangeInclusive<f64> = 0.0..=100.0;
pub const DELAY_TIME_MS_RANGE: RangeInclusive<f64> = 0.0..=2000.0;
pub const DELAY_FEEDBACK_RANGE: RangeInclusive<f64> = -100.0..=100.0;
pub const DELAY_CUTOFF_MIN_HZ: f64 = 10.0;
pub const DISTORTION_GAIN_DB_RANGE: RangeInclusive<f64> = -80.0..=20.0;
pub const PITCH_CENTS_RANGE: RangeInclusive<f64> = -2400.0..=2400.0;
pub const PITCH_OVERLAP_RANGE: RangeInclusive<f64> = 3.0..=32.0;
pub const PITCH_RATE_RANGE: RangeInclusive<f64> = (1.0 / 32.0)..=32.0;
pub const PLAY_RATE_RANGE: RangeInclusive<f64> = 0.25..=4.0;

const DEFAULT_DELAY_TIME_MS: u32 = 1000;
const DEFAULT_DELAY_FEEDBACK: f32 = 50.0;
const DEFAULT_DELAY_CUTOFF_HZ: u32 = 15000;
const DEFAULT_DISTORTION_GAIN_DB: f32 = -6.0;
const DEFAULT_PITCH_OVERLAP: f32 = 8.0;

/// Check one optional field against an inclusive range
///
/// NaN never lies inside a range, so it is rejected too.
fn check(
    value: Option<f64>,
    range: RangeInclusive<f64>,
    field: &'static str,
    message: &str,
) -> Result<Option<f64>> {
    match value {
        Some(v) if !range.contains(&v) => Err(FxError::Validation {
            field,
            message: message.to_string(),
        }),
        other => Ok(other),
    }
}

/// Complete, in-range parameters for one render
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterSet {
    reverb_amount: f32,
    delay_amount: f32,
    delay_time_ms: u32,
    delay_feedback: f32,
    delay_low_pass_cutoff_hz: u32,
    distortion_amount: f32,
    distortion_gain_db: f32,
    pitch_cents: i32,
    pitch_overlap: f32,
    pitch_rate: f32,
    play_rate: f32,
}

impl Default for ParameterSet {
    fn default() -> Self {
        Self {
            reverb_amount: 0.0,
            delay_amount: 0.0,
            delay_time_ms: DEFAULT_DELAY_TIME_MS,
            delay_feedback: DEFAULT_DELAY_FEEDBACK,
            delay_low_pass_cutoff_hz: DEFAULT_DELAY_CUTOFF_HZ,
            distortion_amount: 0.0,
            distortion_gain_db: DEFAULT_DISTORTION_GAIN_DB,
            pitch_cents: 0,
            pitch_overlap: DEFAULT_PITCH_OVERLAP,
            pitch_rate: 1.0,
            play_rate: 1.0,
        }
    }
}

impl ParameterSet {
    /// Validate raw options and fill absent fields with defaults
    ///
    /// Fields are checked in a fixed order and the first violation is
    /// reported. Either a complete set is returned or nothing is.
    pub fn from_options(options: &ProcessOptions) -> Result<Self> {
        let reverb = options.reverb.clone().unwrap_or_default();
        let delay = options.delay.clone().unwrap_or_default();
        let distortion = options.distortion.clone().unwrap_or_default();
        let pitch = options.pitch.clone().unwrap_or_default();
        let play_rate = options.play_rate.clone().unwrap_or_default();

        let reverb_amount = check(
            reverb.amount,
            PERCENT_RANGE,
            "reverb",
            "reverb must be between 0 and 100.",
        )?;
        let delay_amount = check(
            delay.amount,
            PERCENT_RANGE,
            "delay",
            "delay must be between 0 and 100.",
        )?;
        let delay_time_ms = check(
            delay.time_in_ms,
            DELAY_TIME_MS_RANGE,
            "delayTimeInMS",
            "delayTimeInMS must be between 0 and 2000.",
        )?;
        let delay_feedback = check(
            delay.feedback_amount,
            DELAY_FEEDBACK_RANGE,
            "delayFeedback",
            "delayFeedback must be between -100 and 100.",
        )?;
        check(
            delay.low_pass_cutoff,
            f64::MIN..=f64::MAX,
            "delayLowPassCutoff",
            "delayLowPassCutoff must be a finite number.",
        )?;
        let delay_cutoff = check(
            delay.low_pass_cutoff,
            DELAY_CUTOFF_MIN_HZ..=f64::MAX,
            "delayLowPassCutoff",
            "delayLowPassCutoff must be larger than 10.",
        )?;
        let distortion_amount = check(
            distortion.amount,
            PERCENT_RANGE,
            "distortionAmount",
            "distortionAmount must be between 0 and 100.",
        )?;
        let distortion_gain = check(
            distortion.gain,
            DISTORTION_GAIN_DB_RANGE,
            "distortionGain",
            "distortionGain must be between -80 and 20.",
        )?;
        let pitch_cents = check(
            pitch.amount,
            PITCH_CENTS_RANGE,
            "pitchAmount",
            "pitchAmount must be between -2400 and 2400.",
        )?;
        let pitch_overlap = check(
            pitch.overlap_amount,
            PITCH_OVERLAP_RANGE,
            "pitchOverlap",
            "pitchOverlap must be between 3 and 32.",
        )?;
        let pitch_rate = check(
            pitch.pitch_rate,
            PITCH_RATE_RANGE,
            "pitchRate",
            "pitchRate must be between 1/32 and 32.",
        )?;
        let play_rate = check(
            play_rate.amount,
            PLAY_RATE_RANGE,
            "playRate",
            "playRate must be between 0.25 and 4.",
        )?;

        let defaults = Self::default();
        Ok(Self {
            reverb_amount: reverb_amount.map_or(defaults.reverb_amount, |v| v as f32),
            delay_amount: delay_amount.map_or(defaults.delay_amount, |v| v as f32),
            delay_time_ms: delay_time_ms.map_or(defaults.delay_time_ms, |v| v.round() as u32),
            delay_feedback: delay_feedback.map_or(defaults.delay_feedback, |v| v as f32),
            delay_low_pass_cutoff_hz: delay_cutoff
                .map_or(defaults.delay_low_pass_cutoff_hz, |v| v.round().min(u32::MAX as f64) as u32),
            distortion_amount: distortion_amount.map_or(defaults.distortion_amount, |v| v as f32),
            distortion_gain_db: distortion_gain.map_or(defaults.distortion_gain_db, |v| v as f32),
            pitch_cents: pitch_cents.map_or(defaults.pitch_cents, |v| v.round() as i32),
            pitch_overlap: pitch_overlap.map_or(defaults.pitch_overlap, |v| v as f32),
            pitch_rate: pitch_rate.map_or(defaults.pitch_rate, |v| v as f32),
            play_rate: play_rate.map_or(defaults.play_rate, |v| v as f32),
        })
    }

    /// Reverb wet/dry blend, percent (0-100)
    pub fn reverb_amount(&self) -> f32 {
        self.reverb_amount
    }

    /// Delay wet/dry blend, percent (0-100)
    pub fn delay_amount(&self) -> f32 {
        self.delay_amount
    }

    /// Delay time in milliseconds (0-2000)
    pub fn delay_time_ms(&self) -> u32 {
        self.delay_time_ms
    }

    /// Delay feedback, percent (-100-100)
    pub fn delay_feedback(&self) -> f32 {
        self.delay_feedback
    }

    /// Delay feedback low-pass cutoff in Hz (>= 10)
    pub fn delay_low_pass_cutoff_hz(&self) -> u32 {
        self.delay_low_pass_cutoff_hz
    }

    /// Distortion wet/dry blend, percent (0-100)
    pub fn distortion_amount(&self) -> f32 {
        self.distortion_amount
    }

    /// Distortion pre-gain in dB (-80-20)
    pub fn distortion_gain_db(&self) -> f32 {
        self.distortion_gain_db
    }

    /// Pitch shift in cents (-2400-2400)
    pub fn pitch_cents(&self) -> i32 {
        self.pitch_cents
    }

    /// Grain overlap factor (3-32)
    pub fn pitch_overlap(&self) -> f32 {
        self.pitch_overlap
    }

    /// Time-stretch rate (1/32-32)
    pub fn pitch_rate(&self) -> f32 {
        self.pitch_rate
    }

    /// Varispeed rate (0.25-4)
    pub fn play_rate(&self) -> f32 {
        self.play_rate
    }

    /// Combined duration factor of the two rate stages
    pub fn duration_scale(&self) -> f64 {
        1.0 / (self.pitch_rate as f64 * self.play_rate as f64)
    }

    /// Frames a render of `source_frames` input frames is expected to produce
    pub fn expected_output_frames(&self, source_frames: u64) -> u64 {
        let stretched = (source_frames as f64 / self.pitch_rate as f64).round();
        (stretched / self.play_rate as f64).round() as u64
    }
}
