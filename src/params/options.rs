//! Raw processing options as supplied by a caller
//!
//! Every leaf is optional. Nothing here is range-checked; that happens once
//! in `ParameterSet::from_options`.

use serde::{Deserialize, Serialize};

/// Reverb options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReverbOptions {
    /// Wet/dry blend, percent
    pub amount: Option<f64>,
}

/// Delay options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelayOptions {
    /// Wet/dry blend, percent
    pub amount: Option<f64>,
    /// Delay time in milliseconds
    #[serde(rename = "timeInMS")]
    pub time_in_ms: Option<f64>,
    /// Feedback, percent (may be negative)
    pub feedback_amount: Option<f64>,
    /// Feedback-path low-pass cutoff in Hz
    pub low_pass_cutoff: Option<f64>,
}

/// Distortion options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DistortionOptions {
    /// Wet/dry blend, percent
    pub amount: Option<f64>,
    /// Pre-gain in dB
    pub gain: Option<f64>,
}

/// Pitch / time-stretch options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PitchOptions {
    /// Pitch shift in cents
    pub amount: Option<f64>,
    /// Grain overlap factor
    pub overlap_amount: Option<f64>,
    /// Time-stretch rate multiplier
    pub pitch_rate: Option<f64>,
}

/// Playback-rate options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayRateOptions {
    /// Varispeed rate multiplier
    pub amount: Option<f64>,
}

/// Options for one `process_file` call, grouped by effect
///
/// Deserializes from the nested JSON shape:
///
/// ```
/// use fxchain::params::ProcessOptions;
///
/// let opts: ProcessOptions =
///     serde_json::from_str(r#"{ "delay": { "timeInMS": 250 }, "playRate": { "amount": 2 } }"#)
///         .unwrap();
/// assert_eq!(opts.delay.unwrap().time_in_ms, Some(250.0));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessOptions {
    pub reverb: Option<ReverbOptions>,
    pub delay: Option<DelayOptions>,
    pub distortion: Option<DistortionOptions>,
    pub pitch: Option<PitchOptions>,
    pub play_rate: Option<PlayRateOptions>,
}

impl ProcessOptions {
    /// Empty options (every field defaulted)
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse options from a JSON document
    pub fn from_json(json: &str) -> crate::error::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn reverb(mut self, amount: f64) -> Self {
        self.reverb.get_or_insert_with(Default::default).amount = Some(amount);
        self
    }

    pub fn delay(mut self, amount: f64) -> Self {
        self.delay.get_or_insert_with(Default::default).amount = Some(amount);
        self
    }

    pub fn delay_time_ms(mut self, ms: f64) -> Self {
        self.delay.get_or_insert_with(Default::default).time_in_ms = Some(ms);
        self
    }

    pub fn delay_feedback(mut self, percent: f64) -> Self {
        self.delay.get_or_insert_with(Default::default).feedback_amount = Some(percent);
        self
    }

    pub fn delay_low_pass_cutoff(mut self, hz: f64) -> Self {
        self.delay.get_or_insert_with(Default::default).low_pass_cutoff = Some(hz);
        self
    }

    pub fn distortion(mut self, amount: f64) -> Self {
        self.distortion.get_or_insert_with(Default::default).amount = Some(amount);
        self
    }

    pub fn distortion_gain(mut self, db: f64) -> Self {
        self.distortion.get_or_insert_with(Default::default).gain = Some(db);
        self
    }

    pub fn pitch_cents(mut self, cents: f64) -> Self {
        self.pitch.get_or_insert_with(Default::default).amount = Some(cents);
        self
    }

    pub fn pitch_overlap(mut self, overlap: f64) -> Self {
        self.pitch.get_or_insert_with(Default::default).overlap_amount = Some(overlap);
        self
    }

    pub fn pitch_rate(mut self, rate: f64) -> Self {
        self.pitch.get_or_insert_with(Default::default).pitch_rate = Some(rate);
        self
    }

    pub fn play_rate(mut self, rate: f64) -> Self {
        self.play_rate.get_or_insert_with(Default::default).amount = Some(rate);
        self
    }
}
