//! Effect parameters
//!
//! Raw caller options are validated once at the boundary into a
//! `ParameterSet`; only the validated form travels further.

mod options;
mod set;

pub use options::{
    DelayOptions, DistortionOptions, PitchOptions, PlayRateOptions, ProcessOptions, ReverbOptions,
};
pub use set::{
    ParameterSet, DELAY_CUTOFF_MIN_HZ, DELAY_FEEDBACK_RANGE, DELAY_TIME_MS_RANGE,
    DISTORTION_GAIN_DB_RANGE, PERCENT_RANGE, PITCH_CENTS_RANGE, PITCH_OVERLAP_RANGE,
    PITCH_RATE_RANGE, PLAY_RATE_RANGE,
};
