//! DSP Effects Library
//!
//! The five render stages and the fixed chain that runs them.
//! All stages implement the `Effect` trait for uniform processing.

mod chain;
mod delay;
mod distortion;
mod effect;
mod fifo;
mod reverb;
mod time_pitch;
mod varispeed;

pub use chain::{EffectChain, StreamFormat};
pub use delay::Delay;
pub use distortion::Distortion;
pub use effect::{crossfade, Effect, StageKind};
pub use reverb::Reverb;
pub use time_pitch::TimePitch;
pub use varispeed::Varispeed;
