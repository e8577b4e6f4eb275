//! Playback Module
//!
//! Single-session playback with playing/stopped notifications:
//! - `SONG_IS_PLAYING` event bus
//! - Player and clock seams, headless player
//! - Playback controller

pub mod controller;
pub mod events;
pub mod player;

pub use controller::PlaybackController;
pub use events::{EventBus, SubscriptionId, SONG_IS_PLAYING};
pub use player::{
    AudioPlayer, Clock, HeadlessFactory, HeadlessPlayer, ManualClock, PlayerFactory, SystemClock,
};
