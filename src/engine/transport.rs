//! Transport State Machine
//!
//! Tracks play/pause/stop state and the playhead of one playback session.
//! Time is supplied by the caller as a monotonic offset, so the same
//! transport runs against a wall clock or a manually stepped test clock.

use std::fmt;
use std::time::Duration;

use tracing::debug;

/// Transport states representing the current playback mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportState {
    /// Not playing; playhead at the start (default state)
    #[default]
    Stopped,
    /// Audio is actively playing
    Playing,
    /// Playback suspended; playhead kept
    Paused,
}

impl fmt::Display for TransportState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportState::Stopped => write!(f, "Stopped"),
            TransportState::Playing => write!(f, "Playing"),
            TransportState::Paused => write!(f, "Paused"),
        }
    }
}

/// Playhead and state of one session
///
/// While playing, the playhead is `anchor_position + (now - anchor_time)`,
/// clamped to the duration when one is known.
#[derive(Debug, Clone, Default)]
pub struct Transport {
    state: TransportState,
    anchor_position: f64,
    anchor_time: Duration,
    duration: Option<f64>,
}

impl Transport {
    /// Create a stopped transport for media of the given length (seconds)
    ///
    /// # Example
    /// ```
    /// use fxchain::engine::Transport;
    /// let transport = Transport::new(Some(10.0));
    /// assert!(transport.is_stopped());
    /// ```
    pub fn new(duration: Option<f64>) -> Self {
        Self {
            duration,
            ..Self::default()
        }
    }

    /// Start or resume playback
    ///
    /// State transition: Stopped/Paused -> Playing
    ///
    /// # Example
    /// ```
    /// use std::time::Duration;
    /// use fxchain::engine::Transport;
    /// let mut transport = Transport::new(Some(10.0));
    /// transport.play(Duration::ZERO);
    /// assert!(transport.is_playing());
    /// assert_eq!(transport.position(Duration::from_secs(2)), 2.0);
    /// ```
    pub fn play(&mut self, now: Duration) {
        match self.state {
            TransportState::Playing => {
                debug!("transport already playing");
            }
            TransportState::Stopped | TransportState::Paused => {
                self.state = TransportState::Playing;
                self.anchor_time = now;
                debug!(position = self.anchor_position, "transport play");
            }
        }
    }

    /// Suspend playback, keeping the playhead
    ///
    /// State transition: Playing -> Paused; otherwise a no-op
    pub fn pause(&mut self, now: Duration) {
        if self.state == TransportState::Playing {
            self.anchor_position = self.position(now);
            self.state = TransportState::Paused;
            debug!(position = self.anchor_position, "transport paused");
        } else {
            debug!(state = %self.state, "transport pause ignored");
        }
    }

    /// Stop playback and rewind to the start
    ///
    /// State transition: Any -> Stopped (position reset to 0)
    pub fn stop(&mut self) {
        self.state = TransportState::Stopped;
        self.anchor_position = 0.0;
        debug!("transport stopped, playhead reset to 0");
    }

    /// Move the playhead without changing state
    pub fn seek(&mut self, position: f64, now: Duration) {
        let position = position.max(0.0);
        self.anchor_position = match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        };
        self.anchor_time = now;
        debug!(position = self.anchor_position, state = %self.state, "transport seek");
    }

    /// Current playhead in seconds
    pub fn position(&self, now: Duration) -> f64 {
        let position = match self.state {
            TransportState::Playing => {
                self.anchor_position + now.saturating_sub(self.anchor_time).as_secs_f64()
            }
            TransportState::Stopped | TransportState::Paused => self.anchor_position,
        };
        match self.duration {
            Some(duration) => position.min(duration),
            None => position,
        }
    }

    /// Whether a playing transport has run off the end of the media
    pub fn reached_end(&self, now: Duration) -> bool {
        match (self.state, self.duration) {
            (TransportState::Playing, Some(duration)) => self.position(now) >= duration,
            _ => false,
        }
    }

    /// Media length in seconds, when known
    pub fn duration(&self) -> Option<f64> {
        self.duration
    }

    // ========================================================================
    // State Queries
    // ========================================================================

    /// Check if transport is currently playing
    pub fn is_playing(&self) -> bool {
        self.state == TransportState::Playing
    }

    /// Check if transport is currently paused
    pub fn is_paused(&self) -> bool {
        self.state == TransportState::Paused
    }

    /// Check if transport is stopped
    pub fn is_stopped(&self) -> bool {
        self.state == TransportState::Stopped
    }

    /// Get the current transport state
    pub fn state(&self) -> TransportState {
        self.state
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
