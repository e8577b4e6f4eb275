//! Player seams
//!
//! `AudioPlayer` is one loaded source with its own transport; the
//! controller never touches an output device directly. `HeadlessPlayer`
//! runs the transport against a `Clock` with no device attached, which is
//! what the CLI and the tests drive.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::engine::io::file_duration;
use crate::engine::Transport;
use crate::error::Result;

/// A single loaded playback source
pub trait AudioPlayer: Send {
    /// Start or resume; returns whether playback is now running
    fn play(&mut self) -> bool;

    /// Suspend, keeping the playhead
    fn pause(&mut self);

    /// Halt and rewind to the start
    fn stop(&mut self);

    /// Whether audio is currently running (false once the end is reached)
    fn is_playing(&self) -> bool;

    /// Playhead in seconds
    fn current_time(&self) -> f64;

    /// Move the playhead without changing play/pause state
    fn set_current_time(&mut self, seconds: f64);

    /// Source length in seconds, if known
    fn duration(&self) -> Option<f64>;

    /// Whether decoding has failed irrecoverably
    fn has_failed(&self) -> bool;
}

/// Opens players for files
pub trait PlayerFactory: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn AudioPlayer>>;
}

/// Monotonic time source for transports
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Wall clock measured from construction
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the player.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    elapsed: Arc<Mutex<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move time forward
    pub fn advance(&self, by: Duration) {
        *self.elapsed.lock() += by;
    }

    /// Move time forward by fractional seconds
    pub fn advance_secs(&self, secs: f64) {
        self.advance(Duration::from_secs_f64(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.elapsed.lock()
    }
}

/// Transport-only player: tracks position and end-of-file without a device
pub struct HeadlessPlayer {
    path: PathBuf,
    transport: Transport,
    clock: Arc<dyn Clock>,
}

impl HeadlessPlayer {
    /// Load `path`, reading its duration from the WAV header
    pub fn open(path: &Path, clock: Arc<dyn Clock>) -> Result<Self> {
        let duration = file_duration(path)?;
        debug!(path = %path.display(), duration, "headless player loaded");
        Ok(Self {
            path: path.to_path_buf(),
            transport: Transport::new(Some(duration)),
            clock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl AudioPlayer for HeadlessPlayer {
    fn play(&mut self) -> bool {
        let now = self.clock.now();
        if self.transport.reached_end(now) {
            self.transport.stop();
        }
        self.transport.play(now);
        self.is_playing()
    }

    fn pause(&mut self) {
        self.transport.pause(self.clock.now());
    }

    fn stop(&mut self) {
        self.transport.stop();
    }

    fn is_playing(&self) -> bool {
        self.transport.is_playing() && !self.transport.reached_end(self.clock.now())
    }

    fn current_time(&self) -> f64 {
        self.transport.position(self.clock.now())
    }

    fn set_current_time(&mut self, seconds: f64) {
        self.transport.seek(seconds, self.clock.now());
    }

    fn duration(&self) -> Option<f64> {
        self.transport.duration()
    }

    fn has_failed(&self) -> bool {
        // The source vanishing mid-session is the only decode failure here.
        self.transport.is_playing() && !self.path.exists()
    }
}

/// Factory for `HeadlessPlayer`s sharing one clock
#[derive(Clone)]
pub struct HeadlessFactory {
    clock: Arc<dyn Clock>,
}

impl HeadlessFactory {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Default for HeadlessFactory {
    fn default() -> Self {
        Self::new(Arc::new(SystemClock::new()))
    }
}

impl PlayerFactory for HeadlessFactory {
    fn open(&self, path: &Path) -> Result<Box<dyn AudioPlayer>> {
        Ok(Box::new(HeadlessPlayer::open(path, Arc::clone(&self.clock))?))
    }
}
