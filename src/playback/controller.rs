//! Playback controller
//!
//! Owns at most one session. `play_file` is the only way to replace it and
//! always stops the previous one first. Every transition into or out of
//! playing is published on `SONG_IS_PLAYING`.
//!
//! Events are queued while the session lock is held, so the queue order is
//! the order of the transitions. One thread at a time drains the queue into
//! the bus after the session lock is released. Listeners may call back into
//! the controller; events raised from inside a listener are delivered by
//! the drain already in progress.

use std::cell::Cell;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender};
use parking_lot::{Mutex, ReentrantMutex};
use tracing::{debug, info, warn};

use super::events::{EventBus, SubscriptionId};
use super::player::{AudioPlayer, Clock, HeadlessFactory, PlayerFactory};
use crate::error::{FxError, Result};

struct Session {
    path: PathBuf,
    player: Box<dyn AudioPlayer>,
    /// Last playing state that was published
    announced_playing: bool,
}

impl Session {
    /// Detect natural end or decode failure; returns the event to publish
    fn poll(&mut self) -> Option<bool> {
        if !self.announced_playing {
            return None;
        }
        if self.player.has_failed() {
            warn!(path = %self.path.display(), "playback failed, stopping");
            self.player.stop();
        } else if self.player.is_playing() {
            return None;
        } else {
            debug!(path = %self.path.display(), "playback reached end");
            self.player.stop();
        }
        self.announced_playing = false;
        Some(false)
    }
}

/// Single-session playback front end
pub struct PlaybackController {
    factory: Box<dyn PlayerFactory>,
    session: Mutex<Option<Session>>,
    events: EventBus,
    pending_tx: Sender<bool>,
    pending_rx: Receiver<bool>,
    /// Held while draining `pending_rx`; the flag marks a drain in progress
    dispatch: ReentrantMutex<Cell<bool>>,
}

/// Clears the draining flag even if a listener panics
struct DrainFlag<'a>(&'a Cell<bool>);

impl Drop for DrainFlag<'_> {
    fn drop(&mut self) {
        self.0.set(false);
    }
}

impl PlaybackController {
    pub fn new(factory: Box<dyn PlayerFactory>) -> Self {
        let (pending_tx, pending_rx) = crossbeam_channel::unbounded();
        Self {
            factory,
            session: Mutex::new(None),
            events: EventBus::new(),
            pending_tx,
            pending_rx,
            dispatch: ReentrantMutex::new(Cell::new(false)),
        }
    }

    /// Controller backed by headless players on the wall clock
    pub fn headless() -> Self {
        Self::new(Box::new(HeadlessFactory::default()))
    }

    /// Controller backed by headless players on the given clock
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::new(Box::new(HeadlessFactory::new(clock)))
    }

    /// Event hub for `SONG_IS_PLAYING`
    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Publish queued events in order
    ///
    /// A nested call from a listener on the draining thread returns at once;
    /// the outer loop picks up whatever it queued.
    fn dispatch_pending(&self) {
        let guard = self.dispatch.lock();
        if guard.replace(true) {
            return;
        }
        let _flag = DrainFlag(&*guard);
        while let Ok(is_playing) = self.pending_rx.try_recv() {
            self.events.publish(is_playing);
        }
    }

    /// Run `f` on the polled session, then publish whatever changed
    fn with_session<T>(&self, f: impl FnOnce(&mut Option<Session>, &mut Vec<bool>) -> T) -> T {
        let mut events = Vec::new();
        let result = {
            let mut guard = self.session.lock();
            if let Some(session) = guard.as_mut() {
                events.extend(session.poll());
            }
            let result = f(&mut *guard, &mut events);
            for is_playing in events {
                // Both ends live in `self`, so the send cannot fail
                let _ = self.pending_tx.send(is_playing);
            }
            result
        };
        self.dispatch_pending();
        result
    }

    /// Stop whatever is loaded and start playing `path`
    ///
    /// If `path` cannot be opened, the previous session is still released
    /// and the error is returned.
    pub fn play_file(&self, path: &Path) -> Result<()> {
        self.with_session(|slot, events| {
            if let Some(mut previous) = slot.take() {
                if previous.announced_playing {
                    previous.player.stop();
                    events.push(false);
                }
                debug!(path = %previous.path.display(), "previous session released");
            }

            let mut player = self.factory.open(path)?;
            if !player.play() {
                return Err(FxError::file_reason(path, "playback could not be started"));
            }
            info!(path = %path.display(), duration = ?player.duration(), "playing file");
            *slot = Some(Session {
                path: path.to_path_buf(),
                player,
                announced_playing: true,
            });
            events.push(true);
            Ok(())
        })
    }

    /// Resume the loaded session; false if nothing is loaded
    pub fn play(&self) -> bool {
        self.with_session(|slot, events| {
            let Some(session) = slot.as_mut() else {
                return false;
            };
            if session.announced_playing {
                return true;
            }
            if session.player.play() {
                session.announced_playing = true;
                events.push(true);
                true
            } else {
                false
            }
        })
    }

    /// Pause if playing; false otherwise
    pub fn pause(&self) -> bool {
        self.with_session(|slot, events| match slot.as_mut() {
            Some(session) if session.announced_playing => {
                session.player.pause();
                session.announced_playing = false;
                events.push(false);
                true
            }
            _ => false,
        })
    }

    /// Stop and rewind if playing; returns whether anything was stopped
    pub fn stop(&self) -> bool {
        self.with_session(|slot, events| match slot.as_mut() {
            Some(session) if session.announced_playing => {
                session.player.stop();
                session.announced_playing = false;
                events.push(false);
                true
            }
            _ => false,
        })
    }

    pub fn is_playing(&self) -> bool {
        self.with_session(|slot, _| slot.as_ref().is_some_and(|s| s.announced_playing))
    }

    /// Playhead in seconds, `None` without a session
    pub fn playback_time(&self) -> Option<f64> {
        self.with_session(|slot, _| slot.as_ref().map(|s| s.player.current_time()))
    }

    /// Session length in seconds, `None` without a session or when unknown
    pub fn duration(&self) -> Option<f64> {
        self.with_session(|slot, _| slot.as_ref().and_then(|s| s.player.duration()))
    }

    /// Path of the loaded session
    pub fn current_path(&self) -> Option<PathBuf> {
        self.with_session(|slot, _| slot.as_ref().map(|s| s.path.clone()))
    }

    /// Reposition the playhead, keeping play/pause state
    ///
    /// Returns `Ok(false)` when nothing is loaded. A negative time, or one
    /// past a known duration, is a `Seek` error. With an unknown duration
    /// the seek is attempted anyway.
    pub fn set_playback_time(&self, seconds: f64) -> Result<bool> {
        self.with_session(|slot, _| {
            let Some(session) = slot.as_mut() else {
                return Ok(false);
            };
            if seconds.is_nan() || seconds < 0.0 {
                return Err(FxError::Seek {
                    requested: seconds,
                    reason: format!("Time {seconds} cannot be less than 0"),
                });
            }
            if let Some(duration) = session.player.duration() {
                if seconds > duration {
                    return Err(FxError::Seek {
                        requested: seconds,
                        reason: format!(
                            "Time {seconds} cannot be greater than the track duration {duration}"
                        ),
                    });
                }
            }
            session.player.set_current_time(seconds);
            debug!(seconds, "playback time set");
            Ok(true)
        })
    }

    /// Check for end-of-file or failure; returns whether still playing
    ///
    /// Callers wanting live feedback call this (or any query) periodically.
    pub fn poll(&self) -> bool {
        self.is_playing()
    }

    pub fn subscribe<F>(&self, handler: F) -> SubscriptionId
    where
        F: Fn(bool) + Send + Sync + 'static,
    {
        self.events.subscribe(handler)
    }

    pub fn subscribe_channel(&self) -> (SubscriptionId, Receiver<bool>) {
        self.events.subscribe_channel()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Stop and release the session
    pub fn shutdown(&self) {
        self.with_session(|slot, events| {
            if let Some(mut session) = slot.take() {
                if session.announced_playing {
                    session.player.stop();
                    events.push(false);
                }
                debug!(path = %session.path.display(), "session released on shutdown");
            }
        });
    }
}

impl Drop for PlaybackController {
    fn drop(&mut self) {
        self.shutdown();
    }
}
