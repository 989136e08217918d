use std::sync::mpsc::Sender;

use crate::catalog::Catalog;
use crate::engine::AudioEngine;
use crate::error::PlayerError;

use super::types::{Intent, Phase, PlaybackSnapshot, PlayerMsg, SENTINEL_DURATION_MS};

/// The playback state machine.
///
/// Owns the engine and at most one loaded handle. Every method runs to
/// completion; callers serialize access (see `player::thread`).
pub struct Controller<E: AudioEngine> {
    engine: E,
    catalog: Catalog,
    notify: Sender<PlayerMsg>,

    active: Option<E::Handle>,
    /// Bumped on every successful load; tags finished notifications.
    generation: u64,

    phase: Phase,
    current_index: Option<usize>,
    is_playing: bool,
    position_ms: u64,
    duration_ms: u64,
    duration_known: bool,

    last_error: Option<String>,
    closed: bool,
}

impl<E: AudioEngine> Controller<E> {
    /// `notify` receives a `PlayerMsg::Finished` whenever a loaded track
    /// plays to its end.
    pub fn new(engine: E, catalog: Catalog, notify: Sender<PlayerMsg>) -> Self {
        Self {
            engine,
            catalog,
            notify,
            active: None,
            generation: 0,
            phase: Phase::Empty,
            current_index: None,
            is_playing: false,
            position_ms: 0,
            duration_ms: SENTINEL_DURATION_MS,
            duration_known: false,
            last_error: None,
            closed: false,
        }
    }

    /// Dispatch an intent, remembering the error message for the view.
    pub fn handle_intent(&mut self, intent: Intent) -> Result<(), PlayerError> {
        let result = match intent {
            Intent::Play(index) => self.play(index),
            Intent::Toggle => self.toggle(),
            Intent::Next => self.next(),
            Intent::Previous => self.previous(),
            Intent::Seek(ms) => self.seek(ms),
        };

        match &result {
            Ok(()) => self.last_error = None,
            Err(e) => {
                tracing::debug!(?intent, error = %e, "intent failed");
                self.last_error = Some(e.to_string());
            }
        }
        result
    }

    /// Release the current handle (if any), then load and start `catalog[index]`.
    pub fn play(&mut self, index: usize) -> Result<(), PlayerError> {
        if self.closed {
            return Err(PlayerError::Disconnected);
        }
        let Some(url) = self.catalog.get(index).map(|t| t.url.clone()) else {
            return Err(PlayerError::InvalidTransition {
                intent: Intent::Play(index),
                phase: self.phase,
            });
        };

        self.phase = Phase::Loading;
        self.release_active();

        match self.engine.load(&url, true) {
            Ok(handle) => {
                self.generation += 1;
                let generation = self.generation;
                let notify = self.notify.clone();
                self.engine.on_finished(
                    &handle,
                    Box::new(move || {
                        let _ = notify.send(PlayerMsg::Finished { generation });
                    }),
                );

                self.active = Some(handle);
                self.current_index = Some(index);
                self.is_playing = true;
                self.position_ms = 0;
                self.duration_ms = SENTINEL_DURATION_MS;
                self.duration_known = false;
                self.phase = Phase::Playing;
                tracing::info!(index, generation, url = %url, "playing track");
                Ok(())
            }
            Err(source) => {
                // The old handle is gone either way; keep the selection so
                // the view still shows where we were.
                self.is_playing = false;
                self.phase = Phase::Empty;
                tracing::warn!(index, url = %url, error = %source, "track failed to load");
                Err(PlayerError::Load { index, source })
            }
        }
    }

    /// Pause when playing, resume when paused.
    pub fn toggle(&mut self) -> Result<(), PlayerError> {
        if self.closed {
            return Err(PlayerError::Disconnected);
        }
        let handle = match (self.phase, self.active.as_ref()) {
            (Phase::Playing | Phase::Paused, Some(h)) => h,
            _ => {
                return Err(PlayerError::InvalidTransition {
                    intent: Intent::Toggle,
                    phase: self.phase,
                });
            }
        };

        let issued = if self.is_playing {
            self.engine.pause(handle)
        } else {
            self.engine.resume(handle)
        };
        issued.map_err(|source| PlayerError::Transport {
            intent: Intent::Toggle,
            source,
        })?;

        self.is_playing = !self.is_playing;
        self.phase = if self.is_playing {
            Phase::Playing
        } else {
            Phase::Paused
        };
        tracing::debug!(phase = ?self.phase, "toggled playback");
        Ok(())
    }

    /// Play the following track, wrapping around. Starts at the first track
    /// when nothing has been loaded yet.
    pub fn next(&mut self) -> Result<(), PlayerError> {
        let n = self.catalog.len();
        if n == 0 {
            return Ok(());
        }
        let target = match self.current_index {
            Some(i) => (i + 1) % n,
            None => 0,
        };
        self.play(target)
    }

    /// Play the preceding track, wrapping around. Starts at the last track
    /// when nothing has been loaded yet.
    pub fn previous(&mut self) -> Result<(), PlayerError> {
        let n = self.catalog.len();
        if n == 0 {
            return Ok(());
        }
        let target = match self.current_index {
            Some(i) => (i + n - 1) % n,
            None => n - 1,
        };
        self.play(target)
    }

    /// Reposition the play head. The new position is taken immediately
    /// rather than waiting for the next poll.
    pub fn seek(&mut self, ms: u64) -> Result<(), PlayerError> {
        if self.closed {
            return Err(PlayerError::Disconnected);
        }
        let Some(handle) = self.active.as_ref() else {
            return Err(PlayerError::InvalidTransition {
                intent: Intent::Seek(ms),
                phase: self.phase,
            });
        };

        let target = if self.duration_known {
            ms.min(self.duration_ms)
        } else {
            ms
        };
        self.engine
            .seek(handle, target)
            .map_err(|source| PlayerError::Transport {
                intent: Intent::Seek(ms),
                source,
            })?;
        self.position_ms = target;
        Ok(())
    }

    /// Refresh position and duration from the engine.
    ///
    /// A status that says the track just finished is skipped: advancing is
    /// left to the finished notification alone.
    pub fn poll(&mut self) {
        if !self.wants_poll() {
            return;
        }
        let Some(handle) = self.active.as_ref() else {
            return;
        };

        let status = match self.engine.status(handle) {
            Ok(s) => s,
            Err(e) => {
                tracing::debug!(error = %e, "status poll failed");
                return;
            }
        };
        if !status.is_loaded || status.just_finished {
            return;
        }

        match status.duration_ms {
            Some(d) if d > 0 => {
                self.duration_ms = d;
                self.duration_known = true;
                self.position_ms = status.position_ms.min(d);
            }
            _ => {
                self.duration_ms = SENTINEL_DURATION_MS;
                self.duration_known = false;
                self.position_ms = status.position_ms;
            }
        }
    }

    /// Handle an end-of-track notification. Only the live handle's
    /// notification advances; stale and repeated ones are dropped.
    pub fn on_finished(&mut self, generation: u64) -> Result<(), PlayerError> {
        if self.closed || self.active.is_none() || generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                "ignoring stale finished notification"
            );
            return Ok(());
        }
        tracing::debug!(generation, "track finished, advancing");
        self.handle_intent(Intent::Next)
    }

    /// Release the handle and stop reacting to anything. Idempotent.
    pub fn teardown(&mut self) {
        if self.closed {
            return;
        }
        self.release_active();
        self.closed = true;
        self.is_playing = false;
        self.phase = Phase::Empty;
        tracing::info!("playback session closed");
    }

    /// Whether the periodic status poll should be scheduled.
    pub fn wants_poll(&self) -> bool {
        !self.closed && self.is_playing && self.active.is_some()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        PlaybackSnapshot {
            phase: self.phase,
            current_index: self.current_index,
            is_playing: self.is_playing,
            position_ms: self.position_ms,
            duration_ms: self.duration_ms,
            last_error: self.last_error.clone(),
            closed: self.closed,
        }
    }

    #[cfg(test)]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    #[cfg(test)]
    pub fn current_index(&self) -> Option<usize> {
        self.current_index
    }

    #[cfg(test)]
    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    #[cfg(test)]
    pub fn position_ms(&self) -> u64 {
        self.position_ms
    }

    #[cfg(test)]
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    #[cfg(test)]
    pub fn has_handle(&self) -> bool {
        self.active.is_some()
    }

    #[cfg(test)]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Best-effort release; failures are logged and never block progress.
    fn release_active(&mut self) {
        if let Some(handle) = self.active.take() {
            if let Err(e) = self.engine.release(handle) {
                tracing::warn!(error = %e, "failed to release previous track, continuing");
            }
        }
    }
}
