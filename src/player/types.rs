//! Playback types shared by the controller, its thread and the view.

use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};

use crate::error::PlayerError;

/// Duration reported before the engine knows the real length.
pub const SENTINEL_DURATION_MS: u64 = 1;

/// A request to change playback state.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Intent {
    /// Load and start the catalog entry at the given index.
    Play(usize),
    /// Pause when playing, resume when paused.
    Toggle,
    /// Play the following track, wrapping to the first.
    Next,
    /// Play the preceding track, wrapping to the last.
    Previous,
    /// Move the play head to the given millisecond offset.
    Seek(u64),
}

/// Where the controller is in its lifecycle.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Phase {
    /// No track is loaded.
    #[default]
    Empty,
    /// A load is in flight.
    Loading,
    Paused,
    Playing,
}

/// Observable playback state, published after every handled message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackSnapshot {
    pub phase: Phase,
    pub current_index: Option<usize>,
    pub is_playing: bool,
    pub position_ms: u64,
    pub duration_ms: u64,
    /// Message of the most recent failed intent, cleared by the next success.
    pub last_error: Option<String>,
    /// Set once the session has been torn down.
    pub closed: bool,
}

impl Default for PlaybackSnapshot {
    fn default() -> Self {
        Self {
            phase: Phase::Empty,
            current_index: None,
            is_playing: false,
            position_ms: 0,
            duration_ms: SENTINEL_DURATION_MS,
            last_error: None,
            closed: false,
        }
    }
}

pub type SharedSnapshot = Arc<Mutex<PlaybackSnapshot>>;

/// Messages consumed by the playback thread.
#[derive(Debug)]
pub enum PlayerMsg {
    Intent {
        intent: Intent,
        reply: Option<Sender<Result<(), PlayerError>>>,
    },
    /// The engine reports that the handle loaded as `generation` ran out.
    Finished { generation: u64 },
    Shutdown,
}
