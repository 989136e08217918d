//! Application model types: `App` and `Screen`.

use crate::catalog::{Catalog, Track};
use crate::config::StartScreen;
use crate::player::{Phase, PlaybackSnapshot, SENTINEL_DURATION_MS};

/// The two mutually exclusive screens.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum Screen {
    #[default]
    Playlist,
    NowPlaying,
}

impl From<StartScreen> for Screen {
    fn from(s: StartScreen) -> Self {
        match s {
            StartScreen::Playlist => Self::Playlist,
            StartScreen::NowPlaying => Self::NowPlaying,
        }
    }
}

/// The main application model.
pub struct App {
    pub catalog: Catalog,
    pub screen: Screen,
    /// Playlist cursor.
    pub selected: usize,
    /// Last state published by the player thread.
    pub playback: PlaybackSnapshot,
    /// Move the cursor to the track that starts playing.
    pub follow_playback: bool,
    /// Where the catalog was read from, for the header.
    pub source: Option<String>,
}

impl App {
    /// Create a new `App` over `catalog`.
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            screen: Screen::Playlist,
            selected: 0,
            playback: PlaybackSnapshot::default(),
            follow_playback: true,
            source: None,
        }
    }

    pub fn show_playlist(&mut self) {
        self.screen = Screen::Playlist;
    }

    pub fn show_now_playing(&mut self) {
        self.screen = Screen::NowPlaying;
    }

    pub fn toggle_screen(&mut self) {
        self.screen = match self.screen {
            Screen::Playlist => Screen::NowPlaying,
            Screen::NowPlaying => Screen::Playlist,
        };
    }

    /// Return true if the catalog contains any tracks.
    pub fn has_tracks(&self) -> bool {
        !self.catalog.is_empty()
    }

    /// Move the cursor down, wrapping to the top.
    pub fn select_next(&mut self) {
        let n = self.catalog.len();
        if n > 0 {
            self.selected = (self.selected + 1) % n;
        }
    }

    /// Move the cursor up, wrapping to the bottom.
    pub fn select_prev(&mut self) {
        let n = self.catalog.len();
        if n > 0 {
            self.selected = (self.selected + n - 1) % n;
        }
    }

    pub fn select_first(&mut self) {
        self.selected = 0;
    }

    pub fn select_last(&mut self) {
        self.selected = self.catalog.len().saturating_sub(1);
    }

    /// Take a new snapshot from the player; the cursor follows a track
    /// change when `follow_playback` is on.
    pub fn sync_playback(&mut self, snapshot: PlaybackSnapshot) {
        let changed = snapshot.current_index != self.playback.current_index;
        if changed && self.follow_playback {
            if let Some(i) = snapshot.current_index {
                self.selected = i;
            }
        }
        self.playback = snapshot;
    }

    /// Jump the cursor to the current track.
    pub fn follow_current(&mut self) {
        if let Some(i) = self.playback.current_index {
            self.selected = i;
        }
    }

    /// The loaded track, if any.
    pub fn current_track(&self) -> Option<&Track> {
        self.playback
            .current_index
            .and_then(|i| self.catalog.get(i))
    }

    pub fn is_current(&self, index: usize) -> bool {
        self.playback.current_index == Some(index)
    }

    /// Whether something is loaded and can be paused, resumed or seeked.
    pub fn has_loaded_track(&self) -> bool {
        matches!(self.playback.phase, Phase::Playing | Phase::Paused)
    }

    fn duration_known(&self) -> bool {
        self.playback.duration_ms > SENTINEL_DURATION_MS
    }

    /// Absolute seek target `delta_ms` away from the current position,
    /// clamped at the start and at a known end. `None` when nothing is loaded.
    pub fn seek_target(&self, delta_ms: i64) -> Option<u64> {
        if !self.has_loaded_track() {
            return None;
        }
        let pos = self.playback.position_ms as i64;
        let mut target = pos.saturating_add(delta_ms).max(0) as u64;
        if self.duration_known() {
            target = target.min(self.playback.duration_ms);
        }
        Some(target)
    }

    /// Fraction of the track played, in `[0, 1]`. Zero while the length is unknown.
    pub fn progress_ratio(&self) -> f64 {
        if !self.duration_known() {
            return 0.0;
        }
        (self.playback.position_ms as f64 / self.playback.duration_ms as f64).clamp(0.0, 1.0)
    }

    /// Playlist header: the current artist in capitals, or `fallback`.
    pub fn header_title(&self, fallback: &str) -> String {
        self.current_track()
            .map(|t| t.artist.to_uppercase())
            .unwrap_or_else(|| fallback.to_string())
    }
}
