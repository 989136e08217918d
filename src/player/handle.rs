use std::io;
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::Duration;

use crate::catalog::Catalog;
use crate::engine::AudioEngine;
use crate::error::{EngineError, PlayerError};

use super::thread::spawn_player_thread;
use super::types::{Intent, PlaybackSnapshot, PlayerMsg, SharedSnapshot};

/// View-facing side of the playback thread.
///
/// Dropping the handle shuts the thread down and releases the loaded track.
pub struct PlayerHandle {
    tx: Sender<PlayerMsg>,
    snapshot: SharedSnapshot,
    join: Mutex<Option<JoinHandle<()>>>,
}

impl PlayerHandle {
    /// Spawn a playback thread whose engine is built by `make_engine`.
    pub fn spawn<E, F>(make_engine: F, catalog: Catalog, poll_interval: Duration) -> io::Result<Self>
    where
        E: AudioEngine + 'static,
        F: FnOnce() -> Result<E, EngineError> + Send + 'static,
    {
        let (tx, rx) = mpsc::channel::<PlayerMsg>();
        let snapshot: SharedSnapshot = Arc::new(Mutex::new(PlaybackSnapshot::default()));

        let join = spawn_player_thread(
            make_engine,
            catalog,
            tx.clone(),
            rx,
            snapshot.clone(),
            poll_interval,
        )?;

        Ok(Self {
            tx,
            snapshot,
            join: Mutex::new(Some(join)),
        })
    }

    /// Queue an intent without waiting. A failure shows up in the
    /// snapshot's `last_error`.
    pub fn send(&self, intent: Intent) -> Result<(), PlayerError> {
        self.tx
            .send(PlayerMsg::Intent {
                intent,
                reply: None,
            })
            .map_err(|_| PlayerError::Disconnected)
    }

    /// Queue an intent and wait until the playback thread has handled it.
    pub fn request(&self, intent: Intent) -> Result<(), PlayerError> {
        let (reply_tx, reply_rx) = mpsc::channel();
        self.tx
            .send(PlayerMsg::Intent {
                intent,
                reply: Some(reply_tx),
            })
            .map_err(|_| PlayerError::Disconnected)?;
        reply_rx.recv().map_err(|_| PlayerError::Disconnected)?
    }

    /// Latest published playback state.
    pub fn snapshot(&self) -> PlaybackSnapshot {
        self.snapshot
            .lock()
            .map(|s| s.clone())
            .unwrap_or_default()
    }

    /// Stop the playback thread and wait for it to release the track.
    pub fn shutdown(&self) {
        let _ = self.tx.send(PlayerMsg::Shutdown);

        if let Ok(mut j) = self.join.lock() {
            if let Some(h) = j.take() {
                let _ = h.join();
            }
        }
    }
}

impl Drop for PlayerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
