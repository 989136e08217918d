use std::io;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::catalog::Catalog;
use crate::engine::AudioEngine;
use crate::error::EngineError;

use super::controller::Controller;
use super::types::{PlaybackSnapshot, PlayerMsg, SharedSnapshot};

/// Start the playback thread.
///
/// The engine is built on the new thread by `make_engine`, since audio
/// output streams cannot move between threads. Everything that changes
/// playback state arrives as a `PlayerMsg` on `rx` and is handled one at a
/// time.
pub(super) fn spawn_player_thread<E, F>(
    make_engine: F,
    catalog: Catalog,
    tx: Sender<PlayerMsg>,
    rx: Receiver<PlayerMsg>,
    snapshot: SharedSnapshot,
    poll_interval: Duration,
) -> io::Result<JoinHandle<()>>
where
    E: AudioEngine + 'static,
    F: FnOnce() -> Result<E, EngineError> + Send + 'static,
{
    thread::Builder::new()
        .name("encore-player".to_string())
        .spawn(move || {
            let engine = match make_engine() {
                Ok(engine) => engine,
                Err(e) => {
                    tracing::error!(error = %e, "audio engine unavailable");
                    if let Ok(mut s) = snapshot.lock() {
                        *s = PlaybackSnapshot {
                            last_error: Some(e.to_string()),
                            closed: true,
                            ..PlaybackSnapshot::default()
                        };
                    }
                    return;
                }
            };

            let mut controller = Controller::new(engine, catalog, tx);
            publish(&snapshot, &controller);

            run(&mut controller, &rx, &snapshot, poll_interval);

            controller.teardown();
            publish(&snapshot, &controller);
        })
}

fn publish<E: AudioEngine>(snapshot: &SharedSnapshot, controller: &Controller<E>) {
    if let Ok(mut s) = snapshot.lock() {
        *s = controller.snapshot();
    }
}

/// Message loop. The status poll is the receive timeout: it is only armed
/// while something is playing, so pausing or releasing cancels it.
///
/// The controller holds a sender for finished callbacks, so the channel
/// stays connected and the loop ends on `Shutdown`.
fn run<E: AudioEngine>(
    controller: &mut Controller<E>,
    rx: &Receiver<PlayerMsg>,
    snapshot: &SharedSnapshot,
    poll_interval: Duration,
) {
    let mut next_poll: Option<Instant> = None;

    loop {
        if controller.wants_poll() {
            next_poll.get_or_insert_with(|| Instant::now() + poll_interval);
        } else {
            next_poll = None;
        }

        let msg = match next_poll {
            Some(deadline) => {
                match rx.recv_timeout(deadline.saturating_duration_since(Instant::now())) {
                    Ok(msg) => msg,
                    Err(RecvTimeoutError::Timeout) => {
                        controller.poll();
                        next_poll = Some(Instant::now() + poll_interval);
                        publish(snapshot, controller);
                        continue;
                    }
                    Err(RecvTimeoutError::Disconnected) => break,
                }
            }
            None => match rx.recv() {
                Ok(msg) => msg,
                Err(_) => break,
            },
        };

        let reply = match msg {
            PlayerMsg::Intent { intent, reply } => {
                let result = controller.handle_intent(intent);
                reply.map(|r| (r, result))
            }
            PlayerMsg::Finished { generation } => {
                if let Err(e) = controller.on_finished(generation) {
                    tracing::warn!(error = %e, "could not advance after track finished");
                }
                None
            }
            PlayerMsg::Shutdown => break,
        };

        // Publish before replying so a caller that waited sees its own change.
        publish(snapshot, controller);
        if let Some((reply, result)) = reply {
            let _ = reply.send(result);
        }
    }
}
