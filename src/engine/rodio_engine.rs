use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use rodio::{OutputStream, OutputStreamBuilder, Sink};

use crate::config::PlayerSettings;
use crate::error::EngineError;

use super::sink::open_sink;
use super::types::{AudioEngine, EngineStatus, FinishedCallback};

/// Handle to a track loaded by [`RodioEngine`].
#[derive(Debug, PartialEq, Eq)]
pub struct RodioHandle {
    id: u64,
}

pub(super) struct Slot {
    sink: Arc<Sink>,
    duration: Option<Duration>,
    finish_reported: bool,
    released: Arc<AtomicBool>,
    watcher: Option<JoinHandle<()>>,
}

impl Slot {
    pub(super) fn new(sink: Arc<Sink>, duration: Option<Duration>) -> Self {
        Self {
            sink,
            duration,
            finish_reported: false,
            released: Arc::new(AtomicBool::new(false)),
            watcher: None,
        }
    }

    /// Current status. `just_finished` is set on the first read after the
    /// sink ran dry and never again for this slot.
    pub(super) fn status(&mut self) -> EngineStatus {
        let just_finished = self.sink.empty() && !self.finish_reported;
        if just_finished {
            self.finish_reported = true;
        }

        EngineStatus {
            position_ms: self.sink.get_pos().as_millis() as u64,
            duration_ms: self.duration.map(|d| d.as_millis() as u64),
            is_loaded: true,
            just_finished,
        }
    }

    /// Start a watcher that calls `callback` once the sink runs dry,
    /// retiring any earlier watcher first.
    pub(super) fn arm(&mut self, check: Duration, callback: FinishedCallback) {
        if let Some(old) = self.watcher.take() {
            self.released.store(true, Ordering::SeqCst);
            let _ = old.join();
            self.released = Arc::new(AtomicBool::new(false));
        }

        let sink = self.sink.clone();
        let released = self.released.clone();
        self.watcher = Some(thread::spawn(move || {
            watch(&sink, &released, check, callback)
        }));
    }

    /// Stop playback and wait for the end-of-track watcher to exit.
    pub(super) fn shut(mut self) {
        self.released.store(true, Ordering::SeqCst);
        self.sink.stop();
        if let Some(w) = self.watcher.take() {
            let _ = w.join();
        }
    }
}

/// Watcher loop: fires `callback` at most once, and not at all once
/// `released` is set.
fn watch(sink: &Sink, released: &AtomicBool, check: Duration, callback: FinishedCallback) {
    loop {
        thread::sleep(check);
        if released.load(Ordering::SeqCst) {
            return;
        }
        if sink.empty() {
            if !released.load(Ordering::SeqCst) {
                callback();
            }
            return;
        }
    }
}

/// `rodio`-backed engine: one `Sink` per loaded track on a shared output stream.
///
/// The output stream is not `Send`, so the engine must be created on the
/// thread that uses it.
pub struct RodioEngine {
    stream: OutputStream,
    slots: HashMap<u64, Slot>,
    next_id: u64,
    volume: f32,
    finish_check: Duration,
}

impl RodioEngine {
    pub fn new(settings: &PlayerSettings) -> Result<Self, EngineError> {
        let mut stream = OutputStreamBuilder::open_default_stream()
            .map_err(|e| EngineError::Output(e.to_string()))?;
        // rodio logs to stderr when the stream is dropped, which would tear
        // through the TUI.
        stream.log_on_drop(false);

        Ok(Self {
            stream,
            slots: HashMap::new(),
            next_id: 1,
            volume: settings.volume,
            finish_check: Duration::from_millis(settings.finish_check_ms.max(1)),
        })
    }

    fn slot(&self, handle: &RodioHandle) -> Result<&Slot, EngineError> {
        self.slots
            .get(&handle.id)
            .ok_or(EngineError::UnknownHandle(handle.id))
    }
}

impl AudioEngine for RodioEngine {
    type Handle = RodioHandle;

    fn load(&mut self, url: &str, autoplay: bool) -> Result<RodioHandle, EngineError> {
        let (sink, duration) = open_sink(self.stream.mixer(), url, self.volume)?;
        if autoplay {
            sink.play();
        }

        let id = self.next_id;
        self.next_id += 1;
        self.slots.insert(id, Slot::new(Arc::new(sink), duration));
        tracing::debug!(id, url, ?duration, "engine loaded track");
        Ok(RodioHandle { id })
    }

    fn pause(&mut self, handle: &RodioHandle) -> Result<(), EngineError> {
        self.slot(handle)?.sink.pause();
        Ok(())
    }

    fn resume(&mut self, handle: &RodioHandle) -> Result<(), EngineError> {
        self.slot(handle)?.sink.play();
        Ok(())
    }

    fn seek(&mut self, handle: &RodioHandle, position_ms: u64) -> Result<(), EngineError> {
        self.slot(handle)?
            .sink
            .try_seek(Duration::from_millis(position_ms))
            .map_err(|e| EngineError::Seek(e.to_string()))
    }

    fn status(&mut self, handle: &RodioHandle) -> Result<EngineStatus, EngineError> {
        self.slots
            .get_mut(&handle.id)
            .map(Slot::status)
            .ok_or(EngineError::UnknownHandle(handle.id))
    }

    fn release(&mut self, handle: RodioHandle) -> Result<(), EngineError> {
        let slot = self
            .slots
            .remove(&handle.id)
            .ok_or(EngineError::UnknownHandle(handle.id))?;
        slot.shut();
        tracing::debug!(id = handle.id, "engine released track");
        Ok(())
    }

    fn on_finished(&mut self, handle: &RodioHandle, callback: FinishedCallback) {
        let check = self.finish_check;
        match self.slots.get_mut(&handle.id) {
            Some(slot) => slot.arm(check, callback),
            None => tracing::warn!(id = handle.id, "finished callback for unknown handle dropped"),
        }
    }
}

impl Drop for RodioEngine {
    fn drop(&mut self) {
        for (_, slot) in self.slots.drain() {
            slot.shut();
        }
    }
}
