//! Engine contract types.

use crate::error::EngineError;

/// Callback fired once when a loaded track plays to its end.
pub type FinishedCallback = Box<dyn FnOnce() + Send + 'static>;

/// Status of a loaded resource as reported by the engine.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct EngineStatus {
    pub position_ms: u64,
    /// `None` while the engine does not know the length of the resource.
    pub duration_ms: Option<u64>,
    pub is_loaded: bool,
    /// True on the first status read after the track reached its end, and
    /// only on that one.
    pub just_finished: bool,
}

/// Operations the playback controller needs from an audio backend.
///
/// A handle represents one loaded resource. Handles are not `Clone`:
/// `release` consumes the handle, so a released resource cannot be used
/// again by the caller.
pub trait AudioEngine {
    type Handle;

    /// Load `url`; start playing immediately when `autoplay` is set.
    fn load(&mut self, url: &str, autoplay: bool) -> Result<Self::Handle, EngineError>;

    fn pause(&mut self, handle: &Self::Handle) -> Result<(), EngineError>;

    fn resume(&mut self, handle: &Self::Handle) -> Result<(), EngineError>;

    /// Move the play head to `position_ms`.
    fn seek(&mut self, handle: &Self::Handle, position_ms: u64) -> Result<(), EngineError>;

    fn status(&mut self, handle: &Self::Handle) -> Result<EngineStatus, EngineError>;

    /// Stop and free the resource. The finished callback never fires after
    /// this returns.
    fn release(&mut self, handle: Self::Handle) -> Result<(), EngineError>;

    /// Register the end-of-track callback for `handle`, replacing any earlier one.
    fn on_finished(&mut self, handle: &Self::Handle, callback: FinishedCallback);
}
