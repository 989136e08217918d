//! Error types for encore.
//!
//! Engine-layer failures are described by [`EngineError`]. The playback
//! controller translates them into [`PlayerError`] at its boundary, so the
//! view never sees a raw engine error.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::player::{Intent, Phase};

/// Failures reported by an [`crate::engine::AudioEngine`].
#[derive(Error, Debug)]
pub enum EngineError {
    /// The locator uses a scheme the engine cannot open.
    #[error("unsupported audio locator: {0}")]
    Unsupported(String),

    /// The resource could not be opened.
    #[error("cannot reach {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: io::Error,
    },

    /// The resource was opened but could not be decoded.
    #[error("cannot decode {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("seek failed: {0}")]
    Seek(String),

    /// The output device is unavailable.
    #[error("audio output error: {0}")]
    Output(String),

    /// The handle was already released or never issued by this engine.
    #[error("unknown handle #{0}")]
    UnknownHandle(u64),
}

/// Errors surfaced by the playback controller to the view layer.
#[derive(Error, Debug)]
pub enum PlayerError {
    /// The engine could not load the requested track. The session is left
    /// usable.
    #[error("failed to load track {index}: {source}")]
    Load {
        index: usize,
        #[source]
        source: EngineError,
    },

    /// The intent cannot be serviced in the current phase.
    #[error("{intent:?} is not valid while {phase:?}")]
    InvalidTransition { intent: Intent, phase: Phase },

    /// Pause, resume or seek was rejected by the engine.
    #[error("{intent:?} failed: {source}")]
    Transport {
        intent: Intent,
        #[source]
        source: EngineError,
    },

    /// The playback thread has shut down.
    #[error("playback thread is not running")]
    Disconnected,
}

/// Errors raised while building the catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("cannot read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("duplicate track id {0:?}")]
    DuplicateId(String),

    #[error("catalog {0} contains no tracks")]
    Empty(PathBuf),
}
