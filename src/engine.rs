//! Audio engine abstraction.
//!
//! The playback controller only talks to audio through the [`AudioEngine`]
//! trait. `RodioEngine` is the real implementation; tests drive the
//! controller with a recording mock instead.

mod rodio_engine;
mod sink;
mod types;

pub use rodio_engine::RodioEngine;
pub use types::*;
