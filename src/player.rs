//! Playback control: the state machine that decides which track is loaded,
//! whether it plays and where the play head is.
//!
//! `Controller` is the pure state machine over an [`crate::engine::AudioEngine`].
//! The playback thread owns one controller and serializes user intents,
//! position polls and end-of-track notifications onto it. `PlayerHandle` is
//! what the view talks to.

mod controller;
mod handle;
mod thread;
mod time;
mod types;

pub use controller::Controller;
pub use handle::PlayerHandle;
pub use time::format_time;
pub use types::*;

#[cfg(test)]
mod tests;
