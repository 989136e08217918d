//! Application module: the UI-local model used by the TUI and runtime.
//!
//! The `App` model lives in `app::model`. It holds which screen is shown,
//! the playlist cursor and the last playback snapshot; playback itself is
//! owned by the player thread.

mod model;

pub use model::*;
