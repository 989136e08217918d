//! Configuration loader and schema types.
//!
//! This module exposes the settings that drive the player, the UI and the
//! catalog scanner, plus helpers to load them from disk and environment.

mod load;
mod schema;

pub use schema::*;
