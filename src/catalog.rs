//! The track catalog: the fixed, ordered list of playable tracks.
//!
//! A catalog is either read from a TOML file (`catalog::load`) or built by
//! scanning a music directory (`catalog::scan`). Once built it never changes.

mod load;
mod model;
mod scan;

pub use model::*;
pub use scan::scan;
