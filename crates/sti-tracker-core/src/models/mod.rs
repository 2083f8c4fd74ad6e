//! Domain models for the STI tracker.

mod draft;
mod preferences;
mod record;

pub use draft::*;
pub use preferences::*;
pub use record::*;
