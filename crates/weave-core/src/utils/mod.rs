//! Small helpers shared across the core modules.
pub mod sync;

pub use sync::{lock, read, write};
