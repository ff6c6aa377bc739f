//! Thin wrappers over the POSIX calls the engine depends on.

pub mod buffer;
pub mod utils;

pub use buffer::AlignedBuf;
