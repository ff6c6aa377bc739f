//! Repeatedly overwrite a file with pseudo-random data through direct I/O,
//! to measure write throughput or to wear out flash media.
//!
//! A single aligned, locked buffer holds `chunk_count` overlapping chunks.
//! A descriptor sequence over those chunks is written with `writev`, and
//! the start of the sequence rotates every iteration so consecutive files
//! differ while the buffer is filled only once.

#[cfg(not(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_os = "netbsd",
    target_os = "openbsd",
    target_vendor = "apple"
)))]
compile_error!("disk-hammer supports Linux, Android, the BSDs and Apple platforms");

pub mod alignment;
pub mod buffer;
pub mod buffer_aux;
pub mod cksum;
pub mod config;
pub mod engine;
pub mod error;
pub mod hammer;
pub mod plan;
pub mod random;
pub mod report;
pub mod size;
pub mod unix;

pub use alignment::{Alignment, AlignmentSource};
pub use config::{Config, FilePlan, OpenMode, Seed, WriteLimits};
pub use error::{ConfigError, HammerError};
pub use hammer::Hammer;
pub use report::{ChunkChecksum, IterationReport, RunSummary, StartupReport};
