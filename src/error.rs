use std::{io, path::PathBuf};

use thiserror::Error;

/// Rejected configuration. Raised before any allocation or file access.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("chunk count cannot be zero")]
    ZeroChunkCount,

    #[error("chunk size cannot be zero")]
    ZeroChunkSize,

    #[error("alignment requirement ({alignment} bytes) is greater than chunk size ({chunk_size} bytes)")]
    AlignmentExceedsChunk { alignment: usize, chunk_size: usize },

    #[error("chunk size ({chunk_size} bytes) is not a multiple of the alignment ({alignment} bytes)")]
    ChunkNotAligned { alignment: usize, chunk_size: usize },

    #[error("requested file size ({requested} bytes) is smaller than chunk size ({chunk_size} bytes)")]
    LengthBelowChunk { requested: u64, chunk_size: usize },

    #[error("chunk size ({chunk_size} bytes) exceeds the per-call write limit ({max_bytes} bytes)")]
    ChunkExceedsWriteLimit { chunk_size: usize, max_bytes: usize },

    #[error("write limits must allow at least one descriptor and one byte per call")]
    EmptyWriteLimits,

    #[error("{what} overflows the address space")]
    Overflow { what: &'static str },
}

/// Fatal conditions of a hammer run.
#[derive(Debug, Error)]
pub enum HammerError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("pathconf({path}) failed")]
    AlignmentQuery {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("aligned allocation of {size} bytes at alignment {alignment} failed")]
    Allocation {
        size: usize,
        alignment: usize,
        #[source]
        source: io::Error,
    },

    #[error("mlock of {size} bytes failed")]
    MemoryLock {
        size: usize,
        #[source]
        source: io::Error,
    },

    #[error("iteration {iteration}: open {path} failed")]
    Open {
        path: PathBuf,
        iteration: u64,
        #[source]
        source: io::Error,
    },

    #[error(
        "iteration {iteration}: writev failed (remaining {remaining} descriptors, \
         writing {count}, first base {base:#x} len {len})"
    )]
    Write {
        iteration: u64,
        remaining: usize,
        count: usize,
        base: usize,
        len: usize,
        #[source]
        source: io::Error,
    },

    #[error(
        "iteration {iteration}: corrective write of descriptor {index} was also partial \
         (base {base:#x}, wanted {wanted} bytes, wrote {written})"
    )]
    SecondPartialWrite {
        iteration: u64,
        index: usize,
        base: usize,
        wanted: usize,
        written: usize,
    },

    #[error("iteration {iteration}: write of {count} descriptors made no progress")]
    WriteZero { iteration: u64, count: usize },

    #[error("iteration {iteration}: close failed")]
    Close {
        iteration: u64,
        #[source]
        source: io::Error,
    },

    #[error("iteration {iteration}: trimming file to {len} bytes failed")]
    Truncate {
        iteration: u64,
        len: u64,
        #[source]
        source: io::Error,
    },
}

pub type Result<T, E = HammerError> = std::result::Result<T, E>;
