//! Run configuration and the file plan derived from it.
//!
//! A [`Config`] is built once by the command line front end and never
//! mutated afterwards. Once the target's alignment is known,
//! [`Config::validate`] turns it into a [`FilePlan`] holding every derived
//! size the buffer builder, descriptor planner and engine need.

use std::{
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};

use crate::error::ConfigError;

pub const KIB: u64 = 1024;
pub const MIB: u64 = KIB * 1024;
pub const GIB: u64 = MIB * 1024;
pub const TIB: u64 = GIB * 1024;
pub const PIB: u64 = TIB * 1024;

pub const DEFAULT_CHUNK_SIZE: usize = 4096;
pub const DEFAULT_CHUNK_COUNT: usize = 2;
pub const DEFAULT_LENGTH: u64 = 512 * MIB;
pub const DEFAULT_ITERATIONS: u64 = 1;

/// Alignment used when the filesystem does not report one.
pub const DEFAULT_ALIGNMENT: usize = 4096;

/// Seed value of glibc's `random()` when `srandom` is never called.
pub const DEFAULT_SEED: u32 = 1;

/// Build-time seed override. `-1` selects seeding from the clock.
const BUILD_SEED: Option<&str> = option_env!("DISK_HAMMER_SEED");

/// Seed for the buffer fill generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    Fixed(u32),
    /// Seconds since the epoch at startup; runs are not repeatable.
    Time,
}

impl Seed {
    /// The seed baked in at build time, or [`DEFAULT_SEED`].
    pub fn from_build_env() -> Self {
        BUILD_SEED
            .and_then(Seed::parse)
            .unwrap_or(Seed::Fixed(DEFAULT_SEED))
    }

    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s == "-1" {
            return Some(Seed::Time);
        }
        s.parse::<u32>().ok().map(Seed::Fixed)
    }

    pub fn resolve(self) -> u32 {
        match self {
            Seed::Fixed(seed) => seed,
            Seed::Time => SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs() as u32)
                .unwrap_or(DEFAULT_SEED),
        }
    }
}

impl Default for Seed {
    fn default() -> Self {
        Seed::from_build_env()
    }
}

/// How the target is opened at the start of every iteration.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OpenMode {
    /// Overwrite from offset 0 without truncating, then trim any bytes
    /// past the effective length. Rewrites the same blocks every cycle.
    #[default]
    InPlace,
    /// Open with `O_TRUNC`, releasing the old blocks before writing.
    Truncate,
}

/// Ceilings on a single vectored write call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteLimits {
    /// Maximum descriptors per call (`IOV_MAX`).
    pub max_descriptors: usize,
    /// Maximum bytes per call (`SSIZE_MAX`).
    pub max_bytes: usize,
}

impl WriteLimits {
    pub const fn new(max_descriptors: usize, max_bytes: usize) -> Self {
        Self {
            max_descriptors,
            max_bytes,
        }
    }

    /// Limits of the running host.
    pub fn host() -> Self {
        Self {
            max_descriptors: crate::unix::utils::iov_max(),
            max_bytes: isize::MAX as usize,
        }
    }
}

impl Default for WriteLimits {
    fn default() -> Self {
        Self::host()
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub chunk_size: usize,
    pub chunk_count: usize,
    pub path: PathBuf,
    pub length: u64,
    /// Number of write cycles, 0 runs forever.
    pub iterations: u64,
    pub dry_run: bool,
    pub verbose: bool,
    /// Report per-chunk checksums even when not verbose.
    pub checksums: bool,
    pub seed: Seed,
    pub open_mode: OpenMode,
    /// Ask for unbuffered I/O. Dropped at runtime if the filesystem refuses.
    pub direct: bool,
    pub lock_memory: bool,
    pub limits: WriteLimits,
}

impl Config {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_count: DEFAULT_CHUNK_COUNT,
            path: path.into(),
            length: DEFAULT_LENGTH,
            iterations: DEFAULT_ITERATIONS,
            dry_run: false,
            verbose: false,
            checksums: false,
            seed: Seed::default(),
            open_mode: OpenMode::default(),
            direct: true,
            lock_memory: true,
            limits: WriteLimits::default(),
        }
    }

    pub fn unbounded(&self) -> bool {
        self.iterations == 0
    }

    pub fn wants_checksums(&self) -> bool {
        self.verbose || self.checksums
    }

    /// Checks that do not depend on the target's alignment.
    pub fn precheck(&self) -> Result<(), ConfigError> {
        if self.chunk_count == 0 {
            return Err(ConfigError::ZeroChunkCount);
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::ZeroChunkSize);
        }
        if self.limits.max_descriptors == 0 || self.limits.max_bytes == 0 {
            return Err(ConfigError::EmptyWriteLimits);
        }
        if self.chunk_size > self.limits.max_bytes {
            return Err(ConfigError::ChunkExceedsWriteLimit {
                chunk_size: self.chunk_size,
                max_bytes: self.limits.max_bytes,
            });
        }
        if (self.length / self.chunk_size as u64) == 0 {
            return Err(ConfigError::LengthBelowChunk {
                requested: self.length,
                chunk_size: self.chunk_size,
            });
        }
        Ok(())
    }

    /// Derive the file plan for a target whose transfers must be aligned
    /// to `alignment` bytes.
    ///
    /// Alignment and chunk size are both unsigned, so the comparison is
    /// exact: an alignment of 0 is treated as "no requirement" by the
    /// resolver and never reaches this point.
    pub fn validate(&self, alignment: usize) -> Result<FilePlan, ConfigError> {
        self.precheck()?;
        let alignment = alignment.max(1);
        if alignment > self.chunk_size {
            return Err(ConfigError::AlignmentExceedsChunk {
                alignment,
                chunk_size: self.chunk_size,
            });
        }
        if self.chunk_size % alignment != 0 {
            return Err(ConfigError::ChunkNotAligned {
                alignment,
                chunk_size: self.chunk_size,
            });
        }

        let file_chunks = usize::try_from(self.length / self.chunk_size as u64)
            .map_err(|_| ConfigError::Overflow { what: "file chunk count" })?;
        let effective_length = file_chunks as u64 * self.chunk_size as u64;

        let buffer_size = (self.chunk_count - 1)
            .checked_mul(alignment)
            .and_then(|n| n.checked_add(self.chunk_size))
            .ok_or(ConfigError::Overflow { what: "buffer size" })?;
        file_chunks
            .checked_add(self.chunk_count - 1)
            .ok_or(ConfigError::Overflow { what: "descriptor count" })?;

        Ok(FilePlan {
            chunk_size: self.chunk_size,
            chunk_count: self.chunk_count,
            alignment,
            file_chunks,
            requested_length: self.length,
            effective_length,
            buffer_size,
        })
    }
}

/// Sizes derived from a validated [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilePlan {
    pub chunk_size: usize,
    pub chunk_count: usize,
    pub alignment: usize,
    /// Chunks per file, `floor(requested_length / chunk_size)`.
    pub file_chunks: usize,
    pub requested_length: u64,
    pub effective_length: u64,
    /// `chunk_size + (chunk_count - 1) * alignment`.
    pub buffer_size: usize,
}

impl FilePlan {
    /// The file is too short to hold every unique chunk.
    pub fn uses_fewer_chunks(&self) -> bool {
        self.file_chunks < self.chunk_count
    }

    pub fn descriptor_count(&self) -> usize {
        self.file_chunks + (self.chunk_count - 1)
    }

    /// Byte offset of chunk `k` inside the buffer.
    pub fn chunk_offset(&self, k: usize) -> usize {
        k * self.alignment
    }

    /// First descriptor of the run written in `iteration`.
    pub fn start_offset(&self, iteration: u64) -> usize {
        (iteration % self.chunk_count as u64) as usize
    }
}
