//! Values the hammer hands out for display.

use std::{fmt, path::PathBuf, time::SystemTime};

use chrono::{DateTime, SecondsFormat, Utc};

use crate::alignment::Alignment;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkChecksum {
    pub index: usize,
    /// Offset inside the buffer. In a file written by iteration 0 the chunk
    /// starts at `index * len`.
    pub offset: usize,
    pub len: usize,
    pub crc: u32,
}

impl fmt::Display for ChunkChecksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "chunk {} (offset {}, {} bytes): cksum {:#010x} {}",
            self.index, self.offset, self.len, self.crc, self.crc
        )
    }
}

/// Decisions taken before the first write.
#[derive(Debug, Clone)]
pub struct StartupReport {
    pub path: PathBuf,
    pub alignment: Alignment,
    pub chunk_size: usize,
    pub chunk_count: usize,
    pub requested_length: u64,
    pub effective_length: u64,
    pub buffer_size: usize,
    pub iterations: u64,
    pub seed: u32,
    pub locked: bool,
    pub dry_run: bool,
    pub verbose: bool,
    pub checksums: Vec<ChunkChecksum>,
}

impl fmt::Display for StartupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.verbose {
            writeln!(
                f,
                "using {} unique chunks of {} bytes each",
                self.chunk_count, self.chunk_size
            )?;
        }
        if self.effective_length != self.requested_length {
            writeln!(
                f,
                "file size rounded down from {} to {} bytes",
                self.requested_length, self.effective_length
            )?;
        }
        if self.iterations == 0 {
            writeln!(
                f,
                "writing {} bytes to {} infinite times",
                self.effective_length,
                self.path.display()
            )?;
        } else {
            writeln!(
                f,
                "writing {} bytes to {} {} times",
                self.effective_length,
                self.path.display(),
                self.iterations
            )?;
        }
        if self.verbose || self.alignment.is_default() {
            writeln!(f, "using {}", self.alignment)?;
        }
        if self.verbose {
            writeln!(
                f,
                "buffer of {} bytes, seed {}, {}",
                self.buffer_size,
                self.seed,
                if self.locked { "locked" } else { "not locked" }
            )?;
        }
        for sum in &self.checksums {
            writeln!(f, "{sum}")?;
        }
        if self.dry_run && self.verbose {
            writeln!(f, "dry run requested, no data written")?;
        }
        Ok(())
    }
}

/// Outcome of one open/write/close cycle.
#[derive(Debug, Clone, Copy)]
pub struct IterationReport {
    pub iteration: u64,
    pub finished_at: SystemTime,
    pub bytes: u64,
    pub elapsed_ns: u64,
    /// Whether the cycle bypassed the page cache.
    pub direct: bool,
}

impl IterationReport {
    pub fn gbps(&self) -> f64 {
        gbps(self.bytes, self.elapsed_ns)
    }

    pub fn mib_per_sec(&self) -> f64 {
        mib_per_sec(self.bytes, self.elapsed_ns)
    }

    pub fn timestamp(&self) -> String {
        DateTime::<Utc>::from(self.finished_at).to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

impl fmt::Display for IterationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} wrote {} bytes in {} ns ({:.3} Gbps)",
            self.timestamp(),
            self.bytes,
            self.elapsed_ns,
            self.gbps()
        )
    }
}

/// Totals over a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RunSummary {
    pub iterations: u64,
    pub bytes: u64,
    pub elapsed_ns: u64,
    pub direct: bool,
}

impl RunSummary {
    pub fn record(&mut self, report: &IterationReport) {
        self.iterations += 1;
        self.bytes += report.bytes;
        self.elapsed_ns += report.elapsed_ns;
        self.direct = report.direct;
    }

    pub fn gbps(&self) -> f64 {
        gbps(self.bytes, self.elapsed_ns)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} iterations, {} bytes in {} ns ({:.3} Gbps, {:.1} MiB/s)",
            self.iterations,
            self.bytes,
            self.elapsed_ns,
            self.gbps(),
            mib_per_sec(self.bytes, self.elapsed_ns)
        )
    }
}

fn gbps(bytes: u64, elapsed_ns: u64) -> f64 {
    (8.0 * bytes as f64) / elapsed_ns.max(1) as f64
}

fn mib_per_sec(bytes: u64, elapsed_ns: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0)) / (elapsed_ns.max(1) as f64 / 1e9)
}
