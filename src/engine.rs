//! The write-cycle engine.
//!
//! Every iteration opens the target, writes one rotated descriptor run
//! from offset 0, closes the file and reports the elapsed time. Nothing
//! carries over between iterations except the run rotation and a one-time
//! downgrade to buffered I/O when the filesystem refuses direct I/O.

use std::{
    fs::File,
    io::{self, IoSlice, Write},
    path::Path,
    time::{Instant, SystemTime},
};

use tracing::{debug, trace, warn};

use crate::{
    buffer_aux::DescriptorPos,
    config::{Config, FilePlan, OpenMode, WriteLimits},
    error::{ConfigError, HammerError, Result},
    plan::DescriptorPlan,
    report::{IterationReport, RunSummary},
    unix::utils::{self, DIRECT_IO_AVAILABLE},
};

/// Counters from draining one descriptor run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DrainStats {
    pub bytes: u64,
    pub vectored_calls: usize,
    pub partial_writes: usize,
    pub corrective_writes: usize,
}

/// Largest prefix of `descs` one vectored call may carry under `limits`.
pub fn batch_len(descs: &[IoSlice<'_>], limits: WriteLimits) -> usize {
    let mut bytes = 0usize;
    let mut count = 0usize;
    for d in descs.iter().take(limits.max_descriptors) {
        match bytes.checked_add(d.len()) {
            Some(total) if total <= limits.max_bytes => {
                bytes = total;
                count += 1;
            }
            _ => break,
        }
    }
    count
}

fn retry_interrupted<T>(mut op: impl FnMut() -> io::Result<T>) -> io::Result<T> {
    loop {
        match op() {
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            other => return other,
        }
    }
}

/// Write every descriptor of `run` to `sink`, in order.
///
/// Calls are sized by [`batch_len`]. A short vectored write is resumed at
/// the first unwritten byte: whole descriptors are skipped, and a
/// descriptor cut in the middle gets exactly one plain write for its
/// remainder. If that write is short as well the run is abandoned.
pub fn drain<W: Write>(
    sink: &mut W,
    run: &[IoSlice<'_>],
    limits: WriteLimits,
    iteration: u64,
) -> Result<DrainStats> {
    let mut stats = DrainStats::default();
    let mut pos = 0;

    while pos < run.len() {
        let count = batch_len(&run[pos..], limits);
        if count == 0 {
            return Err(ConfigError::ChunkExceedsWriteLimit {
                chunk_size: run[pos].len(),
                max_bytes: limits.max_bytes,
            }
            .into());
        }
        let batch = &run[pos..pos + count];
        let wanted: usize = batch.iter().map(|d| d.len()).sum();

        let written = retry_interrupted(|| sink.write_vectored(batch)).map_err(|source| {
            HammerError::Write {
                iteration,
                remaining: run.len() - pos,
                count,
                base: batch[0].as_ptr() as usize,
                len: batch[0].len(),
                source,
            }
        })?;
        stats.vectored_calls += 1;
        stats.bytes += written as u64;

        if written == 0 && wanted > 0 {
            return Err(HammerError::WriteZero { iteration, count });
        }
        if written >= wanted {
            pos += count;
            continue;
        }

        stats.partial_writes += 1;
        let stop = DescriptorPos::after(batch, written);
        trace!(iteration, written, wanted, ?stop, "partial vectored write");
        pos += stop.desc_idx;
        if stop.on_boundary() {
            continue;
        }

        let desc = &run[pos];
        let rest = &desc[stop.offset..];
        let fixed = retry_interrupted(|| sink.write(rest)).map_err(|source| HammerError::Write {
            iteration,
            remaining: run.len() - pos,
            count: 1,
            base: rest.as_ptr() as usize,
            len: rest.len(),
            source,
        })?;
        stats.corrective_writes += 1;
        stats.bytes += fixed as u64;
        if fixed != rest.len() {
            return Err(HammerError::SecondPartialWrite {
                iteration,
                index: pos,
                base: rest.as_ptr() as usize,
                wanted: rest.len(),
                written: fixed,
            });
        }
        pos += 1;
    }

    Ok(stats)
}

/// Opens the target: `(path, direct, truncate)`.
pub type Opener = fn(&Path, bool, bool) -> io::Result<File>;

pub struct Engine<'a, O = Opener> {
    config: &'a Config,
    plan: &'a FilePlan,
    descriptors: &'a DescriptorPlan<'a>,
    opener: O,
    /// Cleared for good after the first open rejects direct I/O.
    direct: bool,
    completed: u64,
}

impl<'a> Engine<'a> {
    pub fn new(config: &'a Config, plan: &'a FilePlan, descriptors: &'a DescriptorPlan<'a>) -> Self {
        Self {
            config,
            plan,
            descriptors,
            opener: utils::open_for_write,
            direct: config.direct && DIRECT_IO_AVAILABLE,
            completed: 0,
        }
    }
}

impl<'a, O> Engine<'a, O>
where
    O: FnMut(&Path, bool, bool) -> io::Result<File>,
{
    /// Replace the function used to open the target.
    pub fn open_with<P>(self, opener: P) -> Engine<'a, P>
    where
        P: FnMut(&Path, bool, bool) -> io::Result<File>,
    {
        Engine {
            config: self.config,
            plan: self.plan,
            descriptors: self.descriptors,
            opener,
            direct: self.direct,
            completed: self.completed,
        }
    }

    pub fn is_direct(&self) -> bool {
        self.direct
    }

    /// Run the configured number of iterations, forever when it is 0.
    pub fn run<F>(&mut self, mut observe: F) -> Result<RunSummary>
    where
        F: FnMut(&IterationReport),
    {
        let mut summary = RunSummary::default();
        let mut iteration = 0u64;
        while self.config.unbounded() || iteration < self.config.iterations {
            let report = self.cycle(iteration)?;
            summary.record(&report);
            observe(&report);
            iteration = iteration.wrapping_add(1);
        }
        Ok(summary)
    }

    /// One open/write/close cycle.
    pub fn cycle(&mut self, iteration: u64) -> Result<IterationReport> {
        let (config, descriptors) = (self.config, self.descriptors);
        let run = descriptors.run(iteration);
        let start = Instant::now();

        let mut file = self.open(iteration)?;
        let stats = drain(&mut file, run, config.limits, iteration)?;
        // Later cycles rewrite exactly `effective_length` bytes in place.
        if config.open_mode == OpenMode::InPlace && self.completed == 0 {
            self.trim(&file, iteration)?;
        }
        utils::close(file).map_err(|source| HammerError::Close { iteration, source })?;

        let elapsed = start.elapsed();
        self.completed += 1;
        debug!(
            iteration,
            start = self.plan.start_offset(iteration),
            calls = stats.vectored_calls,
            partial = stats.partial_writes,
            "cycle complete"
        );
        Ok(IterationReport {
            iteration,
            finished_at: SystemTime::now(),
            bytes: self.plan.effective_length,
            elapsed_ns: u64::try_from(elapsed.as_nanos()).unwrap_or(u64::MAX),
            direct: self.direct,
        })
    }

    fn open(&mut self, iteration: u64) -> Result<File> {
        let config = self.config;
        let path = &config.path;
        let truncate = config.open_mode == OpenMode::Truncate;
        let open_err = |source: io::Error| HammerError::Open {
            path: path.clone(),
            iteration,
            source,
        };

        match (self.opener)(path, self.direct, truncate) {
            Ok(file) => Ok(file),
            Err(e) if self.direct && self.completed == 0 && utils::is_direct_unsupported(&e) => {
                self.direct = false;
                let file = (self.opener)(path, false, truncate).map_err(open_err)?;
                warn!(path = %path.display(), "direct I/O not supported, falling back to buffered writes");
                Ok(file)
            }
            Err(e) => Err(open_err(e)),
        }
    }

    /// Drop anything past the effective length left by an earlier, longer
    /// file.
    fn trim(&self, file: &File, iteration: u64) -> Result<()> {
        let len = self.plan.effective_length;
        let truncate_err = |source: io::Error| HammerError::Truncate {
            iteration,
            len,
            source,
        };
        let current = file.metadata().map_err(truncate_err)?.len();
        if current > len {
            debug!(iteration, from = current, to = len, "trimming trailing bytes");
            file.set_len(len).map_err(truncate_err)?;
        }
        Ok(())
    }
}
