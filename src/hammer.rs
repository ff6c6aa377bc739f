//! Startup sequence and run driver.

use tracing::{info, warn};

use crate::{
    alignment::{self, Alignment},
    buffer::ChunkBuffer,
    config::{Config, FilePlan},
    engine::Engine,
    error::Result,
    plan::DescriptorPlan,
    report::{IterationReport, RunSummary, StartupReport},
};

/// A validated configuration with its filled chunk buffer.
///
/// The buffer lives as long as the `Hammer`; every run borrows it
/// read-only.
#[derive(Debug)]
pub struct Hammer {
    config: Config,
    alignment: Alignment,
    plan: FilePlan,
    seed: u32,
    buffer: ChunkBuffer,
}

impl Hammer {
    /// Validate `config` against the target's alignment and build the
    /// buffer. Configuration errors surface before anything is allocated.
    pub fn prepare(config: Config) -> Result<Self> {
        config.precheck()?;
        let alignment = alignment::resolve(&config.path)?;
        Self::with_alignment(config, alignment)
    }

    /// [`Hammer::prepare`] with an already resolved alignment.
    pub fn with_alignment(config: Config, alignment: Alignment) -> Result<Self> {
        let plan = config.validate(alignment.bytes)?;
        if plan.uses_fewer_chunks() {
            warn!(
                file_chunks = plan.file_chunks,
                unique = plan.chunk_count,
                "requested file size smaller than all unique chunks"
            );
        }

        let seed = config.seed.resolve();
        let buffer = ChunkBuffer::build(&plan, seed, config.lock_memory)?;
        info!(%alignment, buffer = plan.buffer_size, "prepared");
        Ok(Self {
            config,
            alignment,
            plan,
            seed,
            buffer,
        })
    }

    pub fn plan(&self) -> &FilePlan {
        &self.plan
    }

    pub fn alignment(&self) -> &Alignment {
        &self.alignment
    }

    pub fn buffer(&self) -> &ChunkBuffer {
        &self.buffer
    }

    pub fn startup_report(&self) -> StartupReport {
        StartupReport {
            path: self.config.path.clone(),
            alignment: self.alignment.clone(),
            chunk_size: self.plan.chunk_size,
            chunk_count: self.plan.chunk_count,
            requested_length: self.plan.requested_length,
            effective_length: self.plan.effective_length,
            buffer_size: self.plan.buffer_size,
            iterations: self.config.iterations,
            seed: self.seed,
            locked: self.buffer.is_locked(),
            dry_run: self.config.dry_run,
            verbose: self.config.verbose,
            checksums: if self.config.wants_checksums() {
                self.buffer.checksums()
            } else {
                Vec::new()
            },
        }
    }

    /// Run the write cycles. A dry run returns an empty summary without
    /// opening the target.
    pub fn run<F>(&self, observe: F) -> Result<RunSummary>
    where
        F: FnMut(&IterationReport),
    {
        if self.config.dry_run {
            info!("dry run requested, no data written");
            return Ok(RunSummary::default());
        }
        let descriptors = DescriptorPlan::new(&self.buffer, &self.plan);
        Engine::new(&self.config, &self.plan, &descriptors).run(observe)
    }
}
