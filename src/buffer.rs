//! The shared chunk buffer.
//!
//! One aligned allocation of `chunk_size + (chunk_count - 1) * alignment`
//! bytes. Chunk `k` is the `chunk_size` window starting at `k * alignment`,
//! so neighbouring chunks overlap whenever the alignment is smaller than
//! the chunk size. Every chunk starts on an aligned address and is usable
//! for direct I/O on its own.

use tracing::debug;

use crate::{
    cksum::cksum,
    config::FilePlan,
    error::Result,
    random::GlibcRandom,
    report::ChunkChecksum,
    unix::AlignedBuf,
};

#[derive(Debug)]
pub struct ChunkBuffer {
    data: AlignedBuf,
    chunk_size: usize,
    chunk_count: usize,
    alignment: usize,
}

impl ChunkBuffer {
    /// Allocate, optionally lock, and fill the buffer for `plan`.
    pub fn build(plan: &FilePlan, seed: u32, lock: bool) -> Result<Self> {
        let mut data = AlignedBuf::new(plan.buffer_size, plan.alignment)?;
        if lock {
            data.lock()?;
        }
        GlibcRandom::new(seed).fill(&mut data);
        debug!(
            size = plan.buffer_size,
            alignment = plan.alignment,
            locked = data.is_locked(),
            seed,
            "chunk buffer ready"
        );
        Ok(Self {
            data,
            chunk_size: plan.chunk_size,
            chunk_count: plan.chunk_count,
            alignment: plan.alignment,
        })
    }

    pub fn chunk_count(&self) -> usize {
        self.chunk_count
    }

    pub fn chunk_offset(&self, k: usize) -> usize {
        k * self.alignment
    }

    /// Chunk `k`, `0 <= k < chunk_count`.
    pub fn chunk(&self, k: usize) -> &[u8] {
        assert!(k < self.chunk_count, "chunk {k} out of {}", self.chunk_count);
        let start = self.chunk_offset(k);
        &self.data[start..start + self.chunk_size]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn is_locked(&self) -> bool {
        self.data.is_locked()
    }

    /// `cksum` of every chunk, in chunk order.
    pub fn checksums(&self) -> Vec<ChunkChecksum> {
        (0..self.chunk_count)
            .map(|index| ChunkChecksum {
                index,
                offset: self.chunk_offset(index),
                len: self.chunk_size,
                crc: cksum(self.chunk(index)),
            })
            .collect()
    }
}
