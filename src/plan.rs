//! Write descriptors over the chunk buffer.
//!
//! The sequence holds `file_chunks + chunk_count - 1` entries and entry `i`
//! points at chunk `i % chunk_count`. Any `file_chunks` long window that
//! starts below `chunk_count` is a complete file beginning with a
//! different chunk, so rotating the window start changes the file
//! contents without touching the buffer.

use std::io::IoSlice;

use crate::{buffer::ChunkBuffer, config::FilePlan};

pub struct DescriptorPlan<'a> {
    descriptors: Vec<IoSlice<'a>>,
    file_chunks: usize,
    chunk_count: usize,
}

impl<'a> DescriptorPlan<'a> {
    pub fn new(buffer: &'a ChunkBuffer, plan: &FilePlan) -> Self {
        let chunk_count = buffer.chunk_count();
        let descriptors = (0..plan.descriptor_count())
            .map(|i| IoSlice::new(buffer.chunk(i % chunk_count)))
            .collect();
        Self {
            descriptors,
            file_chunks: plan.file_chunks,
            chunk_count,
        }
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// The run of `file_chunks` descriptors written by `iteration`.
    pub fn run(&self, iteration: u64) -> &[IoSlice<'a>] {
        let start = (iteration % self.chunk_count as u64) as usize;
        &self.descriptors[start..start + self.file_chunks]
    }

    /// Chunk index a descriptor position refers to.
    pub fn chunk_at(&self, position: usize) -> usize {
        position % self.chunk_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, WriteLimits};
    use proptest::prelude::*;

    fn setup(chunk_size: usize, chunk_count: usize, file_chunks: usize, alignment: usize) -> (FilePlan, ChunkBuffer) {
        let mut config = Config::new("unused");
        config.chunk_size = chunk_size;
        config.chunk_count = chunk_count;
        config.length = (chunk_size * file_chunks) as u64;
        config.limits = WriteLimits::new(1024, isize::MAX as usize);
        let plan = config.validate(alignment).unwrap();
        let buffer = ChunkBuffer::build(&plan, 1, false).unwrap();
        (plan, buffer)
    }

    fn chunk_of(buffer: &ChunkBuffer, slice: &IoSlice<'_>) -> usize {
        let base = buffer.as_bytes().as_ptr() as usize;
        (slice.as_ptr() as usize - base) / buffer.chunk_offset(1).max(1)
    }

    #[test]
    fn two_chunks_alternate() {
        let (plan, buffer) = setup(4096, 2, 2, 4096);
        let descriptors = DescriptorPlan::new(&buffer, &plan);
        assert_eq!(descriptors.len(), 3);

        let first: Vec<_> = (0..3)
            .map(|i| chunk_of(&buffer, &descriptors.run(i)[0]))
            .collect();
        assert_eq!(first, vec![0, 1, 0]);
    }

    #[test]
    fn single_chunk_never_rotates() {
        let (plan, buffer) = setup(4096, 1, 5, 512);
        let descriptors = DescriptorPlan::new(&buffer, &plan);
        assert_eq!(descriptors.len(), 5);
        for i in 0..4 {
            assert_eq!(descriptors.run(i).len(), 5);
            assert_eq!(descriptors.run(i)[0].as_ptr(), buffer.chunk(0).as_ptr());
        }
    }

    #[test]
    fn fewer_file_chunks_than_unique() {
        let (plan, buffer) = setup(4096, 4, 1, 512);
        let descriptors = DescriptorPlan::new(&buffer, &plan);
        assert_eq!(descriptors.len(), 4);
        for i in 0..4u64 {
            let run = descriptors.run(i);
            assert_eq!(run.len(), 1);
            assert_eq!(run[0].as_ptr(), buffer.chunk(i as usize).as_ptr());
        }
    }

    proptest! {
        #[test]
        fn every_start_yields_rotated_chunks(
            chunk_count in 1usize..9,
            file_chunks in 1usize..40,
            shift in 0u32..3,
        ) {
            let alignment = 512;
            let (plan, buffer) = setup(alignment << shift, chunk_count, file_chunks, alignment);
            let descriptors = DescriptorPlan::new(&buffer, &plan);
            prop_assert_eq!(descriptors.len(), file_chunks + chunk_count - 1);

            for s in 0..chunk_count {
                let run = descriptors.run(s as u64);
                prop_assert_eq!(run.len(), file_chunks);
                for (j, d) in run.iter().enumerate() {
                    let k = (s + j) % chunk_count;
                    prop_assert_eq!(descriptors.chunk_at(s + j), k);
                    prop_assert_eq!(d.as_ptr(), buffer.chunk(k).as_ptr());
                    prop_assert_eq!(d.len(), plan.chunk_size);
                }
            }
        }
    }
}
