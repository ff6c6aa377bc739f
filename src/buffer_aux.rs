use std::io::IoSlice;

/// A byte position inside a run of descriptors.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DescriptorPos {
    pub desc_idx: usize,
    pub offset: usize,
}

impl DescriptorPos {
    /// Where a write of `written` bytes over `descs` stopped.
    ///
    /// `desc_idx` counts fully written descriptors, `offset` is how far into
    /// the next one the write got.
    pub fn after(descs: &[IoSlice<'_>], mut written: usize) -> Self {
        for (desc_idx, d) in descs.iter().enumerate() {
            if written < d.len() {
                return Self {
                    desc_idx,
                    offset: written,
                };
            }
            written -= d.len();
        }
        Self {
            desc_idx: descs.len(),
            offset: 0,
        }
    }

    pub fn on_boundary(&self) -> bool {
        self.offset == 0
    }
}
