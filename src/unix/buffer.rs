use std::{
    io,
    ops::{Deref, DerefMut},
    ptr::{self, NonNull},
};

use crate::error::{HammerError, Result};

/// `posix_memalign` backed byte buffer, optionally pinned with `mlock`.
///
/// Freed (and unlocked) on drop. The allocation is never resized, so raw
/// pointers into it stay valid for as long as the buffer is borrowed.
pub struct AlignedBuf {
    ptr: NonNull<u8>,
    len: usize,
    alignment: usize,
    locked: bool,
}

impl AlignedBuf {
    /// Allocate `len` zeroed bytes whose start is aligned to `alignment`.
    pub fn new(len: usize, alignment: usize) -> Result<Self> {
        // posix_memalign wants at least pointer alignment
        let align = alignment.max(std::mem::size_of::<*mut libc::c_void>());
        let mut raw: *mut libc::c_void = ptr::null_mut();
        let ret = unsafe { libc::posix_memalign(&mut raw, align, len.max(1)) };
        if ret != 0 {
            return Err(HammerError::Allocation {
                size: len,
                alignment,
                source: io::Error::from_raw_os_error(ret),
            });
        }
        let ptr = NonNull::new(raw as *mut u8).ok_or_else(|| HammerError::Allocation {
            size: len,
            alignment,
            source: io::Error::from(io::ErrorKind::OutOfMemory),
        })?;
        unsafe { ptr::write_bytes(ptr.as_ptr(), 0, len) };
        Ok(Self {
            ptr,
            len,
            alignment,
            locked: false,
        })
    }

    /// Pin the buffer into physical memory until it is dropped.
    pub fn lock(&mut self) -> Result<()> {
        if self.locked {
            return Ok(());
        }
        let ret = unsafe { libc::mlock(self.ptr.as_ptr() as *const libc::c_void, self.len) };
        if ret != 0 {
            return Err(HammerError::MemoryLock {
                size: self.len,
                source: io::Error::last_os_error(),
            });
        }
        self.locked = true;
        Ok(())
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_aligned(&self) -> bool {
        self.ptr.as_ptr() as usize % self.alignment == 0
    }
}

impl Deref for AlignedBuf {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        unsafe { std::slice::from_raw_parts(self.ptr.as_ptr(), self.len) }
    }
}

impl DerefMut for AlignedBuf {
    fn deref_mut(&mut self) -> &mut Self::Target {
        unsafe { std::slice::from_raw_parts_mut(self.ptr.as_ptr(), self.len) }
    }
}

impl Drop for AlignedBuf {
    fn drop(&mut self) {
        unsafe {
            if self.locked {
                libc::munlock(self.ptr.as_ptr() as *const libc::c_void, self.len);
            }
            libc::free(self.ptr.as_ptr() as *mut libc::c_void);
        }
    }
}

impl std::fmt::Debug for AlignedBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AlignedBuf")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("alignment", &self.alignment)
            .field("locked", &self.locked)
            .finish()
    }
}
