//! Direct I/O alignment discovery.

use std::{
    fmt, io,
    path::{Path, PathBuf},
};

use tracing::debug;

use crate::{
    config::DEFAULT_ALIGNMENT,
    error::{HammerError, Result},
    unix::utils::rec_xfer_align,
};

/// Where a resolved alignment came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlignmentSource {
    /// Reported by the filesystem for the target itself.
    Target,
    /// The target does not exist yet; reported for this directory.
    Directory(PathBuf),
    /// Nothing was reported, [`DEFAULT_ALIGNMENT`] is used.
    Default,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alignment {
    pub bytes: usize,
    pub source: AlignmentSource,
}

impl Alignment {
    fn fallback() -> Self {
        Self {
            bytes: DEFAULT_ALIGNMENT,
            source: AlignmentSource::Default,
        }
    }

    pub fn is_default(&self) -> bool {
        self.source == AlignmentSource::Default
    }
}

impl fmt::Display for Alignment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.source {
            AlignmentSource::Target => write!(f, "alignment of {} bytes", self.bytes),
            AlignmentSource::Directory(dir) => write!(
                f,
                "alignment of {} bytes (from {})",
                self.bytes,
                dir.display()
            ),
            AlignmentSource::Default => write!(f, "default alignment of {} bytes", self.bytes),
        }
    }
}

/// Resolve the alignment unbuffered transfers to `path` must honour.
pub fn resolve(path: &Path) -> Result<Alignment> {
    resolve_with(path, rec_xfer_align)
}

/// [`resolve`] with an injectable filesystem query.
pub fn resolve_with<F>(path: &Path, mut query: F) -> Result<Alignment>
where
    F: FnMut(&Path) -> io::Result<Option<usize>>,
{
    match query(path) {
        Ok(Some(bytes)) if bytes > 0 => {
            return Ok(Alignment {
                bytes,
                source: AlignmentSource::Target,
            })
        }
        Ok(_) => return Ok(Alignment::fallback()),
        Err(e) if undetermined(&e) => return Ok(Alignment::fallback()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "target missing, querying its directory");
        }
        Err(source) => {
            return Err(HammerError::AlignmentQuery {
                path: path.to_path_buf(),
                source,
            })
        }
    }

    let dir = containing_dir(path);
    match query(&dir) {
        Ok(Some(bytes)) if bytes > 0 => Ok(Alignment {
            bytes,
            source: AlignmentSource::Directory(dir),
        }),
        Ok(_) => Ok(Alignment::fallback()),
        Err(e) if undetermined(&e) || e.kind() == io::ErrorKind::NotFound => {
            Ok(Alignment::fallback())
        }
        Err(source) => Err(HammerError::AlignmentQuery { path: dir, source }),
    }
}

/// `EINVAL` from pathconf means the name has no meaning for that file.
fn undetermined(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINVAL)
}

fn containing_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}
