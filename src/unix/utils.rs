use std::{
    ffi::CString,
    fs::{File, OpenOptions},
    io,
    os::unix::{ffi::OsStrExt, fs::OpenOptionsExt},
    path::Path,
};

/// Used when `sysconf(_SC_IOV_MAX)` gives no answer. POSIX minimum is 16,
/// every platform we care about allows at least this many.
const FALLBACK_IOV_MAX: usize = 1024;

/// Whether this platform has a way to request unbuffered I/O at all.
pub const DIRECT_IO_AVAILABLE: bool = cfg!(any(
    target_os = "linux",
    target_os = "android",
    target_os = "freebsd",
    target_vendor = "apple"
));

pub fn iov_max() -> usize {
    let n = unsafe { libc::sysconf(libc::_SC_IOV_MAX) };
    if n > 0 {
        n as usize
    } else {
        FALLBACK_IOV_MAX
    }
}

#[cfg(target_os = "linux")]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__errno_location()
}

#[cfg(any(target_os = "android", target_os = "netbsd", target_os = "openbsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__errno()
}

#[cfg(any(target_vendor = "apple", target_os = "freebsd"))]
unsafe fn errno_location() -> *mut libc::c_int {
    libc::__error()
}

/// `pathconf(path, _PC_REC_XFER_ALIGN)`.
///
/// `Ok(None)` when the filesystem states no requirement (`-1` with errno
/// left untouched).
pub fn rec_xfer_align(path: &Path) -> io::Result<Option<usize>> {
    let cpath = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;
    let ret = unsafe {
        *errno_location() = 0;
        libc::pathconf(cpath.as_ptr(), libc::_PC_REC_XFER_ALIGN)
    };
    if ret > 0 {
        return Ok(Some(ret as usize));
    }
    if ret == 0 {
        return Ok(None);
    }
    let err = io::Error::last_os_error();
    match err.raw_os_error() {
        Some(0) | None => Ok(None),
        _ => Err(err),
    }
}

/// Open `path` for writing, creating it with mode 0666 if absent.
///
/// With `direct` set the page cache is bypassed: `O_DIRECT` where it
/// exists, `F_NOCACHE` on Apple platforms.
pub fn open_for_write(path: &Path, direct: bool, truncate: bool) -> io::Result<File> {
    let mut opts = OpenOptions::new();
    opts.write(true).create(true).truncate(truncate).mode(0o666);

    #[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
    if direct {
        opts.custom_flags(libc::O_DIRECT);
    }

    let file = opts.open(path)?;

    #[cfg(target_vendor = "apple")]
    if direct {
        use std::os::fd::AsRawFd;
        if unsafe { libc::fcntl(file.as_raw_fd(), libc::F_NOCACHE, 1) } == -1 {
            return Err(io::Error::last_os_error());
        }
    }

    #[cfg(not(any(
        target_os = "linux",
        target_os = "android",
        target_os = "freebsd",
        target_vendor = "apple"
    )))]
    let _ = direct;

    Ok(file)
}

/// True when an open failure means the filesystem rejected direct I/O.
pub fn is_direct_unsupported(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::EINVAL)
}

/// Close `file`, reporting the error `close(2)` returns, which dropping a
/// `File` would swallow.
pub fn close(file: File) -> io::Result<()> {
    use std::os::fd::IntoRawFd;
    let fd = file.into_raw_fd();
    if unsafe { libc::close(fd) } == -1 {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}
