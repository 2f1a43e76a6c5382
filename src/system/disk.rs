//! Filesystem usage via `statvfs`.

use std::io;
use std::path::Path;

use crate::health::report::DiskUsage;

/// Free and total bytes of the filesystem that holds `path`.
///
/// Free space is what an unprivileged process may still use (`f_bavail`).
#[cfg(unix)]
pub fn filesystem_usage(path: &Path) -> io::Result<DiskUsage> {
    use std::ffi::CString;
    use std::os::unix::ffi::OsStrExt;

    let c_path = CString::new(path.as_os_str().as_bytes())
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))?;

    // SAFETY: `stat` is plain old data and `c_path` is NUL-terminated.
    let mut stat: libc::statvfs = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::statvfs(c_path.as_ptr(), &mut stat) };
    if rc != 0 {
        return Err(io::Error::last_os_error());
    }

    let block_size = stat.f_frsize as u64;
    let usage = DiskUsage {
        free_bytes: (stat.f_bavail as u64).saturating_mul(block_size),
        total_bytes: (stat.f_blocks as u64).saturating_mul(block_size),
    };

    if usage.total_bytes == 0 {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!("{} reports a zero-sized filesystem", path.display()),
        ));
    }
    Ok(usage)
}

#[cfg(not(unix))]
pub fn filesystem_usage(_path: &Path) -> io::Result<DiskUsage> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        "disk usage sampling requires statvfs",
    ))
}
