//! Process memory figures.

use sysinfo::{ProcessExt, System, SystemExt};

/// Resident set size of this process, in bytes.
pub fn resident_bytes() -> Option<u64> {
    let pid = sysinfo::get_current_pid().ok()?;
    let mut system = System::new();
    if !system.refresh_process(pid) {
        return None;
    }
    system.process(pid).map(|process| process.memory())
}

/// Peak resident set size of this process, in bytes.
#[cfg(unix)]
pub fn peak_resident_bytes() -> Option<u64> {
    // SAFETY: `usage` is plain old data filled in by the kernel.
    let mut usage: libc::rusage = unsafe { std::mem::zeroed() };
    let rc = unsafe { libc::getrusage(libc::RUSAGE_SELF, &mut usage) };
    if rc != 0 {
        return None;
    }

    let max_rss = u64::try_from(usage.ru_maxrss).ok()?;
    // ru_maxrss is in bytes on macOS and KiB elsewhere.
    if cfg!(target_os = "macos") {
        Some(max_rss)
    } else {
        Some(max_rss * 1024)
    }
}

#[cfg(not(unix))]
pub fn peak_resident_bytes() -> Option<u64> {
    resident_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_memory_is_reported() {
        let used = resident_bytes().unwrap();
        assert!(used > 0);

        let peak = peak_resident_bytes().unwrap();
        assert!(peak > 0);
    }
}
