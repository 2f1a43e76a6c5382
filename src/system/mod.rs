//! Host resource sampling.
//!
//! # Data Flow
//! ```text
//! full health request
//!     → disk.rs (statvfs on the web root)
//!     → memory.rs (resident set size, peak RSS of this process)
//!     → DiskUsage / MemoryUsage in the HealthReport
//! ```
//!
//! # Design Decisions
//! - Sampled fresh on every request, never cached
//! - Behind a trait so the aggregator can be driven with fixed numbers

pub mod disk;
pub mod memory;

use std::io;
use std::path::Path;

use crate::health::report::{DiskUsage, MemoryUsage};

/// Source of disk and memory figures for the health report.
pub trait SystemSampler: Send + Sync {
    /// Free/total space of the filesystem holding `path`.
    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage>;

    /// Current and peak memory of this process.
    fn memory_usage(&self) -> MemoryUsage;
}

/// Sampler backed by the operating system.
#[derive(Debug, Clone, Copy, Default)]
pub struct HostSampler;

impl SystemSampler for HostSampler {
    fn disk_usage(&self, path: &Path) -> io::Result<DiskUsage> {
        disk::filesystem_usage(path)
    }

    fn memory_usage(&self) -> MemoryUsage {
        MemoryUsage {
            used_bytes: memory::resident_bytes().unwrap_or(0),
            peak_bytes: memory::peak_resident_bytes().unwrap_or(0),
        }
    }
}
