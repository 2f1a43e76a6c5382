//! Not-found logging.
//!
//! # Data Flow
//! ```text
//! Unmatched request
//!     → http fallback (resolve client IP, referer)
//!     → log.rs (insert or bump hit, metrics)
//!     → 302 Location: /404
//!
//! Startup:  persist_path set → load JSON entries
//! Shutdown: persist_path set → write JSON entries
//! ```
//!
//! # Design Decisions
//! - In-memory `DashMap`; the only shared mutable state in the service
//! - Persistence failures are logged, never fatal

pub mod log;

pub use log::{HitKey, NotFoundEntry, NotFoundLog};
