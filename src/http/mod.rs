//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware stack)
//!     → request.rs (client IP, query flags)
//!     → handlers.rs (health, diagnostics, not-found logging)
//!     → response.rs (content types, cache and security headers)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;

pub use server::{AppState, HttpServer};
