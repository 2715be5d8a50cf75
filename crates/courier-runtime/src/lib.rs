//! # Courier Runtime
//!
//! HTTP server around Courier responses:
//! - Server lifecycle (startup, running, shutdown)
//! - Graceful shutdown with signal handling
//! - Exact-path routing to application handlers
//! - Per-request response lifecycle: build, handle, persist session, finish

#![forbid(unsafe_code)]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod handler;
pub mod server;
pub mod shutdown;

pub use handler::{Handler, Reply, RequestHandler, Router};
pub use server::{Server, ServerBuilder};
pub use shutdown::{ShutdownSignal, SignalHandler};

/// Runtime state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeState {
    /// Server is initializing
    Initializing,
    /// Server is running
    Running,
    /// Server is shutting down
    ShuttingDown,
    /// Server is stopped
    Stopped,
}

/// Re-export commonly used types
pub mod prelude {
    pub use crate::handler::{Handler, Reply, Router};
    pub use crate::server::{Server, ServerBuilder};
    pub use crate::shutdown::{ShutdownSignal, SignalHandler};
    pub use crate::RuntimeState;
}
