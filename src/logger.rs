//! Pluggable logging port for flow failures.
//!
//! Flows report recoverable failures through a [`Logger`] right before they
//! surface them as errors. The port is advisory only; nothing it does changes
//! the outcome of a call.
//!
//! Closures implement [`Logger`] directly:
//!
//! ```no_run
//! use oauth_flow::logger::{LogLevel, Logger, SharedLogger};
//! use std::sync::Arc;
//!
//! let logger: SharedLogger = Arc::new(|level: LogLevel, message: &str| {
//!     eprintln!("[{level}] {message}");
//! });
//! logger.log(LogLevel::Error, "token endpoint unreachable");
//! ```
//!
//! [`TracingLogger`] forwards to [`tracing`], so an application that already
//! has a subscriber attached needs nothing else.

use std::sync::Arc;

/// Severity of a logged message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogLevel {
    /// Diagnostic detail
    Debug,
    /// A failure about to be returned to the caller
    Error,
}

impl LogLevel {
    /// Lowercase name of the level
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Debug => "debug",
            Self::Error => "error",
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Logging port injected into a flow at construction.
///
/// Implementations must be safe to call from whatever task drives the flow.
pub trait Logger: Send + Sync {
    /// Record a message at the given level
    fn log(&self, level: LogLevel, message: &str);
}

impl<F> Logger for F
where
    F: Fn(LogLevel, &str) + Send + Sync,
{
    fn log(&self, level: LogLevel, message: &str) {
        self(level, message);
    }
}

/// Type alias for a shared logger.
pub type SharedLogger = Arc<dyn Logger>;

/// Discards every message. Used when no logger is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn log(&self, _level: LogLevel, _message: &str) {}
}

/// Forwards messages to `tracing` events under the `oauth_flow` target.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn log(&self, level: LogLevel, message: &str) {
        match level {
            LogLevel::Debug => tracing::debug!(target: "oauth_flow", "{message}"),
            LogLevel::Error => tracing::error!(target: "oauth_flow", "{message}"),
        }
    }
}
