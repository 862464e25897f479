//! # mdv Utilities
//!
//! Shared utilities for the mdv workspace, mainly the `tracing` setup used by
//! the one-shot and interactive modes of the `mdv` binary.

pub mod logging;

// Re-export commonly used logging functions for convenience
pub use logging::{init_logging, init_logging_for_shell, init_logging_with_level, LogFormat, LogLevel, LoggingError};
pub use tracing::{debug, error, info, trace, warn};
