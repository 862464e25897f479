//! # Error Types
//!
//! General error handling for matrix capture.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages. Every step of the capture pipeline returns
//! [`Result`], and the binary prints whatever reaches it.

use thiserror::Error;

use crate::types::Address;

/// Main error type for mdv operations
///
/// ## Error Categories
///
/// 1. **Command errors**: MissingExpression, InvalidArgument
/// 2. **Evaluation errors**: Evaluation, TypeCodeParse, InvalidTypeCode, InvalidLayout
/// 3. **Memory errors**: MemoryRead, UnreadableRange, TransferTooLarge
/// 4. **Host errors**: HostProtocol, HostExited, Timeout
/// 5. **Output errors**: UnsupportedFormat, ViewerFailed, Io, Json
#[derive(Error, Debug)]
pub enum MdvError
{
    /// The command was invoked without an expression
    #[error("Missing expression: usage is `mdv <expression>`")]
    MissingExpression,

    /// Invalid argument passed to an mdv function or command
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The debugger host rejected an expression
    ///
    /// `message` is the host's own error text (for gdb, the `msg` field of an
    /// `^error` record), passed through untranslated.
    #[error("Failed to evaluate `{expression}`: {message}")]
    Evaluation
    {
        /// Expression as sent to the host
        expression: String,
        /// Error text reported by the host
        message: String,
    },

    /// A textual type-code reply did not end with an integer
    #[error("Cannot parse type code from reply: {0:?}")]
    TypeCodeParse(String),

    /// Type code does not describe a known element depth
    #[error("Invalid matrix type code: {0}")]
    InvalidTypeCode(i64),

    /// The value's shape fields are inconsistent
    #[error("Invalid matrix layout: {0}")]
    InvalidLayout(String),

    /// Reading inferior memory failed
    #[error("Failed to read {len} bytes at {address}: {reason}")]
    MemoryRead
    {
        /// First byte of the requested range
        address: Address,
        /// Number of bytes requested
        len: usize,
        /// Host or kernel error text
        reason: String,
    },

    /// Requested range is not fully covered by readable mappings
    #[error("Range of {len} bytes at {address} is not mapped readable")]
    UnreadableRange
    {
        /// First byte of the requested range
        address: Address,
        /// Number of bytes requested
        len: usize,
    },

    /// `row_stride × rows` does not fit in the address space
    #[error("Transfer size overflows: step {row_stride} × rows {rows}")]
    TransferTooLarge
    {
        /// Bytes per row reported by the value
        row_stride: u64,
        /// Row count reported by the value
        rows: u64,
    },

    /// The debugger host sent something we could not understand
    #[error("Debugger protocol error: {0}")]
    HostProtocol(String),

    /// The debugger host process went away
    #[error("Debugger host exited")]
    HostExited,

    /// The debugger host did not answer in time
    #[error("Timed out after {seconds}s waiting for `{command}`")]
    Timeout
    {
        /// Command that was waiting for a reply
        command: String,
        /// Configured timeout
        seconds: u64,
    },

    /// Output format cannot represent the matrix, or is unknown
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    /// The viewer exited with a failure status (only checked in wait mode)
    #[error("Viewer `{program}` failed with {status}")]
    ViewerFailed
    {
        /// Viewer program
        program: String,
        /// Exit status description
        status: String,
    },

    /// I/O error (dump files, child processes, /proc)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for `Result<T, MdvError>`
///
/// ```rust
/// use mdv_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, MdvError>;
