//! # mdv-core
//!
//! Dump an image matrix living in a debugged process and open it in a viewer.
//!
//! This crate provides:
//! - A [`DebuggerHost`] abstraction and a gdb implementation over GDB/MI
//! - Matrix header decoding and payload capture ([`capture`])
//! - Direct reads of a live process's memory (Linux, `process_vm_readv`)
//! - OpenCV FileStorage (XML/YAML/JSON), MFE and text writers ([`storage`])
//! - The `mdv <expression>` command tying it together ([`MatrixViewerCommand`])
//!
//! ## Why unsafe code is needed
//!
//! Direct memory reads go through `process_vm_readv(2)`, which takes raw
//! iovec pointers. The call is wrapped in [`memory::ProcessMemory`], which
//! checks the range against the process's memory map first.

#![allow(unsafe_code)] // process_vm_readv in memory.rs

pub mod capture;
pub mod command;
pub mod config;
pub mod error;
pub mod host;
pub mod memory;
pub mod storage;
pub mod typecode;
pub mod types;
pub mod viewer;

pub use command::{DumpReport, MatrixViewerCommand};
pub use config::{OutputTarget, ViewerConfig};
// Re-export commonly used types
pub use error::{MdvError, Result};
pub use host::{DebugTarget, DebuggerHost, GdbConfig, GdbHost};
pub use storage::Format;
pub use typecode::TypeCodeStrategy;
pub use types::{Address, ImageLayout, ImageSnapshot, MatType, Matrix, ProcessId};
pub use viewer::{ExternalViewer, LaunchMode, Viewer, ViewerOutcome};
