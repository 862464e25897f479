//! # Debugger Host
//!
//! The interface between the `mdv` command and the debugger that owns the
//! inferior.
//!
//! The command never touches the inferior directly: it asks the host to
//! evaluate expressions in the selected frame, to run console commands and to
//! copy memory out. This keeps the capture pipeline independent of how the
//! debugger is driven:
//!
//! - [`GdbHost`]: a gdb child process spoken to over GDB/MI
//! - test doubles: scripted hosts answering from a table
//!
//! ## Why use a trait?
//!
//! The pipeline in [`crate::capture`] is the only logic worth testing, and it
//! needs no real debugger to be tested once the host is behind a trait.

pub mod gdb;
pub mod mi;

use std::path::PathBuf;
use std::time::Duration;

pub use gdb::GdbHost;

use crate::error::Result;
use crate::types::{Address, ProcessId};

/// Operations the `mdv` command needs from a debugger
///
/// Methods take `&mut self` because a debugger session is a stateful,
/// strictly sequential conversation.
pub trait DebuggerHost
{
    /// Evaluate `expression` in the selected frame and return the value text
    ///
    /// ## Errors
    ///
    /// - `Evaluation`: the host rejected the expression
    /// - `HostProtocol`, `HostExited`, `Timeout`: the host misbehaved
    fn evaluate(&mut self, expression: &str) -> Result<String>;

    /// Run a console command and return everything it printed
    ///
    /// ## Errors
    ///
    /// `Evaluation` when the command fails, or any host error.
    fn console(&mut self, command: &str) -> Result<String>;

    /// Copy `len` bytes starting at `address` out of the inferior
    ///
    /// ## Errors
    ///
    /// `MemoryRead` when the range cannot be read in full.
    fn read_memory(&mut self, address: Address, len: usize) -> Result<Vec<u8>>;

    /// Complete a symbol prefix the way the debugger's own completer would
    ///
    /// The default implementation offers no completions.
    ///
    /// ## Errors
    ///
    /// Any host error.
    fn complete(&mut self, _prefix: &str) -> Result<Vec<String>>
    {
        Ok(Vec::new())
    }

    /// Select the frame used for evaluation (0 = innermost)
    ///
    /// ## Errors
    ///
    /// `Evaluation` when the frame does not exist.
    fn select_frame(&mut self, level: u32) -> Result<()>;

    /// Select the thread used for evaluation, by debugger thread number
    ///
    /// ## Errors
    ///
    /// `Evaluation` when the thread does not exist.
    fn select_thread(&mut self, thread: u32) -> Result<()>;

    /// Pid of a live inferior, `None` for core files or when unknown
    fn inferior_pid(&self) -> Option<ProcessId>;
}

/// What the debugger should be pointed at
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugTarget
{
    /// Attach to a running process, optionally with its executable for symbols
    Attach
    {
        pid: ProcessId, executable: Option<PathBuf>
    },
    /// Open a core dump against the executable that produced it
    Core
    {
        executable: PathBuf, core: PathBuf
    },
}

/// How to start the gdb host
#[derive(Debug, Clone)]
pub struct GdbConfig
{
    /// gdb executable
    pub program: PathBuf,
    /// Pass `--nx` (skip `.gdbinit` files)
    pub no_init: bool,
    /// Upper bound on every wait for a reply
    pub timeout: Duration,
    /// Console commands run once the target is loaded
    pub startup_commands: Vec<String>,
}

impl Default for GdbConfig
{
    fn default() -> Self
    {
        Self {
            program: PathBuf::from("gdb"),
            no_init: false,
            timeout: Duration::from_secs(30),
            startup_commands: Vec::new(),
        }
    }
}
