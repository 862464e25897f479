//! # Viewer launcher
//!
//! Opens a dumped matrix file in an external program. The program gets the
//! file path as its only argument and inherits our stdio.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;
use std::thread;

use tracing::{debug, info, warn};

use crate::error::{MdvError, Result};

/// Default viewer program, looked up in `PATH`
pub const DEFAULT_VIEWER: &str = "matrix-viewer";

/// What to do with the viewer process once spawned
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchMode
{
    /// Spawn and return immediately; the viewer outlives the command and is
    /// reaped from a background thread when it exits
    #[default]
    Detach,
    /// Wait for the viewer to exit and fail on a non-zero status
    Wait,
    /// Do not launch anything
    None,
}

impl FromStr for LaunchMode
{
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "detach" => Ok(Self::Detach),
            "wait" => Ok(Self::Wait),
            "none" | "off" => Ok(Self::None),
            _ => Err(format!("Unknown launch mode: {s}. Use 'detach', 'wait' or 'none'")),
        }
    }
}

impl fmt::Display for LaunchMode
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            Self::Detach => "detach",
            Self::Wait => "wait",
            Self::None => "none",
        })
    }
}

/// Result of a viewer launch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewerOutcome
{
    /// Running in the background with this pid
    Spawned(u32),
    /// Ran to completion successfully
    Exited,
    /// Launching is disabled
    Skipped,
}

impl ViewerOutcome
{
    pub fn pid(self) -> Option<u32>
    {
        match self {
            Self::Spawned(pid) => Some(pid),
            Self::Exited | Self::Skipped => None,
        }
    }
}

/// Something that can display a matrix file
pub trait Viewer
{
    /// Open the file at `path`
    ///
    /// ## Errors
    ///
    /// - `Io`: the program could not be started
    /// - `ViewerFailed`: the program exited unsuccessfully (`Wait` mode)
    fn open(&self, path: &Path) -> Result<ViewerOutcome>;
}

/// Runs an external program on the file
#[derive(Debug, Clone)]
pub struct ExternalViewer
{
    program: PathBuf,
    mode: LaunchMode,
}

impl ExternalViewer
{
    pub fn new(program: impl Into<PathBuf>, mode: LaunchMode) -> Self
    {
        Self {
            program: program.into(),
            mode,
        }
    }

    pub fn program(&self) -> &Path
    {
        &self.program
    }

    pub fn mode(&self) -> LaunchMode
    {
        self.mode
    }
}

impl Default for ExternalViewer
{
    fn default() -> Self
    {
        Self::new(DEFAULT_VIEWER, LaunchMode::default())
    }
}

impl Viewer for ExternalViewer
{
    fn open(&self, path: &Path) -> Result<ViewerOutcome>
    {
        let mut command = Command::new(&self.program);
        command.arg(path);
        match self.mode {
            LaunchMode::None => {
                debug!(path = %path.display(), "Viewer launch disabled");
                Ok(ViewerOutcome::Skipped)
            }
            LaunchMode::Detach => {
                let mut child = command.spawn()?;
                let pid = child.id();
                info!(program = %self.program.display(), pid, "Viewer started");
                thread::Builder::new().name(format!("viewer-{pid}")).spawn(move || match child.wait() {
                    Ok(status) => debug!(pid, %status, "Viewer exited"),
                    Err(e) => warn!(pid, error = %e, "Failed to wait for viewer"),
                })?;
                Ok(ViewerOutcome::Spawned(pid))
            }
            LaunchMode::Wait => {
                let status = command.status()?;
                if status.success() {
                    debug!(program = %self.program.display(), "Viewer exited");
                    Ok(ViewerOutcome::Exited)
                } else {
                    Err(MdvError::ViewerFailed {
                        program: self.program.display().to_string(),
                        status: status.to_string(),
                    })
                }
            }
        }
    }
}
