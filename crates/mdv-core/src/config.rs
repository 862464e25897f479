//! Configuration of the `mdv` command
//!
//! Everything the command needs besides the debugger itself: where the dump
//! goes, in which format, and what happens to it afterwards. The binary fills
//! this in from flags and `MDV_*` environment variables.

use std::path::{Path, PathBuf};

use crate::capture::CaptureOptions;
use crate::storage::{Format, DEFAULT_RECORD_NAME};
use crate::viewer::{LaunchMode, DEFAULT_VIEWER};

/// Where a dump is written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputTarget
{
    /// Always the same path, overwritten by every dump
    Fixed(PathBuf),
    /// A fresh `mdv-XXXXXX.<ext>` file per dump inside `dir`
    Unique
    {
        dir: PathBuf
    },
}

impl Default for OutputTarget
{
    fn default() -> Self
    {
        OutputTarget::Unique {
            dir: std::env::temp_dir(),
        }
    }
}

/// Settings of [`MatrixViewerCommand`](crate::command::MatrixViewerCommand)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewerConfig
{
    /// Program started on the dump file
    pub viewer_program: PathBuf,
    pub output: OutputTarget,
    /// Forced format; otherwise taken from the output extension, then XML
    pub format: Option<Format>,
    /// Top level key of FileStorage dumps
    pub record_name: String,
    pub launch_mode: LaunchMode,
    pub capture: CaptureOptions,
}

impl Default for ViewerConfig
{
    fn default() -> Self
    {
        Self {
            viewer_program: PathBuf::from(DEFAULT_VIEWER),
            output: OutputTarget::default(),
            format: None,
            record_name: DEFAULT_RECORD_NAME.to_string(),
            launch_mode: LaunchMode::default(),
            capture: CaptureOptions::default(),
        }
    }
}

impl ViewerConfig
{
    /// Format used for the next dump
    pub fn resolved_format(&self) -> Format
    {
        self.format
            .or_else(|| match &self.output {
                OutputTarget::Fixed(path) => Format::from_path(path),
                OutputTarget::Unique { .. } => None,
            })
            .unwrap_or_default()
    }

    /// Directory dumps end up in
    pub fn output_dir(&self) -> &Path
    {
        match &self.output {
            OutputTarget::Fixed(path) => path
                .parent()
                .filter(|parent| !parent.as_os_str().is_empty())
                .unwrap_or(Path::new(".")),
            OutputTarget::Unique { dir } => dir,
        }
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_defaults()
    {
        let config = ViewerConfig::default();
        assert_eq!(config.viewer_program, PathBuf::from("matrix-viewer"));
        assert_eq!(config.record_name, "matrix");
        assert_eq!(config.launch_mode, LaunchMode::Detach);
        assert_eq!(config.resolved_format(), Format::Xml);
        assert_eq!(config.output_dir(), std::env::temp_dir());
    }

    #[test]
    fn test_format_follows_fixed_extension()
    {
        let config = ViewerConfig {
            output: OutputTarget::Fixed(PathBuf::from("/tmp/dump.yml")),
            ..ViewerConfig::default()
        };
        assert_eq!(config.resolved_format(), Format::Yaml);
        assert_eq!(config.output_dir(), Path::new("/tmp"));
    }

    #[test]
    fn test_explicit_format_wins()
    {
        let config = ViewerConfig {
            output: OutputTarget::Fixed(PathBuf::from("/tmp/dump.yml")),
            format: Some(Format::Mfe),
            ..ViewerConfig::default()
        };
        assert_eq!(config.resolved_format(), Format::Mfe);
    }
}
