//! # The `mdv` command
//!
//! Dumps the matrix named by an expression and opens it in the viewer:
//!
//! 1. evaluate the expression in the selected frame
//! 2. read its type code, shape, row stride and data pointer
//! 3. copy `row_stride × rows` bytes out of the inferior
//! 4. write them, padding removed, to the output file
//! 5. start the viewer on that file
//!
//! A failure at any step aborts the command; nothing is written or launched
//! for an expression that does not resolve.

use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use tracing::{debug, info};

use crate::capture::capture;
use crate::config::{OutputTarget, ViewerConfig};
use crate::error::{MdvError, Result};
use crate::host::DebuggerHost;
use crate::storage::{save_matrix, write_matrix, Format};
use crate::types::{MatType, Matrix};
use crate::viewer::{ExternalViewer, Viewer};

/// Prefix of generated dump file names
pub const OUTPUT_PREFIX: &str = "mdv-";

/// Split a command argument the way a debugger splits its argv
///
/// Whitespace separates words; single quotes take everything literally,
/// double quotes honour backslash escapes, and a backslash outside quotes
/// escapes the next character.
///
/// ```rust
/// use mdv_core::command::split_argv;
///
/// assert_eq!(split_argv("frames[2] 'a b'").unwrap(), vec!["frames[2]", "a b"]);
/// ```
///
/// ## Errors
///
/// `InvalidArgument` for an unterminated quote or a trailing backslash.
pub fn split_argv(input: &str) -> Result<Vec<String>>
{
    let mut words = Vec::new();
    let mut word = String::new();
    let mut in_word = false;
    let mut chars = input.chars();

    while let Some(c) = chars.next() {
        match c {
            c if c.is_whitespace() => {
                if in_word {
                    words.push(std::mem::take(&mut word));
                    in_word = false;
                }
            }
            '\'' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('\'') => break,
                        Some(c) => word.push(c),
                        None => return Err(MdvError::InvalidArgument("unterminated single quote".into())),
                    }
                }
            }
            '"' => {
                in_word = true;
                loop {
                    match chars.next() {
                        Some('"') => break,
                        Some('\\') => match chars.next() {
                            Some(c) => word.push(c),
                            None => return Err(MdvError::InvalidArgument("unterminated double quote".into())),
                        },
                        Some(c) => word.push(c),
                        None => return Err(MdvError::InvalidArgument("unterminated double quote".into())),
                    }
                }
            }
            '\\' => {
                in_word = true;
                match chars.next() {
                    Some(c) => word.push(c),
                    None => return Err(MdvError::InvalidArgument("trailing backslash".into())),
                }
            }
            c => {
                in_word = true;
                word.push(c);
            }
        }
    }
    if in_word {
        words.push(word);
    }
    Ok(words)
}

/// What a successful dump produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpReport
{
    pub expression: String,
    pub path: PathBuf,
    pub format: Format,
    pub rows: usize,
    pub cols: usize,
    pub mat_type: MatType,
    /// Bytes copied out of the inferior, row padding included
    pub bytes_copied: usize,
    pub viewer_pid: Option<u32>,
}

/// The `mdv <expression>` command
pub struct MatrixViewerCommand
{
    config: ViewerConfig,
    viewer: Box<dyn Viewer>,
}

impl MatrixViewerCommand
{
    /// Command launching the configured external viewer
    pub fn new(config: ViewerConfig) -> Self
    {
        let viewer = ExternalViewer::new(config.viewer_program.clone(), config.launch_mode);
        Self::with_viewer(config, Box::new(viewer))
    }

    /// Command launching dumps with `viewer` instead
    pub fn with_viewer(config: ViewerConfig, viewer: Box<dyn Viewer>) -> Self
    {
        Self { config, viewer }
    }

    pub fn config(&self) -> &ViewerConfig
    {
        &self.config
    }

    /// Run the command with its raw argument string
    ///
    /// Only the first word of `argument` is used as the expression.
    ///
    /// ## Errors
    ///
    /// - `MissingExpression`: `argument` is blank
    /// - `InvalidArgument`: `argument` does not split
    /// - everything [`dump`](Self::dump) returns
    pub fn invoke(&self, host: &mut dyn DebuggerHost, argument: &str) -> Result<DumpReport>
    {
        let words = split_argv(argument)?;
        let Some((expression, rest)) = words.split_first() else {
            return Err(MdvError::MissingExpression);
        };
        if !rest.is_empty() {
            debug!(ignored = ?rest, "Extra arguments ignored");
        }
        self.dump(host, expression)
    }

    /// Dump the matrix named by `expression` and open it
    ///
    /// ## Errors
    ///
    /// - `MissingExpression`: `expression` is blank
    /// - evaluation, memory and host errors from the capture
    /// - `InvalidArgument`, `Io`, `Json`, `UnsupportedFormat` while writing the dump
    /// - `Io`, `ViewerFailed` from the viewer launch
    pub fn dump(&self, host: &mut dyn DebuggerHost, expression: &str) -> Result<DumpReport>
    {
        let expression = expression.trim();
        if expression.is_empty() {
            return Err(MdvError::MissingExpression);
        }

        let snapshot = capture(host, expression, &self.config.capture)?;
        let bytes_copied = snapshot.bytes().len();
        let matrix = snapshot.into_matrix();

        let format = self.config.resolved_format();
        let path = self.write_dump(&matrix, format)?;
        info!(expression, path = %path.display(), %format, "Wrote matrix dump");

        let outcome = self.viewer.open(&path)?;

        Ok(DumpReport {
            expression: expression.to_string(),
            path,
            format,
            rows: matrix.rows(),
            cols: matrix.cols(),
            mat_type: matrix.mat_type(),
            bytes_copied,
            viewer_pid: outcome.pid(),
        })
    }

    fn write_dump(&self, matrix: &Matrix, format: Format) -> Result<PathBuf>
    {
        let name = &self.config.record_name;
        match &self.config.output {
            OutputTarget::Fixed(path) => {
                save_matrix(path, format, name, matrix)?;
                Ok(path.clone())
            }
            OutputTarget::Unique { dir } => write_unique(dir, format, name, matrix),
        }
    }
}

/// Write into a new `mdv-XXXXXX.<ext>` file in `dir`
///
/// The file is removed again if writing fails.
fn write_unique(dir: &Path, format: Format, name: &str, matrix: &Matrix) -> Result<PathBuf>
{
    let suffix = format!(".{}", format.extension());
    let file = Builder::new().prefix(OUTPUT_PREFIX).suffix(&suffix).tempfile_in(dir)?;
    {
        let mut writer = BufWriter::new(file.as_file());
        write_matrix(&mut writer, format, name, matrix)?;
        writer.flush()?;
    }
    let (_, path) = file.keep().map_err(|e| MdvError::Io(e.error))?;
    Ok(path)
}
