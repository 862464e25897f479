//! # Matrix storage
//!
//! Serializes a [`Matrix`] into the files `matrix-viewer` opens. The format is
//! picked from the file extension, or forced by the caller:
//!
//! | format | extensions      | notes                                   |
//! |--------|-----------------|-----------------------------------------|
//! | XML    | `xml`           | OpenCV FileStorage, default             |
//! | YAML   | `yml`, `yaml`   | OpenCV FileStorage                      |
//! | JSON   | `json`          | OpenCV FileStorage                      |
//! | MFE    | `mfe`           | Matrix Format Exchange binary           |
//! | EDF    | `edf`           | ESRF header + raw data, one channel     |
//! | TXT    | `txt`           | `COLS ROWS` line + values, one channel  |
//!
//! The FileStorage formats store the matrix under a record name (the top
//! level key); the viewer looks for `matrix`.

mod edf;
mod json;
mod mfe;
mod txt;
pub mod values;
mod xml;
mod yaml;

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use tempfile::NamedTempFile;
use tracing::debug;

pub use mfe::{MFE_COMMENT, MFE_HEADER_LEN};

use crate::error::{MdvError, Result};
use crate::types::Matrix;

/// Record name `matrix-viewer` reads from FileStorage files
pub const DEFAULT_RECORD_NAME: &str = "matrix";

/// File format of a matrix dump
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format
{
    #[default]
    Xml,
    Yaml,
    Json,
    Mfe,
    Edf,
    Txt,
}

impl Format
{
    /// Guess the format from a path's extension (case insensitive)
    pub fn from_path(path: &Path) -> Option<Self>
    {
        let extension = path.extension()?.to_str()?.to_lowercase();
        match extension.as_str() {
            "xml" => Some(Format::Xml),
            "yml" | "yaml" => Some(Format::Yaml),
            "json" => Some(Format::Json),
            "mfe" => Some(Format::Mfe),
            "edf" => Some(Format::Edf),
            "txt" => Some(Format::Txt),
            _ => None,
        }
    }

    /// Extension used for generated file names
    pub fn extension(self) -> &'static str
    {
        match self {
            Format::Xml => "xml",
            Format::Yaml => "yml",
            Format::Json => "json",
            Format::Mfe => "mfe",
            Format::Edf => "edf",
            Format::Txt => "txt",
        }
    }

    /// Whether the format stores a record name
    pub fn is_file_storage(self) -> bool
    {
        matches!(self, Format::Xml | Format::Yaml | Format::Json)
    }
}

impl FromStr for Format
{
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err>
    {
        match s.to_lowercase().as_str() {
            "xml" => Ok(Format::Xml),
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            "mfe" => Ok(Format::Mfe),
            "edf" => Ok(Format::Edf),
            "txt" | "text" => Ok(Format::Txt),
            _ => Err(format!("Unknown format: {s}. Use 'xml', 'yaml', 'json', 'mfe', 'edf' or 'txt'")),
        }
    }
}

impl fmt::Display for Format
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        f.write_str(match self {
            Format::Xml => "xml",
            Format::Yaml => "yaml",
            Format::Json => "json",
            Format::Mfe => "mfe",
            Format::Edf => "edf",
            Format::Txt => "txt",
        })
    }
}

/// Check that `name` can be used as an XML tag and a YAML/JSON key
///
/// ## Errors
///
/// `InvalidArgument` for empty names or names with characters outside
/// `[A-Za-z0-9_-]`, or starting with a digit or `-`.
pub fn validate_record_name(name: &str) -> Result<()>
{
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(MdvError::InvalidArgument(format!("invalid record name {name:?}")))
    }
}

/// Serialize `matrix` to `writer` in `format`
///
/// ## Errors
///
/// - `InvalidArgument`: bad record name (FileStorage formats)
/// - `UnsupportedFormat`: TXT or EDF with an element type they cannot hold
/// - `Io`/`Json`: write failures
pub fn write_matrix<W: Write>(writer: &mut W, format: Format, record_name: &str, matrix: &Matrix) -> Result<()>
{
    if format.is_file_storage() {
        validate_record_name(record_name)?;
    }
    match format {
        Format::Xml => xml::write(writer, record_name, matrix),
        Format::Yaml => yaml::write(writer, record_name, matrix),
        Format::Json => json::write(writer, record_name, matrix),
        Format::Mfe => mfe::write(writer, matrix),
        Format::Edf => edf::write(writer, matrix),
        Format::Txt => txt::write(writer, matrix),
    }
}

/// Serialize `matrix` into the file at `path`, replacing its contents
///
/// The data goes to a temporary file next to `path` that is renamed over it
/// once complete; on failure `path` keeps its previous contents.
///
/// ## Errors
///
/// See [`write_matrix`]; also `Io` when the file cannot be created.
pub fn save_matrix(path: &Path, format: Format, record_name: &str, matrix: &Matrix) -> Result<()>
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let file = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(file.as_file());
        write_matrix(&mut writer, format, record_name, matrix)?;
        writer.flush()?;
    }
    file.persist(path).map_err(|e| MdvError::Io(e.error))?;
    debug!(path = %path.display(), %format, "Saved matrix");
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_format_from_path()
    {
        assert_eq!(Format::from_path(Path::new("/tmp/dump.xml")), Some(Format::Xml));
        assert_eq!(Format::from_path(Path::new("a.YAML")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("a.yml")), Some(Format::Yaml));
        assert_eq!(Format::from_path(Path::new("a.mfe")), Some(Format::Mfe));
        assert_eq!(Format::from_path(Path::new("scan.EDF")), Some(Format::Edf));
        assert_eq!(Format::from_path(Path::new("a.png")), None);
        assert_eq!(Format::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_format_from_str_and_display()
    {
        for format in [Format::Xml, Format::Yaml, Format::Json, Format::Mfe, Format::Edf, Format::Txt] {
            assert_eq!(format.to_string().parse::<Format>().unwrap(), format);
        }
        assert!("bmp".parse::<Format>().is_err());
    }

    #[test]
    fn test_validate_record_name()
    {
        assert!(validate_record_name("matrix").is_ok());
        assert!(validate_record_name("_img-2").is_ok());
        assert!(validate_record_name("").is_err());
        assert!(validate_record_name("2d").is_err());
        assert!(validate_record_name("a b").is_err());
        assert!(validate_record_name("<x>").is_err());
    }
}
