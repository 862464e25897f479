//! OpenCV FileStorage XML
//!
//! ```text
//! <?xml version="1.0"?>
//! <opencv_storage>
//! <matrix type_id="opencv-matrix">
//!   <rows>2</rows>
//!   <cols>3</cols>
//!   <dt>u</dt>
//!   <data>
//!     1 2 3 4 5 6</data></matrix>
//! </opencv_storage>
//! ```

use std::io::Write;

use super::values::{scalars, wrap_values};
use crate::error::Result;
use crate::types::Matrix;

const LINE_WIDTH: usize = 80;

pub(super) fn write<W: Write>(writer: &mut W, name: &str, matrix: &Matrix) -> Result<()>
{
    writeln!(writer, "<?xml version=\"1.0\"?>")?;
    writeln!(writer, "<opencv_storage>")?;
    writeln!(writer, "<{name} type_id=\"opencv-matrix\">")?;
    writeln!(writer, "  <rows>{}</rows>", matrix.rows())?;
    writeln!(writer, "  <cols>{}</cols>", matrix.cols())?;
    writeln!(writer, "  <dt>{}</dt>", matrix.mat_type().storage_dt())?;
    write!(writer, "  <data>")?;
    for line in wrap_values(scalars(matrix).map(|v| v.to_string()), "    ", " ", LINE_WIDTH) {
        write!(writer, "\n{line}")?;
    }
    writeln!(writer, "</data></{name}>")?;
    writeln!(writer, "</opencv_storage>")?;
    Ok(())
}
