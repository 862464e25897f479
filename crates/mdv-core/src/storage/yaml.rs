//! OpenCV FileStorage YAML
//!
//! ```text
//! %YAML:1.0
//! ---
//! matrix: !!opencv-matrix
//!    rows: 2
//!    cols: 3
//!    dt: u
//!    data: [ 1, 2, 3, 4, 5, 6 ]
//! ```

use std::io::Write;

use super::values::{scalars, wrap_values};
use crate::error::Result;
use crate::types::Matrix;

const LINE_WIDTH: usize = 80;
const CONTINUATION: &str = "       ";

pub(super) fn write<W: Write>(writer: &mut W, name: &str, matrix: &Matrix) -> Result<()>
{
    writeln!(writer, "%YAML:1.0")?;
    writeln!(writer, "---")?;
    writeln!(writer, "{name}: !!opencv-matrix")?;
    writeln!(writer, "   rows: {}", matrix.rows())?;
    writeln!(writer, "   cols: {}", matrix.cols())?;
    writeln!(writer, "   dt: {}", matrix.mat_type().storage_dt())?;

    let count = matrix.value_count();
    if count == 0 {
        writeln!(writer, "   data: []")?;
        return Ok(());
    }

    let values = scalars(matrix)
        .enumerate()
        .map(|(i, v)| if i + 1 < count { format!("{v},") } else { v.to_string() });
    let lines = wrap_values(values, CONTINUATION, " ", LINE_WIDTH);
    for (i, line) in lines.iter().enumerate() {
        let body = &line[CONTINUATION.len()..];
        if i == 0 {
            write!(writer, "   data: [ {body}")?;
        } else {
            write!(writer, "\n{line}")?;
        }
    }
    writeln!(writer, " ]")?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::types::MatType;

    fn render(matrix: &Matrix) -> String
    {
        let mut out = Vec::new();
        write(&mut out, "matrix", matrix).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_u8_matrix()
    {
        let matrix = Matrix::new(2, 3, MatType::from_code(0).unwrap(), vec![1, 2, 3, 4, 5, 6]).unwrap();
        assert_eq!(
            render(&matrix),
            "%YAML:1.0\n---\nmatrix: !!opencv-matrix\n   rows: 2\n   cols: 3\n   dt: u\n   data: [ 1, 2, 3, 4, 5, 6 ]\n"
        );
    }

    #[test]
    fn test_double_values()
    {
        let data: Vec<u8> = [1.5f64, -2.0].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let matrix = Matrix::new(1, 2, MatType::from_code(6).unwrap(), data).unwrap();
        let text = render(&matrix);
        assert!(text.contains("   dt: d\n"));
        assert!(text.ends_with("   data: [ 1.5000000000000000e+00, -2. ]\n"));
    }

    #[test]
    fn test_continuation_lines_are_indented()
    {
        let matrix = Matrix::new(10, 10, MatType::from_code(0).unwrap(), vec![100; 100]).unwrap();
        let text = render(&matrix);
        let continuation: Vec<_> = text.lines().skip_while(|l| !l.starts_with("   data:")).skip(1).collect();
        assert!(!continuation.is_empty());
        assert!(continuation.iter().all(|l| l.starts_with("       100")));
    }

    #[test]
    fn test_empty_matrix()
    {
        let matrix = Matrix::new(0, 0, MatType::from_code(0).unwrap(), Vec::new()).unwrap();
        assert!(render(&matrix).ends_with("   data: []\n"));
    }
}
