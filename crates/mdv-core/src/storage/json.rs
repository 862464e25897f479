//! OpenCV FileStorage JSON
//!
//! Non-finite floats have no JSON spelling and are written as `null`.

use std::collections::BTreeMap;
use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use super::values::{scalars, Scalar};
use crate::error::Result;
use crate::types::Matrix;

#[derive(Debug, Serialize)]
struct JsonMatrix
{
    type_id: &'static str,
    rows: usize,
    cols: usize,
    dt: String,
    data: Vec<Value>,
}

impl JsonMatrix
{
    fn new(matrix: &Matrix) -> Self
    {
        Self {
            type_id: "opencv-matrix",
            rows: matrix.rows(),
            cols: matrix.cols(),
            dt: matrix.mat_type().storage_dt(),
            data: scalars(matrix).map(to_json).collect(),
        }
    }
}

fn to_json(value: Scalar) -> Value
{
    match value {
        Scalar::Int(v) => Value::from(v),
        Scalar::Float(v, _) => serde_json::Number::from_f64(v).map_or(Value::Null, Value::Number),
    }
}

pub(super) fn write<W: Write>(writer: &mut W, name: &str, matrix: &Matrix) -> Result<()>
{
    let mut document = BTreeMap::new();
    document.insert(name, JsonMatrix::new(matrix));
    serde_json::to_writer_pretty(&mut *writer, &document)?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::types::MatType;

    fn parse(matrix: &Matrix) -> Value
    {
        let mut out = Vec::new();
        write(&mut out, "matrix", matrix).unwrap();
        serde_json::from_slice(&out).unwrap()
    }

    #[test]
    fn test_document_shape()
    {
        let matrix = Matrix::new(2, 2, MatType::from_code(0).unwrap(), vec![1, 2, 3, 4]).unwrap();
        let document = parse(&matrix);
        let record = &document["matrix"];
        assert_eq!(record["type_id"], "opencv-matrix");
        assert_eq!(record["rows"], 2);
        assert_eq!(record["cols"], 2);
        assert_eq!(record["dt"], "u");
        assert_eq!(record["data"], serde_json::json!([1, 2, 3, 4]));
    }

    #[test]
    fn test_non_finite_floats_become_null()
    {
        let data: Vec<u8> = [0.25f32, f32::NAN].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let matrix = Matrix::new(1, 1, MatType::from_code(13).unwrap(), data).unwrap(); // CV_32FC2
        let record = &parse(&matrix)["matrix"];
        assert_eq!(record["dt"], "2f");
        assert_eq!(record["data"], serde_json::json!([0.25, null]));
    }
}
