//! ESRF data format: a `{ key = value ; }` text header followed by the raw
//! single-channel payload.

use std::io::Write;

use crate::error::{MdvError, Result};
use crate::types::{Depth, Matrix};

#[cfg(target_endian = "little")]
const BYTE_ORDER: &str = "LowByteFirst";
#[cfg(target_endian = "big")]
const BYTE_ORDER: &str = "HighByteFirst";

fn data_type(depth: Depth) -> Option<&'static str>
{
    match depth {
        Depth::I8 => Some("SignedByte"),
        Depth::U8 => Some("UnsignedByte"),
        Depth::I16 => Some("SignedShort"),
        Depth::U16 => Some("UnsignedShort"),
        Depth::I32 => Some("SignedInteger"),
        Depth::F32 => Some("FloatValue"),
        Depth::F64 => Some("DoubleValue"),
        Depth::F16 => None,
    }
}

pub(super) fn write<W: Write>(writer: &mut W, matrix: &Matrix) -> Result<()>
{
    let mat_type = matrix.mat_type();
    let data_type = data_type(mat_type.depth())
        .filter(|_| mat_type.channels() == 1)
        .ok_or_else(|| MdvError::UnsupportedFormat(format!("edf cannot store {mat_type}")))?;

    write!(writer, "\n{{\n")?;
    for (key, value) in [
        ("DataType", data_type.to_string()),
        ("Dim_1", matrix.cols().to_string()),
        ("Dim_2", matrix.rows().to_string()),
        ("ByteOrder", BYTE_ORDER.to_string()),
    ] {
        writeln!(writer, "{key} = {value} ; ")?;
    }
    writeln!(writer, "}}")?;
    writer.write_all(matrix.data())?;
    Ok(())
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::types::MatType;

    #[test]
    fn test_header_then_payload()
    {
        let data: Vec<u8> = [1u16, 2, 3].iter().flat_map(|v| v.to_ne_bytes()).collect();
        let matrix = Matrix::new(1, 3, MatType::from_code(2).unwrap(), data.clone()).unwrap(); // CV_16UC1
        let mut out = Vec::new();
        write(&mut out, &matrix).unwrap();

        let header = format!(
            "\n{{\nDataType = UnsignedShort ; \nDim_1 = 3 ; \nDim_2 = 1 ; \nByteOrder = {BYTE_ORDER} ; \n}}\n"
        );
        assert_eq!(&out[..header.len()], header.as_bytes());
        assert_eq!(&out[header.len()..], data.as_slice());
    }

    #[test]
    fn test_rejects_multichannel_and_half_floats()
    {
        let bgr = Matrix::new(1, 1, MatType::from_code(16).unwrap(), vec![1, 2, 3]).unwrap();
        assert!(matches!(write(&mut Vec::new(), &bgr), Err(MdvError::UnsupportedFormat(_))));

        let half = Matrix::new(1, 1, MatType::from_code(7).unwrap(), vec![0, 0x3c]).unwrap();
        assert!(matches!(write(&mut Vec::new(), &half), Err(MdvError::UnsupportedFormat(_))));
    }
}
