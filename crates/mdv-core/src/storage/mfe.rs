//! Matrix Format Exchange, the viewer's native binary format
//!
//! Little endian, packed:
//!
//! | offset | size | field                                  |
//! |--------|------|----------------------------------------|
//! | 0      | 3    | magic `MFE`                            |
//! | 3      | 4    | data offset (header + comment length)  |
//! | 7      | 4    | type code                              |
//! | 11     | 4    | cols                                   |
//! | 15     | 4    | rows                                   |
//! | 19     | 4    | channels                               |
//! | 23     | n    | comment                                |
//! | offset | ...  | packed data                            |

use std::io::Write;

use byteorder::{LittleEndian, WriteBytesExt};

use crate::error::{MdvError, Result};
use crate::types::Matrix;

pub const MFE_MAGIC: &[u8; 3] = b"MFE";
pub const MFE_HEADER_LEN: usize = 23;
pub const MFE_COMMENT: &str = "MatrixViewer";

fn header_field<T>(value: T, field: &str) -> Result<i32>
where
    T: TryInto<i32> + Copy + std::fmt::Display,
{
    value
        .try_into()
        .map_err(|_| MdvError::InvalidLayout(format!("{field} {value} does not fit an MFE header")))
}

pub(super) fn write<W: Write>(writer: &mut W, matrix: &Matrix) -> Result<()>
{
    let mat_type = matrix.mat_type();
    writer.write_all(MFE_MAGIC)?;
    writer.write_i32::<LittleEndian>(header_field(MFE_HEADER_LEN + MFE_COMMENT.len(), "offset")?)?;
    writer.write_i32::<LittleEndian>(header_field(mat_type.code(), "type")?)?;
    writer.write_i32::<LittleEndian>(header_field(matrix.cols(), "cols")?)?;
    writer.write_i32::<LittleEndian>(header_field(matrix.rows(), "rows")?)?;
    writer.write_i32::<LittleEndian>(header_field(mat_type.channels(), "channels")?)?;
    writer.write_all(MFE_COMMENT.as_bytes())?;
    writer.write_all(matrix.data())?;
    Ok(())
}
