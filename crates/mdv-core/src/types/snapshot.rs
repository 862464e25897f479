//! Image buffer snapshot and continuous matrix.

use super::{Address, MatType};
use crate::error::{MdvError, Result};

/// Number of bytes to copy for a matrix of `rows` rows of `row_stride` bytes
///
/// Returns `None` when the product overflows.
///
/// ```rust
/// use mdv_core::types::transfer_size;
///
/// assert_eq!(transfer_size(1920, 1080), Some(2_073_600));
/// assert_eq!(transfer_size(u64::MAX, 2), None);
/// ```
pub fn transfer_size(row_stride: u64, rows: u64) -> Option<u64>
{
    row_stride.checked_mul(rows)
}

/// Shape of a matrix as reported by the inferior's value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageLayout
{
    pub rows: usize,
    pub cols: usize,
    pub mat_type: MatType,
    /// Bytes per row including padding
    pub row_stride: usize,
    /// Address of the first byte of row 0
    pub data: Address,
}

impl ImageLayout
{
    /// Validate raw header fields and build a layout
    ///
    /// ## Errors
    ///
    /// - `InvalidLayout` for negative dimensions or strides, a stride shorter
    ///   than one row of elements, or a null data pointer on a non-empty shape
    /// - `TransferTooLarge` when `row_stride × rows` overflows
    pub fn from_header(rows: i64, cols: i64, mat_type: MatType, row_stride: i64, data: Address) -> Result<Self>
    {
        let rows = usize::try_from(rows).map_err(|_| MdvError::InvalidLayout(format!("negative row count {rows}")))?;
        let cols = usize::try_from(cols).map_err(|_| {
            MdvError::InvalidLayout(format!("column count {cols} (matrices with more than two dimensions are not supported)"))
        })?;
        let row_stride =
            usize::try_from(row_stride).map_err(|_| MdvError::InvalidLayout(format!("negative row stride {row_stride}")))?;

        let layout = Self {
            rows,
            cols,
            mat_type,
            row_stride,
            data,
        };

        if layout.is_empty() {
            return Ok(layout);
        }

        let min_stride = cols
            .checked_mul(mat_type.elem_size())
            .ok_or_else(|| MdvError::InvalidLayout(format!("{cols} columns of {mat_type} overflow")))?;
        if row_stride < min_stride {
            return Err(MdvError::InvalidLayout(format!(
                "row stride {row_stride} is smaller than {cols} × {} bytes",
                mat_type.elem_size()
            )));
        }
        if data.is_null() {
            return Err(MdvError::InvalidLayout("data pointer is null".to_string()));
        }
        layout.transfer_size()?;
        Ok(layout)
    }

    /// Whether the matrix holds no elements
    pub fn is_empty(&self) -> bool
    {
        self.rows == 0 || self.cols == 0
    }

    /// Bytes of one row without padding
    pub fn packed_row_len(&self) -> usize
    {
        self.cols * self.mat_type.elem_size()
    }

    /// Bytes to copy out of the inferior: `row_stride × rows`
    ///
    /// ## Errors
    ///
    /// `TransferTooLarge` when the product does not fit in `usize`.
    pub fn transfer_size(&self) -> Result<usize>
    {
        let too_large = || MdvError::TransferTooLarge {
            row_stride: self.row_stride as u64,
            rows: self.rows as u64,
        };
        let size = transfer_size(self.row_stride as u64, self.rows as u64).ok_or_else(too_large)?;
        usize::try_from(size).map_err(|_| too_large())
    }
}

/// Bytes copied out of the inferior together with the shape they came from
///
/// The payload is exactly `row_stride × rows` bytes, padding included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSnapshot
{
    layout: ImageLayout,
    bytes: Vec<u8>,
}

impl ImageSnapshot
{
    /// Wrap a payload read for `layout`
    ///
    /// ## Errors
    ///
    /// `InvalidLayout` when the payload length is not the layout's transfer size.
    pub fn new(layout: ImageLayout, bytes: Vec<u8>) -> Result<Self>
    {
        let expected = if layout.is_empty() { 0 } else { layout.transfer_size()? };
        if bytes.len() != expected {
            return Err(MdvError::InvalidLayout(format!(
                "payload has {} bytes, expected {expected}",
                bytes.len()
            )));
        }
        Ok(Self { layout, bytes })
    }

    pub fn layout(&self) -> &ImageLayout
    {
        &self.layout
    }

    pub fn bytes(&self) -> &[u8]
    {
        &self.bytes
    }

    /// Drop per-row padding and produce a continuous matrix
    pub fn into_matrix(self) -> Matrix
    {
        let layout = self.layout;
        let row_len = layout.packed_row_len();
        let data = if layout.is_empty() {
            Vec::new()
        } else if row_len == layout.row_stride {
            self.bytes
        } else {
            let mut packed = Vec::with_capacity(row_len * layout.rows);
            for row in self.bytes.chunks_exact(layout.row_stride) {
                packed.extend_from_slice(&row[..row_len]);
            }
            packed
        };

        Matrix {
            rows: layout.rows,
            cols: layout.cols,
            mat_type: layout.mat_type,
            data,
        }
    }
}

/// Continuous matrix ready to be serialized
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix
{
    rows: usize,
    cols: usize,
    mat_type: MatType,
    data: Vec<u8>,
}

impl Matrix
{
    /// Build a matrix from continuous data
    ///
    /// ## Errors
    ///
    /// `InvalidLayout` when `data.len() != rows × cols × elem_size`.
    pub fn new(rows: usize, cols: usize, mat_type: MatType, data: Vec<u8>) -> Result<Self>
    {
        let expected = rows
            .checked_mul(cols)
            .and_then(|n| n.checked_mul(mat_type.elem_size()))
            .ok_or_else(|| MdvError::InvalidLayout(format!("{rows} × {cols} {mat_type} overflows")))?;
        if data.len() != expected {
            return Err(MdvError::InvalidLayout(format!(
                "matrix data has {} bytes, expected {expected}",
                data.len()
            )));
        }
        Ok(Self {
            rows,
            cols,
            mat_type,
            data,
        })
    }

    pub fn rows(&self) -> usize
    {
        self.rows
    }

    pub fn cols(&self) -> usize
    {
        self.cols
    }

    pub fn mat_type(&self) -> MatType
    {
        self.mat_type
    }

    /// Raw continuous bytes, native byte order
    pub fn data(&self) -> &[u8]
    {
        &self.data
    }

    /// Number of scalar values (`rows × cols × channels`)
    pub fn value_count(&self) -> usize
    {
        self.rows * self.cols * self.mat_type.channels() as usize
    }
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::types::Depth;

    fn gray() -> MatType
    {
        MatType::from_code(0).unwrap()
    }

    #[test]
    fn test_transfer_size_is_stride_times_rows()
    {
        for (stride, rows) in [(0u64, 7u64), (1, 1), (640, 480), (4096 * 3, 2160), (13, 17)] {
            assert_eq!(transfer_size(stride, rows), Some(stride * rows));
        }
    }

    #[test]
    fn test_layout_rejects_short_stride()
    {
        let bgr = MatType::from_code(16).unwrap();
        let err = ImageLayout::from_header(2, 4, bgr, 8, Address::new(0x1000)).unwrap_err();
        assert!(matches!(err, MdvError::InvalidLayout(_)));
    }

    #[test]
    fn test_layout_rejects_negative_cols()
    {
        assert!(ImageLayout::from_header(-1, -1, gray(), 0, Address::new(0x1000)).is_err());
    }

    #[test]
    fn test_layout_rejects_null_data()
    {
        assert!(ImageLayout::from_header(2, 2, gray(), 2, Address::ZERO).is_err());
    }

    #[test]
    fn test_empty_layout_accepts_null_data()
    {
        let layout = ImageLayout::from_header(0, 0, gray(), 0, Address::ZERO).unwrap();
        assert!(layout.is_empty());
        let matrix = ImageSnapshot::new(layout, Vec::new()).unwrap().into_matrix();
        assert_eq!(matrix.value_count(), 0);
    }

    #[test]
    fn test_snapshot_checks_payload_length()
    {
        let layout = ImageLayout::from_header(2, 3, gray(), 4, Address::new(0x1000)).unwrap();
        assert!(ImageSnapshot::new(layout, vec![0; 6]).is_err());
        assert!(ImageSnapshot::new(layout, vec![0; 8]).is_ok());
    }

    #[test]
    fn test_into_matrix_drops_row_padding()
    {
        let layout = ImageLayout::from_header(2, 3, gray(), 4, Address::new(0x1000)).unwrap();
        let snapshot = ImageSnapshot::new(layout, vec![1, 2, 3, 0xEE, 4, 5, 6, 0xEE]).unwrap();
        let matrix = snapshot.into_matrix();
        assert_eq!(matrix.data(), &[1, 2, 3, 4, 5, 6]);
        assert_eq!((matrix.rows(), matrix.cols()), (2, 3));
    }

    #[test]
    fn test_into_matrix_keeps_continuous_data()
    {
        let t = MatType::new(Depth::U16, 1).unwrap();
        let layout = ImageLayout::from_header(1, 2, t, 4, Address::new(0x1000)).unwrap();
        let matrix = ImageSnapshot::new(layout, vec![1, 0, 2, 0]).unwrap().into_matrix();
        assert_eq!(matrix.data(), &[1, 0, 2, 0]);
    }

    #[test]
    fn test_matrix_new_checks_size()
    {
        assert!(Matrix::new(2, 2, gray(), vec![0; 3]).is_err());
        assert_eq!(Matrix::new(2, 2, gray(), vec![0; 4]).unwrap().value_count(), 4);
    }
}
