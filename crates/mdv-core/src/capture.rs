//! # Matrix capture
//!
//! Turns an expression naming a matrix in the inferior into an
//! [`ImageSnapshot`]: resolve the value, read its header fields, then copy
//! `row_stride × rows` bytes starting at its data pointer.
//!
//! Header fields read from the value:
//!
//! | field            | meaning                         |
//! |------------------|---------------------------------|
//! | `rows`, `cols`   | shape (`-1` for n-dimensional)  |
//! | `type()`/`flags` | element type code               |
//! | `data`           | pointer to row 0                |
//! | `step.buf[0]`    | bytes per row, padding included |

use tracing::{debug, info, warn};

use crate::error::{MdvError, Result};
use crate::host::DebuggerHost;
use crate::memory::ProcessMemory;
use crate::typecode::{parse_integer_value, query_type_code, TypeCodeStrategy};
use crate::types::{Address, ImageLayout, ImageSnapshot, MatType};

/// Knobs for [`capture`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CaptureOptions
{
    pub type_code: TypeCodeStrategy,
    /// Copy the payload with `process_vm_readv` instead of through the host
    pub direct_memory: bool,
}

/// Read the header of the matrix named by `expression`
///
/// ## Errors
///
/// - `Evaluation`: the expression or one of its fields does not resolve
/// - `TypeCodeParse`, `InvalidTypeCode`, `InvalidLayout`: unexpected field values
pub fn read_layout(host: &mut dyn DebuggerHost, expression: &str, strategy: TypeCodeStrategy) -> Result<ImageLayout>
{
    let value = host.evaluate(expression)?;
    debug!(expression, value = %value, "Resolved expression");

    let mat_type = MatType::from_code(query_type_code(host, expression, strategy)?)?;

    let data_text = host.evaluate(&format!("(unsigned long long)({expression}).data"))?;
    let data = Address::parse(&data_text).ok_or_else(|| MdvError::InvalidLayout(format!("data pointer {data_text:?}")))?;

    let rows = integer_field(host, expression, "rows")?;
    let cols = integer_field(host, expression, "cols")?;
    let row_stride = integer_field(host, expression, "step.buf[0]")?;

    ImageLayout::from_header(rows, cols, mat_type, row_stride, data)
}

fn integer_field(host: &mut dyn DebuggerHost, expression: &str, field: &str) -> Result<i64>
{
    let text = host.evaluate(&format!("({expression}).{field}"))?;
    parse_integer_value(&text).map_err(|_| MdvError::InvalidLayout(format!("field `{field}` is {text:?}")))
}

/// Capture the matrix named by `expression`
///
/// Nothing is copied for an empty matrix. With `direct_memory` set and no
/// live pid available, the host is used instead.
///
/// ## Errors
///
/// Everything [`read_layout`] returns, plus `MemoryRead`/`UnreadableRange`
/// when the payload cannot be copied in full.
pub fn capture(host: &mut dyn DebuggerHost, expression: &str, options: &CaptureOptions) -> Result<ImageSnapshot>
{
    let layout = read_layout(host, expression, options.type_code)?;
    if layout.is_empty() {
        info!(expression, "Matrix is empty, nothing to copy");
        return ImageSnapshot::new(layout, Vec::new());
    }

    let len = layout.transfer_size()?;
    let bytes = match (options.direct_memory, host.inferior_pid()) {
        (true, Some(pid)) => ProcessMemory::open(pid)?.read(layout.data, len)?,
        (true, None) => {
            warn!("Direct memory reads need a live process, reading through the debugger");
            host.read_memory(layout.data, len)?
        }
        (false, _) => host.read_memory(layout.data, len)?,
    };

    info!(
        expression,
        rows = layout.rows,
        cols = layout.cols,
        mat_type = %layout.mat_type,
        bytes = len,
        "Captured matrix"
    );
    ImageSnapshot::new(layout, bytes)
}
