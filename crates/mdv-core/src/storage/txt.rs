//! Plain text: `COLS ROWS` on the first line, then every value as a double
//! followed by a space, row by row. Single channel matrices only.

use std::io::Write;

use super::values::scalars;
use crate::error::{MdvError, Result};
use crate::types::Matrix;

/// Significant digits, as a default C++ text stream prints them
const PRECISION: usize = 6;

pub(super) fn write<W: Write>(writer: &mut W, matrix: &Matrix) -> Result<()>
{
    if matrix.mat_type().channels() != 1 {
        return Err(MdvError::UnsupportedFormat(format!(
            "txt stores one channel, {} has {}",
            matrix.mat_type(),
            matrix.mat_type().channels()
        )));
    }
    writeln!(writer, "{} {}", matrix.cols(), matrix.rows())?;
    for value in scalars(matrix) {
        write!(writer, "{} ", general(value.as_f64(), PRECISION))?;
    }
    Ok(())
}

/// Format like C's `%.<precision>g`
fn general(value: f64, precision: usize) -> String
{
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value < 0.0 { "-inf" } else { "inf" }.to_string();
    }
    if value == 0.0 {
        return if value.is_sign_negative() { "-0" } else { "0" }.to_string();
    }

    let digits = precision.max(1);
    let scientific = format!("{value:.prec$e}", prec = digits - 1);
    let (mantissa, exponent) = scientific.split_once('e').unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    #[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
    let limit = digits as i32;
    if exponent < -4 || exponent >= limit {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{sign}{:02}", trim_zeros(mantissa), exponent.unsigned_abs())
    } else {
        #[allow(clippy::cast_sign_loss)]
        let decimals = (limit - 1 - exponent) as usize;
        trim_zeros(&format!("{value:.decimals$}")).to_string()
    }
}

fn trim_zeros(number: &str) -> &str
{
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
