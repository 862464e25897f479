//! Scalar decoding and text formatting shared by the text formats.

use std::fmt;

use crate::types::{Depth, Matrix};

/// One channel value decoded from matrix bytes
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar
{
    Int(i64),
    /// Value plus the precision it should be printed with
    Float(f64, FloatWidth),
}

/// Digits used when printing a float in exponent form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FloatWidth
{
    /// `%.8e`, for `f16`/`f32`
    Single,
    /// `%.16e`, for `f64`
    Double,
}

impl Scalar
{
    pub fn as_f64(self) -> f64
    {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Scalar::Int(v) => v as f64,
            Scalar::Float(v, _) => v,
        }
    }
}

impl fmt::Display for Scalar
{
    /// FileStorage text: integers as is, integral floats with a trailing `.`,
    /// other floats in C `%e` notation, `.Nan`, `.Inf`, `-.Inf`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        match *self {
            Scalar::Int(v) => write!(f, "{v}"),
            Scalar::Float(v, _) if v.is_nan() => f.write_str(".Nan"),
            Scalar::Float(v, _) if v.is_infinite() => f.write_str(if v < 0.0 { "-.Inf" } else { ".Inf" }),
            #[allow(clippy::cast_possible_truncation)]
            Scalar::Float(v, _) if v.fract() == 0.0 && v.abs() < 2_147_483_648.0 => write!(f, "{}.", v as i64),
            Scalar::Float(v, width) => {
                let precision = match width {
                    FloatWidth::Single => 8,
                    FloatWidth::Double => 16,
                };
                f.write_str(&c_exponent(v, precision))
            }
        }
    }
}

/// Format like C's `%.<precision>e`: exponent signed and at least two digits
///
/// ```rust
/// use mdv_core::storage::values::c_exponent;
///
/// assert_eq!(c_exponent(0.15, 8), "1.50000000e-01");
/// assert_eq!(c_exponent(123456.5, 2), "1.23e+05");
/// ```
pub fn c_exponent(value: f64, precision: usize) -> String
{
    let rust = format!("{value:.precision$e}");
    match rust.split_once('e') {
        Some((mantissa, exponent)) => {
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let sign = if exponent < 0 { '-' } else { '+' };
            format!("{mantissa}e{sign}{:02}", exponent.unsigned_abs())
        }
        None => rust,
    }
}

/// Convert IEEE 754 half precision bits to `f64`
pub fn f16_to_f64(bits: u16) -> f64
{
    let sign = if bits & 0x8000 == 0 { 1.0 } else { -1.0 };
    let exponent = i32::from((bits >> 10) & 0x1f);
    let fraction = f64::from(bits & 0x03ff);
    match exponent {
        0 => sign * fraction * 2f64.powi(-24),
        0x1f if fraction == 0.0 => sign * f64::INFINITY,
        0x1f => f64::NAN,
        _ => sign * (1.0 + fraction / 1024.0) * 2f64.powi(exponent - 15),
    }
}

/// Decode every channel value of `matrix`, in memory order, native endian
pub fn scalars(matrix: &Matrix) -> impl Iterator<Item = Scalar> + '_
{
    let depth = matrix.mat_type().depth();
    matrix.data().chunks_exact(depth.size()).map(move |b| decode(depth, b))
}

fn decode(depth: Depth, b: &[u8]) -> Scalar
{
    match depth {
        Depth::U8 => Scalar::Int(i64::from(b[0])),
        Depth::I8 => Scalar::Int(i64::from(i8::from_ne_bytes([b[0]]))),
        Depth::U16 => Scalar::Int(i64::from(u16::from_ne_bytes([b[0], b[1]]))),
        Depth::I16 => Scalar::Int(i64::from(i16::from_ne_bytes([b[0], b[1]]))),
        Depth::I32 => Scalar::Int(i64::from(i32::from_ne_bytes([b[0], b[1], b[2], b[3]]))),
        Depth::F32 => Scalar::Float(
            f64::from(f32::from_ne_bytes([b[0], b[1], b[2], b[3]])),
            FloatWidth::Single,
        ),
        Depth::F64 => Scalar::Float(
            f64::from_ne_bytes([b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7]]),
            FloatWidth::Double,
        ),
        Depth::F16 => Scalar::Float(f16_to_f64(u16::from_ne_bytes([b[0], b[1]])), FloatWidth::Single),
    }
}

/// Lay out formatted values on lines no longer than `width`
///
/// Each line starts with `indent`; values are joined by `separator`.
pub fn wrap_values<I>(values: I, indent: &str, separator: &str, width: usize) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut lines = Vec::new();
    let mut line = String::new();
    for value in values {
        if line.is_empty() {
            line.push_str(indent);
            line.push_str(&value);
        } else if line.len() + separator.len() + value.len() > width {
            lines.push(std::mem::take(&mut line));
            line.push_str(indent);
            line.push_str(&value);
        } else {
            line.push_str(separator);
            line.push_str(&value);
        }
    }
    if !line.is_empty() {
        lines.push(line);
    }
    lines
}
