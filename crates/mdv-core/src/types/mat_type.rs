//! Element type codes of image matrices.
//!
//! A type code packs the element depth in its low three bits and
//! `channels - 1` in the next nine bits, the way OpenCV's `CV_MAKETYPE`
//! does. `CV_8UC3` is therefore `16`, `CV_32FC1` is `5`.

use std::fmt;

use crate::error::{MdvError, Result};

const DEPTH_MASK: i64 = 7;
const CHANNEL_SHIFT: i64 = 3;
const MAX_CHANNELS: u32 = 512;

/// Mask applied to the `flags` header field to recover the type code
pub const TYPE_MASK: i64 = 0xFFF;

/// Per-channel element depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Depth
{
    U8,
    I8,
    U16,
    I16,
    I32,
    F32,
    F64,
    F16,
}

impl Depth
{
    /// Decode the low three bits of a type code
    pub fn from_code(code: i64) -> Self
    {
        match code & DEPTH_MASK {
            0 => Depth::U8,
            1 => Depth::I8,
            2 => Depth::U16,
            3 => Depth::I16,
            4 => Depth::I32,
            5 => Depth::F32,
            6 => Depth::F64,
            _ => Depth::F16,
        }
    }

    /// Depth index as stored in the low bits of a type code
    pub fn code(self) -> i64
    {
        match self {
            Depth::U8 => 0,
            Depth::I8 => 1,
            Depth::U16 => 2,
            Depth::I16 => 3,
            Depth::I32 => 4,
            Depth::F32 => 5,
            Depth::F64 => 6,
            Depth::F16 => 7,
        }
    }

    /// Size of one channel value in bytes
    pub fn size(self) -> usize
    {
        match self {
            Depth::U8 | Depth::I8 => 1,
            Depth::U16 | Depth::I16 | Depth::F16 => 2,
            Depth::I32 | Depth::F32 => 4,
            Depth::F64 => 8,
        }
    }

    /// Single-character FileStorage type tag
    pub fn storage_char(self) -> char
    {
        match self {
            Depth::U8 => 'u',
            Depth::I8 => 'c',
            Depth::U16 => 'w',
            Depth::I16 => 's',
            Depth::I32 => 'i',
            Depth::F32 => 'f',
            Depth::F64 => 'd',
            Depth::F16 => 'h',
        }
    }

    /// Whether values are floating point
    pub fn is_float(self) -> bool
    {
        matches!(self, Depth::F16 | Depth::F32 | Depth::F64)
    }
}

/// Decoded element type: depth plus channel count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatType
{
    depth: Depth,
    channels: u32,
}

impl MatType
{
    /// Build a type from its parts
    ///
    /// ## Errors
    ///
    /// `InvalidArgument` when `channels` is 0 or above 512.
    pub fn new(depth: Depth, channels: u32) -> Result<Self>
    {
        if channels == 0 || channels > MAX_CHANNELS {
            return Err(MdvError::InvalidArgument(format!("channel count {channels} out of range 1..=512")));
        }
        Ok(Self { depth, channels })
    }

    /// Decode a numeric type code
    ///
    /// ```rust
    /// use mdv_core::types::{Depth, MatType};
    ///
    /// let t = MatType::from_code(16).unwrap();
    /// assert_eq!(t.depth(), Depth::U8);
    /// assert_eq!(t.channels(), 3);
    /// ```
    ///
    /// ## Errors
    ///
    /// `InvalidTypeCode` for negative codes or codes with bits above the
    /// twelve used by the encoding.
    pub fn from_code(code: i64) -> Result<Self>
    {
        if !(0..=TYPE_MASK).contains(&code) {
            return Err(MdvError::InvalidTypeCode(code));
        }
        let channels = u32::try_from((code >> CHANNEL_SHIFT) + 1).map_err(|_| MdvError::InvalidTypeCode(code))?;
        Ok(Self {
            depth: Depth::from_code(code),
            channels,
        })
    }

    /// Numeric type code
    pub fn code(self) -> i64
    {
        self.depth.code() + ((i64::from(self.channels) - 1) << CHANNEL_SHIFT)
    }

    pub fn depth(self) -> Depth
    {
        self.depth
    }

    pub fn channels(self) -> u32
    {
        self.channels
    }

    /// Bytes per element (all channels)
    pub fn elem_size(self) -> usize
    {
        self.depth.size() * self.channels as usize
    }

    /// FileStorage `dt` string: `u`, `3u`, `2f`...
    pub fn storage_dt(self) -> String
    {
        if self.channels > 1 {
            format!("{}{}", self.channels, self.depth.storage_char())
        } else {
            self.depth.storage_char().to_string()
        }
    }
}

impl fmt::Display for MatType
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        let depth = match self.depth {
            Depth::U8 => "8U",
            Depth::I8 => "8S",
            Depth::U16 => "16U",
            Depth::I16 => "16S",
            Depth::I32 => "32S",
            Depth::F32 => "32F",
            Depth::F64 => "64F",
            Depth::F16 => "16F",
        };
        write!(f, "CV_{depth}C{}", self.channels)
    }
}
