//! Inferior memory address type.

use std::fmt;
use std::ops::Add;

/// Strongly typed address in the inferior's address space
///
/// Keeps pointer values read from the debugger apart from sizes and counts
/// that flow through the same code paths.
///
/// ## Example
///
/// ```rust
/// use mdv_core::types::Address;
///
/// let addr = Address::from(0x1000);
/// assert_eq!((addr + 0x100).value(), 0x1100);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address(u64);

impl Address
{
    /// The null address
    pub const ZERO: Self = Address(0);

    /// Create a new address from a `u64` value
    pub const fn new(value: u64) -> Self
    {
        Address(value)
    }

    /// Get the raw `u64` value of this address
    pub const fn value(self) -> u64
    {
        self.0
    }

    /// Whether this is the null pointer
    pub const fn is_null(self) -> bool
    {
        self.0 == 0
    }

    /// Add an offset to this address, checking for overflow
    ///
    /// ```rust
    /// use mdv_core::types::Address;
    ///
    /// let addr = Address::from(0x1000);
    /// assert_eq!(addr.checked_add(0x100), Some(Address::from(0x1100)));
    /// assert_eq!(addr.checked_add(u64::MAX), None);
    /// ```
    pub fn checked_add(self, offset: u64) -> Option<Self>
    {
        self.0.checked_add(offset).map(Address)
    }

    /// Parse an address as printed by a debugger: `0x`-prefixed hex or decimal
    ///
    /// ```rust
    /// use mdv_core::types::Address;
    ///
    /// assert_eq!(Address::parse("0x7ffd1000"), Some(Address::new(0x7ffd_1000)));
    /// assert_eq!(Address::parse("4096"), Some(Address::new(4096)));
    /// assert_eq!(Address::parse("nope"), None);
    /// ```
    pub fn parse(text: &str) -> Option<Self>
    {
        let text = text.trim();
        let value = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
            Some(hex) => u64::from_str_radix(hex, 16).ok()?,
            None => text.parse().ok()?,
        };
        Some(Address(value))
    }
}

impl From<u64> for Address
{
    fn from(value: u64) -> Self
    {
        Address(value)
    }
}

impl From<Address> for u64
{
    fn from(address: Address) -> Self
    {
        address.0
    }
}

impl fmt::Display for Address
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
    {
        write!(f, "0x{:016x}", self.0)
    }
}

impl Add<u64> for Address
{
    type Output = Address;

    fn add(self, rhs: u64) -> Self::Output
    {
        Address(self.0.wrapping_add(rhs))
    }
}
