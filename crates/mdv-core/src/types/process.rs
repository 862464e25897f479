//! Process-related types.

use super::Address;

/// Process identifier of the inferior
///
/// ```rust
/// use mdv_core::types::ProcessId;
///
/// let pid = ProcessId::from(4242);
/// assert_eq!(u32::from(pid), 4242);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProcessId(pub u32);

impl From<u32> for ProcessId
{
    fn from(pid: u32) -> Self
    {
        ProcessId(pid)
    }
}

impl From<ProcessId> for u32
{
    fn from(pid: ProcessId) -> Self
    {
        pid.0
    }
}

impl std::fmt::Display for ProcessId
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result
    {
        write!(f, "{}", self.0)
    }
}

/// Memory region in the inferior
///
/// One line of `/proc/<pid>/maps`: a contiguous range with its permission
/// flags and optional backing name.
///
/// ```
/// use mdv_core::types::{Address, MemoryRegion};
///
/// let heap = MemoryRegion::new(Address::from(0x2000), Address::from(0x3000), "rw-p".to_string(), Some("[heap]".to_string()));
/// assert_eq!(heap.size(), 0x1000);
/// assert!(heap.is_readable());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryRegion
{
    /// Start address of the region (inclusive)
    pub start: Address,

    /// End address of the region (exclusive)
    pub end: Address,

    /// Permission string as printed by the kernel (`r`, `w`, `x`, `p`/`s`)
    pub permissions: String,

    /// Backing file or pseudo name (`[heap]`, `[stack]`, ...)
    pub name: Option<String>,
}

impl MemoryRegion
{
    /// Create a new memory region
    ///
    /// `end <= start` is not rejected; such a region has size 0.
    pub fn new(start: Address, end: Address, permissions: String, name: Option<String>) -> Self
    {
        Self {
            start,
            end,
            permissions,
            name,
        }
    }

    /// Size of the region in bytes
    pub fn size(&self) -> u64
    {
        self.end.value().saturating_sub(self.start.value())
    }

    /// Whether the region can be read
    pub fn is_readable(&self) -> bool
    {
        self.permissions.starts_with('r')
    }

    /// Whether `address` falls inside this region
    pub fn contains(&self, address: Address) -> bool
    {
        address >= self.start && address < self.end
    }
}
