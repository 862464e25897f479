//! # Direct memory access
//!
//! Reading a large image through gdb means hex-encoding every byte on an MI
//! line. For live Linux targets the bytes can instead be copied straight out
//! of the inferior with `process_vm_readv(2)`, after checking the range
//! against `/proc/<pid>/maps`.
//!
//! - See: [process_vm_readv(2)](https://man7.org/linux/man-pages/man2/process_vm_readv.2.html)
//! - See: [proc_pid_maps(5)](https://man7.org/linux/man-pages/man5/proc_pid_maps.5.html)

use tracing::debug;

use crate::error::{MdvError, Result};
use crate::types::{Address, MemoryRegion, ProcessId};

/// Parse the contents of a `/proc/<pid>/maps` file
///
/// Lines that do not follow the `start-end perms offset dev inode [name]`
/// layout are skipped.
pub fn parse_maps(contents: &str) -> Vec<MemoryRegion>
{
    contents.lines().filter_map(parse_maps_line).collect()
}

fn parse_maps_line(line: &str) -> Option<MemoryRegion>
{
    let mut fields = line.split_whitespace();
    let (start, end) = fields.next()?.split_once('-')?;
    let permissions = fields.next()?.to_string();
    // offset, device, inode
    fields.nth(2)?;
    let name = fields.collect::<Vec<_>>().join(" ");

    Some(MemoryRegion::new(
        Address::new(u64::from_str_radix(start, 16).ok()?),
        Address::new(u64::from_str_radix(end, 16).ok()?),
        permissions,
        (!name.is_empty()).then_some(name),
    ))
}

/// Check that `[address, address + len)` is covered by readable regions
///
/// Adjacent regions may be chained; any gap or non-readable region fails.
///
/// ## Errors
///
/// `UnreadableRange` when some byte of the range is not mapped readable.
pub fn check_readable(regions: &[MemoryRegion], address: Address, len: usize) -> Result<()>
{
    let unreadable = || MdvError::UnreadableRange { address, len };
    if len == 0 {
        return Ok(());
    }
    let end = address.checked_add(len as u64).ok_or_else(unreadable)?;

    let mut cursor = address;
    while cursor < end {
        let region = regions
            .iter()
            .find(|r| r.contains(cursor))
            .filter(|r| r.is_readable())
            .ok_or_else(unreadable)?;
        cursor = region.end;
    }
    Ok(())
}

/// Reads memory of a live process without going through the debugger
#[derive(Debug)]
pub struct ProcessMemory
{
    pid: ProcessId,
    regions: Vec<MemoryRegion>,
}

impl ProcessMemory
{
    /// Snapshot the memory map of `pid`
    ///
    /// ## Errors
    ///
    /// `Io` when `/proc/<pid>/maps` cannot be read (no such process, or no
    /// permission).
    pub fn open(pid: ProcessId) -> Result<Self>
    {
        let maps = std::fs::read_to_string(format!("/proc/{pid}/maps"))?;
        let regions = parse_maps(&maps);
        debug!(%pid, regions = regions.len(), "Loaded memory map");
        Ok(Self { pid, regions })
    }

    pub fn regions(&self) -> &[MemoryRegion]
    {
        &self.regions
    }

    /// Copy `len` bytes at `address` out of the process
    ///
    /// ## Errors
    ///
    /// - `UnreadableRange`: the range is not fully mapped readable
    /// - `MemoryRead`: the kernel refused or returned a short read
    pub fn read(&self, address: Address, len: usize) -> Result<Vec<u8>>
    {
        check_readable(&self.regions, address, len)?;
        let mut buffer = vec![0u8; len];
        let mut done = 0usize;
        while done < len {
            let n = read_remote(self.pid, address + done as u64, &mut buffer[done..]).map_err(|e| {
                MdvError::MemoryRead {
                    address,
                    len,
                    reason: e.to_string(),
                }
            })?;
            if n == 0 {
                return Err(MdvError::MemoryRead {
                    address,
                    len,
                    reason: format!("short read after {done} bytes"),
                });
            }
            done += n;
        }
        Ok(buffer)
    }
}

#[cfg(target_os = "linux")]
fn read_remote(pid: ProcessId, address: Address, buffer: &mut [u8]) -> std::io::Result<usize>
{
    let remote_base = usize::try_from(address.value())
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "address exceeds usize"))?;
    let local = libc::iovec {
        iov_base: buffer.as_mut_ptr().cast(),
        iov_len: buffer.len(),
    };
    let remote = libc::iovec {
        iov_base: remote_base as *mut libc::c_void,
        iov_len: buffer.len(),
    };
    let pid = libc::pid_t::try_from(pid.0)
        .map_err(|_| std::io::Error::new(std::io::ErrorKind::InvalidInput, "pid out of range"))?;

    // SAFETY: `local` describes exactly `buffer`, which we own mutably for the
    // duration of the call. `remote` is only dereferenced by the kernel, in
    // the other process, and invalid ranges are reported as errors.
    let n = unsafe { libc::process_vm_readv(pid, &local, 1, &remote, 1, 0) };
    if n < 0 {
        return Err(std::io::Error::last_os_error());
    }
    Ok(n.unsigned_abs())
}

#[cfg(not(target_os = "linux"))]
fn read_remote(_pid: ProcessId, _address: Address, _buffer: &mut [u8]) -> std::io::Result<usize>
{
    Err(std::io::Error::new(
        std::io::ErrorKind::Unsupported,
        format!("direct memory reads are not implemented for {}", std::env::consts::OS),
    ))
}

#[cfg(test)]
mod tests
{
    use super::*;

    const MAPS: &str = "\
55d0c0a00000-55d0c0a02000 r--p 00000000 fd:01 1835060                    /usr/bin/app
55d0c0a02000-55d0c0a05000 r-xp 00002000 fd:01 1835060                    /usr/bin/app
55d0c1e3e000-55d0c1e5f000 rw-p 00000000 00:00 0                          [heap]
55d0c1e5f000-55d0c1e60000 rw-p 00000000 00:00 0
7f0a00000000-7f0a00001000 ---p 00000000 00:00 0
garbage line
";

    #[test]
    fn test_parse_maps()
    {
        let regions = parse_maps(MAPS);
        assert_eq!(regions.len(), 5);
        assert_eq!(regions[0].start, Address::new(0x55d0_c0a0_0000));
        assert_eq!(regions[0].name.as_deref(), Some("/usr/bin/app"));
        assert_eq!(regions[2].name.as_deref(), Some("[heap]"));
        assert_eq!(regions[3].name, None);
        assert!(!regions[4].is_readable());
    }

    #[test]
    fn test_check_readable_inside_one_region()
    {
        let regions = parse_maps(MAPS);
        assert!(check_readable(&regions, Address::new(0x55d0_c1e3_e100), 0x1000).is_ok());
    }

    #[test]
    fn test_check_readable_across_adjacent_regions()
    {
        let regions = parse_maps(MAPS);
        assert!(check_readable(&regions, Address::new(0x55d0_c1e5_e000), 0x1800).is_ok());
    }

    #[test]
    fn test_check_readable_rejects_gaps_and_protected_pages()
    {
        let regions = parse_maps(MAPS);
        assert!(check_readable(&regions, Address::new(0x55d0_c1e5_f800), 0x1000).is_err());
        assert!(check_readable(&regions, Address::new(0x7f0a_0000_0000), 16).is_err());
        assert!(check_readable(&regions, Address::new(0x10), 16).is_err());
    }

    #[test]
    fn test_check_readable_empty_range()
    {
        assert!(check_readable(&[], Address::new(0x10), 0).is_ok());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_read_own_memory()
    {
        let data: Vec<u8> = (0..=255).collect();
        let memory = ProcessMemory::open(ProcessId(std::process::id())).unwrap();
        let copy = memory.read(Address::new(data.as_ptr() as u64), data.len()).unwrap();
        assert_eq!(copy, data);
    }
}
