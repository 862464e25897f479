//! Tests for platform-agnostic types

use mdv_core::types::{Address, ImageLayout, ImageSnapshot, MatType, MemoryRegion, ProcessId};
use mdv_core::MdvError;

#[test]
fn test_process_id_from_u32()
{
    let pid = ProcessId::from(12345);
    assert_eq!(pid.0, 12345);
    let value: u32 = pid.into();
    assert_eq!(value, 12345);
}

#[test]
fn test_address_display_and_arithmetic()
{
    let address = Address::new(0x1000);
    assert_eq!(format!("{}", address), "0x0000000000001000");
    assert_eq!(address + 0x10, Address::new(0x1010));
    assert_eq!(Address::new(u64::MAX).checked_add(1), None);
    assert!(Address::ZERO.is_null());
}

#[test]
fn test_memory_region_new()
{
    let region = MemoryRegion::new(
        Address::new(0x1000),
        Address::new(0x2000),
        "rw-p".to_string(),
        Some("[heap]".to_string()),
    );

    assert_eq!(region.size(), 0x1000);
    assert!(region.is_readable());
    assert!(region.contains(Address::new(0x1fff)));
    assert!(!region.contains(Address::new(0x2000)));
}

#[test]
fn test_layout_rejects_short_stride()
{
    let rgb = MatType::from_code(16).unwrap();
    let err = ImageLayout::from_header(4, 10, rgb, 20, Address::new(0x1000)).unwrap_err();
    assert!(matches!(err, MdvError::InvalidLayout(_)));
}

#[test]
fn test_layout_rejects_negative_shape()
{
    let gray = MatType::from_code(0).unwrap();
    assert!(ImageLayout::from_header(-1, 3, gray, 3, Address::new(0x1000)).is_err());
    assert!(ImageLayout::from_header(3, -1, gray, 3, Address::new(0x1000)).is_err());
    assert!(ImageLayout::from_header(3, 3, gray, -3, Address::new(0x1000)).is_err());
}

#[test]
fn test_layout_rejects_null_data_for_non_empty_matrix()
{
    let gray = MatType::from_code(0).unwrap();
    assert!(ImageLayout::from_header(2, 2, gray, 2, Address::ZERO).is_err());
    assert!(ImageLayout::from_header(0, 2, gray, 2, Address::ZERO).is_ok());
}

#[test]
fn test_snapshot_drops_row_padding()
{
    let gray16 = MatType::from_code(2).unwrap();
    let layout = ImageLayout::from_header(2, 1, gray16, 4, Address::new(0x1000)).unwrap();
    let snapshot = ImageSnapshot::new(layout, vec![1, 2, 0xEE, 0xEE, 3, 4, 0xEE, 0xEE]).unwrap();
    let matrix = snapshot.into_matrix();
    assert_eq!(matrix.data(), &[1, 2, 3, 4]);
    assert_eq!(matrix.value_count(), 2);
}

#[test]
fn test_snapshot_requires_full_payload()
{
    let gray = MatType::from_code(0).unwrap();
    let layout = ImageLayout::from_header(2, 2, gray, 2, Address::new(0x1000)).unwrap();
    assert!(ImageSnapshot::new(layout, vec![0; 3]).is_err());
}
