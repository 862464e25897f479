//! # Types
//!
//! Plain data types shared by the host, capture and storage modules: inferior
//! addresses and processes, element type codes and matrix buffers.

pub mod address;
pub mod mat_type;
pub mod process;
pub mod snapshot;

// Re-export all public types
pub use address::Address;
pub use mat_type::{Depth, MatType, TYPE_MASK};
pub use process::{MemoryRegion, ProcessId};
pub use snapshot::{transfer_size, ImageLayout, ImageSnapshot, Matrix};
