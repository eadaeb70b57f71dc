//! Guest virtual address space for the emulated kernel.
//!
//! Device models never see host pointers. They go through two narrow traits:
//! - [`GuestMemory`] for byte access at guest virtual addresses, and
//! - [`MemoryMapper`] for creating and destroying mappings (the `mmap`/`munmap` surface the
//!   guest kernel exposes to drivers).
//!
//! [`VirtualMemory`] implements both over a sparse page store so device models can be
//! exercised without reserving host address space.
#![forbid(unsafe_code)]

mod access;
mod flags;
mod mapper;
mod sparse;

pub use access::{GuestMemory, GuestMemoryError, GuestMemoryResult};
pub use flags::{align_up, MemoryMapFlags, MemoryProt, VmaType, PAGE_SIZE};
pub use mapper::{MapError, MapResult, MemoryMapper};
pub use sparse::{MappedRegion, VirtualMemory, VirtualMemoryConfig};
