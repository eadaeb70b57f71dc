use thiserror::Error;

use crate::flags::{MemoryMapFlags, MemoryProt, VmaType};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapError {
    #[error("mapping length is zero")]
    ZeroLength,
    #[error("address 0x{addr:x} is not page aligned")]
    Unaligned { addr: u64 },
    /// A `FIXED | NO_OVERWRITE` request hit an existing mapping.
    #[error("fixed mapping at 0x{addr:x} overlaps an existing mapping")]
    Overlap { addr: u64 },
    /// No free range large enough, or the mapped-bytes budget is exhausted.
    #[error("no space for a 0x{len:x} byte mapping")]
    NoSpace { len: u64 },
    #[error("range at 0x{addr:x} is not mapped")]
    NotMapped { addr: u64 },
}

pub type MapResult<T> = Result<T, MapError>;

/// The guest kernel's `mmap`/`munmap` surface, as consumed by drivers.
pub trait MemoryMapper: Send + Sync {
    /// Maps `len` bytes (rounded up to whole pages) and returns the chosen base address.
    ///
    /// Without [`MemoryMapFlags::FIXED`], `preferred` is a hint: the mapping lands there when
    /// the range is free and otherwise at the next free range above it.
    fn map_memory(
        &self,
        preferred: u64,
        len: u64,
        prot: MemoryProt,
        flags: MemoryMapFlags,
        vma: VmaType,
    ) -> MapResult<u64>;

    fn unmap_memory(&self, addr: u64, len: u64) -> MapResult<()>;
}
