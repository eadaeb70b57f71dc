use thiserror::Error;

/// Errors returned by [`GuestMemory`] implementations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuestMemoryError {
    /// Part of the range is not covered by any mapping.
    #[error("guest access to unmapped memory: vaddr=0x{vaddr:x} len={len}")]
    Unmapped { vaddr: u64, len: usize },
    /// `vaddr + len` wraps the 64-bit address space.
    #[error("guest access wraps the address space: vaddr=0x{vaddr:x} len={len}")]
    AddressOverflow { vaddr: u64, len: usize },
}

pub type GuestMemoryResult<T> = Result<T, GuestMemoryError>;

/// Byte access to guest *virtual* memory.
///
/// Receivers are `&self`: one address space is shared by every guest thread, so
/// implementations synchronize internally. Host-side accesses ignore guest page protection;
/// the emulated kernel is allowed to update pages the guest can only read.
pub trait GuestMemory: Send + Sync {
    fn read_into(&self, vaddr: u64, dst: &mut [u8]) -> GuestMemoryResult<()>;

    fn write_from(&self, vaddr: u64, src: &[u8]) -> GuestMemoryResult<()>;

    fn read_u32_le(&self, vaddr: u64) -> GuestMemoryResult<u32> {
        let mut buf = [0u8; 4];
        self.read_into(vaddr, &mut buf)?;
        Ok(u32::from_le_bytes(buf))
    }

    fn read_u64_le(&self, vaddr: u64) -> GuestMemoryResult<u64> {
        let mut buf = [0u8; 8];
        self.read_into(vaddr, &mut buf)?;
        Ok(u64::from_le_bytes(buf))
    }

    fn write_u32_le(&self, vaddr: u64, value: u32) -> GuestMemoryResult<()> {
        self.write_from(vaddr, &value.to_le_bytes())
    }

    fn write_u64_le(&self, vaddr: u64, value: u64) -> GuestMemoryResult<()> {
        self.write_from(vaddr, &value.to_le_bytes())
    }
}
