use bitflags::bitflags;

/// Guest page size (16 KiB).
pub const PAGE_SIZE: u64 = 0x4000;

/// Rounds `value` up to a multiple of `align` (a power of two). `None` on overflow.
pub const fn align_up(value: u64, align: u64) -> Option<u64> {
    let mask = align - 1;
    match value.checked_add(mask) {
        Some(v) => Some(v & !mask),
        None => None,
    }
}

bitflags! {
    /// Page protection as seen by the guest (CPU and GPU sides are tracked separately).
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MemoryProt: u32 {
        const CPU_READ = 0x1;
        const CPU_READ_WRITE = 0x2;
        const CPU_EXEC = 0x4;
        const GPU_READ = 0x10;
        const GPU_WRITE = 0x20;
        const GPU_READ_WRITE = Self::GPU_READ.bits() | Self::GPU_WRITE.bits();
    }
}

bitflags! {
    /// `mmap` flags of the guest kernel ABI.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MemoryMapFlags: u32 {
        const SHARED = 0x1;
        const PRIVATE = 0x2;
        const FIXED = 0x10;
        const NO_OVERWRITE = 0x80;
        const ANON = 0x1000;
        const SYSTEM = 0x2000;
        const NO_COALESCE = 0x40_0000;
    }
}

/// What kind of backing a virtual memory area has.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum VmaType {
    #[default]
    Free,
    Reserved,
    Direct,
    Flexible,
    Pooled,
    Stack,
    Code,
    File,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn align_up_rounds_to_page() {
        assert_eq!(align_up(0, PAGE_SIZE), Some(0));
        assert_eq!(align_up(1, PAGE_SIZE), Some(PAGE_SIZE));
        assert_eq!(align_up(PAGE_SIZE, PAGE_SIZE), Some(PAGE_SIZE));
        assert_eq!(align_up(u64::MAX, PAGE_SIZE), None);
    }

    #[test]
    fn flag_bits_match_guest_abi() {
        let flags = MemoryMapFlags::SHARED | MemoryMapFlags::ANON | MemoryMapFlags::SYSTEM;
        assert_eq!(flags.bits(), 0x3001);
        assert_eq!(MemoryProt::GPU_READ_WRITE.bits(), 0x30);
    }
}
