//! Per-call `ioctl` argument cursor.
//!
//! The guest passes its variadic arguments as raw 64-bit words. Each command pulls a fixed
//! number of them in a fixed order (almost always a single pointer to its argument block).
//! Extraction performs no alignment or bounds checks; a short list simply yields null
//! pointers, which then fault when dereferenced.

use core::fmt;
use core::marker::PhantomData;

use orbis_gc_protocol::GuestStruct;
use orbis_vmem::{GuestMemory, GuestMemoryResult};

use crate::error::GcError;

pub struct IoctlArgs<'a> {
    words: &'a [u64],
    pos: usize,
}

impl<'a> IoctlArgs<'a> {
    pub fn new(words: &'a [u64]) -> Self {
        Self { words, pos: 0 }
    }

    pub fn next_u64(&mut self) -> u64 {
        let word = self.words.get(self.pos).copied().unwrap_or(0);
        self.pos = self.pos.saturating_add(1);
        word
    }

    pub fn next_ptr<T>(&mut self) -> GuestPtr<T> {
        GuestPtr::new(self.next_u64())
    }

    /// Words not yet extracted.
    pub fn remaining(&self) -> usize {
        self.words.len().saturating_sub(self.pos)
    }

    /// Extractions performed so far, including ones past the end of the list.
    pub fn consumed(&self) -> usize {
        self.pos
    }
}

/// A guest virtual address holding a `T`.
pub struct GuestPtr<T> {
    addr: u64,
    _ty: PhantomData<fn() -> T>,
}

impl<T> GuestPtr<T> {
    pub const fn new(addr: u64) -> Self {
        Self {
            addr,
            _ty: PhantomData,
        }
    }

    pub const fn addr(self) -> u64 {
        self.addr
    }

    pub const fn is_null(self) -> bool {
        self.addr == 0
    }

    /// Reinterprets the address `offset` bytes further on as a `U`.
    pub const fn byte_offset<U>(self, offset: u64) -> GuestPtr<U> {
        GuestPtr::new(self.addr.wrapping_add(offset))
    }
}

impl<T: GuestStruct> GuestPtr<T> {
    pub fn read(self, mem: &dyn GuestMemory) -> Result<T, GcError> {
        let mut buf = vec![0u8; T::SIZE_BYTES];
        mem.read_into(self.addr, &mut buf)?;
        T::decode_from_le_bytes(&buf).ok_or(GcError::MalformedArgument {
            addr: self.addr,
            size: T::SIZE_BYTES,
        })
    }

    pub fn write(self, mem: &dyn GuestMemory, value: &T) -> GuestMemoryResult<()> {
        mem.write_from(self.addr, &value.encode_to_le_bytes())
    }
}

impl<T> Clone for GuestPtr<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for GuestPtr<T> {}

impl<T> PartialEq for GuestPtr<T> {
    fn eq(&self, other: &Self) -> bool {
        self.addr == other.addr
    }
}

impl<T> Eq for GuestPtr<T> {}

impl<T> fmt::Debug for GuestPtr<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GuestPtr({:#x})", self.addr)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use orbis_vmem::{MemoryMapFlags, MemoryMapper, MemoryProt, VirtualMemory, VmaType, PAGE_SIZE};

    #[test]
    fn cursor_yields_words_in_order() {
        let words = [0x1000, 0x2000];
        let mut args = IoctlArgs::new(&words);
        assert_eq!(args.remaining(), 2);
        assert_eq!(args.next_ptr::<u32>().addr(), 0x1000);
        assert_eq!(args.next_u64(), 0x2000);
        assert_eq!(args.remaining(), 0);
    }

    #[test]
    fn exhausted_cursor_yields_null() {
        let mut args = IoctlArgs::new(&[]);
        assert!(args.next_ptr::<u64>().is_null());
        assert!(args.next_ptr::<u64>().is_null());
        assert_eq!(args.consumed(), 2);
        assert_eq!(args.remaining(), 0);
    }

    /// Decodes nothing, whatever the bytes.
    #[derive(Clone, Copy, Debug)]
    struct Undecodable;

    impl GuestStruct for Undecodable {
        const SIZE_BYTES: usize = 4;

        fn decode_from_le_bytes(_buf: &[u8]) -> Option<Self> {
            None
        }

        fn encode_to_le_bytes(&self) -> Vec<u8> {
            vec![0; Self::SIZE_BYTES]
        }
    }

    #[test]
    fn failed_decode_is_an_error_not_a_panic() {
        let vm = VirtualMemory::default();
        let addr = vm
            .map_memory(
                0x10_0000,
                PAGE_SIZE,
                MemoryProt::CPU_READ_WRITE,
                MemoryMapFlags::ANON,
                VmaType::Flexible,
            )
            .unwrap();

        let err = GuestPtr::<Undecodable>::new(addr).read(&vm).unwrap_err();
        assert_eq!(err, GcError::MalformedArgument { addr, size: 4 });
        assert_eq!(err.status(), -crate::errno::EFAULT);

        vm.write_u32_le(addr, 0x55).unwrap();
        assert_eq!(GuestPtr::<u32>::new(addr).read(&vm), Ok(0x55));
    }

    #[test]
    fn byte_offset_wraps() {
        let p = GuestPtr::<u32>::new(u64::MAX);
        assert_eq!(p.byte_offset::<u32>(1).addr(), 0);
        assert_eq!(format!("{p:?}"), "GuestPtr(0xffffffffffffffff)");
    }
}
