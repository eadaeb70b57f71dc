use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::access::{GuestMemory, GuestMemoryError, GuestMemoryResult};
use crate::flags::{align_up, MemoryMapFlags, MemoryProt, VmaType, PAGE_SIZE};
use crate::mapper::{MapError, MapResult, MemoryMapper};

/// One live mapping.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MappedRegion {
    pub start: u64,
    pub len: u64,
    pub prot: MemoryProt,
    pub flags: MemoryMapFlags,
    pub vma: VmaType,
}

impl MappedRegion {
    pub fn end(&self) -> u64 {
        self.start + self.len
    }

    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.start && addr < self.end()
    }
}

#[derive(Clone, Debug)]
pub struct VirtualMemoryConfig {
    /// Lowest address handed out for non-fixed mappings.
    pub base: u64,
    /// Exclusive upper bound for every mapping.
    pub limit: u64,
    /// Total bytes that may be mapped at once. Requests beyond this fail with
    /// [`MapError::NoSpace`].
    pub max_mapped_bytes: u64,
}

impl Default for VirtualMemoryConfig {
    fn default() -> Self {
        Self {
            // Keep the null page unmapped so a zero guest pointer always faults.
            base: PAGE_SIZE,
            limit: 0x0000_8000_0000_0000,
            max_mapped_bytes: u64::MAX,
        }
    }
}

#[derive(Default)]
struct State {
    /// Keyed by region start. Regions never overlap.
    regions: BTreeMap<u64, MappedRegion>,
    /// Backing pages keyed by page-aligned address, allocated on first write.
    pages: BTreeMap<u64, Box<[u8]>>,
    mapped_bytes: u64,
    map_calls: u64,
}

impl State {
    fn region_containing(&self, addr: u64) -> Option<&MappedRegion> {
        self.regions
            .range(..=addr)
            .next_back()
            .map(|(_, r)| r)
            .filter(|r| r.contains(addr))
    }

    fn overlaps(&self, start: u64, end: u64) -> bool {
        // Regions are disjoint, so only the last one starting below `end` can reach `start`.
        self.regions
            .range(..end)
            .next_back()
            .is_some_and(|(_, r)| r.end() > start)
    }

    /// Bytes of existing mappings inside `[start, end)`.
    fn overlap_bytes(&self, start: u64, end: u64) -> u64 {
        self.regions
            .range(..end)
            .filter(|(_, r)| r.end() > start)
            .map(|(_, r)| r.end().min(end) - r.start.max(start))
            .sum()
    }

    fn check_covered(&self, vaddr: u64, len: usize) -> GuestMemoryResult<()> {
        let end = vaddr
            .checked_add(len as u64)
            .ok_or(GuestMemoryError::AddressOverflow { vaddr, len })?;
        let mut cur = vaddr;
        while cur < end {
            let region = self
                .region_containing(cur)
                .ok_or(GuestMemoryError::Unmapped { vaddr, len })?;
            cur = region.end();
        }
        Ok(())
    }

    fn find_free(&self, from: u64, len: u64, limit: u64) -> Option<u64> {
        let mut candidate = match self.region_containing(from) {
            Some(r) => r.end(),
            None => from,
        };
        for (_, r) in self.regions.range(candidate..) {
            if r.start - candidate >= len {
                break;
            }
            candidate = r.end();
        }
        let end = candidate.checked_add(len)?;
        (end <= limit).then_some(candidate)
    }

    /// Unmaps `[start, end)`, splitting regions that straddle either edge.
    fn remove_range(&mut self, start: u64, end: u64) {
        let hit: Vec<u64> = self
            .regions
            .range(..end)
            .filter(|(_, r)| r.end() > start)
            .map(|(k, _)| *k)
            .collect();
        for key in hit {
            let Some(r) = self.regions.remove(&key) else {
                continue;
            };
            if r.start < start {
                self.regions.insert(
                    r.start,
                    MappedRegion {
                        len: start - r.start,
                        ..r
                    },
                );
            }
            if r.end() > end {
                self.regions.insert(
                    end,
                    MappedRegion {
                        start: end,
                        len: r.end() - end,
                        ..r
                    },
                );
            }
            let removed = r.end().min(end) - r.start.max(start);
            self.mapped_bytes -= removed;
        }

        let stale: Vec<u64> = self.pages.range(start..end).map(|(k, _)| *k).collect();
        for page in stale {
            self.pages.remove(&page);
        }
    }
}

/// Sparse, page-granular guest address space.
///
/// Pages are allocated lazily on first write; mapped-but-untouched pages read back as zero,
/// matching anonymous `mmap`.
pub struct VirtualMemory {
    config: VirtualMemoryConfig,
    state: Mutex<State>,
}

impl Default for VirtualMemory {
    fn default() -> Self {
        Self::new(VirtualMemoryConfig::default())
    }
}

impl VirtualMemory {
    pub fn new(config: VirtualMemoryConfig) -> Self {
        Self {
            config,
            state: Mutex::new(State::default()),
        }
    }

    pub fn config(&self) -> &VirtualMemoryConfig {
        &self.config
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn region_at(&self, addr: u64) -> Option<MappedRegion> {
        self.state().region_containing(addr).copied()
    }

    pub fn regions(&self) -> Vec<MappedRegion> {
        self.state().regions.values().copied().collect()
    }

    pub fn mapped_bytes(&self) -> u64 {
        self.state().mapped_bytes
    }

    /// Number of successful [`MemoryMapper::map_memory`] calls so far.
    pub fn map_count(&self) -> u64 {
        self.state().map_calls
    }
}

impl MemoryMapper for VirtualMemory {
    fn map_memory(
        &self,
        preferred: u64,
        len: u64,
        prot: MemoryProt,
        flags: MemoryMapFlags,
        vma: VmaType,
    ) -> MapResult<u64> {
        if len == 0 {
            return Err(MapError::ZeroLength);
        }
        let len = align_up(len, PAGE_SIZE).ok_or(MapError::NoSpace { len })?;

        let mut state = self.state();
        let addr = if flags.contains(MemoryMapFlags::FIXED) {
            if preferred % PAGE_SIZE != 0 {
                return Err(MapError::Unaligned { addr: preferred });
            }
            let end = preferred
                .checked_add(len)
                .filter(|end| *end <= self.config.limit)
                .ok_or(MapError::NoSpace { len })?;
            let replaced = state.overlap_bytes(preferred, end);
            if replaced != 0 && flags.contains(MemoryMapFlags::NO_OVERWRITE) {
                return Err(MapError::Overlap { addr: preferred });
            }
            // Pages being replaced do not count against the budget.
            if (state.mapped_bytes - replaced).saturating_add(len) > self.config.max_mapped_bytes {
                return Err(MapError::NoSpace { len });
            }
            if replaced != 0 {
                state.remove_range(preferred, end);
            }
            preferred
        } else {
            if state.mapped_bytes.saturating_add(len) > self.config.max_mapped_bytes {
                return Err(MapError::NoSpace { len });
            }
            let from = align_up(preferred.max(self.config.base), PAGE_SIZE)
                .ok_or(MapError::NoSpace { len })?;
            state
                .find_free(from, len, self.config.limit)
                .ok_or(MapError::NoSpace { len })?
        };

        state.regions.insert(
            addr,
            MappedRegion {
                start: addr,
                len,
                prot,
                flags,
                vma,
            },
        );
        state.mapped_bytes += len;
        state.map_calls += 1;
        debug!(
            "mapped 0x{addr:x}..0x{:x} prot={prot:?} flags={flags:?} vma={vma:?}",
            addr + len
        );
        Ok(addr)
    }

    fn unmap_memory(&self, addr: u64, len: u64) -> MapResult<()> {
        if len == 0 {
            return Err(MapError::ZeroLength);
        }
        if addr % PAGE_SIZE != 0 {
            return Err(MapError::Unaligned { addr });
        }
        let end = align_up(len, PAGE_SIZE)
            .and_then(|len| addr.checked_add(len))
            .ok_or(MapError::NotMapped { addr })?;

        let mut state = self.state();
        if !state.overlaps(addr, end) {
            return Err(MapError::NotMapped { addr });
        }
        state.remove_range(addr, end);
        debug!("unmapped 0x{addr:x}..0x{end:x}");
        Ok(())
    }
}

impl GuestMemory for VirtualMemory {
    fn read_into(&self, vaddr: u64, dst: &mut [u8]) -> GuestMemoryResult<()> {
        let state = self.state();
        state.check_covered(vaddr, dst.len())?;

        let mut done = 0usize;
        while done < dst.len() {
            let addr = vaddr + done as u64;
            let page = addr & !(PAGE_SIZE - 1);
            let off = (addr - page) as usize;
            let n = (PAGE_SIZE as usize - off).min(dst.len() - done);
            let chunk = &mut dst[done..done + n];
            match state.pages.get(&page) {
                Some(bytes) => chunk.copy_from_slice(&bytes[off..off + n]),
                None => chunk.fill(0),
            }
            done += n;
        }
        Ok(())
    }

    fn write_from(&self, vaddr: u64, src: &[u8]) -> GuestMemoryResult<()> {
        let mut state = self.state();
        state.check_covered(vaddr, src.len())?;

        let mut done = 0usize;
        while done < src.len() {
            let addr = vaddr + done as u64;
            let page = addr & !(PAGE_SIZE - 1);
            let off = (addr - page) as usize;
            let n = (PAGE_SIZE as usize - off).min(src.len() - done);
            let bytes = state
                .pages
                .entry(page)
                .or_insert_with(|| vec![0u8; PAGE_SIZE as usize].into_boxed_slice());
            bytes[off..off + n].copy_from_slice(&src[done..done + n]);
            done += n;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anon() -> MemoryMapFlags {
        MemoryMapFlags::PRIVATE | MemoryMapFlags::ANON
    }

    #[test]
    fn hint_is_honored_when_free() {
        let vm = VirtualMemory::default();
        let addr = vm
            .map_memory(0x10_0000, 0x100, MemoryProt::CPU_READ, anon(), VmaType::Flexible)
            .unwrap();
        assert_eq!(addr, 0x10_0000);
        assert_eq!(vm.region_at(addr).unwrap().len, PAGE_SIZE);
    }

    #[test]
    fn split_keeps_both_halves() {
        let vm = VirtualMemory::default();
        let addr = vm
            .map_memory(0x10_0000, 3 * PAGE_SIZE, MemoryProt::CPU_READ, anon(), VmaType::Direct)
            .unwrap();
        vm.unmap_memory(addr + PAGE_SIZE, PAGE_SIZE).unwrap();

        let regions = vm.regions();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].start, addr);
        assert_eq!(regions[0].len, PAGE_SIZE);
        assert_eq!(regions[1].start, addr + 2 * PAGE_SIZE);
        assert_eq!(vm.mapped_bytes(), 2 * PAGE_SIZE);
    }
}
