//! The process-wide submission ring.
//!
//! The guest driver and the emulated kernel exchange submission sequence numbers through one
//! shared page. It is mapped on the first `InitializeSubmits` and lives for the rest of the
//! process; every later call reports the same address.

use std::sync::{Mutex, MutexGuard, PoisonError};

use orbis_vmem::{GuestMemory, MemoryMapFlags, MemoryMapper, MemoryProt, VmaType};
use tracing::{error, info};

use crate::config::GcDeviceConfig;
use crate::error::GcError;

#[derive(Debug, Default)]
pub struct SubmissionRing {
    /// Base address once mapped. The lock is held across check-then-map so the ring is mapped
    /// at most once.
    base: Mutex<Option<u64>>,
}

impl SubmissionRing {
    pub const fn new() -> Self {
        Self {
            base: Mutex::new(None),
        }
    }

    fn base(&self) -> MutexGuard<'_, Option<u64>> {
        self.base.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn address(&self) -> Option<u64> {
        *self.base()
    }

    /// Returns the ring address, mapping and zeroing the ring on first use.
    ///
    /// A failed mapping leaves the ring unmapped; the next call tries again.
    pub fn initialize(
        &self,
        mem: &dyn GuestMemory,
        mapper: &dyn MemoryMapper,
        config: &GcDeviceConfig,
    ) -> Result<u64, GcError> {
        let mut base = self.base();
        if let Some(addr) = *base {
            return Ok(addr);
        }

        let addr = mapper
            .map_memory(
                config.submits_addr,
                config.submits_len,
                MemoryProt::CPU_READ,
                MemoryMapFlags::SHARED | MemoryMapFlags::ANON | MemoryMapFlags::SYSTEM,
                VmaType::Direct,
            )
            .map_err(|err| {
                error!("failed to map submission ring at {:#x}: {err}", config.submits_addr);
                GcError::OutOfMemory(err)
            })?;
        *base = Some(addr);
        info!("submission ring mapped at {addr:#x} ({:#x} bytes)", config.submits_len);

        mem.write_u32_le(addr, 0)?;
        Ok(addr)
    }
}
