use orbis_gc_protocol::CU_MASK_WORDS;
use orbis_vmem::PAGE_SIZE;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Preferred guest address of the submission ring.
pub const DEFAULT_SUBMITS_ADDR: u64 = 0xf_e010_0000;
/// Submission ring size (one guest page).
pub const DEFAULT_SUBMITS_LEN: u64 = 0x4000;
/// Compute-unit mask reported by `GetCuMask`.
pub const DEFAULT_CU_MASK: [u32; CU_MASK_WORDS] = [0x10, 0x10, 0, 0];

/// Host-side configuration of the `/dev/gc` model.
///
/// Every field has a default matching the retail console, so an empty config section is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GcDeviceConfig {
    /// Address hint for the submission ring mapping.
    pub submits_addr: u64,
    /// Length of the submission ring mapping. Must be a non-zero multiple of the guest page.
    pub submits_len: u64,
    /// Value written by `GetNumTcaUnits`.
    pub num_compute_units: u32,
    /// Words written by `GetCuMask`.
    pub cu_mask: [u32; CU_MASK_WORDS],
}

impl Default for GcDeviceConfig {
    fn default() -> Self {
        Self {
            submits_addr: DEFAULT_SUBMITS_ADDR,
            submits_len: DEFAULT_SUBMITS_LEN,
            num_compute_units: 0,
            cu_mask: DEFAULT_CU_MASK,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GcConfigError {
    #[error("submission ring length must be non-zero")]
    ZeroRingLength,
    #[error("submission ring length 0x{len:x} is not a multiple of the guest page size")]
    UnalignedRingLength { len: u64 },
    #[error("submission ring 0x{addr:x}+0x{len:x} wraps the address space")]
    RingOverflow { addr: u64, len: u64 },
}

impl GcDeviceConfig {
    pub fn validate(&self) -> Result<(), GcConfigError> {
        if self.submits_len == 0 {
            return Err(GcConfigError::ZeroRingLength);
        }
        if self.submits_len % PAGE_SIZE != 0 {
            return Err(GcConfigError::UnalignedRingLength {
                len: self.submits_len,
            });
        }
        if self.submits_addr.checked_add(self.submits_len).is_none() {
            return Err(GcConfigError::RingOverflow {
                addr: self.submits_addr,
                len: self.submits_len,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let cfg = GcDeviceConfig::default();
        assert_eq!(cfg.submits_addr, 0xfe0100000);
        assert_eq!(cfg.validate(), Ok(()));
    }

    #[test]
    fn ring_length_must_be_whole_pages() {
        let mut cfg = GcDeviceConfig::default();
        cfg.submits_len = 0;
        assert_eq!(cfg.validate(), Err(GcConfigError::ZeroRingLength));
        cfg.submits_len = 0x1000;
        assert_eq!(
            cfg.validate(),
            Err(GcConfigError::UnalignedRingLength { len: 0x1000 })
        );
        cfg.submits_len = PAGE_SIZE;
        cfg.submits_addr = u64::MAX - 1;
        assert!(matches!(cfg.validate(), Err(GcConfigError::RingOverflow { .. })));
    }
}
