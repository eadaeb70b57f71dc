//! Guest ABI of the `/dev/gc` graphics-core control interface.
//!
//! The guest GNM driver talks to the kernel-side GPU driver exclusively through `ioctl` on a
//! `/dev/gc` handle. This crate is the single source of truth for that contract:
//! - [`ioctl`]: the BSD-style packing of direction, parameter size, group and number into a
//!   command code,
//! - [`command`]: the fixed set of command codes the device understands, and
//! - [`layout`]: the argument structures those codes carry, with byte-exact little-endian
//!   decode/encode.
//!
//! Nothing here touches guest memory; the device model reads the raw bytes and hands them to
//! the `decode_from_le_bytes` helpers.
#![forbid(unsafe_code)]

pub mod command;
pub mod ioctl;
pub mod layout;

pub use command::{GcArgLayout, GcCommand};
pub use ioctl::{IoctlCode, IoctlDirection, GC_IOCTL_GROUP};
pub use layout::{
    GuestStruct, MapComputeQueueArgs, MipStatsReportArgs, SetGsRingSizesArgs,
    SetWaveLimitMultipliersArgs, SubmitArgs, SubmitEopArgs, CU_MASK_WORDS, MIP_STATS_TYPE_A,
    MIP_STATS_TYPE_B, WAVE_LIMIT_VALUES,
};
